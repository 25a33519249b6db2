pub mod event_code;
pub mod location_event;
pub mod outbox_record;
pub mod position;
pub mod user_settings;
