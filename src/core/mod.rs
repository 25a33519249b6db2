pub mod classifier;
pub mod clock;
pub mod geo;
pub mod log;
pub mod outbox;
pub mod reconcile;
pub mod supervisor;
pub mod window;
