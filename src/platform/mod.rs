//! Host-side collaborators: environment probe and host signal decoding.

pub mod probe;
pub mod signals;
