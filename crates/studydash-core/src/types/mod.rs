//! Domain records owned by the session layer.

mod participant;

pub use participant::*;
