//! Ports (trait seams) between the gate and its host environment.

pub mod outbound;

pub use outbound::{ConsentProvider, KeyValueStore, TimeSource};
