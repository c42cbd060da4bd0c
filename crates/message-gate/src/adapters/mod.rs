//! Adapters for the Message Gate.
//!
//! Infrastructure implementations of the outbound ports.

pub mod clock;
pub mod consent;
pub mod storage;

pub use clock::{ManualClock, SystemTimeSource};
pub use consent::{AutoConsent, StaticConsent};
pub use storage::{JsonFileStore, MemoryStore};
