//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the detection core and external adapters.

mod debug_storage;

pub use debug_storage::DebugStorage;
