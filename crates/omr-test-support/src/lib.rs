//! Test support utilities for omr.
//!
//! Provides synthetic answer sheets, binary images, and mock ports for
//! testing the reading pipeline without real photos or a filesystem.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use omr_core::{EngineConfig, OmrEngine, ProcessingOptions};
//! use omr_test_support::{MockDebugStorage, SyntheticSheetBuilder};
//!
//! let sheet = SyntheticSheetBuilder::new(5, &["A", "B", "C", "D"]).mark(1, "A");
//! let storage = Arc::new(MockDebugStorage::new());
//! let engine = OmrEngine::new(EngineConfig::default())
//!     .unwrap()
//!     .with_debug_storage(storage.clone());
//! let options = ProcessingOptions::builder()
//!     .question_count(5)
//!     .choice_labels(["A", "B", "C", "D"])
//!     .debug(true)
//!     .build()
//!     .unwrap();
//!
//! let result = engine.process(&sheet.png_bytes(), &options).unwrap();
//! assert_eq!(result.answers.len(), 5);
//! assert_eq!(storage.labels(), ["roi", "binary", "nogrid"]);
//! ```

mod builders;
mod mocks;

pub use builders::{SyntheticBinaryBuilder, SyntheticSheetBuilder};
pub use mocks::{FailingDebugStorage, MockDebugStorage, SavedImage};
