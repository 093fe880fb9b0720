//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::bail;
use omr_core::ports::DebugStorage;

/// A single captured `save_debug_image` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    /// Label passed by the caller.
    pub label: String,
    /// Format extension passed by the caller.
    pub format: String,
    /// Encoded image bytes.
    pub data: Vec<u8>,
}

/// Mock implementation of `DebugStorage` for testing.
///
/// Captures saved images and returns `mock://{label}/{n}.{format}` locations.
#[derive(Debug, Default)]
pub struct MockDebugStorage {
    saved: Arc<Mutex<Vec<SavedImage>>>,
}

impl MockDebugStorage {
    /// Creates a new mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all captured images.
    #[must_use]
    pub fn saved(&self) -> Vec<SavedImage> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns captured labels in call order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.saved().into_iter().map(|s| s.label).collect()
    }
}

impl DebugStorage for MockDebugStorage {
    fn save_debug_image(
        &self,
        image_data: &[u8],
        label: &str,
        format: &str,
    ) -> anyhow::Result<String> {
        let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        saved.push(SavedImage {
            label: label.to_string(),
            format: format.to_string(),
            data: image_data.to_vec(),
        });
        Ok(format!("mock://{label}/{}.{format}", saved.len()))
    }
}

/// `DebugStorage` that fails, either for every label or for one.
///
/// Labels that do not fail are forwarded to an inner [`MockDebugStorage`].
#[derive(Debug, Default)]
pub struct FailingDebugStorage {
    only: Option<String>,
    inner: MockDebugStorage,
}

impl FailingDebugStorage {
    /// Fails every save.
    #[must_use]
    pub fn always() -> Self {
        Self::default()
    }

    /// Fails saves for `label` only.
    #[must_use]
    pub fn for_label(label: &str) -> Self {
        Self {
            only: Some(label.to_string()),
            inner: MockDebugStorage::new(),
        }
    }

    /// Returns images that were stored successfully.
    #[must_use]
    pub fn saved(&self) -> Vec<SavedImage> {
        self.inner.saved()
    }
}

impl DebugStorage for FailingDebugStorage {
    fn save_debug_image(
        &self,
        image_data: &[u8],
        label: &str,
        format: &str,
    ) -> anyhow::Result<String> {
        match self.only.as_deref() {
            Some(only) if only != label => self.inner.save_debug_image(image_data, label, format),
            _ => bail!("simulated storage failure for '{label}'"),
        }
    }
}
