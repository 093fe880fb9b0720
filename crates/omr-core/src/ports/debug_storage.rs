//! Diagnostic image storage port.

/// Port for persisting diagnostic images produced during a debug run.
///
/// Implementations may be called from several detections at once.
pub trait DebugStorage: Send + Sync {
    /// Stores an encoded image and returns an opaque location for it.
    ///
    /// # Arguments
    ///
    /// * `image_data` - Encoded image bytes
    /// * `label` - Short label such as `roi`, `binary` or `nogrid`
    /// * `format` - File extension of the encoding, e.g. `jpg`
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be stored.
    fn save_debug_image(&self, image_data: &[u8], label: &str, format: &str)
        -> anyhow::Result<String>;
}
