//! Error types for the export pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while exporting a mind-map
#[derive(Error, Debug)]
pub enum Error {
    /// The input Markdown file does not exist
    #[error("file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The outline tree could not be serialized for the renderer
    #[error("outline transform failed: {0}")]
    Transform(String),

    /// The render host could not be started
    #[error("render host failed: {0}")]
    Server(String),

    /// The headless browser could not be launched
    #[error("browser launch failed: {0}")]
    Browser(String),

    /// Navigation to the render host page failed
    #[error("failed to load page: {0}")]
    Load(String),

    /// In-page script evaluation failed
    #[error("script execution failed: {0}")]
    Script(String),

    /// The rendered SVG could not be produced or extracted
    #[error("rendering failed: {0}")]
    Render(String),

    /// A bounded wait elapsed
    #[error("timed out after {0}ms waiting for {1}")]
    Timeout(u64, String),

    /// Filesystem error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
