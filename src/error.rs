//! Error types.

use thiserror::Error;

/// Errors reported by the bitmap generators and the painter.
///
/// Encoder failures are not part of this enum: they are reported as an
/// absent bitmap so the caller can fall back to a transparent placeholder.
#[derive(Debug, Error)]
pub enum QrPaintError {
    #[error("Content must not be empty")]
    EmptyContent,

    #[error("Size must be non-negative, got {0}")]
    NegativeSize(i32),

    #[error("Padding must be non-negative, got {0}")]
    NegativePadding(i32),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QrPaintError>;

/// Checks the inputs shared by every generator.
pub(crate) fn check_request(content: &str, size_px: i32, padding_px: i32) -> Result<()> {
    if content.is_empty() {
        return Err(QrPaintError::EmptyContent);
    }
    if size_px < 0 {
        return Err(QrPaintError::NegativeSize(size_px));
    }
    if padding_px < 0 {
        return Err(QrPaintError::NegativePadding(padding_px));
    }
    Ok(())
}
