//! Module matrices and the encoder seam.
//!
//! The QR symbol itself comes from the [`qrcode`] crate. This module only
//! scales its modules into a pixel-sized [`BitMatrix`] with a quiet zone,
//! so the renderers in [`crate::helper`] can map one cell to one pixel.

use log::debug;
use qrcode::types::QrError;
use qrcode::{Color, QrCode};
use thiserror::Error;

use crate::options::QrCodeEcc;

/// A rectangular grid of set (dark) and unset (light) cells.
///
/// Cells are stored row-major. Instances handed out by an encoder are not
/// modified afterwards.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BitMatrix {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl BitMatrix {
    /// Creates a matrix with every cell unset.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns whether the cell at `(x, y)` is set. Out-of-range
    /// coordinates read as unset.
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.bits[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32) {
        if x < self.width && y < self.height {
            let index = self.index(x, y);
            self.bits[index] = true;
        }
    }

    /// Sets a `w` x `h` block whose top-left corner is `(left, top)`,
    /// clipped to the matrix.
    pub fn set_region(&mut self, left: u32, top: u32, w: u32, h: u32) {
        let right = left.saturating_add(w).min(self.width);
        let bottom = top.saturating_add(h).min(self.height);
        if left >= right {
            return;
        }
        for y in top..bottom {
            let row = self.index(0, y);
            self.bits[row + left as usize..row + right as usize].fill(true);
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Number of set cells.
    pub fn count_set(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }
}

/// Why an encoder could not produce a matrix.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Found empty contents")]
    EmptyContent,

    #[error("Requested dimensions are negative: {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("Output of {side}x{side} pixels exceeds the {max}px limit")]
    TooLarge { side: u64, max: u32 },

    #[error("QR encoding failed: {0}")]
    Encoding(#[from] QrError),
}

/// Largest edge, in pixels, of a matrix [`QrCodeEncoder`] will produce.
pub const MAX_SIDE_PX: u32 = 1 << 15;

/// Turns text into a pixel-sized module matrix.
///
/// `width` and `height` are the requested output size in pixels; `margin`
/// is the quiet zone in modules.
pub trait QrEncoder: Send + Sync {
    fn encode(
        &self,
        content: &str,
        width: i32,
        height: i32,
        margin: i32,
        ec_level: QrCodeEcc,
    ) -> Result<BitMatrix, EncodeError>;
}

/// [`QrEncoder`] backed by the `qrcode` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct QrCodeEncoder;

impl QrEncoder for QrCodeEncoder {
    fn encode(
        &self,
        content: &str,
        width: i32,
        height: i32,
        margin: i32,
        ec_level: QrCodeEcc,
    ) -> Result<BitMatrix, EncodeError> {
        if content.is_empty() {
            return Err(EncodeError::EmptyContent);
        }
        if width < 0 || height < 0 {
            return Err(EncodeError::InvalidDimensions { width, height });
        }

        let code = QrCode::with_error_correction_level(content.as_bytes(), ec_level.into())?;
        let matrix = scale_to_output(&code, width as u32, height as u32, margin.max(0) as u32)?;
        debug!(
            "encoded {} bytes into {} modules, output {}x{}",
            content.len(),
            code.width(),
            matrix.width(),
            matrix.height()
        );
        Ok(matrix)
    }
}

/// Scales the symbol by the largest whole factor that fits the requested
/// size (never below one pixel per module) and centers it.
///
/// Sizes are computed in `u64` so any `u32` margin is representable; outputs
/// with an edge above [`MAX_SIDE_PX`] are rejected.
fn scale_to_output(code: &QrCode, width: u32, height: u32, margin: u32) -> Result<BitMatrix, EncodeError> {
    let modules = code.width() as u64;
    let qr_width = modules + u64::from(margin) * 2;
    let output_width = u64::from(width).max(qr_width);
    let output_height = u64::from(height).max(qr_width);
    let side = output_width.max(output_height);
    if side > u64::from(MAX_SIDE_PX) {
        return Err(EncodeError::TooLarge { side, max: MAX_SIDE_PX });
    }

    // Everything below is bounded by MAX_SIDE_PX and fits in u32.
    let modules = modules as u32;
    let (output_width, output_height, qr_width) = (output_width as u32, output_height as u32, qr_width as u32);
    let multiple = (output_width / qr_width).min(output_height / qr_width);
    let left = (output_width - modules * multiple) / 2;
    let top = (output_height - modules * multiple) / 2;

    let mut output = BitMatrix::new(output_width, output_height);
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color == Color::Dark {
            let x = i as u32 % modules;
            let y = i as u32 / modules;
            output.set_region(left + x * multiple, top + y * multiple, multiple, multiple);
        }
    }
    Ok(output)
}
