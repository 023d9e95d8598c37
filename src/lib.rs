//! # qrpaint
//!
//! Render text as a QR code bitmap, optionally with a logo over its center.
//!
//! `qrpaint` takes the module grid produced by the [`qrcode`](https://docs.rs/qrcode) crate,
//! scales it to the requested pixel size with a quiet zone, and turns it into an RGBA
//! [`image`] buffer. When the encoder cannot represent the input, callers get no bitmap
//! and typically show a transparent placeholder instead.
//!
//! ## Features
//!
//! - Black-on-white bitmaps sized in pixels, or in dp through [`units::Density`].
//! - Logo overlay, shrunk and centered over the code.
//! - A [`painter::QrPainter`] that renders off the calling thread and re-renders on input change.
//! - Pluggable encoders through [`matrix::QrEncoder`].
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrpaint = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Generate a bitmap, falling back to a transparent one:
//!
//! ```rust
//! use qrpaint::helper::{create_default_bitmap, generate_qr_bitmap};
//!
//! let bitmap = generate_qr_bitmap("https://example.com", 300, 1)
//!     .expect("valid request")
//!     .unwrap_or_else(|| create_default_bitmap(300));
//! assert_eq!(bitmap.dimensions(), (300, 300));
//! ```
//!
//! Keep a painter around in a UI:
//!
//! ```rust
//! use qrpaint::painter::remember_qr_bitmap_painter;
//! use qrpaint::units::{Density, Dp};
//!
//! let mut painter = remember_qr_bitmap_painter("Hello", Dp(150.0), Dp(0.0), Density::new(2.0)).unwrap();
//! // Every frame:
//! painter.poll();
//! let _image = painter.image();
//! ```
//!
//! ## Modules
//!
//! - [`helper`]: Bitmap generation, logo compositing and PNG output.
//! - [`matrix`]: Module matrices and the encoder seam.
//! - [`painter`]: Background rendering with a placeholder.
//! - [`options`]: Render configuration.
//! - [`units`]: dp to pixel conversion.

pub mod error;
pub mod helper;
pub mod matrix;
pub mod options;
pub mod painter;
pub mod units;

pub use error::{QrPaintError, Result};
pub use helper::Bitmap;
pub use options::{QrCodeEcc, RenderOptions};
