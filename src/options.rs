//! Render configuration.

use image::Rgba;
use qrcode::EcLevel;

/// Opaque black, used for set modules.
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
/// Opaque white, used for unset modules.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Fully transparent, used for placeholder bitmaps.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// The logo is drawn at `1 / DEFAULT_LOGO_SCALE` of its original size.
pub const DEFAULT_LOGO_SCALE: u32 = 8;

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    #[default]
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl From<QrCodeEcc> for EcLevel {
    fn from(ecc: QrCodeEcc) -> Self {
        match ecc {
            QrCodeEcc::Low => EcLevel::L,
            QrCodeEcc::Medium => EcLevel::M,
            QrCodeEcc::Quartile => EcLevel::Q,
            QrCodeEcc::High => EcLevel::H,
        }
    }
}

/// Options shared by the plain and the logo generators.
///
/// The defaults reproduce a plain black-on-white code at the lowest
/// error-correction level, with the logo shrunk by a factor of eight.
/// Covering modules with a logo at `Low` can make the code unreadable;
/// use [`RenderOptions::with_ec_level`] to raise it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RenderOptions {
    pub ec_level: QrCodeEcc,
    pub dark: Rgba<u8>,
    pub light: Rgba<u8>,
    pub logo_scale: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ec_level: QrCodeEcc::Low,
            dark: BLACK,
            light: WHITE,
            logo_scale: DEFAULT_LOGO_SCALE,
        }
    }
}

impl RenderOptions {
    pub fn with_ec_level(mut self, ec_level: QrCodeEcc) -> Self {
        self.ec_level = ec_level;
        self
    }

    pub fn with_colors(mut self, dark: Rgba<u8>, light: Rgba<u8>) -> Self {
        self.dark = dark;
        self.light = light;
        self
    }

    /// Sets the logo divisor. Zero is treated as one.
    pub fn with_logo_scale(mut self, logo_scale: u32) -> Self {
        self.logo_scale = logo_scale.max(1);
        self
    }
}
