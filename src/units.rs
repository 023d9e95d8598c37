//! Density-independent lengths.

/// A length in density-independent pixels.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Default)]
pub struct Dp(pub f32);

impl Dp {
    pub const ZERO: Dp = Dp(0.0);
}

/// Screen density used to turn [`Dp`] into physical pixels.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Density {
    /// Pixels per dp.
    pub density: f32,
}

impl Default for Density {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Density {
    pub fn new(density: f32) -> Self {
        Self { density }
    }

    pub fn to_px(&self, dp: Dp) -> f32 {
        dp.0 * self.density
    }

    /// Converts to whole pixels, rounding half away from zero.
    /// Infinite lengths saturate.
    pub fn round_to_px(&self, dp: Dp) -> i32 {
        let px = self.to_px(dp);
        if px.is_infinite() {
            return if px > 0.0 { i32::MAX } else { i32::MIN };
        }
        px.round() as i32
    }
}
