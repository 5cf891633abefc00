use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Create a color from components.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse exactly eight hex digits in `AARRGGBB` order.
    pub fn parse_argb_hex(text: &str) -> Result<Self, LayoutError> {
        let invalid = || LayoutError::InvalidColor {
            text: text.to_string(),
        };
        if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let packed = u32::from_str_radix(text, 16).map_err(|_| invalid())?;
        Ok(Self::from_packed_argb(packed))
    }

    /// Pack as `0xAARRGGBB`.
    pub fn to_packed_argb(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    /// Unpack from `0xAARRGGBB`.
    pub fn from_packed_argb(argb: u32) -> Self {
        let [a, r, g, b] = argb.to_be_bytes();
        Self { r, g, b, a }
    }
}
