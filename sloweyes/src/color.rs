//! `#rrggbb` colors as stored in settings and cache file names

use crate::error::{ConfigResult, ConfigValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated, lower-case `#rrggbb` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexColor([u8; 3]);

impl HexColor {
    pub const BLACK: HexColor = HexColor([0, 0, 0]);
    pub const WHITE: HexColor = HexColor([255, 255, 255]);

    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Parse `#rrggbb` (either case). `key` names the setting for errors.
    pub fn parse(key: &'static str, text: &str) -> ConfigResult<Self> {
        let invalid = || ConfigValidationError::InvalidColor {
            key,
            value: text.to_string(),
        };
        let hex = text.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn rgb(self) -> [u8; 3] {
        self.0
    }

    pub fn to_color32(self) -> egui::Color32 {
        let [r, g, b] = self.0;
        egui::Color32::from_rgb(r, g, b)
    }

    pub fn from_color32(color: egui::Color32) -> Self {
        Self([color.r(), color.g(), color.b()])
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl TryFrom<String> for HexColor {
    type Error = ConfigValidationError;

    fn try_from(value: String) -> ConfigResult<Self> {
        Self::parse("color", &value)
    }
}

impl From<HexColor> for String {
    fn from(color: HexColor) -> String {
        color.to_string()
    }
}
