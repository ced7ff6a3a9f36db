//! Named LED color palette

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Color understood by hub RGB lights and reported by vision sensors
///
/// Discriminants are the protocol color indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Color {
    Black = 0x00,
    Pink = 0x01,
    Purple = 0x02,
    Blue = 0x03,
    LightBlue = 0x04,
    Cyan = 0x05,
    Green = 0x06,
    Yellow = 0x07,
    Orange = 0x08,
    Red = 0x09,
    White = 0x0a,
    None = 0xff,
}

impl Color {
    /// Displayable colors in protocol order (excludes `None`)
    pub const PALETTE: [Color; 11] = [
        Color::Black,
        Color::Pink,
        Color::Purple,
        Color::Blue,
        Color::LightBlue,
        Color::Cyan,
        Color::Green,
        Color::Yellow,
        Color::Orange,
        Color::Red,
        Color::White,
    ];

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Color::Black => "BLACK",
            Color::Pink => "PINK",
            Color::Purple => "PURPLE",
            Color::Blue => "BLUE",
            Color::LightBlue => "LIGHT_BLUE",
            Color::Cyan => "CYAN",
            Color::Green => "GREEN",
            Color::Yellow => "YELLOW",
            Color::Orange => "ORANGE",
            Color::Red => "RED",
            Color::White => "WHITE",
            Color::None => "NONE",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_uppercase();
        Color::PALETTE
            .into_iter()
            .chain(std::iter::once(Color::None))
            .find(|c| c.name() == wanted)
            .ok_or_else(|| ProtocolError::UnknownColor(s.to_string()))
    }
}

impl TryFrom<u8> for Color {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value == Color::None.index() {
            return Ok(Color::None);
        }
        Color::PALETTE
            .get(value as usize)
            .copied()
            .ok_or_else(|| ProtocolError::UnknownColor(format!("{:#04x}", value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_indices_are_ordered() {
        for (i, color) in Color::PALETTE.iter().enumerate() {
            assert_eq!(color.index() as usize, i);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("purple".parse::<Color>().unwrap(), Color::Purple);
        assert_eq!("light-blue".parse::<Color>().unwrap(), Color::LightBlue);
        assert_eq!("NONE".parse::<Color>().unwrap(), Color::None);
        assert!("magenta".parse::<Color>().is_err());
    }

    #[test]
    fn test_from_index() {
        assert_eq!(Color::try_from(0x09).unwrap(), Color::Red);
        assert_eq!(Color::try_from(0xff).unwrap(), Color::None);
        assert!(Color::try_from(0x0b).is_err());
    }
}
