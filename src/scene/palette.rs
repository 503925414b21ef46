//! Colour themes. Each theme is a fixed five-colour palette.

use clap::ValueEnum;
use serde::Deserialize;

use super::surface::Rgb;

pub type Palette = [Rgb; 5];

const CYBERPUNK: Palette = [
    Rgb::hex(0xff00ff),
    Rgb::hex(0x00ffff),
    Rgb::hex(0xffff00),
    Rgb::hex(0xff00aa),
    Rgb::hex(0x00aaff),
];

const NEON: Palette = [
    Rgb::hex(0x39ff14),
    Rgb::hex(0xff3131),
    Rgb::hex(0x00ffff),
    Rgb::hex(0xff00ff),
    Rgb::hex(0xffff00),
];

const PASTEL: Palette = [
    Rgb::hex(0xffb3ba),
    Rgb::hex(0xffdfba),
    Rgb::hex(0xffffba),
    Rgb::hex(0xbaffc9),
    Rgb::hex(0xbae1ff),
];

const MONOCHROME: Palette = [
    Rgb::hex(0xffffff),
    Rgb::hex(0xdddddd),
    Rgb::hex(0xbbbbbb),
    Rgb::hex(0x999999),
    Rgb::hex(0x777777),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Cyberpunk,
    Neon,
    Pastel,
    Monochrome,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Cyberpunk, Theme::Neon, Theme::Pastel, Theme::Monochrome];

    pub fn palette(self) -> &'static Palette {
        match self {
            Theme::Cyberpunk => &CYBERPUNK,
            Theme::Neon => &NEON,
            Theme::Pastel => &PASTEL,
            Theme::Monochrome => &MONOCHROME,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Cyberpunk => "cyberpunk",
            Theme::Neon => "neon",
            Theme::Pastel => "pastel",
            Theme::Monochrome => "monochrome",
        }
    }

    /// Next theme in display order, wrapping around.
    pub fn next(self) -> Theme {
        let i = Self::ALL.iter().position(|&t| t == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Palette entry for any index, wrapping.
pub fn pick(palette: &Palette, index: usize) -> Rgb {
    palette[index % palette.len()]
}
