//! Color palettes and cyclic assignment
//!
//! Categorical palettes for small partner sets, a continuous 256-sample
//! ramp for very large ones, and an explicit policy table mapping partner
//! count to palette choice. Assignment cycles the chosen palette so the
//! i-th ranked partner gets color `i % len`.

use crate::ranking::ConnectionRanking;
use std::collections::HashMap;
use std::fmt;

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Near-black, the default skeleton color.
pub const DEFAULT_SKELETON_COLOR: Color = Color::new(0x00, 0x00, 0x03);

/// 11-step plasma ramp anchors (dark blue → yellow).
pub const PLASMA11: [Color; 11] = [
    Color::new(0x0c, 0x07, 0x86),
    Color::new(0x40, 0x03, 0x9c),
    Color::new(0x6a, 0x00, 0xa7),
    Color::new(0x8f, 0x0d, 0xa3),
    Color::new(0xb0, 0x2a, 0x8f),
    Color::new(0xca, 0x46, 0x78),
    Color::new(0xe0, 0x64, 0x61),
    Color::new(0xf1, 0x82, 0x4c),
    Color::new(0xfc, 0xa6, 0x35),
    Color::new(0xfc, 0xce, 0x25),
    Color::new(0xef, 0xf8, 0x21),
];

/// 11-step viridis ramp anchors (purple → yellow-green).
pub const VIRIDIS11: [Color; 11] = [
    Color::new(0x44, 0x01, 0x54),
    Color::new(0x48, 0x23, 0x74),
    Color::new(0x40, 0x43, 0x87),
    Color::new(0x34, 0x5e, 0x8d),
    Color::new(0x29, 0x78, 0x8e),
    Color::new(0x20, 0x90, 0x8c),
    Color::new(0x22, 0xa7, 0x84),
    Color::new(0x42, 0xbe, 0x71),
    Color::new(0x79, 0xd1, 0x51),
    Color::new(0xbd, 0xde, 0x26),
    Color::new(0xfd, 0xe7, 0x24),
];

/// 23-color iridescent categorical palette, the wide non-looping
/// alternative for pre-synaptic partners.
pub const IRIDESCENT23: [Color; 23] = [
    Color::new(0xfe, 0xfb, 0xe9),
    Color::new(0xfc, 0xf7, 0xd5),
    Color::new(0xf5, 0xf3, 0xc1),
    Color::new(0xea, 0xf0, 0xb5),
    Color::new(0xdd, 0xec, 0xbf),
    Color::new(0xd0, 0xe7, 0xca),
    Color::new(0xc2, 0xe3, 0xd2),
    Color::new(0xb5, 0xdd, 0xd8),
    Color::new(0xa8, 0xd8, 0xdc),
    Color::new(0x9b, 0xd2, 0xe1),
    Color::new(0x8d, 0xcb, 0xe4),
    Color::new(0x81, 0xc4, 0xe7),
    Color::new(0x7b, 0xbc, 0xe7),
    Color::new(0x7e, 0xb2, 0xe4),
    Color::new(0x88, 0xa5, 0xdd),
    Color::new(0x93, 0x98, 0xd2),
    Color::new(0x9b, 0x8a, 0xc4),
    Color::new(0x9d, 0x7d, 0xb2),
    Color::new(0x9a, 0x70, 0x9e),
    Color::new(0x90, 0x6a, 0x81),
    Color::new(0x80, 0x57, 0x70),
    Color::new(0x68, 0x49, 0x57),
    Color::new(0x46, 0x35, 0x3a),
];

/// A concrete ordered list of colors.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Self {
        assert!(!colors.is_empty(), "palette must have at least one color");
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for the i-th ranked partner, cycling once exhausted.
    pub fn color_for(&self, rank: usize) -> Color {
        self.colors[rank % self.colors.len()]
    }

    /// Map each ranked partner name to its cyclic color.
    pub fn assign(&self, ranking: &ConnectionRanking) -> HashMap<String, Color> {
        ranking
            .names()
            .enumerate()
            .map(|(rank, name)| (name.to_string(), self.color_for(rank)))
            .collect()
    }

    /// Resample a ramp to `n` colors by linear interpolation over anchors.
    pub fn sampled(anchors: &[Color], n: usize) -> Self {
        assert!(anchors.len() >= 2, "ramp needs at least two anchors");
        assert!(n >= 1);
        if n == 1 {
            return Self::new(vec![anchors[0]]);
        }
        let colors = (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64 * (anchors.len() - 1) as f64;
                let lo = t.floor() as usize;
                let hi = (lo + 1).min(anchors.len() - 1);
                let frac = t - lo as f64;
                let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
                Color::new(
                    lerp(anchors[lo].r, anchors[hi].r),
                    lerp(anchors[lo].g, anchors[hi].g),
                    lerp(anchors[lo].b, anchors[hi].b),
                )
            })
            .collect();
        Self::new(colors)
    }
}

/// Palette family used when the caller does not supply an explicit palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteFamily {
    /// Default for pre-synaptic partners.
    Plasma,
    /// Default for post-synaptic partners.
    Viridis,
}

impl PaletteFamily {
    fn anchors(self) -> &'static [Color] {
        match self {
            PaletteFamily::Plasma => &PLASMA11,
            PaletteFamily::Viridis => &VIRIDIS11,
        }
    }

    /// Wide non-looping alternative for mid-sized partner sets.
    fn wide_fallback(self) -> Palette {
        match self {
            PaletteFamily::Plasma => Palette::new(IRIDESCENT23.to_vec()),
            PaletteFamily::Viridis => Palette::sampled(&VIRIDIS11, 256),
        }
    }
}

/// Policy table mapping partner count to palette choice:
///
/// | partner count L          | choice                                  |
/// |--------------------------|-----------------------------------------|
/// | L ≤ 11                   | categorical, sampled to max(L, 3)       |
/// | 11 < L ≤ 100, looping    | the 11-color categorical                |
/// | 11 < L ≤ 100, no looping | the family's wide fallback              |
/// | L > 100                  | 256-sample continuous ramp              |
pub fn choose_palette(family: PaletteFamily, partner_count: usize, loop_colors: bool) -> Palette {
    let anchors = family.anchors();
    if partner_count <= 11 {
        Palette::sampled(anchors, partner_count.max(3))
    } else if partner_count > 100 {
        Palette::sampled(anchors, 256)
    } else if loop_colors {
        Palette::new(anchors.to_vec())
    } else {
        family.wide_fallback()
    }
}
