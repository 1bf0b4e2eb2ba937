//! Bar colors: explicit color lists or a sampled colormap.

use std::fmt;
use std::str::FromStr;

use plotters::style::RGBColor;

/// Continuous colormaps, sampled evenly across series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Summer,
    Autumn,
    Winter,
    Spring,
    Cool,
    Jet,
}

impl Colormap {
    pub const NAMES: [&'static str; 6] = ["summer", "autumn", "winter", "spring", "cool", "jet"];

    /// Color at position `t` in `[0, 1]`.
    pub fn sample(self, t: f64) -> RGBColor {
        let t = t.clamp(0.0, 1.0);
        let (r, g, b) = match self {
            Self::Summer => (t, 0.5 + t / 2.0, 0.4),
            Self::Autumn => (1.0, t, 0.0),
            Self::Winter => (0.0, t, 1.0 - t / 2.0),
            Self::Spring => (1.0, t, 1.0 - t),
            Self::Cool => (t, 1.0 - t, 1.0),
            Self::Jet => (
                jet_channel(4.0f64.mul_add(t, -3.0)),
                jet_channel(4.0f64.mul_add(t, -2.0)),
                jet_channel(4.0f64.mul_add(t, -1.0)),
            ),
        };
        RGBColor(channel(r), channel(g), channel(b))
    }
}

impl FromStr for Colormap {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summer" => Ok(Self::Summer),
            "autumn" => Ok(Self::Autumn),
            "winter" => Ok(Self::Winter),
            "spring" => Ok(Self::Spring),
            "cool" => Ok(Self::Cool),
            "jet" => Ok(Self::Jet),
            _ => Err(()),
        }
    }
}

fn jet_channel(x: f64) -> f64 {
    (1.5 - x.abs()).clamp(0.0, 1.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteError {
    pub color: String,
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown color '{}' (use a name such as 'orange', a one-letter code such as 'r', '#rrggbb', or one of: {})",
            self.color,
            Colormap::NAMES.join(", ")
        )
    }
}

impl std::error::Error for PaletteError {}

/// How series are colored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Palette {
    /// Fixed colors, cycled when there are more series than colors.
    Explicit(Vec<RGBColor>),
    Colormap(Colormap),
}

impl Palette {
    /// Parse `--colors` values. A leading colormap name selects that
    /// colormap; anything else must be a list of colors. An empty list
    /// yields `default`.
    pub fn parse(specs: &[String], default: Colormap) -> Result<Self, PaletteError> {
        let Some(first) = specs.first() else {
            return Ok(Self::Colormap(default));
        };
        if let Ok(map) = first.parse::<Colormap>() {
            return Ok(Self::Colormap(map));
        }
        specs
            .iter()
            .map(|spec| parse_color(spec.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Explicit)
    }

    /// Exactly `n` colors.
    pub fn colors(&self, n: usize) -> Vec<RGBColor> {
        match self {
            Self::Explicit(colors) if colors.is_empty() => Vec::new(),
            Self::Explicit(colors) => colors.iter().copied().cycle().take(n).collect(),
            Self::Colormap(map) => (0..n)
                .map(|i| {
                    if n <= 1 {
                        map.sample(0.0)
                    } else {
                        #[allow(clippy::cast_precision_loss)]
                        let t = i as f64 / (n - 1) as f64;
                        map.sample(t)
                    }
                })
                .collect(),
        }
    }
}

/// One-letter codes, a small set of named colors, or `#rrggbb`.
pub fn parse_color(spec: &str) -> Result<RGBColor, PaletteError> {
    let trimmed = spec.trim();
    let lower = trimmed.to_ascii_lowercase();
    let named = match lower.as_str() {
        "b" | "blue" => Some((0x1f, 0x77, 0xb4)),
        "g" | "green" => Some((0x2c, 0xa0, 0x2c)),
        "r" | "red" => Some((0xd6, 0x27, 0x28)),
        "c" | "cyan" => Some((0x17, 0xbe, 0xcf)),
        "m" | "magenta" => Some((0xbf, 0x00, 0xbf)),
        "y" | "yellow" => Some((0xbc, 0xbd, 0x22)),
        "k" | "black" => Some((0, 0, 0)),
        "w" | "white" => Some((0xff, 0xff, 0xff)),
        "orange" => Some((0xff, 0x7f, 0x0e)),
        "purple" => Some((0x94, 0x67, 0xbd)),
        "brown" => Some((0x8c, 0x56, 0x4b)),
        "pink" => Some((0xe3, 0x77, 0xc2)),
        "gray" | "grey" => Some((0x7f, 0x7f, 0x7f)),
        "olive" => Some((0x80, 0x80, 0x00)),
        "navy" => Some((0x00, 0x00, 0x80)),
        "teal" => Some((0x00, 0x80, 0x80)),
        _ => None,
    };
    if let Some((r, g, b)) = named {
        return Ok(RGBColor(r, g, b));
    }

    let unknown = || PaletteError {
        color: trimmed.to_string(),
    };
    let hex = lower.strip_prefix('#').ok_or_else(unknown)?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(unknown());
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| unknown());
    Ok(RGBColor(byte(0)?, byte(2)?, byte(4)?))
}
