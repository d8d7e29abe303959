//! Color model: normalize heterogeneous color notations to one canonical,
//! comparable key.
//!
//! Two colors are equal iff their canonical keys match. Equality is by
//! key, not by visual similarity: `#ff0000`, `#f00` and `rgb(255, 0, 0)`
//! all collapse to `rgb(255,0,0)`, while the keyword `red` stays `red`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ColorError;

/// A normalized color.
///
/// The [`Display`](fmt::Display) output is the canonical key, and
/// normalizing a key yields the same color again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Color {
    /// Opaque sRGB triple.
    Rgb(u8, u8, u8),
    /// Translucent sRGB color; alpha as a byte (`0..255`).
    Rgba(u8, u8, u8, u8),
    /// Any other notation (named colors, `currentcolor`, paint server
    /// references), lower-cased with whitespace removed.
    Keyword(String),
}

/// CSS named colors with a known sRGB value.
///
/// Keywords outside this table are still valid colors; they just have no
/// hex display form or luminance.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("silver", [192, 192, 192]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("white", [255, 255, 255]),
    ("maroon", [128, 0, 0]),
    ("red", [255, 0, 0]),
    ("purple", [128, 0, 128]),
    ("fuchsia", [255, 0, 255]),
    ("magenta", [255, 0, 255]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("olive", [128, 128, 0]),
    ("yellow", [255, 255, 0]),
    ("navy", [0, 0, 128]),
    ("blue", [0, 0, 255]),
    ("teal", [0, 128, 128]),
    ("aqua", [0, 255, 255]),
    ("cyan", [0, 255, 255]),
    ("orange", [255, 165, 0]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
    ("gold", [255, 215, 0]),
    ("beige", [245, 245, 220]),
    ("ivory", [255, 255, 240]),
    ("whitesmoke", [245, 245, 245]),
    ("lightgray", [211, 211, 211]),
    ("lightgrey", [211, 211, 211]),
    ("darkgray", [169, 169, 169]),
    ("darkgrey", [169, 169, 169]),
];

impl Color {
    /// Parse any supported notation.
    ///
    /// Returns `Ok(None)` for `none`, `transparent` and empty input.
    ///
    /// # Errors
    ///
    /// Returns [`ColorError`] for malformed hex or functional notation.
    /// Anything else is accepted as a keyword.
    pub fn parse(raw: &str) -> Result<Option<Self>, ColorError> {
        let lowered = raw.trim().to_lowercase();
        // Classified on the whitespace-free form so `rgb (..)` and `rgb(..)`
        // share one parse; functional channels still split on whitespace.
        let compact: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "" | "none" | "transparent" => Ok(None),
            t if t.starts_with('#') => parse_hex(t).map(Some),
            t if t.starts_with("rgb(") || t.starts_with("rgba(") => {
                parse_functional(&lowered).map(Some)
            }
            _ => Ok(Some(Self::Keyword(compact))),
        }
    }

    /// Lenient variant of [`parse`](Self::parse): malformed input
    /// normalizes to `None`, like `none` and `transparent` do.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        Self::parse(raw).ok().flatten()
    }

    /// The sRGB components, resolving known keywords.
    #[must_use]
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        match self {
            Self::Rgb(r, g, b) | Self::Rgba(r, g, b, _) => Some((*r, *g, *b)),
            Self::Keyword(name) => NAMED_COLORS
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, [r, g, b])| (*r, *g, *b)),
        }
    }

    /// Hex form for display and for re-emitting into documents.
    ///
    /// `#rrggbb` for opaque colors, `#rrggbbaa` for translucent ones.
    /// Unknown keywords are returned verbatim. Parsing the result yields
    /// the same color for every `Rgb`/`Rgba` value.
    #[must_use]
    pub fn to_display_hex(&self) -> String {
        match self {
            Self::Rgb(r, g, b) => format!("#{r:02x}{g:02x}{b:02x}"),
            Self::Rgba(r, g, b, a) => format!("#{r:02x}{g:02x}{b:02x}{a:02x}"),
            Self::Keyword(name) => self.rgb().map_or_else(
                || name.clone(),
                |(r, g, b)| format!("#{r:02x}{g:02x}{b:02x}"),
            ),
        }
    }

    /// Relative luminance in `0.0..=1.0` (sRGB linearised, Rec. 709
    /// weights). `None` for keywords without a known value.
    #[must_use]
    pub fn luminance(&self) -> Option<f64> {
        let (r, g, b) = self.rgb()?;
        let lin = |c: u8| {
            let s = f64::from(c) / 255.0;
            if s <= 0.040_45 {
                s / 12.92
            } else {
                ((s + 0.055) / 1.055).powf(2.4)
            }
        };
        Some(0.2126f64.mul_add(lin(r), 0.7152f64.mul_add(lin(g), 0.0722 * lin(b))))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(r, g, b) => write!(f, "rgb({r},{g},{b})"),
            Self::Rgba(r, g, b, a) => {
                // Three decimals are enough to recover the alpha byte.
                let alpha = format!("{:.3}", f64::from(*a) / 255.0);
                let alpha = alpha.trim_end_matches('0').trim_end_matches('.');
                write!(f, "rgba({r},{g},{b},{alpha})")
            }
            Self::Keyword(name) => f.write_str(name),
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match Self::parse(&value) {
            Ok(Some(color)) => Ok(color),
            Ok(None) => Err(format!("{value:?} is not a paint color")),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
fn parse_hex(text: &str) -> Result<Color, ColorError> {
    let digits = &text[1..];
    let err = || ColorError::Hex(text.to_owned());
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(err());
    }
    let expanded: String = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_owned(),
        _ => return Err(err()),
    };
    let byte = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| err());
    let (r, g, b) = (byte(0)?, byte(2)?, byte(4)?);
    if expanded.len() == 8 {
        let a = byte(6)?;
        if a == u8::MAX {
            return Ok(Color::Rgb(r, g, b));
        }
        return Ok(Color::Rgba(r, g, b, a));
    }
    Ok(Color::Rgb(r, g, b))
}

/// `rgb(r, g, b)`, `rgba(r, g, b, a)`, `rgb(r g b / a)`; channels as
/// numbers or percentages, alpha as a fraction or percentage.
fn parse_functional(text: &str) -> Result<Color, ColorError> {
    let err = || ColorError::Functional(text.to_owned());
    let open = text.find('(').ok_or_else(err)?;
    let inner = text[open + 1..].strip_suffix(')').ok_or_else(err)?;
    let parts: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(err());
    }

    let channel = |s: &str| -> Result<u8, ColorError> {
        let value = if let Some(pct) = s.strip_suffix('%') {
            pct.parse::<f64>().map_err(|_| err())? * 2.55
        } else {
            s.parse::<f64>().map_err(|_| err())?
        };
        if !value.is_finite() {
            return Err(err());
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Ok(value.round().clamp(0.0, 255.0) as u8)
    };

    let (r, g, b) = (channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);
    let Some(alpha_text) = parts.get(3) else {
        return Ok(Color::Rgb(r, g, b));
    };
    let alpha = if let Some(pct) = alpha_text.strip_suffix('%') {
        pct.parse::<f64>().map_err(|_| err())? / 100.0
    } else {
        alpha_text.parse::<f64>().map_err(|_| err())?
    };
    if !alpha.is_finite() {
        return Err(err());
    }
    if alpha >= 1.0 {
        return Ok(Color::Rgb(r, g, b));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let a = (alpha.max(0.0) * 255.0).round() as u8;
    if a == u8::MAX {
        return Ok(Color::Rgb(r, g, b));
    }
    Ok(Color::Rgba(r, g, b, a))
}
