//! Presentation attribute cascade.
//!
//! Only the properties the engine models are resolved: `fill`, `stroke`,
//! `stroke-width` and `fill-rule`. A `style` declaration wins over the
//! attribute of the same name; `inherit` and absent values take the
//! parent's.

use despeck_engine::{Color, FillRule};
use log::{debug, warn};

use crate::SvgError;

/// Resolved paint for one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub fill_rule: FillRule,
}

impl Default for Style {
    /// SVG initial values: black fill, no stroke, width 1.
    fn default() -> Self {
        Self {
            fill: Some(Color::Rgb(0, 0, 0)),
            stroke: None,
            stroke_width: 1.0,
            fill_rule: FillRule::NonZero,
        }
    }
}

impl Style {
    /// Resolve a child's style. `get` returns the raw value of a property
    /// for the child, already preferring `style` declarations.
    ///
    /// # Errors
    ///
    /// Returns [`SvgError::InvalidColor`] for a malformed paint color.
    pub fn cascade(&self, get: impl Fn(&str) -> Option<String>) -> Result<Self, SvgError> {
        let mut style = self.clone();
        if let Some(raw) = get("fill").filter(|v| !is_inherit(v)) {
            style.fill = paint("fill", &raw)?;
        }
        if let Some(raw) = get("stroke").filter(|v| !is_inherit(v)) {
            style.stroke = paint("stroke", &raw)?;
        }
        if let Some(raw) = get("stroke-width").filter(|v| !is_inherit(v)) {
            match parse_length(&raw) {
                Some(width) if width >= 0.0 => style.stroke_width = width,
                _ => debug!("ignoring stroke-width {raw:?}"),
            }
        }
        if let Some(raw) = get("fill-rule").filter(|v| !is_inherit(v)) {
            match raw.trim() {
                "evenodd" => style.fill_rule = FillRule::EvenOdd,
                "nonzero" => style.fill_rule = FillRule::NonZero,
                other => debug!("ignoring fill-rule {other:?}"),
            }
        }
        Ok(style)
    }
}

fn is_inherit(value: &str) -> bool {
    value.trim() == "inherit"
}

/// Parse a paint value. Paint server references resolve to their fallback
/// color, or to no paint when none is given.
fn paint(attribute: &str, raw: &str) -> Result<Option<Color>, SvgError> {
    let raw = raw.trim();
    if raw.starts_with("url(") {
        let fallback = raw.find(')').map_or("", |i| raw[i + 1..].trim());
        if fallback.is_empty() {
            warn!("{attribute} {raw:?} references a paint server; treating as none");
        }
        return paint(attribute, fallback);
    }
    Color::parse(raw).map_err(|source| SvgError::InvalidColor {
        attribute: attribute.to_owned(),
        source,
    })
}

/// Split a `style` attribute into `(property, value)` pairs.
#[must_use]
pub fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim().trim_end_matches("!important").trim();
            (!name.is_empty()).then(|| (name.to_owned(), value.to_owned()))
        })
        .collect()
}

/// Parse a length in user units: a bare number or a `px` value.
#[must_use]
pub fn parse_length(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let number = raw.strip_suffix("px").unwrap_or(raw).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn cascade(parent: &Style, props: &[(&str, &str)]) -> Result<Style, SvgError> {
        let props: HashMap<String, String> = props
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        parent.cascade(|name| props.get(name).cloned())
    }

    #[test]
    fn defaults_are_black_fill_without_stroke() {
        let style = Style::default();
        assert_eq!(style.fill, Some(Color::Rgb(0, 0, 0)));
        assert_eq!(style.stroke, None);
    }

    #[test]
    fn child_overrides_and_inherits() {
        let parent = cascade(&Style::default(), &[("fill", "#f00"), ("stroke", "blue")]).unwrap();
        let child = cascade(&parent, &[("fill", "inherit"), ("stroke", "none")]).unwrap();
        assert_eq!(child.fill, Some(Color::Rgb(255, 0, 0)));
        assert_eq!(child.stroke, None);
    }

    #[test]
    fn fill_rule_and_width() {
        let style = cascade(
            &Style::default(),
            &[("fill-rule", "evenodd"), ("stroke-width", "2.5px")],
        )
        .unwrap();
        assert_eq!(style.fill_rule, FillRule::EvenOdd);
        assert!((style.stroke_width - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn paint_server_uses_fallback() {
        let style = cascade(&Style::default(), &[("fill", "url(#grad) #00ff00")]).unwrap();
        assert_eq!(style.fill, Some(Color::Rgb(0, 255, 0)));
        let style = cascade(&Style::default(), &[("fill", "url(#grad)")]).unwrap();
        assert_eq!(style.fill, None);
    }

    #[test]
    fn malformed_color_is_an_error() {
        let err = cascade(&Style::default(), &[("fill", "#12")]).unwrap_err();
        assert!(matches!(err, SvgError::InvalidColor { ref attribute, .. } if attribute == "fill"));
    }

    #[test]
    fn declarations_split_style_attribute() {
        let decls = declarations("fill: red; stroke:none ;; bogus");
        assert_eq!(
            decls,
            vec![
                ("fill".to_owned(), "red".to_owned()),
                ("stroke".to_owned(), "none".to_owned()),
            ]
        );
    }

    #[test]
    fn lengths() {
        assert_eq!(parse_length("12"), Some(12.0));
        assert_eq!(parse_length(" 3.5px "), Some(3.5));
        assert_eq!(parse_length("10mm"), None);
        assert_eq!(parse_length("50%"), None);
    }
}
