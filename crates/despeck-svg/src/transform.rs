//! `transform` attribute parsing.
//!
//! Accepts the SVG transform list grammar: `matrix`, `translate`, `scale`,
//! `rotate`, `skewX` and `skewY`, separated by whitespace and/or commas.
//! The list composes left to right, so the rightmost function is applied
//! to a point first.

use despeck_engine::Transform;

use crate::SvgError;

/// Parse a transform list. Empty input yields the identity.
///
/// # Errors
///
/// Returns [`SvgError::InvalidTransform`] for unknown functions, wrong
/// argument counts, unbalanced parentheses or non-numeric arguments.
pub fn parse_transform(text: &str) -> Result<Transform, SvgError> {
    let err = || SvgError::InvalidTransform(text.to_owned());
    let mut result = Transform::IDENTITY;
    let mut rest = text.trim_start_matches(is_separator);

    while !rest.is_empty() {
        let open = rest.find('(').ok_or_else(err)?;
        let close = rest[open..].find(')').ok_or_else(err)? + open;
        let name = rest[..open].trim();
        let args = parse_numbers(&rest[open + 1..close]).ok_or_else(err)?;
        let step = function(name, &args).ok_or_else(err)?;
        result = result.multiply(&step);
        rest = rest[close + 1..].trim_start_matches(is_separator);
    }
    Ok(result)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn parse_numbers(args: &str) -> Option<Vec<f64>> {
    args.split(is_separator)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

fn function(name: &str, args: &[f64]) -> Option<Transform> {
    let t = match (name, args) {
        ("matrix", &[a, b, c, d, e, f]) => Transform::new(a, b, c, d, e, f),
        ("translate", &[tx]) => Transform::translate(tx, 0.0),
        ("translate", &[tx, ty]) => Transform::translate(tx, ty),
        ("scale", &[s]) => Transform::scale(s, s),
        ("scale", &[sx, sy]) => Transform::scale(sx, sy),
        ("rotate", &[angle]) => Transform::rotate(angle),
        ("rotate", &[angle, cx, cy]) => Transform::rotate_about(angle, cx, cy),
        ("skewX", &[angle]) => Transform::skew_x(angle),
        ("skewY", &[angle]) => Transform::skew_y(angle),
        _ => return None,
    };
    Some(t)
}

/// Format a transform as an SVG `matrix(...)` function.
#[must_use]
pub fn format_matrix(t: &Transform) -> String {
    format!("matrix({} {} {} {} {} {})", t.a, t.b, t.c, t.d, t.e, t.f)
}
