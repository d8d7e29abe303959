//! Shared value types for the despeck engine: points, axis-aligned
//! rectangles, affine transforms and the error taxonomy.

use geo::AffineTransform;
use serde::{Deserialize, Serialize};

/// A 2D point. Global points live in the scene's root coordinate space;
/// local points live in a single shape's untransformed space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Returns `true` if both coordinates are finite.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<Point> for geo::Coord<f64> {
    fn from(p: Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<geo::Coord<f64>> for Point {
    fn from(c: geo::Coord<f64>) -> Self {
        Self::new(c.x, c.y)
    }
}

/// An axis-aligned rectangle (`x`/`y` is the minimum corner).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x.
    pub x: f64,
    /// Minimum y.
    pub y: f64,
    /// Extent along x (never negative for rectangles built by
    /// [`Rect::envelope`]).
    pub width: f64,
    /// Extent along y.
    pub height: f64,
}

impl Rect {
    /// Create a rectangle from its minimum corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The axis-aligned envelope of a set of points: min/max of the x and
    /// y coordinates.
    ///
    /// Returns `None` for an empty iterator.
    pub fn envelope(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Maximum x.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Maximum y.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// `width * height`. This is the area measure used by every
    /// threshold decision in the engine.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            self.width.mul_add(0.5, self.x),
            self.height.mul_add(0.5, self.y),
        )
    }

    /// The four corners in `(min,min)`, `(max,min)`, `(min,max)`,
    /// `(max,max)` order.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.x, self.bottom()),
            Point::new(self.right(), self.bottom()),
        ]
    }

    /// Inclusive point containment (points on the border are inside).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Inclusive overlap test: rectangles sharing only an edge overlap.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x <= other.right()
            && other.x <= self.right()
            && self.y <= other.bottom()
            && other.y <= self.bottom()
    }

    /// Returns `true` if every field is finite.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// A 2D affine transform in SVG `matrix(a b c d e f)` order:
///
/// ```text
/// x' = a*x + c*y + e
/// y' = b*x + d*y + f
/// ```
///
/// Application and inversion are delegated to [`geo::AffineTransform`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    /// Create a transform from SVG matrix components.
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// `translate(tx ty)`.
    #[must_use]
    pub const fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `scale(sx sy)`.
    #[must_use]
    pub const fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// `rotate(degrees)` about the origin.
    #[must_use]
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// `rotate(degrees cx cy)`: rotation about an arbitrary center.
    #[must_use]
    pub fn rotate_about(degrees: f64, cx: f64, cy: f64) -> Self {
        Self::translate(cx, cy)
            .multiply(&Self::rotate(degrees))
            .multiply(&Self::translate(-cx, -cy))
    }

    /// `skewX(degrees)`.
    #[must_use]
    pub fn skew_x(degrees: f64) -> Self {
        Self::new(1.0, 0.0, degrees.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    /// `skewY(degrees)`.
    #[must_use]
    pub fn skew_y(degrees: f64) -> Self {
        Self::new(1.0, degrees.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Matrix product `self * other`.
    ///
    /// Matches SVG transform-list semantics: `transform="A B"` maps a
    /// point through `B` first, then `A`, which is `A.multiply(&B)`. A
    /// shape's cumulative transform is `parent.multiply(&local)`.
    #[must_use]
    pub fn multiply(&self, other: &Self) -> Self {
        Self::new(
            self.a.mul_add(other.a, self.c * other.b),
            self.b.mul_add(other.a, self.d * other.b),
            self.a.mul_add(other.c, self.c * other.d),
            self.b.mul_add(other.c, self.d * other.d),
            self.a.mul_add(other.e, self.c.mul_add(other.f, self.e)),
            self.b.mul_add(other.e, self.d.mul_add(other.f, self.f)),
        )
    }

    /// Returns `true` for the exact identity matrix.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// The equivalent `geo` transform.
    #[must_use]
    pub fn to_affine(&self) -> AffineTransform<f64> {
        AffineTransform::new(self.a, self.c, self.e, self.b, self.d, self.f)
    }

    /// Map a point through the transform.
    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        self.to_affine().apply(p.into()).into()
    }

    /// The inverse transform, or `None` when the matrix is singular or
    /// contains non-finite components.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.a.mul_add(self.d, -(self.b * self.c));
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return None;
        }
        let inv = self.to_affine().inverse()?;
        Some(Self::new(inv.a(), inv.d(), inv.b(), inv.e(), inv.xoff(), inv.yoff()))
    }
}

/// Errors raised by geometry services. These are recovered locally by
/// every engine operation (the offending shape or union pair is skipped).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// The shape has no drawable extent (empty path, zero-size primitive).
    #[error("shape has no drawable geometry")]
    Empty,

    /// The path `d` attribute could not be parsed.
    #[error("invalid path data: {0}")]
    PathData(String),

    /// A coordinate or transform component is NaN or infinite.
    #[error("geometry contains non-finite coordinates")]
    NonFinite,

    /// The boolean union of two outlines failed or produced nothing.
    #[error("boolean union failed: {0}")]
    Union(String),
}

/// A color string that is neither a keyword nor a well-formed hex or
/// functional color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    /// Malformed `#rgb` / `#rrggbb` notation.
    #[error("invalid hex color {0:?}")]
    Hex(String),

    /// Malformed `rgb()` / `rgba()` notation.
    #[error("invalid functional color {0:?}")]
    Functional(String),
}

/// Input errors reported by [`Editor`](crate::editor::Editor) operations.
///
/// An operation that returns an error has not mutated the scene or the
/// history.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A numeric option is negative, NaN or infinite.
    #[error("invalid option {name}: {value}")]
    InvalidOption {
        /// Option name as exposed to callers.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A stroke sample was requested without an active stroke.
    #[error("no active brush stroke")]
    NoActiveStroke,
}

/// Reject negative or non-finite numeric options.
///
/// # Errors
///
/// Returns [`EngineError::InvalidOption`] naming the option.
pub fn check_non_negative(name: &'static str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(EngineError::InvalidOption { name, value })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn assert_point_near(actual: Point, expected: Point) {
        assert!(
            actual.distance(expected) < 1e-9,
            "expected ({}, {}), got ({}, {})",
            expected.x,
            expected.y,
            actual.x,
            actual.y,
        );
    }

    // --- Point ---

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f64::EPSILON);
        assert!((a.distance_squared(b) - 25.0).abs() < f64::EPSILON);
    }

    // --- Rect ---

    #[test]
    fn envelope_of_points() {
        let r = Rect::envelope([
            Point::new(3.0, -1.0),
            Point::new(-2.0, 4.0),
            Point::new(1.0, 1.0),
        ]);
        assert_eq!(r, Some(Rect::new(-2.0, -1.0, 5.0, 5.0)));
    }

    #[test]
    fn envelope_of_nothing_is_none() {
        assert_eq!(Rect::envelope(std::iter::empty()), None);
    }

    #[test]
    fn touching_rects_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 5.0, 5.0);
        let c = Rect::new(10.5, 0.0, 5.0, 5.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn rect_area_and_center() {
        let r = Rect::new(2.0, 4.0, 6.0, 2.0);
        assert!((r.area() - 12.0).abs() < f64::EPSILON);
        assert_eq!(r.center(), Point::new(5.0, 5.0));
        assert!(r.contains(Point::new(8.0, 6.0)));
        assert!(!r.contains(Point::new(8.1, 6.0)));
    }

    // --- Transform ---

    #[test]
    fn translate_then_scale_list_semantics() {
        // transform="translate(10 0) scale(2)": scale first, then translate.
        let t = Transform::translate(10.0, 0.0).multiply(&Transform::scale(2.0, 2.0));
        assert_point_near(t.apply(Point::new(1.0, 1.0)), Point::new(12.0, 2.0));
    }

    #[test]
    fn rotate_quarter_turn() {
        let t = Transform::rotate(90.0);
        assert_point_near(t.apply(Point::new(1.0, 0.0)), Point::new(0.0, 1.0));
    }

    #[test]
    fn rotate_about_center_keeps_center_fixed() {
        let t = Transform::rotate_about(45.0, 5.0, 5.0);
        assert_point_near(t.apply(Point::new(5.0, 5.0)), Point::new(5.0, 5.0));
    }

    #[test]
    fn inverse_round_trips() {
        let t = Transform::new(2.0, 0.5, -0.25, 1.5, 7.0, -3.0);
        let inv = t.inverse().unwrap_or(Transform::IDENTITY);
        let p = Point::new(4.0, -9.0);
        assert_point_near(inv.apply(t.apply(p)), p);
    }

    #[test]
    fn singular_transform_has_no_inverse() {
        assert_eq!(Transform::scale(0.0, 1.0).inverse(), None);
        assert_eq!(Transform::new(f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0).inverse(), None);
    }

    #[test]
    fn identity_detection() {
        assert!(Transform::default().is_identity());
        assert!(!Transform::translate(1.0, 0.0).is_identity());
    }

    // --- Options ---

    #[test]
    fn check_non_negative_rejects_nan_and_negative() {
        assert!(check_non_negative("radius", 0.0).is_ok());
        assert!(check_non_negative("radius", -1.0).is_err());
        assert!(check_non_negative("radius", f64::NAN).is_err());
        assert!(check_non_negative("radius", f64::INFINITY).is_err());
    }

    #[test]
    fn every_engine_error_is_produced_by_the_editor_path() {
        // Exhaustive: a new variant must come with a constructor here.
        let errors = [
            check_non_negative("radius", -1.0).unwrap_err(),
            EngineError::NoActiveStroke,
        ];
        for error in &errors {
            match error {
                EngineError::InvalidOption { name, value } => {
                    assert_eq!(*name, "radius");
                    assert!((*value + 1.0).abs() < f64::EPSILON);
                    assert_eq!(error.to_string(), "invalid option radius: -1");
                }
                EngineError::NoActiveStroke => {
                    assert_eq!(error.to_string(), "no active brush stroke");
                }
            }
        }
    }
}
