//! Outline flattening: turns shape geometry into polygonal subpaths.
//!
//! Path data is tokenized by the [`svg`] crate's path parser and every
//! command is reduced to straight segments. Cubic and quadratic curves are
//! sampled at [`CURVE_SEGMENTS`] uniform parameter steps, elliptical arcs
//! are converted from SVG endpoint form to center form and sampled
//! proportionally to their sweep, and circles/ellipses use
//! [`ELLIPSE_SEGMENTS`] points.
//!
//! The same module also emits path data for rings produced by the geometry
//! kernel. Emission formats `f64` coordinates directly, rounded to
//! [`EMIT_DECIMALS`] places. Parsing goes through the `svg` crate, whose
//! path parameters are `f32`, so input coordinates carry about seven
//! significant digits.

use std::f64::consts::{PI, TAU};
use std::fmt::Write as _;

use svg::node::element::path::{Command, Data, Parameters, Position};

use crate::shape::Geometry;
use crate::types::{GeometryError, Point, Rect, Transform};

/// Uniform parameter steps used for each Bézier segment.
pub const CURVE_SEGMENTS: usize = 16;

/// Points used to approximate a full circle or ellipse.
pub const ELLIPSE_SEGMENTS: usize = 64;

/// Decimal places kept for emitted coordinates.
pub const EMIT_DECIMALS: i32 = 6;

/// One flattened subpath.
#[derive(Debug, Clone, PartialEq)]
pub struct Subpath {
    /// Vertices in drawing order. A closed subpath does not repeat its
    /// first vertex.
    pub points: Vec<Point>,
    /// `true` when the subpath was explicitly closed (`Z`) or comes from
    /// a closed primitive.
    pub closed: bool,
}

/// Closed/unterminated subpath counts for a path `d` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathStats {
    pub closed: usize,
    pub unterminated: usize,
}

// ---------------------------------------------------------------------------
// Path data parsing
// ---------------------------------------------------------------------------

/// Parse and flatten SVG path data into subpaths.
///
/// Lone `M` commands that draw nothing do not produce a subpath.
///
/// # Errors
///
/// Returns [`GeometryError::PathData`] when the data cannot be tokenized,
/// does not begin with a moveto, or a command carries a parameter count
/// that is not a multiple of its arity.
pub fn parse_path(d: &str) -> Result<Vec<Subpath>, GeometryError> {
    let data = Data::parse(d).map_err(|e| GeometryError::PathData(e.to_string()))?;
    let mut flattener = Flattener::default();
    for command in data.iter() {
        flattener.command(command)?;
    }
    Ok(flattener.finish())
}

/// Count closed and unterminated subpaths of path data.
///
/// # Errors
///
/// Propagates [`parse_path`] errors.
pub fn analyze(d: &str) -> Result<PathStats, GeometryError> {
    let subpaths = parse_path(d)?;
    let closed = subpaths.iter().filter(|s| s.closed).count();
    Ok(PathStats {
        closed,
        unterminated: subpaths.len() - closed,
    })
}

#[derive(Default)]
struct Flattener {
    subpaths: Vec<Subpath>,
    current: Vec<Point>,
    cursor: Option<Point>,
    start: Point,
    /// Second control point of the previous cubic, for `S`.
    last_cubic: Option<Point>,
    /// Control point of the previous quadratic, for `T`.
    last_quad: Option<Point>,
}

impl Flattener {
    fn command(&mut self, command: &Command) -> Result<(), GeometryError> {
        let (last_cubic, last_quad) = (self.last_cubic.take(), self.last_quad.take());
        match command {
            Command::Move(position, params) => {
                let coords = groups(params, 2, "M")?;
                for (i, g) in coords.chunks_exact(2).enumerate() {
                    let p = self.resolve(*position, g[0], g[1]);
                    if i == 0 {
                        self.flush(false);
                        self.start = p;
                        self.cursor = Some(p);
                        self.current.push(p);
                    } else {
                        self.line_to(p);
                    }
                }
            }
            Command::Line(position, params) => {
                self.require_cursor()?;
                for g in groups(params, 2, "L")?.chunks_exact(2) {
                    let p = self.resolve(*position, g[0], g[1]);
                    self.line_to(p);
                }
            }
            Command::HorizontalLine(position, params) => {
                let mut cursor = self.require_cursor()?;
                for x in groups(params, 1, "H")? {
                    let x = match position {
                        Position::Absolute => x,
                        Position::Relative => cursor.x + x,
                    };
                    cursor = Point::new(x, cursor.y);
                    self.line_to(cursor);
                }
            }
            Command::VerticalLine(position, params) => {
                let mut cursor = self.require_cursor()?;
                for y in groups(params, 1, "V")? {
                    let y = match position {
                        Position::Absolute => y,
                        Position::Relative => cursor.y + y,
                    };
                    cursor = Point::new(cursor.x, y);
                    self.line_to(cursor);
                }
            }
            Command::CubicCurve(position, params) => {
                self.require_cursor()?;
                for g in groups(params, 6, "C")?.chunks_exact(6) {
                    let c1 = self.resolve(*position, g[0], g[1]);
                    let c2 = self.resolve(*position, g[2], g[3]);
                    let end = self.resolve(*position, g[4], g[5]);
                    self.cubic_to(c1, c2, end);
                }
            }
            Command::SmoothCubicCurve(position, params) => {
                let mut reflected = last_cubic;
                for g in groups(params, 4, "S")?.chunks_exact(4) {
                    let cursor = self.require_cursor()?;
                    let c1 = reflected.map_or(cursor, |c| reflect(c, cursor));
                    let c2 = self.resolve(*position, g[0], g[1]);
                    let end = self.resolve(*position, g[2], g[3]);
                    self.cubic_to(c1, c2, end);
                    reflected = self.last_cubic;
                }
            }
            Command::QuadraticCurve(position, params) => {
                self.require_cursor()?;
                for g in groups(params, 4, "Q")?.chunks_exact(4) {
                    let c = self.resolve(*position, g[0], g[1]);
                    let end = self.resolve(*position, g[2], g[3]);
                    self.quad_to(c, end);
                }
            }
            Command::SmoothQuadraticCurve(position, params) => {
                let mut reflected = last_quad;
                for g in groups(params, 2, "T")?.chunks_exact(2) {
                    let cursor = self.require_cursor()?;
                    let c = reflected.map_or(cursor, |c| reflect(c, cursor));
                    let end = self.resolve(*position, g[0], g[1]);
                    self.quad_to(c, end);
                    reflected = self.last_quad;
                }
            }
            Command::EllipticalArc(position, params) => {
                self.require_cursor()?;
                for g in groups(params, 7, "A")?.chunks_exact(7) {
                    let end = self.resolve(*position, g[5], g[6]);
                    self.arc_to(g[0], g[1], g[2], g[3] != 0.0, g[4] != 0.0, end);
                }
            }
            Command::Close => {
                self.require_cursor()?;
                self.flush(true);
                self.cursor = Some(self.start);
            }
        }
        Ok(())
    }

    fn require_cursor(&self) -> Result<Point, GeometryError> {
        self.cursor
            .ok_or_else(|| GeometryError::PathData("path data must begin with a moveto".into()))
    }

    fn resolve(&self, position: Position, x: f64, y: f64) -> Point {
        match (position, self.cursor) {
            (Position::Relative, Some(c)) => Point::new(c.x + x, c.y + y),
            _ => Point::new(x, y),
        }
    }

    fn line_to(&mut self, p: Point) {
        if self.current.is_empty() {
            // Drawing after `Z` starts a new subpath at the old start.
            self.current.push(self.start);
        }
        self.current.push(p);
        self.cursor = Some(p);
    }

    fn cubic_to(&mut self, c1: Point, c2: Point, end: Point) {
        let p0 = self.cursor.unwrap_or(self.start);
        for i in 1..=CURVE_SEGMENTS {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / CURVE_SEGMENTS as f64;
            let mt = 1.0 - t;
            let (w0, w1, w2, w3) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
            self.line_to(Point::new(
                w3.mul_add(end.x, w2.mul_add(c2.x, w0.mul_add(p0.x, w1 * c1.x))),
                w3.mul_add(end.y, w2.mul_add(c2.y, w0.mul_add(p0.y, w1 * c1.y))),
            ));
        }
        self.last_cubic = Some(c2);
    }

    fn quad_to(&mut self, c: Point, end: Point) {
        let p0 = self.cursor.unwrap_or(self.start);
        for i in 1..=CURVE_SEGMENTS {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f64 / CURVE_SEGMENTS as f64;
            let mt = 1.0 - t;
            let (w0, w1, w2) = (mt * mt, 2.0 * mt * t, t * t);
            self.line_to(Point::new(
                w2.mul_add(end.x, w0.mul_add(p0.x, w1 * c.x)),
                w2.mul_add(end.y, w0.mul_add(p0.y, w1 * c.y)),
            ));
        }
        self.last_quad = Some(c);
    }

    /// SVG endpoint arc parameterization to center form, then sampling.
    fn arc_to(&mut self, rx: f64, ry: f64, rotation: f64, large: bool, sweep: bool, end: Point) {
        let start = self.cursor.unwrap_or(self.start);
        if start == end {
            return;
        }
        let (mut rx, mut ry) = (rx.abs(), ry.abs());
        if rx == 0.0 || ry == 0.0 {
            self.line_to(end);
            return;
        }
        let (sin, cos) = rotation.to_radians().sin_cos();
        let dx = (start.x - end.x) / 2.0;
        let dy = (start.y - end.y) / 2.0;
        let x1 = cos.mul_add(dx, sin * dy);
        let y1 = (-sin).mul_add(dx, cos * dy);

        let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
        if lambda > 1.0 {
            let s = lambda.sqrt();
            rx *= s;
            ry *= s;
        }

        let num = (rx * rx).mul_add(ry * ry, -(rx * rx).mul_add(y1 * y1, (ry * ry) * (x1 * x1)));
        let den = (rx * rx).mul_add(y1 * y1, (ry * ry) * (x1 * x1));
        let mut coef = if den > 0.0 { (num / den).max(0.0).sqrt() } else { 0.0 };
        if large == sweep {
            coef = -coef;
        }
        let cxp = coef * rx * y1 / ry;
        let cyp = -coef * ry * x1 / rx;
        let cx = cos.mul_add(cxp, -(sin * cyp)) + (start.x + end.x) / 2.0;
        let cy = sin.mul_add(cxp, cos * cyp) + (start.y + end.y) / 2.0;

        let theta = vector_angle((1.0, 0.0), ((x1 - cxp) / rx, (y1 - cyp) / ry));
        let mut delta = vector_angle(
            ((x1 - cxp) / rx, (y1 - cyp) / ry),
            ((-x1 - cxp) / rx, (-y1 - cyp) / ry),
        );
        if !sweep && delta > 0.0 {
            delta -= TAU;
        } else if sweep && delta < 0.0 {
            delta += TAU;
        }

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let steps = ((delta.abs() / TAU) * ELLIPSE_SEGMENTS as f64).ceil().max(4.0) as usize;
        for i in 1..steps {
            #[allow(clippy::cast_precision_loss)]
            let t = (delta * i as f64).mul_add(1.0 / steps as f64, theta);
            let (st, ct) = t.sin_cos();
            self.line_to(Point::new(
                (rx * ct).mul_add(cos, -(ry * st * sin)) + cx,
                (rx * ct).mul_add(sin, ry * st * cos) + cy,
            ));
        }
        self.line_to(end);
    }

    fn flush(&mut self, closed: bool) {
        let points = std::mem::take(&mut self.current);
        if points.len() > 1 {
            self.subpaths.push(Subpath { points, closed });
        }
    }

    fn finish(mut self) -> Vec<Subpath> {
        self.flush(false);
        self.subpaths
    }
}

fn groups(params: &Parameters, arity: usize, name: &str) -> Result<Vec<f64>, GeometryError> {
    let values: &[f32] = params;
    if values.is_empty() || values.len() % arity != 0 {
        return Err(GeometryError::PathData(format!(
            "{name} expects a multiple of {arity} parameters, got {}",
            values.len()
        )));
    }
    Ok(values.iter().map(|&v| f64::from(v)).collect())
}

fn reflect(control: Point, about: Point) -> Point {
    Point::new(2.0f64.mul_add(about.x, -control.x), 2.0f64.mul_add(about.y, -control.y))
}

fn vector_angle(u: (f64, f64), v: (f64, f64)) -> f64 {
    let cross = u.0.mul_add(v.1, -(u.1 * v.0));
    let dot = u.0.mul_add(v.0, u.1 * v.1);
    cross.atan2(dot)
}

// ---------------------------------------------------------------------------
// Geometry outlines
// ---------------------------------------------------------------------------

/// Flatten any geometry into local-space subpaths.
///
/// # Errors
///
/// Returns [`GeometryError::Empty`] for zero-size primitives and paths that
/// draw nothing, [`GeometryError::NonFinite`] when a vertex is not finite,
/// and path parse errors from [`parse_path`].
pub fn outline(geometry: &Geometry) -> Result<Vec<Subpath>, GeometryError> {
    let subpaths = match geometry {
        Geometry::Path { data } => parse_path(data)?,
        &Geometry::Rect {
            x,
            y,
            width,
            height,
        } => {
            if width <= 0.0 || height <= 0.0 {
                return Err(GeometryError::Empty);
            }
            let r = Rect::new(x, y, width, height);
            let [a, b, c, d] = r.corners();
            vec![Subpath {
                points: vec![a, b, d, c],
                closed: true,
            }]
        }
        &Geometry::Circle { cx, cy, r } => vec![ellipse_ring(cx, cy, r, r)?],
        &Geometry::Ellipse { cx, cy, rx, ry } => vec![ellipse_ring(cx, cy, rx, ry)?],
        Geometry::Polygon { points } => vec![Subpath {
            points: points.clone(),
            closed: true,
        }],
        Geometry::Polyline { points } => vec![Subpath {
            points: points.clone(),
            closed: false,
        }],
        &Geometry::Line { x1, y1, x2, y2 } => vec![Subpath {
            points: vec![Point::new(x1, y1), Point::new(x2, y2)],
            closed: false,
        }],
    };
    if subpaths.iter().all(|s| s.points.len() < 2) {
        return Err(GeometryError::Empty);
    }
    if subpaths.iter().flat_map(|s| &s.points).any(|p| !p.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    Ok(subpaths)
}

fn ellipse_ring(cx: f64, cy: f64, rx: f64, ry: f64) -> Result<Subpath, GeometryError> {
    if rx <= 0.0 || ry <= 0.0 {
        return Err(GeometryError::Empty);
    }
    let points = (0..ELLIPSE_SEGMENTS)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let t = 2.0 * PI * i as f64 / ELLIPSE_SEGMENTS as f64;
            let (s, c) = t.sin_cos();
            Point::new(rx.mul_add(c, cx), ry.mul_add(s, cy))
        })
        .collect();
    Ok(Subpath {
        points,
        closed: true,
    })
}

/// Local-space bounding box of a geometry, like SVG `getBBox()`.
///
/// Primitives use their exact extents; paths use the envelope of their
/// flattened vertices.
///
/// # Errors
///
/// Returns [`GeometryError::Empty`] when there is nothing to measure,
/// [`GeometryError::NonFinite`] for non-finite extents and path parse
/// errors.
pub fn local_bounds(geometry: &Geometry) -> Result<Rect, GeometryError> {
    let rect = match geometry {
        &Geometry::Rect {
            x,
            y,
            width,
            height,
        } => Rect::new(x, y, width.max(0.0), height.max(0.0)),
        &Geometry::Circle { cx, cy, r } => {
            let r = r.max(0.0);
            Rect::new(cx - r, cy - r, 2.0 * r, 2.0 * r)
        }
        &Geometry::Ellipse { cx, cy, rx, ry } => {
            let (rx, ry) = (rx.max(0.0), ry.max(0.0));
            Rect::new(cx - rx, cy - ry, 2.0 * rx, 2.0 * ry)
        }
        &Geometry::Line { x1, y1, x2, y2 } => {
            Rect::envelope([Point::new(x1, y1), Point::new(x2, y2)]).ok_or(GeometryError::Empty)?
        }
        Geometry::Polygon { points } | Geometry::Polyline { points } => {
            Rect::envelope(points.iter().copied()).ok_or(GeometryError::Empty)?
        }
        Geometry::Path { data } => {
            let subpaths = parse_path(data)?;
            Rect::envelope(subpaths.into_iter().flat_map(|s| s.points))
                .ok_or(GeometryError::Empty)?
        }
    };
    if rect.is_finite() {
        Ok(rect)
    } else {
        Err(GeometryError::NonFinite)
    }
}

// ---------------------------------------------------------------------------
// Path data emission
// ---------------------------------------------------------------------------

/// Build closed path data from rings (`M x,y L .. z` per ring).
///
/// Rings with fewer than 3 points are skipped.
#[must_use]
pub fn rings_to_path_data(rings: &[Vec<Point>]) -> String {
    let mut data = PathWriter::default();
    for ring in rings.iter().filter(|r| r.len() >= 3) {
        data.move_to(ring[0]);
        for &p in &ring[1..] {
            data.line_to(p);
        }
        data.close();
    }
    data.finish()
}

/// Re-emit path data with every vertex mapped through `transform`.
///
/// Curves are flattened in the process.
///
/// # Errors
///
/// Propagates [`parse_path`] errors.
pub fn transform_path_data(d: &str, transform: &Transform) -> Result<String, GeometryError> {
    let subpaths = parse_path(d)?;
    Ok(subpaths_to_path_data(&subpaths, transform))
}

/// Re-emit path data with every subpath's vertex order reversed.
///
/// Reversing flips the winding, which turns an absorbed outline into a
/// hole (or back) under the non-zero rule.
///
/// # Errors
///
/// Propagates [`parse_path`] errors.
pub fn reverse_path_data(d: &str) -> Result<String, GeometryError> {
    let mut subpaths = parse_path(d)?;
    for s in &mut subpaths {
        s.points.reverse();
    }
    Ok(subpaths_to_path_data(&subpaths, &Transform::IDENTITY))
}

/// Emit path data for subpaths, mapping every vertex through `transform`.
/// Open subpaths stay open.
#[must_use]
pub fn subpaths_to_path_data(subpaths: &[Subpath], transform: &Transform) -> String {
    let identity = transform.is_identity();
    let mut data = PathWriter::default();
    for s in subpaths {
        let mut points = s
            .points
            .iter()
            .map(|&p| if identity { p } else { transform.apply(p) });
        let Some(first) = points.next() else {
            continue;
        };
        data.move_to(first);
        for p in points {
            data.line_to(p);
        }
        if s.closed {
            data.close();
        }
    }
    data.finish()
}

/// Accumulates `M x,y L x,y .. z` path data.
#[derive(Debug, Default)]
struct PathWriter {
    out: String,
}

impl PathWriter {
    fn move_to(&mut self, p: Point) {
        self.command('M', Some(p));
    }

    fn line_to(&mut self, p: Point) {
        self.command('L', Some(p));
    }

    fn close(&mut self) {
        self.command('z', None);
    }

    fn command(&mut self, letter: char, p: Option<Point>) {
        if !self.out.is_empty() {
            self.out.push(' ');
        }
        self.out.push(letter);
        if let Some(p) = p {
            let _ = write!(self.out, "{},{}", coordinate(p.x), coordinate(p.y));
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Round to [`EMIT_DECIMALS`] places; `-0` prints as `0`.
fn coordinate(v: f64) -> f64 {
    let scale = 10f64.powi(EMIT_DECIMALS);
    let rounded = (v * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- parse_path ---

    #[test]
    fn absolute_square_is_one_closed_subpath() {
        let subpaths = parse_path("M0 0 L10 0 L10 10 L0 10 Z").unwrap();
        assert_eq!(subpaths.len(), 1);
        assert!(subpaths[0].closed);
        assert_eq!(subpaths[0].points.len(), 4);
    }

    #[test]
    fn relative_and_axis_commands() {
        let subpaths = parse_path("m5 5 h10 v10 h-10 z").unwrap();
        assert_eq!(
            subpaths[0].points,
            vec![
                Point::new(5.0, 5.0),
                Point::new(15.0, 5.0),
                Point::new(15.0, 15.0),
                Point::new(5.0, 15.0),
            ]
        );
    }

    #[test]
    fn implicit_lineto_after_moveto() {
        let subpaths = parse_path("M0 0 10 0 10 10").unwrap();
        assert_eq!(subpaths[0].points.len(), 3);
        assert!(!subpaths[0].closed);
    }

    #[test]
    fn drawing_after_close_starts_at_subpath_start() {
        let subpaths = parse_path("M0 0 H10 V10 Z L-5 -5 Z").unwrap();
        assert_eq!(subpaths.len(), 2);
        assert_eq!(subpaths[1].points[0], Point::new(0.0, 0.0));
    }

    #[test]
    fn cubic_is_flattened_to_endpoint() {
        let subpaths = parse_path("M0 0 C0 10 10 10 10 0").unwrap();
        let points = &subpaths[0].points;
        assert_eq!(points.len(), CURVE_SEGMENTS + 1);
        let last = points[points.len() - 1];
        assert!((last.x - 10.0).abs() < 1e-9 && last.y.abs() < 1e-9);
        // Curve apex at t=0.5 is y=7.5.
        assert!(points.iter().any(|p| (p.y - 7.5).abs() < 1e-9));
    }

    #[test]
    fn half_circle_arc_reaches_radius() {
        let subpaths = parse_path("M0 0 A5 5 0 0 1 10 0").unwrap();
        let points = &subpaths[0].points;
        let last = points[points.len() - 1];
        assert!((last.x - 10.0).abs() < 1e-9);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        // Sweep flag 1 in a y-down space passes through negative y.
        assert!((min_y + 5.0).abs() < 0.05, "min_y = {min_y}");
    }

    #[test]
    fn lone_moveto_draws_nothing() {
        assert!(parse_path("M1 1").unwrap().is_empty());
    }

    #[test]
    fn malformed_data_is_an_error() {
        assert!(matches!(parse_path("M0 0 L10"), Err(GeometryError::PathData(_))));
        assert!(matches!(parse_path("L10 10"), Err(GeometryError::PathData(_))));
    }

    // --- analyze ---

    #[test]
    fn analyze_counts_open_subpaths() {
        let stats = analyze("M0 0 H5 V5 Z M10 10 H20 M30 30 H40").unwrap();
        assert_eq!(
            stats,
            PathStats {
                closed: 1,
                unterminated: 2
            }
        );
    }

    // --- outline / local_bounds ---

    #[test]
    fn zero_sized_primitives_are_empty() {
        assert_eq!(
            outline(&Geometry::Circle {
                cx: 0.0,
                cy: 0.0,
                r: 0.0
            }),
            Err(GeometryError::Empty)
        );
        assert_eq!(
            outline(&Geometry::rect(Rect::new(0.0, 0.0, 0.0, 5.0))),
            Err(GeometryError::Empty)
        );
    }

    #[test]
    fn circle_bounds_are_exact() {
        let r = local_bounds(&Geometry::Circle {
            cx: 10.0,
            cy: 20.0,
            r: 5.0,
        })
        .unwrap();
        assert_eq!(r, Rect::new(5.0, 15.0, 10.0, 10.0));
    }

    #[test]
    fn path_bounds_cover_flattened_curve() {
        let r = local_bounds(&Geometry::path("M0 0 Q5 10 10 0")).unwrap();
        assert!((r.width - 10.0).abs() < 1e-9);
        assert!((r.height - 5.0).abs() < 1e-9);
    }

    // --- emission ---

    #[test]
    fn rings_emit_closed_subpaths() {
        let d = rings_to_path_data(&[vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ]]);
        assert_eq!(d, "M0,0 L10,0 L10,10 z");
    }

    #[test]
    fn transformed_path_data_is_translated() {
        let d = transform_path_data("M0 0 L1 0 L1 1 Z", &Transform::translate(5.0, 5.0)).unwrap();
        assert_eq!(d, "M5,5 L6,5 L6,6 z");
    }

    #[test]
    fn reversed_path_data_keeps_closure() {
        let d = reverse_path_data("M0 0 L1 0 L1 1 Z").unwrap();
        assert_eq!(d, "M1,1 L1,0 L0,0 z");
    }

    #[test]
    fn emitted_coordinates_keep_f64_precision() {
        // 16777217.5 has no f32 representation.
        let d = rings_to_path_data(&[vec![
            Point::new(100_000.25, -0.000_000_1),
            Point::new(16_777_217.5, 0.1),
            Point::new(1.0 / 3.0, 2.0),
        ]]);
        assert_eq!(d, "M100000.25,0 L16777217.5,0.1 L0.333333,2 z");
    }

    #[test]
    fn parsed_coordinates_emit_without_f32_noise() {
        let shift = Transform::translate(0.2, 0.0);
        let d = transform_path_data("M0.1 0 L1 0 L1 1 Z", &shift).unwrap();
        assert_eq!(d, "M0.3,0 L1.2,0 L1.2,1 z");
    }
}
