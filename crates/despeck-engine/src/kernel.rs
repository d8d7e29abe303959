//! Geometry services behind a pluggable seam.
//!
//! The engine never inspects outlines directly. Bounding boxes, transforms,
//! point hit-tests and boolean unions all go through [`GeometryKernel`], so
//! a host with a real renderer can supply its own implementation. The
//! default [`GeoKernel`] flattens outlines (see [`crate::outline`]) and
//! answers every query with the [`geo`] crate.
//!
//! Hit-test methods return `Option<bool>`: `None` means the kernel has no
//! precise outline support for that shape, and callers fall back to the
//! bounding box.

use geo::{Area, BooleanOps, Coord, Distance, Euclidean, LineString, MultiPolygon, Polygon};

use crate::outline::{self, Subpath};
use crate::shape::{FillRule, Geometry, Shape};
use crate::types::{GeometryError, Point, Rect, Transform};

/// Points this close to an outline edge count as inside the fill.
const ON_EDGE_TOLERANCE: f64 = 1e-9;

/// Geometry services consumed by the engine.
pub trait GeometryKernel {
    /// Untransformed bounding box of the shape (`getBBox()`).
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] when the geometry cannot be measured.
    fn local_bbox(&self, shape: &Shape) -> Result<Rect, GeometryError>;

    /// Cumulative local-to-global transform, or `None` when unavailable.
    fn transform(&self, shape: &Shape) -> Option<Transform>;

    /// Whether a local-space point lies in the shape's fill region.
    fn point_in_fill(&self, shape: &Shape, local: Point) -> Option<bool>;

    /// Whether a local-space point lies on the shape's stroke.
    fn point_in_stroke(&self, shape: &Shape, local: Point) -> Option<bool>;

    /// Boolean union of two shapes' filled regions, in global space.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] when either operand is degenerate or the
    /// union is empty.
    fn union(&self, a: &Shape, b: &Shape) -> Result<Geometry, GeometryError>;

    /// The shape's outline as path data in global coordinates.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] when the geometry cannot be flattened.
    fn global_path_data(&self, shape: &Shape) -> Result<String, GeometryError>;
}

/// [`GeometryKernel`] backed by flattened outlines and the `geo` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoKernel;

impl GeometryKernel for GeoKernel {
    fn local_bbox(&self, shape: &Shape) -> Result<Rect, GeometryError> {
        outline::local_bounds(&shape.geometry)
    }

    fn transform(&self, shape: &Shape) -> Option<Transform> {
        let t = shape.transform;
        [t.a, t.b, t.c, t.d, t.e, t.f]
            .iter()
            .all(|v| v.is_finite())
            .then_some(t)
    }

    fn point_in_fill(&self, shape: &Shape, local: Point) -> Option<bool> {
        let Ok(subpaths) = outline::outline(&shape.geometry) else {
            return Some(false);
        };
        let (winding, on_edge) = winding_number(&subpaths, local);
        let inside = match shape.fill_rule {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        };
        Some(inside || on_edge)
    }

    fn point_in_stroke(&self, shape: &Shape, local: Point) -> Option<bool> {
        if shape.stroke.is_none() || shape.stroke_width <= 0.0 {
            return Some(false);
        }
        let Ok(subpaths) = outline::outline(&shape.geometry) else {
            return Some(false);
        };
        let half = shape.stroke_width / 2.0;
        let p = geo::Point::new(local.x, local.y);
        Some(
            subpaths
                .iter()
                .map(outline_string)
                .any(|ls| Euclidean.distance(&p, &ls) <= half),
        )
    }

    fn union(&self, a: &Shape, b: &Shape) -> Result<Geometry, GeometryError> {
        let region_a = global_region(a)?;
        let region_b = global_region(b)?;
        let merged = region_a.union(&region_b);
        let rings = region_rings(&merged);
        if rings.is_empty() {
            return Err(GeometryError::Union("union produced no area".into()));
        }
        Ok(Geometry::path(outline::rings_to_path_data(&rings)))
    }

    fn global_path_data(&self, shape: &Shape) -> Result<String, GeometryError> {
        let subpaths = outline::outline(&shape.geometry)?;
        let transform = self.transform(shape).ok_or(GeometryError::NonFinite)?;
        Ok(outline::subpaths_to_path_data(&subpaths, &transform))
    }
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

/// Winding number of `p` with respect to every subpath (each implicitly
/// closed), plus whether `p` lies on an edge.
fn winding_number(subpaths: &[Subpath], p: Point) -> (i32, bool) {
    let mut winding = 0;
    for s in subpaths {
        let n = s.points.len();
        for i in 0..n {
            let a = s.points[i];
            let b = s.points[(i + 1) % n];
            if segment_distance_squared(a, b, p) <= ON_EDGE_TOLERANCE * ON_EDGE_TOLERANCE {
                return (winding, true);
            }
            let side = (b.x - a.x).mul_add(p.y - a.y, -((p.x - a.x) * (b.y - a.y)));
            if a.y <= p.y {
                if b.y > p.y && side > 0.0 {
                    winding += 1;
                }
            } else if b.y <= p.y && side < 0.0 {
                winding -= 1;
            }
        }
    }
    (winding, false)
}

fn segment_distance_squared(a: Point, b: Point, p: Point) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len2 = dx.mul_add(dx, dy * dy);
    if len2 == 0.0 {
        return a.distance_squared(p);
    }
    let t = ((p.x - a.x).mul_add(dx, (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    Point::new(t.mul_add(dx, a.x), t.mul_add(dy, a.y)).distance_squared(p)
}

fn outline_string(subpath: &Subpath) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = subpath.points.iter().map(|&p| p.into()).collect();
    if let (true, Some(&first)) = (subpath.closed, coords.first()) {
        coords.push(first);
    }
    LineString::new(coords)
}

// ---------------------------------------------------------------------------
// Boolean regions
// ---------------------------------------------------------------------------

/// The shape's filled region in global coordinates.
fn global_region(shape: &Shape) -> Result<MultiPolygon<f64>, GeometryError> {
    let subpaths = outline::outline(&shape.geometry)?;
    let polygons: Vec<Polygon<f64>> = subpaths
        .iter()
        .filter(|s| s.points.len() >= 3)
        .map(|s| {
            let coords: Vec<Coord<f64>> = s
                .points
                .iter()
                .map(|&p| shape.transform.apply(p).into())
                .collect();
            Polygon::new(LineString::new(coords), vec![])
        })
        .collect();
    if polygons.is_empty() {
        return Err(GeometryError::Union("operand has no closed area".into()));
    }
    if polygons
        .iter()
        .flat_map(|p| p.exterior().coords())
        .any(|c| !c.x.is_finite() || !c.y.is_finite())
    {
        return Err(GeometryError::NonFinite);
    }
    Ok(match shape.fill_rule {
        FillRule::EvenOdd => even_odd_region(polygons),
        FillRule::NonZero => non_zero_region(polygons),
    })
}

fn even_odd_region(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    polygons
        .into_iter()
        .fold(MultiPolygon::new(vec![]), |acc, p| {
            acc.xor(&MultiPolygon::new(vec![p]))
        })
}

/// Non-zero fill approximated by orientation: rings wound like the largest
/// ring are solid, rings wound the other way are holes.
fn non_zero_region(polygons: Vec<Polygon<f64>>) -> MultiPolygon<f64> {
    let dominant_positive = polygons
        .iter()
        .map(Area::signed_area)
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .is_none_or(|area| area >= 0.0);
    let (solid, holes): (Vec<_>, Vec<_>) = polygons
        .into_iter()
        .partition(|p| (p.signed_area() >= 0.0) == dominant_positive);
    let union_all = |polys: Vec<Polygon<f64>>| {
        polys
            .into_iter()
            .fold(MultiPolygon::new(vec![]), |acc, p| {
                acc.union(&MultiPolygon::new(vec![p]))
            })
    };
    let solid = union_all(solid);
    if holes.is_empty() {
        solid
    } else {
        solid.difference(&union_all(holes))
    }
}

/// Exterior and interior rings of a region, without the closing vertex.
fn region_rings(region: &MultiPolygon<f64>) -> Vec<Vec<Point>> {
    region
        .0
        .iter()
        .flat_map(|poly| std::iter::once(poly.exterior()).chain(poly.interiors()))
        .map(|ring| {
            let mut points: Vec<Point> = ring.coords().map(|&c| c.into()).collect();
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            points
        })
        .filter(|points| points.len() >= 3)
        .collect()
}
