//! Coordinate-space helpers layered on a [`GeometryKernel`].
//!
//! The global bounding box maps the four local bbox corners through the
//! shape's transform and takes their envelope. For rotated or skewed
//! shapes this inflates the box; every area threshold is tuned against
//! that inflation, so it is reproduced as is.

use crate::kernel::GeometryKernel;
use crate::shape::Shape;
use crate::types::{GeometryError, Point, Rect};

/// Axis-aligned bounding box of a shape in global coordinates.
///
/// A missing transform is treated as identity.
///
/// # Errors
///
/// Propagates the kernel's bbox error and returns
/// [`GeometryError::NonFinite`] when the mapped box is not finite.
pub fn global_bbox(kernel: &dyn GeometryKernel, shape: &Shape) -> Result<Rect, GeometryError> {
    let local = kernel.local_bbox(shape)?;
    let corners = local.corners();
    let rect = match kernel.transform(shape) {
        Some(t) => Rect::envelope(corners.map(|c| t.apply(c))),
        None => Rect::envelope(corners),
    }
    .ok_or(GeometryError::Empty)?;
    if rect.is_finite() {
        Ok(rect)
    } else {
        Err(GeometryError::NonFinite)
    }
}

/// Map a global point into the shape's local space.
///
/// Returns the input unchanged when the transform is unavailable or
/// singular.
#[must_use]
pub fn to_local(kernel: &dyn GeometryKernel, shape: &Shape, global: Point) -> Point {
    kernel
        .transform(shape)
        .and_then(|t| t.inverse())
        .map_or(global, |inv| inv.apply(global))
}

/// Map a local point into global space.
///
/// Returns the input unchanged when the transform is unavailable or
/// singular.
#[must_use]
pub fn to_global(kernel: &dyn GeometryKernel, shape: &Shape, local: Point) -> Point {
    match kernel.transform(shape) {
        Some(t) if t.inverse().is_some() => t.apply(local),
        _ => local,
    }
}

/// Whether a global point hits the shape's fill or stroke.
///
/// When the kernel has no precise answer for either test, any point inside
/// the global bounding box counts as inside.
#[must_use]
pub fn point_in_shape(kernel: &dyn GeometryKernel, shape: &Shape, global: Point) -> bool {
    let local = to_local(kernel, shape, global);
    let fill = kernel.point_in_fill(shape, local);
    let stroke = kernel.point_in_stroke(shape, local);
    match (fill, stroke) {
        (None, None) => global_bbox(kernel, shape).is_ok_and(|b| b.contains(global)),
        _ => fill == Some(true) || stroke == Some(true),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::GeoKernel;
    use crate::shape::{Geometry, Scene};
    use crate::types::Transform;

    fn near(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    fn unit_square() -> Shape {
        Shape::new(Geometry::rect(Rect::new(0.0, 0.0, 10.0, 10.0)))
    }

    /// Kernel without precise hit-testing, to exercise the bbox fallback.
    struct BoundsOnly;

    impl GeometryKernel for BoundsOnly {
        fn local_bbox(&self, shape: &Shape) -> Result<Rect, GeometryError> {
            GeoKernel.local_bbox(shape)
        }
        fn transform(&self, shape: &Shape) -> Option<Transform> {
            Some(shape.transform)
        }
        fn point_in_fill(&self, _: &Shape, _: Point) -> Option<bool> {
            None
        }
        fn point_in_stroke(&self, _: &Shape, _: Point) -> Option<bool> {
            None
        }
        fn union(&self, a: &Shape, b: &Shape) -> Result<Geometry, GeometryError> {
            GeoKernel.union(a, b)
        }
        fn global_path_data(&self, shape: &Shape) -> Result<String, GeometryError> {
            GeoKernel.global_path_data(shape)
        }
    }

    // --- global_bbox ---

    #[test]
    fn translated_bbox_moves() {
        let shape = unit_square().with_transform(Transform::translate(5.0, 7.0));
        assert_eq!(
            global_bbox(&GeoKernel, &shape).unwrap(),
            Rect::new(5.0, 7.0, 10.0, 10.0)
        );
    }

    #[test]
    fn rotated_bbox_is_inflated_envelope() {
        let shape = unit_square().with_transform(Transform::rotate(45.0));
        let b = global_bbox(&GeoKernel, &shape).unwrap();
        let diag = 10.0 * std::f64::consts::SQRT_2;
        assert!((b.width - diag).abs() < 1e-9);
        assert!((b.height - diag).abs() < 1e-9);
        assert!(b.area() > 100.0);
    }

    #[test]
    fn empty_path_has_no_bbox() {
        let shape = Shape::new(Geometry::path(""));
        assert!(global_bbox(&GeoKernel, &shape).is_err());
    }

    // --- to_local / to_global ---

    #[test]
    fn local_global_round_trip() {
        let t = Transform::translate(3.0, 4.0).multiply(&Transform::scale(2.0, 0.5));
        let shape = unit_square().with_transform(t);
        let p = Point::new(1.5, -2.0);
        let back = to_local(&GeoKernel, &shape, to_global(&GeoKernel, &shape, p));
        assert!(near(back, p));
    }

    #[test]
    fn singular_transform_passes_points_through() {
        let shape = unit_square().with_transform(Transform::scale(0.0, 1.0));
        let p = Point::new(4.0, 2.0);
        assert_eq!(to_local(&GeoKernel, &shape, p), p);
        assert_eq!(to_global(&GeoKernel, &shape, p), p);
    }

    // --- point_in_shape ---

    #[test]
    fn point_in_transformed_shape() {
        let shape = unit_square().with_transform(Transform::translate(100.0, 0.0));
        assert!(point_in_shape(&GeoKernel, &shape, Point::new(105.0, 5.0)));
        assert!(!point_in_shape(&GeoKernel, &shape, Point::new(5.0, 5.0)));
    }

    #[test]
    fn bounds_fallback_accepts_anything_in_bbox() {
        let mut scene = Scene::default();
        let id = scene.add(Shape::new(Geometry::path("M0 0 L10 0 L0 10 Z")));
        let triangle = scene.get(id).unwrap();
        // Outside the triangle but inside its bbox.
        let p = Point::new(9.0, 9.0);
        assert!(!point_in_shape(&GeoKernel, triangle, p));
        assert!(point_in_shape(&BoundsOnly, triangle, p));
    }
}
