//! Scene index: a materialized, per-operation snapshot of shape measures.
//!
//! Every engine operation rebuilds the index from the live scene before
//! deciding anything, and applies its mutations only after the candidate
//! list is fixed.

use log::debug;

use crate::color::Color;
use crate::geometry::global_bbox;
use crate::kernel::GeometryKernel;
use crate::shape::{Scene, ShapeId, ShapeKind};
use crate::types::{Point, Rect};

/// Measures of one shape, in global coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeItem {
    pub id: ShapeId,
    pub kind: ShapeKind,
    /// Global bounding box.
    pub bbox: Rect,
    /// `bbox.width * bbox.height`.
    pub area: f64,
    /// Normalized fill.
    pub color: Option<Color>,
    /// Bounding-box center.
    pub centroid: Point,
}

/// Measure every shape of the scene, in paint order.
///
/// Shapes whose bounding box cannot be computed, or whose area is not a
/// positive finite number, are left out.
#[must_use]
pub fn build_items(scene: &Scene, kernel: &dyn GeometryKernel) -> Vec<ShapeItem> {
    scene
        .shapes()
        .iter()
        .filter_map(|shape| {
            let bbox = match global_bbox(kernel, shape) {
                Ok(bbox) => bbox,
                Err(e) => {
                    debug!("skipping shape {}: {e}", shape.id());
                    return None;
                }
            };
            let area = bbox.area();
            if !area.is_finite() || area <= 0.0 {
                debug!("skipping shape {}: area {area}", shape.id());
                return None;
            }
            Some(ShapeItem {
                id: shape.id(),
                kind: shape.kind(),
                bbox,
                area,
                color: shape.fill.clone(),
                centroid: bbox.center(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::GeoKernel;
    use crate::shape::{Geometry, Shape};

    #[test]
    fn measures_in_paint_order_and_skips_degenerate() {
        let mut scene = Scene::default();
        let big = scene.add(
            Shape::new(Geometry::rect(Rect::new(0.0, 0.0, 10.0, 4.0)))
                .with_fill(Some(Color::Rgb(1, 2, 3))),
        );
        scene.add(Shape::new(Geometry::Line {
            x1: 0.0,
            y1: 0.0,
            x2: 10.0,
            y2: 0.0,
        }));
        scene.add(Shape::new(Geometry::path("not a path")));
        let small = scene.add(Shape::new(Geometry::Circle {
            cx: 5.0,
            cy: 5.0,
            r: 1.0,
        }));

        let items = build_items(&scene, &GeoKernel);
        let ids: Vec<ShapeId> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![big, small]);
        assert!((items[0].area - 40.0).abs() < f64::EPSILON);
        assert_eq!(items[0].centroid, Point::new(5.0, 2.0));
        assert_eq!(items[0].color, Some(Color::Rgb(1, 2, 3)));
        assert_eq!(items[1].kind, ShapeKind::Circle);
        assert_eq!(items[1].color, None);
    }
}
