//! Containment merge: absorbing a small shape into the tightest enclosing
//! shape of the target color.
//!
//! Absorption concatenates path data (`container_d candidate_d`) instead of
//! computing a boolean union. The fill rule then decides whether the
//! absorbed outline adds to the container's filled region. Under non-zero
//! a nested subpath wound opposite to its container becomes a hole, so the
//! result is checked and the absorbed subpaths are reversed once if
//! needed; a concatenation that still leaves the candidate unfilled is
//! rolled back.

use log::debug;

use crate::color::Color;
use crate::geometry::point_in_shape;
use crate::index::ShapeItem;
use crate::kernel::GeometryKernel;
use crate::outline;
use crate::shape::{FillRule, Geometry, Scene, ShapeId};
use crate::types::GeometryError;

/// Find the smallest shape of `target` color, strictly larger than the
/// candidate and still in the scene, whose outline contains the
/// candidate's centroid.
///
/// Ties on area go to the earliest shape in paint order.
#[must_use]
pub fn find_container<'a>(
    scene: &Scene,
    kernel: &dyn GeometryKernel,
    items: &'a [ShapeItem],
    candidate: &ShapeItem,
    target: &Color,
) -> Option<&'a ShapeItem> {
    items
        .iter()
        .filter(|item| {
            item.id != candidate.id
                && item.area > candidate.area
                && item.color.as_ref() == Some(target)
        })
        .filter(|item| {
            scene
                .get(item.id)
                .is_some_and(|shape| point_in_shape(kernel, shape, candidate.centroid))
        })
        .fold(None, |best: Option<&ShapeItem>, item| match best {
            Some(b) if b.area <= item.area => Some(b),
            _ => Some(item),
        })
}

/// Append the candidate's outline to the container's path data and delete
/// the candidate.
///
/// Both shapes must support path concatenation. Returns `Ok(false)`, with
/// the scene untouched, when the concatenated path would not fill the
/// candidate's centroid.
///
/// # Errors
///
/// Returns a [`GeometryError`] when the candidate's path data cannot be
/// re-expressed in the container's coordinate space. The scene is not
/// modified in that case either.
pub fn absorb(
    scene: &mut Scene,
    kernel: &dyn GeometryKernel,
    container: ShapeId,
    candidate: &ShapeItem,
) -> Result<bool, GeometryError> {
    let (Some(outer), Some(inner)) = (scene.get(container), scene.get(candidate.id)) else {
        return Ok(false);
    };
    let (Some(outer_d), Some(inner_d)) = (outer.path_data(), inner.path_data()) else {
        return Ok(false);
    };

    let inner_d = if outer.transform == inner.transform {
        inner_d.to_owned()
    } else {
        let to_container = outer
            .transform
            .inverse()
            .ok_or(GeometryError::NonFinite)?
            .multiply(&inner.transform);
        outline::transform_path_data(inner_d, &to_container)?
    };

    let mut merged = outer.clone();
    let mut attempts = vec![format!("{outer_d} {inner_d}")];
    if outer.fill_rule == FillRule::NonZero {
        attempts.push(format!("{outer_d} {}", outline::reverse_path_data(&inner_d)?));
    }

    for data in attempts {
        merged.geometry = Geometry::path(data);
        if point_in_shape(kernel, &merged, candidate.centroid) {
            if let Some(shape) = scene.get_mut(container) {
                shape.geometry = merged.geometry;
            }
            scene.remove(candidate.id);
            return Ok(true);
        }
    }
    debug!(
        "concatenating {} into {container} would leave it unfilled",
        candidate.id
    );
    Ok(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::index::build_items;
    use crate::kernel::GeoKernel;
    use crate::shape::Shape;
    use crate::types::{Point, Rect, Transform};

    const RED: Color = Color::Rgb(255, 0, 0);
    const BLACK: Color = Color::Rgb(0, 0, 0);

    fn square_path(x: f64, y: f64, size: f64) -> Geometry {
        Geometry::path(format!("M{x} {y} h{size} v{size} h-{size} Z"))
    }

    fn item<'a>(items: &'a [ShapeItem], id: ShapeId) -> &'a ShapeItem {
        items.iter().find(|i| i.id == id).unwrap()
    }

    // --- find_container ---

    #[test]
    fn tightest_enclosing_container_wins() {
        let mut scene = Scene::default();
        let outer = scene.add(Shape::new(square_path(0.0, 0.0, 100.0)).with_fill(Some(RED)));
        let inner = scene.add(Shape::new(square_path(40.0, 40.0, 20.0)).with_fill(Some(RED)));
        let speck = scene.add(Shape::new(square_path(49.0, 49.0, 2.0)).with_fill(Some(BLACK)));
        let items = build_items(&scene, &GeoKernel);
        let found = find_container(&scene, &GeoKernel, &items, item(&items, speck), &RED).unwrap();
        assert_eq!(found.id, inner);
        assert_ne!(found.id, outer);
    }

    #[test]
    fn container_must_be_strictly_larger_and_target_colored() {
        let mut scene = Scene::default();
        scene.add(Shape::new(square_path(0.0, 0.0, 2.0)).with_fill(Some(RED)));
        scene.add(Shape::new(square_path(-10.0, -10.0, 30.0)).with_fill(Some(BLACK)));
        let speck = scene.add(Shape::new(square_path(0.0, 0.0, 2.0)).with_fill(Some(BLACK)));
        let items = build_items(&scene, &GeoKernel);
        assert!(find_container(&scene, &GeoKernel, &items, item(&items, speck), &RED).is_none());
    }

    #[test]
    fn candidate_never_contains_itself() {
        let mut scene = Scene::default();
        let speck = scene.add(Shape::new(square_path(0.0, 0.0, 2.0)).with_fill(Some(RED)));
        let items = build_items(&scene, &GeoKernel);
        assert!(find_container(&scene, &GeoKernel, &items, item(&items, speck), &RED).is_none());
    }

    #[test]
    fn detached_container_is_ignored() {
        let mut scene = Scene::default();
        let outer = scene.add(Shape::new(square_path(0.0, 0.0, 100.0)).with_fill(Some(RED)));
        let speck = scene.add(Shape::new(square_path(10.0, 10.0, 2.0)).with_fill(Some(BLACK)));
        let items = build_items(&scene, &GeoKernel);
        scene.remove(outer);
        assert!(find_container(&scene, &GeoKernel, &items, item(&items, speck), &RED).is_none());
    }

    // --- absorb ---

    #[test]
    fn absorb_concatenates_and_removes_candidate() {
        let mut scene = Scene::default();
        let outer = scene.add(Shape::new(square_path(0.0, 0.0, 100.0)).with_fill(Some(RED)));
        let speck = scene.add(Shape::new(square_path(10.0, 10.0, 2.0)).with_fill(Some(BLACK)));
        let items = build_items(&scene, &GeoKernel);
        assert!(absorb(&mut scene, &GeoKernel, outer, item(&items, speck)).unwrap());
        assert_eq!(scene.len(), 1);
        let d = scene.get(outer).unwrap().path_data().unwrap();
        assert_eq!(d, "M0 0 h100 v100 h-100 Z M10 10 h2 v2 h-2 Z");
    }

    #[test]
    fn evenodd_container_rolls_back() {
        // Under even-odd the absorbed square would punch a hole.
        let mut scene = Scene::default();
        let outer = scene.add(
            Shape::new(square_path(0.0, 0.0, 100.0))
                .with_fill(Some(RED))
                .with_fill_rule(FillRule::EvenOdd),
        );
        let speck = scene.add(Shape::new(square_path(10.0, 10.0, 2.0)).with_fill(Some(BLACK)));
        let before = scene.clone();
        let items = build_items(&scene, &GeoKernel);
        assert!(!absorb(&mut scene, &GeoKernel, outer, item(&items, speck)).unwrap());
        assert_eq!(scene, before);
    }

    #[test]
    fn hole_wound_candidate_is_reversed() {
        let mut scene = Scene::default();
        let outer = scene.add(Shape::new(square_path(0.0, 0.0, 100.0)).with_fill(Some(RED)));
        // Counter-wound relative to the container.
        let speck = scene.add(
            Shape::new(Geometry::path("M10 10 v2 h2 v-2 Z")).with_fill(Some(BLACK)),
        );
        let items = build_items(&scene, &GeoKernel);
        assert!(absorb(&mut scene, &GeoKernel, outer, item(&items, speck)).unwrap());
        let merged = scene.get(outer).unwrap();
        assert!(point_in_shape(&GeoKernel, merged, Point::new(11.0, 11.0)));
    }

    #[test]
    fn absorb_maps_candidate_into_container_space() {
        let mut scene = Scene::default();
        let outer = scene.add(
            Shape::new(square_path(0.0, 0.0, 50.0))
                .with_fill(Some(RED))
                .with_transform(Transform::scale(2.0, 2.0)),
        );
        let speck = scene.add(
            Shape::new(Geometry::rect(Rect::new(0.0, 0.0, 2.0, 2.0)))
                .with_fill(Some(BLACK))
                .with_transform(Transform::translate(10.0, 10.0)),
        );
        let items = build_items(&scene, &GeoKernel);
        // Rect candidates do not concatenate.
        assert!(!absorb(&mut scene, &GeoKernel, outer, item(&items, speck)).unwrap());

        let speck = scene.add(
            Shape::new(square_path(0.0, 0.0, 2.0))
                .with_fill(Some(BLACK))
                .with_transform(Transform::translate(10.0, 10.0)),
        );
        let items = build_items(&scene, &GeoKernel);
        assert!(absorb(&mut scene, &GeoKernel, outer, item(&items, speck)).unwrap());
        let d = scene.get(outer).unwrap().path_data().unwrap();
        assert!(d.ends_with("M5,5 L6,5 L6,6 L5,6 z"), "{d}");
    }
}
