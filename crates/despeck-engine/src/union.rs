//! Connected-component union merge.
//!
//! Shapes of one color whose global bboxes overlap are grouped with a
//! union-find over the overlap graph, so a shape joins a group through any
//! chain of overlaps. Each group of two or more is folded through
//! [`GeometryKernel::union`] into a single even-odd path.
//!
//! Overlap candidates come from an R\*-tree self-join on the bboxes, then
//! are confirmed with the inclusive [`Rect::intersects`](crate::types::Rect::intersects) test.

use log::{debug, warn};
use petgraph::unionfind::UnionFind;
use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};
use serde::{Deserialize, Serialize};

use crate::cleanup::{CleanupOptions, cleanup_until_stable};
use crate::color::Color;
use crate::index::{ShapeItem, build_items};
use crate::kernel::GeometryKernel;
use crate::shape::{FillRule, Scene, Shape, ShapeId};

/// A bbox in the R\*-tree, tagged with its index into the color's item list.
type IndexedBox = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Union merge parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnionOptions {
    /// Colors to merge; `None` merges every color of the palette.
    pub colors: Option<Vec<Color>>,
    /// Cleanup applied after merging.
    pub cleanup: CleanupOptions,
    /// Maximum number of cleanup passes.
    pub cleanup_passes: usize,
}

impl UnionOptions {
    /// Default number of cleanup passes after a merge.
    pub const DEFAULT_CLEANUP_PASSES: usize = 2;
}

impl Default for UnionOptions {
    fn default() -> Self {
        Self {
            colors: None,
            cleanup: CleanupOptions::default(),
            cleanup_passes: Self::DEFAULT_CLEANUP_PASSES,
        }
    }
}

/// Changes made by a union merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionReport {
    /// Groups replaced by a merged shape.
    pub groups_merged: usize,
    /// Shapes removed by merging (members minus one per merged group).
    pub shapes_eliminated: usize,
    /// Group members left in place because their union failed.
    pub failed_members: usize,
    /// Artifacts removed by the follow-up cleanup.
    pub artifacts_removed: usize,
}

/// Partition `items` into groups connected by bbox overlap.
///
/// Groups are ordered by their earliest member and members keep paint
/// order. Singletons are included.
#[must_use]
pub fn connected_components(items: &[&ShapeItem]) -> Vec<Vec<usize>> {
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }
    let boxes: Vec<IndexedBox> = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let b = item.bbox;
            GeomWithData::new(
                Rectangle::from_corners([b.x, b.y], [b.right(), b.bottom()]),
                i,
            )
        })
        .collect();
    let tree = RTree::bulk_load(boxes);

    let mut uf = UnionFind::<usize>::new(n);
    for (a, b) in tree.intersection_candidates_with_other_tree(&tree) {
        if a.data < b.data && items[a.data].bbox.intersects(&items[b.data].bbox) {
            uf.union(a.data, b.data);
        }
    }

    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for i in 0..n {
        let root = uf.find_mut(i);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => groups.push((root, vec![i])),
        }
    }
    groups.into_iter().map(|(_, members)| members).collect()
}

/// Fold a group's members through the kernel's union.
///
/// Returns the merged shape and the ids that went into it. A member whose
/// union with the running result fails is skipped and stays in the scene.
/// When the seed unions with nothing (a shape without area, for one), the
/// next member seeds the fold instead.
fn fold_group(
    scene: &Scene,
    kernel: &dyn GeometryKernel,
    color: &Color,
    members: &[ShapeId],
) -> Option<(Shape, Vec<ShapeId>)> {
    let shapes: Vec<&Shape> = members.iter().filter_map(|id| scene.get(*id)).collect();
    let (running, folded, skipped) = shapes.iter().enumerate().find_map(|(seed, first)| {
        let mut running = (*first).clone();
        let mut folded = vec![first.id()];
        let mut skipped = Vec::new();
        for (i, shape) in shapes.iter().enumerate() {
            if i == seed {
                continue;
            }
            match kernel.union(&running, shape) {
                Ok(geometry) => {
                    running = Shape::new(geometry).with_fill_rule(FillRule::EvenOdd);
                    folded.push(shape.id());
                }
                Err(e) => skipped.push((shape.id(), e)),
            }
        }
        if folded.len() < 2 {
            debug!("{} seeds no {color} union", first.id());
            return None;
        }
        Some((running, folded, skipped))
    })?;
    for (id, e) in skipped {
        warn!("skipping {id} in {color} union: {e}");
    }
    // Rebuilt by the fold, so no stroke is carried over.
    Some((running.with_fill(Some(color.clone())), folded))
}

/// Merge every overlapping same-color group into one shape.
///
/// Merged shapes are appended in the order their groups were found. The
/// index is rebuilt per color so earlier merges are visible to later ones.
pub fn union_merge(
    scene: &mut Scene,
    kernel: &dyn GeometryKernel,
    options: &UnionOptions,
) -> UnionReport {
    let colors = options.colors.clone().unwrap_or_else(|| scene.palette());
    let mut report = UnionReport::default();

    for color in &colors {
        let items = build_items(scene, kernel);
        let same: Vec<&ShapeItem> = items
            .iter()
            .filter(|item| item.color.as_ref() == Some(color))
            .collect();

        let merges: Vec<(Shape, Vec<ShapeId>, usize)> = connected_components(&same)
            .into_iter()
            .filter(|group| group.len() >= 2)
            .filter_map(|group| {
                let ids: Vec<ShapeId> = group.iter().map(|&i| same[i].id).collect();
                fold_group(scene, kernel, color, &ids).map(|(shape, folded)| {
                    let failed = ids.len() - folded.len();
                    (shape, folded, failed)
                })
            })
            .collect();

        for (shape, folded, failed) in merges {
            debug!("merged {} {color} shapes", folded.len());
            scene.remove_all(&folded);
            scene.add(shape);
            report.groups_merged += 1;
            report.shapes_eliminated += folded.len() - 1;
            report.failed_members += failed;
        }
    }

    report.artifacts_removed =
        cleanup_until_stable(scene, kernel, &options.cleanup, options.cleanup_passes).count();
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::GeoKernel;
    use crate::shape::Geometry;
    use crate::types::{GeometryError, Point, Rect, Transform};

    const BLUE: Color = Color::Rgb(0, 0, 255);
    const RED: Color = Color::Rgb(255, 0, 0);

    fn rect(x: f64, y: f64, w: f64, h: f64, fill: Color) -> Shape {
        Shape::new(Geometry::rect(Rect::new(x, y, w, h))).with_fill(Some(fill))
    }

    fn item(id: u64, x: f64, y: f64, w: f64, h: f64) -> ShapeItem {
        let bbox = Rect::new(x, y, w, h);
        ShapeItem {
            id: ShapeId(id),
            kind: crate::shape::ShapeKind::Rect,
            bbox,
            area: bbox.area(),
            color: Some(BLUE),
            centroid: bbox.center(),
        }
    }

    // --- connected_components ---

    #[test]
    fn chains_of_overlaps_form_one_component() {
        // 0 overlaps 2, 2 overlaps 1: 0 and 1 join only through 2.
        let items = [
            item(0, 0.0, 0.0, 10.0, 10.0),
            item(1, 18.0, 0.0, 10.0, 10.0),
            item(2, 9.0, 0.0, 10.0, 10.0),
            item(3, 50.0, 50.0, 1.0, 1.0),
        ];
        let refs: Vec<&ShapeItem> = items.iter().collect();
        assert_eq!(connected_components(&refs), vec![vec![0, 1, 2], vec![3]]);
    }

    #[test]
    fn touching_boxes_are_connected() {
        let items = [item(0, 0.0, 0.0, 10.0, 10.0), item(1, 10.0, 0.0, 10.0, 10.0)];
        let refs: Vec<&ShapeItem> = items.iter().collect();
        assert_eq!(connected_components(&refs).len(), 1);
    }

    #[test]
    fn no_items_no_components() {
        assert!(connected_components(&[]).is_empty());
    }

    // --- union_merge ---

    #[test]
    fn overlapping_group_collapses_and_isolated_survives() {
        let mut scene = Scene::default();
        scene.add(rect(0.0, 0.0, 10.0, 10.0, BLUE));
        scene.add(rect(5.0, 5.0, 10.0, 10.0, BLUE));
        scene.add(rect(12.0, 12.0, 10.0, 10.0, BLUE));
        let isolated = scene.add(rect(60.0, 60.0, 5.0, 5.0, BLUE));
        let report = union_merge(&mut scene, &GeoKernel, &UnionOptions::default());
        assert_eq!(report.groups_merged, 1);
        assert_eq!(report.shapes_eliminated, 2);
        assert_eq!(scene.len(), 2);
        assert!(scene.contains(isolated));

        let merged = scene.shapes().last().unwrap();
        assert_eq!(merged.fill, Some(BLUE));
        assert_eq!(merged.stroke, None);
        assert_eq!(merged.fill_rule, FillRule::EvenOdd);
        let inside = Point::new(13.0, 13.0);
        assert!(crate::geometry::point_in_shape(&GeoKernel, merged, inside));
    }

    #[test]
    fn colors_are_merged_separately() {
        let mut scene = Scene::default();
        scene.add(rect(0.0, 0.0, 10.0, 10.0, BLUE));
        scene.add(rect(5.0, 0.0, 10.0, 10.0, RED));
        let before = scene.clone();
        let report = union_merge(&mut scene, &GeoKernel, &UnionOptions::default());
        assert_eq!(report, UnionReport::default());
        assert_eq!(scene, before);
    }

    #[test]
    fn color_subset_limits_the_merge() {
        let mut scene = Scene::default();
        scene.add(rect(0.0, 0.0, 10.0, 10.0, BLUE));
        scene.add(rect(5.0, 0.0, 10.0, 10.0, BLUE));
        scene.add(rect(0.0, 20.0, 10.0, 10.0, RED));
        scene.add(rect(5.0, 20.0, 10.0, 10.0, RED));
        let options = UnionOptions {
            colors: Some(vec![RED]),
            ..UnionOptions::default()
        };
        let report = union_merge(&mut scene, &GeoKernel, &options);
        assert_eq!(report.shapes_eliminated, 1);
        assert_eq!(scene.len(), 3);
    }

    #[test]
    fn transformed_members_merge_in_global_space() {
        let mut scene = Scene::default();
        scene.add(rect(0.0, 0.0, 10.0, 10.0, BLUE));
        scene.add(rect(0.0, 0.0, 10.0, 10.0, BLUE).with_transform(Transform::translate(5.0, 0.0)));
        union_merge(&mut scene, &GeoKernel, &UnionOptions::default());
        assert_eq!(scene.len(), 1);
        let merged = &scene.shapes()[0];
        let bbox = crate::geometry::global_bbox(&GeoKernel, merged).unwrap();
        assert!((bbox.width - 15.0).abs() < 1e-9);
    }

    /// Kernel whose union always fails for one shape id.
    struct Flaky(ShapeId);

    impl GeometryKernel for Flaky {
        fn local_bbox(&self, shape: &Shape) -> Result<Rect, GeometryError> {
            GeoKernel.local_bbox(shape)
        }
        fn transform(&self, shape: &Shape) -> Option<Transform> {
            GeoKernel.transform(shape)
        }
        fn point_in_fill(&self, shape: &Shape, local: Point) -> Option<bool> {
            GeoKernel.point_in_fill(shape, local)
        }
        fn point_in_stroke(&self, shape: &Shape, local: Point) -> Option<bool> {
            GeoKernel.point_in_stroke(shape, local)
        }
        fn union(&self, a: &Shape, b: &Shape) -> Result<Geometry, GeometryError> {
            if a.id() == self.0 || b.id() == self.0 {
                return Err(GeometryError::Union("flaky".into()));
            }
            GeoKernel.union(a, b)
        }
        fn global_path_data(&self, shape: &Shape) -> Result<String, GeometryError> {
            GeoKernel.global_path_data(shape)
        }
    }

    #[test]
    fn failed_pair_is_skipped_and_fold_continues() {
        let mut scene = Scene::default();
        scene.add(rect(0.0, 0.0, 10.0, 10.0, BLUE));
        let bad = scene.add(rect(5.0, 0.0, 10.0, 10.0, BLUE));
        scene.add(rect(8.0, 0.0, 10.0, 10.0, BLUE));
        let report = union_merge(&mut scene, &Flaky(bad), &UnionOptions::default());
        assert_eq!(report.groups_merged, 1);
        assert_eq!(report.shapes_eliminated, 1);
        assert_eq!(report.failed_members, 1);
        assert!(scene.contains(bad));
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn arealess_first_member_hands_the_seed_on() {
        let mut scene = Scene::default();
        scene.add(
            Shape::new(Geometry::Line {
                x1: 0.0,
                y1: 0.0,
                x2: 20.0,
                y2: 20.0,
            })
            .with_fill(Some(BLUE)),
        );
        scene.add(rect(0.0, 0.0, 10.0, 10.0, BLUE));
        scene.add(rect(5.0, 5.0, 10.0, 10.0, BLUE));
        let report = union_merge(&mut scene, &GeoKernel, &UnionOptions::default());
        assert_eq!(report.groups_merged, 1);
        assert_eq!(report.shapes_eliminated, 1);
        assert_eq!(report.failed_members, 1);
        // The line is left for cleanup, which removes it.
        assert_eq!(report.artifacts_removed, 1);
        assert_eq!(scene.len(), 1);
        let merged = &scene.shapes()[0];
        assert!(crate::geometry::point_in_shape(&GeoKernel, merged, Point::new(12.0, 12.0)));
    }

    #[test]
    fn failing_seed_still_keeps_later_failures_out() {
        let mut scene = Scene::default();
        let bad = scene.add(rect(0.0, 0.0, 10.0, 10.0, BLUE));
        scene.add(rect(5.0, 0.0, 10.0, 10.0, BLUE));
        scene.add(rect(8.0, 0.0, 10.0, 10.0, BLUE));
        let report = union_merge(&mut scene, &Flaky(bad), &UnionOptions::default());
        assert_eq!(report.shapes_eliminated, 1);
        assert_eq!(report.failed_members, 1);
        assert!(scene.contains(bad));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: UnionOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, UnionOptions::default());
    }
}
