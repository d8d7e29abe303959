//! Background flattening.
//!
//! Shapes whose bounding box reaches a viewport edge (within
//! [`BackgroundOptions::DEFAULT_EPSILON`]) and carry the background color
//! are either deleted or collapsed into one path inserted behind
//! everything else.
//!
//! # Policies
//!
//! Which color counts as "background" is a [`BackgroundPolicy`]:
//! [`EdgeArea`](BackgroundPolicy::EdgeArea) picks the color with the most
//! bbox area among edge-touching shapes, [`Lightest`](BackgroundPolicy::Lightest)
//! picks the lightest color in the scene when it is bright enough and the
//! color with the most total area otherwise, and
//! [`Color`](BackgroundPolicy::Color) names the color explicitly.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::index::{ShapeItem, build_items};
use crate::kernel::GeometryKernel;
use crate::shape::{FillRule, Geometry, Scene, Shape, ShapeId};
use crate::types::Rect;

/// How the background color is chosen.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum BackgroundPolicy {
    /// Largest total bbox area among edge-touching shapes.
    #[default]
    EdgeArea,
    /// Lightest scene color when its relative luminance exceeds
    /// `min_luminance`, else the color with the largest total area.
    Lightest { min_luminance: f64 },
    /// A caller-chosen color.
    Color(Color),
}

impl BackgroundPolicy {
    /// Default brightness threshold for [`BackgroundPolicy::Lightest`].
    pub const DEFAULT_MIN_LUMINANCE: f64 = 0.8;
}

/// What happens to the background shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackgroundMode {
    /// Replace them with one path behind everything else, filled with
    /// `fill` (or the detected color when `None`).
    Flatten { fill: Option<Color> },
    /// Delete them.
    Remove,
}

impl Default for BackgroundMode {
    fn default() -> Self {
        Self::Flatten { fill: None }
    }
}

/// Background pass configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundOptions {
    pub policy: BackgroundPolicy,
    pub mode: BackgroundMode,
    /// Edge contact tolerance in global units.
    pub epsilon: f64,
}

impl BackgroundOptions {
    /// Default edge contact tolerance.
    pub const DEFAULT_EPSILON: f64 = 0.5;
}

impl Default for BackgroundOptions {
    fn default() -> Self {
        Self {
            policy: BackgroundPolicy::default(),
            mode: BackgroundMode::default(),
            epsilon: Self::DEFAULT_EPSILON,
        }
    }
}

/// Outcome of a background pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundReport {
    /// The background color, if one was found.
    pub color: Option<Color>,
    /// Number of edge-touching shapes removed.
    pub edge_shapes: usize,
    /// The inserted background path, in flatten mode.
    pub inserted: Option<ShapeId>,
}

/// The canvas viewport in global coordinates.
///
/// The declared `viewBox` wins (shape coordinates live in it), then the
/// explicit width and height from the origin, then the envelope of every
/// measurable shape.
#[must_use]
pub fn viewport(scene: &Scene, items: &[ShapeItem]) -> Option<Rect> {
    // Checked before width/height: shape bboxes are in viewBox units, and
    // width/height only set the display size.
    if let Some(view_box) = scene.canvas.view_box {
        return Some(view_box);
    }
    if let (Some(width), Some(height)) = (scene.canvas.width, scene.canvas.height) {
        return Some(Rect::new(0.0, 0.0, width, height));
    }
    Rect::envelope(items.iter().flat_map(|i| i.bbox.corners()))
}

/// Whether the bbox comes within `epsilon` of any viewport edge.
#[must_use]
pub fn touches_edge(bbox: &Rect, viewport: &Rect, epsilon: f64) -> bool {
    bbox.x <= viewport.x + epsilon
        || bbox.y <= viewport.y + epsilon
        || bbox.right() >= viewport.right() - epsilon
        || bbox.bottom() >= viewport.bottom() - epsilon
}

/// Total bbox area per color, in order of first appearance.
fn area_by_color<'a>(items: impl Iterator<Item = &'a ShapeItem>) -> Vec<(Color, f64)> {
    let mut totals: Vec<(Color, f64)> = Vec::new();
    for item in items {
        let Some(color) = &item.color else { continue };
        match totals.iter_mut().find(|(c, _)| c == color) {
            Some((_, total)) => *total += item.area,
            None => totals.push((color.clone(), item.area)),
        }
    }
    totals
}

/// Largest total, ties to the earliest color.
fn dominant(totals: Vec<(Color, f64)>) -> Option<Color> {
    totals
        .into_iter()
        .fold(None, |best: Option<(Color, f64)>, (color, area)| match best {
            Some((_, best_area)) if best_area >= area => best,
            _ => Some((color, area)),
        })
        .map(|(color, _)| color)
}

/// Pick the background color under a policy.
#[must_use]
pub fn detect(
    items: &[ShapeItem],
    viewport: &Rect,
    policy: &BackgroundPolicy,
    epsilon: f64,
) -> Option<Color> {
    match policy {
        BackgroundPolicy::Color(color) => Some(color.clone()),
        BackgroundPolicy::EdgeArea => dominant(area_by_color(
            items
                .iter()
                .filter(|i| touches_edge(&i.bbox, viewport, epsilon)),
        )),
        BackgroundPolicy::Lightest { min_luminance } => {
            let totals = area_by_color(items.iter());
            let lightest = totals
                .iter()
                .filter_map(|(c, _)| c.luminance().map(|l| (c, l)))
                .fold(None, |best: Option<(&Color, f64)>, (c, l)| match best {
                    Some((_, best_l)) if best_l >= l => best,
                    _ => Some((c, l)),
                });
            match lightest {
                Some((color, luminance)) if luminance > *min_luminance => Some(color.clone()),
                _ => dominant(totals),
            }
        }
    }
}

/// Background color of the scene under a policy, for callers that only
/// need the color.
#[must_use]
pub fn detect_in_scene(
    scene: &Scene,
    kernel: &dyn GeometryKernel,
    policy: &BackgroundPolicy,
    epsilon: f64,
) -> Option<Color> {
    let items = build_items(scene, kernel);
    let viewport = viewport(scene, &items)?;
    detect(&items, &viewport, policy, epsilon)
}

/// Remove or flatten the edge-touching background shapes.
///
/// Leaves the scene untouched (and reports zero edge shapes) when no
/// background color is found or no shape of that color touches an edge.
pub fn flatten_background(
    scene: &mut Scene,
    kernel: &dyn GeometryKernel,
    options: &BackgroundOptions,
) -> BackgroundReport {
    let items = build_items(scene, kernel);
    let Some(viewport) = viewport(scene, &items) else {
        return BackgroundReport::default();
    };
    let Some(color) = detect(&items, &viewport, &options.policy, options.epsilon) else {
        return BackgroundReport::default();
    };
    let candidates: Vec<ShapeId> = items
        .iter()
        .filter(|i| {
            i.color.as_ref() == Some(&color) && touches_edge(&i.bbox, &viewport, options.epsilon)
        })
        .map(|i| i.id)
        .collect();
    if candidates.is_empty() {
        return BackgroundReport {
            color: Some(color),
            ..BackgroundReport::default()
        };
    }

    let inserted = match &options.mode {
        BackgroundMode::Remove => None,
        BackgroundMode::Flatten { fill } => {
            let (parts, rules): (Vec<String>, Vec<FillRule>) = candidates
                .iter()
                .filter_map(|id| scene.get(*id))
                .filter_map(|shape| outline_part(kernel, shape).map(|d| (d, shape.fill_rule)))
                .unzip();
            // Holes in even-odd sources survive only if every part keeps the rule.
            let even_odd = !rules.is_empty() && rules.iter().all(|r| *r == FillRule::EvenOdd);
            let fill_rule = if even_odd {
                FillRule::EvenOdd
            } else {
                FillRule::NonZero
            };
            let data = if parts.is_empty() {
                format!(
                    "M{} {} H{} V{} H{} Z",
                    viewport.x,
                    viewport.y,
                    viewport.right(),
                    viewport.bottom(),
                    viewport.x
                )
            } else {
                parts.join(" ")
            };
            Some(
                Shape::new(Geometry::path(data))
                    .with_fill(Some(fill.clone().unwrap_or_else(|| color.clone())))
                    .with_fill_rule(fill_rule),
            )
        }
    };

    let edge_shapes = scene.remove_all(&candidates);
    let inserted = inserted.map(|shape| scene.insert_front(shape));
    BackgroundReport {
        color: Some(color),
        edge_shapes,
        inserted,
    }
}

/// Global path data contributed by one removed background shape.
fn outline_part(kernel: &dyn GeometryKernel, shape: &Shape) -> Option<String> {
    if let (Some(d), true) = (shape.path_data(), shape.transform.is_identity()) {
        return (!d.trim().is_empty()).then(|| d.to_owned());
    }
    match kernel.global_path_data(shape) {
        Ok(d) => Some(d),
        Err(e) => {
            debug!("background shape {} has no usable outline: {e}", shape.id());
            None
        }
    }
}
