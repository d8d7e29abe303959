//! Artifact cleanup: removing leftovers that are never meaningful fill
//! regions.
//!
//! A shape is an artifact when it is a line or polyline, when its path
//! data is empty or malformed, when the path is open (it never closes, or
//! it has more than one unterminated subpath), when it is stroked but not
//! filled, or when its global bbox area falls below a floor.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::global_bbox;
use crate::kernel::GeometryKernel;
use crate::outline;
use crate::shape::{Scene, Shape, ShapeId, ShapeKind};

/// Cleanup thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupOptions {
    /// Shapes with a global bbox area below this are removed.
    pub min_area: f64,
}

impl CleanupOptions {
    /// Default area floor.
    pub const DEFAULT_MIN_AREA: f64 = 0.5;
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self {
            min_area: Self::DEFAULT_MIN_AREA,
        }
    }
}

/// Why a shape was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Artifact {
    /// Line or polyline element.
    LineLike,
    /// Empty or unparseable path data.
    MalformedPath,
    /// Path that never closes or leaves several subpaths unterminated.
    OpenPath,
    /// Stroke paint without fill paint.
    StrokeOnly,
    /// Bounding-box area below the floor.
    Tiny,
}

/// Shapes removed by one cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub removed: Vec<(ShapeId, Artifact)>,
}

impl CleanupReport {
    /// Number of shapes removed.
    #[must_use]
    pub fn count(&self) -> usize {
        self.removed.len()
    }
}

/// Classify a single shape, or `None` when it is worth keeping.
#[must_use]
pub fn classify(
    kernel: &dyn GeometryKernel,
    shape: &Shape,
    options: &CleanupOptions,
) -> Option<Artifact> {
    if matches!(shape.kind(), ShapeKind::Line | ShapeKind::Polyline) {
        return Some(Artifact::LineLike);
    }
    if let Some(d) = shape.path_data() {
        if d.trim().is_empty() {
            return Some(Artifact::MalformedPath);
        }
        match outline::analyze(d) {
            Err(_) => return Some(Artifact::MalformedPath),
            Ok(stats) if stats.closed + stats.unterminated == 0 => {
                return Some(Artifact::MalformedPath);
            }
            Ok(stats) if stats.closed == 0 || stats.unterminated > 1 => {
                return Some(Artifact::OpenPath);
            }
            Ok(_) => {}
        }
    }
    if shape.fill.is_none() && shape.stroke.is_some() {
        return Some(Artifact::StrokeOnly);
    }
    match global_bbox(kernel, shape) {
        Ok(bbox) if bbox.area() >= options.min_area => None,
        _ => Some(Artifact::Tiny),
    }
}

/// Remove every artifact from the scene in one pass.
///
/// Candidates are classified against the unmodified scene, then removed.
pub fn cleanup(
    scene: &mut Scene,
    kernel: &dyn GeometryKernel,
    options: &CleanupOptions,
) -> CleanupReport {
    let removed: Vec<(ShapeId, Artifact)> = scene
        .shapes()
        .iter()
        .filter_map(|shape| classify(kernel, shape, options).map(|a| (shape.id(), a)))
        .collect();
    for (id, artifact) in &removed {
        debug!("removing {id}: {artifact:?}");
    }
    let ids: Vec<ShapeId> = removed.iter().map(|(id, _)| *id).collect();
    scene.remove_all(&ids);
    CleanupReport { removed }
}

/// Run [`cleanup`] up to `max_passes` times, stopping early once a pass
/// removes nothing.
pub fn cleanup_until_stable(
    scene: &mut Scene,
    kernel: &dyn GeometryKernel,
    options: &CleanupOptions,
    max_passes: usize,
) -> CleanupReport {
    let mut report = CleanupReport::default();
    for _ in 0..max_passes {
        let pass = cleanup(scene, kernel, options);
        if pass.removed.is_empty() {
            break;
        }
        report.removed.extend(pass.removed);
    }
    report
}
