//! Speckle detection and removal for one brush sample.
//!
//! A brush pass picks every small shape under the brush whose fill passes
//! the source filter, then handles each one according to
//! [`SpeckleAction`]: absorb it into the tightest enclosing shape of the
//! target color, or recolor it, or remove it.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::background::{self, BackgroundOptions, BackgroundPolicy};
use crate::brush::{Brush, HitMode};
use crate::cleanup::{CleanupOptions, cleanup};
use crate::color::Color;
use crate::containment::{absorb, find_container};
use crate::index::{ShapeItem, build_items};
use crate::kernel::GeometryKernel;
use crate::shape::{Scene, ShapeKind};
use crate::types::{EngineError, Point, check_non_negative};

/// Which fills the brush acts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceFilter {
    /// Only shapes filled with this color.
    Single(Color),
    /// Any filled shape, optionally sparing the detected background color.
    All { exclude_background: bool },
}

impl Default for SourceFilter {
    fn default() -> Self {
        Self::All {
            exclude_background: true,
        }
    }
}

/// What happens to a speckle under the brush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeckleAction {
    /// Recolor to the target color.
    Recolor,
    /// Absorb into an enclosing target-colored path, else recolor.
    #[default]
    Absorb,
    /// Absorb into an enclosing target-colored path, else remove.
    AbsorbOrRemove,
}

/// Brush pass parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeckleOptions {
    /// Shapes with a bbox area above this are not speckles.
    pub max_area: f64,
    /// Brush radius in global units.
    pub brush_radius: f64,
    pub source: SourceFilter,
    /// Color speckles are merged into or recolored to.
    pub target: Color,
    pub action: SpeckleAction,
    pub hit_mode: HitMode,
    /// Let path shapes above `max_area` be recolored too, so compound
    /// paths built by earlier merges stay editable.
    pub include_large_paths: bool,
    /// Cleanup run after a pass that changed something.
    pub cleanup: Option<CleanupOptions>,
}

impl SpeckleOptions {
    /// Default speckle area threshold.
    pub const DEFAULT_MAX_AREA: f64 = 25.0;
    /// Default brush radius.
    pub const DEFAULT_BRUSH_RADIUS: f64 = 8.0;
    /// Default target color (white).
    pub const DEFAULT_TARGET: Color = Color::Rgb(255, 255, 255);

    /// Default options merging into `target`.
    #[must_use]
    pub fn new(target: Color) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Reject negative or non-finite thresholds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOption`] naming the offending field.
    pub fn validate(&self) -> Result<(), EngineError> {
        check_non_negative("max_area", self.max_area)?;
        check_non_negative("brush_radius", self.brush_radius)?;
        if let Some(cleanup) = &self.cleanup {
            check_non_negative("min_area", cleanup.min_area)?;
        }
        Ok(())
    }

    fn is_speckle_sized(&self, item: &ShapeItem) -> bool {
        item.area <= self.max_area || (self.include_large_paths && item.kind == ShapeKind::Path)
    }
}

impl Default for SpeckleOptions {
    fn default() -> Self {
        Self {
            max_area: Self::DEFAULT_MAX_AREA,
            brush_radius: Self::DEFAULT_BRUSH_RADIUS,
            source: SourceFilter::default(),
            target: Self::DEFAULT_TARGET,
            action: SpeckleAction::default(),
            hit_mode: HitMode::default(),
            include_large_paths: false,
            cleanup: Some(CleanupOptions::default()),
        }
    }
}

/// Changes made by one brush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeckleReport {
    pub recolored: usize,
    pub absorbed: usize,
    pub removed: usize,
    /// Artifacts removed by the follow-up cleanup.
    pub cleaned: usize,
}

impl SpeckleReport {
    /// Speckles changed by the pass itself (cleanup excluded).
    #[must_use]
    pub const fn changed(&self) -> usize {
        self.recolored + self.absorbed + self.removed
    }

    /// Accumulate another pass into this report.
    pub const fn merge(&mut self, other: &Self) {
        self.recolored += other.recolored;
        self.absorbed += other.absorbed;
        self.removed += other.removed;
        self.cleaned += other.cleaned;
    }
}

/// Apply one brush sample at `center`.
pub fn speckle_pass(
    scene: &mut Scene,
    kernel: &dyn GeometryKernel,
    center: Point,
    options: &SpeckleOptions,
) -> SpeckleReport {
    let items = build_items(scene, kernel);
    let brush = Brush::new(center, options.brush_radius);

    let background = match options.source {
        SourceFilter::All {
            exclude_background: true,
        } => background::viewport(scene, &items).and_then(|vp| {
            background::detect(
                &items,
                &vp,
                &BackgroundPolicy::EdgeArea,
                BackgroundOptions::DEFAULT_EPSILON,
            )
        }),
        _ => None,
    };

    let candidates: Vec<&ShapeItem> = items
        .iter()
        .filter(|item| options.is_speckle_sized(item))
        .filter(|item| match (&options.source, &item.color) {
            (_, None) => false,
            (SourceFilter::Single(source), Some(color)) => color == source,
            (SourceFilter::All { .. }, Some(color)) => background.as_ref() != Some(color),
        })
        .filter(|item| {
            scene
                .get(item.id)
                .is_some_and(|shape| brush.hits(kernel, shape, item, options.hit_mode))
        })
        .collect();

    let mut report = SpeckleReport::default();
    for item in candidates {
        let Some(shape) = scene.get(item.id) else {
            continue;
        };
        let already_target = shape.fill.as_ref() == Some(&options.target);

        if options.action != SpeckleAction::Recolor
            && item.area <= options.max_area
            && shape.supports_path_concat()
            && let Some(container) =
                find_container(scene, kernel, &items, item, &options.target)
        {
            let container_id = container.id;
            let concat = scene
                .get(container_id)
                .is_some_and(crate::shape::Shape::supports_path_concat);
            if concat {
                match absorb(scene, kernel, container_id, item) {
                    Ok(true) => {
                        debug!("absorbed {} into {container_id}", item.id);
                        report.absorbed += 1;
                        continue;
                    }
                    Ok(false) => {}
                    Err(e) => warn!("could not absorb {} into {container_id}: {e}", item.id),
                }
            }
        }

        if already_target {
            continue;
        }
        match options.action {
            SpeckleAction::AbsorbOrRemove => {
                scene.remove(item.id);
                report.removed += 1;
            }
            SpeckleAction::Recolor | SpeckleAction::Absorb => {
                if let Some(shape) = scene.get_mut(item.id) {
                    shape.fill = Some(options.target.clone());
                    report.recolored += 1;
                }
            }
        }
    }

    if report.changed() > 0
        && let Some(cleanup_options) = &options.cleanup
    {
        report.cleaned = cleanup(scene, kernel, cleanup_options).count();
    }
    report
}
