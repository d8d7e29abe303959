//! The editing façade: owns the live scene, its undo history and the
//! geometry kernel, and turns every operation into an [`Outcome`].
//!
//! Every destructive operation captures a snapshot before it mutates and
//! pushes it only when something changed. A brush stroke captures once at
//! [`Editor::begin_stroke`], however many samples follow.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::background::{self, BackgroundMode, BackgroundOptions, BackgroundPolicy};
use crate::cleanup::{self, CleanupOptions};
use crate::color::Color;
use crate::history::{History, Snapshot};
use crate::index::build_items;
use crate::kernel::{GeoKernel, GeometryKernel};
use crate::shape::Scene;
use crate::speckle::{SpeckleOptions, SpeckleReport, speckle_pass};
use crate::types::{EngineError, Point, check_non_negative};
use crate::union::{self, UnionOptions};

/// The kind of operation an [`Outcome`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    Brush,
    Union,
    Background,
    Cleanup,
    Undo,
}

impl Operation {
    /// Short lowercase name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Brush => "brush",
            Self::Union => "union",
            Self::Background => "background",
            Self::Cleanup => "cleanup",
            Self::Undo => "undo",
        }
    }
}

/// What an operation did, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub operation: Operation,
    /// Number of shapes the operation changed.
    pub changed: usize,
    /// Human-readable status line.
    pub status: String,
    /// Whether the set of fill colors differs from before the operation.
    pub palette_changed: bool,
}

/// State of an in-progress brush drag.
struct Stroke {
    options: SpeckleOptions,
    snapshot: Snapshot,
    palette: Vec<Color>,
    report: SpeckleReport,
}

/// Stateful editor over one scene.
pub struct Editor {
    scene: Scene,
    history: History,
    kernel: Box<dyn GeometryKernel>,
    stroke: Option<Stroke>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Empty editor using [`GeoKernel`] and the default history capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_kernel(Box::new(GeoKernel), History::DEFAULT_CAPACITY)
    }

    /// Empty editor with a custom kernel and history capacity.
    #[must_use]
    pub fn with_kernel(kernel: Box<dyn GeometryKernel>, history_capacity: usize) -> Self {
        Self {
            scene: Scene::default(),
            history: History::new(history_capacity),
            kernel,
            stroke: None,
        }
    }

    #[must_use]
    pub const fn scene(&self) -> &Scene {
        &self.scene
    }

    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn kernel(&self) -> &dyn GeometryKernel {
        self.kernel.as_ref()
    }

    /// Whether a brush stroke is in progress.
    #[must_use]
    pub const fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    /// Distinct fill colors of the live scene, in paint order.
    #[must_use]
    pub fn palette(&self) -> Vec<Color> {
        self.scene.palette()
    }

    /// Consume the editor, yielding the live scene.
    #[must_use]
    pub fn into_scene(self) -> Scene {
        self.scene
    }

    /// Background color of the live scene under `policy`.
    #[must_use]
    pub fn background_color(&self, policy: &BackgroundPolicy, epsilon: f64) -> Option<Color> {
        background::detect_in_scene(&self.scene, self.kernel(), policy, epsilon)
    }

    // -----------------------------------------------------------------------
    // Load / undo
    // -----------------------------------------------------------------------

    /// Install a new scene, discarding the history and any active stroke.
    pub fn load(&mut self, scene: Scene, name: &str) -> Outcome {
        self.stroke = None;
        self.history.clear();
        self.scene = scene;
        let drawable = build_items(&self.scene, self.kernel()).len();
        outcome(
            Operation::Load,
            0,
            format!("Loaded {name}. Found {drawable} drawable shapes."),
            true,
        )
    }

    /// Restore the most recent snapshot. An active stroke is ended first.
    pub fn undo(&mut self) -> Outcome {
        if self.stroke.is_some() {
            self.finish_stroke();
        }
        let Some(snapshot) = self.history.pop() else {
            return outcome(Operation::Undo, 0, "Nothing to undo.".to_owned(), false);
        };
        let palette = self.palette();
        self.scene = snapshot.into_scene();
        let palette_changed = palette != self.palette();
        outcome(
            Operation::Undo,
            1,
            format!(
                "Undo complete. Remaining undo steps: {}.",
                self.history.len()
            ),
            palette_changed,
        )
    }

    // -----------------------------------------------------------------------
    // Brush strokes
    // -----------------------------------------------------------------------

    /// Start a drag. The scene is captured now; the snapshot reaches the
    /// history only if the stroke changes something.
    ///
    /// An already active stroke is ended first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOption`] for bad thresholds. No stroke
    /// is started in that case.
    pub fn begin_stroke(&mut self, options: SpeckleOptions) -> Result<(), EngineError> {
        options.validate()?;
        if self.stroke.is_some() {
            self.finish_stroke();
        }
        self.stroke = Some(Stroke {
            options,
            snapshot: Snapshot::capture(&self.scene),
            palette: self.palette(),
            report: SpeckleReport::default(),
        });
        Ok(())
    }

    /// Apply one brush sample of the active stroke at `center`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoActiveStroke`] outside a stroke.
    pub fn stroke_to(&mut self, center: Point) -> Result<Outcome, EngineError> {
        let stroke = self.stroke.as_mut().ok_or(EngineError::NoActiveStroke)?;
        let palette = self.scene.palette();
        let report = speckle_pass(&mut self.scene, self.kernel.as_ref(), center, &stroke.options);
        stroke.report.merge(&report);
        debug!("brush sample at ({}, {}): {report:?}", center.x, center.y);
        let palette_changed = report.changed() > 0 && palette != self.scene.palette();
        Ok(Outcome {
            operation: Operation::Brush,
            changed: report.changed(),
            status: eraser_status(report.changed()),
            palette_changed,
        })
    }

    /// End the active stroke and report its total.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoActiveStroke`] outside a stroke.
    pub fn end_stroke(&mut self) -> Result<Outcome, EngineError> {
        if self.stroke.is_none() {
            return Err(EngineError::NoActiveStroke);
        }
        Ok(self.finish_stroke())
    }

    /// A single click: one stroke with one sample.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOption`] for bad thresholds.
    pub fn brush(&mut self, center: Point, options: SpeckleOptions) -> Result<Outcome, EngineError> {
        self.begin_stroke(options)?;
        self.stroke_to(center)?;
        self.end_stroke()
    }

    fn finish_stroke(&mut self) -> Outcome {
        let Some(stroke) = self.stroke.take() else {
            return outcome(Operation::Brush, 0, eraser_status(0), false);
        };
        let changed = stroke.report.changed();
        if changed > 0 {
            self.history.push(stroke.snapshot);
        }
        let palette_changed = stroke.palette != self.palette();
        outcome(Operation::Brush, changed, eraser_status(changed), palette_changed)
    }

    // -----------------------------------------------------------------------
    // One-shot operations
    // -----------------------------------------------------------------------

    /// Merge overlapping same-color shapes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOption`] for a bad cleanup floor.
    pub fn union_merge(&mut self, options: &UnionOptions) -> Result<Outcome, EngineError> {
        check_non_negative("min_area", options.cleanup.min_area)?;
        let snapshot = Snapshot::capture(&self.scene);
        let report = union::union_merge(&mut self.scene, self.kernel.as_ref(), options);
        let mutated = report.shapes_eliminated > 0 || report.artifacts_removed > 0;
        let mut status = if report.groups_merged == 0 {
            "No overlapping same-color shapes to merge.".to_owned()
        } else {
            format!(
                "Merged {} group(s), eliminating {} shape(s).",
                report.groups_merged, report.shapes_eliminated
            )
        };
        if report.artifacts_removed > 0 {
            status.push_str(&format!(
                " Cleanup removed {} artifact(s).",
                report.artifacts_removed
            ));
        }
        let changed = report.shapes_eliminated + report.artifacts_removed;
        Ok(self.commit(Operation::Union, snapshot, mutated, changed, status))
    }

    /// Flatten or remove the edge-touching background.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOption`] for a bad epsilon or luminance
    /// threshold.
    pub fn flatten_background(
        &mut self,
        options: &BackgroundOptions,
    ) -> Result<Outcome, EngineError> {
        check_non_negative("epsilon", options.epsilon)?;
        if let BackgroundPolicy::Lightest { min_luminance } = options.policy {
            check_non_negative("min_luminance", min_luminance)?;
        }
        let snapshot = Snapshot::capture(&self.scene);
        let report = background::flatten_background(&mut self.scene, self.kernel.as_ref(), options);
        let n = report.edge_shapes;
        let status = if n == 0 {
            if matches!(options.policy, BackgroundPolicy::Color(_)) {
                "No edge-contact shapes found for selected merge color.".to_owned()
            } else {
                "No edge-contact background shapes found.".to_owned()
            }
        } else if matches!(options.mode, BackgroundMode::Remove) {
            format!("Removed background from {n} edge-contact shape(s).")
        } else {
            format!("Flattened background from {n} edge-contact shape(s).")
        };
        Ok(self.commit(Operation::Background, snapshot, n > 0, n, status))
    }

    /// Remove artifacts from the scene.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidOption`] for a bad area floor.
    pub fn cleanup(&mut self, options: &CleanupOptions) -> Result<Outcome, EngineError> {
        check_non_negative("min_area", options.min_area)?;
        let snapshot = Snapshot::capture(&self.scene);
        let report = cleanup::cleanup(&mut self.scene, self.kernel.as_ref(), options);
        let n = report.count();
        let status = format!("Cleanup removed {n} artifact(s).");
        Ok(self.commit(Operation::Cleanup, snapshot, n > 0, n, status))
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Push the pre-operation snapshot when the scene was mutated.
    fn commit(
        &mut self,
        operation: Operation,
        snapshot: Snapshot,
        mutated: bool,
        changed: usize,
        status: String,
    ) -> Outcome {
        let palette_changed = mutated && snapshot.scene().palette() != self.palette();
        if mutated {
            self.history.push(snapshot);
        }
        outcome(operation, changed, status, palette_changed)
    }
}

fn outcome(operation: Operation, changed: usize, status: String, palette_changed: bool) -> Outcome {
    info!("{status}");
    Outcome {
        operation,
        changed,
        status,
        palette_changed,
    }
}

fn eraser_status(changed: usize) -> String {
    format!("Magic eraser updated {changed} speckle(s).")
}
