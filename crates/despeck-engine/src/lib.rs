//! despeck-engine: speckle removal for vector artwork (sans-IO).
//!
//! Finds small stray shapes in a [`Scene`] and recolors, absorbs or removes
//! them under a brush, merges overlapping same-color shapes through a
//! boolean union, and collapses an edge-touching background into one flat
//! region. Every destructive operation is undoable through the
//! [`Editor`].
//!
//! This crate has **no I/O dependencies** -- it operates on an in-memory
//! scene model. Reading and writing SVG documents lives in `despeck-svg`.
//!
//! All geometric queries go through the [`GeometryKernel`] trait. The
//! default [`GeoKernel`] flattens outlines to polygons and answers them with
//! the `geo` crate.

pub mod background;
pub mod brush;
pub mod cleanup;
pub mod color;
pub mod containment;
pub mod diagnostics;
pub mod editor;
pub mod geometry;
pub mod history;
pub mod index;
pub mod kernel;
pub mod outline;
pub mod shape;
pub mod speckle;
pub mod types;
pub mod union;

pub use background::{BackgroundMode, BackgroundOptions, BackgroundPolicy, BackgroundReport};
pub use brush::{Brush, HitMode};
pub use cleanup::{Artifact, CleanupOptions, CleanupReport};
pub use color::Color;
pub use diagnostics::{Clock, OperationDiagnostics, SessionDiagnostics};
pub use editor::{Editor, Operation, Outcome};
pub use history::{History, Snapshot};
pub use index::ShapeItem;
pub use kernel::{GeoKernel, GeometryKernel};
pub use shape::{Canvas, FillRule, Geometry, Scene, Shape, ShapeId, ShapeKind};
pub use speckle::{SourceFilter, SpeckleAction, SpeckleOptions, SpeckleReport};
pub use types::{ColorError, EngineError, GeometryError, Point, Rect, Transform};
pub use union::{UnionOptions, UnionReport};
