//! Scene data model: shapes, their geometry payloads and the ordered,
//! mutable scene that owns them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::types::{Point, Rect, Transform};

/// Stable identity of a shape within a scene lineage.
///
/// Identifiers are handed out by [`Scene::add`] and never reused, so an
/// id captured before a mutation either still names the same shape or
/// names nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(pub u64);

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Geometry kind, used for capability checks and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Path,
    Rect,
    Circle,
    Ellipse,
    Polygon,
    Polyline,
    Line,
}

impl ShapeKind {
    /// SVG element name for this kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Ellipse => "ellipse",
            Self::Polygon => "polygon",
            Self::Polyline => "polyline",
            Self::Line => "line",
        }
    }
}

/// Raw geometry parameters, in the shape's local coordinate space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// SVG path data (`d` attribute).
    Path { data: String },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Circle { cx: f64, cy: f64, r: f64 },
    Ellipse { cx: f64, cy: f64, rx: f64, ry: f64 },
    Polygon { points: Vec<Point> },
    Polyline { points: Vec<Point> },
    Line { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Geometry {
    /// Convenience constructor for path geometry.
    #[must_use]
    pub fn path(data: impl Into<String>) -> Self {
        Self::Path { data: data.into() }
    }

    /// Convenience constructor for a rectangle.
    #[must_use]
    pub const fn rect(rect: Rect) -> Self {
        Self::Rect {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
        }
    }

    /// The geometry kind.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Path { .. } => ShapeKind::Path,
            Self::Rect { .. } => ShapeKind::Rect,
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Ellipse { .. } => ShapeKind::Ellipse,
            Self::Polygon { .. } => ShapeKind::Polygon,
            Self::Polyline { .. } => ShapeKind::Polyline,
            Self::Line { .. } => ShapeKind::Line,
        }
    }
}

/// SVG `fill-rule`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// One drawable primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    id: ShapeId,
    /// Geometry payload in local coordinates.
    pub geometry: Geometry,
    /// Cumulative local-to-global transform.
    pub transform: Transform,
    /// Normalized fill; `None` means no fill.
    pub fill: Option<Color>,
    /// Normalized stroke; `None` means no stroke.
    pub stroke: Option<Color>,
    /// Stroke width in local units.
    pub stroke_width: f64,
    pub fill_rule: FillRule,
}

impl Shape {
    /// A shape with the given geometry, identity transform, no fill and no
    /// stroke. The id is assigned when the shape is added to a [`Scene`].
    #[must_use]
    pub const fn new(geometry: Geometry) -> Self {
        Self {
            id: ShapeId(0),
            geometry,
            transform: Transform::IDENTITY,
            fill: None,
            stroke: None,
            stroke_width: 1.0,
            fill_rule: FillRule::NonZero,
        }
    }

    /// Builder: set the fill.
    #[must_use]
    pub fn with_fill(mut self, fill: Option<Color>) -> Self {
        self.fill = fill;
        self
    }

    /// Builder: set the stroke color and width.
    #[must_use]
    pub fn with_stroke(mut self, stroke: Option<Color>, width: f64) -> Self {
        self.stroke = stroke;
        self.stroke_width = width;
        self
    }

    /// Builder: set the transform.
    #[must_use]
    pub const fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Builder: set the fill rule.
    #[must_use]
    pub const fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    /// The shape's identity within its scene.
    #[must_use]
    pub const fn id(&self) -> ShapeId {
        self.id
    }

    /// The geometry kind.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    /// Whether another outline can be absorbed by appending its path data
    /// to this shape's path data.
    #[must_use]
    pub const fn supports_path_concat(&self) -> bool {
        matches!(self.geometry, Geometry::Path { .. })
    }

    /// The raw path data, for path shapes.
    #[must_use]
    pub fn path_data(&self) -> Option<&str> {
        match &self.geometry {
            Geometry::Path { data } => Some(data),
            _ => None,
        }
    }
}

/// Declared canvas of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Canvas {
    /// Explicit width in user units.
    pub width: Option<f64>,
    /// Explicit height in user units.
    pub height: Option<f64>,
    /// Declared view region (`viewBox`).
    pub view_box: Option<Rect>,
}

/// An ordered collection of shapes plus the canvas they are drawn on.
///
/// Shape order is paint order: later shapes are drawn on top.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    /// The declared canvas.
    pub canvas: Canvas,
    shapes: Vec<Shape>,
    next_id: u64,
}

impl Scene {
    /// An empty scene on the given canvas.
    #[must_use]
    pub const fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            shapes: Vec::new(),
            next_id: 1,
        }
    }

    fn assign_id(&mut self, mut shape: Shape) -> Shape {
        // `Default` starts at 0; ids are 1-based either way.
        self.next_id = self.next_id.max(1);
        shape.id = ShapeId(self.next_id);
        self.next_id += 1;
        shape
    }

    /// Append a shape on top of everything else and return its new id.
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        let shape = self.assign_id(shape);
        let id = shape.id;
        self.shapes.push(shape);
        id
    }

    /// Insert a shape behind everything else and return its new id.
    pub fn insert_front(&mut self, shape: Shape) -> ShapeId {
        let shape = self.assign_id(shape);
        let id = shape.id;
        self.shapes.insert(0, shape);
        id
    }

    /// Shapes in paint order.
    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Number of shapes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Returns `true` if the scene has no shapes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Paint-order position of a shape.
    #[must_use]
    pub fn position(&self, id: ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| s.id == id)
    }

    /// Whether the shape is still attached to the scene.
    #[must_use]
    pub fn contains(&self, id: ShapeId) -> bool {
        self.position(id).is_some()
    }

    /// Look up a shape.
    #[must_use]
    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Look up a shape for mutation.
    pub fn get_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.iter_mut().find(|s| s.id == id)
    }

    /// Detach a shape.
    pub fn remove(&mut self, id: ShapeId) -> Option<Shape> {
        let index = self.position(id)?;
        Some(self.shapes.remove(index))
    }

    /// Detach every listed shape. Returns how many were attached.
    pub fn remove_all(&mut self, ids: &[ShapeId]) -> usize {
        let before = self.shapes.len();
        self.shapes.retain(|s| !ids.contains(&s.id));
        before - self.shapes.len()
    }

    /// Distinct fill colors in paint order of first appearance.
    #[must_use]
    pub fn palette(&self) -> Vec<Color> {
        let mut colors: Vec<Color> = Vec::new();
        for fill in self.shapes.iter().filter_map(|s| s.fill.as_ref()) {
            if !colors.contains(fill) {
                colors.push(fill.clone());
            }
        }
        colors
    }
}
