//! SVG serializer.
//!
//! Emits a [`Scene`] as a standalone SVG document using the [`svg`] crate
//! for document construction and XML escaping. Each shape becomes one
//! element of its own kind, in paint order, carrying its cumulative
//! transform and resolved paint, so reading the output back yields the
//! same scene.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use despeck_engine::{Color, FillRule, Geometry, Point, Scene, Shape};
use svg::Document;
use svg::node::element::{Description, Element, Title};
use svg::node::{Node, Text};

use crate::transform::format_matrix;

/// Metadata to embed in the SVG document.
///
/// When present, a `<title>` and/or `<desc>` element is emitted
/// immediately after the opening `<svg>` tag.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,
    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,
}

/// Serialize a scene to SVG text.
#[must_use]
pub fn write_scene(scene: &Scene, metadata: &SvgMetadata<'_>) -> String {
    let mut doc = Document::new();
    if let Some(width) = scene.canvas.width {
        doc = doc.set("width", number(width));
    }
    if let Some(height) = scene.canvas.height {
        doc = doc.set("height", number(height));
    }
    if let Some(vb) = scene.canvas.view_box {
        doc = doc.set(
            "viewBox",
            format!(
                "{} {} {} {}",
                number(vb.x),
                number(vb.y),
                number(vb.width),
                number(vb.height)
            ),
        );
    }

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    for shape in scene.shapes() {
        doc = doc.add(element(shape));
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

/// The element for one shape.
fn element(shape: &Shape) -> Element {
    let mut el = match &shape.geometry {
        Geometry::Path { data } => {
            let mut el = Element::new("path");
            el.assign("d", data.as_str());
            el
        }
        Geometry::Rect {
            x,
            y,
            width,
            height,
        } => with_numbers(
            "rect",
            &[("x", *x), ("y", *y), ("width", *width), ("height", *height)],
        ),
        Geometry::Circle { cx, cy, r } => {
            with_numbers("circle", &[("cx", *cx), ("cy", *cy), ("r", *r)])
        }
        Geometry::Ellipse { cx, cy, rx, ry } => with_numbers(
            "ellipse",
            &[("cx", *cx), ("cy", *cy), ("rx", *rx), ("ry", *ry)],
        ),
        Geometry::Polygon { points } => {
            let mut el = Element::new("polygon");
            el.assign("points", point_list(points));
            el
        }
        Geometry::Polyline { points } => {
            let mut el = Element::new("polyline");
            el.assign("points", point_list(points));
            el
        }
        Geometry::Line { x1, y1, x2, y2 } => with_numbers(
            "line",
            &[("x1", *x1), ("y1", *y1), ("x2", *x2), ("y2", *y2)],
        ),
    };

    el.assign("fill", paint(shape.fill.as_ref()));
    if let Some(stroke) = &shape.stroke {
        el.assign("stroke", stroke.to_display_hex());
        el.assign("stroke-width", number(shape.stroke_width));
    }
    if shape.fill_rule == FillRule::EvenOdd {
        el.assign("fill-rule", "evenodd");
    }
    if !shape.transform.is_identity() {
        el.assign("transform", format_matrix(&shape.transform));
    }
    el
}

fn with_numbers(tag: &str, attributes: &[(&str, f64)]) -> Element {
    let mut el = Element::new(tag);
    for (name, value) in attributes {
        el.assign(*name, number(*value));
    }
    el
}

fn paint(color: Option<&Color>) -> String {
    color.map_or_else(|| "none".to_owned(), Color::to_display_hex)
}

fn point_list(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", number(p.x), number(p.y)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shortest round-tripping decimal form (`10` rather than `10.0`).
fn number(value: f64) -> String {
    format!("{value}")
}

/// Download name for an edited document: `name.svg` becomes
/// `name-updated.svg`.
#[must_use]
pub fn output_file_name(input: &str) -> String {
    let stem = input
        .len()
        .checked_sub(4)
        .filter(|&i| input.is_char_boundary(i) && input[i..].eq_ignore_ascii_case(".svg"))
        .map_or(input, |i| &input[..i]);
    format!("{stem}-updated.svg")
}
