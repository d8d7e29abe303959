//! SVG text to [`Scene`].
//!
//! Walks the event stream of the `svg` crate's parser, keeping a stack of
//! cumulative transforms and resolved styles. Every drawable element
//! becomes one shape in document order. Content of non-rendering
//! containers (definitions, clip paths, masks, gradients and the like) is
//! skipped.

use std::collections::HashMap;

use despeck_engine::{Canvas, Geometry, Point, Rect, Scene, Shape, Transform};
use log::debug;
use svg::node::Value;
use svg::node::element::tag::Type;
use svg::parser::{Event, Parser};

use crate::SvgError;
use crate::style::{Style, declarations, parse_length};
use crate::transform::parse_transform;

/// Elements whose subtree never renders directly.
const SKIPPED: &[&str] = &[
    "clipPath",
    "defs",
    "filter",
    "linearGradient",
    "marker",
    "mask",
    "metadata",
    "pattern",
    "radialGradient",
    "style",
    "symbol",
];

/// Inherited state at one level of the element tree.
#[derive(Debug, Clone)]
struct Frame {
    transform: Transform,
    style: Style,
    skip: bool,
}

/// Attributes of one element, with `style` declarations layered on top.
struct Attrs {
    attributes: HashMap<String, String>,
    style: Vec<(String, String)>,
}

impl Attrs {
    fn new(raw: &HashMap<String, Value>) -> Self {
        let attributes: HashMap<String, String> = raw
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        let style = attributes
            .get("style")
            .map(|s| declarations(s))
            .unwrap_or_default();
        Self { attributes, style }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// A presentation property: the `style` declaration, else the attribute.
    fn property(&self, name: &str) -> Option<String> {
        self.style
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .or_else(|| self.attr(name).map(str::to_owned))
    }

    fn number(&self, name: &str) -> f64 {
        self.attr(name).and_then(parse_length).unwrap_or(0.0)
    }
}

/// Parse an SVG document into a scene.
///
/// # Errors
///
/// Returns [`SvgError::Parse`] for malformed XML, [`SvgError::MissingRoot`]
/// when the first element is not `<svg>`, and [`SvgError::InvalidColor`] or
/// [`SvgError::InvalidTransform`] for malformed presentation attributes.
pub fn read_scene(text: &str) -> Result<Scene, SvgError> {
    let mut scene: Option<Scene> = None;
    let mut stack: Vec<Frame> = Vec::new();

    for event in Parser::new(text) {
        let (name, kind, raw) = match event {
            Event::Error(e) => return Err(SvgError::Parse(e.to_string())),
            Event::Tag(name, kind, raw) => (name, kind, raw),
            _ => continue,
        };
        if matches!(kind, Type::End) {
            stack.pop();
            continue;
        }

        let attrs = Attrs::new(&raw);
        let parent = match (stack.last(), scene.is_some()) {
            (Some(frame), _) => frame.clone(),
            (None, false) if name == "svg" => {
                scene = Some(Scene::new(canvas(&attrs)));
                Frame {
                    transform: Transform::IDENTITY,
                    style: Style::default(),
                    skip: false,
                }
            }
            (None, false) => return Err(SvgError::MissingRoot),
            // Content after the root element closed.
            (None, true) => continue,
        };

        let frame = if parent.skip || SKIPPED.contains(&name) {
            Frame {
                skip: true,
                ..parent
            }
        } else {
            let mut local = match attrs.attr("transform") {
                Some(t) => parse_transform(t)?,
                None => Transform::IDENTITY,
            };
            if name == "svg" && !stack.is_empty() {
                let offset = Transform::translate(attrs.number("x"), attrs.number("y"));
                local = offset.multiply(&local);
            }
            Frame {
                transform: parent.transform.multiply(&local),
                style: parent.style.cascade(|p| attrs.property(p))?,
                skip: false,
            }
        };

        if !frame.skip
            && let Some(geometry) = geometry(name, &attrs)
            && let Some(scene) = scene.as_mut()
        {
            let shape = Shape::new(geometry)
                .with_transform(frame.transform)
                .with_fill(frame.style.fill.clone())
                .with_stroke(frame.style.stroke.clone(), frame.style.stroke_width)
                .with_fill_rule(frame.style.fill_rule);
            let id = scene.add(shape);
            debug!("read <{name}> as {id}");
        }

        if matches!(kind, Type::Start) {
            stack.push(frame);
        }
    }

    scene.ok_or(SvgError::MissingRoot)
}

/// Canvas from the root element's `width`, `height` and `viewBox`.
fn canvas(attrs: &Attrs) -> Canvas {
    let view_box = attrs.attr("viewBox").and_then(|raw| {
        let values: Vec<f64> = raw
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        match values[..] {
            [x, y, w, h] if w > 0.0 && h > 0.0 => Some(Rect::new(x, y, w, h)),
            _ => None,
        }
    });
    let size = |name: &str| attrs.attr(name).and_then(parse_length).filter(|v| *v > 0.0);
    Canvas {
        width: size("width"),
        height: size("height"),
        view_box,
    }
}

/// Geometry of a drawable element, or `None` for anything else.
fn geometry(name: &str, attrs: &Attrs) -> Option<Geometry> {
    let n = |key: &str| attrs.number(key);
    let geometry = match name {
        "path" => Geometry::path(attrs.attr("d").unwrap_or_default()),
        "rect" => Geometry::Rect {
            x: n("x"),
            y: n("y"),
            width: n("width"),
            height: n("height"),
        },
        "circle" => Geometry::Circle {
            cx: n("cx"),
            cy: n("cy"),
            r: n("r"),
        },
        "ellipse" => Geometry::Ellipse {
            cx: n("cx"),
            cy: n("cy"),
            rx: n("rx"),
            ry: n("ry"),
        },
        "polygon" => Geometry::Polygon {
            points: points(attrs.attr("points").unwrap_or_default()),
        },
        "polyline" => Geometry::Polyline {
            points: points(attrs.attr("points").unwrap_or_default()),
        },
        "line" => Geometry::Line {
            x1: n("x1"),
            y1: n("y1"),
            x2: n("x2"),
            y2: n("y2"),
        },
        _ => return None,
    };
    Some(geometry)
}

/// Parse a `points` list. A trailing odd coordinate is dropped.
fn points(raw: &str) -> Vec<Point> {
    let values: Vec<f64> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map_while(|s| s.parse().ok())
        .collect();
    values
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use despeck_engine::{Color, FillRule, ShapeKind};

    use super::*;

    fn wrap(body: &str) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 200 100">{body}</svg>"#
        )
    }

    // --- canvas ---

    #[test]
    fn root_dimensions_populate_canvas() {
        let scene = read_scene(&wrap("")).unwrap();
        assert_eq!(scene.canvas.width, Some(100.0));
        assert_eq!(scene.canvas.height, Some(50.0));
        assert_eq!(scene.canvas.view_box, Some(Rect::new(0.0, 0.0, 200.0, 100.0)));
        assert!(scene.is_empty());
    }

    #[test]
    fn non_pixel_sizes_are_left_unset() {
        let scene =
            read_scene(r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" height="5cm"/>"#)
                .unwrap();
        assert_eq!(scene.canvas.width, None);
        assert_eq!(scene.canvas.height, None);
    }

    #[test]
    fn missing_root_is_rejected() {
        assert_eq!(read_scene("<g/>"), Err(SvgError::MissingRoot));
        assert_eq!(read_scene(""), Err(SvgError::MissingRoot));
    }

    // --- shapes ---

    #[test]
    fn every_drawable_kind_is_read_in_order() {
        let scene = read_scene(&wrap(
            r#"<path d="M0 0 H10 V10 Z"/>
               <rect x="1" y="2" width="3" height="4"/>
               <circle cx="5" cy="5" r="2"/>
               <ellipse cx="5" cy="5" rx="2" ry="1"/>
               <polygon points="0,0 10,0 10,10"/>
               <polyline points="0 0 5 5 10"/>
               <line x1="0" y1="0" x2="5" y2="5"/>
               <text x="0" y="0">label</text>"#,
        ))
        .unwrap();
        let kinds: Vec<ShapeKind> = scene.shapes().iter().map(Shape::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ShapeKind::Path,
                ShapeKind::Rect,
                ShapeKind::Circle,
                ShapeKind::Ellipse,
                ShapeKind::Polygon,
                ShapeKind::Polyline,
                ShapeKind::Line,
            ]
        );
        assert_eq!(
            scene.shapes()[1].geometry,
            Geometry::rect(Rect::new(1.0, 2.0, 3.0, 4.0))
        );
        assert_eq!(
            scene.shapes()[5].geometry,
            Geometry::Polyline {
                points: vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)]
            }
        );
    }

    #[test]
    fn groups_compose_transforms_and_inherit_paint() {
        let scene = read_scene(&wrap(
            r#"<g transform="translate(10 0)" fill="red" stroke="blue" stroke-width="2">
                 <g transform="scale(2)" style="fill-rule: evenodd">
                   <rect width="1" height="1" style="stroke: none"/>
                 </g>
               </g>
               <rect width="1" height="1"/>"#,
        ))
        .unwrap();
        let inner = &scene.shapes()[0];
        assert_eq!(inner.fill, Some(Color::Rgb(255, 0, 0)));
        assert_eq!(inner.stroke, None);
        assert_eq!(inner.fill_rule, FillRule::EvenOdd);
        let p = inner.transform.apply(Point::new(1.0, 1.0));
        assert!((p.x - 12.0).abs() < 1e-9 && (p.y - 2.0).abs() < 1e-9);

        let outer = &scene.shapes()[1];
        assert_eq!(outer.fill, Some(Color::Rgb(0, 0, 0)));
        assert!(outer.transform.is_identity());
    }

    #[test]
    fn non_rendering_content_is_skipped() {
        let scene = read_scene(&wrap(
            r##"<defs><rect id="r" width="5" height="5"/><linearGradient id="g"><stop/></linearGradient></defs>
               <clipPath id="c"><circle r="4"/></clipPath>
               <rect width="5" height="5" fill="url(#g) #ffffff"/>"##,
        ))
        .unwrap();
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.shapes()[0].fill, Some(Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn nested_svg_offsets_content() {
        let scene = read_scene(&wrap(
            r#"<svg x="5" y="6"><rect width="1" height="1"/></svg>"#,
        ))
        .unwrap();
        let p = scene.shapes()[0].transform.apply(Point::new(0.0, 0.0));
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 6.0).abs() < 1e-9);
    }

    // --- errors ---

    #[test]
    fn invalid_paint_and_transform_are_rejected() {
        assert!(matches!(
            read_scene(&wrap(r##"<rect fill="#ab" width="1" height="1"/>"##)),
            Err(SvgError::InvalidColor { .. })
        ));
        assert!(matches!(
            read_scene(&wrap(r#"<rect transform="spin(3)" width="1" height="1"/>"#)),
            Err(SvgError::InvalidTransform(_))
        ));
    }
}
