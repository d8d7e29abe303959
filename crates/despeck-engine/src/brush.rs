//! Brush hit-testing.
//!
//! A cheap circle-vs-bbox test rejects most shapes. Survivors are tested
//! with a bounded set of sample points: the brush center, concentric rings
//! inside the disc, and the shape's own bbox corners and center that fall
//! inside the disc. A shape is hit when any sample lands in its fill or on
//! its stroke.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::geometry::to_local;
use crate::index::ShapeItem;
use crate::kernel::GeometryKernel;
use crate::shape::Shape;
use crate::types::{Point, Rect};

/// Upper bound on the number of concentric sample rings.
pub const MAX_RINGS: usize = 6;

/// Minimum samples per ring.
pub const MIN_RING_POINTS: usize = 16;

/// Maximum samples per ring.
pub const MAX_RING_POINTS: usize = 96;

/// Approximate spacing between samples, in global units.
const SAMPLE_SPACING: f64 = 2.0;

/// How a brush decides that it touches a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitMode {
    /// Circle-vs-bbox intersection only.
    Bounds,
    /// Bbox pre-filter followed by sampled outline hit-testing.
    #[default]
    Precise,
}

/// A circular brush in global coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub center: Point,
    pub radius: f64,
}

impl Brush {
    #[must_use]
    pub const fn new(center: Point, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Circle-vs-box test using the nearest point of the box.
    #[must_use]
    pub fn intersects(&self, bbox: &Rect) -> bool {
        let nearest = Point::new(
            self.center.x.clamp(bbox.x, bbox.right()),
            self.center.y.clamp(bbox.y, bbox.bottom()),
        );
        nearest.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Whether the point lies inside the brush disc (inclusive).
    #[must_use]
    pub fn covers(&self, p: Point) -> bool {
        p.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Global sample points inside the disc, center first.
    #[must_use]
    pub fn samples(&self) -> Vec<Point> {
        let mut points = vec![self.center];
        if self.radius <= 0.0 {
            return points;
        }
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let rings = ((self.radius / SAMPLE_SPACING).ceil() as usize).clamp(1, MAX_RINGS);
        for ring in 1..=rings {
            #[allow(clippy::cast_precision_loss)]
            let r = self.radius * ring as f64 / rings as f64;
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss
            )]
            let count = ((TAU * r / SAMPLE_SPACING).ceil() as usize)
                .clamp(MIN_RING_POINTS, MAX_RING_POINTS);
            for i in 0..count {
                #[allow(clippy::cast_precision_loss)]
                let (s, c) = (TAU * i as f64 / count as f64).sin_cos();
                points.push(Point::new(
                    r.mul_add(c, self.center.x),
                    r.mul_add(s, self.center.y),
                ));
            }
        }
        points
    }

    /// Full hit test for one indexed shape.
    #[must_use]
    pub fn hits(
        &self,
        kernel: &dyn GeometryKernel,
        shape: &Shape,
        item: &ShapeItem,
        mode: HitMode,
    ) -> bool {
        if !self.intersects(&item.bbox) {
            return false;
        }
        match mode {
            HitMode::Bounds => true,
            HitMode::Precise => self.sampled_hit(kernel, shape, item),
        }
    }

    fn sampled_hit(&self, kernel: &dyn GeometryKernel, shape: &Shape, item: &ShapeItem) -> bool {
        let extra = item
            .bbox
            .corners()
            .into_iter()
            .chain(std::iter::once(item.centroid))
            .filter(|p| self.covers(*p));
        let mut precise = false;
        for global in self.samples().into_iter().chain(extra) {
            let local = to_local(kernel, shape, global);
            let fill = kernel.point_in_fill(shape, local);
            let stroke = kernel.point_in_stroke(shape, local);
            precise |= fill.is_some() || stroke.is_some();
            if fill == Some(true) || stroke == Some(true) {
                return true;
            }
        }
        // No outline support: the bbox test already passed.
        !precise
    }
}
