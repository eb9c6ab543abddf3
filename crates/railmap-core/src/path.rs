//! Line path generation.
//!
//! Turns two endpoint coordinates, a [`PathShape`] and the shape's attribute
//! dictionary into an SVG path string. Every function here is pure and
//! deterministic; malformed attributes are clamped to the nearest valid value
//! and never rejected.
//!
//! # Example
//!
//! ```
//! # use railmap_core::attrs::Attrs;
//! # use railmap_core::geometry::Point;
//! # use railmap_core::path::{generate_path, PathShape};
//! let d = generate_path(
//!     Point::new(0.0, 0.0),
//!     Point::new(100.0, 50.0),
//!     PathShape::Perpendicular,
//!     &Attrs::new(),
//! );
//! assert_eq!(d, "M 0 0 L 100 0 L 100 50");
//! ```

use std::{fmt, str::FromStr};

use log::{debug, warn};

use crate::{attrs::Attrs, geometry::Point};

/// Default length of the 45° segment of a diagonal path.
pub const DEFAULT_TRANSITION: f64 = 10.0;

/// Default position of the perpendicular elbow along the first axis.
pub const DEFAULT_BEND_RATIO: f64 = 1.0;

/// The geometric family a line path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathShape {
    /// A single straight segment.
    Simple,
    /// Axis-aligned runs joined by a 45° transition.
    Diagonal,
    /// Horizontal first, then vertical.
    Perpendicular,
    /// Vertical first, then horizontal.
    RotatePerpendicular,
}

impl PathShape {
    pub const ALL: [PathShape; 4] = [
        Self::Simple,
        Self::Diagonal,
        Self::Perpendicular,
        Self::RotatePerpendicular,
    ];

    /// Returns the tag this shape is registered and serialized under.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Diagonal => "diagonal",
            Self::Perpendicular => "perpendicular",
            Self::RotatePerpendicular => "rotate-perpendicular",
        }
    }
}

impl fmt::Display for PathShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PathShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.tag() == s)
            .ok_or_else(|| {
                format!(
                    "invalid path shape `{s}`, valid values: simple, diagonal, perpendicular, rotate-perpendicular"
                )
            })
    }
}

/// Which axis a diagonal path runs along before its 45° transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FirstAxis {
    #[default]
    Horizontal,
    Vertical,
}

impl FirstAxis {
    fn from_attrs(attrs: &Attrs) -> Self {
        match attrs.text("firstAxis") {
            None | Some("horizontal") => Self::Horizontal,
            Some("vertical") => Self::Vertical,
            Some(other) => {
                warn!(first_axis = other; "Unknown diagonal axis, using horizontal");
                Self::Horizontal
            }
        }
    }
}

/// Computes the SVG path data connecting `from` and `to`.
///
/// The result always starts with `M x1 y1` and ends at `x2 y2`.
pub fn generate_path(from: Point, to: Point, shape: PathShape, attrs: &Attrs) -> String {
    path_data(&path_points(from, to, shape, attrs))
}

/// Computes the polyline a path of the given shape follows.
///
/// Consecutive duplicate points are removed, but the result always holds at
/// least the two endpoints.
pub fn path_points(from: Point, to: Point, shape: PathShape, attrs: &Attrs) -> Vec<Point> {
    let raw = match shape {
        PathShape::Simple => vec![from, to],
        PathShape::Diagonal => diagonal_points(from, to, attrs),
        PathShape::Perpendicular => {
            let r = bend_ratio(attrs);
            let bend_x = lerp(from.x(), to.x(), r);
            vec![from, from.with_x(bend_x), to.with_x(bend_x), to]
        }
        PathShape::RotatePerpendicular => {
            let r = bend_ratio(attrs);
            let bend_y = lerp(from.y(), to.y(), r);
            vec![from, from.with_y(bend_y), to.with_y(bend_y), to]
        }
    };
    dedup_points(raw)
}

fn diagonal_points(from: Point, to: Point, attrs: &Attrs) -> Vec<Point> {
    let dx = to.x() - from.x();
    let dy = to.y() - from.y();
    if dx == 0.0 || dy == 0.0 {
        return vec![from, to];
    }

    let s = transition(attrs, dx.abs().min(dy.abs()));
    let sx = dx.signum();
    let sy = dy.signum();

    match FirstAxis::from_attrs(attrs) {
        FirstAxis::Horizontal => vec![
            from,
            Point::new(within(to.x() - sx * s, from.x(), to.x()), from.y()),
            Point::new(to.x(), within(from.y() + sy * s, from.y(), to.y())),
            to,
        ],
        FirstAxis::Vertical => vec![
            from,
            Point::new(from.x(), within(to.y() - sy * s, from.y(), to.y())),
            Point::new(within(from.x() + sx * s, from.x(), to.x()), to.y()),
            to,
        ],
    }
}

/// Reads the diagonal transition length, clamped to `[0, max]`.
fn transition(attrs: &Attrs, max: f32) -> f32 {
    let requested = match attrs.number("transition") {
        Some(value) if value.is_finite() => value,
        Some(value) => {
            warn!(transition = value; "Non-finite transition, using default");
            DEFAULT_TRANSITION
        }
        None if attrs.contains_key("transition") => {
            warn!("Non-numeric transition, using default");
            DEFAULT_TRANSITION
        }
        None => DEFAULT_TRANSITION,
    } as f32;

    let clamped = requested.clamp(0.0, max);
    if clamped != requested {
        debug!(requested, clamped; "Clamped diagonal transition");
    }
    clamped
}

/// Reads the perpendicular bend ratio, clamped to `[0, 1]`.
fn bend_ratio(attrs: &Attrs) -> f32 {
    let requested = match attrs.number("bendRatio") {
        Some(value) if value.is_finite() => value,
        Some(_) => {
            warn!("Non-finite bend ratio, using default");
            DEFAULT_BEND_RATIO
        }
        None => DEFAULT_BEND_RATIO,
    } as f32;

    let clamped = requested.clamp(0.0, 1.0);
    if clamped != requested {
        debug!(requested, clamped; "Clamped bend ratio");
    }
    clamped
}

/// Keeps `value` inside the span of `a` and `b` despite rounding.
fn within(value: f32, a: f32, b: f32) -> f32 {
    value.clamp(a.min(b), a.max(b))
}

/// Interpolates between `a` and `b`, landing exactly on each at `t = 0` and `t = 1`.
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (1.0 - t) * a + t * b
}

fn dedup_points(raw: Vec<Point>) -> Vec<Point> {
    let end = raw.last().copied().unwrap_or_default();
    let mut points: Vec<Point> = Vec::with_capacity(raw.len());
    for point in raw {
        if points.last() != Some(&point) {
            points.push(point);
        }
    }
    if points.len() < 2 {
        points.push(end);
    }
    points
}

/// Formats a polyline as absolute `M`/`L` path data.
pub fn path_data(points: &[Point]) -> String {
    let mut data = String::new();
    for (idx, point) in points.iter().enumerate() {
        let command = if idx == 0 { "M" } else { " L" };
        data.push_str(&format!("{command} {} {}", point.x(), point.y()));
    }
    data
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn coord() -> impl Strategy<Value = f32> {
        prop_oneof![(-500i32..500).prop_map(|v| v as f32), -500.0f32..500.0]
    }

    fn shape_strategy() -> impl Strategy<Value = PathShape> {
        prop::sample::select(PathShape::ALL.to_vec())
    }

    fn attrs_strategy() -> impl Strategy<Value = Attrs> {
        (
            prop::option::of(-100.0f64..600.0),
            prop::option::of(-1.0f64..2.0),
            any::<bool>(),
        )
            .prop_map(|(transition, bend, vertical)| {
                let mut attrs = Attrs::new();
                if let Some(t) = transition {
                    attrs.set("transition", t);
                }
                if let Some(r) = bend {
                    attrs.set("bendRatio", r);
                }
                if vertical {
                    attrs.set("firstAxis", "vertical");
                }
                attrs
            })
    }

    /// Paths start at the source and end at the target.
    fn check_endpoints(
        from: Point,
        to: Point,
        shape: PathShape,
        attrs: &Attrs,
    ) -> Result<(), TestCaseError> {
        let points = path_points(from, to, shape, attrs);
        prop_assert!(points.len() >= 2);
        prop_assert_eq!(points[0], from);
        prop_assert_eq!(*points.last().unwrap(), to);

        let data = generate_path(from, to, shape, attrs);
        let head = format!("M {} {}", from.x(), from.y());
        let tail = format!("{} {}", to.x(), to.y());
        prop_assert!(data.starts_with(&head), "{} does not start with {}", data, head);
        prop_assert!(data.ends_with(&tail), "{} does not end with {}", data, tail);
        Ok(())
    }

    /// Diagonal paths never overshoot the endpoints on either axis.
    fn check_diagonal_monotonic(from: Point, to: Point, attrs: &Attrs) -> Result<(), TestCaseError> {
        let points = path_points(from, to, PathShape::Diagonal, attrs);
        for pair in points.windows(2) {
            let step_x = pair[1].x() - pair[0].x();
            let step_y = pair[1].y() - pair[0].y();
            prop_assert!(step_x * (to.x() - from.x()) >= 0.0);
            prop_assert!(step_y * (to.y() - from.y()) >= 0.0);
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn path_endpoints(
            x1 in coord(), y1 in coord(), x2 in coord(), y2 in coord(),
            shape in shape_strategy(),
            attrs in attrs_strategy(),
        ) {
            check_endpoints(Point::new(x1, y1), Point::new(x2, y2), shape, &attrs)?;
        }

        #[test]
        fn diagonal_is_monotonic(
            x1 in coord(), y1 in coord(), x2 in coord(), y2 in coord(),
            attrs in attrs_strategy(),
        ) {
            check_diagonal_monotonic(Point::new(x1, y1), Point::new(x2, y2), &attrs)?;
        }

        #[test]
        fn collinear_diagonal_equals_simple(
            a in coord(), b in coord(), fixed in coord(), horizontal in any::<bool>(),
            attrs in attrs_strategy(),
        ) {
            let (from, to) = if horizontal {
                (Point::new(a, fixed), Point::new(b, fixed))
            } else {
                (Point::new(fixed, a), Point::new(fixed, b))
            };
            prop_assert_eq!(
                generate_path(from, to, PathShape::Diagonal, &attrs),
                generate_path(from, to, PathShape::Simple, &attrs)
            );
        }

        #[test]
        fn diagonal_transition_is_45_degrees(
            x1 in coord(), y1 in coord(), x2 in coord(), y2 in coord(),
            attrs in attrs_strategy(),
        ) {
            let points = path_points(Point::new(x1, y1), Point::new(x2, y2), PathShape::Diagonal, &attrs);
            for pair in points.windows(2) {
                let dx = (pair[1].x() - pair[0].x()).abs();
                let dy = (pair[1].y() - pair[0].y()).abs();
                prop_assert!(
                    dx == 0.0 || dy == 0.0 || approx_eq!(f32, dx, dy, epsilon = 1e-3),
                    "segment is neither axis-aligned nor 45°"
                );
            }
        }

        #[test]
        fn full_bend_lands_on_the_elbow(
            x1 in coord(), y1 in coord(), x2 in coord(), y2 in coord(),
        ) {
            let from = Point::new(x1, y1);
            let to = Point::new(x2, y2);
            let absent = Attrs::new();
            let full = Attrs::new().with("bendRatio", 1.0);

            for attrs in [&absent, &full] {
                let points = path_points(from, to, PathShape::Perpendicular, attrs);
                prop_assert!(points.len() <= 3);
                prop_assert!(points.iter().all(|pt| *pt == from || *pt == to || *pt == Point::new(x2, y1)));

                let points = path_points(from, to, PathShape::RotatePerpendicular, attrs);
                prop_assert!(points.len() <= 3);
                prop_assert!(points.iter().all(|pt| *pt == from || *pt == to || *pt == Point::new(x1, y2)));
            }
        }
    }
}
