//! Geometric primitives for diagram placement and hit testing.
//!
//! This module provides the small set of geometric types Railmap needs to
//! position stations, build line paths and decide what the pointer is over.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in canvas space
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! Railmap uses a coordinate system consistent with SVG:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! A label that "grows up" therefore moves towards negative Y.

/// A 2D point representing a position in canvas coordinate space.
///
/// # Examples
///
/// ```
/// # use railmap_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the Euclidean distance to another point
    pub fn distance_to(self, other: Point) -> f32 {
        other.sub_point(self).hypot()
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Calculates the shortest distance from this point to the segment `a`–`b`.
    ///
    /// A degenerate segment (`a == b`) is treated as a single point.
    ///
    /// # Examples
    ///
    /// ```
    /// # use railmap_core::geometry::Point;
    /// let p = Point::new(5.0, 3.0);
    /// let d = p.distance_to_segment(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
    /// assert_eq!(d, 3.0);
    /// ```
    pub fn distance_to_segment(self, a: Point, b: Point) -> f32 {
        let ab = b.sub_point(a);
        let length_sq = ab.x * ab.x + ab.y * ab.y;
        if length_sq == 0.0 {
            return self.distance_to(a);
        }

        let ap = self.sub_point(a);
        let t = ((ap.x * ab.x + ap.y * ab.y) / length_sq).clamp(0.0, 1.0);
        let projection = a.add_point(ab.scale(t));
        self.distance_to(projection)
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Rounds both coordinates to the nearest multiple of `step`.
    ///
    /// Non-positive or non-finite steps leave the point unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use railmap_core::geometry::Point;
    /// let snapped = Point::new(12.0, 28.0).snap_to_grid(5.0);
    /// assert_eq!(snapped, Point::new(10.0, 30.0));
    /// ```
    pub fn snap_to_grid(self, step: f32) -> Self {
        if !step.is_finite() || step <= 0.0 {
            return self;
        }
        Self {
            x: (self.x / step).round() * step,
            y: (self.y / step).round() * step,
        }
    }

    /// Returns true if both coordinates are finite numbers
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates the smallest bounds containing every given point.
    ///
    /// Returns `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            let point_bounds = Self {
                min_x: p.x,
                min_y: p.y,
                max_x: p.x,
                max_y: p.y,
            };
            Some(match acc {
                Some(bounds) => bounds.merge(&point_bounds),
                None => point_bounds,
            })
        })
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Merges two bounds to create a larger bounds that contains both.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grows the bounds by `amount` on every side.
    pub fn expand(&self, amount: f32) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    /// Returns true if the point lies inside or on the edge of the bounds
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    /// Distance to a segment never exceeds the distance to either endpoint.
    fn check_segment_distance_bounded(p: Point, a: Point, b: Point) -> Result<(), TestCaseError> {
        let d = p.distance_to_segment(a, b);
        let tolerance = 1e-2;

        prop_assert!(d <= p.distance_to(a) + tolerance);
        prop_assert!(d <= p.distance_to(b) + tolerance);
        prop_assert!(d >= 0.0);
        Ok(())
    }

    /// Snapping moves a point by at most half a grid step per axis.
    fn check_snap_is_close(p: Point, step: f32) -> Result<(), TestCaseError> {
        let snapped = p.snap_to_grid(step);

        prop_assert!((snapped.x() - p.x()).abs() <= step / 2.0 + 1e-3);
        prop_assert!((snapped.y() - p.y()).abs() <= step / 2.0 + 1e-3);
        prop_assert!(approx_eq!(
            f32,
            snapped.snap_to_grid(step).x(),
            snapped.x(),
            epsilon = 1e-3
        ));
        Ok(())
    }

    proptest! {
        #[test]
        fn segment_distance_bounded(
            p in point_strategy(),
            a in point_strategy(),
            b in point_strategy(),
        ) {
            check_segment_distance_bounded(p, a, b)?;
        }

        #[test]
        fn snap_is_close(p in point_strategy(), step in 1.0f32..50.0) {
            check_snap_is_close(p, step)?;
        }
    }
}
