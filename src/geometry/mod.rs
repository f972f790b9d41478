//! Geometric primitives for annotation placement.
//!
//! All rectangles use a top-left origin: `y` grows downward, so `top()` is
//! the smaller and `bottom()` the larger y-coordinate. PDF user space has a
//! bottom-left origin; [`Rect::flip_y`] converts at the input boundary.

use serde::{Deserialize, Serialize};

/// A 2D point in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::geometry::Point;
    ///
    /// let point = Point::new(10.0, 20.0);
    /// assert_eq!(point.x, 10.0);
    /// assert_eq!(point.y, 20.0);
    /// ```
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    /// Width of rectangle
    pub width: f32,
    /// Height of rectangle
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle from position and dimensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from two corner points.
    ///
    /// The corners may come in any order; the result is normalized.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::geometry::Rect;
    ///
    /// let rect = Rect::from_points(110.0, 70.0, 10.0, 20.0);
    /// assert_eq!(rect.x, 10.0);
    /// assert_eq!(rect.y, 20.0);
    /// assert_eq!(rect.width, 100.0);
    /// assert_eq!(rect.height, 50.0);
    /// ```
    pub fn from_points(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x: x0.min(x1),
            y: y0.min(y1),
            width: (x1 - x0).abs(),
            height: (y1 - y0).abs(),
        }
    }

    /// Bounding box of a PDF `QuadPoints` array (8 numbers per quad).
    ///
    /// Returns `None` when fewer than one full point is present.
    pub fn from_quad_points(points: &[f32]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let xs = points.iter().step_by(2);
        let ys = points.iter().skip(1).step_by(2);
        let (x0, x1) = xs.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        let (y0, y1) = ys.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        Some(Self::from_points(x0, y0, x1, y1))
    }

    /// Same rectangle with non-negative width and height.
    pub fn normalized(&self) -> Self {
        Self::from_points(self.left(), self.top(), self.right(), self.bottom())
    }

    /// Get the left edge x-coordinate.
    pub fn left(&self) -> f32 {
        self.x
    }

    /// Get the right edge x-coordinate.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Get the top edge y-coordinate.
    pub fn top(&self) -> f32 {
        self.y
    }

    /// Get the bottom edge y-coordinate.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Get the center point of the rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::geometry::Rect;
    ///
    /// let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
    /// let center = rect.center();
    /// assert_eq!(center.x, 50.0);
    /// assert_eq!(center.y, 25.0);
    /// ```
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Check if this rectangle overlaps another with non-zero area.
    ///
    /// Rectangles that only touch along an edge do not intersect.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::geometry::Rect;
    ///
    /// let r1 = Rect::new(0.0, 0.0, 100.0, 100.0);
    /// let r2 = Rect::new(50.0, 50.0, 100.0, 100.0);
    /// let r3 = Rect::new(100.0, 0.0, 100.0, 100.0);
    ///
    /// assert!(r1.intersects(&r2));
    /// assert!(!r1.intersects(&r3));
    /// ```
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// Check if this rectangle overlaps or touches another.
    pub fn touches(&self, other: &Rect) -> bool {
        self.left() <= other.right()
            && self.right() >= other.left()
            && self.top() <= other.bottom()
            && self.bottom() >= other.top()
    }

    /// The overlapping region, if it has non-zero area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::from_points(
            self.left().max(other.left()),
            self.top().max(other.top()),
            self.right().min(other.right()),
            self.bottom().min(other.bottom()),
        ))
    }

    /// Area of the overlapping region (0.0 when disjoint or touching).
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::geometry::Rect;
    ///
    /// let r1 = Rect::new(0.0, 0.0, 10.0, 10.0);
    /// let r2 = Rect::new(5.0, 5.0, 10.0, 10.0);
    /// assert_eq!(r1.overlap_area(&r2), 25.0);
    /// ```
    pub fn overlap_area(&self, other: &Rect) -> f32 {
        self.intersection(other).map_or(0.0, |r| r.area())
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expand(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Clip to `bounds`.
    ///
    /// Returns `None` when the rectangle lies completely outside. A box that
    /// merely touches the bounds (or has zero area inside them) survives as a
    /// degenerate rectangle.
    pub fn clip_to(&self, bounds: &Rect) -> Option<Rect> {
        let r = self.normalized();
        if !r.touches(bounds) {
            return None;
        }
        Some(Rect::from_points(
            r.left().max(bounds.left()),
            r.top().max(bounds.top()),
            r.right().min(bounds.right()),
            r.bottom().min(bounds.bottom()),
        ))
    }

    /// Mirror vertically inside a page of the given height.
    ///
    /// Converts between bottom-left (PDF user space) and top-left origins;
    /// applying it twice yields the original rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_remarks::geometry::Rect;
    ///
    /// // PDF box from y=700 to y=712 on an 842pt page
    /// let pdf = Rect::from_points(72.0, 700.0, 200.0, 712.0);
    /// let top_left = pdf.flip_y(842.0);
    /// assert_eq!(top_left.top(), 130.0);
    /// assert_eq!(top_left.bottom(), 142.0);
    /// ```
    pub fn flip_y(&self, page_height: f32) -> Rect {
        Rect::new(self.x, page_height - self.bottom(), self.width, self.height)
    }

    /// Check if this rectangle contains a point.
    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.left() && p.x <= self.right() && p.y >= self.top() && p.y <= self.bottom()
    }

    /// Check if `other` lies entirely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Compute the union of this rectangle with another.
    ///
    /// Returns the smallest rectangle that contains both rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        let x0 = self.left().min(other.left());
        let y0 = self.top().min(other.top());
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Rect::from_points(x0, y0, x1, y1)
    }

    /// Compute the area of the rectangle.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Compute the Euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use pdf_remarks::geometry::{Point, euclidean_distance};
///
/// let p1 = Point::new(0.0, 0.0);
/// let p2 = Point::new(3.0, 4.0);
///
/// assert_eq!(euclidean_distance(&p1, &p2), 5.0);
/// ```
pub fn euclidean_distance(p1: &Point, p2: &Point) -> f32 {
    ((p2.x - p1.x).powi(2) + (p2.y - p1.y).powi(2)).sqrt()
}
