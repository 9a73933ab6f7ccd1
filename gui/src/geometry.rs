//! Screen Geometry
//!
//! Integer points, sizes and rectangles in absolute screen space.
//! Every clip/intersect operation yields a rectangle with non-negative
//! dimensions; a disjoint intersection is a zero-area rectangle.

/// A point in absolute screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width and height pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin
    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Get the right edge (exclusive), saturating at `i32::MAX`
    #[inline]
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Get the bottom edge (exclusive), saturating at `i32::MAX`
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// True if the rectangle covers no pixels
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Calculate area of the rectangle (zero for empty rectangles)
    pub fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.width as u64 * self.height as u64
        }
    }

    /// Get intersection with another rectangle
    ///
    /// Never produces negative dimensions: disjoint rectangles intersect
    /// in a zero-area rectangle positioned at the max of both origins.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Rect {
            x,
            y,
            width: right.saturating_sub(x).max(0),
            height: bottom.saturating_sub(y).max(0),
        }
    }

    /// Check if this rectangle overlaps another by at least one pixel
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Check if rectangle contains a point (half-open on the far edges)
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Check if this rectangle fully contains another
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x <= other.x
            && self.y <= other.y
            && self.right() >= other.right()
            && self.bottom() >= other.bottom()
    }

    /// Shrink by `inset` pixels on every side
    pub fn inset(&self, inset: i32) -> Rect {
        Rect {
            x: self.x.saturating_add(inset),
            y: self.y.saturating_add(inset),
            width: self.width.saturating_sub(inset.saturating_mul(2)).max(0),
            height: self.height.saturating_sub(inset.saturating_mul(2)).max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_intersection() {
        let r1 = Rect::new(0, 0, 100, 100);
        let r2 = Rect::new(50, 50, 100, 100);

        assert!(r1.intersects(&r2));
        assert_eq!(r1.intersect(&r2), Rect::new(50, 50, 50, 50));
    }

    #[test]
    fn test_disjoint_intersection_is_empty() {
        let r1 = Rect::new(0, 0, 10, 10);
        let r2 = Rect::new(20, 30, 5, 5);

        let i = r1.intersect(&r2);
        assert_eq!(i.width, 0);
        assert_eq!(i.height, 0);
        assert_eq!(i.area(), 0);
        assert!(!r1.intersects(&r2));
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let r1 = Rect::new(0, 0, 10, 10);
        let r2 = Rect::new(10, 0, 10, 10);
        assert!(r1.intersect(&r2).is_empty());
    }

    #[test]
    fn test_contains_point_half_open() {
        let r = Rect::new(100, 100, 80, 30);
        assert!(r.contains(Point::new(100, 100)));
        assert!(r.contains(Point::new(179, 129)));
        assert!(!r.contains(Point::new(180, 100)));
        assert!(!r.contains(Point::new(100, 130)));
        assert!(!r.contains(Point::new(5, 5)));
    }

    #[test]
    fn test_contains_rect() {
        let outer = Rect::new(0, 0, 100, 100);
        assert!(outer.contains_rect(&Rect::new(10, 10, 20, 20)));
        assert!(outer.contains_rect(&outer));
        assert!(!outer.contains_rect(&Rect::new(90, 90, 20, 20)));
    }

    #[test]
    fn test_inset_never_negative() {
        let r = Rect::new(0, 0, 3, 3);
        assert_eq!(r.inset(1), Rect::new(1, 1, 1, 1));
        assert_eq!(r.inset(2).width, 0);
    }

    #[test]
    fn test_edges_saturate_near_i32_max() {
        let far = Rect::new(i32::MAX - 5, i32::MAX - 5, 100, 10);
        assert_eq!(far.right(), i32::MAX);
        assert_eq!(far.bottom(), i32::MAX);

        let screen = Rect::new(0, 0, 640, 480);
        assert!(far.intersect(&screen).is_empty());
        assert_eq!(far.intersect(&far), Rect::new(i32::MAX - 5, i32::MAX - 5, 5, 5));
        assert!(!far.contains(Point::new(0, 0)));

        let huge = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(huge.intersect(&screen).area(), 0);
        assert_eq!(huge.inset(i32::MAX).width, 0);
    }
}
