use core::fmt::Debug;

use crate::quadtree::point::Point;
use crate::quadtree::square::Square;

/// Axis-Aligned Bounding Box used as a range query rectangle.
///
/// Membership is half-open, like [`Square`]: `min.x <= x < max.x` and `min.y <= y < max.y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    min: Point,
    max: Point,
}

impl Aabb {
    /// An empty box. Adding any point to it yields the degenerate box around that point.
    pub fn new() -> Self {
        Aabb {
            min: Point {
                x: f64::INFINITY,
                y: f64::INFINITY,
            },
            max: Point {
                x: f64::NEG_INFINITY,
                y: f64::NEG_INFINITY,
            },
        }
    }

    /// Create an AABB spanned by two arbitrary corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let mut bb = Aabb::new();

        bb.add(&a);
        bb.add(&b);

        bb
    }

    /// Add a `Point` `p` to the current Axis-Aligned Bounding Box.
    pub fn add(&mut self, p: &Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn min(&self) -> Point {
        self.min
    }

    pub fn max(&self) -> Point {
        self.max
    }

    /// Grow the box by `eps` on all four sides.
    pub fn expand(&self, eps: f64) -> Self {
        Aabb {
            min: Point::new(self.min.x - eps, self.min.y - eps),
            max: Point::new(self.max.x + eps, self.max.y + eps),
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Whether the box and the square share no area.
    pub fn is_disjoint(&self, sq: &Square) -> bool {
        sq.from_x >= self.max.x
            || sq.to_x <= self.min.x
            || sq.from_y >= self.max.y
            || sq.to_y <= self.min.y
    }

    /// Whether the square lies entirely inside the box.
    pub fn covers(&self, sq: &Square) -> bool {
        sq.from_x >= self.min.x
            && sq.to_x <= self.max.x
            && sq.from_y >= self.min.y
            && sq.to_y <= self.max.y
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Aabb::new()
    }
}

#[cfg(test)]
mod test {
    use super::Aabb;
    use crate::quadtree::point::Point;
    use crate::quadtree::square::Square;

    #[test]
    fn corners_are_normalized() {
        let bb = Aabb::from_corners(Point::new(5.0, -1.0), Point::new(-2.0, 7.0));

        assert_eq!(bb.min(), Point::new(-2.0, -1.0));
        assert_eq!(bb.max(), Point::new(5.0, 7.0));
    }

    #[test]
    fn contains_is_half_open() {
        let bb = Aabb::from_corners(Point::new(0.0, 0.0), Point::new(2.0, 2.0));

        assert!(bb.contains(&Point::new(0.0, 0.0)));
        assert!(bb.contains(&Point::new(1.999, 1.0)));
        assert!(!bb.contains(&Point::new(2.0, 1.0)));
        assert!(!bb.contains(&Point::new(1.0, 2.0)));
    }

    #[test]
    fn expand_picks_up_boundary() {
        let bb = Aabb::from_corners(Point::new(0.0, 0.0), Point::new(2.0, 2.0)).expand(0.1);

        assert!(bb.contains(&Point::new(2.0, 2.0)));
        assert!(bb.contains(&Point::new(-0.1, -0.1)));
        assert!(!bb.contains(&Point::new(-0.2, 0.0)));
    }

    #[test]
    fn square_relations() {
        let bb = Aabb::from_corners(Point::new(0.0, 0.0), Point::new(4.0, 4.0));

        assert!(bb.covers(&Square::new(1, 0.0, 4.0, 0.0, 4.0)));
        assert!(!bb.covers(&Square::new(1, 0.0, 8.0, 0.0, 8.0)));
        assert!(!bb.is_disjoint(&Square::new(1, 2.0, 6.0, 2.0, 6.0)));
        assert!(bb.is_disjoint(&Square::new(1, 4.0, 8.0, 0.0, 4.0)));
    }
}
