use core::fmt;

use crate::error::Error;
use crate::error::Result;
use crate::quadtree::point::Point;

/// An axis-aligned cell of the subdivision, tagged with its level.
///
/// Level `0` is the domain of the tree it was created for. Every call to [`Square::localize`]
/// halves the cell on both axes and adds one to the level, so two squares with the same level and
/// bounds always describe the same cell. Auto-expanding trees grow their domain upwards, which
/// produces negative levels.
///
/// Bounds are half-open on both axes: `[from_x, to_x) x [from_y, to_y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Square {
    pub level: i32,
    pub from_x: f64,
    pub to_x: f64,
    pub from_y: f64,
    pub to_y: f64,
}

impl Square {
    pub const fn new(level: i32, from_x: f64, to_x: f64, from_y: f64, to_y: f64) -> Self {
        Square {
            level,
            from_x,
            to_x,
            from_y,
            to_y,
        }
    }

    /// A level `0` square for a bounded tree, rejecting empty, inverted or non-finite bounds.
    pub fn domain(from_x: f64, to_x: f64, from_y: f64, to_y: f64) -> Result<Self> {
        let sq = Square::new(0, from_x, to_x, from_y, to_y);

        if !sq.is_finite() || from_x >= to_x || from_y >= to_y {
            return Err(Error::InvalidBounds {
                from_x,
                to_x,
                from_y,
                to_y,
            });
        }

        Ok(sq)
    }

    pub fn mid_x(&self) -> f64 {
        (self.from_x + self.to_x) / 2f64
    }

    pub fn mid_y(&self) -> f64 {
        (self.from_y + self.to_y) / 2f64
    }

    pub fn midpoint(&self) -> Point {
        Point::new(self.mid_x(), self.mid_y())
    }

    pub fn width(&self) -> f64 {
        self.to_x - self.from_x
    }

    pub fn height(&self) -> f64 {
        self.to_y - self.from_y
    }

    /// Whether the bounds, midlines and sizes are all finite numbers.
    ///
    /// Bounds near `f64::MAX` can be finite while their midpoint is not, and such a square never
    /// subdivides.
    pub fn is_finite(&self) -> bool {
        [
            self.from_x,
            self.to_x,
            self.from_y,
            self.to_y,
            self.mid_x(),
            self.mid_y(),
            self.width(),
            self.height(),
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Whether `self` is strictly smaller than `other` on at least one axis.
    pub fn is_smaller_than(&self, other: &Square) -> bool {
        self.width() < other.width() || self.height() < other.height()
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.from_x && p.x < self.to_x && p.y >= self.from_y && p.y < self.to_y
    }

    /// Whether `other` lies entirely inside this square.
    pub fn contains_square(&self, other: &Square) -> bool {
        self.from_x <= other.from_x
            && self.to_x >= other.to_x
            && self.from_y <= other.from_y
            && self.to_y >= other.to_y
    }

    /// Index of the quadrant `p` falls in, or `None` if `p` is outside the square.
    ///
    /// ```notrust
    ///   1 3
    ///   0 2
    /// ```
    ///
    /// Points exactly on a midline belong to the high side.
    pub fn quadrant(&self, p: &Point) -> Option<usize> {
        if !self.contains(p) {
            return None;
        }

        let x_high = (p.x >= self.mid_x()) as usize;
        let y_high = (p.y >= self.mid_y()) as usize;

        Some(x_high * 2 + y_high)
    }

    /// The half-size sub-square containing `p`, one level down.
    ///
    /// `p` is not required to lie inside the square: it is only compared against the midlines.
    pub fn localize(&self, p: &Point) -> Square {
        let (mid_x, mid_y) = (self.mid_x(), self.mid_y());

        let (from_x, to_x) = if p.x < mid_x {
            (self.from_x, mid_x)
        } else {
            (mid_x, self.to_x)
        };

        let (from_y, to_y) = if p.y < mid_y {
            (self.from_y, mid_y)
        } else {
            (mid_y, self.to_y)
        };

        Square::new(self.level + 1, from_x, to_x, from_y, to_y)
    }

    /// Whether this square is exactly one subdivision below `parent`, i.e. not a compressed jump.
    pub fn is_direct_child_of(&self, parent: &Square) -> bool {
        self.level == parent.level + 1
    }

    /// The square twice as large with `self` as one of its quadrants, extended towards `p`.
    pub fn grow_toward(&self, p: &Point) -> Square {
        let (w, h) = (self.width(), self.height());

        let (from_x, to_x) = if p.x < self.from_x {
            (self.from_x - w, self.to_x)
        } else {
            (self.from_x, self.to_x + w)
        };

        let (from_y, to_y) = if p.y < self.from_y {
            (self.from_y - h, self.to_y)
        } else {
            (self.from_y, self.to_y + h)
        };

        Square::new(self.level - 1, from_x, to_x, from_y, to_y)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{x=[{}, {}) y=[{}, {}) lvl={}}}",
            self.from_x, self.to_x, self.from_y, self.to_y, self.level
        )
    }
}

#[cfg(test)]
mod test {
    use super::Square;
    use crate::quadtree::point::Point;

    fn unit() -> Square {
        Square::new(0, 0.0, 4.0, 0.0, 4.0)
    }

    #[test]
    fn quadrant_layout() {
        let sq = unit();

        assert_eq!(sq.quadrant(&Point::new(1.0, 1.0)), Some(0));
        assert_eq!(sq.quadrant(&Point::new(1.0, 3.0)), Some(1));
        assert_eq!(sq.quadrant(&Point::new(3.0, 1.0)), Some(2));
        assert_eq!(sq.quadrant(&Point::new(3.0, 3.0)), Some(3));
    }

    #[test]
    fn ties_go_high() {
        let sq = unit();

        assert_eq!(sq.quadrant(&Point::new(2.0, 2.0)), Some(3));
        assert_eq!(sq.quadrant(&Point::new(2.0, 0.0)), Some(2));
        assert_eq!(sq.quadrant(&Point::new(0.0, 2.0)), Some(1));
    }

    #[test]
    fn half_open_bounds() {
        let sq = unit();

        assert_eq!(sq.quadrant(&Point::new(0.0, 0.0)), Some(0));
        assert_eq!(sq.quadrant(&Point::new(4.0, 1.0)), None);
        assert_eq!(sq.quadrant(&Point::new(1.0, 4.0)), None);
        assert_eq!(sq.quadrant(&Point::new(-0.5, 1.0)), None);
    }

    #[test]
    fn localize_matches_quadrant() {
        let sq = unit();
        let p = Point::new(3.0, 0.5);

        let sub = sq.localize(&p);

        assert_eq!(sub, Square::new(1, 2.0, 4.0, 0.0, 2.0));
        assert!(sub.contains(&p));
        assert!(sub.is_direct_child_of(&sq));
        assert!(sq.contains_square(&sub));
        assert!(!sub.contains_square(&sq));
    }

    #[test]
    fn grow_keeps_old_square_as_quadrant() {
        let sq = Square::new(0, -1.0, 1.0, -1.0, 1.0);

        let grown = sq.grow_toward(&Point::new(-5.0, 3.0));

        assert_eq!(grown, Square::new(-1, -3.0, 1.0, -1.0, 3.0));
        assert_eq!(grown.localize(&sq.midpoint()), sq);
    }

    #[test]
    fn overflowing_midpoint_is_not_finite() {
        assert!(unit().is_finite());

        let huge = Square::new(0, 1e308, 1.7e308, 0.0, 1.0);
        assert!(huge.mid_x().is_infinite());
        assert!(!huge.is_finite());

        let sub = huge.localize(&Point::new(1.1e308, 0.5));
        assert_eq!((sub.from_x, sub.to_x), (1e308, f64::INFINITY));
        assert!(!sub.is_finite());
    }

    #[test]
    fn smaller_on_either_axis() {
        let sq = unit();
        let sub = sq.localize(&Point::new(1.0, 1.0));

        assert!(sub.is_smaller_than(&sq));
        assert!(!sq.is_smaller_than(&sub));
        assert!(!sq.is_smaller_than(&sq));
        assert!(Square::new(1, 0.0, 4.0, 0.0, 2.0).is_smaller_than(&sq));
    }

    #[test]
    fn display() {
        let sq = Square::new(2, -320.0, 0.0, -240.0, 0.0);

        assert_eq!(sq.to_string(), "{x=[-320, 0) y=[-240, 0) lvl=2}");
    }
}
