use crate::Point2;
use std::ops::Add;

/// An axis-aligned region of the field, anchored at its minimum corner.
///
/// Agents keep to the cells of `Rect::new(0, 0, width, height)`.
#[derive(Copy, Clone, Debug)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T: Copy> Rect<T> {
    pub fn new(x: T, y: T, width: T, height: T) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

impl<T> Rect<T>
where
    T: Add<Output = T> + Copy,
{
    /// First column inside the region.
    pub fn x_min(&self) -> T {
        self.x
    }

    /// One past the last column.
    pub fn x_max(&self) -> T {
        self.x + self.width
    }

    pub fn y_min(&self) -> T {
        self.y
    }

    /// One past the last row.
    pub fn y_max(&self) -> T {
        self.y + self.height
    }
}

impl Rect<u32> {
    /// Half-open containment: the max edges are outside.
    pub fn contains(&self, other: &Point2<f64>) -> bool {
        other.x() >= self.x_min() as f64
            && other.x() < self.x_max() as f64
            && other.y() >= self.y_min() as f64
            && other.y() < self.y_max() as f64
    }

    /// Pulls each axis of `other` back inside the rectangle independently.
    ///
    /// A coordinate past the max edge lands on the last cell (`max - 1`) so the
    /// result always satisfies [`Rect::contains`]. Returns `true` if either axis
    /// had to be corrected.
    pub fn clamp(&self, other: &mut Point2<f64>) -> bool {
        let (x, x_hit) = clamp_axis(other.x(), self.x_min() as f64, self.x_max() as f64);
        let (y, y_hit) = clamp_axis(other.y(), self.y_min() as f64, self.y_max() as f64);

        if x_hit || y_hit {
            other.move_absolute(x, y);
        }

        x_hit || y_hit
    }
}

fn clamp_axis(value: f64, min: f64, max: f64) -> (f64, bool) {
    if value >= max {
        (max - 1.0, true)
    } else if value < min {
        (min, true)
    } else if value.is_nan() {
        (min, true)
    } else {
        (value, false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clamp_leaves_interior_points_alone() {
        let rect = Rect::new(0, 0, 10, 10);
        let mut point = Point2::new(4.5, 9.25);

        assert!(!rect.clamp(&mut point));
        assert_eq!(point, Point2::new(4.5, 9.25));
    }

    #[test]
    fn clamp_corrects_each_axis_independently() {
        let rect = Rect::new(0, 0, 10, 20);
        let mut past_max = Point2::new(10.0, 3.0);
        let mut below_min = Point2::new(2.0, -0.5);

        assert!(rect.clamp(&mut past_max));
        assert!(rect.clamp(&mut below_min));
        assert_eq!(past_max, Point2::new(9.0, 3.0));
        assert_eq!(below_min, Point2::new(2.0, 0.0));
        assert!(rect.contains(&past_max) && rect.contains(&below_min));
    }

    #[test]
    fn max_edges_are_not_contained() {
        let rect = Rect::new(0, 0, 10, 10);
        assert!(!rect.contains(&Point2::new(10.0, 0.0)));
        assert!(!rect.contains(&Point2::new(0.0, 10.0)));
        assert!(rect.contains(&Point2::new(9.999, 0.0)));
    }
}
