use num::Float;

#[derive(Clone, Copy, Debug, Default)]
pub struct Point2<T> {
    x: T,
    y: T,
}

impl<T: std::fmt::Display> std::fmt::Display for Point2<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(x: {}, y: {})", self.x, self.y)
    }
}

impl<T: Copy> Point2<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> T {
        self.x
    }

    pub fn y(&self) -> T {
        self.y
    }

    pub fn move_absolute(&mut self, x: T, y: T) {
        self.x = x;
        self.y = y;
    }
}

impl<T: Float> Point2<T> {
    /// The unit vector pointing along `angle` (radians, measured from the +x axis).
    pub fn unit(angle: T) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    /// The point `distance` away from this one in the direction of `angle` (radians).
    pub fn offset(&self, angle: T, distance: T) -> Self {
        let direction = Self::unit(angle);
        Self::new(
            self.x + direction.x * distance,
            self.y + direction.y * distance,
        )
    }

    pub fn move_relative(&mut self, x: T, y: T) {
        self.x = self.x + x;
        self.y = self.y + y;
    }

    pub fn magnitude_squared(&self) -> T {
        self.x * self.x + self.y * self.y
    }

    /// Angle of this point seen as a vector from the origin, in radians.
    pub fn angle(&self) -> T {
        self.y.atan2(self.x)
    }
}

impl<T: PartialEq> PartialEq for Point2<T> {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn offset_moves_along_the_given_angle() {
        let origin = Point2::new(10.0, 10.0);
        let east = origin.offset(0.0, 5.0);
        let south = origin.offset(FRAC_PI_2, 5.0);

        assert!((east.x() - 15.0).abs() < 1e-12 && (east.y() - 10.0).abs() < 1e-12);
        assert!((south.x() - 10.0).abs() < 1e-12 && (south.y() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn angle_is_inverse_of_unit() {
        let direction = Point2::unit(3.0 * PI / 4.0);
        assert!((direction.angle() - 3.0 * PI / 4.0).abs() < 1e-12);
        assert!((direction.magnitude_squared() - 1.0).abs() < 1e-12);
    }
}
