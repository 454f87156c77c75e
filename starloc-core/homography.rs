use nalgebra::{Matrix3, Point2, Vector3};

/// Projective transform mapping query-image coordinates to reference-image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(Matrix3::new(
            1.0, 0.0, dx, //
            0.0, 1.0, dy, //
            0.0, 0.0, 1.0,
        ))
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Maps a point; the result is non-finite when `p` lands on the line at infinity.
    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    /// Like [`Homography::apply`] but rejects points mapped to (or near) infinity.
    pub fn try_apply(&self, p: Point2<f32>) -> Option<Point2<f32>> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        if !w.is_finite() || w.abs() < 1e-12 {
            return None;
        }
        let q = Point2::new((v[0] / w) as f32, (v[1] / w) as f32);
        (q.x.is_finite() && q.y.is_finite()).then_some(q)
    }

    /// Projects the four corners of a `width × height` rectangle,
    /// in the order (0,0), (w,0), (w,h), (0,h).
    pub fn project_corners(&self, width: u32, height: u32) -> Option<[Point2<f32>; 4]> {
        let c = corners_of(width, height);
        Some([
            self.try_apply(c[0])?,
            self.try_apply(c[1])?,
            self.try_apply(c[2])?,
            self.try_apply(c[3])?,
        ])
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }

    /// True for singular or non-finite matrices.
    pub fn is_degenerate(&self) -> bool {
        if self.h.iter().any(|v| !v.is_finite()) {
            return true;
        }
        let scale = self.h.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        if scale == 0.0 {
            return true;
        }
        (self.h / scale).determinant().abs() < 1e-12
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

/// Corners of a `width × height` rectangle: (0,0), (w,0), (w,h), (0,h).
pub fn corners_of(width: u32, height: u32) -> [Point2<f32>; 4] {
    let (w, h) = (width as f32, height as f32);
    [
        Point2::new(0.0, 0.0),
        Point2::new(w, 0.0),
        Point2::new(w, h),
        Point2::new(0.0, h),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_keeps_corners() {
        let corners = Homography::identity().project_corners(160, 120).unwrap();
        assert_eq!(corners, corners_of(160, 120));
    }

    #[test]
    fn translation_shifts_corners() {
        let corners = Homography::translation(40.0, -12.5)
            .project_corners(10, 20)
            .unwrap();
        assert_relative_eq!(corners[0].x, 40.0);
        assert_relative_eq!(corners[0].y, -12.5);
        assert_relative_eq!(corners[2].x, 50.0);
        assert_relative_eq!(corners[2].y, 7.5);
    }

    #[test]
    fn inverse_round_trips_points() {
        let h = Homography::from_array([
            [1.2, 0.1, 5.0],
            [-0.05, 0.9, 3.0],
            [0.001, 0.0005, 1.0],
        ]);
        let inv = h.inverse().expect("invertible");
        for p in [Point2::new(0.0_f32, 0.0), Point2::new(320.0, 200.0)] {
            let back = inv.apply(h.apply(p));
            assert_relative_eq!(back.x, p.x, epsilon = 1e-3);
            assert_relative_eq!(back.y, p.y, epsilon = 1e-3);
        }
        assert_eq!(Homography::from_array(h.to_array()), h);
    }

    #[test]
    fn points_at_infinity_are_rejected() {
        // w = x - 10 vanishes on the line x = 10
        let h = Homography::from_array([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, -10.0]]);
        assert!(h.try_apply(Point2::new(10.0, 3.0)).is_none());
        assert!(h.project_corners(10, 10).is_none());
    }

    #[test]
    fn singular_matrix_is_degenerate() {
        let rank_one = Homography::from_array([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 2.0, 3.0]]);
        assert!(rank_one.is_degenerate());
        assert!(Homography::new(Matrix3::zeros()).is_degenerate());
        assert!(!Homography::identity().is_degenerate());
    }
}
