use pcd_core::pointcloud::view::PointView;
use rayon::iter::{IntoParallelRefMutIterator as _, ParallelIterator as _};

use super::Transform;

/// Applies a row-major 4x4 matrix to every point. The bottom row is not used: points are
/// not divided by w.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    matrix: [f64; 16],
}

impl AffineTransform {
    pub fn new(matrix: [f64; 16]) -> Self {
        Self { matrix }
    }

    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self::new([
            1.0, 0.0, 0.0, dx, //
            0.0, 1.0, 0.0, dy, //
            0.0, 0.0, 1.0, dz, //
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    pub fn apply(&self, xyz: [f64; 3]) -> [f64; 3] {
        let m = &self.matrix;
        let [x, y, z] = xyz;
        [
            x * m[0] + y * m[1] + z * m[2] + m[3],
            x * m[4] + y * m[5] + z * m[6] + m[7],
            x * m[8] + y * m[9] + z * m[10] + m[11],
        ]
    }
}

impl Transform for AffineTransform {
    fn transform(&self, mut view: PointView) -> Vec<PointView> {
        view.points_mut().par_iter_mut().for_each(|point| {
            let [x, y, z] = self.apply(point.xyz());
            point.x = x;
            point.y = y;
            point.z = z;
        });
        vec![view]
    }
}
