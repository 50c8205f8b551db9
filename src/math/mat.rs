use crate::math::vec::Vec3;

/// Column-major 4x4 matrix, laid out the way WGSL `mat4x4<f32>` expects.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Mat4(pub [[f32; 4]; 4]);

impl Mat4 {
    /// Leaves every point where it is.
    pub fn identity() -> Mat4 {
        Mat4([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Right-handed perspective projection with a 0..1 depth range.
    pub fn perspective(
        field_of_view_y_in_radians: f32,
        aspect: f32,
        z_near: f32,
        z_far: f32,
    ) -> Mat4 {
        let f = 1.0 / (field_of_view_y_in_radians * 0.5).tan();
        let range_reciprocal = 1.0 / (z_near - z_far);

        Mat4([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, z_far * range_reciprocal, -1.0],
            [0.0, 0.0, z_far * z_near * range_reciprocal, 0.0],
        ])
    }

    /// Right-handed view matrix looking from `eye` towards `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let side = forward.cross(&up).normalize();
        let up = side.cross(&forward);

        Mat4([
            [side.x(), up.x(), -forward.x(), 0.0],
            [side.y(), up.y(), -forward.y(), 0.0],
            [side.z(), up.z(), -forward.z(), 0.0],
            [-side.dot(&eye), -up.dot(&eye), forward.dot(&eye), 1.0],
        ])
    }

    /// Moves points by `(tx, ty, tz)`.
    pub fn translation(tx: f32, ty: f32, tz: f32) -> Mat4 {
        Mat4([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [tx, ty, tz, 1.0],
        ])
    }

    /// Counter-clockwise rotation about the X axis.
    pub fn rotation_x(angle_in_radians: f32) -> Mat4 {
        let (s, c) = angle_in_radians.sin_cos();
        Mat4([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, s, 0.0],
            [0.0, -s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Counter-clockwise rotation about the Y axis.
    pub fn rotation_y(angle_in_radians: f32) -> Mat4 {
        let (s, c) = angle_in_radians.sin_cos();
        Mat4([
            [c, 0.0, -s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// `self * b`, so `b` is applied first.
    pub fn multiply(&self, b: &Mat4) -> Mat4 {
        let mut result = [[0.0; 4]; 4];
        for (i, row) in result.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| b.0[i][k] * self.0[k][j]).sum();
            }
        }
        Mat4(result)
    }

    /// Transforms a point (w = 1) and returns the homogeneous result.
    pub fn transform_point(&self, p: Vec3) -> [f32; 4] {
        let v = [p.x(), p.y(), p.z(), 1.0];
        let mut out = [0.0; 4];
        for (row, cell) in out.iter_mut().enumerate() {
            *cell = (0..4).map(|col| self.0[col][row] * v[col]).sum();
        }
        out
    }
}

impl From<Mat4> for [[f32; 4]; 4] {
    fn from(matrix: Mat4) -> Self {
        matrix.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn translation_then_multiply_composes() {
        let m = Mat4::translation(1.0, 2.0, 3.0).multiply(&Mat4::translation(1.0, 0.0, 0.0));
        let p = m.transform_point(Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(p, [2.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn look_at_puts_target_on_negative_z() {
        let view = Mat4::look_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        let p = view.transform_point(Vec3::new(0.0, 0.0, 0.0));
        assert!(approx(p[0], 0.0) && approx(p[1], 0.0) && approx(p[2], -10.0));
    }

    #[test]
    fn perspective_maps_near_and_far_to_unit_depth() {
        let proj = Mat4::perspective(1.0, 1.0, 0.1, 100.0);
        let near = proj.transform_point(Vec3::new(0.0, 0.0, -0.1));
        let far = proj.transform_point(Vec3::new(0.0, 0.0, -100.0));
        assert!(approx(near[2] / near[3], 0.0));
        assert!(approx(far[2] / far[3], 1.0));
    }
}
