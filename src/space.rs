//! Coordinate-space conversion.
//!
//! glTF data is right-handed with Y up. The default conversion swaps the Y
//! and Z axes for Z-up hosts; an optional X flip changes handedness. The
//! basis-change matrix is involutory, so applying the same conversion twice
//! restores the input. Conversion is applied exactly once, at each
//! extractor's exit path, never inside the resolution layer.

use glam::{Mat3, Mat4, Quat, Vec3};

/// Axis conventions of the extraction target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpaceConversion {
    /// Swap the Y and Z axes (glTF Y-up to target Z-up).
    pub swap_yz: bool,
    /// Negate the X axis (handedness flip).
    pub invert_x: bool,
}

impl Default for SpaceConversion {
    fn default() -> Self {
        Self {
            swap_yz: true,
            invert_x: false,
        }
    }
}

impl SpaceConversion {
    /// Leave values in glTF space.
    pub const NONE: Self = Self {
        swap_yz: false,
        invert_x: false,
    };

    fn basis3(self) -> Mat3 {
        let mut columns = [Vec3::X, Vec3::Y, Vec3::Z];
        if self.swap_yz {
            columns.swap(1, 2);
        }
        if self.invert_x {
            columns[0] = -columns[0];
        }
        Mat3::from_cols(columns[0], columns[1], columns[2])
    }

    /// Basis-change matrix for this flag pair.
    pub fn basis(self) -> Mat4 {
        Mat4::from_mat3(self.basis3())
    }

    /// Convert a point.
    pub fn position(self, p: [f32; 3]) -> [f32; 3] {
        let [x, y, z] = p;
        let (y, z) = if self.swap_yz { (z, y) } else { (y, z) };
        let x = if self.invert_x { -x } else { x };
        [x, y, z]
    }

    /// Convert a direction. Identical to [`SpaceConversion::position`]
    /// since the basis change carries no translation.
    pub fn direction(self, d: [f32; 3]) -> [f32; 3] {
        self.position(d)
    }

    /// Convert a tangent; the w handedness sign rides along unchanged.
    pub fn tangent(self, t: [f32; 4]) -> [f32; 4] {
        let [x, y, z] = self.direction([t[0], t[1], t[2]]);
        [x, y, z, t[3]]
    }

    /// Convert a non-uniform scale; axes permute, magnitudes are untouched.
    pub fn scale(self, s: [f32; 3]) -> [f32; 3] {
        let [x, y, z] = s;
        let (y, z) = if self.swap_yz { (z, y) } else { (y, z) };
        [x, y, z]
    }

    /// Convert a rotation by conjugating with the basis change.
    pub fn quat(self, q: [f32; 4]) -> [f32; 4] {
        let basis = self.basis3();
        let rotation = basis * Mat3::from_quat(Quat::from_array(q)) * basis;
        Quat::from_mat3(&rotation).normalize().to_array()
    }

    /// Convert a transform matrix by conjugating with the basis change.
    pub fn matrix(self, m: Mat4) -> Mat4 {
        let basis = self.basis();
        basis * m * basis
    }
}
