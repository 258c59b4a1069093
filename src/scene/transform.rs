use glam::{Affine3A, EulerRot, Mat3, Quat, Vec3};

/// Local TRS transform of a scene node.
///
/// The matrix is derived on demand; nothing is cached, so a transform written
/// by the positioner is visible to the very next hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::new()
        }
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Decomposes `mat` into position/rotation/scale. Shear is lost.
    pub fn apply_local_matrix(&mut self, mat: Affine3A) {
        let (scale, rotation, translation) = mat.to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation;
        self.position = translation;
    }

    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    #[must_use]
    pub fn rotation_euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Turns the object so its local +Z axis points at `target`.
    ///
    /// This is the model convention (a model's front faces +Z); cameras look
    /// down −Z instead. Degenerate inputs (target coincident with the
    /// position, or straight above/below) leave the rotation untouched.
    pub fn face_toward(&mut self, target: Vec3, up: Vec3) {
        let Some(forward) = (target - self.position).try_normalize() else {
            return;
        };
        let Some(right) = up.cross(forward).try_normalize() else {
            return;
        };
        let new_up = forward.cross(right);
        self.rotation = Quat::from_mat3(&Mat3::from_cols(right, new_up, forward));
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
