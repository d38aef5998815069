#![warn(missing_docs)]

//! Math types for vcad mesh hit-testing.
//!
//! Thin wrappers around nalgebra: point and vector aliases, an affine
//! [`Transform`] whose inverse fails closed on singular matrices, and the
//! [`Tolerance`] constants shared by the geometric predicates.

use nalgebra::{Matrix4, Rotation3, Unit, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D texture space.
pub type Point2 = nalgebra::Point2<f64>;

/// A 4x4 affine transform mapping model space into world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix (column vectors, translation in the last column).
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wrap an existing matrix.
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix4::new_translation(&Vec3::new(dx, dy, dz)),
        }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&Vec3::new(sx, sy, sz)),
        }
    }

    /// Uniform scale by `s`.
    pub fn uniform_scale(s: f64) -> Self {
        Self::scale(s, s, s)
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        Self::rotation_about_axis(&Vec3::x_axis(), angle)
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        Self::rotation_about_axis(&Vec3::y_axis(), angle)
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        Self::rotation_about_axis(&Vec3::z_axis(), angle)
    }

    /// Rotation about an arbitrary axis through the origin by `angle` radians.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        Self {
            matrix: Rotation3::from_axis_angle(axis, angle).to_homogeneous(),
        }
    }

    /// Compose two transforms: the result applies `inner` first, then `self`.
    pub fn compose(&self, inner: &Transform) -> Self {
        Self {
            matrix: self.matrix * inner.matrix,
        }
    }

    /// Transform a point (translation applies).
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (translation ignored).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Determinant of the full 4x4 matrix.
    pub fn determinant(&self) -> f64 {
        self.matrix.determinant()
    }

    /// Whether [`Transform::inverse`] will succeed.
    ///
    /// The determinant of the linear 3x3 block is compared against the
    /// product of its column lengths, so a uniformly tiny or huge scale is
    /// still invertible while collapsed or nearly collapsed axes are not.
    pub fn is_invertible(&self) -> bool {
        let linear = self.matrix.fixed_view::<3, 3>(0, 0);
        let det = linear.determinant();
        let scale: f64 = linear.column_iter().map(|c| c.norm()).product();
        det.is_finite() && scale.is_finite() && det.abs() > Tolerance::DEFAULT.determinant * scale
    }

    /// Inverse of this transform.
    ///
    /// Returns `None` when [`Transform::is_invertible`] fails or the inverse
    /// has non-finite entries. Callers treat `None` as a defined negative
    /// outcome rather than falling back to an approximation.
    pub fn inverse(&self) -> Option<Self> {
        if !self.is_invertible() {
            return None;
        }
        self.matrix
            .try_inverse()
            .filter(|m| m.iter().all(|x| x.is_finite()))
            .map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerance constants for geometric predicates.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
    /// Smallest determinant, relative to the product of the matrix's
    /// column lengths, treated as invertible.
    pub determinant: f64,
    /// Smallest ray/triangle determinant, relative to the product of the
    /// direction and edge lengths, treated as non-parallel.
    pub parallel: f64,
}

impl Tolerance {
    /// Default tolerances.
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        determinant: 1e-12,
        parallel: 1e-12,
    };
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
