//! Local frames on a sphere centered at the origin.
//!
//! Everything here is a pure function of a position (and, for look bases, a
//! yaw/pitch pair). Callers rebuild frames whenever the position changes; no
//! frame is ever carried across a move.

use super::{Quat, Vec3};

/// `|up.y|` above which the world Y axis is too close to `up` to serve as the
/// reference for the tangent frame.
pub const POLE_THRESHOLD: f64 = 0.99;

/// Longitude offset (degrees) of the globe texture's seam.
pub const GLOBE_LON_OFFSET_DEG: f64 = 270.0;

/// Normalized radial direction from the sphere center to `position`.
///
/// The sphere center itself has no defined radial; world Y is returned.
pub fn local_up(position: Vec3) -> Vec3 {
    position.try_normalize().unwrap_or(Vec3::Y)
}

/// World axis used to seed the tangent frame at `up`.
pub fn reference_axis(up: Vec3) -> Vec3 {
    if up.y.abs() > POLE_THRESHOLD {
        Vec3::X
    } else {
        Vec3::Y
    }
}

/// Rotate `v` by `angle_rad` about `axis`.
pub fn rotate_about(v: Vec3, axis: Vec3, angle_rad: f64) -> Vec3 {
    Quat::from_axis_angle(axis, angle_rad).rotate(v)
}

/// World position of a latitude/longitude (degrees) on a sphere of `radius`,
/// using the globe mesh's longitude convention.
pub fn lat_lon_to_position(lat_deg: f64, lon_deg: f64, radius: f64) -> Vec3 {
    let lat = lat_deg.to_radians();
    let lon = (-(lon_deg + GLOBE_LON_OFFSET_DEG)).to_radians();
    Vec3::new(
        radius * lat.cos() * lon.cos(),
        radius * lat.sin(),
        radius * lat.cos() * lon.sin(),
    )
}

/// East/north/up triple at a point on the sphere.
///
/// `(east, north, up)` is right-handed: `east × north = up`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TangentFrame {
    pub up: Vec3,
    pub east: Vec3,
    pub north: Vec3,
}

impl TangentFrame {
    pub fn at(position: Vec3) -> Self {
        let up = local_up(position);
        let east = reference_axis(up).cross(up).normalize_or_zero();
        let north = up.cross(east).normalize_or_zero();
        Self { up, east, north }
    }

    /// Component of `v` lying in the tangent plane.
    pub fn project(&self, v: Vec3) -> Vec3 {
        v.reject_from(self.up)
    }
}

/// Roll-free camera basis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LookBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl LookBasis {
    /// Pitch about east first, then yaw about the local up. The order matters:
    /// the reverse (or world-axis rotations) leaves residual roll.
    ///
    /// `pitch_rad` must stay strictly inside `(-π/2, π/2)`.
    pub fn from_yaw_pitch(frame: &TangentFrame, yaw_rad: f64, pitch_rad: f64) -> Self {
        let pitched = rotate_about(frame.north, frame.east, pitch_rad);
        let forward = rotate_about(pitched, frame.up, yaw_rad).normalize_or_zero();
        let right = forward.cross(frame.up).normalize_or_zero();
        let up = right.cross(forward).normalize_or_zero();
        Self { forward, right, up }
    }

    /// Orientation of a camera that looks down its local −Z.
    pub fn orientation(&self) -> Quat {
        Quat::from_basis(self.right, self.up, -self.forward)
    }

    pub fn is_orthonormal(&self, eps: f64) -> bool {
        let unit = |v: Vec3| (v.length() - 1.0).abs() <= eps;
        unit(self.forward)
            && unit(self.right)
            && unit(self.up)
            && self.forward.dot(self.right).abs() <= eps
            && self.forward.dot(self.up).abs() <= eps
            && self.right.dot(self.up).abs() <= eps
    }
}
