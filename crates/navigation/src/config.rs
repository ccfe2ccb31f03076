use serde::{Deserialize, Serialize};

/// Pitch stays this far inside `pitch_max_deg`, never on it.
const PITCH_MARGIN_RAD: f64 = 1e-9;

/// Tunables for [`crate::SphericalNavigator`]. Distances are world units
/// measured from the sphere center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub sphere_radius: f64,
    /// Lowest allowed camera radius.
    pub min_altitude: f64,
    /// Highest allowed camera radius.
    pub max_altitude: f64,
    /// Ground speed along the surface (units per second).
    pub surface_speed: f64,
    /// Fraction of `surface_speed` used for climbing and descending.
    pub climb_factor: f64,
    /// Radians of yaw/pitch per pixel of pointer motion.
    pub mouse_sensitivity: f64,
    pub pitch_max_deg: f64,
    /// Upper bound on the per-tick timestep (seconds).
    pub max_frame_dt: f64,
    pub initial_yaw_rad: f64,
    pub initial_view: InitialView,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialView {
    pub lat_deg: f64,
    pub lon_deg: f64,
    /// Height above the sphere surface.
    pub altitude: f64,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            sphere_radius: 100.0,
            min_altitude: 115.0,
            max_altitude: 500.0,
            surface_speed: 200.0,
            climb_factor: 0.5,
            mouse_sensitivity: 0.002,
            pitch_max_deg: 89.99,
            max_frame_dt: 0.05,
            initial_yaw_rad: 0.0,
            initial_view: InitialView {
                lat_deg: 30.0,
                lon_deg: -115.0,
                altitude: 100.0,
            },
        }
    }
}

impl NavigatorConfig {
    pub fn pitch_max_rad(&self) -> f64 {
        self.pitch_max_deg.clamp(0.0, 89.999).to_radians()
    }

    /// Largest pitch magnitude the camera may take; strictly below
    /// `pitch_max_deg`.
    pub fn pitch_limit_rad(&self) -> f64 {
        (self.pitch_max_rad() - PITCH_MARGIN_RAD).max(0.0)
    }

    /// Upper bound on a movement step; a negative setting means no movement.
    pub fn frame_dt_cap(&self) -> f64 {
        self.max_frame_dt.max(0.0)
    }

    /// Starting pitch: just inside the lower limit, i.e. looking at the ground.
    pub fn initial_pitch_rad(&self) -> f64 {
        -(self.pitch_max_rad() - 1e-4)
    }

    pub fn clamp_radius(&self, radius: f64) -> f64 {
        let lo = self.min_altitude.min(self.max_altitude);
        radius.clamp(lo, self.max_altitude.max(lo))
    }
}
