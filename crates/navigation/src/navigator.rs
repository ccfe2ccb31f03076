//! Free-fly camera constrained to a band of radii around a sphere.
//!
//! The navigator keeps yaw/pitch relative to the local tangent frame instead
//! of a world-space orientation. The basis is rebuilt from the current
//! position on every change, which keeps the horizon level (no roll) no
//! matter where on the sphere the camera travels.

use foundation::math::{LookBasis, Quat, TangentFrame, Vec3, lat_lon_to_position, local_up, rotate_about};
use tracing::debug;

use crate::config::NavigatorConfig;
use crate::input::{Key, PressedKeys};

/// Camera position and orientation, read by the renderer each frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    /// Same rotation as the basis, for a camera looking down its local −Z.
    pub orientation: Quat,
}

impl CameraPose {
    fn new(position: Vec3, basis: LookBasis) -> Self {
        Self {
            position,
            forward: basis.forward,
            right: basis.right,
            up: basis.up,
            orientation: basis.orientation(),
        }
    }

    /// Distance from the sphere center.
    pub fn radius(&self) -> f64 {
        self.position.length()
    }

    /// A point one unit ahead, for renderers that want a look-at target.
    pub fn target(&self) -> Vec3 {
        self.position + self.forward
    }

    pub fn basis(&self) -> LookBasis {
        LookBasis {
            forward: self.forward,
            right: self.right,
            up: self.up,
        }
    }
}

/// Mutable look/move state handed to every integration step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    pub yaw_rad: f64,
    pub pitch_rad: f64,
    pub keys: PressedKeys,
}

/// View forward/right flattened onto the tangent plane at `frame`.
///
/// When one of them is radial (looking straight up or down) it is rebuilt
/// from the other; `None` only if both vanish.
pub(crate) fn tangent_axes(frame: &TangentFrame, pose: &CameraPose) -> Option<(Vec3, Vec3)> {
    let forward = frame.project(pose.forward).try_normalize();
    let right = frame.project(pose.right).try_normalize();
    match (forward, right) {
        (Some(f), Some(r)) => Some((f, r)),
        (None, Some(r)) => Some((frame.up.cross(r), r)),
        (Some(f), None) => Some((f, f.cross(frame.up))),
        (None, None) => None,
    }
}

/// New camera position after `dt` seconds of the movement in `state`, or
/// `None` if nothing moves.
pub fn integrate_movement(
    config: &NavigatorConfig,
    state: &NavigationState,
    pose: &CameraPose,
    dt: f64,
) -> Option<Vec3> {
    let intent = state.keys.intent();
    if intent.is_idle() || dt <= 0.0 {
        return None;
    }

    let mut position = pose.position;
    let mut moved = false;

    if intent.forward != 0 || intent.right != 0 {
        let frame = TangentFrame::at(position);
        let direction = tangent_axes(&frame, pose).and_then(|(forward, right)| {
            (forward * f64::from(intent.forward) + right * f64::from(intent.right)).try_normalize()
        });
        if let Some(direction) = direction {
            // Arc length over radius: constant ground speed at any altitude.
            let radius = position.length().max(1e-6);
            let angle = config.surface_speed / radius * dt;
            position = rotate_about(position, frame.up.cross(direction), angle);
            moved = true;
        }
    }

    if intent.climb != 0 {
        let up = local_up(position);
        let climb = config.surface_speed * config.climb_factor * dt * f64::from(intent.climb);
        let raised = position + up * climb;
        let direction = raised.try_normalize().unwrap_or(up);
        position = direction * config.clamp_radius(raised.length());
        moved = true;
    }

    moved.then_some(position)
}

#[derive(Debug, Clone)]
pub struct SphericalNavigator {
    config: NavigatorConfig,
    state: NavigationState,
    pose: CameraPose,
}

impl SphericalNavigator {
    pub fn new(config: NavigatorConfig) -> Self {
        let state = NavigationState {
            yaw_rad: config.initial_yaw_rad,
            pitch_rad: config.initial_pitch_rad(),
            keys: PressedKeys::new(),
        };
        let view = config.initial_view;
        let mut nav = Self {
            pose: CameraPose::new(Vec3::ZERO, LookBasis {
                forward: Vec3::Z,
                right: Vec3::X,
                up: Vec3::Y,
            }),
            config,
            state,
        };
        nav.look_at_lat_lon(view.lat_deg, view.lon_deg, view.altitude);
        nav
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn yaw_rad(&self) -> f64 {
        self.state.yaw_rad
    }

    pub fn pitch_rad(&self) -> f64 {
        self.state.pitch_rad
    }

    pub fn key_down(&mut self, key: Key) {
        self.state.keys.press(key);
    }

    pub fn key_up(&mut self, key: Key) {
        self.state.keys.release(key);
    }

    /// Forget held keys, e.g. when the window loses focus.
    pub fn release_all_keys(&mut self) {
        self.state.keys.clear();
    }

    pub fn is_moving(&self) -> bool {
        !self.state.keys.intent().is_idle()
    }

    /// Integrate a raw pointer delta (pixels). Not scaled by frame time.
    pub fn look(&mut self, dx: f64, dy: f64) {
        let sensitivity = self.config.mouse_sensitivity;
        self.set_yaw_pitch(
            self.state.yaw_rad - dx * sensitivity,
            self.state.pitch_rad - dy * sensitivity,
        );
    }

    pub fn set_yaw_pitch(&mut self, yaw_rad: f64, pitch_rad: f64) {
        let limit = self.config.pitch_limit_rad();
        self.state.yaw_rad = yaw_rad;
        self.state.pitch_rad = pitch_rad.clamp(-limit, limit);
        self.rebuild(self.pose.position);
    }

    /// Place the camera `altitude` above the surface at the given coordinate,
    /// keeping the current yaw/pitch.
    pub fn look_at_lat_lon(&mut self, lat_deg: f64, lon_deg: f64, altitude: f64) {
        let radius = self.config.clamp_radius(self.config.sphere_radius + altitude);
        let position = lat_lon_to_position(lat_deg, lon_deg, radius);
        debug!(lat_deg, lon_deg, radius, "camera placed");
        self.rebuild(position);
    }

    /// Per-frame movement tick. Returns `true` if the camera moved.
    pub fn update(&mut self, dt: f64) -> bool {
        let dt = dt.clamp(0.0, self.config.frame_dt_cap());
        match integrate_movement(&self.config, &self.state, &self.pose, dt) {
            Some(position) => {
                self.rebuild(position);
                true
            }
            None => false,
        }
    }

    /// Recompute the frame at `position` and reapply the current yaw/pitch.
    fn rebuild(&mut self, position: Vec3) {
        let position = match position.try_normalize() {
            Some(dir) => dir * self.config.clamp_radius(position.length()),
            None => Vec3::Y * self.config.clamp_radius(0.0),
        };
        let frame = TangentFrame::at(position);
        let basis = LookBasis::from_yaw_pitch(&frame, self.state.yaw_rad, self.state.pitch_rad);
        self.pose = CameraPose::new(position, basis);
    }
}

impl Default for SphericalNavigator {
    fn default() -> Self {
        Self::new(NavigatorConfig::default())
    }
}
