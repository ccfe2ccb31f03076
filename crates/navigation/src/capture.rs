use tracing::{debug, warn};

use crate::input::{Key, PointerButton};
use crate::navigator::SphericalNavigator;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Released,
    Captured,
}

/// Pointer affordance shown over the globe.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Cursor {
    Grab,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("pointer capture denied by host: {0}")]
    Denied(String),
    #[error("pointer capture is not supported by this host")]
    Unsupported,
}

/// Platform side of pointer capture (pointer lock in a browser, cursor grab
/// on desktop).
pub trait CaptureHost {
    fn request_capture(&mut self) -> Result<(), CaptureError>;
    fn release_capture(&mut self);
    fn set_cursor(&mut self, cursor: Cursor);
}

/// Routes raw pointer deltas to the navigator only while the pointer is
/// captured.
#[derive(Debug, Default)]
pub struct PointerCaptureController {
    state: CaptureState,
}

impl PointerCaptureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_captured(&self) -> bool {
        self.state == CaptureState::Captured
    }

    /// A click on the globe. Only the primary button requests capture; a
    /// denied request leaves the controller released.
    pub fn on_click(&mut self, button: PointerButton, host: &mut dyn CaptureHost) -> CaptureState {
        if button != PointerButton::Primary || self.is_captured() {
            return self.state;
        }
        match host.request_capture() {
            Ok(()) => self.enter(host),
            Err(err) => warn!("pointer capture request failed: {err}"),
        }
        self.state
    }

    /// Escape and `Q` release capture. Returns `true` if the key was used.
    pub fn on_key_down(&mut self, key: Key, host: &mut dyn CaptureHost) -> bool {
        if !self.is_captured() || !matches!(key, Key::Escape | Key::Q) {
            return false;
        }
        host.release_capture();
        self.leave(host);
        true
    }

    /// The host dropped capture on its own (focus loss, browser Escape).
    pub fn on_capture_lost(&mut self, host: &mut dyn CaptureHost) {
        if self.is_captured() {
            self.leave(host);
        }
    }

    /// Forwards a pointer delta while captured. Returns `true` if forwarded.
    pub fn on_pointer_delta(&self, dx: f64, dy: f64, navigator: &mut SphericalNavigator) -> bool {
        if !self.is_captured() {
            return false;
        }
        navigator.look(dx, dy);
        true
    }

    /// Release capture if still held; used when the view is torn down.
    pub fn teardown(&mut self, host: &mut dyn CaptureHost) {
        if self.is_captured() {
            host.release_capture();
            self.leave(host);
        }
    }

    fn enter(&mut self, host: &mut dyn CaptureHost) {
        self.state = CaptureState::Captured;
        host.set_cursor(Cursor::Hidden);
        debug!("pointer captured");
    }

    fn leave(&mut self, host: &mut dyn CaptureHost) {
        self.state = CaptureState::Released;
        host.set_cursor(Cursor::Grab);
        debug!("pointer released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct FakeHost {
        deny: bool,
        requests: usize,
        releases: usize,
        cursor: Option<Cursor>,
    }

    impl CaptureHost for FakeHost {
        fn request_capture(&mut self) -> Result<(), CaptureError> {
            self.requests += 1;
            if self.deny {
                Err(CaptureError::Denied("no user gesture".into()))
            } else {
                Ok(())
            }
        }

        fn release_capture(&mut self) {
            self.releases += 1;
        }

        fn set_cursor(&mut self, cursor: Cursor) {
            self.cursor = Some(cursor);
        }
    }

    #[test]
    fn primary_click_captures_and_hides_cursor() {
        let mut host = FakeHost::default();
        let mut ctl = PointerCaptureController::new();
        assert_eq!(ctl.on_click(PointerButton::Primary, &mut host), CaptureState::Captured);
        assert_eq!(host.cursor, Some(Cursor::Hidden));

        // Already captured: no second request.
        ctl.on_click(PointerButton::Primary, &mut host);
        assert_eq!(host.requests, 1);
    }

    #[test]
    fn other_buttons_are_ignored() {
        let mut host = FakeHost::default();
        let mut ctl = PointerCaptureController::new();
        assert_eq!(ctl.on_click(PointerButton::Secondary, &mut host), CaptureState::Released);
        assert_eq!(host.requests, 0);
    }

    #[test]
    fn denied_request_stays_released_without_retry() {
        let mut host = FakeHost {
            deny: true,
            ..FakeHost::default()
        };
        let mut ctl = PointerCaptureController::new();
        assert_eq!(ctl.on_click(PointerButton::Primary, &mut host), CaptureState::Released);
        assert_eq!(host.requests, 1);
        assert_eq!(host.cursor, None);
    }

    #[test]
    fn escape_and_q_release() {
        for key in [Key::Escape, Key::Q] {
            let mut host = FakeHost::default();
            let mut ctl = PointerCaptureController::new();
            ctl.on_click(PointerButton::Primary, &mut host);
            assert!(!ctl.on_key_down(Key::W, &mut host));
            assert!(ctl.on_key_down(key, &mut host));
            assert_eq!(ctl.state(), CaptureState::Released);
            assert_eq!(host.releases, 1);
            assert_eq!(host.cursor, Some(Cursor::Grab));
        }
    }

    #[test]
    fn external_loss_releases_without_calling_host() {
        let mut host = FakeHost::default();
        let mut ctl = PointerCaptureController::new();
        ctl.on_click(PointerButton::Primary, &mut host);
        ctl.on_capture_lost(&mut host);
        assert_eq!(ctl.state(), CaptureState::Released);
        assert_eq!(host.releases, 0);
    }

    #[test]
    fn deltas_forwarded_only_while_captured() {
        let mut host = FakeHost::default();
        let mut ctl = PointerCaptureController::new();
        let mut nav = SphericalNavigator::default();
        let yaw0 = nav.yaw_rad();

        assert!(!ctl.on_pointer_delta(50.0, 0.0, &mut nav));
        assert_eq!(nav.yaw_rad(), yaw0);

        ctl.on_click(PointerButton::Primary, &mut host);
        assert!(ctl.on_pointer_delta(50.0, 0.0, &mut nav));
        assert!(nav.yaw_rad() < yaw0);

        ctl.on_key_down(Key::Escape, &mut host);
        let yaw1 = nav.yaw_rad();
        assert!(!ctl.on_pointer_delta(50.0, 0.0, &mut nav));
        assert_eq!(nav.yaw_rad(), yaw1);
    }

    #[test]
    fn teardown_releases_held_capture() {
        let mut host = FakeHost::default();
        let mut ctl = PointerCaptureController::new();
        ctl.teardown(&mut host);
        assert_eq!(host.releases, 0);
        ctl.on_click(PointerButton::Primary, &mut host);
        ctl.teardown(&mut host);
        assert_eq!(host.releases, 1);
        assert!(!ctl.is_captured());
    }
}
