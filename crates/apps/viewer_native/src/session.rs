//! One globe view: camera, time axis, readiness and overlays on a single
//! deterministic frame loop.

use std::fmt::Display;

use foundation::time::HourStamp;
use layers::{
    ImageryOverlay, Layer, LayerKey, LayerReadinessCoordinator, LayerStyle, LoadOutcome,
    LoadTicket, ReadinessChange,
};
use navigation::{
    CameraPose, CaptureHost, CaptureState, Key, PointerButton, PointerCaptureController,
    SphericalNavigator,
};
use runtime::event_bus::{Event, EventBus};
use runtime::frame::Frame;
use timeline::{Commit, PlaybackError, StepDirection, TimeAxisController};
use tracing::{debug, info};

use crate::config::ViewerConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    EngineReady(bool),
    Committed(Commit),
    Readiness(ReadinessChange),
    LoadFailed { layer: LayerKey, timestamp: HourStamp },
    Capture(CaptureState),
}

/// An overlay wants imagery for `ticket.timestamp`. The driver resolves it
/// and hands the result to [`GlobeSession::complete_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub layer: LayerKey,
    pub dataset: String,
    pub ticket: LoadTicket,
}

#[derive(Debug)]
struct MountedOverlay<T> {
    dataset: String,
    layer: ImageryOverlay<T>,
}

#[derive(Debug)]
pub struct GlobeSession<T> {
    frame: Frame,
    coordinator: LayerReadinessCoordinator,
    axis: TimeAxisController,
    navigator: SphericalNavigator,
    capture: PointerCaptureController,
    overlays: Vec<MountedOverlay<T>>,
    requests: Vec<LoadRequest>,
    events: EventBus<SessionEvent>,
}

impl<T> GlobeSession<T> {
    /// Builds the view and mounts every configured overlay. The engine starts
    /// out not ready; see [`set_engine_ready`](Self::set_engine_ready).
    pub fn new(config: &ViewerConfig) -> Self {
        let mut axis = TimeAxisController::new(config.timeline.clone());
        if let Some(initial) = &config.initial_timestamp {
            axis.sync_committed(initial);
        }
        let mut coordinator = LayerReadinessCoordinator::new(axis.committed());

        let mut overlays = Vec::with_capacity(config.overlays.len());
        for overlay in &config.overlays {
            let mut layer = ImageryOverlay::new(overlay.key.clone(), overlay.style);
            layer.mount(&mut coordinator);
            overlays.push(MountedOverlay {
                dataset: overlay.dataset.clone(),
                layer,
            });
        }

        let mut session = Self {
            frame: Frame::at_rate(config.frame_rate),
            coordinator,
            axis,
            navigator: SphericalNavigator::new(config.navigator.clone()),
            capture: PointerCaptureController::new(),
            overlays,
            requests: Vec::new(),
            events: EventBus::new(),
        };
        session.request_all(session.axis.committed());
        session.flush_readiness();
        session
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn camera(&self) -> &CameraPose {
        self.navigator.pose()
    }

    pub fn navigator(&self) -> &SphericalNavigator {
        &self.navigator
    }

    pub fn coordinator(&self) -> &LayerReadinessCoordinator {
        &self.coordinator
    }

    pub fn axis(&self) -> &TimeAxisController {
        &self.axis
    }

    pub fn all_ready(&self) -> bool {
        self.coordinator.all_ready()
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    /// The asset currently shown by `layer`, with the hour it belongs to.
    pub fn overlay_asset(&self, layer: &LayerKey) -> Option<(HourStamp, &T)> {
        self.overlay(layer).and_then(|o| o.layer.asset())
    }

    /// Style a renderer applies to the overlay's current asset.
    pub fn overlay_style(&self, layer: &LayerKey) -> Option<&LayerStyle> {
        self.overlay(layer).map(|o| o.layer.style())
    }

    pub fn set_engine_ready(&mut self, ready: bool) {
        if ready == self.coordinator.engine_ready() {
            return;
        }
        info!(ready, "engine readiness");
        self.coordinator.set_engine_ready(ready);
        self.events.emit(self.frame, SessionEvent::EngineReady(ready));
        // Readiness was cleared, so every layer has to confirm again.
        self.request_all(self.coordinator.timestamp());
        self.flush_readiness();
    }

    /// Advance one frame: due timers, camera movement, then the time axis
    /// gated on the aggregate readiness, then commits into the layers.
    pub fn tick(&mut self) -> Frame {
        self.frame = self.frame.next();
        self.navigator.update(self.frame.dt_s);
        self.axis.update(self.frame.time, self.coordinator.all_ready());
        for commit in self.axis.drain_commits() {
            self.apply_commit(commit);
        }
        self.flush_readiness();
        self.frame
    }

    /// Loads issued since the last call.
    pub fn take_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn complete_load<E: Display>(
        &mut self,
        request: &LoadRequest,
        result: Result<T, E>,
    ) -> LoadOutcome {
        let Some(index) = self
            .overlays
            .iter()
            .position(|o| o.layer.key() == &request.layer)
        else {
            debug!(layer = %request.layer, "load completed for unknown layer");
            return LoadOutcome::Superseded;
        };
        let outcome =
            self.overlays[index]
                .layer
                .complete(request.ticket, result, &mut self.coordinator);
        if outcome == LoadOutcome::Failed {
            self.events.emit(
                self.frame,
                SessionEvent::LoadFailed {
                    layer: request.layer.clone(),
                    timestamp: request.ticket.timestamp,
                },
            );
        }
        self.flush_readiness();
        outcome
    }

    pub fn key_down(&mut self, key: Key, host: &mut dyn CaptureHost) {
        if self.capture.on_key_down(key, host) {
            self.events.emit(self.frame, SessionEvent::Capture(self.capture.state()));
            return;
        }
        match key {
            Key::ArrowLeft => self.axis.step(StepDirection::Backward, self.frame.time),
            Key::ArrowRight => self.axis.step(StepDirection::Forward, self.frame.time),
            _ => self.navigator.key_down(key),
        }
    }

    pub fn key_up(&mut self, key: Key) {
        match key {
            Key::ArrowLeft | Key::ArrowRight => {
                self.axis.release_step();
                self.apply_pending_commits();
            }
            _ => self.navigator.key_up(key),
        }
    }

    /// Window focus lost: held keys would otherwise keep the camera moving.
    pub fn blur(&mut self, host: &mut dyn CaptureHost) {
        self.navigator.release_all_keys();
        self.capture_lost(host);
    }

    pub fn click(&mut self, button: PointerButton, host: &mut dyn CaptureHost) {
        let before = self.capture.state();
        let after = self.capture.on_click(button, host);
        if after != before {
            self.events.emit(self.frame, SessionEvent::Capture(after));
        }
    }

    pub fn capture_lost(&mut self, host: &mut dyn CaptureHost) {
        if self.capture.is_captured() {
            self.capture.on_capture_lost(host);
            self.events.emit(self.frame, SessionEvent::Capture(self.capture.state()));
        }
    }

    pub fn pointer_delta(&mut self, dx: f64, dy: f64) -> bool {
        self.capture.on_pointer_delta(dx, dy, &mut self.navigator)
    }

    pub fn scrub_to(&mut self, index: i64) {
        self.axis.scrub_to(index, self.frame.time);
    }

    pub fn toggle_autoplay(&mut self) -> Result<bool, PlaybackError> {
        self.axis
            .toggle_autoplay(self.frame.time, self.coordinator.all_ready())
    }

    /// Setter exposed to the playback UI.
    pub fn set_timestamp(&mut self, timestamp: HourStamp) {
        self.axis.commit_timestamp(timestamp);
        self.apply_pending_commits();
    }

    /// Events since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Event<SessionEvent>> {
        self.events.drain()
    }

    /// Cancels timers, releases capture and unmounts every overlay. In-flight
    /// loads complete as superseded afterwards.
    pub fn teardown(&mut self, host: &mut dyn CaptureHost) {
        self.axis.teardown();
        self.capture.teardown(host);
        for overlay in &mut self.overlays {
            overlay.layer.unmount(&mut self.coordinator);
        }
        self.requests.clear();
        self.flush_readiness();
        info!(frame = self.frame.index, "session torn down");
    }

    fn overlay(&self, key: &LayerKey) -> Option<&MountedOverlay<T>> {
        self.overlays.iter().find(|o| o.layer.key() == key)
    }

    fn apply_pending_commits(&mut self) {
        for commit in self.axis.drain_commits() {
            self.apply_commit(commit);
        }
        self.flush_readiness();
    }

    fn apply_commit(&mut self, commit: Commit) {
        info!(index = commit.index, timestamp = %commit.timestamp, "hour committed");
        self.coordinator.set_timestamp(commit.timestamp);
        self.events.emit(self.frame, SessionEvent::Committed(commit));
        self.request_all(commit.timestamp);
    }

    fn request_all(&mut self, timestamp: HourStamp) {
        for overlay in &mut self.overlays {
            if let Some(ticket) = overlay.layer.request(timestamp) {
                self.requests.retain(|r| r.layer != *overlay.layer.key());
                self.requests.push(LoadRequest {
                    layer: overlay.layer.key().clone(),
                    dataset: overlay.dataset.clone(),
                    ticket,
                });
            }
        }
    }

    fn flush_readiness(&mut self) {
        for change in self.coordinator.drain_changes() {
            self.events.emit(self.frame, SessionEvent::Readiness(change));
        }
    }
}
