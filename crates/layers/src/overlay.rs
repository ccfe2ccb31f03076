use std::fmt::Display;

use foundation::time::HourStamp;
use tracing::{debug, error};

use crate::layer::{Layer, LayerKey};
use crate::readiness::LayerReadinessCoordinator;
use crate::symbology::LayerStyle;

/// Identifies one load issued by an overlay. Only the most recent ticket of a
/// mounted overlay is current.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub timestamp: HourStamp,
    generation: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The asset replaced the previous one and readiness was signalled.
    Installed,
    /// The load failed; readiness was still signalled.
    Failed,
    /// A newer request (or an unmount) superseded this one. Nothing changed.
    Superseded,
}

/// A per-timestamp imagery overlay on the globe.
///
/// `T` is whatever the renderer uploads (encoded bytes, a texture handle...).
#[derive(Debug)]
pub struct ImageryOverlay<T> {
    key: LayerKey,
    style: LayerStyle,
    mounted: bool,
    generation: u64,
    active: Option<LoadTicket>,
    asset: Option<(HourStamp, T)>,
}

impl<T> ImageryOverlay<T> {
    pub fn new(key: LayerKey, style: LayerStyle) -> Self {
        Self {
            key,
            style,
            mounted: false,
            generation: 0,
            active: None,
            asset: None,
        }
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn mount(&mut self, coordinator: &mut LayerReadinessCoordinator) {
        self.mounted = true;
        coordinator.register_layer(self.key.clone());
    }

    /// Unregister and invalidate any load still in flight.
    pub fn unmount(&mut self, coordinator: &mut LayerReadinessCoordinator) {
        self.mounted = false;
        self.invalidate();
        self.asset = None;
        coordinator.unregister_layer(&self.key);
    }

    /// Start loading imagery for `timestamp`. Supersedes any earlier request.
    pub fn request(&mut self, timestamp: HourStamp) -> Option<LoadTicket> {
        if !self.mounted {
            return None;
        }
        self.generation = self.generation.wrapping_add(1);
        let ticket = LoadTicket {
            timestamp,
            generation: self.generation,
        };
        self.active = Some(ticket);
        Some(ticket)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.mounted && self.active == Some(ticket)
    }

    /// Feed the result of a load back in. Success and failure both signal
    /// readiness so one bad asset cannot stall playback.
    pub fn complete<E: Display>(
        &mut self,
        ticket: LoadTicket,
        result: Result<T, E>,
        coordinator: &mut LayerReadinessCoordinator,
    ) -> LoadOutcome {
        if !self.is_current(ticket) {
            debug!(layer = %self.key, timestamp = %ticket.timestamp, "superseded load discarded");
            return LoadOutcome::Superseded;
        }
        self.active = None;

        let outcome = match result {
            Ok(asset) => {
                self.asset = Some((ticket.timestamp, asset));
                LoadOutcome::Installed
            }
            Err(err) => {
                error!(layer = %self.key, timestamp = %ticket.timestamp, "failed to load overlay imagery: {err}");
                LoadOutcome::Failed
            }
        };
        coordinator.signal_ready(ticket.timestamp, &self.key);
        outcome
    }

    /// The installed asset and the timestamp it belongs to.
    pub fn asset(&self) -> Option<(HourStamp, &T)> {
        self.asset.as_ref().map(|(ts, a)| (*ts, a))
    }

    pub fn pending(&self) -> Option<LoadTicket> {
        self.active
    }

    fn invalidate(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.active = None;
    }
}

impl<T> Layer for ImageryOverlay<T> {
    fn key(&self) -> &LayerKey {
        &self.key
    }
}
