//! Per-timestamp completion tracking for overlay layers.
//!
//! The coordinator is the only place that answers "is the current frame fully
//! rendered". `all_ready` is recomputed synchronously after every mutation, so
//! any observer that reads it after a call sees the post-call state.

use std::collections::BTreeSet;

use foundation::time::HourStamp;
use tracing::{debug, trace};

use crate::layer::LayerKey;

/// An `all_ready` transition, tagged with the timestamp it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessChange {
    pub all_ready: bool,
    pub timestamp: HourStamp,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignalOutcome {
    Accepted,
    /// The signal named a timestamp other than the current one.
    Stale,
    /// The layer is not registered (already unmounted).
    Unregistered,
}

#[derive(Debug)]
pub struct LayerReadinessCoordinator {
    timestamp: HourStamp,
    engine_ready: bool,
    registered: BTreeSet<LayerKey>,
    ready: BTreeSet<LayerKey>,
    all_ready: bool,
    changes: Vec<ReadinessChange>,
}

impl LayerReadinessCoordinator {
    /// A coordinator for a scene whose engine has not finished initializing.
    pub fn new(timestamp: HourStamp) -> Self {
        Self {
            timestamp,
            engine_ready: false,
            registered: BTreeSet::new(),
            ready: BTreeSet::new(),
            all_ready: false,
            changes: Vec::new(),
        }
    }

    pub fn timestamp(&self) -> HourStamp {
        self.timestamp
    }

    pub fn all_ready(&self) -> bool {
        self.all_ready
    }

    pub fn engine_ready(&self) -> bool {
        self.engine_ready
    }

    pub fn is_registered(&self, key: &LayerKey) -> bool {
        self.registered.contains(key)
    }

    pub fn is_ready(&self, key: &LayerKey) -> bool {
        self.ready.contains(key)
    }

    pub fn registered(&self) -> impl Iterator<Item = &LayerKey> {
        self.registered.iter()
    }

    /// Layers still owing a readiness signal for the current timestamp.
    pub fn pending(&self) -> impl Iterator<Item = &LayerKey> {
        self.registered.difference(&self.ready)
    }

    pub fn register_layer(&mut self, key: LayerKey) {
        if self.registered.insert(key.clone()) {
            debug!(layer = %key, "layer registered");
        }
        self.recompute();
    }

    pub fn unregister_layer(&mut self, key: &LayerKey) {
        let was_registered = self.registered.remove(key);
        self.ready.remove(key);
        if was_registered {
            debug!(layer = %key, "layer unregistered");
        }
        self.recompute();
    }

    pub fn signal_ready(&mut self, timestamp: HourStamp, key: &LayerKey) -> SignalOutcome {
        if timestamp != self.timestamp {
            trace!(layer = %key, %timestamp, current = %self.timestamp, "stale readiness dropped");
            return SignalOutcome::Stale;
        }
        if !self.registered.contains(key) {
            trace!(layer = %key, "readiness from unregistered layer dropped");
            return SignalOutcome::Unregistered;
        }
        self.ready.insert(key.clone());
        self.recompute();
        SignalOutcome::Accepted
    }

    /// Move to a new timestamp. Every layer has to confirm again; returns
    /// `false` if `timestamp` is already current.
    pub fn set_timestamp(&mut self, timestamp: HourStamp) -> bool {
        if timestamp == self.timestamp {
            return false;
        }
        self.timestamp = timestamp;
        self.ready.clear();
        self.recompute();
        true
    }

    pub fn set_engine_ready(&mut self, engine_ready: bool) {
        if engine_ready == self.engine_ready {
            return;
        }
        self.engine_ready = engine_ready;
        self.ready.clear();
        self.recompute();
    }

    /// Transitions of `all_ready` since the last drain, oldest first.
    pub fn drain_changes(&mut self) -> Vec<ReadinessChange> {
        std::mem::take(&mut self.changes)
    }

    fn recompute(&mut self) {
        let next = self.engine_ready && self.registered.iter().all(|k| self.ready.contains(k));
        if next != self.all_ready {
            debug!(all_ready = next, timestamp = %self.timestamp, "readiness changed");
            self.changes.push(ReadinessChange {
                all_ready: next,
                timestamp: self.timestamp,
            });
        }
        self.all_ready = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stamp(s: &str) -> HourStamp {
        HourStamp::parse(s).unwrap()
    }

    fn key(s: &str) -> LayerKey {
        LayerKey::new(s)
    }

    fn live(ts: &str) -> LayerReadinessCoordinator {
        let mut c = LayerReadinessCoordinator::new(stamp(ts));
        c.set_engine_ready(true);
        c
    }

    #[test]
    fn empty_registry_is_ready_once_engine_is_up() {
        let mut c = LayerReadinessCoordinator::new(stamp("2012-10-22T00:00"));
        assert!(!c.all_ready());
        c.set_engine_ready(true);
        assert!(c.all_ready());
    }

    #[test]
    fn register_then_unregister_leaves_readiness_unchanged() {
        let mut c = live("2012-10-22T00:00");
        assert!(c.all_ready());
        c.register_layer(key("x"));
        assert!(!c.all_ready());
        c.unregister_layer(&key("x"));
        assert!(c.all_ready());

        let mut blocked = live("2012-10-22T00:00");
        blocked.register_layer(key("a"));
        assert!(!blocked.all_ready());
        blocked.register_layer(key("x"));
        blocked.unregister_layer(&key("x"));
        assert!(!blocked.all_ready());
    }

    #[test]
    fn register_is_idempotent() {
        let mut c = live("2012-10-22T00:00");
        c.register_layer(key("a"));
        c.register_layer(key("a"));
        assert_eq!(c.registered().count(), 1);
        c.signal_ready(stamp("2012-10-22T00:00"), &key("a"));
        assert!(c.all_ready());
    }

    #[test]
    fn stale_signal_never_marks_ready() {
        let t_old = stamp("2012-10-22T00:00");
        let t_new = stamp("2012-10-22T01:00");
        let mut c = live("2012-10-22T00:00");
        c.register_layer(key("x"));
        c.set_timestamp(t_new);
        assert_eq!(c.signal_ready(t_old, &key("x")), SignalOutcome::Stale);
        assert!(!c.is_ready(&key("x")));
        assert!(!c.all_ready());
    }

    #[test]
    fn signal_from_unknown_layer_is_dropped() {
        let t = stamp("2012-10-22T00:00");
        let mut c = live("2012-10-22T00:00");
        assert_eq!(c.signal_ready(t, &key("ghost")), SignalOutcome::Unregistered);
        assert!(!c.is_ready(&key("ghost")));
    }

    #[test]
    fn unregister_unblocks_waiting_scene() {
        let t = stamp("2012-10-22T00:00");
        let mut c = live("2012-10-22T00:00");
        c.register_layer(key("a"));
        c.register_layer(key("b"));
        c.signal_ready(t, &key("a"));
        assert_eq!(c.pending().cloned().collect::<Vec<_>>(), vec![key("b")]);
        c.unregister_layer(&key("b"));
        assert!(c.all_ready());
    }

    #[test]
    fn timestamp_change_resets_readiness() {
        let mut c = live("2012-10-22T00:00");
        c.register_layer(key("a"));
        c.signal_ready(stamp("2012-10-22T00:00"), &key("a"));
        assert!(c.all_ready());
        assert!(c.set_timestamp(stamp("2012-10-22T05:00")));
        assert!(!c.all_ready());
        assert!(!c.set_timestamp(stamp("2012-10-22T05:00")));
    }

    #[test]
    fn engine_flag_gates_readiness() {
        let t = stamp("2012-10-22T00:00");
        let mut c = LayerReadinessCoordinator::new(t);
        c.register_layer(key("a"));
        c.signal_ready(t, &key("a"));
        assert!(!c.all_ready());
        c.set_engine_ready(true);
        assert!(!c.all_ready(), "layers re-confirm after engine start");
        c.signal_ready(t, &key("a"));
        assert!(c.all_ready());
    }

    #[test]
    fn end_to_end_two_layers_two_timestamps() {
        let t0 = stamp("2012-10-22T00:00");
        let t1 = stamp("2012-10-22T01:00");
        let (a, b) = (key("A"), key("B"));
        let mut c = live("2012-10-22T00:00");
        c.register_layer(a.clone());
        c.register_layer(b.clone());
        c.drain_changes();

        c.signal_ready(t0, &a);
        assert!(!c.all_ready());
        c.signal_ready(t0, &b);
        assert!(c.all_ready());

        c.set_timestamp(t1);
        assert!(!c.all_ready());
        c.signal_ready(t1, &a);
        assert!(!c.all_ready());
        c.signal_ready(t1, &b);
        assert!(c.all_ready());

        assert_eq!(
            c.drain_changes(),
            vec![
                ReadinessChange { all_ready: true, timestamp: t0 },
                ReadinessChange { all_ready: false, timestamp: t1 },
                ReadinessChange { all_ready: true, timestamp: t1 },
            ]
        );
        assert!(c.drain_changes().is_empty());
    }
}
