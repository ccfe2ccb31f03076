use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use imagery::{ImageryCatalog, imagery_path};
use navigation::{CaptureError, CaptureHost, Cursor};
use runtime::event_bus::Event;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod session;

use config::ViewerConfig;
use session::{GlobeSession, LoadRequest, SessionEvent};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless globe session: autoplays the timeline over local imagery")]
struct Args {
    /// Viewer configuration (JSON); defaults apply to omitted fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding one sub-directory per dataset
    #[arg(long, env = "IMAGERY_ROOT", default_value = "public")]
    imagery_root: PathBuf,

    /// Starting hour, `YYYY-MM-DDTHH:mm` UTC
    #[arg(long)]
    from: Option<String>,

    /// Seconds each imagery load takes to resolve
    #[arg(long, default_value_t = 0.05)]
    load_latency: f64,

    /// Hard stop for the frame loop
    #[arg(long, default_value_t = 100_000)]
    max_frames: u64,
}

/// No pointer to capture when running headless.
struct HeadlessHost;

impl CaptureHost for HeadlessHost {
    fn request_capture(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::Unsupported)
    }

    fn release_capture(&mut self) {}

    fn set_cursor(&mut self, _cursor: Cursor) {}
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path).context("loading viewer config")?,
        None => ViewerConfig::default(),
    };
    if let Some(from) = args.from.clone() {
        config.initial_timestamp = Some(from);
    }

    let catalogs: BTreeMap<String, ImageryCatalog> = config
        .overlays
        .iter()
        .map(|o| (o.dataset.clone(), ImageryCatalog::new(args.imagery_root.join(&o.dataset))))
        .collect();

    let mut session: GlobeSession<Vec<u8>> = GlobeSession::new(&config);
    session.set_engine_ready(true);
    info!(
        from = %session.axis().committed(),
        hours = session.axis().total_hours(),
        overlays = config.overlays.len(),
        "session started"
    );

    let mut in_flight: VecDeque<(u64, LoadRequest)> = VecDeque::new();
    let mut playing = false;
    for _ in 0..args.max_frames {
        let frame = session.tick();
        for request in session.take_requests() {
            debug!(
                layer = %request.layer,
                url = %imagery_path(&request.dataset, request.ticket.timestamp),
                "load issued"
            );
            in_flight.push_back((frame.due_after(args.load_latency), request));
        }

        while in_flight.front().is_some_and(|(due, _)| *due <= frame.index) {
            let Some((_, request)) = in_flight.pop_front() else {
                break;
            };
            let result = fetch(&catalogs, &request).await;
            session.complete_load(&request, result);
        }

        if !playing && session.all_ready() {
            match session.toggle_autoplay() {
                Ok(running) => playing = running,
                Err(err) => {
                    info!("nothing to play: {err}");
                    break;
                }
            }
        }

        for event in session.drain_events() {
            log_event(&event);
        }

        if playing && !session.axis().is_autoplaying() {
            info!(frame = frame.index, at = %session.axis().committed(), "playback finished");
            break;
        }
    }

    session.teardown(&mut HeadlessHost);
    Ok(())
}

/// Imagery for `request`. A dataset without a catalog still resolves, as a
/// failure, so its layer reports ready.
async fn fetch(
    catalogs: &BTreeMap<String, ImageryCatalog>,
    request: &LoadRequest,
) -> Result<Vec<u8>, String> {
    let Some(catalog) = catalogs.get(&request.dataset) else {
        warn!(dataset = %request.dataset, "no catalog for dataset");
        return Err(format!("no catalog for dataset {}", request.dataset));
    };
    catalog
        .read(request.ticket.timestamp)
        .await
        .map_err(|err| err.to_string())
}

fn log_event(event: &Event<SessionEvent>) {
    let frame = event.frame_index;
    match &event.payload {
        SessionEvent::EngineReady(ready) => info!(frame, ready, "engine"),
        SessionEvent::Committed(commit) => {
            info!(frame, index = commit.index, "hour {}", commit.timestamp.pretty())
        }
        SessionEvent::Readiness(change) => {
            info!(frame, all_ready = change.all_ready, timestamp = %change.timestamp, "readiness")
        }
        SessionEvent::LoadFailed { layer, timestamp } => {
            warn!(frame, %layer, %timestamp, "imagery unavailable, continuing")
        }
        SessionEvent::Capture(state) => info!(frame, ?state, "pointer capture"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use layers::{LayerKey, LayerStyle};

    fn two_overlays() -> ViewerConfig {
        let overlay = |key: &str| OverlayConfig {
            key: LayerKey::new(key),
            dataset: key.to_string(),
            style: LayerStyle::default(),
        };
        ViewerConfig {
            overlays: vec![overlay("mapped"), overlay("orphan")],
            ..ViewerConfig::default()
        }
    }

    #[tokio::test]
    async fn uncatalogued_dataset_still_reaches_readiness() {
        let dir = tempfile::tempdir().unwrap();
        let catalogs = BTreeMap::from([(
            "mapped".to_string(),
            ImageryCatalog::new(dir.path().join("missing")),
        )]);

        let mut session: GlobeSession<Vec<u8>> = GlobeSession::new(&two_overlays());
        session.set_engine_ready(true);
        let requests = session.take_requests();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            let result = fetch(&catalogs, request).await;
            if request.dataset == "orphan" {
                assert_eq!(result, Err("no catalog for dataset orphan".to_string()));
            }
            session.complete_load(request, result);
        }
        assert!(session.all_ready());
    }
}
