//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events as single-line
//! records through the `log` facade.  Summaries are rendered as JSON.

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { trial, mode } => {
                info!("START | trial={trial} mode={mode:?}");
            }
            AppEvent::Tick(t) => {
                info!(
                    "TICK | #{} | T={:.2}\u{00b0}C | duty={:.2}% | lat={:.3}ms | P={:.3}W | {} @ {:.1}%",
                    t.tick, t.temperature_c, t.duty, t.latency_ms, t.power_w, t.stage, t.confidence_percent,
                );
            }
            AppEvent::StageChanged {
                from,
                to,
                confidence_percent,
            } => match from {
                Some(from) => info!("STAGE | {from} -> {to} ({confidence_percent:.1}%)"),
                None => info!("STAGE | -> {to} ({confidence_percent:.1}%)"),
            },
            AppEvent::SensorFault(e) => {
                warn!("SENSOR | {e}");
            }
            AppEvent::Summary(s) => match s.to_json() {
                Ok(json) => info!("SUMMARY | {json}"),
                Err(e) => error!("SUMMARY | could not serialise: {e}"),
            },
            AppEvent::Stopped { ticks } => {
                info!("STOP | ticks={ticks}");
            }
        }
    }
}
