//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one
//! structured line to the logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::time::hour_minute;

/// Adapter that logs every [`AppEvent`] to the serial console.
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
            AppEvent::Started { restored, events } => {
                info!(
                    "START | config={} | events={}",
                    if *restored { "stored" } else { "defaults" },
                    events
                );
            }
            AppEvent::DayChanged { date, solar: Some(s) } => {
                let (rh, rm) = hour_minute(s.sunrise_std);
                let (sh, sm) = hour_minute(s.sunset_std);
                let (dh, dm) = hour_minute(s.sunrise_civil);
                let (kh, km) = hour_minute(s.sunset_civil);
                info!(
                    "DAY   | {} | sunrise={:02}:{:02} sunset={:02}:{:02} | \
                     dawn={:02}:{:02} dusk={:02}:{:02} | day={}min visible={}min",
                    date, rh, rm, sh, sm, dh, dm, kh, km, s.day_length, s.visible_length
                );
            }
            AppEvent::DayChanged { date, solar: None } => {
                info!("DAY   | {} | solar times unavailable", date);
            }
            AppEvent::ScheduleApplied { minute, commands } => {
                let (h, m) = hour_minute(*minute);
                info!("SCHED | {:02}:{:02} | commands={}", h, m, commands);
            }
            AppEvent::DoorMotion { from, to } => {
                info!("DOOR  | {} -> {}", from, to);
            }
            AppEvent::ClockUnset => {
                warn!("CLOCK | unset, schedule suspended");
            }
            AppEvent::ClockRestored => {
                info!("CLOCK | valid");
            }
            AppEvent::Fault(e) => {
                warn!("FAULT | {}", e);
            }
            AppEvent::ConfigSaved => {
                info!("CONF  | saved");
            }
        }
    }
}
