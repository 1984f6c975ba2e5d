//! Coop door controller firmware entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SystemClock     LogEventSink    ConfigStore<NvsStorage>       │
//! │  (ClockPort)     (EventSink)     (ConfigPort)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  EventStore · Scheduler · Reducer · Applier            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  DeviceRegistry: Door FSM + LockActuator + Relays (GPIO)       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, InterruptType, Output, PinDriver, Pull};
use log::{error, info, warn};

use coopdoor::adapters::config_store::ConfigStore;
use coopdoor::adapters::log_sink::LogEventSink;
use coopdoor::adapters::nvs::NvsStorage;
use coopdoor::adapters::time::SystemClock;
use coopdoor::app::ports::ClockPort;
use coopdoor::app::service::AppService;
use coopdoor::config::PersistentConfig;
use coopdoor::devices::DeviceRegistry;
use coopdoor::door::Door;
use coopdoor::drivers::hbridge::HBridge;
use coopdoor::drivers::indicator::Colour;
use coopdoor::drivers::relay::Relay;
use coopdoor::events::{WAKE, WakeSource};
use coopdoor::pins;
use coopdoor::safety::LockActuator;

type Out = PinDriver<'static, AnyOutputPin, Output>;
type In = PinDriver<'static, AnyInputPin, Input>;

fn output(gpio: i32) -> Result<Out> {
    // SAFETY: each GPIO number is claimed exactly once, here at boot.
    let mut pin = PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?;
    pin.set_low()?;
    Ok(pin)
}

fn wake_input(gpio: i32, source: WakeSource) -> Result<In> {
    // SAFETY: as for `output`.
    let mut pin = PinDriver::input(unsafe { AnyInputPin::new(gpio) })?;
    pin.set_pull(Pull::Up)?;
    pin.set_interrupt_type(InterruptType::NegEdge)?;
    // SAFETY: the callback only touches the lock-free WAKE flags.
    unsafe { pin.subscribe(move || WAKE.raise(source))? };
    pin.enable_interrupt()?;
    Ok(pin)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("coopdoor v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut store = match NvsStorage::new() {
        Ok(nvs) => Some(ConfigStore::new(nvs)),
        Err(e) => {
            warn!("NVS unavailable ({e}), running with defaults and no persistence");
            None
        }
    };
    let (config, restored) = match &store {
        Some(s) => s.load_or_default(),
        None => (PersistentConfig::default(), false),
    };
    let loop_ms = config.system.control_loop_interval_ms;

    // ── 3. Outputs ────────────────────────────────────────────
    let motor = HBridge::new(
        output(pins::DOOR_INA_GPIO)?,
        output(pins::DOOR_INB_GPIO)?,
        output(pins::DOOR_EN_GPIO)?,
    );
    let lock = LockActuator::new(HBridge::new(
        output(pins::LOCK_INA_GPIO)?,
        output(pins::LOCK_INB_GPIO)?,
        output(pins::LOCK_EN_GPIO)?,
    ));
    let relays = [
        Relay::new(output(pins::RELAY_1_GPIO)?),
        Relay::new(output(pins::RELAY_2_GPIO)?),
    ];
    let door = Door::new(motor, lock, config.system.door_travel_ms);
    let devices = DeviceRegistry::new(door, relays);

    let mut led_red = output(pins::LED_RED_GPIO)?;
    let mut led_green = output(pins::LED_GREEN_GPIO)?;

    // ── 4. Wake sources ───────────────────────────────────────
    let mut wake_pins = [
        wake_input(pins::RTC_INT_GPIO, WakeSource::RtcAlarm)?,
        wake_input(pins::DOOR_BUTTON_GPIO, WakeSource::DoorButton)?,
        wake_input(pins::CONFIG_SWITCH_GPIO, WakeSource::ConfigSwitch)?,
    ];

    // ── 5. App service ────────────────────────────────────────
    let clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    let mut app = AppService::new(config, devices, restored);
    app.start(&mut sink);

    info!("System ready. Entering control loop ({loop_ms} ms).");

    // ── 6. Control loop ───────────────────────────────────────
    let mut last_alarm = None;
    loop {
        let wake = WAKE.take();
        if !wake.is_empty() {
            // esp-idf-hal disarms a GPIO interrupt after it fires.
            for pin in &mut wake_pins {
                if let Err(e) = pin.enable_interrupt() {
                    error!("wake re-arm failed: {e}");
                }
            }
            app.note_wake(wake);
        }

        app.tick(&clock, &mut sink);

        if let Some(s) = store.as_mut() {
            app.auto_save_if_needed(s, &mut sink);
        }

        let alarm = app.next_alarm();
        if alarm != last_alarm {
            // TODO: program the external RTC alarm register once the I2C RTC driver lands.
            if let Some((h, m)) = alarm {
                info!("next wake alarm {h:02}:{m:02}");
            }
            last_alarm = alarm;
        }

        let lit = app.status().indicator.output(clock.uptime_ms());
        led_red.set_level((lit == Some(Colour::Red)).into())?;
        led_green.set_level((lit == Some(Colour::Green)).into())?;

        FreeRtos::delay_ms(loop_ms);
    }
}
