//! HC-SR04 on Raspberry Pi GPIO (rppal).
//!
//! The echo pin gets a single async interrupt on both edges for its whole
//! lifetime. `watch`/`cancel` never touch the interrupt registration; they
//! only move the [`ArmedEdge`] filter the interrupt callback checks.
use std::sync::Arc;

use rppal::gpio::{Gpio, InputPin, OutputPin, Trigger};
use sonar_traits::{Edge, EdgeSink, EdgeSource, Level, TriggerPin};
use tracing::{debug, trace};

use crate::armed::ArmedEdge;
use crate::error::{HwError, Result};

fn gpio_err(e: rppal::gpio::Error) -> HwError {
    HwError::Gpio(e.to_string())
}

/// Claim the trigger (output) and echo (input) pins.
pub fn open(
    trigger_pin: u8,
    echo_pin: u8,
) -> Result<(GpioEdgeSource, GpioTrigger, EchoListener)> {
    let gpio = Gpio::new().map_err(gpio_err)?;
    let trigger = gpio.get(trigger_pin).map_err(gpio_err)?.into_output_low();
    let echo = gpio.get(echo_pin).map_err(gpio_err)?.into_input();
    let armed = Arc::new(ArmedEdge::new());
    debug!(trigger_pin, echo_pin, "hc-sr04 pins claimed");
    Ok((
        GpioEdgeSource {
            armed: armed.clone(),
        },
        GpioTrigger { pin: trigger },
        EchoListener {
            pin: echo,
            armed,
            attached: false,
        },
    ))
}

pub struct GpioEdgeSource {
    armed: Arc<ArmedEdge>,
}

impl EdgeSource for GpioEdgeSource {
    fn watch(
        &mut self,
        edge: Edge,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed.arm(edge);
        Ok(())
    }

    fn cancel(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.armed.disarm();
        Ok(())
    }
}

pub struct GpioTrigger {
    pin: OutputPin,
}

impl TriggerPin for GpioTrigger {
    fn set_level(
        &mut self,
        level: Level,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match level {
            Level::High => self.pin.set_high(),
            Level::Low => self.pin.set_low(),
        }
        Ok(())
    }
}

/// Owns the echo pin and its interrupt. Keep it alive for as long as
/// the engine is polled; dropping it stops edge delivery.
pub struct EchoListener {
    pin: InputPin,
    armed: Arc<ArmedEdge>,
    attached: bool,
}

impl EchoListener {
    /// Start forwarding armed edges to `sink`.
    pub fn attach(&mut self, sink: Arc<dyn EdgeSink>) -> Result<()> {
        if self.attached {
            return Err(HwError::AlreadyAttached);
        }
        let armed = self.armed.clone();
        self.pin
            .set_async_interrupt(Trigger::Both, move |level| {
                let edge = match level {
                    rppal::gpio::Level::High => Edge::Rising,
                    rppal::gpio::Level::Low => Edge::Falling,
                };
                if armed.fire(edge) {
                    sink.notify(edge);
                } else {
                    trace!(?edge, "unarmed echo edge");
                }
            })
            .map_err(gpio_err)?;
        self.attached = true;
        Ok(())
    }
}

impl Drop for EchoListener {
    fn drop(&mut self) {
        if self.attached
            && let Err(e) = self.pin.clear_async_interrupt()
        {
            tracing::warn!(error = %e, "failed to clear echo interrupt");
        }
    }
}
