//! Passive per-tick observation of a bench.
//!
//! Observation never reaches into component state: observers read the
//! resolved nets after each tick, and interfaces and adapters render
//! themselves through the uniform handshake notation of [`handshake_str`].
//!
//! The textual contract is `"<msg>(<en-glyph><rdy-glyph>)"`, with the en
//! glyph `#` when en is asserted and the rdy glyph `>` when rdy is asserted,
//! giving three well-formed states:
//!
//! * `"5(#>)"`—fired: the message moved this tick;
//! * `"5( >)"`—ready but not fired;
//! * `"5(  )"`—not ready.
//!
//! (An asserted en against a deasserted rdy renders `"5(# )"` and indicates a
//! broken handshake upstream.)

use std::cell::RefCell;
use std::fmt;
use std::fmt::Write;
use std::rc::Rc;

use crate::signal::NetView;

/// Renders one tick of an en/rdy handshake.
pub fn handshake_str(msg: &impl fmt::Display, en: bool, rdy: bool) -> String {
    let en_glyph = if en { '#' } else { ' ' };
    let rdy_glyph = if rdy { '>' } else { ' ' };

    format!("{msg}({en_glyph}{rdy_glyph})")
}

/// Per-tick textual rendering of an interface or adapter.
pub trait LineTrace {
    /// Renders the current tick state.
    fn line_trace(&self) -> String;
}

/// A per-tick observer notified after every tick completes.
pub trait TickObserver {
    /// Called once per tick, after all update blocks have run.
    fn on_tick(&mut self, tick: u64, nets: &NetView<'_>);
}

struct WaveInner {
    // Wave history per backing wire, in first-observed order.
    waves: Vec<(String, Vec<String>)>,
}

/// An observer recording the rendered value of every backing wire after each
/// tick.
///
/// A `WaveBuffer` is a cloneable shallow handle: register one clone on the
/// bench with [`SimInit::observe()`](crate::simulation::SimInit::observe) and
/// keep another to read the recorded waves back.
pub struct WaveBuffer {
    inner: Rc<RefCell<WaveInner>>,
}

impl WaveBuffer {
    /// Creates an empty wave buffer.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(WaveInner { waves: Vec::new() })),
        }
    }

    /// Returns the recorded waves as `(wire name, per-tick values)` pairs.
    pub fn waves(&self) -> Vec<(String, Vec<String>)> {
        self.inner.borrow().waves.clone()
    }

    /// Renders the recorded waves as one line per wire.
    pub fn render(&self) -> String {
        let inner = self.inner.borrow();
        let width = inner
            .waves
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for (name, values) in &inner.waves {
            let _ = write!(out, "{name:width$} :");
            for value in values {
                let _ = write!(out, " {value}");
            }
            out.push('\n');
        }

        out
    }
}

impl TickObserver for WaveBuffer {
    fn on_tick(&mut self, _tick: u64, nets: &NetView<'_>) {
        let mut inner = self.inner.borrow_mut();
        for (index, (name, value)) in nets.iter().enumerate() {
            if inner.waves.len() <= index {
                inner.waves.push((name.to_string(), Vec::new()));
            }
            inner.waves[index].1.push(value);
        }
    }
}

impl Clone for WaveBuffer {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Default for WaveBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WaveBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveBuffer")
            .field("wires", &self.inner.borrow().waves.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_states() {
        assert_eq!(handshake_str(&5, true, true), "5(#>)");
        assert_eq!(handshake_str(&5, false, true), "5( >)");
        assert_eq!(handshake_str(&5, false, false), "5(  )");
    }

    #[test]
    fn wave_buffer_records_one_value_per_tick() {
        use crate::simulation::SimInit;

        let mut bench = SimInit::new();
        let counter = bench.signal::<u32>("counter");
        bench.add_block("up_count", {
            let counter = counter.clone();
            move || counter.set(counter.get() + 1)
        });

        let waves = WaveBuffer::new();
        bench.observe(waves.clone());

        let mut simu = bench.init().unwrap();
        simu.tick_n(3);

        let recorded = waves.waves();
        // The bench-wide reset wire is allocated first.
        assert_eq!(recorded[0].0, "reset");
        assert_eq!(
            recorded[1],
            (
                "counter".to_string(),
                vec!["1".to_string(), "2".to_string(), "3".to_string()]
            )
        );
    }
}
