//! Adapters translating between call-based and signal-based interfaces.
//!
//! Both adapters forward at most one message per tick and keep no buffering
//! beyond a single pending-message slot. Their per-tick state is exclusively
//! owned by the instance and written only by its own update blocks, in the
//! declared order; the constraints below are the minimal set required for
//! correctness and are declared exactly, not merely "some" order that happens
//! to work.
//!
//! # Push-to-wire ([`CallToSignal`])
//!
//! Bridges a call-based producer into a signal-based consumer. On every tick:
//!
//! 1. `up_sample_ready` latches the downstream rdy wire (gated by reset); the
//!    latched value is the guard visible to the producer for the whole tick,
//!    so readiness is knowable before any call is attempted. The latch
//!    reflects the wire as of the start of the tick: readiness driven by the
//!    consumer on tick *t* admits a call on tick *t + 1*;
//! 2. the producer, if it calls, stores the message into the pending slot and
//!    marks the call; the wires are not driven yet;
//! 3. `up_drive_wires` drives en from the call mark and msg from the pending
//!    slot, then clears the mark.
//!
//! Declared constraints: `up_sample_ready` before the call event, and the call
//! event before `up_drive_wires`.
//!
//! # Wire-to-pull ([`SignalToCall`])
//!
//! Bridges a signal-based producer into a call-based consumer. On every tick:
//!
//! 1. `up_drive_ready` computes the downstream guard AND NOT reset and drives
//!    it onto the upstream rdy wire;
//! 2. `up_forward` invokes the downstream method with the sampled msg if the
//!    upstream asserted en (and reset is deasserted), recording the message;
//!    otherwise it records that no transfer happened this tick.
//!
//! Declared constraint: `up_drive_ready` strictly before `up_forward`—the
//! adapter both produces the guard value and is the sole caller gated by it.
//! An upstream that asserts en in a tick where the just-driven rdy was false
//! breaks the en/rdy handshake; the resulting guard violation is surfaced
//! immediately as a panic.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ports::{CalleeIfc, CallerIfc, RecvIfc, SendIfc};
use crate::schedule::SchedUnit;
use crate::signal::Message;
use crate::simulation::SimInit;
use crate::trace::{handshake_str, LineTrace};

struct PushState<T: Message> {
    pending: T,
    call_occurred: bool,
    latched_ready: bool,
}

/// Push-to-wire adapter: call-based producer into signal-based consumer.
pub struct CallToSignal<T: Message> {
    send: SendIfc<T>,
    recv: CalleeIfc<T>,
    state: Rc<RefCell<PushState<T>>>,
}

impl<T: Message> CallToSignal<T> {
    /// Creates the adapter and registers its update blocks and constraints
    /// under `name`.
    pub fn new(bench: &mut SimInit, name: &str) -> Self {
        let state = Rc::new(RefCell::new(PushState {
            pending: T::default(),
            call_occurred: false,
            latched_ready: false,
        }));
        let send = SendIfc::new(bench, format!("{name}.send"));
        let reset = bench.reset();

        let recv = CalleeIfc::new(
            bench,
            format!("{name}.recv"),
            {
                let state = state.clone();
                move || state.borrow().latched_ready
            },
            {
                let state = state.clone();
                move |msg: T| {
                    let mut state = state.borrow_mut();
                    state.pending = msg;
                    state.call_occurred = true;
                }
            },
        );

        let sample = bench.add_block(format!("{name}.up_sample_ready"), {
            let state = state.clone();
            let send = send.clone();
            let reset = reset.clone();
            move || {
                state.borrow_mut().latched_ready = send.rdy() && !reset.get();
            }
        });

        let drive = bench.add_block(format!("{name}.up_drive_wires"), {
            let state = state.clone();
            let send = send.clone();
            let reset = reset.clone();
            move || {
                let mut state = state.borrow_mut();
                send.set_en(state.call_occurred && !reset.get());
                send.set_msg(state.pending.clone());
                state.call_occurred = false;
            }
        });

        send.declare_ready_sampler(sample);
        send.declare_driver(drive);
        bench.add_constraint(
            SchedUnit::Block(sample),
            SchedUnit::Method(recv.method()),
        );
        bench.add_constraint(
            SchedUnit::Method(recv.method()),
            SchedUnit::Block(drive),
        );

        Self { send, recv, state }
    }

    /// The signal-based (downstream) interface.
    pub fn send(&self) -> &SendIfc<T> {
        &self.send
    }

    /// The call-based (upstream) interface.
    pub fn recv(&self) -> &CalleeIfc<T> {
        &self.recv
    }
}

impl<T: Message> fmt::Debug for CallToSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallToSignal")
            .field("send", &self.send)
            .field("recv", &self.recv)
            .finish_non_exhaustive()
    }
}

impl<T: Message> LineTrace for CallToSignal<T> {
    fn line_trace(&self) -> String {
        let state = self.state.borrow();
        format!(
            "{}(){}",
            handshake_str(&state.pending, state.call_occurred, state.latched_ready),
            self.send.line_trace()
        )
    }
}

struct PullState<T: Message> {
    last_forwarded: Option<T>,
    out_rdy: bool,
}

/// Wire-to-pull adapter: signal-based producer into call-based consumer.
pub struct SignalToCall<T: Message> {
    recv: RecvIfc<T>,
    send: CallerIfc<T>,
    state: Rc<RefCell<PullState<T>>>,
}

impl<T: Message> SignalToCall<T> {
    /// Creates the adapter and registers its update blocks and constraints
    /// under `name`.
    pub fn new(bench: &mut SimInit, name: &str) -> Self {
        let state = Rc::new(RefCell::new(PullState {
            last_forwarded: None,
            out_rdy: false,
        }));
        let recv = RecvIfc::<T>::new(bench, format!("{name}.recv"));
        let send = CallerIfc::new(bench, format!("{name}.send"));
        let reset = bench.reset();

        let drive_ready = bench.add_block(format!("{name}.up_drive_ready"), {
            let state = state.clone();
            let recv = recv.clone();
            let send = send.clone();
            let reset = reset.clone();
            move || {
                let out_rdy = send.ready() && !reset.get();
                state.borrow_mut().out_rdy = out_rdy;
                recv.set_rdy(out_rdy);
            }
        });

        let forward = bench.add_block(format!("{name}.up_forward"), {
            let state = state.clone();
            let recv = recv.clone();
            let send = send.clone();
            let reset = reset.clone();
            move || {
                state.borrow_mut().last_forwarded = None;
                if recv.en() && !reset.get() {
                    let msg = recv.msg();
                    if let Err(violation) = send.call(msg.clone()) {
                        // The upstream asserted en against a deasserted rdy.
                        panic!("en/rdy handshake broken by the upstream producer: {violation}");
                    }
                    state.borrow_mut().last_forwarded = Some(msg);
                }
            }
        });

        recv.declare_ready_driver(drive_ready);
        recv.declare_sampler(forward);
        bench.declare_call_site(drive_ready, send.method());
        bench.declare_call_site(forward, send.method());
        bench.add_block_constraint(drive_ready, forward);

        Self { recv, send, state }
    }

    /// The signal-based (upstream) interface.
    pub fn recv(&self) -> &RecvIfc<T> {
        &self.recv
    }

    /// The call-based (downstream) interface.
    pub fn send(&self) -> &CallerIfc<T> {
        &self.send
    }
}

impl<T: Message> fmt::Debug for SignalToCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalToCall")
            .field("recv", &self.recv)
            .field("send", &self.send)
            .finish_non_exhaustive()
    }
}

impl<T: Message> LineTrace for SignalToCall<T> {
    fn line_trace(&self) -> String {
        let state = self.state.borrow();
        let (msg, fired) = match &state.last_forwarded {
            Some(msg) => (msg.to_string(), true),
            None => ("-".to_string(), false),
        };
        format!(
            "{}(){}",
            self.recv.line_trace(),
            handshake_str(&msg, fired, state.out_rdy)
        )
    }
}
