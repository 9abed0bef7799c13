//! A cycle-synchronous simulation kernel bridging signal-based and call-based
//! component models.
//!
//! Synchronix organizes a simulation into discrete *ticks*. Components expose
//! their behavior as *update blocks*, plain per-tick computations over shared
//! typed wires, and declare *constraints*—directed "runs-before" relations
//! between blocks and guarded-method call events. At elaboration, the declared
//! constraint graph is linearized once into a per-tick execution order; the
//! same order then runs identically on every tick. There is no preemption and
//! no real concurrency: correctness reduces entirely to the correctness of the
//! declared constraints.
//!
//! Two incompatible component styles can be wired together:
//!
//! * *signal-based* interfaces ([`ports::SendIfc`], [`ports::RecvIfc`]), where
//!   every quantity is a wire sampled once per tick and transfers are flow
//!   controlled by an en/rdy handshake: a message moves iff both bits are
//!   asserted in the same tick;
//! * *call-based* interfaces ([`ports::CallerIfc`], [`ports::CalleeIfc`]),
//!   where a consumer's readiness is a boolean *guard* and a producer invokes
//!   the consumer's method only in ticks where the guard holds.
//!
//! The [`bridge`] module provides the two adapters that translate between the
//! styles while forwarding at most one message per tick, and the [`resolver`]
//! module inserts the appropriate adapter automatically when two endpoints of
//! different flavors are connected.
//!
//! # Assembling and running a bench
//!
//! A bench is assembled on a [`SimInit`](simulation::SimInit) builder: wires
//! and interfaces are created against it, update blocks and constraints are
//! registered, endpoints are connected, and
//! [`init()`](simulation::SimInit::init) performs the one-time elaboration.
//! All topology errors—ordering conflicts, unresolvable flavor pairs,
//! mismatched message types—are reported by `init()`, before the first tick.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use synchronix::ports::{CallerIfc, RecvIfc};
//! use synchronix::resolver::{connect, Endpoint};
//! use synchronix::simulation::SimInit;
//!
//! let mut bench = SimInit::new();
//!
//! // A call-based producer pushing one value per tick while the guard holds.
//! let producer = CallerIfc::<u32>::new(&mut bench, "producer.out");
//! let backlog = Rc::new(RefCell::new(vec![5u32, 7, 11]));
//! let push_block = bench.add_block("producer.up_push", {
//!     let out = producer.clone();
//!     let backlog = backlog.clone();
//!     move || {
//!         let mut backlog = backlog.borrow_mut();
//!         if !backlog.is_empty() && out.ready() {
//!             let msg = backlog.remove(0);
//!             out.call(msg).unwrap();
//!         }
//!     }
//! });
//! bench.declare_call_site(push_block, producer.method());
//!
//! // A signal-based consumer, always ready.
//! let consumer = RecvIfc::<u32>::new(&mut bench, "consumer.in");
//!
//! // The flavors differ, so a push-to-wire adapter is inserted automatically.
//! connect(
//!     &mut bench,
//!     "top",
//!     Endpoint::CallSource(producer),
//!     Endpoint::SignalSink(consumer.clone()),
//! )
//! .unwrap();
//! consumer.set_rdy(true);
//!
//! let mut simu = bench.init().unwrap();
//! simu.tick();
//! assert!(consumer.en());
//! assert_eq!(consumer.msg(), 5);
//! ```
//!
//! # Observing a simulation
//!
//! External consumers never reach into component state. A
//! [`Simulation`](simulation::Simulation) exposes the elaborated update blocks
//! with their declared constraints and the resolved signal nets, and the [`trace`] module
//! provides a uniform per-tick textual rendering of any interface together
//! with a [`WaveBuffer`](trace::WaveBuffer) observer that records the value of
//! every net after each tick.

#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod bridge;
pub mod ports;
pub mod resolver;
pub mod schedule;
pub mod signal;
pub mod simulation;
pub mod trace;
pub(crate) mod util;
