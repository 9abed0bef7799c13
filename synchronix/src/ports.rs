//! Interface flavors for signal-based and call-based components.
//!
//! Interfaces come in two flavors and two roles:
//!
//! * the signal-based flavor exposes a message wire flow-controlled by an
//!   en/rdy handshake: [`SendIfc`] is the source (drives msg/en, samples rdy)
//!   and [`RecvIfc`] the sink (samples msg/en, drives rdy). A transfer occurs
//!   iff en and rdy are both asserted in the same tick;
//! * the call-based flavor exposes a guarded method: [`CalleeIfc`] is the sink
//!   (a registered guard/body pair) and [`CallerIfc`] the source (`ready()`
//!   and `call()`). The body may only run in a tick where the guard holds;
//!   attempting otherwise fails with [`GuardViolation`] and has no side
//!   effect.
//!
//! All interfaces are cheap, cloneable handles. Clones are shallow: connecting
//! one clone connects them all.
//!
//! # Declared wire access
//!
//! Update blocks access wires in whatever order elaboration fixed, so the
//! blocks that drive or sample an interface's wires must be declared on the
//! interface before it is connected (see [`SendIfc::declare_driver`] and
//! friends). When two signal interfaces are joined, these declarations yield
//! the ordering constraints that make payload wires propagate within the tick
//! and the rdy wire be sampled as of the start of the tick, one tick after it
//! was driven.

mod guarded;
mod signal_ifc;

pub use guarded::{CalleeIfc, CallerIfc, GuardViolation};
pub use signal_ifc::{RecvIfc, SendIfc};

pub(crate) use signal_ifc::join_signal_ifcs;
