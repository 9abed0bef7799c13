//! Automatic resolution of interface connections.
//!
//! [`connect()`] wires a producer endpoint to a consumer endpoint. Endpoints
//! are a closed tagged union over the four flavor/role combinations; an
//! exhaustive compatibility table decides the outcome:
//!
//! | producer       | consumer     | outcome                              |
//! |----------------|--------------|--------------------------------------|
//! | `SignalSource` | `SignalSink` | direct wire join                     |
//! | `CallSource`   | `CallSink`   | direct caller binding                |
//! | `CallSource`   | `SignalSink` | [`CallToSignal`] adapter inserted    |
//! | `SignalSource` | `CallSink`   | [`SignalToCall`] adapter inserted    |
//! | anything else  |              | [`ConnectionError::NoAdapter`]       |
//!
//! Automatically inserted adapters receive distinct, stable identities: a
//! per-parent, per-kind counter yields names of the form
//! `<parent>.<kind>_<index>`, so repeated insertions under the same parent
//! never collide and elaborate identically on every run.
//!
//! All resolution errors are configuration errors reported at elaboration
//! time, before the first tick.

use std::error::Error;
use std::fmt;

use crate::bridge::{CallToSignal, SignalToCall};
use crate::ports::{join_signal_ifcs, CalleeIfc, CallerIfc, RecvIfc, SendIfc};
use crate::signal::{Message, MessageTypeMismatch};
use crate::simulation::SimInit;

/// The kind of an automatically inserted adapter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    /// Push-to-wire adapter ([`CallToSignal`]).
    CallToSignal,
    /// Wire-to-pull adapter ([`SignalToCall`]).
    SignalToCall,
}

impl AdapterKind {
    fn label(self) -> &'static str {
        match self {
            Self::CallToSignal => "CallToSignal",
            Self::SignalToCall => "SignalToCall",
        }
    }
}

/// A connectable interface endpoint: one flavor, one role.
#[derive(Debug)]
pub enum Endpoint<T: Message> {
    /// Signal-based source (drives msg/en, samples rdy).
    SignalSource(SendIfc<T>),
    /// Signal-based sink (samples msg/en, drives rdy).
    SignalSink(RecvIfc<T>),
    /// Call-based source (a caller).
    CallSource(CallerIfc<T>),
    /// Call-based sink (a guarded method).
    CallSink(CalleeIfc<T>),
}

impl<T: Message> Endpoint<T> {
    fn tag(&self) -> &'static str {
        match self {
            Self::SignalSource(_) => "SignalSource",
            Self::SignalSink(_) => "SignalSink",
            Self::CallSource(_) => "CallSource",
            Self::CallSink(_) => "CallSink",
        }
    }
}

/// Error returned when two endpoints cannot be connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No adapter bridges the given flavor/role pair.
    NoAdapter {
        /// Tag of the producer endpoint.
        producer: &'static str,
        /// Tag of the consumer endpoint.
        consumer: &'static str,
    },
    /// The connected ports carry different message types.
    TypeMismatch(MessageTypeMismatch),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAdapter { producer, consumer } => write!(
                f,
                "no adapter bridges a {producer} producer to a {consumer} consumer"
            ),
            Self::TypeMismatch(mismatch) => mismatch.fmt(f),
        }
    }
}

impl Error for ConnectionError {}

impl From<MessageTypeMismatch> for ConnectionError {
    fn from(mismatch: MessageTypeMismatch) -> Self {
        Self::TypeMismatch(mismatch)
    }
}

/// Connects a producer endpoint to a consumer endpoint, inserting an adapter
/// when their flavors differ.
///
/// `parent` identifies the component under which an automatically inserted
/// adapter is registered; it scopes the per-kind insertion counter.
pub fn connect<T: Message>(
    bench: &mut SimInit,
    parent: &str,
    producer: Endpoint<T>,
    consumer: Endpoint<T>,
) -> Result<(), ConnectionError> {
    match (producer, consumer) {
        (Endpoint::SignalSource(source), Endpoint::SignalSink(sink)) => {
            join_signal_ifcs(bench, &source, &sink)?;

            Ok(())
        }
        (Endpoint::CallSource(caller), Endpoint::CallSink(callee)) => {
            caller.bind(bench, &callee);

            Ok(())
        }
        (Endpoint::CallSource(caller), Endpoint::SignalSink(sink)) => {
            let name = adapter_name(bench, parent, AdapterKind::CallToSignal);
            let adapter = CallToSignal::<T>::new(bench, &name);
            caller.bind(bench, adapter.recv());
            join_signal_ifcs(bench, adapter.send(), &sink)?;

            Ok(())
        }
        (Endpoint::SignalSource(source), Endpoint::CallSink(callee)) => {
            let name = adapter_name(bench, parent, AdapterKind::SignalToCall);
            let adapter = SignalToCall::<T>::new(bench, &name);
            join_signal_ifcs(bench, &source, adapter.recv())?;
            adapter.send().bind(bench, &callee);

            Ok(())
        }
        (producer, consumer) => Err(ConnectionError::NoAdapter {
            producer: producer.tag(),
            consumer: consumer.tag(),
        }),
    }
}

fn adapter_name(bench: &mut SimInit, parent: &str, kind: AdapterKind) -> String {
    let index = bench.adapter_index(parent, kind);

    format!("{parent}.{}_{index}", kind.label())
}
