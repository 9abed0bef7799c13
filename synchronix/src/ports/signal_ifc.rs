use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::schedule::BlockId;
use crate::signal::{Message, MessageTypeMismatch, NetId, Signal};
use crate::simulation::SimInit;
use crate::trace::{handshake_str, LineTrace};

// The wires of a signal-based interface together with the blocks declared to
// access them. Kept behind a shared `RefCell` so that joining two interfaces
// can rebind one side's wires onto the other's after handles were cloned.
struct Wires<T: Message> {
    msg: Signal<T>,
    en: Signal<bool>,
    rdy: Signal<bool>,
    // Blocks driving msg/en (source side) or sampling them (sink side).
    fwd_blocks: Vec<BlockId>,
    // Blocks sampling rdy (source side) or driving it (sink side).
    rev_blocks: Vec<BlockId>,
}

impl<T: Message> Wires<T> {
    fn new(bench: &mut SimInit, name: &str) -> Self {
        Self {
            msg: bench.signal(format!("{name}.msg")),
            en: bench.signal(format!("{name}.en")),
            rdy: bench.signal(format!("{name}.rdy")),
            fwd_blocks: Vec::new(),
            rev_blocks: Vec::new(),
        }
    }
}

/// Source half of a signal-based link.
///
/// A `SendIfc` drives the msg and en wires and samples the rdy wire. It is a
/// cloneable shallow handle.
pub struct SendIfc<T: Message> {
    wires: Rc<RefCell<Wires<T>>>,
    name: String,
}

impl<T: Message> SendIfc<T> {
    /// Creates a source interface, allocating its three nets under `name`.
    pub fn new(bench: &mut SimInit, name: impl Into<String>) -> Self {
        let name = name.into();
        let wires = Wires::new(bench, &name);

        Self {
            wires: Rc::new(RefCell::new(wires)),
            name,
        }
    }

    /// Drives the message wire.
    pub fn set_msg(&self, msg: T) {
        self.wires.borrow().msg.set(msg);
    }

    /// Drives the en wire.
    pub fn set_en(&self, en: bool) {
        self.wires.borrow().en.set(en);
    }

    /// Samples the rdy wire.
    pub fn rdy(&self) -> bool {
        self.wires.borrow().rdy.get()
    }

    /// Declares a block that drives msg/en on this interface.
    ///
    /// Must be called before the interface is connected.
    pub fn declare_driver(&self, block: BlockId) {
        self.wires.borrow_mut().fwd_blocks.push(block);
    }

    /// Declares a block that samples rdy on this interface.
    ///
    /// Must be called before the interface is connected.
    pub fn declare_ready_sampler(&self, block: BlockId) {
        self.wires.borrow_mut().rev_blocks.push(block);
    }

    /// Returns the interface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn net_ids(&self) -> (NetId, NetId, NetId) {
        let wires = self.wires.borrow();
        (wires.msg.id(), wires.en.id(), wires.rdy.id())
    }
}

impl<T: Message> Clone for SendIfc<T> {
    fn clone(&self) -> Self {
        Self {
            wires: self.wires.clone(),
            name: self.name.clone(),
        }
    }
}

impl<T: Message> fmt::Debug for SendIfc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendIfc")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T: Message> LineTrace for SendIfc<T> {
    fn line_trace(&self) -> String {
        let wires = self.wires.borrow();
        handshake_str(&wires.msg.get(), wires.en.get(), wires.rdy.get())
    }
}

/// Sink half of a signal-based link.
///
/// A `RecvIfc` samples the msg and en wires and drives the rdy wire. It is a
/// cloneable shallow handle.
pub struct RecvIfc<T: Message> {
    wires: Rc<RefCell<Wires<T>>>,
    name: String,
}

impl<T: Message> RecvIfc<T> {
    /// Creates a sink interface, allocating its three nets under `name`.
    pub fn new(bench: &mut SimInit, name: impl Into<String>) -> Self {
        let name = name.into();
        let wires = Wires::new(bench, &name);

        Self {
            wires: Rc::new(RefCell::new(wires)),
            name,
        }
    }

    /// Samples the message wire.
    pub fn msg(&self) -> T {
        self.wires.borrow().msg.get()
    }

    /// Samples the en wire.
    pub fn en(&self) -> bool {
        self.wires.borrow().en.get()
    }

    /// Drives the rdy wire.
    pub fn set_rdy(&self, rdy: bool) {
        self.wires.borrow().rdy.set(rdy);
    }

    /// Reads back the driven rdy wire.
    pub fn rdy(&self) -> bool {
        self.wires.borrow().rdy.get()
    }

    /// Declares a block that samples msg/en on this interface.
    ///
    /// Must be called before the interface is connected.
    pub fn declare_sampler(&self, block: BlockId) {
        self.wires.borrow_mut().fwd_blocks.push(block);
    }

    /// Declares a block that drives rdy on this interface.
    ///
    /// Must be called before the interface is connected.
    pub fn declare_ready_driver(&self, block: BlockId) {
        self.wires.borrow_mut().rev_blocks.push(block);
    }

    /// Returns the interface name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T: Message> Clone for RecvIfc<T> {
    fn clone(&self) -> Self {
        Self {
            wires: self.wires.clone(),
            name: self.name.clone(),
        }
    }
}

impl<T: Message> fmt::Debug for RecvIfc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecvIfc")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<T: Message> LineTrace for RecvIfc<T> {
    fn line_trace(&self) -> String {
        let wires = self.wires.borrow();
        handshake_str(&wires.msg.get(), wires.en.get(), wires.rdy.get())
    }
}

/// Electrically joins a source interface to a sink interface.
///
/// The sink's wires are rewired onto the source's nets and the declared wire
/// accesses of both sides are turned into ordering constraints: every msg/en
/// driver runs before every msg/en sampler (same-tick propagation), and every
/// rdy sampler runs before every rdy driver, so a sampled readiness reflects
/// the wire as of the start of the tick.
pub(crate) fn join_signal_ifcs<T: Message>(
    bench: &mut SimInit,
    source: &SendIfc<T>,
    sink: &RecvIfc<T>,
) -> Result<(), MessageTypeMismatch> {
    let (src_msg, src_en, src_rdy) = source.net_ids();
    {
        let sink_wires = sink.wires.borrow();
        bench.join_nets(sink_wires.msg.id(), src_msg)?;
        bench.join_nets(sink_wires.en.id(), src_en)?;
        bench.join_nets(sink_wires.rdy.id(), src_rdy)?;
    }

    let source_wires = source.wires.borrow();
    let mut sink_wires = sink.wires.borrow_mut();

    for &driver in &source_wires.fwd_blocks {
        for &sampler in &sink_wires.fwd_blocks {
            bench.add_block_constraint(driver, sampler);
        }
    }
    for &sampler in &source_wires.rev_blocks {
        for &driver in &sink_wires.rev_blocks {
            bench.add_block_constraint(sampler, driver);
        }
    }

    // Rebind the sink onto the source's storage; the sink keeps its declared
    // accesses in case it is enumerated again.
    sink_wires.msg = source_wires.msg.clone();
    sink_wires.en = source_wires.en.clone();
    sink_wires.rdy = source_wires.rdy.clone();

    Ok(())
}
