//! Bench elaboration and tick-based simulation management.
//!
//! This module contains the [`SimInit`] bench builder and the [`Simulation`]
//! environment.
//!
//! # Bench lifecycle
//!
//! The lifecycle of a bench comprises the following stages:
//!
//! 1. instantiation of a [`SimInit`] builder,
//! 2. creation of wires, interfaces and adapters against the builder, and
//!    registration of update blocks, call sites and constraints,
//! 3. connection of endpoints, directly or through the
//!    [`resolver`](crate::resolver),
//! 4. elaboration with [`SimInit::init()`], which linearizes the declared
//!    constraint graph into the per-tick execution order,
//! 5. tick-based simulation on the resulting [`Simulation`].
//!
//! Everything is created during elaboration and nothing is destroyed or
//! resized afterwards: only wire values and component-private state mutate,
//! once per tick. All topology errors—ordering conflicts, flavor mismatches,
//! message-type mismatches—surface in steps 3 and 4, so the simulation itself
//! never encounters a topology surprise.

use std::collections::HashMap;
use std::fmt;

use crate::resolver::AdapterKind;
use crate::schedule::{
    BlockId, Constraint, ConstraintGraph, MethodId, OrderingConflictError, SchedUnit,
    ScheduledBlock,
};
use crate::signal::{Message, MessageTypeMismatch, NetBinding, NetId, NetRegistry, NetView, Signal};
use crate::trace::TickObserver;

/// Builder for a cycle-synchronous simulation bench.
pub struct SimInit {
    graph: ConstraintGraph,
    nets: NetRegistry,
    reset: Signal<bool>,
    adapter_counts: HashMap<(String, AdapterKind), usize>,
    observers: Vec<Box<dyn TickObserver>>,
}

impl SimInit {
    /// Creates an empty bench.
    ///
    /// The bench owns a single `reset` control wire, shared by all adapters
    /// created against it.
    pub fn new() -> Self {
        let mut nets = NetRegistry::new();
        let reset = nets.register("reset".into());

        Self {
            graph: ConstraintGraph::new(),
            nets,
            reset,
            adapter_counts: HashMap::new(),
            observers: Vec::new(),
        }
    }

    /// Allocates a new net and returns a signal handle to it.
    pub fn signal<T: Message>(&mut self, name: impl Into<String>) -> Signal<T> {
        self.nets.register(name.into())
    }

    /// Returns a handle to the bench-wide reset wire.
    pub fn reset(&self) -> Signal<bool> {
        self.reset.clone()
    }

    /// Registers an update block.
    ///
    /// The block runs to completion exactly once per tick, at the position the
    /// declared constraints admit. The label need not be unique; it is used
    /// for introspection and error reporting.
    pub fn add_block(&mut self, label: impl Into<String>, f: impl FnMut() + 'static) -> BlockId {
        self.graph.add_block(label.into(), Box::new(f))
    }

    /// Declares a "runs-before" relation between two schedulable units.
    pub fn add_constraint(&mut self, before: SchedUnit, after: SchedUnit) {
        self.graph.add_constraint(before, after);
    }

    /// Declares that `before` runs before `after` on every tick.
    pub fn add_block_constraint(&mut self, before: BlockId, after: BlockId) {
        self.graph
            .add_constraint(SchedUnit::Block(before), SchedUnit::Block(after));
    }

    /// Declares that `block` may evaluate the guard of, or invoke, the call
    /// event `method`.
    ///
    /// Constraints relating the event to other units expand onto all of its
    /// declared call sites at elaboration.
    pub fn declare_call_site(&mut self, block: BlockId, method: MethodId) {
        self.graph.add_call_site(block, method);
    }

    /// Electrically joins two nets, rewiring `net` onto `onto`.
    pub fn join_nets(&mut self, net: NetId, onto: NetId) -> Result<(), MessageTypeMismatch> {
        self.nets.join(net, onto)
    }

    /// Registers a per-tick observer, notified after each tick completes.
    pub fn observe(&mut self, observer: impl TickObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub(crate) fn declare_method(&mut self) -> MethodId {
        self.graph.declare_method()
    }

    pub(crate) fn alias_method(&mut self, method: MethodId, onto: MethodId) {
        self.graph.alias_method(method, onto);
    }

    /// Returns the next per-parent index for an automatically inserted adapter
    /// of the given kind.
    pub(crate) fn adapter_index(&mut self, parent: &str, kind: AdapterKind) -> usize {
        let count = self
            .adapter_counts
            .entry((parent.into(), kind))
            .or_insert(0);
        let index = *count;
        *count += 1;

        index
    }

    /// Elaborates the bench into a [`Simulation`].
    ///
    /// This linearizes the declared constraint graph into the per-tick
    /// execution order; a cycle fails with [`OrderingConflictError`] before
    /// the first tick.
    pub fn init(self) -> Result<Simulation, OrderingConflictError> {
        let (schedule, constraints) = self.graph.linearize()?;

        Ok(Simulation {
            schedule,
            constraints,
            nets: self.nets,
            reset: self.reset,
            observers: self.observers,
            tick_count: 0,
        })
    }
}

impl Default for SimInit {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SimInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimInit")
            .field("graph", &self.graph)
            .field("nets", &self.nets)
            .finish_non_exhaustive()
    }
}

/// Simulation environment.
///
/// A `Simulation` is created by calling [`SimInit::init()`] on a fully
/// assembled bench. It executes the elaborated update blocks in their cached
/// linear order, identically on every call to [`tick()`](Simulation::tick),
/// and exposes the bench topology to external consumers through
/// [`blocks()`](Simulation::blocks), [`constraints()`](Simulation::constraints)
/// and [`nets()`](Simulation::nets).
pub struct Simulation {
    schedule: Vec<ScheduledBlock>,
    constraints: Vec<Constraint>,
    nets: NetRegistry,
    reset: Signal<bool>,
    observers: Vec<Box<dyn TickObserver>>,
    tick_count: u64,
}

impl Simulation {
    /// Executes one tick: every update block runs to completion once, in the
    /// elaborated order, then all registered observers are notified.
    pub fn tick(&mut self) {
        for block in &mut self.schedule {
            (block.f)();
        }
        let view = NetView::new(&self.nets);
        for observer in &mut self.observers {
            observer.on_tick(self.tick_count, &view);
        }
        self.tick_count += 1;
    }

    /// Executes `n` ticks.
    pub fn tick_n(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    /// Number of ticks executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Drives the bench-wide reset wire.
    ///
    /// While reset is asserted, adapters suppress all forwarding: no guarded
    /// method is invoked and no en/rdy wire is asserted.
    pub fn set_reset(&mut self, asserted: bool) {
        self.reset.set(asserted);
    }

    /// Enumerates all update blocks in execution order, as `(id, label)`
    /// pairs.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &str)> {
        self.schedule
            .iter()
            .map(|block| (block.id, block.label.as_str()))
    }

    /// Returns the declared constraints, in declaration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Enumerates the resolved signal nets, grouped logical signal onto
    /// backing wire.
    pub fn nets(&self) -> Vec<NetBinding> {
        self.nets.bindings()
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("tick_count", &self.tick_count)
            .field("blocks", &self.schedule.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::bridge::{CallToSignal, SignalToCall};
    use crate::ports::{CalleeIfc, CallerIfc};
    use crate::resolver::{connect, Endpoint};
    use crate::trace::WaveBuffer;
    use crate::util::rng::Rng;

    // Assembles a full caller -> push-to-wire -> wire-to-pull -> callee bench
    // driven by a pseudo-random stimulus, and returns the per-tick waves.
    fn run_random_bench(seed: u64, ticks: u64) -> Vec<(String, Vec<String>)> {
        let mut bench = SimInit::new();

        let producer = CallerIfc::<u64>::new(&mut bench, "producer.out");
        let received = Rc::new(RefCell::new(Vec::new()));
        let consumer = CalleeIfc::new(&mut bench, "consumer.in", || true, {
            let received = received.clone();
            move |msg: u64| received.borrow_mut().push(msg)
        });

        let push = CallToSignal::<u64>::new(&mut bench, "top.push");
        let pull = SignalToCall::<u64>::new(&mut bench, "top.pull");

        // Pseudo-random producer: attempts a call with a pseudo-random payload
        // on roughly two ticks out of three.
        let stimulus = bench.add_block("producer.up_stimulus", {
            let out = producer.clone();
            let rng = Rng::new(seed);
            move || {
                if rng.gen_bounded(3) != 0 && out.ready() {
                    out.call(rng.gen()).unwrap();
                }
            }
        });
        bench.declare_call_site(stimulus, producer.method());

        connect(
            &mut bench,
            "top",
            Endpoint::CallSource(producer),
            Endpoint::CallSink(push.recv().clone()),
        )
        .unwrap();
        connect(
            &mut bench,
            "top",
            Endpoint::SignalSource(push.send().clone()),
            Endpoint::SignalSink(pull.recv().clone()),
        )
        .unwrap();
        connect(
            &mut bench,
            "top",
            Endpoint::CallSource(pull.send().clone()),
            Endpoint::CallSink(consumer),
        )
        .unwrap();

        let waves = WaveBuffer::new();
        bench.observe(waves.clone());

        let mut simu = bench.init().unwrap();
        simu.tick_n(ticks);

        waves.waves()
    }

    #[test]
    fn identical_stimulus_yields_identical_waves() {
        let first = run_random_bench(0xDEC0DE, 500);
        let second = run_random_bench(0xDEC0DE, 500);

        assert_eq!(first, second);
    }

    #[test]
    fn tick_count_advances() {
        let mut bench = SimInit::new();
        bench.add_block("noop", || {});
        let mut simu = bench.init().unwrap();

        simu.tick_n(3);
        assert_eq!(simu.tick_count(), 3);
    }
}
