//! Update blocks and the declared constraint graph.
//!
//! An update block is a per-tick computation that runs to completion exactly
//! once per tick, with no suspension. Blocks are related by [`Constraint`]s,
//! directed "runs-before" relations between two schedulable units: another
//! block, or a guarded-method *call event*. Nothing may rely on incidental
//! execution order; the only guarantees are the declared ones.
//!
//! A call event stands for every evaluation of a method's guard and every
//! invocation of its body within a tick. Blocks that perform either are
//! declared as the event's *call sites* at elaboration
//! ([`SimInit::declare_call_site()`](crate::simulation::SimInit::declare_call_site));
//! when the graph is linearized, a constraint against a call event expands to
//! constraints against all of its call sites. Binding a caller interface to a
//! callee unifies their event identities, so the two sides of a link can
//! declare constraints independently.
//!
//! Linearization happens once, at elaboration: the expanded graph is
//! topologically sorted (deterministically, ties broken by block index) into
//! the per-tick execution order. A cycle means the declared constraints are
//! unsatisfiable and fails elaboration with [`OrderingConflictError`]; it is
//! never a runtime condition.

use std::collections::{BinaryHeap, HashMap, HashSet};
use std::error::Error;
use std::fmt;

use slab::Slab;

/// Identity of an update block, unique within a bench.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

/// Identity of a guarded-method call event, unique within a bench.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodId(pub(crate) usize);

/// A schedulable unit that a constraint may relate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SchedUnit {
    /// An update block.
    Block(BlockId),
    /// A guarded-method call event.
    Method(MethodId),
}

/// A declared "runs-before" relation between two schedulable units.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Constraint {
    /// Unit that must run first.
    pub before: SchedUnit,
    /// Unit that must run last.
    pub after: SchedUnit,
}

/// Error returned at elaboration when the declared constraints admit no valid
/// execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingConflictError {
    blocks: Vec<String>,
}

impl OrderingConflictError {
    /// Labels of the update blocks involved in the conflict.
    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }
}

impl fmt::Display for OrderingConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the declared constraints admit no valid execution order; blocks involved: {}",
            self.blocks.join(", ")
        )
    }
}

impl Error for OrderingConflictError {}

struct BlockEntry {
    label: String,
    f: Box<dyn FnMut()>,
}

struct MethodEntry {
    // Alias link set when a caller is bound to a callee; `None` for a
    // representative.
    parent: Option<usize>,
}

/// An update block scheduled for execution, in linearized form.
pub(crate) struct ScheduledBlock {
    pub(crate) id: BlockId,
    pub(crate) label: String,
    pub(crate) f: Box<dyn FnMut()>,
}

impl fmt::Debug for ScheduledBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledBlock")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// The declared constraint graph of a bench under elaboration.
pub(crate) struct ConstraintGraph {
    blocks: Slab<BlockEntry>,
    methods: Slab<MethodEntry>,
    constraints: Vec<Constraint>,
    call_sites: Vec<(MethodId, BlockId)>,
}

impl ConstraintGraph {
    pub(crate) fn new() -> Self {
        Self {
            blocks: Slab::new(),
            methods: Slab::new(),
            constraints: Vec::new(),
            call_sites: Vec::new(),
        }
    }

    pub(crate) fn add_block(&mut self, label: String, f: Box<dyn FnMut()>) -> BlockId {
        BlockId(self.blocks.insert(BlockEntry { label, f }))
    }

    pub(crate) fn declare_method(&mut self) -> MethodId {
        MethodId(self.methods.insert(MethodEntry { parent: None }))
    }

    pub(crate) fn alias_method(&mut self, method: MethodId, onto: MethodId) {
        let left = self.resolve(method);
        let right = self.resolve(onto);
        if left != right {
            self.methods[left.0].parent = Some(right.0);
        }
    }

    pub(crate) fn add_call_site(&mut self, block: BlockId, method: MethodId) {
        self.call_sites.push((method, block));
    }

    pub(crate) fn add_constraint(&mut self, before: SchedUnit, after: SchedUnit) {
        self.constraints.push(Constraint { before, after });
    }

    fn resolve(&self, method: MethodId) -> MethodId {
        let mut root = method.0;
        while let Some(parent) = self.methods[root].parent {
            root = parent;
        }

        MethodId(root)
    }

    fn sites(&self, method: MethodId) -> Vec<BlockId> {
        let root = self.resolve(method);
        self.call_sites
            .iter()
            .filter(|(m, _)| self.resolve(*m) == root)
            .map(|&(_, b)| b)
            .collect()
    }

    /// Expands call-event constraints onto their call sites and returns the
    /// resulting block-level edges, deduplicated.
    fn block_edges(&self) -> Vec<(BlockId, BlockId)> {
        let mut edges = HashSet::new();
        for constraint in &self.constraints {
            let before = match constraint.before {
                SchedUnit::Block(b) => vec![b],
                SchedUnit::Method(m) => self.sites(m),
            };
            let after = match constraint.after {
                SchedUnit::Block(b) => vec![b],
                SchedUnit::Method(m) => self.sites(m),
            };
            for &u in &before {
                for &v in &after {
                    // A block ordered relative to an event it itself hosts is
                    // trivially satisfied.
                    if u != v {
                        edges.insert((u, v));
                    }
                }
            }
        }
        let mut edges: Vec<_> = edges.into_iter().collect();
        edges.sort_unstable();

        edges
    }

    /// Linearizes the graph into one per-tick execution order.
    ///
    /// The sort is deterministic: among blocks whose predecessors have all
    /// been placed, the lowest block index goes first.
    pub(crate) fn linearize(
        mut self,
    ) -> Result<(Vec<ScheduledBlock>, Vec<Constraint>), OrderingConflictError> {
        let edges = self.block_edges();

        let mut successors: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        let mut in_degree: HashMap<BlockId, usize> = HashMap::new();
        for (id, _) in self.blocks.iter() {
            in_degree.insert(BlockId(id), 0);
        }
        for &(u, v) in &edges {
            successors.entry(u).or_default().push(v);
            *in_degree.entry(v).or_default() += 1;
        }

        let mut ready: BinaryHeap<std::cmp::Reverse<BlockId>> = in_degree
            .iter()
            .filter(|&(_, &d)| d == 0)
            .map(|(&b, _)| std::cmp::Reverse(b))
            .collect();

        let mut order = Vec::with_capacity(self.blocks.len());
        while let Some(std::cmp::Reverse(block)) = ready.pop() {
            order.push(block);
            if let Some(successors) = successors.get(&block) {
                for &succ in successors {
                    let degree = in_degree.get_mut(&succ).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(std::cmp::Reverse(succ));
                    }
                }
            }
        }

        if order.len() != self.blocks.len() {
            let placed: HashSet<BlockId> = order.into_iter().collect();
            let mut blocks: Vec<String> = self
                .blocks
                .iter()
                .filter(|(id, _)| !placed.contains(&BlockId(*id)))
                .map(|(_, entry)| entry.label.clone())
                .collect();
            blocks.sort();

            return Err(OrderingConflictError { blocks });
        }

        let schedule = order
            .into_iter()
            .map(|id| {
                let entry = self.blocks.remove(id.0);
                ScheduledBlock {
                    id,
                    label: entry.label,
                    f: entry.f,
                }
            })
            .collect();

        Ok((schedule, self.constraints))
    }
}

impl fmt::Debug for ConstraintGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintGraph")
            .field("blocks", &self.blocks.len())
            .field("methods", &self.methods.len())
            .field("constraints", &self.constraints.len())
            .finish_non_exhaustive()
    }
}
