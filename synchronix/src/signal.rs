//! Typed wires and the resolved-net registry.
//!
//! A [`Signal`] is a typed value slot backed by a *net*, the elaboration-time
//! notion of a group of electrically identical ports. Signal handles are
//! cheap, shallow clones: all clones read and write the same backing storage.
//! Signals have no behavior of their own beyond [`get()`](Signal::get) and
//! [`set()`](Signal::set); all sequencing correctness lives in the update
//! blocks that read and write them, in the order fixed at elaboration.
//!
//! Nets are allocated through
//! [`SimInit::signal()`](crate::simulation::SimInit::signal) and can be
//! electrically joined with
//! [`SimInit::join_nets()`](crate::simulation::SimInit::join_nets). Joining is
//! type-checked: nets carrying different message types cannot be merged and
//! fail elaboration with [`MessageTypeMismatch`].

use std::any::TypeId;
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use slab::Slab;

/// A message that can travel over a wire.
///
/// This trait is automatically implemented for any cloneable,
/// default-constructible type with a textual rendering.
pub trait Message: Clone + Default + fmt::Display + 'static {}

impl<T: Clone + Default + fmt::Display + 'static> Message for T {}

/// A zero-width, control-only message.
///
/// `Token` carries no payload; it exists so that pure control links can use
/// the same interfaces and adapters as data links. It renders as an empty
/// string in traces.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Token;

impl fmt::Display for Token {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

/// Stable identity of a backing wire, allocated at elaboration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetId(pub(crate) usize);

/// A typed, directional value slot backed by a resolved net.
///
/// Cloning a `Signal` produces a shallow copy: all clones share the same
/// backing storage. Values are default-initialized at creation and mutate only
/// through [`set()`](Signal::set).
pub struct Signal<T: Message> {
    value: Rc<RefCell<T>>,
    id: NetId,
}

impl<T: Message> Signal<T> {
    pub(crate) fn from_parts(value: Rc<RefCell<T>>, id: NetId) -> Self {
        Self { value, id }
    }

    /// Returns the current value.
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Overwrites the current value.
    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
    }

    /// Returns the identity of the backing net.
    pub fn id(&self) -> NetId {
        self.id
    }
}

impl<T: Message> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            id: self.id,
        }
    }
}

impl<T: Message> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id.0)
            .field("value", &self.value.borrow().to_string())
            .finish()
    }
}

/// Error returned when two nets carrying different message types are joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTypeMismatch {
    pub(crate) left: String,
    pub(crate) left_type: &'static str,
    pub(crate) right: String,
    pub(crate) right_type: &'static str,
}

impl fmt::Display for MessageTypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot join net '{}' (message type {}) to net '{}' (message type {})",
            self.left, self.left_type, self.right, self.right_type
        )
    }
}

impl Error for MessageTypeMismatch {}

/// The mapping of one logical signal onto its backing wire.
///
/// Joined nets form groups; every net of a group maps onto the group's single
/// backing wire, which is the net the others were rewired onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetBinding {
    /// Name of the logical signal.
    pub signal: String,
    /// Name of the backing wire the signal resolved to.
    pub wire: String,
}

struct NetEntry {
    name: String,
    type_id: TypeId,
    type_name: &'static str,
    render: Box<dyn Fn() -> String>,
    // Union-find link; `None` for a group representative (backing wire).
    parent: Cell<Option<usize>>,
}

/// Registry of all nets allocated during elaboration.
pub(crate) struct NetRegistry {
    entries: Slab<NetEntry>,
}

impl NetRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Slab::new(),
        }
    }

    /// Allocates a new net and returns a signal handle to its storage.
    pub(crate) fn register<T: Message>(&mut self, name: String) -> Signal<T> {
        let value = Rc::new(RefCell::new(T::default()));
        let render = {
            let value = value.clone();
            Box::new(move || value.borrow().to_string())
        };
        let id = self.entries.insert(NetEntry {
            name,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            render,
            parent: Cell::new(None),
        });

        Signal::from_parts(value, NetId(id))
    }

    fn find(&self, id: usize) -> usize {
        let mut root = id;
        while let Some(parent) = self.entries[root].parent.get() {
            root = parent;
        }
        // Path compression.
        let mut node = id;
        while let Some(parent) = self.entries[node].parent.get() {
            self.entries[node].parent.set(Some(root));
            node = parent;
        }

        root
    }

    /// Electrically joins two nets, making `onto` the backing wire of the
    /// merged group.
    pub(crate) fn join(&mut self, net: NetId, onto: NetId) -> Result<(), MessageTypeMismatch> {
        let left = self.find(net.0);
        let right = self.find(onto.0);
        if left == right {
            return Ok(());
        }
        if self.entries[left].type_id != self.entries[right].type_id {
            return Err(MessageTypeMismatch {
                left: self.entries[net.0].name.clone(),
                left_type: self.entries[left].type_name,
                right: self.entries[onto.0].name.clone(),
                right_type: self.entries[right].type_name,
            });
        }
        self.entries[left].parent.set(Some(right));

        Ok(())
    }

    /// Enumerates all nets, grouped logical signal onto backing wire.
    pub(crate) fn bindings(&self) -> Vec<NetBinding> {
        self.entries
            .iter()
            .map(|(id, entry)| NetBinding {
                signal: entry.name.clone(),
                wire: self.entries[self.find(id)].name.clone(),
            })
            .collect()
    }

    fn roots(&self) -> impl Iterator<Item = (&str, &NetEntry)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.parent.get().is_none())
            .map(|(_, entry)| (entry.name.as_str(), entry))
    }
}

impl fmt::Debug for NetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetRegistry")
            .field("nets", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Read-only view of the resolved nets, handed to per-tick observers.
///
/// The view iterates over backing wires only: a logical signal that was
/// rewired onto another net is observed through its group representative.
pub struct NetView<'a> {
    registry: &'a NetRegistry,
}

impl<'a> NetView<'a> {
    pub(crate) fn new(registry: &'a NetRegistry) -> Self {
        Self { registry }
    }

    /// Iterates over `(wire name, rendered value)` pairs for all backing
    /// wires, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, String)> + '_ {
        self.registry
            .roots()
            .map(|(name, entry)| (name, (entry.render)()))
    }
}

impl fmt::Debug for NetView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetView").finish_non_exhaustive()
    }
}
