use std::cell::RefCell;
use std::error::Error;
use std::fmt;
use std::rc::Rc;

use crate::schedule::MethodId;
use crate::signal::Message;
use crate::simulation::SimInit;

/// Error returned when a guarded method is invoked while its guard is false.
///
/// This is a contract error on the caller's side, not a recoverable
/// condition: the callee's body is not invoked and no state is modified by the
/// failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardViolation {
    method: String,
}

impl GuardViolation {
    pub(crate) fn new(method: &str) -> Self {
        Self {
            method: method.into(),
        }
    }

    /// Name of the method whose guard was violated.
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Display for GuardViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "guarded method '{}' was invoked while its guard was false",
            self.method
        )
    }
}

impl Error for GuardViolation {}

struct CalleeInner<T: Message> {
    name: String,
    method: MethodId,
    guard: Box<dyn Fn() -> bool>,
    body: RefCell<Box<dyn FnMut(T)>>,
}

/// Sink half of a call-based link: a registered guarded method.
///
/// A `CalleeIfc` pairs a guard predicate with a body. The body may only be
/// invoked in a tick where the guard evaluates true; [`call()`](Self::call)
/// enforces this. The interface is a cloneable shallow handle.
pub struct CalleeIfc<T: Message> {
    inner: Rc<CalleeInner<T>>,
}

impl<T: Message> CalleeIfc<T> {
    /// Registers a guarded method under `name`.
    pub fn new(
        bench: &mut SimInit,
        name: impl Into<String>,
        guard: impl Fn() -> bool + 'static,
        body: impl FnMut(T) + 'static,
    ) -> Self {
        let name = name.into();
        let method = bench.declare_method();

        Self {
            inner: Rc::new(CalleeInner {
                name,
                method,
                guard: Box::new(guard),
                body: RefCell::new(Box::new(body)),
            }),
        }
    }

    /// Evaluates the guard.
    pub fn ready(&self) -> bool {
        (self.inner.guard)()
    }

    /// Invokes the body if the guard holds.
    ///
    /// Fails with [`GuardViolation`] without any side effect otherwise.
    pub fn call(&self, msg: T) -> Result<(), GuardViolation> {
        if !self.ready() {
            return Err(GuardViolation::new(&self.inner.name));
        }
        (self.inner.body.borrow_mut())(msg);

        Ok(())
    }

    /// Returns the method's call-event identity for constraint declarations.
    pub fn method(&self) -> MethodId {
        self.inner.method
    }

    /// Returns the interface name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl<T: Message> Clone for CalleeIfc<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Message> fmt::Debug for CalleeIfc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalleeIfc")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

struct CallerInner<T: Message> {
    name: String,
    method: MethodId,
    target: RefCell<Option<CalleeIfc<T>>>,
}

/// Source half of a call-based link.
///
/// A `CallerIfc` is created unbound; connecting it to a [`CalleeIfc`] (via the
/// resolver or [`bind()`](Self::bind)) routes `ready()` and `call()` to the
/// callee's guard and body. An unbound caller is never ready. The interface is
/// a cloneable shallow handle.
pub struct CallerIfc<T: Message> {
    inner: Rc<CallerInner<T>>,
}

impl<T: Message> CallerIfc<T> {
    /// Creates an unbound caller interface named `name`.
    ///
    /// The caller carries its own call-event identity; binding it to a callee
    /// unifies the two identities so constraints declared against either side
    /// relate to the same event.
    pub fn new(bench: &mut SimInit, name: impl Into<String>) -> Self {
        let name = name.into();
        let method = bench.declare_method();

        Self {
            inner: Rc::new(CallerInner {
                name,
                method,
                target: RefCell::new(None),
            }),
        }
    }

    /// Binds this caller to a callee.
    pub fn bind(&self, bench: &mut SimInit, callee: &CalleeIfc<T>) {
        bench.alias_method(self.inner.method, callee.method());
        *self.inner.target.borrow_mut() = Some(callee.clone());
    }

    /// Evaluates the bound callee's guard; false if unbound.
    pub fn ready(&self) -> bool {
        self.inner
            .target
            .borrow()
            .as_ref()
            .is_some_and(|callee| callee.ready())
    }

    /// Invokes the bound callee if its guard holds.
    ///
    /// Fails with [`GuardViolation`] if the guard is false or the caller is
    /// unbound; no side effect occurs on a failed attempt.
    pub fn call(&self, msg: T) -> Result<(), GuardViolation> {
        let target = self.inner.target.borrow().clone();
        match target {
            Some(callee) => callee.call(msg),
            None => Err(GuardViolation::new(&self.inner.name)),
        }
    }

    /// Returns the call-event identity for constraint declarations.
    pub fn method(&self) -> MethodId {
        self.inner.method
    }

    /// Returns the interface name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl<T: Message> Clone for CallerIfc<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Message> fmt::Debug for CallerIfc<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerIfc")
            .field("name", &self.inner.name)
            .field("bound", &self.inner.target.borrow().is_some())
            .finish_non_exhaustive()
    }
}
