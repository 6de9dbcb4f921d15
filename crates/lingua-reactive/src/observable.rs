#![forbid(unsafe_code)]

//! Shared mutable cells that announce their changes.
//!
//! An [`Observable<T>`] is the single source of truth for one piece of
//! state, such as the active locale or a dictionary being edited. Handles
//! are cheap clones of one `Rc`; writes that leave the value equal to what
//! it was are swallowed, so listeners only ever hear about real transitions.
//!
//! Listeners are held weakly. The [`Subscription`] returned by
//! [`Observable::subscribe`] owns the only strong reference, and dropping it
//! is how a listener detaches. Expired entries are swept on the next
//! delivery or the next `subscribe`, not at drop time.
//!
//! # Invariants
//!
//! 1. `version()` grows by exactly one per accepted change.
//! 2. Writing a value equal to the current one changes nothing and notifies
//!    nobody.
//! 3. Listeners run in subscription order.
//!
//! # Failure Modes
//!
//! - **Re-entrant borrow**: calling `with` and writing the same cell from
//!   inside the closure panics on the `RefCell`. Listeners are safe: they run
//!   after the borrow is released.
//! - **Expired-listener buildup**: at most one expired entry per dropped guard
//!   survives until the next `subscribe` or delivery.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{trace, trace_span};
use web_time::Instant;

type Listener<T> = Rc<dyn Fn(&T)>;

struct Slot<T> {
    value: T,
    version: u64,
    listeners: Vec<Weak<dyn Fn(&T)>>,
}

impl<T> Slot<T> {
    fn sweep(&mut self) {
        self.listeners.retain(|weak| weak.strong_count() > 0);
    }

    /// Sweep expired listeners and return strong handles to the rest.
    fn live_listeners(&mut self) -> Vec<Listener<T>> {
        self.sweep();
        self.listeners.iter().filter_map(Weak::upgrade).collect()
    }
}

/// A shared, versioned value with change notification.
///
/// `version()` starts at 0 and grows by one per accepted change. Listeners
/// run in the order they subscribed, after the new value is stored and with
/// no borrow held, so a listener may read (or even write) the cell.
pub struct Observable<T> {
    slot: Rc<RefCell<Slot<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slot = self.slot.borrow();
        f.debug_struct("Observable")
            .field("value", &slot.value)
            .field("version", &slot.version)
            .field("listeners", &slot.listeners.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// A cell holding `value` at version 0 with no listeners.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot {
                value,
                version: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// A clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.slot.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.slot.borrow().value)
    }

    /// Store `value`. Returns `false`, and notifies nobody, when it equals
    /// the current value.
    pub fn set(&self, value: T) -> bool {
        let accepted = {
            let mut slot = self.slot.borrow_mut();
            if slot.value == value {
                false
            } else {
                slot.value = value;
                slot.version += 1;
                true
            }
        };
        if accepted {
            self.deliver();
        }
        accepted
    }

    /// Edit the value in place. The edit counts as a change only if the
    /// result differs from the value before `f` ran.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    /// Register `listener`; it stays attached while the returned guard lives.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let strong: Listener<T> = Rc::new(listener);
        let mut slot = self.slot.borrow_mut();
        slot.sweep();
        slot.listeners.push(Rc::downgrade(&strong));
        drop(slot);
        Subscription::from_guard(Box::new(strong))
    }

    /// Number of accepted changes since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.slot.borrow().version
    }

    /// Registered listeners, counting expired ones not yet swept.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.slot.borrow().listeners.len()
    }

    fn deliver(&self) {
        let (listeners, value) = {
            let mut slot = self.slot.borrow_mut();
            let listeners = slot.live_listeners();
            if listeners.is_empty() {
                return;
            }
            (listeners, slot.value.clone())
        };

        let subscribers = listeners.len() as u64;
        let started = Instant::now();
        let _span = trace_span!("lingua.observable.notify", subscribers).entered();
        listeners.iter().for_each(|listener| listener(&value));
        trace!(
            elapsed_us = started.elapsed().as_micros() as u64,
            "change delivered"
        );
    }
}

/// Keeps a listener attached to an [`Observable`] or a
/// [`Computed`](crate::Computed). Drop it to detach.
#[must_use = "dropping a Subscription detaches its listener immediately"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    pub(crate) fn from_guard(guard: Box<dyn Any>) -> Self {
        Self { _guard: guard }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription(..)")
    }
}
