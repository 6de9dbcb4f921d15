#![forbid(unsafe_code)]

//! Lazily evaluated, memoized values derived from [`Observable`] sources.
//!
//! A [`Computed<T>`] caches exactly one value: the result of its last
//! evaluation. Any change in a source observable marks the cell dirty; the
//! next read recomputes. When the cell itself has live subscribers, a source
//! change recomputes eagerly (once) and pushes the fresh value downstream, so
//! observers never need to poll.
//!
//! # Invariants
//!
//! 1. The compute closure never runs before the first read unless a
//!    subscriber is attached and a source changes.
//! 2. Reading a clean cell never re-runs the compute closure.
//! 3. `version()` counts evaluations: one per recompute, never more.
//! 4. Sources that `set()` an equal value do not dirty the cell (the
//!    observable suppresses the notification).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::observable::{Observable, Subscription};

type Listener<T> = Rc<dyn Fn(&T)>;
type ComputeFn<T> = Rc<dyn Fn() -> T>;

struct ComputedInner<T> {
    compute: ComputeFn<T>,
    cached: Option<T>,
    dirty: bool,
    version: u64,
    listeners: Vec<Weak<dyn Fn(&T)>>,
    /// Keeps the invalidation callbacks registered on the sources alive.
    sources: Vec<Subscription>,
}

/// A memoized value derived from one or more observables.
///
/// Cloning a `Computed` yields another handle to the same cache.
pub struct Computed<T> {
    inner: Rc<RefCell<ComputedInner<T>>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cell = self.inner.borrow();
        f.debug_struct("Computed")
            .field("cached", &cell.cached)
            .field("dirty", &cell.dirty)
            .field("evaluations", &cell.version)
            .finish()
    }
}

impl<T: Clone + 'static> Computed<T> {
    fn with_compute(compute: ComputeFn<T>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ComputedInner {
                compute,
                cached: None,
                dirty: true,
                version: 0,
                listeners: Vec::new(),
                sources: Vec::new(),
            })),
        }
    }

    fn watch<S: Clone + PartialEq + 'static>(&self, source: &Observable<S>) {
        let weak = Rc::downgrade(&self.inner);
        let sub = source.subscribe(move |_: &S| {
            if let Some(inner) = weak.upgrade() {
                Computed { inner }.invalidate();
            }
        });
        self.inner.borrow_mut().sources.push(sub);
    }

    /// Derive a value from a single observable.
    pub fn from_observable<S>(source: &Observable<S>, f: impl Fn(&S) -> T + 'static) -> Self
    where
        S: Clone + PartialEq + 'static,
    {
        let src = source.clone();
        let computed = Self::with_compute(Rc::new(move || src.with(|s| f(s))));
        computed.watch(source);
        computed
    }

    /// Derive a value from two observables.
    pub fn from2<A, B>(
        a: &Observable<A>,
        b: &Observable<B>,
        f: impl Fn(&A, &B) -> T + 'static,
    ) -> Self
    where
        A: Clone + PartialEq + 'static,
        B: Clone + PartialEq + 'static,
    {
        let (src_a, src_b) = (a.clone(), b.clone());
        let computed =
            Self::with_compute(Rc::new(move || src_a.with(|va| src_b.with(|vb| f(va, vb)))));
        computed.watch(a);
        computed.watch(b);
        computed
    }

    /// Derive a value from three observables.
    pub fn from3<A, B, C>(
        a: &Observable<A>,
        b: &Observable<B>,
        c: &Observable<C>,
        f: impl Fn(&A, &B, &C) -> T + 'static,
    ) -> Self
    where
        A: Clone + PartialEq + 'static,
        B: Clone + PartialEq + 'static,
        C: Clone + PartialEq + 'static,
    {
        let (src_a, src_b, src_c) = (a.clone(), b.clone(), c.clone());
        let computed = Self::with_compute(Rc::new(move || {
            src_a.with(|va| src_b.with(|vb| src_c.with(|vc| f(va, vb, vc))))
        }));
        computed.watch(a);
        computed.watch(b);
        computed.watch(c);
        computed
    }

    /// Current value, recomputing first if a source changed since the last
    /// evaluation.
    #[must_use]
    pub fn get(&self) -> T {
        {
            let inner = self.inner.borrow();
            if let (false, Some(value)) = (inner.dirty, &inner.cached) {
                return value.clone();
            }
        }
        self.recompute()
    }

    /// Run `f` on the current value. The value is cloned out of the cache
    /// (recomputing first if stale), so `f` may read this cell again.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.get();
        f(&value)
    }

    /// Number of evaluations performed so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Whether the next read will recompute.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner.borrow().dirty
    }

    /// Subscribe to recomputations triggered by source changes.
    ///
    /// While at least one subscription is alive the cell recomputes eagerly
    /// on every source change and hands the new value to each callback in
    /// registration order.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let strong: Listener<T> = Rc::new(listener);
        let mut cell = self.inner.borrow_mut();
        cell.listeners.retain(|weak| weak.strong_count() > 0);
        cell.listeners.push(Rc::downgrade(&strong));
        drop(cell);
        Subscription::from_guard(Box::new(strong))
    }

    /// Registered listeners, counting expired ones not yet swept.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn recompute(&self) -> T {
        // The closure may read other cells; no borrow is held while it runs.
        let compute = Rc::clone(&self.inner.borrow().compute);
        let value = compute();
        let mut inner = self.inner.borrow_mut();
        inner.cached = Some(value.clone());
        inner.dirty = false;
        inner.version += 1;
        trace!(version = inner.version, "computed cell re-evaluated");
        value
    }

    fn invalidate(&self) {
        let listeners: Vec<Listener<T>> = {
            let mut cell = self.inner.borrow_mut();
            cell.dirty = true;
            cell.listeners.retain(|weak| weak.strong_count() > 0);
            cell.listeners.iter().filter_map(Weak::upgrade).collect()
        };
        if !listeners.is_empty() {
            let value = self.recompute();
            listeners.iter().for_each(|listener| listener(&value));
        }
    }
}
