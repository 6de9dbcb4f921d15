#![forbid(unsafe_code)]

//! Reactive primitives for lingua.
//!
//! Provides [`Observable`] (a shared, version-tracked value with ordered
//! change notification) and [`Computed`] (a lazily evaluated, memoized value
//! derived from one or more observables).
//!
//! # Role in lingua
//! `lingua-i18n` keeps the active locale in an [`Observable`] and hands out
//! dictionary content as [`Computed`] cells keyed on the dictionary and the
//! effective locale. Everything here is single-threaded (`Rc`/`RefCell`) and
//! synchronous: notifications fire inline on the thread that mutates.

pub mod computed;
pub mod observable;

pub use computed::Computed;
pub use observable::{Observable, Subscription};
