// Copyright 2026 the Lithos Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Weak, linearized observer registries.
//!
//! An [`ObserverMultiplexer`] holds observers by [`Weak`] reference so that
//! registering never extends an observer's lifetime. Notifications are
//! delivered to live observers in registration order, one notification at a
//! time across all threads. The delivery lock is reentrant: an observer may
//! trigger another notification on the same multiplexer from within its
//! callback.

use core::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};

/// A registry of observers of type `O` (usually a `dyn Trait`).
pub struct ObserverMultiplexer<O: ?Sized> {
    observers: Mutex<Vec<Weak<O>>>,
    delivery: ReentrantMutex<()>,
}

impl<O: ?Sized> ObserverMultiplexer<O> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            delivery: ReentrantMutex::new(()),
        }
    }

    /// Adds `observer` after every existing one.
    ///
    /// Registering the same observer twice is a no-op.
    pub fn register(&self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer);
        let mut observers = self.observers.lock();
        if !observers.iter().any(|w| Weak::ptr_eq(w, &weak)) {
            observers.push(weak);
        }
    }

    /// Removes `observer`. Unknown observers are ignored.
    ///
    /// A notification already in flight on another thread may still reach
    /// it.
    pub fn unregister(&self, observer: &Arc<O>) {
        let weak = Arc::downgrade(observer);
        self.observers.lock().retain(|w| !Weak::ptr_eq(w, &weak));
    }

    /// Number of live observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers
            .lock()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Whether no live observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes `notify` on each live observer in registration order.
    ///
    /// Expired observers are pruned. The registry lock is not held while
    /// observers run, so callbacks may register or unregister.
    pub fn for_each(&self, mut notify: impl FnMut(&O)) {
        let _delivery = self.delivery.lock();
        let live: Vec<Arc<O>> = {
            let mut observers = self.observers.lock();
            observers.retain(|w| w.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for observer in &live {
            notify(observer);
        }
    }
}

impl<O: ?Sized> Default for ObserverMultiplexer<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ?Sized> fmt::Debug for ObserverMultiplexer<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverMultiplexer")
            .field("observers", &self.observers.lock().len())
            .finish_non_exhaustive()
    }
}
