#![forbid(unsafe_code)]

//! The engine façade.
//!
//! A [`Binder`] owns the two pieces of shared engine state — the mapper
//! registry and the deferred task queue — and hands out [`Tie`]s through
//! one entry point per binding mode. It is a cheap handle: clone it freely,
//! all clones share the same registry and queue.
//!
//! ```
//! use tether::Binder;
//! use tether_core::Node;
//!
//! let binder = Binder::new();
//! let scope = Node::scope();
//! scope.set("title", "hello");
//!
//! let label = Node::nested();
//! label.attach_to(&scope);
//!
//! binder.read(&label).assign("text", "title").unwrap();
//! assert_eq!(label.get("text").unwrap().as_str(), Some("hello"));
//! ```

use std::rc::Rc;

use tether_core::{Node, TaskQueue};

use crate::mapper::MapperRegistry;
use crate::strategy::Mode;
use crate::tie::Tie;

/// Shared engine context and the home of the four directive entry points.
#[derive(Clone, Debug)]
pub struct Binder {
    mappers: Rc<MapperRegistry>,
    queue: TaskQueue,
}

impl Binder {
    /// A binder with its own private task queue.
    #[must_use]
    pub fn new() -> Self {
        Binder::with_queue(TaskQueue::new())
    }

    /// A binder posting deferred retries to an existing queue, for hosts
    /// that already own an event loop.
    #[must_use]
    pub fn with_queue(queue: TaskQueue) -> Self {
        Binder {
            mappers: Rc::new(MapperRegistry::new()),
            queue,
        }
    }

    /// The registry directive mapper specs are resolved against.
    #[must_use]
    pub fn mappers(&self) -> &MapperRegistry {
        &self.mappers
    }

    /// The queue deferred resolution retries are posted to.
    #[must_use]
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Run all pending deferred retries now.
    pub fn drain(&self) {
        self.queue.drain();
    }

    fn tie(&self, mode: Mode, target: &Node) -> Tie {
        Tie::new(
            mode,
            target.clone(),
            Rc::clone(&self.mappers),
            self.queue.clone(),
        )
    }

    /// One-shot pull into `target` ([`Mode::Get`]).
    #[must_use]
    pub fn get(&self, target: &Node) -> Tie {
        self.tie(Mode::Get, target)
    }

    /// One-shot push out of `target` ([`Mode::Set`]).
    #[must_use]
    pub fn set(&self, target: &Node) -> Tie {
        self.tie(Mode::Set, target)
    }

    /// Live flow target → source with the backward transform
    /// ([`Mode::Write`]).
    #[must_use]
    pub fn write(&self, target: &Node) -> Tie {
        self.tie(Mode::Write, target)
    }

    /// Live flow source → target with the forward transform
    /// ([`Mode::Read`]).
    #[must_use]
    pub fn read(&self, target: &Node) -> Tie {
        self.tie(Mode::Read, target)
    }

    /// Live two-way flow ([`Mode::Bind`]).
    #[must_use]
    pub fn bind(&self, target: &Node) -> Tie {
        self.tie(Mode::Bind, target)
    }
}

impl Default for Binder {
    fn default() -> Self {
        Binder::new()
    }
}
