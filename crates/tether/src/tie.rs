#![forbid(unsafe_code)]

//! The binding directive: a [`Tie`] and its resolution state machine.
//!
//! A `Tie` owns a mode and a target node. Assigning a directive string
//! parses it, then tries to resolve a source and wire the strategy. The
//! state machine has two states, `Unresolved` → `Tied`, and the transition
//! happens at most once per `Tie`: once tied, every further trigger is a
//! no-op — no duplicate writes, no duplicate subscriptions.
//!
//! While unresolved, two retry triggers are armed:
//!
//! 1. a watch on the target's explicit source override (covers the
//!    override being set after the directive was assigned), and
//! 2. exactly one task posted to the engine's [`TaskQueue`] (covers the
//!    hierarchy not yet being attached at assignment time).
//!
//! If both fire and resolution still fails, the tie stays unresolved
//! indefinitely. That is an accepted outcome, not an error: trigger (1)
//! remains armed for as long as someone keeps the `Tie` alive.
//!
//! The override watch holds the tie weakly; the posted retry holds it
//! strongly until it runs. After tying, the `Tie` handle has no further
//! role — the wiring manages its own teardown through the endpoints'
//! lifetime-end hooks — and may be discarded.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace};

use tether_core::{CancelToken, Node, PropPath, TaskQueue};

use crate::directive::{self, DirectiveError};
use crate::mapper::{Mapper, MapperRegistry};
use crate::resolve::resolve_source;
use crate::strategy::{self, Mode};

struct TieInner {
    mode: Mode,
    target: Node,
    mappers: Rc<MapperRegistry>,
    queue: TaskQueue,
    tied: Cell<bool>,
    retry_watch: RefCell<Option<CancelToken>>,
    retry_posted: Cell<bool>,
}

/// A single binding directive bound to a mode and a target node.
///
/// Cloning clones the handle; all clones share one tied-state.
#[derive(Clone)]
pub struct Tie {
    inner: Rc<TieInner>,
}

impl Tie {
    pub(crate) fn new(
        mode: Mode,
        target: Node,
        mappers: Rc<MapperRegistry>,
        queue: TaskQueue,
    ) -> Self {
        Tie {
            inner: Rc::new(TieInner {
                mode,
                target,
                mappers,
                queue,
                tied: Cell::new(false),
                retry_watch: RefCell::new(None),
                retry_posted: Cell::new(false),
            }),
        }
    }

    /// The binding mode this directive carries.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.inner.mode
    }

    /// The directive's target node.
    #[must_use]
    pub fn target(&self) -> &Node {
        &self.inner.target
    }

    /// Whether the directive has been wired. Terminal: never reverts.
    #[must_use]
    pub fn is_tied(&self) -> bool {
        self.inner.tied.get()
    }

    /// Assign the directive: bind `target.left_key` per the directive's
    /// right-hand side.
    ///
    /// Parse errors surface immediately and nothing is armed or wired.
    /// An unresolved source is not an error — the tie defers and retries
    /// per the module docs.
    pub fn assign(
        &self,
        left_key: impl Into<PropPath>,
        raw_directive: &str,
    ) -> Result<(), DirectiveError> {
        let left_key = left_key.into();
        let (mapper, right_key) = directive::parse(raw_directive, &self.inner.mappers)?;

        self.try_tie(&left_key, &right_key, &mapper);
        if !self.is_tied() {
            self.arm_retries(left_key, right_key, mapper);
        }
        Ok(())
    }

    /// One resolution attempt. No-op once tied or once the target is dead.
    fn try_tie(&self, left_key: &PropPath, right_key: &PropPath, mapper: &Mapper) {
        let inner = &self.inner;
        if inner.tied.get() || !inner.target.is_alive() {
            return;
        }
        let Some(source) = resolve_source(&inner.target, right_key) else {
            trace!(mode = %inner.mode, right = %right_key, "source unresolved, deferring");
            return;
        };

        // Tied before wiring: a strategy's own writes may re-enter a
        // retry trigger, and that re-entry must see the terminal state.
        inner.tied.set(true);
        if let Some(token) = inner.retry_watch.borrow_mut().take() {
            token.cancel();
        }
        debug!(mode = %inner.mode, left = %left_key, right = %right_key, "tie resolved");
        strategy::wire(
            inner.mode,
            &inner.target,
            left_key,
            &source,
            right_key,
            mapper,
        );
    }

    fn arm_retries(&self, left_key: PropPath, right_key: PropPath, mapper: Mapper) {
        // Trigger 1: the target's source override changes. Weak — the
        // watch must not keep the tie (and through it the target) alive.
        let weak = Rc::downgrade(&self.inner);
        let (watch_left, watch_right, watch_mapper) =
            (left_key.clone(), right_key.clone(), mapper.clone());
        let token = self.inner.target.watch_source_override(move || {
            if let Some(inner) = weak.upgrade() {
                Tie { inner }.try_tie(&watch_left, &watch_right, &watch_mapper);
            }
        });
        if let Some(stale) = self.inner.retry_watch.borrow_mut().replace(token) {
            stale.cancel();
        }

        // Trigger 2: one deferred attempt, ever. The task holds the tie
        // strongly until it runs.
        if !self.inner.retry_posted.replace(true) {
            let tie = self.clone();
            self.inner.queue.post(move || {
                tie.try_tie(&left_key, &right_key, &mapper);
            });
        }
    }
}

impl std::fmt::Debug for Tie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tie")
            .field("mode", &self.inner.mode)
            .field("tied", &self.inner.tied.get())
            .field("retry_posted", &self.inner.retry_posted.get())
            .finish()
    }
}
