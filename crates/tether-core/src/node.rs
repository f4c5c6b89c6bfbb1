#![forbid(unsafe_code)]

//! Observable nodes: the property store and hierarchy the engine binds over.
//!
//! A [`Node`] is a cheap `Rc` handle over single-threaded interior state:
//! a property map keyed by [`PropPath`], per-path subscriber lists, a weak
//! structural-parent link, a weak explicit source-override link, and a list
//! of lifetime-end hooks. One node plays both adapter roles from the
//! engine's point of view — property store and hierarchy member.
//!
//! # Subscription model
//!
//! [`Node::subscribe`] registers a callback that fires synchronously inside
//! every subsequent `set` of that path, equal value or not. The returned
//! [`CancelToken`] is cloneable and holds only a `Weak` reference to the
//! subscriber's active flag: dropping every token does *not* cancel, and a
//! token can never keep the node alive. Inactive subscribers are pruned
//! lazily during notification.
//!
//! # Lifetime
//!
//! The owner of a node ends its lifetime with [`Node::end_lifetime`], which
//! fires each registered hook exactly once and then clears all subscriber
//! and watcher state. A dead node swallows `set`, answers `get` with
//! `None`, and runs newly registered hooks immediately.
//!
//! # Failure Modes
//!
//! - Subscriber callback panics: propagates to the caller of `set`; later
//!   subscribers in that cycle do not fire.
//! - Nested `set` from inside a callback: permitted; no `RefCell` borrow is
//!   held across callback invocation.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use tracing::trace;

use crate::path::PropPath;
use crate::value::Value;

/// How a node participates in source resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Resolves only through an explicit source override; never walks the
    /// hierarchy and never acts as its own source.
    Plain,
    /// Defers to its structural parent when it has no explicit override.
    Nested,
    /// Resolution terminal: acts as its own source when nothing above it
    /// claims the binding (a top-level container or scope object).
    Scope,
}

/// Cancellation handle for a subscription or watch.
///
/// Cloneable; `cancel` is idempotent and explicit. The token holds only a
/// `Weak` reference, so it neither keeps the node alive nor is obligated to
/// be kept alive itself — dropping a token changes nothing.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    active: Weak<Cell<bool>>,
}

impl CancelToken {
    /// A token whose subscription is already gone (e.g. the node was dead
    /// at subscribe time). Cancelling it is a no-op.
    #[must_use]
    pub fn inert() -> Self {
        CancelToken { active: Weak::new() }
    }

    /// Deactivate the associated subscriber. Safe to call repeatedly.
    pub fn cancel(&self) {
        if let Some(flag) = self.active.upgrade() {
            flag.set(false);
        }
    }

    /// Whether the subscriber can still fire.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.upgrade().is_some_and(|flag| flag.get())
    }
}

struct PropSubscriber {
    active: Rc<Cell<bool>>,
    callback: Rc<dyn Fn(&Value)>,
}

struct OverrideWatcher {
    active: Rc<Cell<bool>>,
    callback: Rc<dyn Fn()>,
}

struct NodeInner {
    kind: NodeKind,
    alive: Cell<bool>,
    props: RefCell<AHashMap<PropPath, Value>>,
    subscribers: RefCell<AHashMap<PropPath, Vec<PropSubscriber>>>,
    override_watchers: RefCell<Vec<OverrideWatcher>>,
    parent: RefCell<Option<WeakNode>>,
    source_override: RefCell<Option<WeakNode>>,
    end_hooks: RefCell<Vec<Box<dyn FnOnce()>>>,
}

/// A shared, observable object with properties, hierarchy links, and a
/// finite lifetime. Cloning clones the handle, not the node.
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

/// Non-owning handle to a [`Node`].
#[derive(Clone, Default)]
pub struct WeakNode {
    inner: Weak<NodeInner>,
}

impl WeakNode {
    /// Recover the node if it is still referenced somewhere.
    #[must_use]
    pub fn upgrade(&self) -> Option<Node> {
        self.inner.upgrade().map(|inner| Node { inner })
    }
}

impl std::fmt::Debug for WeakNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakNode")
            .field("live", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Node {
    /// Create a node of the given kind.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Node {
            inner: Rc::new(NodeInner {
                kind,
                alive: Cell::new(true),
                props: RefCell::new(AHashMap::new()),
                subscribers: RefCell::new(AHashMap::new()),
                override_watchers: RefCell::new(Vec::new()),
                parent: RefCell::new(None),
                source_override: RefCell::new(None),
                end_hooks: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Shorthand for `Node::new(NodeKind::Plain)`.
    #[must_use]
    pub fn plain() -> Self {
        Node::new(NodeKind::Plain)
    }

    /// Shorthand for `Node::new(NodeKind::Nested)`.
    #[must_use]
    pub fn nested() -> Self {
        Node::new(NodeKind::Nested)
    }

    /// Shorthand for `Node::new(NodeKind::Scope)`.
    #[must_use]
    pub fn scope() -> Self {
        Node::new(NodeKind::Scope)
    }

    /// This node's resolution kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.inner.kind
    }

    /// Whether the node's lifetime has not yet ended.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }

    /// Downgrade to a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakNode {
        WeakNode {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Identity comparison (same underlying node).
    #[must_use]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------
    // Property store
    // ------------------------------------------------------------------

    /// Read a property. `None` when unset or when the node is dead.
    #[must_use]
    pub fn get(&self, path: impl Into<PropPath>) -> Option<Value> {
        if !self.inner.alive.get() {
            return None;
        }
        self.inner.props.borrow().get(&path.into()).cloned()
    }

    /// Write a property and notify that path's subscribers, in registration
    /// order, before returning. Equal values notify too. A dead node
    /// swallows the write silently.
    pub fn set(&self, path: impl Into<PropPath>, value: impl Into<Value>) {
        if !self.inner.alive.get() {
            return;
        }
        let path = path.into();
        let value = value.into();
        self.inner
            .props
            .borrow_mut()
            .insert(path.clone(), value.clone());
        self.notify_property(&path, &value);
    }

    /// Observe changes to one property path.
    ///
    /// The callback fires synchronously inside each future `set` of `path`.
    /// Subscribing to a dead node returns an inert token and never fires.
    pub fn subscribe(
        &self,
        path: impl Into<PropPath>,
        callback: impl Fn(&Value) + 'static,
    ) -> CancelToken {
        if !self.inner.alive.get() {
            return CancelToken::inert();
        }
        let active = Rc::new(Cell::new(true));
        let token = CancelToken {
            active: Rc::downgrade(&active),
        };
        self.inner
            .subscribers
            .borrow_mut()
            .entry(path.into())
            .or_default()
            .push(PropSubscriber {
                active,
                callback: Rc::new(callback),
            });
        token
    }

    fn notify_property(&self, path: &PropPath, value: &Value) {
        // Snapshot outside the borrow so callbacks may set() re-entrantly;
        // prune dead subscribers while we are here.
        let snapshot: Vec<(Rc<Cell<bool>>, Rc<dyn Fn(&Value)>)> = {
            let mut map = self.inner.subscribers.borrow_mut();
            let Some(list) = map.get_mut(path) else {
                return;
            };
            list.retain(|s| s.active.get());
            list.iter()
                .map(|s| (Rc::clone(&s.active), Rc::clone(&s.callback)))
                .collect()
        };
        for (active, callback) in snapshot {
            // Re-check: an earlier callback in this cycle may have cancelled
            // a later one.
            if active.get() {
                callback(value);
            }
        }
    }

    // ------------------------------------------------------------------
    // Hierarchy
    // ------------------------------------------------------------------

    /// The structural parent, if attached and still alive.
    #[must_use]
    pub fn structural_parent(&self) -> Option<Node> {
        self.inner
            .parent
            .borrow()
            .as_ref()
            .and_then(WeakNode::upgrade)
            .filter(Node::is_alive)
    }

    /// Attach this node under `parent`. The link is weak; the parent's
    /// lifetime is managed by its own owner.
    pub fn attach_to(&self, parent: &Node) {
        *self.inner.parent.borrow_mut() = Some(parent.downgrade());
    }

    /// Detach from the structural parent.
    pub fn detach(&self) {
        *self.inner.parent.borrow_mut() = None;
    }

    /// The explicit source override, if set and still alive.
    #[must_use]
    pub fn source_override(&self) -> Option<Node> {
        self.inner
            .source_override
            .borrow()
            .as_ref()
            .and_then(WeakNode::upgrade)
            .filter(Node::is_alive)
    }

    /// Set or clear the explicit source override and poke every override
    /// watcher. The override is held weakly.
    pub fn set_source_override(&self, source: Option<&Node>) {
        if !self.inner.alive.get() {
            return;
        }
        trace!(kind = ?self.inner.kind, set = source.is_some(), "source override changed");
        *self.inner.source_override.borrow_mut() = source.map(Node::downgrade);
        let snapshot: Vec<(Rc<Cell<bool>>, Rc<dyn Fn()>)> = {
            let mut watchers = self.inner.override_watchers.borrow_mut();
            watchers.retain(|w| w.active.get());
            watchers
                .iter()
                .map(|w| (Rc::clone(&w.active), Rc::clone(&w.callback)))
                .collect()
        };
        for (active, callback) in snapshot {
            if active.get() {
                callback();
            }
        }
    }

    /// Observe changes to the source override (set or cleared).
    pub fn watch_source_override(&self, callback: impl Fn() + 'static) -> CancelToken {
        if !self.inner.alive.get() {
            return CancelToken::inert();
        }
        let active = Rc::new(Cell::new(true));
        let token = CancelToken {
            active: Rc::downgrade(&active),
        };
        self.inner.override_watchers.borrow_mut().push(OverrideWatcher {
            active,
            callback: Rc::new(callback),
        });
        token
    }

    // ------------------------------------------------------------------
    // Lifetime
    // ------------------------------------------------------------------

    /// Run `callback` once when this node's lifetime ends. If the node is
    /// already dead the callback runs immediately.
    pub fn on_lifetime_end(&self, callback: impl FnOnce() + 'static) {
        if !self.inner.alive.get() {
            callback();
            return;
        }
        self.inner.end_hooks.borrow_mut().push(Box::new(callback));
    }

    /// End the node's lifetime: fire every registered hook exactly once,
    /// then drop all subscriber and watcher state. Idempotent.
    pub fn end_lifetime(&self) {
        if !self.inner.alive.replace(false) {
            return;
        }
        trace!(kind = ?self.inner.kind, "lifetime ended");
        let hooks: Vec<Box<dyn FnOnce()>> = self.inner.end_hooks.borrow_mut().drain(..).collect();
        for hook in hooks {
            hook();
        }
        self.inner.subscribers.borrow_mut().clear();
        self.inner.override_watchers.borrow_mut().clear();
        *self.inner.source_override.borrow_mut() = None;
        *self.inner.parent.borrow_mut() = None;
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.inner.kind)
            .field("alive", &self.inner.alive.get())
            .field("props", &self.inner.props.borrow().len())
            .finish()
    }
}
