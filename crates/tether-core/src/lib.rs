#![forbid(unsafe_code)]

//! Observable property store and node hierarchy for the tether binding engine.
//!
//! This crate provides the substrate the engine in `tether` binds over:
//!
//! - [`Value`]: the dynamic value model flowing through bindings.
//! - [`PropPath`]: an owned dotted property path used as the store key.
//! - [`Node`]: a shared, single-threaded object with observable properties,
//!   a structural parent link, an explicit source-override link, and
//!   lifetime-end hooks.
//! - [`CancelToken`]: explicit, idempotent cancellation for subscriptions.
//! - [`TaskQueue`]: the process-owned single-threaded queue deferred work is
//!   posted to.
//!
//! # Architecture
//!
//! `Node` uses `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Rc` slots with an active flag and are cleaned
//! up lazily during notification; cancel tokens hold only a `Weak` to the
//! flag so a token never extends a node's lifetime. Parent and override
//! links are weak for the same reason.
//!
//! # Invariants
//!
//! 1. Property subscribers fire synchronously, in registration order, in the
//!    call stack of the `set` that triggered them.
//! 2. `set` notifies on every write, including writes of an equal value.
//!    De-duplication, where wanted, is a subscriber concern.
//! 3. A cancelled subscriber never fires again once the cancelling call
//!    returns.
//! 4. Lifetime-end hooks run exactly once; ending a lifetime twice is a
//!    no-op, and a hook registered on an already-dead node runs immediately.
//! 5. A dead node ignores `set` and answers `get` with `None`.

pub mod node;
pub mod path;
pub mod queue;
pub mod value;

pub use node::{CancelToken, Node, NodeKind, WeakNode};
pub use path::PropPath;
pub use queue::TaskQueue;
pub use value::Value;
