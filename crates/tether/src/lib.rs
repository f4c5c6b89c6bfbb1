#![forbid(unsafe_code)]

//! Declarative two-object property binding.
//!
//! Attach a directive to a target node and the engine finds a cooperating
//! source through the node hierarchy, then wires a one-shot or live data
//! flow between one property on each side, optionally through a symmetric
//! forward/backward [`Mapper`]:
//!
//! ```
//! use tether::Binder;
//! use tether_core::Node;
//!
//! let binder = Binder::new();
//!
//! let model = Node::scope();
//! model.set("volume", 40);
//!
//! let slider = Node::nested();
//! slider.attach_to(&model);
//!
//! // Two-way: slider.value <-> model.volume.
//! binder.bind(&slider).assign("value", "volume").unwrap();
//! assert_eq!(slider.get("value").unwrap().as_int(), Some(40));
//!
//! slider.set("value", 55);
//! assert_eq!(model.get("volume").unwrap().as_int(), Some(55));
//! ```
//!
//! # Pieces
//!
//! - [`Binder`]: shared context, one entry point per [`Mode`].
//! - [`Tie`]: a single directive; resolves its source eagerly when it can
//!   and defers (override watch + one queued retry) when it cannot.
//! - [`Mapper`] / [`MapperRegistry`]: paired forward/backward transforms,
//!   composable from the dotted spec in a `spec@rightKey` directive.
//! - [`resolve::resolve_source`]: the hierarchy chain-of-responsibility.
//!
//! # Invariants
//!
//! 1. A tie wires at most once; `Tied` is terminal.
//! 2. An unresolved source is never an error; malformed directives always
//!    are, and they fail at assignment time.
//! 3. Wiring holds both endpoints weakly and tears itself down through
//!    their lifetime-end hooks; a binding lives exactly as long as both
//!    endpoints do.
//! 4. All propagation is synchronous and single-threaded; the one deferred
//!    retry runs when the host drains the binder's queue.

pub mod binder;
pub mod directive;
pub mod mapper;
pub mod resolve;
pub mod strategy;
pub mod tie;

pub use binder::Binder;
pub use directive::DirectiveError;
pub use mapper::{Mapper, MapperRegistry};
pub use strategy::Mode;
pub use tie::Tie;
