#![forbid(unsafe_code)]

//! The binding-mode strategy table.
//!
//! Each [`Mode`] names one wiring strategy between a target/left endpoint
//! and a source/right endpoint. Dispatch is a single exhaustive `match`
//! over the closed enum — an unknown mode is unrepresentable, so the
//! "fail loudly on unknown tag" requirement is discharged at compile time.
//!
//! | Mode  | Wiring                       | Transform            |
//! |-------|------------------------------|----------------------|
//! | Get   | one-shot, source → target    | forward              |
//! | Set   | one-shot, target → source    | forward              |
//! | Write | live, target → source        | backward             |
//! | Read  | live, source → target        | forward              |
//! | Bind  | live, two-way                | forward and backward |
//!
//! `Set` and `Read` reuse the `Get`/`Write` machinery with the endpoint
//! roles swapped by the dispatcher.
//!
//! # Ownership and teardown
//!
//! Propagation closures hold only weak node handles: a binding never keeps
//! an endpoint alive. Every live subscription registers its cancel token on
//! the *counterpart* endpoint's lifetime-end hook (both endpoints, for
//! `Bind`), so wiring tears itself down when either side dies; the
//! subscribing side's own death drops the subscriber list directly.
//!
//! # Feedback
//!
//! `Bind` guards only the source → target direction: the callback tracks
//! the last source value it observed and skips repeats. The target → source
//! direction is deliberately unguarded; its echo re-arrives at the guard
//! carrying the round-tripped value and dies there. That asymmetry matches
//! the observed behavior this engine reproduces.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use tether_core::{Node, PropPath, Value};

use crate::mapper::{Mapper, Transform};

/// The five binding modes a directive can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// One-shot pull: copy source.right into target.left once.
    Get,
    /// One-shot push: copy target.left into source.right once.
    Set,
    /// Live push with the backward transform: target.left drives
    /// source.right.
    Write,
    /// Live pull with the forward transform: source.right drives
    /// target.left.
    Read,
    /// Live two-way: source drives target forward, target drives source
    /// backward, with repeat suppression on the source side.
    Bind,
}

impl Mode {
    /// Whether this mode leaves a live subscription behind.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Mode::Write | Mode::Read | Mode::Bind)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Get => "Get",
            Mode::Set => "Set",
            Mode::Write => "Write",
            Mode::Read => "Read",
            Mode::Bind => "Bind",
        };
        f.write_str(name)
    }
}

/// Wire `mode` between `target.left_key` and `source.right_key` through
/// `mapper`. Called exactly once per tied directive.
pub(crate) fn wire(
    mode: Mode,
    target: &Node,
    left_key: &PropPath,
    source: &Node,
    right_key: &PropPath,
    mapper: &Mapper,
) {
    debug!(%mode, left = %left_key, right = %right_key, "wiring binding");
    match mode {
        Mode::Get => pull_once(source, right_key, target, left_key, mapper),
        Mode::Set => pull_once(target, left_key, source, right_key, mapper),
        Mode::Write => push_live(
            target,
            left_key,
            source,
            right_key,
            mapper.backward_transform(),
        ),
        Mode::Read => push_live(
            source,
            right_key,
            target,
            left_key,
            mapper.forward_transform(),
        ),
        Mode::Bind => bind_live(target, left_key, source, right_key, mapper),
    }
}

/// One-shot copy: read `from.from_key`, map forward, write `into.into_key`.
/// A missing property or a declined transform skips the write.
fn pull_once(from: &Node, from_key: &PropPath, into: &Node, into_key: &PropPath, mapper: &Mapper) {
    if let Some(value) = from.get(from_key).and_then(|v| mapper.to(v)) {
        into.set(into_key, value);
    }
}

/// Continuous one-way flow: seed `into.into_key` from `from.from_key`
/// through `step`, then keep it updated on every change. The subscription
/// is cancelled when `into` dies.
fn push_live(from: &Node, from_key: &PropPath, into: &Node, into_key: &PropPath, step: Transform) {
    if let Some(value) = from.get(from_key).and_then(|v| step(v)) {
        into.set(into_key, value);
    }

    let weak_into = into.downgrade();
    let into_key = into_key.clone();
    let token = from.subscribe(from_key, move |value| {
        let Some(into) = weak_into.upgrade() else {
            return;
        };
        if let Some(value) = step(value.clone()) {
            into.set(&into_key, value);
        }
    });

    into.on_lifetime_end(move || {
        trace!("counterpart died, cancelling one-way subscription");
        token.cancel();
    });
}

/// Two-way flow between `target.left_key` and `source.right_key`. Seeds the
/// target from the source, then keeps both directions live; either
/// endpoint's death cancels both subscriptions.
fn bind_live(
    target: &Node,
    left_key: &PropPath,
    source: &Node,
    right_key: &PropPath,
    mapper: &Mapper,
) {
    if let Some(value) = source.get(right_key).and_then(|v| mapper.to(v)) {
        target.set(left_key, value);
    }

    // target → source, backward, unguarded.
    let weak_source = source.downgrade();
    let back = mapper.backward_transform();
    let right = right_key.clone();
    let forward_token = target.subscribe(left_key, move |value| {
        let Some(source) = weak_source.upgrade() else {
            return;
        };
        if let Some(value) = back(value.clone()) {
            source.set(&right, value);
        }
    });

    // source → target, forward, guarded against repeats of the last
    // observed source value.
    let weak_target = target.downgrade();
    let to = mapper.forward_transform();
    let left = left_key.clone();
    let last_seen: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
    let backward_token = source.subscribe(right_key, move |value| {
        {
            let mut last = last_seen.borrow_mut();
            if last.as_ref() == Some(value) {
                trace!("suppressing repeated source value");
                return;
            }
            *last = Some(value.clone());
        }
        let Some(target) = weak_target.upgrade() else {
            return;
        };
        if let Some(value) = to(value.clone()) {
            target.set(&left, value);
        }
    });

    for endpoint in [target, source] {
        let forward_token = forward_token.clone();
        let backward_token = backward_token.clone();
        endpoint.on_lifetime_end(move || {
            trace!("endpoint died, cancelling two-way subscriptions");
            forward_token.cancel();
            backward_token.cancel();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn scale() -> Mapper {
        Mapper::new(
            |v| v.as_f64().map(|x| Value::from(x * 2.0)),
            |v| v.as_f64().map(|x| Value::from(x / 2.0)),
        )
    }

    fn wired(mode: Mode, mapper: &Mapper) -> (Node, Node) {
        let target = Node::plain();
        let source = Node::plain();
        wire(
            mode,
            &target,
            &PropPath::from("left"),
            &source,
            &PropPath::from("right"),
            mapper,
        );
        (target, source)
    }

    #[test]
    fn get_copies_once_and_stays_dead() {
        let target = Node::plain();
        let source = Node::plain();
        source.set("right", 11);
        wire(
            Mode::Get,
            &target,
            &PropPath::from("left"),
            &source,
            &PropPath::from("right"),
            &Mapper::identity(),
        );
        assert_eq!(target.get("left"), Some(Value::Int(11)));

        source.set("right", 99);
        assert_eq!(target.get("left"), Some(Value::Int(11)));
    }

    #[test]
    fn set_pushes_target_into_source_once() {
        let target = Node::plain();
        let source = Node::plain();
        target.set("left", 3);
        wire(
            Mode::Set,
            &target,
            &PropPath::from("left"),
            &source,
            &PropPath::from("right"),
            &scale(),
        );
        assert_eq!(source.get("right"), Some(Value::Float(6.0)));

        target.set("left", 100);
        assert_eq!(source.get("right"), Some(Value::Float(6.0)));
    }

    #[test]
    fn write_drives_source_backward() {
        let (target, source) = wired(Mode::Write, &scale());

        target.set("left", 5);
        assert_eq!(source.get("right"), Some(Value::Float(2.5)));

        target.set("left", 8);
        assert_eq!(source.get("right"), Some(Value::Float(4.0)));

        // Source changes never flow back to the target.
        source.set("right", 1000);
        assert_eq!(target.get("left"), Some(Value::Int(8)));
    }

    #[test]
    fn write_seeds_from_existing_target_value() {
        let target = Node::plain();
        let source = Node::plain();
        target.set("left", 5);
        wire(
            Mode::Write,
            &target,
            &PropPath::from("left"),
            &source,
            &PropPath::from("right"),
            &scale(),
        );
        assert_eq!(source.get("right"), Some(Value::Float(2.5)));
    }

    #[test]
    fn read_drives_target_forward() {
        let target = Node::plain();
        let source = Node::plain();
        source.set("right", 4);
        wire(
            Mode::Read,
            &target,
            &PropPath::from("left"),
            &source,
            &PropPath::from("right"),
            &scale(),
        );
        assert_eq!(target.get("left"), Some(Value::Float(8.0)));

        source.set("right", 6);
        assert_eq!(target.get("left"), Some(Value::Float(12.0)));

        target.set("left", 0);
        assert_eq!(source.get("right"), Some(Value::Int(6)));
    }

    #[test]
    fn declined_transform_skips_the_write_and_recovers() {
        let (target, source) = wired(Mode::Write, &scale());

        target.set("left", "not numeric");
        assert_eq!(source.get("right"), None);

        target.set("left", 4);
        assert_eq!(source.get("right"), Some(Value::Float(2.0)));
    }

    #[test]
    fn bind_seeds_target_from_source() {
        let target = Node::plain();
        let source = Node::plain();
        source.set("right", 21);
        wire(
            Mode::Bind,
            &target,
            &PropPath::from("left"),
            &source,
            &PropPath::from("right"),
            &Mapper::identity(),
        );
        assert_eq!(target.get("left"), Some(Value::Int(21)));
    }

    #[test]
    fn bind_propagates_both_directions() {
        let (target, source) = wired(Mode::Bind, &Mapper::identity());

        target.set("left", 1);
        assert_eq!(source.get("right"), Some(Value::Int(1)));

        source.set("right", 2);
        assert_eq!(target.get("left"), Some(Value::Int(2)));
    }

    #[test]
    fn bind_suppresses_repeated_source_values() {
        let (target, source) = wired(Mode::Bind, &Mapper::identity());
        let writes = Rc::new(Cell::new(0));
        let w = Rc::clone(&writes);
        let _count = target.subscribe("left", move |_| w.set(w.get() + 1));

        source.set("right", 7);
        let after_first = writes.get();
        source.set("right", 7);
        assert_eq!(
            writes.get(),
            after_first,
            "a repeated source value must not reach the target"
        );
        assert!(after_first <= 1);
    }

    #[test]
    fn bind_echo_terminates_with_round_trip_mapper() {
        let (target, source) = wired(Mode::Bind, &scale());

        target.set("left", 10);
        assert_eq!(source.get("right"), Some(Value::Float(5.0)));
        assert_eq!(target.get("left"), Some(Value::Float(10.0)));

        source.set("right", 3);
        assert_eq!(target.get("left"), Some(Value::Float(6.0)));
        assert_eq!(source.get("right"), Some(Value::Float(3.0)));
    }

    #[test]
    fn write_stops_when_source_dies() {
        let (target, source) = wired(Mode::Write, &Mapper::identity());

        target.set("left", 1);
        assert_eq!(source.get("right"), Some(Value::Int(1)));

        source.end_lifetime();
        target.set("left", 2); // must not panic, must not write
        assert_eq!(source.get("right"), None);
    }

    #[test]
    fn bind_stops_both_directions_when_either_dies() {
        let (target, source) = wired(Mode::Bind, &Mapper::identity());
        target.end_lifetime();

        source.set("right", 5);
        assert_eq!(target.get("left"), None);
        // The target-side subscriber list died with the target; the source
        // keeps working standalone.
        assert_eq!(source.get("right"), Some(Value::Int(5)));
    }

    #[test]
    fn binding_does_not_keep_endpoints_alive() {
        let target = Node::plain();
        let weak_source = {
            let source = Node::plain();
            wire(
                Mode::Write,
                &target,
                &PropPath::from("left"),
                &source,
                &PropPath::from("right"),
                &Mapper::identity(),
            );
            source.downgrade()
        };
        assert!(
            weak_source.upgrade().is_none(),
            "wiring must hold the counterpart weakly"
        );
        target.set("left", 1); // inert, no panic
    }

    #[test]
    fn mode_live_classification() {
        assert!(!Mode::Get.is_live());
        assert!(!Mode::Set.is_live());
        assert!(Mode::Write.is_live());
        assert!(Mode::Read.is_live());
        assert!(Mode::Bind.is_live());
    }
}
