#![forbid(unsafe_code)]

//! Symmetric value transforms applied across a binding.
//!
//! A [`Mapper`] pairs a forward transform (`to`, applied when values flow
//! source → target) with a backward transform (`back`, target → source).
//! The default is identity in both directions. A transform may *decline* a
//! value by returning `None`; the caller then skips the corresponding
//! property write — a soft failure, never an error.
//!
//! Mappers compose: [`Mapper::chain`] runs forward transforms left to right
//! and backward transforms in reverse, and a [`MapperRegistry`] resolves a
//! dotted spec (`"scale.round"`) into such a chain by step name.
//!
//! # Contract on mapper authors
//!
//! For values inside the intended domain, `back(to(x))` should round-trip
//! to `x`. Two-way bindings rely on this to terminate their echo path; the
//! engine does not (and cannot) enforce it.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use tether_core::Value;

use crate::directive::DirectiveError;

pub(crate) type Transform = Rc<dyn Fn(Value) -> Option<Value>>;

/// A forward/backward transform pair. Cloning shares the closures.
#[derive(Clone)]
pub struct Mapper {
    forward: Transform,
    backward: Transform,
}

impl Mapper {
    /// The identity mapper: both directions accept every value unchanged.
    #[must_use]
    pub fn identity() -> Self {
        Mapper {
            forward: Rc::new(|value| Some(value)),
            backward: Rc::new(|value| Some(value)),
        }
    }

    /// Build a mapper from two transforms. Return `None` from either to
    /// decline a value (the write is skipped, silently).
    pub fn new(
        forward: impl Fn(Value) -> Option<Value> + 'static,
        backward: impl Fn(Value) -> Option<Value> + 'static,
    ) -> Self {
        Mapper {
            forward: Rc::new(forward),
            backward: Rc::new(backward),
        }
    }

    /// Apply the forward transform.
    #[must_use]
    pub fn to(&self, value: Value) -> Option<Value> {
        (self.forward)(value)
    }

    /// Apply the backward transform.
    #[must_use]
    pub fn back(&self, value: Value) -> Option<Value> {
        (self.backward)(value)
    }

    /// Compose steps into one mapper: `to` runs the steps left to right,
    /// `back` runs each step's backward transform in reverse order. Any
    /// stage declining short-circuits the whole chain.
    #[must_use]
    pub fn chain(steps: Vec<Mapper>) -> Self {
        let forward_steps = steps.clone();
        let backward_steps = steps;
        Mapper {
            forward: Rc::new(move |value| {
                forward_steps
                    .iter()
                    .try_fold(value, |value, step| step.to(value))
            }),
            backward: Rc::new(move |value| {
                backward_steps
                    .iter()
                    .rev()
                    .try_fold(value, |value, step| step.back(value))
            }),
        }
    }

    pub(crate) fn forward_transform(&self) -> Transform {
        Rc::clone(&self.forward)
    }

    pub(crate) fn backward_transform(&self) -> Transform {
        Rc::clone(&self.backward)
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Mapper::identity()
    }
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper").finish_non_exhaustive()
    }
}

/// Named mapper steps, looked up when a directive carries a mapper spec.
///
/// Registration is a setup-time concern; composing a spec that names an
/// unregistered step is a configuration error.
#[derive(Default)]
pub struct MapperRegistry {
    steps: RefCell<AHashMap<Box<str>, Mapper>>,
}

impl MapperRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        MapperRegistry::default()
    }

    /// Register (or replace) a named step.
    pub fn register(&self, name: impl AsRef<str>, step: Mapper) {
        self.steps
            .borrow_mut()
            .insert(Box::from(name.as_ref()), step);
    }

    /// Whether a step is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.steps.borrow().contains_key(name)
    }

    /// Resolve a dotted spec into a composed mapper.
    pub fn compose(&self, spec: &str) -> Result<Mapper, DirectiveError> {
        let steps = self.steps.borrow();
        let mut chain = Vec::new();
        for name in spec.split('.') {
            let step = steps.get(name).ok_or_else(|| DirectiveError::UnknownMapStep {
                name: name.to_owned(),
            })?;
            chain.push(step.clone());
        }
        Ok(Mapper::chain(chain))
    }
}

impl std::fmt::Debug for MapperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapperRegistry")
            .field("steps", &self.steps.borrow().len())
            .finish()
    }
}
