#![forbid(unsafe_code)]

//! Dotted property paths.
//!
//! A [`PropPath`] identifies a bindable property on a node (`"text"`,
//! `"model.title"`). The store keys properties by the whole path; dotted
//! segments stay available through [`PropPath::segments`] for adapters that
//! want to walk nested structures. No existence or type checking is done at
//! this layer.

use core::fmt;
use std::rc::Rc;

/// An owned dotted property path. Cheap to clone (shared backing string).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropPath(Rc<str>);

impl PropPath {
    /// Create a path from its dotted string form.
    #[must_use]
    pub fn new(path: impl AsRef<str>) -> Self {
        PropPath(Rc::from(path.as_ref()))
    }

    /// The full dotted string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the dot-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Whether the path has no characters at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PropPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropPath {
    fn from(s: &str) -> Self {
        PropPath::new(s)
    }
}

impl From<String> for PropPath {
    fn from(s: String) -> Self {
        PropPath(Rc::from(s.as_str()))
    }
}

impl From<&PropPath> for PropPath {
    fn from(p: &PropPath) -> Self {
        p.clone()
    }
}
