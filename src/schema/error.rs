// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::Value;

use core::fmt;
use std::rc::Rc;

/// One data-level defect found while walking a value against a schema.
///
/// `path` is the key trail from the root datum; `message` is an ordered
/// list of fragments mixing prose with the offending values, rendered in
/// sequence by `Display` (e.g. `a.b: "1" is not an integer`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: Vec<Rc<str>>,
    pub message: Vec<Fragment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(Rc<str>),
    Value(Value),
}

impl ValidationError {
    pub fn new(path: Vec<Rc<str>>, message: Vec<Fragment>) -> Self {
        ValidationError { path, message }
    }
}

/// Prose fragment.
pub fn text(s: &str) -> Fragment {
    Fragment::Text(s.into())
}

/// Offending-value fragment.
pub fn value(v: &Value) -> Fragment {
    Fragment::Value(v.clone())
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.path.join("."))?;
        for (i, fragment) in self.message.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match fragment {
                Fragment::Text(s) => f.write_str(s)?,
                Fragment::Value(v) => write!(f, "{v}")?,
            }
        }
        Ok(())
    }
}

impl core::error::Error for ValidationError {}
