// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::schema::error::{Fragment, ValidationError};
use crate::schema::{Schema, Ty};
use crate::value::Value;

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Validate,
    Mock,
}

/// Mutable state of one top-level validate/mock call, threaded `&mut`
/// through the whole recursive walk. Created fresh per call; nothing
/// survives it.
pub(crate) struct Root {
    /// Which engine owns this walk. Kept for diagnostics; the engines
    /// dispatch separately and do not branch on it.
    #[allow(dead_code)]
    pub mode: Mode,

    /// The root datum: the input under validation, or the partially built
    /// output during mock generation (so computed fields can read
    /// already-generated siblings).
    pub data: Value,

    pub ty: Ty,

    /// Read-only during the walk.
    pub declarations: Rc<BTreeMap<Rc<str>, Ty>>,

    pub errors: Vec<ValidationError>,

    /// (data node address, type node address) pairs on the current descent
    /// path; a revisit short-circuits as valid.
    pub visited: BTreeSet<(usize, usize)>,

    /// Mock only: placeholder snapshot per container type node, reused
    /// when that node's expansion budget runs out.
    pub markers: BTreeMap<usize, Value>,

    /// Mock only: remaining expansions per type node.
    pub budgets: BTreeMap<usize, u32>,

    /// Configured expansion budget for recursive mock generation.
    pub budget: u32,
}

impl Root {
    pub fn for_validate(data: &Value, schema: &Schema) -> Self {
        Root {
            mode: Mode::Validate,
            data: data.clone(),
            ty: schema.root().clone(),
            declarations: schema.declarations_rc(),
            errors: vec![],
            visited: BTreeSet::new(),
            markers: BTreeMap::new(),
            budgets: BTreeMap::new(),
            budget: 0,
        }
    }

    pub fn for_mock(schema: &Schema, budget: u32) -> Self {
        Root {
            mode: Mode::Mock,
            data: Value::Undefined,
            ty: schema.root().clone(),
            declarations: schema.declarations_rc(),
            errors: vec![],
            visited: BTreeSet::new(),
            markers: BTreeMap::new(),
            budgets: BTreeMap::new(),
            budget,
        }
    }

    pub fn error(&mut self, path: &[Rc<str>], message: Vec<Fragment>) {
        self.errors.push(ValidationError::new(path.to_vec(), message));
    }

    /// Runs a speculative branch: errors the branch produces are captured
    /// and returned instead of staying in the accumulated list, and the
    /// visited set is restored, so an abandoned branch leaves no trace.
    /// Every union/intersection-style alternative goes through here.
    pub fn speculate(
        &mut self,
        f: impl FnOnce(&mut Root) -> Result<()>,
    ) -> Result<Vec<ValidationError>> {
        let saved_errors = std::mem::take(&mut self.errors);
        let saved_visited = self.visited.clone();

        let outcome = f(self);

        let branch = std::mem::replace(&mut self.errors, saved_errors);
        self.visited = saved_visited;

        outcome?;
        Ok(branch)
    }

    /// Scopes the mock expansion maps: mutations made while generating one
    /// subtree are invisible to its siblings.
    pub fn scoped_expansion<T>(&mut self, f: impl FnOnce(&mut Root) -> Result<T>) -> Result<T> {
        let saved_markers = self.markers.clone();
        let saved_budgets = self.budgets.clone();

        let outcome = f(self);

        self.markers = saved_markers;
        self.budgets = saved_budgets;

        outcome
    }
}

pub(crate) fn child_path(path: &[Rc<str>], seg: Rc<str>) -> Vec<Rc<str>> {
    let mut child = path.to_vec();
    child.push(seg);
    child
}
