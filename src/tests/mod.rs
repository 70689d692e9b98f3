// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod mock;
mod validate;

use crate::{Scalar, Ty, Type, Value};

/// Deserializes a `json!` fixture into the crate's value model.
pub(crate) fn v(j: serde_json::Value) -> Value {
    serde_json::from_value(j).expect("fixture value")
}

pub(crate) fn ty(t: Type) -> Ty {
    Ty::new(t)
}

pub(crate) fn scalar(s: Scalar) -> Ty {
    Ty::new(Type::Scalar(s))
}
