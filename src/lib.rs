// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

mod compile;
mod expr;
mod number;
mod utils;
mod value;

pub mod schema;

pub use compile::{lower, CompileError, Compiler};
pub use number::Number;
pub use schema::error::{Fragment, ValidationError};
pub use schema::{
    MatchArm, PatternType, Scalar, Schema, SelfExpr, Shape, ShapeEntry, ShapeKey, Ty, Type,
};
pub use value::Value;

/// The expression-tree input produced by the external textual parser.
pub use expr::{
    ArithOp, BinOp, BoolOp, Declare, Decorator, EnumMember, Expr, Ident, LogicOp, MatchCase,
    Program, PropKey, Property, UnaryOp,
};

#[cfg(test)]
mod tests;
