// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::cmp::Ordering;
use core::fmt::{Debug, Formatter};
use core::str::FromStr;
use std::rc::Rc;

use anyhow::{bail, Result};
use num_bigint::BigInt as NumBigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::ser::Serializer;
use serde::Serialize;

pub type BigInt = NumBigInt;

// 2^53. Integers beyond this cannot be represented exactly as f64.
pub const F64_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Numeric value used throughout the data model. Small integers stay in
/// machine words; arithmetic promotes to `BigInt` on overflow so integer
/// comparisons are always exact.
#[derive(Clone)]
pub enum Number {
    UInt(u64),
    Int(i64),
    Float(f64),
    BigInt(Rc<BigInt>),
}

impl Number {
    fn from_bigint_owned(value: BigInt) -> Self {
        if value.is_zero() {
            return Number::Int(0);
        }

        if value.is_negative() {
            if let Some(i) = value.to_i64() {
                return Number::Int(i);
            }
        } else if let Some(u) = value.to_u64() {
            return Number::UInt(u);
        }

        Number::BigInt(Rc::new(value))
    }

    fn from_i128_value(value: i128) -> Self {
        if value >= 0 {
            if let Ok(u) = u64::try_from(value) {
                return Number::UInt(u);
            }
        }

        if let Ok(i) = i64::try_from(value) {
            Number::Int(i)
        } else {
            Number::BigInt(Rc::new(BigInt::from(value)))
        }
    }

    fn float_to_small_bigint(value: f64) -> Option<BigInt> {
        if !value.is_finite() || value.fract() != 0.0 || value.abs() > F64_SAFE_INTEGER {
            return None;
        }

        if value >= 0.0 {
            let u = value as u64;
            if (u as f64) == value {
                return Some(BigInt::from(u));
            }
        } else {
            let i = value as i64;
            if (i as f64) == value {
                return Some(BigInt::from(i));
            }
        }

        None
    }

    fn to_bigint_owned(&self) -> Option<BigInt> {
        match self {
            Number::UInt(v) => Some(BigInt::from(*v)),
            Number::Int(v) => Some(BigInt::from(*v)),
            Number::BigInt(v) => Some((**v).clone()),
            Number::Float(f) => Self::float_to_small_bigint(*f),
        }
    }

    fn to_f64_lossy(&self) -> f64 {
        match self {
            Number::UInt(v) => *v as f64,
            Number::Int(v) => *v as f64,
            Number::Float(v) => *v,
            Number::BigInt(v) => {
                if let Some(f) = v.to_f64() {
                    f
                } else if v.is_negative() {
                    f64::NEG_INFINITY
                } else {
                    f64::INFINITY
                }
            }
        }
    }

    fn normalize_float(value: f64) -> Number {
        if let Some(int) = Self::float_to_small_bigint(value) {
            return Self::from_bigint_owned(int);
        }
        Number::Float(value)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::UInt(0) | Number::Int(0) => true,
            Number::Float(f) => *f == 0.0,
            Number::BigInt(v) => v.is_zero(),
            _ => false,
        }
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => true,
        }
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.format_decimal())
    }
}

impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = self.format_decimal();
        let v = serde_json::Number::from_str(&s)
            .map_err(|_| serde::ser::Error::custom("could not serialize number"))?;
        v.serialize(serializer)
    }
}

impl From<BigInt> for Number {
    fn from(value: BigInt) -> Self {
        Number::from_bigint_owned(value)
    }
}

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        Number::UInt(value)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number::UInt(value as u64)
    }
}

impl From<u128> for Number {
    fn from(value: u128) -> Self {
        if let Ok(n) = u64::try_from(value) {
            Number::UInt(n)
        } else {
            Number::from_bigint_owned(BigInt::from(value))
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<i128> for Number {
    fn from(value: i128) -> Self {
        Number::from_i128_value(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseNumberError;

impl FromStr for Number {
    type Err = ParseNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseNumberError);
        }

        let is_integer_literal =
            !trimmed.contains('.') && !trimmed.contains('e') && !trimmed.contains('E');

        if is_integer_literal {
            let (sign, digits) = if let Some(rest) = trimmed.strip_prefix('-') {
                (-1, rest)
            } else if let Some(rest) = trimmed.strip_prefix('+') {
                (1, rest)
            } else {
                (1, trimmed)
            };

            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                if let Some(mut value) = BigInt::parse_bytes(digits.as_bytes(), 10) {
                    if sign < 0 {
                        value = -value;
                    }
                    return Ok(Number::from_bigint_owned(value));
                }
            }
            return Err(ParseNumberError);
        }

        trimmed
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| ParseNumberError)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.to_bigint_owned(), other.to_bigint_owned()) {
            return a == b;
        }

        let a = self.to_f64_lossy();
        let b = other.to_f64_lossy();
        if a.is_nan() || b.is_nan() {
            return false;
        }
        a == b
    }
}

impl Eq for Number {}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        if let (Some(a), Some(b)) = (self.to_bigint_owned(), other.to_bigint_owned()) {
            return a.cmp(&b);
        }

        self.to_f64_lossy()
            .partial_cmp(&other.to_f64_lossy())
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Number {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Number::UInt(v) => Some(*v),
            Number::Int(v) if *v >= 0 => Some(*v as u64),
            Number::BigInt(v) => v.to_u64(),
            Number::Float(f) => {
                if f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64 {
                    let candidate = *f as u64;
                    if (candidate as f64) == *f {
                        return Some(candidate);
                    }
                }
                None
            }
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::UInt(v) if *v <= i64::MAX as u64 => Some(*v as i64),
            Number::Int(v) => Some(*v),
            Number::BigInt(v) => v.to_i64(),
            Number::Float(f) => {
                if f.is_finite()
                    && f.fract() == 0.0
                    && *f >= i64::MIN as f64
                    && *f <= i64::MAX as f64
                {
                    let candidate = *f as i64;
                    if (candidate as f64) == *f {
                        return Some(candidate);
                    }
                }
                None
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Number::Float(f) if f.is_finite() => Some(*f),
            Number::UInt(v) if *v <= F64_SAFE_INTEGER as u64 => Some(*v as f64),
            Number::Int(v) if (*v as i128).abs() <= F64_SAFE_INTEGER as i128 => Some(*v as f64),
            Number::BigInt(v) => {
                if v.bits() <= 53 {
                    v.to_f64()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_big(&self) -> Option<BigInt> {
        self.to_bigint_owned()
    }

    pub fn add(&self, rhs: &Self) -> Result<Number> {
        if matches!(self, Number::Float(_)) || matches!(rhs, Number::Float(_)) {
            return Ok(Number::normalize_float(
                self.to_f64_lossy() + rhs.to_f64_lossy(),
            ));
        }

        match (self, rhs) {
            (Number::UInt(a), Number::UInt(b)) => {
                if let Some(sum) = a.checked_add(*b) {
                    Ok(Number::UInt(sum))
                } else {
                    Ok(Number::from_bigint_owned(
                        BigInt::from(*a) + BigInt::from(*b),
                    ))
                }
            }
            (Number::Int(a), Number::Int(b)) => {
                if let Some(sum) = a.checked_add(*b) {
                    Ok(Number::Int(sum))
                } else {
                    Ok(Number::from_bigint_owned(
                        BigInt::from(*a) + BigInt::from(*b),
                    ))
                }
            }
            (Number::Int(a), Number::UInt(b)) | (Number::UInt(b), Number::Int(a)) => {
                Ok(Number::from_i128_value(*a as i128 + *b as i128))
            }
            (a, b) => {
                let (a, b) = Number::both_big(a, b)?;
                Ok(Number::from_bigint_owned(a + b))
            }
        }
    }

    pub fn sub(&self, rhs: &Self) -> Result<Number> {
        if matches!(self, Number::Float(_)) || matches!(rhs, Number::Float(_)) {
            return Ok(Number::normalize_float(
                self.to_f64_lossy() - rhs.to_f64_lossy(),
            ));
        }

        match (self, rhs) {
            (Number::UInt(a), Number::UInt(b)) => {
                if a >= b {
                    Ok(Number::UInt(a - b))
                } else {
                    Ok(Number::from_i128_value(*a as i128 - *b as i128))
                }
            }
            (Number::Int(a), Number::Int(b)) => {
                if let Some(diff) = a.checked_sub(*b) {
                    Ok(Number::Int(diff))
                } else {
                    Ok(Number::from_bigint_owned(
                        BigInt::from(*a) - BigInt::from(*b),
                    ))
                }
            }
            (Number::Int(a), Number::UInt(b)) => {
                Ok(Number::from_i128_value(*a as i128 - *b as i128))
            }
            (Number::UInt(a), Number::Int(b)) => {
                Ok(Number::from_i128_value(*a as i128 - *b as i128))
            }
            (a, b) => {
                let (a, b) = Number::both_big(a, b)?;
                Ok(Number::from_bigint_owned(a - b))
            }
        }
    }

    pub fn mul(&self, rhs: &Self) -> Result<Number> {
        if matches!(self, Number::Float(_)) || matches!(rhs, Number::Float(_)) {
            return Ok(Number::normalize_float(
                self.to_f64_lossy() * rhs.to_f64_lossy(),
            ));
        }

        match (self, rhs) {
            (Number::UInt(a), Number::UInt(b)) => {
                let product = (*a as u128) * (*b as u128);
                if let Ok(v) = u64::try_from(product) {
                    Ok(Number::UInt(v))
                } else {
                    Ok(Number::from_bigint_owned(BigInt::from(product)))
                }
            }
            (Number::Int(a), Number::Int(b)) => {
                if let Some(prod) = a.checked_mul(*b) {
                    Ok(Number::Int(prod))
                } else {
                    Ok(Number::from_bigint_owned(
                        BigInt::from(*a) * BigInt::from(*b),
                    ))
                }
            }
            (Number::Int(a), Number::UInt(b)) | (Number::UInt(b), Number::Int(a)) => {
                if let Some(prod) = (*a as i128).checked_mul(*b as i128) {
                    Ok(Number::from_i128_value(prod))
                } else {
                    Ok(Number::from_bigint_owned(
                        BigInt::from(*a) * BigInt::from(*b),
                    ))
                }
            }
            (a, b) => {
                let (a, b) = Number::both_big(a, b)?;
                Ok(Number::from_bigint_owned(a * b))
            }
        }
    }

    pub fn divide(&self, rhs: &Self) -> Result<Number> {
        if rhs.is_zero() {
            bail!("division by zero");
        }

        if self.is_integer() && rhs.is_integer() {
            let (a, b) = Number::both_big(self, rhs)?;
            let remainder = &a % &b;
            if remainder.is_zero() {
                return Ok(Number::from_bigint_owned(a / b));
            }
        }

        Ok(Number::Float(self.to_f64_lossy() / rhs.to_f64_lossy()))
    }

    pub fn modulo(&self, rhs: &Self) -> Result<Number> {
        if rhs.is_zero() {
            bail!("modulo by zero");
        }

        if !self.is_integer() || !rhs.is_integer() {
            bail!("modulo on floating-point number");
        }

        let (a, b) = Number::both_big(self, rhs)?;
        Ok(Number::from_bigint_owned(a % b))
    }

    pub fn xor(&self, rhs: &Self) -> Option<Number> {
        let (a, b) = (self.ensure_integer()?, rhs.ensure_integer()?);
        Some(Number::from_bigint_owned(a ^ b))
    }

    pub fn lsh(&self, rhs: &Self) -> Option<Number> {
        let a = self.ensure_integer()?;
        let b = rhs.as_u64()?;
        if b > 4096 {
            return None;
        }
        Some(Number::from_bigint_owned(a << b))
    }

    pub fn rsh(&self, rhs: &Self) -> Option<Number> {
        let a = self.ensure_integer()?;
        let b = rhs.as_u64()?;
        if b > 4096 {
            return None;
        }
        Some(Number::from_bigint_owned(a >> b))
    }

    pub fn neg(&self) -> Option<Number> {
        match self {
            Number::Float(f) => Some(Number::Float(-f)),
            _ => {
                let a = self.ensure_integer()?;
                Some(Number::from_bigint_owned(-a))
            }
        }
    }

    pub fn not(&self) -> Option<Number> {
        // Two's complement: !x == -x - 1.
        let a = self.ensure_integer()?;
        Some(Number::from_bigint_owned(-a - BigInt::from(1)))
    }

    fn ensure_integer(&self) -> Option<BigInt> {
        if self.is_integer() {
            self.to_bigint_owned()
        } else {
            None
        }
    }

    fn both_big(a: &Number, b: &Number) -> Result<(BigInt, BigInt)> {
        match (a.to_bigint_owned(), b.to_bigint_owned()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => bail!("non-integral operand"),
        }
    }

    pub fn format_decimal(&self) -> String {
        match self {
            Number::UInt(v) => v.to_string(),
            Number::Int(v) => v.to_string(),
            Number::BigInt(v) => v.to_string(),
            Number::Float(f) => {
                if f.is_finite() {
                    format!("{f}")
                } else {
                    // Not representable in JSON; still printable.
                    format!("{f:?}")
                }
            }
        }
    }
}
