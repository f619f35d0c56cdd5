//! Level-indexed value curves used for upgrade prices and yields.
//!
//! Curves are evaluated with exact rational arithmetic so values stay
//! reproducible at any magnitude. Every [`Curve`] memoizes its results per
//! level: the first evaluation at a level is stored and returned verbatim on
//! later calls.

use crate::numtext::NumberText;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;
use thiserror::Error;

/// Errors produced while parsing curve parameters.
#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    /// Parameter text is not a decimal or scientific number.
    #[error("invalid number literal: {0:?}")]
    InvalidNumber(String),
    /// Exponent in scientific notation is too large to expand.
    #[error("exponent out of range in {0:?}")]
    ExponentOutOfRange(String),
}

/// Exact rational parameter, written in config as a decimal string such as
/// `"1.15"`, `"-3"` or `"1e100"`. Bare integers are accepted too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NumberText", into = "String")]
pub struct Exact(pub BigRational);

impl TryFrom<NumberText> for Exact {
    type Error = CurveError;

    fn try_from(text: NumberText) -> Result<Self, Self::Error> {
        text.0.parse()
    }
}

impl From<Exact> for String {
    fn from(e: Exact) -> Self {
        e.to_string()
    }
}

impl Exact {
    pub fn from_int(i: i64) -> Self {
        Exact(BigRational::from_integer(BigInt::from(i)))
    }

    /// Convert to a decimal, e.g. for probabilities. `None` if the value
    /// does not fit in a `Decimal`. Non-terminating fractions such as 1/3 are
    /// rounded to the 28 digits `Decimal` carries.
    pub fn to_decimal(&self) -> Option<Decimal> {
        rational_to_decimal(&self.0)
    }
}

impl FromStr for Exact {
    type Err = CurveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_exact(s).map(Exact)
    }
}

impl fmt::Display for Exact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            return write!(f, "{}", self.0.numer());
        }
        match self.to_decimal() {
            Some(d) => write!(f, "{}", d.normalize()),
            None => write!(f, "{}/{}", self.0.numer(), self.0.denom()),
        }
    }
}

fn parse_exact(text: &str) -> Result<BigRational, CurveError> {
    let invalid = || CurveError::InvalidNumber(text.to_string());
    let s = text.trim().replace('_', "");
    let (mantissa, exponent) = match s.find(|c: char| c == 'e' || c == 'E') {
        Some(pos) => {
            let exp: i32 = s[pos + 1..].parse().map_err(|_| invalid())?;
            (&s[..pos], exp)
        }
        None => (s.as_str(), 0),
    };
    let (negative, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let joined = format!("{int_part}{frac_part}");
    let mut numer = BigInt::from_str(&joined).map_err(|_| invalid())?;
    if negative {
        numer = -numer;
    }
    let scale = exponent - frac_part.len() as i32;
    if scale.unsigned_abs() > 100_000 {
        return Err(CurveError::ExponentOutOfRange(text.to_string()));
    }
    let ten = BigInt::from(10u32);
    let value = if scale >= 0 {
        BigRational::from_integer(numer * ten.pow(scale as u32))
    } else {
        BigRational::new(numer, ten.pow(scale.unsigned_abs()))
    };
    Ok(value)
}

/// Convert an exact rational to a decimal when both parts fit.
pub fn rational_to_decimal(r: &BigRational) -> Option<Decimal> {
    let n = Decimal::from_i128(r.numer().to_i128()?)?;
    let d = Decimal::from_i128(r.denom().to_i128()?)?;
    n.checked_div(d)
}

/// Widest power an `exp` curve expands exactly, in bits (about 315k digits).
const MAX_POW_BITS: u64 = 1 << 20;

/// Integer value with an "unreachable" sentinel, used for capped prices.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Amount {
    Finite(BigInt),
    /// Level is past a cap; shown as "Infinity" and never affordable.
    Unbounded,
}

impl Amount {
    pub fn zero() -> Self {
        Amount::Finite(BigInt::zero())
    }

    pub fn finite(&self) -> Option<&BigInt> {
        match self {
            Amount::Finite(n) => Some(n),
            Amount::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Amount::Unbounded)
    }
}

impl From<BigInt> for Amount {
    fn from(n: BigInt) -> Self {
        Amount::Finite(n)
    }
}

/// Value of a curve at one level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CurveValue {
    Finite(BigRational),
    Unbounded,
}

impl CurveValue {
    fn zero() -> Self {
        CurveValue::Finite(BigRational::zero())
    }

    /// Round half away from zero to an integer amount.
    pub fn to_amount(&self) -> Amount {
        match self {
            CurveValue::Finite(r) => Amount::Finite(r.round().to_integer()),
            CurveValue::Unbounded => Amount::Unbounded,
        }
    }

    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            CurveValue::Finite(r) => Some(r),
            CurveValue::Unbounded => None,
        }
    }
}

/// Declarative curve shape, as written in the game config.
///
/// Serialized with a `shape` tag, e.g. `{shape: exp, coeff: "100", base: "1.15"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum CurveSpec {
    /// `round(coeff * base^(level - 1))`.
    Exp { coeff: Exact, base: Exact },
    /// `intercept + (level - 1) * slope`.
    Lin { intercept: Exact, slope: Exact },
    /// Inner curve up to `max_level`, unbounded after.
    Cap { curve: Box<CurveSpec>, max_level: i64 },
    /// Inner curve up to `after`, then the fixed `value` for every later level.
    Cliff {
        curve: Box<CurveSpec>,
        after: i64,
        value: Exact,
    },
    /// Same value at every purchased level.
    Constant { value: Exact },
}

impl CurveSpec {
    pub fn exp(coeff: &str, base: &str) -> Result<Self, CurveError> {
        Ok(CurveSpec::Exp {
            coeff: coeff.parse()?,
            base: base.parse()?,
        })
    }

    pub fn lin(intercept: &str, slope: &str) -> Result<Self, CurveError> {
        Ok(CurveSpec::Lin {
            intercept: intercept.parse()?,
            slope: slope.parse()?,
        })
    }

    pub fn cap(self, max_level: i64) -> Self {
        CurveSpec::Cap {
            curve: Box::new(self),
            max_level,
        }
    }

    pub fn constant(value: &str) -> Result<Self, CurveError> {
        Ok(CurveSpec::Constant {
            value: value.parse()?,
        })
    }

    pub fn cliff(self, after: i64, value: &str) -> Result<Self, CurveError> {
        Ok(CurveSpec::Cliff {
            curve: Box::new(self),
            after,
            value: value.parse()?,
        })
    }

    /// Evaluate without memoization. Levels `<= 0` are always zero.
    fn eval(&self, level: i64) -> CurveValue {
        if level <= 0 {
            return CurveValue::zero();
        }
        match self {
            CurveSpec::Exp { coeff, base } => {
                let pow = if base.0.is_one() {
                    BigRational::one()
                } else {
                    let width = base.0.numer().bits().max(base.0.denom().bits());
                    let exp = u64::try_from(level - 1).unwrap_or(u64::MAX);
                    let exp = match u32::try_from(exp) {
                        Ok(exp) if width.saturating_mul(u64::from(exp)) <= MAX_POW_BITS => exp,
                        // Growing powers this wide are unreachable; shrinking ones round to zero.
                        _ if base.0.abs() > BigRational::one() => return CurveValue::Unbounded,
                        _ => return CurveValue::zero(),
                    };
                    BigRational::new(base.0.numer().pow(exp), base.0.denom().pow(exp))
                };
                let exact = &coeff.0 * pow;
                CurveValue::Finite(BigRational::from_integer(exact.round().to_integer()))
            }
            CurveSpec::Lin { intercept, slope } => {
                let steps = BigRational::from_integer(BigInt::from(level - 1));
                CurveValue::Finite(&intercept.0 + steps * &slope.0)
            }
            CurveSpec::Cap { curve, max_level } => {
                if level <= *max_level {
                    curve.eval(level)
                } else {
                    CurveValue::Unbounded
                }
            }
            CurveSpec::Cliff {
                curve,
                after,
                value,
            } => {
                if level <= *after {
                    curve.eval(level)
                } else {
                    CurveValue::Finite(value.0.clone())
                }
            }
            CurveSpec::Constant { value } => CurveValue::Finite(value.0.clone()),
        }
    }

    /// True if any branch of the curve can evaluate below zero.
    pub fn can_go_negative(&self) -> bool {
        match self {
            CurveSpec::Exp { coeff, .. } => coeff.0.is_negative(),
            CurveSpec::Lin { intercept, slope } => {
                intercept.0.is_negative() || slope.0.is_negative()
            }
            CurveSpec::Cap { curve, .. } => curve.can_go_negative(),
            CurveSpec::Cliff { curve, value, .. } => {
                curve.can_go_negative() || value.0.is_negative()
            }
            CurveSpec::Constant { value } => value.0.is_negative(),
        }
    }
}

/// A curve with a per-level memo table.
#[derive(Debug, Serialize, Deserialize)]
#[serde(from = "CurveSpec", into = "CurveSpec")]
pub struct Curve {
    spec: CurveSpec,
    memo: RwLock<HashMap<i64, CurveValue>>,
}

impl Curve {
    pub fn new(spec: CurveSpec) -> Self {
        Self {
            spec,
            memo: RwLock::new(HashMap::new()),
        }
    }

    pub fn spec(&self) -> &CurveSpec {
        &self.spec
    }

    /// Value at `level`, computed once and then served from the memo.
    pub fn at(&self, level: i64) -> CurveValue {
        if level <= 0 {
            return CurveValue::zero();
        }
        if let Ok(memo) = self.memo.read() {
            if let Some(v) = memo.get(&level) {
                return v.clone();
            }
        }
        let value = self.spec.eval(level);
        match self.memo.write() {
            // Another caller may have raced us here; keep the first stored value.
            Ok(mut memo) => memo.entry(level).or_insert(value).clone(),
            Err(_) => value,
        }
    }

    pub fn amount_at(&self, level: i64) -> Amount {
        self.at(level).to_amount()
    }

    /// Number of memoized levels.
    pub fn memo_len(&self) -> usize {
        self.memo.read().map(|m| m.len()).unwrap_or(0)
    }
}

impl Clone for Curve {
    fn clone(&self) -> Self {
        let memo = self.memo.read().map(|m| m.clone()).unwrap_or_default();
        Self {
            spec: self.spec.clone(),
            memo: RwLock::new(memo),
        }
    }
}

impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.spec == other.spec
    }
}

impl From<CurveSpec> for Curve {
    fn from(spec: CurveSpec) -> Self {
        Curve::new(spec)
    }
}

impl From<Curve> for CurveSpec {
    fn from(curve: Curve) -> Self {
        curve.spec
    }
}
