use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

//--------------------------------------        Money        ---------------------------------------------------------
/// A fixed-point currency amount, stored as an integer number of minor units (e.g. cents).
///
/// All prices, totals and payment amounts in the marketplace use this type so that arithmetic is exact.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize, Hash)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a currency amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    /// Parses decimal strings such as `"12"`, `"12.5"` or `"-0.05"`. At most two decimal places are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || MoneyConversionError(format!("'{s}' is not a valid amount"));
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (major, minor) = digits.split_once('.').unwrap_or((digits, ""));
        if major.is_empty() || minor.len() > 2 {
            return Err(err());
        }
        let major = major.parse::<i64>().map_err(|_| err())?;
        let minor = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| err())? * 10,
            _ => minor.parse::<i64>().map_err(|_| err())?,
        };
        let value = major
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|v| v.checked_add(minor))
            .ok_or_else(err)?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_UNITS_PER_MAJOR as u64;
        write!(f, "{sign}{}.{:02}", abs / per_major, abs % per_major)
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(units: i64) -> Self {
        Self(units * MINOR_UNITS_PER_MAJOR)
    }

    /// The amount in whole major units, if it has no fractional part.
    pub fn whole_major_units(&self) -> Option<i64> {
        (self.0 % MINOR_UNITS_PER_MAJOR == 0).then_some(self.0 / MINOR_UNITS_PER_MAJOR)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// The price of `quantity` units at this unit price, or `None` if it cannot be represented.
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Self)
    }
}
