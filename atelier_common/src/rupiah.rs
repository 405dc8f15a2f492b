use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const RUPIAH_CURRENCY_CODE: &str = "IDR";

//--------------------------------------       Rupiah        ---------------------------------------------------------
/// An amount of money in whole rupiah. Prices, shipping costs and ledger amounts are all integers.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, AddAssign, add_assign);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);

impl Mul<i64> for Rupiah {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in rupiah: {0}")]
pub struct RupiahConversionError(String);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value).map(Self).map_err(|_| RupiahConversionError(format!("{value} is too large")))
    }
}

/// Formats with dot thousands separators, e.g. `Rp 1.250.000`.
impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}Rp {grouped}")
    }
}

impl Rupiah {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(Rupiah::from(0).to_string(), "Rp 0");
        assert_eq!(Rupiah::from(999).to_string(), "Rp 999");
        assert_eq!(Rupiah::from(500_000).to_string(), "Rp 500.000");
        assert_eq!(Rupiah::from(1_250_000).to_string(), "Rp 1.250.000");
        assert_eq!(Rupiah::from(-15_000).to_string(), "-Rp 15.000");
    }

    #[test]
    fn arithmetic() {
        let mut total: Rupiah = [100_000, 25_000, 5_000].into_iter().map(Rupiah::from).sum();
        assert_eq!(total, Rupiah::from(130_000));
        total -= Rupiah::from(30_000);
        assert_eq!(total * 2, Rupiah::from(200_000));
        assert!((-total).is_negative());
    }

    #[test]
    fn serializes_as_a_plain_integer() {
        let json = serde_json::to_string(&Rupiah::from(500_000)).unwrap();
        assert_eq!(json, "500000");
        assert!(Rupiah::try_from(u64::MAX).is_err());
    }
}
