//! Fixed-precision quantity arithmetic.
//!
//! Every balance, flow and order quantity in the engine is computed through
//! these helpers. Quantities are `rust_decimal::Decimal`, never floats, so that
//! thousands of small adjustments add up exactly and `> 0` checks stay stable.

use rust_decimal::Decimal;

use crate::errors::ServiceError;

/// Fractional digits every quantity column stores.
pub const SCALE: u32 = 4;

/// Exact decimal sum. Overflow is an invariant violation, not a panic.
pub fn add(a: Decimal, b: Decimal) -> Result<Decimal, ServiceError> {
    a.checked_add(b).ok_or_else(|| {
        ServiceError::InvariantViolation(format!("quantity overflow adding {} and {}", a, b))
    })
}

/// Exact decimal difference `a - b`.
pub fn subtract(a: Decimal, b: Decimal) -> Result<Decimal, ServiceError> {
    a.checked_sub(b).ok_or_else(|| {
        ServiceError::InvariantViolation(format!("quantity overflow subtracting {} from {}", b, a))
    })
}

pub fn negate(a: Decimal) -> Decimal {
    -a
}

pub fn is_positive(a: Decimal) -> bool {
    a > Decimal::ZERO
}

/// True when `a` survives a round trip through a [`SCALE`]-digit column.
/// Trailing zeros do not count.
pub fn fits_scale(a: Decimal) -> bool {
    a.normalize().scale() <= SCALE
}

/// Sums a sequence of quantities, failing on the first overflow.
pub fn sum<I>(quantities: I) -> Result<Decimal, ServiceError>
where
    I: IntoIterator<Item = Decimal>,
{
    quantities.into_iter().try_fold(Decimal::ZERO, add)
}
