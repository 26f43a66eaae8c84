use {
    crate::{IsZero, MathError, MathResult, NumberConst},
    bnum::types::U256,
    serde::{de, ser},
    std::{
        fmt::{self, Display},
        iter::Sum,
        ops::{Add, AddAssign, Sub, SubAssign},
        str::FromStr,
    },
};

/// An unsigned 128-bit integer amount.
///
/// All fallible arithmetic goes through the `checked_*` methods, which return
/// a [`MathResult`] instead of panicking or wrapping.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint128(u128);

impl Uint128 {
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn into_inner(self) -> u128 {
        self.0
    }

    pub fn checked_add(self, rhs: Self) -> MathResult<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| MathError::overflow_add::<Self>(self, rhs))
    }

    pub fn checked_sub(self, rhs: Self) -> MathResult<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or_else(|| MathError::overflow_sub::<Self>(self, rhs))
    }

    pub fn checked_mul(self, rhs: Self) -> MathResult<Self> {
        self.0
            .checked_mul(rhs.0)
            .map(Self)
            .ok_or_else(|| MathError::overflow_mul::<Self>(self, rhs))
    }

    pub fn checked_add_assign(&mut self, rhs: Self) -> MathResult<()> {
        *self = self.checked_add(rhs)?;
        Ok(())
    }

    pub fn checked_sub_assign(&mut self, rhs: Self) -> MathResult<()> {
        *self = self.checked_sub(rhs)?;
        Ok(())
    }

    /// Subtract, flooring the result at zero instead of underflowing.
    ///
    /// This is the mandated policy for all scaled-balance decreases: debiting
    /// more than is present empties the balance, it never goes negative.
    pub fn zero_floor_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

/// Describes operations where a number is multiplied by a numerator then
/// immediately divided by a denominator.
/// This is different from applying a multiplication and a division
/// sequentially, because the multiplication part can overflow.
pub trait MultiplyRatio: Sized {
    fn checked_multiply_ratio_floor(self, numerator: Self, denominator: Self) -> MathResult<Self>;

    fn checked_multiply_ratio_ceil(self, numerator: Self, denominator: Self) -> MathResult<Self>;
}

impl MultiplyRatio for Uint128 {
    fn checked_multiply_ratio_floor(self, numerator: Self, denominator: Self) -> MathResult<Self> {
        if denominator.is_zero() {
            return Err(MathError::division_by_zero(self));
        }

        let full = U256::from(self.0) * U256::from(numerator.0);
        let quotient = full / U256::from(denominator.0);

        u128::try_from(quotient)
            .map(Self)
            .map_err(|_| MathError::overflow_conversion::<U256, Self>(quotient))
    }

    fn checked_multiply_ratio_ceil(self, numerator: Self, denominator: Self) -> MathResult<Self> {
        if denominator.is_zero() {
            return Err(MathError::division_by_zero(self));
        }

        let full = U256::from(self.0) * U256::from(numerator.0);
        let denominator = U256::from(denominator.0);
        let quotient = full / denominator;
        let remainder = full % denominator;

        let quotient = u128::try_from(quotient)
            .map(Self)
            .map_err(|_| MathError::overflow_conversion::<U256, Self>(quotient))?;

        if remainder.is_zero() {
            Ok(quotient)
        } else {
            quotient.checked_add(Self::ONE)
        }
    }
}

impl NumberConst for Uint128 {
    const MAX: Self = Self(u128::MAX);
    const MIN: Self = Self(u128::MIN);
    const ONE: Self = Self(1);
    const TEN: Self = Self(10);
    const ZERO: Self = Self(0);
}

impl IsZero for Uint128 {
    fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u128> for Uint128 {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<Uint128> for u128 {
    fn from(value: Uint128) -> Self {
        value.0
    }
}

// Std ops panic on overflow. They exist for ergonomics in tests and constant
// expressions; production code paths use the checked methods.
impl Add for Uint128 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.checked_add(rhs).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl Sub for Uint128 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.checked_sub(rhs).unwrap_or_else(|err| panic!("{err}"))
    }
}

impl AddAssign for Uint128 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Uint128 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for Uint128 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl FromStr for Uint128 {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u128::from_str(s)
            .map(Self)
            .map_err(|err| MathError::parse_number::<Self>(s, err))
    }
}

impl Display for Uint128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ser::Serialize for Uint128 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> de::Deserialize<'de> for Uint128 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let s = <&str as de::Deserialize>::deserialize(deserializer)?;
        Uint128::from_str(s).map_err(de::Error::custom)
    }
}

// ----------------------------------- tests -----------------------------------
