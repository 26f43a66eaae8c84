use {
    crate::{IsZero, MathError, MathResult, MultiplyRatio, NumberConst, Uint128},
    serde::{de, ser},
    std::{
        fmt::{self, Display},
        str::FromStr,
    },
};

/// An unsigned fixed-point number with 27 decimal places, the unit in which
/// interest indexes, prices, and health factors are expressed.
///
/// `Ray::ONE` is the neutral index: a scaled balance multiplied by it yields
/// the same underlying amount.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ray(Uint128);

impl Ray {
    pub const DECIMAL_PLACES: u32 = 27;
    pub const PRECISION: Uint128 = Uint128::new(10u128.pow(27));

    /// Create a [`Ray`] from the raw 27-decimal integer representation,
    /// _without_ adding decimal places.
    pub const fn raw(value: Uint128) -> Self {
        Self(value)
    }

    pub const fn numerator(self) -> Uint128 {
        self.0
    }

    /// `x` percent, e.g. `Ray::new_percent(50)` is 0.5.
    pub const fn new_percent(percent: u64) -> Self {
        Self(Uint128::new(percent as u128 * 10u128.pow(25)))
    }

    /// `x` basis points, e.g. `Ray::new_bps(1500)` is 0.15.
    pub const fn new_bps(bps: u64) -> Self {
        Self(Uint128::new(bps as u128 * 10u128.pow(23)))
    }

    /// The ratio between two integer amounts, rounded down.
    pub fn checked_from_ratio(numerator: Uint128, denominator: Uint128) -> MathResult<Self> {
        numerator
            .checked_multiply_ratio_floor(Self::PRECISION, denominator)
            .map(Self)
    }

    pub fn checked_add(self, rhs: Self) -> MathResult<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> MathResult<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn zero_floor_sub(self, rhs: Self) -> Self {
        Self(self.0.zero_floor_sub(rhs.0))
    }

    /// Ray-by-ray product, rounded down.
    pub fn checked_mul(self, rhs: Self) -> MathResult<Self> {
        self.0
            .checked_multiply_ratio_floor(rhs.0, Self::PRECISION)
            .map(Self)
    }

    /// Ray-by-ray quotient, rounded down.
    pub fn checked_div(self, rhs: Self) -> MathResult<Self> {
        if rhs.is_zero() {
            return Err(MathError::division_by_zero(self));
        }

        self.0
            .checked_multiply_ratio_floor(Self::PRECISION, rhs.0)
            .map(Self)
    }
}

impl NumberConst for Ray {
    const MAX: Self = Self(Uint128::MAX);
    const MIN: Self = Self(Uint128::MIN);
    const ONE: Self = Self(Self::PRECISION);
    const TEN: Self = Self(Uint128::new(10u128.pow(28)));
    const ZERO: Self = Self(Uint128::ZERO);
}

impl IsZero for Ray {
    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// Describes operations between an integer amount and a [`Ray`], with an
/// explicit rounding direction.
///
/// These four functions are the only way amounts cross the scaled/underlying
/// boundary; see the crate-level notes on rounding.
pub trait MultiplyFraction: Sized {
    fn checked_mul_ray_floor(self, rhs: Ray) -> MathResult<Self>;

    fn checked_mul_ray_ceil(self, rhs: Ray) -> MathResult<Self>;

    fn checked_div_ray_floor(self, rhs: Ray) -> MathResult<Self>;

    fn checked_div_ray_ceil(self, rhs: Ray) -> MathResult<Self>;
}

impl MultiplyFraction for Uint128 {
    fn checked_mul_ray_floor(self, rhs: Ray) -> MathResult<Self> {
        // If either side is zero, then simply return zero.
        if self.is_zero() || rhs.is_zero() {
            return Ok(Self::ZERO);
        }

        self.checked_multiply_ratio_floor(rhs.numerator(), Ray::PRECISION)
    }

    fn checked_mul_ray_ceil(self, rhs: Ray) -> MathResult<Self> {
        if self.is_zero() || rhs.is_zero() {
            return Ok(Self::ZERO);
        }

        self.checked_multiply_ratio_ceil(rhs.numerator(), Ray::PRECISION)
    }

    fn checked_div_ray_floor(self, rhs: Ray) -> MathResult<Self> {
        if rhs.is_zero() {
            return Err(MathError::division_by_zero(self));
        }

        if self.is_zero() {
            return Ok(Self::ZERO);
        }

        self.checked_multiply_ratio_floor(Ray::PRECISION, rhs.numerator())
    }

    fn checked_div_ray_ceil(self, rhs: Ray) -> MathResult<Self> {
        if rhs.is_zero() {
            return Err(MathError::division_by_zero(self));
        }

        if self.is_zero() {
            return Ok(Self::ZERO);
        }

        self.checked_multiply_ratio_ceil(Ray::PRECISION, rhs.numerator())
    }
}

impl FromStr for Ray {
    type Err = MathError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (whole, fraction) = match input.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (input, None),
        };

        let whole = u128::from_str(whole)
            .map_err(|err| MathError::parse_number::<Self>(input, err))?;
        let mut raw = whole
            .checked_mul(Self::PRECISION.into_inner())
            .ok_or_else(|| MathError::parse_number::<Self>(input, "value too big"))?;

        if let Some(fraction) = fraction {
            if fraction.is_empty() || fraction.len() > Self::DECIMAL_PLACES as usize {
                return Err(MathError::parse_number::<Self>(
                    input,
                    "fractional part must have between 1 and 27 digits",
                ));
            }

            let digits = u128::from_str(fraction)
                .map_err(|err| MathError::parse_number::<Self>(input, err))?;
            let scale = 10u128.pow(Self::DECIMAL_PLACES - fraction.len() as u32);
            raw = raw
                .checked_add(digits * scale)
                .ok_or_else(|| MathError::parse_number::<Self>(input, "value too big"))?;
        }

        Ok(Self(Uint128::new(raw)))
    }
}

impl Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let raw = self.0.into_inner();
        let precision = Self::PRECISION.into_inner();
        let whole = raw / precision;
        let fraction = raw % precision;

        if fraction == 0 {
            write!(f, "{whole}")
        } else {
            let padded = format!("{fraction:027}");
            write!(f, "{whole}.{}", padded.trim_end_matches('0'))
        }
    }
}

impl ser::Serialize for Ray {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> de::Deserialize<'de> for Ray {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let s = <&str as de::Deserialize>::deserialize(deserializer)?;
        Ray::from_str(s).map_err(de::Error::custom)
    }
}

// ----------------------------------- tests -----------------------------------
