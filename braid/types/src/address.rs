use {
    crate::{Error, Result},
    serde::{de, ser},
    std::{
        fmt::{self, Display},
        str::FromStr,
    },
};

/// A user address: 20 bytes, rendered in hex with the `0x` prefix.
///
/// Addresses are validated during deserialization; if deserialization does
/// not throw an error, the address is well-formed.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr([u8; Self::LENGTH]);

impl Addr {
    pub const LENGTH: usize = 20;
    /// The all-zero address, rejected by every operation's validation step.
    pub const ZERO: Self = Self([0; Self::LENGTH]);

    pub const fn from_array(array: [u8; Self::LENGTH]) -> Self {
        Self(array)
    }

    pub const fn into_array(self) -> [u8; Self::LENGTH] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Generate a mock address for use in testing.
    pub const fn mock(index: u8) -> Self {
        let mut bytes = [0; Self::LENGTH];
        bytes[Self::LENGTH - 1] = index;
        Self(bytes)
    }
}

impl AsRef<[u8]> for Addr {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Addr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| Error::InvalidAddress {
                input: s.to_string(),
                reason: "missing `0x` prefix".to_string(),
            })?;

        if hex.len() != Self::LENGTH * 2 {
            return Err(Error::InvalidAddress {
                input: s.to_string(),
                reason: format!("expected {} hex characters", Self::LENGTH * 2),
            });
        }

        let mut bytes = [0; Self::LENGTH];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|err| {
                Error::InvalidAddress {
                    input: s.to_string(),
                    reason: err.to_string(),
                }
            })?;
        }

        Ok(Self(bytes))
    }
}

impl Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl ser::Serialize for Addr {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> de::Deserialize<'de> for Addr {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let s = <&str as de::Deserialize>::deserialize(deserializer)?;
        Addr::from_str(s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_from_str_round_trips() {
        let addr = Addr::mock(42);
        assert_eq!(Addr::from_str(&addr.to_string()).unwrap(), addr);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Addr::from_str("not an address").is_err());
        assert!(Addr::from_str("0x1234").is_err());
    }
}
