use {
    crate::{Error, Result},
    serde::{de, ser},
    std::{
        fmt::{self, Display},
        str::FromStr,
    },
};

/// A market/asset identifier: one or more lowercase alphanumeric parts
/// separated by forward slashes, e.g. `usdc` or `bridge/eth`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Denom(String);

impl Denom {
    pub const MAX_LENGTH: usize = 128;

    pub fn new(inner: impl Into<String>) -> Result<Self> {
        let inner = inner.into();

        if inner.is_empty() || inner.len() > Self::MAX_LENGTH {
            return Err(Error::InvalidDenom {
                input: inner,
                reason: format!("length must be between 1 and {}", Self::MAX_LENGTH),
            });
        }

        for part in inner.split('/') {
            if part.is_empty()
                || !part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            {
                return Err(Error::InvalidDenom {
                    input: inner,
                    reason: "parts must be non-empty lowercase alphanumeric".to_string(),
                });
            }
        }

        Ok(Self(inner))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Denom {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Display for Denom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ser::Serialize for Denom {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> de::Deserialize<'de> for Denom {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let s = <&str as de::Deserialize>::deserialize(deserializer)?;
        Denom::from_str(s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, test_case::test_case};

    #[test_case("usdc", true; "plain")]
    #[test_case("bridge/eth", true; "nested")]
    #[test_case("", false; "empty")]
    #[test_case("USDC", false; "uppercase")]
    #[test_case("a//b", false; "empty part")]
    fn validation(input: &str, ok: bool) {
        assert_eq!(Denom::new(input).is_ok(), ok);
    }
}
