mod checksum_error;
mod sha;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use subtle::ConstantTimeEq;

pub use checksum_error::*;
pub use sha::*;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChecksumAlgorithm {
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            64 => Some(Self::Sha256),
            128 => Some(Self::Sha512),
            _ => None,
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

/// An expected or computed content digest. Parsed from plain hex
/// (the algorithm is derived from the length) or from an
/// `<algo>:<hex>` pair.
#[derive(Clone, Eq, PartialEq)]
pub struct Checksum {
    algorithm: ChecksumAlgorithm,
    digest: Vec<u8>,
}

impl Checksum {
    pub fn parse<S: AsRef<str>>(value: S) -> Result<Self, CaskChecksumError> {
        let value = value.as_ref().trim();

        if value.is_empty() || value.to_uppercase().contains("PLACEHOLDER") || value == ":no_check"
        {
            return Err(CaskChecksumError::Placeholder {
                value: value.to_owned(),
            });
        }

        let (algorithm, hex_value) = match value.split_once(':') {
            Some((algo, hex_value)) => {
                let algorithm = match algo.to_lowercase().as_str() {
                    "sha256" => ChecksumAlgorithm::Sha256,
                    "sha512" => ChecksumAlgorithm::Sha512,
                    _ => {
                        return Err(CaskChecksumError::UnsupportedAlgorithm {
                            algo: algo.to_owned(),
                        });
                    }
                };

                (Some(algorithm), hex_value)
            }
            None => (None, value),
        };

        if !hex_value.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(CaskChecksumError::InvalidHex {
                value: value.to_owned(),
            });
        }

        let algorithm = match algorithm {
            Some(algorithm) if algorithm.hex_len() == hex_value.len() => algorithm,
            None => ChecksumAlgorithm::from_hex_len(hex_value.len()).ok_or_else(|| {
                CaskChecksumError::InvalidLength {
                    value: value.to_owned(),
                    length: hex_value.len(),
                }
            })?,
            Some(_) => {
                return Err(CaskChecksumError::InvalidLength {
                    value: value.to_owned(),
                    length: hex_value.len(),
                });
            }
        };

        let digest = hex::decode(hex_value).map_err(|_| CaskChecksumError::InvalidHex {
            value: value.to_owned(),
        })?;

        Ok(Self { algorithm, digest })
    }

    pub(crate) fn from_digest(algorithm: ChecksumAlgorithm, digest: Vec<u8>) -> Self {
        Self { algorithm, digest }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }

    /// Compare digests without short-circuiting on the first differing byte.
    pub fn matches(&self, other: &Checksum) -> bool {
        self.algorithm == other.algorithm
            && self.digest.len() == other.digest.len()
            && bool::from(self.digest.ct_eq(&other.digest))
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Checksum {
    type Err = CaskChecksumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.algorithm {
            ChecksumAlgorithm::Sha256 => serializer.serialize_str(&self.to_hex()),
            ChecksumAlgorithm::Sha512 => {
                serializer.serialize_str(&format!("{}:{}", self.algorithm, self.to_hex()))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Checksum::parse(String::deserialize(deserializer)?)
            .map_err(|error| de::Error::custom(error.to_string()))
    }
}
