use crate::manifest_error::CaskManifestError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::sync::LazyLock;
use std::{borrow::Borrow, fmt, ops::Deref, str::FromStr};

#[doc(hidden)]
pub static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9\-_.@+]*$").unwrap());

/// A stable identifier for a cask. Also used as a file name for
/// receipts and locks, so path separators are never allowed.
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct CaskId(String);

impl CaskId {
    pub fn new<S: AsRef<str>>(id: S) -> Result<CaskId, CaskManifestError> {
        let id = id.as_ref();

        if !ID_PATTERN.is_match(id) {
            return Err(CaskManifestError::InvalidField {
                field: "identifier".into(),
                reason: format!(
                    "{id:?} must be lowercase and only contain letters, numbers, and -_.@+"
                ),
            });
        }

        Ok(Self::raw(id))
    }

    pub fn raw<S: AsRef<str>>(id: S) -> CaskId {
        CaskId(id.as_ref().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<CaskId> for CaskId {
    fn as_ref(&self) -> &CaskId {
        self
    }
}

impl Deref for CaskId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<str> for CaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for CaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for CaskId {
    type Err = CaskManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaskId::new(s)
    }
}

impl<'de> Deserialize<'de> for CaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        CaskId::new(String::deserialize(deserializer)?)
            .map_err(|error| de::Error::custom(error.to_string()))
    }
}
