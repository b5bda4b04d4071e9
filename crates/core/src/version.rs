use crate::manifest_error::CaskManifestError;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Segment {
    Number(u64),
    Text(String),
}

/// An orderable cask version. Numeric segments are compared as numbers,
/// so `1.0.10` sorts after `1.0.9`, and trailing zero segments are
/// insignificant (`1.0` equals `1.0.0`).
#[derive(Clone, Debug)]
pub struct CaskVersion {
    raw: String,
    segments: Vec<Segment>,
}

impl CaskVersion {
    pub fn parse<S: AsRef<str>>(value: S) -> Result<Self, CaskManifestError> {
        let raw = value.as_ref().trim();
        let invalid = |reason: &str| CaskManifestError::InvalidField {
            field: "version".into(),
            reason: reason.to_owned(),
        };

        if raw.is_empty() {
            return Err(invalid("version must not be empty"));
        }

        if let Some(ch) = raw
            .chars()
            .find(|ch| !ch.is_ascii_alphanumeric() && !matches!(ch, '.' | '-' | '_' | '+' | ','))
        {
            return Err(invalid(&format!(
                "{raw:?} contains the unsupported character {ch:?}"
            )));
        }

        let mut segments = vec![];

        for part in raw.split(['.', '-', '_', '+', ',']) {
            if part.is_empty() {
                return Err(invalid(&format!("{raw:?} contains an empty segment")));
            }

            // Split on digit/letter boundaries, so 1.0b2 becomes [1, 0, b, 2]
            let mut current = String::new();
            let mut current_is_digit = None;

            for ch in part.chars() {
                let is_digit = ch.is_ascii_digit();

                if current_is_digit.is_some_and(|prev| prev != is_digit) {
                    segments.push(Self::create_segment(&current)?);
                    current.clear();
                }

                current.push(ch);
                current_is_digit = Some(is_digit);
            }

            if !current.is_empty() {
                segments.push(Self::create_segment(&current)?);
            }
        }

        if !matches!(segments.first(), Some(Segment::Number(_))) {
            return Err(invalid(&format!(
                "{raw:?} is not orderable, it must start with a number"
            )));
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    fn create_segment(value: &str) -> Result<Segment, CaskManifestError> {
        if value.starts_with(|ch: char| ch.is_ascii_digit()) {
            value
                .parse::<u64>()
                .map(Segment::Number)
                .map_err(|_| CaskManifestError::InvalidField {
                    field: "version".into(),
                    reason: format!("segment {value:?} is too large"),
                })
        } else {
            Ok(Segment::Text(value.to_lowercase()))
        }
    }

    fn number_at(&self, index: usize) -> Option<u64> {
        match self.segments.get(index) {
            Some(Segment::Number(number)) => Some(*number),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> Option<u64> {
        self.number_at(0)
    }

    pub fn minor(&self) -> Option<u64> {
        self.number_at(1)
    }

    pub fn patch(&self) -> Option<u64> {
        self.number_at(2)
    }
}

impl Ord for CaskVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());

        for index in 0..len {
            let ordering = match (self.segments.get(index), other.segments.get(index)) {
                (Some(Segment::Number(a)), Some(Segment::Number(b))) => a.cmp(b),
                (Some(Segment::Text(a)), Some(Segment::Text(b))) => a.cmp(b),
                // Releases sort after pre-release labels: 1.0.0 > 1.0.beta
                (Some(Segment::Number(_)), Some(Segment::Text(_))) => Ordering::Greater,
                (Some(Segment::Text(_)), Some(Segment::Number(_))) => Ordering::Less,
                (Some(Segment::Number(a)), None) => a.cmp(&0),
                (None, Some(Segment::Number(b))) => 0.cmp(b),
                (Some(Segment::Text(_)), None) => Ordering::Less,
                (None, Some(Segment::Text(_))) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }
}

impl PartialOrd for CaskVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CaskVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CaskVersion {}

impl fmt::Display for CaskVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for CaskVersion {
    type Err = CaskManifestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for CaskVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for CaskVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        CaskVersion::parse(String::deserialize(deserializer)?)
            .map_err(|error| de::Error::custom(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(value: &str) -> CaskVersion {
        CaskVersion::parse(value).unwrap()
    }

    #[test]
    fn compares_numerically() {
        assert!(v("1.0.10") > v("1.0.9"));
        assert!(v("2.0") > v("1.99.99"));
        assert!(v("0.2.0") > v("0.1.12"));
    }

    #[test]
    fn ignores_trailing_zeros() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn pre_release_labels_sort_first() {
        assert!(v("1.0.0") > v("1.0.0-beta"));
        assert!(v("1.0b2") > v("1.0b1"));
        assert!(v("1.0") > v("1.0rc1"));
    }

    #[test]
    fn exposes_components() {
        let version = v("1.0.9");

        assert_eq!(version.major(), Some(1));
        assert_eq!(version.minor(), Some(0));
        assert_eq!(version.patch(), Some(9));
        assert_eq!(v("7").minor(), None);
    }

    #[test]
    fn rejects_invalid() {
        assert!(CaskVersion::parse("").is_err());
        assert!(CaskVersion::parse("   ").is_err());
        assert!(CaskVersion::parse("latest").is_err());
        assert!(CaskVersion::parse("1..2").is_err());
        assert!(CaskVersion::parse("1.0/2").is_err());
        assert!(CaskVersion::parse("1.0 beta").is_err());
    }
}
