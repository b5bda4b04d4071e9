use crate::env_error::CaskEnvError;
use crate::manifest_error::CaskManifestError;
use crate::version::CaskVersion;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::env::{self, consts};
use std::fmt;
use crate::utils::process::exec_command_blocking;
use std::process::Command;
use tracing::{debug, trace};

/// Named macOS releases, oldest first.
pub const MACOS_RELEASES: &[(&str, &str)] = &[
    ("cheetah", "10.0"),
    ("puma", "10.1"),
    ("jaguar", "10.2"),
    ("panther", "10.3"),
    ("tiger", "10.4"),
    ("leopard", "10.5"),
    ("snow_leopard", "10.6"),
    ("lion", "10.7"),
    ("mountain_lion", "10.8"),
    ("mavericks", "10.9"),
    ("yosemite", "10.10"),
    ("el_capitan", "10.11"),
    ("sierra", "10.12"),
    ("high_sierra", "10.13"),
    ("mojave", "10.14"),
    ("catalina", "10.15"),
    ("big_sur", "11"),
    ("monterey", "12"),
    ("ventura", "13"),
    ("sonoma", "14"),
    ("sequoia", "15"),
    ("tahoe", "26"),
];

fn find_release_name(version: &CaskVersion) -> Option<&'static str> {
    MACOS_RELEASES
        .iter()
        .rev()
        .find(|(_, release)| CaskVersion::parse(release).is_ok_and(|min| version >= &min))
        .map(|(name, _)| *name)
}

/// A minimum macOS version a cask requires, written as a codename
/// (`big_sur`, `:big_sur`, `>= :big_sur`) or a number (`11`, `13.2`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OsRequirement {
    label: String,
    minimum: CaskVersion,
}

impl OsRequirement {
    pub fn parse<S: AsRef<str>>(value: S) -> Result<Self, CaskManifestError> {
        let label = value.as_ref().trim();
        let invalid = |reason: String| CaskManifestError::InvalidField {
            field: "os_constraint".into(),
            reason,
        };

        let mut constraint = label;

        if let Some(rest) = constraint.strip_prefix(">=") {
            constraint = rest.trim_start();
        } else if constraint.starts_with(['<', '>', '=', '!']) {
            return Err(invalid(format!(
                "{label:?} is not supported, only minimum versions (>=) may be required"
            )));
        }

        let constraint = constraint.trim_start_matches(':').to_lowercase();

        if constraint.is_empty() {
            return Err(invalid("constraint must not be empty".into()));
        }

        let minimum = match MACOS_RELEASES
            .iter()
            .find(|(name, _)| *name == constraint)
        {
            Some((_, version)) => CaskVersion::parse(version)?,
            None => CaskVersion::parse(&constraint).map_err(|_| {
                invalid(format!("{label:?} is not a known macOS release or version"))
            })?,
        };

        Ok(Self {
            label: label.to_owned(),
            minimum,
        })
    }

    pub fn minimum(&self) -> &CaskVersion {
        &self.minimum
    }
}

impl fmt::Display for OsRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match find_release_name(&self.minimum) {
            Some(name) => write!(f, "macOS >= {} ({name})", self.minimum),
            None => write!(f, "macOS >= {}", self.minimum),
        }
    }
}

impl Serialize for OsRequirement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for OsRequirement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        OsRequirement::parse(String::deserialize(deserializer)?)
            .map_err(|error| de::Error::custom(error.to_string()))
    }
}

/// The operating system the engine is running on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HostOs {
    pub os: String,
    /// Only known for macOS hosts.
    pub version: Option<CaskVersion>,
}

impl HostOs {
    pub fn macos<S: AsRef<str>>(version: S) -> Result<Self, CaskEnvError> {
        let version = version.as_ref();

        Ok(Self {
            os: "macos".into(),
            version: Some(CaskVersion::parse(version).map_err(|_| {
                CaskEnvError::InvalidOsVersion {
                    version: version.to_owned(),
                }
            })?),
        })
    }

    /// Detect the host, allowing `CASK_OS_VERSION` to stand in for a
    /// macOS version (used by tests and for dry runs on other systems).
    pub fn detect() -> Result<Self, CaskEnvError> {
        if let Ok(version) = env::var("CASK_OS_VERSION")
            && !version.is_empty()
        {
            debug!(version, "Using macOS version from CASK_OS_VERSION");

            return Self::macos(version);
        }

        if consts::OS == "macos" {
            trace!("Detecting macOS version with sw_vers");

            let version =
                exec_command_blocking(Command::new("sw_vers").arg("-productVersion")).map_err(
                    |error| CaskEnvError::FailedOsDetection {
                        error: Box::new(error),
                    },
                )?;

            return Self::macos(version.trim());
        }

        Ok(Self {
            os: consts::OS.to_owned(),
            version: None,
        })
    }

    pub fn satisfies(&self, requirement: Option<&OsRequirement>) -> bool {
        let Some(requirement) = requirement else {
            return true;
        };

        self.os == "macos"
            && self
                .version
                .as_ref()
                .is_some_and(|version| version >= requirement.minimum())
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.version, self.os.as_str()) {
            (Some(version), "macos") => match find_release_name(version) {
                Some(name) => write!(f, "macOS {version} ({name})"),
                None => write!(f, "macOS {version}"),
            },
            (Some(version), os) => write!(f, "{os} {version}"),
            (None, os) => write!(f, "{os}"),
        }
    }
}
