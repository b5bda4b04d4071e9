use crate::checksum::Checksum;
use crate::helpers::expand_home_path;
use crate::id::CaskId;
use crate::manifest_error::CaskManifestError;
use crate::os::OsRequirement;
use crate::version::CaskVersion;
use serde::{Deserialize, Serialize};
use starbase_utils::{fs, glob};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};
use url::Url;

/// The application bundle a cask places into the applications directory.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppArtifact(String);

impl AppArtifact {
    pub fn parse<S: AsRef<str>>(value: S) -> Result<Self, CaskManifestError> {
        let value = value.as_ref().trim();
        let invalid = |reason: &str| CaskManifestError::InvalidField {
            field: "app".into(),
            reason: format!("{value:?} {reason}"),
        };

        if !value.ends_with(".app") || value.len() <= 4 {
            return Err(invalid("must be an application bundle ending in .app"));
        }

        if value.contains(['/', '\\']) || value.starts_with('.') {
            return Err(invalid("must be a single bundle name, not a path"));
        }

        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AppArtifact {
    type Error = CaskManifestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<AppArtifact> for String {
    fn from(value: AppArtifact) -> String {
        value.0
    }
}

/// A per-user state location removed by zap. Either absolute or relative
/// to the home directory (`~/...`), with optional `*` and `?` wildcards
/// in the final component.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct CleanupPath(String);

impl CleanupPath {
    pub fn parse<S: AsRef<str>>(value: S) -> Result<Self, CaskManifestError> {
        let value = value.as_ref().trim();
        let invalid = |reason: &str| CaskManifestError::InvalidField {
            field: "cleanup_paths".into(),
            reason: format!("{value:?} {reason}"),
        };

        if !value.starts_with("~/") && !value.starts_with('/') {
            return Err(invalid("must be absolute or start with ~/"));
        }

        let path = Path::new(value);
        let mut normal_count = 0;

        for component in path.components() {
            match component {
                Component::ParentDir | Component::CurDir => {
                    return Err(invalid("must not contain . or .. segments"));
                }
                Component::Normal(_) => normal_count += 1,
                _ => {}
            };
        }

        // ~ counts as a normal component
        let min_count = if value.starts_with('~') { 2 } else { 1 };

        if normal_count < min_count {
            return Err(invalid("must not target the home or root directory"));
        }

        if let Some(parent) = path.parent()
            && parent.to_string_lossy().contains(['*', '?'])
        {
            return Err(invalid("may only use wildcards in the final segment"));
        }

        if path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().chars().all(|c| c == '*' || c == '?'))
        {
            return Err(invalid("must not match every entry of a directory"));
        }

        if let Some(name) = path.file_name().map(|name| name.to_string_lossy())
            && name.contains(['*', '?'])
            && glob::create_glob(&name).is_err()
        {
            return Err(invalid("is not a valid wildcard pattern"));
        }

        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn has_wildcard(&self) -> bool {
        self.0.contains(['*', '?'])
    }

    pub fn expand(&self, home_dir: &Path) -> PathBuf {
        expand_home_path(&self.0, home_dir)
    }
}

impl fmt::Display for CleanupPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CleanupPath {
    type Error = CaskManifestError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<CleanupPath> for String {
    fn from(value: CleanupPath) -> String {
        value.0
    }
}

// Raw shape of a manifest file. Everything is optional here so that
// missing fields can be reported by name, and unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CaskManifest {
    identifier: Option<String>,
    name: Option<String>,
    desc: Option<String>,
    homepage: Option<String>,
    version: Option<String>,
    #[serde(alias = "url")]
    url_template: Option<String>,
    #[serde(alias = "sha256")]
    checksum: Option<String>,
    os_constraint: Option<String>,
    auto_updates: Option<bool>,
    app: Option<String>,
    cleanup_paths: Vec<String>,
}

fn require(field: &str, value: Option<String>) -> Result<String, CaskManifestError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(CaskManifestError::MissingField {
            field: field.to_owned(),
        }),
    }
}

/// A loaded cask manifest. Values are validated on load and never
/// change afterwards; a new version means a new `Cask`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cask {
    id: CaskId,
    name: String,
    desc: Option<String>,
    homepage: Option<Url>,
    version: CaskVersion,
    url_template: String,
    checksum: Checksum,
    os_constraint: Option<OsRequirement>,
    auto_updates: bool,
    artifact: AppArtifact,
    cleanup_paths: Vec<CleanupPath>,
}

impl Cask {
    #[instrument(name = "load_cask")]
    pub fn load<P: AsRef<Path> + fmt::Debug>(path: P) -> Result<Self, CaskManifestError> {
        let path = path.as_ref();

        debug!(file = ?path, "Loading cask manifest");

        let content = fs::read_file(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::parse_toml(&content),
            Some("json") => Self::parse_json(&content),
            _ => Err(CaskManifestError::UnknownFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn parse_toml<S: AsRef<str>>(content: S) -> Result<Self, CaskManifestError> {
        let manifest: CaskManifest =
            toml::from_str(content.as_ref()).map_err(|error| CaskManifestError::InvalidSyntax {
                format: "TOML".into(),
                error: Box::new(error),
            })?;

        Self::from_manifest(manifest)
    }

    pub fn parse_json<S: AsRef<str>>(content: S) -> Result<Self, CaskManifestError> {
        let manifest: CaskManifest = serde_json::from_str(content.as_ref()).map_err(|error| {
            CaskManifestError::InvalidSyntax {
                format: "JSON".into(),
                error: Box::new(error),
            }
        })?;

        Self::from_manifest(manifest)
    }

    fn from_manifest(manifest: CaskManifest) -> Result<Self, CaskManifestError> {
        let id = CaskId::new(require("identifier", manifest.identifier)?.trim())?;
        let version = CaskVersion::parse(require("version", manifest.version)?)?;
        let url_template = require("url_template", manifest.url_template)?
            .trim()
            .to_owned();

        let checksum = Checksum::parse(require("checksum", manifest.checksum)?).map_err(
            |error| CaskManifestError::InvalidField {
                field: "checksum".into(),
                reason: error.to_string(),
            },
        )?;

        let name = manifest
            .name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_string());

        let homepage = match manifest.homepage {
            Some(homepage) => Some(Url::parse(homepage.trim()).map_err(|error| {
                CaskManifestError::InvalidField {
                    field: "homepage".into(),
                    reason: error.to_string(),
                }
            })?),
            None => None,
        };

        let os_constraint = match manifest.os_constraint {
            Some(constraint) => Some(OsRequirement::parse(constraint)?),
            None => None,
        };

        let artifact = match manifest.app {
            Some(app) => AppArtifact::parse(app)?,
            None => AppArtifact::parse(format!("{name}.app"))?,
        };

        let mut cleanup_paths: Vec<CleanupPath> = vec![];

        for path in manifest.cleanup_paths {
            let path = CleanupPath::parse(path)?;

            // Ordered set, keep the first occurrence
            if !cleanup_paths.contains(&path) {
                cleanup_paths.push(path);
            }
        }

        Ok(Self {
            id,
            name,
            desc: manifest.desc,
            homepage,
            version,
            url_template,
            checksum,
            os_constraint,
            auto_updates: manifest.auto_updates.unwrap_or_default(),
            artifact,
            cleanup_paths,
        })
    }

    pub fn id(&self) -> &CaskId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn homepage(&self) -> Option<&Url> {
        self.homepage.as_ref()
    }

    pub fn version(&self) -> &CaskVersion {
        &self.version
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn os_constraint(&self) -> Option<&OsRequirement> {
        self.os_constraint.as_ref()
    }

    pub fn auto_updates(&self) -> bool {
        self.auto_updates
    }

    pub fn artifact(&self) -> &AppArtifact {
        &self.artifact
    }

    pub fn cleanup_paths(&self) -> &[CleanupPath] {
        &self.cleanup_paths
    }
}
