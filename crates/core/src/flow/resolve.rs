pub use super::resolve_error::CaskResolveError;
use crate::manifest::Cask;
use crate::version::CaskVersion;
use tracing::{debug, instrument};
use url::Url;

const PLACEHOLDER_START: &str = "#{";

/// Turns a cask's URL template into a concrete download URL.
pub struct Resolver<'cask> {
    cask: &'cask Cask,
}

impl<'cask> Resolver<'cask> {
    pub fn new(cask: &'cask Cask) -> Self {
        Self { cask }
    }

    /// Substitute the cask version into its URL template. The same cask
    /// always resolves to the same URL.
    #[instrument(skip(self), fields(cask = self.cask.id().as_str()))]
    pub fn resolve(&self) -> Result<Url, CaskResolveError> {
        let url = render_template(self.cask.url_template(), self.cask.version())?;

        debug!(url = url.as_str(), "Resolved download URL");

        Ok(url)
    }
}

fn get_component(
    placeholder: &str,
    version: &CaskVersion,
) -> Result<Option<String>, CaskResolveError> {
    let unavailable = || CaskResolveError::UnavailableComponent {
        placeholder: placeholder.to_owned(),
        version: version.to_string(),
    };

    let value = match placeholder {
        "version" => version.as_str().to_owned(),
        "version.major" => version.major().ok_or_else(unavailable)?.to_string(),
        "version.minor" => version.minor().ok_or_else(unavailable)?.to_string(),
        "version.patch" => version.patch().ok_or_else(unavailable)?.to_string(),
        "version.major_minor" => format!(
            "{}.{}",
            version.major().ok_or_else(unavailable)?,
            version.minor().ok_or_else(unavailable)?
        ),
        "version.no_dots" => version.as_str().replace('.', ""),
        _ => return Ok(None),
    };

    Ok(Some(value))
}

/// Render a URL template against a version.
pub fn render_template(template: &str, version: &CaskVersion) -> Result<Url, CaskResolveError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    let mut substituted = false;

    while let Some(start) = rest.find(PLACEHOLDER_START) {
        output.push_str(&rest[..start]);

        let after = &rest[start + PLACEHOLDER_START.len()..];
        let Some(end) = after.find('}') else {
            return Err(CaskResolveError::UnterminatedPlaceholder {
                template: template.to_owned(),
            });
        };

        let placeholder = after[..end].trim();

        match get_component(placeholder, version)? {
            Some(value) => output.push_str(&value),
            None => {
                return Err(CaskResolveError::UnknownPlaceholder {
                    placeholder: format!("#{{{placeholder}}}"),
                    template: template.to_owned(),
                });
            }
        };

        substituted = true;
        rest = &after[end + 1..];
    }

    output.push_str(rest);

    if !substituted {
        return Err(CaskResolveError::MissingPlaceholder {
            template: template.to_owned(),
        });
    }

    let url = Url::parse(&output).map_err(|error| CaskResolveError::InvalidUrl {
        url: output.clone(),
        reason: error.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https" | "file") {
        return Err(CaskResolveError::InvalidUrl {
            url: output,
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }

    if url.scheme() != "file" && url.host_str().is_none_or(|host| host.is_empty()) {
        return Err(CaskResolveError::InvalidUrl {
            url: output,
            reason: "missing host".into(),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(value: &str) -> CaskVersion {
        CaskVersion::parse(value).unwrap()
    }

    #[test]
    fn substitutes_components() {
        let url = render_template(
            "https://dl.example.com/#{version.major_minor}/app-#{version.no_dots}-#{version.patch}.zip",
            &version("2.14.3"),
        )
        .unwrap();

        assert_eq!(url.as_str(), "https://dl.example.com/2.14/app-2143-3.zip");
    }

    #[test]
    fn errors_for_missing_patch() {
        assert!(matches!(
            render_template("https://x.dev/#{version.patch}.zip", &version("3.1")),
            Err(CaskResolveError::UnavailableComponent { .. })
        ));
    }

    #[test]
    fn errors_for_unterminated() {
        assert!(matches!(
            render_template("https://x.dev/#{version.zip", &version("3.1")),
            Err(CaskResolveError::UnterminatedPlaceholder { .. })
        ));
    }
}
