use cask_core::{Cask, CaskResolveError, Resolver};

const CHECKSUM: &str = "5f2b4c1e8a7d6e3f9b0c1d2e3f4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9d0e1f2a";

fn load(version: &str, template: &str) -> Cask {
    Cask::parse_toml(format!(
        r#"
identifier = "inkwell"
version = "{version}"
url_template = "{template}"
checksum = "{CHECKSUM}"
"#
    ))
    .unwrap()
}

fn resolve(version: &str, template: &str) -> Result<String, CaskResolveError> {
    Resolver::new(&load(version, template))
        .resolve()
        .map(|url| url.to_string())
}

mod resolver {
    use super::*;

    #[test]
    fn substitutes_version() {
        assert_eq!(
            resolve(
                "1.0.9",
                "https://downloads.inkwell.app/Inkwell-#{version}.dmg"
            )
            .unwrap(),
            "https://downloads.inkwell.app/Inkwell-1.0.9.dmg"
        );
    }

    #[test]
    fn substitutes_every_occurrence() {
        assert_eq!(
            resolve("3.2.1", "https://x.dev/v#{version}/app-#{version}.zip").unwrap(),
            "https://x.dev/v3.2.1/app-3.2.1.zip"
        );
    }

    #[test]
    fn substitutes_derived_components() {
        assert_eq!(
            resolve(
                "14.2.7",
                "https://x.dev/#{version.major}/#{version.minor}/#{version.patch}/#{version.major_minor}/#{version.no_dots}.zip"
            )
            .unwrap(),
            "https://x.dev/14/2/7/14.2/1427.zip"
        );
    }

    #[test]
    fn is_deterministic() {
        let cask = load("1.0.9", "https://x.dev/#{version}.zip");

        assert_eq!(
            Resolver::new(&cask).resolve().unwrap(),
            Resolver::new(&cask).resolve().unwrap()
        );
    }

    #[test]
    fn supports_file_urls() {
        assert_eq!(
            resolve("1.0", "file:///mirror/app-#{version}.zip").unwrap(),
            "file:///mirror/app-1.0.zip"
        );
    }

    #[test]
    fn errors_without_placeholder() {
        assert!(matches!(
            resolve("1.0", "https://x.dev/app-latest.zip"),
            Err(CaskResolveError::MissingPlaceholder { .. })
        ));
    }

    #[test]
    fn errors_for_unknown_placeholder() {
        assert!(matches!(
            resolve("1.0", "https://x.dev/#{version.build}.zip"),
            Err(CaskResolveError::UnknownPlaceholder { .. })
        ));
    }

    #[test]
    fn errors_for_unavailable_component() {
        assert!(matches!(
            resolve("7", "https://x.dev/#{version.minor}.zip"),
            Err(CaskResolveError::UnavailableComponent { .. })
        ));
    }

    #[test]
    fn errors_for_relative_url() {
        assert!(matches!(
            resolve("1.0", "downloads/#{version}.zip"),
            Err(CaskResolveError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn errors_for_unsupported_scheme() {
        assert!(matches!(
            resolve("1.0", "ftp://x.dev/#{version}.zip"),
            Err(CaskResolveError::InvalidUrl { .. })
        ));
    }
}
