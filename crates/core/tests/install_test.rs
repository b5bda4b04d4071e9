mod utils;

use cask_core::{
    CancelToken, Cask, CaskEnvironment, CaskInstallError, CaskVersion, FetchOptions, Fetcher,
    HostOs, InstallPlan, InstalledState, InstallTarget, Installer, Resolver, SkipReason, VerifiedArtifact,
};
use starbase_sandbox::{Sandbox, create_empty_sandbox};
use std::time::Duration;
use utils::*;

async fn fetch(env: &CaskEnvironment, cask: &Cask) -> VerifiedArtifact {
    let url = Resolver::new(cask).resolve().unwrap();

    Fetcher::new(env)
        .unwrap()
        .fetch_and_verify(&url, cask.checksum(), &FetchOptions::default())
        .await
        .unwrap()
}

async fn install(env: &CaskEnvironment, cask: &Cask) -> Result<InstalledState, CaskInstallError> {
    let artifact = fetch(env, cask).await;
    let target = InstallTarget::new(cask, &env.app_dir);

    Installer::new(env)
        .install(artifact, &target, cask.os_constraint())
        .await
}

fn create_stage_with_previous(sandbox: &Sandbox, marker: &str) {
    sandbox.create_file(
        "Applications/.Inkwell.app.cask-stage-abc123/previous/Contents/Info.plist",
        format!("<plist>{marker}</plist>"),
    );
}

mod installer {
    use super::*;

    #[tokio::test]
    async fn installs_bundle_into_app_dir() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let cask = create_inkwell(&sandbox, "1.0.9", "");

        let state = install(&env, &cask).await.unwrap();

        assert_eq!(state.install_path, env.app_dir.join("Inkwell.app"));
        assert_eq!(state.version.as_str(), "1.0.9");
        assert!(state.checksum.matches(cask.checksum()));
        assert!(state.url.ends_with("Inkwell-1.0.9.zip"));
        assert_eq!(
            read_marker(&env, "Inkwell.app"),
            "<plist>1.0.9</plist>"
        );
        assert!(env.app_dir.join("Inkwell.app/Contents/MacOS/app").exists());
        assert!(list_stage_dirs(&env).is_empty());
    }

    #[tokio::test]
    async fn replaces_existing_bundle() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);

        install(&env, &create_inkwell(&sandbox, "1.0.8", ""))
            .await
            .unwrap();
        install(&env, &create_inkwell(&sandbox, "1.0.9", ""))
            .await
            .unwrap();

        assert_eq!(
            read_marker(&env, "Inkwell.app"),
            "<plist>1.0.9</plist>"
        );
        assert!(list_stage_dirs(&env).is_empty());
    }

    #[tokio::test]
    async fn finds_bundle_nested_one_level() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let checksum = create_app_archive(
            &sandbox,
            "Inkwell 1.0.9/Inkwell.app",
            "Inkwell-1.0.9.zip",
            "nested",
        );
        let cask = Cask::parse_toml(inkwell_manifest(
            &dist_template(&sandbox, "Inkwell-#{version}.zip"),
            "1.0.9",
            &checksum,
            "",
        ))
        .unwrap();

        install(&env, &cask).await.unwrap();

        assert_eq!(read_marker(&env, "Inkwell.app"), "<plist>nested</plist>");
    }

    #[tokio::test]
    async fn errors_when_bundle_missing_from_artifact() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);

        install(&env, &create_inkwell(&sandbox, "1.0.8", ""))
            .await
            .unwrap();

        let checksum = create_app_archive(&sandbox, "Other.app", "Inkwell-1.0.9.zip", "other");
        let cask = Cask::parse_toml(inkwell_manifest(
            &dist_template(&sandbox, "Inkwell-#{version}.zip"),
            "1.0.9",
            &checksum,
            "",
        ))
        .unwrap();

        let error = install(&env, &cask).await.unwrap_err();

        assert!(matches!(error, CaskInstallError::StageFailure { .. }));

        // The prior version is untouched
        assert_eq!(
            read_marker(&env, "Inkwell.app"),
            "<plist>1.0.8</plist>"
        );
        assert!(list_stage_dirs(&env).is_empty());
    }

    #[tokio::test]
    async fn errors_for_unsupported_formats() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        sandbox.create_file("dist/Inkwell-1.0.9.pkg", "not an archive");

        let checksum = cask_core::checksum::hash_file_contents(
            sandbox.path().join("dist/Inkwell-1.0.9.pkg"),
            cask_core::checksum::ChecksumAlgorithm::Sha256,
        )
        .unwrap();
        let cask = Cask::parse_toml(inkwell_manifest(
            &dist_template(&sandbox, "Inkwell-#{version}.pkg"),
            "1.0.9",
            &checksum.to_hex(),
            "",
        ))
        .unwrap();

        let error = install(&env, &cask).await.unwrap_err();

        assert!(matches!(error, CaskInstallError::StageFailure { .. }));
        assert!(!env.app_dir.join("Inkwell.app").exists());
        assert!(list_stage_dirs(&env).is_empty());
    }

    #[tokio::test]
    async fn errors_for_corrupt_archives() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        sandbox.create_file("dist/Inkwell-1.0.9.zip", "definitely not a zip");

        let checksum = cask_core::checksum::hash_file_contents(
            sandbox.path().join("dist/Inkwell-1.0.9.zip"),
            cask_core::checksum::ChecksumAlgorithm::Sha256,
        )
        .unwrap();
        let cask = Cask::parse_toml(inkwell_manifest(
            &dist_template(&sandbox, "Inkwell-#{version}.zip"),
            "1.0.9",
            &checksum.to_hex(),
            "",
        ))
        .unwrap();

        let error = install(&env, &cask).await.unwrap_err();

        assert!(matches!(error, CaskInstallError::UnpackFailure { .. }));
        assert!(!env.app_dir.join("Inkwell.app").exists());
        assert!(list_stage_dirs(&env).is_empty());
    }

    #[tokio::test]
    async fn errors_for_incompatible_os() {
        let sandbox = create_empty_sandbox();
        let mut env = create_env(&sandbox);
        env.host_os = HostOs::macos("10.15").unwrap();

        let cask = create_inkwell(&sandbox, "1.0.9", r#"os_constraint = ">= :big_sur""#);
        let error = install(&env, &cask).await.unwrap_err();

        match error {
            CaskInstallError::IncompatibleOS { requirement, host, .. } => {
                assert!(requirement.contains("11"));
                assert!(host.contains("10.15"));
            }
            other => panic!("unexpected error {other:?}"),
        };

        assert!(!env.app_dir.exists());
    }

    #[tokio::test]
    async fn allows_compatible_os() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let cask = create_inkwell(&sandbox, "1.0.9", r#"os_constraint = ">= :big_sur""#);

        assert!(install(&env, &cask).await.is_ok());
    }

    #[tokio::test]
    async fn stops_before_swap_when_cancelled() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let cask = create_inkwell(&sandbox, "1.0.9", "");
        let artifact = fetch(&env, &cask).await;
        let token = CancelToken::new();
        token.cancel();

        let mut installer = Installer::new(&env);
        installer.set_cancel_token(token);

        let error = installer
            .install(artifact, &InstallTarget::new(&cask, &env.app_dir), None)
            .await
            .unwrap_err();

        assert!(matches!(error, CaskInstallError::Cancelled { .. }));
        assert!(!env.app_dir.join("Inkwell.app").exists());
        assert!(list_stage_dirs(&env).is_empty());
    }

    #[tokio::test]
    async fn errors_when_staging_times_out() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let cask = create_inkwell(&sandbox, "1.0.9", "");
        let artifact = fetch(&env, &cask).await;

        let mut installer = Installer::new(&env);
        installer.set_timeout(Duration::ZERO);

        let error = installer
            .install(artifact, &InstallTarget::new(&cask, &env.app_dir), None)
            .await
            .unwrap_err();

        assert!(matches!(error, CaskInstallError::TimedOut { seconds: 0, .. }));
        assert!(!env.app_dir.join("Inkwell.app").exists());
    }

    #[tokio::test]
    async fn keeps_current_bundle_when_upgrade_times_out() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);

        install(&env, &create_inkwell(&sandbox, "1.0.8", ""))
            .await
            .unwrap();

        let cask = create_inkwell(&sandbox, "1.0.9", "");
        let artifact = fetch(&env, &cask).await;

        let mut installer = Installer::new(&env);
        installer.set_timeout(Duration::ZERO);

        let result = installer
            .install(artifact, &InstallTarget::new(&cask, &env.app_dir), None)
            .await;

        assert!(matches!(result, Err(CaskInstallError::TimedOut { .. })));
        assert_eq!(
            read_marker(&env, "Inkwell.app"),
            "<plist>1.0.8</plist>"
        );
    }

    #[test]
    fn reads_timeout_from_config() {
        let sandbox = create_empty_sandbox();
        sandbox.create_file(".cask/config.toml", "[install]\ntimeout = 30\n");

        let env = create_env(&sandbox);

        assert_eq!(env.config.install.timeout(), Duration::from_secs(30));
    }
}

mod recovery {
    use super::*;

    #[test]
    fn restores_previous_bundle() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let cask = create_inkwell(&sandbox, "1.0.9", "");
        create_stage_with_previous(&sandbox, "1.0.8");

        let recovered = Installer::new(&env)
            .recover_interrupted(&InstallTarget::new(&cask, &env.app_dir))
            .unwrap();

        assert!(recovered);
        assert_eq!(
            read_marker(&env, "Inkwell.app"),
            "<plist>1.0.8</plist>"
        );
        assert!(list_stage_dirs(&env).is_empty());
    }

    #[test]
    fn keeps_current_bundle_over_previous() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let cask = create_inkwell(&sandbox, "1.0.9", "");
        create_stage_with_previous(&sandbox, "1.0.8");
        sandbox.create_file(
            "Applications/Inkwell.app/Contents/Info.plist",
            "<plist>1.0.9</plist>",
        );

        let recovered = Installer::new(&env)
            .recover_interrupted(&InstallTarget::new(&cask, &env.app_dir))
            .unwrap();

        assert!(!recovered);
        assert_eq!(
            read_marker(&env, "Inkwell.app"),
            "<plist>1.0.9</plist>"
        );
        assert!(list_stage_dirs(&env).is_empty());
    }

    #[test]
    fn ignores_other_casks_stages() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let cask = create_inkwell(&sandbox, "1.0.9", "");
        sandbox.create_file(
            "Applications/.Other.app.cask-stage-abc123/unpacked/file",
            "",
        );

        Installer::new(&env)
            .recover_interrupted(&InstallTarget::new(&cask, &env.app_dir))
            .unwrap();

        assert_eq!(list_stage_dirs(&env).len(), 1);
    }

    #[test]
    fn does_nothing_without_app_dir() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let cask = create_inkwell(&sandbox, "1.0.9", "");

        assert!(
            !Installer::new(&env)
                .recover_interrupted(&InstallTarget::new(&cask, &env.app_dir))
                .unwrap()
        );
    }
}

mod install_plan {
    use super::*;

    async fn installed(sandbox: &Sandbox, env: &CaskEnvironment, version: &str, extra: &str) {
        install(env, &create_inkwell(sandbox, version, extra))
            .await
            .unwrap();
    }

    fn decide(env: &CaskEnvironment, cask: &Cask, force: bool) -> InstallPlan {
        InstallPlan::decide(cask, Some(&receipt_for(env, cask)), force)
    }

    // Stand-in receipt describing an installed 1.0.8 without auto updates
    fn receipt_for(env: &CaskEnvironment, cask: &Cask) -> InstalledState {
        InstalledState {
            identifier: cask.id().to_owned(),
            name: cask.name().to_owned(),
            version: CaskVersion::parse("1.0.8").unwrap(),
            install_path: env.app_dir.join(cask.artifact().as_str()),
            installed_at: 0,
            auto_updates: false,
            checksum: cask.checksum().to_owned(),
            url: String::new(),
            artifact: cask.artifact().to_owned(),
            cleanup_paths: vec![],
        }
    }

    #[test]
    fn installs_when_nothing_recorded() {
        let sandbox = create_empty_sandbox();
        let cask = create_inkwell(&sandbox, "1.0.9", "");

        assert_eq!(InstallPlan::decide(&cask, None, false), InstallPlan::Install);
    }

    #[test]
    fn installs_when_bundle_missing() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        let cask = create_inkwell(&sandbox, "1.0.9", "");

        assert_eq!(decide(&env, &cask, false), InstallPlan::Install);
    }

    #[tokio::test]
    async fn upgrades_older_versions() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        installed(&sandbox, &env, "1.0.8", "").await;
        let cask = create_inkwell(&sandbox, "1.0.9", "");

        assert_eq!(
            decide(&env, &cask, false),
            InstallPlan::Upgrade {
                from: CaskVersion::parse("1.0.8").unwrap()
            }
        );
    }

    #[tokio::test]
    async fn skips_same_version_unless_forced() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        installed(&sandbox, &env, "1.0.8", "").await;
        let cask = create_inkwell(&sandbox, "1.0.8", "");
        let from = CaskVersion::parse("1.0.8").unwrap();

        assert_eq!(
            decide(&env, &cask, false),
            InstallPlan::Skip {
                installed: from.clone(),
                reason: SkipReason::SameVersion,
            }
        );
        assert_eq!(decide(&env, &cask, true), InstallPlan::Reinstall { from });
        assert!(!decide(&env, &cask, false).should_install());
        assert!(decide(&env, &cask, true).should_install());
    }

    #[tokio::test]
    async fn skips_downgrades() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        installed(&sandbox, &env, "1.0.8", "").await;
        let cask = create_inkwell(&sandbox, "1.0.7", "");

        assert!(matches!(
            decide(&env, &cask, false),
            InstallPlan::Skip {
                reason: SkipReason::NewerInstalled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn skips_self_updating_apps() {
        let sandbox = create_empty_sandbox();
        let env = create_env(&sandbox);
        installed(&sandbox, &env, "1.0.8", "").await;
        let cask = create_inkwell(&sandbox, "1.0.9", "auto_updates = true");

        assert!(matches!(
            decide(&env, &cask, false),
            InstallPlan::Skip {
                reason: SkipReason::AutoUpdates,
                ..
            }
        ));
        assert!(matches!(
            decide(&env, &cask, true),
            InstallPlan::Reinstall { .. }
        ));
    }
}
