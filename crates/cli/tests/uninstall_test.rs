mod utils;

use starbase_sandbox::predicates::prelude::*;
use utils::*;

const CLEANUP: &str = r#"cleanup_paths = [
    "~/Library/Application Support/Inkwell",
    "~/Library/Preferences/app.inkwell*.plist",
]"#;

fn install_inkwell(sandbox: &CaskSandbox) -> std::path::PathBuf {
    let manifest = sandbox.create_inkwell("1.0.9", CLEANUP);

    sandbox
        .run_bin(|cmd| {
            cmd.arg("install").arg(&manifest);
        })
        .success();

    sandbox.create_file(".home/Library/Application Support/Inkwell/notes.db", "notes");
    sandbox.create_file(".home/Library/Preferences/app.inkwell.plist", "");
    sandbox.create_file(".home/Library/Preferences/app.other.plist", "");

    manifest
}

mod uninstall {
    use super::*;

    #[test]
    fn removes_bundle_but_keeps_user_state() {
        let sandbox = create_empty_cask_sandbox();
        install_inkwell(&sandbox);

        sandbox
            .run_bin(|cmd| {
                cmd.arg("uninstall").arg("inkwell");
            })
            .success()
            .stdout(predicate::str::contains("Inkwell 1.0.9 has been uninstalled"));

        assert!(!sandbox.app_path("Inkwell.app").exists());
        assert!(!sandbox.receipt_path("inkwell").exists());
        assert!(
            sandbox
                .path()
                .join(".home/Library/Preferences/app.inkwell.plist")
                .exists()
        );
    }

    #[test]
    fn succeeds_when_not_installed() {
        let sandbox = create_empty_cask_sandbox();

        sandbox
            .run_bin(|cmd| {
                cmd.arg("uninstall").arg("inkwell");
            })
            .success()
            .stdout(predicate::str::contains("not installed"));
    }

    #[test]
    fn errors_for_invalid_identifier() {
        let sandbox = create_empty_cask_sandbox();

        sandbox
            .run_bin(|cmd| {
                cmd.arg("uninstall").arg("../escape");
            })
            .code(2);
    }
}

mod zap {
    use super::*;

    #[test]
    fn removes_cleanup_paths() {
        let sandbox = create_empty_cask_sandbox();
        install_inkwell(&sandbox);

        sandbox
            .run_bin(|cmd| {
                cmd.arg("zap").arg("inkwell").arg("--yes");
            })
            .success()
            .stdout(predicate::str::contains("Removed 2 cleanup path(s)"));

        let library = sandbox.path().join(".home/Library");

        assert!(!sandbox.app_path("Inkwell.app").exists());
        assert!(!library.join("Application Support/Inkwell").exists());
        assert!(!library.join("Preferences/app.inkwell.plist").exists());
        assert!(library.join("Preferences/app.other.plist").exists());
        assert!(!sandbox.receipt_path("inkwell").exists());
    }

    #[test]
    fn requires_confirmation_without_terminal() {
        let sandbox = create_empty_cask_sandbox();
        install_inkwell(&sandbox);

        sandbox
            .run_bin(|cmd| {
                cmd.arg("zap").arg("inkwell");
            })
            .failure()
            .stderr(predicate::str::contains("--yes"));

        assert!(sandbox.app_path("Inkwell.app").exists());
        assert!(
            sandbox
                .path()
                .join(".home/Library/Preferences/app.inkwell.plist")
                .exists()
        );
    }

    #[test]
    fn removes_receipt_when_bundle_already_deleted() {
        let sandbox = create_empty_cask_sandbox();
        let manifest = sandbox.create_inkwell("1.0.9", "");

        sandbox
            .run_bin(|cmd| {
                cmd.arg("install").arg(&manifest);
            })
            .success();

        std::fs::remove_dir_all(sandbox.app_path("Inkwell.app")).unwrap();

        sandbox
            .run_bin(|cmd| {
                cmd.arg("zap").arg("inkwell");
            })
            .success()
            .stdout(predicate::str::contains("has been zapped"));

        assert!(!sandbox.receipt_path("inkwell").exists());

        sandbox
            .run_bin(|cmd| {
                cmd.arg("list");
            })
            .success()
            .stdout(predicate::str::contains("inkwell").not())
            .stderr(predicate::str::contains("No casks installed"));
    }

    #[test]
    fn uses_manifest_when_not_installed() {
        let sandbox = create_empty_cask_sandbox();
        let manifest = sandbox.create_inkwell("1.0.9", CLEANUP);
        sandbox.create_file(".home/Library/Preferences/app.inkwell.plist", "");

        sandbox
            .run_bin(|cmd| {
                cmd.arg("zap")
                    .arg("inkwell")
                    .arg("--manifest")
                    .arg(&manifest)
                    .arg("--yes");
            })
            .success();

        assert!(
            !sandbox
                .path()
                .join(".home/Library/Preferences/app.inkwell.plist")
                .exists()
        );
    }

    #[test]
    fn errors_without_receipt_or_manifest() {
        let sandbox = create_empty_cask_sandbox();

        sandbox
            .run_bin(|cmd| {
                cmd.arg("zap").arg("inkwell").arg("--yes");
            })
            .code(1)
            .stderr(predicate::str::contains("is not installed"));
    }
}
