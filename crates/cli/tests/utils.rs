#![allow(dead_code)]

use starbase_archive::Archiver;
use starbase_sandbox::Sandbox;
use std::collections::HashMap;
use std::fs;
use std::ops::Deref;
use std::path::PathBuf;

pub struct CaskSandbox {
    pub sandbox: Sandbox,
}

impl CaskSandbox {
    pub fn new(mut sandbox: Sandbox) -> Self {
        apply_settings(&mut sandbox);

        Self { sandbox }
    }

    pub fn app_path(&self, app: &str) -> PathBuf {
        self.path().join("Applications").join(app)
    }

    pub fn receipt_path(&self, id: &str) -> PathBuf {
        self.path().join(".cask/receipts").join(format!("{id}.json"))
    }

    pub fn read_marker(&self, app: &str) -> String {
        fs::read_to_string(self.app_path(app).join("Contents/Info.plist")).unwrap()
    }

    /// Create `dist/<file>` containing the bundle and return its sha256.
    pub fn create_archive(&self, app: &str, file: &str, marker: &str) -> String {
        let build_dir = format!("build/{file}");

        self.create_file(
            format!("{build_dir}/{app}/Contents/Info.plist"),
            format!("<plist>{marker}</plist>"),
        );
        self.create_file(format!("{build_dir}/{app}/Contents/MacOS/app"), "#!/bin/sh");

        fs::create_dir_all(self.path().join("dist")).unwrap();

        let archive = self.path().join("dist").join(file);
        let source = self.path().join(&build_dir);
        let mut archiver = Archiver::new(&source, &archive);
        archiver.add_source_glob("**/*");
        archiver.pack_from_ext().unwrap();

        cask_core::checksum::hash_file_contents(
            &archive,
            cask_core::checksum::ChecksumAlgorithm::Sha256,
        )
        .unwrap()
        .to_hex()
    }

    /// Write `inkwell.toml` for a version whose archive lives in `dist/`.
    pub fn create_inkwell(&self, version: &str, extra: &str) -> PathBuf {
        let checksum =
            self.create_archive("Inkwell.app", &format!("Inkwell-{version}.zip"), version);

        self.create_manifest(version, &checksum, extra)
    }

    pub fn create_manifest(&self, version: &str, checksum: &str, extra: &str) -> PathBuf {
        self.create_file(
            "inkwell.toml",
            format!(
                r#"
identifier = "inkwell"
name = "Inkwell"
desc = "Markdown notebook"
version = "{version}"
url_template = "file://{}/Inkwell-#{{version}}.zip"
checksum = "{checksum}"
{extra}
"#,
                self.path().join("dist").display()
            ),
        );

        self.path().join("inkwell.toml")
    }
}

impl Deref for CaskSandbox {
    type Target = Sandbox;

    fn deref(&self) -> &Self::Target {
        &self.sandbox
    }
}

fn apply_settings(sandbox: &mut Sandbox) {
    let home_dir = sandbox.path().join(".home");
    let cask_dir = sandbox.path().join(".cask");
    let app_dir = sandbox.path().join("Applications");

    // Folders must exist or tests fail!
    fs::create_dir_all(&home_dir).unwrap();
    fs::create_dir_all(&cask_dir).unwrap();

    let mut env = HashMap::new();
    env.insert("RUST_BACKTRACE", "1");
    env.insert("NO_COLOR", "1");
    env.insert("HOME", home_dir.to_str().unwrap());
    env.insert("CASK_HOME", cask_dir.to_str().unwrap());
    env.insert("CASK_APP_DIR", app_dir.to_str().unwrap());
    env.insert("CASK_OS_VERSION", "14.5");
    env.insert("CASK_LOG", "trace");
    env.insert("CASK_TEST", "true");

    sandbox.settings.bin = "cask".into();
    sandbox.settings.timeout = 120;

    sandbox
        .settings
        .env
        .extend(env.into_iter().map(|(k, v)| (k.to_owned(), v.to_owned())));
}

pub fn create_empty_cask_sandbox() -> CaskSandbox {
    CaskSandbox::new(starbase_sandbox::create_empty_sandbox())
}
