#![allow(dead_code)]

use cask_core::checksum::{ChecksumAlgorithm, hash_file_contents};
use cask_core::{Cask, CaskEnvironment, HostOs};
use starbase_archive::Archiver;
use starbase_sandbox::Sandbox;
use std::path::PathBuf;

/// An environment rooted in the sandbox, posing as a macOS 14 host.
pub fn create_env(sandbox: &Sandbox) -> CaskEnvironment {
    let mut env = CaskEnvironment::new_testing(sandbox.path()).unwrap();
    env.host_os = HostOs::macos("14.5").unwrap();
    env
}

/// Create `dist/<file>` containing an application bundle. The marker is
/// written into the bundle so tests can tell versions apart. Returns the
/// sha256 of the archive.
pub fn create_app_archive(sandbox: &Sandbox, app: &str, file: &str, marker: &str) -> String {
    let build_dir = format!("build/{file}");

    sandbox.create_file(
        format!("{build_dir}/{app}/Contents/Info.plist"),
        format!("<plist>{marker}</plist>"),
    );
    sandbox.create_file(format!("{build_dir}/{app}/Contents/MacOS/app"), "#!/bin/sh");

    let archive = sandbox.path().join("dist").join(file);

    std::fs::create_dir_all(sandbox.path().join("dist")).unwrap();

    let source = sandbox.path().join(&build_dir);
    let mut archiver = Archiver::new(&source, &archive);
    archiver.add_source_glob("**/*");
    archiver.pack_from_ext().unwrap();

    hash_file_contents(&archive, ChecksumAlgorithm::Sha256)
        .unwrap()
        .to_hex()
}

pub fn dist_template(sandbox: &Sandbox, file_template: &str) -> String {
    format!(
        "file://{}/{file_template}",
        sandbox.path().join("dist").display()
    )
}

pub fn inkwell_manifest(url_template: &str, version: &str, checksum: &str, extra: &str) -> String {
    format!(
        r#"
identifier = "inkwell"
name = "Inkwell"
version = "{version}"
url_template = "{url_template}"
checksum = "{checksum}"
{extra}
"#
    )
}

/// Build an Inkwell archive for the version and load its cask.
pub fn create_inkwell(sandbox: &Sandbox, version: &str, extra: &str) -> Cask {
    let checksum = create_app_archive(
        sandbox,
        "Inkwell.app",
        &format!("Inkwell-{version}.zip"),
        version,
    );

    Cask::parse_toml(inkwell_manifest(
        &dist_template(sandbox, "Inkwell-#{version}.zip"),
        version,
        &checksum,
        extra,
    ))
    .unwrap()
}

pub fn read_marker(env: &CaskEnvironment, app: &str) -> String {
    std::fs::read_to_string(env.app_dir.join(app).join("Contents/Info.plist")).unwrap()
}

pub fn list_stage_dirs(env: &CaskEnvironment) -> Vec<PathBuf> {
    std::fs::read_dir(&env.app_dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.to_string_lossy().contains(".cask-stage-"))
                .collect()
        })
        .unwrap_or_default()
}
