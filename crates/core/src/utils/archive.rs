use super::process::CaskProcessError;
use async_trait::async_trait;
use starbase_archive::{ArchiveError, Archiver};
use starbase_styles::{Style, Stylize};
use starbase_utils::fs::FsError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug, miette::Diagnostic)]
pub enum CaskArchiveError {
    #[diagnostic(transparent)]
    #[error(transparent)]
    Archive(#[from] Box<ArchiveError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Fs(#[from] Box<FsError>),

    #[diagnostic(transparent)]
    #[error(transparent)]
    Process(#[from] Box<CaskProcessError>),

    #[diagnostic(code(cask::archive::interrupted))]
    #[error("Unpacking {} was interrupted.", .path.style(Style::Path))]
    Interrupted {
        path: PathBuf,
        #[source]
        error: Box<tokio::task::JoinError>,
    },

    #[diagnostic(code(cask::archive::unpack_failed))]
    #[error("Failed to unpack {}: {reason}", .path.style(Style::Path))]
    Unpack { path: PathBuf, reason: String },

    #[diagnostic(code(cask::archive::unsupported))]
    #[error("Unable to unpack {}: {reason}", .path.style(Style::Path))]
    Unsupported { path: PathBuf, reason: String },
}

impl CaskArchiveError {
    /// Recover the typed error behind an archiver report where possible,
    /// so callers can still inspect the underlying I/O failure.
    pub fn from_report(path: &Path, report: miette::Report) -> Self {
        let report = match report.downcast::<ArchiveError>() {
            Ok(error) => return error.into(),
            Err(report) => report,
        };

        let report = match report.downcast::<FsError>() {
            Ok(error) => return error.into(),
            Err(report) => report,
        };

        CaskArchiveError::Unpack {
            path: path.to_path_buf(),
            reason: report
                .chain()
                .map(|error| error.to_string())
                .collect::<Vec<_>>()
                .join(": "),
        }
    }
}

impl From<ArchiveError> for CaskArchiveError {
    fn from(e: ArchiveError) -> CaskArchiveError {
        CaskArchiveError::Archive(Box::new(e))
    }
}

impl From<FsError> for CaskArchiveError {
    fn from(e: FsError) -> CaskArchiveError {
        CaskArchiveError::Fs(Box::new(e))
    }
}

impl From<CaskProcessError> for CaskArchiveError {
    fn from(e: CaskProcessError) -> CaskArchiveError {
        CaskArchiveError::Process(Box::new(e))
    }
}

/// Extracts the contents of a verified artifact into a directory.
#[async_trait]
pub trait Unpacker: Send + Sync {
    async fn unpack(&self, input_file: &Path, output_dir: &Path) -> Result<(), CaskArchiveError>;
}

/// Zip and tar based archives, unpacked with `starbase_archive`.
pub struct ArchiveUnpacker;

#[async_trait]
impl Unpacker for ArchiveUnpacker {
    #[instrument(name = "unpack_archive", skip(self))]
    async fn unpack(&self, input_file: &Path, output_dir: &Path) -> Result<(), CaskArchiveError> {
        let input = input_file.to_path_buf();
        let output = output_dir.to_path_buf();

        debug!("Unpacking archive");

        tokio::task::spawn_blocking(move || {
            Archiver::new(&output, &input)
                .unpack_from_ext()
                .map_err(|report| CaskArchiveError::from_report(&input, report))?;

            Ok::<_, CaskArchiveError>(())
        })
        .await
        .map_err(|error| CaskArchiveError::Interrupted {
            path: input_file.to_path_buf(),
            error: Box::new(error),
        })??;

        Ok(())
    }
}

/// Apple disk images, mounted read-only with `hdiutil` and copied out
/// with `ditto` so bundle metadata is preserved.
pub struct DiskImageUnpacker;

#[async_trait]
impl Unpacker for DiskImageUnpacker {
    #[instrument(name = "unpack_disk_image", skip(self))]
    async fn unpack(&self, input_file: &Path, output_dir: &Path) -> Result<(), CaskArchiveError> {
        #[cfg(target_os = "macos")]
        {
            mount_and_copy(input_file, output_dir).await
        }

        #[cfg(not(target_os = "macos"))]
        {
            let _ = output_dir;

            Err(CaskArchiveError::Unsupported {
                path: input_file.to_path_buf(),
                reason: "disk images can only be mounted on macOS".into(),
            })
        }
    }
}

#[cfg(target_os = "macos")]
async fn mount_and_copy(input_file: &Path, output_dir: &Path) -> Result<(), CaskArchiveError> {
    use super::process::exec_command;
    use starbase_utils::fs;
    use tokio::process::Command;
    use tracing::warn;

    let mount_dir = output_dir.with_file_name("mount");

    fs::create_dir_all(&mount_dir)?;
    fs::create_dir_all(output_dir)?;

    debug!(mount_dir = ?mount_dir, "Mounting disk image");

    exec_command(
        Command::new("hdiutil")
            .args(["attach", "-nobrowse", "-readonly", "-noautoopen", "-quiet"])
            .arg("-mountpoint")
            .arg(&mount_dir)
            .arg(input_file),
    )
    .await?;

    let copy_result = async {
        for entry in fs::read_dir(&mount_dir)? {
            let path = entry.path();

            if path.extension().is_some_and(|ext| ext == "app") {
                exec_command(
                    Command::new("ditto")
                        .arg(&path)
                        .arg(output_dir.join(entry.file_name())),
                )
                .await?;
            }
        }

        Ok::<_, CaskArchiveError>(())
    }
    .await;

    // Always detach, even when copying failed
    if let Err(error) = exec_command(
        Command::new("hdiutil")
            .args(["detach", "-force", "-quiet"])
            .arg(&mount_dir),
    )
    .await
    {
        warn!(mount_dir = ?mount_dir, "Failed to detach disk image: {error}");
    }

    copy_result
}

/// Choose an unpacker based on the artifact's file name.
pub fn create_unpacker(file_name: &str) -> Option<Box<dyn Unpacker>> {
    let name = file_name.to_lowercase();

    if name.ends_with(".dmg") {
        return Some(Box::new(DiskImageUnpacker));
    }

    if [".zip", ".tar.gz", ".tgz", ".tar.xz", ".txz", ".tar"]
        .iter()
        .any(|ext| name.ends_with(ext))
    {
        return Some(Box::new(ArchiveUnpacker));
    }

    None
}
