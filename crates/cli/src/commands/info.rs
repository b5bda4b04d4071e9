use crate::printer::Printer;
use crate::session::CaskSession;
use cask_core::{Cask, CaskManageError, InstalledState, Resolver};
use clap::Args;
use miette::IntoDiagnostic;
use serde::Serialize;
use starbase::AppResult;
use starbase_styles::color;
use std::path::PathBuf;

#[derive(Args, Clone, Debug)]
pub struct InfoArgs {
    #[arg(required = true, help = "Path to a cask manifest (.toml or .json)")]
    manifest: PathBuf,

    #[arg(long, help = "Print the details as JSON")]
    json: bool,
}

#[derive(Serialize)]
struct CaskInfo {
    identifier: String,
    name: String,
    desc: Option<String>,
    homepage: Option<String>,
    version: String,
    url: String,
    checksum: String,
    os_constraint: Option<String>,
    auto_updates: bool,
    app: String,
    install_path: PathBuf,
    cleanup_paths: Vec<String>,
    installed: Option<InstalledState>,
}

fn gather_info(session: &CaskSession, args: &InfoArgs) -> Result<CaskInfo, CaskManageError> {
    let cask = Cask::load(&args.manifest)?;
    let url = Resolver::new(&cask).resolve()?;
    let installed = session.env.store.load_receipt(cask.id())?;

    Ok(CaskInfo {
        identifier: cask.id().to_string(),
        name: cask.name().to_owned(),
        desc: cask.desc().map(|desc| desc.to_owned()),
        homepage: cask.homepage().map(|url| url.to_string()),
        version: cask.version().to_string(),
        url: url.to_string(),
        checksum: cask.checksum().to_string(),
        os_constraint: cask.os_constraint().map(|req| req.to_string()),
        auto_updates: cask.auto_updates(),
        app: cask.artifact().to_string(),
        install_path: session.env.app_dir.join(cask.artifact().as_str()),
        cleanup_paths: cask
            .cleanup_paths()
            .iter()
            .map(|path| path.to_string())
            .collect(),
        installed,
    })
}

#[tracing::instrument(skip_all)]
pub async fn info(session: CaskSession, args: InfoArgs) -> AppResult {
    let info = match gather_info(&session, &args) {
        Ok(info) => info,
        Err(error) => return session.report_failure(error),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info).into_diagnostic()?);

        return Ok(None);
    }

    let mut printer = Printer::new();

    printer.section(&info.name, |s| {
        s.field("Identifier", color::id(&info.identifier));

        if let Some(desc) = &info.desc {
            s.field("Description", desc);
        }

        if let Some(homepage) = &info.homepage {
            s.field("Homepage", color::url(homepage));
        }

        s.field("Version", color::hash(&info.version));
        s.field("Download", color::url(&info.url));
        s.field("Checksum", color::hash(&info.checksum));

        if let Some(req) = &info.os_constraint {
            s.field("Requires", req);
        }

        s.field("Auto updates", if info.auto_updates { "yes" } else { "no" });
        s.field("Bundle", color::path(&info.install_path));
    });

    printer.section("Installed", |s| {
        match &info.installed {
            Some(state) => {
                s.field("Version", color::hash(state.version.as_str()));
                s.field("Path", color::path(&state.install_path));
                s.field("Source", color::url(&state.url));
            }
            None => {
                s.field("Version", color::muted_light("not installed"));
            }
        };
    });

    if !info.cleanup_paths.is_empty() {
        printer.section("Removed by zap", |s| {
            s.items(info.cleanup_paths.iter().map(color::path));
        });
    }

    printer.print();

    Ok(None)
}
