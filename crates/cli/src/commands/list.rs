use crate::printer::Printer;
use crate::session::CaskSession;
use cask_core::Manager;
use clap::Args;
use miette::IntoDiagnostic;
use starbase::AppResult;
use starbase_styles::color;

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    #[arg(long, help = "Print the receipts as JSON")]
    json: bool,
}

#[tracing::instrument(skip_all)]
pub async fn list(session: CaskSession, args: ListArgs) -> AppResult {
    let installed = match Manager::new(&session.env).list() {
        Ok(installed) => installed,
        Err(error) => return session.report_failure(error),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&installed).into_diagnostic()?);

        return Ok(None);
    }

    if installed.is_empty() {
        eprintln!("No casks installed");

        return Ok(None);
    }

    let mut printer = Printer::new();

    for state in installed {
        printer.section(state.identifier.as_str(), |s| {
            s.field("Name", &state.name);
            s.field("Version", color::hash(state.version.as_str()));
            s.field("Path", color::path(&state.install_path));
        });
    }

    printer.print();

    Ok(None)
}
