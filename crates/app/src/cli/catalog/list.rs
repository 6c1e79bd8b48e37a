use std::io::Write;

use clap::Args;
use emporium_app::context::AppContext;

use crate::cli::{CliError, OutputFormat, emit};

use super::entry_fields;

#[derive(Debug, Args)]
pub(crate) struct ListEntriesArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub(crate) async fn run(
    args: ListEntriesArgs,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let entries = context
        .catalog
        .list_entries()
        .await
        .map_err(|error| format!("failed to list catalog entries: {error}"))?;

    if args.format == OutputFormat::Json {
        return emit(out, args.format, &entries, |_| Vec::new());
    }

    if entries.is_empty() {
        writeln!(out, "catalog is empty").map_err(|error| format!("failed to write output: {error}"))?;
        return Ok(());
    }

    for entry in &entries {
        emit(out, args.format, entry, entry_fields)?;
        writeln!(out).map_err(|error| format!("failed to write output: {error}"))?;
    }

    Ok(())
}
