use std::io::Write;

use clap::Args;
use emporium_app::{
    context::AppContext,
    domain::catalog::{CatalogServiceError, records::CatalogEntryId},
};

use crate::cli::{CliError, OutputFormat, emit};

use super::entry_fields;

#[derive(Debug, Args)]
pub(crate) struct ShowEntryArgs {
    /// Catalog entry id
    #[arg(long)]
    catalog_entry_id: i64,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub(crate) async fn run(
    args: ShowEntryArgs,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let entry = context
        .catalog
        .get_entry(CatalogEntryId::from_i64(args.catalog_entry_id))
        .await
        .map_err(|error| match error {
            CatalogServiceError::NotFound => {
                format!("catalog entry {} not found", args.catalog_entry_id)
            }
            other => format!("failed to load catalog entry: {other}"),
        })?;

    emit(out, args.format, &entry, entry_fields)
}
