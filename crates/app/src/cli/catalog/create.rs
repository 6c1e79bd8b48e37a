use std::io::Write;

use clap::Args;
use emporium_app::{
    context::AppContext,
    domain::catalog::{CatalogServiceError, data::NewCatalogEntry},
    money::parse_amount,
};

use crate::cli::{CliError, OutputFormat, emit};

use super::entry_fields;

#[derive(Debug, Args)]
pub(crate) struct CreateEntryArgs {
    /// Entry display name
    #[arg(long)]
    name: String,

    /// Unit price, e.g. 10.00
    #[arg(long, value_parser = parse_amount)]
    price: u64,

    /// Units available for sale
    #[arg(long)]
    stock: u32,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub(crate) async fn run(
    args: CreateEntryArgs,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let entry = context
        .catalog
        .create_entry(NewCatalogEntry {
            name: args.name,
            price: args.price,
            stock: args.stock,
        })
        .await
        .map_err(|error| match error {
            CatalogServiceError::MissingRequiredData => "entry name cannot be empty".to_string(),
            other => format!("failed to create catalog entry: {other}"),
        })?;

    emit(out, args.format, &entry, entry_fields)
}
