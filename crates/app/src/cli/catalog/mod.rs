use std::io::Write;

use clap::{Args, Subcommand};
use emporium_app::{
    context::AppContext, domain::catalog::records::CatalogEntryRecord, money::format_amount,
};

use super::CliError;

mod create;
mod list;
mod show;

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// Add a priced, stocked entry to the catalog
    Create(create::CreateEntryArgs),
    /// Show a catalog entry
    Show(show::ShowEntryArgs),
    /// List every catalog entry
    List(list::ListEntriesArgs),
}

pub(crate) async fn run(
    command: CatalogCommand,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command.command {
        CatalogSubcommand::Create(args) => create::run(args, context, out).await,
        CatalogSubcommand::Show(args) => show::run(args, context, out).await,
        CatalogSubcommand::List(args) => list::run(args, context, out).await,
    }
}

fn entry_fields(entry: &CatalogEntryRecord) -> Vec<(&'static str, String)> {
    vec![
        ("catalog_entry_id", entry.id.to_string()),
        ("name", entry.name.clone()),
        ("price", format_amount(entry.price)),
        ("stock", entry.stock.to_string()),
        ("created_at", entry.created_at.to_string()),
        ("updated_at", entry.updated_at.to_string()),
    ]
}
