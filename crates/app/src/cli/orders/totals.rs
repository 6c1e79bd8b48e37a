use std::io::Write;

use clap::Args;
use emporium_app::{
    context::AppContext,
    domain::{
        accounts::records::AccountId, catalog::records::CatalogEntryId, orders::data::OrderFilter,
    },
    money::format_amount,
};

use crate::cli::{CliError, OutputFormat, emit};

#[derive(Debug, Args)]
pub(crate) struct OrderTotalsArgs {
    /// Only count this account's orders
    #[arg(long)]
    account_id: Option<i64>,

    /// Only count orders for this catalog entry
    #[arg(long)]
    catalog_entry_id: Option<i64>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub(crate) async fn run(
    args: OrderTotalsArgs,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let totals = context
        .orders
        .order_totals(OrderFilter {
            account_id: args.account_id.map(AccountId::from_i64),
            catalog_entry_id: args.catalog_entry_id.map(CatalogEntryId::from_i64),
        })
        .await
        .map_err(|error| format!("failed to total orders: {error}"))?;

    emit(out, args.format, &totals, |totals| {
        vec![
            ("orders", totals.count.to_string()),
            ("quantity", totals.quantity.to_string()),
            ("total", format_amount(totals.price)),
        ]
    })
}
