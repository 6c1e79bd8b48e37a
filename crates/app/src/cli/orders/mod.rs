use std::io::Write;

use clap::{Args, Subcommand};
use emporium_app::{
    context::AppContext, domain::orders::records::OrderRecord, money::format_amount,
};

use super::CliError;

mod list;
mod totals;

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List an account's orders, oldest first
    List(list::ListOrdersArgs),
    /// Sum order counts, quantities and totals
    Totals(totals::OrderTotalsArgs),
}

pub(crate) async fn run(
    command: OrdersCommand,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command.command {
        OrdersSubcommand::List(args) => list::run(args, context, out).await,
        OrdersSubcommand::Totals(args) => totals::run(args, context, out).await,
    }
}

pub(crate) fn order_fields(order: &OrderRecord) -> Vec<(&'static str, String)> {
    vec![
        ("order_id", order.id.to_string()),
        ("account_id", order.account_id.to_string()),
        ("catalog_entry_id", order.catalog_entry_id.to_string()),
        ("quantity", order.quantity.to_string()),
        ("total", format_amount(order.price)),
        ("created_at", order.created_at.to_string()),
    ]
}
