use std::io::Write;

use clap::Args;
use emporium_app::{context::AppContext, domain::accounts::records::AccountId};

use crate::cli::{CliError, OutputFormat, emit};

use super::order_fields;

#[derive(Debug, Args)]
pub(crate) struct ListOrdersArgs {
    /// Account whose orders should be listed
    #[arg(long)]
    account_id: i64,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub(crate) async fn run(
    args: ListOrdersArgs,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let orders = context
        .orders
        .list_orders(AccountId::from_i64(args.account_id))
        .await
        .map_err(|error| format!("failed to list orders: {error}"))?;

    if args.format == OutputFormat::Json {
        return emit(out, args.format, &orders, |_| Vec::new());
    }

    if orders.is_empty() {
        writeln!(out, "no orders found for account {}", args.account_id)
            .map_err(|error| format!("failed to write output: {error}"))?;
        return Ok(());
    }

    for order in &orders {
        emit(out, args.format, order, order_fields)?;
        writeln!(out).map_err(|error| format!("failed to write output: {error}"))?;
    }

    Ok(())
}
