use std::io::Write;

use clap::Args;
use emporium_app::{
    context::AppContext,
    domain::accounts::{AccountsServiceError, data::NewAccount},
    money::parse_amount,
};

use crate::cli::{CliError, OutputFormat, emit};

use super::account_fields;

#[derive(Debug, Args)]
pub(crate) struct CreateAccountArgs {
    /// Account holder name
    #[arg(long)]
    name: String,

    /// Opening balance, e.g. 100.00
    #[arg(long, value_parser = parse_amount, default_value = "0")]
    balance: u64,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub(crate) async fn run(
    args: CreateAccountArgs,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let account = context
        .accounts
        .create_account(NewAccount {
            name: args.name,
            balance: args.balance,
        })
        .await
        .map_err(|error| match error {
            AccountsServiceError::MissingRequiredData => "account name cannot be empty".to_string(),
            other => format!("failed to create account: {other}"),
        })?;

    emit(out, args.format, &account, account_fields)
}
