use std::io::Write;

use clap::Args;
use emporium_app::{
    context::AppContext,
    domain::accounts::{AccountsServiceError, records::AccountId},
};

use crate::cli::{CliError, OutputFormat, emit};

use super::account_fields;

#[derive(Debug, Args)]
pub(crate) struct ShowAccountArgs {
    /// Account id
    #[arg(long)]
    account_id: i64,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

pub(crate) async fn run(
    args: ShowAccountArgs,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let account = context
        .accounts
        .get_account(AccountId::from_i64(args.account_id))
        .await
        .map_err(|error| match error {
            AccountsServiceError::NotFound => format!("account {} not found", args.account_id),
            other => format!("failed to load account: {other}"),
        })?;

    emit(out, args.format, &account, account_fields)
}
