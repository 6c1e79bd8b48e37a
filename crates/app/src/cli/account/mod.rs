use std::io::Write;

use clap::{Args, Subcommand};
use emporium_app::{
    context::AppContext, domain::accounts::records::AccountRecord, money::format_amount,
};

use super::CliError;

mod create;
mod show;

#[derive(Debug, Args)]
pub(crate) struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Debug, Subcommand)]
enum AccountSubcommand {
    /// Open an account with a starting balance
    Create(create::CreateAccountArgs),
    /// Show an account and its balance
    Show(show::ShowAccountArgs),
}

pub(crate) async fn run(
    command: AccountCommand,
    context: &AppContext,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command.command {
        AccountSubcommand::Create(args) => create::run(args, context, out).await,
        AccountSubcommand::Show(args) => show::run(args, context, out).await,
    }
}

fn account_fields(account: &AccountRecord) -> Vec<(&'static str, String)> {
    vec![
        ("account_id", account.id.to_string()),
        ("name", account.name.clone()),
        ("balance", format_amount(account.balance)),
        ("created_at", account.created_at.to_string()),
        ("updated_at", account.updated_at.to_string()),
    ]
}
