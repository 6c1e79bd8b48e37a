use std::io::Write;

use clap::Args;
use emporium_app::domain::{
    accounts::records::AccountId,
    catalog::records::CatalogEntryId,
    purchases::{PurchaseError, PurchasesService, data::PurchaseRequest},
};
use tracing::warn;

use super::{CliError, OutputFormat, emit, orders::order_fields};

/// Exit status when the purchase was declined and nothing changed.
const EXIT_DECLINED: u8 = 3;

/// Exit status when storage failed or the deadline passed and nothing changed.
const EXIT_NOT_APPLIED: u8 = 4;

/// Exit status when the commit failed and the purchase may have been applied.
const EXIT_OUTCOME_UNKNOWN: u8 = 5;

#[derive(Debug, Args)]
pub(crate) struct PurchaseArgs {
    /// Paying account id
    #[arg(long)]
    account_id: i64,

    /// Catalog entry id to buy
    #[arg(long)]
    catalog_entry_id: i64,

    /// Units to buy; omitted or non-positive values buy one
    #[arg(long, allow_negative_numbers = true)]
    quantity: Option<i32>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
}

impl PurchaseArgs {
    fn request(&self) -> PurchaseRequest {
        PurchaseRequest::new(
            AccountId::from_i64(self.account_id),
            CatalogEntryId::from_i64(self.catalog_entry_id),
            self.quantity.filter(|quantity| *quantity > 0).unwrap_or(1),
        )
    }
}

pub(crate) async fn run(
    args: PurchaseArgs,
    purchases: &dyn PurchasesService,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let request = args.request();

    match purchases.purchase(request).await {
        Ok(order) => emit(out, args.format, &order, order_fields),
        Err(error) => {
            warn!(
                account_id = %request.account_id,
                catalog_entry_id = %request.catalog_entry_id,
                quantity = request.quantity,
                outcome_known = error.is_outcome_known(),
                error = %error,
                "purchase failed"
            );

            Err(failure(&error))
        }
    }
}

fn failure(error: &PurchaseError) -> CliError {
    let code = match error {
        PurchaseError::InvalidQuantity(_)
        | PurchaseError::NotFound(_)
        | PurchaseError::InsufficientStock { .. }
        | PurchaseError::InsufficientFunds { .. }
        | PurchaseError::TotalOverflow { .. } => EXIT_DECLINED,
        PurchaseError::DeadlineExceeded | PurchaseError::Storage(_) => EXIT_NOT_APPLIED,
        PurchaseError::OutcomeUnknown(_) => EXIT_OUTCOME_UNKNOWN,
    };

    CliError::new(format!("purchase failed: {error}"), code)
}
