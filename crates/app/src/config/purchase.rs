//! Purchase Config

use std::time::Duration;

use clap::Args;

/// Purchase engine settings.
#[derive(Debug, Clone, Args)]
pub struct PurchaseConfig {
    /// Abandon a purchase after this many milliseconds, including time spent
    /// waiting on row locks. Unbounded when omitted.
    #[arg(
        long,
        env = "PURCHASE_DEADLINE_MS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub purchase_deadline_ms: Option<u64>,
}

impl PurchaseConfig {
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.purchase_deadline_ms.map(Duration::from_millis)
    }
}
