use async_trait::async_trait;
use crate::{CompanyProfile, DashboardError, Quote};

/// Source of per-symbol quote and profile data for the market board.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(&self, symbol: &str) -> Result<Quote, DashboardError>;

    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, DashboardError>;
}
