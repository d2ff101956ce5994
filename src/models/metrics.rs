use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub total_investment: BigDecimal,
    pub total_value: BigDecimal,
    pub gain_loss: BigDecimal,
    pub gain_loss_pct: BigDecimal,
}
