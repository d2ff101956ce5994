pub mod history_service;
pub mod metrics_service;
pub mod operation_service;
pub mod position_aggregator;
pub mod position_service;
pub mod price_service;
pub mod valuation_series;
