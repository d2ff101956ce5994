pub mod operation_queries;
pub mod position_queries;
pub mod price_queries;
