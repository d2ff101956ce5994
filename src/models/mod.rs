mod history;
mod metrics;
mod operation;
mod position;
mod price_point;

pub use history::{
    Grouping, HistoryMeta, HistoryQuery, HistoryResponse, SeriesParams, SeriesPoint,
    DEFAULT_MAX_POINTS,
};
pub use metrics::PortfolioMetrics;
pub use operation::{
    AssetType, BatchImportResult, CreateOperation, NewOperation, Operation, Side, UnknownVariant,
};
pub use position::{Position, PositionView, RecomputeSummary};
pub use price_point::{CreatePricePoint, PricePoint, RecordPriceResult};
