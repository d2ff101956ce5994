pub(crate) mod health;
pub(crate) mod history;
pub(crate) mod metrics;
pub(crate) mod operations;
pub(crate) mod positions;
pub(crate) mod prices;
