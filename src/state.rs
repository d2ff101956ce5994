use chrono_tz::Tz;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Zone whose calendar defines "today" for open-ended history ranges.
    pub reference_tz: Tz,
}
