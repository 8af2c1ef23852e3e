/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Product id recorded on alert log rows that describe an aggregate report
/// rather than a single product.
pub const GLOBAL_REPORT_PRODUCT_ID: DbId = 0;
