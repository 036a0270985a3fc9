use chrono::NaiveDate;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum GenerateError {
    #[error("row count must be positive")]
    NoRows,
    #[error("date window is empty or inverted: [{start}, {end})")]
    EmptyWindow { start: NaiveDate, end: NaiveDate },
    #[error("reference table `{0}` is empty")]
    EmptyTable(&'static str),
    #[error("reference table `{table}` has invalid weights: {reason}")]
    InvalidWeights { table: &'static str, reason: String },
    #[error("reference table `{table}` has a negative price for {item}")]
    NegativePrice { table: &'static str, item: String },
    #[error("discount rate must be within [0, 1], got {0}")]
    DiscountRate(f64),
    #[error("customer pool ratio must be within (0, 1], got {0}")]
    PoolRatio(f64),
}
