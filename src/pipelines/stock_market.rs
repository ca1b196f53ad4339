use crate::dag::schedule::utc_midnight;
use crate::dag::{Dag, DefaultArgs, Schedule};
use crate::error::DagError;
use chrono::Duration;

pub const DAG_ID: &str = "stock_market_data_pipeline";

pub const DESCRIPTION: &str =
    "An ETL pipeline for stock market data using Alpha Vantage, PySpark and BigQuery";

/// Declares the daily stock market ETL job.
///
/// Market data is pulled from Alpha Vantage, transformed, and loaded into
/// BigQuery. Only the job itself is declared here; no tasks are attached.
///
/// # Errors
/// Only if one of the constants below stops passing validation.
pub fn stock_market_data_pipeline() -> Result<Dag, DagError> {
    let default_args = DefaultArgs {
        owner: "airflow".to_string(),
        depends_on_past: false,
        email_on_failure: false,
        email_on_retry: false,
        retries: 1,
        retry_delay: Duration::minutes(5),
    };

    let schedule = Schedule::new(Duration::days(1), utc_midnight(2024, 10, 6)?, false)?;

    Dag::builder(DAG_ID, schedule)
        .description(DESCRIPTION)
        .default_args(default_args)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_identifier() {
        let dag = stock_market_data_pipeline().unwrap();
        assert_eq!(dag.dag_id(), "stock_market_data_pipeline");
        assert_eq!(dag.description(), Some(DESCRIPTION));
    }

    #[test]
    fn test_retry_settings() {
        let args = stock_market_data_pipeline().unwrap().default_args().clone();
        assert_eq!(args.retries, 1);
        assert_eq!(args.retry_delay, Duration::minutes(5));
        assert_eq!(args.owner, "airflow");
        assert!(!args.depends_on_past);
    }

    #[test]
    fn test_schedule() {
        let dag = stock_market_data_pipeline().unwrap();
        assert_eq!(dag.schedule().interval(), Duration::days(1));
        assert_eq!(
            dag.schedule().start_date().date_naive(),
            NaiveDate::from_ymd_opt(2024, 10, 6).unwrap()
        );
        assert!(!dag.schedule().catchup());
    }

    #[test]
    fn test_notifications_disabled() {
        let dag = stock_market_data_pipeline().unwrap();
        assert!(!dag.default_args().email_on_failure);
        assert!(!dag.default_args().email_on_retry);
    }

    #[test]
    fn test_construction_is_idempotent() {
        assert_eq!(
            stock_market_data_pipeline().unwrap(),
            stock_market_data_pipeline().unwrap()
        );
    }

    #[test]
    fn test_declares_no_tasks() {
        assert!(stock_market_data_pipeline().unwrap().tasks().is_empty());
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(stock_market_data_pipeline().unwrap()).unwrap();
        assert_eq!(json["dag_id"], DAG_ID);
        assert_eq!(json["default_args"]["retry_delay_secs"], 300);
        assert_eq!(json["schedule"]["interval_secs"], 86_400);
        assert_eq!(json["schedule"]["catchup"], false);
    }
}
