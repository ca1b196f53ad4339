use anyhow::Context;
use chrono::Utc;
use dotenv::dotenv;
use stock_market_pipeline::config::{OutputFormat, Settings};
use stock_market_pipeline::pipelines::{stock_market, stock_market_data_pipeline};
use stock_market_pipeline::{Dag, InMemoryOrchestrator, Orchestrator};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Prints the descriptor and the runs that are due right now.
///
/// # Arguments
/// * `dag`: The registered DAG
/// * `settings`: Output format, the end of the last completed run and how
///   many due runs to list
fn print_dag(dag: &Dag, settings: &Settings) -> anyhow::Result<()> {
    let now = Utc::now();
    let due_total = dag.schedule().due_count(settings.last_run_end, now);
    let due: Vec<_> = dag
        .schedule()
        .due_runs(settings.last_run_end, now)
        .take(settings.max_listed_runs)
        .collect();
    let next = dag.schedule().next_interval(now);

    match settings.output {
        OutputFormat::Json => {
            let report = serde_json::json!({
                "dag": dag,
                "due_total": due_total,
                "due_runs": due,
                "next_interval": next,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            let args = dag.default_args();
            println!("\nDAG: {}", dag.dag_id());
            if let Some(description) = dag.description() {
                println!("Description: {}", description);
            }
            println!("Owner: {}", args.owner);
            println!("Depends on past: {}", args.depends_on_past);
            println!("Email on failure: {}", args.email_on_failure);
            println!("Email on retry: {}", args.email_on_retry);
            println!("Retries: {}", args.retries);
            println!("Retry delay: {}s", args.retry_delay.num_seconds());
            println!("Interval: {}s", dag.schedule().interval().num_seconds());
            println!("Start date: {}", dag.schedule().start_date().to_rfc3339());
            println!("Catchup: {}", dag.schedule().catchup());
            println!("Tasks: {}", dag.tasks().len());

            println!("\nDue runs: {} (listing {})", due_total, due.len());
            for interval in &due {
                println!("  {}", interval);
            }
            match next {
                Some(next) => println!("Next interval: {}", next),
                None => println!("Next interval: none"),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;

    let orchestrator = InMemoryOrchestrator::new();
    let dag = stock_market_data_pipeline().context("declaring stock market pipeline")?;
    info!(%dag, "declared");
    if dag.tasks().is_empty() {
        warn!(dag_id = dag.dag_id(), "dag has no tasks attached");
    }

    orchestrator
        .register(dag)
        .await
        .context("registering stock market pipeline")?;

    let dag = orchestrator
        .get(stock_market::DAG_ID)
        .await
        .context("stock market pipeline missing after registration")?;

    print_dag(&dag, &settings)
}
