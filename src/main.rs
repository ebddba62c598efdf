//! Thin CLI: load a portfolio and assumption set, run the projection engine,
//! write the materialized result matrix to CSV.

use actuarial_system::projection::{MetaRunner, RunConfig};
use actuarial_system::time::{Granularity, TimeAxis};
use actuarial_system::AggregatePayments;
use chrono::NaiveDate;
use clap::Parser;
use std::fs::File;
use std::io::Write;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "actuarial_system", about = "Projects policy cash flows and state probabilities forward in time")]
struct Cli {
    /// Portfolio CSV (cession_id, dob_yyyymmdd, issue_date_yyyymmdd, ...)
    #[arg(long)]
    portfolio: String,

    /// Assumption-set manifest CSV (from_state,to_state,kind,source)
    #[arg(long)]
    assumptions: String,

    /// Portfolio date, yyyy-mm-dd
    #[arg(long)]
    portfolio_date: String,

    /// Product code shared by every policy in the portfolio
    #[arg(long, default_value = "DEFAULT")]
    product_code: String,

    /// Number of states in the state model
    #[arg(long)]
    state_dimension: usize,

    #[arg(long, default_value = "monthly")]
    granularity: String,

    #[arg(long)]
    years_to_simulate: u32,

    #[arg(long, default_value_t = num_cpus_default())]
    num_cpus: usize,

    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    use_multicore: bool,

    #[arg(long, default_value_t = 120)]
    max_age: u32,

    #[arg(long, default_value = "projection_output.csv")]
    output: String,
}

fn num_cpus_default() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn parse_granularity(raw: &str) -> Option<Granularity> {
    match raw.to_ascii_lowercase().as_str() {
        "monthly" => Some(Granularity::Monthly),
        "quarterly" => Some(Granularity::Quarterly),
        "yearly" => Some(Granularity::Yearly),
        _ => None,
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let portfolio_date = NaiveDate::parse_from_str(&cli.portfolio_date, "%Y-%m-%d")
        .expect("portfolio_date must be yyyy-mm-dd");
    let granularity = parse_granularity(&cli.granularity).expect("granularity must be monthly, quarterly or yearly");

    log::info!("loading portfolio from {}", cli.portfolio);
    let load_start = Instant::now();
    let portfolio = actuarial_system::policy::load_portfolio_csv(&cli.portfolio, portfolio_date, &cli.product_code)
        .expect("failed to load portfolio");
    log::info!("loaded {} policies in {:?}", portfolio.len(), load_start.elapsed());

    log::info!("loading assumption set from {}", cli.assumptions);
    let be_assumptions = actuarial_system::assumptions::load_assumption_set_csv(&cli.assumptions, cli.state_dimension)
        .expect("failed to load assumption set");

    let time_axis = TimeAxis::new(granularity, cli.years_to_simulate, portfolio_date);
    log::info!("time axis has {} periods, ending {}", time_axis.len(), time_axis.end_dates.last().unwrap());

    let config = RunConfig::new(
        cli.state_dimension,
        granularity,
        cli.years_to_simulate,
        cli.num_cpus,
        cli.use_multicore,
        cli.max_age,
        be_assumptions,
        Vec::new(),
    )
    .expect("invalid run configuration");

    let payments = AggregatePayments::empty(portfolio.len(), time_axis.len());

    let num_groups = MetaRunner::num_groups(config.use_multicore, config.num_cpus, portfolio.len());
    log::info!("dispatching {} policies across {} worker group(s)", portfolio.len(), num_groups);

    let run_start = Instant::now();
    let result = MetaRunner::run(&config, &portfolio, &time_axis, &payments).expect("projection run failed");
    log::info!("projection completed in {:?}", run_start.elapsed());

    let headers = result.headers();
    let rows = result.materialize(&time_axis).expect("failed to materialize result");

    let mut file = File::create(&cli.output).expect("unable to create output CSV");
    writeln!(file, "{}", headers.join(",")).unwrap();
    for row in &rows {
        let line: Vec<String> = row.iter().map(|v| format!("{v:.8}")).collect();
        writeln!(file, "{}", line.join(",")).unwrap();
    }

    println!("Actuarial projection engine");
    println!("===========================");
    println!("Policies projected : {}", portfolio.len());
    println!("Time steps          : {}", time_axis.len());
    println!("Worker groups       : {}", num_groups);
    println!("Output written to   : {}", cli.output);
}
