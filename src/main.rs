/*!
 * Work Crew - Main Entry Point
 *
 * Starts a crew of worker threads, feeds it one batch of work items and
 * prints the aggregated result.
 *
 * Usage: workcrew [NUM_THREADS]
 */

use std::env;
use std::error::Error;
use tracing::{debug, info};

use crewsync::core::limits::{DEFAULT_BATCH_SIZE, DEFAULT_ITEM_VALUE};
use crewsync::crew::SyntheticWorkload;
use crewsync::{init_tracing, Crew, CrewConfig, WorkItem};

fn usage(program: &str) {
    println!("Usage: {program} [NUM_THREADS]");
    println!();
    println!("Runs one batch of {DEFAULT_BATCH_SIZE} work items on a crew of NUM_THREADS workers.");
    println!();
    println!("Environment:");
    println!("  CREW_WORKLOAD_ITERATIONS  synthetic workload rounds per data point");
    println!("  CREW_BATCH_TIMEOUT_MS     abort the batch if it does not drain in time");
    println!("  CREW_SHUTDOWN_GRACE_MS    grace period before stragglers are reported");
    println!("  CREW_PERSISTENT_WORKERS   keep workers waiting between batches (1|true)");
    println!("  CREW_REPORT_JSON          print the shutdown report as JSON (1|true)");
    println!("  CREW_TRACE_JSON           emit logs as JSON (1|true)");
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("workcrew");
    if args.len() != 2 {
        usage(program);
        return Ok(());
    }

    let size: usize = args[1]
        .parse()
        .map_err(|e| format!("invalid NUM_THREADS '{}': {e}", args[1]))?;

    let config = CrewConfig::from_env(size);
    debug!(?config, "Configuration loaded");

    let workload = SyntheticWorkload::new(config.workload_iterations);
    let grace = config.shutdown_grace;
    let crew = Crew::create(config, workload)?;

    let batch: Vec<WorkItem> = (0..DEFAULT_BATCH_SIZE)
        .map(|_| WorkItem::single(DEFAULT_ITEM_VALUE))
        .collect();
    let result = crew.start(batch)?;
    info!(result, "Batch drained");

    let report = crew.shutdown(grace);
    let json_report = env::var("CREW_REPORT_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);
    if json_report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    println!("FINAL RESULT: {result:.6}");
    Ok(())
}
