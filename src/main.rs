//! gridslot entry point: CLI wiring and config-driven advisor construction.

use std::process;

use chrono::Utc;

use gridslot::advisor::CarbonAdvisor;
use gridslot::cli::{self, CliArgs, Command};
use gridslot::config::AdvisorConfig;
use gridslot::io::export::export_csv;
use gridslot::logging;

fn main() {
    logging::init();

    let cli = match cli::parse_args() {
        Ok(Command::Run(cli)) => cli,
        Ok(Command::Help) => {
            cli::print_usage();
            process::exit(0);
        }
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    let config = match cli.load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let advisor = match config.build_advisor() {
        Ok(advisor) => advisor,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("error: failed to create tokio runtime: {e}");
        process::exit(1);
    });

    if let Err(e) = rt.block_on(run(&cli, &config, advisor)) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run(cli: &CliArgs, config: &AdvisorConfig, advisor: CarbonAdvisor) -> Result<(), String> {
    let location = config.location();
    let refreshed = match cli.now {
        Some(local_now) => advisor.refresh_local(location, local_now).await,
        None => advisor.refresh(location, Utc::now()).await,
    };
    refreshed.map_err(|e| format!("forecast unavailable: {e}"))?;

    let snapshot = advisor
        .forecast()
        .ok_or_else(|| "forecast unavailable: nothing was published".to_string())?;

    println!(
        "Carbon intensity forecast ({:.4}, {:.4}) from {}",
        config.location.latitude,
        config.location.longitude,
        snapshot.built_at.format(cli::NOW_FORMAT)
    );
    for point in &snapshot.points {
        println!("{point}");
    }

    match advisor.grid_condition() {
        Some(condition) => println!("\nGrid now: {condition}"),
        None => println!("\nNo forecast data available for the current hour."),
    }

    if let Some(task) = &cli.task {
        let plan = advisor
            .schedule_task(task, cli.duration_hours, cli.behavior)
            .await
            .map_err(|e| e.to_string())?;
        println!("\n{plan}");
    }

    if let Some(path) = &cli.forecast_out {
        export_csv(&snapshot.points, config.optimizer.green_threshold, path)
            .map_err(|e| format!("failed to write CSV: {e}"))?;
        eprintln!("Forecast written to {}", path.display());
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(gridslot::api::AppState {
            advisor: Arc::new(advisor),
            location,
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        gridslot::api::serve(state, addr)
            .await
            .map_err(|e| format!("server error: {e}"))?;
    }

    Ok(())
}
