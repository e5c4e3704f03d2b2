//! nc-hammer - NETCONF load testing CLI
//!
//! `run` executes a suite and prints a latency report, `analyse` reports on
//! a results file from an earlier run, `init` writes an example suite.

use clap::Parser;
use nc_hammer::{
    cli::{version_info, AnalyseArgs, Cli, Command, InitArgs, RunArgs},
    config::{display_config_summary, load_config, EnvManager},
    error::{AppError, ErrorReporter, Result},
    logging::LoggerFactory,
    output::{load_results, OutputFormatterFactory, ResultCollector},
    suite::{SuiteTemplate, TestSuite},
    transport::SshTransport,
    Engine, PKG_NAME, VERSION,
};
use std::path::Path;
use std::process;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() {
    // Panics on runtime worker threads unwind into their JoinHandle, where
    // the engine closes sessions before turning them into an Internal error.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        if std::thread::current().name() == Some("main") {
            process::exit(99);
        }
    }));

    let cli = Cli::parse();
    let reporter = match &cli.command {
        Command::Run(args) => ErrorReporter::new(args.use_colors(), args.verbose || args.debug),
        Command::Analyse(args) => ErrorReporter::new(args.use_colors(), false),
        _ => ErrorReporter::new(false, false),
    };

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        process::exit(e.exit_code());
    }
}

async fn run_application(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => run_suite(args).await,
        Command::Analyse(args) => analyse(args).await,
        Command::Init(args) => init(args),
        Command::Version => {
            println!("{}", version_info());
            Ok(())
        }
    }
}

/// Execute a suite; failed actions are reported, they do not fail the process
async fn run_suite(args: RunArgs) -> Result<()> {
    args.validate().map_err(AppError::config)?;

    if args.debug {
        eprintln!("{} v{}", PKG_NAME, VERSION);
        eprintln!("Debug mode enabled");
    }

    let config = load_config(args.clone())?;
    let loggers = LoggerFactory::new(config.clone());
    let logger = loggers.create_logger("APP").await;

    if config.debug {
        eprintln!("{}", display_config_summary(&config));
        for warning in EnvManager::validate_current_env() {
            nc_hammer::log_warn!(logger, "{}", warning);
        }
    }

    let suite = TestSuite::from_file(&args.suite_file)?;
    for warning in suite.warnings() {
        eprintln!("{}", warning.format(config.enable_color));
    }
    nc_hammer::log_info!(
        logger,
        "Loaded suite {} ({} clients, {} iterations, {} hosts)",
        args.suite_file.display(),
        suite.clients,
        suite.iterations,
        suite.configs.len()
    );

    let engine = Engine::new(suite, Arc::new(SshTransport::new()), &config);

    let mut collector = ResultCollector::new().with_progress(config.progress);
    if let Some(output_dir) = &config.output_dir {
        collector = collector
            .with_output_dir(output_dir, engine.run_id(), Some(&args.suite_file))
            .await?;
    }

    let (sender, receiver) = mpsc::unbounded_channel();
    let (summary, results) = tokio::join!(engine.run(sender), collector.collect(receiver));
    let summary = summary?;
    let results = results?;

    nc_hammer::log_info!(
        logger,
        "Run {} finished: {} results from {} clients in {:.3}s",
        summary.run_id,
        summary.results,
        summary.clients_completed,
        summary.elapsed.as_secs_f64()
    );

    let formatter = OutputFormatterFactory::create_formatter(config.enable_color);
    println!("{}", formatter.format_report(&results)?);

    if let Some(path) = collector.results_path() {
        println!();
        println!("Results written to {}", path.display());
    }

    Ok(())
}

async fn analyse(args: AnalyseArgs) -> Result<()> {
    let results = load_results(&args.results_file).await?;
    let formatter = OutputFormatterFactory::create_formatter(args.use_colors());
    println!("{}", formatter.format_report(&results)?);
    Ok(())
}

fn init(args: InitArgs) -> Result<()> {
    SuiteTemplate::write_to(&args.path)?;
    println!("Example suite written to {}", args.path.display());

    if args.env {
        let env_path = args
            .path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(".env.example");
        if env_path.exists() {
            return Err(AppError::io(format!("{} already exists, not overwriting", env_path.display())));
        }
        EnvManager::save_example_env_file(&env_path)?;
        println!("Example environment written to {}", env_path.display());
    }
    Ok(())
}
