use clap::Parser;
use stagewatch::{cli, config, errors};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, 0) => "warn",
        (_, 0) => "info",
        (_, 1) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.with_ansi(!cli.no_color).init();
    }

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let result = match cli.command {
        cli::Commands::Watch(args) => cli::watch::handle_watch(args, cli.quiet).await,
        cli::Commands::Reduce(args) => cli::reduce::handle_reduce(args).await,
        cli::Commands::Stages(args) => cli::stages::handle_stages(args).await,
        cli::Commands::Validate(args) => handle_validate(args).await,
    };

    match result {
        Ok(()) => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            let exit_code = match &e {
                errors::TrackerError::Config(_)
                | errors::TrackerError::InvalidConfiguration(_)
                | errors::TrackerError::Yaml(_) => 2,
                errors::TrackerError::Network(_) | errors::TrackerError::Timeout(_) => 3,
                errors::TrackerError::Authentication(_) => 4,
                errors::TrackerError::NotFound(_) => 5,
                errors::TrackerError::JobFailed(_) => 6,
                _ => 1,
            };
            std::process::exit(exit_code);
        }
    }
}

async fn handle_validate(args: cli::commands::ValidateArgs) -> Result<(), errors::TrackerError> {
    let path = std::path::PathBuf::from(&args.config);
    let config = config::parse_config(&path).await?;
    println!(
        "Configuration is valid: {} ({} stages)",
        args.config,
        config.stages().len()
    );
    Ok(())
}
