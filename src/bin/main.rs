use clap::Parser;
use quote_sweep::{Config, OutputFormat, Params, Runner, SweepPlan};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "quote-sweep")]
#[command(about = "Sweep a pricing configurator and record every quote")]
#[command(version)]
struct Cli {
    /// Sweep file to run
    config: PathBuf,

    /// Run in headless mode (overrides config)
    #[arg(long)]
    headless: bool,

    /// Set a parameter (can be used multiple times)
    #[arg(short = 'P', long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Output file (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: text or csv (overrides config)
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Validate the sweep file without running
    #[arg(long)]
    check: bool,

    /// Print every configuration label without running
    #[arg(long)]
    plan: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> quote_sweep::Result<()> {
    let cli = Cli::parse();

    if std::env::var_os("RUST_LOG").is_some() {
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .compact()
            .init();
    } else {
        let level = if cli.quiet {
            Level::ERROR
        } else {
            match cli.verbose {
                0 => Level::WARN,
                1 => Level::INFO,
                _ => Level::DEBUG,
            }
        };
        FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .init();
    }

    let params = Params::from_args(&cli.params)?;
    let mut config = Config::load_with_params(&cli.config, &params)?;

    if cli.headless {
        config.browser.headless = true;
    }
    if let Some(path) = cli.output {
        config.output.path = path;
    }
    if let Some(ref format) = cli.format {
        config.output.format = format.parse::<OutputFormat>()?;
    }

    if cli.check {
        println!("Sweep valid: {}", config.name);
        println!("  Target: {}", config.target.url);
        println!("  Presets: {}", config.presets.len());
        for dim in &config.dimensions {
            let forced = if dim.forced { " (forced)" } else { "" };
            println!("    - {}{}: {} values", dim.control, forced, dim.values().len());
        }
        println!("  Quantities: {}", config.quantity.values.len());
        println!("  Configurations: {}", config.configuration_count());
        println!("  Quotes: {}", config.quote_count());
        if !config.params.is_empty() {
            println!("  Parameters: {}", config.params.len());
            for (name, def) in &config.params {
                let req = if def.required { " (required)" } else { "" };
                let desc = def.description.as_deref().unwrap_or("");
                println!("    - {}{}: {}", name, req, desc);
            }
        }
        println!(
            "  Output: {} ({})",
            config.output.path.display(),
            config.output.format
        );
        return Ok(());
    }

    if cli.plan {
        let plan = SweepPlan::from_config(&config);
        for cfg in plan.configurations() {
            println!("{}", cfg.label());
        }
        return Ok(());
    }

    println!("Running: {}", config.name);

    let runner = Runner::new(&config.browser).await?;
    let result = runner.run(&config).await;

    println!();
    let failed = match result {
        Ok(ref report) => {
            println!("✓ Sweep complete");
            println!("  Configurations: {}", report.configurations);
            if report.failed_configurations > 0 {
                println!("  Not applied: {}", report.failed_configurations);
            }
            println!("  Quotes: {} ({} priced, {} errors)", report.quotes, report.priced, report.errors);
            println!("  Duration: {}ms", report.duration_ms);
            println!("  Output: {}", config.output.path.display());
            false
        }
        Err(ref e) => {
            println!("✗ Aborted");
            println!("  Error: {}", e);
            if config.output.path.exists() {
                println!("  Partial output: {}", config.output.path.display());
            }
            true
        }
    };

    runner.close().await?;

    if failed {
        std::process::exit(1);
    }

    Ok(())
}
