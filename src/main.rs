use anyhow::{Context, Result};
use causeway::{cli::Cli, pipeline, report::RunSummary};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` raises the level to TRACE
fn init_tracing(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let filter = if debug {
        filter.add_directive(tracing::Level::TRACE.into())
    } else {
        filter
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = args.run_config().context("Failed to load run configuration")?;

    let reconstruction = pipeline::run(&config).with_context(|| {
        format!(
            "Timeline reconstruction failed for {}",
            config.input_path.display()
        )
    })?;

    if config.print_summary {
        println!(
            "{}",
            RunSummary::new(&reconstruction.output, &reconstruction.diagnostics)
        );
        println!("Output written to {}", config.output_path.display());
    }

    Ok(())
}
