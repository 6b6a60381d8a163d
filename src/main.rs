use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use facesweep::{compare::FaceComparator, config::Config, report, sweep};

#[derive(Parser)]
#[command(name = "facesweep")]
#[command(about = "Compare two face photos across all preprocessing combinations")]
struct Cli {
    /// First image
    image1: PathBuf,

    /// Second image
    image2: PathBuf,

    /// TOML config file (model paths, detector thresholds)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::default(),
    };

    let mut comparator = FaceComparator::new(&config)?;
    let rows = sweep::run_sweep(&mut comparator, &cli.image1, &cli.image2);

    print!("{}", report::render_table(&rows));
    Ok(())
}

fn setup_logging(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }
}
