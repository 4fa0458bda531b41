use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use boostgen::{BindingConfig, Destination, Header};

#[derive(Parser)]
#[command(name = "boostgen")]
#[command(version, about = "Generate daScript boost bindings from a parsed C header")]
struct Cli {
    /// Header dump in JSON-lines format, one record per line
    #[arg(long)]
    header: PathBuf,

    /// TOML file declaring the handles, structs and functions to wrap
    #[arg(short, long)]
    config: PathBuf,

    /// Output file; the generated module is printed to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the module name set in the config
    #[arg(long)]
    module: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let header = Header::read_jsonl(&cli.header)
        .with_context(|| format!("reading header {}", cli.header.display()))?;
    let mut config = BindingConfig::from_file(&cli.config)
        .with_context(|| format!("reading config {}", cli.config.display()))?;
    if let Some(module) = cli.module {
        config.module = Some(module);
    }

    let generator = config
        .into_generator_builder()
        .build(&header)
        .context("declarations do not match the header")?;
    let destination: Destination = generator.generate()?.into_iter().collect();

    match cli.output {
        Some(output) => {
            let written = destination.write(&output)?;
            log::info!("generated {}", written.display());
        }
        None => print!("{}", destination.content()),
    }
    Ok(())
}
