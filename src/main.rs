use std::env;

use anyhow::{bail, Context, Result};
use fra_tuning::recording::DirectoryStore;
use fra_tuning::{load_config, FraPipeline};
use log::info;

const USAGE: &str = "usage: fra-tuning <config.json> <data-dir> <stem>...";

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 3 {
        bail!(USAGE);
    }
    let (config_path, data_dir, stems) = (&args[0], &args[1], &args[2..]);

    let config =
        load_config(config_path).with_context(|| format!("loading config {config_path}"))?;
    let pipeline = FraPipeline::new(DirectoryStore::new(data_dir), config)
        .context("invalid configuration")?;
    info!(
        "reading {} recordings from {} on channels {:?}",
        stems.len(),
        pipeline.store().root().display(),
        pipeline.config().signal_channels
    );

    let report = pipeline.run(stems);
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialising report")?
    );
    Ok(())
}
