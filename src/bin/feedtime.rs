use anyhow::{Context, Result};
use clap::Parser;
use feedtime::CLIArgs;
use log::info;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = CLIArgs::parse();
    let mut grid = feedtime::read_grid(&args.input_path, args.symbol_policy()).with_context(|| {
        format!(
            "Failed to read farm from given file({}).",
            args.input_path.display()
        )
    })?;

    let region_sizes = grid.region_sizes();
    info!("Found {} pasture(s) in farm.", region_sizes.len());
    let max_size = region_sizes.into_iter().max().unwrap_or(0);
    feedtime::write_result(&args.output_path, max_size)?;
    println!(
        "The largest pasture in given farm has {} square(s).",
        max_size
    );

    Ok(())
}
