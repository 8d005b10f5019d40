use anyhow::Result;
use clap::Parser;

use sprig::cli::{run, CliArgs};

fn main() -> Result<()> {
    sprig::tracing::init();

    let args = CliArgs::parse();
    let output = run(&args)?;
    println!("{output}");

    Ok(())
}
