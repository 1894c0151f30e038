use std::path::Path;
use std::process::exit;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{Cli, Commands};
use encoding_rs::Encoding;
use log::{error, info};
use logger::SimpleLogger;
use trackinfo::TrackConfig;

mod batch;
mod cli;
mod error;
mod id3;
mod logger;
mod rename;
mod trackinfo;
mod util;

static LOGGER: SimpleLogger = SimpleLogger;

fn main() {
    let cli = Cli::parse();

    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(cli.log_level.filter()))
        .expect("failed to set logger");

    let result = match cli.command {
        Commands::Convert {
            mp3_dir,
            track_info,
            encoding,
        } => convert(&mp3_dir, &track_info, &encoding),
        Commands::Strip { mp3_dir } => strip(&mp3_dir),
        Commands::Show { file } => show(&file),
    };

    if let Err(error) = result {
        error!("Error: {:#}", error);
        exit(1);
    }
}

fn convert(mp3_dir: &Path, track_info: &Path, encoding: &str) -> Result<()> {
    let encoding = Encoding::for_label(encoding.as_bytes())
        .ok_or_else(|| anyhow!("unknown encoding: {}", encoding))?;
    let config = TrackConfig::read(track_info, encoding)
        .with_context(|| format!("failed to read ({})", track_info.to_string_lossy()))?;
    config.log_summary();

    let written = batch::convert_all(mp3_dir, &config)?;
    info!("{} files written", written.len());
    Ok(())
}

fn strip(mp3_dir: &Path) -> Result<()> {
    let report = batch::strip_all(mp3_dir)?;
    info!("{} copied, {} failed", report.copied, report.failed);
    Ok(())
}

fn show(file: &Path) -> Result<()> {
    let (header, frames) = batch::list_frames(file)?;
    println!(
        "ID3v2.3 tag, {} bytes, flags {:#04x}",
        header.tag_end(),
        header.flags
    );
    for frame in frames {
        println!("{}", frame);
    }
    Ok(())
}
