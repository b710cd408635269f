// SPDX-License-Identifier: GPL-3.0-only

//! backing-chain - inspect the backing chains of disk images

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use storage_chain::{BuildOptions, build_chain};
use storage_sys::QemuImgProbe;
use storage_types::{ImageFormat, StorageSource};

mod commands;
mod config;
mod logging;

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "backing-chain")]
#[command(version, about = "Inspect disk image backing chains")]
struct Cli {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/backing-chain/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a backing-store reference without touching any image
    Parse {
        spec: String,
        #[arg(long)]
        json: bool,
    },
    /// Build and print the backing chain of an image
    Chain {
        #[command(flatten)]
        image: ImageArgs,
        #[arg(long)]
        json: bool,
    },
    /// Find the image a disk-target specifier refers to
    Lookup {
        #[command(flatten)]
        image: ImageArgs,
        /// Path, backing reference, `<target>` or `<target>[<id>]`
        #[arg(required_unless_present = "base")]
        name: Option<String>,
        /// Look up the image directly below `--from` instead of a name
        #[arg(long, conflicts_with = "name", requires = "from")]
        base: bool,
        #[arg(long)]
        from: Option<u32>,
        #[arg(long, default_value = "vda")]
        target: String,
    },
    /// Print the path of one image relative to the directory of another
    Relative {
        #[command(flatten)]
        image: ImageArgs,
        #[arg(long)]
        top: u32,
        #[arg(long)]
        base: u32,
    },
}

#[derive(Debug, Args)]
struct ImageArgs {
    /// Top image of the chain
    path: String,
    /// Declared format of the top image
    #[arg(long)]
    format: Option<ImageFormat>,
    #[arg(long)]
    max_depth: Option<usize>,
    /// Probe images as this user
    #[arg(long)]
    uid: Option<u32>,
    /// Probe images as this group
    #[arg(long)]
    gid: Option<u32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    logging::init(config.log_level);

    let output = match cli.command {
        Command::Parse { spec, json } => commands::parse(&spec, json)?,
        Command::Chain { image, json } => commands::chain(&resolve(&image, &config)?, json)?,
        Command::Lookup {
            image,
            name,
            base: _,
            from,
            target,
        } => commands::lookup(&resolve(&image, &config)?, name.as_deref(), from, &target)?,
        Command::Relative { image, top, base } => {
            commands::relative(&resolve(&image, &config)?, top, base)?
        }
    };
    println!("{output}");
    Ok(())
}

fn resolve(image: &ImageArgs, config: &Config) -> Result<StorageSource> {
    let probe = match &config.qemu_img {
        Some(binary) => QemuImgProbe::with_binary(binary)?,
        None => QemuImgProbe::new()?,
    };
    let options = BuildOptions {
        format: image.format.unwrap_or(config.format),
        uid: image.uid,
        gid: image.gid,
        max_depth: image.max_depth.unwrap_or(config.max_depth),
    };
    if options.max_depth == 0 {
        anyhow::bail!("--max-depth must be at least 1");
    }

    tracing::debug!(path = %image.path, ?options, "building backing chain");
    build_chain(&probe, &image.path, &options)
        .with_context(|| format!("cannot resolve the backing chain of '{}'", image.path))
}
