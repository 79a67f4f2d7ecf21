use anyhow::Context;
use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use kodi_repo_builder::{
    create_repository, logging,
    utils::{normalize_location, read_locations_file},
    Config,
};
use log::debug;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(author, version, about = "Create a Kodi add-on repository from add-on sources", long_about = None)]
struct Cli {
    /// Location of an add-on: a local folder, a zip archive, or
    /// REPOSITORY_URL[#BRANCH[#ALT_ID[#ALT_NAME]]]
    #[arg(value_name = "ADDON")]
    addons: Vec<String>,

    /// Path to place the add-ons [current directory]
    #[arg(short, long)]
    datadir: Option<PathBuf>,

    /// Path for the addons.xml file [DATADIR/addons.xml or DATADIR/addons.xml.gz if compressed]
    #[arg(short, long)]
    info: Option<PathBuf>,

    /// Path for the addons.xml.md5 file [DATADIR/addons.xml.md5]
    #[arg(short, long)]
    checksum: Option<PathBuf>,

    /// Compress addons.xml with gzip
    #[arg(short = 'z', long)]
    compressed: bool,

    /// File listing extra add-on locations, one per line [addonslist.txt]
    #[arg(short = 'l', long)]
    addons_list: Option<PathBuf>,

    /// TexturePacker executable used for skins
    #[arg(long)]
    texture_packer: Option<PathBuf>,

    /// Branch for git locations that do not name one [master]
    #[arg(long)]
    branch: Option<String>,

    /// Write index.html listings and archive checksums
    #[arg(long)]
    html_index: bool,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<(Config, Vec<String>)> {
        let mut config = Config::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(datadir) = self.datadir {
            config.datadir = datadir;
        }
        if self.info.is_some() {
            config.info = self.info;
        }
        if self.checksum.is_some() {
            config.checksum = self.checksum;
        }
        if let Some(addons_list) = self.addons_list {
            config.addons_list = addons_list;
        }
        if let Some(texture_packer) = self.texture_packer {
            config.texture_packer = texture_packer;
        }
        if let Some(branch) = self.branch {
            config.default_branch = branch;
        }
        config.compressed |= self.compressed;
        config.html_index |= self.html_index;

        let mut locations: Vec<String> = self.addons.iter().map(|a| normalize_location(a)).collect();
        let listed = read_locations_file(&config.addons_list)
            .with_context(|| format!("Failed to read {}", config.addons_list.display()))?;
        locations.extend(listed);

        Ok((config, locations))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _ = logging::init(&cli.log_level);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "[ERROR]".bright_red(), e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (config, locations) = cli.into_config()?;
    debug!("Configuration: {:?}", config);

    println!(
        "{} {} add-ons into {}",
        "Packaging".bright_green(),
        locations.len(),
        config.datadir.display().to_string().bright_white()
    );

    let pb = ProgressBar::new(locations.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} add-ons")?
            .progress_chars("#>-"),
    );

    let result = create_repository(&locations, &config, Some(pb.clone())).await;
    pb.finish_and_clear();
    let summary = result.context("Repository was not updated")?;

    for addon in &summary.addons {
        println!("  {} {} {}", "[OK]".bright_green(), addon.id.bright_white(), addon.version);
    }
    println!(
        "{} {} ({})",
        "[SAVED]".bright_blue(),
        summary.manifest_path.display(),
        summary.digest
    );
    Ok(())
}
