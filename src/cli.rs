use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use storeview::value::DateZone;

#[derive(Parser)]
#[command(name = "storeview", about = "Browse document store files as a tree", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding settings.json (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Open a store and print its collection tree
    Browse(BrowseArgs),
    /// Build a store file from JSON documents
    Pack(PackArgs),
    /// Show what a file is and which collections it holds
    Info(InfoArgs),
    /// Print or change viewer settings
    Settings(SettingsArgs),
}

#[derive(Args)]
pub struct BrowseArgs {
    pub file: PathBuf,
    /// Password for a protected store; prompted for when missing
    #[arg(short, long)]
    pub password: Option<String>,
    /// Expand a collection by name (repeatable)
    #[arg(short, long = "expand", value_name = "NAME")]
    pub expand: Vec<String>,
    /// Expand every collection
    #[arg(long)]
    pub expand_all: bool,
    /// Read further commands from stdin
    #[arg(short, long)]
    pub interactive: bool,
}

#[derive(Args)]
pub struct PackArgs {
    /// Output store file
    pub out: PathBuf,
    /// Collection source as NAME=FILE.json (repeatable)
    #[arg(
        short,
        long = "collection",
        value_name = "NAME=FILE",
        value_parser = parse_collection_source,
        required = true
    )]
    pub collections: Vec<(String, PathBuf)>,
    /// Protect the store with a password
    #[arg(short, long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct InfoArgs {
    pub file: PathBuf,
    #[arg(short, long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct SettingsArgs {
    /// Date pattern for date-time values (strftime syntax)
    #[arg(long)]
    pub date_format: Option<String>,
    /// Zone for the calendar day of date-time values: local or utc
    #[arg(long, value_name = "ZONE")]
    pub time_zone: Option<DateZone>,
}

fn parse_collection_source(raw: &str) -> Result<(String, PathBuf), String> {
    let (name, file) =
        raw.split_once('=').ok_or_else(|| format!("expected NAME=FILE, got '{raw}'"))?;
    if name.is_empty() {
        return Err("collection name must not be empty".to_string());
    }
    if file.is_empty() {
        return Err(format!("missing file for collection '{name}'"));
    }
    Ok((name.to_string(), PathBuf::from(file)))
}
