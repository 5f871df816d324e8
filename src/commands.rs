use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use storeview::browser::{BrowserSession, Expansion};
use storeview::helpers::{format_count, format_file_size};
use storeview::models::NodeId;
use storeview::state::{ConfigManager, ViewerSettings};
use storeview::store::{FileStore, StoreProbe, StoreWriter};
use storeview::value::{ValueRenderer, parse_items_from_json};
use storeview::views::{node_count_line, render_collections, render_outline};

use crate::cli::*;

pub fn run_command(cli: Cli) -> Result<()> {
    let config_dir = cli.config_dir;
    let config = || match &config_dir {
        Some(dir) => ConfigManager::with_config_dir(dir.clone()),
        None => ConfigManager::new(),
    };
    match cli.command {
        Command::Browse(args) => cmd_browse(args, load_settings(config())),
        Command::Pack(args) => cmd_pack(args),
        Command::Info(args) => cmd_info(args),
        Command::Settings(args) => cmd_settings(args, config()?),
    }
}

fn load_settings(config: Result<ConfigManager>) -> ViewerSettings {
    match config.and_then(|config| config.load_settings()) {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("Using default settings: {err:#}");
            ViewerSettings::default()
        }
    }
}

fn cmd_browse(args: BrowseArgs, settings: ViewerSettings) -> Result<()> {
    let mut session =
        BrowserSession::with_file_store(ValueRenderer::from_settings(&settings.rendering));

    let mut password = args.password;
    let probe = session
        .probe(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if probe == StoreProbe::Locked && password.is_none() {
        password = Some(prompt_password(&args.file)?);
    }
    let opened = session
        .open(&args.file, password.as_deref())
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    println!(
        "Opened {} ({} collections{})",
        args.file.display(),
        opened.collections,
        if opened.protected { ", protected" } else { "" }
    );

    if args.expand_all {
        for (name, outcome) in session.expand_all() {
            if let Err(err) = outcome {
                eprintln!("Error: {name}: {err}");
            }
        }
    }
    for name in &args.expand {
        if let Err(err) = session.expand_collection(name) {
            eprintln!("Error: {name}: {err}");
        }
    }

    print!("{}", render_outline(session.tree()));
    println!("{}", node_count_line(session.node_count()));

    if args.interactive {
        let stdin = io::stdin();
        run_interactive(&mut session, stdin.lock(), io::stdout())?;
    }
    Ok(())
}

/// Ask for a store password without echoing it on a terminal.
fn prompt_password(file: &Path) -> Result<String> {
    let prompt = format!("Password for {}: ", file.display());
    if io::stdin().is_terminal() {
        return rpassword::prompt_password(prompt).context("Failed to read password");
    }
    eprint!("{prompt}");
    read_password_line(io::stdin().lock())
}

/// Piped input: the first line, without its line ending.
fn read_password_line<R: BufRead>(mut input: R) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

const HELP: &str = "\
Commands:
  ls                 list collections
  tree               print the outline
  expand <name|#n>   expand a collection by name or index
  count              print the node count
  help               show this help
  quit               leave";

fn run_interactive<R: BufRead, W: Write>(
    session: &mut BrowserSession,
    input: R,
    mut output: W,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let (command, rest) = match line.trim().split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.trim(), ""),
        };
        match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => writeln!(output, "{HELP}")?,
            "ls" => write!(output, "{}", render_collections(session.tree()))?,
            "tree" => write!(output, "{}", render_outline(session.tree()))?,
            "count" => writeln!(output, "{}", node_count_line(session.node_count()))?,
            "expand" => {
                let Some(root) = resolve_root(session, rest) else {
                    writeln!(output, "Error: no collection '{rest}'")?;
                    continue;
                };
                match session.expand(root) {
                    Ok(Expansion::Loaded { children }) => {
                        writeln!(output, "Loaded {} children", format_count(children))?
                    }
                    Ok(Expansion::AlreadyLoaded) => writeln!(output, "Already loaded")?,
                    Ok(Expansion::InProgress) => writeln!(output, "Still loading")?,
                    Ok(Expansion::NotExpandable) => writeln!(output, "Not expandable")?,
                    Err(err) => writeln!(output, "Error: {err}")?,
                }
                writeln!(output, "{}", node_count_line(session.node_count()))?;
            }
            other => writeln!(output, "Unknown command '{other}', try 'help'")?,
        }
        output.flush()?;
    }
    Ok(())
}

/// `#n` picks the n-th root; anything else is a collection name.
fn resolve_root(session: &BrowserSession, target: &str) -> Option<NodeId> {
    let tree = session.tree();
    match target.strip_prefix('#').map(str::parse::<usize>) {
        Some(Ok(index)) => tree.roots().get(index).copied(),
        Some(Err(_)) => None,
        None => tree.find_root(target),
    }
}

fn cmd_pack(args: PackArgs) -> Result<()> {
    let mut writer = StoreWriter::new();
    if let Some(password) = args.password {
        writer = writer.password(password);
    }
    for (name, file) in &args.collections {
        let text = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let items = parse_items_from_json(&text)
            .with_context(|| format!("Invalid JSON in {}", file.display()))?;
        println!("  {name}: {} items", format_count(items.len()));
        writer = writer.collection(name.as_str(), items);
    }
    writer.write_to(&args.out).with_context(|| format!("Failed to write {}", args.out.display()))?;
    println!("Wrote {}", args.out.display());
    Ok(())
}

fn cmd_info(args: InfoArgs) -> Result<()> {
    let size = fs::metadata(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?
        .len();
    let probe = FileStore::probe(&args.file)?;
    println!("File: {} ({})", args.file.display(), format_file_size(size));
    let kind = match probe {
        StoreProbe::NotAStore => "not a store",
        StoreProbe::Locked => "store (password protected)",
        StoreProbe::Open => "store",
    };
    println!("Type: {kind}");

    let openable = match probe {
        StoreProbe::Open => true,
        StoreProbe::Locked => args.password.is_some(),
        StoreProbe::NotAStore => false,
    };
    if !openable {
        return Ok(());
    }
    let store = FileStore::open(&args.file, args.password.as_deref())?;
    println!("Collections:");
    for info in store.collections() {
        println!("  {} ({} items)", info.name, info.count);
    }
    Ok(())
}

fn cmd_settings(args: SettingsArgs, config: ConfigManager) -> Result<()> {
    let mut settings = config.load_settings()?;
    if let Some(pattern) = &args.date_format {
        if let Err(err) = settings.rendering.set_date_format(pattern) {
            bail!(err);
        }
    }
    if let Some(zone) = args.time_zone {
        settings.rendering.time_zone = zone;
    }
    if args.date_format.is_some() || args.time_zone.is_some() {
        config.save_settings(&settings)?;
        println!("Saved {}", config.config_dir().join("settings.json").display());
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
