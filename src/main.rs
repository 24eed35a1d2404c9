//! gpdict - StarDict dictionary with a dictionary downloader
//!
//! Without a command line action the GTK application starts. The actions
//! (`--list-urls`, `--install`, `--list-dicts`, `--lookup`) run headless
//! against the same configuration and exit.

use clap::Parser;
use gpdict_config::{Config, ConfigManager};
use gpdict_core::{
    discover_dictionaries, load_catalog, CatalogTable, ChoiceSource, DialogHost, DownloadDialog,
    DownloadProgress, Installer, LookupView, TableSource,
};
use std::cell::Cell;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// gpdict - StarDict dictionary
#[derive(Parser, Debug)]
#[command(name = "gpdict")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Catalog file tried before the configured ones
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,

    /// Print the dictionary download catalog and exit
    #[arg(long)]
    list_urls: bool,

    /// Download and install catalog row ROW and exit
    #[arg(long, value_name = "ROW")]
    install: Option<usize>,

    /// Print installed dictionaries and exit
    #[arg(long)]
    list_dicts: bool,

    /// Dictionary to use, by name
    #[arg(short = 'd', long = "dict", value_name = "NAME")]
    dictionary: Option<String>,

    /// Print the entries for WORD and exit
    #[arg(long, value_name = "WORD")]
    lookup: Option<String>,
}

impl Args {
    fn is_headless(&self) -> bool {
        self.list_urls || self.install.is_some() || self.list_dicts || self.lookup.is_some()
    }
}

/// Reports dialog events on the terminal
#[derive(Default)]
struct ConsoleHost {
    reloads: Cell<usize>,
}

impl DialogHost for ConsoleHost {
    fn show_warning(&self, title: &str, message: &str) {
        eprintln!("{}: {}", title, message);
    }

    fn show_error(&self, title: &str, message: &str) {
        eprintln!("{}: {}", title, message);
    }

    fn reload_dictionaries(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("gpdict={}", log_level)),
        ))
        .init();

    tracing::info!("Starting gpdict v{}", env!("CARGO_PKG_VERSION"));

    gpdict_core::init()?;

    if args.is_headless() {
        let ok = run_headless(&args)?;
        std::process::exit(if ok { 0 } else { 1 });
    }

    let exit_code = gpdict_ui::run(gpdict_ui::StartupOptions {
        config_path: args.config,
        catalog: args.catalog,
        dictionary: args.dictionary,
    });

    std::process::exit(exit_code.into());
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let manager = match &args.config {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    Ok(manager.config())
}

fn catalog_sources(args: &Args, config: &Config) -> Vec<PathBuf> {
    let mut sources = config.catalog.sources();
    if let Some(catalog) = &args.catalog {
        sources.insert(0, catalog.clone());
    }
    sources
}

/// Run the command line action; `Ok(false)` means it failed and was reported
fn run_headless(args: &Args) -> anyhow::Result<bool> {
    let config = load_config(args)?;

    if args.list_urls {
        return Ok(list_urls(args, &config));
    }
    if let Some(row) = args.install {
        return install(args, &config, row);
    }
    if args.list_dicts {
        list_dicts(args, &config);
        return Ok(true);
    }
    if let Some(word) = &args.lookup {
        return lookup(args, &config, word);
    }
    Ok(true)
}

fn build_installer(config: &Config) -> anyhow::Result<Installer> {
    let installer = Installer::http(
        config.dictionaries.install_path(),
        &config.download.user_agent,
        config.download.timeout(),
    )?;
    Ok(installer.with_strip_components(config.download.strip_components))
}

fn list_urls(args: &Args, config: &Config) -> bool {
    match load_catalog(&catalog_sources(args, config)) {
        Ok(catalog) => {
            print!("{}", format_table(&CatalogTable::new(&catalog)));
            true
        }
        Err(e) => {
            tracing::debug!("Catalog unavailable: {}", e);
            eprintln!("Warning: {}", e.user_message());
            false
        }
    }
}

fn install(args: &Args, config: &Config, row: usize) -> anyhow::Result<bool> {
    let host = ConsoleHost::default();
    let installer = build_installer(config)?;
    let mut dialog = DownloadDialog::new(catalog_sources(args, config), installer);

    if !dialog.open(&host) {
        return Ok(false);
    }
    if !dialog.select(row) {
        let rows = dialog.catalog().map(|c| c.len()).unwrap_or(0);
        eprintln!("No catalog row {} ({} rows available)", row, rows);
        return Ok(false);
    }

    if let Some(entry) = dialog.selected_entry() {
        eprintln!(
            "Installing {} into {}",
            entry.url,
            dialog.installer().install_dir().display()
        );
    }

    let mut last_percent = None;
    let mut on_progress = |p: DownloadProgress| {
        let percent = p.fraction().map(|f| (f * 100.0) as u32);
        if percent != last_percent {
            last_percent = percent;
            match percent {
                Some(percent) => eprint!("\rDownloading... {:3}%", percent),
                None => eprint!("\rDownloading... {} bytes", p.downloaded),
            }
            let _ = std::io::stderr().flush();
        }
    };

    let result = dialog.trigger_download(&host, &mut on_progress);
    eprintln!();

    match result {
        Ok(()) => {
            let found = discover_dictionaries(&config.dictionaries.scan_dirs());
            println!("Installed, {} dictionaries available", found.len());
            Ok(true)
        }
        Err(gpdict_core::CoreError::Download(msg)) => {
            eprintln!("Download failed: {}", msg);
            Ok(false)
        }
        // Already reported through the host
        Err(_) => Ok(false),
    }
}

fn list_dicts(args: &Args, config: &Config) {
    let selected = args
        .dictionary
        .as_deref()
        .or(config.dictionaries.last_used.as_deref());

    for info in discover_dictionaries(&config.dictionaries.scan_dirs()) {
        let mark = if Some(info.name.as_str()) == selected { '*' } else { ' ' };
        let words = info
            .word_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("{} {}\t{} words\t{}", mark, info.name, words, info.ifo_path.display());
    }
}

fn lookup(args: &Args, config: &Config, word: &str) -> anyhow::Result<bool> {
    let preferred = args
        .dictionary
        .as_deref()
        .or(config.dictionaries.last_used.as_deref());

    let mut view = LookupView::with_stardict();
    view.set_dictionaries(discover_dictionaries(&config.dictionaries.scan_dirs()), preferred)?;

    if let Some(name) = &args.dictionary {
        if view.dictionary().map(|d| d.name.as_str()) != Some(name.as_str()) {
            eprintln!("Dictionary '{}' not found", name);
            return Ok(false);
        }
    }
    if !view.accepts_input() {
        eprintln!("No dictionary installed, see --list-urls and --install");
        return Ok(false);
    }
    if let Some(idx) = view.selected() {
        tracing::debug!("Using dictionary '{}'", view.label(idx).unwrap_or_default());
    }

    view.lookup(word)?;
    if view.hits().is_empty() {
        eprintln!("'{}' not found", word);
        return Ok(false);
    }

    for idx in 0..view.hits().len() {
        view.show_hit(idx);
        if idx > 0 {
            println!();
        }
        println!("{}", view.displayed_word().unwrap_or_default());
        println!("{}", view.displayed_text().unwrap_or_default());
    }
    Ok(true)
}

/// Render a table with padded columns and a row index
fn format_table(table: &impl TableSource) -> String {
    let columns = table.columns();
    let mut widths: Vec<usize> = columns.iter().map(|c| c.title.len()).collect();
    for row in 0..table.row_count() {
        for (col, width) in widths.iter_mut().enumerate() {
            let len = table.cell(row, col).map(str::len).unwrap_or(0);
            *width = (*width).max(len);
        }
    }
    let index_width = table.row_count().saturating_sub(1).to_string().len().max(1);

    let mut out = String::new();
    let titles: Vec<&str> = columns.iter().map(|c| c.title).collect();
    push_line(&mut out, &" ".repeat(index_width), &titles, &widths);
    for row in 0..table.row_count() {
        let cells: Vec<&str> = (0..columns.len())
            .map(|col| table.cell(row, col).unwrap_or(""))
            .collect();
        let index = format!("{:>width$}", row, width = index_width);
        push_line(&mut out, &index, &cells, &widths);
    }
    out
}

fn push_line(out: &mut String, index: &str, cells: &[&str], widths: &[usize]) {
    out.push_str(index);
    for (cell, width) in cells.iter().zip(widths) {
        out.push_str("  ");
        out.push_str(&format!("{:<width$}", cell, width = width));
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
}
