// src/main.rs
mod app;
mod catalog;
mod config;
mod filter;
mod input;
mod logging;
mod models;
mod network;
mod selection;
mod theme;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::runtime::Runtime;
use tracing::{error, info};

use crate::app::App;
use crate::config::{Overrides, Settings, get_user_config_path, write_starter_config};
use crate::network::{ApiClient, Backend, CatalogSource};
use crate::theme::Theme;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the checks API, e.g. http://localhost:4000
    #[arg(long)]
    api_url: Option<String>,

    /// JSON catalog file used when no API is configured
    #[arg(long)]
    catalog_file: Option<String>,

    /// Extra configuration file merged over the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a starter config to the user config directory and exit
    #[arg(long)]
    init_config: bool,

    /// Log filter, e.g. "debug" or "checkcat=trace"
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.init_config {
        let path = get_user_config_path();
        write_starter_config(&path)?;
        println!("Wrote starter config to {}", path.display());
        return Ok(());
    }

    let settings = Settings::new(Overrides {
        api_url: args.api_url,
        catalog_file: args.catalog_file,
        log_level: args.log_level,
        extra_file: args.config,
    })
    .context("failed to load configuration")?;

    if let Err(e) = logging::init(&settings.log_level) {
        eprintln!("logging disabled: {e}");
    }

    let source = catalog_source(&settings)?;
    info!(remote = matches!(source, CatalogSource::Remote(_)), targets = settings.targets.len(), "starting checkcat");

    let rt = Runtime::new()?;
    let backend = Backend::new(source, rt.handle().clone());
    let mut app = App::new(backend, settings.targets);

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!(error = %e, "checkcat exited with an error");
    }
    result
}

fn catalog_source(settings: &Settings) -> anyhow::Result<CatalogSource> {
    if let Some(url) = &settings.api_url {
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let api = ApiClient::new(url, settings.api_token.clone(), timeout)?;
        return Ok(CatalogSource::Remote(api));
    }
    match settings.catalog_path() {
        Some(path) => Ok(CatalogSource::Local(path)),
        None => anyhow::bail!(
            "no catalog source configured: set api_url or catalog_file (see `checkcat --init-config`)"
        ),
    }
}

fn run<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let theme = Theme::default();
    loop {
        let catalog = app.catalog();
        app.sync(&catalog);
        terminal.draw(|f| ui::render(f, app, &catalog, &theme))?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind != KeyEventKind::Press {
                    continue;
                }
                if !input::handle_key(app, key_event.code)? {
                    break;
                }
            }
        }
    }
    Ok(())
}
