use anyhow::{bail, Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use homehub::config::{
    default_data_dir, ensure_dir, save_json, HubConfig, CONFIG_FILE, LOG_FILE, STORAGE_FILE,
};
use homehub::core::auth::{AUTH_TOKEN_KEY, USER_KEY};
use homehub::core::background::BACKGROUND_KEY;
use homehub::{AppState, FileStore, KeyValueStore, SharedStore, TileAction};

mod appstore;
mod auth;
mod launcher;
mod settings;
mod status;
mod ui;

use launcher::{home_screen, HomeEvent};
use ui::Term;

// ── Command line ──────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
struct Args {
    data_dir: PathBuf,
    reset: bool,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut data_dir = None;
    let mut reset = false;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--data-dir" => match it.next() {
                Some(dir) => data_dir = Some(PathBuf::from(dir)),
                None => bail!("--data-dir needs a path"),
            },
            "--reset" => reset = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(Args {
        data_dir: data_dir.unwrap_or_else(default_data_dir),
        reset,
    })
}

// ── Logging ───────────────────────────────────────────────────────────────────

fn init_logging(data_dir: &Path, fallback_filter: &str) -> Result<()> {
    let path = data_dir.join(LOG_FILE);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing logger: {e}"))
}

fn reset_store(store: &SharedStore) {
    for key in [USER_KEY, AUTH_TOKEN_KEY, BACKGROUND_KEY] {
        if let Err(err) = store.remove(key) {
            warn!(key, %err, "could not clear stored value");
        }
    }
    info!("stored session and background cleared");
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn init_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(ratatui::Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

// ── Main application loop ─────────────────────────────────────────────────────

fn run(terminal: &mut Term, app: &mut AppState) -> Result<()> {
    let mut selected = 0usize;
    loop {
        match home_screen(terminal, app, &mut selected)? {
            HomeEvent::Open(TileAction::OpenAppStore) => appstore::app_store_screen(terminal, app)?,
            HomeEvent::Open(TileAction::OpenSettings) => settings::settings_screen(terminal, app)?,
            HomeEvent::Quit => break,
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv)?;

    ensure_dir(&args.data_dir)?;
    let config = HubConfig::load(&args.data_dir);
    init_logging(&args.data_dir, &config.log_filter)?;
    info!(data_dir = %args.data_dir.display(), "starting");

    let config_path = args.data_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        if let Err(err) = save_json(&config_path, &config) {
            warn!(error = %err, "could not write default config");
        }
    }

    let store_path = args.data_dir.join(STORAGE_FILE);
    let store = FileStore::open(&store_path, config.storage_quota_bytes).shared();
    if args.reset {
        reset_store(&store);
    }
    let mut app = AppState::from_config(config, store);

    let mut terminal = init_terminal()?;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        run(&mut terminal, &mut app)
    }));

    // Always restore terminal
    restore_terminal(&mut terminal).ok();

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!(error = %e, "exited with error");
            Err(e)
        }
        Err(_) => {
            error!("ui thread panicked");
            eprintln!("homehub crashed. See {}", args.data_dir.join(LOG_FILE).display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_data_dir_and_reset() {
        let args = parse_args(&argv(&["--reset", "--data-dir", "/tmp/hub"])).unwrap();
        assert_eq!(
            args,
            Args {
                data_dir: PathBuf::from("/tmp/hub"),
                reset: true
            }
        );
    }

    #[test]
    fn defaults_without_flags() {
        let args = parse_args(&[]).unwrap();
        assert!(!args.reset);
        assert_eq!(args.data_dir, default_data_dir());
    }

    #[test]
    fn rejects_missing_path_and_unknown_flags() {
        assert!(parse_args(&argv(&["--data-dir"])).is_err());
        assert!(parse_args(&argv(&["--verbose"])).is_err());
    }
}
