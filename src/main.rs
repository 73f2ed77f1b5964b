mod storage;
mod store;
mod task;
mod ui;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use clap::{Arg, Command};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use crate::storage::Storage;
use crate::store::TaskStore;
use crate::ui::App;

fn main() -> anyhow::Result<()> {
    let matches = Command::new("tudu")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Single-screen todo list for the terminal")
        .arg(
            Arg::new("file")
                .long("file")
                .value_name("PATH")
                .help("Where the task list is stored"),
        )
        .get_matches();

    let path = matches
        .get_one::<String>("file")
        .map(PathBuf::from)
        .unwrap_or_else(Storage::default_path);
    let storage = Storage::new(path);

    init_tracing(&storage)?;

    // One load before the first frame; every later mutation writes back.
    let mut app = App::new(TaskStore::with_tasks(storage.load()), storage);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result.context("terminal event loop failed")?;
    Ok(())
}

/// Logs go to a file next to the data file; the terminal belongs to the UI.
fn init_tracing(storage: &Storage) -> anyhow::Result<()> {
    let dir = storage
        .path()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data directory {}", dir.display()))?;

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("tudu.log"))
        .context("could not open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
