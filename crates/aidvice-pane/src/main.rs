mod state;
mod theme;
mod ui;
mod workspace;

use aidvice_core::{JsonFileStore, ProviderKind, DEFAULT_QUIET_INTERVAL};
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        mpsc::{self, Receiver},
        Arc, Mutex,
    },
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "aidvice-pane", author, version, about = "Writing advice beside your notes")]
struct Args {
    /// Notes file or directory to watch for edits
    #[arg(default_value = ".")]
    notes: PathBuf,

    /// Plugin data file (settings)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Quiet period after the last edit before advice refreshes, in milliseconds
    #[arg(long, default_value_t = DEFAULT_QUIET_INTERVAL.as_millis() as u64)]
    quiet_ms: u64,

    /// Advice source: scope or random
    #[arg(long, default_value_t = ProviderKind::Scope)]
    provider: ProviderKind,

    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Directory for aidvice-pane.log
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log = init_logging(&args);

    let notes = args
        .notes
        .canonicalize()
        .with_context(|| format!("Notes path {} does not exist", args.notes.display()))?;
    let data_path = match &args.data {
        Some(path) => path.clone(),
        None => default_data_path()?,
    };
    info!(
        event = "startup",
        notes = %notes.display(),
        data = %data_path.display(),
        provider = %args.provider,
        quiet_ms = args.quiet_ms
    );

    let mut app = state::App::new(
        notes.clone(),
        JsonFileStore::new(&data_path),
        args.provider.build(),
        Duration::from_millis(args.quiet_ms),
    );

    let mut own_files = own_write_paths(&data_path);
    if let Some(guard) = &log {
        own_files.push(resolve_path(&guard.path));
    }
    let (watcher, watch_rx) = setup_watcher(&notes, own_files);
    let mut terminal = setup_terminal()?;
    let cols = terminal.size().map(|size| size.width).unwrap_or(0);
    app.on_layout_ready(cols);
    let result = run_app(&mut terminal, &mut app, watch_rx);
    app.shutdown();
    restore_terminal(&mut terminal)?;
    drop(watcher);

    if let Err(err) = result {
        eprintln!("aidvice-pane: {err}");
    }

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app<S: aidvice_core::PersistenceStore>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut state::App<S>,
    watch_rx: Option<Receiver<()>>,
) -> Result<()> {
    let input_poll = Duration::from_millis(250);

    loop {
        if app.take_dirty() {
            terminal.draw(|f| ui::render(f, app))?;
        }

        if event::poll(app.next_wakeup(input_poll))? {
            match event::read()? {
                Event::Key(key) => {
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                        app.handle_key(key);
                    }
                }
                Event::Mouse(mouse) => {
                    app.handle_mouse(mouse);
                }
                Event::Resize(cols, _) => {
                    app.on_resize(cols);
                }
                _ => {}
            }
        }

        if let Some(rx) = &watch_rx {
            let mut changed = false;
            while rx.try_recv().is_ok() {
                changed = true;
            }
            if changed {
                app.on_notes_changed();
            }
        }

        app.on_tick();

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn setup_watcher(
    notes: &Path,
    own_files: Vec<PathBuf>,
) -> (Option<RecommendedWatcher>, Option<Receiver<()>>) {
    let (tx, rx) = mpsc::sync_channel(1);
    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) if is_edit(&event.kind) && !only_own_files(&event.paths, &own_files) => {
                let _ = tx.try_send(());
            }
            Ok(_) => {}
            Err(err) => warn!(event = "watch_error", error = %err),
        },
        Config::default(),
    ) {
        Ok(watcher) => watcher,
        Err(err) => {
            warn!(event = "watcher_unavailable", error = %err);
            return (None, None);
        }
    };

    let mode = if notes.is_dir() {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    if let Err(err) = watcher.watch(notes, mode) {
        warn!(event = "watch_failed", path = %notes.display(), error = %err);
        return (None, None);
    }

    (Some(watcher), Some(rx))
}

fn is_edit(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Our own writes (settings saves, the log) must not count as edits to the notes.
fn only_own_files(paths: &[PathBuf], own_files: &[PathBuf]) -> bool {
    !paths.is_empty() && paths.iter().all(|path| own_files.contains(path))
}

/// The data file plus the temp file its atomic save goes through.
fn own_write_paths(data_path: &Path) -> Vec<PathBuf> {
    let data = resolve_path(data_path);
    let temp = match data.file_name() {
        Some(name) => data.with_file_name(format!("{}.tmp", name.to_string_lossy())),
        None => data.with_extension("tmp"),
    };
    vec![data, temp]
}

/// Absolute form of `path` as the watcher reports it, even if the file does not exist yet.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|parent| parent.join(name))
            .unwrap_or(absolute.clone()),
        _ => absolute,
    }
}

fn default_data_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not resolve a config directory")?;
    Ok(base.join("aidvice").join("data.json"))
}

fn default_log_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join("aidvice"))
}

/// Keeps the log file open for the life of the process and flushes it on exit.
struct LogGuard {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}

struct LogWriter {
    file: Arc<Mutex<File>>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.lock() {
            Ok(mut file) => file.write(buf),
            Err(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.lock() {
            Ok(mut file) => file.flush(),
            Err(_) => Ok(()),
        }
    }
}

/// The terminal owns stdout, so logs only ever go to a file.
fn init_logging(args: &Args) -> Option<LogGuard> {
    let level = if args.debug {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("AIDVICE_LOG_LEVEL") {
        level
    } else {
        "info".to_string()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let dir = args.log_dir.clone().or_else(default_log_dir)?;
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("log_dir_error: {err}");
        return None;
    }
    let path = dir.join("aidvice-pane.log");
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Arc::new(Mutex::new(file)),
        Err(err) => {
            eprintln!("log_file_error: {err}");
            return None;
        }
    };

    let writer_file = Arc::clone(&file);
    let make_writer = BoxMakeWriter::new(move || LogWriter {
        file: Arc::clone(&writer_file),
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(make_writer)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return None;
    }
    Some(LogGuard { file, path })
}
