mod app;
mod git;
mod logging;
mod project;
mod scanner;
mod settings;
mod ui;

use anyhow::Result;
use app::{App, Msg};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::AppConfig;
use std::io;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "repo-board",
    about = "Git status dashboard for your projects directory"
)]
struct Cli {
    /// Projects root to scan (overrides config)
    #[arg(short, long)]
    root: Option<String>,

    /// Max concurrent git probes
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-repository git timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Write debug logs to repo-board.log
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = settings::Settings::load();

    // CLI args override config; an invalid projects root aborts here.
    let config = AppConfig::resolve(cfg, cli.root, cli.concurrency, cli.timeout)?;
    logging::init(cli.debug)?;
    tracing::info!(root = %config.projects_root.display(), "starting repo-board");

    let mut terminal = setup_terminal(&config)?;

    // Command results flow back into the loop through this channel.
    let (tx, rx) = mpsc::channel();
    let mut app = App::new(&config, tx);
    app.start();

    // Seed the initial window size; resize events only cover later changes.
    let size = terminal.size()?;
    app.handle_msg(Msg::Resize(size.width, size.height));

    let result = run_app(&mut terminal, &mut app, &rx);

    restore_terminal(&mut terminal, &config)?;
    tracing::info!("repo-board exited");
    result
}

fn setup_terminal(config: &AppConfig) -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if config.alt_screen {
        execute!(stdout, EnterAlternateScreen)?;
    }
    if config.mouse_enabled {
        execute!(stdout, EnableMouseCapture)?;
    }
    execute!(stdout, SetTitle(&config.window_title))?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &AppConfig,
) -> Result<()> {
    disable_raw_mode()?;
    if config.mouse_enabled {
        execute!(terminal.backend_mut(), DisableMouseCapture)?;
    }
    if config.alt_screen {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mpsc::Receiver<Msg>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll for terminal events with a short timeout so background
        // command results stay fresh.
        if event::poll(Duration::from_millis(100))? {
            match event::read()? {
                Event::Key(key)
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                {
                    app.handle_msg(Msg::Key(key));
                }
                Event::Resize(w, h) => app.handle_msg(Msg::Resize(w, h)),
                _ => {}
            }
        }

        // Drain command results delivered since the last tick.
        while let Ok(msg) = rx.try_recv() {
            app.handle_msg(msg);
        }

        if app.should_quit() {
            return Ok(());
        }
    }
}
