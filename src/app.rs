use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::text::Text;
use std::sync::mpsc::Sender;

use crate::scanner::ScanOutcome;
use crate::settings::AppConfig;
use crate::ui::list::ProjectListScreen;
use crate::ui::styles::{palette, Theme};
use crate::ui::Screen;

/// Message delivered into the update loop. Terminal events and command
/// results arrive through the same channel, FIFO per source.
pub enum Msg {
    Key(KeyEvent),
    Resize(u16, u16),
    DarknessDetected(bool),
    ScanComplete(Result<ScanOutcome, String>),
}

/// A deferred computation run on a background thread; the message it
/// returns re-enters the loop.
pub type Cmd = Box<dyn FnOnce() -> Msg + Send + 'static>;

/// Navigation requested by a screen's update.
pub enum Transition {
    None,
    Push(Box<dyn Screen>),
    Pop,
    Replace(Box<dyn Screen>),
    Quit,
}

/// The router: owns the screen stack, terminal dimensions, theme state,
/// and the quit flag. All UI state lives on the loop thread; background
/// work only ever comes back as a `Msg`.
pub struct App {
    screens: Vec<Box<dyn Screen>>,
    width: u16,
    height: u16,
    is_dark: bool,
    theme: Theme,
    theme_name: String,
    quitting: bool,
    tx: Sender<Msg>,
}

impl App {
    pub fn new(config: &AppConfig, tx: Sender<Msg>) -> Self {
        let theme = Theme::new(&palette(&config.theme_name, config.theme_dark));
        let root = ProjectListScreen::new(config, theme);
        App {
            screens: vec![Box::new(root)],
            width: 0,
            height: 0,
            is_dark: config.theme_dark,
            theme,
            theme_name: config.theme_name.clone(),
            quitting: false,
            tx,
        }
    }

    /// Kick off startup work: the one-shot terminal darkness query and the
    /// root screen's initial scan.
    pub fn start(&mut self) {
        let fallback = self.is_dark;
        self.dispatch(Box::new(move || Msg::DarknessDetected(detect_dark(fallback))));
        if let Some(cmd) = self.screens[0].init() {
            self.dispatch(cmd);
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quitting
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn handle_msg(&mut self, msg: Msg) {
        match msg {
            Msg::Key(key) if is_interrupt(&key) => {
                tracing::debug!("interrupt key pressed");
                self.quitting = true;
            }
            Msg::Resize(w, h) => {
                self.width = w;
                self.height = h;
                self.forward(Msg::Resize(w, h));
            }
            Msg::DarknessDetected(dark) => {
                self.is_dark = dark;
                self.theme = Theme::new(&palette(&self.theme_name, dark));
                // Screens below the top restyle too: popping re-exposes them.
                for screen in &mut self.screens {
                    screen.set_theme(&self.theme);
                }
            }
            other => self.forward(other),
        }
    }

    fn forward(&mut self, msg: Msg) {
        let Some(top) = self.screens.last_mut() else {
            return;
        };
        let (transition, cmd) = top.update(msg);
        if let Some(cmd) = cmd {
            self.dispatch(cmd);
        }
        self.apply(transition);
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::None => {}
            Transition::Push(screen) => self.push(screen),
            Transition::Replace(screen) => {
                self.screens.pop();
                self.push(screen);
            }
            Transition::Pop => {
                if self.screens.len() > 1 {
                    self.screens.pop();
                    // The newly exposed screen relayouts at the current size.
                    if let Some(top) = self.screens.last_mut() {
                        let (_, cmd) = top.update(Msg::Resize(self.width, self.height));
                        if let Some(cmd) = cmd {
                            self.dispatch(cmd);
                        }
                    }
                }
            }
            Transition::Quit => self.quitting = true,
        }
    }

    fn push(&mut self, mut screen: Box<dyn Screen>) {
        if let Some(cmd) = screen.init() {
            self.dispatch(cmd);
        }
        screen.set_theme(&self.theme);
        let (_, cmd) = screen.update(Msg::Resize(self.width, self.height));
        if let Some(cmd) = cmd {
            self.dispatch(cmd);
        }
        self.screens.push(screen);
    }

    /// Execute a command on a background thread. Results arriving after
    /// shutdown are dropped with the closed receiver.
    fn dispatch(&self, cmd: Cmd) {
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(cmd());
        });
    }

    /// The composed view: the active screen's text, or nothing while
    /// shutting down.
    pub fn view(&self) -> Text<'static> {
        if self.quitting {
            return Text::default();
        }
        match self.screens.last() {
            Some(top) => top.view(),
            None => Text::default(),
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// One-shot background query for terminal darkness. Terminals following
/// the COLORFGBG convention export "fg;bg" ANSI indices; a low background
/// index means a dark background. Terminals that don't expose it keep the
/// configured fallback.
pub fn detect_dark(fallback: bool) -> bool {
    match std::env::var("COLORFGBG") {
        Ok(value) => parse_colorfgbg(&value).unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn parse_colorfgbg(value: &str) -> Option<bool> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    Some(bg < 7 || bg == 8)
}
