pub mod detail;
pub mod list;
pub mod styles;

use ratatui::text::Text;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, Cmd, Msg, Transition};
use crate::ui::styles::Theme;

/// One entry on the navigation stack: its own state, input handling, and
/// render output.
pub trait Screen {
    /// Startup command for the screen, dispatched when it enters the stack.
    fn init(&mut self) -> Option<Cmd> {
        None
    }

    fn update(&mut self, msg: Msg) -> (Transition, Option<Cmd>);

    fn view(&self) -> Text<'static>;

    /// Restyle after a theme change. Screens without themed content ignore it.
    fn set_theme(&mut self, _theme: &Theme) {}
}

/// Compose the active screen's view into the terminal frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let paragraph = Paragraph::new(app.view()).style(app.theme().app);
    frame.render_widget(paragraph, frame.area());
}
