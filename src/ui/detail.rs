use crossterm::event::{KeyCode, KeyEvent};
use ratatui::text::{Line, Span, Text};

use crate::app::{Cmd, Msg, Transition};
use crate::project::Project;
use crate::ui::styles::Theme;
use crate::ui::Screen;

/// Detail screen for a single project, captured at push time.
pub struct ProjectDetailScreen {
    project: Project,
    theme: Theme,
    width: u16,
    height: u16,
    ready: bool,
    show_help: bool,
}

impl ProjectDetailScreen {
    pub fn new(project: Project, theme: Theme) -> Self {
        ProjectDetailScreen {
            project,
            theme,
            width: 0,
            height: 0,
            ready: false,
            show_help: false,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> (Transition, Option<Cmd>) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return (Transition::Pop, None),
            KeyCode::Char('?') => self.show_help = !self.show_help,
            _ => {}
        }
        (Transition::None, None)
    }
}

impl Screen for ProjectDetailScreen {
    fn update(&mut self, msg: Msg) -> (Transition, Option<Cmd>) {
        match msg {
            Msg::Resize(w, h) => {
                self.width = w;
                self.height = h;
                self.ready = w > 0 && h > 0;
            }
            Msg::Key(key) => return self.handle_key(&key),
            _ => {}
        }
        (Transition::None, None)
    }

    fn view(&self) -> Text<'static> {
        if !self.ready || self.width == 0 || self.height == 0 {
            return Text::raw("Loading...");
        }

        let g = &self.project.git;
        let mut lines: Vec<Line<'static>> = Vec::new();

        lines.push(Line::from(Span::styled(
            self.project.name.clone(),
            self.theme.title,
        )));
        lines.push(Line::default());
        lines.push(Line::from(vec![
            Span::styled("Path: ".to_string(), self.theme.subtle),
            Span::raw(self.project.path.display().to_string()),
        ]));

        if let Some(language) = &self.project.language {
            lines.push(Line::from(vec![
                Span::styled("Language: ".to_string(), self.theme.subtle),
                Span::raw(language.clone()),
            ]));
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Git Status:".to_string(),
            self.theme.status,
        )));
        lines.push(Line::from(format!("  Branch: {}", g.branch)));

        if g.remote.is_empty() {
            lines.push(Line::from("  Remote: (none)"));
        } else {
            lines.push(Line::from(format!("  Remote: {}", g.remote)));
        }

        if g.uncommitted > 0 {
            lines.push(Line::from(format!(
                "  Uncommitted: {} file(s)",
                g.uncommitted
            )));
        }
        if g.unpushed > 0 {
            lines.push(Line::from(format!("  Unpushed: {} commit(s)", g.unpushed)));
        }
        if g.unpulled > 0 {
            lines.push(Line::from(format!("  Unpulled: {} commit(s)", g.unpulled)));
        }

        if !g.last_commit_msg.is_empty() {
            lines.push(Line::from(format!(
                "  Last commit: \"{}\"",
                g.last_commit_msg
            )));
            if !g.last_commit_author.is_empty() {
                lines.push(Line::from(format!("  Author: {}", g.last_commit_author)));
            }
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "esc/q back · ? help".to_string(),
            self.theme.subtle,
        )));
        if self.show_help {
            lines.push(Line::from(Span::styled(
                "ctrl+c quit".to_string(),
                self.theme.subtle,
            )));
        }

        Text::from(lines)
    }

    fn set_theme(&mut self, theme: &Theme) {
        self.theme = *theme;
    }
}
