use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::text::{Line, Span, Text};
use std::sync::Arc;

use crate::app::{Cmd, Msg, Transition};
use crate::project::{Project, StatusKind};
use crate::scanner::Scanner;
use crate::settings::AppConfig;
use crate::ui::detail::ProjectDetailScreen;
use crate::ui::styles::Theme;
use crate::ui::Screen;

/// Root screen: the filterable project list.
pub struct ProjectListScreen {
    scanner: Arc<Scanner>,
    app_name: String,
    theme: Theme,
    width: u16,
    height: u16,
    ready: bool,
    projects: Vec<Project>,
    selected: usize,
    scanning: bool,
    probe_failures: usize,
    filter_text: String,
    filtering: bool,
    show_help: bool,
}

impl ProjectListScreen {
    pub fn new(config: &AppConfig, theme: Theme) -> Self {
        let scanner = Arc::new(Scanner::new(
            config.projects_root.clone(),
            config.scan_concurrency,
            config.probe_timeout,
        ));
        ProjectListScreen {
            scanner,
            app_name: config.app_name.clone(),
            theme,
            width: 0,
            height: 0,
            ready: false,
            projects: Vec::new(),
            selected: 0,
            scanning: false,
            probe_failures: 0,
            filter_text: String::new(),
            filtering: false,
            show_help: false,
        }
    }

    fn scan_cmd(&self) -> Cmd {
        let scanner = Arc::clone(&self.scanner);
        Box::new(move || Msg::ScanComplete(scanner.scan().map_err(|e| format!("{e:#}"))))
    }

    fn filtered(&self) -> Vec<&Project> {
        if self.filter_text.is_empty() {
            return self.projects.iter().collect();
        }
        let needle = self.filter_text.to_lowercase();
        self.projects
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    fn handle_filter_key(&mut self, key: &KeyEvent) -> (Transition, Option<Cmd>) {
        match key.code {
            KeyCode::Esc => {
                self.filtering = false;
                self.filter_text.clear();
            }
            KeyCode::Enter => self.filtering = false,
            KeyCode::Backspace => {
                self.filter_text.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filter_text.push(c);
            }
            _ => {}
        }
        self.clamp_selection();
        (Transition::None, None)
    }

    fn handle_normal_key(&mut self, key: &KeyEvent) -> (Transition, Option<Cmd>) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let len = self.filtered().len();
                if len > 0 && self.selected < len - 1 {
                    self.selected += 1;
                }
            }
            KeyCode::Char('r') => {
                // Re-entry while a scan is in flight is a strict no-op.
                if !self.scanning {
                    self.scanning = true;
                    return (Transition::None, Some(self.scan_cmd()));
                }
            }
            KeyCode::Char('/') => {
                self.filtering = true;
                self.filter_text.clear();
                self.clamp_selection();
            }
            KeyCode::Enter => {
                if let Some(project) = self.filtered().get(self.selected) {
                    let detail = ProjectDetailScreen::new((*project).clone(), self.theme);
                    return (Transition::Push(Box::new(detail)), None);
                }
            }
            KeyCode::Esc => return (Transition::Pop, None),
            KeyCode::Char('?') => self.show_help = !self.show_help,
            _ => {}
        }
        (Transition::None, None)
    }

    fn render_row(&self, project: &Project, selected: bool) -> Line<'static> {
        let g = &project.git;
        let mut spans: Vec<Span<'static>> = Vec::new();

        if selected {
            spans.push(Span::styled("▸", self.theme.status));
        } else {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::raw(" "));
        spans.push(Span::raw(project.name.clone()));

        if !g.branch.is_empty() {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("[{}]", g.branch), self.theme.subtle));
        }

        let (glyph, style) = match g.status {
            StatusKind::Clean => ("✓", self.theme.success),
            StatusKind::Dirty => ("●", self.theme.warning),
            StatusKind::Ahead => ("↑", self.theme.status),
            StatusKind::Behind => ("↓", self.theme.status),
            StatusKind::Diverged => ("⚠", self.theme.error),
            StatusKind::NoRemote => ("○", self.theme.subtle),
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(glyph, style));

        if g.uncommitted > 0 {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!("±{}", g.uncommitted),
                self.theme.warning,
            ));
        }
        if g.unpushed > 0 {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("↑{}", g.unpushed), self.theme.status));
        }
        if g.unpulled > 0 {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("↓{}", g.unpulled), self.theme.status));
        }

        if !g.last_commit_msg.is_empty() {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!("\"{}\"", truncate_subject(&g.last_commit_msg)),
                self.theme.subtle,
            ));
        }

        if let Some(t) = g.last_commit_time {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format_time_ago(t), self.theme.subtle));
        }

        Line::from(spans)
    }

    fn help_lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![Line::from(Span::styled(
            "r refresh · / filter · enter details · ? help · ctrl+c quit".to_string(),
            self.theme.subtle,
        ))];
        if self.show_help {
            lines.push(Line::from(Span::styled(
                "↑/k up · ↓/j down · esc back / clear filter".to_string(),
                self.theme.subtle,
            )));
        }
        lines
    }
}

impl Screen for ProjectListScreen {
    fn init(&mut self) -> Option<Cmd> {
        self.scanning = true;
        Some(self.scan_cmd())
    }

    fn update(&mut self, msg: Msg) -> (Transition, Option<Cmd>) {
        match msg {
            Msg::Resize(w, h) => {
                self.width = w;
                self.height = h;
                self.ready = w > 0 && h > 0;
            }
            Msg::Key(key) => {
                if self.filtering {
                    return self.handle_filter_key(&key);
                }
                return self.handle_normal_key(&key);
            }
            Msg::ScanComplete(result) => {
                self.scanning = false;
                match result {
                    Ok(outcome) => {
                        self.projects = outcome.projects;
                        self.projects.sort_by(|a, b| a.name.cmp(&b.name));
                        self.probe_failures = outcome.probe_failures;
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "scan failed");
                        self.projects = Vec::new();
                        self.probe_failures = 0;
                    }
                }
                self.clamp_selection();
            }
            Msg::DarknessDetected(_) => {}
        }
        (Transition::None, None)
    }

    fn view(&self) -> Text<'static> {
        if !self.ready || self.width == 0 || self.height == 0 {
            return Text::raw("Loading...");
        }

        let mut lines: Vec<Line<'static>> = Vec::new();

        let header = if self.scanning {
            format!("{} (scanning...)", self.app_name)
        } else {
            self.app_name.clone()
        };
        lines.push(Line::from(Span::styled(header, self.theme.title)));
        lines.push(Line::default());

        if self.filtering {
            lines.push(Line::from(vec![
                Span::styled("Filter: ".to_string(), self.theme.subtle),
                Span::raw(self.filter_text.clone()),
                Span::raw("█"),
            ]));
            lines.push(Line::default());
        } else if !self.filter_text.is_empty() {
            lines.push(Line::from(vec![
                Span::styled("Filter: ".to_string(), self.theme.subtle),
                Span::raw(self.filter_text.clone()),
            ]));
            lines.push(Line::default());
        }

        if self.probe_failures > 0 {
            lines.push(Line::from(Span::styled(
                format!("{} probe failure(s) in last scan", self.probe_failures),
                self.theme.warning,
            )));
            lines.push(Line::default());
        }

        let filtered = self.filtered();
        if filtered.is_empty() {
            let notice = if self.scanning {
                "Scanning for projects..."
            } else {
                "No projects found."
            };
            lines.push(Line::from(Span::styled(
                notice.to_string(),
                self.theme.subtle,
            )));
        } else {
            for (i, project) in filtered.iter().enumerate() {
                lines.push(self.render_row(project, i == self.selected));
            }
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("{} project(s)", filtered.len()),
            self.theme.subtle,
        )));
        lines.extend(self.help_lines());

        Text::from(lines)
    }

    fn set_theme(&mut self, theme: &Theme) {
        self.theme = *theme;
    }
}

/// Cut a commit subject to at most 30 characters, ellipsis at the cut.
fn truncate_subject(subject: &str) -> String {
    if subject.chars().count() <= 30 {
        return subject.to_string();
    }
    let head: String = subject.chars().take(27).collect();
    format!("{head}...")
}

fn format_time_ago(t: DateTime<Utc>) -> String {
    format_age(Utc::now().signed_duration_since(t))
}

/// Bucket an elapsed duration into a coarse human label.
fn format_age(d: chrono::Duration) -> String {
    let secs = d.num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let mins = d.num_minutes();
    if mins < 60 {
        return if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{mins} mins ago")
        };
    }
    let hours = d.num_hours();
    if hours < 24 {
        return if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{hours} hours ago")
        };
    }
    let days = d.num_days();
    if days < 7 {
        return if days == 1 {
            "1 day ago".to_string()
        } else {
            format!("{days} days ago")
        };
    }
    let weeks = days / 7;
    if weeks == 1 {
        "1 week ago".to_string()
    } else {
        format!("{weeks} weeks ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::GitStatus;
    use crate::scanner::ScanOutcome;
    use crate::settings::Settings;
    use chrono::Duration;
    use std::fs;

    fn test_screen(tag: &str) -> ProjectListScreen {
        let root = std::env::temp_dir().join(format!("repo-board-test-list-{tag}"));
        fs::create_dir_all(&root).unwrap();
        let settings = Settings {
            projects_root: Some(root.to_string_lossy().to_string()),
            ..Settings::default()
        };
        let config = AppConfig::resolve(settings, None, None, None).unwrap();
        let mut screen = ProjectListScreen::new(&config, Theme::default());
        screen.update(Msg::Resize(80, 24));
        screen
    }

    fn project(name: &str) -> Project {
        Project {
            name: name.to_string(),
            path: std::env::temp_dir().join(name),
            language: None,
            git: GitStatus::default(),
        }
    }

    fn deliver(screen: &mut ProjectListScreen, projects: Vec<Project>) {
        screen.update(Msg::ScanComplete(Ok(ScanOutcome {
            projects,
            probe_failures: 0,
        })));
    }

    fn press(screen: &mut ProjectListScreen, code: KeyCode) -> (Transition, Option<Cmd>) {
        screen.update(Msg::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn type_str(screen: &mut ProjectListScreen, text: &str) {
        for c in text.chars() {
            press(screen, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_loading_before_first_size_event() {
        let root = std::env::temp_dir().join("repo-board-test-list-noresize");
        fs::create_dir_all(&root).unwrap();
        let settings = Settings {
            projects_root: Some(root.to_string_lossy().to_string()),
            ..Settings::default()
        };
        let config = AppConfig::resolve(settings, None, None, None).unwrap();
        let screen = ProjectListScreen::new(&config, Theme::default());
        assert_eq!(screen.view().to_string(), "Loading...");
    }

    #[test]
    fn test_zero_size_renders_loading() {
        let mut screen = test_screen("zerosize");
        screen.update(Msg::Resize(0, 0));
        assert_eq!(screen.view().to_string(), "Loading...");
    }

    #[test]
    fn test_scan_complete_sorts_by_name() {
        let mut screen = test_screen("sort");
        deliver(
            &mut screen,
            vec![project("zulu"), project("alpha"), project("mike")],
        );
        let view = screen.view().to_string();
        let alpha = view.find("alpha").unwrap();
        let mike = view.find("mike").unwrap();
        let zulu = view.find("zulu").unwrap();
        assert!(alpha < mike && mike < zulu);
        assert!(view.contains("3 project(s)"));
    }

    #[test]
    fn test_scan_error_shows_empty_state() {
        let mut screen = test_screen("scanerr");
        deliver(&mut screen, vec![project("alpha")]);
        screen.update(Msg::ScanComplete(Err("boom".to_string())));
        let view = screen.view().to_string();
        assert!(view.contains("No projects found."));
        assert!(view.contains("0 project(s)"));
    }

    #[test]
    fn test_filter_narrows_case_insensitively() {
        let mut screen = test_screen("filter");
        deliver(
            &mut screen,
            vec![project("alpha"), project("Beta"), project("gamma")],
        );
        press(&mut screen, KeyCode::Down);
        press(&mut screen, KeyCode::Down);
        press(&mut screen, KeyCode::Char('/'));
        type_str(&mut screen, "et");

        let view = screen.view().to_string();
        assert!(view.contains("Beta"));
        assert!(!view.contains("alpha"));
        assert!(!view.contains("gamma"));
        assert!(view.contains("1 project(s)"));
        // Selection clamped onto the only remaining row.
        assert!(view.contains("▸ Beta"));
    }

    #[test]
    fn test_filter_backspace_round_trip() {
        let mut screen = test_screen("backspace");
        deliver(&mut screen, vec![project("alpha"), project("beta")]);
        press(&mut screen, KeyCode::Char('/'));
        type_str(&mut screen, "al");
        assert!(screen.view().to_string().contains("1 project(s)"));
        press(&mut screen, KeyCode::Backspace);
        press(&mut screen, KeyCode::Backspace);
        assert!(screen.filter_text.is_empty());
        assert!(screen.view().to_string().contains("2 project(s)"));
    }

    #[test]
    fn test_filter_escape_clears_enter_keeps() {
        let mut screen = test_screen("filtermodes");
        deliver(&mut screen, vec![project("alpha"), project("beta")]);

        press(&mut screen, KeyCode::Char('/'));
        type_str(&mut screen, "be");
        press(&mut screen, KeyCode::Esc);
        assert!(!screen.filtering);
        assert!(screen.filter_text.is_empty());

        press(&mut screen, KeyCode::Char('/'));
        type_str(&mut screen, "be");
        press(&mut screen, KeyCode::Enter);
        assert!(!screen.filtering);
        assert_eq!(screen.filter_text, "be");
        assert!(screen.view().to_string().contains("Filter: be"));
    }

    #[test]
    fn test_navigation_clamps_at_both_ends() {
        let mut screen = test_screen("nav");
        deliver(&mut screen, vec![project("a"), project("b")]);
        press(&mut screen, KeyCode::Up);
        assert_eq!(screen.selected, 0);
        press(&mut screen, KeyCode::Char('j'));
        press(&mut screen, KeyCode::Char('j'));
        press(&mut screen, KeyCode::Char('j'));
        assert_eq!(screen.selected, 1);
        press(&mut screen, KeyCode::Char('k'));
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn test_refresh_is_suppressed_while_scanning() {
        let mut screen = test_screen("refresh");
        let cmd = screen.init();
        assert!(cmd.is_some());
        assert!(screen.scanning);
        let (_, cmd) = press(&mut screen, KeyCode::Char('r'));
        assert!(cmd.is_none());
    }

    #[test]
    fn test_refresh_dispatches_when_idle() {
        let mut screen = test_screen("refresh-idle");
        deliver(&mut screen, vec![]);
        let (_, cmd) = press(&mut screen, KeyCode::Char('r'));
        assert!(cmd.is_some());
        assert!(screen.scanning);
        assert!(screen.view().to_string().contains("(scanning...)"));
    }

    #[test]
    fn test_enter_pushes_detail_for_selected_row() {
        let mut screen = test_screen("enter");
        deliver(&mut screen, vec![project("alpha"), project("beta")]);
        press(&mut screen, KeyCode::Down);
        let (transition, _) = press(&mut screen, KeyCode::Enter);
        assert!(matches!(transition, Transition::Push(_)));
    }

    #[test]
    fn test_enter_with_no_rows_does_nothing() {
        let mut screen = test_screen("enter-empty");
        deliver(&mut screen, vec![]);
        let (transition, _) = press(&mut screen, KeyCode::Enter);
        assert!(matches!(transition, Transition::None));
    }

    #[test]
    fn test_escape_requests_pop() {
        let mut screen = test_screen("escape");
        deliver(&mut screen, vec![]);
        let (transition, _) = press(&mut screen, KeyCode::Esc);
        assert!(matches!(transition, Transition::Pop));
    }

    #[test]
    fn test_selection_clamps_when_results_shrink() {
        let mut screen = test_screen("shrink");
        deliver(&mut screen, vec![project("a"), project("b"), project("c")]);
        press(&mut screen, KeyCode::Down);
        press(&mut screen, KeyCode::Down);
        assert_eq!(screen.selected, 2);
        deliver(&mut screen, vec![project("a")]);
        assert_eq!(screen.selected, 0);
    }

    #[test]
    fn test_probe_failure_banner() {
        let mut screen = test_screen("banner");
        screen.update(Msg::ScanComplete(Ok(ScanOutcome {
            projects: vec![project("alpha")],
            probe_failures: 2,
        })));
        assert!(screen
            .view()
            .to_string()
            .contains("2 probe failure(s) in last scan"));
        deliver(&mut screen, vec![project("alpha")]);
        assert!(!screen.view().to_string().contains("probe failure"));
    }

    #[test]
    fn test_row_shows_diverged_markers() {
        let mut screen = test_screen("diverged");
        let mut p = project("alpha");
        p.git = GitStatus {
            branch: "main".to_string(),
            remote: "origin/main".to_string(),
            unpushed: 2,
            unpulled: 1,
            status: StatusKind::Diverged,
            ..GitStatus::default()
        };
        deliver(&mut screen, vec![p]);
        let view = screen.view().to_string();
        assert!(view.contains("[main]"));
        assert!(view.contains("⚠"));
        assert!(view.contains("↑2"));
        assert!(view.contains("↓1"));
    }

    #[test]
    fn test_row_skips_zero_counts_and_unknown_age() {
        let mut screen = test_screen("zeros");
        let mut p = project("alpha");
        p.git = GitStatus {
            branch: "main".to_string(),
            last_commit_msg: "tidy".to_string(),
            ..GitStatus::default()
        };
        deliver(&mut screen, vec![p]);
        let view = screen.view().to_string();
        assert!(view.contains("○"));
        assert!(view.contains("\"tidy\""));
        assert!(!view.contains('±'));
        assert!(!view.contains("ago"));
        assert!(!view.contains("just now"));
    }

    #[test]
    fn test_help_toggle_expands() {
        let mut screen = test_screen("help");
        deliver(&mut screen, vec![]);
        assert!(!screen.view().to_string().contains("↑/k up"));
        press(&mut screen, KeyCode::Char('?'));
        assert!(screen.view().to_string().contains("↑/k up"));
        press(&mut screen, KeyCode::Char('?'));
        assert!(!screen.view().to_string().contains("↑/k up"));
    }

    #[test]
    fn test_truncate_subject() {
        assert_eq!(truncate_subject("short"), "short");
        let exact: String = "x".repeat(30);
        assert_eq!(truncate_subject(&exact), exact);
        let long: String = "y".repeat(40);
        let cut = truncate_subject(&long);
        assert_eq!(cut.chars().count(), 30);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_format_age_buckets() {
        assert_eq!(format_age(Duration::seconds(5)), "just now");
        assert_eq!(format_age(Duration::seconds(59)), "just now");
        assert_eq!(format_age(Duration::seconds(60)), "1 min ago");
        assert_eq!(format_age(Duration::minutes(30)), "30 mins ago");
        assert_eq!(format_age(Duration::hours(1)), "1 hour ago");
        assert_eq!(format_age(Duration::hours(23)), "23 hours ago");
        assert_eq!(format_age(Duration::days(1)), "1 day ago");
        assert_eq!(format_age(Duration::days(6)), "6 days ago");
        assert_eq!(format_age(Duration::days(7)), "1 week ago");
        assert_eq!(format_age(Duration::days(21)), "3 weeks ago");
    }
}
