use crate::workspace::TerminalWorkspace;
use aidvice_core::{
    AdvicePlugin, AdviceProvider, IdleAdviceScheduler, PersistenceStore, PluginAction,
    SettingsField, SettingsForm, SystemClock,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const PREVIEW_LINES: usize = 200;

#[derive(Debug, Clone, Default)]
pub struct FormState {
    pub selected: usize,
    pub editing: bool,
}

impl FormState {
    pub fn field(&self) -> SettingsField {
        SettingsForm::field(self.selected).unwrap_or(SettingsField::ApiKey)
    }
}

pub struct App<S: PersistenceStore> {
    pub plugin: AdvicePlugin<S, SystemClock>,
    pub workspace: TerminalWorkspace,
    pub notes_path: PathBuf,
    pub notes_preview: Vec<String>,
    pub edits_seen: u64,
    pub form: Option<FormState>,
    pub show_help: bool,
    pub button_area: Option<Rect>,
    pub dirty: bool,
    pub should_quit: bool,
}

impl<S: PersistenceStore> App<S> {
    pub fn new(
        notes_path: PathBuf,
        store: S,
        provider: Box<dyn AdviceProvider>,
        quiet_interval: Duration,
    ) -> Self {
        let mut workspace = TerminalWorkspace::new();
        let plugin = AdvicePlugin::load(
            &mut workspace,
            store,
            provider,
            IdleAdviceScheduler::new(quiet_interval),
        );
        let mut app = Self {
            plugin,
            workspace,
            notes_path,
            notes_preview: Vec::new(),
            edits_seen: 0,
            form: None,
            show_help: false,
            button_area: None,
            dirty: true,
            should_quit: false,
        };
        app.reload_preview();
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether a redraw is due; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn on_layout_ready(&mut self, cols: u16) {
        self.workspace.set_width(cols);
        self.plugin.on_layout_ready(&mut self.workspace);
        self.mark_dirty();
    }

    pub fn on_resize(&mut self, cols: u16) {
        self.workspace.set_width(cols);
        self.mark_dirty();
    }

    pub fn on_notes_changed(&mut self) {
        self.edits_seen += 1;
        self.plugin.on_edit();
        self.reload_preview();
        self.mark_dirty();
    }

    pub fn on_tick(&mut self) {
        if self.plugin.tick(&mut self.workspace) {
            self.mark_dirty();
        }
        if self.workspace.expire_notice() {
            self.mark_dirty();
        }
        // keeps the status line countdown moving
        if self.plugin.time_until_fire().is_some() {
            self.mark_dirty();
        }
    }

    /// How long the event loop may block before the idle timer is due.
    pub fn next_wakeup(&self, ceiling: Duration) -> Duration {
        self.plugin
            .time_until_fire()
            .map_or(ceiling, |left| left.min(ceiling))
    }

    pub fn shutdown(&mut self) {
        self.plugin.unload();
    }

    pub fn reload_preview(&mut self) {
        self.notes_preview = read_preview(&self.notes_path);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.form.is_some() {
            self.handle_form_key(key);
            self.mark_dirty();
            return;
        }
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('t') => {
                self.plugin
                    .dispatch(&mut self.workspace, PluginAction::ToggleAdviceView);
            }
            KeyCode::Char('g') | KeyCode::Enter => {
                self.plugin
                    .dispatch(&mut self.workspace, PluginAction::GetAdvice);
            }
            KeyCode::Char('x') => {
                if self.workspace.close_focused() {
                    debug!(event = "panel_closed_by_user");
                }
            }
            KeyCode::Char('s') | KeyCode::Char(',') => {
                self.show_help = false;
                self.form = Some(FormState::default());
            }
            KeyCode::Char('r') => {
                self.reload_preview();
            }
            KeyCode::Char('?') => {
                self.show_help = !self.show_help;
            }
            KeyCode::Esc => {
                self.show_help = false;
            }
            _ => {}
        }
        self.mark_dirty();
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if !form.editing {
            match key.code {
                KeyCode::Esc | KeyCode::Char('q') => {
                    self.form = None;
                }
                KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                    form.selected = (form.selected + 1) % SettingsForm::FIELDS.len();
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    form.selected = form
                        .selected
                        .checked_sub(1)
                        .unwrap_or(SettingsForm::FIELDS.len() - 1);
                }
                KeyCode::Enter => {
                    form.editing = true;
                }
                _ => {}
            }
            return;
        }

        let field = form.field();
        let mut value = field.value(self.plugin.settings()).to_string();
        match key.code {
            KeyCode::Esc => {
                form.editing = false;
                return;
            }
            KeyCode::Enter if !field.multiline() || key.modifiers.contains(KeyModifiers::ALT) => {
                form.editing = false;
                return;
            }
            KeyCode::Enter => value.push('\n'),
            KeyCode::Backspace => {
                if value.pop().is_none() {
                    return;
                }
            }
            KeyCode::Char(ch) => value.push(ch),
            _ => return,
        }
        // Every change commits, the same as the settings tab's on-change handler.
        if let Err(err) = self.plugin.commit_setting(&mut self.workspace, field, value) {
            debug!(event = "setting_commit_failed", field = field.key(), error = %err);
        }
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            let on_button = self
                .button_area
                .is_some_and(|area| contains(area, event.column, event.row));
            if on_button && self.form.is_none() {
                self.plugin
                    .dispatch(&mut self.workspace, PluginAction::GetAdvice);
                self.mark_dirty();
            }
        }
    }

    pub fn update_layout(&mut self, button_area: Option<Rect>) {
        self.button_area = button_area;
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

fn read_preview(path: &Path) -> Vec<String> {
    if path.is_dir() {
        let mut entries: Vec<String> = match std::fs::read_dir(path) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| !name.starts_with('.'))
                .collect(),
            Err(err) => return vec![format!("Failed to list {}: {err}", path.display())],
        };
        entries.sort();
        entries.truncate(PREVIEW_LINES);
        return entries;
    }

    match std::fs::read_to_string(path) {
        Ok(content) => {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(PREVIEW_LINES);
            lines[start..].iter().map(|line| line.to_string()).collect()
        }
        Err(err) => vec![format!("Failed to read {}: {err}", path.display())],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aidvice_core::view::ADVICE_VIEW_TYPE;
    use aidvice_core::{JsonFileStore, MemoryStore, ScopeEchoAdvice, ViewHost};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> (tempfile::TempDir, App<MemoryStore>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let notes = dir.path().join("draft.md");
        std::fs::write(&notes, "It was a dark and stormy night.\n").expect("write notes");
        let app = App::new(
            notes,
            MemoryStore::new(),
            Box::new(ScopeEchoAdvice),
            Duration::from_secs(5),
        );
        (dir, app)
    }

    fn advice_panels(app: &App<MemoryStore>) -> usize {
        app.workspace.panels_of_type(ADVICE_VIEW_TYPE).len()
    }

    #[test]
    fn layout_ready_opens_the_panel() {
        let (_dir, mut app) = app();
        app.on_layout_ready(120);
        assert_eq!(advice_panels(&app), 1);
        assert_eq!(app.workspace.commands().len(), 1);
        assert_eq!(app.notes_preview, vec!["It was a dark and stormy night."]);
    }

    #[test]
    fn narrow_layout_posts_a_notice_instead_of_a_panel() {
        let (_dir, mut app) = app();
        app.on_layout_ready(40);
        assert_eq!(advice_panels(&app), 0);
        assert!(app.workspace.current_notice().is_some());
    }

    #[test]
    fn t_toggles_the_panel() {
        let (_dir, mut app) = app();
        app.on_layout_ready(120);
        app.handle_key(key(KeyCode::Char('t')));
        assert_eq!(advice_panels(&app), 0);
        app.handle_key(key(KeyCode::Char('t')));
        assert_eq!(advice_panels(&app), 1);
    }

    #[test]
    fn typing_in_the_form_commits_each_keystroke() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Char('s')));
        app.handle_key(key(KeyCode::Enter));
        for ch in "sk-1".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(key(KeyCode::Backspace));
        app.handle_key(key(KeyCode::Esc));
        app.handle_key(key(KeyCode::Esc));

        assert!(app.form.is_none());
        assert_eq!(app.plugin.settings().claude_api_key, "sk-");
        assert_eq!(app.plugin.store().saves(), 5);
    }

    #[test]
    fn failed_save_keeps_the_edit_and_posts_a_notice() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").expect("write blocker");
        let mut app = App::new(
            dir.path().join("draft.md"),
            JsonFileStore::new(blocker.join("data.json")),
            Box::new(ScopeEchoAdvice),
            Duration::from_secs(5),
        );

        app.handle_key(key(KeyCode::Char('s')));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('k')));

        assert_eq!(app.plugin.settings().claude_api_key, "k");
        assert!(app.form.as_ref().is_some_and(|form| form.editing));
        assert_eq!(
            app.workspace.current_notice(),
            Some(aidvice_core::plugin::SETTINGS_SAVE_FAILED_NOTICE)
        );
    }

    #[test]
    fn scope_field_accepts_newlines() {
        let (_dir, mut app) = app();
        app.handle_key(key(KeyCode::Char('s')));
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('!')));
        assert!(app.plugin.settings().advice_scope.ends_with("\n!"));
    }

    #[test]
    fn notes_change_arms_the_idle_timer() {
        let (_dir, mut app) = app();
        assert!(app.plugin.time_until_fire().is_none());
        app.on_notes_changed();
        assert_eq!(app.edits_seen, 1);
        let wait = app.next_wakeup(Duration::from_secs(60));
        assert!(wait <= Duration::from_secs(5));
        assert_eq!(
            app.next_wakeup(Duration::from_millis(100)),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn x_closes_the_panel_behind_the_plugins_back() {
        let (_dir, mut app) = app();
        app.on_layout_ready(120);
        app.handle_key(key(KeyCode::Char('x')));
        assert_eq!(advice_panels(&app), 0);
        app.handle_key(key(KeyCode::Char('g')));
        assert_eq!(advice_panels(&app), 0);
        assert!(app.plugin.controller().view().is_none());
    }

    #[test]
    fn shutdown_unloads_the_plugin() {
        let (_dir, mut app) = app();
        app.on_notes_changed();
        app.shutdown();
        assert!(!app.plugin.is_loaded());
        assert!(app.plugin.time_until_fire().is_none());
    }
}
