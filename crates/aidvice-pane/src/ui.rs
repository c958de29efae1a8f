use crate::state::App;
use crate::theme;
use crate::workspace::RightSlot;
use aidvice_core::view::ADVICE_DISPLAY_TEXT;
use aidvice_core::{PersistenceStore, SettingsForm};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render<S: PersistenceStore>(f: &mut Frame, app: &mut App<S>) {
    let area = f.size();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    let slots: Vec<RightSlot> = app.workspace.visible_slots().cloned().collect();
    let mut button_area = None;

    if slots.is_empty() {
        render_notes(f, app, rows[0]);
    } else {
        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[0]);
        render_notes(f, app, main[0]);

        let share = (100 / slots.len()) as u16;
        let constraints: Vec<Constraint> = slots
            .iter()
            .map(|_| Constraint::Percentage(share))
            .collect();
        let stacked = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(main[1]);

        for (slot, slot_area) in slots.iter().zip(stacked.iter()) {
            let focused = app.workspace.focused() == Some(slot.id);
            let button = render_slot(f, slot, *slot_area, focused);
            if focused || button_area.is_none() {
                button_area = button.or(button_area);
            }
        }
    }

    app.update_layout(button_area);
    render_status(f, app, rows[1]);

    if app.form.is_some() {
        render_settings(f, app, area);
    } else if app.show_help {
        render_help(f, app, area);
    }
}

fn render_notes<S: PersistenceStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Notes: {}", app.notes_path.display()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let visible = inner.height as usize;
    let start = app.notes_preview.len().saturating_sub(visible);
    let lines: Vec<Line> = app.notes_preview[start..]
        .iter()
        .map(|line| Line::from(line.as_str()))
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

/// Draws one right-hand slot. Returns where the advice button landed.
fn render_slot(f: &mut Frame, slot: &RightSlot, area: Rect, focused: bool) -> Option<Rect> {
    let title = if slot.active {
        format!("{ADVICE_DISPLAY_TEXT} *")
    } else {
        ADVICE_DISPLAY_TEXT.to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(theme::border_style(focused));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(model) = &slot.model else {
        f.render_widget(Paragraph::new(Span::styled("…", theme::MUTED_STYLE)), inner);
        return None;
    };

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(Span::styled(model.heading.as_str(), theme::HEADER_STYLE)),
        parts[0],
    );

    let label = format!("[ {} ]", model.button_label);
    let button = Rect {
        width: (label.chars().count() as u16).min(parts[1].width),
        ..parts[1]
    };
    f.render_widget(
        Paragraph::new(Span::styled(label, theme::BUTTON_STYLE)),
        button,
    );

    f.render_widget(
        Paragraph::new(model.body.as_str()).wrap(Wrap { trim: false }),
        parts[3],
    );
    Some(button)
}

fn render_status<S: PersistenceStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let line = if let Some(notice) = app.workspace.current_notice() {
        Line::from(Span::styled(notice.to_string(), theme::NOTICE_STYLE))
    } else {
        let timer = match app.plugin.time_until_fire() {
            Some(left) => format!("advice in {:.1}s", left.as_secs_f32()),
            None => "idle".to_string(),
        };
        Line::from(vec![
            Span::styled(format!(" edits {} ", app.edits_seen), theme::MUTED_STYLE),
            Span::styled(format!("| {timer} "), theme::MUTED_STYLE),
            Span::raw("| t toggle  g advice  s settings  ? help  q quit"),
        ])
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_settings<S: PersistenceStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let Some(form) = &app.form else {
        return;
    };
    let popup = centered(area, 70, 60);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(SettingsForm::HEADING)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let mut lines = Vec::new();
    for (idx, field) in SettingsForm::FIELDS.iter().enumerate() {
        let selected = idx == form.selected;
        let name_style = if selected {
            theme::SELECTED_STYLE
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(field.name(), name_style)));
        lines.push(Line::from(Span::styled(
            field.description(),
            theme::MUTED_STYLE,
        )));

        let value = field.value(app.plugin.settings());
        if value.is_empty() {
            lines.push(Line::from(Span::styled(
                field.placeholder(),
                theme::MUTED_STYLE.add_modifier(Modifier::ITALIC),
            )));
        } else {
            for part in value.split('\n') {
                lines.push(Line::from(part.to_string()));
            }
        }
        if selected && form.editing {
            lines.push(Line::from(Span::styled("▏editing", theme::NOTICE_STYLE)));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "j/k select  Enter edit  Esc done (Alt+Enter ends multi-line)",
        theme::MUTED_STYLE,
    )));

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn render_help<S: PersistenceStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let popup = centered(area, 50, 50);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Help")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let entries = [
        ("t", "Toggle AIdvice panel"),
        ("g / Enter", "Get advice now"),
        ("x", "Close the focused panel"),
        ("s / ,", "Settings"),
        ("r", "Reload notes preview"),
        ("?", "Toggle help"),
        ("q", "Quit"),
    ];
    let mut text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (keys, action) in entries {
        text.push(Line::from(vec![
            Span::styled(format!("{keys:<11}"), Color::Cyan),
            Span::raw(action),
        ]));
    }
    text.push(Line::from(""));
    for command in app.workspace.commands() {
        text.push(Line::from(Span::styled(
            format!("command  {} ({})", command.name, command.id),
            theme::MUTED_STYLE,
        )));
    }
    for ribbon in app.workspace.ribbons() {
        text.push(Line::from(Span::styled(
            format!("ribbon   {} [{}]", ribbon.title, ribbon.icon),
            theme::MUTED_STYLE,
        )));
    }
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
