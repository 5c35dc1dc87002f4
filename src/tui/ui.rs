use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use super::app::{App, InputMode, ViewMode};
use crate::due::{days_until, status_by_basis, DueStatus};

fn time_left(days: i64) -> String {
    if days < 0 {
        format!("{}d overdue", days.abs())
    } else if days == 0 {
        "Today".to_string()
    } else {
        format!("{}d", days)
    }
}

fn status_style(status: DueStatus) -> Style {
    match status {
        DueStatus::Overdue => Style::default().fg(Color::Red),
        DueStatus::DueSoon => Style::default().fg(Color::Yellow),
        DueStatus::Ok => Style::default().fg(Color::Green),
        DueStatus::Unknown => Style::default().fg(Color::Gray),
    }
}

fn header_row(names: Vec<&'static str>) -> Row<'static> {
    Row::new(names)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .bottom_margin(1)
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let today = app.today();
    let highlight = Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray);

    match app.view_mode {
        ViewMode::Reminders => {
            let rows: Vec<Row> = app
                .reminders
                .iter()
                .map(|t| {
                    let days_left = (t.due_date - today).num_days();
                    let style = if t.is_completed {
                        Style::default().fg(Color::DarkGray)
                    } else if days_left < 0 {
                        Style::default().fg(Color::Red)
                    } else if days_left <= 7 {
                        Style::default().fg(Color::Yellow)
                    } else {
                        Style::default().fg(Color::Green)
                    };
                    let due = match t.due_time {
                        Some(time) => format!("{} {}", t.due_date, time.format("%H:%M")),
                        None => t.due_date.to_string(),
                    };
                    Row::new(vec![
                        Cell::from(t.id.to_string()),
                        Cell::from(t.title.clone()),
                        Cell::from(due),
                        Cell::from(time_left(days_left)),
                        Cell::from(if t.is_generated() { "auto" } else { "user" }),
                        Cell::from(if t.is_completed { "Done" } else { "Pending" }),
                    ])
                    .style(style)
                })
                .collect();

            let widths = [
                Constraint::Length(5),
                Constraint::Min(24),
                Constraint::Length(17),
                Constraint::Length(12),
                Constraint::Length(6),
                Constraint::Length(8),
            ];

            let table = Table::new(rows, widths)
                .header(header_row(vec!["ID", "Title", "Due", "Left", "From", "Status"]))
                .block(Block::default().borders(Borders::ALL).title("Upkeep - Reminders"))
                .row_highlight_style(highlight)
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.reminder_state);
        }
        ViewMode::Items => {
            let rows: Vec<Row> = app
                .items
                .iter()
                .map(|item| {
                    let basis = status_by_basis(item, today);
                    let left = days_until(item, today).map(time_left).unwrap_or_else(|| "-".into());
                    Row::new(vec![
                        Cell::from(item.source_type().to_string()),
                        Cell::from(item.label.clone()),
                        Cell::from(item.subject.name().to_string()),
                        Cell::from(item.subject.location().unwrap_or_default().to_string()),
                        Cell::from(item.next_due_date.map(|d| d.to_string()).unwrap_or_default()),
                        Cell::from(left),
                        Cell::from(basis.worst().to_string()),
                    ])
                    .style(status_style(basis.worst()))
                })
                .collect();

            let widths = [
                Constraint::Length(22),
                Constraint::Min(16),
                Constraint::Length(14),
                Constraint::Length(14),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(9),
            ];

            let table = Table::new(rows, widths)
                .header(header_row(vec!["Type", "Label", "Subject", "Location", "Next Due", "Left", "Status"]))
                .block(Block::default().borders(Borders::ALL).title("Upkeep - Items"))
                .row_highlight_style(highlight)
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[0], &mut app.item_state);
        }
    }

    let keys = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Reminders => "q: Quit | Space: Done | s: Sync | c: Toggle Done | v: View Items",
            ViewMode::Items => "q: Quit | Space: Done Today | t: Due Date | s: Sync | v: View Reminders",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
    };
    let help_text = match &app.message {
        Some(m) if app.input_mode == InputMode::Normal => format!("{}  [{}]", keys, m),
        _ => keys.to_string(),
    };

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[1]);

    if app.input_mode == InputMode::Editing {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);
        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Set Due Date (YYYY-MM-DD)"));
        f.render_widget(input, area);
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
