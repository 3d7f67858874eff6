use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Gauge, Paragraph, Row, Table},
    Frame,
};

use super::app::{AddStep, App, InputMode};
use crate::dashboard::View;
use crate::models::Status;
use crate::notify::NoticeKind;

pub fn ui(f: &mut Frame, app: &mut App) {
    match app.dashboard.view() {
        View::SignIn => sign_in_view(f, app),
        View::Tasks => tasks_view(f, app),
    }
}

fn sign_in_view(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let text = format!(
        "Signed out.\nPress s to sign in as {}, q to quit.",
        app.auth.identity().email
    );
    let p = Paragraph::new(text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL).title("Taskboard"));
    f.render_widget(p, centered_rect(60, 4, chunks[0]));
    status_line(f, app, chunks[1]);
}

fn tasks_view(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Status / help
        ].as_ref())
        .split(f.area());

    let email = app
        .dashboard
        .session()
        .current_user()
        .map(|u| u.email.clone())
        .unwrap_or_default();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!("Taskboard - {}", email)))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(u16::from(app.dashboard.completion_percentage()));
    f.render_widget(gauge, chunks[0]);

    let today = Local::now().date_naive();
    let rows: Vec<Row> = app
        .rows()
        .into_iter()
        .map(|t| {
            let style = match t.status {
                Status::Completed => Style::default().fg(Color::Green),
                Status::Incomplete => Style::default().fg(Color::Red),
                Status::Pending => Style::default().fg(Color::Yellow),
            };
            Row::new(vec![
                Cell::from(t.id.0.chars().take(8).collect::<String>()),
                Cell::from(t.name.clone()),
                Cell::from(t.stakeholder.clone()),
                Cell::from(t.due_date.clone()),
                Cell::from(t.due_label(today)),
                Cell::from(t.status.to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(11),
    ];

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["ID", "Name", "Stakeholder", "Due", "Time Left", "Status"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default().borders(Borders::ALL).title("Tasks"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, chunks[1], &mut app.state);

    status_line(f, app, chunks[2]);

    // Render Input Box if needed
    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.input_mode {
            InputMode::Adding => match app.add_step {
                AddStep::Name => "Add Task: Enter Name",
                AddStep::Stakeholder => "Add Task: Enter Stakeholder",
                AddStep::Due => "Add Task: Enter Due Date (YYYY-MM-DD)",
                AddStep::Status => "Add Task: Enter Status (Pending/Incomplete/Completed)",
            },
            InputMode::Editing => "Set Status (Pending/Incomplete/Completed)",
            InputMode::Normal => "",
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, area);
    }
}

/// Latest notification if there is one, key help otherwise.
fn status_line(f: &mut Frame, app: &App, area: Rect) {
    if area.height == 0 {
        return;
    }
    let (text, style) = match (&app.input_mode, app.status_line.latest()) {
        (InputMode::Normal, Some(notice)) => {
            let color = match notice.kind {
                NoticeKind::Success => Color::Green,
                NoticeKind::Failure => Color::Red,
            };
            (notice.message, Style::default().fg(color))
        }
        (InputMode::Normal, None) => {
            let help = match app.dashboard.view() {
                View::Tasks => "q: Quit | a: Add | Space: Next Status | s: Set Status | o: Sign Out | j/k: Move",
                View::SignIn => "s: Sign In | q: Quit",
            };
            (help.to_string(), Style::default().fg(Color::Gray))
        }
        (InputMode::Editing, _) => ("Enter: Save | Esc: Cancel".to_string(), Style::default().fg(Color::Gray)),
        (InputMode::Adding, _) => ("Enter: Next Step | Esc: Cancel".to_string(), Style::default().fg(Color::Gray)),
    };

    let p = Paragraph::new(text)
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(p, area);
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
