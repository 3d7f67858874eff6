pub mod app;
pub mod ui;

use std::{io, sync::Arc};

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio::sync::watch;

use crate::dashboard::{Dashboard, DashboardEvents, View};
use crate::notify::StatusLine;
use crate::session::{AuthProvider, LocalAuth, Session};
use app::{App, InputMode};
use ui::ui;

pub async fn run_tui(dashboard: Dashboard, events: DashboardEvents, auth: Arc<LocalAuth>, status_line: StatusLine) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let session = auth.session();
    let mut app = App::new(dashboard, auth, status_line);

    // Run loop
    let res = run_app(&mut terminal, &mut app, events, session).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut events: DashboardEvents,
    mut session: watch::Receiver<Session>,
) -> Result<()> {
    let mut reader = EventStream::new();
    let initial = session.borrow_and_update().clone();
    app.dashboard.set_session(initial).await;

    loop {
        terminal.draw(|f| ui(f, app))?;

        tokio::select! {
            Some(event) = events.recv() => app.apply(event),
            changed = session.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let next = session.borrow_and_update().clone();
                app.dashboard.set_session(next).await;
            }
            input = reader.next() => {
                let Some(input) = input else { return Ok(()) };
                let Event::Key(key) = input? else { continue };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.input_mode {
                    InputMode::Normal => match app.dashboard.view() {
                        View::SignIn => match key.code {
                            KeyCode::Char('q') => return Ok(()),
                            KeyCode::Char('s') | KeyCode::Enter => app.sign_in(),
                            _ => {}
                        },
                        View::Tasks => match key.code {
                            KeyCode::Char('q') => return Ok(()),
                            KeyCode::Down | KeyCode::Char('j') => app.next(),
                            KeyCode::Up | KeyCode::Char('k') => app.previous(),
                            KeyCode::Char(' ') | KeyCode::Enter => app.cycle_selected_status().await,
                            KeyCode::Char('s') => app.start_status_input(),
                            KeyCode::Char('a') => app.start_add(),
                            KeyCode::Char('o') => app.sign_out().await,
                            _ => {}
                        },
                    },
                    InputMode::Editing | InputMode::Adding => match key.code {
                        KeyCode::Enter => app.handle_input().await,
                        KeyCode::Esc => app.cancel_input(),
                        KeyCode::Char(c) => {
                            app.input_buffer.push(c);
                        }
                        KeyCode::Backspace => {
                            app.input_buffer.pop();
                        }
                        _ => {}
                    },
                }
            }
        }
    }
}
