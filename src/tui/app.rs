use std::sync::Arc;

use ratatui::widgets::TableState;

use crate::commands::by_due_date;
use crate::dashboard::{Dashboard, DashboardEvent, View};
use crate::models::{Task, TaskId};
use crate::notify::{Notifier, StatusLine};
use crate::session::LocalAuth;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    /// Typing a status for the selected task.
    Editing,
    /// Walking through the new-task form.
    Adding,
}

/// Steps of the "Add Task" wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddStep {
    Name,
    Stakeholder,
    Due,
    Status,
}

pub struct App {
    pub dashboard: Dashboard,
    pub auth: Arc<LocalAuth>,
    pub status_line: StatusLine,
    pub state: TableState,
    pub input_mode: InputMode,
    pub add_step: AddStep,
    pub input_buffer: String,
    pub target_id: Option<TaskId>,
}

impl App {
    pub fn new(dashboard: Dashboard, auth: Arc<LocalAuth>, status_line: StatusLine) -> App {
        App {
            dashboard,
            auth,
            status_line,
            state: TableState::default(),
            input_mode: InputMode::Normal,
            add_step: AddStep::Name,
            input_buffer: String::new(),
            target_id: None,
        }
    }

    /// Tasks in the order they are drawn.
    pub fn rows(&self) -> Vec<&Task> {
        by_due_date(self.dashboard.tasks())
    }

    pub fn selected_task(&self) -> Option<&Task> {
        let i = self.state.selected()?;
        self.rows().get(i).copied()
    }

    /// Hands a subscription event to the dashboard and keeps the selection
    /// inside the new list.
    pub fn apply(&mut self, event: DashboardEvent) {
        let keep = self.selected_task().map(|t| t.id.clone());
        self.dashboard.apply(event);
        self.reselect(keep);
    }

    fn reselect(&mut self, keep: Option<TaskId>) {
        let rows = self.rows();
        let idx = keep
            .and_then(|id| rows.iter().position(|t| t.id == id))
            .or_else(|| self.state.selected().map(|i| i.min(rows.len().saturating_sub(1))));
        let idx = if rows.is_empty() { None } else { Some(idx.unwrap_or(0)) };
        self.state.select(idx);
    }

    /// Selects the next task.
    pub fn next(&mut self) {
        let len = self.dashboard.tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous task.
    pub fn previous(&mut self) {
        let len = self.dashboard.tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Moves the selected task to the next status.
    pub async fn cycle_selected_status(&mut self) {
        if let Some((id, status)) = self.selected_task().map(|t| (t.id.clone(), t.status.next())) {
            self.dashboard.change_status(&id, status).await;
        }
    }

    /// Starts the "Add Task" wizard. Fields keep whatever a failed submit
    /// left in the form.
    pub fn start_add(&mut self) {
        self.status_line.clear();
        self.input_mode = InputMode::Adding;
        self.add_step = AddStep::Name;
        self.input_buffer = self.dashboard.form.name.clone();
    }

    /// Starts typing a status for the selected task.
    pub fn start_status_input(&mut self) {
        if let Some((id, status)) = self.selected_task().map(|t| (t.id.clone(), t.status)) {
            self.target_id = Some(id);
            self.input_buffer = status.to_string();
            self.input_mode = InputMode::Editing;
        }
    }

    pub fn cancel_input(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.target_id = None;
    }

    /// Handles Enter based on the current mode.
    pub async fn handle_input(&mut self) {
        match self.input_mode {
            InputMode::Adding => self.handle_adding_input().await,
            InputMode::Editing => self.handle_editing_input().await,
            InputMode::Normal => {}
        }
    }

    async fn handle_adding_input(&mut self) {
        let value = self.input_buffer.trim().to_string();
        let form = &mut self.dashboard.form;
        match self.add_step {
            AddStep::Name => {
                if !value.is_empty() {
                    form.name = value;
                    self.add_step = AddStep::Stakeholder;
                    self.input_buffer = form.stakeholder.clone();
                }
            }
            AddStep::Stakeholder => {
                if !value.is_empty() {
                    form.stakeholder = value;
                    self.add_step = AddStep::Due;
                    self.input_buffer = form.due_date.clone();
                }
            }
            AddStep::Due => {
                if !value.is_empty() {
                    form.due_date = value;
                    self.add_step = AddStep::Status;
                    self.input_buffer = form.status.to_string();
                }
            }
            AddStep::Status => {
                if !value.is_empty() {
                    match value.parse() {
                        Ok(status) => form.status = status,
                        Err(e) => {
                            self.status_line.failure(&format!("{}", e));
                            return;
                        }
                    }
                }
                self.input_mode = InputMode::Normal;
                self.input_buffer.clear();
                self.dashboard.submit().await;
            }
        }
    }

    async fn handle_editing_input(&mut self) {
        if let Some(id) = self.target_id.take() {
            let raw = self.input_buffer.clone();
            self.dashboard.select_status(&id, &raw).await;
        }
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
    }

    pub async fn sign_out(&mut self) {
        if self.dashboard.sign_out().await {
            self.state.select(None);
        }
    }

    /// Signs the configured identity back in. The session watcher picks up
    /// the change and resubscribes.
    pub fn sign_in(&mut self) {
        if self.dashboard.view() == View::SignIn {
            self.status_line.clear();
            self.auth.sign_in();
        }
    }
}
