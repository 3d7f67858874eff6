use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::dashboard::{Dashboard, DashboardEvent, DashboardEvents};
use crate::models::{Status, Task, TaskId};

/// How long a one-shot command waits for the first snapshot.
const SNAPSHOT_TIMEOUT: Duration = Duration::from_secs(5);

/// Waits until the live query has delivered its initial list.
pub async fn await_snapshot(dashboard: &mut Dashboard, events: &mut DashboardEvents) -> Result<()> {
    if dashboard.session().current_user().is_none() {
        bail!("no signed-in user");
    }
    let wait = async {
        while let Some(event) = events.recv().await {
            match event {
                DashboardEvent::Snapshot { .. } => {
                    dashboard.apply(event);
                    return Ok(());
                }
                DashboardEvent::SubscriptionFailed { ref error, .. } => {
                    let msg = error.to_string();
                    dashboard.apply(event);
                    return Err(anyhow!(msg));
                }
            }
        }
        Err(anyhow!("event queue closed"))
    };
    tokio::time::timeout(SNAPSHOT_TIMEOUT, wait)
        .await
        .context("timed out waiting for tasks")?
}

/// Adds a new task for the signed-in user.
pub async fn cmd_add(dashboard: &mut Dashboard, name: String, stakeholder: String, due: String, status: Status) -> Result<()> {
    dashboard.form.name = name;
    dashboard.form.stakeholder = stakeholder;
    dashboard.form.due_date = due;
    dashboard.form.status = status;
    if !dashboard.submit().await {
        bail!("task was not added");
    }
    Ok(())
}

/// Sets the status of a task. `status` is raw user input.
pub async fn cmd_status(dashboard: &mut Dashboard, id: String, status: &str) -> Result<()> {
    if !dashboard.select_status(&TaskId(id), status).await {
        bail!("status was not updated");
    }
    Ok(())
}

/// Lists the signed-in user's tasks in a formatted table, followed by the
/// completion percentage.
pub async fn cmd_list(dashboard: &mut Dashboard, events: &mut DashboardEvents) -> Result<()> {
    await_snapshot(dashboard, events).await?;
    let tasks = dashboard.tasks();
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    let table = task_table(tasks, Local::now().date_naive());
    println!("{table}");
    println!("Completion: {}%", dashboard.completion_percentage());
    Ok(())
}

/// Tasks ordered by due date, undated ones last, then by creation time.
pub fn by_due_date(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| match (a.due(), b.due()) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.created_at.cmp(&b.created_at)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    });
    sorted
}

pub fn status_color(status: Status) -> Color {
    match status {
        Status::Completed => Color::Green,
        Status::Incomplete => Color::Red,
        Status::Pending => Color::Yellow,
    }
}

/// Builds the table printed by `list`.
pub fn task_table(tasks: &[Task], today: NaiveDate) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Stakeholder").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Time Left").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in by_due_date(tasks) {
        let overdue = t.status != Status::Completed && t.due().is_some_and(|d| d < today);
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(&t.name),
            Cell::new(&t.stakeholder),
            Cell::new(&t.due_date),
            Cell::new(t.due_label(today)).fg(if overdue { Color::Red } else { Color::Reset }),
            Cell::new(t.status).fg(status_color(t.status)),
        ]);
    }
    table
}
