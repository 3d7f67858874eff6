use crate::models::{Status, Task};

/// Share of tasks that are completed, as a whole percentage.
///
/// `round(100 * completed / total)`, with halves rounded away from zero.
///
/// # Returns
/// - `0` for an empty list.
/// - A value in `0..=100` otherwise.
pub fn completion_percentage(tasks: &[Task]) -> u8 {
    let total = tasks.len();
    if total == 0 {
        return 0;
    }
    let completed = tasks.iter().filter(|t| t.status == Status::Completed).count();
    (100.0 * completed as f64 / total as f64).round() as u8
}
