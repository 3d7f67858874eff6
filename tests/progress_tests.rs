use taskboard::models::{Status, Task, TaskId, UserId};
use taskboard::progress::completion_percentage;

fn task(id: &str, status: Status) -> Task {
    Task {
        id: TaskId(id.into()),
        name: format!("Task {}", id),
        stakeholder: "Alice".into(),
        due_date: "2024-05-01".into(),
        status,
        user_id: UserId("U1".into()),
        created_at: "2024-04-01T09:00:00.000Z".into(),
    }
}

#[test]
fn test_empty_list_is_zero() {
    assert_eq!(completion_percentage(&[]), 0);
}

#[test]
fn test_half_completed() {
    let tasks = vec![
        task("1", Status::Completed),
        task("2", Status::Pending),
        task("3", Status::Completed),
        task("4", Status::Incomplete),
    ];
    assert_eq!(completion_percentage(&tasks), 50);
}

#[test]
fn test_rounds_to_nearest() {
    let one_of_three = vec![
        task("1", Status::Completed),
        task("2", Status::Pending),
        task("3", Status::Pending),
    ];
    assert_eq!(completion_percentage(&one_of_three), 33);

    let two_of_three = vec![
        task("1", Status::Completed),
        task("2", Status::Completed),
        task("3", Status::Incomplete),
    ];
    assert_eq!(completion_percentage(&two_of_three), 67);

    // 1/8 = 12.5 rounds up
    let mut one_of_eight = vec![task("0", Status::Completed)];
    one_of_eight.extend((1..8).map(|i| task(&i.to_string(), Status::Pending)));
    assert_eq!(completion_percentage(&one_of_eight), 13);
}

#[test]
fn test_bounds() {
    let none_done = vec![task("1", Status::Pending), task("2", Status::Incomplete)];
    assert_eq!(completion_percentage(&none_done), 0);

    let all_done = vec![task("1", Status::Completed), task("2", Status::Completed)];
    assert_eq!(completion_percentage(&all_done), 100);
}
