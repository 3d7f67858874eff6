use std::fs;
use std::path::PathBuf;

use crate::session::User;

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "TASKBOARD_DB";
/// Environment variable setting the local user id.
pub const USER_ENV: &str = "TASKBOARD_USER";
/// Environment variable setting the local user's email.
pub const EMAIL_ENV: &str = "TASKBOARD_EMAIL";

/// Runtime settings, resolved from command-line flags first and the
/// environment second.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_path: PathBuf,
    pub user: User,
    pub log_level: String,
}

impl Config {
    pub fn resolve(db: Option<PathBuf>, user: Option<String>, email: Option<String>, log_level: String) -> Config {
        let db_path = db.unwrap_or_else(db_path);
        let mut log_path = db_path.clone();
        log_path.pop();
        log_path.push("taskboard.log");

        let uid = user
            .or_else(|| std::env::var(USER_ENV).ok())
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "local".to_string());
        let email = email
            .or_else(|| std::env::var(EMAIL_ENV).ok())
            .unwrap_or_else(|| format!("{}@localhost", uid));

        Config {
            db_path,
            log_path,
            user: User::new(uid, email),
            log_level,
        }
    }
}

/// Returns the path to the tasks database file (`tasks.json`).
///
/// The path is determined in the following order:
/// 1. `TASKBOARD_DB` environment variable.
/// 2. `~/.local/share/taskboard/tasks.json` (on Linux).
/// 3. `./tasks.json` (fallback).
pub fn db_path() -> PathBuf {
    std::env::var(DB_ENV).map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("taskboard");
        if !p.exists() {
            let _ = fs::create_dir_all(&p);
        }
        p.push("tasks.json");
        p
    })
}
