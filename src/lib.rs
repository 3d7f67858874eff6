pub mod access;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod notify;
pub mod progress;
pub mod session;
pub mod storage;
pub mod store;
pub mod subscription;
pub mod tui;
