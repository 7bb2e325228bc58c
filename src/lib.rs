pub mod api;
pub mod app;
pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod session;
pub mod tasks;
pub mod ui;
