pub mod admin;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod notify;
pub mod seed;
pub mod state;
pub mod users;
