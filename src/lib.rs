pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod filter;
pub mod handlers;
pub mod import;
pub mod middleware;
pub mod routes;
pub mod schema;
pub mod services;
pub mod state;
