//! Property booking backend: accounts, catalog, room search, and atomic
//! multi-room bookings with payment records, served over HTTP with axum.

pub mod auth;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod schema;
pub mod state;
pub mod users;

pub use routes::router;
pub use state::AppState;
