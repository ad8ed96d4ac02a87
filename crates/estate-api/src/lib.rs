pub mod activity;
pub mod auth;
pub mod buyers;
pub mod chat;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod profile;
pub mod properties;
pub mod routes;
pub mod sellers;
pub mod uploads;
mod validate;
