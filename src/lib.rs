pub mod app;
pub mod assignments;
pub mod auth;
pub mod config;
pub mod courses;
pub mod error;
pub mod extract;
pub mod logging;
pub mod response;
pub mod serde_util;
pub mod state;
