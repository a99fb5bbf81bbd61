pub mod admin;
pub mod auth;
pub mod notification;
pub mod report;

pub use auth::*;
