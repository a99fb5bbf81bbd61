pub mod adjudication;
pub mod admin;
pub mod auth;
pub mod ban;
pub mod bootstrap_owner;
pub mod content;
pub mod notification;
pub mod notification_queue;
pub mod policy;
pub mod report;
