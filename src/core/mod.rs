pub mod admin;
pub mod announcements;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod fanout;
pub mod model;
pub mod platform;
pub mod roles;
pub mod router;
pub mod subscriptions;
pub mod template;
