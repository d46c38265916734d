pub mod announcer;
pub mod config;
pub mod webhooks;
