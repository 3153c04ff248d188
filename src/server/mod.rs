pub mod config;
pub mod telegram_poller;
