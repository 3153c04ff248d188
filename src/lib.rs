#[macro_use]
extern crate rust_i18n;

// Load all translations from the locales directory
i18n!("locales", fallback = "en");

pub mod chat;
pub mod db;
pub mod notifications;
pub mod server;
pub mod services;
pub mod version;
pub mod web;
