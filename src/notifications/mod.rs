pub mod chat_registry;
pub mod models;
pub mod senders;
pub mod service;

pub use chat_registry::ChatRegistry;
pub use service::NotificationService;
