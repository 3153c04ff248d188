pub mod admin_routes;
pub mod auth_routes;
pub mod chat_routes;
pub mod contact_routes;
pub mod telegram_routes;
