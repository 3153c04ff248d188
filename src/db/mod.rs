pub mod models;
pub mod user_store;

pub use user_store::{UserStore, UserStoreError};
