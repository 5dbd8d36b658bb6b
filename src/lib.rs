pub mod api;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod notifier;
pub mod schema;
pub mod signature;
pub mod store;
