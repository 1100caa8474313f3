//! HTTP request handlers, organized by resource.

pub mod health;
pub mod listings;
pub mod orders;
pub mod websocket;

pub use health::health_check;
