pub mod api;
pub mod config;
pub mod coupon;
pub mod fake_feed;
pub mod http_client;
pub mod live_feed;
pub mod live_message;
pub mod live_store;
pub mod observer;
pub mod state;
