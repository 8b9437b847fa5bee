pub mod autocomplete;
pub mod cache;
pub mod career;
pub mod config;
pub mod error;
pub mod espn;
pub mod fake_source;
pub mod game;
pub mod http_client;
pub mod model;
pub mod pool;
pub mod retry;
pub mod sampler;
pub mod service;
pub mod session;
pub mod source;
pub mod store;
pub mod streak;
