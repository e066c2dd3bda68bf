pub mod amount;
pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod filter;
pub mod http_client;
pub mod logging;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod types;
