// Sparktab new-tab engine library

pub mod assets;
pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod keywords;
pub mod logging;
pub mod quotes;
pub mod refresh;
pub mod store;
pub mod tab;
