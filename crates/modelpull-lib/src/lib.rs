pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod listing;
pub mod plan;
pub mod utils;

pub use config::Config;
pub use error::ModelPullError;
