pub mod app;
pub mod callback;
pub mod config;
pub mod input;
pub mod router;

pub use config::Config;
