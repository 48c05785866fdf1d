pub mod archive;
pub mod cli;
pub mod collect;
pub mod load_config;
pub mod provider;
pub mod server;

pub use cli::{run, Cli, Commands};
