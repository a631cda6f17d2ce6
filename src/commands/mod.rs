pub mod cli;

pub use cli::CliHandler;
