pub mod cli;

pub use cli::{normalise_args, run, Cli};
