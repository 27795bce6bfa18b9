pub mod cli;
mod listing;
mod prompt;
