// Module exports for CLI subcommands
//
// Each module handles a group of related subcommands. main.rs only parses
// arguments and dispatches here.

pub mod curate;
pub mod route;
pub mod sync;
