//! Small host-side utilities.

mod process;

pub use process::{command_matches, is_process_alive, kill_process};
