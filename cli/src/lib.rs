//! QuickRead CLI library: input handling and the `run`, `chunk`, `limits` and `history`
//! commands, writing to any `Write` so they can be driven from tests.
//!
//! The binary (`src/main.rs`) parses arguments, initializes logging and wires Ctrl-C to the
//! task's cancellation token.

mod commands;
mod error;

pub use commands::{
    build_request, chunk_command, history_command, limits_command, read_input, run_command,
    InputSource, TaskArgs,
};
pub use error::CliError;
