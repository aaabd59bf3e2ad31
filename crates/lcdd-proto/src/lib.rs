//! Command dispatch and central server state (§4.2/§4.5/§4.7/§4.8).
//!
//! [`Server`] is the one process-wide aggregate; [`commands::build_table`]
//! wires every command keyword to its handler; [`dispatch::dispatch_line`]
//! is what the connection loop in `lcdd-bin` calls per incoming line.

mod args;
pub mod commands;
pub mod dispatch;
mod outcome;
mod server;

pub use dispatch::{dispatch_line, CommandHandler, CommandTable};
pub use outcome::DispatchOutcome;
pub use server::{Server, CLIENT_OUT_CAPACITY, PROTOCOL_MAJOR, PROTOCOL_MINOR, SERVER_NAV_KEYS, SERVER_VERSION};
