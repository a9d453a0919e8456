//! uibridge command-line tool.
//!
//! One-shot commands open a session, run a single tool and print a
//! `{ok, command, data|error}` envelope. `serve` exposes the same tools over
//! JSON-RPC for agents that keep a session open.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod rpc;
pub mod server;
