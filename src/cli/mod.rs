//! # CLI Module
//!
//! Command-line access to the demo application: print its OpenAPI document
//! or push one request through it in process.
//!
//! ## Commands
//!
//! ### `spec`
//!
//! ```bash
//! bindery spec --format yaml
//! ```
//!
//! ### `call`
//!
//! ```bash
//! bindery call -X POST /api/ping/abc?query1=xyz \
//!     -H 'X-Header-1: h' -d '{"body_string": "hi"}'
//! ```
//!
//! Both commands accept `--config <FILE>` (or `BINDERY_CONFIG`) naming an
//! [`AppConfig`](crate::config::AppConfig) file.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use bindery::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;
mod demo;


pub use commands::{execute, run_cli, Cli, Commands};
pub use demo::{demo_app, PingInput, PingOutput};
