use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use http::{Method, Request};
use std::io::{self, Write};
use std::path::PathBuf;

use super::demo::demo_app;
use crate::config::AppConfig;
use crate::openapi::DocFormat;

/// Command-line interface for the bindery demo application
#[derive(Parser, Debug)]
#[command(name = "bindery", version)]
#[command(about = "Inspect and exercise the bindery demo API", long_about = None)]
pub struct Cli {
    /// Configuration file (YAML, JSON or TOML)
    #[arg(short, long, env = "BINDERY_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the OpenAPI document
    Spec {
        /// json or yaml; defaults to the configured docs format
        #[arg(short, long)]
        format: Option<DocFormat>,
    },
    /// Dispatch one request in process and print the response
    Call {
        /// Request target, path and query
        uri: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request header as `Name: value`, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short = 'd', long)]
        body: Option<String>,
    },
}

/// Run `cli`, writing results to stdout.
///
/// # Errors
///
/// Fails on configuration, registration or output errors.
pub fn run_cli(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli, &mut out)
}

/// Run `cli`, writing results to `out`.
///
/// # Errors
///
/// See [`run_cli`].
pub fn execute(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let app = demo_app(&config)?;
    let errors = app.errors();
    if let Some(first) = errors.first() {
        bail!("{} operation(s) failed to document, first: {}", errors.len(), first);
    }

    match cli.command {
        Commands::Spec { format } => {
            let generator = app.generator();
            match format.unwrap_or(config.docs.format) {
                DocFormat::Json => {
                    serde_json::to_writer_pretty(&mut *out, &generator.api())?;
                    writeln!(out)?;
                }
                DocFormat::Yaml => write!(out, "{}", generator.to_yaml()?)?,
            }
        }
        Commands::Call {
            uri,
            method,
            headers,
            body,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method '{}'", method))?;
            let mut request = Request::builder().method(method).uri(uri.as_str());
            for header in &headers {
                let Some((name, value)) = header.split_once(':') else {
                    bail!("invalid header '{}', expected 'Name: value'", header);
                };
                request = request.header(name.trim(), value.trim());
            }
            let request = request
                .body(body.unwrap_or_default().into_bytes())
                .with_context(|| format!("invalid request to '{}'", uri))?;

            let ctx = app.dispatch(request);
            writeln!(out, "HTTP {}", ctx.response_status())?;
            for (name, value) in ctx.response_headers() {
                writeln!(out, "{}: {}", name, value.to_str().unwrap_or("<binary>"))?;
            }
            writeln!(out)?;
            out.write_all(ctx.response_body())?;
            writeln!(out)?;
        }
    }
    Ok(())
}
