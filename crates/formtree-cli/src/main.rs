#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage CLI code.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # formtree
//!
//! Loads a JSON tree document, applies list and tab edits, and prints the
//! walked records, the nested submission, its YAML rendering, or the prefill
//! payload.
//!
//! ```bash
//! formtree submit form.json --add workers
//! formtree save form.json --add workers -o out/
//! ```

mod cli;
mod edit;
#[cfg(feature = "http")]
mod http;
mod sinks;

use std::fs;
use std::process::ExitCode;

use anyhow::{Context, Result};
use formtree::{Config, Form, Session};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Input};
use crate::sinks::{FileStore, PrintNavigator};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            debug!(path = %path.display(), "Loading config");
            Config::load(path).with_context(|| format!("failed to load {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn open(input: &Input, config: &Config) -> Result<Form> {
    let json = fs::read_to_string(&input.tree)
        .with_context(|| format!("failed to read {}", input.tree.display()))?;
    let mut form = Form::load(&json, config)
        .with_context(|| format!("invalid tree document {}", input.tree.display()))?
        .on_radio_cloned(edit::default_selection);
    input.apply(&mut form)?;
    Ok(form)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let form = open(cli.input(), &config)?;
    let mut session = Session::new(config);

    match &cli.command {
        Command::Walk {
            reverse,
            active_only,
            ..
        } => {
            let walk = form.walk()?;
            let mut records = if *active_only {
                walk.active_records()
            } else {
                walk.records()
            };
            if *reverse {
                records.reverse();
            }
            print_json(&records)?;
        }
        Command::Submit(_) => print_json(&form.submission()?)?,
        Command::Yaml(_) => print!("{}", form.yaml()?),
        Command::Prefill(_) => {
            let mut navigator = PrintNavigator::default();
            session.launch(&form, &mut navigator)?;
            debug!(target = ?navigator.target, "Prefill printed");
        }
        Command::Save { dir, .. } => {
            let mut store = FileStore::new(dir);
            session.save_local(&form, &mut store)?;
            if let Some(path) = store.written() {
                println!("{}", path.display());
            }
        }
        #[cfg(feature = "http")]
        Command::Check { url, .. } => {
            let mut transport = http::HttpTransport::new(url)?;
            let response = session.check(&form, &mut transport)?;
            print_json(&response)?;
        }
    }
    Ok(())
}
