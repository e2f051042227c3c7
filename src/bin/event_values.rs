// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line inspector for event-value manifests
//!
//! Loads a JSON manifest, then either dumps the resulting provider lists or
//! resolves a single query against them.

use std::fs;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use event_values::{EventValueRegistry, JsonOccurrence, Manifest, TimeState, TypeName};

#[derive(Parser)]
#[command(name = "event-values")]
#[command(about = "Inspect typed event-value registries built from JSON manifests")]
#[command(version)]
#[command(author = "OctoFHIR Team <funyloony@gmail.com>")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every registered provider in resolution order
    Dump {
        /// Manifest file
        #[arg(short, long)]
        manifest: String,
        /// Print a JSON snapshot instead of text
        #[arg(long)]
        json: bool,
    },
    /// Resolve a value type for an occurrence kind
    Resolve {
        /// Manifest file
        #[arg(short, long)]
        manifest: String,
        /// Occurrence kind, e.g. "Move"
        #[arg(short, long)]
        occurrence: String,
        /// Requested value type, e.g. "Location"
        #[arg(short = 't', long = "type")]
        value_type: String,
        /// Time state: past, present or future
        #[arg(long, default_value = "present")]
        time: TimeState,
        /// JSON payload of an occurrence to read the value from
        #[arg(short, long)]
        payload: Option<String>,
    },
}

fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn load_registry(path: &str) -> Result<EventValueRegistry> {
    let source =
        fs::read_to_string(path).with_context(|| format!("reading manifest '{path}'"))?;
    let manifest = Manifest::from_json(&source)?;
    let mut registry = manifest.build_registry()?;
    registry.close_registrations();
    Ok(registry)
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Dump { manifest, json } => {
            let registry = load_registry(&manifest)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&registry.snapshot())?);
            } else {
                println!("{}", registry.debug_dump());
            }
        }
        Commands::Resolve {
            manifest,
            occurrence,
            value_type,
            time,
            payload,
        } => {
            let registry = load_registry(&manifest)?;
            handle_resolve(&registry, &occurrence, &value_type, time, payload.as_deref())?;
        }
    }
    Ok(())
}

fn handle_resolve(
    registry: &EventValueRegistry,
    occurrence: &str,
    value_type: &str,
    time: TimeState,
    payload: Option<&str>,
) -> Result<()> {
    let occurrence_type = TypeName::new(occurrence);
    let value_type = TypeName::new(value_type);

    let Some(getter) = registry.resolve(&occurrence_type, &value_type, time)? else {
        println!("{occurrence_type}#{value_type} is not defined at {time}");
        return Ok(());
    };

    println!(
        "{occurrence_type}#{value_type} at {time}: {} via {} (from {} providers)",
        getter.provider(),
        getter.phase(),
        getter.time()
    );
    if registry.has_time_states(&occurrence_type, &value_type) {
        println!("past/future values available");
    }

    if let Some(payload) = payload {
        let json = serde_json::from_str(payload).context("parsing --payload")?;
        let event = JsonOccurrence::new(occurrence_type.clone(), json);
        match getter.get(&event) {
            Some(value) => match value.as_json() {
                Some(json) => println!("{} = {json}", value.type_name()),
                None => println!("{value:?}"),
            },
            None => println!("no value"),
        }
    }
    Ok(())
}
