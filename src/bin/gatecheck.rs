//! Gantry gate checker
//!
//! Thin command-line adapter over the admission gate: loads a policy file,
//! evaluates a single request or instance descriptor, prints the decision,
//! and reports it through the exit status (0 allow, 1 deny, 2 usage or
//! configuration error). Host integrations that cannot link the library
//! shell out to this binary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gantry_rs::{Gate, InstanceDescriptor, RequestDescriptor, TagMap};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "gatecheck")]
#[command(about = "Evaluate the imaging-archive admission gate for one request or instance")]
struct Args {
    /// Path to the policy file (.json or .toml)
    #[arg(short = 'p', long)]
    policy: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the request authorization filter
    Request {
        /// HTTP verb
        #[arg(short = 'm', long, default_value = "GET")]
        method: String,

        /// Request URI (path plus query)
        #[arg(short = 'u', long)]
        uri: String,

        /// Authenticated identity (empty for anonymous)
        #[arg(short = 'i', long, default_value = "")]
        identity: String,

        /// Source address of the call
        #[arg(short = 's', long, default_value = "127.0.0.1")]
        source: String,

        /// Header pair, NAME=VALUE (repeatable)
        #[arg(long = "header", value_parser = parse_pair)]
        headers: Vec<(String, String)>,
    },

    /// Evaluate the instance admission filter
    Instance {
        /// Metadata tag, NAME=VALUE (repeatable)
        #[arg(short = 't', long = "tag", value_parser = parse_pair)]
        tags: Vec<(String, String)>,

        /// Submission source descriptor
        #[arg(short = 'o', long, default_value = "gatecheck")]
        origin: String,

        /// Auxiliary context entry, NAME=VALUE (repeatable)
        #[arg(long = "aux", value_parser = parse_pair)]
        auxiliary: Vec<(String, String)>,
    },
}

/// Parse a NAME=VALUE pair from the CLI
fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

fn run(args: Args) -> Result<bool> {
    let gate = Gate::from_file(&args.policy)
        .with_context(|| format!("cannot load policy from {:?}", args.policy))?;

    let allow = match args.command {
        Command::Request {
            method,
            uri,
            identity,
            source,
            headers,
        } => {
            let mut request = RequestDescriptor::new(&method, uri, source, identity);
            request.headers = headers;

            let decision = gate.evaluate_request(&request);
            if decision.allow {
                println!("allow ({:?})", decision.rule);
            } else {
                println!("deny: {}", decision.reason);
            }
            decision.allow
        }
        Command::Instance {
            tags,
            origin,
            auxiliary,
        } => {
            let instance = InstanceDescriptor {
                tags: tags.into_iter().collect::<TagMap>(),
                origin,
                auxiliary: auxiliary.into_iter().collect::<TagMap>(),
            };

            let decision = gate.evaluate_instance(&instance);
            println!("{}", decision.message);
            decision.allow
        }
    };

    Ok(allow)
}

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("gatecheck: {:#}", e);
            ExitCode::from(2)
        }
    }
}
