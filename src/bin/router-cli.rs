use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use constraint_router::config::{compile_routes, load_config};
use constraint_router::routing::{parse_method, Constraints, RequestContext};

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Offline checks and lookups against a router configuration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config and print its route table
    Check {
        config: PathBuf,
    },
    /// Resolve one request against a config
    Find {
        config: PathBuf,
        method: String,
        path: String,
        /// Explicit constraint value, as name=value
        #[arg(long = "set", value_parser = parse_pair)]
        values: Vec<(String, String)>,
        /// Request header, as name=value
        #[arg(long = "header", value_parser = parse_pair)]
        headers: Vec<(String, String)>,
        /// Request host
        #[arg(long)]
        host: Option<String>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            let compiled = compile_routes(&config)?;
            let routes: Vec<_> = compiled
                .definitions
                .iter()
                .map(|d| {
                    json!({
                        "name": d.handler.name,
                        "method": d.method.as_str(),
                        "path": d.path,
                        "constraints": d.constraints,
                    })
                })
                .collect();
            let report = json!({
                "ok": true,
                "strategies": compiled.registry.names(),
                "fallback": compiled.options.fallback,
                "routes": routes,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Find {
            config,
            method,
            path,
            values,
            headers,
            host,
        } => {
            let config = load_config(&config)?;
            let router = compile_routes(&config)?.build()?;
            let method = parse_method(&method)?;

            let values: Constraints = values.into_iter().collect();
            let mut ctx = RequestContext::new();
            if let Some(host) = host {
                ctx = ctx.with_host(host);
            }
            for (name, value) in headers {
                ctx = ctx.with_header(&name, value);
            }

            let report = match router.lookup(&method, &path, &values, Some(&ctx))? {
                Some(target) => json!({ "matched": true, "route": target }),
                None => json!({ "matched": false }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
