//!
//! datashelf server binary
//! -----------------------
//! Command-line entry point for starting the datashelf HTTP server.
//! Supports configuration via CLI flags and environment variables.

use anyhow::Result;
use std::env;

fn parse_port_env(name: &str) -> Option<u16> {
    match env::var(name) {
        Ok(val) => val.parse::<u16>().ok(),
        Err(_) => None,
    }
}

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse::<u16>().ok();
        }
        i += 1;
    }
    None
}

fn parse_string_arg(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag {
            if i + 1 < args.len() {
                return Some(args[i + 1].clone());
            }
            break;
        }
        i += 1;
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber with env filter if provided
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new("info"))
                .unwrap(),
        )
        .try_init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("datashelf Server\n\nUSAGE:\n  datashelf_server [--http-port N] [--root PATH]\n\nOPTIONS:\n  --http-port N   HTTP API port (env: DATASHELF_HTTP_PORT, default 7980)\n  --root PATH     Storage root folder (env: DATASHELF_ROOT, default data)\n\nENVIRONMENT:\n  DATASHELF_SECRET   Secret key for path identifiers. When unset a random\n                     per-process key is used and ids do not survive restart.\n");
        return Ok(());
    }

    // Defaults
    let default_http: u16 = 7980;
    let default_root: &str = "data";

    // Environment variables, then CLI arguments override
    let env_http = parse_port_env("DATASHELF_HTTP_PORT");
    let env_root = env::var("DATASHELF_ROOT").ok();
    let secret = env::var("DATASHELF_SECRET").ok();

    let arg_http = parse_port_arg(&args, "--http-port");
    let arg_root = parse_string_arg(&args, "--root");

    let http_port = arg_http.or(env_http).unwrap_or(default_http);
    let root = arg_root.or(env_root).unwrap_or_else(|| default_root.to_string());

    println!("datashelf starting using port: http={}, root={}", http_port, root);
    tracing::info!("Using port: http={}, root={}", http_port, root);
    if secret.is_none() {
        println!("WARNING: DATASHELF_SECRET is not set; identifiers will not survive a restart.");
    }

    datashelf::server::run_with_port(http_port, &root, secret.as_deref()).await
}
