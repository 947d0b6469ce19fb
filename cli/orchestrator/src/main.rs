//! rpcgen binary
//!
//! Scaffolds a runnable RPC service project from a protocol definition.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

use clap::Parser;
use rpcgen_cli::Args;

fn main() {
    let args = Args::parse();
    if let Err(e) = rpcgen_cli::run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
