//! txshield CLI entrypoint.
//!
//! Subcommands:
//! - `scan` - scan a contract address or an unsigned calldata payload
//! - `approval` - review a token approval before signing it
//! - `safe` - review a Safe transaction, decoding MultiSend batches
//! - `proxy` - run the JSON-RPC interception proxy a wallet points at
//!
//! Exit codes: 0 clean, 1 usage or operational error, 2 a finding at or
//! above `--fail-on`.

mod cli;
mod commands;
mod input;
mod output;
mod run;
mod signals;

use std::process;

use crate::run::run;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("{error}");
            process::exit(1);
        }
    }
}
