//! CLI surface, parsed with clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use txshield_proxy::OnRisk;
use txshield_types::{Chain, Recommendation};

#[derive(Parser, Debug)]
#[command(name = "txshield")]
#[command(about = "Pre-signature security scanner for EVM transactions")]
#[command(version)]
pub struct Cli {
    /// Suppress progress output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Verbose diagnostics on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a contract address or an unsigned calldata payload
    Scan(ScanArgs),
    /// Review a Safe transaction, decoding MultiSend batches
    Safe(SafeArgs),
    /// Review a token approval before signing it
    Approval(ApprovalArgs),
    /// Run the JSON-RPC interception proxy
    Proxy(ProxyArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Sarif,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Bare contract address to scan
    pub address: Option<String>,

    /// Calldata payload: raw hex, JSON, a JSON-RPC request, @file, or -
    #[arg(long)]
    pub calldata: Option<String>,

    /// Target address (with --data, or to override a payload's `to`)
    #[arg(long)]
    pub to: Option<String>,

    /// Sender address
    #[arg(long)]
    pub from: Option<String>,

    /// Value in wei (decimal or 0x hex)
    #[arg(long)]
    pub value: Option<String>,

    /// Raw calldata hex (alternative to --calldata)
    #[arg(long)]
    pub data: Option<String>,

    /// Chain name or numeric id
    #[arg(long)]
    pub chain: Option<Chain>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Exit 2 when the recommendation reaches this level
    #[arg(long, default_value = "warning")]
    pub fail_on: Recommendation,

    /// Block all outbound HTTP except configured RPC endpoints
    #[arg(long)]
    pub offline: bool,

    /// Alias of --offline
    #[arg(long)]
    pub rpc_only: bool,

    /// Skip simulation
    #[arg(long)]
    pub no_sim: bool,

    /// Write the report to a path, or - for stdout
    #[arg(long)]
    pub output: Option<String>,
}

#[derive(Args, Debug)]
pub struct SafeArgs {
    /// Chain name or numeric id
    pub chain: Chain,

    /// Safe transaction hash (identifies the reviewed payload)
    pub safe_tx_hash: String,

    /// Path to the Safe transaction JSON (as served by the Safe
    /// Transaction Service)
    #[arg(long)]
    pub safe_tx_json: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long, default_value = "warning")]
    pub fail_on: Recommendation,
}

#[derive(Args, Debug)]
pub struct ApprovalArgs {
    /// Token contract being approved
    #[arg(long)]
    pub token: String,

    /// Spender receiving the allowance
    #[arg(long)]
    pub spender: String,

    /// Allowance amount: an integer or `max`
    #[arg(long)]
    pub amount: String,

    /// The spender you intended; mismatches are flagged
    #[arg(long)]
    pub expected: Option<String>,

    #[arg(long, default_value = "ethereum")]
    pub chain: Chain,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long, default_value = "warning")]
    pub fail_on: Recommendation,
}

#[derive(Args, Debug)]
pub struct ProxyArgs {
    /// Upstream RPC endpoint wallets are really talking to
    #[arg(long, env = "TXSHIELD_UPSTREAM")]
    pub upstream: Option<String>,

    /// Record intercepted transactions under --record-dir
    #[arg(long)]
    pub save: bool,

    #[arg(long, default_value_t = 8545)]
    pub port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    pub hostname: String,

    /// Chain override when payloads carry no chain id
    #[arg(long)]
    pub chain: Option<Chain>,

    /// Scans at or above this recommendation are risky
    #[arg(long, default_value = "warning")]
    pub threshold: Recommendation,

    /// What to do with a risky transaction: block or prompt
    #[arg(long, default_value = "block")]
    pub on_risk: OnRisk,

    /// Where intercepted transactions are recorded
    #[arg(long, default_value = "./txshield-records")]
    pub record_dir: PathBuf,

    /// Degraded fast mode: tight provider budgets, 3s overall
    #[arg(long)]
    pub wallet: bool,

    /// Exit after the first handled request
    #[arg(long)]
    pub once: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_args_parse() {
        let cli = Cli::parse_from([
            "txshield", "scan", "--calldata", "0x095ea7b3", "--to",
            "0x00000000000000000000000000000000000000aa", "--chain", "base", "--format", "json",
            "--fail-on", "danger",
        ]);
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(args.chain, Some(Chain::Base));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.fail_on, Recommendation::Danger);
    }

    #[test]
    fn test_proxy_args_defaults() {
        let cli = Cli::parse_from(["txshield", "proxy", "--upstream", "http://localhost:8545"]);
        let Command::Proxy(args) = cli.command else {
            panic!("expected proxy");
        };
        assert_eq!(args.port, 8545);
        assert_eq!(args.threshold, Recommendation::Warning);
        assert_eq!(args.on_risk, OnRisk::Block);
        assert!(!args.wallet);
    }

    #[test]
    fn test_safe_args_positional() {
        let cli = Cli::parse_from(["txshield", "safe", "ethereum", "0xdeadbeef"]);
        let Command::Safe(args) = cli.command else {
            panic!("expected safe");
        };
        assert_eq!(args.chain, Chain::Ethereum);
        assert_eq!(args.safe_tx_hash, "0xdeadbeef");
    }
}
