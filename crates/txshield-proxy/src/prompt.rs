//! The interactive yes/no gate for risky transactions.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Asks the operator whether a risky transaction may proceed.
#[async_trait]
pub trait Prompter: Send + Sync {
    async fn confirm(&self, rendered: &str) -> bool;
}

/// Prompts on the controlling terminal. "y"/"yes" forwards; anything else
/// (including EOF) blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompter;

#[async_trait]
impl Prompter for StdinPrompter {
    async fn confirm(&self, rendered: &str) -> bool {
        let mut stderr = tokio::io::stderr();
        let banner = format!("\n{rendered}\nForward this transaction? [y/N] ");
        if stderr.write_all(banner.as_bytes()).await.is_err() {
            return false;
        }
        let _ = stderr.flush().await;

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        }
    }
}
