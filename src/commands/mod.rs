//! Subcommand implementations.

pub mod approval;
pub mod proxy;
pub mod safe;
pub mod scan;

use txshield_analyzer::{HttpClient, OfflineGuard};
use txshield_types::AppConfig;
use url::Url;

/// Builds the HTTP client every outbound call goes through. With
/// `offline`, only the configured RPC endpoints (and localhost) are
/// reachable; everything else fails before dispatch.
pub fn build_http_client(config: &AppConfig, offline: bool, extra: Option<&Url>) -> HttpClient {
    if !offline {
        return HttpClient::new();
    }
    let mut allowed: Vec<Url> = config
        .rpc_urls
        .values()
        .filter_map(|url| Url::parse(url).ok())
        .collect();
    if let Some(extra) = extra {
        allowed.push(extra.clone());
    }
    HttpClient::guarded(OfflineGuard::new(allowed, true))
}

/// Writes a rendered report to `--output` (a path, or `-`/absent for
/// stdout).
pub fn write_report(output: Option<&str>, rendered: &str) -> std::io::Result<()> {
    match output {
        Some("-") | None => {
            println!("{rendered}");
            Ok(())
        }
        Some(path) => std::fs::write(path, rendered),
    }
}
