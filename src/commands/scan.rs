//! `txshield scan`: the one-shot scan surface.

use txshield_analyzer::{AnalyzeOptions, AnalyzePolicy, Analyzer};
use txshield_types::{AppConfig, CalldataInput, Chain};

use crate::cli::{OutputFormat, ScanArgs};
use crate::commands::{build_http_client, write_report};
use crate::input::{self, InputOverrides};
use crate::output;

pub async fn run(args: ScanArgs, config: AppConfig) -> Result<i32, Box<dyn std::error::Error>> {
    let overrides = InputOverrides {
        to: args.to.clone(),
        from: args.from.clone(),
        value: args.value.clone(),
        chain: args.chain,
    };

    let input = if let Some(calldata) = args.calldata.as_deref() {
        input::parse_calldata(calldata, &overrides)?
    } else if args.data.is_some() || args.to.is_some() {
        input::from_flags(args.data.as_deref(), &overrides)?
    } else if let Some(address) = args.address.as_deref() {
        let to = address
            .parse()
            .map_err(|_| format!("invalid address {address:?}"))?;
        CalldataInput::address_only(to, args.chain)
    } else {
        return Err("nothing to scan: pass an address, --calldata, or --to/--data".into());
    };

    let chain = input.chain.or(args.chain).unwrap_or(Chain::Ethereum);
    let offline = args.offline || args.rpc_only;
    let client = build_http_client(&config, offline, None);
    let analyzer = Analyzer::new(config, client);

    let options = AnalyzeOptions {
        policy: AnalyzePolicy::Default,
        simulate: !args.no_sim,
    };
    let result = analyzer.analyze(&input, chain, options, None).await;

    let rendered = match args.format {
        OutputFormat::Text => output::render_text(&result),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&output::render_json(&input, &result))?
        }
        OutputFormat::Sarif => serde_json::to_string_pretty(&output::render_sarif(&result))?,
    };
    write_report(args.output.as_deref(), &rendered)?;

    Ok(output::exit_code(result.recommendation, args.fail_on))
}
