//! `txshield approval`: review a token approval before signing it.

use alloy_primitives::{Address, U256};
use txshield_analyzer::{AnalyzeOptions, Analyzer};
use txshield_types::AppConfig;

use crate::cli::{ApprovalArgs, OutputFormat};
use crate::commands::{build_http_client, write_report};
use crate::output;

pub async fn run(args: ApprovalArgs, config: AppConfig) -> Result<i32, Box<dyn std::error::Error>> {
    let token: Address = args
        .token
        .parse()
        .map_err(|_| format!("invalid token address {:?}", args.token))?;
    let spender: Address = args
        .spender
        .parse()
        .map_err(|_| format!("invalid spender address {:?}", args.spender))?;
    let expected: Option<Address> = match args.expected.as_deref() {
        Some(expected) => Some(
            expected
                .parse()
                .map_err(|_| format!("invalid expected address {expected:?}"))?,
        ),
        None => None,
    };
    let amount = if args.amount.eq_ignore_ascii_case("max") {
        U256::MAX
    } else {
        txshield_types::parse_quantity(&args.amount)
            .map_err(|_| format!("invalid amount {:?}", args.amount))?
    };

    let client = build_http_client(&config, false, None);
    let analyzer = Analyzer::new(config, client);
    let result = analyzer
        .analyze_approval(
            token,
            spender,
            amount,
            expected,
            args.chain,
            AnalyzeOptions::default(),
        )
        .await;

    let input = txshield_types::CalldataInput::address_only(spender, Some(args.chain));
    let rendered = match args.format {
        OutputFormat::Text => output::render_text(&result),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&output::render_json(&input, &result))?
        }
        OutputFormat::Sarif => serde_json::to_string_pretty(&output::render_sarif(&result))?,
    };
    write_report(None, &rendered)?;

    Ok(output::exit_code(result.recommendation, args.fail_on))
}
