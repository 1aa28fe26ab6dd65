use std::str::FromStr;

use iaclink_core::kit::types::ErrorCode;
use iaclink_core::kit::IacError;
use iaclink_core::recovery::policy;
use iaclink_core::RecoveryOptions;
use serde_json::json;
use strum::IntoEnumIterator;

use super::config::CliConfig;
use super::errors::CliError;
use super::style::{paint, Tone};
use super::{Context, ExplainErrorCode};

pub fn handle_explain_command(cmd: &ExplainErrorCode, _ctx: &Context) -> Result<(), String> {
    let config = CliConfig::load(cmd.config_path.as_deref())?;
    print!("{}", render_explanation(cmd, &config.recovery)?);
    Ok(())
}

/// Accepts `UNKNOWN_BLOCK_TYPE` as well as `unknown_block_type`
pub fn parse_code(code: &str) -> Result<ErrorCode, CliError> {
    let normalized = code.trim().to_ascii_uppercase().replace('-', "_");
    ErrorCode::from_str(&normalized).map_err(|_| CliError::UnknownErrorCode(code.to_string()))
}

pub fn render_explanation(cmd: &ExplainErrorCode, recovery: &RecoveryOptions) -> Result<String, CliError> {
    let codes: Vec<ErrorCode> = match &cmd.code {
        Some(code) if !cmd.list => vec![parse_code(code)?],
        _ => ErrorCode::iter().collect(),
    };

    let mut out = String::new();
    for code in codes {
        let info = code.info();
        let action = policy::decide(&IacError::new(code, ""), recovery);
        if cmd.json {
            let entry = json!({
                "code": code,
                "category": info.category,
                "severity": info.severity,
                "recoverable": info.recoverable,
                "suggestion": info.suggestion,
                "recoveryAction": action,
            });
            out.push_str(&entry.to_string());
            out.push('\n');
        } else if cmd.list {
            out.push_str(&format!("{:<28} {:<22} {}\n", code.to_string(), info.category.to_string(), info.severity));
        } else {
            out.push_str(&format!("{} ({})\n", paint(Tone::Info, code), info.category));
            out.push_str(&format!("  severity     {}\n", info.severity));
            out.push_str(&format!("  recoverable  {}\n", info.recoverable));
            out.push_str(&format!("  on error     {}\n", action));
            out.push_str(&format!("  suggestion   {}\n", info.suggestion));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn explain(code: &str, json: bool) -> ExplainErrorCode {
        ExplainErrorCode { code: Some(code.into()), list: false, json, config_path: None }
    }

    #[test_case("UNKNOWN_BLOCK_TYPE", ErrorCode::UnknownBlockType)]
    #[test_case("self_referential_edge", ErrorCode::SelfReferentialEdge)]
    #[test_case("file-not-found", ErrorCode::FileNotFound)]
    fn test_parse_code(input: &str, expected: ErrorCode) {
        assert_eq!(parse_code(input).unwrap(), expected);
    }

    #[test]
    fn test_unknown_code() {
        assert!(matches!(parse_code("NOPE"), Err(CliError::UnknownErrorCode(_))));
    }

    #[test]
    fn test_explain_uses_recovery_options() {
        let out = render_explanation(&explain("UNKNOWN_BLOCK_TYPE", true), &RecoveryOptions::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["category"], "block");
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["recoveryAction"], "continue");

        let out = render_explanation(&explain("UNKNOWN_BLOCK_TYPE", true), &RecoveryOptions::strict()).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(value["recoveryAction"], "abort");
    }

    #[test]
    fn test_list_all_codes() {
        let cmd = ExplainErrorCode { code: None, list: true, json: false, config_path: None };
        let out = render_explanation(&cmd, &RecoveryOptions::default()).unwrap();
        assert_eq!(out.lines().count(), ErrorCode::iter().count());
        assert!(out.contains("INTERNAL_ERROR"));
    }
}
