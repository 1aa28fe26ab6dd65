use iaclink_core::linker::is_external;
use iaclink_core::parse_source;

use super::errors::CliError;
use super::style::{paint, Tone};
use super::{ClassifySource, Context};

pub fn handle_classify_command(cmd: &ClassifySource, _ctx: &Context) -> Result<(), String> {
    print!("{}", render_classification(cmd)?);
    Ok(())
}

pub fn render_classification(cmd: &ClassifySource) -> Result<String, CliError> {
    let expression = parse_source(&cmd.source);
    if cmd.json {
        let json = serde_json::to_string_pretty(&expression).map_err(|e| CliError::Output(e.to_string()))?;
        return Ok(format!("{}\n", json));
    }

    let mut out = format!(
        "{} {} ({})\n",
        paint(Tone::Success, &expression.source_type),
        expression.raw,
        if is_external(&expression) { "external" } else { "local" }
    );
    let fields = [
        ("path", &expression.path),
        ("registry", &expression.registry),
        ("git url", &expression.git_url),
        ("ref", &expression.git_ref),
        ("subdir", &expression.subdir),
        ("version", &expression.version),
        ("bucket", &expression.bucket),
        ("http url", &expression.http_url),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            out.push_str(&format!("  {:<9} {}\n", label, value));
        }
    }
    Ok(out)
}
