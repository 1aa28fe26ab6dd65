use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use hiro_system_kit::{self, Logger};
use std::process;

mod classify;
mod config;
mod errors;
mod explain;
mod link;
mod style;

#[derive(Clone)]
pub struct Context {
    pub logger: Option<Logger>,
    pub tracer: bool,
}

#[allow(dead_code)]
impl Context {
    pub fn empty() -> Context {
        Context { logger: None, tracer: false }
    }

    pub fn try_log<F>(&self, closure: F)
    where
        F: FnOnce(&Logger),
    {
        if let Some(ref logger) = self.logger {
            closure(logger)
        }
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Opts {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Build the edges of a batch of configuration nodes and hints
    #[clap(name = "link", bin_name = "link")]
    Link(LinkCommand),
    /// Classify a module source string
    #[clap(name = "classify", bin_name = "classify")]
    Classify(ClassifySource),
    /// Describe an error code and how it is recovered from
    #[clap(name = "explain", bin_name = "explain")]
    Explain(ExplainErrorCode),
}

#[derive(ValueEnum, PartialEq, Eq, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct LinkCommand {
    /// Path to the batch document (.json, .yml or .yaml)
    pub input_path: String,
    /// Path to the configuration file, defaults to ./.iaclink.yml when present
    #[arg(long = "config", short = 'c')]
    pub config_path: Option<String>,
    /// Output format
    #[arg(long = "output", short = 'o', value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
    /// Drop edges whose confidence is below this value (0-100)
    #[arg(long = "min-confidence", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub min_confidence: Option<u8>,
    /// Build placeholder edges for unresolved includes, dependencies and inputs
    #[arg(long = "unresolved-edges", action = ArgAction::SetTrue)]
    pub unresolved_edges: bool,
    /// Derive synthetic node ids from the scan and the source, so repeated modules share a node
    #[arg(long = "deterministic-ids", action = ArgAction::SetTrue)]
    pub deterministic_ids: bool,
    /// Number ids sequentially instead of using random UUIDs
    #[arg(long = "sequential-ids", action = ArgAction::SetTrue)]
    pub sequential_ids: bool,
    /// Report dependency cycles among the created edges
    #[arg(long = "detect-cycles", action = ArgAction::SetTrue)]
    pub detect_cycles: bool,
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ClassifySource {
    /// Raw module source, e.g. git::https://example.com/vpc.git?ref=v1.0.0
    pub source: String,
    /// Print the parsed expression as JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ExplainErrorCode {
    /// Error code, e.g. UNKNOWN_BLOCK_TYPE
    #[arg(required_unless_present = "list")]
    pub code: Option<String>,
    /// List every known error code
    #[arg(long = "list", action = ArgAction::SetTrue)]
    pub list: bool,
    /// Print as JSON lines
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,
    /// Path to the configuration file holding the recovery options
    #[arg(long = "config", short = 'c')]
    pub config_path: Option<String>,
}

pub fn main() {
    let logger = hiro_system_kit::log::setup_logger();
    let _guard = hiro_system_kit::log::setup_global_logger(logger.clone());
    let ctx = Context { logger: Some(logger), tracer: false };

    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            println!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = handle_command(opts, &ctx) {
        ctx.try_log(|logger| error!(logger, "{e}"));
        std::thread::sleep(std::time::Duration::from_millis(500));
        process::exit(1);
    }
}

fn handle_command(opts: Opts, ctx: &Context) -> Result<(), String> {
    match opts.command {
        Command::Link(cmd) => link::handle_link_command(&cmd, ctx)?,
        Command::Classify(cmd) => classify::handle_classify_command(&cmd, ctx)?,
        Command::Explain(cmd) => explain::handle_explain_command(&cmd, ctx)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_link_default_values() {
        let cmd = LinkCommand::parse_from(vec!["link", "batch.json"]);
        assert_eq!(cmd.input_path, "batch.json");
        assert_eq!(cmd.config_path, None);
        assert_eq!(cmd.output, OutputFormat::Text);
        assert_eq!(cmd.min_confidence, None);
        assert!(!cmd.unresolved_edges);
        assert!(!cmd.deterministic_ids);
        assert!(!cmd.detect_cycles);
    }

    #[test]
    fn test_link_flags() {
        let cmd = LinkCommand::parse_from(vec![
            "link",
            "batch.yml",
            "--output",
            "json",
            "--min-confidence",
            "70",
            "--unresolved-edges",
            "-c",
            "ci.yml",
        ]);
        assert_eq!(cmd.output, OutputFormat::Json);
        assert_eq!(cmd.min_confidence, Some(70));
        assert!(cmd.unresolved_edges);
        assert_eq!(cmd.config_path.as_deref(), Some("ci.yml"));
    }

    #[test_case("101")]
    #[test_case("-1")]
    #[test_case("high")]
    fn test_min_confidence_out_of_range(value: &str) {
        assert!(LinkCommand::try_parse_from(vec!["link", "batch.json", "--min-confidence", value]).is_err());
    }

    #[test]
    fn test_subcommands() {
        let opts = Opts::parse_from(vec!["iaclink", "classify", "./modules/vpc", "--json"]);
        assert_eq!(opts.command, Command::Classify(ClassifySource { source: "./modules/vpc".into(), json: true }));

        let opts = Opts::parse_from(vec!["iaclink", "explain", "--list"]);
        assert!(matches!(opts.command, Command::Explain(ExplainErrorCode { code: None, list: true, .. })));

        assert!(Opts::try_parse_from(vec!["iaclink", "explain"]).is_err());
    }
}
