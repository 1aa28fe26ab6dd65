use std::path::Path;
use std::sync::Arc;

use iaclink_core::kit::{IdGenerator, SequentialIdGenerator};
use iaclink_core::{
    EdgeBatch, EdgeCreationContext, EdgeCreationResult, EdgeGraph, EdgeService, EdgeType,
    SyntheticIdStrategy,
};
use serde::{Deserialize, Serialize};

use super::config::CliConfig;
use super::errors::CliError;
use super::style::{self, paint, Tone};
use super::{Context, LinkCommand, OutputFormat};

/// Input document of `iaclink link`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkBatch {
    pub context: EdgeCreationContext,
    #[serde(flatten)]
    pub batch: EdgeBatch,
}

impl LinkBatch {
    /// JSON unless the path ends in `.yml` or `.yaml`
    pub fn parse(path: &str, contents: &str) -> Result<LinkBatch, CliError> {
        let is_yaml = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yml") || e.eq_ignore_ascii_case("yaml"))
            .unwrap_or(false);
        if is_yaml {
            serde_yml::from_str(contents).map_err(|e| CliError::Parse {
                path: path.to_string(),
                format: "yaml",
                message: e.to_string(),
            })
        } else {
            serde_json::from_str(contents).map_err(|e| CliError::Parse {
                path: path.to_string(),
                format: "json",
                message: e.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkReport {
    #[serde(flatten)]
    pub result: EdgeCreationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_cycles: Option<Vec<Vec<String>>>,
}

pub fn handle_link_command(cmd: &LinkCommand, ctx: &Context) -> Result<(), String> {
    let config = CliConfig::load(cmd.config_path.as_deref())?;
    let contents = std::fs::read_to_string(&cmd.input_path)
        .map_err(|source| CliError::Read { path: cmd.input_path.clone(), source })?;
    let link_batch = LinkBatch::parse(&cmd.input_path, &contents)?;

    let report = run_link(cmd, config, link_batch)?;
    ctx.try_log(|logger| {
        info!(
            logger,
            "{} linked: {} edges, {} synthetic nodes, {} unresolved",
            cmd.input_path,
            report.result.statistics.total_edges,
            report.result.statistics.synthetic_node_count,
            report.result.statistics.unresolved_count
        )
    });
    if let Some(cycles) = &report.dependency_cycles {
        for cycle in cycles {
            ctx.try_log(|logger| warn!(logger, "dependency cycle: {}", cycle.join(" -> ")));
        }
    }

    match cmd.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(|e| CliError::Output(e.to_string()))?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", render_summary(&report)),
    }
    Ok(())
}

/// Flags override the configuration file
pub fn run_link(cmd: &LinkCommand, mut config: CliConfig, link_batch: LinkBatch) -> Result<LinkReport, CliError> {
    if let Some(threshold) = cmd.min_confidence {
        config.edges = config.edges.with_min_confidence(threshold);
    }
    if cmd.unresolved_edges {
        config.edges = config.edges.with_unresolved_edges(true);
    }
    if cmd.deterministic_ids {
        config.edges = config.edges.with_synthetic_ids(SyntheticIdStrategy::Deterministic);
    }

    let LinkBatch { mut context, batch } = link_batch;
    if cmd.sequential_ids {
        let generator: Arc<dyn IdGenerator> = Arc::new(SequentialIdGenerator::new(context.scan_id.clone()));
        context = context.with_id_generator(generator);
    }

    let result = EdgeService::new(config.edges).create_edges(&batch, &context)?;
    let dependency_cycles = cmd
        .detect_cycles
        .then(|| EdgeGraph::from_edges(&result.edges).dependency_cycles());
    Ok(LinkReport { result, dependency_cycles })
}

pub fn render_summary(report: &LinkReport) -> String {
    let statistics = &report.result.statistics;
    let mut out = String::new();
    out.push_str(&format!(
        "{} {} ({} includes, {} depends_on, {} passes_input, {} sources)\n",
        paint(Tone::Success, "linked"),
        style::count(statistics.total_edges, "edge"),
        statistics.count(EdgeType::Includes),
        statistics.count(EdgeType::DependsOn),
        statistics.count(EdgeType::PassesInput),
        statistics.count(EdgeType::Sources),
    ));
    for (source_type, count) in statistics.edges_by_source_type.iter() {
        out.push_str(&format!("  {:<10} {}\n", source_type.to_string(), count));
    }
    out.push_str(&format!(
        "{} {}, average confidence {:.1}\n",
        paint(Tone::Info, "created"),
        style::count(statistics.synthetic_node_count, "synthetic node"),
        statistics.average_confidence
    ));
    if statistics.filtered_out_count > 0 {
        out.push_str(&format!(
            "{} {} below the confidence threshold\n",
            paint(Tone::Warning, "dropped"),
            style::count(statistics.filtered_out_count, "edge")
        ));
    }
    for reference in report.result.unresolved_references.iter() {
        out.push_str(&format!(
            "{} {} {} -> {}: {}\n",
            paint(Tone::Warning, "unresolved"),
            reference.reference_type,
            reference.source_node_id,
            reference.target_path,
            reference.reason
        ));
    }
    if let Some(cycles) = &report.dependency_cycles {
        for cycle in cycles {
            out.push_str(&format!("{} {}\n", paint(Tone::Failure, "cycle"), cycle.join(" -> ")));
        }
    }
    out
}
