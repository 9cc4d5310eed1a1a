//! Persistence of a finished crawl.
//!
//! Everything here is pure serialization of a [`CrawlOutcome`]: it runs once,
//! after the crawler has returned, and a failure never invalidates the crawl
//! itself.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::{info, warn};
use crate::data::{Database, SessionStatus};
use trawl_scanner::CrawlOutcome;

pub const RECORDS_FILE: &str = "discovered.json";
pub const GRAPH_JSON_FILE: &str = "graph.json";
pub const GRAPH_DOT_FILE: &str = "graph.dot";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Graph rendering failed: {0}")]
    Render(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Clone)]
pub struct SinkOptions {
    pub output_dir: PathBuf,
    /// Also render the graph to an image with Graphviz.
    pub render: bool,
    pub render_format: String,
    pub dot_command: String,
}

impl SinkOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            render: false,
            render_format: "png".to_string(),
            dot_command: "dot".to_string(),
        }
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }
}

/// Where the sink put things.
#[derive(Debug, Clone, Default)]
pub struct PersistReport {
    pub records_path: PathBuf,
    pub graph_json_path: PathBuf,
    pub graph_dot_path: PathBuf,
    pub image_path: Option<PathBuf>,
    /// Set when rendering was requested but the renderer failed. The other
    /// outputs are still complete.
    pub render_error: Option<String>,
}

/// Node-link graph document (the layout networkx and d3 read).
#[derive(Debug, Clone, Serialize)]
pub struct GraphExport<'a> {
    pub directed: bool,
    pub multigraph: bool,
    pub graph: GraphMeta<'a>,
    pub nodes: Vec<GraphNode<'a>>,
    pub links: Vec<GraphLink<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphMeta<'a> {
    pub seed: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphNode<'a> {
    pub id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphLink<'a> {
    pub source: &'a str,
    pub target: &'a str,
}

pub fn graph_export(outcome: &CrawlOutcome) -> GraphExport<'_> {
    let nodes = outcome
        .graph
        .nodes()
        .into_iter()
        .map(|url| {
            let record = outcome.records.get(url);
            GraphNode {
                id: url,
                status_code: record.map(|r| r.status_code),
                content_type: record.and_then(|r| r.content_type.as_deref()),
                depth: record.map(|r| r.depth),
            }
        })
        .collect();

    let links = outcome
        .graph
        .edges()
        .into_iter()
        .map(|(source, target)| GraphLink { source, target })
        .collect();

    GraphExport {
        directed: true,
        multigraph: false,
        graph: GraphMeta {
            seed: &outcome.seed,
        },
        nodes,
        links,
    }
}

/// Write the record map, the node-link graph and the DOT graph into
/// `options.output_dir`, then optionally render an image.
pub fn persist(outcome: &CrawlOutcome, options: &SinkOptions) -> Result<PersistReport, PersistError> {
    let dir = &options.output_dir;
    fs::create_dir_all(dir).map_err(|source| PersistError::Io {
        path: dir.clone(),
        source,
    })?;

    let records_path = dir.join(RECORDS_FILE);
    write_file(
        &records_path,
        &serde_json::to_string_pretty(&outcome.records)?,
    )?;

    let graph_json_path = dir.join(GRAPH_JSON_FILE);
    write_file(
        &graph_json_path,
        &serde_json::to_string_pretty(&graph_export(outcome))?,
    )?;

    let graph_dot_path = dir.join(GRAPH_DOT_FILE);
    write_file(&graph_dot_path, &outcome.graph.to_dot())?;

    info!(
        "Wrote {} record(s) and {} edge(s) to {}",
        outcome.records.len(),
        outcome.graph.edge_count(),
        dir.display()
    );

    let mut report = PersistReport {
        records_path,
        graph_json_path,
        graph_dot_path,
        ..Default::default()
    };

    if options.render {
        let image_path = dir.join(format!("graph.{}", options.render_format));
        match render_graph(
            &report.graph_dot_path,
            &image_path,
            &options.render_format,
            &options.dot_command,
        ) {
            Ok(()) => report.image_path = Some(image_path),
            Err(e) => {
                warn!("{}", e);
                report.render_error = Some(e.to_string());
            }
        }
    }

    Ok(report)
}

/// Store `outcome` in an open SQLite session and close the session.
pub fn archive(db: &Database, session_id: &str, outcome: &CrawlOutcome) -> Result<(), PersistError> {
    let (nodes, edges) = match db.insert_outcome(session_id, outcome) {
        Ok(counts) => counts,
        Err(e) => {
            mark_session_failed(db, session_id);
            return Err(e.into());
        }
    };

    let status = if outcome.stats.cancelled {
        SessionStatus::Cancelled
    } else {
        SessionStatus::Completed
    };
    db.finish_session(session_id, status)?;

    info!(
        "Archived session {} ({} nodes, {} edges)",
        session_id, nodes, edges
    );
    Ok(())
}

/// Close a session as failed after an earlier error. A second failure here
/// is logged rather than returned so the original error reaches the caller.
pub fn mark_session_failed(db: &Database, session_id: &str) {
    if let Err(e) = db.finish_session(session_id, SessionStatus::Failed) {
        warn!("Could not mark session {} as failed: {}", session_id, e);
    }
}

/// Run Graphviz on a DOT file.
pub fn render_graph(
    dot_path: &Path,
    image_path: &Path,
    format: &str,
    dot_command: &str,
) -> Result<(), PersistError> {
    let output = Command::new(dot_command)
        .arg(format!("-T{}", format))
        .arg(dot_path)
        .arg("-o")
        .arg(image_path)
        .output()
        .map_err(|e| PersistError::Render(format!("could not run '{}': {}", dot_command, e)))?;

    if !output.status.success() {
        return Err(PersistError::Render(format!(
            "'{}' exited with {}: {}",
            dot_command,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), PersistError> {
    fs::write(path, contents).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}
