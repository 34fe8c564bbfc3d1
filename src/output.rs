use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::Path;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::index::{BuildReport, DependencyEdge, DependencyIndex};
use crate::span::Position;

// ---------------------------------------------------------------------------
// JSON wire shape
// ---------------------------------------------------------------------------

/// `{ line, character }`, both zero-based, as editors exchange positions.
#[derive(Debug, Serialize, PartialEq)]
pub struct JsonPosition {
    pub line: usize,
    pub character: usize,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct JsonLocation {
    pub start: JsonPosition,
    pub end: JsonPosition,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct JsonEdge {
    pub filepath: String,
    pub location: JsonLocation,
}

impl From<Position> for JsonPosition {
    fn from(pos: Position) -> Self {
        Self {
            line: pos.line,
            character: pos.column,
        }
    }
}

impl From<&DependencyEdge> for JsonEdge {
    fn from(edge: &DependencyEdge) -> Self {
        Self {
            filepath: edge.filepath.to_string_lossy().into_owned(),
            location: JsonLocation {
                start: edge.location.start.into(),
                end: edge.location.end.into(),
            },
        }
    }
}

/// The index as a `url -> [edge]` map ready for `serde_json`.
pub fn to_json_map(index: &DependencyIndex) -> BTreeMap<&str, Vec<JsonEdge>> {
    index
        .iter()
        .map(|(url, edges)| (url, edges.iter().map(JsonEdge::from).collect()))
        .collect()
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

fn relative<'a>(path: &'a Path, project_root: &Path) -> std::borrow::Cow<'a, str> {
    path.strip_prefix(project_root)
        .unwrap_or(path)
        .to_string_lossy()
}

/// Format and print the dependency tree to stdout according to the selected
/// output format. Human formats print one-based `line:col`; JSON keeps the
/// zero-based positions.
pub fn format_tree(report: &BuildReport, format: &OutputFormat, project_root: &Path) {
    let index = &report.index;
    match format {
        OutputFormat::Compact => {
            for (url, edges) in index.iter() {
                println!("{url}");
                for edge in edges {
                    println!(
                        "  {}:{}",
                        relative(&edge.filepath, project_root),
                        edge.location
                    );
                }
            }
            println!(
                "{} remote modules, {} references",
                index.len(),
                index.edge_count()
            );
        }

        OutputFormat::Table => {
            let use_color = std::io::stdout().is_terminal();

            let url_w = index.iter().map(|(u, _)| u.len()).max().unwrap_or(3).max(3);
            let file_w = index
                .iter()
                .flat_map(|(_, edges)| edges.iter())
                .map(|e| relative(&e.filepath, project_root).len())
                .max()
                .unwrap_or(4)
                .max(4);

            let header = format!(
                "{:<url_w$}  {:<file_w$}  {:<10}  {}",
                "URL",
                "FILE",
                "LINE:COL",
                "KIND",
                url_w = url_w,
                file_w = file_w,
            );
            if use_color {
                println!("\x1b[1m{header}\x1b[0m");
            } else {
                println!("{header}");
            }
            println!("{}", "-".repeat(url_w + file_w + 25));

            for (url, edges) in index.iter() {
                for edge in edges {
                    println!(
                        "{:<url_w$}  {:<file_w$}  {:<10}  {}",
                        url,
                        relative(&edge.filepath, project_root),
                        edge.location.to_string(),
                        edge.kind,
                        url_w = url_w,
                        file_w = file_w,
                    );
                }
            }
        }

        OutputFormat::Json => match serde_json::to_string_pretty(&to_json_map(index)) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("error serialising dependency tree: {e}"),
        },
    }
}

/// Write a one-line summary plus any diagnostics to stderr so stdout stays
/// clean for JSON consumers.
pub fn print_diagnostics(report: &BuildReport) {
    if report.diagnostics.is_empty() {
        return;
    }
    eprintln!(
        "{} files scanned, {} skipped, {} diagnostics:",
        report.files_scanned,
        report.files_skipped(),
        report.diagnostics.len()
    );
    for diagnostic in &report.diagnostics {
        eprintln!("  {diagnostic}");
    }
}
