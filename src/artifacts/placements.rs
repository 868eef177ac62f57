//! Placement report parsing.
//!
//! The report lists every vertex under a `**** Vertex: '<label>'` header followed by the cores it was placed on:
//!
//! ```text
//! **** Vertex: 'pop_1'
//! Model: IFCurrExp
//!  Slice 0:99 (100 atoms) on core (0, 0, 3)
//! ```

use std::fs;
use std::path::Path;

use super::ArtifactError;

/// Placement report inside the run-reports directory.
pub const PLACEMENT_REPORT: &str = "placement_by_vertex_using_graph.rpt";

const VERTEX_HEADER: &str = "**** Vertex: '";
const CORE_MARKER: &str = "on core (";

/// A core a vertex slice was placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub p: u32,
}

/// Cores listed under the header for `label`, in report order.
///
/// ```
/// use testbase::artifacts::{Placement, parse_placements};
///
/// let report = "**** Vertex: 'a'\n on core (0, 1, 2)\n**** Vertex: 'b'\n on core (1, 1, 1)\n";
/// assert_eq!(parse_placements(report, "a").unwrap(), vec![Placement { x: 0, y: 1, p: 2 }]);
/// ```
pub fn parse_placements(text: &str, label: &str) -> Result<Vec<Placement>, ArtifactError> {
    let header = format!("{VERTEX_HEADER}{label}'");
    let mut placements = Vec::new();
    let mut in_vertex = false;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if in_vertex {
            if line.contains(VERTEX_HEADER) {
                in_vertex = false;
            } else if line.contains(CORE_MARKER) {
                placements.push(parse_core(line).ok_or_else(|| ArtifactError::MalformedPlacement {
                    line_number: index + 1,
                    line: line.to_string(),
                })?);
            }
        }
        if line == header {
            in_vertex = true;
        }
    }
    Ok(placements)
}

/// Read the placement report in `run_reports` and parse the block for `label`.
pub fn read_placements(run_reports: &Path, label: &str) -> Result<Vec<Placement>, ArtifactError> {
    let path = run_reports.join(PLACEMENT_REPORT);
    let text = fs::read_to_string(&path).map_err(|source| ArtifactError::Io { path, source })?;
    parse_placements(&text, label)
}

fn parse_core(line: &str) -> Option<Placement> {
    let open = line.rfind('(')?;
    let close = line.rfind(')')?;
    let inner = line.get(open + 1..close)?;
    let mut parts = inner.split(',').map(|part| part.trim().parse::<u32>());
    let placement = Placement {
        x: parts.next()?.ok()?,
        y: parts.next()?.ok()?,
        p: parts.next()?.ok()?,
    };
    match parts.next() {
        Some(_) => None,
        None => Some(placement),
    }
}
