//! Table rendering of query results.

use comfy_table::{Cell, Table};
use trellis_core::ontology::GraphNode;
use trellis_core::{KnownReport, Neighbors, NodeId, VisualizerConfig};

const NODE_HEADERS: [&str; 3] = ["KIND", "ID", "DETAIL"];

/// One-line description of a node.
pub fn describe(node: &GraphNode) -> String {
    match node {
        GraphNode::Package(p) => p.coordinate().to_string(),
        GraphNode::Source(s) => s.coordinate().to_string(),
        GraphNode::Artifact(a) => a.to_string(),
        GraphNode::Builder(b) => b.uri.clone(),
        GraphNode::Vulnerability(v) => v.to_string(),
        GraphNode::License(l) => l.name.clone(),
        GraphNode::IsDependency(e) => {
            let mut line = format!("depends on {}", e.dependency_package.coordinate());
            if !e.version_range.is_empty() {
                line.push_str(&format!(" {}", e.version_range));
            }
            line
        }
        GraphNode::IsOccurrence(e) => format!("occurs as {}", e.artifact),
        GraphNode::HashEqual(e) => e
            .artifacts
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(" = "),
        GraphNode::PkgEqual(e) => e
            .packages
            .iter()
            .map(|p| p.coordinate().to_string())
            .collect::<Vec<_>>()
            .join(" = "),
        GraphNode::HasSourceAt(e) => format!("built from {}", e.source.coordinate()),
        GraphNode::HasSbom(e) => format!("SBOM at {}", e.uri),
        GraphNode::HasSlsa(e) => format!("built by {} ({})", e.built_by.uri, e.build_type),
        GraphNode::CertifyVuln(e) if e.vulnerability.is_no_vuln() => {
            format!("no known vulnerabilities ({})", e.metadata.scanner_uri)
        }
        GraphNode::CertifyVuln(e) => format!("vulnerable to {}", e.vulnerability),
        GraphNode::CertifyVexStatement(e) => {
            format!("{:?} for {}", e.status, e.vulnerability)
        }
        GraphNode::CertifyBad(e) => format!("bad: {}", e.justification),
        GraphNode::CertifyGood(e) => format!("good: {}", e.justification),
        GraphNode::CertifyScorecard(e) => {
            format!("scorecard {:.1}", e.scorecard.aggregate_score)
        }
        GraphNode::CertifyLegal(e) => format!("declared {}", e.declared_license),
        GraphNode::Unrecognized => "unrecognized".to_string(),
    }
}

/// Helper to create a table with headers.
#[must_use]
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_header(headers.iter().map(|h| Cell::new(*h)));
    table
}

/// KIND / ID / DETAIL table, one row per node.
pub fn node_table(nodes: &[GraphNode]) -> Table {
    let mut table = create_table(&NODE_HEADERS);
    for node in nodes {
        let id = node.leaf_id().map(NodeId::to_string).unwrap_or_default();
        table.add_row(vec![
            Cell::new(node.type_name()),
            Cell::new(id),
            Cell::new(describe(node)),
        ]);
    }
    table
}

pub fn print_nodes(nodes: &[GraphNode]) {
    if nodes.is_empty() {
        println!("(none)");
        return;
    }
    println!("{}", node_table(nodes));
}

pub fn print_neighbors(neighbors: &Neighbors) {
    print_nodes(&neighbors.records());
}

pub fn print_visualizer(viz: &VisualizerConfig, path: &[NodeId]) {
    println!("Visualizer url: {}", viz.url_for(path));
}

pub fn print_known(report: &KnownReport, viz: &VisualizerConfig) {
    println!("Subject: {} ({})", report.subject, describe(&report.node));
    for section in &report.sections {
        println!();
        println!("== {} {} ==", section.kind.title(), section.id);
        print_neighbors(&section.neighbors);
        print_visualizer(viz, &section.path);
    }

    let summary = report.vulnerability_summary();
    println!();
    if summary.vulnerable == 0 && summary.certified_clean > 0 {
        println!("Vulnerabilities: none found by {} scan(s)", summary.certified_clean);
    } else if summary.vulnerable > 0 {
        println!("Vulnerabilities: {}", summary.distinct_ids.join(", "));
    } else {
        println!("Vulnerabilities: not scanned");
    }
}
