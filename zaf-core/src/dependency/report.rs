// zaf-core/src/dependency/report.rs
//! Renders the rejection tree of a graph that failed to resolve.
//!
//! Every requirement gets one line with a status letter (`F` fulfilled,
//! `U` unfulfilled, `M` missing component), followed by one line per kept
//! candidate (`E`) or rejected candidate (its rejection code), and then the
//! nested requirements of all those candidates, indented per depth.

use super::graph::{DependencyGraph, RequirementNodeId};

const INDENT: &str = "  ";

pub(crate) fn render_failure(graph: &DependencyGraph) -> String {
    let root = graph.root_node();
    let mut lines = vec![format!(
        "Error fulfilling requirements for {}",
        root.short_name()
    )];
    for (_, requirement) in root.requirements() {
        requirement_lines(graph, requirement, "", &mut lines);
    }
    lines.join("\n")
}

fn requirement_lines(
    graph: &DependencyGraph,
    requirement: RequirementNodeId,
    indentation: &str,
    lines: &mut Vec<String>,
) {
    let node = graph.requirement(requirement);
    let (short, status) = if !node.candidates().is_empty() {
        ('F', "Fulfilled".to_string())
    } else if !node.rejected().is_empty() {
        ('U', "Unfulfilled".to_string())
    } else {
        ('M', format!("Missing component '{}'", node.component_name()))
    };

    let cans = if node.cans().is_empty() {
        String::new()
    } else {
        let cans: Vec<&str> = node.cans().iter().map(String::as_str).collect();
        format!(" and cans '{}'", cans.join(", "))
    };
    lines.push(format!(
        "{indentation}{short}: Requirement '{}' with name '{}'{cans}: {status}",
        node.argument(),
        node.component_name(),
    ));

    let component_indentation = format!("{indentation}{INDENT}");
    for &candidate in node.candidates() {
        lines.push(format!(
            "{component_indentation}E: Component '{}' with name '{}': Exists",
            graph.candidate(candidate).short_name(),
            node.component_name()
        ));
    }
    for &candidate in node.rejected() {
        let candidate = graph.candidate(candidate);
        let (code, reason) = candidate
            .rejection()
            .map(|r| (r.short_code(), r.to_string()))
            .unwrap_or(('U', "Unknown".to_string()));
        lines.push(format!(
            "{component_indentation}{code}: Component '{}' with name '{}': {reason}",
            candidate.short_name(),
            node.component_name()
        ));
    }

    let nested_indentation = format!("{component_indentation}{INDENT}");
    for &candidate in node.candidates().iter().chain(node.rejected()) {
        for (_, nested) in graph.candidate(candidate).requirements() {
            requirement_lines(graph, nested, &nested_indentation, lines);
        }
    }
}
