//! Phase prompt synthesis and parsing of fix claims.

use std::fmt::Write as _;

use crate::domain::models::{Agent, PhaseKind, WorkItem};

/// Marker the assistant prints for every diagnostic it fixed.
pub const FIXED_MARKER: &str = "FIXED:";

/// Items rendered into a single prompt before the rest are summarised.
const MAX_RENDERED_ITEMS: usize = 200;

const fn directive(kind: PhaseKind) -> &'static str {
    match kind {
        PhaseKind::Detection => {
            "Categorize and prioritize the diagnostics below. Group related ones, flag the ones \
             that block others, and order them by the impact of fixing them. Do not edit files."
        }
        PhaseKind::Analysis => {
            "Perform a root-cause analysis of the diagnostics below. For each group, explain the \
             underlying cause and the smallest change that would remove it. Do not edit files."
        }
        PhaseKind::Resolution => {
            "Fix the diagnostics below by editing the source files. Prefer precise types over \
             `any`, keep behavior unchanged, and do not suppress diagnostics with comments."
        }
        PhaseKind::Validation => {
            "Validate the fixes applied to the code around the diagnostics below. Check that \
             each fix is correct, that no regressions or new diagnostics were introduced, and \
             repair anything that is wrong."
        }
        PhaseKind::Completion => {
            "Confirm which of the diagnostics below are resolved and summarize the work done, \
             listing anything that still needs attention. Do not edit files."
        }
    }
}

const fn general_directive(kind: PhaseKind) -> &'static str {
    match kind {
        PhaseKind::Detection | PhaseKind::Analysis => {
            "No diagnostics are assigned to you. Review the project for general code-quality \
             and type-safety risks and report what you find. Do not edit files."
        }
        PhaseKind::Resolution | PhaseKind::Validation => {
            "No diagnostics are assigned to you. Review recently changed code for type-safety \
             problems and fix only clear, low-risk issues."
        }
        PhaseKind::Completion => {
            "No diagnostics are assigned to you. Summarize the overall code-quality state of \
             the project."
        }
    }
}

/// Build the prompt an agent sends to the assistant.
pub fn build_prompt(kind: PhaseKind, agent: &Agent) -> String {
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are {}, agent {} in phase {} ({}) of an automated diagnostics fixing loop.",
        agent.name,
        agent.id,
        kind.number(),
        kind.name()
    );
    prompt.push('\n');

    if agent.assigned_items.is_empty() {
        prompt.push_str(general_directive(kind));
        prompt.push('\n');
        return prompt;
    }

    prompt.push_str(directive(kind));
    prompt.push_str("\n\nAssigned diagnostics:\n");

    for item in agent.assigned_items.iter().take(MAX_RENDERED_ITEMS) {
        let _ = writeln!(prompt, "- {} ({})", item.render(), item.category);
    }
    if agent.assigned_items.len() > MAX_RENDERED_ITEMS {
        let _ = writeln!(
            prompt,
            "- ... and {} more in the same files",
            agent.assigned_items.len() - MAX_RENDERED_ITEMS
        );
    }

    if kind == PhaseKind::Resolution {
        let _ = write!(
            prompt,
            "\nFor every diagnostic you fix, print one line of the form\n\
             {FIXED_MARKER} <file>:<line>:<code>\n\
             after your edits.\n"
        );
    }

    prompt
}

/// Assigned items the assistant claims to have fixed.
///
/// Claims that do not match an assigned item are ignored.
pub fn parse_fixed_items(output: &str, assigned: &[WorkItem]) -> Vec<WorkItem> {
    let claims: Vec<(&str, u32, &str)> = output
        .lines()
        .filter_map(|line| line.trim().strip_prefix(FIXED_MARKER))
        .filter_map(|claim| {
            let mut parts = claim.trim().rsplitn(3, ':');
            let code = parts.next()?.trim();
            let line = parts.next()?.trim().parse().ok()?;
            let file = parts.next()?.trim();
            Some((file, line, code))
        })
        .collect();

    assigned
        .iter()
        .filter(|item| {
            claims.iter().any(|(file, line, code)| {
                item.location.file == *file
                    && item.location.line == *line
                    && item.code.eq_ignore_ascii_case(code)
            })
        })
        .cloned()
        .collect()
}
