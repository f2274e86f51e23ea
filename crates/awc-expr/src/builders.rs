//! Builders for the guard predicates the compiler needs.

use crate::condition::{ComparisonOp, ConditionNode};

/// Events that carry a body a command can be typed into, paired with the
/// property holding that body.
pub const COMMENT_EVENTS: &[(&str, &str)] = &[
    ("issues", "github.event.issue.body"),
    ("issue_comment", "github.event.comment.body"),
    ("pull_request", "github.event.pull_request.body"),
    ("pull_request_review_comment", "github.event.comment.body"),
];

/// `path == 'value'`
pub fn property_equals(path: &str, value: &str) -> ConditionNode {
    ConditionNode::comparison(
        ConditionNode::property(path),
        ComparisonOp::Eq,
        ConditionNode::string(value),
    )
}

/// `path != 'value'`
pub fn property_not_equals(path: &str, value: &str) -> ConditionNode {
    ConditionNode::comparison(
        ConditionNode::property(path),
        ComparisonOp::Ne,
        ConditionNode::string(value),
    )
}

/// Membership test against an array or `*` projection, e.g.
/// `contains(github.event.issue.labels.*.name, 'bug')`.
pub fn property_contains(array_path: &str, value: &str) -> ConditionNode {
    ConditionNode::contains(
        ConditionNode::property(array_path),
        ConditionNode::string(value),
    )
}

/// True when the triggering pull request carries `label`.
pub fn pull_request_has_label(label: &str) -> ConditionNode {
    property_contains("github.event.pull_request.labels.*.name", label)
}

/// True when the triggering issue carries `label`.
pub fn issue_has_label(label: &str) -> ConditionNode {
    property_contains("github.event.issue.labels.*.name", label)
}

pub fn ref_starts_with(prefix: &str) -> ConditionNode {
    ConditionNode::call(
        "startsWith",
        vec![
            ConditionNode::property("github.ref"),
            ConditionNode::string(prefix),
        ],
    )
}

pub fn event_is(event: &str) -> ConditionNode {
    property_equals("github.event_name", event)
}

pub fn action_is(action: &str) -> ConditionNode {
    property_equals("github.event.action", action)
}

/// True when the event is any of `events`.
pub fn any_event<'a>(events: impl IntoIterator<Item = &'a str>) -> ConditionNode {
    ConditionNode::disjunction(events.into_iter().map(event_is).collect())
}

/// Combine an already present guard with a newly required one.
///
/// An empty `existing` yields `addition` unchanged; otherwise both are kept
/// under a conjunction.
pub fn merge_condition(existing: &str, addition: ConditionNode) -> ConditionNode {
    let existing = strip_expression_wrapper(existing);
    if existing.is_empty() {
        addition
    } else {
        ConditionNode::literal(existing).and(addition)
    }
}

/// Remove a surrounding `${{ ... }}` from user-written guard text.
pub fn strip_expression_wrapper(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("${{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Guard for a slash-command trigger.
///
/// Matches when a comment-bearing event's body contains `/command`. When
/// other events were merged into the same trigger set, any event outside the
/// comment-bearing kinds also matches, so those triggers are never blocked by
/// the command-text check.
pub fn command_condition(command: &str, has_other_events: bool) -> ConditionNode {
    let token = format!("/{command}");
    let command_checks = ConditionNode::disjunction(
        COMMENT_EVENTS
            .iter()
            .map(|(event, body)| event_is(event).and(property_contains(body, &token)))
            .collect(),
    );

    if !has_other_events {
        return command_checks;
    }

    let not_comment_event = any_event(COMMENT_EVENTS.iter().map(|(event, _)| *event)).not();
    command_checks.or(not_comment_event)
}
