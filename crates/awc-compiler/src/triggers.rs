//! Trigger validation and rendering of the `on:` section.

use crate::error::{CompileError, Result};
use awc_core::workflow::Triggers;
use awc_expr::COMMENT_EVENTS;
use serde_yaml::{Mapping, Value};

/// Activity types subscribed to for each comment-bearing event when a
/// command trigger is configured.
const COMMAND_EVENT_TYPES: &[(&str, &[&str])] = &[
    ("issues", &["opened", "edited", "reopened"]),
    ("issue_comment", &["created", "edited"]),
    ("pull_request", &["opened", "edited", "reopened"]),
    ("pull_request_review_comment", &["created", "edited"]),
];

/// Reaction contents accepted by the reactions API.
pub const REACTIONS: &[&str] = &[
    "+1", "-1", "laugh", "confused", "heart", "hooray", "rocket", "eyes",
];

/// Reject triggers the compiled workflow could never honor.
pub fn validate(triggers: &Triggers) -> Result<()> {
    if let Some(command) = &triggers.command {
        let name = command.name.trim().trim_start_matches('/');
        if name.is_empty() {
            return Err(CompileError::InvalidTrigger(
                "command name must not be empty".to_string(),
            ));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(CompileError::InvalidTrigger(format!(
                "command name '{name}' must be a single word"
            )));
        }
    }

    if let Some(reaction) = &triggers.reaction {
        if !REACTIONS.contains(&reaction.as_str()) {
            return Err(CompileError::InvalidTrigger(format!(
                "unknown reaction '{reaction}', expected one of: {}",
                REACTIONS.join(", ")
            )));
        }
    }

    Ok(())
}

/// Command token without surrounding whitespace or a leading slash.
pub fn command_name(triggers: &Triggers) -> Option<&str> {
    triggers
        .command
        .as_ref()
        .map(|command| command.name.trim().trim_start_matches('/'))
}

pub fn is_comment_event(event: &str) -> bool {
    COMMENT_EVENTS.iter().any(|(name, _)| *name == event)
}

/// Whether events outside the comment-bearing kinds are declared.
pub fn has_other_events(triggers: &Triggers) -> bool {
    triggers.events.keys().any(|event| !is_comment_event(event))
}

/// Render the `on:` mapping.
///
/// A command trigger expands into the comment-bearing events with their
/// activity types; an event the workflow declares itself keeps the
/// workflow's configuration. A workflow with no events at all is
/// dispatchable by hand only.
pub fn render_on(triggers: &Triggers) -> Value {
    let mut on = Mapping::new();

    if triggers.command.is_some() {
        for (event, types) in COMMAND_EVENT_TYPES {
            if triggers.events.contains_key(*event) {
                continue;
            }
            let mut config = Mapping::new();
            config.insert(
                Value::from("types"),
                Value::Sequence(types.iter().map(|t| Value::from(*t)).collect()),
            );
            on.insert(Value::from(*event), Value::Mapping(config));
        }
    }

    for (event, config) in &triggers.events {
        on.insert(Value::String(event.clone()), config.clone());
    }

    if on.is_empty() {
        on.insert(Value::from("workflow_dispatch"), Value::Null);
    }

    Value::Mapping(on)
}
