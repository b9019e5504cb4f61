//! Reusable prompts using Handlebars for templating. Handlebars adds
//! additional security controls since it can't do much out of the box
//! without registering your own helpers. This is ideal since output
//! from LLMs should be considered untrusted and Handlebars forces you
//! to add only what you need.

use std::fmt;

use anyhow::Result;
use handlebars::{Handlebars, handlebars_helper, no_escape};

// A simple `inc` helper for use with `each` and `@index` so that
// there can be natural number sequences when rendering (instead of
// starting at 0).
handlebars_helper!(inc: |v: i64| format!("{}", v + 1));

#[derive(Debug)]
pub enum Prompt {
    AgentSystem,
    Task,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<Prompt> for String {
    fn from(item: Prompt) -> String {
        format!("{:?}", item)
    }
}

const AGENT_SYSTEM_PROMPT: &str = r"You are {{role}}. {{backstory}}

Your personal goal is: {{goal}}

Use the tools available to you whenever a task calls for them. Never make up tool results. When you are done, reply with your final answer only.";

const TASK_PROMPT: &str = r"# Task
{{description}}

# Expected output
{{expected_output}}
{{#if context}}

# Context from earlier tasks
{{#each context}}
## Result {{inc @index}}
{{this}}

{{/each}}
{{/if}}";

pub fn templates<'a>() -> Result<Handlebars<'a>> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    // Prompts are plain text, not HTML
    registry.register_escape_fn(no_escape);
    registry.register_helper("inc", Box::new(inc));
    registry.register_template_string(&Prompt::AgentSystem.to_string(), AGENT_SYSTEM_PROMPT)?;
    registry.register_template_string(&Prompt::Task.to_string(), TASK_PROMPT)?;
    Ok(registry)
}
