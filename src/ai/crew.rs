//! A small sequential task runner. Each task runs as one chat turn
//! with its agent's persona as the system prompt and the outputs of
//! the tasks before it as context.

use std::fmt;

use anyhow::{Result, anyhow};
use serde::Serialize;
use serde_json::json;

use crate::ai::prompt::{Prompt, templates};
use crate::core::LlmConfig;
use crate::openai::{BoxedToolCall, Message, Role, chat};

pub struct Agent {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tools: Vec<BoxedToolCall>,
}

impl Agent {
    pub fn new(role: &str, goal: &str, backstory: &str, tools: Vec<BoxedToolCall>) -> Self {
        Self {
            role: role.to_string(),
            goal: goal.to_string(),
            backstory: backstory.to_string(),
            tools,
        }
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.function_name()).collect()
    }
}

pub struct Task {
    pub description: String,
    pub expected_output: String,
    /// Role of the agent that runs this task
    pub agent: String,
}

impl Task {
    pub fn new(description: &str, expected_output: &str, agent: &str) -> Self {
        Self {
            description: description.trim().to_string(),
            expected_output: expected_output.to_string(),
            agent: agent.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TaskOutput {
    pub description: String,
    pub agent: String,
    pub raw: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CrewOutput {
    pub tasks_output: Vec<TaskOutput>,
    /// Output of the last task
    pub raw: String,
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

pub struct Crew {
    pub agents: Vec<Agent>,
    pub tasks: Vec<Task>,
}

impl Crew {
    pub fn new(agents: Vec<Agent>, tasks: Vec<Task>) -> Self {
        Self { agents, tasks }
    }

    fn agent(&self, role: &str) -> Result<&Agent> {
        self.agents
            .iter()
            .find(|a| a.role == role)
            .ok_or(anyhow!("No agent with role '{}' in the crew", role))
    }

    /// Runs every task in order and stops at the first error.
    pub async fn kickoff(&self, llm: &LlmConfig) -> Result<CrewOutput> {
        // Fail before any request is made if a task has no agent
        for task in self.tasks.iter() {
            self.agent(&task.agent)?;
        }

        let templates = templates()?;
        let mut tasks_output: Vec<TaskOutput> = Vec::new();

        for (idx, task) in self.tasks.iter().enumerate() {
            let agent = self.agent(&task.agent)?;

            let system_msg = templates.render(
                &Prompt::AgentSystem.to_string(),
                &json!({
                    "role": agent.role,
                    "goal": agent.goal,
                    "backstory": agent.backstory,
                }),
            )?;
            let context: Vec<&str> = tasks_output.iter().map(|o| o.raw.as_str()).collect();
            let user_msg = templates.render(
                &Prompt::Task.to_string(),
                &json!({
                    "description": task.description,
                    "expected_output": task.expected_output,
                    "context": context,
                }),
            )?;

            tracing::info!(task = idx + 1, agent = %agent.role, "Starting task");

            let history = vec![
                Message::new(Role::System, &system_msg),
                Message::new(Role::User, &user_msg),
            ];
            let messages = chat(&agent.tools, &history, llm).await?;
            let raw = messages
                .last()
                .and_then(|m| m.content.clone())
                .ok_or(anyhow!("Task {} finished without an answer", idx + 1))?;

            tracing::debug!(task = idx + 1, "Task output: {}", raw);

            tasks_output.push(TaskOutput {
                description: task.description.clone(),
                agent: agent.role.clone(),
                raw,
            });
        }

        let raw = tasks_output
            .last()
            .map(|o| o.raw.clone())
            .unwrap_or_default();

        Ok(CrewOutput { tasks_output, raw })
    }
}
