use anyhow::{Error, Result, anyhow, bail};
use serde_json::Value;

use crate::core::LlmConfig;
use crate::openai::{BoxedToolCall, FunctionCall, FunctionCallFn, Message, Role, completion};

// Upper bound on completion round trips in one turn so a model that
// keeps calling tools can't loop forever.
const MAX_TOOL_ROUNDS: usize = 16;

async fn handle_tool_call(tools: &[BoxedToolCall], tool_call: &Value) -> Result<Vec<Message>, Error> {
    let tool_call_id = &tool_call["id"]
        .as_str()
        .ok_or(anyhow!("Tool call missing ID: {}", tool_call))?;
    let tool_call_function = &tool_call["function"];
    let tool_call_args = tool_call_function["arguments"]
        .as_str()
        .ok_or(anyhow!("Tool call missing arguments: {}", tool_call))?;
    let tool_call_name = tool_call_function["name"]
        .as_str()
        .ok_or(anyhow!("Tool call missing name: {}", tool_call))?;

    tracing::debug!(
        "\nTool call: {}\nargs: {}",
        &tool_call_name,
        &tool_call_args
    );

    let tool_call_result = tools
        .iter()
        .find(|i| *i.function_name() == *tool_call_name)
        .ok_or(anyhow!(
            "Received tool call that doesn't exist: {}",
            tool_call_name
        ))?
        .call(tool_call_args)
        .await?;

    let tool_call_request = vec![FunctionCall {
        function: FunctionCallFn {
            arguments: tool_call_args.to_string(),
            name: tool_call_name.to_string(),
        },
        id: tool_call_id.to_string(),
        r#type: String::from("function"),
    }];
    let results = vec![
        Message::new_tool_call_request(tool_call_request),
        Message::new_tool_call_response(&tool_call_result, tool_call_id),
    ];

    Ok(results)
}

async fn handle_tool_calls(
    tools: &[BoxedToolCall],
    tool_calls: &[Value],
) -> Result<Vec<Message>, Error> {
    // One at a time and in the order requested. Tools share the
    // credential cache so they must not run concurrently.
    let mut results = Vec::new();
    for call in tool_calls {
        results.extend(handle_tool_call(tools, call).await?);
    }
    Ok(results)
}

/// Runs the next turn in chat by passing a transcript to the LLM for
/// the next response. Can return multiple messages when there are
/// tool calls.
pub async fn chat(
    tools: &[BoxedToolCall],
    history: &[Message],
    llm: &LlmConfig,
) -> Result<Vec<Message>, Error> {
    let mut updated_history = history.to_owned();
    let mut messages = Vec::new();

    let mut resp = completion(history, tools, llm).await?;

    // Tool calls need to be handled for the chat to proceed
    let mut rounds = 0;
    while let Some(tool_calls) = resp["choices"][0]["message"]["tool_calls"].as_array() {
        if tool_calls.is_empty() {
            break;
        }
        if tools.is_empty() {
            bail!("Received tool call but no tools were specified");
        }
        rounds += 1;
        if rounds > MAX_TOOL_ROUNDS {
            bail!("Gave up after {} rounds of tool calls", MAX_TOOL_ROUNDS);
        }

        let tool_call_msgs = handle_tool_calls(tools, tool_calls).await?;
        for m in tool_call_msgs.into_iter() {
            messages.push(m.clone());
            updated_history.push(m);
        }

        // Provide the results of the tool calls back to the chat
        resp = completion(&updated_history, tools, llm).await?;
    }

    if let Some(msg) = resp["choices"][0]["message"]["content"].as_str() {
        messages.push(Message::new(Role::Assistant, msg));
    } else {
        bail!("No message received. Resp:\n\n {}", resp);
    }

    Ok(messages)
}
