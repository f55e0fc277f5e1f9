//! Prompt templates for tool-call mode

/// Templates for the agent loop
pub struct AgentPromptTemplate;

impl AgentPromptTemplate {
    /// System prompt for a tool-call session.
    ///
    /// `tool_list` is the registry's `- name: description` listing.
    pub fn agent_system(tool_list: &str) -> String {
        format!(
            r##"You are an agent with access to local tools. You MUST use tools to complete tasks.

## Rules

1. For file operations (read/write/list) use tools, never paste file contents as an answer
2. For searching use the grep or find_files tools
3. When asked to create or write a file, call write_file immediately
4. When asked to read a file, call read_file immediately
5. Only explain or show code when no tool can help

## Tool Format

<tool>tool_name</tool>
<params>{{"key": "value"}}</params>

Params must be a single JSON object. Several calls may appear in one reply;
they run in order and their results come back in the next message.

## Example

User: write hello.cpp with a main function
You: <tool>write_file</tool>
<params>{{"path": "hello.cpp", "content": "#include <iostream>\nint main() {{\n  std::cout << \"Hello\";\n  return 0;\n}}"}}</params>

## Available Tools

{tool_list}

When the task is done, answer without any tool calls."##,
            tool_list = tool_list.trim_end()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::parse_tool_calls;

    #[test]
    fn test_agent_system_prompt() {
        let prompt = AgentPromptTemplate::agent_system(
            "- read_file: Read a file\n- write_file: Write a file\n",
        );

        assert!(prompt.contains("<tool>tool_name</tool>"));
        assert!(prompt.contains("- read_file: Read a file\n- write_file: Write a file\n\nWhen"));
        assert!(prompt.contains("Available Tools"));
    }

    #[test]
    fn test_example_in_prompt_is_parseable() {
        let prompt = AgentPromptTemplate::agent_system("- write_file: Write a file");
        let calls = parse_tool_calls(&prompt);

        // The format line carries a placeholder object, the example a real call.
        let example = calls
            .iter()
            .find(|c| c.tool_name == "write_file")
            .expect("example call");
        assert_eq!(example.get_string("path"), Some("hello.cpp"));
        assert!(example.get_string("content").unwrap().contains("int main()"));
    }
}
