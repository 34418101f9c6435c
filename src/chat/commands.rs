//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to manage sessions, options, context documents and the
//! proxy without sending a message to the backend.

/// A parsed chat command.
///
/// These commands control the client and are not sent as chat messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Leave the current session; the next message starts a new one.
    NewChat,

    /// List sessions.
    Sessions,

    /// Switch to the session at this 1-based position.
    Switch(usize),

    /// Delete the session at this 1-based position.
    Delete(usize),

    /// List the backend's models.
    Models,

    /// Switch the backend to a model.
    Model(String),

    /// Toggle thinking visibility.
    Thinking(bool),

    /// Toggle web search.
    Search(bool),

    /// Enable or disable the upstream proxy.
    Proxy(bool),

    /// Set the proxy host.
    ProxyIp(String),

    /// Set the proxy port.
    ProxyPort(String),

    /// Test the configured proxy.
    ProxyTest,

    /// Upload files as context documents.
    Upload(Vec<String>),

    /// List context documents.
    Contexts,

    /// Delete a context document.
    Forget(String),

    /// Expand or collapse the latest collapsible block.
    Expand,

    /// Show the current configuration.
    ShowConfig,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use chatterbox::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/switch 2").is_some());
/// assert!(parse_command("Hello there!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::NewChat,
        "sessions" | "ls" => ChatCommand::Sessions,
        "switch" => parse_position(argument, ChatCommand::Switch, "/switch"),
        "delete" => parse_position(argument, ChatCommand::Delete, "/delete"),
        "models" => ChatCommand::Models,
        "model" => match argument {
            Some(model) => ChatCommand::Model(model.to_string()),
            None => ChatCommand::Invalid("/model requires a model name".to_string()),
        },
        "thinking" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Thinking(value),
            None => ChatCommand::Invalid("/thinking expects 'on' or 'off'".to_string()),
        },
        "search" => match argument.and_then(parse_on_off) {
            Some(value) => ChatCommand::Search(value),
            None => ChatCommand::Invalid("/search expects 'on' or 'off'".to_string()),
        },
        "proxy" => parse_proxy_command(argument),
        "upload" => match argument.map(split_paths) {
            Some(Ok(paths)) if !paths.is_empty() => ChatCommand::Upload(paths),
            Some(Err(message)) => ChatCommand::Invalid(message),
            _ => ChatCommand::Invalid("/upload requires at least one file path".to_string()),
        },
        "contexts" => ChatCommand::Contexts,
        "forget" => match argument {
            Some(filename) => ChatCommand::Forget(filename.to_string()),
            None => ChatCommand::Invalid("/forget requires a file name".to_string()),
        },
        "expand" | "toggle" => ChatCommand::Expand,
        "config" => ChatCommand::ShowConfig,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_proxy_command(argument: Option<&str>) -> ChatCommand {
    let Some(arg) = argument else {
        return ChatCommand::Invalid(
            "/proxy requires 'on', 'off', 'ip <host>', 'port <port>', or 'test'".to_string(),
        );
    };

    let mut parts = arg.splitn(2, ' ');
    let action = parts.next().unwrap_or_default().to_lowercase();
    let value = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());
    match (action.as_str(), value) {
        ("test", None) => ChatCommand::ProxyTest,
        ("ip", Some(host)) => ChatCommand::ProxyIp(host.to_string()),
        ("ip", None) => ChatCommand::Invalid("/proxy ip requires a host".to_string()),
        ("port", Some(port)) => ChatCommand::ProxyPort(port.to_string()),
        ("port", None) => ChatCommand::Invalid("/proxy port requires a port".to_string()),
        (toggle, None) => match parse_on_off(toggle) {
            Some(enabled) => ChatCommand::Proxy(enabled),
            None => ChatCommand::Invalid(
                "Unrecognized /proxy action (use on, off, ip, port, or test)".to_string(),
            ),
        },
        _ => ChatCommand::Invalid(
            "Unrecognized /proxy action (use on, off, ip, port, or test)".to_string(),
        ),
    }
}

fn parse_position<F>(argument: Option<&str>, constructor: F, name: &str) -> ChatCommand
where
    F: Fn(usize) -> ChatCommand,
{
    match argument {
        Some(arg) => match arg.parse::<usize>() {
            Ok(value) if value > 0 => constructor(value),
            _ => ChatCommand::Invalid(format!("{} expects a session number from /sessions", name)),
        },
        None => ChatCommand::Invalid(format!("{} requires a session number", name)),
    }
}

/// Splits on whitespace; single or double quotes keep a path with spaces whole.
fn split_paths(input: &str) -> Result<Vec<String>, String> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    for c in input.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    paths.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if let Some(q) = quote {
        return Err(format!("/upload has an unterminated {q} quote"));
    }
    if in_word {
        paths.push(current);
    }
    Ok(paths)
}

fn parse_on_off(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new                   Start a new chat (created by your next message)
  /sessions              List sessions
  /switch <n>            Switch to session n
  /delete <n>            Delete session n
  /models                List the backend's models
  /model <name>          Switch the backend to a model
  /thinking on|off       Show or hide the thinking placeholder
  /search on|off         Enable or disable web search
  /proxy on|off          Enable or disable the upstream proxy
  /proxy ip <host>       Set the proxy host
  /proxy port <port>     Set the proxy port
  /proxy test            Test the configured proxy
  /upload <path>...      Upload context documents (quote paths with spaces)
  /contexts              List context documents
  /forget <filename>     Delete a context document
  /expand                Expand or collapse the latest collapsible block
  /config                Show current configuration
  /help                  Show this help message
  /quit                  Exit the chat"#
}
