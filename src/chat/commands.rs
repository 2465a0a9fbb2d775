//! Slash command parsing for the chat application.
//!
//! Input starting with `/` controls the chat instead of being sent to the
//! model.

use crate::types::SessionId;

/// Numbers below this are positions in the `/sessions` listing; anything
/// larger is taken as a session id (ids are creation times in milliseconds).
const MAX_LISTING_INDEX: usize = 100_000;

/// Starter prompts offered when there is no conversation yet.
pub const SUGGESTIONS: [&str; 4] = [
    "Summarize a long article",
    "Write a Python script for data analysis",
    "Plan a 3-day trip to Tokyo",
    "Explain quantum physics to a 5-year old",
];

/// Returns the 1-based starter prompt `n`.
pub fn suggestion(n: usize) -> Option<&'static str> {
    n.checked_sub(1).and_then(|i| SUGGESTIONS.get(i)).copied()
}

/// A reference to a session typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRef {
    /// 1-based position in the `/sessions` listing.
    Index(usize),
    /// A session id.
    Id(SessionId),
}

/// A parsed chat command.
///
/// These commands control the chat and are not sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Start a new conversation with the next message.
    New,

    /// List saved conversations.
    Sessions,

    /// Switch to a saved conversation.
    Switch(SessionRef),

    /// Delete a conversation; `None` deletes the active one.
    Delete(Option<SessionRef>),

    /// Change the model; `None` lists the known models.
    Model(Option<String>),

    /// Turn web-search grounding on or off.
    Search(bool),

    /// Set or clear the system instruction.
    /// `None` clears the current instruction.
    System(Option<String>),

    /// Attach an image file to the next message.
    Image(String),

    /// Print the active conversation.
    Show,

    /// Dismiss the current notice.
    Dismiss,

    /// Supply an API key.
    Key(String),

    /// List starter prompts, or send the numbered one.
    Suggest(Option<usize>),

    /// Display statistics (sessions, model, features).
    Stats,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command, or `None` if it
/// should be sent as a regular message.
///
/// # Examples
///
/// ```
/// # use gemchat::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/model pro").is_some());
/// assert!(parse_command("Hello, Gemini!").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(str::trim).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" | "clear" => ChatCommand::New,
        "sessions" | "list" | "history" => ChatCommand::Sessions,
        "switch" | "open" => match argument {
            Some(arg) => ChatCommand::Switch(parse_session_ref(arg)),
            None => ChatCommand::Invalid("/switch requires a session number or id".to_string()),
        },
        "delete" | "rm" => ChatCommand::Delete(argument.map(parse_session_ref)),
        "model" => ChatCommand::Model(argument.map(str::to_string)),
        "search" => match argument.and_then(parse_on_off) {
            Some(on) => ChatCommand::Search(on),
            None => ChatCommand::Invalid("/search expects on or off".to_string()),
        },
        "system" => ChatCommand::System(argument.map(str::to_string)),
        "image" | "attach" => match argument {
            Some(path) => ChatCommand::Image(path.to_string()),
            None => ChatCommand::Invalid("/image requires a file path".to_string()),
        },
        "show" => ChatCommand::Show,
        "dismiss" => ChatCommand::Dismiss,
        "key" => match argument {
            Some(key) => ChatCommand::Key(key.to_string()),
            None => ChatCommand::Invalid("/key requires an API key".to_string()),
        },
        "suggest" | "ideas" => match argument.map(str::parse::<usize>) {
            None => ChatCommand::Suggest(None),
            Some(Ok(n)) => ChatCommand::Suggest(Some(n)),
            Some(Err(_)) => ChatCommand::Invalid("/suggest expects a number".to_string()),
        },
        "stats" | "status" => ChatCommand::Stats,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

fn parse_session_ref(value: &str) -> SessionRef {
    match value.parse::<usize>() {
        Ok(idx) if idx < MAX_LISTING_INDEX => SessionRef::Index(idx),
        _ => SessionRef::Id(SessionId::from(value)),
    }
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
  /new                   Start a new conversation
  /sessions              List saved conversations
  /switch <n|id>         Switch to a saved conversation
  /delete [n|id]         Delete a conversation (default: the current one)
  /model [name]          Change the model (no argument lists models)
  /search on|off         Toggle web-search grounding
  /system [prompt]       Set system instruction (no argument clears it)
  /image <path>          Attach an image to the next message
  /show                  Print the current conversation
  /dismiss               Dismiss the current notice
  /key <api-key>         Connect an API key
  /suggest [n]           List starter prompts, or send prompt n
  /stats                 Show statistics
  /help                  Show this help message
  /quit                  Exit the chat"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/Q"), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_new() {
        assert_eq!(parse_command("/new"), Some(ChatCommand::New));
        assert_eq!(parse_command("  /clear  "), Some(ChatCommand::New));
    }

    #[test]
    fn parse_switch_and_delete() {
        assert_eq!(
            parse_command("/switch 2"),
            Some(ChatCommand::Switch(SessionRef::Index(2)))
        );
        assert_eq!(
            parse_command("/switch 1718000000000"),
            Some(ChatCommand::Switch(SessionRef::Id(SessionId::from(
                "1718000000000"
            ))))
        );
        assert!(matches!(
            parse_command("/switch"),
            Some(ChatCommand::Invalid(_))
        ));
        assert_eq!(parse_command("/delete"), Some(ChatCommand::Delete(None)));
        assert_eq!(
            parse_command("/delete 3"),
            Some(ChatCommand::Delete(Some(SessionRef::Index(3))))
        );
    }

    #[test]
    fn parse_model() {
        assert_eq!(
            parse_command("/model pro"),
            Some(ChatCommand::Model(Some("pro".to_string())))
        );
        assert_eq!(parse_command("/model"), Some(ChatCommand::Model(None)));
    }

    #[test]
    fn parse_search() {
        assert_eq!(parse_command("/search on"), Some(ChatCommand::Search(true)));
        assert_eq!(parse_command("/search OFF"), Some(ChatCommand::Search(false)));
        assert!(matches!(
            parse_command("/search maybe"),
            Some(ChatCommand::Invalid(_))
        ));
    }

    #[test]
    fn parse_system() {
        assert_eq!(
            parse_command("/system Be brief."),
            Some(ChatCommand::System(Some("Be brief.".to_string())))
        );
        assert_eq!(parse_command("/system"), Some(ChatCommand::System(None)));
    }

    #[test]
    fn parse_image_and_key() {
        assert_eq!(
            parse_command("/image ./cat photo.png"),
            Some(ChatCommand::Image("./cat photo.png".to_string()))
        );
        assert!(matches!(parse_command("/image"), Some(ChatCommand::Invalid(_))));
        assert_eq!(
            parse_command("/key abc123"),
            Some(ChatCommand::Key("abc123".to_string()))
        );
        assert!(matches!(parse_command("/key"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn parse_misc() {
        assert_eq!(parse_command("/sessions"), Some(ChatCommand::Sessions));
        assert_eq!(parse_command("/show"), Some(ChatCommand::Show));
        assert_eq!(parse_command("/dismiss"), Some(ChatCommand::Dismiss));
        assert_eq!(parse_command("/stats"), Some(ChatCommand::Stats));
        assert_eq!(parse_command("/help"), Some(ChatCommand::Help));
        assert!(matches!(parse_command("/bogus"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn parse_suggest() {
        assert_eq!(parse_command("/suggest"), Some(ChatCommand::Suggest(None)));
        assert_eq!(parse_command("/suggest 2"), Some(ChatCommand::Suggest(Some(2))));
        assert!(matches!(
            parse_command("/suggest tokyo"),
            Some(ChatCommand::Invalid(_))
        ));
        assert_eq!(suggestion(3), Some("Plan a 3-day trip to Tokyo"));
        assert_eq!(suggestion(0), None);
        assert_eq!(suggestion(SUGGESTIONS.len() + 1), None);
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello"), None);
        assert_eq!(parse_command("what is 1/2?"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(help.contains("/new"));
        assert!(help.contains("/quit"));
    }
}
