//! Interactive loop over a session.

use crate::session::Session;
use affinity_core::Message;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::error;

const USAGE: &str =
    "Commands: /status /history [n] /branch <name> /fork <name> /agent <text> /quit";

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Status,
    History(usize),
    Branch(String),
    Fork(String),
    Agent(String),
    /// Plain text, scored as a user message.
    Say(String),
    /// A `/` command that is unknown or missing its argument. Never scored.
    Usage(String),
}

impl ReplCommand {
    /// `None` for blank input.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        if !trimmed.starts_with('/') {
            return Some(Self::Say(trimmed.to_string()));
        }

        let (command, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (trimmed, ""),
        };
        let cmd = match command {
            "/quit" | "/exit" => Self::Quit,
            "/status" => Self::Status,
            "/history" => Self::History(rest.parse().unwrap_or(3)),
            "/branch" if !rest.is_empty() => Self::Branch(rest.to_string()),
            "/fork" if !rest.is_empty() => Self::Fork(rest.to_string()),
            "/agent" => Self::Agent(rest.to_string()),
            other => Self::Usage(other.to_string()),
        };
        Some(cmd)
    }
}

pub async fn run(session: &mut Session) -> anyhow::Result<()> {
    println!("Affinity online. Type a message, or /status /history /branch <name> /fork <name> /agent <text> /quit.");
    println!("{}", session.status_report());

    let mut rl = DefaultEditor::new()?;
    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let Some(command) = ReplCommand::parse(&line) else {
            continue;
        };
        let _ = rl.add_history_entry(line.trim());

        let result = match command {
            ReplCommand::Quit => break,
            ReplCommand::Status => {
                println!("{}", session.status_report());
                Ok(())
            }
            ReplCommand::History(n) => {
                println!("{}", session.history_report(n));
                Ok(())
            }
            ReplCommand::Branch(name) => session.switch_branch(&name).await.map(|_| {
                println!("{}", session.status_report());
            }),
            ReplCommand::Fork(name) => session.fork(&name).await.map(|_| {
                println!("Now on '{}'", session.branch());
            }),
            ReplCommand::Agent(text) => session.say(Message::agent(text)).await.map(|_| ()),
            ReplCommand::Usage(cmd) => {
                println!("Unknown or incomplete command: {}", cmd);
                println!("{}", USAGE);
                Ok(())
            }
            ReplCommand::Say(text) => match session.say(Message::user(text)).await {
                Ok(out) => {
                    if let Some(t) = out.transition() {
                        println!("* {} -> {}", t.from, t.to);
                    }
                    if let Some(directive) = out.directive {
                        println!("Directive: {}", directive);
                    }
                    println!("{}", session.status_report());
                    Ok(())
                }
                Err(e) => Err(e),
            },
        };

        if let Err(e) = result {
            error!("Command failed: {}", e);
            println!("\n[System Error]: {}\n", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_line_ignored() {
        assert_eq!(ReplCommand::parse("   "), None);
    }

    #[test]
    fn test_plain_text_is_scored() {
        assert_eq!(
            ReplCommand::parse("  you're amazing "),
            Some(ReplCommand::Say("you're amazing".into()))
        );
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(ReplCommand::parse("/branch alt"), Some(ReplCommand::Branch("alt".into())));
        assert_eq!(ReplCommand::parse("/fork  swipe-2 "), Some(ReplCommand::Fork("swipe-2".into())));
        assert_eq!(ReplCommand::parse("/history 7"), Some(ReplCommand::History(7)));
        assert_eq!(ReplCommand::parse("/history"), Some(ReplCommand::History(3)));
        assert_eq!(ReplCommand::parse("/agent hello"), Some(ReplCommand::Agent("hello".into())));
        assert_eq!(ReplCommand::parse("/exit"), Some(ReplCommand::Quit));
    }

    #[test]
    fn test_branch_without_name_is_not_scored() {
        assert_eq!(ReplCommand::parse("/branch"), Some(ReplCommand::Usage("/branch".into())));
        assert_eq!(ReplCommand::parse("/fork   "), Some(ReplCommand::Usage("/fork".into())));
    }

    #[test]
    fn test_unknown_command_is_not_scored() {
        assert_eq!(ReplCommand::parse("/stauts"), Some(ReplCommand::Usage("/stauts".into())));
        assert_eq!(ReplCommand::parse("/help me"), Some(ReplCommand::Usage("/help".into())));
    }
}
