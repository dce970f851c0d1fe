//! Line commands understood by the interactive client.

use helpdesk_rs::core::{Helpdesk, SessionContext, Submission};
use log::warn;

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain question for the assistant.
    Ask(String),
    /// Rate the message at the 1-based position shown in the transcript.
    Rate { index: usize, liked: bool },
    History,
    Sessions,
    Report,
    Close,
    Quit,
    Help,
    Empty,
    Unknown(String),
}

pub const HELP: &str = "\
/like <n>      rate answer n as helpful
/dislike <n>   rate answer n as unhelpful
/history       show this session
/sessions      list your sessions
/report        show the monitoring report
/close         end the session
/quit          exit";

/// Lines telling the user that support staff may not have been alerted.
pub fn warning_lines(warnings: &[String]) -> Vec<String> {
    warnings
        .iter()
        .map(|warning| format!("warning: support staff may not have been notified ({warning})"))
        .collect()
}

/// Post a question and render the transcript lines. Failures are reported, never
/// returned, so one bad message does not end the session.
pub async fn ask(helpdesk: &Helpdesk, ctx: &mut SessionContext, text: String) -> Vec<String> {
    match helpdesk.post_message(ctx, Submission::new(text)).await {
        Ok(reply) => {
            let mut lines = vec![format!(
                "[{}] {}: {}",
                reply.index + 1,
                helpdesk.config().assistant.name,
                reply.message.answer
            )];
            lines.extend(warning_lines(&reply.warnings));
            lines
        }
        Err(err) => {
            warn!("failed to post message (err={err})");
            vec![format!("Sorry, your message could not be processed: {err}")]
        }
    }
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let argument = parts.next();
    match (name.as_str(), argument) {
        ("like" | "dislike", Some(position)) => match position.parse::<usize>() {
            Ok(position) if position > 0 => Command::Rate {
                index: position - 1,
                liked: name == "like",
            },
            _ => Command::Unknown(line.to_string()),
        },
        ("history", None) => Command::History,
        ("sessions", None) => Command::Sessions,
        ("report", None) => Command::Report,
        ("close", None) => Command::Close,
        ("quit" | "exit", None) => Command::Quit,
        ("help", None) => Command::Help,
        _ => Command::Unknown(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{Command, ask, parse_command, warning_lines};
    use helpdesk_rs::config::HelpdeskConfig;
    use helpdesk_rs::core::{Helpdesk, InMemoryChatStore, LogNotifier, SessionContext};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn helpdesk() -> Helpdesk {
        Helpdesk::builder(HelpdeskConfig::default())
            .store(Arc::new(InMemoryChatStore::new()))
            .knowledge(Arc::new(helpdesk_rs::knowledge::InMemoryKnowledgeBase::new()))
            .notifier(Arc::new(LogNotifier))
            .build()
            .expect("helpdesk")
    }

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            parse_command("  how do I reset my password? "),
            Command::Ask("how do I reset my password?".to_string())
        );
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn ratings_use_one_based_positions() {
        assert_eq!(
            parse_command("/like 2"),
            Command::Rate {
                index: 1,
                liked: true
            }
        );
        assert_eq!(
            parse_command("/DISLIKE 1"),
            Command::Rate {
                index: 0,
                liked: false
            }
        );
        assert_eq!(
            parse_command("/like 0"),
            Command::Unknown("/like 0".to_string())
        );
        assert_eq!(
            parse_command("/like"),
            Command::Unknown("/like".to_string())
        );
    }

    #[test]
    fn control_commands() {
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/report"), Command::Report);
        assert_eq!(parse_command("/close"), Command::Close);
    }

    #[test]
    fn warnings_are_rendered_one_per_line() {
        assert!(warning_lines(&[]).is_empty());
        assert_eq!(
            warning_lines(&["notification failed: delivery failed: smtp".to_string()]),
            vec![
                "warning: support staff may not have been notified \
                 (notification failed: delivery failed: smtp)"
                    .to_string()
            ]
        );
    }

    #[tokio::test]
    async fn failed_question_is_reported_and_the_client_continues() {
        let helpdesk = helpdesk();
        let mut ctx = SessionContext::new();
        let lines = ask(&helpdesk, &mut ctx, "hello".to_string()).await;
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Sorry, your message could not be processed"));

        helpdesk
            .register_or_login(&mut ctx, "ana@example.com", "Ana", "")
            .expect("register");
        let lines = ask(&helpdesk, &mut ctx, "my printer jams".to_string()).await;
        assert_eq!(lines, vec!["[1] Helpdesk: I don't understand that.".to_string()]);
    }
}
