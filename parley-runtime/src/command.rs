use std::str::FromStr;

use parley_core::{Error, ProviderKind, Result, Session};

pub const HELP: &str = "\
Commands:
  /new               start a new conversation
  /provider <name>   switch provider (deepseek, chatgpt)
  /help              show this help
  exit, /quit        leave";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    NewConversation,
    SwitchProvider(ProviderKind),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Ok(Command::Quit);
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Ok(Command::Send(line.trim_end_matches(['\r', '\n']).to_string()));
        };

        let mut parts = rest.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("new"), None) => Ok(Command::NewConversation),
            (Some("provider"), Some(name)) => Ok(Command::SwitchProvider(name.parse()?)),
            (Some("provider"), None) => Err(Error::Config("usage: /provider <name>".into())),
            (Some("help"), _) => Ok(Command::Help),
            (Some("quit"), _) => Ok(Command::Quit),
            _ => Err(Error::Config(format!("unknown command '{trimmed}'"))),
        }
    }
}

impl Command {
    /// Applies the command to `session`. Returns `false` when the user asked to quit.
    pub fn apply(self, session: &Session) -> bool {
        match self {
            Command::Send(text) => {
                session.send_message(&text);
            }
            Command::NewConversation => session.reset_conversation(),
            Command::SwitchProvider(provider) => session.switch_provider(provider),
            Command::Help => println!("{HELP}"),
            Command::Quit => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sent_as_typed() {
        assert_eq!(
            "  hello there \n".parse::<Command>().unwrap(),
            Command::Send("  hello there ".to_string())
        );
        assert_eq!("".parse::<Command>().unwrap(), Command::Send(String::new()));
    }

    #[test]
    fn test_commands() {
        assert_eq!("/new".parse::<Command>().unwrap(), Command::NewConversation);
        assert_eq!("EXIT".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!("/quit".parse::<Command>().unwrap(), Command::Quit);
        assert_eq!(
            "/provider ChatGPT".parse::<Command>().unwrap(),
            Command::SwitchProvider(ProviderKind::ChatGpt)
        );
        assert_eq!(
            "/provider deepseek".parse::<Command>().unwrap(),
            Command::SwitchProvider(ProviderKind::DeepSeek)
        );
    }

    #[test]
    fn test_bad_commands() {
        assert!(matches!("/provider".parse::<Command>(), Err(Error::Config(_))));
        assert!(matches!("/provider bard".parse::<Command>(), Err(Error::Config(_))));
        assert!(matches!("/frobnicate".parse::<Command>(), Err(Error::Config(_))));
    }
}
