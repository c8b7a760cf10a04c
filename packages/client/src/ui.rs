//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after printing a notice
pub fn redisplay_prompt(room_id: &str) {
    print!("{}", prompt(room_id));
    std::io::stdout().flush().ok();
}

pub fn prompt(room_id: &str) -> String {
    format!("{}> ", room_id)
}

pub const HELP: &str = "\
Commands:
  /items      show cached items (newest first)
  /status     show connection status
  /logs       show client log
  /reconnect  reconnect now
  /help       show this help
  /quit       exit
Any other line is copied to the room.
";

/// One line typed at the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Items,
    Status,
    Logs,
    Reconnect,
    Help,
    Quit,
    Submit(String),
    /// An unrecognized `/command`
    Unknown(String),
}

/// Parse a trimmed, non-empty input line
pub fn parse_input(line: &str) -> InputCommand {
    match line {
        "/items" => InputCommand::Items,
        "/status" => InputCommand::Status,
        "/logs" => InputCommand::Logs,
        "/reconnect" => InputCommand::Reconnect,
        "/help" => InputCommand::Help,
        "/quit" | "/exit" => InputCommand::Quit,
        // "//" で始まる行は先頭の "/" を外してそのまま送る
        _ if line.starts_with("//") => InputCommand::Submit(line[1..].to_string()),
        _ if line.starts_with('/') => InputCommand::Unknown(line.to_string()),
        _ => InputCommand::Submit(line.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        // テスト項目: 既知のコマンドが解釈される
        // then (期待する結果):
        assert_eq!(parse_input("/items"), InputCommand::Items);
        assert_eq!(parse_input("/status"), InputCommand::Status);
        assert_eq!(parse_input("/logs"), InputCommand::Logs);
        assert_eq!(parse_input("/reconnect"), InputCommand::Reconnect);
        assert_eq!(parse_input("/quit"), InputCommand::Quit);
        assert_eq!(parse_input("/exit"), InputCommand::Quit);
    }

    #[test]
    fn test_parse_plain_text_as_submit() {
        // テスト項目: コマンド以外の行は送信対象になる
        // then (期待する結果):
        assert_eq!(
            parse_input("hello world"),
            InputCommand::Submit("hello world".to_string())
        );
    }

    #[test]
    fn test_parse_escaped_slash() {
        // テスト項目: "//" で始まる行は "/" 1 つを外して送信される
        // then (期待する結果):
        assert_eq!(
            parse_input("//usr/local/bin"),
            InputCommand::Submit("/usr/local/bin".to_string())
        );
    }

    #[test]
    fn test_parse_unknown_command() {
        // テスト項目: 未知のコマンドは送信せず Unknown になる
        // then (期待する結果):
        assert_eq!(
            parse_input("/paste"),
            InputCommand::Unknown("/paste".to_string())
        );
    }
}
