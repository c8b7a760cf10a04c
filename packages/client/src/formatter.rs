//! Message formatting utilities for client display.

use copimon_server::infrastructure::dto::websocket::ItemDto;
use copimon_shared::{log_buffer::LogEntry, time::timestamp_to_jst_rfc3339};

use crate::{
    domain::{ConnectionState, ConnectionStatus},
    sync_client::SubmitOutcome,
};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the room snapshot received after connecting
    ///
    /// # Arguments
    ///
    /// * `room_id` - The room the client is subscribed to
    /// * `items` - Cached items, newest first
    pub fn format_snapshot(room_id: &str, items: &[ItemDto]) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", RULE));
        output.push_str(&format!("Room '{}': {} item(s)\n", room_id, items.len()));
        output.push_str(&Self::format_item_list(items));
        output.push_str(&format!("{}\n", RULE));
        output
    }

    /// Format the cached item list, newest first
    pub fn format_item_list(items: &[ItemDto]) -> String {
        if items.is_empty() {
            return "(No items)\n".to_string();
        }
        items
            .iter()
            .map(|item| {
                format!(
                    "[{}] {}\n",
                    timestamp_to_jst_rfc3339(item.ts),
                    Self::single_line(&item.text)
                )
            })
            .collect()
    }

    /// Format a new item pushed by the server
    pub fn format_new_item(item: &ItemDto) -> String {
        format!(
            "\n\n------------------------------------------------------------\n\
             {}\n\
             copied at {}\n\
             ------------------------------------------------------------\n",
            item.text,
            timestamp_to_jst_rfc3339(item.ts)
        )
    }

    /// Format the connection status line
    ///
    /// # Arguments
    ///
    /// * `status` - Current connection status
    /// * `pending` - Number of items waiting for delivery
    pub fn format_status(status: &ConnectionStatus, pending: usize) -> String {
        let marker = match status.state {
            ConnectionState::Connected => "●",
            ConnectionState::Connecting => "◐",
            ConnectionState::Disconnected => "○",
        };
        let mut output = format!("\n{} {} (pending: {})", marker, status.state, pending);
        if let Some(error) = &status.last_error {
            output.push_str(&format!(" - last error: {}", error));
        }
        output.push('\n');
        output
    }

    /// Format the client log, oldest first
    pub fn format_logs(logs: &[LogEntry]) -> String {
        if logs.is_empty() {
            return "\n(No logs)\n".to_string();
        }
        let mut output = String::from("\n");
        for entry in logs {
            output.push_str(&format!(
                "{} {:>5} {}\n",
                timestamp_to_jst_rfc3339(entry.ts),
                entry.level,
                entry.message
            ));
        }
        output
    }

    /// Format a confirmation after submitting
    pub fn format_submit_outcome(outcome: SubmitOutcome) -> String {
        match outcome {
            SubmitOutcome::Sent => "sent\n".to_string(),
            SubmitOutcome::Queued => "queued (will be delivered when possible)\n".to_string(),
        }
    }

    fn single_line(text: &str) -> String {
        text.lines().collect::<Vec<_>>().join(" ⏎ ")
    }
}
