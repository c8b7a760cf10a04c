//! Interactive CLI on top of [`SyncClient`].

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{broadcast, mpsc};

use crate::{
    config::ClientConfig,
    error::ClientError,
    formatter::MessageFormatter,
    sync_client::{SyncClient, SyncNotice},
    ui::{HELP, InputCommand, parse_input, prompt, redisplay_prompt},
};

/// Run the client until the user quits or stdin closes
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let room_id = config.room_id.clone();
    let client = SyncClient::start(config)?;
    tracing::info!("Syncing room '{}' with {}", room_id, client.config().server_url);
    println!(
        "\nRoom '{}'. Type text and press Enter to copy it. /help for commands, Ctrl+C to exit.\n",
        room_id
    );

    let notice_task = tokio::spawn(print_notices(client.subscribe(), room_id.clone()));

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // rustyline は同期 API なので専用スレッドで読む
    let prompt_text = prompt(&room_id);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt_text) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    while let Some(line) = input_rx.recv().await {
        match parse_input(&line) {
            InputCommand::Submit(text) => match client.submit(text).await {
                Ok(outcome) => print!("{}", MessageFormatter::format_submit_outcome(outcome)),
                Err(ClientError::Validation(reason)) => println!("{}", reason),
                Err(e) => return Err(e),
            },
            InputCommand::Items => {
                let items = client.cached_items().await?;
                print!("\n{}", MessageFormatter::format_item_list(&items));
            }
            InputCommand::Status => {
                let status = client.connection_status().await?;
                let pending = client.pending_count().await?;
                print!("{}", MessageFormatter::format_status(&status, pending));
            }
            InputCommand::Logs => print!("{}", MessageFormatter::format_logs(&client.logs())),
            InputCommand::Reconnect => client.request_reconnect()?,
            InputCommand::Help => print!("{}", HELP),
            InputCommand::Quit => break,
            InputCommand::Unknown(command) => println!("unknown command: {} (try /help)", command),
        }
    }

    let pending = client.pending_count().await?;
    if pending > 0 {
        tracing::warn!("Exiting with {} undelivered item(s)", pending);
    }
    client.shutdown().await?;
    notice_task.abort();
    Ok(())
}

async fn print_notices(mut notices: broadcast::Receiver<SyncNotice>, room_id: String) {
    loop {
        let notice = match notices.recv().await {
            Ok(notice) => notice,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Skipped {} notices", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        let formatted = match notice {
            SyncNotice::Snapshot(items) => MessageFormatter::format_snapshot(&room_id, &items),
            SyncNotice::NewItem(item) => MessageFormatter::format_new_item(&item),
            SyncNotice::Status(status) => format!("\n[{}]\n", status.state),
            SyncNotice::QueueDrained => "\n[queued items delivered]\n".to_string(),
        };
        print!("{}", formatted);
        redisplay_prompt(&room_id);
    }
}
