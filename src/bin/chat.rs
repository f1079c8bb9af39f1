//! transcript-chat - interactive host for the streaming transcript client
//!
//! Reads one message per line from stdin and prints the streamed transcript
//! to stdout. Ctrl-C cancels the exchange in flight; `/new` starts a fresh
//! session and `/quit` (or EOF) exits.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transcript_stream::{
    ChatSession, ClientConfig, Completion, EntryKind, HttpTransport, SessionContext, StreamError,
    Transcript, TranscriptSink,
};

/// Prints newly appended content as snapshots arrive
#[derive(Default)]
struct TerminalPrinter {
    /// id -> bytes of content already printed
    printed: Mutex<HashMap<String, usize>>,
}

impl TerminalPrinter {
    fn render(&self, transcript: &Transcript) -> String {
        let Ok(mut printed) = self.printed.lock() else {
            return String::new();
        };
        let mut out = String::new();
        for entry in transcript {
            if entry.kind == EntryKind::Human {
                continue;
            }
            if let Some(offset) = printed.get_mut(&entry.id) {
                if let Some(tail) = entry.content.get(*offset..) {
                    out.push_str(tail);
                }
                *offset = entry.content.len();
            } else {
                out.push_str(&format!("\n[{}] {}", entry.kind.as_str(), entry.content));
                printed.insert(entry.id.clone(), entry.content.len());
            }
        }
        out
    }

    fn write(text: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

impl TranscriptSink for TerminalPrinter {
    fn publish(&self, transcript: Arc<Transcript>) {
        Self::write(&self.render(&transcript));
    }

    fn terminated(&self, outcome: &Result<Completion, StreamError>) {
        match outcome {
            Ok(Completion::Cancelled) => Self::write("\n(stopped)\n"),
            Ok(_) => Self::write("\n"),
            Err(e) => Self::write(&format!("\n(error: {e})\n")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout is the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transcript_stream=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ClientConfig::from_env();
    let transport = HttpTransport::new(&config)?;
    tracing::info!(base_url = %transport.base_url(), "Client configured");

    let mut chat = ChatSession::new(SessionContext::new(), transport);
    let mut printer = TerminalPrinter::default();
    println!("Session ID: {}", chat.context().session_id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" => break,
            "/new" => {
                chat.reset(SessionContext::new());
                printer = TerminalPrinter::default();
                println!("Session ID: {}", chat.context().session_id());
                continue;
            }
            _ => {}
        }

        let cancel = CancellationToken::new();
        let ctrl_c = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };

        // Failures are reported through the printer; the next line retries
        let _ = chat.send(&line, &cancel, &printer).await;
        ctrl_c.abort();
    }

    Ok(())
}
