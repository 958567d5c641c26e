use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

/// One executed command, as offered to the diagnostic sink.
#[derive(Clone, Debug)]
pub struct CommandEvent {
    /// wall clock, unix seconds
    pub timestamp: u64,
    pub connection: u64,
    pub peer: SocketAddr,
    pub text: String,
}

/// Producer half of the notification port, cloned into every connection.
///
/// Publishing never blocks the command path: the queue is bounded and a
/// full queue drops the event (drop-newest) and counts the loss.
#[derive(Clone)]
pub struct CommandJournal {
    sender: mpsc::Sender<CommandEvent>,
    dropped: Arc<AtomicU64>,
}

impl CommandJournal {
    pub fn channel(depth: usize) -> (CommandJournal, mpsc::Receiver<CommandEvent>) {
        let (sender, receiver) = mpsc::channel(depth);
        (
            CommandJournal {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            receiver,
        )
    }

    pub fn publish(&self, connection: u64, peer: SocketAddr, text: String) {
        let event = CommandEvent {
            timestamp: unix_seconds(),
            connection,
            peer,
            text,
        };
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(
                    "Journal queue full, dropped event from conn{} ({} dropped so far)",
                    event.connection, dropped
                );
            }
            Err(TrySendError::Closed(_)) => {
                // consumer already shut down, nothing left to notify
                debug!("Journal consumer gone, event discarded");
            }
        }
    }

    /// Events lost to a full queue since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// The single consumer of the notification port: appends one line per
/// event to the journal file. I/O failures degrade to log noise, they
/// never reach the command path.
pub struct JournalWriter {
    receiver: mpsc::Receiver<CommandEvent>,
    path: PathBuf,
    cancellation_token: CancellationToken,
}

impl JournalWriter {
    pub fn new(
        receiver: mpsc::Receiver<CommandEvent>,
        path: PathBuf,
        cancellation_token: CancellationToken,
    ) -> JournalWriter {
        JournalWriter {
            receiver,
            path,
            cancellation_token,
        }
    }

    pub async fn run(mut self) {
        let mut file = match self.open().await {
            Ok(file) => Some(file),
            Err(err) => {
                error!("Cannot open journal file {:?}: {}", self.path, err);
                None
            }
        };
        loop {
            tokio::select! {
                event = self.receiver.recv() => match event {
                    Some(event) => write_event(&mut file, &event).await,
                    None => {
                        debug!("All journal producers gone");
                        return;
                    }
                },
                _ = self.cancellation_token.cancelled() => {
                    // flush whatever is already queued before stopping
                    while let Ok(event) = self.receiver.try_recv() {
                        write_event(&mut file, &event).await;
                    }
                    debug!("Journal writer stopped");
                    return;
                }
            }
        }
    }

    async fn open(&self) -> std::io::Result<File> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .await
    }
}

async fn write_event(file: &mut Option<File>, event: &CommandEvent) {
    let Some(file) = file else {
        return;
    };
    let line = format!(
        "{} conn{} {}: {}\n",
        event.timestamp, event.connection, event.peer, event.text
    );
    if let Err(err) = file.write_all(line.as_bytes()).await {
        error!("Journal write failed: {}", err);
    } else if let Err(err) = file.flush().await {
        error!("Journal flush failed: {}", err);
    }
}
