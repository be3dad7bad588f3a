//! Terminal input for the interactive shell.
//!
//! A single reader thread owns stdin and queues lines. The shell awaits the
//! queue alongside Ctrl-C, and the discard prompt takes its answer from the
//! same queue with a blocking receive, so the two never race for input.

use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::debug;

use crate::guard::Prompt;

/// One event from the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl-C.
    Interrupt,
    Eof,
}

/// Source of shell input.
#[allow(async_fn_in_trait)]
pub trait LineInput {
    async fn next_event(&mut self) -> io::Result<InputEvent>;
}

/// Stdin reader shared by the shell loop and the discard prompt.
#[derive(Clone)]
pub struct Console {
    lines: Arc<Mutex<Receiver<String>>>,
    ready: Arc<Notify>,
}

impl Console {
    /// Start the reader thread. The thread ends at EOF, which drops the
    /// sender and turns every later receive into EOF.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<String>();
        let ready = Arc::new(Notify::new());
        let notify = Arc::clone(&ready);
        std::thread::spawn(move || {
            let stdin = io::stdin();
            loop {
                let mut line = String::new();
                match stdin.lock().read_line(&mut line) {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                        notify.notify_one();
                    }
                }
            }
            debug!("stdin closed");
            drop(tx);
            notify.notify_one();
        });
        Self::from_parts(rx, ready)
    }

    fn from_parts(rx: Receiver<String>, ready: Arc<Notify>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(rx)),
            ready,
        }
    }

    /// Next queued line without waiting. `Err(())` once stdin is closed.
    fn try_line(&self) -> Result<Option<String>, ()> {
        let Ok(rx) = self.lines.lock() else {
            return Err(());
        };
        match rx.try_recv() {
            Ok(line) => Ok(Some(line)),
            Err(mpsc::TryRecvError::Empty) => Ok(None),
            Err(mpsc::TryRecvError::Disconnected) => Err(()),
        }
    }

    /// Block the calling thread until a line arrives. `None` at EOF.
    fn read_line_blocking(&self) -> Option<String> {
        self.lines.lock().ok()?.recv().ok()
    }
}

impl LineInput for Console {
    async fn next_event(&mut self) -> io::Result<InputEvent> {
        loop {
            match self.try_line() {
                Ok(Some(line)) => return Ok(InputEvent::Line(line)),
                Err(()) => return Ok(InputEvent::Eof),
                Ok(None) => {}
            }
            tokio::select! {
                () = self.ready.notified() => {}
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    return Ok(InputEvent::Interrupt);
                }
            }
        }
    }
}

impl Prompt for Console {
    fn confirm(&self, message: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{message} [y/N] ");
        let _ = stderr.flush();
        self.read_line_blocking()
            .is_some_and(|answer| crate::guard::is_yes(&answer))
    }
}
