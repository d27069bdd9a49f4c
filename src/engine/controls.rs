use std::str::FromStr;

use anyhow::{anyhow, Error};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, error::TryRecvError};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Which affordances were activated since the last poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlSignals {
    pub start: bool,
    pub restart: bool,
    pub exit: bool,
}

impl ControlSignals {
    pub fn is_empty(&self) -> bool {
        !(self.start || self.restart || self.exit)
    }

    fn record(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Start => self.start = true,
            ControlEvent::Restart => self.restart = true,
            ControlEvent::Exit => self.exit = true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Start,
    Restart,
    Exit,
}

impl FromStr for ControlEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "s" => Ok(Self::Start),
            "restart" | "r" => Ok(Self::Restart),
            "exit" | "quit" | "q" => Ok(Self::Exit),
            other => Err(anyhow!("unknown control '{other}'")),
        }
    }
}

/// Hit-testing lives in the renderer; the engine only asks what fired.
pub trait ControlSurface {
    fn poll(&mut self) -> ControlSignals;
}

/// Control surface fed through a channel by whatever owns the real input.
pub struct ChannelControls {
    rx: mpsc::Receiver<ControlEvent>,
    closed: bool,
}

impl ChannelControls {
    pub fn channel(capacity: usize) -> (mpsc::Sender<ControlEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx, closed: false })
    }
}

impl ControlSurface for ChannelControls {
    fn poll(&mut self) -> ControlSignals {
        let mut signals = ControlSignals::default();
        while !self.closed {
            match self.rx.try_recv() {
                Ok(event) => signals.record(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.closed = true,
            }
        }
        signals
    }
}

/// Forward `start` / `restart` / `exit` lines from stdin until EOF.
pub async fn forward_stdin(tx: mpsc::Sender<ControlEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match line.parse::<ControlEvent>() {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(err) => log_warn!("{err}"),
            },
            Ok(None) => {
                log_info!("stdin closed, no more control input");
                break;
            }
            Err(err) => {
                log_warn!("failed to read control input: {err}");
                break;
            }
        }
    }
}
