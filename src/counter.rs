//! Background counter driven by messages.
//!
//! The counter value and its direction live on a single owner thread. The
//! driving shell only sends commands (`set_direction`, `stop`) and reads the
//! values the owner publishes on every tick.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::CounterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Up,
    Down,
}

impl Direction {
    fn step(self) -> i64 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

const DISPLAY_BUFFER: usize = 1;

#[derive(Debug)]
enum Command {
    SetDirection(Direction),
    Stop,
}

struct Running {
    commands: Sender<Command>,
    handle: JoinHandle<i64>,
}

pub struct Counter {
    tick: Duration,
    running: Option<Running>,
}

impl Counter {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start counting from zero on a background thread.
    ///
    /// Returns the stream of published values. Does not block. The stream
    /// holds at most one unread value; a reader that falls behind sees the
    /// latest one and misses those in between.
    pub fn start(&mut self) -> Result<Receiver<i64>, CounterError> {
        if self.running.is_some() {
            return Err(CounterError::AlreadyRunning);
        }

        let (command_tx, command_rx) = mpsc::channel();
        let (display_tx, display_rx) = mpsc::sync_channel(DISPLAY_BUFFER);
        let tick = self.tick;
        let handle = thread::Builder::new()
            .name("counter".to_string())
            .spawn(move || run(tick, command_rx, display_tx))
            .map_err(|e| {
                warn!("failed to spawn counter thread: {}", e);
                CounterError::Disconnected
            })?;

        self.running = Some(Running {
            commands: command_tx,
            handle,
        });
        Ok(display_rx)
    }

    /// Change the step sign. Applies from the next tick on.
    pub fn set_direction(&self, direction: Direction) -> Result<(), CounterError> {
        let running = self.running.as_ref().ok_or(CounterError::NotRunning)?;
        running
            .commands
            .send(Command::SetDirection(direction))
            .map_err(|_| CounterError::Disconnected)
    }

    /// Stop the owner thread and return the value of its last tick, whether
    /// or not a reader picked it up.
    pub fn stop(&mut self) -> Result<i64, CounterError> {
        let running = self.running.take().ok_or(CounterError::NotRunning)?;
        // A send failure means the thread is already gone; join reports how.
        let _ = running.commands.send(Command::Stop);
        running.handle.join().map_err(|_| CounterError::Disconnected)
    }
}

impl Drop for Counter {
    fn drop(&mut self) {
        if self.running.is_some() {
            let _ = self.stop();
        }
    }
}

fn run(tick: Duration, commands: Receiver<Command>, display: SyncSender<i64>) -> i64 {
    let mut value: i64 = 0;
    let mut direction = Direction::Up;

    loop {
        let shown = value;
        // A full or closed display drops the value; counting goes on.
        let _ = display.try_send(shown);
        value += direction.step();

        let deadline = Instant::now() + tick;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match commands.recv_timeout(remaining) {
                Ok(Command::SetDirection(next)) => direction = next,
                Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => {
                    debug!("counter stopped at {}", shown);
                    return shown;
                }
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
    }
}
