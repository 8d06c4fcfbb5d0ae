//! The engine thread: sole owner of the [`Router`].
//!
//! Input callbacks and the process lifecycle talk to it only through
//! [`EngineCommand`]s on a bounded channel. Between commands the thread sleeps
//! until the next clock deadline, so clock pulses and input handling never race.

use crate::error::{Error, Result};
use cloro_midi::{MidiBytes, MidiSink, Router, Source};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use rand::Rng;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info};

/// Queue depth between input callbacks and the engine.
pub const DEFAULT_COMMAND_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Raw bytes from one input, undecoded.
    Input { source: Source, bytes: MidiBytes },
    Shutdown,
}

/// Cloneable, non-blocking handle for feeding the engine.
#[derive(Debug, Clone)]
pub struct EngineSender {
    sender: Sender<EngineCommand>,
}

impl EngineSender {
    /// Queues raw input bytes. Returns `false` if the event was dropped.
    pub fn send_input(&self, source: Source, bytes: &[u8]) -> bool {
        let command = EngineCommand::Input {
            source,
            bytes: MidiBytes::from_slice(bytes),
        };
        match self.sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Engine queue full, dropping event from {}", source);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Asks the engine to stop. Blocks only while the queue is full.
    pub fn shutdown(&self) -> Result<()> {
        self.sender
            .send(EngineCommand::Shutdown)
            .map_err(|_| Error::EngineStopped)
    }
}

/// Runs the dispatch loop on the current thread until shutdown or until every
/// sender is gone.
pub fn run<R, S>(router: &mut Router<R>, commands: &Receiver<EngineCommand>, sink: &mut S)
where
    R: Rng,
    S: MidiSink + ?Sized,
{
    loop {
        // A due pulse goes out before the next command so input floods cannot
        // starve the clock.
        router.poll_clock(Instant::now(), sink);

        let command = match router.clock_deadline() {
            Some(deadline) => commands.recv_deadline(deadline),
            None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match command {
            Ok(EngineCommand::Input { source, bytes }) => {
                router.handle_bytes(source, &bytes, Instant::now(), sink);
            }
            Ok(EngineCommand::Shutdown) => {
                debug!("Engine shutdown requested");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("All engine senders dropped");
                break;
            }
        }
    }
}

/// A running engine thread.
pub struct EngineHandle {
    sender: EngineSender,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Moves `router` and `sink` onto a new `cloro-engine` thread.
    pub fn spawn<R, S>(router: Router<R>, sink: S) -> Result<Self>
    where
        R: Rng + Send + 'static,
        S: MidiSink + Send + 'static,
    {
        Self::spawn_with_capacity(router, sink, DEFAULT_COMMAND_CAPACITY)
    }

    pub fn spawn_with_capacity<R, S>(
        mut router: Router<R>,
        mut sink: S,
        capacity: usize,
    ) -> Result<Self>
    where
        R: Rng + Send + 'static,
        S: MidiSink + Send + 'static,
    {
        let (sender, receiver) = bounded(capacity);

        let thread = thread::Builder::new()
            .name("cloro-engine".to_string())
            .spawn(move || {
                info!(
                    "Engine running, clock interval {:?}",
                    router.clock_interval()
                );
                run(&mut router, &receiver, &mut sink);
                // `sink` drops here, closing the output
            })
            .map_err(|e| Error::MidiDevice(format!("Failed to spawn engine thread: {}", e)))?;

        Ok(Self {
            sender: EngineSender { sender },
            thread: Some(thread),
        })
    }

    pub fn sender(&self) -> EngineSender {
        self.sender.clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Sends `Shutdown` and waits for the thread to exit.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown_and_join()
    }

    /// Waits for the thread to exit on its own (after someone else sent
    /// `Shutdown` through an [`EngineSender`]).
    pub fn join(mut self) -> Result<()> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| Error::EngineStopped),
            None => Ok(()),
        }
    }

    fn shutdown_and_join(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        // An already-exited engine has dropped its receiver
        let _ = self.sender.shutdown();
        thread.join().map_err(|_| Error::EngineStopped)
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_and_join();
    }
}
