use crate::config::DriverConfig;
use crate::error::DriverError;
use crate::genetic_algorithm::Engine;
use crate::snapshot::Snapshot;
use std::sync::mpsc::{
    self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError, TrySendError,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Control messages understood by the driver loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Toggle,
    /// Advance exactly one generation, running or not.
    Step,
    Reset,
    Shutdown,
}

enum Flow {
    Continue,
    Exit,
}

/// Runs an engine on its own thread.
///
/// The worker owns the engine outright; the only way to observe it is through
/// the snapshots it publishes between generations, so a reader never sees a
/// generation half-built.
pub struct Driver {
    commands: Sender<Command>,
    frames: Receiver<Snapshot>,
    worker: JoinHandle<Box<dyn Engine>>,
}

impl Driver {
    pub fn spawn(engine: Box<dyn Engine>, config: DriverConfig) -> Self {
        let (commands, command_rx) = mpsc::channel();
        let (frame_tx, frames) = mpsc::sync_channel(2);

        let worker =
            thread::spawn(move || Worker::new(engine, config, command_rx, frame_tx).run());

        Self {
            commands,
            frames,
            worker,
        }
    }

    pub fn send(&self, command: Command) -> Result<(), DriverError> {
        self.commands.send(command).map_err(|_| {
            warn!(?command, "driver worker is gone, command dropped");
            DriverError::WorkerStopped
        })
    }

    /// Snapshots published by the worker, at most one per frame.
    pub fn frames(&self) -> &Receiver<Snapshot> {
        &self.frames
    }

    /// Stops the worker and hands the engine back.
    pub fn shutdown(self) -> Result<Box<dyn Engine>, DriverError> {
        // the worker may already be gone, the join below reports how it ended
        let _ = self.commands.send(Command::Shutdown);
        self.worker.join().map_err(|_| DriverError::WorkerPanicked)
    }
}

struct Worker {
    engine: Box<dyn Engine>,
    config: DriverConfig,
    commands: Receiver<Command>,
    frames: SyncSender<Snapshot>,
    running: bool,
}

impl Worker {
    fn new(
        engine: Box<dyn Engine>,
        config: DriverConfig,
        commands: Receiver<Command>,
        frames: SyncSender<Snapshot>,
    ) -> Self {
        Self {
            engine,
            config,
            commands,
            frames,
            running: false,
        }
    }

    fn run(mut self) -> Box<dyn Engine> {
        let frame_time = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1) as f64);

        loop {
            let frame_start = Instant::now();

            if self.running {
                for _ in 0..self.config.batch_size() {
                    self.engine.run_generation();

                    if let Flow::Exit = self.drain() {
                        return self.engine;
                    }
                    if !self.running {
                        break;
                    }
                }
            }

            match self.frames.try_send(self.engine.render_snapshot()) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => return self.engine,
            }

            if let Flow::Exit = self.wait_until(frame_start + frame_time) {
                return self.engine;
            }
        }
    }

    // Applies pending commands without blocking
    fn drain(&mut self) -> Flow {
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if let Flow::Exit = self.apply(command) {
                        return Flow::Exit;
                    }
                }
                Err(TryRecvError::Empty) => return Flow::Continue,
                Err(TryRecvError::Disconnected) => return Flow::Exit,
            }
        }
    }

    // Sleeps until `deadline`, applying commands as they arrive
    fn wait_until(&mut self, deadline: Instant) -> Flow {
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Flow::Continue;
            }

            match self.commands.recv_timeout(deadline - now) {
                Ok(command) => {
                    if let Flow::Exit = self.apply(command) {
                        return Flow::Exit;
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Flow::Continue,
                Err(RecvTimeoutError::Disconnected) => return Flow::Exit,
            }
        }
    }

    fn apply(&mut self, command: Command) -> Flow {
        debug!(?command, generation = self.engine.generation(), "driver command");

        match command {
            Command::Start => self.running = true,
            Command::Stop => self.running = false,
            Command::Toggle => self.running = !self.running,
            Command::Step => self.engine.run_generation(),
            Command::Reset => self.engine.init_population(),
            Command::Shutdown => return Flow::Exit,
        }

        Flow::Continue
    }
}
