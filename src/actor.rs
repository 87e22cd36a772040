use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, warn};

use crate::{
    int_code::{
        com::{Process, ProcessResult},
        io::pipe,
        Program,
    },
    Error,
};

/// A process running on its own thread, driven turn by turn through [`Actor::action`].
pub struct Actor {
    name: String,
    input: Option<Sender<i64>>,
    output: Receiver<i64>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<ProcessResult, Error>>>,
}

impl Actor {
    pub fn start(program: &Program) -> Result<Self, Error> {
        Self::start_named(program, "actor")
    }

    pub fn start_named(program: &Program, name: &str) -> Result<Self, Error> {
        let (in_tx, mut in_rx) = pipe();
        let (mut out_tx, out_rx) = pipe();
        let stop = Arc::new(AtomicBool::new(false));
        let mut proc = Process::new(program);
        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                proc.run_until(&mut in_rx, &mut out_tx, &thread_stop)?;
                Ok::<_, Error>(proc.into_result())
            })?;
        debug!("Actor({}) started.", name);

        Ok(Self {
            name: name.to_string(),
            input: Some(in_tx),
            output: out_rx,
            stop,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn send(&self, value: i64) -> Result<(), Error> {
        self.input
            .as_ref()
            .ok_or(Error::ActorStopped)?
            .send(value)
            .map_err(|_| Error::ActorStopped)
    }

    /// Block until the process emits one value.
    pub fn recv(&self) -> Result<i64, Error> {
        self.output.recv().map_err(|_| Error::ActorStopped)
    }

    /// Push one input and wait for exactly one output.
    pub fn action(&self, input: i64) -> Result<i64, Error> {
        self.send(input)?;
        self.recv()
    }

    /// Stop the process after its current instruction and collect its final state.
    pub fn close(mut self) -> Result<ProcessResult, Error> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<ProcessResult, Error> {
        self.stop.store(true, Ordering::Release);
        // Wakes the process if it's waiting for input.
        self.input.take();
        let handle = self.handle.take().ok_or(Error::ActorStopped)?;
        let res = handle
            .join()
            .map_err(|_| Error::WorkerPanicked(self.name.clone()))?;
        debug!("Actor({}) closed.", self.name);

        res
    }
}

impl Drop for Actor {
    fn drop(&mut self) {
        if self.handle.is_some() {
            if let Err(e) = self.shutdown() {
                warn!("Actor({}) ended with error: {}", self.name, e);
            }
        }
    }
}
