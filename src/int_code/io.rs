use std::collections::VecDeque;

use crossbeam_channel::{Receiver, Sender};
use log::trace;

use crate::Error;

// Input port for process, data source.
// `None` means no data will come through this port for now, the process blocks.
pub trait InputPort {
    fn get(&mut self) -> Option<i64>;
}

// Output port for process, data sink, must not block.
pub trait OutputPort {
    fn put(&mut self, value: i64) -> Result<(), Error>;
}

impl<T: InputPort + ?Sized> InputPort for &mut T {
    fn get(&mut self) -> Option<i64> {
        (**self).get()
    }
}

impl<T: OutputPort + ?Sized> OutputPort for &mut T {
    fn put(&mut self, value: i64) -> Result<(), Error> {
        (**self).put(value)
    }
}

/// FIFO queue used on one thread, a process reading an empty channel blocks.
#[derive(Debug, Clone, Default)]
pub struct Channel {
    data: VecDeque<i64>,
}

impl Channel {
    pub fn new(init_input: &[i64]) -> Self {
        Self {
            data: VecDeque::from_iter(init_input.iter().copied()),
        }
    }

    pub fn push(&mut self, value: i64) {
        self.data.push_back(value)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl InputPort for Channel {
    fn get(&mut self) -> Option<i64> {
        self.data.pop_front()
    }
}

impl OutputPort for Channel {
    fn put(&mut self, value: i64) -> Result<(), Error> {
        self.data.push_back(value);
        Ok(())
    }
}

impl OutputPort for Vec<i64> {
    fn put(&mut self, value: i64) -> Result<(), Error> {
        self.push(value);
        Ok(())
    }
}

// Blocks the calling thread until the sender side puts a value, or all senders are gone.
impl InputPort for Receiver<i64> {
    fn get(&mut self) -> Option<i64> {
        let res = self.recv().ok();
        if res.is_none() {
            trace!("Input channel disconnected.");
        }

        res
    }
}

impl OutputPort for Sender<i64> {
    fn put(&mut self, value: i64) -> Result<(), Error> {
        self.send(value).map_err(|_| Error::ChannelDisconnected)
    }
}

/// Input supplied by a closure, called once per input instruction.
pub struct InputFn<F>(pub F);

impl<F: FnMut() -> Option<i64>> InputPort for InputFn<F> {
    fn get(&mut self) -> Option<i64> {
        (self.0)()
    }
}

/// Output consumed by a closure, called once per output instruction.
pub struct OutputFn<F>(pub F);

impl<F: FnMut(i64)> OutputPort for OutputFn<F> {
    fn put(&mut self, value: i64) -> Result<(), Error> {
        (self.0)(value);
        Ok(())
    }
}

/// Forwards every value to the inner port and keeps a copy.
#[derive(Debug)]
pub struct RecordingPort<P> {
    inner: P,
    record: Vec<i64>,
}

impl<P: OutputPort> RecordingPort<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            record: Vec::new(),
        }
    }

    pub fn last(&self) -> Option<i64> {
        self.record.last().copied()
    }
}

impl<P: OutputPort> OutputPort for RecordingPort<P> {
    fn put(&mut self, value: i64) -> Result<(), Error> {
        self.inner.put(value)?;
        self.record.push(value);
        Ok(())
    }
}

/// Unbounded cross-thread pipe, one end for the producer, one for the consumer.
pub fn pipe() -> (Sender<i64>, Receiver<i64>) {
    crossbeam_channel::unbounded()
}
