use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace};

use crate::Error;

use super::{
    inst::{ExecutionState, Instruction},
    io::{InputPort, OutputPort},
    mem::Memory,
    Program,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProcessState {
    Ready,
    Running,
    Block,
    Halt,
    Fault,
}

#[derive(Debug, Clone)]
pub struct ProcessResult {
    step_count: usize,
    state: ProcessState,
    image: Memory,
}

impl ProcessResult {
    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn image(&self) -> &Memory {
        &self.image
    }

    pub fn into_image(self) -> Memory {
        self.image
    }
}

/// One intcode machine: memory, instruction pointer and relative base.
#[derive(Debug, Clone)]
pub struct Process {
    state: ProcessState,
    inst_p: usize,
    rel_base: i64,
    mem: Memory,
    step_count: usize,
}

impl Process {
    pub fn new(program: &Program) -> Self {
        Self::from(Memory::from(program))
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn inst_p(&self) -> usize {
        self.inst_p
    }

    pub fn rel_base(&self) -> i64 {
        self.rel_base
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn mem(&self) -> &Memory {
        &self.mem
    }

    pub fn mem_mut(&mut self) -> &mut Memory {
        &mut self.mem
    }

    /// Execute exactly one instruction.
    pub fn step<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<ProcessState, Error>
    where
        I: InputPort + ?Sized,
        O: OutputPort + ?Sized,
    {
        if !self.prepare()? {
            return Ok(self.state);
        }

        self.exe_cur_inst(input, output)?;
        if self.state == ProcessState::Running {
            self.state = ProcessState::Ready;
        }

        Ok(self.state)
    }

    /// Run until the process halts or blocks on input.
    pub fn run<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<ProcessState, Error>
    where
        I: InputPort + ?Sized,
        O: OutputPort + ?Sized,
    {
        self.exe_loop(input, output, None, None)
    }

    /// Like [`Process::run`], but also stops (in state `Ready`) once `stop` is set.
    /// The flag is checked between instructions only.
    pub fn run_until<I, O>(
        &mut self,
        input: &mut I,
        output: &mut O,
        stop: &AtomicBool,
    ) -> Result<ProcessState, Error>
    where
        I: InputPort + ?Sized,
        O: OutputPort + ?Sized,
    {
        self.exe_loop(input, output, Some(stop), None)
    }

    /// Like [`Process::run_until`], but also pauses (in state `Ready`) once `max_steps`
    /// instructions have run in this call.
    pub fn run_bounded<I, O>(
        &mut self,
        input: &mut I,
        output: &mut O,
        stop: &AtomicBool,
        max_steps: usize,
    ) -> Result<ProcessState, Error>
    where
        I: InputPort + ?Sized,
        O: OutputPort + ?Sized,
    {
        self.exe_loop(input, output, Some(stop), Some(max_steps))
    }

    pub fn into_result(self) -> ProcessResult {
        ProcessResult {
            step_count: self.step_count,
            state: self.state,
            image: self.mem,
        }
    }

    // Returns false if there is nothing left to execute.
    fn prepare(&mut self) -> Result<bool, Error> {
        match self.state {
            ProcessState::Fault => Err(Error::ProcessFaulted),
            ProcessState::Halt => Ok(false),
            _ => {
                self.state = ProcessState::Running;
                Ok(true)
            }
        }
    }

    fn exe_loop<I, O>(
        &mut self,
        input: &mut I,
        output: &mut O,
        stop: Option<&AtomicBool>,
        max_steps: Option<usize>,
    ) -> Result<ProcessState, Error>
    where
        I: InputPort + ?Sized,
        O: OutputPort + ?Sized,
    {
        if !self.prepare()? {
            return Ok(self.state);
        }

        let start_step = self.step_count;
        debug!("Process starts running @ {}.", self.inst_p);
        loop {
            if stop.is_some_and(|s| s.load(Ordering::Acquire)) {
                debug!("Process stopped by signal @ {}.", self.inst_p);
                self.state = ProcessState::Ready;
                break;
            }

            if max_steps.is_some_and(|m| self.step_count - start_step >= m) {
                debug!(
                    "Process paused after {} step(s) @ {}.",
                    self.step_count - start_step,
                    self.inst_p
                );
                self.state = ProcessState::Ready;
                break;
            }

            self.exe_cur_inst(input, output)?;
            match self.state {
                ProcessState::Running => (),
                ProcessState::Halt => {
                    debug!("Process halt after {} step(s).", self.step_count);
                    break;
                }
                ProcessState::Block => {
                    debug!("Process blocked by requiring input @ {}.", self.inst_p);
                    break;
                }
                ProcessState::Ready | ProcessState::Fault => unreachable!(),
            }
        }

        Ok(self.state)
    }

    fn exe_cur_inst<I, O>(&mut self, input: &mut I, output: &mut O) -> Result<(), Error>
    where
        I: InputPort + ?Sized,
        O: OutputPort + ?Sized,
    {
        let inst = match Instruction::decode(&self.mem, self.inst_p) {
            Ok(inst) => inst,
            Err(e) => return Err(self.fault(e)),
        };
        trace!("step # {}: {:?} @ {}", self.step_count, inst, self.inst_p);

        let mut run_proc = RunningProcess {
            proc: &mut *self,
            input,
            output,
        };
        if let Err(e) = inst.execute(&mut run_proc) {
            return Err(self.fault(e));
        }

        if self.state != ProcessState::Block {
            self.step_count += 1;
        }

        Ok(())
    }

    fn fault(&mut self, e: Error) -> Error {
        debug!(
            "Process faulted @ {} after {} step(s): {}",
            self.inst_p, self.step_count, e
        );
        self.state = ProcessState::Fault;
        e
    }
}

impl From<Memory> for Process {
    fn from(mem: Memory) -> Self {
        Self {
            state: ProcessState::Ready,
            inst_p: 0,
            rel_base: 0,
            mem,
            step_count: 0,
        }
    }
}

struct RunningProcess<'a, I: ?Sized, O: ?Sized> {
    proc: &'a mut Process,
    input: &'a mut I,
    output: &'a mut O,
}

impl<'a, I, O> ExecutionState for RunningProcess<'a, I, O>
where
    I: InputPort + ?Sized,
    O: OutputPort + ?Sized,
{
    fn mem(&self) -> &Memory {
        &self.proc.mem
    }

    fn mem_mut(&mut self) -> &mut Memory {
        &mut self.proc.mem
    }

    fn input(&mut self) -> Option<i64> {
        self.input.get()
    }

    fn output(&mut self, value: i64) -> Result<(), Error> {
        self.output.put(value)
    }

    fn inst_p_mut(&mut self) -> &mut usize {
        &mut self.proc.inst_p
    }

    fn rel_base(&self) -> i64 {
        self.proc.rel_base
    }

    fn rel_base_mut(&mut self) -> &mut i64 {
        &mut self.proc.rel_base
    }

    fn halt(&mut self) {
        self.proc.state = ProcessState::Halt;
    }

    fn block(&mut self) {
        self.proc.state = ProcessState::Block;
    }
}
