pub mod com;
pub mod inst;
pub mod io;
pub mod mem;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
    str::FromStr,
};

use crate::Error;

use com::{Process, ProcessResult, ProcessState};
use io::{Channel, InputFn, OutputFn};
use mem::Memory;

/// Parsed intcode, never modified, each process copies it into its own memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    codes: Vec<i64>,
}

impl Program {
    pub fn new(codes: Vec<i64>) -> Self {
        Self { codes }
    }

    pub fn codes(&self) -> &[i64] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl FromStr for Program {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A trailing comma ends the list, it's not an empty code.
        let s = s.trim().trim_end_matches(',');
        if s.is_empty() {
            return Err(Error::EmptyIntCode);
        }

        s.split(',')
            .map(|t| {
                let t = t.trim();
                t.parse::<i64>()
                    .map_err(|_| Error::ParseIntError(t.to_string()))
            })
            .collect::<Result<Vec<_>, Error>>()
            .map(Program::new)
    }
}

pub fn read_int_code<P>(path: P) -> Result<Program, Error>
where
    P: AsRef<Path>,
{
    let code_file = File::open(path)?;
    let reader = BufReader::new(code_file);

    reader
        .lines()
        .next()
        .map_or(Err(Error::EmptyIntCode), |res| res?.parse())
}

/// Run a program without any I/O, returning its final memory.
pub fn run_to_halt(text: &str) -> Result<Memory, Error> {
    let program = text.parse::<Program>()?;
    run_no_io(Process::new(&program))
}

/// Run a program after putting `noun` and `verb` into cells 1 and 2.
pub fn run_with_noun_verb(text: &str, noun: i64, verb: i64) -> Result<Memory, Error> {
    let program = text.parse::<Program>()?;
    let mut proc = Process::new(&program);
    proc.mem_mut().write(1, noun)?;
    proc.mem_mut().write(2, verb)?;
    run_no_io(proc)
}

/// Feed `inputs`, collect every output, and report whether the program halted or ran out
/// of input.
pub fn run_with_inputs(text: &str, inputs: &[i64]) -> Result<(Vec<i64>, ProcessState), Error> {
    let program = text.parse::<Program>()?;
    let mut proc = Process::new(&program);
    let mut input = Channel::new(inputs);
    let mut output = Vec::new();
    let state = proc.run(&mut input, &mut output)?;

    Ok((output, state))
}

/// Give a single input and get the answer, which is the last output of the program.
pub fn run_with_single_io(text: &str, input: i64) -> Result<i64, Error> {
    let (outputs, state) = run_with_inputs(text, &[input])?;
    if state != ProcessState::Halt {
        return Err(Error::NotEnoughInput);
    }

    outputs.last().copied().ok_or(Error::NoOutput)
}

/// Run on the calling thread, asking `supplier` for each input and handing each output
/// to `consumer`.
pub fn run_with_callbacks<S, C>(
    text: &str,
    mut supplier: S,
    consumer: C,
) -> Result<ProcessResult, Error>
where
    S: FnMut() -> i64,
    C: FnMut(i64),
{
    let program = text.parse::<Program>()?;
    let mut proc = Process::new(&program);
    proc.run(&mut InputFn(|| Some(supplier())), &mut OutputFn(consumer))?;

    Ok(proc.into_result())
}

fn run_no_io(mut proc: Process) -> Result<Memory, Error> {
    let mut input = Channel::default();
    let mut output = Vec::new();
    match proc.run(&mut input, &mut output)? {
        ProcessState::Halt => Ok(proc.into_result().into_image()),
        _ => Err(Error::NotEnoughInput),
    }
}
