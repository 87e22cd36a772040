use std::thread;

use log::{debug, info};
use rayon::prelude::*;
use thiserror::Error;

use crate::int_code::{
    com::{Process, ProcessState},
    io::{pipe, Channel, RecordingPort},
    Program,
};

pub struct AmpSettings {
    settings: Vec<Vec<i64>>,
}

impl From<&[i64]> for AmpSettings {
    fn from(init_setting: &[i64]) -> Self {
        AmpSettings {
            settings: Self::gen_permutation(init_setting),
        }
    }
}

impl AmpSettings {
    pub fn new(amp_count: usize) -> AmpSettings {
        let init_setting = (0..amp_count as i64).collect::<Vec<_>>();
        Self::from(init_setting.as_slice())
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[i64]> {
        self.settings.iter().map(|s| s.as_slice())
    }

    pub fn par_iter(&self) -> impl ParallelIterator<Item = &[i64]> {
        self.settings.par_iter().map(|s| s.as_slice())
    }

    fn gen_permutation(init_numbers: &[i64]) -> Vec<Vec<i64>> {
        let mut permutations = Vec::new();
        let mut numbers = Vec::from(init_numbers);
        let number_count = numbers.len();
        Self::gen_permutation_recur(&mut permutations, &mut numbers, number_count);
        permutations
    }

    // Heap's algorithm to generate permutation of slice.
    fn gen_permutation_recur(
        permutations: &mut Vec<Vec<i64>>,
        numbers: &mut [i64],
        cur_size: usize,
    ) {
        if cur_size <= 1 {
            permutations.push(Vec::from(numbers));
            return;
        }

        for i in 0..cur_size {
            Self::gen_permutation_recur(permutations, numbers, cur_size - 1);

            if cur_size % 2 == 1 {
                numbers.swap(0, cur_size - 1);
            } else {
                numbers.swap(i, cur_size - 1);
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process(Amplifier #{0}) blocked in amplifier chain")]
    ProcessBlockInChain(usize),
    #[error("Amplifiers have empty result with settings({0:?})")]
    EmptyAmplifierResult(Vec<i64>),
    #[error("Error({0}) in execution of amplifiers with settings({1:?})")]
    ExecutionError(crate::Error, Vec<i64>),
    #[error("There has some processes blocked in amplifier loop with settings({0:?})")]
    AmplifierInLoopStuck(Vec<i64>),
    #[error("Got empty output from amplifier loop after all are halted")]
    EmptyOutputFromAmplifierLoop,
    #[error("No phase setting given to amplifiers")]
    NoPhaseSetting,
}

/// Run amplifiers one after another, each fed with its phase and the previous signal.
pub fn amp_chain(program: &Program, settings: &[i64]) -> Result<i64, Error> {
    if settings.is_empty() {
        return Err(Error::NoPhaseSetting);
    }

    let mut amp_res = 0;
    for (i, &phase) in settings.iter().enumerate() {
        let mut proc = Process::new(program);
        let mut input_chan = Channel::new(&[phase, amp_res]);
        let mut output = Vec::new();
        let state = proc
            .run(&mut input_chan, &mut output)
            .map_err(|e| Error::ExecutionError(e, Vec::from(settings)))?;

        if state != ProcessState::Halt {
            return Err(Error::ProcessBlockInChain(i));
        }

        amp_res = output
            .first()
            .copied()
            .ok_or(Error::EmptyAmplifierResult(Vec::from(settings)))?;
    }

    Ok(amp_res)
}

/// Run amplifiers in a ring, one thread each. The last amplifier feeds the first one,
/// the answer is the last value the last amplifier emits before halting.
pub fn amp_loop(program: &Program, settings: &[i64], seed: i64) -> Result<i64, Error> {
    let amp_count = settings.len();
    if amp_count == 0 {
        return Err(Error::NoPhaseSetting);
    }

    let exe_err = |e| Error::ExecutionError(e, Vec::from(settings));
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..amp_count).map(|_| pipe()).unzip();
    let mut handles = Vec::with_capacity(amp_count);
    for i in 0..amp_count {
        let mut input = receivers[i].clone();
        let mut output = RecordingPort::new(senders[(i + 1) % amp_count].clone());
        let mut proc = Process::new(program);
        let name = format!("amp-{}", i);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let state = proc.run(&mut input, &mut output)?;
                Ok::<_, crate::Error>((state, output.last()))
            })
            .map_err(|e| exe_err(crate::Error::from(e)))?;
        handles.push((name, handle));
    }

    debug!("Amplifier loop started with settings {:?}.", settings);
    // Every stage is running before any input arrives.
    let inject = || -> Result<(), crate::Error> {
        for (sender, &phase) in senders.iter().zip(settings) {
            sender
                .send(phase)
                .map_err(|_| crate::Error::ChannelDisconnected)?;
        }
        senders[0]
            .send(seed)
            .map_err(|_| crate::Error::ChannelDisconnected)
    };
    let inject_res = inject();
    // Keep the receivers alive so a halted stage doesn't fail its upstream's last output.
    drop(senders);

    // Join every stage before reporting any error.
    let results = handles
        .into_iter()
        .map(|(name, handle)| {
            handle
                .join()
                .map_err(|_| crate::Error::WorkerPanicked(name))
                .and_then(|res| res)
        })
        .collect::<Vec<_>>();
    drop(receivers);
    inject_res.map_err(exe_err)?;
    let results = results
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(exe_err)?;

    if results.iter().any(|(state, _)| *state != ProcessState::Halt) {
        return Err(Error::AmplifierInLoopStuck(Vec::from(settings)));
    }

    results
        .last()
        .and_then(|(_, last)| *last)
        .ok_or(Error::EmptyOutputFromAmplifierLoop)
}

/// Search all permutations of `phase_pool`, returning the best setting and its signal.
pub fn max_signal(
    program: &Program,
    phase_pool: &[i64],
    feedback: bool,
) -> Result<(Vec<i64>, i64), Error> {
    if phase_pool.is_empty() {
        return Err(Error::NoPhaseSetting);
    }

    let settings = AmpSettings::from(phase_pool);
    info!(
        "Search {} phase setting(s) of {:?}, feedback: {}.",
        settings.len(),
        phase_pool,
        feedback
    );
    let signals = settings
        .par_iter()
        .map(|setting| {
            let signal = if feedback {
                amp_loop(program, setting, 0)
            } else {
                amp_chain(program, setting)
            }?;
            Ok::<_, Error>((Vec::from(setting), signal))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    signals
        .into_iter()
        .max_by_key(|(_, signal)| *signal)
        .ok_or(Error::NoPhaseSetting)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn heap_permutation_covers_every_order() {
        let settings = AmpSettings::new(4);
        let uniq = settings.iter().map(Vec::from).collect::<HashSet<_>>();
        assert_eq!(settings.len(), 24);
        assert_eq!(uniq.len(), 24);
    }
}
