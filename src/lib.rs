//! Intcode virtual machine, its I/O ports, and the multi-VM topologies built on them:
//! an amplifier feedback ring, a request/response actor and an address-routed network
//! with NAT idle recovery.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

pub mod actor;
pub mod amp;
pub mod ascii;
pub mod int_code;
pub mod nic;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O Error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Get empty code in given text")]
    EmptyIntCode,
    #[error("Failed to parse integer from string({0})")]
    ParseIntError(String),
    #[error("Invalid address({0}) found in execution")]
    InvalidAddress(i64),
    #[error("Invalid parameter mode({0}) found when write into memory")]
    InvalidWriteMode(u8),
    #[error("Unknown operation code({0}) found in execution")]
    UnknownOpcode(i64),
    #[error("Unknown parameter mode({0}) found")]
    UnknownParameterMode(i64),
    #[error("Not enough input in execution, inputs exhausted")]
    NotEnoughInput,
    #[error("Process has faulted before, can't execute it any more")]
    ProcessFaulted,
    #[error("Program halted without any output")]
    NoOutput,
    #[error("Channel is disconnected, the other side has gone")]
    ChannelDisconnected,
    #[error("Worker thread({0}) panicked")]
    WorkerPanicked(String),
    #[error("Actor has stopped, no more output from it")]
    ActorStopped,
}

/// Arguments shared by every binary: the file holding the intcode program.
#[derive(Debug, Parser)]
pub struct CLIArgs {
    pub input_path: PathBuf,
}
