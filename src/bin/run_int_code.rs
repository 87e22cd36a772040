use anyhow::{bail, Context, Result};
use clap::Parser;
use intcode_vm::{
    int_code::{
        self,
        com::{Process, ProcessState},
        io::Channel,
    },
    CLIArgs,
};

#[derive(Debug, Parser)]
struct RunArgs {
    #[command(flatten)]
    common: CLIArgs,
    /// Value put into position 1 before running.
    #[arg(long)]
    noun: Option<i64>,
    /// Value put into position 2 before running.
    #[arg(long)]
    verb: Option<i64>,
    /// Input values, in order.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    input: Vec<i64>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = RunArgs::parse();
    let input_path = &args.common.input_path;
    let program = int_code::read_int_code(input_path).with_context(|| {
        format!(
            "Failed to read intcode program from given input file({}).",
            input_path.display()
        )
    })?;

    let mut proc = Process::new(&program);
    if let Some(noun) = args.noun {
        proc.mem_mut().write(1, noun)?;
    }
    if let Some(verb) = args.verb {
        proc.mem_mut().write(2, verb)?;
    }

    let mut input = Channel::new(&args.input);
    let mut output = Vec::new();
    let state = proc
        .run(&mut input, &mut output)
        .context("Failed to execute given intcode program.")?;
    if state != ProcessState::Halt {
        bail!(
            "Program blocked for input after {} step(s), given input({:?}) isn't enough.",
            proc.step_count(),
            args.input
        );
    }

    if output.is_empty() {
        println!(
            "Program halted after {} step(s), the value at position 0 is {}.",
            proc.step_count(),
            proc.mem().read(0)?
        );
    } else {
        let output = output.iter().map(|v| v.to_string()).collect::<Vec<_>>();
        println!(
            "Program halted after {} step(s), outputs: {}.",
            proc.step_count(),
            output.join(",")
        );
    }

    Ok(())
}
