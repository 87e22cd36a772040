use anyhow::{Context, Result};
use clap::Parser;
use intcode_vm::{amp, int_code, CLIArgs};

#[derive(Debug, Parser)]
struct AmpArgs {
    #[command(flatten)]
    common: CLIArgs,
    /// Connect the last amplifier back to the first one.
    #[arg(long)]
    feedback: bool,
    /// Pool of phase settings, every permutation of it is tried.
    #[arg(long, value_delimiter = ',')]
    phases: Option<Vec<i64>>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = AmpArgs::parse();
    let input_path = &args.common.input_path;
    let program = int_code::read_int_code(input_path).with_context(|| {
        format!(
            "Failed to read intcode program from given input file({}).",
            input_path.display()
        )
    })?;

    let phases = args.phases.unwrap_or_else(|| {
        if args.feedback {
            vec![5, 6, 7, 8, 9]
        } else {
            vec![0, 1, 2, 3, 4]
        }
    });
    let (setting, signal) = amp::max_signal(&program, &phases, args.feedback)
        .with_context(|| format!("Failed to search phase settings in {:?}.", phases))?;
    println!(
        "The highest signal is {}, from phase setting {:?}.",
        signal, setting
    );

    Ok(())
}
