use anyhow::{Context, Result};
use clap::Parser;
use intcode_vm::{
    int_code,
    nic::{self, NetworkConfig},
    CLIArgs,
};

#[derive(Debug, Parser)]
struct NetworkArgs {
    #[command(flatten)]
    common: CLIArgs,
    /// Number of hosts in network.
    #[arg(long, default_value_t = 50)]
    hosts: usize,
    /// Address intercepted by NAT.
    #[arg(long, default_value_t = 255)]
    nat_addr: usize,
    /// Give up after this many ticks.
    #[arg(long)]
    max_ticks: Option<usize>,
    /// Give up when one host runs this many instructions in a tick without asking for input.
    #[arg(long)]
    max_tick_steps: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = NetworkArgs::parse();
    let input_path = &args.common.input_path;
    let program = int_code::read_int_code(input_path).with_context(|| {
        format!(
            "Failed to read intcode program from given input file({}).",
            input_path.display()
        )
    })?;

    let config = NetworkConfig {
        host_n: args.hosts,
        nat_addr: args.nat_addr,
        max_ticks: args.max_ticks,
        max_tick_steps: args.max_tick_steps,
        ..Default::default()
    };
    let report = nic::run_network(&program, &config)
        .with_context(|| format!("Failed to run network of {} host(s).", config.host_n))?;
    match report.first_nat_packet() {
        Some(packet) => println!(
            "The first packet sent to address({}) is {}, its y is {}.",
            config.nat_addr,
            packet,
            packet.y()
        ),
        None => println!("There isn't any packet sent to address({}).", config.nat_addr),
    }
    println!(
        "NAT has sent two packets with the same y({}) to address {} in a row, after {} tick(s).",
        report.repeated_y(),
        config.nat_send_addr,
        report.ticks()
    );

    Ok(())
}
