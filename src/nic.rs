use std::{
    collections::VecDeque,
    fmt::Display,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, trace, warn};
use once_cell::unsync::OnceCell;
use thiserror::Error;

use crate::int_code::{
    com::{Process, ProcessState},
    io::Channel,
    Program,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Get error({1}) in execution of host @ {0}")]
    ExecutionError(usize, crate::Error),
    #[error("Try to send packet to invalid address({0})")]
    InvalidSendAddr(i64),
    #[error("Network doesn't settle after {0} tick(s)")]
    NetworkStalled(usize),
    #[error("Host @ {0} doesn't wait for input within {1} step(s) of one tick")]
    TickStepLimit(usize, usize),
    #[error("All hosts in network have halted before NAT sees a repeated packet")]
    NetworkHalted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    from_addr: usize,
    to_addr: usize,
    x: i64,
    y: i64,
}

impl Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(from: {}, to: {}, x: {}, y: {})",
            self.from(),
            self.to(),
            self.x(),
            self.y()
        )
    }
}

impl Packet {
    pub fn new(from_addr: usize, to_addr: usize, x: i64, y: i64) -> Self {
        Self {
            from_addr,
            to_addr,
            x,
            y,
        }
    }

    pub fn from(&self) -> usize {
        self.from_addr
    }

    pub fn to(&self) -> usize {
        self.to_addr
    }

    pub fn x(&self) -> i64 {
        self.x
    }

    pub fn y(&self) -> i64 {
        self.y
    }
}

enum PacketAsmState {
    Idle,
    WaitX,
    WaitY,
}

// Groups the output of one host into (destination, x, y) triples.
pub struct PacketAssembler {
    state: PacketAsmState,
    imm_packet: Packet,
}

impl PacketAssembler {
    pub fn new(addr: usize) -> Self {
        Self {
            state: PacketAsmState::Idle,
            imm_packet: Packet::new(addr, 0, 0, 0),
        }
    }

    pub fn assemble(&mut self, value: i64) -> Result<Option<Packet>, Error> {
        match self.state {
            PacketAsmState::Idle => {
                let to_addr = usize::try_from(value).map_err(|_| Error::InvalidSendAddr(value))?;
                self.imm_packet.to_addr = to_addr;
                self.state = PacketAsmState::WaitX;
                Ok(None)
            }
            PacketAsmState::WaitX => {
                self.imm_packet.x = value;
                self.state = PacketAsmState::WaitY;
                Ok(None)
            }
            PacketAsmState::WaitY => {
                self.imm_packet.y = value;
                self.state = PacketAsmState::Idle;
                Ok(Some(self.imm_packet.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub host_n: usize,
    pub nat_addr: usize,
    pub nat_send_addr: usize,
    /// Completed ticks allowed before giving up.
    pub max_ticks: Option<usize>,
    /// Instructions one host may run in a single tick.
    pub max_tick_steps: Option<usize>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host_n: 50,
            nat_addr: 255,
            nat_send_addr: 0,
            max_ticks: None,
            max_tick_steps: None,
        }
    }
}

#[derive(Debug)]
struct NetworkNAT {
    addr: usize,
    send_addr: usize,
    first_pac: OnceCell<Packet>,
    recv_pac: Option<Packet>,
    sent_pacs: Vec<Packet>,
}

impl NetworkNAT {
    fn new(addr: usize, send_addr: usize) -> Self {
        Self {
            addr,
            send_addr,
            first_pac: OnceCell::new(),
            recv_pac: None,
            sent_pacs: Vec::new(),
        }
    }

    fn recv(&mut self, pac: Packet) {
        debug!("NAT receive {}", pac);
        self.first_pac.get_or_init(|| pac.clone());
        self.recv_pac = Some(Packet::new(self.addr, self.send_addr, pac.x(), pac.y()));
    }

    // The packet stays in NAT, so it can be sent again on next idle.
    fn send(&mut self) -> Option<Packet> {
        let pac = self.recv_pac.clone()?;
        info!("Network is idle, NAT send {}.", pac);
        self.sent_pacs.push(pac.clone());
        Some(pac)
    }

    fn last_sent_y(&self) -> Option<i64> {
        self.sent_pacs.last().map(|p| p.y())
    }
}

#[derive(Debug, Clone)]
pub struct NetworkReport {
    first_nat_packet: Option<Packet>,
    repeated_y: i64,
    nat_deliveries: Vec<Packet>,
    ticks: usize,
}

impl NetworkReport {
    /// The first packet ever sent to NAT.
    pub fn first_nat_packet(&self) -> Option<&Packet> {
        self.first_nat_packet.as_ref()
    }

    /// Y delivered by NAT twice in a row.
    pub fn repeated_y(&self) -> i64 {
        self.repeated_y
    }

    pub fn nat_deliveries(&self) -> &[Packet] {
        &self.nat_deliveries
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }
}

#[derive(Debug)]
struct TickReport {
    outputs: Vec<i64>,
    state: ProcessState,
}

type TickResult = Result<TickReport, crate::Error>;

// One host of network, the process itself lives on the worker thread.
struct Host {
    addr: usize,
    inbox: VecDeque<i64>,
    pac_asm: PacketAssembler,
    halted: bool,
    tick_sender: Option<Sender<Vec<i64>>>,
    report_receiver: Receiver<TickResult>,
    handle: Option<JoinHandle<()>>,
}

impl Host {
    fn start(
        addr: usize,
        program: &Program,
        stop: Arc<AtomicBool>,
        max_steps: Option<usize>,
    ) -> Result<Self, Error> {
        let (tick_sender, tick_receiver) = crossbeam_channel::unbounded();
        let (report_sender, report_receiver) = crossbeam_channel::unbounded();
        let proc = Process::new(program);
        let handle = thread::Builder::new()
            .name(format!("nic-{}", addr))
            .spawn(move || {
                host_worker(addr, proc, tick_receiver, report_sender, stop, max_steps)
            })
            .map_err(|e| Error::ExecutionError(addr, crate::Error::from(e)))?;

        Ok(Self {
            addr,
            inbox: VecDeque::new(),
            pac_asm: PacketAssembler::new(addr),
            halted: false,
            tick_sender: Some(tick_sender),
            report_receiver,
            handle: Some(handle),
        })
    }

    // Hand all pending input to the host, or the sentinel if there's none.
    // Returns true if only the sentinel is given.
    fn feed(&mut self) -> Result<bool, Error> {
        let idle = self.inbox.is_empty();
        let batch = if idle {
            vec![-1]
        } else {
            self.inbox.drain(..).collect()
        };
        trace!("Host @ {} is given {:?}.", self.addr, batch);

        self.tick_sender
            .as_ref()
            .ok_or(Error::ExecutionError(self.addr, crate::Error::ChannelDisconnected))?
            .send(batch)
            .map_err(|_| self.worker_gone())?;

        Ok(idle)
    }

    fn wait_report(&self) -> Result<TickReport, Error> {
        self.report_receiver
            .recv()
            .map_err(|_| self.worker_gone())?
            .map_err(|e| Error::ExecutionError(self.addr, e))
    }

    fn worker_gone(&self) -> Error {
        Error::ExecutionError(
            self.addr,
            crate::Error::WorkerPanicked(format!("nic-{}", self.addr)),
        )
    }

    fn shutdown(&mut self) {
        self.tick_sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Worker of host @ {} panicked.", self.addr);
            }
        }
    }
}

fn host_worker(
    addr: usize,
    mut proc: Process,
    tick_receiver: Receiver<Vec<i64>>,
    report_sender: Sender<TickResult>,
    stop: Arc<AtomicBool>,
    max_steps: Option<usize>,
) {
    let mut input = Channel::new(&[addr as i64]);
    for batch in tick_receiver.iter() {
        batch.into_iter().for_each(|v| input.push(v));
        let mut outputs = Vec::new();
        let res = match max_steps {
            Some(m) => proc.run_bounded(&mut input, &mut outputs, &stop, m),
            None => proc.run_until(&mut input, &mut outputs, &stop),
        };
        let is_done = !matches!(res, Ok(ProcessState::Block));
        if report_sender
            .send(res.map(|state| TickReport { outputs, state }))
            .is_err()
            || is_done
        {
            break;
        }
    }

    trace!("Worker of host @ {} exits.", addr);
}

struct Network {
    hosts: Vec<Host>,
    nat: NetworkNAT,
    stop: Arc<AtomicBool>,
    max_tick_steps: Option<usize>,
}

impl Network {
    fn start(program: &Program, config: &NetworkConfig) -> Result<Self, Error> {
        let mut network = Network {
            hosts: Vec::with_capacity(config.host_n),
            nat: NetworkNAT::new(config.nat_addr, config.nat_send_addr),
            stop: Arc::new(AtomicBool::new(false)),
            max_tick_steps: config.max_tick_steps,
        };
        for addr in 0..config.host_n {
            let host = Host::start(addr, program, network.stop.clone(), config.max_tick_steps)?;
            network.hosts.push(host);
        }
        debug!("Network with {} host(s) started.", config.host_n);

        Ok(network)
    }

    fn run(&mut self, max_ticks: Option<usize>) -> Result<NetworkReport, Error> {
        let mut is_quiet = false;
        let mut tick_count = 0;
        loop {
            if self.hosts.iter().all(|h| h.halted) {
                return Err(Error::NetworkHalted);
            }

            if is_quiet && self.hosts.iter().all(|h| h.inbox.is_empty()) {
                let last_y = self.nat.last_sent_y();
                if let Some(pac) = self.nat.send() {
                    let y = pac.y();
                    self.route(pac);
                    if last_y == Some(y) {
                        info!("NAT sent y({}) twice in a row after {} tick(s).", y, tick_count);
                        return Ok(self.report(y, tick_count));
                    }
                }
            }

            if max_ticks.is_some_and(|m| tick_count >= m) {
                return Err(Error::NetworkStalled(tick_count));
            }

            is_quiet = self.tick()?;
            tick_count += 1;
        }
    }

    // Returns true if no host got any packet or sent anything in this tick.
    fn tick(&mut self) -> Result<bool, Error> {
        let mut is_quiet = true;
        for host in self.hosts.iter_mut().filter(|h| !h.halted) {
            is_quiet &= host.feed()?;
        }

        let mut packets = Vec::new();
        for host in self.hosts.iter_mut().filter(|h| !h.halted) {
            let report = host.wait_report()?;
            is_quiet &= report.outputs.is_empty();
            for value in report.outputs {
                if let Some(packet) = host.pac_asm.assemble(value)? {
                    packets.push(packet);
                }
            }

            match report.state {
                ProcessState::Halt => {
                    info!("Host @ {} halted.", host.addr);
                    host.halted = true;
                }
                // Only the step limit pauses a host while the network is running.
                ProcessState::Ready => {
                    let limit = self.max_tick_steps.unwrap_or_default();
                    return Err(Error::TickStepLimit(host.addr, limit));
                }
                _ => (),
            }
        }

        packets.into_iter().for_each(|p| self.route(p));
        Ok(is_quiet)
    }

    fn route(&mut self, packet: Packet) {
        trace!("Send: {}", packet);
        if packet.to() == self.nat.addr {
            self.nat.recv(packet);
            return;
        }

        match self.hosts.get_mut(packet.to()) {
            Some(host) if !host.halted => {
                host.inbox.push_back(packet.x());
                host.inbox.push_back(packet.y());
            }
            _ => warn!("Drop packet {}, no working host there.", packet),
        }
    }

    fn report(&self, repeated_y: i64, ticks: usize) -> NetworkReport {
        NetworkReport {
            first_nat_packet: self.nat.first_pac.get().cloned(),
            repeated_y,
            nat_deliveries: self.nat.sent_pacs.clone(),
            ticks,
        }
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.hosts.iter_mut().for_each(Host::shutdown);
        debug!("Network shut down.");
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Run hosts of given program in network until NAT sends the same y twice in a row
/// to its send address.
pub fn run_network(program: &Program, config: &NetworkConfig) -> Result<NetworkReport, Error> {
    Network::start(program, config)?.run(config.max_ticks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembler_waits_for_whole_packet() {
        let mut asm = PacketAssembler::new(3);
        assert!(asm.assemble(1).unwrap().is_none());
        assert!(asm.assemble(7).unwrap().is_none());
        assert_eq!(asm.assemble(8).unwrap(), Some(Packet::new(3, 1, 7, 8)));
    }

    #[test]
    fn negative_destination_is_rejected() {
        let mut asm = PacketAssembler::new(0);
        assert!(matches!(asm.assemble(-2), Err(Error::InvalidSendAddr(-2))));
    }

    #[test]
    fn nat_keeps_first_packet_and_last_packet() {
        let mut nat = NetworkNAT::new(255, 0);
        assert!(nat.send().is_none());
        nat.recv(Packet::new(1, 255, 1, 2));
        nat.recv(Packet::new(2, 255, 3, 4));
        assert_eq!(nat.first_pac.get(), Some(&Packet::new(1, 255, 1, 2)));
        assert_eq!(nat.send(), Some(Packet::new(255, 0, 3, 4)));
        assert_eq!(nat.send(), Some(Packet::new(255, 0, 3, 4)));
        assert_eq!(nat.last_sent_y(), Some(4));
    }
}
