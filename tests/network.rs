use intcode_vm::{
    int_code::{read_int_code, Program},
    nic::{self, Error, NetworkConfig},
};

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn relay_program() -> Program {
    read_int_code("tests/data/nic_relay.txt").unwrap()
}

fn config(host_n: usize) -> NetworkConfig {
    NetworkConfig {
        host_n,
        max_ticks: Some(1000),
        ..Default::default()
    }
}

#[test]
fn nat_reports_first_and_repeated_y() {
    init_log();
    for host_n in [3, 50] {
        let report = nic::run_network(&relay_program(), &config(host_n)).unwrap();
        let first = report.first_nat_packet().unwrap();
        assert_eq!(first.from(), 0);
        assert_eq!(first.to(), 255);
        assert_eq!(first.y(), 6);
        assert_eq!(report.repeated_y(), 10);
        assert_eq!(
            report.nat_deliveries().iter().map(|p| p.y()).collect::<Vec<_>>(),
            vec![6, 10, 10]
        );
        assert!(report.nat_deliveries().iter().all(|p| p.to() == 0));
        assert_eq!(report.ticks(), 9);
    }
}

#[test]
fn network_is_deterministic() {
    init_log();
    let program = relay_program();
    let first = nic::run_network(&program, &NetworkConfig::default()).unwrap();
    let second = nic::run_network(&program, &NetworkConfig::default()).unwrap();
    assert_eq!(first.repeated_y(), second.repeated_y());
    assert_eq!(first.nat_deliveries(), second.nat_deliveries());
    assert_eq!(first.ticks(), second.ticks());
}

#[test]
fn faulting_host_fails_the_network() {
    init_log();
    let program = "3,100,98".parse::<Program>().unwrap();
    assert!(matches!(
        nic::run_network(&program, &config(3)),
        Err(Error::ExecutionError(0, intcode_vm::Error::UnknownOpcode(98)))
    ));
}

#[test]
fn negative_destination_fails_the_network() {
    init_log();
    let program = "3,100,104,-1,104,0,104,0,3,100,1105,1,8".parse::<Program>().unwrap();
    assert!(matches!(
        nic::run_network(&program, &config(2)),
        Err(Error::InvalidSendAddr(-1))
    ));
}

#[test]
fn silent_network_stalls() {
    init_log();
    let program = "3,100,3,101,1105,1,2".parse::<Program>().unwrap();
    let config = NetworkConfig {
        host_n: 3,
        max_ticks: Some(5),
        ..Default::default()
    };
    assert!(matches!(
        nic::run_network(&program, &config),
        Err(Error::NetworkStalled(5))
    ));
}

#[test]
fn halted_network_is_reported() {
    init_log();
    let program = "3,100,99".parse::<Program>().unwrap();
    assert!(matches!(
        nic::run_network(&program, &config(4)),
        Err(Error::NetworkHalted)
    ));
}

#[test]
fn host_spinning_without_input_is_stopped() {
    init_log();
    // Reads its address, then jumps to itself forever.
    let program = "3,100,1105,1,2".parse::<Program>().unwrap();
    let config = NetworkConfig {
        host_n: 2,
        max_ticks: Some(5),
        max_tick_steps: Some(1000),
        ..Default::default()
    };
    assert!(matches!(
        nic::run_network(&program, &config),
        Err(Error::TickStepLimit(0, 1000))
    ));
}
