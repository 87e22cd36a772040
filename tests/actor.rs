use intcode_vm::{
    actor::Actor,
    int_code::{com::ProcessState, Program},
    Error,
};

fn program(text: &str) -> Program {
    text.parse().unwrap()
}

#[test]
fn action_gets_one_output_per_input() {
    let actor = Actor::start(&program("3,100,102,2,100,100,4,100,1105,1,0")).unwrap();
    assert_eq!(actor.action(21).unwrap(), 42);
    assert_eq!(actor.action(-4).unwrap(), -8);

    let res = actor.close().unwrap();
    assert!(matches!(res.state(), ProcessState::Block | ProcessState::Ready));
    assert_eq!(res.image().read(100).unwrap(), -8);
}

#[test]
fn halted_actor_stops_answering() {
    let actor = Actor::start_named(&program("3,100,4,100,99"), "echo-once").unwrap();
    assert_eq!(actor.name(), "echo-once");
    assert_eq!(actor.action(7).unwrap(), 7);
    assert!(matches!(actor.recv(), Err(Error::ActorStopped)));
    assert_eq!(actor.close().unwrap().state(), ProcessState::Halt);
}

#[test]
fn close_stops_spinning_process() {
    let actor = Actor::start(&program("1105,1,0")).unwrap();
    let res = actor.close().unwrap();
    assert_eq!(res.state(), ProcessState::Ready);
}

#[test]
fn close_reports_fault() {
    let actor = Actor::start(&program("3,100,98")).unwrap();
    assert!(matches!(actor.action(1), Err(Error::ActorStopped)));
    assert!(matches!(actor.close(), Err(Error::UnknownOpcode(98))));
}

#[test]
fn dropped_actor_is_joined() {
    let actor = Actor::start(&program("3,100,4,100,1105,1,0")).unwrap();
    assert_eq!(actor.action(3).unwrap(), 3);
    drop(actor);
}
