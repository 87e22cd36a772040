use intcode_vm::{
    ascii::{self, AsciiOutput, AsciiScript},
    int_code::{
        self,
        com::{Process, ProcessState},
        Program,
    },
};

#[test]
fn lines_end_with_newline() {
    assert_eq!(ascii::encode_line("NOT A J"), vec![78, 79, 84, 32, 65, 32, 74, 10]);
    assert_eq!(ascii::encode_lines(&["WALK", ""]), vec![87, 65, 76, 75, 10, 10]);
}

#[test]
fn large_values_are_split_from_text() {
    let (outputs, _) = int_code::run_with_inputs("104,79,104,75,104,10,104,19349,99", &[]).unwrap();
    let output = ascii::decode(&outputs);
    assert_eq!(output.text(), "OK\n");
    assert_eq!(output.large_values(), &[19349]);
    assert_eq!(ascii::decode(&[-1, 128, 65]).large_values(), &[-1, 128]);
}

#[test]
fn script_is_echoed_through_program() {
    let program = "3,10,4,10,1105,1,0".parse::<Program>().unwrap();
    let mut proc = Process::new(&program);
    let mut script = AsciiScript::new(&["hi"]);
    let mut output = AsciiOutput::default();
    assert_eq!(proc.run(&mut script, &mut output).unwrap(), ProcessState::Block);
    assert!(script.is_finished());
    assert_eq!(output.text(), "hi\n");
    assert!(output.large_values().is_empty());
}
