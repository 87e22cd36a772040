use intcode_vm::{int_code::mem::Memory, Error};

#[test]
fn load_parses_comma_separated_text() {
    let mem = Memory::load("1,-2,3\n").unwrap();
    assert_eq!(mem.as_slice(), &[1, -2, 3]);
    assert!(matches!(Memory::load("1,,3"), Err(Error::ParseIntError(_))));
    assert!(matches!(Memory::load(" \n"), Err(Error::EmptyIntCode)));
}

#[test]
fn read_past_the_end_gives_zero_without_growing() {
    let mem = Memory::from(vec![5, 6]);
    assert_eq!(mem.read(1).unwrap(), 6);
    assert_eq!(mem.read(1000).unwrap(), 0);
    assert_eq!(mem.len(), 2);
}

#[test]
fn write_past_the_end_zero_fills() {
    let mut mem = Memory::from(vec![5, 6]);
    mem.write(5, 9).unwrap();
    assert_eq!(mem.len(), 6);
    assert_eq!(mem.into_vec(), vec![5, 6, 0, 0, 0, 9]);
}

#[test]
fn negative_address_is_invalid() {
    let mut mem = Memory::default();
    assert!(mem.is_empty());
    assert!(matches!(mem.read(-1), Err(Error::InvalidAddress(-1))));
    assert!(matches!(mem.write(-7, 1), Err(Error::InvalidAddress(-7))));
    assert!(mem.is_empty());
}
