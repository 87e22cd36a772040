use std::iter;

use crate::{
    int_code::io::{InputPort, OutputPort},
    Error,
};

/// Bytes of the line followed by a newline.
pub fn encode_line(line: &str) -> Vec<i64> {
    line.bytes()
        .chain(iter::once(b'\n'))
        .map(i64::from)
        .collect()
}

pub fn encode_lines<S: AsRef<str>>(lines: &[S]) -> Vec<i64> {
    lines
        .iter()
        .flat_map(|l| encode_line(l.as_ref()))
        .collect()
}

/// Output of an ASCII program: printable text, and any value that isn't an ASCII
/// character (usually the answer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AsciiOutput {
    text: String,
    large_values: Vec<i64>,
}

impl AsciiOutput {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn large_values(&self) -> &[i64] {
        &self.large_values
    }

    pub fn push(&mut self, value: i64) {
        match to_ascii(value) {
            Some(c) => self.text.push(c),
            None => self.large_values.push(value),
        }
    }
}

impl OutputPort for AsciiOutput {
    fn put(&mut self, value: i64) -> Result<(), Error> {
        self.push(value);
        Ok(())
    }
}

pub fn decode(values: &[i64]) -> AsciiOutput {
    let mut output = AsciiOutput::default();
    values.iter().for_each(|&v| output.push(v));
    output
}

fn to_ascii(value: i64) -> Option<char> {
    u8::try_from(value)
        .ok()
        .filter(|b| b.is_ascii())
        .map(char::from)
}

/// Feeds a script to a program one character at a time.
#[derive(Debug, Clone)]
pub struct AsciiScript {
    codes: Vec<i64>,
    input_ind: usize,
}

impl AsciiScript {
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Self {
        Self {
            codes: encode_lines(lines),
            input_ind: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.input_ind >= self.codes.len()
    }
}

impl InputPort for AsciiScript {
    fn get(&mut self) -> Option<i64> {
        let res = self.codes.get(self.input_ind).copied();
        if res.is_some() {
            self.input_ind += 1;
        }

        res
    }
}
