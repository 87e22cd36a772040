use int_enum::IntEnum;

use crate::Error;

use super::mem::Memory;

#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, IntEnum, PartialEq, Eq)]
pub enum ParameterMode {
    #[default]
    Position = 0,
    Immediate = 1,
    Relative = 2,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntEnum, Hash)]
pub enum Opcode {
    Add = 1,
    Multiply = 2,
    Input = 3,
    Output = 4,
    JumpIfTrue = 5,
    JumpIfFalse = 6,
    LessThan = 7,
    Equals = 8,
    AdjustRelativeBase = 9,
    Halt = 99,
}

impl Opcode {
    /// Width of the instruction in memory, opcode word included.
    pub fn length(self) -> usize {
        match self {
            Opcode::Add | Opcode::Multiply | Opcode::LessThan | Opcode::Equals => 4,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 3,
            Opcode::Input | Opcode::Output | Opcode::AdjustRelativeBase => 2,
            Opcode::Halt => 1,
        }
    }
}

/// Extract the operation from the low two decimal digits of an instruction word.
pub fn parse_opcode(word: i64) -> Result<Opcode, Error> {
    let code = word % 100;
    u8::try_from(code)
        .ok()
        .and_then(|c| Opcode::from_int(c).ok())
        .ok_or(Error::UnknownOpcode(code))
}

/// Mode of the `k`th parameter (1-based), i.e. `(word / 10^(k+1)) % 10`.
pub fn parse_mode(word: i64, k: u32) -> Result<ParameterMode, Error> {
    let digit = (word / 10i64.pow(k + 1)) % 10;
    u8::try_from(digit)
        .ok()
        .and_then(|d| ParameterMode::from_int(d).ok())
        .ok_or(Error::UnknownParameterMode(digit))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    mode: ParameterMode,
    value: i64,
}

impl Param {
    pub fn new(mode: ParameterMode, value: i64) -> Self {
        Self { mode, value }
    }

    pub fn read(&self, mem: &Memory, rel_base: i64) -> Result<i64, Error> {
        match self.mode {
            ParameterMode::Position => mem.read(self.value),
            ParameterMode::Immediate => Ok(self.value),
            ParameterMode::Relative => mem.read(rel_base.wrapping_add(self.value)),
        }
    }

    pub fn write_addr(&self, rel_base: i64) -> Result<i64, Error> {
        match self.mode {
            ParameterMode::Position => Ok(self.value),
            ParameterMode::Immediate => Err(Error::InvalidWriteMode(self.mode.int_value())),
            ParameterMode::Relative => Ok(rel_base.wrapping_add(self.value)),
        }
    }
}

/// Everything an instruction may touch while it executes.
pub trait ExecutionState {
    fn mem(&self) -> &Memory;
    fn mem_mut(&mut self) -> &mut Memory;
    fn input(&mut self) -> Option<i64>;
    fn output(&mut self, value: i64) -> Result<(), Error>;
    fn inst_p_mut(&mut self) -> &mut usize;
    fn rel_base(&self) -> i64;
    fn rel_base_mut(&mut self) -> &mut i64;
    fn halt(&mut self);
    fn block(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Add(Param, Param, Param),
    Multiply(Param, Param, Param),
    Input(Param),
    Output(Param),
    JumpIfTrue(Param, Param),
    JumpIfFalse(Param, Param),
    LessThan(Param, Param, Param),
    Equals(Param, Param, Param),
    AdjustRelativeBase(Param),
    Halt,
}

impl Instruction {
    pub fn decode(mem: &Memory, inst_p: usize) -> Result<Self, Error> {
        let word = mem.read(inst_p as i64)?;
        let opcode = parse_opcode(word)?;
        let param = |k: u32| -> Result<Param, Error> {
            Ok(Param::new(
                parse_mode(word, k)?,
                mem.read((inst_p + k as usize) as i64)?,
            ))
        };

        let inst = match opcode {
            Opcode::Add => Instruction::Add(param(1)?, param(2)?, param(3)?),
            Opcode::Multiply => Instruction::Multiply(param(1)?, param(2)?, param(3)?),
            Opcode::Input => Instruction::Input(param(1)?),
            Opcode::Output => Instruction::Output(param(1)?),
            Opcode::JumpIfTrue => Instruction::JumpIfTrue(param(1)?, param(2)?),
            Opcode::JumpIfFalse => Instruction::JumpIfFalse(param(1)?, param(2)?),
            Opcode::LessThan => Instruction::LessThan(param(1)?, param(2)?, param(3)?),
            Opcode::Equals => Instruction::Equals(param(1)?, param(2)?, param(3)?),
            Opcode::AdjustRelativeBase => Instruction::AdjustRelativeBase(param(1)?),
            Opcode::Halt => Instruction::Halt,
        };

        Ok(inst)
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Add(..) => Opcode::Add,
            Instruction::Multiply(..) => Opcode::Multiply,
            Instruction::Input(..) => Opcode::Input,
            Instruction::Output(..) => Opcode::Output,
            Instruction::JumpIfTrue(..) => Opcode::JumpIfTrue,
            Instruction::JumpIfFalse(..) => Opcode::JumpIfFalse,
            Instruction::LessThan(..) => Opcode::LessThan,
            Instruction::Equals(..) => Opcode::Equals,
            Instruction::AdjustRelativeBase(..) => Opcode::AdjustRelativeBase,
            Instruction::Halt => Opcode::Halt,
        }
    }

    pub fn length(&self) -> usize {
        self.opcode().length()
    }

    /// Apply this instruction. A blocked input leaves the instruction pointer untouched,
    /// so the same instruction runs again once input arrives.
    pub fn execute(&self, exe_state: &mut impl ExecutionState) -> Result<(), Error> {
        let rel_base = exe_state.rel_base();
        match *self {
            Instruction::Add(a, b, dest) => {
                Self::binary(exe_state, a, b, dest, |x, y| x.wrapping_add(y))?
            }
            Instruction::Multiply(a, b, dest) => {
                Self::binary(exe_state, a, b, dest, |x, y| x.wrapping_mul(y))?
            }
            Instruction::Input(dest) => {
                let addr = dest.write_addr(rel_base)?;
                match exe_state.input() {
                    Some(value) => exe_state.mem_mut().write(addr, value)?,
                    None => {
                        exe_state.block();
                        return Ok(());
                    }
                }
            }
            Instruction::Output(src) => {
                let value = src.read(exe_state.mem(), rel_base)?;
                exe_state.output(value)?;
            }
            Instruction::JumpIfTrue(cond, target) => {
                if cond.read(exe_state.mem(), rel_base)? != 0 {
                    return Self::jump(exe_state, target);
                }
            }
            Instruction::JumpIfFalse(cond, target) => {
                if cond.read(exe_state.mem(), rel_base)? == 0 {
                    return Self::jump(exe_state, target);
                }
            }
            Instruction::LessThan(a, b, dest) => {
                Self::binary(exe_state, a, b, dest, |x, y| i64::from(x < y))?
            }
            Instruction::Equals(a, b, dest) => {
                Self::binary(exe_state, a, b, dest, |x, y| i64::from(x == y))?
            }
            Instruction::AdjustRelativeBase(offset) => {
                let offset = offset.read(exe_state.mem(), rel_base)?;
                *exe_state.rel_base_mut() = rel_base.wrapping_add(offset);
            }
            Instruction::Halt => {
                exe_state.halt();
                return Ok(());
            }
        }

        *exe_state.inst_p_mut() += self.length();
        Ok(())
    }

    fn binary<F>(
        exe_state: &mut impl ExecutionState,
        a: Param,
        b: Param,
        dest: Param,
        f: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(i64, i64) -> i64,
    {
        let rel_base = exe_state.rel_base();
        let x = a.read(exe_state.mem(), rel_base)?;
        let y = b.read(exe_state.mem(), rel_base)?;
        let addr = dest.write_addr(rel_base)?;
        exe_state.mem_mut().write(addr, f(x, y))
    }

    fn jump(exe_state: &mut impl ExecutionState, target: Param) -> Result<(), Error> {
        let target = target.read(exe_state.mem(), exe_state.rel_base())?;
        *exe_state.inst_p_mut() =
            usize::try_from(target).map_err(|_| Error::InvalidAddress(target))?;
        Ok(())
    }
}
