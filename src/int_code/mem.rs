use crate::Error;

use super::Program;

/// Runtime memory of one process. Grows on write, reads past the end give 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    pub fn load(text: &str) -> Result<Self, Error> {
        text.parse::<Program>().map(|p| Self::from(&p))
    }

    pub fn read(&self, addr: i64) -> Result<i64, Error> {
        let ind = Self::check_addr(addr)?;
        Ok(self.cells.get(ind).copied().unwrap_or(0))
    }

    pub fn write(&mut self, addr: i64, value: i64) -> Result<(), Error> {
        let ind = Self::check_addr(addr)?;
        if ind >= self.cells.len() {
            self.cells.resize(ind + 1, 0);
        }

        self.cells[ind] = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.cells
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.cells
    }

    fn check_addr(addr: i64) -> Result<usize, Error> {
        usize::try_from(addr).map_err(|_| Error::InvalidAddress(addr))
    }
}

impl From<&Program> for Memory {
    fn from(program: &Program) -> Self {
        Self {
            cells: Vec::from(program.codes()),
        }
    }
}

impl From<Vec<i64>> for Memory {
    fn from(cells: Vec<i64>) -> Self {
        Self { cells }
    }
}
