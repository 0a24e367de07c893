use crate::emulator::error::RegisterError;
use crate::emulator::instruction::Reg;

pub const NUM_REGISTERS: usize = 32;

/// Reads of this register always yield zero.
pub const ZERO_REGISTER: usize = 31;

/// Receives the interrupted program counter when an interrupt is delivered.
pub const RETURN_REGISTER: usize = 30;

/// Points just past the kernel-base sentinel when an interrupt is delivered.
pub const STACK_REGISTER: usize = 29;

const REGISTER_NAMES: [&str; NUM_REGISTERS] = [
    "R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9",
    "R10", "R11", "R12", "R13", "R14", "R15", "R16", "R17", "R18",
    "R19", "R20", "R21", "R22", "R23", "R24", "R25", "R26", "BP",
    "LP", "SP", "XP", "R31",
];

/// The conventional symbol of a register, e.g. `SP` for register 29.
pub fn register_name(index: usize) -> Option<&'static str> {
    REGISTER_NAMES.get(index).copied()
}

/// 32 signed registers. Register 31 can be written, but reads of it yield zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    values: [i32; NUM_REGISTERS],
}

impl Registers {

    pub fn new() -> Registers {
        Registers {
            values: [0; NUM_REGISTERS],
        }
    }

    pub fn get(&self, index: usize) -> Result<i32, RegisterError> {
        match index {
            ZERO_REGISTER => Ok(0),
            i if i < NUM_REGISTERS => Ok(self.values[i]),
            i => Err(RegisterError::Invalid(i)),
        }
    }

    pub fn set(&mut self, index: usize, value: i32) -> Result<(), RegisterError> {
        let slot = self.values.get_mut(index).ok_or(RegisterError::Invalid(index))?;
        *slot = value;
        Ok(())
    }

    /// Read a decoded register operand.
    pub fn read(&self, Reg(r): Reg) -> i32 {
        let index = r as usize & 0x1F;
        if index == ZERO_REGISTER {
            0
        } else {
            self.values[index]
        }
    }

    /// Write a decoded register operand.
    pub fn write(&mut self, Reg(r): Reg, value: i32) {
        self.values[r as usize & 0x1F] = value;
    }

    /// All 32 values as a program would read them.
    pub fn snapshot(&self) -> [i32; NUM_REGISTERS] {
        let mut values = self.values;
        values[ZERO_REGISTER] = 0;
        values
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn register_31_reads_zero_after_write() {
        let mut registers = Registers::new();
        registers.write(Reg(31), 42);
        assert_eq!(0, registers.read(Reg(31)));
        assert_eq!(Ok(0), registers.get(31));
        assert_eq!(0, registers.snapshot()[31]);
    }

    #[test]
    fn registers_hold_values() {
        let mut registers = Registers::new();
        registers.set(3, -7).unwrap();
        registers.write(Reg(30), 99);
        assert_eq!(Ok(-7), registers.get(3));
        assert_eq!(99, registers.read(Reg(30)));
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let mut registers = Registers::new();
        assert_eq!(Err(RegisterError::Invalid(32)), registers.get(32));
        assert_eq!(Err(RegisterError::Invalid(100)), registers.set(100, 1));
    }

    #[test]
    fn names_follow_convention() {
        assert_eq!(Some("R0"), register_name(0));
        assert_eq!(Some("BP"), register_name(27));
        assert_eq!(Some("LP"), register_name(28));
        assert_eq!(Some("SP"), register_name(STACK_REGISTER));
        assert_eq!(Some("XP"), register_name(RETURN_REGISTER));
        assert_eq!(Some("R31"), register_name(ZERO_REGISTER));
        assert_eq!(None, register_name(32));
    }
}
