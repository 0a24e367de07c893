//! Errors reported by the emulator. None of them are fatal to the host process,
//! the driver decides whether to halt, reload or carry on.

use std::io;

/// A memory access that does not fit in the machine's address space.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("address {addr:#010x} is outside of memory ({size} bytes)")]
    OutOfRange { addr: u32, size: u32 },
}

/// A register index outside of `0..=31`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    #[error("invalid register index {0}")]
    Invalid(usize),
}

/// A region layout the machine cannot be built with.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("kernel region of {size} bytes cannot hold the {reserved} reserved bytes")]
    KernelTooSmall { size: u32, reserved: u32 },

    #[error("regions add up to more than a 32-bit address space")]
    TooLarge,
}

/// Failure to place a binary image in memory. Nothing is copied when this is returned.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("image of {len} bytes does not fit in {capacity} bytes")]
    TooLarge { len: usize, capacity: usize },

    #[error("could not read image: {0}")]
    Io(#[from] io::Error),
}

/// Something that went wrong while executing a single instruction.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    #[error("machine is halted")]
    Halted,

    #[error("invalid opcode {opcode:#04x} at {pc:#010x}")]
    InvalidOpcode { opcode: u8, pc: u32 },

    #[error("division by zero at {pc:#010x}")]
    DivisionByZero { pc: u32 },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Returned by the disassembler for words that are not instructions.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisassembleError {
    #[error("INVALID")]
    Invalid { opcode: u8 },
}
