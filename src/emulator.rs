//! An emulator for a 32-bit load/store machine with 32 registers, a flat memory split
//! into program, video and kernel regions, and keyboard interrupts.

pub mod disassembler;
pub mod error;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod registers;
pub mod shared;

pub use disassembler::disassemble;
pub use error::{ConfigError, DisassembleError, Fault, LoadError, MemoryError, RegisterError};
pub use machine::{InterruptKind, Machine, State};
pub use memory::MachineConfig;
pub use shared::{RunSummary, SharedMachine, StopReason};
