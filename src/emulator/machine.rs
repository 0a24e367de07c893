//! The execution engine and interrupt controller.

use std::convert::TryFrom;
use std::io::Read;

use crate::emulator::error::{ConfigError, Fault, LoadError, MemoryError, RegisterError};
use crate::emulator::instruction::*;
use crate::emulator::memory::{self, MachineConfig, Memory, Region, KERNEL_RESERVED};
use crate::emulator::registers::{Registers, NUM_REGISTERS, RETURN_REGISTER, STACK_REGISTER};

/// Kernel offset of the interrupt type byte.
pub const INTERRUPT_TYPE_OFFSET: u32 = 13;

/// Kernel offset of the key value byte, only written for key-down interrupts.
pub const INTERRUPT_KEY_OFFSET: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

/// The kind of an external interrupt, stored as a byte at kernel offset 13.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptKind {
    KeyDown = 0,
    KeyUp = 1,
}

pub struct Machine {
    memory: Memory,
    registers: Registers,
    program_counter: u32,
    state: State,
    interrupt_in_service: bool,
}

impl Machine {

    /// Create a machine with zeroed memory, all registers cleared and the program counter at 0.
    pub fn new(config: MachineConfig) -> Result<Machine, ConfigError> {
        Ok(Machine {
            memory: Memory::new(config)?,
            registers: Registers::new(),
            program_counter: 0,
            state: State::Running,
            interrupt_in_service: false,
        })
    }

    /// Throw away memory and all state, keeping the region layout.
    pub fn reset(&mut self) {
        log::debug!("Resetting machine");
        self.memory.clear();
        self.registers = Registers::new();
        self.program_counter = 0;
        self.state = State::Running;
        self.interrupt_in_service = false;
    }

    /// Reset the machine and copy a program into the program region.
    ///
    /// An image that does not fit is rejected before anything is reset.
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), LoadError> {
        memory::check_capacity(image.len(), self.config().program_size)?;
        self.reset();
        self.memory.load_program(image)
    }

    pub fn load_program_from<R: Read>(&mut self, source: R) -> Result<(), LoadError> {
        let image = memory::read_image(source, self.config().program_size)?;
        self.load_program(&image)
    }

    /// Copy an interrupt handler into the kernel region, behind the reserved bytes.
    pub fn load_handler(&mut self, image: &[u8]) -> Result<(), LoadError> {
        self.memory.load_handler(image)
    }

    pub fn load_handler_from<R: Read>(&mut self, source: R) -> Result<(), LoadError> {
        let image = memory::read_image(source, self.config().kernel_size - KERNEL_RESERVED)?;
        self.load_handler(&image)
    }

    pub fn config(&self) -> &MachineConfig {
        self.memory.config()
    }

    pub fn program_counter(&self) -> u32 {
        self.program_counter
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state == State::Halted
    }

    pub fn interrupt_in_service(&self) -> bool {
        self.interrupt_in_service
    }

    pub fn program_length(&self) -> u32 {
        self.memory.program_length()
    }

    pub fn last_accessed_address(&self) -> Option<u32> {
        self.memory.last_accessed()
    }

    pub fn register(&self, index: usize) -> Result<i32, RegisterError> {
        self.registers.get(index)
    }

    pub fn registers(&self) -> [i32; NUM_REGISTERS] {
        self.registers.snapshot()
    }

    /// Read a word for display. Does not count as an access.
    pub fn memory_word(&self, addr: u32) -> Result<i32, MemoryError> {
        self.memory.peek_word(addr)
    }

    /// Whether a driver should keep stepping: the machine is not halted and the
    /// program counter is either inside the loaded program or inside the kernel
    /// region (running the interrupt handler).
    pub fn is_running(&self) -> bool {
        let config = self.config();
        let pc = self.program_counter;
        !self.is_halted()
            && (pc < self.program_length() || (pc > config.kernel_base() && pc < config.memory_size()))
    }

    /// Index of the pixel containing the last accessed address, if that address is video memory.
    pub fn touched_pixel(&self) -> Option<u32> {
        let addr = self.last_accessed_address()?;
        match self.config().region_of(addr) {
            Some(Region::Video) => Some((addr - self.config().video_base()) / 4),
            _ => None,
        }
    }

    /// Fetch, decode and execute one instruction.
    pub fn step(&mut self) -> Result<(), Fault> {
        if self.is_halted() {
            return Err(Fault::Halted);
        }

        // Back in the program region, so any interrupt handler has returned
        if self.program_counter < self.config().program_size {
            self.interrupt_in_service = false;
        }

        let pc = self.program_counter;
        let word = match self.memory.peek_word(pc) {
            Ok(word) => word as u32,
            Err(e) => {
                log::error!("Could not fetch instruction: {}", e);
                self.state = State::Halted;
                return Err(Fault::Memory(e));
            }
        };

        match Instruction::from_u32(word) {
            Some(instruction) => {
                log::trace!("{:#010x}: {}", pc, instruction);
                self.execute(instruction)
            }
            None => {
                let opcode = (word >> 26) as u8;
                log::warn!("Invalid opcode {:#04x} at {:#010x}, skipping", opcode, pc);
                self.program_counter = pc.wrapping_add(4);
                Err(Fault::InvalidOpcode { opcode, pc })
            }
        }
    }

    /// Execute a single decoded instruction as if it was fetched at the current program counter.
    /// Unlike `step` this ignores the halted state and the interrupt flag.
    pub(crate) fn execute(&mut self, instruction: Instruction) -> Result<(), Fault> {
        let pc = self.program_counter;
        let next = pc.wrapping_add(4);

        match instruction {

            Instruction::Halt => {
                log::debug!("Halted at {:#010x}", pc);
                self.state = State::Halted;
            }

            // Rc := mem[Ra + literal]
            Instruction::Ld(ra, Lit(l), rc) => {
                self.program_counter = next;
                let addr = self.registers.read(ra).wrapping_add(l) as u32;
                self.load(addr, rc)?;
            }

            // mem[Ra + literal] := Rc
            Instruction::St(rc, Lit(l), ra) => {
                self.program_counter = next;
                let addr = self.registers.read(ra).wrapping_add(l) as u32;
                self.memory.write_word(addr, self.registers.read(rc))?;
            }

            // Link into Rc, jump to the word-aligned address in Ra
            Instruction::Jmp(ra, rc) => {
                let target = self.registers.read(ra) as u32 & !0b11;
                self.registers.write(rc, next as i32);
                self.program_counter = target;
            }

            Instruction::Beq(ra, lit, rc) => {
                let taken = self.registers.read(ra) == 0;
                self.branch(taken, lit, rc);
            }

            Instruction::Bne(ra, lit, rc) => {
                let taken = self.registers.read(ra) != 0;
                self.branch(taken, lit, rc);
            }

            // Targets beyond program and video memory are stored to instead of loaded from
            Instruction::Ldr(Lit(l), rc) => {
                self.program_counter = next;
                let target = next as i64 + 4 * l as i64;
                let store = target > self.config().kernel_base() as i64;
                let addr = match u32::try_from(target) {
                    Ok(addr) => addr,
                    Err(_) => {
                        if !store {
                            self.registers.write(rc, 0);
                        }
                        return Err(Fault::Memory(MemoryError::OutOfRange {
                            addr: target as u32,
                            size: self.memory.size(),
                        }));
                    }
                };
                if store {
                    self.memory.write_word(addr, self.registers.read(rc))?;
                } else {
                    self.load(addr, rc)?;
                }
            }

            Instruction::Op(op, ra, rb, rc) => {
                let b = self.registers.read(rb);
                self.alu(op, ra, b, rc)?;
            }

            Instruction::OpC(op, ra, Lit(l), rc) => {
                self.alu(op, ra, l, rc)?;
            }
        }
        Ok(())
    }

    /// Load a word into `rc`. Out of range addresses load zero and report the fault.
    fn load(&mut self, addr: u32, rc: Reg) -> Result<(), Fault> {
        match self.memory.read_word(addr) {
            Ok(value) => {
                self.registers.write(rc, value);
                Ok(())
            }
            Err(e) => {
                self.registers.write(rc, 0);
                Err(Fault::Memory(e))
            }
        }
    }

    fn branch(&mut self, taken: bool, Lit(l): Lit, rc: Reg) {
        let next = self.program_counter.wrapping_add(4);
        self.registers.write(rc, next as i32);
        self.program_counter = if taken {
            next.wrapping_add(l.wrapping_mul(4) as u32)
        } else {
            next
        };
    }

    fn alu(&mut self, op: AluOp, ra: Reg, b: i32, rc: Reg) -> Result<(), Fault> {
        let pc = self.program_counter;
        match op.apply(self.registers.read(ra), b) {
            Some(value) => {
                self.registers.write(rc, value);
                self.program_counter = pc.wrapping_add(4);
                Ok(())
            }
            None => {
                log::error!("Division by zero at {:#010x}, halting", pc);
                self.state = State::Halted;
                Err(Fault::DivisionByZero { pc })
            }
        }
    }

    /// Deliver an external interrupt right away.
    ///
    /// Returns `Ok(false)` when an interrupt is already in service, in which case
    /// the event is dropped and nothing changes.
    pub fn raise_interrupt(&mut self, kind: InterruptKind, key: u8) -> Result<bool, MemoryError> {
        if self.interrupt_in_service {
            log::warn!("Interrupt {:?} dropped, another one is in service", kind);
            return Ok(false);
        }

        let config = *self.config();
        let kernel_base = config.kernel_base();
        let sentinel_addr = self.program_length();
        self.memory.check_word(sentinel_addr)?;

        self.interrupt_in_service = true;
        self.registers.write(Reg(RETURN_REGISTER as u8), self.program_counter as i32);
        self.program_counter = config.handler_entry();

        // Stack starts above a word holding the kernel base
        self.registers.write(Reg(STACK_REGISTER as u8), sentinel_addr.wrapping_add(4) as i32);
        self.memory.write_word(sentinel_addr, kernel_base as i32)?;

        self.memory.write_byte(kernel_base + INTERRUPT_TYPE_OFFSET, kind as u8)?;
        if kind == InterruptKind::KeyDown {
            self.memory.write_byte(kernel_base + INTERRUPT_KEY_OFFSET, key)?;
        }

        log::debug!("Delivered {:?} interrupt with key {}, returning to {:#010x}",
            kind, key, self.registers.read(Reg(RETURN_REGISTER as u8)));
        Ok(true)
    }
}
