/*!

An emulator for a small 32-bit load/store instruction set.

The machine has 32 signed registers (register 31 always reads as zero), a byte-addressed
memory split into a program region, a video region and a kernel region, fixed 32-bit
instructions and a single keyboard interrupt line.

# Headless runner

To run a binary there is a ready-to-use driver,
`cargo run --release --bin beta-run -- <program> [--handler <handler>]`.
Set `RUST_LOG=trace` to see every executed instruction.

# Library

Create a machine with the sizes of its three regions, load a program and step through it.

```rust
use beta_emu::emulator::{Machine, MachineConfig};

let mut machine = Machine::new(MachineConfig::new(1024, 64, 512)).unwrap();

// ADDC(R31, 5, R1) followed by HALT
let program = [0x05, 0x00, 0x3F, 0xC0, 0x00, 0x00, 0x00, 0x00];
machine.load_program(&program).unwrap();

while machine.is_running() {
    machine.step().unwrap();
}
assert_eq!(machine.register(1), Ok(5));
```

Programs can also be assembled from instructions instead of raw bytes.

```rust
use beta_emu::emulator::{Machine, MachineConfig};
use beta_emu::emulator::instruction::{AluOp, Instruction, Lit, Reg};

let program: Vec<u8> = [
    Instruction::OpC(AluOp::Sub, Reg(31), Lit(8), Reg(2)),
    Instruction::OpC(AluOp::Sra, Reg(2), Lit(1), Reg(3)),
]
.iter()
.flat_map(|instruction| instruction.to_u32().to_le_bytes().to_vec())
.collect();

let mut machine = Machine::new(MachineConfig::default()).unwrap();
machine.load_program(&program).unwrap();
machine.step().unwrap();
machine.step().unwrap();
assert_eq!(machine.register(3), Ok(-4));
assert_eq!(beta_emu::emulator::disassemble(0xC041_0005).unwrap(), "ADDC(R1,5,R2)");
```

## Sharing a machine between threads

A front-end typically steps the machine on one thread, draws it on another and delivers
key presses from a third. Wrap the machine in a `SharedMachine` and clone the handle.

```rust
use std::thread;
use beta_emu::emulator::{InterruptKind, Machine, MachineConfig, SharedMachine};

let shared = SharedMachine::new(Machine::new(MachineConfig::default()).unwrap());

let input = shared.clone();
thread::spawn(move || {
    input.raise_interrupt(InterruptKind::KeyDown, b'a').unwrap();
}).join().unwrap();

assert!(shared.with(|machine| machine.interrupt_in_service()));
```
*/

pub mod emulator;
pub mod util;
