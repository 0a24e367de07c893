use std::fs::File;
use std::path::PathBuf;

use structopt::StructOpt;

use beta_emu::emulator::disassembler::listing;
use beta_emu::emulator::registers::register_name;
use beta_emu::emulator::{Machine, MachineConfig, SharedMachine};

/// Run a binary without any front-end and dump the registers when it stops.
#[derive(StructOpt)]
#[structopt(name = "beta-run")]
struct Opt {
    /// The program to execute
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Interrupt handler to place in kernel memory
    #[structopt(long, parse(from_os_str))]
    handler: Option<PathBuf>,

    /// Size of the program region in bytes
    #[structopt(long, default_value = "33554432")]
    program_size: u32,

    /// Size of the video region in bytes
    #[structopt(long, default_value = "960000")]
    video_size: u32,

    /// Size of the kernel region in bytes
    #[structopt(long, default_value = "800")]
    kernel_size: u32,

    /// Stop after this many instructions
    #[structopt(long)]
    max_steps: Option<u64>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Get configuration and build the machine
    let opt = Opt::from_args();
    let config = MachineConfig::new(opt.program_size, opt.video_size, opt.kernel_size);
    let mut machine = Machine::new(config)?;

    log::info!("Executing {:?}", &opt.input);
    machine.load_program_from(File::open(&opt.input)?)?;
    if let Some(handler) = &opt.handler {
        log::info!("Interrupt handler {:?}", handler);
        machine.load_handler_from(File::open(handler)?)?;
    }

    // Start execution
    let shared = SharedMachine::new(machine);
    let summary = shared.run(opt.max_steps);
    println!("{:?} after {} steps", summary.reason, summary.steps);

    shared.with(|machine| {
        let pc = machine.program_counter();
        println!("PC = {:#010x}", pc);
        for (addr, text) in listing(machine, pc, 1) {
            println!("{:#010x}: {}", addr, text);
        }
        for (index, value) in machine.registers().iter().enumerate() {
            println!("{:>3} = {:#010x} ({})", register_name(index).unwrap_or("?"), value, value);
        }
    });

    Ok(())
}
