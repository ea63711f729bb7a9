//! The command-line development console.
//!
//! A stopgap operator's console for driving the emulator from a
//! terminal until a panel-style front end exists. The console owns the
//! jump and stop switch banks and implements the run-loop hooks: while
//! the machine is stopped it reads commands, and while the machine runs
//! it only refreshes the switch masks.
//!
//! Commands:
//!
//! ```text
//! assemble <path>      assemble a source file into storage
//! run                  resume execution
//! step                 execute a single instruction
//! halt                 stop the machine
//! clear                master clear
//! seta <octal>         set the A register (setb/setd/seti/setr set the
//!                      bank controls, setp the program address)
//! jump1 up|center|down position a jump switch (jump2, jump3 likewise)
//! stop1 up|center|down position a stop switch (stop2, stop3 likewise)
//! reader <path>        mount a paper tape on the reader
//! punch <path>         punch a new paper tape file
//! exit                 leave the emulator
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use colored::Colorize;
use structopt::StructOpt;

use cdc160a::asm;
use cdc160a::console::{Console, SwitchBank};
use cdc160a::device::Device;
use cdc160a::devices::{NullDevice, PaperTapePunch, PaperTapeReader};
use cdc160a::input_output::InputOutput;
use cdc160a::run_loop::RunLoop;
use cdc160a::storage::{NormalIoStatus, Storage};

#[derive(StructOpt)]
#[structopt(
    name = "dev-console",
    about = "A CDC 160-A emulator with a command-line console."
)]
struct Options {
    /// Assembly source loaded into storage before the console starts.
    #[structopt(parse(from_os_str))]
    program: Option<PathBuf>,

    /// Paper tape file mounted on the reader at start-up.
    #[structopt(long, parse(from_os_str))]
    reader: Option<PathBuf>,

    /// Paper tape file created for the punch at start-up.
    #[structopt(long, parse(from_os_str))]
    punch: Option<PathBuf>,
}

struct DevConsole {
    jump_switches: SwitchBank,
    stop_switches: SwitchBank,
    step_pending: bool,
}

impl DevConsole {
    fn new() -> DevConsole {
        DevConsole {
            jump_switches: SwitchBank::new(),
            stop_switches: SwitchBank::new(),
            step_pending: false,
        }
    }

    fn display(&self, storage: &Storage, input_output: &InputOutput) {
        println!();
        println!(
            "Jump switches: 1 {}, 2 {}, 3 {}",
            self.jump_switches.state(0).name(),
            self.jump_switches.state(1).name(),
            self.jump_switches.state(2).name()
        );
        println!(
            "Stop switches: 1 {}, 2 {}, 3 {}",
            self.stop_switches.state(0).name(),
            self.stop_switches.state(1).name(),
            self.stop_switches.state(2).name()
        );
        println!(
            "BUF: {:o}, DIR: {:o}, IND: {:o}, REL: {:o}",
            storage.buffer_storage_bank,
            storage.direct_storage_bank,
            storage.indirect_storage_bank,
            storage.relative_storage_bank
        );
        println!(
            "Buffering: {}, Normal I/O: {}",
            if storage.buffering { "ACTIVE" } else { "IDLE" },
            match storage.normal_io_status {
                NormalIoStatus::Idle => "IDLE",
                NormalIoStatus::Input => "INPUT",
                NormalIoStatus::Output => "OUTPUT",
            }
        );
        println!(
            "A: {:04o}, P: {:04o}, S: {:04o}, Interrupt lock: {:?}",
            storage.a_register,
            storage.p_register,
            storage.s_register,
            storage.interrupt_lock
        );
        if storage.err_status {
            println!("{}", "Machine stopped on ERR.".red());
        }
        if storage.machine_hung {
            println!(
                "{}",
                "Machine hung waiting on a device; clear to release.".red()
            );
        }
        print_device(
            "Buffered I/O device",
            input_output.device_on_buffer_channel().map(|d| d.name()),
        );
        print_device(
            "Normal I/O device",
            input_output.device_on_normal_channel().map(|d| d.name()),
        );
    }

    /// Read and run commands until one resumes the machine.
    fn interact(&mut self, storage: &mut Storage, input_output: &mut InputOutput) {
        loop {
            self.display(storage, input_output);
            print!("> ");
            let _ = io::stdout().flush();
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => {
                    // End of input; nothing more can restart the machine.
                    println!("Goodbye.");
                    process::exit(0);
                }
                Ok(_) => {}
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            let argument = tokens.get(1).copied().unwrap_or("");
            if !self.run_command(storage, input_output, tokens[0], argument) {
                break;
            }
        }
    }

    /// Returns false when the interpreter should hand control back to
    /// the run loop.
    fn run_command(
        &mut self,
        storage: &mut Storage,
        input_output: &mut InputOutput,
        name: &str,
        argument: &str,
    ) -> bool {
        match name {
            "assemble" => {
                if argument.is_empty() {
                    println!("assemble needs a file path.");
                } else {
                    match asm::assemble_file(argument, storage) {
                        Ok(()) => println!("Assembled {}.", argument),
                        Err(errors) => {
                            for error in errors {
                                eprintln!("{}", error.red());
                            }
                        }
                    }
                }
                true
            }
            "run" => {
                self.release_down_switches(storage);
                storage.run();
                false
            }
            "step" => {
                self.release_down_switches(storage);
                storage.run();
                self.step_pending = true;
                false
            }
            "halt" => {
                storage.stop();
                true
            }
            "clear" => {
                storage.master_clear();
                input_output.clear();
                println!("Master clear.");
                true
            }
            "seta" => self.set_register(storage, argument, 0o7777, |s, v| {
                s.a_register = v
            }),
            "setp" => self.set_register(storage, argument, 0o7777, |s, v| {
                s.p_register = v
            }),
            "setb" => self.set_register(storage, argument, 0o7, |s, v| {
                s.buffer_storage_bank = v
            }),
            "setd" => self.set_register(storage, argument, 0o7, |s, v| {
                s.direct_storage_bank = v
            }),
            "seti" => self.set_register(storage, argument, 0o7, |s, v| {
                s.indirect_storage_bank = v
            }),
            "setr" => self.set_register(storage, argument, 0o7, |s, v| {
                s.relative_storage_bank = v
            }),
            "jump1" | "jump2" | "jump3" => {
                let index = name.as_bytes()[4] as usize - b'1' as usize;
                Self::position_switch(
                    &mut self.jump_switches,
                    index,
                    argument,
                );
                storage.set_jump_switch_mask(self.jump_switches.mask());
                true
            }
            "stop1" | "stop2" | "stop3" => {
                let index = name.as_bytes()[4] as usize - b'1' as usize;
                Self::position_switch(
                    &mut self.stop_switches,
                    index,
                    argument,
                );
                storage.set_stop_switch_mask(self.stop_switches.mask());
                true
            }
            "reader" => {
                Self::open_device(input_output, "pt_rdr", argument);
                true
            }
            "punch" => {
                Self::open_device(input_output, "pt_pun", argument);
                true
            }
            "exit" | "quit" => {
                print!("Do you really want to quit the emulator (y/N)? ");
                let _ = io::stdout().flush();
                let mut answer = String::new();
                let _ = io::stdin().lock().read_line(&mut answer);
                if answer.trim() == "y" {
                    println!("Goodbye.");
                    process::exit(0);
                }
                true
            }
            _ => {
                println!("Unknown command: {}", name);
                true
            }
        }
    }

    fn set_register(
        &self,
        storage: &mut Storage,
        argument: &str,
        max: u16,
        assign: fn(&mut Storage, u16),
    ) -> bool {
        match parse_octal(argument, max) {
            Some(value) => assign(storage, value),
            None => println!(
                "Octal value between 0 and {:o} required, found: {}.",
                max, argument
            ),
        }
        true
    }

    fn position_switch(bank: &mut SwitchBank, index: usize, setting: &str) {
        match setting {
            "up" => bank.set_up(index),
            "center" => bank.return_to_center(index),
            "down" => bank.set_down(index),
            _ => println!(
                "Switches can be set up, center, or down, found: {}.",
                setting
            ),
        }
    }

    fn open_device(input_output: &mut InputOutput, key: &str, path: &str) {
        if path.is_empty() {
            println!("A file path is required.");
            return;
        }
        match input_output.device_with_key(key) {
            Some(device) => {
                if device.open(path) {
                    println!("{} mounted on the {}.", path, device.name());
                }
            }
            None => println!("No such device."),
        }
    }

    /// Momentary (down) switch positions release when the machine
    /// resumes.
    fn release_down_switches(&mut self, storage: &mut Storage) {
        self.jump_switches.release_down_switches();
        self.stop_switches.release_down_switches();
        storage.set_jump_switch_mask(self.jump_switches.mask());
        storage.set_stop_switch_mask(self.stop_switches.mask());
    }
}

impl Console for DevConsole {
    fn before_instruction_fetch(
        &mut self,
        storage: &mut Storage,
        input_output: &mut InputOutput,
    ) {
        if self.step_pending {
            storage.stop();
            self.step_pending = false;
        }
        if storage.machine_hung {
            storage.stop();
        }
        if !storage.run_stop_status {
            self.interact(storage, input_output);
        }
        storage.set_jump_switch_mask(self.jump_switches.mask());
        storage.set_stop_switch_mask(self.stop_switches.mask());
    }

    fn before_instruction_logic(
        &mut self,
        _storage: &mut Storage,
        _input_output: &mut InputOutput,
    ) {
    }

    fn before_advance(
        &mut self,
        _storage: &mut Storage,
        _input_output: &mut InputOutput,
    ) -> bool {
        true
    }
}

fn print_device(description: &str, name: Option<&str>) {
    println!("{}: {}", description, name.unwrap_or("None"));
}

fn parse_octal(token: &str, max: u16) -> Option<u16> {
    if token.is_empty() || !token.bytes().all(|c| (b'0'..=b'7').contains(&c)) {
        return None;
    }
    u16::from_str_radix(token, 8)
        .ok()
        .filter(|value| *value <= max)
}

fn main() {
    let options = Options::from_args();

    let mut storage = Storage::new();
    let mut reader = PaperTapeReader::new();
    if let Some(path) = &options.reader {
        if !reader.open(&path.to_string_lossy()) {
            process::exit(1);
        }
    }
    let mut punch = PaperTapePunch::new();
    if let Some(path) = &options.punch {
        if !punch.open(&path.to_string_lossy()) {
            process::exit(1);
        }
    }
    let input_output = InputOutput::new(vec![
        Box::new(punch),
        Box::new(reader),
        Box::new(NullDevice::new()),
    ]);

    if let Some(program) = &options.program {
        match asm::assemble_file(&program.to_string_lossy(), &mut storage) {
            Ok(()) => println!("Assembled {}.", program.display()),
            Err(errors) => {
                for error in errors {
                    eprintln!("{}", error.red());
                }
                process::exit(1);
            }
        }
    }

    let mut run_loop = RunLoop::new(DevConsole::new(), storage, input_output);
    // The machine starts stopped; the console takes over from here and
    // only an exit command ends the process.
    loop {
        run_loop.run();
    }
}
