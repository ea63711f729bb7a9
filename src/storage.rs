//! CDC 160-A memory and register file.
//!
//! All values live in `u16`s whose upper four bits are always zero; every
//! memory access masks both the address and the value to 12 bits. Storage
//! holds the largest supported configuration, 8 banks of 4096 words.
//!
//! The register complement follows the CDC 160-A Programming Manual. The
//! next-instruction latch has no hardware counterpart: committing the next
//! address only after an instruction completes lets a halted machine display
//! the halting instruction's own address.

use crate::arithmetic::{self, SIGN_BIT, WORD_MASK};

pub const BANK_COUNT: usize = 8;
pub const BANK_SIZE: usize = 4096;

/// Bank 0, address 7777: the fixed location used by the *S instructions.
pub const SPECIFIC_ADDRESS: u16 = 0o7777;

/// Trap addresses of the four interrupt lines, highest priority first.
/// An accepted interrupt saves P at the trap address in the direct bank
/// and resumes at trap + 1 in the relative bank.
pub const INTERRUPT_ADDRESSES: [u16; 4] = [0o10, 0o20, 0o30, 0o40];

/// The kind of storage cycle most recently requested. Drives the console
/// display only; micro-operations select their banks explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageCycle {
    Buffer,
    Direct,
    Indirect,
    Relative,
    Specific,
}

/// Gate controlling interrupt acceptance. CIL moves a locked machine to
/// `UnlockPending`; the run loop frees the lock one full instruction later,
/// so the instruction after CIL still executes locked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptLock {
    Free,
    Locked,
    UnlockPending,
}

/// Activity on the normal (synchronous) I/O channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalIoStatus {
    Idle,
    Input,
    Output,
}

pub struct Storage {
    /// Core memory, 8 banks of 4096 12-bit words.
    pub memory: [[u16; BANK_SIZE]; BANK_COUNT],

    /// Accumulator.
    pub a_register: u16,
    /// Auxiliary accumulator A', the output register of the borrow pyramid.
    pub aprime_register: u16,
    /// Word being moved to or from storage during buffered I/O.
    pub buffer_data_register: u16,
    /// Address the next buffered word moves to or from.
    pub buffer_entrance_register: u16,
    /// Last word address + 1 of the active buffered operation.
    pub buffer_exit_register: u16,
    /// Upper six bits of the unpacked instruction word.
    pub f_instruction: u16,
    /// Lower six bits of the unpacked instruction word.
    pub f_e: u16,
    /// 8-bit register holding data bound for the paper tape punch, which
    /// frees Z for high speed I/O.
    pub punch_storage_register: u16,
    /// Address of the current instruction.
    pub p_register: u16,
    /// Storage address currently being referenced.
    pub s_register: u16,
    /// Transient register between storage and the normal I/O channel.
    pub z_register: u16,

    // Storage bank controls, named for the addressing mode they serve.
    // P always addresses the relative bank.
    pub buffer_storage_bank: u16,
    pub direct_storage_bank: u16,
    pub indirect_storage_bank: u16,
    pub relative_storage_bank: u16,

    /// True if and only if the computer is running.
    pub run_stop_status: bool,
    /// True if and only if an ERR instruction halted the computer.
    pub err_status: bool,
    /// True while an EXC or EXF selection is in progress.
    pub sel_status: bool,
    /// Set when a synchronous I/O wait cannot complete. Only a master
    /// clear releases it.
    pub machine_hung: bool,
    /// True if and only if a buffer pump is active.
    pub buffering: bool,
    pub normal_io_status: NormalIoStatus,
    pub storage_cycle: StorageCycle,

    pub interrupt_lock: InterruptLock,
    /// Pending interrupt requests, one slot per line in
    /// [`INTERRUPT_ADDRESSES`] order.
    pub interrupt_requests: [bool; 4],

    jump_switch_mask: u16,
    stop_switch_mask: u16,
    next_address: u16,
}

impl Storage {
    pub fn new() -> Storage {
        Storage {
            memory: [[0; BANK_SIZE]; BANK_COUNT],
            a_register: 0,
            aprime_register: 0,
            buffer_data_register: 0,
            buffer_entrance_register: 0,
            buffer_exit_register: 0,
            f_instruction: 0,
            f_e: 0,
            punch_storage_register: 0,
            p_register: 0,
            s_register: 0,
            z_register: 0,
            buffer_storage_bank: 0,
            direct_storage_bank: 0,
            indirect_storage_bank: 0,
            relative_storage_bank: 0,
            run_stop_status: false,
            err_status: false,
            sel_status: false,
            machine_hung: false,
            buffering: false,
            normal_io_status: NormalIoStatus::Idle,
            storage_cycle: StorageCycle::Relative,
            interrupt_lock: InterruptLock::Free,
            interrupt_requests: [false; 4],
            jump_switch_mask: 0,
            stop_switch_mask: 0,
            next_address: 0,
        }
    }

    /// Restore the power-on state: registers, bank controls, and status
    /// cleared, buffering and interrupts cancelled. Memory is preserved.
    pub fn master_clear(&mut self) {
        self.a_register = 0;
        self.aprime_register = 0;
        self.buffer_data_register = 0;
        self.buffer_entrance_register = 0;
        self.buffer_exit_register = 0;
        self.f_instruction = 0;
        self.f_e = 0;
        self.punch_storage_register = 0;
        self.p_register = 0;
        self.s_register = 0;
        self.z_register = 0;
        self.buffer_storage_bank = 0;
        self.direct_storage_bank = 0;
        self.indirect_storage_bank = 0;
        self.relative_storage_bank = 0;
        self.run_stop_status = false;
        self.err_status = false;
        self.sel_status = false;
        self.machine_hung = false;
        self.buffering = false;
        self.normal_io_status = NormalIoStatus::Idle;
        self.storage_cycle = StorageCycle::Relative;
        self.interrupt_lock = InterruptLock::Free;
        self.interrupt_requests = [false; 4];
        self.next_address = 0;
    }

    // A register predicates. Note the one's-complement zero rules: the
    // zero test accepts +0 only, while -0 (all ones) is negative.

    pub fn a_negative(&self) -> bool {
        self.a_register & SIGN_BIT != 0
    }

    pub fn a_not_zero(&self) -> bool {
        self.a_register != 0
    }

    pub fn a_positive(&self) -> bool {
        self.a_register & SIGN_BIT == 0
    }

    pub fn a_zero(&self) -> bool {
        self.a_register == 0
    }

    // Memory access. Addresses and values are masked to 12 bits on every
    // reference.

    pub fn read_absolute(&self, bank: u16, address: u16) -> u16 {
        self.memory[(bank & 0o7) as usize][(address & WORD_MASK) as usize]
    }

    pub fn write_absolute(&mut self, bank: u16, address: u16, value: u16) {
        self.memory[(bank & 0o7) as usize][(address & WORD_MASK) as usize] =
            value & WORD_MASK;
    }

    pub fn read_buffer_bank(&self, address: u16) -> u16 {
        self.read_absolute(self.buffer_storage_bank, address)
    }

    pub fn read_direct_bank(&self, address: u16) -> u16 {
        self.read_absolute(self.direct_storage_bank, address)
    }

    pub fn read_indirect_bank(&self, address: u16) -> u16 {
        self.read_absolute(self.indirect_storage_bank, address)
    }

    pub fn read_relative_bank(&self, address: u16) -> u16 {
        self.read_absolute(self.relative_storage_bank, address)
    }

    pub fn read_specific(&self) -> u16 {
        self.memory[0][SPECIFIC_ADDRESS as usize]
    }

    pub fn write_buffer_bank(&mut self, address: u16, value: u16) {
        self.write_absolute(self.buffer_storage_bank, address, value);
    }

    pub fn write_direct_bank(&mut self, address: u16, value: u16) {
        self.write_absolute(self.direct_storage_bank, address, value);
    }

    pub fn write_indirect_bank(&mut self, address: u16, value: u16) {
        self.write_absolute(self.indirect_storage_bank, address, value);
    }

    pub fn write_relative_bank(&mut self, address: u16, value: u16) {
        self.write_absolute(self.relative_storage_bank, address, value);
    }

    pub fn write_specific(&mut self, value: u16) {
        self.memory[0][SPECIFIC_ADDRESS as usize] = value & WORD_MASK;
    }

    // Storage cycle declarations, display state only.

    pub fn mode_buffer(&mut self) {
        self.storage_cycle = StorageCycle::Buffer;
    }

    pub fn mode_direct(&mut self) {
        self.storage_cycle = StorageCycle::Direct;
    }

    pub fn mode_indirect(&mut self) {
        self.storage_cycle = StorageCycle::Indirect;
    }

    pub fn mode_relative(&mut self) {
        self.storage_cycle = StorageCycle::Relative;
    }

    pub fn mode_specific(&mut self) {
        self.storage_cycle = StorageCycle::Specific;
    }

    // Register-to-register moves.

    pub fn a_to_z(&mut self) {
        self.z_register = self.a_register;
    }

    pub fn z_to_a(&mut self) {
        self.a_register = self.z_register;
    }

    pub fn e_to_z(&mut self) {
        self.z_register = self.f_e;
    }

    pub fn e_to_s(&mut self) {
        self.s_register = self.f_e;
    }

    pub fn p_to_s(&mut self) {
        self.s_register = self.p_register;
    }

    pub fn p_to_a(&mut self) {
        self.a_register = self.p_register;
    }

    pub fn s_to_p(&mut self) {
        self.p_register = self.s_register;
    }

    pub fn complement_a(&mut self) {
        self.a_register ^= WORD_MASK;
    }

    // Operand and instruction address plumbing.

    /// Fetch the word at P in the relative bank into Z and split it into
    /// F (upper six bits) and E (lower six bits). P is copied to S so the
    /// console shows the instruction's address while it executes.
    pub fn unpack_instruction(&mut self) {
        self.p_to_s();
        self.z_register = self.read_relative_bank(self.s_register);
        self.f_e = self.z_register & 0o77;
        self.f_instruction = (self.z_register >> 6) & 0o77;
    }

    /// S takes the G word's own address, P + 1.
    pub fn g_address_to_s(&mut self) {
        self.s_register = (self.p_register + 1) & WORD_MASK;
    }

    /// S takes the contents of G, the second word of the instruction.
    pub fn g_to_s(&mut self) {
        self.s_register = self.g_contents();
    }

    /// The G word of a two-word instruction, at P + 1 in the relative bank.
    pub fn g_contents(&self) -> u16 {
        self.read_relative_bank(self.p_register + 1)
    }

    pub fn g_to_next_address(&mut self) {
        self.next_address = self.g_contents();
    }

    pub fn relative_forward_to_s(&mut self) {
        self.s_register = (self.p_register + self.f_e) & WORD_MASK;
    }

    pub fn relative_backward_to_s(&mut self) {
        self.s_register =
            (self.p_register + 0o10000 - self.f_e) & WORD_MASK;
    }

    pub fn forward_indirect_to_s(&mut self) {
        self.s_register =
            self.read_relative_bank(self.p_register + self.f_e);
    }

    pub fn e_direct_to_s(&mut self) {
        self.s_register = self.read_direct_bank(self.f_e);
    }

    pub fn specific_to_s(&mut self) {
        self.s_register = SPECIFIC_ADDRESS;
    }

    pub fn direct_to_z(&mut self, address: u16) {
        self.z_register = self.read_direct_bank(address);
    }

    // The next-instruction latch.

    pub fn next_address(&self) -> u16 {
        self.next_address
    }

    pub fn set_next_instruction_address(&mut self, next_address: u16) {
        self.next_address = next_address & WORD_MASK;
    }

    pub fn next_after_one_word_instruction(&mut self) {
        self.next_address = arithmetic::add(self.p_register, 1);
    }

    pub fn next_after_two_word_instruction(&mut self) {
        self.next_address = arithmetic::add(self.p_register, 2);
    }

    pub fn s_to_next_address(&mut self) {
        self.next_address = self.s_register;
    }

    pub fn z_to_next_address(&mut self) {
        self.next_address = self.z_register;
    }

    pub fn advance_to_next_instruction(&mut self) {
        self.p_register = self.next_address;
    }

    // Loads into A. The operand passes through Z, as in the hardware.

    pub fn s_direct_to_z(&mut self) {
        self.z_register = self.read_direct_bank(self.s_register);
    }

    pub fn s_indirect_to_z(&mut self) {
        self.z_register = self.read_indirect_bank(self.s_register);
    }

    pub fn s_relative_to_z(&mut self) {
        self.z_register = self.read_relative_bank(self.s_register);
    }

    pub fn specific_to_z(&mut self) {
        self.z_register = self.read_specific();
    }

    pub fn s_direct_to_a(&mut self) {
        self.s_direct_to_z();
        self.z_to_a();
    }

    pub fn s_indirect_to_a(&mut self) {
        self.s_indirect_to_z();
        self.z_to_a();
    }

    pub fn s_relative_to_a(&mut self) {
        self.s_relative_to_z();
        self.z_to_a();
    }

    pub fn specific_to_a(&mut self) {
        self.specific_to_z();
        self.z_to_a();
    }

    /// Operand for EXC and EXF, taken from [S] in the relative bank.
    pub fn s_relative_address_contents(&self) -> u16 {
        self.read_relative_bank(self.s_register)
    }

    // Stores from A. The value passes through Z on its way out.

    pub fn a_to_s_buffer(&mut self) {
        self.a_to_z();
        self.write_buffer_bank(self.s_register, self.z_register);
        self.mode_buffer();
    }

    pub fn a_to_s_direct(&mut self) {
        self.a_to_z();
        self.write_direct_bank(self.s_register, self.z_register);
        self.mode_direct();
    }

    pub fn a_to_s_indirect(&mut self) {
        self.a_to_z();
        self.write_indirect_bank(self.s_register, self.z_register);
        self.mode_indirect();
    }

    pub fn a_to_s_relative(&mut self) {
        self.a_to_z();
        self.write_relative_bank(self.s_register, self.z_register);
        self.mode_relative();
    }

    pub fn a_to_specific(&mut self) {
        self.a_to_z();
        self.write_specific(self.z_register);
        self.mode_specific();
    }

    /// Store A at [S] in the given bank, for the replace instructions.
    pub fn store_a(&mut self, bank: u16) {
        self.a_to_z();
        self.write_absolute(bank, self.s_register, self.z_register);
    }

    pub fn value_to_s_address_relative(&mut self, value: u16) {
        self.write_relative_bank(self.s_register, value);
    }

    /// Replace the lower six bits of [S] in the indirect bank with the
    /// lower six bits of A, leaving the upper half untouched.
    pub fn half_write_to_s_indirect(&mut self) {
        let upper = self.read_indirect_bank(self.s_register) & 0o7700;
        self.write_indirect_bank(
            self.s_register, upper | (self.a_register & 0o77));
    }

    // Arithmetic into A. The operand lands in Z and the sum in A', the
    // adder output latch, before it reaches A.

    pub fn add_to_a(&mut self, value: u16) {
        self.aprime_register = arithmetic::add(self.a_register, value);
        self.a_register = self.aprime_register;
    }

    pub fn subtract_from_a(&mut self, value: u16) {
        self.aprime_register = arithmetic::subtract(self.a_register, value);
        self.a_register = self.aprime_register;
    }

    pub fn add_e_to_a(&mut self) {
        self.e_to_z();
        self.add_to_a(self.z_register);
    }

    pub fn subtract_e_from_a(&mut self) {
        self.e_to_z();
        self.subtract_from_a(self.z_register);
    }

    pub fn add_s_address_to_a(&mut self, bank: u16) {
        self.z_register = self.read_absolute(bank, self.s_register);
        self.add_to_a(self.z_register);
    }

    pub fn subtract_s_address_from_a(&mut self, bank: u16) {
        self.z_register = self.read_absolute(bank, self.s_register);
        self.subtract_from_a(self.z_register);
    }

    pub fn subtract_specific_from_a(&mut self) {
        self.specific_to_z();
        self.subtract_from_a(self.z_register);
    }

    // Logical operations into A.

    pub fn and_e_with_a(&mut self) {
        self.e_to_z();
        self.a_register &= self.z_register;
    }

    pub fn and_s_address_with_a(&mut self, bank: u16) {
        self.z_register = self.read_absolute(bank, self.s_register);
        self.a_register &= self.z_register;
    }

    pub fn and_specific_with_a(&mut self) {
        self.specific_to_z();
        self.a_register &= self.z_register;
    }

    pub fn xor_a_with_z(&mut self) {
        self.a_register ^= self.z_register;
    }

    /// A × 10 built from shifts and one's-complement adds: 10a = 8a + 2a.
    pub fn a_times_10(&mut self) {
        let times_2 = arithmetic::add(self.a_register, self.a_register);
        let times_4 = arithmetic::add(times_2, times_2);
        let times_8 = arithmetic::add(times_4, times_4);
        self.aprime_register = arithmetic::add(times_8, times_2);
        self.a_register = self.aprime_register;
    }

    pub fn a_times_100(&mut self) {
        self.a_times_10();
        self.a_times_10();
    }

    // Bank controls.

    pub fn set_buffer_storage_bank(&mut self, value: u16) {
        self.buffer_storage_bank = value & 0o7;
    }

    pub fn set_direct_storage_bank(&mut self, value: u16) {
        self.direct_storage_bank = value & 0o7;
    }

    pub fn set_indirect_storage_bank(&mut self, value: u16) {
        self.indirect_storage_bank = value & 0o7;
    }

    pub fn set_relative_storage_bank(&mut self, value: u16) {
        self.relative_storage_bank = value & 0o7;
    }

    pub fn set_buffer_bank_from_e(&mut self) {
        self.set_buffer_storage_bank(self.f_e);
    }

    pub fn set_direct_bank_from_e(&mut self) {
        self.set_direct_storage_bank(self.f_e);
    }

    pub fn set_indirect_bank_from_e(&mut self) {
        self.set_indirect_storage_bank(self.f_e);
    }

    /// Select a new relative bank and branch to [A] within it.
    pub fn set_relative_bank_from_e_and_jump(&mut self) {
        self.set_relative_storage_bank(self.f_e);
        self.next_address = self.a_register;
    }

    /// Pack the four bank controls into A as BUF‖DIR‖IND‖REL.
    pub fn bank_controls_to_a(&mut self) {
        self.a_register = (self.buffer_storage_bank << 9)
            | (self.direct_storage_bank << 6)
            | (self.indirect_storage_bank << 3)
            | self.relative_storage_bank;
    }

    // Buffered I/O registers.

    pub fn a_to_buffer_entrance_register(&mut self) {
        self.buffer_entrance_register = self.a_register;
    }

    pub fn a_to_buffer_exit_register(&mut self) {
        self.buffer_exit_register = self.a_register;
    }

    pub fn a_to_buffer_data_register(&mut self) {
        self.buffer_data_register = self.a_register;
    }

    pub fn buffer_entrance_to_a(&mut self) {
        self.a_register = self.buffer_entrance_register;
    }

    pub fn buffer_exit_to_a(&mut self) {
        self.a_register = self.buffer_exit_register;
    }

    pub fn buffer_entrance_register_to_direct_storage(&mut self) {
        self.write_direct_bank(self.f_e, self.buffer_entrance_register);
    }

    /// Move BDR to [BER] in the buffer bank and step BER. Returns true
    /// while words remain before BXR.
    pub fn buffer_data_to_memory(&mut self) -> bool {
        self.write_buffer_bank(
            self.buffer_entrance_register, self.buffer_data_register);
        self.buffer_entrance_register =
            (self.buffer_entrance_register + 1) & WORD_MASK;
        self.buffer_entrance_register != self.buffer_exit_register
    }

    /// Move [BER] in the buffer bank to BDR and step BER. Returns true
    /// while words remain before BXR.
    pub fn memory_to_buffer_data(&mut self) -> bool {
        self.buffer_data_register =
            self.read_buffer_bank(self.buffer_entrance_register);
        self.buffer_entrance_register =
            (self.buffer_entrance_register + 1) & WORD_MASK;
        self.buffer_entrance_register != self.buffer_exit_register
    }

    pub fn start_buffering(&mut self) {
        self.buffering = true;
    }

    pub fn stop_buffering(&mut self) {
        self.buffering = false;
    }

    // Synchronous block I/O cursors.

    pub fn store_at_s_indirect_and_increment_s(&mut self, value: u16) {
        self.write_indirect_bank(self.s_register, value);
        self.s_register = (self.s_register + 1) & WORD_MASK;
    }

    pub fn read_from_s_indirect_and_increment_s(&mut self) -> u16 {
        let value = self.read_indirect_bank(self.s_register);
        self.s_register = (self.s_register + 1) & WORD_MASK;
        value
    }

    // Console switch masks, written by the console before each fetch.

    pub fn set_jump_switch_mask(&mut self, mask: u16) {
        self.jump_switch_mask = mask & 0o7;
    }

    pub fn set_stop_switch_mask(&mut self, mask: u16) {
        self.stop_switch_mask = mask & 0o7;
    }

    pub fn and_with_jump_switches(&self, mask: u16) -> u16 {
        mask & self.jump_switch_mask
    }

    pub fn and_with_stop_switches(&self, mask: u16) -> u16 {
        mask & self.stop_switch_mask
    }

    // Machine status.

    pub fn run(&mut self) {
        self.run_stop_status = true;
    }

    pub fn stop(&mut self) {
        self.run_stop_status = false;
    }

    /// A synchronous I/O transfer cannot complete; only operator
    /// intervention releases the machine.
    pub fn indefinite_delay(&mut self) {
        self.machine_hung = true;
    }

    pub fn normal_input_active(&mut self) {
        self.normal_io_status = NormalIoStatus::Input;
    }

    pub fn normal_output_active(&mut self) {
        self.normal_io_status = NormalIoStatus::Output;
    }

    pub fn normal_io_idle(&mut self) {
        self.normal_io_status = NormalIoStatus::Idle;
    }

    // Interrupt machinery.

    pub fn set_interrupt_lock(&mut self) {
        self.interrupt_lock = InterruptLock::Locked;
    }

    /// CIL. Takes effect one instruction later; see [`InterruptLock`].
    pub fn clear_interrupt_lock(&mut self) {
        if self.interrupt_lock == InterruptLock::Locked {
            self.interrupt_lock = InterruptLock::UnlockPending;
        }
    }

    /// Raise the interrupt line with the given trap address (10, 20, 30,
    /// or 40 octal). Unknown lines are ignored.
    pub fn request_interrupt(&mut self, interrupt: u16) {
        if let Some(slot) =
            INTERRUPT_ADDRESSES.iter().position(|&a| a == interrupt)
        {
            self.interrupt_requests[slot] = true;
        }
    }

    /// The highest-priority pending trap address, if any.
    pub fn pending_interrupt(&self) -> Option<u16> {
        self.interrupt_requests
            .iter()
            .position(|&requested| requested)
            .map(|slot| INTERRUPT_ADDRESSES[slot])
    }

    /// Accept an interrupt: save P at the trap address in the direct
    /// bank, resume at trap + 1 in the relative bank, and lock further
    /// interrupts out until the handler runs CIL.
    pub fn service_interrupt(&mut self, interrupt: u16) {
        if let Some(slot) =
            INTERRUPT_ADDRESSES.iter().position(|&a| a == interrupt)
        {
            self.write_direct_bank(interrupt, self.p_register);
            self.p_register = interrupt + 1;
            self.interrupt_lock = InterruptLock::Locked;
            self.interrupt_requests[slot] = false;
        }
    }
}
