//! The micro-operation library.
//!
//! Micro-operations are the small state transitions instructions are
//! composed from: register moves, arithmetic into A, shifts, branch
//! selection, bank-control updates, and word transfers through the I/O
//! subsystem. The operand address and bank must be selected (see
//! `effective_address`) before a micro-operation runs.
//!
//! Notation in the comments: `[X]` is "the contents of the address in
//! register X", and a trailing letter picks the bank, `(b)` buffer,
//! `(d)` direct, `(i)` indirect, `(r)` relative. So `[S](r)` is the word
//! at address S in the relative storage bank.
//!
//! Micro-operations that drive the I/O subsystem return the cycles they
//! consumed; everything else is fixed-cost and the instruction table
//! carries the cost.

use crate::arithmetic::WORD_MASK;
use crate::hardware::Hardware;
use crate::input_output::InitiationStatus;

pub fn do_nothing(_hardware: &mut Hardware) {}

/// Halt the machine without setting the error status.
pub fn halt(hardware: &mut Hardware) {
    hardware.storage.stop();
}

/// Halt the machine and set the error status.
pub fn error(hardware: &mut Hardware) {
    hardware.storage.stop();
    hardware.storage.err_status = true;
}

// Loads and register moves.

/// E -> A
pub fn e_to_a(hardware: &mut Hardware) {
    hardware.storage.e_to_z();
    hardware.storage.z_to_a();
}

/// ~E -> A
pub fn e_complement_to_a(hardware: &mut Hardware) {
    e_to_a(hardware);
    hardware.storage.complement_a();
}

/// P -> A
pub fn p_to_a(hardware: &mut Hardware) {
    hardware.storage.p_to_a();
}

/// BUF‖DIR‖IND‖REL -> A
pub fn bank_controls_to_a(hardware: &mut Hardware) {
    hardware.storage.bank_controls_to_a();
}

/// [S](d) -> A
pub fn s_direct_to_a(hardware: &mut Hardware) {
    hardware.storage.s_direct_to_a();
}

/// ~[S](d) -> A
pub fn s_direct_complement_to_a(hardware: &mut Hardware) {
    hardware.storage.s_direct_to_a();
    hardware.storage.complement_a();
}

/// [S](i) -> A
pub fn s_indirect_to_a(hardware: &mut Hardware) {
    hardware.storage.s_indirect_to_a();
}

/// ~[S](i) -> A
pub fn s_indirect_complement_to_a(hardware: &mut Hardware) {
    hardware.storage.s_indirect_to_a();
    hardware.storage.complement_a();
}

/// [S](r) -> A
pub fn s_relative_to_a(hardware: &mut Hardware) {
    hardware.storage.s_relative_to_a();
}

/// ~[S](r) -> A
pub fn s_relative_complement_to_a(hardware: &mut Hardware) {
    hardware.storage.s_relative_to_a();
    hardware.storage.complement_a();
}

/// [7777](0) -> A
pub fn specific_to_a(hardware: &mut Hardware) {
    hardware.storage.specific_to_a();
}

/// ~[7777](0) -> A
pub fn specific_complement_to_a(hardware: &mut Hardware) {
    hardware.storage.specific_to_a();
    hardware.storage.complement_a();
}

// Stores.

/// A -> [S](d)
pub fn a_to_direct(hardware: &mut Hardware) {
    hardware.storage.a_to_s_direct();
}

/// A -> [S](i)
pub fn a_to_indirect(hardware: &mut Hardware) {
    hardware.storage.a_to_s_indirect();
}

/// A -> [S](r)
pub fn a_to_relative(hardware: &mut Hardware) {
    hardware.storage.a_to_s_relative();
}

/// A -> [7777](0)
pub fn a_to_specific(hardware: &mut Hardware) {
    hardware.storage.a_to_specific();
}

/// P -> [E](d). Used by STP to expose the program address.
pub fn p_to_e_direct(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    storage.write_direct_bank(storage.f_e, storage.p_register);
}

/// Set S from [E](d) beforehand; store the lower six bits of A into
/// [S](i), keeping the upper six.
pub fn half_write_indirect(hardware: &mut Hardware) {
    hardware.storage.half_write_to_s_indirect();
    hardware.storage.mode_indirect();
}

// Addition and subtraction into A.

/// A + E -> A
pub fn add_e_to_a(hardware: &mut Hardware) {
    hardware.storage.add_e_to_a();
}

/// A + [S](d) -> A
pub fn add_direct_to_a(hardware: &mut Hardware) {
    let bank = hardware.storage.direct_storage_bank;
    hardware.storage.add_s_address_to_a(bank);
}

/// A + [S](i) -> A
pub fn add_indirect_to_a(hardware: &mut Hardware) {
    let bank = hardware.storage.indirect_storage_bank;
    hardware.storage.add_s_address_to_a(bank);
}

/// A + [S](r) -> A
pub fn add_relative_to_a(hardware: &mut Hardware) {
    let bank = hardware.storage.relative_storage_bank;
    hardware.storage.add_s_address_to_a(bank);
}

/// A + [7777](0) -> A. S holds 7777 when this runs.
pub fn add_specific_to_a(hardware: &mut Hardware) {
    hardware.storage.add_s_address_to_a(0);
}

/// A - E -> A
pub fn subtract_e_from_a(hardware: &mut Hardware) {
    hardware.storage.subtract_e_from_a();
}

/// A - [S](d) -> A
pub fn subtract_direct_from_a(hardware: &mut Hardware) {
    let bank = hardware.storage.direct_storage_bank;
    hardware.storage.subtract_s_address_from_a(bank);
}

/// A - [S](i) -> A
pub fn subtract_indirect_from_a(hardware: &mut Hardware) {
    let bank = hardware.storage.indirect_storage_bank;
    hardware.storage.subtract_s_address_from_a(bank);
}

/// A - [S](r) -> A
pub fn subtract_relative_from_a(hardware: &mut Hardware) {
    let bank = hardware.storage.relative_storage_bank;
    hardware.storage.subtract_s_address_from_a(bank);
}

/// A - [7777](0) -> A
pub fn subtract_specific_from_a(hardware: &mut Hardware) {
    hardware.storage.subtract_specific_from_a();
}

// Logical product and selective complement.

/// A & E -> A
pub fn and_e_with_a(hardware: &mut Hardware) {
    hardware.storage.and_e_with_a();
}

/// A & [S](d) -> A
pub fn and_direct_with_a(hardware: &mut Hardware) {
    let bank = hardware.storage.direct_storage_bank;
    hardware.storage.and_s_address_with_a(bank);
}

/// A & [S](i) -> A
pub fn and_indirect_with_a(hardware: &mut Hardware) {
    let bank = hardware.storage.indirect_storage_bank;
    hardware.storage.and_s_address_with_a(bank);
}

/// A & [S](r) -> A
pub fn and_relative_with_a(hardware: &mut Hardware) {
    let bank = hardware.storage.relative_storage_bank;
    hardware.storage.and_s_address_with_a(bank);
}

/// A & [7777](0) -> A
pub fn and_specific_with_a(hardware: &mut Hardware) {
    hardware.storage.and_specific_with_a();
}

/// A ^ E -> A
pub fn selective_complement_no_address(hardware: &mut Hardware) {
    hardware.storage.e_to_z();
    hardware.storage.xor_a_with_z();
}

/// A ^ [S](d) -> A
pub fn selective_complement_direct(hardware: &mut Hardware) {
    hardware.storage.s_direct_to_z();
    hardware.storage.xor_a_with_z();
}

/// A ^ [S](i) -> A
pub fn selective_complement_indirect(hardware: &mut Hardware) {
    hardware.storage.s_indirect_to_z();
    hardware.storage.xor_a_with_z();
}

/// A ^ [S](r) -> A
pub fn selective_complement_relative(hardware: &mut Hardware) {
    hardware.storage.s_relative_to_z();
    hardware.storage.xor_a_with_z();
}

/// A ^ [7777](0) -> A
pub fn selective_complement_specific(hardware: &mut Hardware) {
    hardware.storage.specific_to_z();
    hardware.storage.xor_a_with_z();
}

// Shifts and rotates. Left shifts rotate end-around; right shifts
// extend the sign.

/// [A] << 1 -> A, end around.
pub fn rotate_a_left_one(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    let end_around = (storage.a_register & 0o4000) >> 11;
    storage.a_register = ((storage.a_register << 1) & WORD_MASK) | end_around;
}

/// [A] << 2 -> A, end around.
pub fn rotate_a_left_two(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    let end_around = (storage.a_register & 0o6000) >> 10;
    storage.a_register = ((storage.a_register << 2) & WORD_MASK) | end_around;
}

/// [A] << 3 -> A, end around.
pub fn rotate_a_left_three(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    let end_around = (storage.a_register & 0o7000) >> 9;
    storage.a_register = ((storage.a_register << 3) & WORD_MASK) | end_around;
}

/// [A] << 6 -> A, end around.
pub fn rotate_a_left_six(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    let end_around = (storage.a_register & 0o7700) >> 6;
    storage.a_register = ((storage.a_register << 6) & WORD_MASK) | end_around;
}

/// [A] >> 1 -> A, sign extended.
pub fn shift_a_right_one(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    let sign_extension = storage.a_register & 0o4000;
    storage.a_register = (storage.a_register >> 1) | sign_extension;
}

/// [A] >> 2 -> A, sign extended.
pub fn shift_a_right_two(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    let sign_extension = if storage.a_register & 0o4000 == 0 {
        0
    } else {
        0o6000
    };
    storage.a_register = (storage.a_register >> 2) | sign_extension;
}

// Shift replace: load, rotate left one, store back.

/// [S](d) << 1 -> A and [S](d)
pub fn shift_replace_direct(hardware: &mut Hardware) {
    s_direct_to_a(hardware);
    rotate_a_left_one(hardware);
    a_to_direct(hardware);
}

/// [S](i) << 1 -> A and [S](i)
pub fn shift_replace_indirect(hardware: &mut Hardware) {
    s_indirect_to_a(hardware);
    rotate_a_left_one(hardware);
    a_to_indirect(hardware);
}

/// [S](r) << 1 -> A and [S](r)
pub fn shift_replace_relative(hardware: &mut Hardware) {
    s_relative_to_a(hardware);
    rotate_a_left_one(hardware);
    a_to_relative(hardware);
}

/// [7777](0) << 1 -> A and [7777](0)
pub fn shift_replace_specific(hardware: &mut Hardware) {
    specific_to_a(hardware);
    rotate_a_left_one(hardware);
    a_to_specific(hardware);
}

// Replace add: A + [S] -> A and [S].

fn replace_add(hardware: &mut Hardware, bank: u16) {
    hardware.storage.add_s_address_to_a(bank);
    hardware.storage.store_a(bank);
}

/// A + [S](d) -> A and [S](d)
pub fn replace_add_direct(hardware: &mut Hardware) {
    let bank = hardware.storage.direct_storage_bank;
    replace_add(hardware, bank);
}

/// A + [S](i) -> A and [S](i)
pub fn replace_add_indirect(hardware: &mut Hardware) {
    let bank = hardware.storage.indirect_storage_bank;
    replace_add(hardware, bank);
}

/// A + [S](r) -> A and [S](r)
pub fn replace_add_relative(hardware: &mut Hardware) {
    let bank = hardware.storage.relative_storage_bank;
    replace_add(hardware, bank);
}

/// A + [7777](0) -> A and [7777](0)
pub fn replace_add_specific(hardware: &mut Hardware) {
    replace_add(hardware, 0);
}

// Replace add one: [S] + 1 -> A and [S].

/// [S](d) + 1 -> A and [S](d)
pub fn replace_add_one_direct(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    storage.s_direct_to_a();
    storage.add_to_a(1);
    storage.a_to_s_direct();
}

/// [S](i) + 1 -> A and [S](i)
pub fn replace_add_one_indirect(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    storage.s_indirect_to_a();
    storage.add_to_a(1);
    storage.a_to_s_indirect();
}

/// [S](r) + 1 -> A and [S](r)
pub fn replace_add_one_relative(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    storage.s_relative_to_a();
    storage.add_to_a(1);
    storage.a_to_s_relative();
}

/// [7777](0) + 1 -> A and [7777](0)
pub fn replace_add_one_specific(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    storage.specific_to_a();
    storage.add_to_a(1);
    storage.a_to_specific();
}

/// A × 10 -> A
pub fn multiply_a_by_10(hardware: &mut Hardware) {
    hardware.storage.a_times_10();
}

/// A × 100 -> A
pub fn multiply_a_by_100(hardware: &mut Hardware) {
    hardware.storage.a_times_100();
}

// Bank-control updates. The jumping forms branch to [A] in the newly
// selected relative bank.

/// E & 7 -> buffer bank control
pub fn set_buf_bank_from_e(hardware: &mut Hardware) {
    hardware.storage.set_buffer_bank_from_e();
}

/// E & 7 -> direct bank control
pub fn set_dir_bank_from_e(hardware: &mut Hardware) {
    hardware.storage.set_direct_bank_from_e();
}

/// E & 7 -> indirect bank control
pub fn set_ind_bank_from_e(hardware: &mut Hardware) {
    hardware.storage.set_indirect_bank_from_e();
}

/// E & 7 -> direct and indirect bank controls
pub fn set_ind_dir_bank_from_e(hardware: &mut Hardware) {
    hardware.storage.set_direct_bank_from_e();
    hardware.storage.set_indirect_bank_from_e();
}

/// E & 7 -> relative bank control, [A] -> P
pub fn set_rel_bank_from_e_and_jump(hardware: &mut Hardware) {
    hardware.storage.set_relative_bank_from_e_and_jump();
}

/// E & 7 -> indirect and relative bank controls, [A] -> P
pub fn set_ind_rel_bank_from_e_and_jump(hardware: &mut Hardware) {
    hardware.storage.set_indirect_bank_from_e();
    hardware.storage.set_relative_bank_from_e_and_jump();
}

/// E & 7 -> direct and relative bank controls, [A] -> P
pub fn set_dir_rel_bank_from_e_and_jump(hardware: &mut Hardware) {
    hardware.storage.set_direct_bank_from_e();
    hardware.storage.set_relative_bank_from_e_and_jump();
}

/// E & 7 -> direct, indirect, and relative bank controls, [A] -> P
pub fn set_dir_ind_rel_bank_from_e_and_jump(hardware: &mut Hardware) {
    hardware.storage.set_direct_bank_from_e();
    hardware.storage.set_indirect_bank_from_e();
    hardware.storage.set_relative_bank_from_e_and_jump();
}

// Jumps. S holds the branch target when a jump micro-operation runs.

/// JFI: S -> P, where S came from [P + E](r).
pub fn jump_forward_indirect(hardware: &mut Hardware) {
    hardware.storage.s_to_next_address();
}

/// JPI: [E](d) -> P
pub fn jump_indirect(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    storage.direct_to_z(storage.f_e);
    storage.z_to_next_address();
}

/// JPR: P + 2 -> [S](r), S + 1 -> P. A subroutine call: the return
/// address lands at the invoked address and execution resumes just past
/// it. Returning through the stored word is self-modifying by design.
pub fn return_jump(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    let jump_address = (storage.s_register + 1) & WORD_MASK;
    let return_address = (storage.p_register + 2) & WORD_MASK;
    storage.value_to_s_address_relative(return_address);
    storage.set_next_instruction_address(jump_address);
}

// Conditional jumps on A. The zero test accepts +0 only; nonzero
// accepts anything else, including -0. Taken jumps cost an extra cycle.

/// Jump to S when A is +0.
pub fn jump_if_a_zero(hardware: &mut Hardware) -> u32 {
    let storage = &mut hardware.storage;
    if storage.a_zero() {
        storage.s_to_next_address();
        2
    } else {
        storage.next_after_one_word_instruction();
        1
    }
}

/// Jump to S when A is anything but +0.
pub fn jump_if_a_nonzero(hardware: &mut Hardware) -> u32 {
    let storage = &mut hardware.storage;
    if storage.a_not_zero() {
        storage.s_to_next_address();
        2
    } else {
        storage.next_after_one_word_instruction();
        1
    }
}

/// Jump to S when A's sign bit is clear. Accepts +0.
pub fn jump_if_a_positive(hardware: &mut Hardware) -> u32 {
    let storage = &mut hardware.storage;
    if storage.a_positive() {
        storage.s_to_next_address();
        2
    } else {
        storage.next_after_one_word_instruction();
        1
    }
}

/// Jump to S when A's sign bit is set. Accepts -0.
pub fn jump_if_a_negative(hardware: &mut Hardware) -> u32 {
    let storage = &mut hardware.storage;
    if storage.a_negative() {
        storage.s_to_next_address();
        2
    } else {
        storage.next_after_one_word_instruction();
        1
    }
}

// Selective jump and stop, driven by the console switch masks.

/// Branch to [G] when the upper half of E matches a set jump switch.
pub fn selective_jump(hardware: &mut Hardware) -> u32 {
    let storage = &mut hardware.storage;
    let mask = (storage.f_e >> 3) & 0o7;
    if storage.and_with_jump_switches(mask) != 0 {
        storage.g_to_next_address();
        2
    } else {
        storage.next_after_two_word_instruction();
        1
    }
}

/// Halt when the lower half of E matches a set stop switch. Execution
/// resumes normally when the operator restarts the machine.
pub fn selective_stop(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    let mask = storage.f_e & 0o7;
    if storage.and_with_stop_switches(mask) != 0 {
        storage.stop();
    }
}

/// Selective stop, then selective jump; the cycle count comes from the
/// jump branch and resumption continues at the selected address.
pub fn selective_stop_and_jump(hardware: &mut Hardware) -> u32 {
    selective_stop(hardware);
    selective_jump(hardware)
}

// Buffer controls.

/// ATE: A -> BER, or branch to [G] when the buffer channel is busy.
pub fn a_to_buffer_entrance(hardware: &mut Hardware) -> u32 {
    let storage = &mut hardware.storage;
    if storage.buffering {
        storage.g_to_next_address();
        2
    } else {
        storage.a_to_buffer_entrance_register();
        storage.next_after_two_word_instruction();
        1
    }
}

/// ATX: A -> BXR, or branch to [G] when the buffer channel is busy.
pub fn a_to_buffer_exit(hardware: &mut Hardware) -> u32 {
    let storage = &mut hardware.storage;
    if storage.buffering {
        storage.g_to_next_address();
        2
    } else {
        storage.a_to_buffer_exit_register();
        storage.next_after_two_word_instruction();
        1
    }
}

/// ETA: BER -> A
pub fn buffer_entrance_to_a(hardware: &mut Hardware) {
    hardware.storage.buffer_entrance_to_a();
}

/// BXR -> A
pub fn buffer_exit_to_a(hardware: &mut Hardware) {
    hardware.storage.buffer_exit_to_a();
}

/// STE: BER -> [E](d), then A -> BER, regardless of buffer activity.
pub fn buffer_entrance_to_direct_and_set_from_a(hardware: &mut Hardware) {
    let storage = &mut hardware.storage;
    storage.buffer_entrance_register_to_direct_storage();
    storage.a_to_buffer_entrance_register();
}

/// BLS: fill the buffer bank with A from BER up to BXR, synchronously.
/// Branches to [G] instead when a buffered transfer is active.
pub fn block_store(hardware: &mut Hardware) -> u32 {
    let storage = &mut hardware.storage;
    if storage.buffering {
        storage.g_to_next_address();
        2
    } else {
        let mut cycles_used = 1;
        storage.a_to_buffer_data_register();
        storage.start_buffering();
        while storage.buffer_data_to_memory() {
            cycles_used += 1;
        }
        storage.stop_buffering();
        storage.next_after_two_word_instruction();
        cycles_used
    }
}

/// CBC: cancel buffered I/O and release the buffer channel.
pub fn clear_buffer_controls(hardware: &mut Hardware) {
    let Hardware {
        storage,
        input_output,
    } = hardware;
    input_output.clear_buffer_controls(storage);
}

/// CIL: clear the interrupt lock. Takes effect after the following
/// instruction.
pub fn clear_interrupt_lock(hardware: &mut Hardware) {
    hardware.storage.clear_interrupt_lock();
}

// Input/output through the I/O subsystem.

/// EXC and EXF: present [S](r) to the devices as an external function
/// code. A successful selection leaves the device on the normal channel;
/// a device status response replaces A; an unanswered request hangs the
/// machine.
pub fn external_function(hardware: &mut Hardware) {
    let Hardware {
        storage,
        input_output,
    } = hardware;
    storage.set_interrupt_lock();
    let operand = storage.s_relative_address_contents();
    let (status, response) = input_output.external_function(operand);
    storage.machine_hung = !status;
    if let Some(response) = response {
        storage.a_register = response;
    }
}

/// INA: read one word from the normal channel into A.
pub fn input_to_a(hardware: &mut Hardware) -> u32 {
    let Hardware {
        storage,
        input_output,
    } = hardware;
    storage.normal_input_active();
    match input_output.read_normal() {
        Some(value) => storage.a_register = value,
        None => storage.indefinite_delay(),
    }
    input_output.read_delay()
}

/// INP: read from the normal channel into the indirect bank, S (the
/// FWA) through [G] (the LWA + 1). A read failure hangs the machine and
/// breaks the transfer.
pub fn input_to_memory(hardware: &mut Hardware) -> u32 {
    let Hardware {
        storage,
        input_output,
    } = hardware;
    storage.normal_input_active();
    let mut elapsed_cycles = 0;
    let lwa_plus_one = storage.g_contents();
    while storage.s_register < lwa_plus_one && !storage.machine_hung {
        match input_output.read_normal() {
            Some(word) => storage.store_at_s_indirect_and_increment_s(word),
            None => storage.indefinite_delay(),
        }
        elapsed_cycles += input_output.read_delay();
    }
    elapsed_cycles
}

/// Write one word to the normal channel, hanging the machine when the
/// write cannot complete.
fn write_word_normal(hardware: &mut Hardware, value: u16) -> bool {
    let Hardware {
        storage,
        input_output,
    } = hardware;
    storage.normal_output_active();
    let status = input_output.write_normal(value);
    if !status {
        storage.indefinite_delay();
    }
    status
}

/// OTA: write A to the normal channel.
pub fn output_from_a(hardware: &mut Hardware) -> u32 {
    let value = hardware.storage.a_register;
    write_word_normal(hardware, value);
    hardware.input_output.write_delay()
}

/// OTN: write E to the normal channel.
pub fn output_no_address(hardware: &mut Hardware) -> u32 {
    let value = hardware.storage.f_e;
    write_word_normal(hardware, value);
    hardware.input_output.write_delay()
}

/// OUT: write the indirect bank, S (the FWA) through [G] (the LWA + 1),
/// to the normal channel. S ends just past the last word written.
pub fn output_from_memory(hardware: &mut Hardware) -> u32 {
    let mut elapsed_cycles = 0;
    let lwa_plus_one = hardware.storage.g_contents();
    let mut io_status = true;
    while io_status
        && hardware.storage.s_register < lwa_plus_one
        && !hardware.storage.machine_hung
    {
        let word = hardware.storage.read_from_s_indirect_and_increment_s();
        io_status = write_word_normal(hardware, word);
        elapsed_cycles += hardware.input_output.write_delay();
    }
    elapsed_cycles
}

/// IBI: start buffered input, or branch to [G] when the buffer channel
/// is already running.
pub fn initiate_buffer_input(hardware: &mut Hardware) -> u32 {
    let Hardware {
        storage,
        input_output,
    } = hardware;
    match input_output.initiate_buffer_input(storage) {
        InitiationStatus::Started => {
            storage.next_after_two_word_instruction();
            1
        }
        InitiationStatus::AlreadyRunning => {
            storage.g_to_next_address();
            2
        }
    }
}

/// IBO: start buffered output, or branch to [G] when the buffer channel
/// is already running.
pub fn initiate_buffer_output(hardware: &mut Hardware) -> u32 {
    let Hardware {
        storage,
        input_output,
    } = hardware;
    match input_output.initiate_buffer_output(storage) {
        InitiationStatus::Started => {
            storage.next_after_two_word_instruction();
            1
        }
        InitiationStatus::AlreadyRunning => {
            storage.g_to_next_address();
            2
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::input_output::InputOutput;
    use crate::storage::Storage;

    fn hardware() -> Hardware {
        let mut storage = Storage::new();
        storage.buffer_storage_bank = 1;
        storage.direct_storage_bank = 2;
        storage.indirect_storage_bank = 3;
        storage.relative_storage_bank = 4;
        storage.run();
        Hardware::new(InputOutput::new(vec![]), storage)
    }

    #[test]
    fn left_rotates_are_end_around() {
        let mut hardware = hardware();
        hardware.storage.a_register = 0o4321;
        rotate_a_left_one(&mut hardware);
        assert_eq!(hardware.storage.a_register, 0o0643);
        hardware.storage.a_register = 0o4321;
        rotate_a_left_two(&mut hardware);
        assert_eq!(hardware.storage.a_register, 0o1506);
        hardware.storage.a_register = 0o4321;
        rotate_a_left_three(&mut hardware);
        assert_eq!(hardware.storage.a_register, 0o3214);
        hardware.storage.a_register = 0o3412;
        rotate_a_left_six(&mut hardware);
        assert_eq!(hardware.storage.a_register, 0o1234);
    }

    #[test]
    fn right_shifts_extend_the_sign() {
        let mut hardware = hardware();
        hardware.storage.a_register = 0o4321;
        shift_a_right_one(&mut hardware);
        assert_eq!(hardware.storage.a_register, 0o6150);
        hardware.storage.a_register = 0o4321;
        shift_a_right_two(&mut hardware);
        assert_eq!(hardware.storage.a_register, 0o7064);
        hardware.storage.a_register = 0o0321;
        shift_a_right_one(&mut hardware);
        assert_eq!(hardware.storage.a_register, 0o0150);
    }

    #[test]
    fn conditional_jump_predicates() {
        let mut hardware = hardware();
        hardware.storage.s_register = 0o1000;
        hardware.storage.p_register = 0o100;

        hardware.storage.a_register = 0;
        assert_eq!(jump_if_a_zero(&mut hardware), 2);
        assert_eq!(hardware.storage.next_address(), 0o1000);
        // Minus zero is not zero.
        hardware.storage.a_register = 0o7777;
        assert_eq!(jump_if_a_zero(&mut hardware), 1);
        assert_eq!(hardware.storage.next_address(), 0o101);
        assert_eq!(jump_if_a_nonzero(&mut hardware), 2);

        // Plus zero is positive, minus zero is negative.
        hardware.storage.a_register = 0;
        assert_eq!(jump_if_a_positive(&mut hardware), 2);
        assert_eq!(jump_if_a_negative(&mut hardware), 1);
        hardware.storage.a_register = 0o7777;
        assert_eq!(jump_if_a_negative(&mut hardware), 2);
        assert_eq!(jump_if_a_positive(&mut hardware), 1);
    }

    #[test]
    fn return_jump_stores_the_return_address() {
        let mut hardware = hardware();
        hardware.storage.p_register = 0o100;
        hardware.storage.s_register = 0o1000;
        return_jump(&mut hardware);
        assert_eq!(hardware.storage.read_relative_bank(0o1000), 0o102);
        assert_eq!(hardware.storage.next_address(), 0o1001);
    }

    #[test]
    fn selective_jump_consults_the_switch_mask() {
        let mut hardware = hardware();
        hardware.storage.p_register = 0o100;
        hardware.storage.write_relative_bank(0o101, 0o200);
        hardware.storage.f_e = 0o20;
        hardware.storage.set_jump_switch_mask(0o6);
        assert_eq!(selective_jump(&mut hardware), 2);
        assert_eq!(hardware.storage.next_address(), 0o200);
        hardware.storage.set_jump_switch_mask(0o5);
        assert_eq!(selective_jump(&mut hardware), 1);
        assert_eq!(hardware.storage.next_address(), 0o102);
    }

    #[test]
    fn selective_stop_consults_the_switch_mask() {
        let mut hardware = hardware();
        hardware.storage.f_e = 0o02;
        hardware.storage.set_stop_switch_mask(0o5);
        selective_stop(&mut hardware);
        assert!(hardware.storage.run_stop_status);
        hardware.storage.set_stop_switch_mask(0o6);
        selective_stop(&mut hardware);
        assert!(!hardware.storage.run_stop_status);
    }

    #[test]
    fn block_store_fills_ber_through_bxr() {
        let mut hardware = hardware();
        hardware.storage.p_register = 0o100;
        hardware.storage.buffer_entrance_register = 0o200;
        hardware.storage.buffer_exit_register = 0o401;
        hardware.storage.a_register = 0o7654;
        assert_eq!(block_store(&mut hardware), 0o201);
        assert_eq!(hardware.storage.buffer_entrance_register, 0o401);
        assert_eq!(hardware.storage.read_buffer_bank(0o177), 0);
        assert_eq!(hardware.storage.read_buffer_bank(0o401), 0);
        for address in 0o200..0o401 {
            assert_eq!(hardware.storage.read_buffer_bank(address), 0o7654);
        }
        assert!(!hardware.storage.buffering);
        assert_eq!(hardware.storage.next_address(), 0o102);
    }

    #[test]
    fn block_store_branches_when_buffering() {
        let mut hardware = hardware();
        hardware.storage.p_register = 0o100;
        hardware.storage.write_relative_bank(0o101, 0o1000);
        hardware.storage.start_buffering();
        assert_eq!(block_store(&mut hardware), 2);
        assert_eq!(hardware.storage.next_address(), 0o1000);
        assert!(hardware.storage.buffering);
    }

    #[test]
    fn output_without_a_device_hangs_the_machine() {
        let mut hardware = hardware();
        hardware.storage.a_register = 0o34;
        assert_eq!(output_from_a(&mut hardware), 0);
        assert!(hardware.storage.machine_hung);
    }
}
