//! The 160-A instruction set.
//!
//! An [`Instruction`] is an immutable record binding an addressing-mode
//! resolver, a micro-operation, an advance policy, and a cycle cost.
//! Most instructions cost a fixed number of cycles; the I/O, buffer, and
//! branch instructions compute theirs on the fly. The decoder hands out
//! shared references into the static table below, so a decoded
//! instruction is never constructed at run time.
//!
//! The run loop drives each instruction in two phases: effective-address
//! resolution (which loads S and the display tag, and may be followed by
//! a console stop), then the logic itself, which reports the cycles it
//! consumed.

use crate::effective_address as ea;
use crate::hardware::Hardware;
use crate::micro_ops as ops;
use crate::storage::Storage;

/// How P advances when the logic does not pick the next address itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// The logic set the next-instruction latch (jumps, branches).
    None,
    /// Past a one-word instruction.
    One,
    /// Past a two-word instruction.
    Two,
}

enum Logic {
    Fixed(fn(&mut Hardware), u32),
    Computed(fn(&mut Hardware) -> u32),
}

pub struct Instruction {
    name: &'static str,
    effective_address: fn(&mut Storage),
    logic: Logic,
    advance: Advance,
}

impl Instruction {
    const fn fixed(
        name: &'static str,
        effective_address: fn(&mut Storage),
        logic: fn(&mut Hardware),
        advance: Advance,
        cycles: u32,
    ) -> Instruction {
        Instruction {
            name,
            effective_address,
            logic: Logic::Fixed(logic, cycles),
            advance,
        }
    }

    const fn computed(
        name: &'static str,
        effective_address: fn(&mut Storage),
        logic: fn(&mut Hardware) -> u32,
        advance: Advance,
    ) -> Instruction {
        Instruction {
            name,
            effective_address,
            logic: Logic::Computed(logic),
            advance,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolve the operand address into S. The instruction must already
    /// be unpacked into F and E.
    pub fn determine_effective_address(&self, storage: &mut Storage) {
        (self.effective_address)(storage);
    }

    /// Run the instruction and latch the next address per the advance
    /// policy. Returns the cycles consumed.
    pub fn perform_logic(&self, hardware: &mut Hardware) -> u32 {
        let cycles = match self.logic {
            Logic::Fixed(logic, cycles) => {
                logic(hardware);
                cycles
            }
            Logic::Computed(logic) => logic(hardware),
        };
        match self.advance {
            Advance::None => {}
            Advance::One => hardware.storage.next_after_one_word_instruction(),
            Advance::Two => hardware.storage.next_after_two_word_instruction(),
        }
        cycles
    }
}

use self::Advance::{None as NoAdvance, One, Two};

// Halts and the vacuous instruction.

pub static ERR: Instruction =
    Instruction::fixed("ERR", ea::no_address, ops::error, One, 1);
pub static HLT: Instruction =
    Instruction::fixed("HLT", ea::no_address, ops::halt, One, 1);
pub static NOP: Instruction =
    Instruction::fixed("NOP", ea::no_address, ops::do_nothing, One, 1);

// Storage-bank control. The *J forms jump to [A] in the newly selected
// relative bank.

pub static SRJ: Instruction = Instruction::fixed(
    "SRJ", ea::no_address, ops::set_rel_bank_from_e_and_jump, NoAdvance, 1);
pub static SIC: Instruction =
    Instruction::fixed("SIC", ea::no_address, ops::set_ind_bank_from_e, One, 1);
pub static IRJ: Instruction = Instruction::fixed(
    "IRJ", ea::no_address, ops::set_ind_rel_bank_from_e_and_jump, NoAdvance, 1);
pub static SDC: Instruction =
    Instruction::fixed("SDC", ea::no_address, ops::set_dir_bank_from_e, One, 1);
pub static DRJ: Instruction = Instruction::fixed(
    "DRJ", ea::no_address, ops::set_dir_rel_bank_from_e_and_jump, NoAdvance, 1);
pub static SID: Instruction = Instruction::fixed(
    "SID", ea::no_address, ops::set_ind_dir_bank_from_e, One, 1);
pub static ACJ: Instruction = Instruction::fixed(
    "ACJ", ea::no_address, ops::set_dir_ind_rel_bank_from_e_and_jump,
    NoAdvance, 1);
pub static SBU: Instruction =
    Instruction::fixed("SBU", ea::no_address, ops::set_buf_bank_from_e, One, 1);

// The op-code 01 register and buffer-control suite.

pub static BLS: Instruction =
    Instruction::computed("BLS", ea::no_address, ops::block_store, NoAdvance);
pub static PTA: Instruction =
    Instruction::fixed("PTA", ea::no_address, ops::p_to_a, One, 1);
pub static LS1: Instruction =
    Instruction::fixed("LS1", ea::no_address, ops::rotate_a_left_one, One, 1);
pub static LS2: Instruction =
    Instruction::fixed("LS2", ea::no_address, ops::rotate_a_left_two, One, 1);
pub static LS3: Instruction =
    Instruction::fixed("LS3", ea::no_address, ops::rotate_a_left_three, One, 1);
pub static LS6: Instruction =
    Instruction::fixed("LS6", ea::no_address, ops::rotate_a_left_six, One, 1);
pub static MUT: Instruction =
    Instruction::fixed("MUT", ea::no_address, ops::multiply_a_by_10, One, 1);
pub static MUH: Instruction =
    Instruction::fixed("MUH", ea::no_address, ops::multiply_a_by_100, One, 1);
pub static RS1: Instruction =
    Instruction::fixed("RS1", ea::no_address, ops::shift_a_right_one, One, 1);
pub static RS2: Instruction =
    Instruction::fixed("RS2", ea::no_address, ops::shift_a_right_two, One, 1);
pub static CBC: Instruction = Instruction::fixed(
    "CBC", ea::no_address, ops::clear_buffer_controls, One, 1);
pub static ATE: Instruction = Instruction::computed(
    "ATE", ea::no_address, ops::a_to_buffer_entrance, NoAdvance);
pub static ATX: Instruction =
    Instruction::computed("ATX", ea::no_address, ops::a_to_buffer_exit, NoAdvance);
pub static ETA: Instruction =
    Instruction::fixed("ETA", ea::no_address, ops::buffer_entrance_to_a, One, 1);
pub static CIL: Instruction =
    Instruction::fixed("CIL", ea::no_address, ops::clear_interrupt_lock, One, 1);
pub static CTA: Instruction =
    Instruction::fixed("CTA", ea::no_address, ops::bank_controls_to_a, One, 1);
pub static STP: Instruction =
    Instruction::fixed("STP", ea::no_address, ops::p_to_e_direct, One, 3);
pub static STE: Instruction = Instruction::fixed(
    "STE", ea::no_address, ops::buffer_entrance_to_direct_and_set_from_a,
    One, 3);

// No-address operations: E is the operand.

pub static LPN: Instruction =
    Instruction::fixed("LPN", ea::no_address, ops::and_e_with_a, One, 1);
pub static SCN: Instruction = Instruction::fixed(
    "SCN", ea::no_address, ops::selective_complement_no_address, One, 1);
pub static LDN: Instruction =
    Instruction::fixed("LDN", ea::no_address, ops::e_to_a, One, 1);
pub static LCN: Instruction =
    Instruction::fixed("LCN", ea::no_address, ops::e_complement_to_a, One, 1);
pub static ADN: Instruction =
    Instruction::fixed("ADN", ea::no_address, ops::add_e_to_a, One, 1);
pub static SBN: Instruction =
    Instruction::fixed("SBN", ea::no_address, ops::subtract_e_from_a, One, 1);

// Logical product.

pub static LPD: Instruction =
    Instruction::fixed("LPD", ea::direct, ops::and_direct_with_a, One, 2);
pub static LPI: Instruction =
    Instruction::fixed("LPI", ea::indirect, ops::and_indirect_with_a, One, 3);
pub static LPM: Instruction =
    Instruction::fixed("LPM", ea::memory, ops::and_indirect_with_a, Two, 3);
pub static LPC: Instruction =
    Instruction::fixed("LPC", ea::constant, ops::and_relative_with_a, Two, 2);
pub static LPF: Instruction = Instruction::fixed(
    "LPF", ea::relative_forward, ops::and_relative_with_a, One, 2);
pub static LPB: Instruction = Instruction::fixed(
    "LPB", ea::relative_backward, ops::and_relative_with_a, One, 2);
pub static LPS: Instruction =
    Instruction::fixed("LPS", ea::specific, ops::and_specific_with_a, One, 2);

// Selective complement.

pub static SCD: Instruction = Instruction::fixed(
    "SCD", ea::direct, ops::selective_complement_direct, One, 2);
pub static SCI: Instruction = Instruction::fixed(
    "SCI", ea::indirect, ops::selective_complement_indirect, One, 3);
pub static SCM: Instruction = Instruction::fixed(
    "SCM", ea::memory, ops::selective_complement_indirect, Two, 3);
pub static SCC: Instruction = Instruction::fixed(
    "SCC", ea::constant, ops::selective_complement_relative, Two, 2);
pub static SCF: Instruction = Instruction::fixed(
    "SCF", ea::relative_forward, ops::selective_complement_relative, One, 2);
pub static SCB: Instruction = Instruction::fixed(
    "SCB", ea::relative_backward, ops::selective_complement_relative, One, 2);
pub static SCS: Instruction = Instruction::fixed(
    "SCS", ea::specific, ops::selective_complement_specific, One, 2);

// Loads.

pub static LDD: Instruction =
    Instruction::fixed("LDD", ea::direct, ops::s_direct_to_a, One, 2);
pub static LDI: Instruction =
    Instruction::fixed("LDI", ea::indirect, ops::s_indirect_to_a, One, 3);
pub static LDM: Instruction =
    Instruction::fixed("LDM", ea::memory, ops::s_indirect_to_a, Two, 3);
pub static LDC: Instruction =
    Instruction::fixed("LDC", ea::constant, ops::s_relative_to_a, Two, 2);
pub static LDF: Instruction = Instruction::fixed(
    "LDF", ea::relative_forward, ops::s_relative_to_a, One, 2);
pub static LDB: Instruction = Instruction::fixed(
    "LDB", ea::relative_backward, ops::s_relative_to_a, One, 2);
pub static LDS: Instruction =
    Instruction::fixed("LDS", ea::specific, ops::specific_to_a, One, 2);

// Load complement.

pub static LCD: Instruction =
    Instruction::fixed("LCD", ea::direct, ops::s_direct_complement_to_a, One, 2);
pub static LCI: Instruction = Instruction::fixed(
    "LCI", ea::indirect, ops::s_indirect_complement_to_a, One, 3);
pub static LCM: Instruction = Instruction::fixed(
    "LCM", ea::memory, ops::s_indirect_complement_to_a, Two, 3);
pub static LCC: Instruction = Instruction::fixed(
    "LCC", ea::constant, ops::s_relative_complement_to_a, Two, 2);
pub static LCF: Instruction = Instruction::fixed(
    "LCF", ea::relative_forward, ops::s_relative_complement_to_a, One, 2);
pub static LCB: Instruction = Instruction::fixed(
    "LCB", ea::relative_backward, ops::s_relative_complement_to_a, One, 2);
pub static LCS: Instruction = Instruction::fixed(
    "LCS", ea::specific, ops::specific_complement_to_a, One, 2);

// Add.

pub static ADD: Instruction =
    Instruction::fixed("ADD", ea::direct, ops::add_direct_to_a, One, 2);
pub static ADI: Instruction =
    Instruction::fixed("ADI", ea::indirect, ops::add_indirect_to_a, One, 3);
pub static ADM: Instruction =
    Instruction::fixed("ADM", ea::memory, ops::add_indirect_to_a, Two, 3);
pub static ADC: Instruction =
    Instruction::fixed("ADC", ea::constant, ops::add_relative_to_a, Two, 2);
pub static ADF: Instruction = Instruction::fixed(
    "ADF", ea::relative_forward, ops::add_relative_to_a, One, 2);
pub static ADB: Instruction = Instruction::fixed(
    "ADB", ea::relative_backward, ops::add_relative_to_a, One, 2);
pub static ADS: Instruction =
    Instruction::fixed("ADS", ea::specific, ops::add_specific_to_a, One, 2);

// Subtract.

pub static SBD: Instruction =
    Instruction::fixed("SBD", ea::direct, ops::subtract_direct_from_a, One, 2);
pub static SBI: Instruction = Instruction::fixed(
    "SBI", ea::indirect, ops::subtract_indirect_from_a, One, 3);
pub static SBM: Instruction = Instruction::fixed(
    "SBM", ea::memory, ops::subtract_indirect_from_a, Two, 3);
pub static SBC: Instruction = Instruction::fixed(
    "SBC", ea::constant, ops::subtract_relative_from_a, Two, 2);
pub static SBF: Instruction = Instruction::fixed(
    "SBF", ea::relative_forward, ops::subtract_relative_from_a, One, 2);
pub static SBB: Instruction = Instruction::fixed(
    "SBB", ea::relative_backward, ops::subtract_relative_from_a, One, 2);
pub static SBS: Instruction = Instruction::fixed(
    "SBS", ea::specific, ops::subtract_specific_from_a, One, 2);

// Stores.

pub static STD: Instruction =
    Instruction::fixed("STD", ea::direct, ops::a_to_direct, One, 3);
pub static STI: Instruction =
    Instruction::fixed("STI", ea::indirect, ops::a_to_indirect, One, 4);
pub static STM: Instruction =
    Instruction::fixed("STM", ea::memory, ops::a_to_indirect, Two, 4);
pub static STC: Instruction =
    Instruction::fixed("STC", ea::constant, ops::a_to_relative, Two, 3);
pub static STF: Instruction =
    Instruction::fixed("STF", ea::relative_forward, ops::a_to_relative, One, 3);
pub static STB: Instruction =
    Instruction::fixed("STB", ea::relative_backward, ops::a_to_relative, One, 3);
pub static STS: Instruction =
    Instruction::fixed("STS", ea::specific, ops::a_to_specific, One, 3);

// Shift replace.

pub static SRD: Instruction =
    Instruction::fixed("SRD", ea::direct, ops::shift_replace_direct, One, 3);
pub static SRI: Instruction =
    Instruction::fixed("SRI", ea::indirect, ops::shift_replace_indirect, One, 4);
pub static SRM: Instruction =
    Instruction::fixed("SRM", ea::memory, ops::shift_replace_indirect, Two, 4);
pub static SRC: Instruction =
    Instruction::fixed("SRC", ea::constant, ops::shift_replace_relative, Two, 3);
pub static SRF: Instruction = Instruction::fixed(
    "SRF", ea::relative_forward, ops::shift_replace_relative, One, 3);
pub static SRB: Instruction = Instruction::fixed(
    "SRB", ea::relative_backward, ops::shift_replace_relative, One, 3);
pub static SRS: Instruction =
    Instruction::fixed("SRS", ea::specific, ops::shift_replace_specific, One, 3);

// Replace add.

pub static RAD: Instruction =
    Instruction::fixed("RAD", ea::direct, ops::replace_add_direct, One, 3);
pub static RAI: Instruction =
    Instruction::fixed("RAI", ea::indirect, ops::replace_add_indirect, One, 4);
pub static RAM: Instruction =
    Instruction::fixed("RAM", ea::memory, ops::replace_add_indirect, Two, 4);
pub static RAC: Instruction =
    Instruction::fixed("RAC", ea::constant, ops::replace_add_relative, Two, 3);
pub static RAF: Instruction = Instruction::fixed(
    "RAF", ea::relative_forward, ops::replace_add_relative, One, 3);
pub static RAB: Instruction = Instruction::fixed(
    "RAB", ea::relative_backward, ops::replace_add_relative, One, 3);
pub static RAS: Instruction =
    Instruction::fixed("RAS", ea::specific, ops::replace_add_specific, One, 3);

// Replace add one.

pub static AOD: Instruction =
    Instruction::fixed("AOD", ea::direct, ops::replace_add_one_direct, One, 3);
pub static AOI: Instruction = Instruction::fixed(
    "AOI", ea::indirect, ops::replace_add_one_indirect, One, 4);
pub static AOM: Instruction = Instruction::fixed(
    "AOM", ea::memory, ops::replace_add_one_indirect, Two, 4);
pub static AOC: Instruction = Instruction::fixed(
    "AOC", ea::constant, ops::replace_add_one_relative, Two, 3);
pub static AOF: Instruction = Instruction::fixed(
    "AOF", ea::relative_forward, ops::replace_add_one_relative, One, 3);
pub static AOB: Instruction = Instruction::fixed(
    "AOB", ea::relative_backward, ops::replace_add_one_relative, One, 3);
pub static AOS: Instruction = Instruction::fixed(
    "AOS", ea::specific, ops::replace_add_one_specific, One, 3);

// Conditional jumps on A.

pub static ZJF: Instruction = Instruction::computed(
    "ZJF", ea::relative_forward, ops::jump_if_a_zero, NoAdvance);
pub static NZF: Instruction = Instruction::computed(
    "NZF", ea::relative_forward, ops::jump_if_a_nonzero, NoAdvance);
pub static PJF: Instruction = Instruction::computed(
    "PJF", ea::relative_forward, ops::jump_if_a_positive, NoAdvance);
pub static NJF: Instruction = Instruction::computed(
    "NJF", ea::relative_forward, ops::jump_if_a_negative, NoAdvance);
pub static ZJB: Instruction = Instruction::computed(
    "ZJB", ea::relative_backward, ops::jump_if_a_zero, NoAdvance);
pub static NZB: Instruction = Instruction::computed(
    "NZB", ea::relative_backward, ops::jump_if_a_nonzero, NoAdvance);
pub static PJB: Instruction = Instruction::computed(
    "PJB", ea::relative_backward, ops::jump_if_a_positive, NoAdvance);
pub static NJB: Instruction = Instruction::computed(
    "NJB", ea::relative_backward, ops::jump_if_a_negative, NoAdvance);

// Unconditional jumps.

pub static JPI: Instruction = Instruction::fixed(
    "JPI", ea::via_direct_at_e, ops::jump_indirect, NoAdvance, 2);
pub static JPR: Instruction =
    Instruction::fixed("JPR", ea::memory_jump, ops::return_jump, NoAdvance, 3);
pub static JFI: Instruction = Instruction::fixed(
    "JFI", ea::forward_indirect, ops::jump_forward_indirect, NoAdvance, 2);

// Selective jump and stop.

pub static SLS: Instruction =
    Instruction::fixed("SLS", ea::constant, ops::selective_stop, One, 1);
pub static SLJ: Instruction =
    Instruction::computed("SLJ", ea::constant, ops::selective_jump, NoAdvance);
pub static SJS: Instruction = Instruction::computed(
    "SJS", ea::constant, ops::selective_stop_and_jump, NoAdvance);

// Input/output.

pub static EXC: Instruction =
    Instruction::fixed("EXC", ea::constant, ops::external_function, Two, 2);
pub static EXF: Instruction = Instruction::fixed(
    "EXF", ea::relative_forward, ops::external_function, One, 2);
pub static INA: Instruction =
    Instruction::computed("INA", ea::no_address, ops::input_to_a, One);
pub static INP: Instruction = Instruction::computed(
    "INP", ea::forward_indirect, ops::input_to_memory, Two);
pub static OTA: Instruction =
    Instruction::computed("OTA", ea::no_address, ops::output_from_a, One);
pub static OTN: Instruction =
    Instruction::computed("OTN", ea::no_address, ops::output_no_address, One);
pub static OUT: Instruction = Instruction::computed(
    "OUT", ea::forward_indirect, ops::output_from_memory, Two);
pub static IBI: Instruction = Instruction::computed(
    "IBI", ea::no_address, ops::initiate_buffer_input, NoAdvance);
pub static IBO: Instruction = Instruction::computed(
    "IBO", ea::no_address, ops::initiate_buffer_output, NoAdvance);
pub static HWI: Instruction = Instruction::fixed(
    "HWI", ea::via_direct_at_e, ops::half_write_indirect, One, 4);
