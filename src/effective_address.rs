//! Addressing-mode support.
//!
//! Each resolver calculates a decoded instruction's effective address and
//! places it in the S register, together with the storage-cycle tag shown
//! on the console. Keeping the calculation here serves two purposes: a
//! halted machine displays the address it was about to reference, and the
//! instruction logic is relieved of address bookkeeping.
//!
//! The instruction must be unpacked into F and E before any resolver runs.

use crate::storage::Storage;

/// No Address (N): E itself is the operand. Instructions run from the
/// relative bank, so the access is tagged relative.
pub fn no_address(storage: &mut Storage) {
    storage.p_to_s();
    storage.mode_relative();
}

/// Constant (C): G, the second word of a two-word instruction, is the
/// operand.
pub fn constant(storage: &mut Storage) {
    storage.g_address_to_s();
    storage.mode_relative();
}

/// Direct (D): E selects one of the first 64 addresses in the direct
/// storage bank.
pub fn direct(storage: &mut Storage) {
    storage.e_to_s();
    storage.mode_direct();
}

/// Indirect (I): E selects one of the first 64 addresses in the indirect
/// storage bank.
pub fn indirect(storage: &mut Storage) {
    storage.e_to_s();
    storage.mode_indirect();
}

/// Memory (M), operand flavor: G holds the operand address, which is
/// referenced in the indirect storage bank.
pub fn memory(storage: &mut Storage) {
    storage.g_to_s();
    storage.mode_indirect();
}

/// Memory (M), jump flavor: G holds a jump address in the relative bank.
pub fn memory_jump(storage: &mut Storage) {
    storage.g_to_s();
    storage.mode_relative();
}

/// Relative Forward (F): E is added to P.
pub fn relative_forward(storage: &mut Storage) {
    storage.relative_forward_to_s();
    storage.mode_relative();
}

/// Relative Backward (B): E is subtracted from P.
pub fn relative_backward(storage: &mut Storage) {
    storage.relative_backward_to_s();
    storage.mode_relative();
}

/// Forward Indirect (FI): the word at P + E in the relative bank supplies
/// the operand or jump address.
pub fn forward_indirect(storage: &mut Storage) {
    storage.forward_indirect_to_s();
    storage.mode_relative();
}

/// Specific: the operand resides in bank 0 at address 7777.
pub fn specific(storage: &mut Storage) {
    storage.specific_to_s();
    storage.mode_specific();
}

/// The word at E in the direct bank supplies the effective address. The
/// storage-cycle tag is left to the caller.
pub fn via_direct_at_e(storage: &mut Storage) {
    storage.e_direct_to_s();
}

/// Leaves S and the storage-cycle tag unchanged.
pub fn vacuous(_storage: &mut Storage) {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::StorageCycle;

    fn storage() -> Storage {
        let mut storage = Storage::new();
        storage.direct_storage_bank = 2;
        storage.indirect_storage_bank = 3;
        storage.relative_storage_bank = 4;
        storage.p_register = 0o1232;
        storage.f_e = 0o21;
        storage
    }

    #[test]
    fn no_address_takes_p() {
        let mut storage = storage();
        no_address(&mut storage);
        assert_eq!(storage.s_register, 0o1232);
        assert_eq!(storage.storage_cycle, StorageCycle::Relative);
    }

    #[test]
    fn constant_takes_the_g_word_address() {
        let mut storage = storage();
        constant(&mut storage);
        assert_eq!(storage.s_register, 0o1233);
        assert_eq!(storage.storage_cycle, StorageCycle::Relative);
    }

    #[test]
    fn direct_and_indirect_take_e() {
        let mut storage = storage();
        direct(&mut storage);
        assert_eq!(storage.s_register, 0o21);
        assert_eq!(storage.storage_cycle, StorageCycle::Direct);
        indirect(&mut storage);
        assert_eq!(storage.s_register, 0o21);
        assert_eq!(storage.storage_cycle, StorageCycle::Indirect);
    }

    #[test]
    fn memory_takes_the_g_contents() {
        let mut storage = storage();
        storage.write_relative_bank(0o1233, 0o4321);
        memory(&mut storage);
        assert_eq!(storage.s_register, 0o4321);
        assert_eq!(storage.storage_cycle, StorageCycle::Indirect);
        memory_jump(&mut storage);
        assert_eq!(storage.s_register, 0o4321);
        assert_eq!(storage.storage_cycle, StorageCycle::Relative);
    }

    #[test]
    fn relative_offsets() {
        let mut storage = storage();
        relative_forward(&mut storage);
        assert_eq!(storage.s_register, 0o1253);
        relative_backward(&mut storage);
        assert_eq!(storage.s_register, 0o1211);
        assert_eq!(storage.storage_cycle, StorageCycle::Relative);
    }

    #[test]
    fn forward_indirect_reads_the_pointer() {
        let mut storage = storage();
        storage.write_relative_bank(0o1253, 0o0400);
        forward_indirect(&mut storage);
        assert_eq!(storage.s_register, 0o0400);
        assert_eq!(storage.storage_cycle, StorageCycle::Relative);
    }

    #[test]
    fn specific_is_7777_in_bank_0() {
        let mut storage = storage();
        specific(&mut storage);
        assert_eq!(storage.s_register, 0o7777);
        assert_eq!(storage.storage_cycle, StorageCycle::Specific);
    }

    #[test]
    fn via_direct_reads_the_direct_bank() {
        let mut storage = storage();
        storage.write_direct_bank(0o21, 0o3200);
        via_direct_at_e(&mut storage);
        assert_eq!(storage.s_register, 0o3200);
    }

    #[test]
    fn vacuous_changes_nothing() {
        let mut storage = storage();
        storage.s_register = 0o666;
        vacuous(&mut storage);
        assert_eq!(storage.s_register, 0o666);
    }
}
