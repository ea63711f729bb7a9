//! The paper-tape boot loader.
//!
//! Loads a boot image into memory. To use:
//!
//! 1. Open a boot image on the paper tape reader.
//! 2. Master clear, which zeros A, P, and the relative bank control,
//!    halts any buffering, and disconnects all selected devices.
//! 3. Enter the address that should receive the first boot word into P.
//! 4. Run the load.
//!
//! A boot tape carries a leader of frames lacking the 7th-level punch
//! (values 000 through 077), then word pairs: a frame with the punch
//! (100 through 177) contributing the high six bits, then one without
//! contributing the low six. The load begins at the first 7th-level
//! punch and ends at the first frame that should have carried one but
//! does not. When the load succeeds, A holds the running check sum and
//! P the LWA (not LWA + 1) of the stored data.
//!
//! See page 3-41 of the 160-A Computer Reference Manual, March 1965
//! edition, for the tape format.

use crate::device::Device;
use crate::storage::Storage;

/// Externally visible loader condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// Boot load not started.
    Idle,
    /// Boot image being loaded.
    Loading,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Created,
    FeedingLeader,
    ReadMostSignificant,
    ReadLeastSignificant,
    BootSucceeded,
    BootFailed,
}

#[derive(Clone, Copy)]
enum Event {
    LeastSignificantRead,
    MostSignificantRead,
    InvalidValueRead,
}

/// The transition table enforces the tape format: pairs must follow
/// each other, the leader may be entered anywhere, and a frame that
/// should carry the 7th-level punch but does not ends the load.
fn transition(state: State, event: Event) -> State {
    match (state, event) {
        (State::Created | State::FeedingLeader, Event::LeastSignificantRead) => {
            State::FeedingLeader
        }
        (State::Created | State::FeedingLeader, Event::MostSignificantRead) => {
            State::ReadMostSignificant
        }
        (State::ReadMostSignificant, Event::LeastSignificantRead) => {
            State::ReadLeastSignificant
        }
        (State::ReadLeastSignificant, Event::LeastSignificantRead) => {
            State::BootSucceeded
        }
        (State::ReadLeastSignificant, Event::MostSignificantRead) => {
            State::ReadMostSignificant
        }
        _ => State::BootFailed,
    }
}

pub struct BootLoader {
    state: State,
    status: Status,
    address_pre_increment: u16,
}

impl BootLoader {
    pub fn new() -> BootLoader {
        BootLoader {
            state: State::Created,
            status: Status::Idle,
            address_pre_increment: 0,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Read the boot image from `boot_device` into the relative bank.
    /// To emulate the hardware faithfully the device should be a paper
    /// tape reader; this is not checked. A failed load leaves memory in
    /// its partial state.
    pub fn load(
        &mut self,
        boot_device: &mut dyn Device,
        storage: &mut Storage,
    ) -> Status {
        let mut memory_value: u16 = 0;
        self.status = Status::Loading;

        loop {
            let (input_value, event) =
                Self::read_and_classify_frame(boot_device);
            let new_state = transition(self.state, event);

            match new_state {
                State::FeedingLeader => {}
                State::ReadMostSignificant => {
                    memory_value = (input_value & 0o77) << 6;
                }
                State::ReadLeastSignificant => {
                    memory_value |= input_value;
                    storage.p_register = (storage.p_register
                        + self.address_pre_increment)
                        & 0o7777;
                    storage
                        .write_relative_bank(storage.p_register, memory_value);
                    // The check sum runs modulo 7777, per the original
                    // implementation.
                    storage.a_register =
                        (storage.a_register + memory_value) % 0o7777;
                    memory_value = 0;
                    self.address_pre_increment = 1;
                }
                State::BootSucceeded => {
                    self.status = Status::Succeeded;
                    break;
                }
                State::BootFailed => {
                    self.status = Status::Failed;
                    break;
                }
                State::Created => unreachable!("no transition re-enters Created"),
            }
            self.state = new_state;
        }

        self.status
    }

    /// Read and classify one frame: the low six bits of a word (no
    /// 7th-level punch), the high six bits (7th-level punch), or an
    /// erroneous value outside [0, 177].
    fn read_and_classify_frame(boot_device: &mut dyn Device) -> (u16, Event) {
        match boot_device.read() {
            Some(value @ 0o000..=0o077) => (value, Event::LeastSignificantRead),
            Some(value @ 0o100..=0o177) => (value, Event::MostSignificantRead),
            Some(value) => (value, Event::InvalidValueRead),
            None => (0, Event::InvalidValueRead),
        }
    }
}
