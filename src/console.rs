//! The console collaborator.
//!
//! The run loop drives the machine; the console watches and intervenes
//! through three hooks. A front-end may poll a keyboard on its own
//! thread, but its only path into the core is these methods, invoked by
//! the run loop between well-defined phases of an instruction.

use crate::input_output::InputOutput;
use crate::storage::Storage;

pub trait Console {
    /// Invoked just before each instruction fetch. Implementations
    /// refresh the jump and stop switch masks here, and may block a
    /// stopped machine until the operator resumes it.
    fn before_instruction_fetch(
        &mut self,
        storage: &mut Storage,
        input_output: &mut InputOutput,
    );

    /// Invoked after the instruction is unpacked and its effective
    /// address determined. Implementations may stop the machine here to
    /// display the latched address before anything executes.
    fn before_instruction_logic(
        &mut self,
        storage: &mut Storage,
        input_output: &mut InputOutput,
    );

    /// Invoked after the instruction executes, before P advances.
    /// Returning false exits the run loop; production consoles always
    /// return true and tests use the escape hatch.
    fn before_advance(
        &mut self,
        storage: &mut Storage,
        input_output: &mut InputOutput,
    ) -> bool;
}

/// Positions of a three-way console switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchState {
    Up,
    Center,
    Down,
}

impl SwitchState {
    pub fn name(self) -> &'static str {
        match self {
            SwitchState::Up => "up",
            SwitchState::Center => "center",
            SwitchState::Down => "down",
        }
    }
}

/// One jump or stop switch. A switch contributes its power-of-two bit
/// to the bank mask when it is up or down, and nothing when centered.
pub struct ConsoleSwitch {
    bit: u16,
    state: SwitchState,
}

impl ConsoleSwitch {
    /// Switches come up centered (off).
    pub fn new(bit_number: u16) -> ConsoleSwitch {
        ConsoleSwitch {
            bit: 1 << bit_number,
            state: SwitchState::Center,
        }
    }

    pub fn is_down(&self) -> bool {
        self.state == SwitchState::Down
    }

    pub fn on_off_bit(&self) -> u16 {
        if self.state == SwitchState::Center {
            0
        } else {
            self.bit
        }
    }

    pub fn release_if_down(&mut self) {
        if self.state == SwitchState::Down {
            self.state = SwitchState::Center;
        }
    }

    pub fn return_to_center(&mut self) {
        self.state = SwitchState::Center;
    }

    pub fn set_down(&mut self) {
        self.state = SwitchState::Down;
    }

    pub fn set_up(&mut self) {
        self.state = SwitchState::Up;
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }
}

/// A bank of three switches emulating the jump or stop switch set.
/// Momentary (down) positions release after use; up positions latch.
pub struct SwitchBank {
    switches: [ConsoleSwitch; 3],
}

impl SwitchBank {
    pub fn new() -> SwitchBank {
        SwitchBank {
            switches: [
                ConsoleSwitch::new(0),
                ConsoleSwitch::new(1),
                ConsoleSwitch::new(2),
            ],
        }
    }

    pub fn any_down(&self) -> bool {
        self.switches.iter().any(ConsoleSwitch::is_down)
    }

    pub fn down_mask(&self) -> u16 {
        self.switches
            .iter()
            .filter(|switch| switch.is_down())
            .map(ConsoleSwitch::on_off_bit)
            .sum()
    }

    /// The 3-bit mask of switches that are not centered.
    pub fn mask(&self) -> u16 {
        self.switches.iter().map(ConsoleSwitch::on_off_bit).sum()
    }

    pub fn release_down_switches(&mut self) {
        for switch in &mut self.switches {
            switch.release_if_down();
        }
    }

    pub fn return_to_center(&mut self, index: usize) {
        self.switches[index].return_to_center();
    }

    pub fn set_down(&mut self, index: usize) {
        self.switches[index].set_down();
    }

    pub fn set_up(&mut self, index: usize) {
        self.switches[index].set_up();
    }

    pub fn state(&self, index: usize) -> SwitchState {
        self.switches[index].state()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn switches_start_centered() {
        let bank = SwitchBank::new();
        assert_eq!(bank.mask(), 0);
        assert_eq!(bank.down_mask(), 0);
        assert!(!bank.any_down());
    }

    #[test]
    fn up_and_down_both_set_the_mask_bit() {
        let mut bank = SwitchBank::new();
        bank.set_up(0);
        bank.set_down(2);
        assert_eq!(bank.mask(), 0o5);
        assert_eq!(bank.down_mask(), 0o4);
        assert!(bank.any_down());
    }

    #[test]
    fn releasing_clears_only_down_switches() {
        let mut bank = SwitchBank::new();
        bank.set_up(0);
        bank.set_down(1);
        bank.release_down_switches();
        assert_eq!(bank.mask(), 0o1);
        assert_eq!(bank.state(1), SwitchState::Center);
        assert_eq!(bank.state(0), SwitchState::Up);
    }

    #[test]
    fn centering_clears_any_position() {
        let mut bank = SwitchBank::new();
        bank.set_up(1);
        bank.return_to_center(1);
        assert_eq!(bank.mask(), 0);
    }
}
