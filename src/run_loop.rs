//! The run loop.
//!
//! One tick: fetch and unpack the instruction at P, resolve its
//! effective address, gate through the console, execute, give the
//! buffer pump the consumed cycles, settle the interrupt lock, and
//! advance P from the next-instruction latch. Interrupts are taken only
//! at instruction boundaries, before the fetch, and only while the
//! interrupt lock is free.
//!
//! A halt, error halt, or hung machine leaves P pointing at the
//! instruction that stopped it, so the console displays the stopping
//! address; resuming a halted machine therefore re-runs the halting
//! instruction.

use crate::console::Console;
use crate::decoder;
use crate::hardware::Hardware;
use crate::input_output::InputOutput;
use crate::storage::{InterruptLock, Storage};

pub struct RunLoop<C: Console> {
    console: C,
    hardware: Hardware,
}

impl<C: Console> RunLoop<C> {
    pub fn new(
        console: C,
        storage: Storage,
        input_output: InputOutput,
    ) -> RunLoop<C> {
        RunLoop {
            console,
            hardware: Hardware::new(input_output, storage),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.hardware.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.hardware.storage
    }

    pub fn input_output(&self) -> &InputOutput {
        &self.hardware.input_output
    }

    pub fn input_output_mut(&mut self) -> &mut InputOutput {
        &mut self.hardware.input_output
    }

    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Run until the machine stops. The fetch hook runs first on every
    /// iteration; it refreshes the switch masks and may restart a
    /// stopped machine, and the loop exits when the machine is still
    /// stopped afterwards.
    pub fn run(&mut self) {
        loop {
            self.console.before_instruction_fetch(
                &mut self.hardware.storage,
                &mut self.hardware.input_output,
            );
            if !self.hardware.storage.run_stop_status {
                break;
            }
            if self.service_pending_interrupt() {
                continue;
            }
            if !self.execute_one_instruction() {
                break;
            }
        }
    }

    /// Execute a single instruction (honoring a pending interrupt
    /// first). Returns false when the run loop should stop.
    pub fn single_step(&mut self) -> bool {
        self.console.before_instruction_fetch(
            &mut self.hardware.storage,
            &mut self.hardware.input_output,
        );
        self.service_pending_interrupt();
        self.execute_one_instruction()
    }

    /// Accept the highest-priority pending interrupt, if the lock
    /// allows one. P moves to the handler; the next loop iteration
    /// fetches its first instruction.
    fn service_pending_interrupt(&mut self) -> bool {
        let storage = &mut self.hardware.storage;
        if storage.interrupt_lock != InterruptLock::Free {
            return false;
        }
        match storage.pending_interrupt() {
            Some(interrupt) => {
                storage.service_interrupt(interrupt);
                true
            }
            None => false,
        }
    }

    fn execute_one_instruction(&mut self) -> bool {
        let was_unlock_pending = self.hardware.storage.interrupt_lock
            == InterruptLock::UnlockPending;
        self.hardware.storage.normal_io_idle();
        self.hardware.storage.unpack_instruction();
        let instruction = decoder::decode(
            self.hardware.storage.f_instruction,
            self.hardware.storage.f_e,
        );
        instruction.determine_effective_address(&mut self.hardware.storage);
        self.console.before_instruction_logic(
            &mut self.hardware.storage,
            &mut self.hardware.input_output,
        );
        if !self.hardware.storage.run_stop_status {
            // Stopped with the address latched and nothing executed.
            // The fetch hook decides whether to resume.
            return true;
        }
        let cycles = instruction.perform_logic(&mut self.hardware);
        {
            let Hardware {
                storage,
                input_output,
            } = &mut self.hardware;
            input_output.pump_buffer(storage, cycles);
            // The unlock CIL requested lands one full instruction later,
            // so the instruction after CIL still ran locked.
            if was_unlock_pending {
                storage.interrupt_lock = InterruptLock::Free;
            }
        }
        let keep_going = self.console.before_advance(
            &mut self.hardware.storage,
            &mut self.hardware.input_output,
        );
        let storage = &mut self.hardware.storage;
        if storage.run_stop_status && !storage.machine_hung {
            storage.advance_to_next_instruction();
        }
        keep_going && storage.run_stop_status && !storage.machine_hung
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::asm::assemble_string;
    use crate::device::Device;
    use crate::devices::{BiTape, NullDevice, PaperTapePunch, PaperTapeReader};
    use crate::storage::InterruptLock;

    /// The unit-test console: no switches, and the run loop exits as
    /// soon as the machine halts.
    struct TestConsole;

    impl Console for TestConsole {
        fn before_instruction_fetch(
            &mut self,
            _storage: &mut Storage,
            _input_output: &mut InputOutput,
        ) {
        }

        fn before_instruction_logic(
            &mut self,
            _storage: &mut Storage,
            _input_output: &mut InputOutput,
        ) {
        }

        fn before_advance(
            &mut self,
            storage: &mut Storage,
            _input_output: &mut InputOutput,
        ) -> bool {
            storage.run_stop_status
        }
    }

    const BI_TAPE_INPUT_DATA: [u16; 10] = [
        0o7777, 0o0001, 0o0200, 0o0210, 0o1111,
        0o4001, 0o4011, 0o4111, 0o4112, 0o4122,
    ];

    fn run_loop_with(
        input_output: InputOutput,
        source: &str,
    ) -> RunLoop<TestConsole> {
        let mut storage = Storage::new();
        assemble_string(source, &mut storage).expect("assembly failed");
        storage.set_buffer_storage_bank(0o0);
        storage.set_direct_storage_bank(0o2);
        storage.set_indirect_storage_bank(0o1);
        storage.set_relative_storage_bank(0o3);
        storage.p_register = 0o100;
        storage.run();
        RunLoop::new(TestConsole, storage, input_output)
    }

    fn run_loop(source: &str) -> RunLoop<TestConsole> {
        run_loop_with(InputOutput::new(vec![]), source)
    }

    fn run_program(source: &str) -> RunLoop<TestConsole> {
        let mut run_loop = run_loop(source);
        run_loop.run();
        run_loop
    }

    #[test]
    fn halt_leaves_p_at_the_halt_instruction() {
        let run_loop = run_program(
            "
          BNK 3
          ORG 100
          HLT
          END
",
        );
        assert!(!run_loop.storage().err_status);
        assert!(!run_loop.storage().run_stop_status);
        assert_eq!(run_loop.storage().p_register, 0o100);
    }

    #[test]
    fn error_halt_sets_the_error_status() {
        let run_loop = run_program(
            "
          BNK 3
          ORG 100
          ERR
          END
",
        );
        assert!(run_loop.storage().err_status);
        assert!(!run_loop.storage().run_stop_status);
    }

    #[test]
    fn ldc_then_halt() {
        let run_loop = run_program(
            "
          BNK 3
          ORG 100
          LDC 4321
          HLT
          END
",
        );
        assert_eq!(run_loop.storage().a_register, 0o4321);
        assert_eq!(run_loop.storage().p_register, 0o102);
        assert!(!run_loop.storage().err_status);
        assert!(!run_loop.storage().run_stop_status);
    }

    #[test]
    fn ldc_shift_halt() {
        let run_loop = run_program(
            "
          BNK 3
          ORG 100
          LDC 4321
          LS3
          HLT
          END
",
        );
        assert_eq!(run_loop.storage().a_register, 0o3214);
        assert_eq!(run_loop.storage().p_register, 0o103);
    }

    #[test]
    fn store_forward() {
        let run_loop = run_program(
            "
          BNK 3
          ORG 100
          LDC 1234
          STF 2
          HLT
          OCT 7777
          END
",
        );
        assert_eq!(run_loop.storage().read_absolute(3, 0o104), 0o1234);
        assert_eq!(run_loop.storage().a_register, 0o1234);
        assert_eq!(run_loop.storage().p_register, 0o103);
    }

    #[test]
    fn store_constant_modifies_its_own_g_word() {
        let run_loop = run_program(
            "
          BNK 3
          ORG 100
          LDC 1234
          STC 7777
          END
",
        );
        assert_eq!(run_loop.storage().read_absolute(3, 0o103), 0o1234);
    }

    #[test]
    fn selective_jump_taken() {
        let mut run_loop = run_loop(
            "
          BNK 3
          ORG 100
          SLJ 2 200
          HLT
          ORG 200
          HLT
          END
",
        );
        run_loop.storage_mut().set_jump_switch_mask(0o6);
        run_loop.run();
        assert_eq!(run_loop.storage().p_register, 0o200);
    }

    #[test]
    fn selective_jump_not_taken() {
        let mut run_loop = run_loop(
            "
          BNK 3
          ORG 100
          SLJ 2 200
          HLT
          ORG 200
          HLT
          END
",
        );
        run_loop.storage_mut().set_jump_switch_mask(0o5);
        run_loop.run();
        assert_eq!(run_loop.storage().p_register, 0o102);
    }

    #[test]
    fn selective_stop_leaves_the_next_address_latched() {
        let mut run_loop = run_loop(
            "
          BNK 3
          ORG 100
          SJS 12 200
          HLT
          END
",
        );
        // E = 12: jump switch 1 selects the branch, stop switch 2 the
        // halt. Resuming would continue at the latched address.
        run_loop.storage_mut().set_jump_switch_mask(0o3);
        run_loop.storage_mut().set_stop_switch_mask(0o6);
        run_loop.run();
        assert!(!run_loop.storage().run_stop_status);
        assert_eq!(run_loop.storage().p_register, 0o100);
        assert_eq!(run_loop.storage().next_address(), 0o200);
    }

    #[test]
    fn call_and_return() {
        // JPR stores the return address at the subroutine head; with
        // the direct bank aimed at the program bank, JPI returns
        // through it.
        let run_loop = run_program(
            "
          BNK 3
          ORG 100
          SDC 3
          JPR 40
          HLT
          ORG 40
          OCT 0
          LDN 17
          JPI 40
          END
",
        );
        assert_eq!(run_loop.storage().read_absolute(3, 0o40), 0o103);
        assert_eq!(run_loop.storage().p_register, 0o103);
        assert_eq!(run_loop.storage().a_register, 0o17);
    }

    #[test]
    fn counting_loop_terminates() {
        // Count A down from 10 octal; NZB repeats the SBN while A is
        // anything but +0.
        let run_loop = run_program(
            "
          BNK 3
          ORG 100
          LDN 10
          SBN 1
          NZB 1
          HLT
          END
",
        );
        assert_eq!(run_loop.storage().a_register, 0);
        assert_eq!(run_loop.storage().p_register, 0o103);
    }

    #[test]
    fn clear_interrupt_lock_frees_one_instruction_late() {
        let mut run_loop = run_loop(
            "
          BNK 3
          ORG 100
          CIL
          NOP
          HLT
          END
",
        );
        run_loop.storage_mut().interrupt_lock = InterruptLock::Locked;
        assert!(run_loop.single_step());
        assert_eq!(
            run_loop.storage().interrupt_lock,
            InterruptLock::UnlockPending
        );
        assert!(run_loop.single_step());
        assert_eq!(run_loop.storage().interrupt_lock, InterruptLock::Free);
        assert!(!run_loop.single_step());
        assert_eq!(run_loop.storage().interrupt_lock, InterruptLock::Free);
        assert!(!run_loop.storage().run_stop_status);
    }

    #[test]
    fn interrupt_entry_and_return() {
        // The handler at the trap address + 1 loads A, unlocks, and
        // jumps back through the saved P in the direct bank.
        let mut run_loop = run_loop(
            "
          BNK 3
          ORG 11
          LDN 1
          CIL
          JPI 10
          ORG 100
          NOP
          HLT
          END
",
        );
        assert!(run_loop.single_step());
        assert_eq!(run_loop.storage().p_register, 0o101);
        run_loop.storage_mut().request_interrupt(0o10);
        run_loop.run();
        assert_eq!(run_loop.storage().a_register, 0o01);
        assert_eq!(run_loop.storage().interrupt_lock, InterruptLock::Free);
        assert_eq!(run_loop.storage().p_register, 0o101);
        // The interrupted address was saved at the trap location in the
        // direct bank.
        assert_eq!(run_loop.storage().read_absolute(2, 0o10), 0o101);
    }

    #[test]
    fn locked_machine_holds_interrupts_pending() {
        let mut run_loop = run_loop(
            "
          BNK 3
          ORG 100
          NOP
          NOP
          HLT
          END
",
        );
        run_loop.storage_mut().interrupt_lock = InterruptLock::Locked;
        run_loop.storage_mut().request_interrupt(0o20);
        run_loop.run();
        // Never accepted: the machine halted with the request pending.
        assert_eq!(run_loop.storage().pending_interrupt(), Some(0o20));
        assert_eq!(run_loop.storage().p_register, 0o102);
    }

    fn online_tape(input: Vec<u16>) -> BiTape {
        let mut tape = BiTape::new(input);
        tape.set_online_status(true);
        tape
    }

    #[test]
    fn input_to_a_from_the_tape() {
        let tape = online_tape(BI_TAPE_INPUT_DATA.to_vec());
        let mut run_loop = run_loop_with(
            InputOutput::new(vec![Box::new(tape)]),
            "
          BNK 3
          ORG 100
          EXC 3700
          INA
          HLT
          END
",
        );
        run_loop.run();
        assert_eq!(run_loop.storage().a_register, 0o7777);
        assert_eq!(run_loop.storage().p_register, 0o103);
    }

    #[test]
    fn input_to_memory_from_the_tape() {
        let tape = online_tape(BI_TAPE_INPUT_DATA.to_vec());
        let mut run_loop = run_loop_with(
            InputOutput::new(vec![Box::new(tape)]),
            "
          BNK 3
          ORG 100
          EXC 3700
          INP 3 312
          HLT
          OCT 300
          END
",
        );
        run_loop.run();
        assert_eq!(run_loop.storage().p_register, 0o104);
        for (offset, value) in BI_TAPE_INPUT_DATA.iter().enumerate() {
            assert_eq!(
                run_loop.storage().read_absolute(1, 0o300 + offset as u16),
                *value
            );
        }
    }

    #[test]
    fn output_from_memory_to_the_tape() {
        let tape = online_tape(vec![]);
        let output = tape.output_handle();
        let mut run_loop = run_loop_with(
            InputOutput::new(vec![Box::new(tape)]),
            "
          REM the pointer word after HLT holds the FWA; G is LWA + 1
          BNK 1
          ORG 300
          OCT 10
          OCT 06
          OCT 04
          BNK 3
          ORG 100
          EXC 3700
          OUT 3 303
          HLT
          OCT 300
          END
",
        );
        run_loop.run();
        assert_eq!(*output.borrow(), vec![0o10, 0o06, 0o04]);
        assert!(!run_loop.storage().machine_hung);
    }

    #[test]
    fn output_without_a_selected_device_hangs() {
        let run_loop = run_program(
            "
          BNK 3
          ORG 100
          LDN 34
          OTA
          HLT
          END
",
        );
        assert!(run_loop.storage().machine_hung);
        // P never advanced past the hung instruction.
        assert_eq!(run_loop.storage().p_register, 0o101);
    }

    #[test]
    fn buffered_input_runs_behind_the_program() {
        let tape = online_tape(BI_TAPE_INPUT_DATA.to_vec());
        let mut run_loop = run_loop_with(
            InputOutput::new(vec![Box::new(tape)]),
            "
          REM set BER and BXR, select the tape, start buffering, then
          REM spin down a counter while the pump fills the buffer bank
          BNK 3
          ORG 100
          LDC 200
          ATE 100
          LDC 212
          ATX 100
          EXC 3700
          IBI 100
          LDN 77
          SBN 1
          NZB 1
          HLT
          END
",
        );
        run_loop.run();
        assert_eq!(run_loop.storage().p_register, 0o117);
        assert!(!run_loop.storage().buffering);
        assert_eq!(run_loop.storage().read_absolute(0, 0o177), 0);
        assert_eq!(run_loop.storage().read_absolute(0, 0o212), 0);
        for (offset, value) in BI_TAPE_INPUT_DATA.iter().enumerate() {
            assert_eq!(
                run_loop.storage().read_absolute(0, 0o200 + offset as u16),
                *value
            );
        }
        assert!(run_loop.input_output().device_on_buffer_channel().is_none());
        assert!(run_loop.input_output().device_on_normal_channel().is_none());
    }

    #[test]
    fn buffered_output_runs_behind_the_program() {
        let tape = online_tape(vec![]);
        let output = tape.output_handle();
        let mut run_loop = run_loop_with(
            InputOutput::new(vec![Box::new(tape)]),
            "
          BNK 0
          ORG 200
          OCT 11
          OCT 22
          OCT 33
          BNK 3
          ORG 100
          LDC 200
          ATE 100
          LDC 203
          ATX 100
          EXC 3700
          IBO 100
          LDN 77
          SBN 1
          NZB 1
          HLT
          END
",
        );
        run_loop.run();
        assert_eq!(*output.borrow(), vec![0o11, 0o22, 0o33]);
        assert!(!run_loop.storage().buffering);
    }

    #[test]
    fn second_initiation_branches_while_the_channel_is_busy() {
        let mut run_loop = run_loop_with(
            InputOutput::new(vec![Box::new(NullDevice::new())]),
            "
          REM buffer a long null transfer, then try to start another
          BNK 3
          ORG 100
          LDC 0
          ATE 100
          LDC 7000
          ATX 100
          EXC 7777
          IBI 100
          IBI 300
          HLT
          ORG 300
          HLT
          END
",
        );
        run_loop.run();
        assert_eq!(run_loop.storage().p_register, 0o300);
        assert_eq!(
            run_loop
                .input_output()
                .device_on_buffer_channel()
                .map(|device| device.name()),
            Some("Null Device")
        );
    }

    #[test]
    fn clear_buffer_controls_stops_a_transfer() {
        let mut run_loop = run_loop_with(
            InputOutput::new(vec![Box::new(NullDevice::new())]),
            "
          BNK 3
          ORG 100
          LDC 0
          ATE 100
          LDC 7000
          ATX 100
          EXC 7777
          IBI 100
          CBC
          HLT
          END
",
        );
        run_loop.run();
        assert!(!run_loop.storage().buffering);
        assert!(run_loop.input_output().device_on_buffer_channel().is_none());
    }

    #[test]
    fn paper_tape_round_trip() {
        // Punch three characters, then read the same file back: the
        // low 8 bits of each word survive the trip.
        let mut path = std::env::temp_dir();
        path.push(format!(
            "run-loop-paper-tape-{}.ptape",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut punch = PaperTapePunch::new();
        assert!(punch.open(path.to_str().unwrap()));
        let mut run_loop = run_loop_with(
            InputOutput::new(vec![Box::new(punch)]),
            "
          BNK 3
          ORG 100
          EXC 4104
          LDC 1200
          OTA
          LDN 37
          OTA
          LDC 0377
          OTA
          HLT
          END
",
        );
        run_loop.run();
        run_loop
            .input_output_mut()
            .device_with_key("pt_pun")
            .unwrap()
            .close();
        let punched = std::fs::read_to_string(&path).unwrap();
        assert_eq!(punched, "200\n037\n377\n");

        let mut reader = PaperTapeReader::new();
        assert!(reader.open(path.to_str().unwrap()));
        let mut run_loop = run_loop_with(
            InputOutput::new(vec![Box::new(reader)]),
            "
          BNK 3
          ORG 100
          EXC 4102
          INA
          HLT
          END
",
        );
        run_loop.run();
        assert_eq!(run_loop.storage().a_register, 0o200);
        std::fs::remove_file(path).unwrap();
    }
}
