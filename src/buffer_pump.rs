//! Buffered I/O pumps.
//!
//! A pump moves one word at a time between a device and the buffer
//! storage bank, honoring per-device latency in machine cycles. Input
//! pumps fill memory from their device; output pumps drain memory into
//! it. Pumps are single-use: one is built when a buffered transfer
//! starts and discarded when the transfer completes.
//!
//! Pumps never hold storage; the run loop hands storage (and the bound
//! device) to `pump` on every call, so no reference cycle can form
//! between the pump and the machine it serves.

use crate::device::Device;
use crate::storage::Storage;

/// Outcome of one pump call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpStatus {
    /// The device is not ready to consume or provide data.
    NoDataMoved,
    /// The device consumed or provided one word.
    OneWordMoved,
    /// The last required word has moved; the transfer is done.
    Completed,
    /// The device failed mid-transfer.
    Failure,
}

pub trait BufferPump {
    /// Advance the pump by `elapsed_cycles`. When the accumulated delay
    /// expires, move one word between `device` and the buffer bank.
    fn pump(
        &mut self,
        storage: &mut Storage,
        device: Option<&mut dyn Device>,
        elapsed_cycles: u32,
    ) -> PumpStatus;

    /// Cycles until the pump next attempts a transfer.
    fn cycles_remaining(&self) -> i64;
}

/// Pumps words from a device into the buffer storage bank through BDR,
/// advancing BER until it reaches BXR.
pub struct BufferedInputPump {
    cycles_remaining: i64,
}

impl BufferedInputPump {
    pub fn new(device: &dyn Device) -> BufferedInputPump {
        BufferedInputPump {
            cycles_remaining: i64::from(device.initial_read_delay()),
        }
    }
}

impl BufferPump for BufferedInputPump {
    fn pump(
        &mut self,
        storage: &mut Storage,
        device: Option<&mut dyn Device>,
        elapsed_cycles: u32,
    ) -> PumpStatus {
        self.cycles_remaining -= i64::from(elapsed_cycles);
        if self.cycles_remaining > 0 {
            return PumpStatus::NoDataMoved;
        }
        let device = match device {
            Some(device) => device,
            None => return PumpStatus::Failure,
        };
        self.cycles_remaining = i64::from(device.read_delay());
        match device.read() {
            Some(datum) => {
                storage.buffer_data_register = datum;
                if storage.buffer_data_to_memory() {
                    PumpStatus::OneWordMoved
                } else {
                    PumpStatus::Completed
                }
            }
            None => PumpStatus::Failure,
        }
    }

    fn cycles_remaining(&self) -> i64 {
        self.cycles_remaining
    }
}

/// Pumps words from the buffer storage bank into a device through BDR,
/// advancing BER until it reaches BXR.
pub struct BufferedOutputPump {
    cycles_remaining: i64,
}

impl BufferedOutputPump {
    pub fn new(device: &dyn Device) -> BufferedOutputPump {
        BufferedOutputPump {
            cycles_remaining: i64::from(device.initial_write_delay()),
        }
    }
}

impl BufferPump for BufferedOutputPump {
    fn pump(
        &mut self,
        storage: &mut Storage,
        device: Option<&mut dyn Device>,
        elapsed_cycles: u32,
    ) -> PumpStatus {
        self.cycles_remaining -= i64::from(elapsed_cycles);
        if self.cycles_remaining > 0 {
            return PumpStatus::NoDataMoved;
        }
        let device = match device {
            Some(device) => device,
            None => return PumpStatus::Failure,
        };
        self.cycles_remaining = i64::from(device.write_delay());
        let data_remains = storage.memory_to_buffer_data();
        if device.write(storage.buffer_data_register) {
            if data_remains {
                PumpStatus::OneWordMoved
            } else {
                PumpStatus::Completed
            }
        } else {
            PumpStatus::Failure
        }
    }

    fn cycles_remaining(&self) -> i64 {
        self.cycles_remaining
    }
}

/// A pump that never moves data and never finishes. Installed when a
/// buffered transfer is initiated with no usable device selected: the
/// machine buffers forever, exactly as the hardware would wait on a
/// device that never answers.
pub struct NullBufferPump;

impl BufferPump for NullBufferPump {
    fn pump(
        &mut self,
        _storage: &mut Storage,
        _device: Option<&mut dyn Device>,
        _elapsed_cycles: u32,
    ) -> PumpStatus {
        PumpStatus::NoDataMoved
    }

    fn cycles_remaining(&self) -> i64 {
        i64::MAX
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::devices::BiTape;

    const INPUT_DATA: [u16; 10] = [
        0o7777, 0o0001, 0o0200, 0o0210, 0o1111,
        0o4001, 0o4011, 0o4111, 0o4112, 0o4122,
    ];

    const FIRST_WORD_ADDRESS: u16 = 0o200;

    fn storage() -> Storage {
        let mut storage = Storage::new();
        storage.buffer_storage_bank = 0;
        storage.direct_storage_bank = 1;
        storage.indirect_storage_bank = 2;
        storage.relative_storage_bank = 3;
        storage.buffer_entrance_register = FIRST_WORD_ADDRESS;
        storage.buffer_exit_register =
            FIRST_WORD_ADDRESS + INPUT_DATA.len() as u16;
        storage
    }

    #[test]
    fn input_pump_starts_with_the_initial_delay() {
        let tape = BiTape::new(INPUT_DATA.to_vec());
        let pump = BufferedInputPump::new(&tape);
        assert_eq!(
            pump.cycles_remaining(),
            i64::from(tape.initial_read_delay())
        );
    }

    #[test]
    fn input_pump_life_cycle() {
        let mut tape = BiTape::new(INPUT_DATA.to_vec());
        tape.set_online_status(true);
        let mut storage = storage();
        let mut pump = BufferedInputPump::new(&tape);
        let mut words_moved = 0;
        let mut cycles_consumed = 0;
        loop {
            cycles_consumed += 1;
            match pump.pump(&mut storage, Some(&mut tape), 1) {
                PumpStatus::NoDataMoved => {}
                PumpStatus::OneWordMoved => words_moved += 1,
                PumpStatus::Completed => {
                    words_moved += 1;
                    break;
                }
                PumpStatus::Failure => panic!("unexpected device failure"),
            }
        }
        assert_eq!(words_moved, 10);
        // One initial delay plus nine steady read delays.
        assert_eq!(cycles_consumed, 33);
        assert_eq!(
            storage.buffer_entrance_register,
            storage.buffer_exit_register
        );
        for (offset, value) in INPUT_DATA.iter().enumerate() {
            let address = FIRST_WORD_ADDRESS + offset as u16;
            assert_eq!(storage.read_buffer_bank(address), *value);
        }
    }

    #[test]
    fn input_pump_fails_when_the_tape_runs_dry() {
        let mut tape = BiTape::new(vec![0o1111]);
        tape.set_online_status(true);
        let mut storage = storage();
        let mut pump = BufferedInputPump::new(&tape);
        assert_eq!(
            pump.pump(&mut storage, Some(&mut tape), 6),
            PumpStatus::OneWordMoved
        );
        assert_eq!(
            pump.pump(&mut storage, Some(&mut tape), 3),
            PumpStatus::Failure
        );
    }

    #[test]
    fn output_pump_drains_memory_in_order() {
        let mut tape = BiTape::new(vec![]);
        tape.set_online_status(true);
        let mut storage = storage();
        storage.buffer_exit_register = FIRST_WORD_ADDRESS + 3;
        for (offset, value) in [0o11, 0o22, 0o33].iter().enumerate() {
            storage.write_buffer_bank(FIRST_WORD_ADDRESS + offset as u16, *value);
        }
        let output = tape.output_handle();
        let mut pump = BufferedOutputPump::new(&tape);
        assert_eq!(
            pump.pump(&mut storage, Some(&mut tape), 2),
            PumpStatus::NoDataMoved
        );
        assert_eq!(
            pump.pump(&mut storage, Some(&mut tape), 6),
            PumpStatus::OneWordMoved
        );
        assert_eq!(
            pump.pump(&mut storage, Some(&mut tape), 4),
            PumpStatus::OneWordMoved
        );
        assert_eq!(
            pump.pump(&mut storage, Some(&mut tape), 4),
            PumpStatus::Completed
        );
        assert_eq!(*output.borrow(), vec![0o11, 0o22, 0o33]);
    }

    #[test]
    fn null_pump_never_finishes() {
        let mut storage = storage();
        let mut pump = NullBufferPump;
        assert_eq!(pump.pump(&mut storage, None, 100_000), PumpStatus::NoDataMoved);
        assert_eq!(pump.pump(&mut storage, None, 100_000), PumpStatus::NoDataMoved);
    }
}
