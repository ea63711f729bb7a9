//! The I/O subsystem.
//!
//! Owns the attached devices and the two selected-device slots: the
//! normal channel for synchronous, blocking transfers and the buffer
//! channel for pump-driven asynchronous transfers. A buffered transfer
//! moves the selected device from the normal slot to the buffer slot for
//! its duration.

use colored::Colorize;

use crate::buffer_pump::{
    BufferPump, BufferedInputPump, BufferedOutputPump, NullBufferPump,
    PumpStatus,
};
use crate::device::{Device, IoChannelSupport};
use crate::storage::Storage;

/// Result of a request to start buffered I/O.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitiationStatus {
    Started,
    /// The buffer channel is already occupied; the caller branches to G.
    AlreadyRunning,
}

pub struct InputOutput {
    devices: Vec<Box<dyn Device>>,
    device_on_normal_channel: Option<usize>,
    device_on_buffer_channel: Option<usize>,
    buffer_pump: Option<Box<dyn BufferPump>>,
}

impl InputOutput {
    pub fn new(devices: Vec<Box<dyn Device>>) -> InputOutput {
        InputOutput {
            devices,
            device_on_normal_channel: None,
            device_on_buffer_channel: None,
            buffer_pump: None,
        }
    }

    /// Stop normal and buffered I/O and drop all selections. Invoked by
    /// master clear; the caller resets the buffering flag in storage.
    pub fn clear(&mut self) {
        self.device_on_normal_channel = None;
        self.device_on_buffer_channel = None;
        self.buffer_pump = None;
    }

    pub fn device_on_normal_channel(&self) -> Option<&dyn Device> {
        self.device_on_normal_channel
            .map(|index| self.devices[index].as_ref())
    }

    pub fn device_on_buffer_channel(&self) -> Option<&dyn Device> {
        self.device_on_buffer_channel
            .map(|index| self.devices[index].as_ref())
    }

    /// Look a device up by its console key, e.g. "pt_rdr".
    pub fn device_with_key(&mut self, key: &str) -> Option<&mut (dyn Device + '_)> {
        self.devices
            .iter_mut()
            .find(|device| device.key() == key)
            .map(move |device| device.as_mut() as &mut dyn Device)
    }

    /// Perform an external function: select or query a device. Any
    /// device already on the normal channel is deselected first. Returns
    /// whether some attached device honored the request, and the
    /// device's status response if it produced one.
    pub fn external_function(&mut self, operand: u16) -> (bool, Option<u16>) {
        self.device_on_normal_channel = None;
        let candidate = self
            .devices
            .iter()
            .position(|device| device.accepts(operand));
        match candidate {
            Some(index) => {
                let (status, response) =
                    self.devices[index].external_function(operand);
                if status {
                    self.device_on_normal_channel = Some(index);
                }
                (status, response)
            }
            None => (false, None),
        }
    }

    /// The selected normal device's per-word read cost, or 0 when
    /// nothing is selected.
    pub fn read_delay(&self) -> u32 {
        self.device_on_normal_channel()
            .map_or(0, |device| device.read_delay())
    }

    pub fn write_delay(&self) -> u32 {
        self.device_on_normal_channel()
            .map_or(0, |device| device.write_delay())
    }

    /// Read one word from the normal channel. Fails when no device is
    /// selected or the device cannot deliver.
    pub fn read_normal(&mut self) -> Option<u16> {
        let index = self.device_on_normal_channel?;
        self.devices[index].read()
    }

    /// Write one word to the normal channel. Fails when no device is
    /// selected or the device refuses.
    pub fn write_normal(&mut self, value: u16) -> bool {
        match self.device_on_normal_channel {
            Some(index) => self.devices[index].write(value),
            None => false,
        }
    }

    pub fn initiate_buffer_input(
        &mut self,
        storage: &mut Storage,
    ) -> InitiationStatus {
        self.initiate_buffering(storage, true)
    }

    pub fn initiate_buffer_output(
        &mut self,
        storage: &mut Storage,
    ) -> InitiationStatus {
        self.initiate_buffering(storage, false)
    }

    fn initiate_buffering(
        &mut self,
        storage: &mut Storage,
        input: bool,
    ) -> InitiationStatus {
        if storage.buffering {
            return InitiationStatus::AlreadyRunning;
        }
        let usable = self.device_on_normal_channel.filter(|&index| {
            let device = &self.devices[index];
            device.io_channel_support() == IoChannelSupport::NormalAndBuffered
                && if input {
                    device.can_read()
                } else {
                    device.can_write()
                }
        });
        match usable {
            Some(index) => {
                // The device moves from the normal channel to the buffer
                // channel for the duration of the transfer.
                let device = self.devices[index].as_ref();
                self.buffer_pump = Some(if input {
                    Box::new(BufferedInputPump::new(device))
                } else {
                    Box::new(BufferedOutputPump::new(device))
                });
                self.device_on_buffer_channel = Some(index);
                self.device_on_normal_channel = None;
            }
            None => {
                // Nothing suitable is selected. The channel hangs on a
                // pump that never completes, until CBC or master clear.
                self.buffer_pump = Some(Box::new(NullBufferPump));
                self.device_on_buffer_channel = None;
            }
        }
        storage.start_buffering();
        InitiationStatus::Started
    }

    /// Give the active buffer pump the cycles the last instruction
    /// consumed. Completion and failure both release the buffer channel.
    pub fn pump_buffer(&mut self, storage: &mut Storage, elapsed_cycles: u32) {
        let mut pump = match self.buffer_pump.take() {
            Some(pump) => pump,
            None => return,
        };
        let device = self
            .device_on_buffer_channel
            .map(|index| self.devices[index].as_mut() as &mut dyn Device);
        match pump.pump(storage, device, elapsed_cycles) {
            PumpStatus::NoDataMoved | PumpStatus::OneWordMoved => {
                self.buffer_pump = Some(pump);
            }
            PumpStatus::Completed => {
                self.device_on_buffer_channel = None;
                storage.stop_buffering();
            }
            PumpStatus::Failure => {
                eprintln!(
                    "{}",
                    "Buffered transfer failed; buffer channel released."
                        .yellow()
                );
                self.device_on_buffer_channel = None;
                storage.stop_buffering();
            }
        }
    }

    /// CBC: cancel any buffered transfer. BER and BXR are untouched.
    pub fn clear_buffer_controls(&mut self, storage: &mut Storage) {
        self.device_on_buffer_channel = None;
        self.buffer_pump = None;
        storage.stop_buffering();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::devices::{BiTape, NullDevice, PaperTapeReader};

    const BI_TAPE_INPUT_DATA: [u16; 10] = [
        0o7777, 0o0001, 0o0200, 0o0210, 0o1111,
        0o4001, 0o4011, 0o4111, 0o4112, 0o4122,
    ];

    fn input_output_with_tape(online: bool) -> InputOutput {
        let mut bi_tape = BiTape::new(BI_TAPE_INPUT_DATA.to_vec());
        bi_tape.set_online_status(online);
        InputOutput::new(vec![
            Box::new(PaperTapeReader::new()),
            Box::new(bi_tape),
        ])
    }

    #[test]
    fn select_when_no_device_accepts_the_code() {
        let mut input_output = input_output_with_tape(true);
        assert_eq!(input_output.external_function(0o5000), (false, None));
        assert!(input_output.device_on_normal_channel().is_none());
        assert!(input_output.device_on_buffer_channel().is_none());
    }

    #[test]
    fn select_a_device_that_is_not_ready() {
        let mut input_output = input_output_with_tape(true);
        // The reader has no tape mounted, so it declines selection.
        assert_eq!(input_output.external_function(0o4102), (false, None));
        assert!(input_output.device_on_normal_channel().is_none());
    }

    #[test]
    fn select_an_offline_bi_tape() {
        let mut input_output = input_output_with_tape(false);
        // The tape answers with its off-line status but still selects.
        assert_eq!(
            input_output.external_function(0o3700),
            (true, Some(0o4000))
        );
        assert_eq!(input_output.write_delay(), 4);
        assert!(!input_output.write_normal(0o4040));
    }

    #[test]
    fn select_and_read_the_bi_tape() {
        let mut input_output = input_output_with_tape(true);
        assert_eq!(
            input_output.external_function(0o3700),
            (true, Some(0o0001))
        );
        assert_eq!(input_output.read_delay(), 3);
        assert_eq!(input_output.read_normal(), Some(0o7777));
        assert!(input_output.write_normal(0o4040));
    }

    #[test]
    fn channel_operations_with_nothing_selected() {
        let mut input_output = input_output_with_tape(true);
        assert_eq!(input_output.read_delay(), 0);
        assert_eq!(input_output.write_delay(), 0);
        assert_eq!(input_output.read_normal(), None);
        assert!(!input_output.write_normal(0o4040));
    }

    #[test]
    fn buffer_initiation_moves_the_selection() {
        let mut input_output = input_output_with_tape(true);
        let mut storage = Storage::new();
        storage.buffer_entrance_register = 0o200;
        storage.buffer_exit_register = 0o212;
        input_output.external_function(0o3700);
        assert_eq!(
            input_output.initiate_buffer_input(&mut storage),
            InitiationStatus::Started
        );
        assert!(storage.buffering);
        assert!(input_output.device_on_normal_channel().is_none());
        assert_eq!(
            input_output.device_on_buffer_channel().map(|d| d.key()),
            Some("bi_tape")
        );
        assert_eq!(
            input_output.initiate_buffer_input(&mut storage),
            InitiationStatus::AlreadyRunning
        );
    }

    #[test]
    fn buffer_initiation_without_a_device_hangs_on_the_null_pump() {
        let mut input_output = input_output_with_tape(true);
        let mut storage = Storage::new();
        assert_eq!(
            input_output.initiate_buffer_input(&mut storage),
            InitiationStatus::Started
        );
        assert!(storage.buffering);
        assert!(input_output.device_on_buffer_channel().is_none());
        input_output.pump_buffer(&mut storage, 1_000_000);
        assert!(storage.buffering);
    }

    #[test]
    fn pump_runs_a_transfer_to_completion() {
        let mut input_output = input_output_with_tape(true);
        let mut storage = Storage::new();
        storage.buffer_entrance_register = 0o200;
        storage.buffer_exit_register = 0o212;
        input_output.external_function(0o3700);
        input_output.initiate_buffer_input(&mut storage);
        let mut guard = 0;
        while storage.buffering {
            input_output.pump_buffer(&mut storage, 3);
            guard += 1;
            assert!(guard < 100, "transfer never completed");
        }
        for (offset, value) in BI_TAPE_INPUT_DATA.iter().enumerate() {
            assert_eq!(
                storage.read_buffer_bank(0o200 + offset as u16),
                *value
            );
        }
        assert!(input_output.device_on_buffer_channel().is_none());
    }

    #[test]
    fn clear_buffer_controls_releases_the_channel() {
        let mut input_output = InputOutput::new(vec![Box::new(NullDevice::new())]);
        let mut storage = Storage::new();
        storage.buffer_entrance_register = 0;
        storage.buffer_exit_register = 0o7777;
        input_output.external_function(0o7777);
        input_output.initiate_buffer_input(&mut storage);
        assert!(storage.buffering);
        input_output.clear_buffer_controls(&mut storage);
        assert!(!storage.buffering);
        assert!(input_output.device_on_buffer_channel().is_none());
        // BER and BXR are not CBC's business.
        assert_eq!(storage.buffer_entrance_register, 0);
        assert_eq!(storage.buffer_exit_register, 0o7777);
    }

    #[test]
    fn device_lookup_by_key() {
        let mut input_output = input_output_with_tape(true);
        assert!(input_output.device_with_key("pt_rdr").is_some());
        assert!(input_output.device_with_key("nul").is_none());
    }
}
