//! The bit-bucket device.

use crate::device::{Device, IoChannelSupport};

/// Select null device.
pub const SELECT_CODE: u16 = 0o7777;

/// A vacuous device that swallows writes and reads zeros. It attaches to
/// either channel, which makes it handy for exercising buffered transfers
/// without moving real data.
pub struct NullDevice;

impl NullDevice {
    pub fn new() -> NullDevice {
        NullDevice
    }
}

impl Device for NullDevice {
    fn name(&self) -> &str {
        "Null Device"
    }

    fn key(&self) -> &str {
        "nul"
    }

    fn can_read(&self) -> bool {
        true
    }

    fn can_write(&self) -> bool {
        true
    }

    fn io_channel_support(&self) -> IoChannelSupport {
        IoChannelSupport::NormalAndBuffered
    }

    fn accepts(&self, function_code: u16) -> bool {
        function_code == SELECT_CODE
    }

    fn external_function(&mut self, function_code: u16) -> (bool, Option<u16>) {
        (function_code == SELECT_CODE, Some(0))
    }

    fn read_delay(&self) -> u32 {
        1
    }

    fn write_delay(&self) -> u32 {
        1
    }

    fn read(&mut self) -> Option<u16> {
        Some(0)
    }

    fn write(&mut self, _value: u16) -> bool {
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_zeros_and_swallows_writes() {
        let mut device = NullDevice::new();
        assert_eq!(device.read(), Some(0));
        assert!(device.write(0o7777));
        assert_eq!(device.read_delay(), 1);
        assert_eq!(device.write_delay(), 1);
    }

    #[test]
    fn accepts_only_its_select_code() {
        let mut device = NullDevice::new();
        assert!(device.accepts(SELECT_CODE));
        assert!(!device.accepts(0o4102));
        assert_eq!(device.external_function(SELECT_CODE), (true, Some(0)));
        assert_eq!(device.external_function(0o4102), (false, Some(0)));
    }
}
