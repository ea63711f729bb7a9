//! The peripheral device contract.

/// I/O channels a device can attach to.
///
/// From the Reference Manual, page 3-32: a device on the normal channel may
/// be read or written on only the normal channel, but a device on the
/// buffer channel may be read and written on either the normal or the
/// buffer channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoChannelSupport {
    NormalOnly,
    NormalAndBuffered,
}

/// An emulated peripheral. A device must be able to read, write, or both.
///
/// Back-ends own their file lifecycles through `open`/`close`; the core
/// only moves words and counts cycles. Delays are in 6.4 µs machine
/// cycles per word moved.
pub trait Device {
    /// Display name, e.g. "Paper Tape Reader".
    fn name(&self) -> &str;

    /// Short key used by console commands to address the device,
    /// e.g. "pt_rdr".
    fn key(&self) -> &str;

    fn can_read(&self) -> bool;

    fn can_write(&self) -> bool;

    fn io_channel_support(&self) -> IoChannelSupport;

    /// True if and only if this device can respond to the given external
    /// function code. For example, only the paper tape reader responds to
    /// 4102, select reader. See Appendix II of the Reference Manual.
    fn accepts(&self, function_code: u16) -> bool;

    /// Perform an external function requested by an EXC or EXF
    /// instruction. Returns whether the device honored the request,
    /// together with an optional status word for the A register.
    fn external_function(&mut self, function_code: u16) -> (bool, Option<u16>);

    /// Cycles until the first word becomes readable after selection.
    fn initial_read_delay(&self) -> u32 {
        self.read_delay()
    }

    /// Cycles until the first word becomes writable after selection.
    fn initial_write_delay(&self) -> u32 {
        self.write_delay()
    }

    /// Cycles consumed by a single read.
    fn read_delay(&self) -> u32 {
        0
    }

    /// Cycles consumed by a single write.
    fn write_delay(&self) -> u32 {
        0
    }

    /// Read one 12-bit word. Partial words are zero-padded on the left.
    /// `None` means the device failed: it is off-line, out of data, or
    /// cannot read at all.
    fn read(&mut self) -> Option<u16> {
        None
    }

    /// Write a single word; devices that take partial words keep the
    /// least significant bits. Returns false on failure.
    fn write(&mut self, _value: u16) -> bool {
        false
    }

    /// Bind a backing file. Devices without file back-ends refuse.
    fn open(&mut self, _path: &str) -> bool {
        false
    }

    fn close(&mut self) {}

    fn is_open(&self) -> bool {
        false
    }
}
