//! Byte-oriented framing, resynchronization, and sign extension for the
//! wire protocol (spec.md §4.D, §6).
//!
//! A record is framed by a one-record-lookahead anchor: `buf[p] == 0x55`
//! **and** `buf[p + record_size] == 0x55`. When the anchor test fails the
//! decoder advances one byte and retries, counting the advance; when it
//! next succeeds, the accumulated advance count is reported as a single
//! misalignment event and folded into the running resync-advance total.
use std::time::Duration;

use skin_traits::Device;

/// Framing magic byte, also doubling as the one-record-lookahead anchor.
pub const MAGIC: u8 = 0x55;

/// Default capacity of the decoder's refill buffer.
pub const BUFFER_SIZE: usize = 4096;

/// Selects the on-wire record shape. `Sequenced` is reserved (spec.md §6);
/// the reader task only ever selects `Plain` today, but the arithmetic is
/// real so a future caller can flip modes without decoder changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolMode {
    /// 5-byte record: magic, address, 24-bit signed value.
    Plain,
    /// 9-byte record: magic, address, 32-bit sequence, 24-bit signed value.
    Sequenced,
}

impl ProtocolMode {
    /// Total bytes in one record of this mode, magic byte included.
    #[inline]
    pub const fn record_size(self) -> usize {
        match self {
            ProtocolMode::Plain => 5,
            ProtocolMode::Sequenced => 9,
        }
    }
}

/// A decoded wire record before address validation against the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord {
    /// Patch id as it appears on the wire: 1-based.
    pub patch_wire: u8,
    /// Cell id: 0-based, both on the wire and in the user API.
    pub cell: u8,
    /// Sign-extended 24-bit sample value.
    pub value: i32,
    /// Monotonic sequence number, only present in `Sequenced` mode.
    pub seq: Option<u32>,
}

/// Sign-extend a 24-bit two's-complement field (top bit at position 23)
/// into a full 32-bit `i32`, without relying on host endianness.
#[inline]
pub fn sign_extend_24(raw: u32) -> i32 {
    let raw = raw & 0x00FF_FFFF;
    if raw & 0x0080_0000 != 0 {
        (raw | 0xFF00_0000) as i32
    } else {
        raw as i32
    }
}

/// Encode a 24-bit big-endian two's-complement field from a sign-extended
/// value. Used by tests and the encode/decode round-trip property.
#[inline]
pub fn encode_24(value: i32) -> [u8; 3] {
    let bits = (value as u32) & 0x00FF_FFFF;
    [(bits >> 16) as u8, (bits >> 8) as u8, bits as u8]
}

/// Decode one record's body (the bytes following the leading magic byte are
/// NOT included — `buf` starts at the address byte and is exactly
/// `mode.record_size() - 1` bytes long).
fn decode_body(buf: &[u8], mode: ProtocolMode) -> RawRecord {
    debug_assert_eq!(buf.len(), mode.record_size() - 1);
    let patch_wire = (buf[0] >> 4) & 0x0F;
    let cell = buf[0] & 0x0F;
    match mode {
        ProtocolMode::Plain => {
            let raw = u32::from(buf[1]) << 16 | u32::from(buf[2]) << 8 | u32::from(buf[3]);
            RawRecord {
                patch_wire,
                cell,
                value: sign_extend_24(raw),
                seq: None,
            }
        }
        ProtocolMode::Sequenced => {
            let seq = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
            let raw = u32::from(buf[5]) << 16 | u32::from(buf[6]) << 8 | u32::from(buf[7]);
            RawRecord {
                patch_wire,
                cell,
                value: sign_extend_24(raw),
                seq: Some(seq),
            }
        }
    }
}

/// Encode a full record (magic byte included) for the given mode. Mostly
/// useful for tests building synthetic streams.
pub fn encode_record(mode: ProtocolMode, patch_wire: u8, cell: u8, value: i32, seq: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(mode.record_size());
    out.push(MAGIC);
    out.push(((patch_wire & 0x0F) << 4) | (cell & 0x0F));
    if mode == ProtocolMode::Sequenced {
        out.extend_from_slice(&seq.to_be_bytes());
    }
    out.extend_from_slice(&encode_24(value));
    out
}

/// One completed resync episode, reported to the debug log as
/// `misalign,<advance_count>` (spec.md §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MisalignmentEvent {
    pub advance_count: u64,
}

/// Outcome of one `FrameReader::next_record` call.
pub enum DecodeEvent {
    /// A record was framed and decoded, possibly after a resync.
    Record {
        record: RawRecord,
        misalignment: Option<MisalignmentEvent>,
    },
    /// The buffer was refilled (tail moved to front); carries the byte
    /// offset the tail was moved from, for the `rewind,<byte_offset>`
    /// debug event.
    Rewind { byte_offset: usize },
}

/// Owns the refill buffer and the blocking device; produces one decoded
/// record (or a rewind notification) per call. Fatal device errors
/// propagate as `std::io::Error` — per spec, reads never recover.
pub struct FrameReader<D: Device> {
    device: D,
    mode: ProtocolMode,
    buf: Vec<u8>,
    /// Number of valid bytes at the front of `buf`.
    len: usize,
    /// Read cursor into `buf[..len]`.
    pos: usize,
    /// Bytes advanced since the last successful anchor (reset on success).
    advance_count: u64,
    /// Total bytes consumed from the device this session.
    total_bytes: u64,
    /// Span within `buf` filled by the most recent refill, for the
    /// `read,<hex_bytes>` debug event.
    last_fill: (usize, usize),
}

impl<D: Device> FrameReader<D> {
    pub fn new(device: D, mode: ProtocolMode) -> Self {
        Self::with_capacity(device, mode, BUFFER_SIZE)
    }

    pub fn with_capacity(device: D, mode: ProtocolMode, capacity: usize) -> Self {
        assert!(capacity > mode.record_size(), "buffer must outsize one record");
        Self {
            device,
            mode,
            buf: vec![0u8; capacity],
            len: 0,
            pos: 0,
            advance_count: 0,
            total_bytes: 0,
            last_fill: (0, 0),
        }
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// The bytes read from the device during the most recent refill, for
    /// the `read,<hex_bytes>` debug event. Empty before the first refill.
    pub fn last_read(&self) -> &[u8] {
        let (start, len) = self.last_fill;
        &self.buf[start..start + len]
    }

    fn remaining(&self) -> usize {
        self.len - self.pos
    }

    /// Refill rule (spec.md §4.D): when fewer than `record_size + 1` bytes
    /// remain, move the tail to the front and read enough to refill to
    /// capacity. Returns `Some(byte_offset)` the tail was compacted from,
    /// when a compaction actually happened.
    fn ensure_refill(&mut self) -> std::io::Result<Option<usize>> {
        let need = self.mode.record_size() + 1;
        if self.remaining() >= need {
            return Ok(None);
        }
        let byte_offset = self.pos;
        let tail = self.remaining();
        self.buf.copy_within(self.pos..self.len, 0);
        self.len = tail;
        self.pos = 0;

        let fill_start = self.len;
        let fill_target = self.buf.len();
        while self.len < fill_target {
            let n = read_some(&mut self.device, &mut self.buf[self.len..fill_target])?;
            self.len += n;
            self.total_bytes += n as u64;
        }
        self.last_fill = (fill_start, fill_target - fill_start);
        Ok(Some(byte_offset))
    }

    fn anchor_ok(&self, p: usize) -> bool {
        let rs = self.mode.record_size();
        p + rs < self.len && self.buf[p] == MAGIC && self.buf[p + rs] == MAGIC
    }

    /// Produce the next decode event. Callers should loop: a `Rewind` event
    /// carries no record and the loop should simply call again.
    pub fn next_event(&mut self) -> std::io::Result<DecodeEvent> {
        if let Some(byte_offset) = self.ensure_refill()? {
            return Ok(DecodeEvent::Rewind { byte_offset });
        }

        loop {
            if self.anchor_ok(self.pos) {
                let rs = self.mode.record_size();
                let body_start = self.pos + 1;
                let record = decode_body(&self.buf[body_start..self.pos + rs], self.mode);
                self.pos += rs;

                let misalignment = if self.advance_count > 0 {
                    let ev = MisalignmentEvent {
                        advance_count: self.advance_count,
                    };
                    self.advance_count = 0;
                    Some(ev)
                } else {
                    None
                };
                return Ok(DecodeEvent::Record {
                    record,
                    misalignment,
                });
            }

            self.pos += 1;
            self.advance_count += 1;

            if self.remaining() < self.mode.record_size() + 1 {
                if let Some(byte_offset) = self.ensure_refill()? {
                    return Ok(DecodeEvent::Rewind { byte_offset });
                }
            }
        }
    }
}

fn read_some<D: Device>(device: &mut D, buf: &mut [u8]) -> std::io::Result<usize> {
    // `Device::read_exact` fills the whole slice or errors; we ask for
    // progressively smaller slices is unnecessary since read_exact already
    // loops over short reads internally. One call fills `buf` fully.
    device.read_exact(buf)?;
    Ok(buf.len())
}

/// Bounded-timeout write-readiness check used before sending control bytes
/// (spec.md §4.E). A timeout is a warning, not a fatal error.
pub fn write_control_byte<D: Device>(
    device: &mut D,
    byte: u8,
    timeout: Duration,
) -> std::io::Result<bool> {
    if device.poll_writable(timeout)? {
        device.write_all(&[byte])?;
        Ok(true)
    } else {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct MockDevice {
        bytes: VecDeque<u8>,
    }

    impl MockDevice {
        fn new(bytes: Vec<u8>) -> Self {
            Self {
                bytes: bytes.into(),
            }
        }
    }

    impl Device for MockDevice {
        fn read_exact(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
            if self.bytes.len() < buf.len() {
                return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof));
            }
            for slot in buf.iter_mut() {
                *slot = self.bytes.pop_front().unwrap();
            }
            Ok(())
        }
        fn write_all(&mut self, _buf: &[u8]) -> std::io::Result<()> {
            Ok(())
        }
        fn poll_writable(&mut self, _timeout: Duration) -> std::io::Result<bool> {
            Ok(true)
        }
    }

    #[test]
    fn sign_extension_boundaries() {
        assert_eq!(sign_extend_24(0x800000), -8388608);
        assert_eq!(sign_extend_24(0x7FFFFF), 8388607);
        assert_eq!(sign_extend_24(0x000000), 0);
    }

    #[test]
    fn encode_decode_round_trip() {
        let bytes = encode_record(ProtocolMode::Plain, 5, 11, 0x123456, 0);
        let mut dev = MockDevice::new(bytes.clone());
        // Pad enough trailing bytes to satisfy the refill rule.
        dev.bytes.extend(std::iter::repeat(0x00).take(BUFFER_SIZE));
        let mut fr = FrameReader::new(dev, ProtocolMode::Plain);
        loop {
            match fr.next_event().unwrap() {
                DecodeEvent::Rewind { .. } => continue,
                DecodeEvent::Record { record, .. } => {
                    assert_eq!(record.patch_wire, 5);
                    assert_eq!(record.cell, 11);
                    assert_eq!(record.value, 0x123456);
                    break;
                }
            }
        }
    }

    #[test]
    fn resync_after_stray_bytes_reports_one_event() {
        let mut bytes = vec![0xAA, 0xBB];
        bytes.extend(encode_record(ProtocolMode::Plain, 1, 0, 100, 0));
        bytes.extend(std::iter::repeat(0x00).take(BUFFER_SIZE));
        let dev = MockDevice::new(bytes);
        let mut fr = FrameReader::new(dev, ProtocolMode::Plain);
        loop {
            match fr.next_event().unwrap() {
                DecodeEvent::Rewind { .. } => continue,
                DecodeEvent::Record {
                    record,
                    misalignment,
                } => {
                    assert_eq!(record.value, 100);
                    assert_eq!(misalignment.unwrap().advance_count, 2);
                    break;
                }
            }
        }
    }

    #[test]
    fn refill_exactly_at_boundary_loses_no_records() {
        let mut bytes = Vec::new();
        for i in 0..20u8 {
            bytes.extend(encode_record(ProtocolMode::Plain, 1, 0, i as i32, 0));
        }
        let dev = MockDevice::new(bytes);
        let mut fr = FrameReader::with_capacity(dev, ProtocolMode::Plain, 6 * 5);
        let mut seen = Vec::new();
        for _ in 0..200 {
            if seen.len() == 20 {
                break;
            }
            match fr.next_event() {
                Ok(DecodeEvent::Rewind { .. }) => continue,
                Ok(DecodeEvent::Record { record, .. }) => seen.push(record.value),
                Err(_) => break,
            }
        }
        assert_eq!(seen, (0..20i32).collect::<Vec<_>>());
    }
}
