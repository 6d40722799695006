//! CSV loggers: one row per completed frame for the sample log, one row
//! per reader event for the debug log (spec.md §4.G).
//!
//! Both loggers write through a borrowed `dyn Write` handle the facade
//! opens eagerly before `start()` and owns for the lifetime of the
//! session; the reader thread never opens files itself.
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::layout::Layout;

fn now_stamp() -> String {
    let dur = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:09}", dur.as_secs(), dur.subsec_nanos())
}

/// Appends one row per completed frame: `time,patch1_cell0,...`.
pub struct SampleLogger<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> SampleLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    fn write_header(&mut self, layout: &Layout) -> std::io::Result<()> {
        write!(self.writer, "time")?;
        for patch in layout.patches() {
            for &cell in &patch.cell_ids {
                write!(self.writer, ",patch{}_cell{}", patch.patch_id, cell)?;
            }
        }
        writeln!(self.writer)?;
        self.header_written = true;
        Ok(())
    }

    /// `values` must be in the same row-major (patch, then cell) order as
    /// `layout.patches()` / `patch.cell_ids`.
    pub fn write_frame(&mut self, layout: &Layout, values: &[f64]) -> std::io::Result<()> {
        if !self.header_written {
            self.write_header(layout)?;
        }
        write!(self.writer, "{}", now_stamp())?;
        for v in values {
            write!(self.writer, ",{v}")?;
        }
        writeln!(self.writer)?;
        self.writer.flush()
    }
}

/// Appends one row per reader event: `time,event,value`.
pub struct DebugLogger<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> DebugLogger<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    fn ensure_header(&mut self) -> std::io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "time,event,value")?;
            self.header_written = true;
        }
        Ok(())
    }

    fn row(&mut self, event: &str, value: impl std::fmt::Display) -> std::io::Result<()> {
        self.ensure_header()?;
        writeln!(self.writer, "{},{event},{value}", now_stamp())?;
        self.writer.flush()
    }

    pub fn rewind(&mut self, byte_offset: usize) -> std::io::Result<()> {
        self.row("rewind", byte_offset)
    }

    pub fn misalign(&mut self, advance_count: u64) -> std::io::Result<()> {
        self.row("misalign", advance_count)
    }

    pub fn parse(&mut self, patch: u32, cell: u32, value: f64) -> std::io::Result<()> {
        self.row("parse", format!("{patch}.{cell}={value}"))
    }

    pub fn drop_record(&mut self, patch: u32, cell: u32) -> std::io::Result<()> {
        self.row("drop", format!("{patch}.{cell}"))
    }

    pub fn baseline(&mut self, patch: u32, cell: u32, value: i64) -> std::io::Result<()> {
        self.row("baseline", format!("{patch}.{cell}={value}"))
    }

    pub fn read(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let mut hex = String::with_capacity(bytes.len() * 2);
        for b in bytes {
            hex.push_str(&format!("{b:02x}"));
        }
        self.row("read", hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_log_header_matches_layout() {
        let layout = Layout::trivial(1, 2);
        let mut buf = Vec::new();
        {
            let mut logger = SampleLogger::new(&mut buf);
            logger.write_frame(&layout, &[1.0, 2.0]).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "time,patch1_cell0,patch1_cell1");
        assert!(lines.next().unwrap().contains(",1,2"));
    }

    #[test]
    fn debug_log_events_are_formatted() {
        let mut buf = Vec::new();
        {
            let mut logger = DebugLogger::new(&mut buf);
            logger.misalign(2).unwrap();
            logger.parse(1, 0, 12.5).unwrap();
            logger.drop_record(9, 9).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(",misalign,2"));
        assert!(text.contains(",parse,1.0=12.5"));
        assert!(text.contains(",drop,9.9"));
    }

    #[test]
    fn debug_log_baseline_row_matches_spec_format() {
        let mut buf = Vec::new();
        {
            let mut logger = DebugLogger::new(&mut buf);
            logger.baseline(1, 3, -42).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(",baseline,1.3=-42"));
    }
}
