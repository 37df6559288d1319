//! Incremental serializer for the output array literal.
//!
//! The output file is one JavaScript array-literal assignment, directly
//! loadable as script source by the front-end map scripts:
//!
//! ```text
//! const buildings = [
//! [52.2297, 21.0122, 160],
//! ];
//! ```
//!
//! Records are written one at a time as the pipeline produces them;
//! nothing is buffered beyond the underlying writer, so memory use is
//! independent of the result count.

use std::io::Write;

use building_map_models::BuildingRecord;

/// Streaming writer for the output array literal.
pub struct RecordWriter<W: Write> {
    out: W,
    count: u64,
}

impl<W: Write> RecordWriter<W> {
    /// Opens the literal by writing the declaration line.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying stream fails.
    pub fn new(mut out: W, array_name: &str) -> std::io::Result<Self> {
        writeln!(out, "const {array_name} = [")?;
        Ok(Self { out, count: 0 })
    }

    /// Writes one `[lat, lon, estimated_area],` record line.
    ///
    /// Numbers are formatted as plain decimals (Rust `Display`), with no
    /// locale-specific grouping.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying stream fails.
    pub fn write_record(&mut self, record: &BuildingRecord) -> std::io::Result<()> {
        writeln!(
            self.out,
            "[{}, {}, {}],",
            record.lat, record.lon, record.estimated_area
        )?;
        self.count += 1;
        Ok(())
    }

    /// Closes the literal, flushes the stream, and returns the number of
    /// records written.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying stream fails.
    pub fn finish(mut self) -> std::io::Result<u64> {
        writeln!(self.out, "];")?;
        self.out.flush()?;
        Ok(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_records_yield_empty_literal() {
        let mut out = Vec::new();
        let writer = RecordWriter::new(&mut out, "buildings").unwrap();
        let count = writer.finish().unwrap();

        assert_eq!(count, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "const buildings = [\n];\n");
    }

    #[test]
    fn records_are_written_one_per_line() {
        let mut out = Vec::new();
        let mut writer = RecordWriter::new(&mut out, "buildings").unwrap();
        writer
            .write_record(&BuildingRecord {
                lat: 52.2297,
                lon: 21.0122,
                estimated_area: 160,
            })
            .unwrap();
        writer
            .write_record(&BuildingRecord {
                lat: 52.25,
                lon: 21.0,
                estimated_area: 4250,
            })
            .unwrap();
        let count = writer.finish().unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "const buildings = [\n[52.2297, 21.0122, 160],\n[52.25, 21, 4250],\n];\n"
        );
    }

    #[test]
    fn array_name_is_configurable() {
        let mut out = Vec::new();
        RecordWriter::new(&mut out, "apartments")
            .unwrap()
            .finish()
            .unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("const apartments = ["));
    }
}
