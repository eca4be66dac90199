/*!
 * Plain-text report writer for projdump
 */

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::report::ScanReport;
use crate::scanner::Scanner;
use crate::types::{ChunkBody, FileVisit};

/// Placeholder written instead of content that is not valid UTF-8
pub const BINARY_PLACEHOLDER: &str = "<binary or unreadable file>";

/// Writes the three report sections produced by a [`Scanner`]
pub struct TextWriter<'a> {
    /// Scanner supplying the structure and content passes
    scanner: &'a Scanner,
}

impl<'a> TextWriter<'a> {
    /// Create a new text writer
    pub fn new(scanner: &'a Scanner) -> Self {
        Self { scanner }
    }

    /// Write the report to a freshly created file at `output_file`
    ///
    /// `output_file` is also the path named in the closing line.
    pub fn write_file(&self, output_file: &Path) -> io::Result<ScanReport> {
        let file = File::create(output_file)?;
        let mut writer = BufWriter::new(file);
        let report = self.write_to(&mut writer, output_file)?;
        writer.flush()?;
        Ok(report)
    }

    /// Write the report to any sink
    pub fn write_to<W: Write>(&self, sink: W, output_file: &Path) -> io::Result<ScanReport> {
        let mut sink = LineCounter::new(sink);
        let mut report = ScanReport::new(self.scanner.root(), output_file);

        writeln!(sink, "Analysis of project: {}", self.scanner.root().display())?;
        writeln!(sink)?;

        writeln!(sink, "Project structure:")?;
        let mut lines = self.scanner.structure();
        for line in &mut lines {
            writeln!(sink, "{}", line)?;
        }
        for (path, reason) in lines.failures() {
            report.record_unreadable_dir(path, reason);
        }

        writeln!(sink)?;
        writeln!(sink, "Text from project files:")?;
        let mut visits = self.scanner.contents();
        for visit in &mut visits {
            self.write_section(&mut sink, &visit)?;
            report.record(visit.path, visit.outcome);
        }
        for (path, reason) in visits.failures() {
            debug!("Content pass could not read {}: {}", path.display(), reason);
        }

        writeln!(sink)?;
        writeln!(
            sink,
            "Analysis complete. Results saved to {}",
            output_file.display()
        )?;

        report.report_lines = sink.lines;
        Ok(report)
    }

    /// Write one content section
    fn write_section<W: Write>(&self, sink: &mut W, visit: &FileVisit) -> io::Result<()> {
        let path = visit.path.display();
        match &visit.body {
            None => Ok(()),
            Some(ChunkBody::Text(text)) => {
                write!(sink, "\nContent of {}:\n{}\n", path, text)
            }
            Some(ChunkBody::Binary) => {
                write!(sink, "\nContent of {}:\n{}\n", path, BINARY_PLACEHOLDER)
            }
            Some(ChunkBody::Error(message)) => {
                write!(sink, "\nError reading {}: {}\n", path, message)
            }
        }
    }
}

/// Counts newlines passing through to the inner writer
struct LineCounter<W> {
    inner: W,
    lines: usize,
}

impl<W: Write> LineCounter<W> {
    fn new(inner: W) -> Self {
        Self { inner, lines: 0 }
    }
}

impl<W: Write> Write for LineCounter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.lines += buf[..written].iter().filter(|&&b| b == b'\n').count();
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
