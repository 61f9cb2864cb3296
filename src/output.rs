//! Quote sinks: the only state that outlives a sweep.

use crate::config::{OutputConfig, OutputFormat};
use crate::model::{Configuration, Quote};
use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::info;

/// Receives quotes in sweep order. `begin`/`end` bracket each configuration.
pub trait QuoteSink {
    fn begin(&mut self, configuration: &Configuration) -> Result<()>;
    fn record(&mut self, configuration: &Configuration, quote: &Quote) -> Result<()>;
    fn end(&mut self, configuration: &Configuration) -> Result<()>;
    fn finish(&mut self) -> Result<()>;
}

/// `label`, then `quantity;;price` lines, then a blank line.
pub struct TextSink<W: Write> {
    out: W,
}

impl<W: Write> TextSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> QuoteSink for TextSink<W> {
    fn begin(&mut self, configuration: &Configuration) -> Result<()> {
        writeln!(self.out, "{}", configuration.label())?;
        Ok(())
    }

    fn record(&mut self, _configuration: &Configuration, quote: &Quote) -> Result<()> {
        writeln!(self.out, "{};;{}", quote.quantity, quote.outcome.marker())?;
        Ok(())
    }

    fn end(&mut self, _configuration: &Configuration) -> Result<()> {
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// One header row, then one row per quote.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// `columns` name the dimensions; `Quantity` and `Price` are appended.
    pub fn new(out: W, columns: &[String]) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(out);
        let header = columns
            .iter()
            .map(String::as_str)
            .chain(["Quantity", "Price"]);
        writer.write_record(header)?;
        Ok(Self { writer })
    }
}

impl<W: Write> QuoteSink for CsvSink<W> {
    fn begin(&mut self, _configuration: &Configuration) -> Result<()> {
        Ok(())
    }

    fn record(&mut self, configuration: &Configuration, quote: &Quote) -> Result<()> {
        let marker = quote.outcome.marker();
        let row = configuration
            .values()
            .chain([quote.quantity.as_str(), marker.as_str()]);
        self.writer.write_record(row)?;
        Ok(())
    }

    fn end(&mut self, _configuration: &Configuration) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Open the configured output file.
pub fn create(config: &OutputConfig, columns: &[String]) -> Result<Box<dyn QuoteSink>> {
    if let Some(dir) = config.path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = BufWriter::new(File::create(&config.path)?);
    info!(
        "Writing {} quotes to {}",
        config.format,
        config.path.display()
    );
    Ok(match config.format {
        OutputFormat::Text => Box::new(TextSink::new(file)),
        OutputFormat::Csv => Box::new(CsvSink::new(file, columns)?),
    })
}
