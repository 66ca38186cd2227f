//! CLI output

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write one pretty-printed JSON document followed by a newline
pub fn write_json_to<W: Write, T: Serialize>(writer: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write JSON to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    write_json_to(&mut io::stdout().lock(), value)
}
