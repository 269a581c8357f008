//! Sink that appends one text line per call to a writable stream.

use std::fmt;
use std::io::Write;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::util::display::{ArrayFormatter, FormatOptions};
use tracing::debug;

use crate::error::{Result, SinkError};
use crate::value::Args;

/// Writes the values of each call as a single space-separated line.
///
/// Argument names are ignored. Vector values are expanded in order, so
/// `(1, 2, 3)` and `(vec![1, 2], 3)` both produce `"1 2 3 \n"`. The stream is
/// only ever appended to; opening, flushing at shutdown and closing it stay
/// with the owner.
pub struct StreamSink<'a> {
    writer: Box<dyn Write + 'a>,
    lines: u64,
}

impl<'a> StreamSink<'a> {
    pub fn new(writer: Box<dyn Write + 'a>) -> Self {
        Self { writer, lines: 0 }
    }

    /// Number of lines written so far.
    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    /// Format and append one line. A call with no arguments writes nothing.
    pub fn write(&mut self, args: Args) -> Result<()> {
        if args.is_empty() {
            return Ok(());
        }

        let line = format_line(&args)?;
        self.writer
            .write_all(line.as_bytes())
            .map_err(|e| SinkError::write_failed("stream", e))?;
        self.lines += 1;
        debug!("Wrote line {} ({} bytes) to stream", self.lines, line.len());
        Ok(())
    }
}

impl fmt::Debug for StreamSink<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSink")
            .field("lines", &self.lines)
            .finish()
    }
}

/// Render every element of every argument, each followed by a space, then a
/// newline.
///
/// Floats print with at most 7 significant digits and no trailing zeros
/// (`1`, `0.3`, `1.234568e-8`); everything else uses Arrow's display text.
pub fn format_line(args: &Args) -> Result<String> {
    let options = FormatOptions::default().with_null(NULL_TEXT);
    let mut line = String::new();
    for arg in args {
        if matches!(
            arg.value.data_type(),
            DataType::Float16 | DataType::Float32 | DataType::Float64
        ) {
            let values = cast(&arg.value, &DataType::Float64)?;
            for v in values.as_primitive::<Float64Type>().iter() {
                line.push_str(&v.map_or_else(|| NULL_TEXT.to_string(), format_float));
                line.push(' ');
            }
            continue;
        }

        let formatter = ArrayFormatter::try_new(arg.value.as_ref(), &options)?;
        for i in 0..arg.value.len() {
            line.push_str(&formatter.value(i).to_string());
            line.push(' ');
        }
    }
    line.push('\n');
    Ok(line)
}

const NULL_TEXT: &str = "NA";

fn format_float(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }
    // Round to 7 significant digits, then print the shortest form.
    let rounded: f64 = format!("{:.6e}", v).parse().unwrap_or(v);
    let magnitude = rounded.abs();
    if magnitude != 0.0 && !(1e-4..1e15).contains(&magnitude) {
        format!("{:e}", rounded)
    } else {
        format!("{}", rounded)
    }
}
