//! Integer readings printed line by line on a serial port.
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Split};
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};

use crate::error::Error;

/// Port the USB-serial adapter usually shows up as.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
/// Baud rate of the serial sketches.
pub const DEFAULT_BAUD: u32 = 9600;

/// Reads one value per line.
pub struct LineReader<R> {
    lines: Split<BufReader<R>>,
}

/// Open a port at 8N1.
pub fn open(path: &str, baud: u32) -> Result<LineReader<SerialStream>, Error> {
    let port = tokio_serial::new(path, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .open_native_async()?;

    info!("Opened {} at {} baud", path, baud);

    Ok(LineReader::new(port))
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wrap any byte stream.
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).split(b'\n'),
        }
    }

    /// The next reading, or `None` once the stream ends.
    ///
    /// Lines that are not integers are skipped.
    pub async fn next_reading(&mut self) -> Result<Option<i64>, Error> {
        loop {
            let Some(raw) = self
                .lines
                .next_segment()
                .await
                .map_err(|e| Error::Io("reading a line", e))?
            else {
                return Ok(None);
            };

            // Line noise right after the port opens is rarely valid text.
            let Ok(line) = String::from_utf8(raw) else {
                warn!("Skipping line that is not text");
                continue;
            };

            match parse_reading(&line) {
                Some(value) => {
                    debug!("Read {}", value);
                    return Ok(Some(value));
                }
                None if line.trim().is_empty() => {}
                None => warn!("Skipping unreadable line {:?}", line),
            }
        }
    }
}

/// Parse a line such as `"512\r"`.
pub fn parse_reading(line: &str) -> Option<i64> {
    line.trim().parse().ok()
}
