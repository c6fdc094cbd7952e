//! Producers feeding the window, one per demo sketch.
//!
//! Each producer returns `Ok(())` once the window is gone and an error when
//! the board can no longer be read.

use std::{f64::consts::TAU, future::Future, time::Duration};

use log::{debug, error, info, warn};
use pinguino_protocol::{Coordinate, Environment, START_MARKER, Temperature};
use tokio::{
    io::AsyncRead,
    sync::mpsc::Sender,
    time::{Interval, MissedTickBehavior, interval},
};

use crate::{comm::BulkLink, error::Error, serial::LineReader};

/// Trace of the `sin100` sketch.
pub const SIN100: &str = "sin100";
/// BMP280 pressure trace, in hPa.
pub const PRESSURE: &str = "Pressure";
/// BMP280 temperature trace, in °C.
pub const TEMPERATURE: &str = "Temperature";
/// Synthetic sine trace.
pub const SINE: &str = "sin";
/// Synthetic saw-tooth trace.
pub const SAW: &str = "saw";

/// A value on its way to the window.
#[derive(Clone, Debug, PartialEq)]
pub enum Sample {
    /// Next value of a scroll graph trace.
    Trace { name: &'static str, value: f64 },
    /// Next point of an XY frame.
    Point { x: f64, y: f64 },
    /// Next value of a rolling window.
    Reading(f64),
    /// New thermometer reading.
    Temperature(Temperature),
    /// The producer gave up.
    Stopped(String),
}

/// Run a producer and report its failure to the window.
pub async fn supervise(source: impl Future<Output = Result<(), Error>>, samples: Sender<Sample>) {
    match source.await {
        Ok(()) => info!("Window closed, source finished"),
        Err(e) => {
            error!("Source stopped: {}", e);
            _ = samples.send(Sample::Stopped(e.to_string())).await;
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Scroll the ordinate of every `sin100` point.
pub async fn scroll<L: BulkLink>(
    mut link: L,
    period: Duration,
    samples: Sender<Sample>,
) -> Result<(), Error> {
    let mut ticker = ticker(period);

    loop {
        ticker.tick().await;

        let point = Coordinate::decode(&link.read(Coordinate::SIZE, None).await?)?;
        let sample = Sample::Trace {
            name: SIN100,
            value: point.y as f64,
        };
        if samples.send(sample).await.is_err() {
            return Ok(());
        }
    }
}

/// Forward `sin100` points as fast as the board sends them.
pub async fn sinusoid<L: BulkLink>(mut link: L, samples: Sender<Sample>) -> Result<(), Error> {
    loop {
        let point = Coordinate::decode(&link.read(Coordinate::SIZE, None).await?)?;
        let sample = Sample::Point {
            x: point.x as f64,
            y: point.y as f64,
        };
        if samples.send(sample).await.is_err() {
            return Ok(());
        }
    }
}

/// Skip input until the BMP280 sketch announces a record.
async fn await_start<L: BulkLink>(link: &mut L) -> Result<(), Error> {
    loop {
        let marker = link.read(START_MARKER.len(), None).await?;
        debug!("Marker {:?}", String::from_utf8_lossy(&marker));
        if marker == START_MARKER {
            return Ok(());
        }
    }
}

/// Scroll pressure and temperature of the BMP280 sketch.
pub async fn bmp280<L: BulkLink>(
    mut link: L,
    period: Duration,
    samples: Sender<Sample>,
) -> Result<(), Error> {
    let mut ticker = ticker(period);

    loop {
        ticker.tick().await;

        await_start(&mut link).await?;
        let record = Environment::decode(&link.read(Environment::SIZE, None).await?)?;
        debug!("P={} T={}", record.pressure, record.temperature);

        for sample in [
            Sample::Trace {
                name: PRESSURE,
                value: record.pressure_hpa(),
            },
            Sample::Trace {
                name: TEMPERATURE,
                value: record.temperature_c(),
            },
        ] {
            if samples.send(sample).await.is_err() {
                return Ok(());
            }
        }
    }
}

/// Poll the DS18x20 sketch, waiting at most one period per reading.
///
/// Only a disconnect ends polling; other failures skip the reading.
pub async fn thermometer<L: BulkLink>(
    mut link: L,
    period: Duration,
    samples: Sender<Sample>,
) -> Result<(), Error> {
    let mut ticker = ticker(period);

    loop {
        ticker.tick().await;

        let reading = match link.read(Temperature::SIZE, Some(period)).await {
            Ok(bytes) => Temperature::decode(&bytes).map_err(Error::from),
            Err(e) => Err(e),
        };

        match reading {
            Ok(reading) => {
                if samples.send(Sample::Temperature(reading)).await.is_err() {
                    return Ok(());
                }
            }
            Err(e) if e.is_disconnect() => return Err(e),
            Err(e) => warn!("No temperature this time: {}", e),
        }
    }
}

/// Sine and saw-tooth generator for trying out the graph without a board.
#[derive(Debug)]
pub struct Waveforms {
    angle: f64,
    saw: i32,
    rising: bool,
}

impl Waveforms {
    const ANGLE_STEP: f64 = 0.05;
    const SAW_TOP: i32 = 100;

    pub fn new() -> Self {
        Self {
            angle: 0.0,
            saw: 0,
            rising: true,
        }
    }

    /// The next (sine, saw) pair.
    pub fn step(&mut self) -> (f64, f64) {
        let values = (self.angle.sin(), self.saw as f64);

        self.angle += Self::ANGLE_STEP;
        if self.angle >= TAU {
            self.angle = 0.0;
        }

        self.saw += if self.rising { 1 } else { -1 };
        if self.saw == Self::SAW_TOP {
            self.rising = false;
        }
        if self.saw == 0 {
            self.rising = true;
        }

        values
    }
}

impl Default for Waveforms {
    fn default() -> Self {
        Self::new()
    }
}

/// Scroll synthetic waveforms.
pub async fn waveforms(period: Duration, samples: Sender<Sample>) -> Result<(), Error> {
    let mut ticker = ticker(period);
    let mut waves = Waveforms::new();

    loop {
        ticker.tick().await;

        let (sine, saw) = waves.step();
        for sample in [
            Sample::Trace {
                name: SINE,
                value: sine,
            },
            Sample::Trace {
                name: SAW,
                value: saw,
            },
        ] {
            if samples.send(sample).await.is_err() {
                return Ok(());
            }
        }
    }
}

/// Forward serial readings divided by `divisor`.
pub async fn analog<R: AsyncRead + Unpin>(
    mut reader: LineReader<R>,
    divisor: f64,
    samples: Sender<Sample>,
) -> Result<(), Error> {
    while let Some(value) = reader.next_reading().await? {
        if samples.send(Sample::Reading(value as f64 / divisor)).await.is_err() {
            return Ok(());
        }
    }

    info!("Serial stream ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::comm::mock::ScriptedLink;

    const FAST: Duration = Duration::from_millis(1);

    fn coordinate(x: i16, y: i16) -> Result<Vec<u8>, Error> {
        let mut bytes = x.to_le_bytes().to_vec();
        bytes.extend(y.to_le_bytes());
        Ok(bytes)
    }

    #[tokio::test]
    async fn test_scroll_until_disconnect() {
        let link = ScriptedLink::new([coordinate(0, 0), coordinate(90, 100)]);
        let (tx, mut rx) = mpsc::channel(16);

        supervise(scroll(link, FAST, tx.clone()), tx).await;

        assert_eq!(
            rx.recv().await,
            Some(Sample::Trace {
                name: SIN100,
                value: 0.0
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(Sample::Trace {
                name: SIN100,
                value: 100.0
            })
        );
        assert!(matches!(rx.recv().await, Some(Sample::Stopped(_))));
    }

    #[tokio::test]
    async fn test_sinusoid_points() {
        let link = ScriptedLink::new([coordinate(270, -100)]);
        let (tx, mut rx) = mpsc::channel(16);

        let result = sinusoid(link, tx).await;

        assert!(result.unwrap_err().is_disconnect());
        assert_eq!(
            rx.recv().await,
            Some(Sample::Point {
                x: 270.0,
                y: -100.0
            })
        );
    }

    #[tokio::test]
    async fn test_bmp280_waits_for_marker() {
        let mut record = 100_000i32.to_le_bytes().to_vec();
        record.extend(2_150i32.to_le_bytes());

        let link = ScriptedLink::new([
            Ok(b"xxSTA".to_vec()),
            Ok(START_MARKER.to_vec()),
            Ok(record),
        ]);
        let (tx, mut rx) = mpsc::channel(16);

        let _ = bmp280(link, FAST, tx).await;

        assert_eq!(
            rx.recv().await,
            Some(Sample::Trace {
                name: PRESSURE,
                value: 1000.0
            })
        );
        assert_eq!(
            rx.recv().await,
            Some(Sample::Trace {
                name: TEMPERATURE,
                value: 21.5
            })
        );
    }

    #[tokio::test]
    async fn test_thermometer_skips_failures() {
        let link = ScriptedLink::new([
            Err(Error::Timeout),
            Ok(vec![7, 0, 0, 0]),
            Ok(vec![0, 20, 0, 0]),
        ]);
        let (tx, mut rx) = mpsc::channel(16);

        let result = thermometer(link, FAST, tx).await;

        assert!(result.unwrap_err().is_disconnect());
        assert_eq!(
            rx.recv().await,
            Some(Sample::Temperature(Temperature {
                negative: false,
                integer: 20,
                fraction: 0
            }))
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_window_ends_producer() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        assert!(waveforms(FAST, tx).await.is_ok());
    }

    #[tokio::test]
    async fn test_analog_divides() {
        let input: &[u8] = b"400\r\n800\r\n";
        let (tx, mut rx) = mpsc::channel(16);

        analog(LineReader::new(input), 40.0, tx).await.unwrap();

        assert_eq!(rx.recv().await, Some(Sample::Reading(10.0)));
        assert_eq!(rx.recv().await, Some(Sample::Reading(20.0)));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_saw_turns_around() {
        let mut waves = Waveforms::new();
        let saws: Vec<f64> = (0..202).map(|_| waves.step().1).collect();

        assert_eq!(saws[0], 0.0);
        assert_eq!(saws[100], 100.0);
        assert_eq!(saws[101], 99.0);
        assert_eq!(saws[200], 0.0);
        assert_eq!(saws[201], 1.0);
    }

    #[test]
    fn test_sine_wraps() {
        let mut waves = Waveforms::new();
        let steps = (TAU / Waveforms::ANGLE_STEP).ceil() as usize;
        for _ in 0..steps {
            waves.step();
        }
        assert_eq!(waves.angle, 0.0);
    }
}
