//! Command line: one subcommand per demo sketch.
use std::time::Duration;

use anyhow::Context;
use eframe::egui::{self, Color32};
use log::info;
use pinguino_protocol::Architecture;
use tokio::sync::mpsc;

use crate::{
    SAMPLE_QUEUE_SIZE,
    app::{PlotApp, View},
    comm::{self, BulkLink, Pinguino},
    data::{RollingWindow, ScrollGraph, TemperatureUnit, Thermometer, XyTrace},
    serial,
    source::{self, Sample},
};

/// Board family to accept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Board {
    P8,
    P32,
}

impl From<Board> for Architecture {
    fn from(board: Board) -> Self {
        match board {
            Board::P8 => Architecture::P8,
            Board::P32 => Architecture::P32,
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(version, about = "Live plots of Pinguino sensor data", long_about = None)]
pub struct Cli {
    /// Only use boards of this architecture.
    #[arg(long, global = true, value_enum)]
    pub arch: Option<Board>,
    /// Wait for a board to be connected instead of giving up.
    #[arg(long, global = true)]
    pub wait: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// List attached boards.
    List,
    /// Scroll the y coordinate sent by the sin100 sketch.
    Scroll {
        #[arg(long, default_value_t = 50)]
        period_ms: u64,
    },
    /// Plot whole frames of (x, y) points sent by the sin100 sketch.
    Sinusoid {
        /// Points per frame.
        #[arg(long, default_value_t = 360)]
        points: usize,
    },
    /// Scroll pressure and temperature sent by the BMP280 sketch.
    Bmp280 {
        #[arg(long, default_value_t = 1000)]
        period_ms: u64,
    },
    /// Show date, time and the temperature sent by the DS18x20 sketch.
    Thermometer {
        #[arg(long, default_value_t = 1000)]
        period_ms: u64,
        /// Unit the sketch reports in.
        #[arg(long, value_enum, default_value_t = TemperatureUnit::Fahrenheit)]
        unit: TemperatureUnit,
    },
    /// Scroll a sine and a saw-tooth wave. No board needed.
    Demo {
        #[arg(long, default_value_t = 20)]
        period_ms: u64,
    },
    /// Plot integers printed line by line on a serial port.
    Analog {
        #[arg(long, default_value = serial::DEFAULT_PORT)]
        port: String,
        #[arg(long, default_value_t = serial::DEFAULT_BAUD)]
        baud: u32,
        /// Every reading is divided by this.
        #[arg(long, default_value_t = 1.0)]
        divisor: f64,
        /// Readings shown at once.
        #[arg(long, default_value_t = 10)]
        samples: usize,
        #[arg(long, default_value_t = 100.0, allow_negative_numbers = true)]
        y_min: f64,
        #[arg(long, default_value_t = 1000.0, allow_negative_numbers = true)]
        y_max: f64,
    },
    /// Write raw bytes (decimal or 0x hex) to the board.
    Send {
        #[arg(required = true, value_parser = parse_byte)]
        bytes: Vec<u8>,
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
    },
}

fn parse_byte(s: &str) -> Result<u8, std::num::ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let arch = self.arch.map(Architecture::from);
        let (tx, rx) = mpsc::channel(SAMPLE_QUEUE_SIZE);

        let window = match self.command {
            Command::List => return list(arch),
            Command::Send { bytes, timeout_ms } => {
                return send(arch, self.wait, &bytes, Duration::from_millis(timeout_ms)).await;
            }
            Command::Scroll { period_ms } => {
                let link = Pinguino::acquire(arch, self.wait).await?;
                let period = Duration::from_millis(period_ms);
                tokio::spawn(source::supervise(
                    source::scroll(link, period, tx.clone()),
                    tx,
                ));

                let mut graph = ScrollGraph::new(360, 200.0);
                graph.add_trace(source::SIN100, 100.0, -100.0, Color32::RED, 3.0)?;
                Window::scroll("y = sin100(x)", graph)
            }
            Command::Sinusoid { points } => {
                let link = Pinguino::acquire(arch, self.wait).await?;
                tokio::spawn(source::supervise(source::sinusoid(link, tx.clone()), tx));

                Window {
                    title: "y = sin100(x)",
                    size: [640.0, 480.0],
                    view: View::Xy {
                        trace: XyTrace::new(points),
                        x_range: (0.0, 360.0),
                        y_range: (-100.0, 100.0),
                    },
                }
            }
            Command::Bmp280 { period_ms } => {
                let link = Pinguino::acquire(arch, self.wait).await?;
                let period = Duration::from_millis(period_ms);
                tokio::spawn(source::supervise(
                    source::bmp280(link, period, tx.clone()),
                    tx,
                ));

                let mut graph = ScrollGraph::new(600, 1000.0);
                graph.add_trace(source::PRESSURE, 1100.0, 900.0, Color32::RED, 1.0)?;
                graph.add_trace(source::TEMPERATURE, 50.0, -50.0, Color32::BLUE, 3.0)?;
                Window::scroll("Pressure / Temperature", graph)
            }
            Command::Thermometer { period_ms, unit } => {
                let link = Pinguino::acquire(arch, self.wait).await?;
                let period = Duration::from_millis(period_ms);
                tokio::spawn(source::supervise(
                    source::thermometer(link, period, tx.clone()),
                    tx,
                ));

                Window {
                    title: "Temp18x20",
                    size: [400.0, 280.0],
                    view: View::Thermometer(Thermometer::new(unit)),
                }
            }
            Command::Demo { period_ms } => {
                let period = Duration::from_millis(period_ms);
                tokio::spawn(source::supervise(source::waveforms(period, tx.clone()), tx));

                let mut graph = ScrollGraph::new(300, 100.0);
                graph.add_trace(source::SINE, 1.0, -1.0, Color32::RED, 3.0)?;
                graph.add_trace(source::SAW, 100.0, 0.0, Color32::GREEN, 1.0)?;
                Window::scroll("Try Graph", graph)
            }
            Command::Analog {
                port,
                baud,
                divisor,
                samples,
                y_min,
                y_max,
            } => {
                let reader = serial::open(&port, baud)
                    .with_context(|| format!("Opening serial port {}", port))?;
                tokio::spawn(source::supervise(
                    source::analog(reader, divisor, tx.clone()),
                    tx,
                ));

                Window {
                    title: "Analog reading",
                    size: [640.0, 480.0],
                    view: View::Window {
                        window: RollingWindow::new(samples),
                        y_range: (y_min, y_max),
                    },
                }
            }
        };

        window.launch(rx)
    }
}

fn list(arch: Option<Architecture>) -> anyhow::Result<()> {
    let candidates = comm::find_devices(arch)?;

    if candidates.is_empty() {
        println!("No Pinguino found");
    }

    for candidate in candidates {
        println!(
            "{} Pinguino at bus {} address {}{}",
            candidate.arch,
            candidate.info.bus_number(),
            candidate.info.device_address(),
            candidate
                .info
                .product_string()
                .map(|product| format!(" ({})", product))
                .unwrap_or_default()
        );
    }

    Ok(())
}

async fn send(
    arch: Option<Architecture>,
    wait: bool,
    bytes: &[u8],
    limit: Duration,
) -> anyhow::Result<()> {
    let mut link = Pinguino::acquire(arch, wait).await?;
    let written = link
        .write(bytes, Some(limit))
        .await
        .context("Sending bytes to the board")?;
    info!(
        "Wrote {} of {} bytes to the {} board",
        written,
        bytes.len(),
        link.architecture()
    );
    link.close();

    Ok(())
}

/// A window to open once the source runs.
struct Window {
    title: &'static str,
    size: [f32; 2],
    view: View,
}

impl Window {
    /// Size the window around a graph plus the panels.
    fn scroll(title: &'static str, graph: ScrollGraph) -> Self {
        Self {
            title,
            size: [graph.width() as f32 + 40.0, graph.height() as f32 + 110.0],
            view: View::Scroll(graph),
        }
    }

    fn launch(self, samples: mpsc::Receiver<Sample>) -> anyhow::Result<()> {
        let mut native_options = eframe::NativeOptions::default();
        native_options.viewport.inner_size = Some(egui::vec2(self.size[0], self.size[1]));
        native_options.viewport.min_inner_size = Some(egui::vec2(300.0, 200.0));

        let title = self.title;
        let view = self.view;
        eframe::run_native(
            title,
            native_options,
            Box::new(move |_cc| Ok(Box::new(PlotApp::new(title, view, samples)))),
        )
        .map_err(|e| anyhow::anyhow!("Window failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_follow_sketches() {
        let cli = Cli::try_parse_from(["pinguino-plot", "bmp280"]).unwrap();
        assert!(matches!(cli.command, Command::Bmp280 { period_ms: 1000 }));
        assert_eq!(cli.arch, None);

        let cli = Cli::try_parse_from(["pinguino-plot", "thermometer", "--arch", "p8"]).unwrap();
        assert_eq!(cli.arch, Some(Board::P8));
        assert!(matches!(
            cli.command,
            Command::Thermometer {
                unit: TemperatureUnit::Fahrenheit,
                ..
            }
        ));
    }

    #[test]
    fn test_analog_limits() {
        let cli = Cli::try_parse_from([
            "pinguino-plot",
            "analog",
            "--divisor",
            "40",
            "--y-min",
            "-10",
            "--y-max",
            "40",
        ])
        .unwrap();

        let Command::Analog {
            port,
            divisor,
            y_min,
            y_max,
            ..
        } = cli.command
        else {
            panic!("not the analog command");
        };
        assert_eq!(port, "/dev/ttyUSB0");
        assert_eq!((divisor, y_min, y_max), (40.0, -10.0, 40.0));
    }

    #[test]
    fn test_send_bytes() {
        let cli = Cli::try_parse_from(["pinguino-plot", "send", "0x1F", "200"]).unwrap();
        assert!(matches!(cli.command, Command::Send { ref bytes, .. } if bytes == &[0x1F, 200]));

        assert!(Cli::try_parse_from(["pinguino-plot", "send"]).is_err());
        assert!(Cli::try_parse_from(["pinguino-plot", "send", "256"]).is_err());
    }

    #[test]
    fn test_window_fits_graph() {
        let window = Window::scroll("test", ScrollGraph::new(360, 200.0));
        assert_eq!(window.size, [400.0, 310.0]);
    }
}
