//! Buffers behind the live views.

use std::collections::VecDeque;

use chrono::{DateTime, TimeZone};
use eframe::egui::Color32;
use egui_plot::PlotPoint;
use pinguino_protocol::Temperature;

use crate::error::Error;

/// One line of a [`ScrollGraph`].
///
/// Holds exactly one column per unit of graph width. Column 0 is the newest
/// sample; columns without a sample yet are NaN.
pub struct Trace {
    name: String,
    color: Color32,
    size: f32,
    scale: f64,
    offset: f64,
    columns: VecDeque<f64>,
}

impl Trace {
    fn new(
        name: &str,
        max: f64,
        min: f64,
        color: Color32,
        size: f32,
        width: usize,
        height: f64,
    ) -> Result<Self, Error> {
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        let span = high - low;
        if !span.is_finite() || span == 0.0 {
            return Err(Error::EmptyRange { min, max });
        }

        let scale = height / span;

        Ok(Self {
            name: name.to_string(),
            color,
            size,
            scale,
            offset: -scale * low,
            columns: VecDeque::from(vec![f64::NAN; width]),
        })
    }

    /// Shift right by one column and put `value` in front.
    fn scroll(&mut self, value: f64) {
        if self.columns.is_empty() {
            return;
        }
        self.columns.pop_back();
        self.columns.push_front(self.scale * value + self.offset);
    }

    fn clear(&mut self) {
        self.columns.iter_mut().for_each(|y| *y = f64::NAN);
    }

    /// Trace name, also used as legend.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    /// Line width in points.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Number of columns, always the graph width.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns in graph coordinates, `x` from 0 to width.
    pub fn points(&self) -> Vec<PlotPoint> {
        self.columns
            .iter()
            .enumerate()
            .map(|(x, &y)| PlotPoint { x: x as f64, y })
            .collect()
    }
}

/// A fixed-size graph that moves right by one column per sample.
pub struct ScrollGraph {
    width: usize,
    height: f64,
    traces: Vec<Trace>,
}

impl ScrollGraph {
    /// Create an empty graph of `width` columns.
    pub fn new(width: usize, height: f64) -> Self {
        Self {
            width,
            height,
            traces: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Add a trace mapping `min..max` onto the graph height.
    ///
    /// A trace of the same name is replaced.
    pub fn add_trace(
        &mut self,
        name: &str,
        max: f64,
        min: f64,
        color: Color32,
        size: f32,
    ) -> Result<(), Error> {
        let trace = Trace::new(name, max, min, color, size, self.width, self.height)?;

        match self.traces.iter_mut().find(|t| t.name == name) {
            Some(existing) => *existing = trace,
            None => self.traces.push(trace),
        }

        Ok(())
    }

    /// Add a new value to a trace.
    pub fn scroll(&mut self, name: &str, value: f64) -> Result<(), Error> {
        let trace = self
            .traces
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::UnknownTrace(name.to_string()))?;
        trace.scroll(value);
        Ok(())
    }

    /// Forget all samples, keeping the traces.
    pub fn clear(&mut self) {
        self.traces.iter_mut().for_each(Trace::clear);
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }
}

/// The last `capacity` readings, oldest first.
pub struct RollingWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    /// Create a window pre-filled with zeros.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            values: VecDeque::from(vec![0.0; capacity]),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.capacity);
    }

    pub fn points(&self) -> Vec<PlotPoint> {
        self.values
            .iter()
            .enumerate()
            .map(|(x, &y)| PlotPoint { x: x as f64, y })
            .collect()
    }
}

/// Points shown a whole frame at a time.
pub struct XyTrace {
    frame_len: usize,
    shown: Vec<PlotPoint>,
    incoming: Vec<PlotPoint>,
}

impl XyTrace {
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame_len: frame_len.max(1),
            shown: Vec::new(),
            incoming: Vec::with_capacity(frame_len),
        }
    }

    /// Add a point; completes the frame after `frame_len` points.
    pub fn push(&mut self, x: f64, y: f64) {
        self.incoming.push(PlotPoint { x, y });
        if self.incoming.len() >= self.frame_len {
            self.shown = std::mem::replace(&mut self.incoming, Vec::with_capacity(self.frame_len));
        }
    }

    /// The last complete frame.
    pub fn shown(&self) -> &[PlotPoint] {
        &self.shown
    }

    pub fn clear(&mut self) {
        self.shown.clear();
        self.incoming.clear();
    }
}

/// Label of the unit a thermometer sketch reports in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TemperatureUnit {
    Celsius,
    #[default]
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

/// Text of the thermometer window.
pub struct Thermometer {
    unit: TemperatureUnit,
    reading: Option<String>,
}

impl Thermometer {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self {
            unit,
            reading: None,
        }
    }

    /// Take a new reading; returns whether the displayed text changed.
    pub fn update(&mut self, temperature: &Temperature) -> bool {
        let text = format!("{} {}", temperature, self.unit.symbol());
        if self.reading.as_deref() == Some(text.as_str()) {
            return false;
        }
        self.reading = Some(text);
        true
    }

    /// The displayed temperature, if any was received.
    pub fn reading(&self) -> Option<&str> {
        self.reading.as_deref()
    }

    pub fn clear(&mut self) {
        self.reading = None;
    }
}

/// Date and time lines without leading zeros, e.g. `3/1/2017` and `9:05:07 PM`.
pub fn clock_lines<Tz: TimeZone>(now: &DateTime<Tz>) -> (String, String)
where
    Tz::Offset: std::fmt::Display,
{
    (
        now.format("%-m/%-d/%Y").to_string(),
        now.format("%-I:%M:%S %p").to_string(),
    )
}
