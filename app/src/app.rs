use eframe::egui;
use log::warn;
use tokio::sync::mpsc::Receiver;

use crate::{
    data::{RollingWindow, ScrollGraph, Thermometer, XyTrace},
    source::Sample,
};

/// What the window shows.
pub enum View {
    /// Scrolling traces.
    Scroll(ScrollGraph),
    /// Whole frames of points within fixed bounds.
    Xy {
        trace: XyTrace,
        x_range: (f64, f64),
        y_range: (f64, f64),
    },
    /// The last few readings with fixed y limits.
    Window {
        window: RollingWindow,
        y_range: (f64, f64),
    },
    /// Date, time and temperature as text.
    Thermometer(Thermometer),
}

impl View {
    /// Forget received data.
    pub fn clear(&mut self) {
        match self {
            View::Scroll(graph) => graph.clear(),
            View::Xy { trace, .. } => trace.clear(),
            View::Window { window, .. } => window.clear(),
            View::Thermometer(thermometer) => thermometer.clear(),
        }
    }
}

/// The application that shows data of one demo sketch.
pub struct PlotApp {
    pub title: String,
    pub view: View,
    /// Why the source stopped, if it did.
    pub stopped: Option<String>,
    samples: Receiver<Sample>,
}

impl PlotApp {
    /// Create a new plot application.
    pub fn new(title: &str, view: View, samples: Receiver<Sample>) -> Self {
        Self {
            title: title.to_string(),
            view,
            stopped: None,
            samples,
        }
    }

    /// Apply one sample to the view.
    pub fn apply(&mut self, sample: Sample) {
        match (&mut self.view, sample) {
            (_, Sample::Stopped(reason)) => self.stopped = Some(reason),
            (View::Scroll(graph), Sample::Trace { name, value }) => {
                if let Err(e) = graph.scroll(name, value) {
                    warn!("Dropping sample: {}", e);
                }
            }
            (View::Xy { trace, .. }, Sample::Point { x, y }) => trace.push(x, y),
            (View::Window { window, .. }, Sample::Reading(value)) => window.push(value),
            (View::Thermometer(thermometer), Sample::Temperature(reading)) => {
                thermometer.update(&reading);
            }
            (_, sample) => warn!("Sample {:?} does not fit the view", sample),
        }
    }

    /// Apply everything received since the last frame.
    pub fn drain(&mut self) {
        while let Ok(sample) = self.samples.try_recv() {
            self.apply(sample);
        }
    }
}

impl eframe::App for PlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain();

        self.plot(ctx);

        ctx.request_repaint();
    }
}
