use eframe::egui::{self, Color32, FontId, RichText};
use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};

use crate::{
    app::{PlotApp, View},
    data::{ScrollGraph, Thermometer, clock_lines},
};

impl PlotApp {
    /// Draw the window.
    pub fn plot(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            ui.add_space(5.0);

            ui.horizontal(|ui| {
                match &self.stopped {
                    Some(reason) => ui.label(
                        RichText::new(format!("Stopped: {}", reason)).color(Color32::LIGHT_RED),
                    ),
                    None => ui.label(RichText::new(&self.title).color(Color32::LIGHT_GREEN)),
                };

                ui.separator();

                if ui.button("Clear").clicked() {
                    self.view.clear();
                }
            });

            ui.add_space(5.0);
        });

        egui::TopBottomPanel::bottom("quit").show(ctx, |ui| {
            ui.add_space(5.0);

            ui.vertical_centered(|ui| {
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.add_space(5.0);
        });

        match &self.view {
            View::Thermometer(thermometer) => show_thermometer(ctx, thermometer),
            View::Scroll(graph) => {
                egui::CentralPanel::default().show(ctx, |ui| show_scroll_graph(ui, graph));
            }
            View::Xy {
                trace,
                x_range,
                y_range,
            } => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    let line = Line::new("y", PlotPoints::from(trace.shown()))
                        .width(2.0)
                        .color(Color32::LIGHT_BLUE);
                    let bounds =
                        PlotBounds::from_min_max([x_range.0, y_range.0], [x_range.1, y_range.1]);

                    show_fixed(ui, "xy_plot", bounds, vec![line], false);
                });
            }
            View::Window { window, y_range } => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    let points = window.points();
                    let right = points.len().saturating_sub(1).max(1) as f64;
                    let line = Line::new("reading", PlotPoints::Owned(points))
                        .width(2.0)
                        .color(Color32::LIGHT_BLUE);
                    let bounds = PlotBounds::from_min_max([0.0, y_range.0], [right, y_range.1]);

                    show_fixed(ui, "window_plot", bounds, vec![line], false);
                });
            }
        }
    }
}

/// Show lines in a plot that keeps the given bounds.
fn show_fixed(ui: &mut egui::Ui, id: &str, bounds: PlotBounds, lines: Vec<Line<'_>>, legend: bool) {
    let mut plot = Plot::new(id)
        .width(ui.available_width())
        .height(ui.available_height())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false);

    if legend {
        plot = plot.legend(Legend::default()).show_axes(false);
    }

    plot.show(ui, |plot_ui| {
        plot_ui.set_plot_bounds(bounds);
        for line in lines {
            plot_ui.line(line);
        }
    });
}

fn show_scroll_graph(ui: &mut egui::Ui, graph: &ScrollGraph) {
    let bounds = PlotBounds::from_min_max([0.0, 0.0], [graph.width() as f64, graph.height()]);
    let lines = graph
        .traces()
        .iter()
        .map(|trace| {
            Line::new(trace.name(), PlotPoints::Owned(trace.points()))
                .width(trace.size())
                .color(trace.color())
        })
        .collect();

    show_fixed(ui, "scroll_graph", bounds, lines, true);
}

fn show_thermometer(ctx: &egui::Context, thermometer: &Thermometer) {
    let (date, time) = clock_lines(&chrono::Local::now());

    egui::CentralPanel::default()
        .frame(egui::Frame::new().fill(Color32::BLACK))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(10.0);
                ui.label(
                    RichText::new(date)
                        .font(FontId::proportional(24.0))
                        .strong()
                        .color(Color32::ORANGE),
                );
                ui.add_space(10.0);
                ui.label(
                    RichText::new(time)
                        .font(FontId::proportional(24.0))
                        .strong()
                        .color(Color32::GREEN),
                );
                ui.add_space(20.0);
                ui.label(
                    RichText::new(thermometer.reading().unwrap_or("--"))
                        .font(FontId::proportional(48.0))
                        .strong()
                        .color(Color32::YELLOW),
                );
            });
        });
}
