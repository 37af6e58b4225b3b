use eframe::egui;
use egui_plot::{Line, Plot};

use spacecraft_sim::sim::{simulate, SimConfig, SimEvent, TickOutput};
use spacecraft_sim::vehicle::{presets, SpacecraftConfig};

fn main() -> eframe::Result {
    let _ = spacecraft_sim::logger::init();

    let vehicle = presets::lunar_lander();
    let config = SimConfig { dt: 0.05, max_time: 600.0 };
    let (records, events) = match simulate(vehicle.clone(), &config) {
        Ok(r) => r,
        Err(e) => {
            log::error!("Invalid spacecraft configuration: {e}");
            (Vec::new(), Vec::new())
        }
    };

    let app = DescentViz { records, events, vehicle };
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native("Powered Descent", options, Box::new(|_| Ok(Box::new(app))))
}

struct DescentViz {
    records: Vec<TickOutput>,
    events: Vec<SimEvent>,
    vehicle: SpacecraftConfig,
}

fn series(sampled: &[&TickOutput], f: impl Fn(&TickOutput) -> f64) -> Vec<[f64; 2]> {
    sampled.iter().map(|r| [r.time, f(r)]).collect()
}

impl eframe::App for DescentViz {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let step = (self.records.len() / 2000).max(1);
        let sampled: Vec<&TickOutput> = self.records.iter().step_by(step).collect();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.heading(format!("{} over the {}", self.vehicle.name, self.vehicle.planet.name));
            let last = self.records.last();
            ui.label(format!(
                "Touchdown: {:.2} m/s  |  Propellant left: {:.0} kg  |  Events: {}  |  Flight: {:.0} s",
                last.map_or(0.0, |r| r.vertical_speed.abs()),
                last.map_or(0.0, |r| r.propellant_mass),
                self.events.len(),
                last.map_or(0.0, |r| r.time),
            ));
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let available = ui.available_size();
            let half_w = available.x / 2.0 - 8.0;
            let half_h = available.y / 2.0 - 8.0;

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Altitude (m)");
                    let points = series(&sampled, |r| r.altitude);
                    Plot::new("altitude")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Altitude", points));
                        });
                });

                ui.vertical(|ui| {
                    ui.label("Vertical speed (m/s)");
                    let points = series(&sampled, |r| r.vertical_speed);
                    Plot::new("vertical_speed")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Vertical speed", points));
                        });
                });
            });

            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.label("Throttle");
                    let points = series(&sampled, |r| r.throttle);
                    Plot::new("throttle")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .include_y(0.0)
                        .include_y(1.0)
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Throttle", points));
                        });
                });

                ui.vertical(|ui| {
                    ui.label("Propellant (kg)");
                    let main = series(&sampled, |r| r.propellant_mass);
                    let rcs = series(&sampled, |r| r.rcs_propellant_mass);
                    Plot::new("propellant")
                        .width(half_w)
                        .height(half_h)
                        .x_axis_label("Time (s)")
                        .show(ui, |plot_ui| {
                            plot_ui.line(Line::new("Main", main));
                            plot_ui.line(Line::new("RCS", rcs));
                        });
                });
            });
        });
    }
}
