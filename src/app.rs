use std::time::Instant;

use eframe::egui::{self, ScrollArea, Ui};

use covid_dash::chart::ChartSlot;
use covid_dash::state::DashboardState;

use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: DashboardState,
}

impl DashboardApp {
    pub fn new(state: DashboardState) -> Self {
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.tick(Instant::now());
        if self.state.animation.playing {
            ctx.request_repaint_after(self.state.animation.frame_duration);
        }

        // ---- Top panel: title ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        // ---- Left side panel: country selector ----
        egui::SidePanel::left("country_radio")
            .default_width(200.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::country_radio(ui, &mut self.state);
            });

        // ---- Central panel: the three charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.heading("New Cases and Deaths per Week");
                    if let Some(chart) = self.state.chart(ChartSlot::ScatterPlot) {
                        plot::scatter_plot(ui, chart);
                    }
                    panels::week_slider(ui, &mut self.state);
                    ui.separator();

                    ui.heading(
                        "How is the number of ICU Patients evolving Throughout Europe?",
                    );
                    if let Some(chart) = self.state.chart(ChartSlot::BarPlot) {
                        plot::bar_plot(ui, chart, &self.state.country.name);
                    }
                    ui.separator();

                    ui.heading("How is Vaccination evolving in Europe?");
                    panels::animation_controls(ui, &mut self.state);
                    if let Some(chart) = self.state.chart(ChartSlot::ChoroplethPlot) {
                        plot::choropleth_plot(ui, chart, self.state.current_frame());
                    }
                });
        });
    }
}
