use eframe::egui::{self, RichText, ScrollArea, Ui};

use covid_dash::data::model::{WeekRange, WEEK_MAX, WEEK_MIN};
use covid_dash::state::DashboardState;

fn week_label(week: f64) -> String {
    if week as u32 == WEEK_MIN {
        format!("Week {week}")
    } else {
        format!("{week}")
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Title and dataset summary.
pub fn top_bar(ui: &mut Ui, state: &DashboardState) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.heading(RichText::new("Covid 19 - Europe's overview in 2021").strong());
    });
    let ds = state.controller.dataset();
    ui.horizontal(|ui: &mut Ui| {
        let (rows, countries) = (ds.len(), ds.countries().len());
        ui.label(format!("{rows} rows, {countries} countries"));
        ui.separator();
        ui.label(format!("weeks {}", state.weeks));
        ui.separator();
        ui.label(state.country.name.as_str());
    });
}

// ---------------------------------------------------------------------------
// Week slider
// ---------------------------------------------------------------------------

/// Two sliders forming the week range; each one is bounded by the other so
/// the range never runs backwards.
pub fn week_slider(ui: &mut Ui, state: &mut DashboardState) {
    let mut min = state.weeks.min;
    let mut max = state.weeks.max;

    ui.horizontal(|ui: &mut Ui| {
        ui.label("From");
        ui.add(
            egui::Slider::new(&mut min, WEEK_MIN..=max)
                .step_by(1.0)
                .custom_formatter(|v, _| week_label(v)),
        );
        ui.label("to");
        ui.add(
            egui::Slider::new(&mut max, min..=WEEK_MAX)
                .step_by(1.0)
                .custom_formatter(|v, _| week_label(v)),
        );
    });

    state.set_weeks(WeekRange::new(min, max));
}

// ---------------------------------------------------------------------------
// Country selector
// ---------------------------------------------------------------------------

/// One radio button per country, in dataset order.
pub fn country_radio(ui: &mut Ui, state: &mut DashboardState) {
    ui.heading("Select Country");
    ui.separator();

    let countries = state.controller.dataset().countries().to_vec();
    let mut selected = state.country.name.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for country in &countries {
                ui.radio_value(
                    &mut selected,
                    country.clone(),
                    RichText::new(country).size(15.0),
                );
            }
        });

    state.select_country(&selected);
}

// ---------------------------------------------------------------------------
// Map animation controls
// ---------------------------------------------------------------------------

/// Play/pause and a frame slider over the map's weeks.
pub fn animation_controls(ui: &mut Ui, state: &mut DashboardState) {
    let frame_count = state.frames().len();
    if frame_count == 0 {
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        let label = if state.animation.playing {
            "⏸ Pause"
        } else {
            "▶ Play"
        };
        if ui.button(label).clicked() {
            state.animation.toggle();
        }

        let mut frame = state.animation.frame;
        ui.add(
            egui::Slider::new(&mut frame, 0..=frame_count - 1)
                .step_by(1.0)
                .show_value(false),
        );
        if frame != state.animation.frame {
            state.set_frame(frame);
        }

        if let Some(current) = state.current_frame() {
            ui.label(format!("WEEK = {}", current.week));
        }
    });
}
