use std::collections::HashMap;

use eframe::egui::{self, Align2, Color32, RichText, Sense, Stroke, Ui};
use egui_plot::{Bar, BarChart, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Polygon, Text};
use palette::Srgb;

use covid_dash::chart::{ChartData, ChartDescription, ColorEncoding, Frame};
use covid_dash::color::ColorRange;
use covid_dash::data::model::{Field, WEEK_MAX, WEEK_MIN};
use covid_dash::geo;

const SCATTER_HEIGHT: f32 = 420.0;
const BAR_HEIGHT: f32 = 360.0;
const MIN_MARKER_RADIUS: f32 = 2.0;
const TILE_GAP: f64 = 0.04;
/// Space between a scatter marker and its label, in pixels.
const LABEL_GAP: f32 = 2.0;

fn to_color32(c: Srgb<u8>) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}

fn color_of(enc: &ColorEncoding, range: &ColorRange, value: Option<f64>) -> Color32 {
    to_color32(enc.scale.color_for(range, value.unwrap_or(f64::NAN)))
}

/// Vertical offset, in plot units, that puts a label's baseline just above a
/// marker of `radius` screen points.
fn label_lift(radius: f32, px_per_unit: f64) -> f64 {
    if px_per_unit > 0.0 && px_per_unit.is_finite() {
        f64::from(radius + LABEL_GAP) / px_per_unit
    } else {
        0.0
    }
}

fn axis_title(chart: &ChartDescription, x: bool) -> String {
    let axis = if x { &chart.x } else { &chart.y };
    axis.as_ref().map(|a| a.title.clone()).unwrap_or_default()
}

fn empty_note(ui: &mut Ui, chart: &ChartDescription, what: &str) {
    if chart.is_empty() {
        ui.label(RichText::new(format!("No data for {what}")).italics().weak());
    }
}

// ---------------------------------------------------------------------------
// Colour bar legend
// ---------------------------------------------------------------------------

/// Horizontal gradient for a colour encoding, labelled with the ends of the
/// range the chart is drawn with.
pub fn color_bar(ui: &mut Ui, enc: &ColorEncoding, range: &ColorRange) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(enc.field.header()).small().strong());
        ui.label(RichText::new(format!("{:.0}", range.start)).small());

        let (rect, _) = ui.allocate_exact_size(egui::vec2(180.0, 12.0), Sense::hover());
        let colors = enc.scale.gradient(48);
        let step = rect.width() / colors.len() as f32;
        for (i, c) in colors.iter().enumerate() {
            let cell = egui::Rect::from_min_size(
                egui::pos2(rect.left() + i as f32 * step, rect.top()),
                egui::vec2(step + 0.5, rect.height()),
            );
            ui.painter().rect_filled(cell, 0.0, to_color32(*c));
        }

        ui.label(RichText::new(format!("{:.0}", range.end)).small());
    });
}

// ---------------------------------------------------------------------------
// Scatter plot
// ---------------------------------------------------------------------------

/// Cases vs deaths, one marker per country.
pub fn scatter_plot(ui: &mut Ui, chart: &ChartDescription) {
    let ChartData::Scatter(rows) = &chart.data else {
        return;
    };
    let (Some(x), Some(y)) = (&chart.x, &chart.y) else {
        return;
    };

    let range = chart.color_range();
    color_bar(ui, &chart.color, &range);
    empty_note(ui, chart, "the selected weeks");

    let size = chart.size.as_ref();
    let size_max = size
        .map(|s| {
            rows.iter()
                .filter_map(|r| r.value(s.field))
                .fold(0.0_f64, f64::max)
        })
        .unwrap_or(0.0);

    // Country name → hover text.
    let hover: HashMap<String, String> = rows
        .iter()
        .map(|r| {
            let details: Vec<String> = chart
                .hover
                .iter()
                .filter_map(|f| r.value(*f).map(|v| format!("{f}: {v:.2}")))
                .collect();
            (r.country.clone(), details.join("\n"))
        })
        .collect();

    Plot::new(chart.slot.id())
        .height(SCATTER_HEIGHT)
        .x_axis_label(axis_title(chart, true))
        .y_axis_label(axis_title(chart, false))
        .include_x(0.0)
        .include_y(0.0)
        .label_formatter(move |name, value| match hover.get(name) {
            Some(details) => format!("{name}\nx: {:.2}\ny: {:.2}\n{details}", value.x, value.y),
            None => String::new(),
        })
        .show(ui, |plot_ui| {
            for row in rows {
                let (Some(px), Some(py)) = (row.value(x.field), row.value(y.field)) else {
                    continue;
                };

                // Marker area proportional to the size field.
                let radius = match size {
                    Some(s) if size_max > 0.0 => {
                        let v = row.value(s.field).unwrap_or(0.0).max(0.0);
                        let scaled = s.max_size / 2.0 * (v / size_max).sqrt() as f32;
                        scaled.max(MIN_MARKER_RADIUS)
                    }
                    _ => MIN_MARKER_RADIUS * 2.0,
                };

                plot_ui.points(
                    Points::new(vec![[px, py]])
                        .name(&row.country)
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(radius)
                        .color(color_of(&chart.color, &range, row.value(chart.color.field))),
                );

                // Label sits above the marker, not over it.
                if chart.text.is_some() {
                    let px_per_unit = plot_ui.transform().dpos_dvalue_y().abs();
                    let lift = label_lift(radius, px_per_unit);
                    let label = RichText::new(&row.country).small();
                    plot_ui.text(
                        Text::new(PlotPoint::new(px, py + lift), label)
                            .anchor(Align2::CENTER_BOTTOM),
                    );
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Bar chart
// ---------------------------------------------------------------------------

/// ICU patients per week for the selected country.
pub fn bar_plot(ui: &mut Ui, chart: &ChartDescription, country: &str) {
    let ChartData::Bar(rows) = &chart.data else {
        return;
    };
    let Some(y) = &chart.y else {
        return;
    };

    let range = chart.color_range();
    color_bar(ui, &chart.color, &range);
    empty_note(ui, chart, country);

    let bars: Vec<Bar> = rows
        .iter()
        .map(|r| {
            let details: Vec<String> = chart
                .hover
                .iter()
                .filter(|f| **f != Field::Week)
                .filter_map(|f| r.value(*f).map(|v| format!("{f}: {v:.1}")))
                .collect();
            Bar::new(f64::from(r.week), r.value(y.field).unwrap_or(0.0))
                .width(0.8)
                .fill(color_of(&chart.color, &range, r.value(chart.color.field)))
                .name(format!("Week {}\n{}", r.week, details.join("\n")))
        })
        .collect();

    Plot::new(chart.slot.id())
        .height(BAR_HEIGHT)
        .x_axis_label(axis_title(chart, true))
        .y_axis_label(axis_title(chart, false))
        .include_x(f64::from(WEEK_MIN) - 0.5)
        .include_x(f64::from(WEEK_MAX) + 0.5)
        .include_y(0.0)
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(country));
        });
}

// ---------------------------------------------------------------------------
// Choropleth (tile grid)
// ---------------------------------------------------------------------------

/// One weekly frame of the vaccination map; each country is a tile.
pub fn choropleth_plot(ui: &mut Ui, chart: &ChartDescription, frame: Option<&Frame>) {
    let range = chart.color_range();
    color_bar(ui, &chart.color, &range);
    empty_note(ui, chart, "any country");

    let height = chart
        .height
        .unwrap_or(BAR_HEIGHT)
        .min(ui.available_width());

    Plot::new(chart.slot.id())
        .height(height)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .include_x(-0.5)
        .include_x(10.5)
        .include_y(0.5)
        .include_y(-8.5)
        .show(ui, |plot_ui| {
            let Some(frame) = frame else {
                return;
            };
            for rec in &frame.rows {
                let Some(corners) = geo::tile_polygon(&rec.code, TILE_GAP) else {
                    log::trace!("no map tile for {} ({})", rec.country, rec.code);
                    continue;
                };
                let value = rec.value(chart.color.field);
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(corners.to_vec()))
                        .fill_color(color_of(&chart.color, &range, value))
                        .stroke(Stroke::new(1.0, Color32::DARK_GRAY))
                        .name(format!(
                            "{} ({}) week {}: {:.1}",
                            rec.country,
                            rec.code,
                            rec.week,
                            value.unwrap_or(f64::NAN)
                        )),
                );
                if let Some([cx, cy]) = geo::tile_center(&rec.code) {
                    let label = RichText::new(&rec.code).small().color(Color32::WHITE);
                    plot_ui.text(
                        Text::new(PlotPoint::new(cx, cy), label).anchor(Align2::CENTER_CENTER),
                    );
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_clear_the_marker() {
        // 4 screen points per unit: a 10pt marker plus the gap is 3 units.
        assert_eq!(label_lift(10.0, 4.0), 3.0);
        assert!(label_lift(20.0, 4.0) > label_lift(10.0, 4.0));
    }

    #[test]
    fn collapsed_axis_keeps_the_label_on_the_point() {
        assert_eq!(label_lift(10.0, 0.0), 0.0);
        assert_eq!(label_lift(10.0, f64::INFINITY), 0.0);
    }
}
