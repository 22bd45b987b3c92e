use std::sync::Arc;

use crate::chart::builder::{build_bar, build_choropleth, build_scatter};
use crate::chart::{ChartDescription, ChartSlot};
use crate::data::aggregate::{bar_aggregation, choropleth_aggregation, scatter_aggregation};
use crate::data::filter::{validate_country, validate_week_range};
use crate::data::model::{CountryChoice, Dataset, WeekRange};

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Identifier of the week-range control.
pub const WEEK_SLIDER: &str = "week_slider";
/// Identifier of the country selector.
pub const COUNTRY_RADIO: &str = "country_radio";

/// A value published by one of the two input controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    WeekSlider(WeekRange),
    CountryRadio(CountryChoice),
}

impl InputEvent {
    /// Identifier of the control that produced the event.
    pub fn source(&self) -> &'static str {
        match self {
            InputEvent::WeekSlider(_) => WEEK_SLIDER,
            InputEvent::CountryRadio(_) => COUNTRY_RADIO,
        }
    }
}

/// Where finished chart descriptions go.
pub trait DisplaySurface {
    /// Replace whatever is shown in `slot`.
    fn publish(&mut self, slot: ChartSlot, chart: ChartDescription);
}

// ---------------------------------------------------------------------------
// InteractionController
// ---------------------------------------------------------------------------

/// Binds control values to the aggregate → build pipeline of each chart.
///
/// Holds nothing but the shared dataset; every call is a pure function of
/// its input. Invalid selections are logged and rendered as empty charts.
#[derive(Debug, Clone)]
pub struct InteractionController {
    dataset: Arc<Dataset>,
}

impl InteractionController {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        InteractionController { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Scatter plot for a week range.
    pub fn update_scatter_plot(&self, weeks: &WeekRange) -> ChartDescription {
        let rows = match validate_week_range(weeks) {
            Ok(()) => scatter_aggregation(&self.dataset, weeks),
            Err(e) => {
                log::warn!("{}: {e}; rendering an empty scatter plot", WEEK_SLIDER);
                Vec::new()
            }
        };
        log::debug!("scatter_plot: {} countries for weeks {weeks}", rows.len());
        build_scatter(rows)
    }

    /// ICU bar chart for one country.
    pub fn update_bar_plot(&self, country: &CountryChoice) -> ChartDescription {
        let rows = match validate_country(&self.dataset, country) {
            Ok(()) => bar_aggregation(&self.dataset, country),
            Err(e) => {
                log::warn!("{}: {e}; rendering an empty bar plot", COUNTRY_RADIO);
                Vec::new()
            }
        };
        log::debug!("bar_plot: {} weeks for {country}", rows.len());
        build_bar(rows)
    }

    /// Vaccination map. The country only gets validated; the map shows every
    /// country regardless.
    pub fn update_choropleth_plot(&self, country: &CountryChoice) -> ChartDescription {
        if let Err(e) = validate_country(&self.dataset, country) {
            log::warn!("{}: {e}; choropleth shows all countries anyway", COUNTRY_RADIO);
        }
        let rows = choropleth_aggregation(&self.dataset, country);
        log::debug!("choropleth_plot: {} rows", rows.len());
        build_choropleth(rows)
    }

    /// Recompute the charts wired to the event's control and publish them.
    ///
    /// The week slider drives the scatter plot only; the country selector
    /// drives the bar chart and the map.
    pub fn dispatch(&self, event: &InputEvent, surface: &mut dyn DisplaySurface) {
        match event {
            InputEvent::WeekSlider(weeks) => {
                surface.publish(ChartSlot::ScatterPlot, self.update_scatter_plot(weeks));
            }
            InputEvent::CountryRadio(country) => {
                surface.publish(ChartSlot::BarPlot, self.update_bar_plot(country));
                surface.publish(
                    ChartSlot::ChoroplethPlot,
                    self.update_choropleth_plot(country),
                );
            }
        }
    }

    /// Publish all three charts for the controls' starting values.
    pub fn initial_render(
        &self,
        weeks: &WeekRange,
        country: &CountryChoice,
        surface: &mut dyn DisplaySurface,
    ) {
        self.dispatch(&InputEvent::WeekSlider(*weeks), surface);
        self.dispatch(&InputEvent::CountryRadio(country.clone()), surface);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::chart::ChartData;
    use crate::data::model::tests::record;

    #[derive(Default)]
    struct Recorder {
        published: Vec<ChartSlot>,
        latest: BTreeMap<ChartSlot, ChartDescription>,
    }

    impl DisplaySurface for Recorder {
        fn publish(&mut self, slot: ChartSlot, chart: ChartDescription) {
            assert_eq!(chart.slot, slot);
            self.published.push(slot);
            self.latest.insert(slot, chart);
        }
    }

    fn controller() -> InteractionController {
        let mut rows = Vec::new();
        for week in 1..=4 {
            let mut pt = record("Portugal", "PRT", week);
            pt.new_cases_per_million = 10.0 * f64::from(week);
            rows.push(pt);
            rows.push(record("Spain", "ESP", week));
        }
        InteractionController::new(Arc::new(Dataset::from_records(rows).unwrap()))
    }

    #[test]
    fn week_slider_only_touches_scatter() {
        let mut surface = Recorder::default();
        let event = InputEvent::WeekSlider(WeekRange::new(1, 2));
        controller().dispatch(&event, &mut surface);
        assert_eq!(surface.published, [ChartSlot::ScatterPlot]);

        let chart = &surface.latest[&ChartSlot::ScatterPlot];
        let ChartData::Scatter(rows) = &chart.data else {
            panic!("expected scatter data");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].new_cases_per_million, 15.0);
    }

    #[test]
    fn country_radio_touches_bar_and_map() {
        let mut surface = Recorder::default();
        let event = InputEvent::CountryRadio(CountryChoice::new("Spain"));
        controller().dispatch(&event, &mut surface);
        assert_eq!(
            surface.published,
            [ChartSlot::BarPlot, ChartSlot::ChoroplethPlot]
        );
        assert_eq!(surface.latest[&ChartSlot::BarPlot].data.row_count(), 4);
        assert_eq!(surface.latest[&ChartSlot::ChoroplethPlot].data.row_count(), 8);
    }

    #[test]
    fn invalid_selections_render_empty_charts() {
        let ctl = controller();
        assert!(ctl.update_scatter_plot(&WeekRange::new(5, 3)).is_empty());
        assert!(ctl.update_scatter_plot(&WeekRange::new(0, 30)).is_empty());
        assert!(ctl.update_bar_plot(&CountryChoice::new("Atlantis")).is_empty());
        let map = ctl.update_choropleth_plot(&CountryChoice::new("Atlantis"));
        assert_eq!(map.data.row_count(), ctl.dataset().len());
    }

    #[test]
    fn initial_render_fills_every_slot() {
        let mut surface = Recorder::default();
        let country = CountryChoice::new("Portugal");
        controller().initial_render(&WeekRange::full(), &country, &mut surface);
        assert_eq!(surface.latest.len(), ChartSlot::ALL.len());
        assert!(ChartSlot::ALL.iter().all(|s| surface.latest.contains_key(s)));
    }

    #[test]
    fn events_name_their_control() {
        assert_eq!(InputEvent::WeekSlider(WeekRange::full()).source(), "week_slider");
        assert_eq!(
            InputEvent::CountryRadio(CountryChoice::new("Spain")).source(),
            "country_radio"
        );
    }
}
