use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::chart::{ChartData, ChartDescription, ChartSlot, Frame};
use crate::controller::{DisplaySurface, InputEvent, InteractionController};
use crate::data::model::{CountryChoice, WeekRange};

// ---------------------------------------------------------------------------
// Published charts
// ---------------------------------------------------------------------------

/// Latest chart per slot, with a revision counter bumped on every publish.
#[derive(Debug, Default)]
pub struct PublishedCharts {
    charts: BTreeMap<ChartSlot, ChartDescription>,
    revisions: BTreeMap<ChartSlot, u64>,
}

impl PublishedCharts {
    pub fn get(&self, slot: ChartSlot) -> Option<&ChartDescription> {
        self.charts.get(&slot)
    }

    /// How many times `slot` has been published.
    pub fn revision(&self, slot: ChartSlot) -> u64 {
        self.revisions.get(&slot).copied().unwrap_or(0)
    }
}

impl DisplaySurface for PublishedCharts {
    fn publish(&mut self, slot: ChartSlot, chart: ChartDescription) {
        *self.revisions.entry(slot).or_default() += 1;
        self.charts.insert(slot, chart);
    }
}

// ---------------------------------------------------------------------------
// Map animation
// ---------------------------------------------------------------------------

/// Playback position over the choropleth's weekly frames.
#[derive(Debug, Clone)]
pub struct Animation {
    pub frame: usize,
    pub playing: bool,
    pub frame_duration: Duration,
    last_step: Option<Instant>,
}

impl Animation {
    pub fn new(frame_duration: Duration) -> Self {
        Animation {
            frame: 0,
            playing: false,
            frame_duration,
            last_step: None,
        }
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
        self.last_step = None;
    }

    /// Advance one frame (wrapping) once `frame_duration` has elapsed.
    /// Returns whether the frame changed.
    pub fn tick(&mut self, now: Instant, frame_count: usize) -> bool {
        if !self.playing || frame_count == 0 {
            return false;
        }
        match self.last_step {
            None => {
                self.last_step = Some(now);
                false
            }
            Some(last) if now.duration_since(last) >= self.frame_duration => {
                self.frame = (self.frame + 1) % frame_count;
                self.last_step = Some(now);
                true
            }
            Some(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct DashboardState {
    pub controller: InteractionController,

    /// Current week-slider value.
    pub weeks: WeekRange,

    /// Current country-selector value.
    pub country: CountryChoice,

    /// Charts as last published by the controller.
    pub charts: PublishedCharts,

    pub animation: Animation,
}

impl DashboardState {
    /// Build the state and publish all three charts for the starting values.
    pub fn new(
        controller: InteractionController,
        weeks: WeekRange,
        country: CountryChoice,
        frame_duration: Duration,
    ) -> Self {
        let mut charts = PublishedCharts::default();
        controller.initial_render(&weeks, &country, &mut charts);
        DashboardState {
            controller,
            weeks,
            country,
            charts,
            animation: Animation::new(frame_duration),
        }
    }

    /// Week slider moved. Recomputes the scatter plot only when the value
    /// actually changed.
    pub fn set_weeks(&mut self, weeks: WeekRange) {
        if weeks == self.weeks {
            return;
        }
        self.weeks = weeks;
        let event = InputEvent::WeekSlider(weeks);
        self.controller.dispatch(&event, &mut self.charts);
    }

    /// Country selector changed. Recomputes the bar chart and the map.
    pub fn select_country(&mut self, name: &str) {
        if name == self.country.name {
            return;
        }
        self.country = CountryChoice::new(name);
        let event = InputEvent::CountryRadio(self.country.clone());
        self.controller.dispatch(&event, &mut self.charts);
        self.clamp_frame();
    }

    pub fn chart(&self, slot: ChartSlot) -> Option<&ChartDescription> {
        self.charts.get(slot)
    }

    /// Weekly frames of the published map.
    pub fn frames(&self) -> &[Frame] {
        match self.chart(ChartSlot::ChoroplethPlot).map(|c| &c.data) {
            Some(ChartData::Choropleth(frames)) => frames,
            _ => &[],
        }
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames().get(self.animation.frame)
    }

    /// Jump the map to a frame index (clamped).
    pub fn set_frame(&mut self, frame: usize) {
        self.animation.frame = frame;
        self.clamp_frame();
    }

    /// Advance the map animation; returns whether the frame changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let count = self.frames().len();
        self.animation.tick(now, count)
    }

    fn clamp_frame(&mut self) {
        let count = self.frames().len();
        self.animation.frame = self.animation.frame.min(count.saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::model::tests::record;
    use crate::data::model::Dataset;

    fn state() -> DashboardState {
        let mut rows = Vec::new();
        for week in 1..=3 {
            rows.push(record("Portugal", "PRT", week));
            rows.push(record("Spain", "ESP", week));
        }
        let controller = InteractionController::new(Arc::new(Dataset::from_records(rows).unwrap()));
        DashboardState::new(
            controller,
            WeekRange::full(),
            CountryChoice::new("Portugal"),
            Duration::from_millis(100),
        )
    }

    #[test]
    fn starts_with_every_chart_published_once() {
        let st = state();
        for slot in ChartSlot::ALL {
            assert_eq!(st.charts.revision(slot), 1, "{}", slot.id());
        }
        assert_eq!(st.frames().len(), 3);
    }

    #[test]
    fn week_change_leaves_bar_and_map_alone() {
        let mut st = state();
        st.set_weeks(WeekRange::new(2, 3));
        assert_eq!(st.charts.revision(ChartSlot::ScatterPlot), 2);
        assert_eq!(st.charts.revision(ChartSlot::BarPlot), 1);
        assert_eq!(st.charts.revision(ChartSlot::ChoroplethPlot), 1);

        // Same value again is not an event.
        st.set_weeks(WeekRange::new(2, 3));
        assert_eq!(st.charts.revision(ChartSlot::ScatterPlot), 2);
    }

    #[test]
    fn country_change_leaves_scatter_alone() {
        let mut st = state();
        st.select_country("Spain");
        assert_eq!(st.charts.revision(ChartSlot::ScatterPlot), 1);
        assert_eq!(st.charts.revision(ChartSlot::BarPlot), 2);
        assert_eq!(st.charts.revision(ChartSlot::ChoroplethPlot), 2);
        let bar = st.chart(ChartSlot::BarPlot).unwrap();
        let ChartData::Bar(rows) = &bar.data else {
            panic!("expected bar data");
        };
        assert!(rows.iter().all(|r| r.country == "Spain"));
    }

    #[test]
    fn animation_wraps_after_last_week() {
        let mut st = state();
        let t0 = Instant::now();
        assert!(!st.tick(t0), "paused animation never advances");

        st.animation.toggle();
        assert!(!st.tick(t0), "first tick only arms the timer");
        assert!(!st.tick(t0 + Duration::from_millis(50)));
        assert!(st.tick(t0 + Duration::from_millis(100)));
        assert_eq!(st.current_frame().map(|f| f.week), Some(2));
        assert!(st.tick(t0 + Duration::from_millis(200)));
        assert!(st.tick(t0 + Duration::from_millis(300)));
        assert_eq!(st.current_frame().map(|f| f.week), Some(1));
    }

    #[test]
    fn frame_jump_is_clamped() {
        let mut st = state();
        st.set_frame(99);
        assert_eq!(st.animation.frame, 2);
        assert_eq!(st.current_frame().map(|f| f.week), Some(3));
    }
}
