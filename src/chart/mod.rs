/// Chart layer: declarative chart descriptions and the builders that fill
/// them from aggregated tables.
///
/// A [`ChartDescription`] names what to draw (mark, encodings, colour axis,
/// animation key, hover fields) together with its data. It carries no
/// rendering code; the egui window and the JSON exporter both consume it.
pub mod builder;

use serde::Serialize;

use crate::color::{ColorRange, ColorScale};
use crate::data::model::{Field, Record, ScatterRow};

// ---------------------------------------------------------------------------
// Slots
// ---------------------------------------------------------------------------

/// Display slot a chart is published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartSlot {
    ScatterPlot,
    BarPlot,
    ChoroplethPlot,
}

impl ChartSlot {
    pub const ALL: [ChartSlot; 3] = [
        ChartSlot::ScatterPlot,
        ChartSlot::BarPlot,
        ChartSlot::ChoroplethPlot,
    ];

    /// Stable identifier of the slot.
    pub fn id(self) -> &'static str {
        match self {
            ChartSlot::ScatterPlot => "scatter_plot",
            ChartSlot::BarPlot => "bar_plot",
            ChartSlot::ChoroplethPlot => "choropleth_plot",
        }
    }
}

// ---------------------------------------------------------------------------
// Encodings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mark {
    Point,
    Bar,
    GeoPolygon,
}

/// Positional encoding on a cartesian axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub field: Field,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorEncoding {
    pub field: Field,
    pub scale: ColorScale,
    /// Declared range, serialized as declared. Draw with
    /// [`ChartDescription::color_range`].
    pub range: ColorRange,
}

/// Marker area proportional to the field, largest marker `max_size` pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeEncoding {
    pub field: Field,
    pub max_size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextPosition {
    #[serde(rename = "top center")]
    TopCenter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextEncoding {
    pub field: Field,
    pub position: TextPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LocationMode {
    #[serde(rename = "ISO-3")]
    Iso3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoScope {
    Europe,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoEncoding {
    pub locations: Field,
    pub mode: LocationMode,
    pub scope: GeoScope,
}

// ---------------------------------------------------------------------------
// Data payload
// ---------------------------------------------------------------------------

/// Rows of one animation frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub week: u32,
    pub rows: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum ChartData {
    Scatter(Vec<ScatterRow>),
    Bar(Vec<Record>),
    Choropleth(Vec<Frame>),
}

impl ChartData {
    /// Number of data rows, summed over frames.
    pub fn row_count(&self) -> usize {
        match self {
            ChartData::Scatter(rows) => rows.len(),
            ChartData::Bar(rows) => rows.len(),
            ChartData::Choropleth(frames) => frames.iter().map(|f| f.rows.len()).sum(),
        }
    }

    /// Every value of `field` in the payload, frames included.
    pub fn values(&self, field: Field) -> Vec<f64> {
        match self {
            ChartData::Scatter(rows) => rows.iter().filter_map(|r| r.value(field)).collect(),
            ChartData::Bar(rows) => rows.iter().filter_map(|r| r.value(field)).collect(),
            ChartData::Choropleth(frames) => frames
                .iter()
                .flat_map(|f| &f.rows)
                .filter_map(|r| r.value(field))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChartDescription
// ---------------------------------------------------------------------------

/// Everything a display surface needs to draw one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDescription {
    pub slot: ChartSlot,
    pub title: String,
    pub mark: Mark,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoEncoding>,
    pub color: ColorEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_frame: Option<Field>,
    pub hover: Vec<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    pub data: ChartData,
}

impl ChartDescription {
    pub fn is_empty(&self) -> bool {
        self.data.row_count() == 0
    }

    /// Colour-axis range to draw with: the declared range when it runs low
    /// to high, else the extent of the colour field over the data.
    pub fn color_range(&self) -> ColorRange {
        self.color.range.resolve(self.data.values(self.color.field))
    }
}
