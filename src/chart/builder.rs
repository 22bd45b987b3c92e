use std::collections::BTreeMap;

use crate::color::{ColorRange, ColorScale};
use crate::data::model::{Field, Record, ScatterRow};

use super::{
    Axis, ChartData, ChartDescription, ChartSlot, ColorEncoding, Frame, GeoEncoding, GeoScope,
    LocationMode, Mark, SizeEncoding, TextEncoding, TextPosition,
};

// ---------------------------------------------------------------------------
// Fixed styling
// ---------------------------------------------------------------------------

pub const SCATTER_COLOR_RANGE: ColorRange = ColorRange::new(0.0, 50.0);
/// Declared high-to-low, which is not a usable range: the bar colours
/// auto-range over the plotted hospital counts instead.
pub const BAR_COLOR_RANGE: ColorRange = ColorRange::new(500.0, 0.0);
pub const CHOROPLETH_COLOR_RANGE: ColorRange = ColorRange::new(0.0, 20.0);

/// Largest scatter marker, in pixels.
pub const SCATTER_MAX_MARKER: f32 = 20.0;
pub const CHOROPLETH_HEIGHT: f32 = 900.0;

fn axis(field: Field) -> Axis {
    Axis {
        field,
        title: field.header().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Cases vs deaths per country: size by GDP, colour by tests, country name
/// above each point.
pub fn build_scatter(rows: Vec<ScatterRow>) -> ChartDescription {
    ChartDescription {
        slot: ChartSlot::ScatterPlot,
        title: "New Cases and Deaths per Week".to_string(),
        mark: Mark::Point,
        x: Some(axis(Field::NewCasesPerMillion)),
        y: Some(axis(Field::NewDeathsPerMillion)),
        geo: None,
        color: ColorEncoding {
            field: Field::NewTestsPerThousand,
            scale: ColorScale::Inferno,
            range: SCATTER_COLOR_RANGE,
        },
        size: Some(SizeEncoding {
            field: Field::GdpPerCapita,
            max_size: SCATTER_MAX_MARKER,
        }),
        text: Some(TextEncoding {
            field: Field::Country,
            position: TextPosition::TopCenter,
        }),
        animation_frame: None,
        hover: vec![Field::GdpPerCapita, Field::NewTestsPerThousand],
        height: None,
        data: ChartData::Scatter(rows),
    }
}

/// ICU patients per week for one country, coloured by hospital patients.
pub fn build_bar(rows: Vec<Record>) -> ChartDescription {
    ChartDescription {
        slot: ChartSlot::BarPlot,
        title: "ICU Patients per Week".to_string(),
        mark: Mark::Bar,
        x: Some(axis(Field::Week)),
        y: Some(axis(Field::IcuPatientsPerMillion)),
        geo: None,
        color: ColorEncoding {
            field: Field::HospPatientsPerMillion,
            scale: ColorScale::Inferno,
            range: BAR_COLOR_RANGE,
        },
        size: None,
        text: None,
        animation_frame: None,
        hover: vec![
            Field::Week,
            Field::IcuPatientsPerMillion,
            Field::HospPatientsPerMillion,
        ],
        height: None,
        data: ChartData::Bar(rows),
    }
}

/// Vaccination map of Europe animated over weeks.
pub fn build_choropleth(rows: Vec<Record>) -> ChartDescription {
    ChartDescription {
        slot: ChartSlot::ChoroplethPlot,
        title: "How is Vaccination evolving in Europe?".to_string(),
        mark: Mark::GeoPolygon,
        x: None,
        y: None,
        geo: Some(GeoEncoding {
            locations: Field::Code,
            mode: LocationMode::Iso3,
            scope: GeoScope::Europe,
        }),
        color: ColorEncoding {
            field: Field::TotalVaccinationsPerHundred,
            scale: ColorScale::Inferno,
            range: CHOROPLETH_COLOR_RANGE,
        },
        size: None,
        text: None,
        animation_frame: Some(Field::Week),
        hover: vec![
            Field::Code,
            Field::Week,
            Field::TotalVaccinationsPerHundred,
        ],
        height: Some(CHOROPLETH_HEIGHT),
        data: ChartData::Choropleth(frames_by_week(rows)),
    }
}

/// Split rows into one frame per week, weeks ascending, row order kept
/// within a frame.
fn frames_by_week(rows: Vec<Record>) -> Vec<Frame> {
    let mut by_week: BTreeMap<u32, Vec<Record>> = BTreeMap::new();
    for rec in rows {
        by_week.entry(rec.week).or_default().push(rec);
    }
    by_week
        .into_iter()
        .map(|(week, rows)| Frame { week, rows })
        .collect()
}
