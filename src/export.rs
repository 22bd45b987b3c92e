use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::chart::{ChartDescription, ChartSlot};
use crate::controller::DisplaySurface;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize {slot}: {source}")]
    Json {
        slot: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Headless surface: keeps the latest chart per slot and writes them out as
/// `<slot id>.json`.
#[derive(Debug, Default)]
pub struct JsonExporter {
    charts: BTreeMap<ChartSlot, ChartDescription>,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every published chart into `dir`, creating it if needed.
    /// Returns the written paths in slot order.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.charts.len());
        for (slot, chart) in &self.charts {
            let json = serde_json::to_string_pretty(chart).map_err(|source| ExportError::Json {
                slot: slot.id(),
                source,
            })?;
            let path = dir.join(format!("{}.json", slot.id()));
            fs::write(&path, json).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
            log::info!("Wrote {} ({} rows)", path.display(), chart.data.row_count());
            written.push(path);
        }
        Ok(written)
    }
}

impl DisplaySurface for JsonExporter {
    fn publish(&mut self, slot: ChartSlot, chart: ChartDescription) {
        self.charts.insert(slot, chart);
    }
}
