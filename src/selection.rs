use std::fs;
use std::path::Path;

use crate::catalog::{CatalogError, TleCatalog};
use crate::predict::Pass;

/// Concatenates the three-line records of `selected`, in selection order.
pub fn export_selection<S: AsRef<str>>(
    catalog: &TleCatalog,
    selected: &[S],
) -> Result<String, CatalogError> {
    let mut text = String::new();
    for key in selected {
        let key = key.as_ref();
        let record = catalog
            .get(key)
            .ok_or_else(|| CatalogError::UnknownSatellite(key.to_string()))?;
        text.push_str(&record.to_text());
    }
    Ok(text)
}

pub fn write_export(path: &Path, text: &str) -> Result<(), CatalogError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    log::info!("Exported selection to {}", path.display());
    Ok(())
}

/// Operator-side narrowing of a prediction. Unset bounds accept everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassFilter {
    pub min_peak_elevation_deg: Option<f64>,
    pub min_sunlit_fraction: Option<f64>,
    pub max_rise_offset_min: Option<f64>,
}

impl PassFilter {
    pub fn accepts(&self, pass: &Pass) -> bool {
        if let Some(min_peak) = self.min_peak_elevation_deg {
            match pass.peak_elevation_deg {
                Some(peak) if peak >= min_peak => {}
                _ => return false,
            }
        }
        if let Some(min_sunlit) = self.min_sunlit_fraction {
            if pass.sunlit_fraction < min_sunlit {
                return false;
            }
        }
        if let Some(max_offset) = self.max_rise_offset_min {
            if pass.rise_offset_min > max_offset {
                return false;
            }
        }
        true
    }

    /// Keeps accepted passes, preserving their order.
    pub fn apply(&self, passes: Vec<Pass>) -> Vec<Pass> {
        passes.into_iter().filter(|p| self.accepts(p)).collect()
    }
}
