use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use sgp4::Elements;

use crate::catalog::error::CatalogError;

/// Where a catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TleSource {
    /// One file of `0 `-prefixed three-line records.
    SingleFile(PathBuf),
    /// A directory of `.tle` files whose headers may lack the `0 ` prefix.
    Directory(PathBuf),
}

impl TleSource {
    /// Time since the source was last written. A directory is as old as its
    /// newest `.tle` file.
    pub fn age(&self) -> Result<Duration, CatalogError> {
        let modified = match self {
            TleSource::SingleFile(path) => {
                if !path.is_file() {
                    return Err(CatalogError::SourceNotFound(path.display().to_string()));
                }
                fs::metadata(path)?.modified()?
            }
            TleSource::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(CatalogError::SourceNotFound(dir.display().to_string()));
                }
                let mut newest: Option<std::time::SystemTime> = None;
                for path in tle_files(dir)? {
                    newest = newest.max(Some(fs::metadata(&path)?.modified()?));
                }
                newest.ok_or_else(|| {
                    CatalogError::SourceNotFound(format!("{} (no .tle files)", dir.display()))
                })?
            }
        };
        Ok(Utc::now() - DateTime::<Utc>::from(modified))
    }
}

fn tle_files(dir: &Path) -> Result<Vec<PathBuf>, CatalogError> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "tle"))
        .collect();
    files.sort();
    Ok(files)
}

/// How header lines are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    SingleFile,
    MultiFile,
}

/// A three-line element set. Each line is trimmed and ends with one `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleRecord {
    line0: String,
    line1: String,
    line2: String,
}

impl TleRecord {
    fn new(line0: &str, line1: &str, line2: &str) -> Option<Self> {
        line1.get(2..8)?;
        Some(Self {
            line0: format!("{line0}\n"),
            line1: format!("{line1}\n"),
            line2: format!("{line2}\n"),
        })
    }

    /// Catalog number plus classification, e.g. `25544U`.
    pub fn catalog_number(&self) -> &str {
        &self.line1[2..8]
    }

    pub fn name(&self) -> &str {
        let header = self.line0.trim_end();
        header.strip_prefix("0 ").unwrap_or(header).trim()
    }

    pub fn lines(&self) -> (&str, &str, &str) {
        (&self.line0, &self.line1, &self.line2)
    }

    pub fn to_text(&self) -> String {
        format!("{}{}{}", self.line0, self.line1, self.line2)
    }

    pub fn elements(&self) -> Result<Elements, CatalogError> {
        Elements::from_tle(
            Some(self.name().to_string()),
            self.line1.trim_end().as_bytes(),
            self.line2.trim_end().as_bytes(),
        )
        .map_err(|e| CatalogError::InvalidElements {
            satellite: self.name().to_string(),
            message: e.to_string(),
        })
    }
}

enum Line<'a> {
    Header(String),
    First(&'a str),
    Second(&'a str),
}

fn classify(line: &str, shape: SourceShape) -> Option<Line<'_>> {
    if line.starts_with('1') {
        return Some(Line::First(line));
    }
    if line.starts_with('2') {
        return Some(Line::Second(line));
    }
    match shape {
        SourceShape::SingleFile if line.starts_with('0') => Some(Line::Header(line.to_string())),
        SourceShape::SingleFile => None,
        SourceShape::MultiFile if line.starts_with('0') => Some(Line::Header(line.to_string())),
        SourceShape::MultiFile => Some(Line::Header(format!("0 {line}"))),
    }
}

/// Catalog of element sets keyed by catalog number.
#[derive(Debug, Default)]
pub struct TleCatalog {
    records: HashMap<String, TleRecord>,
}

impl TleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the catalog contents with everything found in `sources`.
    pub fn load(&mut self, sources: &[TleSource]) -> Result<usize, CatalogError> {
        self.records.clear();

        for source in sources {
            match source {
                TleSource::SingleFile(path) => {
                    if !path.is_file() {
                        return Err(CatalogError::SourceNotFound(path.display().to_string()));
                    }
                    let content = fs::read_to_string(path)?;
                    let count = self.insert_text(&content, SourceShape::SingleFile);
                    log::debug!("Parsed {} records from {}", count, path.display());
                }
                TleSource::Directory(dir) => self.load_directory(dir)?,
            }
        }

        log::info!("Loaded {} satellites", self.records.len());
        Ok(self.records.len())
    }

    fn load_directory(&mut self, dir: &Path) -> Result<(), CatalogError> {
        if !dir.is_dir() {
            return Err(CatalogError::SourceNotFound(dir.display().to_string()));
        }

        for path in tle_files(dir)? {
            match fs::read_to_string(&path) {
                Ok(content) => {
                    let count = self.insert_text(&content, SourceShape::MultiFile);
                    log::debug!("Parsed {} records from {}", count, path.display());
                }
                Err(e) => {
                    log::warn!("Failed to read TLE file {}: {}", path.display(), e);
                }
            }
        }

        Ok(())
    }

    /// Parses `content` and adds its records, returning how many were
    /// complete. A later record with the same key replaces an earlier one.
    pub fn insert_text(&mut self, content: &str, shape: SourceShape) -> usize {
        let mut header: Option<String> = None;
        let mut first: Option<&str> = None;
        let mut count = 0;

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some(kind) = classify(line, shape) else {
                continue;
            };

            match kind {
                Line::Header(h) => {
                    if header.is_some() {
                        log::debug!("Dropping incomplete record {:?}", header);
                    }
                    header = Some(h);
                    first = None;
                }
                Line::First(l1) => {
                    if header.is_none() || first.is_some() {
                        log::debug!("Dropping unexpected line 1: {}", l1);
                        header = None;
                        first = None;
                        continue;
                    }
                    first = Some(l1);
                }
                Line::Second(l2) => {
                    match (header.take(), first.take()) {
                        (Some(h), Some(l1)) => match TleRecord::new(&h, l1, l2) {
                            Some(record) => {
                                self.records
                                    .insert(record.catalog_number().to_string(), record);
                                count += 1;
                            }
                            None => log::debug!("Dropping record {:?}: line 1 too short", h),
                        },
                        _ => log::debug!("Dropping unexpected line 2: {}", l2),
                    }
                }
            }
        }

        if let Some(h) = header {
            log::debug!("Dropping incomplete record {:?} at end of input", h);
        }
        count
    }

    pub fn get(&self, catalog_number: &str) -> Option<&TleRecord> {
        self.records.get(catalog_number)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &TleRecord> {
        self.records.values()
    }
}
