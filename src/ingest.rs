//! CSV DataSource for miner power-profile logs
//!
//! Reads the step-test export format into a [`Series`]. The header must
//! carry six columns (any order, extra columns ignored):
//!
//! | Column                       | Sample field      | Missing cell        |
//! |------------------------------|-------------------|---------------------|
//! | `miner.seconds`              | `time`            | row dropped         |
//! | `miner.mode.power`           | `commanded_power` | row dropped         |
//! | `miner.summary.wattage`      | `actual_power`    | `None`              |
//! | `miner.temp.hash_board_max`  | `hash_board_temp` | `None`              |
//! | `miner.psu.temp_max`         | `psu_temp`        | `None`              |
//! | `miner.outage`               | `outage`          | `false`             |
//!
//! Cells that are present but not numeric become missing and are reported
//! once per column. Rows come back sorted by time.
//!
//! # Usage
//!
//! ```ignore
//! use powerstep::ingest;
//!
//! let loaded = ingest::load_csv("r2_39_2025-08-28T09_40_10.csv")?;
//! let result = powerstep::orchestrator::run(&loaded.series);
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{Sample, Series};

pub const SECONDS: &str = "miner.seconds";
pub const MODE_POWER: &str = "miner.mode.power";
pub const SUMMARY_WATTAGE: &str = "miner.summary.wattage";
pub const HASH_BOARD_TEMP: &str = "miner.temp.hash_board_max";
pub const PSU_TEMP: &str = "miner.psu.temp_max";
pub const OUTAGE: &str = "miner.outage";

pub const REQUIRED_COLUMNS: [&str; 6] = [
    SECONDS,
    MODE_POWER,
    SUMMARY_WATTAGE,
    HASH_BOARD_TEMP,
    PSU_TEMP,
    OUTAGE,
];

// ============================================================================
// Errors & Output
// ============================================================================

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV file is empty")]
    Empty,

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("no usable rows: {0}")]
    NoUsableRows(String),
}

/// A parsed series plus everything the loader had to say about it.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: Series,
    pub warnings: Vec<String>,
    /// Data rows in the file, excluding the header and blank lines.
    pub rows_read: usize,
    /// Rows discarded because time or commanded power was unusable.
    pub rows_dropped: usize,
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

// ============================================================================
// Column Mapping
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    seconds: usize,
    mode_power: usize,
    wattage: usize,
    hash_board_temp: usize,
    psu_temp: usize,
    outage: usize,
}

impl ColumnMap {
    fn from_header(header: &str) -> Result<Self, IngestError> {
        let columns: Vec<String> = csv_split(header.trim_start_matches('\u{feff}'))
            .into_iter()
            .map(|c| c.trim().to_string())
            .collect();
        let find = |name: &str| columns.iter().position(|c| c == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| find(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::MissingColumns(missing));
        }

        let index = |name: &str| find(name).unwrap_or_default();
        Ok(Self {
            seconds: index(SECONDS),
            mode_power: index(MODE_POWER),
            wattage: index(SUMMARY_WATTAGE),
            hash_board_temp: index(HASH_BOARD_TEMP),
            psu_temp: index(PSU_TEMP),
            outage: index(OUTAGE),
        })
    }
}

// ============================================================================
// Cell Coercion
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Cell {
    Value(f64),
    Blank,
    Invalid,
}

impl Cell {
    fn parse(raw: Option<&String>) -> Self {
        let text = raw.map(|s| s.trim()).unwrap_or("");
        if text.is_empty() || text.eq_ignore_ascii_case("nan") {
            return Cell::Blank;
        }
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Value(v),
            _ => Cell::Invalid,
        }
    }

    fn value(self) -> Option<f64> {
        match self {
            Cell::Value(v) => Some(v),
            _ => None,
        }
    }
}

fn parse_outage(raw: Option<&String>) -> bool {
    let text = raw.map(|s| s.trim()).unwrap_or("");
    text.eq_ignore_ascii_case("true") || text == "1"
}

/// Per-column count of present-but-unparseable cells.
#[derive(Debug, Default)]
struct CoercionCounts {
    seconds: usize,
    mode_power: usize,
    wattage: usize,
    hash_board_temp: usize,
    psu_temp: usize,
}

impl CoercionCounts {
    fn note(counter: &mut usize, cell: Cell) -> Cell {
        if cell == Cell::Invalid {
            *counter += 1;
        }
        cell
    }

    fn warnings(&self, total: usize) -> Vec<String> {
        [
            (SECONDS, self.seconds),
            (MODE_POWER, self.mode_power),
            (SUMMARY_WATTAGE, self.wattage),
            (HASH_BOARD_TEMP, self.hash_board_temp),
            (PSU_TEMP, self.psu_temp),
        ]
        .into_iter()
        .filter(|(_, n)| *n > 0)
        .map(|(column, n)| {
            format!("Converted {n}/{total} values to missing in '{column}' due to invalid numeric values")
        })
        .collect()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load and parse a CSV file from disk.
pub fn load_csv(path: impl AsRef<Path>) -> Result<LoadedSeries, IngestError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            IngestError::NotFound(path.to_path_buf())
        } else {
            IngestError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let loaded = parse_csv(&text)?;
    info!(
        file = %path.display(),
        rows = loaded.series.len(),
        dropped = loaded.rows_dropped,
        warnings = loaded.warnings.len(),
        "CSV loaded"
    );
    Ok(loaded)
}

/// Parse CSV text already in memory.
pub fn parse_csv(text: &str) -> Result<LoadedSeries, IngestError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or(IngestError::Empty)?;
    let map = ColumnMap::from_header(header)?;

    let mut counts = CoercionCounts::default();
    let mut samples = Vec::new();
    let mut rows_read = 0usize;
    let mut rows_dropped = 0usize;

    for (line_num, line) in lines.enumerate() {
        rows_read += 1;
        let fields = csv_split(line);

        let seconds =
            CoercionCounts::note(&mut counts.seconds, Cell::parse(fields.get(map.seconds)));
        let mode_power =
            CoercionCounts::note(&mut counts.mode_power, Cell::parse(fields.get(map.mode_power)));
        let wattage =
            CoercionCounts::note(&mut counts.wattage, Cell::parse(fields.get(map.wattage)));
        let hash_board = CoercionCounts::note(
            &mut counts.hash_board_temp,
            Cell::parse(fields.get(map.hash_board_temp)),
        );
        let psu = CoercionCounts::note(&mut counts.psu_temp, Cell::parse(fields.get(map.psu_temp)));

        let (Some(time), Some(commanded)) = (seconds.value(), mode_power.value()) else {
            debug!(line = line_num + 2, "Row dropped: unusable time or commanded power");
            rows_dropped += 1;
            continue;
        };

        samples.push(
            Sample::new(time, commanded, wattage.value())
                .with_temps(hash_board.value(), psu.value())
                .with_outage(parse_outage(fields.get(map.outage))),
        );
    }

    if rows_read == 0 {
        return Err(IngestError::NoUsableRows("header only, no data rows".to_string()));
    }
    if samples.is_empty() {
        return Err(IngestError::NoUsableRows(format!(
            "all {rows_read} rows lack a numeric '{SECONDS}' or '{MODE_POWER}'"
        )));
    }

    let mut warnings = counts.warnings(rows_read);
    if rows_dropped > 0 {
        warnings.push(format!(
            "Dropped {rows_dropped}/{rows_read} rows with missing '{SECONDS}' or '{MODE_POWER}'"
        ));
    }
    for w in &warnings {
        warn!("{w}");
    }

    Ok(LoadedSeries {
        series: Series::new(samples),
        warnings,
        rows_read,
        rows_dropped,
    })
}
