// Visit records and the CSV loader that produces them

use crate::error::{AnalysisError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

pub const URL_COLUMN: &str = "url";
pub const TITLE_COLUMN: &str = "title";
pub const VISIT_COUNT_COLUMN: &str = "visit_count";
pub const VISIT_TIME_COLUMN: &str = "visit_time";

/// One timestamped browsing event, in the order it appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisitRecord {
    pub url: String,
    pub title: String,
    pub visit_count: u64,
    pub visit_time: i64,
    /// 1-based line in the source file, 0 for records built in memory.
    #[serde(skip)]
    pub line: u64,
}

impl VisitRecord {
    pub fn new(url: impl Into<String>, title: impl Into<String>, visit_count: u64, visit_time: i64) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            visit_count,
            visit_time,
            line: 0,
        }
    }
}

struct ColumnMap {
    url: usize,
    title: usize,
    visit_count: usize,
    visit_time: usize,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| AnalysisError::malformed(1, format!("missing required column '{}'", name)))
        };

        Ok(Self {
            url: find(URL_COLUMN)?,
            title: find(TITLE_COLUMN)?,
            visit_count: find(VISIT_COUNT_COLUMN)?,
            visit_time: find(VISIT_TIME_COLUMN)?,
        })
    }
}

/// Load visit records from a CSV file on disk.
pub fn load_records(path: &Path) -> Result<Vec<VisitRecord>> {
    info!("Loading visit records from {}", path.display());

    let file = File::open(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_records(file)
}

/// Parse visit records from any CSV source.
///
/// The first row must be a header naming `url`, `title`, `visit_count` and
/// `visit_time`. Any row that cannot be read fails the whole load; rows are
/// returned in file order and never re-sorted.
pub fn parse_records<R: Read>(reader: R) -> Result<Vec<VisitRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = match csv_reader.headers() {
        Ok(headers) if headers.is_empty() => {
            debug!("Input has no header row, treating as empty");
            return Ok(Vec::new());
        }
        Ok(headers) => headers.clone(),
        Err(e) => return Err(read_error(e)),
    };
    let columns = ColumnMap::from_headers(&headers)?;

    let mut records: Vec<VisitRecord> = Vec::new();
    let mut regressions = 0usize;

    for row in csv_reader.records() {
        let row = row.map_err(read_error)?;
        let line = row.position().map_or(0, |p| p.line());
        let record = parse_row(&row, &columns, line)?;

        if let Some(prev) = records.last()
            && record.visit_time < prev.visit_time
        {
            regressions += 1;
        }

        records.push(record);
    }

    if regressions > 0 {
        warn!(
            "visit_time decreases {} time(s); rows are used in file order",
            regressions
        );
    }

    debug!("Loaded {} visit records", records.len());
    Ok(records)
}

/// A row the reader could not decode (bad UTF-8, broken quoting) is malformed
/// input at that row; only genuine I/O failures stay `Csv` errors.
fn read_error(err: csv::Error) -> AnalysisError {
    if matches!(err.kind(), csv::ErrorKind::Io(_)) {
        return err.into();
    }
    let line = err.position().map_or(0, |p| p.line());
    AnalysisError::malformed(line, err.to_string())
}

fn parse_row(row: &csv::StringRecord, columns: &ColumnMap, line: u64) -> Result<VisitRecord> {
    let field = |idx: usize, name: &str| {
        row.get(idx)
            .ok_or_else(|| AnalysisError::malformed(line, format!("missing {}", name)))
    };

    let url = field(columns.url, URL_COLUMN)?.trim();
    if url.is_empty() {
        return Err(AnalysisError::malformed(line, "empty url"));
    }

    let title = field(columns.title, TITLE_COLUMN)?;

    let raw_count = field(columns.visit_count, VISIT_COUNT_COLUMN)?.trim();
    let visit_count = raw_count.parse::<u64>().map_err(|_| {
        AnalysisError::malformed(
            line,
            format!("visit_count '{}' is not a non-negative integer", raw_count),
        )
    })?;

    let raw_time = field(columns.visit_time, VISIT_TIME_COLUMN)?.trim();
    let visit_time = raw_time.parse::<i64>().map_err(|_| {
        AnalysisError::malformed(line, format!("visit_time '{}' is not an integer", raw_time))
    })?;

    Ok(VisitRecord {
        url: url.to_string(),
        title: title.to_string(),
        visit_count,
        visit_time,
        line,
    })
}
