//! CSV bulk transfer: row parsing, validation and the import result report.
//!
//! This module is pure. It turns an uploaded CSV byte buffer into typed,
//! validated rows (collecting per-row failures) and formats export rows. The
//! database side of an import lives in the repository layer.
//!
//! Timetable cells use the grammar `subject name | teacher email [| room]`.
//! Empty cells and the markers `none`, `-` and `空` mean "no lesson".

use serde::Serialize;

use crate::timetable::{parse_class_label, ClassLabel, DayOfWeek, MAX_PERIOD, MIN_PERIOD};
use crate::types::Timestamp;

// ── Constants ────────────────────────────────────────────────────────

/// Header row of a subject file, in column order.
pub const SUBJECT_HEADERS: [&str; 8] = [
    "subject_code",
    "class",
    "room",
    "subject_name",
    "work_type",
    "teacher1",
    "teacher2",
    "teacher3",
];

/// Number of columns in a timetable file: the class label plus 5 days x 4 periods.
pub const TIMETABLE_COLUMNS: usize = 1 + 5 * 4;

/// Cell values that mean "no lesson in this slot".
pub const EMPTY_CELL_MARKERS: &[&str] = &["none", "-", "空"];

/// Separator between the parts of a timetable cell.
pub const CELL_SEPARATOR: char = '|';

/// Only files with this extension are accepted for import.
pub const CSV_EXTENSION: &str = "csv";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ── Errors ───────────────────────────────────────────────────────────

/// A failure that aborts the whole import before any row is processed.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("CSV file is empty")]
    Empty,

    #[error("CSV file has a header row but no data rows")]
    NoDataRows,

    #[error("CSV header has {found} columns, expected at least {expected}")]
    MissingColumns { expected: usize, found: usize },

    #[error("CSV file could not be parsed: {0}")]
    Malformed(String),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Malformed(err.to_string())
    }
}

// ── Import result ────────────────────────────────────────────────────

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportErrorRow {
    /// 1-based line number in the file, header included.
    pub row: usize,
    pub error: String,
    /// The raw row, re-joined with commas.
    pub data: String,
}

/// Summary of an import run returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub success: bool,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub error_rows: Vec<ImportErrorRow>,
    pub errors: Vec<String>,
    pub processed_at: Timestamp,
}

impl ImportResult {
    pub fn new(total_rows: usize) -> Self {
        Self {
            success: true,
            total_rows,
            processed_rows: 0,
            error_rows: Vec::new(),
            errors: Vec::new(),
            processed_at: chrono::Utc::now(),
        }
    }

    pub fn record_success(&mut self) {
        self.processed_rows += 1;
    }

    pub fn record_error(&mut self, error_row: ImportErrorRow) {
        self.errors
            .push(format!("Row {}: {}", error_row.row, error_row.error));
        self.error_rows.push(error_row);
        self.success = false;
    }

    /// Put errors in file order. Validation and save failures are recorded
    /// in separate passes, so they arrive interleaved.
    pub fn finish(mut self) -> Self {
        self.error_rows.sort_by_key(|e| e.row);
        self.errors = self
            .error_rows
            .iter()
            .map(|e| format!("Row {}: {}", e.row, e.error))
            .collect();
        self
    }
}

/// Validated rows plus the rows that failed validation.
#[derive(Debug)]
pub struct ParsedRows<T> {
    pub total_rows: usize,
    pub rows: Vec<T>,
    pub rejected: Vec<ImportErrorRow>,
}

// ── Row types ────────────────────────────────────────────────────────

/// One validated line of a subject file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRow {
    pub line: usize,
    pub subject_code: String,
    pub class: ClassLabel,
    pub room: Option<String>,
    pub subject_name: String,
    pub work_type: Option<String>,
    /// Non-empty teacher names, in column order (at least one).
    pub teachers: Vec<String>,
    pub raw: String,
}

/// One lesson parsed from a timetable cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableCell {
    pub day: DayOfWeek,
    pub period: i16,
    pub subject_name: String,
    pub teacher_email: String,
    pub room: Option<String>,
}

/// One validated line of a timetable file: a class's full week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableRow {
    pub line: usize,
    pub class: ClassLabel,
    pub cells: Vec<TimetableCell>,
    pub raw: String,
}

// ── Headers and slots ────────────────────────────────────────────────

/// Day/period for each timetable column after the class label, in file order.
pub fn timetable_slots() -> Vec<(DayOfWeek, i16)> {
    DayOfWeek::ALL
        .iter()
        .flat_map(|day| (MIN_PERIOD..=MAX_PERIOD).map(move |p| (*day, p)))
        .collect()
}

/// Header row of a timetable file: `class, mon1 .. fri4`.
pub fn timetable_headers() -> Vec<String> {
    std::iter::once("class".to_string())
        .chain(
            timetable_slots()
                .into_iter()
                .map(|(day, period)| format!("{}{period}", day.short())),
        )
        .collect()
}

/// Whether an uploaded filename carries the accepted extension.
pub fn has_csv_extension(filename: &str) -> bool {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
}

// ── Cell grammar ─────────────────────────────────────────────────────

fn is_empty_cell(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty()
        || EMPTY_CELL_MARKERS
            .iter()
            .any(|marker| cell.eq_ignore_ascii_case(marker))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Parse one timetable cell. Returns `Ok(None)` for an empty slot.
pub fn parse_cell(
    cell: &str,
    day: DayOfWeek,
    period: i16,
) -> Result<Option<TimetableCell>, String> {
    if is_empty_cell(cell) {
        return Ok(None);
    }

    let parts: Vec<&str> = cell.split(CELL_SEPARATOR).map(str::trim).collect();
    let slot = format!("{}{period}", day.short());

    let subject_name = parts[0];
    if subject_name.is_empty() {
        return Err(format!("{slot}: subject name is required"));
    }

    let teacher_email = parts.get(1).copied().unwrap_or_default();
    if teacher_email.is_empty() {
        return Err(format!(
            "{slot}: teacher is required (expected 'subject | teacher email')"
        ));
    }
    if !teacher_email.contains('@') {
        return Err(format!("{slot}: '{teacher_email}' is not a teacher email"));
    }

    if parts.len() > 3 {
        return Err(format!("{slot}: too many '|' separated parts"));
    }

    Ok(Some(TimetableCell {
        day,
        period,
        subject_name: subject_name.to_string(),
        teacher_email: teacher_email.to_string(),
        room: parts.get(2).and_then(|r| non_empty(r)),
    }))
}

/// Format one lesson using the cell grammar, for export.
pub fn format_cell(subject_name: &str, teacher_email: &str, room: Option<&str>) -> String {
    match room.filter(|r| !r.is_empty()) {
        Some(room) => format!("{subject_name} | {teacher_email} | {room}"),
        None => format!("{subject_name} | {teacher_email}"),
    }
}

// ── File parsing ─────────────────────────────────────────────────────

/// Read every data record from a CSV buffer, checking the header width.
///
/// Each record is returned with its 1-based starting line number.
fn read_records(
    data: &[u8],
    expected_columns: usize,
) -> Result<Vec<(usize, csv::StringRecord)>, ImportError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(ImportError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let header_len = reader.headers()?.len();
    if header_len < expected_columns {
        return Err(ImportError::MissingColumns {
            expected: expected_columns,
            found: header_len,
        });
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(records.len() + 2);
        records.push((line, record));
    }

    if records.is_empty() {
        return Err(ImportError::NoDataRows);
    }
    Ok(records)
}

fn raw_row(record: &csv::StringRecord) -> String {
    record.iter().collect::<Vec<_>>().join(",")
}

fn reject(line: usize, error: impl Into<String>, record: &csv::StringRecord) -> ImportErrorRow {
    ImportErrorRow {
        row: line,
        error: error.into(),
        data: raw_row(record),
    }
}

fn subject_row(line: usize, record: &csv::StringRecord) -> Result<SubjectRow, String> {
    if record.len() < SUBJECT_HEADERS.len() {
        return Err(format!(
            "Expected {} columns, found {}",
            SUBJECT_HEADERS.len(),
            record.len()
        ));
    }
    let field = |i: usize| record.get(i).unwrap_or_default();

    let subject_code = field(0);
    if subject_code.is_empty() {
        return Err("Subject code is required".into());
    }
    if field(1).is_empty() {
        return Err("Class is required".into());
    }
    let subject_name = field(3);
    if subject_name.is_empty() {
        return Err("Subject name is required".into());
    }
    if field(5).is_empty() {
        return Err("teacher1 is required".into());
    }
    let teachers: Vec<String> = (5..8).filter_map(|i| non_empty(field(i))).collect();

    let class = parse_class_label(field(1))?;

    Ok(SubjectRow {
        line,
        subject_code: subject_code.to_string(),
        class,
        room: non_empty(field(2)),
        subject_name: subject_name.to_string(),
        work_type: non_empty(field(4)),
        teachers,
        raw: raw_row(record),
    })
}

fn timetable_row(line: usize, record: &csv::StringRecord) -> Result<TimetableRow, String> {
    if record.len() < TIMETABLE_COLUMNS {
        return Err(format!(
            "Expected {TIMETABLE_COLUMNS} columns, found {}",
            record.len()
        ));
    }

    let class = parse_class_label(record.get(0).unwrap_or_default())?;

    let mut cells = Vec::new();
    for (i, (day, period)) in timetable_slots().into_iter().enumerate() {
        let cell = record.get(i + 1).unwrap_or_default();
        if let Some(parsed) = parse_cell(cell, day, period)? {
            cells.push(parsed);
        }
    }

    Ok(TimetableRow {
        line,
        class,
        cells,
        raw: raw_row(record),
    })
}

fn parse_rows<T>(
    data: &[u8],
    expected_columns: usize,
    parse: impl Fn(usize, &csv::StringRecord) -> Result<T, String>,
) -> Result<ParsedRows<T>, ImportError> {
    let records = read_records(data, expected_columns)?;
    let total_rows = records.len();

    let mut rows = Vec::new();
    let mut rejected = Vec::new();
    for (line, record) in &records {
        match parse(*line, record) {
            Ok(row) => rows.push(row),
            Err(error) => rejected.push(reject(*line, error, record)),
        }
    }

    Ok(ParsedRows {
        total_rows,
        rows,
        rejected,
    })
}

/// Parse and validate a subject file.
pub fn parse_subject_rows(data: &[u8]) -> Result<ParsedRows<SubjectRow>, ImportError> {
    parse_rows(data, SUBJECT_HEADERS.len(), subject_row)
}

/// Parse and validate a timetable file.
pub fn parse_timetable_rows(data: &[u8]) -> Result<ParsedRows<TimetableRow>, ImportError> {
    parse_rows(data, TIMETABLE_COLUMNS, timetable_row)
}

// ── Export ───────────────────────────────────────────────────────────

/// Write a header and data rows to an in-memory CSV document.
pub fn write_csv<H, R, F>(headers: H, rows: R) -> Result<Vec<u8>, csv::Error>
where
    H: IntoIterator,
    H::Item: AsRef<[u8]>,
    R: IntoIterator<Item = F>,
    F: IntoIterator,
    F::Item: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const SUBJECT_HEADER: &str =
        "subject_code,class,room,subject_name,work_type,teacher1,teacher2,teacher3";

    fn timetable_line(class: &str, cells: &[(usize, &str)]) -> String {
        let mut columns = vec![String::new(); TIMETABLE_COLUMNS];
        columns[0] = class.to_string();
        for (index, value) in cells {
            columns[*index] = value.to_string();
        }
        columns.join(",")
    }

    #[test]
    fn timetable_headers_cover_week() {
        let headers = timetable_headers();
        assert_eq!(headers.len(), TIMETABLE_COLUMNS);
        assert_eq!(headers[0], "class");
        assert_eq!(headers[1], "mon1");
        assert_eq!(headers[4], "mon4");
        assert_eq!(headers[5], "tue1");
        assert_eq!(headers[20], "fri4");
    }

    #[test]
    fn csv_extension_check() {
        assert!(has_csv_extension("subjects.csv"));
        assert!(has_csv_extension("TIMETABLE.CSV"));
        assert!(!has_csv_extension("timetable.xlsx"));
        assert!(!has_csv_extension("csv"));
    }

    #[test]
    fn cell_grammar() {
        let cell = parse_cell("Math | tanaka@school.test | R101", DayOfWeek::Monday, 1)
            .unwrap()
            .unwrap();
        assert_eq!(cell.subject_name, "Math");
        assert_eq!(cell.teacher_email, "tanaka@school.test");
        assert_eq!(cell.room.as_deref(), Some("R101"));

        let no_room = parse_cell("Art|sato@school.test", DayOfWeek::Friday, 4)
            .unwrap()
            .unwrap();
        assert_eq!(no_room.room, None);
    }

    #[test]
    fn empty_markers_produce_no_lesson() {
        for marker in ["", "  ", "none", "NONE", "-", "空"] {
            assert_eq!(parse_cell(marker, DayOfWeek::Monday, 1).unwrap(), None);
        }
    }

    #[test]
    fn cell_without_teacher_is_rejected() {
        let err = parse_cell("Math", DayOfWeek::Tuesday, 2).unwrap_err();
        assert!(err.starts_with("tue2: teacher is required"));
        assert!(parse_cell("Math | Tanaka", DayOfWeek::Tuesday, 2).is_err());
    }

    #[test]
    fn format_cell_round_trips() {
        let text = format_cell("Math", "t@school.test", Some("R1"));
        let parsed = parse_cell(&text, DayOfWeek::Monday, 1).unwrap().unwrap();
        assert_eq!(parsed.room.as_deref(), Some("R1"));
        assert_eq!(format_cell("Math", "t@school.test", None), "Math | t@school.test");
    }

    #[test]
    fn empty_file_is_fatal() {
        assert_matches!(parse_subject_rows(b""), Err(ImportError::Empty));
        assert_matches!(parse_subject_rows(b"\xEF\xBB\xBF\n"), Err(ImportError::Empty));
    }

    #[test]
    fn header_only_is_fatal() {
        let data = format!("{SUBJECT_HEADER}\n");
        assert_matches!(
            parse_subject_rows(data.as_bytes()),
            Err(ImportError::NoDataRows)
        );
    }

    #[test]
    fn narrow_header_is_fatal() {
        assert_matches!(
            parse_timetable_rows(b"class,mon1\n1-A,Math\n"),
            Err(ImportError::MissingColumns { expected: 21, found: 2 })
        );
    }

    #[test]
    fn subject_rows_collect_per_row_errors() {
        let data = format!(
            "{SUBJECT_HEADER}\n\
             MATH1,1-A,R101,Math,full,Tanaka,,\n\
             ENG1,1-B,,,full,Sato,,\n\
             SCI1,2-A,Lab,Science,,Suzuki,Kato,\n"
        );
        let parsed = parse_subject_rows(data.as_bytes()).unwrap();

        assert_eq!(parsed.total_rows, 3);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].row, 3);
        assert_eq!(parsed.rejected[0].error, "Subject name is required");
        assert_eq!(parsed.rejected[0].data, "ENG1,1-B,,,full,Sato,,");

        let science = &parsed.rows[1];
        assert_eq!(science.line, 4);
        assert_eq!(science.class.grade, 2);
        assert_eq!(science.teachers, vec!["Suzuki", "Kato"]);
        assert_eq!(science.work_type, None);
    }

    #[test]
    fn subject_row_checks_class_and_columns() {
        let data = format!("{SUBJECT_HEADER}\nX1,9-A,,X,,T,,\nX2,1-A,,X\n");
        let parsed = parse_subject_rows(data.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 0);
        assert!(parsed.rejected[0].error.contains("Grade must be between 1 and 5"));
        assert_eq!(parsed.rejected[1].error, "Expected 8 columns, found 4");
    }

    #[test]
    fn bom_is_stripped() {
        let data = format!("\u{feff}{SUBJECT_HEADER}\nM,1-A,,Math,,T,,\n");
        let parsed = parse_subject_rows(data.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].subject_code, "M");
    }

    #[test]
    fn timetable_rows_parse_cells_in_slot_order() {
        let header = timetable_headers().join(",");
        let line = timetable_line(
            "1-A",
            &[(1, "Math | t1@school.test | R1"), (2, "none"), (20, "Art | t2@school.test")],
        );
        let data = format!("{header}\n{line}\n");
        let parsed = parse_timetable_rows(data.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.class.class_name, "A");
        assert_eq!(row.cells.len(), 2);
        assert_eq!(row.cells[0].day, DayOfWeek::Monday);
        assert_eq!(row.cells[0].period, 1);
        assert_eq!(row.cells[1].day, DayOfWeek::Friday);
        assert_eq!(row.cells[1].period, 4);
    }

    #[test]
    fn timetable_row_with_bad_cell_is_rejected_whole() {
        let header = timetable_headers().join(",");
        let bad = timetable_line("1-A", &[(1, "Math | t1@school.test"), (3, "Music")]);
        let good = timetable_line("1-B", &[]);
        let data = format!("{header}\n{bad}\n{good}\n");
        let parsed = parse_timetable_rows(data.as_bytes()).unwrap();

        assert_eq!(parsed.total_rows, 2);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].row, 2);
        assert!(parsed.rejected[0].error.starts_with("mon3"));
        assert_eq!(parsed.rows.len(), 1);
        assert!(parsed.rows[0].cells.is_empty());
    }

    #[test]
    fn import_result_success_tracks_errors() {
        let mut result = ImportResult::new(2);
        result.record_success();
        assert!(result.success);

        result.record_error(ImportErrorRow {
            row: 3,
            error: "Subject name is required".into(),
            data: "a,b".into(),
        });
        assert!(!result.success);
        assert_eq!(result.processed_rows, 1);
        assert_eq!(result.errors, vec!["Row 3: Subject name is required"]);
    }

    #[test]
    fn finish_orders_errors_by_line() {
        let mut result = ImportResult::new(3);
        for (row, error) in [(4, "save failed"), (2, "bad class")] {
            result.record_error(ImportErrorRow {
                row,
                error: error.into(),
                data: String::new(),
            });
        }

        let result = result.finish();
        assert_eq!(result.error_rows[0].row, 2);
        assert_eq!(result.errors, vec!["Row 2: bad class", "Row 4: save failed"]);
    }

    #[test]
    fn write_csv_emits_header_and_rows() {
        let bytes = write_csv(["a", "b"], vec![vec!["1", "x, y"]]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "a,b\n1,\"x, y\"\n");
    }
}
