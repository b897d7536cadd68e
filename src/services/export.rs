//! Excel export
//!
//! Each export is a workbook with one named sheet, a bold header row with
//! fixed labels and one row per list entry.

use std::path::{Path, PathBuf};
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;
use crate::config::ExportConfig;
use crate::services::aggregation::{AttendeeRow, FeedbackRow, Numbered, ParticipantRow};
use crate::utils::errors::Result;

pub const ATTENDEE_HEADERS: [&str; 5] = ["No", "Name", "Email", "Year of Study", "Faculty"];
pub const PARTICIPANT_HEADERS: [&str; 6] = ["No", "Name", "Email", "Year of Study", "Faculty", "Verified"];
pub const FEEDBACK_HEADERS: [&str; 6] = [
    "No",
    "Name",
    "Email",
    "Event Rating",
    "Gamification Rating",
    "Overall Improvement",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<u8> for Cell {
    fn from(value: u8) -> Self {
        Cell::Number(value as f64)
    }
}

/// One worksheet worth of data
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn attendees(rows: &[Numbered<AttendeeRow>]) -> Self {
        Self {
            name: "Attendees",
            headers: &ATTENDEE_HEADERS,
            rows: rows
                .iter()
                .map(|n| {
                    vec![
                        n.bil.into(),
                        n.row.name.clone().into(),
                        n.row.email.clone().into(),
                        n.row.year_of_study.into(),
                        n.row.faculty.name().into(),
                    ]
                })
                .collect(),
        }
    }

    pub fn participants(rows: &[Numbered<ParticipantRow>]) -> Self {
        Self {
            name: "Participants",
            headers: &PARTICIPANT_HEADERS,
            rows: rows
                .iter()
                .map(|n| {
                    vec![
                        n.bil.into(),
                        n.row.name.clone().into(),
                        n.row.email.clone().into(),
                        n.row.year_of_study.into(),
                        n.row.faculty.name().into(),
                        if n.row.verified { "Yes" } else { "No" }.into(),
                    ]
                })
                .collect(),
        }
    }

    pub fn feedback(rows: &[Numbered<FeedbackRow>]) -> Self {
        Self {
            name: "Feedback",
            headers: &FEEDBACK_HEADERS,
            rows: rows
                .iter()
                .map(|n| {
                    vec![
                        n.bil.into(),
                        n.row.name.clone().into(),
                        n.row.email.clone().into(),
                        n.row.event_rating.into(),
                        n.row.gamification_rating.into(),
                        n.row.overall_improvement.clone().into(),
                    ]
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportService {
    column_width: f64,
    output_dir: PathBuf,
}

impl ExportService {
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            column_width: config.column_width,
            output_dir: PathBuf::from(&config.output_dir),
        }
    }

    fn workbook(&self, sheet: &Sheet) -> Result<Workbook> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name)?;

        for (col, label) in sheet.headers.iter().enumerate() {
            let col = col as u16;
            worksheet.set_column_width(col, self.column_width)?;
            worksheet.write_string_with_format(0, col, *label, &header)?;
        }

        for (index, row) in sheet.rows.iter().enumerate() {
            let row_num = index as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(text) => worksheet.write_string(row_num, col as u16, text)?,
                    Cell::Number(number) => worksheet.write_number(row_num, col as u16, *number)?,
                };
            }
        }

        Ok(workbook)
    }

    /// The workbook as `.xlsx` bytes
    pub fn to_buffer(&self, sheet: &Sheet) -> Result<Vec<u8>> {
        Ok(self.workbook(sheet)?.save_to_buffer()?)
    }

    /// Write the workbook to `path`, creating parent directories
    pub fn save(&self, sheet: &Sheet, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        self.workbook(sheet)?.save(&path)?;
        info!(path = %path.display(), rows = sheet.rows.len(), sheet = sheet.name, "Workbook exported");
        Ok(path)
    }

    /// `<output_dir>/<stem>.xlsx`
    pub fn default_path(&self, stem: &str) -> PathBuf {
        self.output_dir.join(format!("{}.xlsx", stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_buffer_is_zip() {
        let service = ExportService::new(&crate::config::Settings::default().export);
        let sheet = Sheet {
            name: "Attendees",
            headers: &ATTENDEE_HEADERS,
            rows: vec![vec![1usize.into(), "Aina".into(), "aina@uni.edu".into(), 2u8.into(), "FSKTM".into()]],
        };

        let bytes = service.to_buffer(&sheet).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_default_path() {
        let service = ExportService::new(&crate::config::Settings::default().export);
        assert_eq!(service.default_path("attendees-e1"), PathBuf::from("exports/attendees-e1.xlsx"));
    }
}
