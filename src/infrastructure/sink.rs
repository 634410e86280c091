//! Destinations for a finished submission.

use crate::domain::{EndDate, Submission, format_date};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),
}

/// Receives the submitted payload. Returns a short description of where it
/// went.
pub trait SubmissionSink: std::fmt::Debug {
    fn deliver(&mut self, submission: &Submission) -> Result<String, SinkError>;
}

#[derive(Debug, Clone)]
pub struct JsonFileSink {
    pub path: PathBuf,
}

impl SubmissionSink for JsonFileSink {
    fn deliver(&mut self, submission: &Submission) -> Result<String, SinkError> {
        let json = serde_json::to_string_pretty(submission)?;
        fs::write(&self.path, json)?;
        Ok(format!("written to {}", self.path.display()))
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    section: &'a str,
    id: String,
    organization: &'a str,
    title: &'a str,
    start_date: String,
    end_date: String,
    description: &'a str,
}

fn end_date_cell(end_date: Option<EndDate>) -> String {
    match end_date {
        Some(EndDate::Date(date)) => format_date(date),
        Some(EndDate::Ongoing) => EndDate::MARKER.to_string(),
        None => String::new(),
    }
}

/// Writes one row per entry. Personal data goes into `personal` rows with
/// the field name in `title` and its value in `description`.
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    pub path: PathBuf,
}

impl CsvFileSink {
    fn personal_rows(submission: &Submission) -> Vec<(&'static str, String)> {
        let data = &submission.personal_data;
        vec![
            ("fullName", data.full_name.clone()),
            ("gender", data.gender.map(|g| g.as_str().to_string()).unwrap_or_default()),
            ("nationality", data.nationality.map(|n| n.as_str().to_string()).unwrap_or_default()),
            ("placeOfBirth", data.place_of_birth.clone()),
            ("birthday", data.birthday.map(format_date).unwrap_or_default()),
            ("email", data.email.clone()),
            ("telephone", data.telephone.clone()),
            ("cellPhone", data.cell_phone.clone()),
            ("website", data.website.clone()),
            ("linkedin", data.linkedin.clone()),
            ("github", data.github.clone()),
        ]
    }

    pub fn write_to<W: std::io::Write>(submission: &Submission, writer: W) -> Result<(), SinkError> {
        let mut csv = csv::Writer::from_writer(writer);
        for (field, value) in Self::personal_rows(submission) {
            if value.is_empty() {
                continue;
            }
            csv.serialize(CsvRow {
                section: "personal",
                id: String::new(),
                organization: "",
                title: field,
                start_date: String::new(),
                end_date: String::new(),
                description: &value,
            })?;
        }
        for experience in &submission.experiences {
            csv.serialize(CsvRow {
                section: "experience",
                id: experience.id.to_string(),
                organization: &experience.company_name,
                title: &experience.job_title,
                start_date: format_date(experience.start_date),
                end_date: end_date_cell(experience.end_date),
                description: &experience.description,
            })?;
        }
        for scholarship in &submission.scholarships {
            csv.serialize(CsvRow {
                section: "scholarship",
                id: scholarship.id.to_string(),
                organization: &scholarship.institution,
                title: &scholarship.course_name,
                start_date: format_date(scholarship.start_date),
                end_date: end_date_cell(scholarship.end_date),
                description: &scholarship.description,
            })?;
        }
        csv.flush()?;
        Ok(())
    }
}

impl SubmissionSink for CsvFileSink {
    fn deliver(&mut self, submission: &Submission) -> Result<String, SinkError> {
        let file = fs::File::create(&self.path)?;
        Self::write_to(submission, file)?;
        Ok(format!("exported to {}", self.path.display()))
    }
}

/// POSTs the submission as JSON.
#[derive(Debug, Clone)]
pub struct HttpSink {
    pub url: String,
    client: reqwest::blocking::Client,
}

impl HttpSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl SubmissionSink for HttpSink {
    fn deliver(&mut self, submission: &Submission) -> Result<String, SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(submission)
            .send()?
            .error_for_status()?;
        info!("submission accepted by {} with {}", self.url, response.status());
        Ok(format!("sent to {} ({})", self.url, response.status()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClipboardSink;

impl SubmissionSink for ClipboardSink {
    fn deliver(&mut self, submission: &Submission) -> Result<String, SinkError> {
        let json = serde_json::to_string_pretty(submission)?;
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(json)?;
        Ok("copied to clipboard".to_string())
    }
}

/// Reads text from the system clipboard.
pub fn read_clipboard() -> Result<String, SinkError> {
    let mut clipboard = arboard::Clipboard::new()?;
    Ok(clipboard.get_text()?)
}

/// Keeps submissions in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub delivered: Vec<Submission>,
}

impl SubmissionSink for MemorySink {
    fn deliver(&mut self, submission: &Submission) -> Result<String, SinkError> {
        self.delivered.push(submission.clone());
        Ok(format!("kept in memory (#{})", self.delivered.len()))
    }
}

/// Where `--submit-to` sends the data.
///
/// # Examples
///
/// ```
/// use cvwiz::infrastructure::SinkTarget;
///
/// let target: SinkTarget = "csv:out/resume.csv".parse().unwrap();
/// assert_eq!(target, SinkTarget::Csv("out/resume.csv".into()));
/// assert_eq!("clipboard".parse::<SinkTarget>().unwrap(), SinkTarget::Clipboard);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    Json(PathBuf),
    Csv(PathBuf),
    Http(String),
    Clipboard,
}

impl FromStr for SinkTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "clipboard" {
            return Ok(SinkTarget::Clipboard);
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(SinkTarget::Http(s.to_string()));
        }
        match s.split_once(':') {
            Some(("json", path)) if !path.is_empty() => Ok(SinkTarget::Json(PathBuf::from(path))),
            Some(("csv", path)) if !path.is_empty() => Ok(SinkTarget::Csv(PathBuf::from(path))),
            _ => Err(format!(
                "unknown target '{s}', expected json:<path>, csv:<path>, http(s)://<url> or clipboard"
            )),
        }
    }
}

impl std::fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkTarget::Json(path) => write!(f, "json:{}", path.display()),
            SinkTarget::Csv(path) => write!(f, "csv:{}", path.display()),
            SinkTarget::Http(url) => write!(f, "{url}"),
            SinkTarget::Clipboard => write!(f, "clipboard"),
        }
    }
}

impl SinkTarget {
    pub fn into_sink(self) -> Box<dyn SubmissionSink> {
        match self {
            SinkTarget::Json(path) => Box::new(JsonFileSink { path }),
            SinkTarget::Csv(path) => Box::new(CsvFileSink { path }),
            SinkTarget::Http(url) => Box::new(HttpSink::new(url)),
            SinkTarget::Clipboard => Box::new(ClipboardSink),
        }
    }
}
