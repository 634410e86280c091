use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::rules::{self, FieldErrors};

/// The pages of the wizard, in order.
///
/// Behavior that differs per step is selected by matching on the tag rather
/// than through trait objects.
///
/// # Examples
///
/// ```
/// use cvwiz::domain::StepKind;
///
/// assert_eq!(StepKind::PersonalData.next(), Some(StepKind::ProfessionalExperience));
/// assert_eq!(StepKind::Scholarship.next(), None);
/// assert_eq!(StepKind::from_index(1), Some(StepKind::ProfessionalExperience));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKind {
    PersonalData,
    ProfessionalExperience,
    Scholarship,
}

impl StepKind {
    pub const ALL: [StepKind; 3] = [
        StepKind::PersonalData,
        StepKind::ProfessionalExperience,
        StepKind::Scholarship,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            StepKind::PersonalData => 0,
            StepKind::ProfessionalExperience => 1,
            StepKind::Scholarship => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_first(self) -> bool {
        self.index() == 0
    }

    pub fn is_last(self) -> bool {
        self.index() + 1 == Self::COUNT
    }

    /// Accumulating steps append entries to a collection instead of filling
    /// a single record.
    pub fn is_accumulating(self) -> bool {
        !matches!(self, StepKind::PersonalData)
    }

    pub fn title(self) -> &'static str {
        match self {
            StepKind::PersonalData => "Personal data",
            StepKind::ProfessionalExperience => "Professional experience",
            StepKind::Scholarship => "Education",
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            StepKind::PersonalData => "Personal contact information",
            StepKind::ProfessionalExperience => "List of professional experiences",
            StepKind::Scholarship => "List of courses and degrees",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} ({})", self.index() + 1, self.title())
    }
}

/// Source of "today" for date rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(NaiveDate),
}

impl Clock {
    pub fn today(self) -> NaiveDate {
        match self {
            Clock::System => Local::now().date_naive(),
            Clock::Fixed(date) => date,
        }
    }
}

/// End of an experience or course: a concrete date or still running.
///
/// Serialized as an ISO date (`2021-03-01`) or the literal `"present"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndDate {
    Date(NaiveDate),
    Ongoing,
}

impl EndDate {
    pub const MARKER: &'static str = "present";

    pub fn date(self) -> Option<NaiveDate> {
        match self {
            EndDate::Date(date) => Some(date),
            EndDate::Ongoing => None,
        }
    }
}

impl Serialize for EndDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            EndDate::Date(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            EndDate::Ongoing => serializer.serialize_str(Self::MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for EndDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "present" | "ongoing" => Ok(EndDate::Ongoing),
            other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
                .map(EndDate::Date)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const CHOICES: &'static [(&'static str, &'static str)] =
        &[("male", "Male"), ("female", "Female"), ("other", "Other")];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nationality {
    Brazilian,
    Foreign,
}

impl Nationality {
    pub const CHOICES: &'static [(&'static str, &'static str)] =
        &[("brazilian", "Brazilian"), ("foreign", "Foreign")];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "brazilian" => Some(Nationality::Brazilian),
            "foreign" => Some(Nationality::Foreign),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Nationality::Brazilian => "brazilian",
            Nationality::Foreign => "foreign",
        }
    }
}

/// The single record collected by the first step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalData {
    pub full_name: String,
    pub gender: Option<Gender>,
    pub nationality: Option<Nationality>,
    pub place_of_birth: String,
    pub birthday: Option<NaiveDate>,
    pub email: String,
    pub telephone: String,
    pub cell_phone: String,
    pub website: String,
    pub linkedin: String,
    pub github: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    pub company_name: String,
    pub job_title: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<EndDate>,
    pub description: String,
    #[serde(default)]
    pub is_current_job: bool,
}

impl Experience {
    /// A current job always ends at the present marker, whatever end date
    /// was typed.
    pub fn normalize(&mut self) {
        if self.is_current_job {
            self.end_date = Some(EndDate::Ongoing);
        }
    }

    pub fn validate(&self, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::default();
        rules::check_required(&mut errors, "companyName", &self.company_name);
        rules::check_required(&mut errors, "jobTitle", &self.job_title);
        rules::check_min_len(&mut errors, "description", &self.description, rules::DESCRIPTION_MIN_LEN);
        rules::check_not_in_future(&mut errors, "startDate", self.start_date, today);
        if self.is_current_job && self.end_date != Some(EndDate::Ongoing) {
            errors.insert("endDate", rules::MSG_CURRENT_JOB_END);
        }
        if let Some(end) = self.end_date.and_then(EndDate::date) {
            rules::check_date_order(&mut errors, "endDate", self.start_date, end);
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scholarship {
    pub id: Uuid,
    pub institution: String,
    pub course_name: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<EndDate>,
    #[serde(default)]
    pub description: String,
}

impl Scholarship {
    pub fn validate(&self, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::default();
        rules::check_required(&mut errors, "institution", &self.institution);
        rules::check_required(&mut errors, "courseName", &self.course_name);
        rules::check_not_in_future(&mut errors, "startDate", self.start_date, today);
        if let Some(end) = self.end_date.and_then(EndDate::date) {
            rules::check_date_order(&mut errors, "endDate", self.start_date, end);
        }
        errors
    }
}

/// Payload handed to a sink when the wizard is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub personal_data: PersonalData,
    pub experiences: Vec<Experience>,
    pub scholarships: Vec<Scholarship>,
}

/// Persisted layout of a wizard session.
///
/// Step validity is not stored; it is derived again when a snapshot is
/// restored. `personal_draft` holds the raw personal-data form when it
/// differs from the last valid record, so unfinished edits survive a
/// restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub current_step: usize,
    #[serde(default)]
    pub personal_data: PersonalData,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub scholarships: Vec<Scholarship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub personal_draft: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn experience() -> Experience {
        Experience {
            id: Uuid::nil(),
            company_name: "Acme".to_string(),
            job_title: "Engineer".to_string(),
            start_date: date(2020, 1, 1),
            end_date: Some(EndDate::Date(date(2021, 1, 1))),
            description: "Built the billing pipeline".to_string(),
            is_current_job: false,
        }
    }

    #[test]
    fn test_step_navigation_bounds() {
        assert_eq!(StepKind::PersonalData.prev(), None);
        assert_eq!(StepKind::Scholarship.prev(), Some(StepKind::ProfessionalExperience));
        assert_eq!(StepKind::from_index(3), None);
        assert!(StepKind::Scholarship.is_last());
        assert!(!StepKind::PersonalData.is_accumulating());
        assert!(StepKind::Scholarship.is_accumulating());
    }

    #[test]
    fn test_end_date_serialization() {
        let json = serde_json::to_string(&EndDate::Date(date(2022, 5, 9))).unwrap();
        assert_eq!(json, "\"2022-05-09\"");
        assert_eq!(serde_json::to_string(&EndDate::Ongoing).unwrap(), "\"present\"");

        let parsed: EndDate = serde_json::from_str("\"ongoing\"").unwrap();
        assert_eq!(parsed, EndDate::Ongoing);
        assert!(serde_json::from_str::<EndDate>("\"05/09/2022\"").is_err());
    }

    #[test]
    fn test_normalize_current_job() {
        let mut exp = experience();
        exp.is_current_job = true;
        exp.normalize();
        assert_eq!(exp.end_date, Some(EndDate::Ongoing));

        let mut past = experience();
        past.normalize();
        assert_eq!(past.end_date, Some(EndDate::Date(date(2021, 1, 1))));
    }

    #[test]
    fn test_experience_validation() {
        let today = date(2024, 6, 1);
        assert!(experience().validate(today).is_empty());

        let mut reversed = experience();
        reversed.end_date = Some(EndDate::Date(date(2019, 1, 1)));
        let errors = reversed.validate(today);
        assert!(errors.get("endDate").is_some());

        let mut future = experience();
        future.start_date = date(2025, 1, 1);
        future.end_date = None;
        assert!(future.validate(today).get("startDate").is_some());

        let mut short = experience();
        short.description = "too short".to_string();
        assert!(short.validate(today).get("description").is_some());
    }

    #[test]
    fn test_scholarship_validation() {
        let today = date(2024, 6, 1);
        let scholarship = Scholarship {
            id: Uuid::nil(),
            institution: "USP".to_string(),
            course_name: "Computer Science".to_string(),
            start_date: date(2018, 2, 1),
            end_date: Some(EndDate::Date(date(2017, 12, 1))),
            description: String::new(),
        };
        let errors = scholarship.validate(today);
        assert_eq!(errors.len(), 1);
        assert!(errors.get("endDate").is_some());
    }

    #[test]
    fn test_submission_uses_camel_case() {
        let submission = Submission {
            personal_data: PersonalData::default(),
            experiences: vec![experience()],
            scholarships: Vec::new(),
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert!(value.get("personalData").is_some());
        assert_eq!(value["experiences"][0]["companyName"], "Acme");
        assert_eq!(value["experiences"][0]["endDate"], "2021-01-01");
    }
}
