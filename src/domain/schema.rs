//! Declarative field schemas for the three wizard steps.
//!
//! A schema lists the fields of a step with their kind and whether they are
//! required, plus cross-field rules such as date ordering. Form values are
//! kept as raw strings aligned with the schema's field order and converted
//! into typed records once they validate.

use chrono::NaiveDate;
use uuid::Uuid;

use super::errors::{DomainError, DomainResult};
use super::models::{EndDate, Experience, Gender, Nationality, PersonalData, Scholarship, StepKind};
use super::rules::{self, FieldErrors};

/// Value stored for a checked flag field.
pub const FLAG_ON: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { min_len: usize },
    Choice(&'static [(&'static str, &'static str)]),
    Date,
    Email,
    Phone { digits: usize },
    Url,
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    const fn new(key: &'static str, label: &'static str, kind: FieldKind, required: bool) -> Self {
        Self { key, label, kind, required }
    }

    pub fn placeholder(&self) -> Option<String> {
        match self.kind {
            FieldKind::Date => Some("DD/MM/YYYY".to_string()),
            FieldKind::Phone { digits } => Some(rules::phone_mask(digits)),
            FieldKind::Choice(choices) => Some(
                choices
                    .iter()
                    .map(|(value, _)| *value)
                    .collect::<Vec<_>>()
                    .join(" | "),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossRule {
    NotInFuture { field: &'static str },
    DateOrder { start: &'static str, end: &'static str },
    /// `field` is disabled and ignored while `flag` is set.
    ClearedWhen { flag: &'static str, field: &'static str },
}

#[derive(Debug)]
pub struct Schema {
    pub step: StepKind,
    pub fields: &'static [FieldSpec],
    pub rules: &'static [CrossRule],
}

static PERSONAL_DATA: Schema = Schema {
    step: StepKind::PersonalData,
    fields: &[
        FieldSpec::new("fullName", "Full name", FieldKind::Text { min_len: 1 }, true),
        FieldSpec::new("gender", "Gender", FieldKind::Choice(Gender::CHOICES), true),
        FieldSpec::new("nationality", "Nationality", FieldKind::Choice(Nationality::CHOICES), true),
        FieldSpec::new("placeOfBirth", "Place of birth", FieldKind::Text { min_len: 1 }, true),
        FieldSpec::new("birthday", "Date of birth", FieldKind::Date, true),
        FieldSpec::new("email", "E-mail", FieldKind::Email, false),
        FieldSpec::new("telephone", "Telephone", FieldKind::Phone { digits: 10 }, false),
        FieldSpec::new("cellPhone", "Cell phone / WhatsApp", FieldKind::Phone { digits: 11 }, false),
        FieldSpec::new("website", "Website / Portfolio", FieldKind::Url, false),
        FieldSpec::new("linkedin", "LinkedIn", FieldKind::Url, false),
        FieldSpec::new("github", "GitHub", FieldKind::Url, false),
    ],
    rules: &[CrossRule::NotInFuture { field: "birthday" }],
};

static PROFESSIONAL_EXPERIENCE: Schema = Schema {
    step: StepKind::ProfessionalExperience,
    fields: &[
        FieldSpec::new("companyName", "Company", FieldKind::Text { min_len: 1 }, true),
        FieldSpec::new("jobTitle", "Job title", FieldKind::Text { min_len: 1 }, true),
        FieldSpec::new("startDate", "Start date", FieldKind::Date, true),
        FieldSpec::new("endDate", "End date", FieldKind::Date, false),
        FieldSpec::new("isCurrentJob", "I still work here", FieldKind::Flag, false),
        FieldSpec::new(
            "description",
            "Description of activities",
            FieldKind::Text { min_len: rules::DESCRIPTION_MIN_LEN },
            true,
        ),
    ],
    rules: &[
        CrossRule::ClearedWhen { flag: "isCurrentJob", field: "endDate" },
        CrossRule::NotInFuture { field: "startDate" },
        CrossRule::DateOrder { start: "startDate", end: "endDate" },
    ],
};

static SCHOLARSHIP: Schema = Schema {
    step: StepKind::Scholarship,
    fields: &[
        FieldSpec::new("institution", "Institution", FieldKind::Text { min_len: 1 }, true),
        FieldSpec::new("courseName", "Course", FieldKind::Text { min_len: 1 }, true),
        FieldSpec::new("startDate", "Start date", FieldKind::Date, true),
        FieldSpec::new("endDate", "End date", FieldKind::Date, false),
        FieldSpec::new("isOngoing", "Still studying", FieldKind::Flag, false),
        FieldSpec::new("description", "Description", FieldKind::Text { min_len: 0 }, false),
    ],
    rules: &[
        CrossRule::ClearedWhen { flag: "isOngoing", field: "endDate" },
        CrossRule::NotInFuture { field: "startDate" },
        CrossRule::DateOrder { start: "startDate", end: "endDate" },
    ],
};

impl Schema {
    pub fn for_step(step: StepKind) -> &'static Schema {
        match step {
            StepKind::PersonalData => &PERSONAL_DATA,
            StepKind::ProfessionalExperience => &PROFESSIONAL_EXPERIENCE,
            StepKind::Scholarship => &SCHOLARSHIP,
        }
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.key == key)
    }

    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn empty_values(&self) -> Vec<String> {
        vec![String::new(); self.fields.len()]
    }

    /// Raw value of `key`, or an empty string when the key is unknown.
    pub fn value<'v>(&self, values: &'v [String], key: &str) -> &'v str {
        self.index_of(key)
            .and_then(|index| values.get(index))
            .map(|value| value.trim())
            .unwrap_or("")
    }

    pub fn has_date_order(&self) -> bool {
        self.rules.iter().any(|rule| matches!(rule, CrossRule::DateOrder { .. }))
    }

    pub fn is_disabled(&self, key: &str, values: &[String]) -> bool {
        self.rules.iter().any(|rule| match rule {
            CrossRule::ClearedWhen { flag, field } => *field == key && self.value(values, flag) == FLAG_ON,
            _ => false,
        })
    }

    fn date_value(&self, values: &[String], key: &str) -> Option<NaiveDate> {
        if self.is_disabled(key, values) {
            return None;
        }
        rules::parse_date(self.value(values, key)).ok()
    }

    /// Validates every field and cross-field rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use cvwiz::domain::{Schema, StepKind};
    ///
    /// let schema = Schema::for_step(StepKind::Scholarship);
    /// let values: Vec<String> = ["USP", "Physics", "01/02/2015", "01/12/2014", "", ""]
    ///     .iter()
    ///     .map(|s| s.to_string())
    ///     .collect();
    /// let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let errors = schema.validate(&values, today);
    /// assert!(errors.get("endDate").is_some());
    /// ```
    pub fn validate(&self, values: &[String], today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::default();

        for field in self.fields {
            if self.is_disabled(field.key, values) {
                continue;
            }
            let value = self.value(values, field.key);
            if value.is_empty() {
                if field.required {
                    errors.insert(field.key, rules::MSG_REQUIRED);
                }
                continue;
            }
            match field.kind {
                FieldKind::Text { min_len } => rules::check_min_len(&mut errors, field.key, value, min_len),
                FieldKind::Choice(choices) => {
                    if !choices.iter().any(|(choice, _)| *choice == value) {
                        errors.insert(field.key, rules::MSG_INVALID_CHOICE);
                    }
                }
                FieldKind::Date => {
                    if rules::parse_date(value).is_err() {
                        errors.insert(field.key, rules::MSG_INVALID_DATE);
                    }
                }
                FieldKind::Email => {
                    if !rules::is_valid_email(value) {
                        errors.insert(field.key, rules::MSG_INVALID_EMAIL);
                    }
                }
                FieldKind::Phone { digits } => {
                    if rules::format_phone(value, digits).is_err() {
                        errors.insert(field.key, format!("Expected {}", rules::phone_mask(digits)));
                    }
                }
                FieldKind::Url => {
                    if !rules::is_valid_url(value) {
                        errors.insert(field.key, rules::MSG_INVALID_URL);
                    }
                }
                FieldKind::Flag => {}
            }
        }

        for rule in self.rules {
            match *rule {
                CrossRule::NotInFuture { field } => {
                    if let Some(date) = self.date_value(values, field) {
                        rules::check_not_in_future(&mut errors, field, date, today);
                    }
                }
                CrossRule::DateOrder { start, end } => {
                    if let (Some(start_date), Some(end_date)) =
                        (self.date_value(values, start), self.date_value(values, end))
                    {
                        rules::check_date_order(&mut errors, end, start_date, end_date);
                    }
                }
                CrossRule::ClearedWhen { .. } => {}
            }
        }

        errors
    }
}

fn optional_date(value: &str) -> DomainResult<Option<NaiveDate>> {
    if value.is_empty() {
        Ok(None)
    } else {
        rules::parse_date(value).map(Some)
    }
}

fn required_date(value: &str, field: &'static str) -> DomainResult<NaiveDate> {
    optional_date(value)?.ok_or(DomainError::MissingField(field))
}

fn optional_phone(value: &str, digits: usize) -> DomainResult<String> {
    if value.is_empty() {
        Ok(String::new())
    } else {
        rules::format_phone(value, digits)
    }
}

fn optional_choice<T>(value: &str, field: &'static str, parse: fn(&str) -> Option<T>) -> DomainResult<Option<T>> {
    if value.is_empty() {
        return Ok(None);
    }
    parse(value).map(Some).ok_or_else(|| DomainError::InvalidChoice {
        field,
        value: value.to_string(),
    })
}

impl PersonalData {
    pub fn from_form(values: &[String]) -> DomainResult<Self> {
        let schema = Schema::for_step(StepKind::PersonalData);
        let get = |key| schema.value(values, key);
        Ok(Self {
            full_name: get("fullName").to_string(),
            gender: optional_choice(get("gender"), "gender", Gender::parse)?,
            nationality: optional_choice(get("nationality"), "nationality", Nationality::parse)?,
            place_of_birth: get("placeOfBirth").to_string(),
            birthday: optional_date(get("birthday"))?,
            email: get("email").to_string(),
            telephone: optional_phone(get("telephone"), 10)?,
            cell_phone: optional_phone(get("cellPhone"), 11)?,
            website: get("website").to_string(),
            linkedin: get("linkedin").to_string(),
            github: get("github").to_string(),
        })
    }

    /// Raw form values for this record, in schema order.
    pub fn to_form(&self) -> Vec<String> {
        vec![
            self.full_name.clone(),
            self.gender.map(|g| g.as_str().to_string()).unwrap_or_default(),
            self.nationality.map(|n| n.as_str().to_string()).unwrap_or_default(),
            self.place_of_birth.clone(),
            self.birthday.map(rules::format_date).unwrap_or_default(),
            self.email.clone(),
            self.telephone.clone(),
            self.cell_phone.clone(),
            self.website.clone(),
            self.linkedin.clone(),
            self.github.clone(),
        ]
    }
}

impl Experience {
    /// Builds an entry from form values. The id is left nil; the controller
    /// assigns one when the entry is added.
    pub fn from_form(values: &[String]) -> DomainResult<Self> {
        let schema = Schema::for_step(StepKind::ProfessionalExperience);
        let get = |key| schema.value(values, key);
        let is_current_job = get("isCurrentJob") == FLAG_ON;
        let end_date = if is_current_job {
            Some(EndDate::Ongoing)
        } else {
            optional_date(get("endDate"))?.map(EndDate::Date)
        };
        Ok(Self {
            id: Uuid::nil(),
            company_name: get("companyName").to_string(),
            job_title: get("jobTitle").to_string(),
            start_date: required_date(get("startDate"), "startDate")?,
            end_date,
            description: get("description").to_string(),
            is_current_job,
        })
    }
}

impl Scholarship {
    pub fn from_form(values: &[String]) -> DomainResult<Self> {
        let schema = Schema::for_step(StepKind::Scholarship);
        let get = |key| schema.value(values, key);
        let end_date = if get("isOngoing") == FLAG_ON {
            Some(EndDate::Ongoing)
        } else {
            optional_date(get("endDate"))?.map(EndDate::Date)
        };
        Ok(Self {
            id: Uuid::nil(),
            institution: get("institution").to_string(),
            course_name: get("courseName").to_string(),
            start_date: required_date(get("startDate"), "startDate")?,
            end_date,
            description: get("description").to_string(),
        })
    }
}
