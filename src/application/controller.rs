//! The wizard state machine.
//!
//! `WizardController` owns the session state and is the only place it is
//! mutated. Forward navigation and submission are gated by the per-step
//! validity flags; blocked operations return a [`WizardError`] and leave the
//! state untouched.

use chrono::NaiveDate;
use log::{debug, info, warn};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Clock, Experience, FieldErrors, PersonalData, Schema, Scholarship, Snapshot, StepKind, Submission,
};
use crate::infrastructure::{SinkError, SubmissionSink};

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("{0} is not complete yet")]
    StepIncomplete(StepKind),
    #[error("already at the last step")]
    AtLastStep,
    #[error("data can only be saved from the last step, currently at {0}")]
    NotAtLastStep(StepKind),
    #[error("entry rejected: {0}")]
    Rejected(FieldErrors),
    #[error("no entry with id {0}")]
    UnknownEntry(Uuid),
    #[error("submission failed: {0}")]
    Sink(#[from] SinkError),
}

pub type WizardResult<T> = Result<T, WizardError>;

/// Session state of the wizard.
///
/// Read access is public; changes go through [`WizardController`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    current_step: StepKind,
    step_validity: [bool; StepKind::COUNT],
    personal_data: PersonalData,
    experiences: Vec<Experience>,
    scholarships: Vec<Scholarship>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: StepKind::PersonalData,
            step_validity: [false; StepKind::COUNT],
            personal_data: PersonalData::default(),
            experiences: Vec::new(),
            scholarships: Vec::new(),
        }
    }
}

impl WizardState {
    pub fn current_step(&self) -> StepKind {
        self.current_step
    }

    pub fn is_step_valid(&self, step: StepKind) -> bool {
        self.step_validity[step.index()]
    }

    pub fn personal_data(&self) -> &PersonalData {
        &self.personal_data
    }

    pub fn experiences(&self) -> &[Experience] {
        &self.experiences
    }

    pub fn scholarships(&self) -> &[Scholarship] {
        &self.scholarships
    }

    /// Number of entries collected by an accumulating step.
    pub fn entry_count(&self, step: StepKind) -> usize {
        match step {
            StepKind::PersonalData => 0,
            StepKind::ProfessionalExperience => self.experiences.len(),
            StepKind::Scholarship => self.scholarships.len(),
        }
    }
}

/// Drives the wizard through its steps.
///
/// # Examples
///
/// ```
/// use cvwiz::application::WizardController;
/// use cvwiz::domain::StepKind;
///
/// let mut wizard = WizardController::new();
/// assert!(wizard.advance().is_err());
///
/// wizard.report_validity(StepKind::PersonalData, true);
/// assert_eq!(wizard.advance().unwrap(), StepKind::ProfessionalExperience);
/// assert_eq!(wizard.retreat(), StepKind::PersonalData);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WizardController {
    state: WizardState,
    clock: Clock,
}

impl WizardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            state: WizardState::default(),
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> StepKind {
        self.state.current_step
    }

    pub fn can_advance(&self) -> bool {
        let step = self.state.current_step;
        !step.is_last() && self.state.is_step_valid(step)
    }

    pub fn can_submit(&self) -> bool {
        let step = self.state.current_step;
        step.is_last() && self.state.is_step_valid(step)
    }

    /// Moves to the next step when the current one is valid.
    ///
    /// The next step keeps whatever validity it had the last time it was
    /// visited.
    pub fn advance(&mut self) -> WizardResult<StepKind> {
        let step = self.state.current_step;
        let next = step.next().ok_or(WizardError::AtLastStep)?;
        if !self.state.is_step_valid(step) {
            debug!("advance blocked at {step}");
            return Err(WizardError::StepIncomplete(step));
        }
        self.state.current_step = next;
        debug!("advanced to {next}");
        Ok(next)
    }

    /// Moves to the previous step. Does nothing on the first step.
    pub fn retreat(&mut self) -> StepKind {
        if let Some(prev) = self.state.current_step.prev() {
            self.state.current_step = prev;
            debug!("retreated to {prev}");
        }
        self.state.current_step
    }

    pub fn report_validity(&mut self, step: StepKind, valid: bool) {
        if self.state.step_validity[step.index()] != valid {
            debug!("{step} validity -> {valid}");
        }
        self.state.step_validity[step.index()] = valid;
    }

    pub fn set_personal_data(&mut self, data: PersonalData) {
        self.state.personal_data = data;
    }

    fn fresh_id(&self) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            let taken = self.state.experiences.iter().any(|e| e.id == id)
                || self.state.scholarships.iter().any(|s| s.id == id);
            if !taken {
                return id;
            }
        }
    }

    /// Appends an experience and opens the experience step's gate.
    ///
    /// A current job is normalized to end at the present marker before the
    /// entry is checked. Rejected entries leave the state untouched.
    pub fn add_experience(&mut self, mut experience: Experience) -> WizardResult<Uuid> {
        experience.normalize();
        let errors = experience.validate(self.today());
        if !errors.is_empty() {
            warn!("experience rejected: {errors}");
            return Err(WizardError::Rejected(errors));
        }
        experience.id = self.fresh_id();
        let id = experience.id;
        info!("added experience at {}", experience.company_name);
        self.state.experiences.push(experience);
        self.report_validity(StepKind::ProfessionalExperience, true);
        Ok(id)
    }

    pub fn add_scholarship(&mut self, mut scholarship: Scholarship) -> WizardResult<Uuid> {
        let errors = scholarship.validate(self.today());
        if !errors.is_empty() {
            warn!("scholarship rejected: {errors}");
            return Err(WizardError::Rejected(errors));
        }
        scholarship.id = self.fresh_id();
        let id = scholarship.id;
        info!("added scholarship at {}", scholarship.institution);
        self.state.scholarships.push(scholarship);
        self.report_validity(StepKind::Scholarship, true);
        Ok(id)
    }

    pub fn remove_experience(&mut self, id: Uuid) -> WizardResult<Experience> {
        let index = self
            .state
            .experiences
            .iter()
            .position(|e| e.id == id)
            .ok_or(WizardError::UnknownEntry(id))?;
        let removed = self.state.experiences.remove(index);
        let valid = !self.state.experiences.is_empty();
        self.report_validity(StepKind::ProfessionalExperience, valid);
        Ok(removed)
    }

    pub fn remove_scholarship(&mut self, id: Uuid) -> WizardResult<Scholarship> {
        let index = self
            .state
            .scholarships
            .iter()
            .position(|s| s.id == id)
            .ok_or(WizardError::UnknownEntry(id))?;
        let removed = self.state.scholarships.remove(index);
        let valid = !self.state.scholarships.is_empty();
        self.report_validity(StepKind::Scholarship, valid);
        Ok(removed)
    }

    pub fn submission(&self) -> Submission {
        Submission {
            personal_data: self.state.personal_data.clone(),
            experiences: self.state.experiences.clone(),
            scholarships: self.state.scholarships.clone(),
        }
    }

    /// Hands the collected data to `sink`. Only allowed on the last step
    /// once it is valid; the state is never modified.
    pub fn submit<S: SubmissionSink + ?Sized>(&self, sink: &mut S) -> WizardResult<String> {
        let step = self.state.current_step;
        if !step.is_last() {
            return Err(WizardError::NotAtLastStep(step));
        }
        if !self.state.is_step_valid(step) {
            return Err(WizardError::StepIncomplete(step));
        }
        let receipt = sink.deliver(&self.submission())?;
        info!("submission delivered: {receipt}");
        Ok(receipt)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current_step: self.state.current_step.index(),
            personal_data: self.state.personal_data.clone(),
            experiences: self.state.experiences.clone(),
            scholarships: self.state.scholarships.clone(),
            personal_draft: Vec::new(),
        }
    }

    /// Rebuilds a controller from a persisted snapshot.
    ///
    /// Validity is derived again: personal data (the draft, when one was
    /// saved) is re-validated and the accumulating steps are valid when they
    /// hold at least one entry. The restored step never lies beyond the first
    /// invalid step.
    pub fn restore(snapshot: Snapshot, clock: Clock) -> Self {
        let today = clock.today();
        let personal_values = if snapshot.personal_draft.is_empty() {
            snapshot.personal_data.to_form()
        } else {
            snapshot.personal_draft.clone()
        };
        let personal_valid = Schema::for_step(StepKind::PersonalData)
            .validate(&personal_values, today)
            .is_empty();
        let step_validity = [
            personal_valid,
            !snapshot.experiences.is_empty(),
            !snapshot.scholarships.is_empty(),
        ];

        let requested = snapshot.current_step.min(StepKind::COUNT - 1);
        let reachable = step_validity
            .iter()
            .position(|valid| !valid)
            .unwrap_or(StepKind::COUNT - 1);
        let current_step = StepKind::from_index(requested.min(reachable)).unwrap_or(StepKind::PersonalData);
        if current_step.index() != snapshot.current_step {
            warn!(
                "restored step {} adjusted to {current_step}",
                snapshot.current_step
            );
        }

        Self {
            state: WizardState {
                current_step,
                step_validity,
                personal_data: snapshot.personal_data,
                experiences: snapshot.experiences,
                scholarships: snapshot.scholarships,
            },
            clock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EndDate, Gender, Nationality};
    use crate::infrastructure::MemorySink;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn wizard() -> WizardController {
        WizardController::with_clock(Clock::Fixed(date(2024, 6, 1)))
    }

    fn experience() -> Experience {
        Experience {
            id: Uuid::nil(),
            company_name: "Acme".to_string(),
            job_title: "Engineer".to_string(),
            start_date: date(2019, 3, 1),
            end_date: Some(EndDate::Date(date(2022, 8, 31))),
            description: "Maintained the payments platform".to_string(),
            is_current_job: false,
        }
    }

    fn scholarship() -> Scholarship {
        Scholarship {
            id: Uuid::nil(),
            institution: "UFPE".to_string(),
            course_name: "Computer Science".to_string(),
            start_date: date(2014, 2, 1),
            end_date: Some(EndDate::Date(date(2018, 12, 15))),
            description: String::new(),
        }
    }

    fn personal_data() -> PersonalData {
        PersonalData {
            full_name: "Ana Souza".to_string(),
            gender: Some(Gender::Female),
            nationality: Some(Nationality::Brazilian),
            place_of_birth: "Recife".to_string(),
            birthday: Some(date(1990, 3, 14)),
            ..PersonalData::default()
        }
    }

    fn at_last_step() -> WizardController {
        let mut wizard = wizard();
        wizard.report_validity(StepKind::PersonalData, true);
        wizard.advance().unwrap();
        wizard.add_experience(experience()).unwrap();
        wizard.advance().unwrap();
        wizard
    }

    #[test]
    fn test_advance_blocked_on_empty_personal_data() {
        let mut wizard = wizard();
        let before = wizard.state().clone();
        assert!(matches!(
            wizard.advance(),
            Err(WizardError::StepIncomplete(StepKind::PersonalData))
        ));
        assert_eq!(wizard.state(), &before);
    }

    #[test]
    fn test_advance_after_personal_data_is_valid() {
        let mut wizard = wizard();
        wizard.set_personal_data(personal_data());
        wizard.report_validity(StepKind::PersonalData, true);
        assert_eq!(wizard.advance().unwrap(), StepKind::ProfessionalExperience);
        assert_eq!(wizard.current_step().index(), 1);
    }

    #[test]
    fn test_advance_succeeds_iff_step_valid() {
        for step in StepKind::ALL {
            for valid in [false, true] {
                let mut wizard = wizard();
                for earlier in StepKind::ALL.iter().take(step.index()) {
                    wizard.report_validity(*earlier, true);
                    wizard.advance().unwrap();
                }
                assert_eq!(wizard.current_step(), step);
                wizard.report_validity(step, valid);
                let before = wizard.state().clone();
                let result = wizard.advance();
                if valid && !step.is_last() {
                    assert_eq!(result.unwrap(), step.next().unwrap());
                } else {
                    assert!(result.is_err());
                    assert_eq!(wizard.state(), &before);
                }
            }
        }
    }

    #[test]
    fn test_retreat_is_noop_on_first_step() {
        let mut wizard = wizard();
        assert_eq!(wizard.retreat(), StepKind::PersonalData);
        assert_eq!(wizard.state(), &WizardState::default());
    }

    #[test]
    fn test_retreat_then_advance_round_trip() {
        let mut wizard = at_last_step();
        wizard.add_scholarship(scholarship()).unwrap();
        let before = wizard.state().clone();

        wizard.retreat();
        assert_eq!(wizard.current_step(), StepKind::ProfessionalExperience);
        wizard.advance().unwrap();

        assert_eq!(wizard.state(), &before);
    }

    #[test]
    fn test_validity_is_preserved_when_returning() {
        let mut wizard = at_last_step();
        wizard.add_scholarship(scholarship()).unwrap();
        wizard.retreat();
        wizard.retreat();
        assert!(wizard.state().is_step_valid(StepKind::ProfessionalExperience));
        assert!(wizard.state().is_step_valid(StepKind::Scholarship));
    }

    #[test]
    fn test_experience_step_requires_an_entry() {
        let mut wizard = wizard();
        wizard.report_validity(StepKind::PersonalData, true);
        wizard.advance().unwrap();

        assert!(matches!(
            wizard.advance(),
            Err(WizardError::StepIncomplete(StepKind::ProfessionalExperience))
        ));

        let id = wizard.add_experience(experience()).unwrap();
        assert!(!id.is_nil());
        assert_eq!(wizard.advance().unwrap(), StepKind::Scholarship);
    }

    #[test]
    fn test_current_job_is_normalized_to_present() {
        let mut wizard = wizard();
        let mut current = experience();
        current.is_current_job = true;
        current.end_date = Some(EndDate::Date(date(2001, 1, 1)));
        wizard.add_experience(current).unwrap();
        assert_eq!(wizard.state().experiences()[0].end_date, Some(EndDate::Ongoing));
    }

    #[test]
    fn test_reversed_dates_are_rejected() {
        let mut wizard = wizard();
        let mut reversed = experience();
        reversed.end_date = Some(EndDate::Date(date(2018, 1, 1)));
        assert!(matches!(wizard.add_experience(reversed), Err(WizardError::Rejected(_))));
        assert!(wizard.state().experiences().is_empty());
        assert!(!wizard.state().is_step_valid(StepKind::ProfessionalExperience));

        let mut course = scholarship();
        course.end_date = Some(EndDate::Date(date(2010, 1, 1)));
        match wizard.add_scholarship(course) {
            Err(WizardError::Rejected(errors)) => assert!(errors.get("endDate").is_some()),
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(!wizard.state().is_step_valid(StepKind::Scholarship));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut wizard = wizard();
        let first = wizard.add_experience(experience()).unwrap();
        let second = wizard.add_experience(experience()).unwrap();
        let third = wizard.add_scholarship(scholarship()).unwrap();
        assert_ne!(first, second);
        assert_ne!(second, third);
    }

    #[test]
    fn test_removing_last_entry_closes_the_gate() {
        let mut wizard = wizard();
        let id = wizard.add_scholarship(scholarship()).unwrap();
        assert!(wizard.state().is_step_valid(StepKind::Scholarship));

        let removed = wizard.remove_scholarship(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(!wizard.state().is_step_valid(StepKind::Scholarship));
        assert!(matches!(wizard.remove_scholarship(id), Err(WizardError::UnknownEntry(_))));
    }

    #[test]
    fn test_submit_blocked_when_last_step_invalid() {
        let wizard = at_last_step();
        let before = wizard.state().clone();
        let mut sink = MemorySink::default();

        assert!(matches!(
            wizard.submit(&mut sink),
            Err(WizardError::StepIncomplete(StepKind::Scholarship))
        ));
        assert!(sink.delivered.is_empty());
        assert_eq!(wizard.state(), &before);
    }

    #[test]
    fn test_submit_only_from_last_step() {
        let mut wizard = wizard();
        wizard.report_validity(StepKind::PersonalData, true);
        let mut sink = MemorySink::default();
        assert!(matches!(
            wizard.submit(&mut sink),
            Err(WizardError::NotAtLastStep(StepKind::PersonalData))
        ));
    }

    #[test]
    fn test_submit_packages_collections() {
        let mut wizard = at_last_step();
        wizard.set_personal_data(personal_data());
        wizard.add_scholarship(scholarship()).unwrap();
        let before = wizard.state().clone();
        let mut sink = MemorySink::default();

        wizard.submit(&mut sink).unwrap();

        assert_eq!(sink.delivered.len(), 1);
        let submission = &sink.delivered[0];
        assert_eq!(submission.personal_data.full_name, "Ana Souza");
        assert_eq!(submission.experiences.len(), 1);
        assert_eq!(submission.scholarships.len(), 1);
        assert_eq!(wizard.state(), &before);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let mut wizard = at_last_step();
        wizard.set_personal_data(personal_data());
        wizard.add_scholarship(scholarship()).unwrap();

        let restored = WizardController::restore(wizard.snapshot(), Clock::Fixed(date(2024, 6, 1)));
        assert_eq!(restored.state(), wizard.state());
    }

    #[test]
    fn test_restore_clamps_to_first_invalid_step() {
        let snapshot = Snapshot {
            current_step: 2,
            personal_data: personal_data(),
            ..Snapshot::default()
        };
        let restored = WizardController::restore(snapshot, Clock::Fixed(date(2024, 6, 1)));
        assert_eq!(restored.current_step(), StepKind::ProfessionalExperience);
        assert!(restored.state().is_step_valid(StepKind::PersonalData));

        let out_of_range = Snapshot {
            current_step: 9,
            ..Snapshot::default()
        };
        let restored = WizardController::restore(out_of_range, Clock::Fixed(date(2024, 6, 1)));
        assert_eq!(restored.current_step(), StepKind::PersonalData);
    }

    #[test]
    fn test_restore_validates_personal_draft() {
        let mut draft = personal_data().to_form();
        draft[0].clear();
        let snapshot = Snapshot {
            current_step: 1,
            personal_data: personal_data(),
            personal_draft: draft,
            ..Snapshot::default()
        };
        let restored = WizardController::restore(snapshot, Clock::Fixed(date(2024, 6, 1)));
        assert!(!restored.state().is_step_valid(StepKind::PersonalData));
        assert_eq!(restored.current_step(), StepKind::PersonalData);
    }
}
