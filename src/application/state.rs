//! Application state management for the terminal wizard.
//!
//! This module contains the main application state and mode management
//! for the terminal user interface.

use crate::application::{Debouncer, StepForm, ValidationMode, WizardController, WizardError};
use crate::domain::{Clock, Experience, PersonalData, Scholarship, StepKind};
use crate::infrastructure::{
    Config, FileStore, MemorySink, StateRepository, SubmissionSink, read_clipboard,
};
use log::{debug, info, warn};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Represents the current mode of the application.
///
/// The application can be in different modes that determine how user input
/// is interpreted and what UI elements are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Normal navigation mode - arrow keys move between fields, shortcuts available
    Normal,
    /// Field editing mode - user is typing into the focused field
    Editing,
    /// Help screen is displayed
    Help,
    /// Confirmation dialog before the data is saved
    ConfirmSubmit,
}

/// One form per step, selected by matching on the step.
#[derive(Debug, Clone)]
pub struct StepForms {
    pub personal: StepForm,
    pub experience: StepForm,
    pub scholarship: StepForm,
}

impl StepForms {
    pub fn new(modes: [ValidationMode; StepKind::COUNT]) -> Self {
        Self {
            personal: StepForm::new(StepKind::PersonalData, modes[0]),
            experience: StepForm::new(StepKind::ProfessionalExperience, modes[1]),
            scholarship: StepForm::new(StepKind::Scholarship, modes[2]),
        }
    }

    pub fn get(&self, step: StepKind) -> &StepForm {
        match step {
            StepKind::PersonalData => &self.personal,
            StepKind::ProfessionalExperience => &self.experience,
            StepKind::Scholarship => &self.scholarship,
        }
    }

    pub fn get_mut(&mut self, step: StepKind) -> &mut StepForm {
        match step {
            StepKind::PersonalData => &mut self.personal,
            StepKind::ProfessionalExperience => &mut self.experience,
            StepKind::Scholarship => &mut self.scholarship,
        }
    }
}

const DEFAULT_MODES: [ValidationMode; StepKind::COUNT] = [
    ValidationMode::OnBlur,
    ValidationMode::OnChange,
    ValidationMode::OnChange,
];

/// Main application state containing the wizard and UI state.
///
/// This structure holds all the data needed to render the terminal UI
/// and manage user interactions with the wizard.
///
/// # Examples
///
/// ```
/// use cvwiz::application::{App, AppMode};
/// use cvwiz::domain::StepKind;
///
/// let app = App::default();
/// assert_eq!(app.current_step(), StepKind::PersonalData);
/// assert_eq!(app.mode, AppMode::Normal);
/// ```
#[derive(Debug)]
pub struct App {
    /// The wizard state machine
    pub wizard: WizardController,
    /// Editable forms, one per step
    pub forms: StepForms,
    /// Current application mode
    pub mode: AppMode,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Highlighted entry in the list of the current accumulating step
    pub selected_entry: usize,
    /// Pending validation after typing
    pub debouncer: Debouncer,
    /// Where session snapshots are saved, if anywhere
    pub repository: Option<StateRepository>,
    /// Destination of the final submission
    pub sink: Box<dyn SubmissionSink>,
    /// Receipt of the last successful submission
    pub last_receipt: Option<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new(
            WizardController::new(),
            DEFAULT_MODES,
            Duration::from_millis(300),
            None,
            Box::new(MemorySink::default()),
        )
    }
}

impl App {
    /// Creates the application around an existing wizard.
    ///
    /// The personal-data form is pre-filled from the wizard's record and
    /// validated so that its errors are ready once fields are visited.
    pub fn new(
        wizard: WizardController,
        modes: [ValidationMode; StepKind::COUNT],
        debounce: Duration,
        repository: Option<StateRepository>,
        sink: Box<dyn SubmissionSink>,
    ) -> Self {
        let mut forms = StepForms::new(modes);
        if wizard.state().personal_data() != &PersonalData::default() {
            forms.personal = StepForm::with_values(
                StepKind::PersonalData,
                modes[0],
                wizard.state().personal_data().to_form(),
            );
            forms.personal.validate(wizard.today());
        }
        Self {
            wizard,
            forms,
            mode: AppMode::Normal,
            status_message: None,
            help_scroll: 0,
            selected_entry: 0,
            debouncer: Debouncer::new(debounce),
            repository,
            sink,
            last_receipt: None,
        }
    }

    /// Builds the application from configuration, restoring the saved
    /// session when persistence is enabled.
    pub fn from_config(config: &Config) -> Self {
        let repository = match (&config.state_dir, config.persist) {
            (Some(dir), true) => Some(StateRepository::new(
                Box::new(FileStore::new(dir.clone())),
                config.storage_key.clone(),
            )),
            _ => None,
        };
        Self::resume(
            repository,
            Clock::System,
            StepKind::ALL.map(|step| config.validation_mode(step)),
            config.debounce,
            config.submit_to.clone().into_sink(),
        )
    }

    /// Restores the session saved in `repository`, if any, including an
    /// unfinished personal-data draft.
    pub fn resume(
        repository: Option<StateRepository>,
        clock: Clock,
        modes: [ValidationMode; StepKind::COUNT],
        debounce: Duration,
        sink: Box<dyn SubmissionSink>,
    ) -> Self {
        let (wizard, draft) = match repository.as_ref().and_then(StateRepository::load) {
            Some(snapshot) => {
                info!("restoring saved session at step {}", snapshot.current_step + 1);
                let draft = snapshot.personal_draft.clone();
                (WizardController::restore(snapshot, clock), draft)
            }
            None => (WizardController::with_clock(clock), Vec::new()),
        };
        let mut app = Self::new(wizard, modes, debounce, repository, sink);
        if !draft.is_empty() {
            app.forms.personal = StepForm::with_values(StepKind::PersonalData, modes[0], draft);
            app.forms.personal.validate(app.wizard.today());
        }
        app
    }

    pub fn current_step(&self) -> StepKind {
        self.wizard.current_step()
    }

    pub fn current_form(&self) -> &StepForm {
        self.forms.get(self.current_step())
    }

    pub fn current_form_mut(&mut self) -> &mut StepForm {
        let step = self.current_step();
        self.forms.get_mut(step)
    }

    /// Writes a snapshot of the wizard. Failures are logged and otherwise
    /// ignored.
    fn persist(&mut self) {
        let Some(repository) = self.repository.as_mut() else {
            return;
        };
        let mut snapshot = self.wizard.snapshot();
        let draft = self.forms.personal.values();
        if draft != snapshot.personal_data.to_form().as_slice() {
            snapshot.personal_draft = draft.to_vec();
        }
        if let Err(e) = repository.save(&snapshot) {
            warn!("could not save session: {e}");
        }
    }

    /// Validates the current form and, for personal data, reports the result
    /// to the wizard.
    pub fn revalidate_current(&mut self) {
        let step = self.current_step();
        let today = self.wizard.today();
        let form = self.forms.get_mut(step);
        let valid = form.validate(today);
        debug!("{step} form valid: {valid}");

        if step == StepKind::PersonalData {
            if valid {
                match PersonalData::from_form(form.values()) {
                    Ok(data) => self.wizard.set_personal_data(data),
                    Err(e) => warn!("personal data did not convert: {e}"),
                }
            }
            self.wizard.report_validity(step, valid);
            self.persist();
        }
    }

    /// Date-order checks wait for typing to pause; everything else in
    /// on-change mode is checked right away.
    fn after_change(&mut self, now: Instant) {
        let form = self.current_form();
        let mode = form.mode();
        let debounced = form.schema().has_date_order();
        match mode {
            ValidationMode::OnChange if debounced => self.debouncer.schedule(now),
            ValidationMode::OnChange => self.revalidate_current(),
            ValidationMode::OnBlur => {}
        }
    }

    fn after_blur(&mut self) {
        if self.current_form().mode() == ValidationMode::OnBlur {
            self.debouncer.cancel();
            self.revalidate_current();
        }
    }

    /// Runs a debounced validation whose delay has elapsed.
    pub fn tick(&mut self, now: Instant) {
        if self.debouncer.fire(now) {
            self.revalidate_current();
        }
    }

    /// Starts interacting with the focused field.
    ///
    /// Flags are toggled and choices cycled in place; text fields switch to
    /// editing mode.
    pub fn start_editing(&mut self, now: Instant) {
        self.status_message = None;
        let form = self.current_form_mut();
        if form.toggle_flag() || form.cycle_choice(true) {
            self.after_change(now);
            return;
        }
        form.cursor_end();
        self.mode = AppMode::Editing;
    }

    /// Leaves editing mode and moves to the next field.
    pub fn finish_editing(&mut self) {
        self.mode = AppMode::Normal;
        self.focus_next();
    }

    /// Leaves editing mode keeping focus on the field.
    pub fn cancel_editing(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn focus_next(&mut self) {
        self.current_form_mut().focus_next();
        self.after_blur();
    }

    pub fn focus_prev(&mut self) {
        self.current_form_mut().focus_prev();
        self.after_blur();
    }

    pub fn cycle_choice(&mut self, forward: bool, now: Instant) {
        if self.current_form_mut().cycle_choice(forward) {
            self.after_change(now);
        }
    }

    pub fn insert_char(&mut self, c: char, now: Instant) {
        if self.current_form_mut().insert_char(c) {
            self.after_change(now);
        }
    }

    pub fn backspace(&mut self, now: Instant) {
        if self.current_form_mut().backspace() {
            self.after_change(now);
        }
    }

    pub fn delete(&mut self, now: Instant) {
        if self.current_form_mut().delete() {
            self.after_change(now);
        }
    }

    pub fn clear_field(&mut self, now: Instant) {
        if self.current_form_mut().clear_focused() {
            self.after_change(now);
        }
    }

    pub fn paste(&mut self, text: &str, now: Instant) {
        if self.current_form_mut().insert_str(text) {
            self.after_change(now);
        }
    }

    pub fn paste_from_clipboard(&mut self, now: Instant) {
        match read_clipboard() {
            Ok(text) => self.paste(&text, now),
            Err(e) => self.status_message = Some(format!("Paste failed: {e}")),
        }
    }

    /// Adds the current form's entry to its collection.
    ///
    /// Only meaningful on accumulating steps. On success the form is emptied
    /// and the new entry highlighted.
    pub fn add_entry(&mut self) {
        let step = self.current_step();
        if !step.is_accumulating() {
            return;
        }
        self.debouncer.cancel();
        let today = self.wizard.today();
        let form = self.forms.get_mut(step);
        form.touch_all();
        if !form.validate(today) {
            self.status_message =
                Some("Fill in all required fields correctly before adding the entry".to_string());
            return;
        }

        let values = form.values().to_vec();
        let result = match step {
            StepKind::ProfessionalExperience => Experience::from_form(&values)
                .map_err(|e| e.to_string())
                .and_then(|e| self.wizard.add_experience(e).map_err(|e| e.to_string())),
            StepKind::Scholarship => Scholarship::from_form(&values)
                .map_err(|e| e.to_string())
                .and_then(|s| self.wizard.add_scholarship(s).map_err(|e| e.to_string())),
            StepKind::PersonalData => return,
        };

        match result {
            Ok(_) => {
                self.forms.get_mut(step).reset();
                self.selected_entry = self.wizard.state().entry_count(step).saturating_sub(1);
                self.status_message = Some(match step {
                    StepKind::Scholarship => "Education added".to_string(),
                    _ => "Experience added".to_string(),
                });
                self.persist();
            }
            Err(message) => self.status_message = Some(message),
        }
    }

    fn selected_entry_id(&self) -> Option<Uuid> {
        let state = self.wizard.state();
        match self.current_step() {
            StepKind::PersonalData => None,
            StepKind::ProfessionalExperience => state.experiences().get(self.selected_entry).map(|e| e.id),
            StepKind::Scholarship => state.scholarships().get(self.selected_entry).map(|s| s.id),
        }
    }

    /// Removes the highlighted entry of the current accumulating step.
    pub fn remove_selected_entry(&mut self) {
        let Some(id) = self.selected_entry_id() else {
            return;
        };
        let result = match self.current_step() {
            StepKind::ProfessionalExperience => self.wizard.remove_experience(id).map(|e| e.company_name),
            StepKind::Scholarship => self.wizard.remove_scholarship(id).map(|s| s.institution),
            StepKind::PersonalData => return,
        };
        match result {
            Ok(name) => {
                let count = self.wizard.state().entry_count(self.current_step());
                self.selected_entry = self.selected_entry.min(count.saturating_sub(1));
                self.status_message = Some(format!("Removed {name}"));
                self.persist();
            }
            Err(e) => self.status_message = Some(e.to_string()),
        }
    }

    pub fn select_next_entry(&mut self) {
        let count = self.wizard.state().entry_count(self.current_step());
        if self.selected_entry + 1 < count {
            self.selected_entry += 1;
        }
    }

    pub fn select_prev_entry(&mut self) {
        self.selected_entry = self.selected_entry.saturating_sub(1);
    }

    /// Moves to the next step if the wizard allows it.
    ///
    /// A pending debounced validation belongs to the step being left and is
    /// discarded.
    pub fn next_step(&mut self) {
        self.debouncer.cancel();
        self.mode = AppMode::Normal;
        if self.current_step() == StepKind::PersonalData {
            self.forms.personal.touch_all();
            self.revalidate_current();
        }
        match self.wizard.advance() {
            Ok(step) => {
                self.selected_entry = 0;
                self.status_message = None;
                info!("moved to {step}");
                self.persist();
            }
            Err(e) => {
                self.status_message = Some(match e {
                    WizardError::StepIncomplete(StepKind::ProfessionalExperience) => {
                        "Add at least one experience before continuing".to_string()
                    }
                    other => other.to_string(),
                });
            }
        }
    }

    pub fn prev_step(&mut self) {
        self.debouncer.cancel();
        self.mode = AppMode::Normal;
        let before = self.current_step();
        if self.wizard.retreat() != before {
            self.selected_entry = 0;
            self.status_message = None;
            self.persist();
        }
    }

    /// Opens the confirmation dialog if the data may be submitted.
    pub fn request_submit(&mut self) {
        if self.wizard.can_submit() {
            self.mode = AppMode::ConfirmSubmit;
            self.status_message = None;
            return;
        }
        let step = self.current_step();
        self.status_message = Some(if step.is_last() {
            "Add at least one education entry before saving".to_string()
        } else {
            WizardError::NotAtLastStep(step).to_string()
        });
    }

    /// Hands the collected data to the configured sink.
    pub fn confirm_submit(&mut self) {
        self.mode = AppMode::Normal;
        match self.wizard.submit(self.sink.as_mut()) {
            Ok(receipt) => {
                self.status_message = Some(format!("Data saved successfully: {receipt}"));
                self.last_receipt = Some(receipt);
                if let Some(repository) = self.repository.as_mut() {
                    if let Err(e) = repository.clear() {
                        warn!("could not discard saved session: {e}");
                    }
                }
            }
            Err(e) => self.status_message = Some(format!("Save failed: {e}")),
        }
    }

    pub fn cancel_submit(&mut self) {
        self.mode = AppMode::Normal;
    }

    pub fn open_help(&mut self) {
        self.mode = AppMode::Help;
        self.help_scroll = 0;
    }

    pub fn close_help(&mut self) {
        self.mode = AppMode::Normal;
    }

    /// Time until the event loop should wake up for a pending validation.
    pub fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.debouncer.time_until(now)
    }
}
