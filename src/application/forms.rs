//! Editable form state for one wizard step.
//!
//! A `StepForm` holds the raw text of each field in schema order, tracks
//! which fields were visited and keeps the messages of the last validation
//! pass. It never touches the wizard state; the owner decides when to
//! validate and what to report upward.

use chrono::NaiveDate;

use crate::domain::{FLAG_ON, FieldErrors, FieldKind, FieldSpec, Schema, StepKind};

/// When field errors are recomputed and shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ValidationMode {
    /// After every change; errors appear as soon as a field has content.
    OnChange,
    /// When focus leaves a field; errors appear for visited fields only.
    OnBlur,
}

#[derive(Debug, Clone)]
pub struct StepForm {
    step: StepKind,
    mode: ValidationMode,
    values: Vec<String>,
    touched: Vec<bool>,
    errors: FieldErrors,
    valid: bool,
    focus: usize,
    cursor: usize,
}

fn byte_index(value: &str, char_index: usize) -> usize {
    value
        .char_indices()
        .nth(char_index)
        .map(|(index, _)| index)
        .unwrap_or(value.len())
}

impl StepForm {
    pub fn new(step: StepKind, mode: ValidationMode) -> Self {
        let schema = Schema::for_step(step);
        Self {
            step,
            mode,
            values: schema.empty_values(),
            touched: vec![false; schema.fields.len()],
            errors: FieldErrors::default(),
            valid: false,
            focus: 0,
            cursor: 0,
        }
    }

    /// A form pre-filled with `values`, missing trailing fields left empty.
    pub fn with_values(step: StepKind, mode: ValidationMode, values: Vec<String>) -> Self {
        let mut form = Self::new(step, mode);
        for (slot, value) in form.values.iter_mut().zip(values) {
            *slot = value;
        }
        form.cursor = form.values[0].chars().count();
        form
    }

    pub fn step(&self) -> StepKind {
        self.step
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn schema(&self) -> &'static Schema {
        Schema::for_step(self.step)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn value(&self, key: &str) -> &str {
        self.schema().value(&self.values, key)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Result of the last validation pass.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_disabled(&self, key: &str) -> bool {
        self.schema().is_disabled(key, &self.values)
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn focused_field(&self) -> &'static FieldSpec {
        &self.schema().fields[self.focus]
    }

    /// Recomputes field errors against `today`. Returns the new validity.
    pub fn validate(&mut self, today: NaiveDate) -> bool {
        self.errors = self.schema().validate(&self.values, today);
        self.valid = self.errors.is_empty();
        self.valid
    }

    /// Message to display for a field, if any.
    pub fn visible_error(&self, key: &str) -> Option<&str> {
        let message = self.errors.get(key)?;
        let index = self.schema().index_of(key)?;
        let shown = match self.mode {
            ValidationMode::OnBlur => self.touched[index],
            ValidationMode::OnChange => self.touched[index] || !self.values[index].trim().is_empty(),
        };
        shown.then_some(message)
    }

    pub fn touch_all(&mut self) {
        self.touched.iter_mut().for_each(|touched| *touched = true);
    }

    fn move_focus(&mut self, forward: bool) {
        self.touched[self.focus] = true;
        let count = self.values.len();
        for _ in 0..count {
            self.focus = if forward {
                (self.focus + 1) % count
            } else {
                (self.focus + count - 1) % count
            };
            if !self.is_disabled(self.schema().fields[self.focus].key) {
                break;
            }
        }
        self.cursor = self.values[self.focus].chars().count();
    }

    /// Moves focus to the next enabled field, marking the current one as
    /// visited.
    pub fn focus_next(&mut self) {
        self.move_focus(true);
    }

    pub fn focus_prev(&mut self) {
        self.move_focus(false);
    }

    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.schema().index_of(key) {
            Some(index) => {
                self.values[index] = value.into();
                if index == self.focus {
                    self.cursor = self.values[index].chars().count();
                }
                true
            }
            None => false,
        }
    }

    fn is_text_focused(&self) -> bool {
        !matches!(self.focused_field().kind, FieldKind::Flag | FieldKind::Choice(_))
    }

    fn is_editable(&self) -> bool {
        self.is_text_focused() && !self.is_disabled(self.focused_field().key)
    }

    pub fn insert_char(&mut self, c: char) -> bool {
        if !self.is_editable() {
            return false;
        }
        let value = &mut self.values[self.focus];
        let at = byte_index(value, self.cursor);
        value.insert(at, c);
        self.cursor += 1;
        true
    }

    /// Inserts pasted text at the cursor, dropping line breaks.
    pub fn insert_str(&mut self, text: &str) -> bool {
        let mut changed = false;
        for c in text.chars().filter(|c| *c != '\n' && *c != '\r') {
            changed |= self.insert_char(c);
        }
        changed
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 || !self.is_editable() {
            return false;
        }
        let value = &mut self.values[self.focus];
        let at = byte_index(value, self.cursor - 1);
        value.remove(at);
        self.cursor -= 1;
        true
    }

    pub fn delete(&mut self) -> bool {
        if !self.is_editable() {
            return false;
        }
        let value = &mut self.values[self.focus];
        if self.cursor >= value.chars().count() {
            return false;
        }
        let at = byte_index(value, self.cursor);
        value.remove(at);
        true
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.values[self.focus].chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.values[self.focus].chars().count();
    }

    pub fn clear_focused(&mut self) -> bool {
        if self.values[self.focus].is_empty() {
            return false;
        }
        self.values[self.focus].clear();
        self.cursor = 0;
        true
    }

    /// Toggles the focused flag field. Turning a flag on clears the fields
    /// it disables.
    pub fn toggle_flag(&mut self) -> bool {
        let field = self.focused_field();
        if field.kind != FieldKind::Flag {
            return false;
        }
        let turning_on = self.values[self.focus] != FLAG_ON;
        self.values[self.focus] = if turning_on { FLAG_ON.to_string() } else { String::new() };
        if turning_on {
            let schema = self.schema();
            for (index, spec) in schema.fields.iter().enumerate() {
                if schema.is_disabled(spec.key, &self.values) {
                    self.values[index].clear();
                }
            }
        }
        self.touched[self.focus] = true;
        true
    }

    /// Selects the next (or previous) option of the focused choice field.
    pub fn cycle_choice(&mut self, forward: bool) -> bool {
        let FieldKind::Choice(choices) = self.focused_field().kind else {
            return false;
        };
        let current = choices
            .iter()
            .position(|(value, _)| *value == self.values[self.focus]);
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => choices.len() - 1,
            (Some(index), true) => (index + 1) % choices.len(),
            (Some(index), false) => (index + choices.len() - 1) % choices.len(),
        };
        self.values[self.focus] = choices[next].0.to_string();
        self.touched[self.focus] = true;
        true
    }

    /// Empties every field, as after an entry has been added.
    pub fn reset(&mut self) {
        *self = Self::new(self.step, self.mode);
    }
}
