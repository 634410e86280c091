//! Command-line configuration.

use crate::application::ValidationMode;
use crate::domain::StepKind;
use clap::Parser;
use directories::ProjectDirs;
use std::path::PathBuf;
use std::time::Duration;

use super::sink::SinkTarget;

/// Multi-step résumé intake form for the terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "cvwiz", version, about)]
pub struct Cli {
    /// Directory holding the saved session and the log file.
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Key under which the session snapshot is stored.
    #[arg(long, default_value = "wizard-state")]
    pub storage_key: String,

    /// Do not restore or save the session.
    #[arg(long)]
    pub no_persist: bool,

    /// Where submitted data goes: json:<path>, csv:<path>, http(s)://<url> or clipboard.
    #[arg(long, default_value = "json:submission.json")]
    pub submit_to: SinkTarget,

    /// Delay before date checks run after typing, in milliseconds.
    #[arg(long, default_value_t = 300)]
    pub debounce_ms: u64,

    #[arg(long, value_enum, default_value_t = ValidationMode::OnBlur)]
    pub personal_validation: ValidationMode,

    #[arg(long, value_enum, default_value_t = ValidationMode::OnChange)]
    pub experience_validation: ValidationMode,

    #[arg(long, value_enum, default_value_t = ValidationMode::OnChange)]
    pub scholarship_validation: ValidationMode,

    /// Log file. Defaults to cvwiz.log inside the state directory.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Resolved settings used to build the application.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: Option<PathBuf>,
    pub storage_key: String,
    pub persist: bool,
    pub submit_to: SinkTarget,
    pub debounce: Duration,
    pub validation_modes: [ValidationMode; StepKind::COUNT],
    pub log_file: Option<PathBuf>,
}

fn default_state_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cvwiz").map(|dirs| dirs.data_dir().to_path_buf())
}

impl Cli {
    pub fn into_config(self) -> Config {
        let state_dir = self.state_dir.or_else(default_state_dir);
        let log_file = self
            .log_file
            .or_else(|| state_dir.as_ref().map(|dir| dir.join("cvwiz.log")));
        Config {
            state_dir,
            storage_key: self.storage_key,
            persist: !self.no_persist,
            submit_to: self.submit_to,
            debounce: Duration::from_millis(self.debounce_ms),
            validation_modes: [
                self.personal_validation,
                self.experience_validation,
                self.scholarship_validation,
            ],
            log_file,
        }
    }
}

impl Config {
    pub fn validation_mode(&self, step: StepKind) -> ValidationMode {
        self.validation_modes[step.index()]
    }
}
