use crate::application::{App, AppMode};
use crossterm::event::{KeyCode, KeyModifiers};
use std::time::Instant;

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        let now = Instant::now();
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers, now),
            AppMode::Editing => Self::handle_editing_mode(app, key, modifiers, now),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::ConfirmSubmit => Self::handle_confirm_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers, now: Instant) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            if key == KeyCode::Char('v') {
                app.paste_from_clipboard(now);
            }
            return;
        }

        match key {
            KeyCode::Up | KeyCode::Char('k') | KeyCode::BackTab => app.focus_prev(),
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => app.focus_next(),
            KeyCode::Left | KeyCode::Char('h') => app.cycle_choice(false, now),
            KeyCode::Right | KeyCode::Char('l') => app.cycle_choice(true, now),
            KeyCode::Enter | KeyCode::Char(' ') | KeyCode::F(2) => app.start_editing(now),
            KeyCode::Backspace | KeyCode::Delete => app.clear_field(now),
            KeyCode::Char('a') => app.add_entry(),
            KeyCode::Char('x') => app.remove_selected_entry(),
            KeyCode::Char('[') => app.select_prev_entry(),
            KeyCode::Char(']') => app.select_next_entry(),
            KeyCode::Char('n') | KeyCode::PageDown => app.next_step(),
            KeyCode::Char('b') | KeyCode::PageUp => app.prev_step(),
            KeyCode::Char('s') => app.request_submit(),
            KeyCode::F(1) | KeyCode::Char('?') => app.open_help(),
            _ => {}
        }
    }

    fn handle_editing_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers, now: Instant) {
        match key {
            KeyCode::Enter | KeyCode::Tab => {
                app.finish_editing();
            }
            KeyCode::Esc => {
                app.cancel_editing();
            }
            KeyCode::Backspace => {
                app.backspace(now);
            }
            KeyCode::Delete => {
                app.delete(now);
            }
            KeyCode::Left => {
                app.current_form_mut().cursor_left();
            }
            KeyCode::Right => {
                app.current_form_mut().cursor_right();
            }
            KeyCode::Home => {
                app.current_form_mut().cursor_home();
            }
            KeyCode::End => {
                app.current_form_mut().cursor_end();
            }
            KeyCode::Char('v') if modifiers.contains(KeyModifiers::CONTROL) => {
                app.paste_from_clipboard(now);
            }
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.insert_char(c, now);
            }
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.close_help();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if app.help_scroll > 0 {
                    app.help_scroll -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_confirm_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_submit(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_submit(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StepKind;

    fn press(app: &mut App, key: KeyCode) {
        InputHandler::handle_key_event(app, key, KeyModifiers::NONE);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_enter_starts_and_finishes_editing() {
        let mut app = App::default();
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, AppMode::Editing));

        type_text(&mut app, "Ana");
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.current_form().value("fullName"), "An");

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, AppMode::Normal));
        assert_eq!(app.current_form().focused_field().key, "gender");
    }

    #[test]
    fn test_escape_keeps_focus() {
        let mut app = App::default();
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "n");
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, AppMode::Normal));
        assert_eq!(app.current_form().focused_field().key, "fullName");
        assert_eq!(app.current_form().value("fullName"), "n");
    }

    #[test]
    fn test_letters_are_shortcuts_only_in_normal_mode() {
        let mut app = App::default();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.current_step(), StepKind::PersonalData);
        assert!(app.status_message.is_some());

        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "nasb");
        assert_eq!(app.current_form().value("fullName"), "nasb");
        assert!(matches!(app.mode, AppMode::Editing));
    }

    #[test]
    fn test_arrows_cycle_choices() {
        let mut app = App::default();
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.current_form().value("gender"), "male");
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.current_form().value("gender"), "female");
    }

    #[test]
    fn test_help_mode() {
        let mut app = App::default();
        press(&mut app, KeyCode::F(1));
        assert!(matches!(app.mode, AppMode::Help));

        press(&mut app, KeyCode::PageDown);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.help_scroll, 4);

        press(&mut app, KeyCode::Char('q'));
        assert!(matches!(app.mode, AppMode::Normal));
    }

    #[test]
    fn test_save_outside_last_step_is_refused() {
        let mut app = App::default();
        press(&mut app, KeyCode::Char('s'));
        assert!(matches!(app.mode, AppMode::Normal));
        assert!(app.status_message.as_ref().unwrap().contains("last step"));
    }

    #[test]
    fn test_confirm_dialog_can_be_cancelled() {
        let mut app = App::default();
        app.mode = AppMode::ConfirmSubmit;
        press(&mut app, KeyCode::Char('x'));
        assert!(matches!(app.mode, AppMode::ConfirmSubmit));
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, AppMode::Normal));
        assert!(app.last_receipt.is_none());
    }
}
