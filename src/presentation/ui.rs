use crate::application::{App, AppMode, StepForm};
use crate::domain::{EndDate, FLAG_ON, FieldKind, FieldSpec, StepKind, format_date};
use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

const LABEL_WIDTH: usize = 26;

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_alert(f, chunks[1]);
    render_section_title(f, app.current_step(), chunks[2]);
    render_body(f, app, chunks[3]);
    render_footer(f, app, chunks[4]);
    render_status_bar(f, app, chunks[5]);

    match app.mode {
        AppMode::Help => render_help_popup(f, app.help_scroll),
        AppMode::ConfirmSubmit => render_confirm_popup(f, app),
        _ => {}
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let step = app.current_step();
    let header = Paragraph::new(format!(
        "cvwiz - Résumé Intake | Step {}/{}: {}",
        step.index() + 1,
        StepKind::COUNT,
        step.title()
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_alert(f: &mut Frame, area: Rect) {
    let alert = Paragraph::new(
        "This form is experimental. Data you enter may be lost and the layout may change.",
    )
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Attention")
            .style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(alert, area);
}

fn render_section_title(f: &mut Frame, step: StepKind, area: Rect) {
    let title = vec![
        Line::from(Span::styled(
            format!("{}. {}", step.index() + 1, step.title()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(step.caption(), Style::default().fg(Color::Gray))),
    ];
    f.render_widget(Paragraph::new(title), area);
}

fn render_body(f: &mut Frame, app: &App, area: Rect) {
    let step = app.current_step();
    if !step.is_accumulating() {
        render_form(f, app, app.current_form(), area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    render_form(f, app, app.current_form(), columns[0]);
    render_entries(f, app, step, columns[1]);
}

fn display_value(field: &FieldSpec, value: &str) -> String {
    match field.kind {
        FieldKind::Flag => {
            if value == FLAG_ON {
                "[x]".to_string()
            } else {
                "[ ]".to_string()
            }
        }
        FieldKind::Choice(choices) => choices
            .iter()
            .find(|(key, _)| *key == value)
            .map(|(_, label)| format!("< {label} >"))
            .unwrap_or_default(),
        _ => value.to_string(),
    }
}

fn render_form(f: &mut Frame, app: &App, form: &StepForm, area: Rect) {
    let mut lines = Vec::new();
    let mut focus_line = 0;

    for (index, field) in form.schema().fields.iter().enumerate() {
        let focused = index == form.focus();
        let disabled = form.is_disabled(field.key);
        let value = &form.values()[index];

        let marker = if field.required { "*" } else { " " };
        let label = format!("{}{} ", field.label, marker);
        let label_style = if focused {
            Style::default().fg(Color::Black).bg(Color::LightBlue)
        } else if disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Yellow)
        };

        let shown = display_value(field, value);
        let value_span = if shown.is_empty() {
            let placeholder = if disabled { String::new() } else { field.placeholder().unwrap_or_default() };
            Span::styled(placeholder, Style::default().fg(Color::DarkGray))
        } else if disabled {
            Span::styled(shown, Style::default().fg(Color::DarkGray))
        } else if focused && app.mode == AppMode::Editing {
            Span::styled(shown, Style::default().fg(Color::Green))
        } else {
            Span::raw(shown)
        };

        if focused {
            focus_line = lines.len();
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{label:>width$}", width = LABEL_WIDTH), label_style),
            Span::raw(" "),
            value_span,
        ]));

        if let Some(message) = form.visible_error(field.key) {
            lines.push(Line::from(Span::styled(
                format!("{:width$} {message}", "", width = LABEL_WIDTH),
                Style::default().fg(Color::Red),
            )));
        }
    }

    let visible = area.height.saturating_sub(2) as usize;
    let scroll = (focus_line + 2).saturating_sub(visible);

    let title = match app.current_step() {
        StepKind::PersonalData => "Form".to_string(),
        _ => "New entry (a: add)".to_string(),
    };
    let widget = Paragraph::new(lines)
        .scroll((scroll as u16, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(widget, area);

    if app.mode == AppMode::Editing {
        let x = area.x + 1 + LABEL_WIDTH as u16 + 1 + form.cursor() as u16;
        let y = area.y + 1 + focus_line.saturating_sub(scroll) as u16;
        f.set_cursor_position((x.min(area.right().saturating_sub(2)), y));
    }
}

fn period(start: NaiveDate, end: Option<EndDate>, marker: &str) -> String {
    let end = match end {
        Some(EndDate::Date(date)) => format_date(date),
        Some(EndDate::Ongoing) => marker.to_string(),
        None => "-".to_string(),
    };
    format!("{} - {}", format_date(start), end)
}

fn render_entries(f: &mut Frame, app: &App, step: StepKind, area: Rect) {
    let state = app.wizard.state();
    let (heading, empty, items): (&str, &str, Vec<ListItem>) = match step {
        StepKind::ProfessionalExperience => (
            "Experiences",
            "No experience registered",
            state
                .experiences()
                .iter()
                .map(|e| {
                    ListItem::new(vec![
                        Line::from(format!("{} - {}", e.company_name, e.job_title)),
                        Line::from(Span::styled(
                            period(e.start_date, e.end_date, EndDate::MARKER),
                            Style::default().fg(Color::Gray),
                        )),
                    ])
                })
                .collect(),
        ),
        StepKind::Scholarship => (
            "Education",
            "No education registered",
            state
                .scholarships()
                .iter()
                .map(|s| {
                    ListItem::new(vec![
                        Line::from(format!("{} - {}", s.institution, s.course_name)),
                        Line::from(Span::styled(
                            period(s.start_date, s.end_date, "ongoing"),
                            Style::default().fg(Color::Gray),
                        )),
                    ])
                })
                .collect(),
        ),
        StepKind::PersonalData => return,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{heading} ({}) [ ]: select, x: remove", items.len()));

    if items.is_empty() {
        let placeholder = Paragraph::new(empty)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(placeholder, area);
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));
    let mut list_state = ListState::default().with_selected(Some(app.selected_entry));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn control(label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!(" {label} "), style)
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let step = app.current_step();
    let mut spans = vec![control("[b] Back", !step.is_first())];
    if step.is_last() {
        spans.push(control("[s] Save", app.wizard.can_submit()));
    } else {
        spans.push(control("[n] Next", app.wizard.can_advance()));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let text = match app.mode {
        AppMode::Normal => app.status_message.clone().unwrap_or_else(|| {
            "↑↓: move | Enter: edit | ←→: choose | a: add | n/b: next/back | s: save | F1/?: help | q: quit"
                .to_string()
        }),
        AppMode::Editing => {
            format!("Editing {} (Enter: done, Esc: stop editing)", app.current_form().focused_field().label)
        }
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
        AppMode::ConfirmSubmit => "Save the collected data? (y/n)".to_string(),
    };

    let status = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Editing => Style::default().fg(Color::Green),
            AppMode::Help => Style::default().fg(Color::Cyan),
            AppMode::ConfirmSubmit => Style::default().fg(Color::Magenta),
        });
    f.render_widget(status, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_confirm_popup(f: &mut Frame, app: &App) {
    let area = centered(f.area(), 50, 7);
    f.render_widget(Clear, area);

    let state = app.wizard.state();
    let text = vec![
        Line::from(format!("Save the data of {}?", state.personal_data().full_name)),
        Line::from(format!(
            "{} experience(s), {} education entr{}",
            state.experiences().len(),
            state.scholarships().len(),
            if state.scholarships().len() == 1 { "y" } else { "ies" }
        )),
        Line::from(""),
        Line::from(Span::styled("y/Enter: save    n/Esc: cancel", Style::default().fg(Color::Gray))),
    ];
    let popup = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Confirm")
            .style(Style::default().fg(Color::Magenta)),
    );
    f.render_widget(popup, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_text = get_help_text();
    let help_lines: Vec<&str> = help_text.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("cvwiz Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

fn get_help_text() -> &'static str {
    r#"CVWIZ - RÉSUMÉ INTAKE WIZARD

=== STEPS ===
1. Personal data          Contact information; required fields are marked *
2. Professional experience Add at least one job before continuing
3. Education              Add at least one course, then save

=== FIELDS ===
Up/Down, Tab/Shift+Tab  Move between fields
Enter or Space          Edit a text field, toggle a check box
Left/Right              Choose an option in a selection field
Backspace/Delete        Clear the focused field
Ctrl+V                  Paste from the clipboard

=== WHILE EDITING ===
Left/Right/Home/End     Move the cursor
Enter or Tab            Finish and go to the next field
Esc                     Stop editing, keep the text

=== ENTRIES ===
a                       Add the entry described by the form
[ and ]                 Select an entry in the list
x                       Remove the selected entry

=== NAVIGATION ===
n or PageDown           Next step (only when the current step is complete)
b or PageUp             Previous step
s                       Save the collected data (last step only)
F1 or ?                 Show this help
q                       Quit

=== FORMATS ===
Dates                   DD/MM/YYYY, never in the future
End dates               On or after the start date; "present" for a current job
Phones                  (99) 9999-9999 or (99) 99999-9999
E-mail and links        Checked when filled in

=== HELP NAVIGATION ===
↑↓ or j/k               Scroll help text up/down one line
Page Up/Down            Scroll help text up/down 5 lines
Home                    Jump to top of help text
Esc/F1/?/q              Close this help window

Your progress is saved as you go and restored on the next start."#
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{Terminal, backend::TestBackend};

    fn rendered(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| render_ui(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_first_step_layout() {
        let app = App::default();
        let screen = rendered(&app);
        assert!(screen.contains("Step 1/3: Personal data"));
        assert!(screen.contains("This form is experimental"));
        assert!(screen.contains("Full name*"));
        assert!(screen.contains("DD/MM/YYYY"));
        assert!(screen.contains("[n] Next"));
        assert!(!screen.contains("[s] Save"));
    }

    #[test]
    fn test_empty_entry_list() {
        let mut app = App::default();
        app.wizard.report_validity(StepKind::PersonalData, true);
        app.next_step();
        let screen = rendered(&app);
        assert!(screen.contains("Experiences (0)"));
        assert!(screen.contains("No experience registered"));
    }

    #[test]
    fn test_period_formatting() {
        let start = NaiveDate::from_ymd_opt(2019, 3, 1).unwrap();
        assert_eq!(period(start, Some(EndDate::Ongoing), "ongoing"), "01/03/2019 - ongoing");
        assert_eq!(period(start, None, EndDate::MARKER), "01/03/2019 - -");
    }

    #[test]
    fn test_help_popup_renders() {
        let mut app = App::default();
        app.open_help();
        assert!(rendered(&app).contains("cvwiz Help"));
    }
}
