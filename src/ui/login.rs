//! Sign-in / sign-up screen

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::app::App;
use crate::forms::{LoginField, LoginMode};
use crate::ui::{button_line, centered, field_error_line, input_widget, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let form = &app.login;
    let fields = form.fields();

    // title + 3 rows per field + error + button + switch hint
    let height = 2 + 3 * fields.len() as u16 + 4 + 2;
    let panel = centered(area, 50, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(format!(" {} ", form.title()), Theme::title()))
        .style(Style::default().bg(Theme::BACKGROUND_LIGHT));
    let inner = block.inner(panel);
    frame.render_widget(block, panel);

    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.extend([
        Constraint::Length(1), // error
        Constraint::Length(1), // button
        Constraint::Length(1),
        Constraint::Length(1), // switch hint
        Constraint::Min(0),
    ]);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, field) in fields.iter().enumerate() {
        let (label, input) = match field {
            LoginField::Email => ("Email", &form.email),
            LoginField::Password => ("Password", &form.password),
            LoginField::Repeat => ("Repeat password", &form.repeat),
        };
        frame.render_widget(input_widget(label, input, form.focus == *field), rows[i]);
    }

    let n = fields.len();
    frame.render_widget(
        Paragraph::new(field_error_line(form.error.as_ref())),
        rows[n],
    );
    frame.render_widget(
        Paragraph::new(button_line(form.title(), !app.busy)).alignment(Alignment::Center),
        rows[n + 1],
    );

    let hint = match form.mode {
        LoginMode::SignIn => "New here? Ctrl+T to sign up now.",
        LoginMode::SignUp => "Already have an account? Ctrl+T to sign in.",
    };
    frame.render_widget(
        Paragraph::new(Span::styled(hint, Theme::dimmed())).alignment(Alignment::Center),
        rows[n + 3],
    );
}
