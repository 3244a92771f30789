//! Terminal UI components
//!
//! Built with ratatui. Every screen is a pure function of `&App`; the
//! top-level [`render`] picks one from [`App::screen`] and layers the modal,
//! alert and toast over it.

pub mod account;
pub mod browse;
pub mod login;
pub mod modal;
pub mod plans;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, Page, Screen};
use crate::forms::{FormError, TextInput};

/// Draw the whole frame
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(Theme::text()), area);

    // Main layout: header, content, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    let screen = app.screen();
    render_header(frame, chunks[0], app, screen);
    match screen {
        Screen::Loading => render_loading(frame, chunks[1], "Restoring session..."),
        Screen::Login => login::render(frame, chunks[1], app),
        Screen::Plans => plans::render(frame, chunks[1], app),
        Screen::EmailChange => account::render_email_change(frame, chunks[1], app),
        Screen::PasswordChange => account::render_password_change(frame, chunks[1], app),
        Screen::EditProfile => account::render_profile_editor(frame, chunks[1], app),
        Screen::Home => browse::render_home(frame, chunks[1], app),
        Screen::MyList | Screen::Liked => browse::render_list(frame, chunks[1], app),
        Screen::Account => account::render(frame, chunks[1], app),
    }
    render_status_bar(frame, chunks[2], app, screen);

    if app.modal_visible() {
        modal::render(frame, chunks[1], app);
    }
    if let Some(ref toast) = app.toast {
        render_toast(frame, chunks[1], toast);
    }
    if let Some(ref error) = app.error {
        render_error_popup(frame, area, error);
    }
}

/// Logo plus page tabs once signed in
fn render_header(frame: &mut Frame, area: Rect, app: &App, screen: Screen) {
    let mut spans = vec![Span::styled(" FLIXTUI ", Theme::title())];

    if screen.is_page() {
        spans.push(Span::raw("  "));
        for page in Page::ALL {
            let style = if page == app.page {
                Theme::selected().add_modifier(Modifier::UNDERLINED)
            } else {
                Theme::list_item()
            };
            spans.push(Span::styled(format!(" {} ", page.title()), style));
        }
    }

    let profile = &app.store.state().profiles.current_profile;
    let right = match &app.user {
        Some(user) if !profile.is_empty() => format!("{} ({}) ", profile, user.email),
        Some(user) => format!("{} ", user.email),
        None => String::new(),
    };

    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right.len() as u16 + 2)])
        .split(area);

    let block = || {
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Theme::border())
    };
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block()), header_chunks[0]);
    frame.render_widget(
        Paragraph::new(Span::styled(right, Theme::dimmed()))
            .alignment(Alignment::Right)
            .block(block()),
        header_chunks[1],
    );
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App, screen: Screen) {
    let help = if app.modal_visible() {
        "Esc:close  m:mute  a:my list  f:like"
    } else {
        match screen {
            Screen::Loading => "q:quit",
            Screen::Login => "Tab:next field  Ctrl+T:sign in/up  Enter:submit  Esc:quit",
            Screen::Plans if app.store.state().subscription.is_changing_plan => {
                "←/→:move  Space:choose  Enter:submit  Esc:cancel"
            }
            Screen::Plans => "←/→:move  Space:choose  Enter:submit  o:sign out",
            Screen::EmailChange => "Enter:next  Esc:cancel",
            Screen::PasswordChange => "Tab:switch field  Enter:next  Esc:cancel",
            Screen::EditProfile => "↑/↓:icon  Enter:save  Esc:cancel",
            Screen::Home => "←/→/↑/↓:browse  Enter:details  r:reload  1-4:pages  o:sign out  q:quit",
            Screen::MyList | Screen::Liked => "arrows:move  Enter:details  1-4:pages  q:quit",
            Screen::Account => "↑/↓:move  Enter:select  1-4:pages  q:quit",
        }
    };

    let mut spans = Vec::new();
    if app.busy {
        spans.push(Span::styled(" ⟳ ", Theme::loading()));
    }
    spans.push(Span::styled(format!(" {} ", help), Theme::keybind_desc()));

    let status = Paragraph::new(Line::from(spans)).style(Theme::status_bar());
    frame.render_widget(status, area);
}

/// Centered loading message
pub fn render_loading(frame: &mut Frame, area: Rect, message: &str) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(format!("⟳ {}", message), Theme::loading())),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

/// Blocking alert; any key dismisses it
pub fn render_error_popup(frame: &mut Frame, area: Rect, error: &str) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 6;
    let popup_area = centered(area, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let error_block = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(error, Theme::error())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Theme::error())
            .title(Span::styled(" ✗ ERROR ", Theme::error()))
            .style(Style::default().bg(Theme::BACKGROUND)),
    );

    frame.render_widget(error_block, popup_area);
}

/// One-line confirmation at the bottom of the content area
fn render_toast(frame: &mut Frame, area: Rect, message: &str) {
    let width = (message.chars().count() as u16 + 4).min(area.width);
    let toast_area = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(3),
        width,
        height: 3.min(area.height),
    };
    frame.render_widget(Clear, toast_area);
    frame.render_widget(
        Paragraph::new(Span::styled(message, Theme::success()))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Theme::border())
                    .style(Style::default().bg(Theme::BACKGROUND_LIGHT)),
            ),
        toast_area,
    );
}

/// Rect of the given size centered in `area`
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

/// Bordered text input, with a cursor bar when focused
pub fn input_widget<'a>(label: &'a str, input: &TextInput, focused: bool) -> Paragraph<'a> {
    let shown = input.display();
    let text = if focused {
        let split = shown
            .char_indices()
            .nth(input.cursor())
            .map(|(i, _)| i)
            .unwrap_or(shown.len());
        let (before, after) = shown.split_at(split);
        format!("{}│{}", before, after)
    } else {
        shown
    };

    let border = if focused {
        Theme::border_focused()
    } else {
        Theme::border()
    };
    Paragraph::new(text).style(Theme::input()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(Span::styled(format!(" {} ", label), Theme::secondary())),
    )
}

/// Field message under an input
pub fn field_error_line(error: Option<&FormError>) -> Line<'static> {
    match error {
        Some(FormError::Field(e)) => Line::from(Span::styled(e.to_string(), Theme::error())),
        _ => Line::from(""),
    }
}

/// Red button, greyed out when disabled
pub fn button_line(label: &str, enabled: bool) -> Line<'static> {
    let style = if enabled {
        Theme::button()
    } else {
        Theme::button_disabled()
    };
    Line::from(Span::styled(format!("  {}  ", label), style))
}
