//! Account page and the settings editors it opens

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph},
};

use crate::app::App;
use crate::forms::FlowStep;
use crate::ui::{button_line, centered, field_error_line, input_widget, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.store.state();

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    // Membership summary
    let plan = state
        .subscription
        .plan
        .as_ref()
        .map(|p| p.to_string())
        .unwrap_or_else(|| "No plan".to_string());
    let member_since = state
        .subscription
        .member_since()
        .map(|d| format!("Member since {}", d))
        .unwrap_or_default();
    let email = app.user.as_ref().map(|u| u.email.as_str()).unwrap_or("");

    let mut lines = vec![
        Line::from(Span::styled("Account", Theme::title())),
        Line::from(Span::styled(member_since, Theme::dimmed())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Email: ", Theme::dimmed()),
            Span::raw(email.to_string()),
        ]),
        Line::from(vec![
            Span::styled("Password: ", Theme::dimmed()),
            Span::raw("••••••••"),
        ]),
        Line::from(vec![
            Span::styled("Plan: ", Theme::dimmed()),
            Span::raw(plan),
        ]),
        Line::from(""),
        Line::from(Span::styled("Profiles", Theme::secondary())),
    ];
    let current = &state.profiles.current_profile;
    lines.extend(app.profiles.iter().map(|p| {
        let marker = if &p.name == current { "▶ " } else { "  " };
        Line::from(vec![
            Span::styled(marker, Theme::title()),
            Span::raw(p.name.clone()),
            Span::styled(format!("  ({})", p.profile_icon), Theme::dimmed()),
        ])
    }));
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::RIGHT)
                .border_style(Theme::border()),
        ),
        chunks[0],
    );

    // Menu
    let items: Vec<ListItem> = app
        .account_items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == app.account_list.selected {
                Theme::list_item_selected()
            } else {
                Theme::list_item()
            };
            ListItem::new(format!(" {} ", item.label())).style(style)
        })
        .collect();
    frame.render_widget(
        List::new(items).block(
            Block::default()
                .borders(Borders::NONE)
                .title(Span::styled(" Settings ", Theme::secondary())),
        ),
        chunks[1].inner(Margin::new(2, 0)),
    );
}

/// Panel shared by the settings editors
fn editor_panel(frame: &mut Frame, area: Rect, title: &str, rows: u16) -> Rect {
    let panel = centered(area, 50, rows + 2);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(format!(" {} ", title), Theme::title()))
        .style(Style::default().bg(Theme::BACKGROUND_LIGHT));
    let inner = block.inner(panel);
    frame.render_widget(block, panel);
    inner
}

pub fn render_email_change(frame: &mut Frame, area: Rect, app: &App) {
    let flow = &app.email_change;
    let inner = editor_panel(frame, area, flow.title(), 6);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let label = match flow.step {
        FlowStep::CollectingCurrent | FlowStep::Verifying => "Current password",
        FlowStep::CollectingNew | FlowStep::Done => "New email",
    };
    frame.render_widget(input_widget(label, flow.input(), true), rows[0]);
    frame.render_widget(Paragraph::new(field_error_line(flow.error.as_ref())), rows[1]);
    frame.render_widget(
        Paragraph::new(button_line(flow.button_label(), !app.busy)),
        rows[2],
    );
}

pub fn render_password_change(frame: &mut Frame, area: Rect, app: &App) {
    let flow = &app.password_change;
    let collecting_new = matches!(flow.step, FlowStep::CollectingNew | FlowStep::Done);
    let inputs = if collecting_new { 2 } else { 1 };
    let inner = editor_panel(frame, area, flow.title(), 3 * inputs + 3);

    let mut constraints = vec![Constraint::Length(3); inputs as usize];
    constraints.extend([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
    ]);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    if collecting_new {
        frame.render_widget(
            input_widget("New password", &flow.new_password, !flow.on_repeat),
            rows[0],
        );
        frame.render_widget(
            input_widget("Repeat new password", &flow.repeat, flow.on_repeat),
            rows[1],
        );
    } else {
        frame.render_widget(input_widget("Current password", &flow.current, true), rows[0]);
    }

    let n = inputs as usize;
    frame.render_widget(Paragraph::new(field_error_line(flow.error.as_ref())), rows[n]);
    frame.render_widget(
        Paragraph::new(button_line(flow.button_label(), !app.busy)),
        rows[n + 1],
    );
}

pub fn render_profile_editor(frame: &mut Frame, area: Rect, app: &App) {
    let Some(editor) = app.profile_editor.as_ref() else {
        return;
    };
    let inner = editor_panel(frame, area, "Edit Profile", 7);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    frame.render_widget(input_widget("Name", &editor.name, true), rows[0]);
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Icon: ", Theme::dimmed()),
            Span::styled(format!("◀ {} ▶", editor.icon_name()), Theme::selected()),
        ])),
        rows[1],
    );
    frame.render_widget(Paragraph::new(field_error_line(editor.error.as_ref())), rows[2]);
    frame.render_widget(Paragraph::new(button_line("Save", !app.busy)), rows[3]);
}
