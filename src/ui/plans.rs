//! Plan selector: benefits above a table of plans

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table},
};

use crate::app::App;
use crate::forms::PlanSelector;
use crate::models::SUBS_BENEFITS;
use crate::ui::{button_line, field_error_line, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let selector = &app.plans;
    let is_changing = app.store.state().subscription.is_changing_plan;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2 + SUBS_BENEFITS.len() as u16), // heading + benefits
            Constraint::Length(7),                              // plan table
            Constraint::Length(1),                              // error
            Constraint::Length(1),                              // button
            Constraint::Min(0),
        ])
        .split(area);

    let heading = if is_changing {
        "Change your plan"
    } else {
        "Choose the plan that's right for you"
    };
    let mut lines = vec![
        Line::from(Span::styled(heading, Theme::title())),
        Line::from(""),
    ];
    lines.extend(
        SUBS_BENEFITS
            .iter()
            .map(|b| Line::from(vec![Span::styled("✓ ", Theme::title()), Span::raw(*b)])),
    );
    frame.render_widget(Paragraph::new(lines).style(Theme::text()), chunks[0]);

    render_table(frame, chunks[1], selector);

    frame.render_widget(
        Paragraph::new(field_error_line(selector.error.as_ref())),
        chunks[2],
    );
    frame.render_widget(
        Paragraph::new(button_line(
            PlanSelector::button_label(is_changing),
            selector.can_submit() && !app.busy,
        )),
        chunks[3],
    );
}

fn render_table(frame: &mut Frame, area: Rect, selector: &PlanSelector) {
    let header_cells = selector.plans.iter().enumerate().map(|(i, plan)| {
        let style = if selector.selected == Some(i) {
            Theme::button()
        } else if selector.cursor == i {
            Theme::selected().add_modifier(Modifier::UNDERLINED)
        } else {
            Theme::list_item()
        };
        let marker = if selector.selected == Some(i) { "● " } else { "" };
        Cell::from(format!("{}{}", marker, plan.name)).style(style)
    });
    let header = Row::new(std::iter::once(Cell::from("")).chain(header_cells)).height(1);

    let row = |label: &'static str, values: Vec<String>| {
        Row::new(
            std::iter::once(Cell::from(Span::styled(label, Theme::dimmed())))
                .chain(values.into_iter().map(Cell::from)),
        )
    };

    let rows = vec![
        row(
            "Monthly price",
            selector
                .plans
                .iter()
                .map(|p| format!("${:.2}", p.price))
                .collect(),
        ),
        row(
            "Video quality",
            selector.plans.iter().map(|p| p.video_quality.clone()).collect(),
        ),
        row(
            "Resolution",
            selector.plans.iter().map(|p| p.resolution.clone()).collect(),
        ),
        row(
            "Watch on any device",
            selector
                .plans
                .iter()
                .map(|p| if p.portability { "✓" } else { "✗" }.to_string())
                .collect(),
        ),
    ];

    let mut widths = vec![Constraint::Length(22)];
    widths.extend(selector.plans.iter().map(|_| Constraint::Length(14)));

    let table = Table::new(rows, widths)
        .header(header)
        .style(Theme::text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Theme::border()),
        );
    frame.render_widget(table, area);
}
