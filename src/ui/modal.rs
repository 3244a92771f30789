//! Movie detail modal drawn over the current page

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, LoadingState};
use crate::models::{ListKind, MediaType};
use crate::ui::{centered, Theme};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.store.state();
    let Some(movie) = state.movie.movie.as_ref() else {
        return;
    };

    let popup = centered(area, 80.min(area.width.saturating_sub(4)), 20);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border_focused())
        .title(Span::styled(
            format!(" {} ", movie.display_title()),
            Theme::title(),
        ))
        .title_bottom(Span::styled(" Esc to close ", Theme::dimmed()))
        .style(Style::default().bg(Theme::BACKGROUND_LIGHT));

    let kind = match movie.kind() {
        MediaType::Movie => "Movie",
        MediaType::Tv => "TV",
    };
    let in_list = |k: ListKind, on: &'static str, off: &'static str| {
        if app.snapshot(k).contains(movie.id) {
            Span::styled(on, Theme::success())
        } else {
            Span::styled(off, Theme::dimmed())
        }
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{}% Match", movie.match_percent()), Theme::match_score()),
            Span::raw("  "),
            Span::styled(movie.released().unwrap_or("").to_string(), Theme::year()),
            Span::raw("  "),
            Span::styled(kind, Theme::dimmed()),
        ]),
        Line::from(""),
        Line::from(Span::raw(movie.overview.clone())),
        Line::from(""),
    ];

    let genres = match (&app.extras, &app.extras_loading) {
        (Some(extras), _) => extras.genres_str(),
        (None, LoadingState::Loading(_)) => "…".to_string(),
        _ => String::new(),
    };
    lines.push(labelled("Genres", genres));
    lines.push(labelled("Original language", movie.original_language.clone()));
    lines.push(labelled("Total votes", movie.vote_count.to_string()));

    let trailer = match (&app.extras, &app.extras_loading) {
        (Some(extras), _) => extras
            .trailer_url()
            .unwrap_or_else(|| "No trailer available".to_string()),
        (None, LoadingState::Error(e)) => e.clone(),
        _ => "Loading trailer...".to_string(),
    };
    lines.push(labelled("Trailer", trailer));

    let sound = if state.modal.is_muted_video {
        "🔇 muted"
    } else {
        "🔊 sound on"
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        in_list(ListKind::MyList, "✓ In My List", "+ My List"),
        Span::raw("   "),
        in_list(ListKind::Liked, "♥ Liked", "♡ Like"),
        Span::raw("   "),
        Span::styled(sound, Theme::secondary()),
    ]));

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(block),
        popup,
    );
}

fn labelled(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Theme::dimmed()),
        Span::styled(value, Theme::secondary()),
    ])
}
