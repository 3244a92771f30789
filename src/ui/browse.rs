//! Home rows and the My List / Liked grid

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};

use crate::app::{App, LoadingState, GRID_COLS};
use crate::lists::ListSnapshot;
use crate::models::{ListKind, Movie};
use crate::ui::{render_loading, Theme};

/// Height of one home row (title + card line + border)
const ROW_HEIGHT: u16 = 4;
/// Height of one grid cell
const CELL_HEIGHT: u16 = 4;

// =============================================================================
// Home
// =============================================================================

pub fn render_home(frame: &mut Frame, area: Rect, app: &App) {
    let home = &app.home;
    match &home.loading {
        LoadingState::Loading(msg) => {
            return render_loading(frame, area, msg.as_deref().unwrap_or("Loading..."));
        }
        LoadingState::Error(msg) => {
            let text = vec![
                Line::from(""),
                Line::from(Span::styled(msg.as_str(), Theme::error())),
                Line::from(Span::styled("r to retry", Theme::dimmed())),
            ];
            frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
            return;
        }
        LoadingState::Idle => {}
    }

    if home.rows.is_empty() {
        let text = Paragraph::new(Span::styled("Nothing to show yet. r to load.", Theme::dimmed()))
            .alignment(Alignment::Center);
        frame.render_widget(text, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(1)])
        .split(area);

    render_banner(frame, chunks[0], home.selected_movie());

    let visible = (chunks[1].height / ROW_HEIGHT).max(1) as usize;
    let mut rows_state = home.row_list.clone();
    rows_state.scroll_into_view(visible);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(ROW_HEIGHT); visible])
        .split(chunks[1]);

    for (slot, (idx, row)) in home
        .rows
        .iter()
        .enumerate()
        .skip(rows_state.offset)
        .take(visible)
        .enumerate()
    {
        let focused = idx == home.row_list.selected;
        let selected_item = focused.then_some(home.item_list.selected);
        render_row(frame, row_areas[slot], row.row.title(), &row.movies, selected_item);
    }
}

/// Highlighted title above the rows
fn render_banner(frame: &mut Frame, area: Rect, movie: Option<&Movie>) {
    let Some(movie) = movie else {
        return;
    };
    let mut lines = vec![Line::from(Span::styled(
        movie.display_title().to_string(),
        Theme::title().add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::from(vec![
        Span::styled(format!("{}% Match  ", movie.match_percent()), Theme::match_score()),
        Span::styled(
            movie.year().map(|y| y.to_string()).unwrap_or_default(),
            Theme::year(),
        ),
    ]));
    lines.push(Line::from(Span::styled(
        movie.overview.clone(),
        Theme::secondary(),
    )));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

/// One horizontally scrolling row of titles
fn render_row(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    movies: &[Movie],
    selected: Option<usize>,
) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(if selected.is_some() {
            Theme::border_focused()
        } else {
            Theme::border()
        })
        .title(Span::styled(
            format!(" {} ", title),
            if selected.is_some() {
                Theme::title()
            } else {
                Theme::secondary()
            },
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Keep the selected card on screen
    let card_width = 22usize;
    let per_line = (inner.width as usize / card_width).max(1);
    let start = selected
        .map(|s| s.saturating_sub(per_line.saturating_sub(1)))
        .unwrap_or(0);

    let spans: Vec<Span> = movies
        .iter()
        .enumerate()
        .skip(start)
        .take(per_line)
        .map(|(i, movie)| {
            let label = truncate(movie.display_title(), card_width - 2);
            let style = if selected == Some(i) {
                Theme::list_item_selected()
            } else {
                Theme::list_item()
            };
            Span::styled(format!(" {:<width$} ", label, width = card_width - 2), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

// =============================================================================
// List pages
// =============================================================================

pub fn render_list(frame: &mut Frame, area: Rect, app: &App) {
    let Some(kind) = app.current_list() else {
        return;
    };
    let snapshot = app.snapshot(kind);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(1)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Span::styled(kind.to_string(), Theme::title())),
        chunks[0],
    );

    match snapshot {
        ListSnapshot::Loading => render_loading(frame, chunks[1], "Loading..."),
        ListSnapshot::Failed(msg) => {
            frame.render_widget(
                Paragraph::new(Span::styled(msg.as_str(), Theme::error()))
                    .alignment(Alignment::Center),
                chunks[1],
            );
        }
        ListSnapshot::Ready(movies) if movies.is_empty() => render_empty(frame, chunks[1], kind),
        ListSnapshot::Ready(movies) => {
            render_grid(frame, chunks[1], movies, app.list_cursor.selected)
        }
    }
}

fn render_empty(frame: &mut Frame, area: Rect, kind: ListKind) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(kind.empty_message(), Theme::selected())),
        Line::from(Span::styled(kind.empty_hint(), Theme::dimmed())),
    ];
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

fn render_grid(frame: &mut Frame, area: Rect, movies: &[Movie], selected: usize) {
    let visible_rows = (area.height / CELL_HEIGHT).max(1) as usize;
    let selected_row = selected / GRID_COLS;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CELL_HEIGHT); visible_rows])
        .split(area);

    for (slot, chunk) in movies
        .chunks(GRID_COLS)
        .enumerate()
        .skip(first_row)
        .take(visible_rows)
        .enumerate()
    {
        let (row_idx, row_movies) = chunk;
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLS as u32); GRID_COLS])
            .split(row_areas[slot]);

        for (col, movie) in row_movies.iter().enumerate() {
            let idx = row_idx * GRID_COLS + col;
            let focused = idx == selected;
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(if focused {
                    Theme::border_focused()
                } else {
                    Theme::border()
                });
            let year = movie.year().map(|y| y.to_string()).unwrap_or_default();
            let text = vec![
                Line::from(Span::styled(
                    movie.display_title().to_string(),
                    if focused {
                        Theme::selected()
                    } else {
                        Theme::list_item()
                    },
                )),
                Line::from(Span::styled(year, Theme::year())),
            ];
            frame.render_widget(Paragraph::new(text).block(block), cells[col]);
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
