//! The movie currently shown in the detail modal

use serde::{Deserialize, Serialize};

use crate::models::Movie;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MovieState {
    pub movie: Option<Movie>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MovieAction {
    SetMovie(Movie),
    ClearMovie,
}

impl MovieState {
    pub fn reduce(&mut self, action: &MovieAction) {
        match action {
            MovieAction::SetMovie(movie) => self.movie = Some(movie.clone()),
            MovieAction::ClearMovie => self.movie = None,
        }
    }
}
