//! Movie detail modal visibility and trailer audio

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModalState {
    pub is_opened_modal: bool,
    pub is_muted_video: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    OpenModal,
    CloseModal,
    ToggleMuteVideo,
}

impl ModalState {
    pub fn reduce(&mut self, action: &ModalAction) {
        match action {
            ModalAction::OpenModal => self.is_opened_modal = true,
            ModalAction::CloseModal => self.is_opened_modal = false,
            ModalAction::ToggleMuteVideo => self.is_muted_video = !self.is_muted_video,
        }
    }
}
