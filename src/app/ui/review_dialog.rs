//! Review dialog: view, edit and delete modes for one review

use crate::app::models::{Review, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    View,
    Edit,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Open(DialogMode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogEvent {
    Open,
    /// Switch to the edit form
    Edit,
    /// Ask for delete confirmation
    Delete,
    /// Leave the edit form or the delete confirmation
    Cancel,
    /// The edit was saved
    Saved,
    /// The delete was confirmed and succeeded
    Deleted,
    Close,
}

/// Dialog for one review; edit and delete are only reachable by its author
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDialog {
    state: DialogState,
    can_modify: bool,
}

impl ReviewDialog {
    pub fn new(can_modify: bool) -> Self {
        Self {
            state: DialogState::Closed,
            can_modify,
        }
    }

    pub fn for_review(review: &Review, viewer: Option<&User>) -> Self {
        Self::new(review.is_owned_by(viewer))
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn can_modify(&self) -> bool {
        self.can_modify
    }

    /// Applies `event`; events that make no sense in the current state are ignored
    pub fn handle(&mut self, event: DialogEvent) -> DialogState {
        use DialogMode::*;

        self.state = match (self.state, event) {
            (DialogState::Closed, DialogEvent::Open) => DialogState::Open(View),
            (DialogState::Open(View), DialogEvent::Edit) if self.can_modify => {
                DialogState::Open(Edit)
            }
            (DialogState::Open(View), DialogEvent::Delete) if self.can_modify => {
                DialogState::Open(Delete)
            }
            (DialogState::Open(Edit), DialogEvent::Cancel | DialogEvent::Saved) => {
                DialogState::Open(View)
            }
            (DialogState::Open(Delete), DialogEvent::Cancel) => DialogState::Open(View),
            (DialogState::Open(Delete), DialogEvent::Deleted) => DialogState::Closed,
            // Closing from any mode forgets it; the next open starts in view
            (DialogState::Open(_), DialogEvent::Close) => DialogState::Closed,
            (state, _) => state,
        };
        self.state
    }
}
