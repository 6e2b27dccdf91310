//! Framework-independent UI state machines
//!
//! Each component's event handling is a plain state machine driven by
//! named events, so it can be tested without a renderer.

pub mod nav;
pub mod review_dialog;
pub mod search;

pub use nav::{NavBar, NavVisibility};
pub use review_dialog::{DialogEvent, DialogMode, DialogState, ReviewDialog};
pub use search::{Debouncer, SearchBox, SearchEvent};
