//! Navbar visibility driven by scroll direction

use crate::constants::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavVisibility {
    Shown,
    Hidden,
}

/// Shows the navbar when scrolling up or at the top, hides it otherwise
#[derive(Debug, Clone, PartialEq)]
pub struct NavBar {
    last_y: f64,
    visibility: NavVisibility,
}

impl NavBar {
    /// Evaluates the initial scroll position once, as on mount
    ///
    /// The assumed previous position is far down the page, so a page that
    /// loads near the top starts with the navbar shown.
    pub fn mount(scroll_y: f64) -> Self {
        let mut nav = Self {
            last_y: ui::NAV_INITIAL_SCROLL_Y,
            visibility: NavVisibility::Hidden,
        };
        nav.on_scroll(scroll_y);
        nav
    }

    pub fn on_scroll(&mut self, scroll_y: f64) -> NavVisibility {
        self.visibility = if scroll_y < self.last_y || scroll_y <= 0.0 {
            NavVisibility::Shown
        } else {
            NavVisibility::Hidden
        };
        self.last_y = scroll_y;
        self.visibility
    }

    pub fn visibility(&self) -> NavVisibility {
        self.visibility
    }
}
