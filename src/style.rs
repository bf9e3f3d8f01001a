//! Status and priority presentation.
//!
//! Lookups keyed by the enums are exhaustive matches, so adding a status or
//! priority fails to compile until it has a color. Labels are decoded into
//! the enums at the wire boundary; an unknown label never reaches this module.

use crate::model::{Priority, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Blue,
    Yellow,
    Emerald,
    Orange,
    Green,
}

impl Color {
    pub fn ansi(&self) -> &'static str {
        match self {
            Color::Blue => "\x1b[34m",
            Color::Yellow => "\x1b[33m",
            Color::Emerald => "\x1b[36m",
            Color::Orange => "\x1b[38;5;208m",
            Color::Green => "\x1b[32m",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Destructive,
    Default,
    Secondary,
}

impl Badge {
    pub fn ansi(&self) -> &'static str {
        match self {
            Badge::Destructive => "\x1b[1;31m",
            Badge::Default => "\x1b[1m",
            Badge::Secondary => "\x1b[2m",
        }
    }
}

pub const RESET: &str = "\x1b[0m";

pub fn status_color(status: Status) -> Color {
    match status {
        Status::New => Color::Blue,
        Status::Contacted => Color::Yellow,
        Status::Qualified => Color::Emerald,
        Status::ProposalSent => Color::Orange,
        Status::Closed => Color::Green,
    }
}

pub fn priority_badge(priority: Priority) -> Badge {
    match priority {
        Priority::High => Badge::Destructive,
        Priority::Medium => Badge::Default,
        Priority::Low => Badge::Secondary,
    }
}

/// Wraps text in ANSI codes when enabled.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    enabled: bool,
}

impl Painter {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    pub fn status(&self, status: Status) -> String {
        self.paint(status_color(status).ansi(), status.as_str())
    }

    pub fn priority(&self, priority: Priority) -> String {
        self.paint(priority_badge(priority).ansi(), priority.as_str())
    }
}
