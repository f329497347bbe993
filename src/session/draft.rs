//! Query draft and its lifecycle phases.

use std::fmt;

/// How the current draft text came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftOrigin {
    /// Produced by query generation.
    Generated,
    /// Typed or edited by the user.
    #[default]
    Manual,
}

/// The editable structured-query text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDraft {
    text: String,
    origin: DraftOrigin,
}

impl QueryDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// A draft produced by generation.
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: DraftOrigin::Generated,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> DraftOrigin {
        self.origin
    }

    /// True when there is nothing worth executing.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replaces the text wholesale.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.origin = DraftOrigin::Manual;
    }

    /// Appends a line to the text.
    pub fn append_line(&mut self, line: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(line);
        self.origin = DraftOrigin::Manual;
    }
}

/// Phase of the draft lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftState {
    #[default]
    Empty,
    Generating,
    Drafted,
    Editing,
    Executing,
    Executed,
    Error,
}

impl DraftState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Generating => "generating",
            Self::Drafted => "drafted",
            Self::Editing => "editing",
            Self::Executing => "executing",
            Self::Executed => "executed",
            Self::Error => "error",
        }
    }

    /// True while a network operation owns the draft.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Generating | Self::Executing)
    }
}

impl fmt::Display for DraftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
