//! UI-agnostic conversation types
//!
//! These are shared by the session controller and any front end that draws a
//! transcript. Nothing here depends on a UI framework.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// First entry of every session.
pub const GREETING: &str = "Hi👋 I'm ChatFusion AI, how can I help you?";

/// Shown in place of a reply whenever the completion call fails.
pub const FAILURE_WARNING: &str = "Something went wrong. Try again.";

/// Label carried by replies that came back from the model.
pub const ATTRIBUTION_LABEL: &str = "ChatFusion";

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    User,
    Assistant,
}

/// "Powered by" marker attached to successful replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attribution {
    pub label: &'static str,
}

impl Attribution {
    pub const fn chatfusion() -> Self {
        Self { label: ATTRIBUTION_LABEL }
    }

    /// Flat text form appended to the reply by [`MessageEntry::content`].
    pub fn suffix(&self) -> String {
        format!("\n\nPowered by {}", self.label)
    }
}

/// One message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEntry {
    pub origin: Origin,
    pub text: String,
    pub attribution: Option<Attribution>,
    pub warning: bool,
}

impl MessageEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::User,
            text: text.into(),
            attribution: None,
            warning: false,
        }
    }

    pub fn greeting() -> Self {
        Self {
            origin: Origin::Assistant,
            text: GREETING.to_string(),
            attribution: None,
            warning: false,
        }
    }

    /// A model reply, attributed.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Assistant,
            text: text.into(),
            attribution: Some(Attribution::chatfusion()),
            warning: false,
        }
    }

    pub fn failure() -> Self {
        Self {
            origin: Origin::Assistant,
            text: FAILURE_WARNING.to_string(),
            attribution: None,
            warning: true,
        }
    }

    /// Text plus the attribution suffix, if any.
    pub fn content(&self) -> Cow<'_, str> {
        match &self.attribution {
            Some(attribution) => Cow::Owned(format!("{}{}", self.text, attribution.suffix())),
            None => Cow::Borrowed(&self.text),
        }
    }
}
