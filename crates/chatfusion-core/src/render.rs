//! Transcript projection
//!
//! Turns a transcript snapshot into rows a front end can draw. User text is
//! always carried as plain text; only assistant text may be styled, and the
//! attribution travels as its own field rather than as embedded markup.

use crate::state::{Attribution, MessageEntry, Origin};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body<'a> {
    /// Drawn verbatim, never interpreted.
    Plain(&'a str),
    /// May be drawn with light formatting.
    Rich {
        text: &'a str,
        attribution: Option<Attribution>,
        warning: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<'a> {
    pub align: Align,
    pub origin: Origin,
    pub body: Body<'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptView<'a> {
    pub rows: Vec<Row<'a>>,
    /// Draw a trailing "typing" indicator.
    pub typing: bool,
}

pub fn project(entries: &[MessageEntry], awaiting: bool) -> TranscriptView<'_> {
    let rows = entries
        .iter()
        .map(|entry| match entry.origin {
            Origin::User => Row {
                align: Align::Right,
                origin: Origin::User,
                body: Body::Plain(&entry.text),
            },
            Origin::Assistant => Row {
                align: Align::Left,
                origin: Origin::Assistant,
                body: Body::Rich {
                    text: &entry.text,
                    attribution: entry.attribution,
                    warning: entry.warning,
                },
            },
        })
        .collect();

    TranscriptView { rows, typing: awaiting }
}

/// Scroll-to-latest effect, keyed on transcript length and the awaiting flag.
///
/// Call [`AutoScroll::observe`] once per frame; it reports `true` on the
/// frames where the key changed and the view should jump to the bottom.
#[derive(Debug, Default)]
pub struct AutoScroll {
    last: Option<(usize, bool)>,
}

impl AutoScroll {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, len: usize, awaiting: bool) -> bool {
        let key = Some((len, awaiting));
        if self.last == key {
            return false;
        }
        self.last = key;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rows_are_plain_and_right_aligned() {
        let entries = vec![MessageEntry::greeting(), MessageEntry::user("**not bold** <b>x</b>")];
        let view = project(&entries, false);

        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].align, Align::Left);
        assert_eq!(view.rows[1].align, Align::Right);
        assert_eq!(view.rows[1].body, Body::Plain("**not bold** <b>x</b>"));
    }

    #[test]
    fn test_assistant_rows_keep_attribution_separate() {
        let entries = vec![MessageEntry::reply("Hi there"), MessageEntry::failure()];
        let view = project(&entries, false);

        match &view.rows[0].body {
            Body::Rich { text, attribution, warning } => {
                assert_eq!(*text, "Hi there");
                assert_eq!(*attribution, Some(Attribution::chatfusion()));
                assert!(!warning);
            }
            other => panic!("expected rich body, got {:?}", other),
        }
        match &view.rows[1].body {
            Body::Rich { attribution, warning, .. } => {
                assert!(attribution.is_none());
                assert!(*warning);
            }
            other => panic!("expected rich body, got {:?}", other),
        }
    }

    #[test]
    fn test_typing_follows_awaiting() {
        let entries = vec![MessageEntry::greeting()];
        assert!(project(&entries, true).typing);
        assert!(!project(&entries, false).typing);
    }

    #[test]
    fn test_autoscroll_fires_on_key_change_only() {
        let mut scroll = AutoScroll::new();
        assert!(scroll.observe(1, false));
        assert!(!scroll.observe(1, false));

        assert!(scroll.observe(2, true));
        assert!(!scroll.observe(2, true));

        assert!(scroll.observe(3, false));
        assert!(!scroll.observe(3, false));
    }
}
