// Catalog model types: signatures, match rules and reminder specs.

use std::collections::HashMap;

use chrono::Duration;
use thiserror::Error;

/// How a signature recognizes a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchRule {
    /// Case-insensitive equality with the whole message text (lower-case literal)
    Exact(&'static str),
    /// Case-insensitive prefix, then positional token extraction
    PrefixExtract {
        prefix: &'static str,
        extraction: Extraction,
    },
}

/// Positional field extraction over whitespace tokens of the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Field receiving the tokens after the separator
    pub field: &'static str,
    /// Separator token, compared case-insensitively
    pub separator: &'static str,
    /// Which occurrence of the separator starts the field (1-based)
    pub occurrence: usize,
    /// Optional single token captured before the separator
    pub leading: Option<LeadingToken>,
}

impl Extraction {
    /// Everything after the `occurrence`-th `separator`.
    pub const fn after(field: &'static str, separator: &'static str, occurrence: usize) -> Self {
        Self {
            field,
            separator,
            occurrence,
            leading: None,
        }
    }

    pub fn with_leading(mut self, leading: LeadingToken) -> Self {
        self.leading = Some(leading);
        self
    }
}

/// A token at a fixed index that must be followed by a fixed phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadingToken {
    pub field: &'static str,
    pub index: usize,
    /// Lower-case tokens expected right after the captured one
    pub followed_by: &'static [&'static str],
}

/// Follow-up reminder a signature schedules when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSpec {
    /// Unique key of the pending announcement
    pub event_type: &'static str,
    /// Time from the trigger until the next occurrence of the event
    pub cycle: Duration,
    /// How long before the event the reminder goes out
    pub lead: Duration,
    /// Template with `{role}` and `{timestamp}` placeholders
    pub template: &'static str,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSignature {
    pub id: &'static str,
    pub rule: MatchRule,
    pub role_name: &'static str,
    /// Alert text; `{role}` plus any extracted field names
    pub template: &'static str,
    pub reminder: Option<ReminderSpec>,
}

impl EventSignature {
    pub const fn exact(
        id: &'static str,
        literal: &'static str,
        role_name: &'static str,
        template: &'static str,
    ) -> Self {
        Self {
            id,
            rule: MatchRule::Exact(literal),
            role_name,
            template,
            reminder: None,
        }
    }

    pub const fn prefix(
        id: &'static str,
        prefix: &'static str,
        extraction: Extraction,
        role_name: &'static str,
        template: &'static str,
    ) -> Self {
        Self {
            id,
            rule: MatchRule::PrefixExtract { prefix, extraction },
            role_name,
            template,
            reminder: None,
        }
    }

    pub fn with_reminder(mut self, reminder: ReminderSpec) -> Self {
        self.reminder = Some(reminder);
        self
    }
}

/// Values pulled out of a notification, keyed by field name.
pub type ExtractedFields = HashMap<String, String>;

/// Why a prefix-matched notification could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("separator '{separator}' #{occurrence} not found")]
    SeparatorNotFound {
        separator: &'static str,
        occurrence: usize,
    },
    #[error("field '{0}' is empty")]
    EmptyField(&'static str),
    #[error("expected '{expected}' after token {index}")]
    UnexpectedTokens { index: usize, expected: String },
}

/// Result of evaluating one signature against one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Matched(ExtractedFields),
    NoMatch,
    ParseError(ParseError),
}

impl MatchOutcome {
    #[cfg(test)]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_builders() {
        let sig = EventSignature::exact("hq_war", "**hq war starting in 5 minutes!**", "r", "t");
        assert!(sig.reminder.is_none());
        assert!(matches!(sig.rule, MatchRule::Exact(_)));

        let reminder = ReminderSpec {
            event_type: "big_santa",
            cycle: Duration::hours(7),
            lead: Duration::minutes(15),
            template: "{role}",
        };
        let sig = sig.with_reminder(reminder.clone());
        assert_eq!(sig.reminder, Some(reminder));
    }

    #[test]
    fn test_extraction_builder() {
        let leading = LeadingToken {
            field: "player",
            index: 1,
            followed_by: &["became"],
        };
        let extraction = Extraction::after("map", "at", 1).with_leading(leading.clone());
        assert_eq!(extraction.occurrence, 1);
        assert_eq!(extraction.leading, Some(leading));
    }
}
