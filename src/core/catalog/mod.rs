// Event catalog: fixed signatures recognizing RM2 global shouts.
//
// Architecture:
// - model.rs: Signature, match rule and outcome types
// - matcher.rs: Evaluation of one signature against one message
// - standard.rs: The shipped catalog contents

pub mod matcher;
pub mod model;
pub mod standard;

pub use model::{EventSignature, ExtractedFields, MatchOutcome, MatchRule, ParseError};
pub use standard::Seasons;

/// A signature that matched, with the fields it extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified<'a> {
    pub signature: &'a EventSignature,
    pub fields: ExtractedFields,
}

/// Immutable, insertion-ordered list of signatures.
#[derive(Debug, Clone)]
pub struct EventCatalog {
    signatures: Vec<EventSignature>,
}

impl EventCatalog {
    pub fn new(signatures: Vec<EventSignature>) -> Self {
        Self { signatures }
    }

    /// The shipped RM2 catalog
    pub fn standard(seasons: &Seasons) -> Self {
        Self::new(standard::signatures(seasons))
    }

    pub fn signatures(&self) -> &[EventSignature] {
        &self.signatures
    }

    pub fn get(&self, id: &str) -> Option<&EventSignature> {
        self.signatures.iter().find(|s| s.id == id)
    }

    /// Evaluate every signature, in order.
    pub fn evaluate_all<'a>(&'a self, text: &str) -> Vec<(&'a EventSignature, MatchOutcome)> {
        let lowered = text.to_lowercase();
        self.signatures
            .iter()
            .map(|sig| (sig, matcher::evaluate(sig, text, &lowered)))
            .collect()
    }

    /// Signatures matching `text`. Parse failures are logged and skipped.
    pub fn classify<'a>(&'a self, text: &str) -> Vec<Classified<'a>> {
        let mut matched = Vec::new();
        for (signature, outcome) in self.evaluate_all(text) {
            match outcome {
                MatchOutcome::Matched(fields) => matched.push(Classified { signature, fields }),
                MatchOutcome::NoMatch => {}
                MatchOutcome::ParseError(e) => {
                    log::warn!("Could not parse '{}' message ({}): {}", signature.id, e, text);
                }
            }
        }
        matched
    }

    /// Pairs of signature ids whose rules can accept the same text.
    pub fn overlapping_rules(&self) -> Vec<(&'static str, &'static str)> {
        let mut overlaps = Vec::new();
        for (i, a) in self.signatures.iter().enumerate() {
            for b in &self.signatures[i + 1..] {
                if rules_overlap(&a.rule, &b.rule) {
                    overlaps.push((a.id, b.id));
                }
            }
        }
        overlaps
    }
}

fn rules_overlap(a: &MatchRule, b: &MatchRule) -> bool {
    match (a, b) {
        (MatchRule::Exact(x), MatchRule::Exact(y)) => x == y,
        (MatchRule::Exact(literal), MatchRule::PrefixExtract { prefix, .. })
        | (MatchRule::PrefixExtract { prefix, .. }, MatchRule::Exact(literal)) => {
            literal.starts_with(prefix)
        }
        (MatchRule::PrefixExtract { prefix: p, .. }, MatchRule::PrefixExtract { prefix: q, .. }) => {
            p.starts_with(q) || q.starts_with(p)
        }
    }
}
