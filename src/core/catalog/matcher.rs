// Signature evaluation against notification text.
//
// Matching runs on a lower-cased copy of the text. Extraction runs on the
// original tokens so map and player names keep their casing.

use super::model::{
    EventSignature, ExtractedFields, Extraction, MatchOutcome, MatchRule, ParseError,
};

/// Decoration closing every global shout (`...street 2!**`)
pub const TRAILING_MARKER: &str = "!**";

/// Evaluate one signature. `lowered` must be `text.to_lowercase()`.
pub fn evaluate(signature: &EventSignature, text: &str, lowered: &str) -> MatchOutcome {
    if text.trim().is_empty() {
        return MatchOutcome::NoMatch;
    }

    match &signature.rule {
        MatchRule::Exact(literal) => {
            if lowered == *literal {
                MatchOutcome::Matched(ExtractedFields::new())
            } else {
                MatchOutcome::NoMatch
            }
        }
        MatchRule::PrefixExtract { prefix, extraction } => {
            if !lowered.starts_with(prefix) {
                return MatchOutcome::NoMatch;
            }
            match extract(text, extraction) {
                Ok(fields) => MatchOutcome::Matched(fields),
                Err(e) => MatchOutcome::ParseError(e),
            }
        }
    }
}

/// Pull the configured fields out of a prefix-matched notification.
pub fn extract(text: &str, extraction: &Extraction) -> Result<ExtractedFields, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut fields = ExtractedFields::new();
    let mut search_from = 0;

    if let Some(leading) = &extraction.leading {
        let guard_end = leading.index + 1 + leading.followed_by.len();
        let guarded = tokens
            .get(leading.index + 1..guard_end)
            .map(|window| {
                window
                    .iter()
                    .zip(leading.followed_by)
                    .all(|(token, expected)| token.to_lowercase() == *expected)
            })
            .unwrap_or(false);

        let captured = match tokens.get(leading.index) {
            Some(token) if guarded => *token,
            _ => {
                return Err(ParseError::UnexpectedTokens {
                    index: leading.index,
                    expected: leading.followed_by.join(" "),
                })
            }
        };
        fields.insert(leading.field.to_string(), captured.to_string());
        // The captured token itself never counts as a separator
        search_from = leading.index + 1;
    }

    let separator_index = tokens
        .iter()
        .enumerate()
        .skip(search_from)
        .filter(|(_, token)| token.to_lowercase() == extraction.separator)
        .nth(extraction.occurrence.saturating_sub(1))
        .map(|(i, _)| i)
        .ok_or(ParseError::SeparatorNotFound {
            separator: extraction.separator,
            occurrence: extraction.occurrence,
        })?;

    let value = tokens[separator_index + 1..]
        .join(" ")
        .replace(TRAILING_MARKER, "");
    let value = value.trim();
    if value.is_empty() {
        return Err(ParseError::EmptyField(extraction.field));
    }
    fields.insert(extraction.field.to_string(), value.to_string());

    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::model::LeadingToken;

    fn open_pvp() -> EventSignature {
        EventSignature::prefix(
            "open_pvp_battle",
            "**open pvp battle starts in 30 minutes in",
            Extraction::after("map", "in", 2),
            "pvp",
            "{role} Open PvP Battle starts in 30 minutes in {map}!",
        )
    }

    fn outlaw() -> EventSignature {
        EventSignature::prefix(
            "outlaw",
            "**player ",
            Extraction::after("map", "at", 1).with_leading(LeadingToken {
                field: "player",
                index: 1,
                followed_by: &["became", "an", "outlaw", "at"],
            }),
            "outlaw",
            "{role} {player} became an outlaw at {map}!",
        )
    }

    fn eval(sig: &EventSignature, text: &str) -> MatchOutcome {
        evaluate(sig, text, &text.to_lowercase())
    }

    fn field(outcome: &MatchOutcome, name: &str) -> String {
        match outcome {
            MatchOutcome::Matched(fields) => fields[name].clone(),
            other => panic!("expected match, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_is_case_insensitive() {
        let sig = EventSignature::exact("hq", "**hq war starting in 5 minutes!**", "r", "t");
        assert!(eval(&sig, "**HQ WAR STARTING IN 5 MINUTES!**").is_match());
        assert_eq!(eval(&sig, "**hq war starting in 5 minutes**"), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_empty_text_never_matches() {
        let sig = EventSignature::exact("empty", "", "r", "t");
        assert_eq!(eval(&sig, ""), MatchOutcome::NoMatch);
        assert_eq!(eval(&open_pvp(), "   "), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_open_pvp_extracts_map_after_second_in() {
        let outcome = eval(&open_pvp(), "**open pvp battle starts in 30 minutes in downtown 4!**");
        assert_eq!(field(&outcome, "map"), "downtown 4");

        let outcome = eval(&open_pvp(), "**Open PvP Battle starts in 30 minutes in Street 2!**");
        assert_eq!(field(&outcome, "map"), "Street 2");
    }

    #[test]
    fn test_open_pvp_missing_map_is_parse_error() {
        let outcome = eval(&open_pvp(), "**open pvp battle starts in 30 minutes in");
        assert_eq!(outcome, MatchOutcome::ParseError(ParseError::EmptyField("map")));
    }

    #[test]
    fn test_separator_not_found() {
        let sig = EventSignature::prefix(
            "third_in",
            "**open pvp",
            Extraction::after("map", "in", 3),
            "r",
            "t",
        );
        let outcome = eval(&sig, "**open pvp battle starts in 30 minutes in street 2!**");
        assert_eq!(
            outcome,
            MatchOutcome::ParseError(ParseError::SeparatorNotFound {
                separator: "in",
                occurrence: 3
            })
        );
    }

    #[test]
    fn test_outlaw_extracts_player_and_map() {
        let outcome = eval(&outlaw(), "**player TestPlayer became an outlaw at street 2!**");
        assert_eq!(field(&outcome, "player"), "TestPlayer");
        assert_eq!(field(&outcome, "map"), "street 2");
    }

    #[test]
    fn test_outlaw_player_named_like_separator() {
        let outcome = eval(&outlaw(), "**player at became an outlaw at downtown 4!**");
        assert_eq!(field(&outcome, "player"), "at");
        assert_eq!(field(&outcome, "map"), "downtown 4");
    }

    #[test]
    fn test_outlaw_unexpected_phrase() {
        let outcome = eval(&outlaw(), "**player TestPlayer something else!**");
        assert!(matches!(
            outcome,
            MatchOutcome::ParseError(ParseError::UnexpectedTokens { index: 1, .. })
        ));
    }

    #[test]
    fn test_prefix_miss_is_no_match() {
        assert_eq!(eval(&outlaw(), "Some random message"), MatchOutcome::NoMatch);
    }
}
