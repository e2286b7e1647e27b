// Alert text rendering.
//
// Templates carry `{name}` placeholders (`{role}`, `{map}`, `{player}`,
// `{timestamp}`). Unknown placeholders are left in place.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("Invalid placeholder regex");
}

/// Substitute `{name}` placeholders with values from `vars`.
pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            vars.get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
