//! Job Type Classification
//!
//! Derives the `Type` column of a report from free-text job fields using an
//! ordered list of keyword/pattern rules.
//!
//! ## Matching
//!
//! For a given text, only the **first** rule whose keyword occurs in it is tried:
//!
//! - the rule's regex runs against the text; the match (capture group 1 when the
//!   pattern has one, the whole match otherwise) becomes the type
//! - humanized rules strip trailing digits and turn `_` into spaces, so
//!   `fre/ocean_run123` becomes `ocean run`
//! - a keyword hit without a regex match falls back to the keyword itself
//!
//! The job name is tried first; the comment field is only consulted when no
//! keyword occurs in the name. No hit at all yields an empty type.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Serializable form of a rule, as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub keyword: String,
    pub pattern: String,
    #[serde(default)]
    pub humanize: bool,
}

impl RuleSpec {
    pub fn new(keyword: &str, pattern: &str, humanize: bool) -> Self {
        Self {
            keyword: keyword.to_string(),
            pattern: pattern.to_string(),
            humanize,
        }
    }
}

/// Rules used when the config file does not list any.
pub fn default_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new("fre/", r"fre/([A-Za-z0-9_]+)", true),
        RuleSpec::new("refineDiag", r"refineDiag_[A-Za-z0-9]+", false),
        RuleSpec::new("mppnccombine", r"mppnccombine\S*", false),
        RuleSpec::new("frepp", r"frepp\.[A-Za-z0-9_]+", false),
    ]
}

#[derive(Debug, Clone)]
struct Rule {
    keyword: String,
    pattern: Regex,
    humanize: bool,
}

impl Rule {
    fn apply(&self, text: &str) -> String {
        let Some(captures) = self.pattern.captures(text) else {
            return self.keyword.clone();
        };
        let matched = captures
            .get(1)
            .or_else(|| captures.get(0))
            .map(|m| m.as_str())
            .unwrap_or_default();

        if self.humanize {
            humanize(matched)
        } else {
            matched.to_string()
        }
    }
}

fn humanize(matched: &str) -> String {
    matched
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .replace('_', " ")
}

/// Compiled, ordered classification rules.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_specs(&default_rules()).expect("built-in classification patterns compile")
    }
}

impl Classifier {
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Self> {
        let rules = specs
            .iter()
            .map(|spec| {
                let pattern = Regex::new(&spec.pattern).with_context(|| {
                    format!(
                        "Invalid classification pattern for keyword '{}': {}",
                        spec.keyword, spec.pattern
                    )
                })?;
                Ok(Rule {
                    keyword: spec.keyword.clone(),
                    pattern,
                    humanize: spec.humanize,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Type for a single text, `None` when no keyword occurs in it.
    pub fn classify_text(&self, text: &str) -> Option<String> {
        self.rules
            .iter()
            .find(|rule| text.contains(rule.keyword.as_str()))
            .map(|rule| rule.apply(text))
    }

    pub fn classify(&self, name: &str, comment: &str) -> String {
        self.classify_text(name)
            .or_else(|| self.classify_text(comment))
            .unwrap_or_default()
    }
}
