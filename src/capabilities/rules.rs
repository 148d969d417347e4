//! Ordered pattern tables: the first rule that matches wins

use regex::{Captures, Regex, RegexBuilder};

/// Case-insensitive patterns tried in declaration order
#[derive(Debug, Clone)]
pub struct RuleTable<T> {
    rules: Vec<(Regex, T)>,
}

impl<T: Clone> RuleTable<T> {
    pub fn compile(rules: &[(&str, T)]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|(pattern, value)| Ok((case_insensitive(pattern)?, value.clone())))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Value and captures of the first matching rule
    pub fn first_match<'t>(&self, text: &'t str) -> Option<(T, Captures<'t>)> {
        self.rules
            .iter()
            .find_map(|(pattern, value)| pattern.captures(text).map(|caps| (value.clone(), caps)))
    }
}

pub(crate) fn case_insensitive(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}
