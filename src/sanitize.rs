//! HTML clean-up for the manifest summary.
//!
//! Descriptions arrive as HTML fragments. Comic readers show the summary as plain
//! text, so the fragment goes through an ordered rule table once: tag stripping first,
//! then line breaks, then typographic entities, and `&amp;` last so that escaped
//! entities are not decoded twice.

use lazy_static::lazy_static;
use regex::Regex;

/// One rewrite step of the summary sanitizer.
pub struct Rule {
    pub pattern: Regex,
    pub replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).unwrap(),
        replacement,
    }
}

lazy_static! {
    /// Applied in order, each rule over the whole text.
    pub static ref SUMMARY_RULES: Vec<Rule> = vec![
        // bold, emphasis, headings and block wrappers
        rule(r"(?i)</?(?:strong|b|em|i|h[1-6]|div)>", ""),
        // paragraph and span wrappers, attributes included
        rule(r"(?i)</?(?:p|span)(?:\s[^>]*)?>", ""),
        rule(r"(?i)<br\s*/?>", "\n"),
        rule(r"&[lr]squo;|&#0?39;|&apos;|[\u{2018}\u{2019}]", "'"),
        rule(r"&[lr]dquo;|[\u{201C}\u{201D}]", "\""),
        rule(r"&hellip;|\u{2026}", "..."),
        rule(r"&mdash;|\u{2014}", "---"),
        rule(r"&ndash;|\u{2013}", "-"),
        rule(r"&nbsp;|\u{00A0}", " "),
        rule(r"&amp;", "&"),
    ];
}

/// Turns an HTML description into plain summary text.
pub fn sanitize_summary(html: &str) -> String {
    SUMMARY_RULES
        .iter()
        .fold(html.to_string(), |text, rule| {
            rule.pattern.replace_all(&text, rule.replacement).into_owned()
        })
}
