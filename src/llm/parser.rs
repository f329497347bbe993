//! Response parsing for LLM outputs.
//!
//! Extracts the structured query from responses that may wrap it in
//! markdown code blocks or surround it with explanatory text.

use std::sync::OnceLock;

use regex::Regex;

/// Result of parsing an LLM response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Any explanatory text outside the extracted query.
    pub text: String,
    /// Extracted query text, if found.
    pub query: Option<String>,
}

impl ParsedResponse {
    /// Creates a parsed response with only text (no query).
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            query: None,
        }
    }

    /// Creates a parsed response with a query and optional text.
    pub fn with_query(text: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            query: Some(query.into()),
        }
    }
}

fn code_block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```([A-Za-z]*)[ \t]*\r?\n(.*?)```").expect("valid code block regex")
    })
}

/// Parses an LLM response to extract a structured query.
///
/// Looks for the query in the following order:
/// - the first ```json ... ``` block
/// - the first ``` ... ``` block with no language tag
/// - the whole response, when it parses as JSON on its own
///
/// Blocks tagged with another language are ignored. Blank blocks count as
/// no query.
pub fn parse_llm_response(response: &str) -> ParsedResponse {
    let blocks: Vec<_> = code_block_pattern().captures_iter(response).collect();

    let pick = |lang_matches: &dyn Fn(&str) -> bool| {
        blocks.iter().find(|caps| {
            let lang = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            lang_matches(lang) && !body.trim().is_empty()
        })
    };

    let found = pick(&|lang| lang.eq_ignore_ascii_case("json")).or_else(|| pick(&str::is_empty));

    if let Some(caps) = found {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(2)) else {
            return ParsedResponse::text_only(response.trim());
        };
        let text = format!("{}{}", &response[..whole.start()], &response[whole.end()..]);
        return ParsedResponse::with_query(text.trim(), body.as_str().trim());
    }

    let trimmed = response.trim();
    if !trimmed.is_empty() && serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        return ParsedResponse::with_query("", trimmed);
    }

    ParsedResponse::text_only(trimmed)
}
