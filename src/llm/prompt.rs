//! Prompt construction for LLM requests.
//!
//! Builds system prompts with the target collection's field list.

use crate::llm::types::Message;
use crate::search::{format_fields, FieldDescriptor};

/// System prompt template for the query assistant.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a query assistant for an Elasticsearch-compatible search engine. Generate search request bodies based on user questions.

COLLECTION: {collection}

FIELDS:
{fields}
INSTRUCTIONS:
- Generate only a valid JSON request body for the _search endpoint
- Use only the fields listed above
- Use "keyword" fields (or ".keyword" sub-fields) for terms aggregations
- Name terms aggregations "group_by_<field>" and metric aggregations after what they compute
- Set "size": 0 when only aggregations are needed
- Limit hits to 50 documents unless the user specifies otherwise
- If the question cannot be answered with these fields, explain why

OUTPUT FORMAT:
Return the request body wrapped in ```json code blocks.
If you need to explain something, put it before or after the code block."#;

/// Builds the system prompt with the collection and its fields injected.
pub fn build_system_prompt(collection: &str, fields: &[FieldDescriptor]) -> String {
    let fields_text = if fields.is_empty() {
        "  (no fields discovered)\n".to_string()
    } else {
        format_fields(fields)
    };

    SYSTEM_PROMPT_TEMPLATE
        .replace("{collection}", collection)
        .replace("{fields}", &fields_text)
}

/// Builds the complete message list for a generation request.
pub fn build_messages(collection: &str, fields: &[FieldDescriptor], question: &str) -> Vec<Message> {
    vec![
        Message::system(build_system_prompt(collection, fields)),
        Message::user(question),
    ]
}
