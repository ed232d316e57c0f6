//! Prompt templates for answer synthesis.

use crate::util::truncate_str;

/// Maximum citations listed in the whitelist header.
pub const MAX_WHITELIST_CITATIONS: usize = 8;

/// Maximum context snippets included in a synthesis prompt.
pub const MAX_CONTEXT_SNIPPETS: usize = 8;

/// Character cap applied to each context snippet.
pub const SNIPPET_CHAR_CAP: usize = 1400;

/// Templates for the synthesis call.
pub struct PromptTemplate;

impl PromptTemplate {
    /// Strict-extraction system prompt for final synthesis.
    pub fn synthesis_system() -> &'static str {
        "You are a financial filings analyst. Answer concisely using ONLY the \
         provided filing excerpts. Include citations as [parent_id]; never use \
         numeric references like [14]. If a figure is not in the excerpts, say \
         so. Do not mention prompts, system instructions, or templates."
    }

    /// Whitelist header naming the only ids the model may cite.
    pub fn whitelist_header(citations: &[String]) -> String {
        let listed: Vec<String> = citations
            .iter()
            .take(MAX_WHITELIST_CITATIONS)
            .map(|c| format!("[{c}]"))
            .collect();
        format!("Allowed citations: {}", listed.join(", "))
    }

    /// User prompt: question, whitelist header, then capped context snippets.
    pub fn synthesis_user(question: &str, citations: &[String], context: &[String]) -> String {
        let mut blocks = vec![
            format!("Question: {question}"),
            Self::whitelist_header(citations),
        ];
        blocks.push("Context (verbatim excerpts from filings):".to_string());
        for snippet in context.iter().take(MAX_CONTEXT_SNIPPETS) {
            blocks.push(truncate_str(snippet, SNIPPET_CHAR_CAP).to_string());
        }
        blocks.join("\n---\n")
    }

    /// Refined form of the full variant query used after the first iteration.
    pub fn refined_query(query: &str) -> String {
        format!("{query} (filing details, MD&A preference)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelist_header_caps_at_eight() {
        let citations: Vec<String> = (0..12).map(|i| format!("doc-{i}")).collect();
        let header = PromptTemplate::whitelist_header(&citations);
        assert!(header.starts_with("Allowed citations: [doc-0],"));
        assert!(header.contains("[doc-7]"));
        assert!(!header.contains("[doc-8]"));
    }

    #[test]
    fn user_prompt_contains_question_and_context() {
        let prompt = PromptTemplate::synthesis_user(
            "Revenue in 2019?",
            &["tesla-10k-2019".to_string()],
            &["Total revenue was $24.6B.".to_string()],
        );
        assert!(prompt.contains("Question: Revenue in 2019?"));
        assert!(prompt.contains("Allowed citations: [tesla-10k-2019]"));
        assert!(prompt.contains("Total revenue was $24.6B."));
    }

    #[test]
    fn refined_query_appends_hint() {
        assert_eq!(
            PromptTemplate::refined_query("Tesla revenue"),
            "Tesla revenue (filing details, MD&A preference)"
        );
    }
}
