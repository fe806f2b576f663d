//! Prompt construction for the query router and tag classifier.
//!
//! Pure string builders, kept free of any model or storage concern so they
//! can be unit-tested exactly.

use tabletalk_core::types::ChatMessage;

/// Render a conversation history as `role: content` lines, oldest first.
///
/// No truncation is applied; history grows without bound for long-lived
/// sessions. The ordering is load-bearing for follow-up questions.
pub fn history_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// System prompt for the retrieval-augmented strategy: history, retrieved
/// records, and instructions around the latest utterance.
pub fn semantic_answer_prompt(history: &str, context: &str, latest: &str) -> String {
    format!(
        "You are a helpful assistant. Your task is to answer the user's questions based on the provided context.\n\
         The context includes the previous conversation history and a list of retrieved records.\n\
         Use the conversation history to understand follow-up questions. Use the records to answer questions about the data.\n\n\
         --- Previous Conversation ---\n{history}\n\n\
         --- Retrieved Records ---\n{context}\n\n\
         --- INSTRUCTIONS ---\n\
         Based on all the context above, provide a clear and accurate answer to the user's LATEST message: '{latest}'.\n\
         If the user asks about specific entries, list all matching entries with their key details. Do not summarize unless asked."
    )
}

/// Translation-stage prompt: schema plus history in, one SQLite query out.
pub fn sql_generation_prompt(schema: &str, history: &str, latest: &str) -> String {
    format!(
        "You are an expert SQLite query writer. Given a table schema and a conversation, \
         write a single read-only SQLite query that answers the user's latest question.\n\
         Respond with the query text only, no explanation and no code fences.\n\n\
         Schema:\n{schema}\n\n\
         Conversation History:\n{history}\n\n\
         User's Latest Question: '{latest}'\n\n\
         Query:"
    )
}

/// Synthesis-stage prompt: turn a query plus its raw result text into a
/// natural-language answer. The result text may itself be an error
/// description; the model is asked to handle that gracefully.
pub fn synthesis_prompt(question: &str, query: &str, result_text: &str) -> String {
    format!(
        "You are a helpful assistant. A user asked a question, a query was run against the \
         knowledge base, and its raw result is below. Answer the user's question in clear \
         natural language using that result.\n\
         If the result is an error message or empty, say you could not find the answer and \
         suggest rephrasing, without mentioning SQL.\n\n\
         User's Question: '{question}'\n\n\
         Query:\n{query}\n\n\
         Result:\n{result_text}"
    )
}

/// Tag-classification prompt asking for a small JSON object.
pub fn tag_prompt(history: &str) -> String {
    format!(
        "You are a helpful assistant that categorizes conversations. Based on the following \
         conversation history, generate a JSON list of 1 to 3 relevant tags. Example tags \
         include: 'Property Inquiry', 'Price Comparison', 'Specific Unit Question', \
         'Resolved', 'Unresolved', 'General Question'.\n\n\
         Conversation History:\n{history}\n\n\
         Respond with a JSON object like {{\"tags\": [\"tag1\", \"tag2\"]}}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_text_ordering() {
        let messages = vec![
            ChatMessage::user("first"),
            ChatMessage::assistant("second"),
            ChatMessage::user("third"),
        ];
        let text = history_text(&messages);
        assert_eq!(text, "user: first\nassistant: second\nuser: third");
    }

    #[test]
    fn test_history_text_empty() {
        assert_eq!(history_text(&[]), "");
    }

    #[test]
    fn test_semantic_prompt_contains_sections() {
        let prompt = semantic_answer_prompt("user: hi", "- Record one", "what now?");
        assert!(prompt.contains("--- Previous Conversation ---\nuser: hi"));
        assert!(prompt.contains("--- Retrieved Records ---\n- Record one"));
        assert!(prompt.contains("LATEST message: 'what now?'"));
    }

    #[test]
    fn test_sql_generation_prompt_shape() {
        let prompt = sql_generation_prompt(
            "table listings (Address TEXT, Rent REAL)",
            "user: hello",
            "average rent?",
        );
        assert!(prompt.contains("Schema:\ntable listings (Address TEXT, Rent REAL)"));
        assert!(prompt.contains("User's Latest Question: 'average rent?'"));
        assert!(prompt.trim_end().ends_with("Query:"));
    }

    #[test]
    fn test_synthesis_prompt_carries_result() {
        let prompt = synthesis_prompt("how many?", "SELECT COUNT(*) FROM t", "42");
        assert!(prompt.contains("User's Question: 'how many?'"));
        assert!(prompt.contains("Result:\n42"));
    }

    #[test]
    fn test_tag_prompt_requests_json_object() {
        let prompt = tag_prompt("user: hi\nassistant: hello");
        assert!(prompt.contains("Conversation History:\nuser: hi\nassistant: hello"));
        assert!(prompt.contains("{\"tags\": [\"tag1\", \"tag2\"]}"));
    }
}
