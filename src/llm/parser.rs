//! Response parsing for LLM outputs.
//!
//! The model is expected to answer with a tool call, but some responses put
//! the SQL in a markdown code block instead. This module extracts it so the
//! statement can still go through validation.

use std::ops::Range;

/// Result of parsing an LLM text response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    /// Explanatory text around the SQL.
    pub text: String,
    /// Extracted SQL statement, if any.
    pub sql: Option<String>,
}

impl ParsedResponse {
    /// Creates a parsed response with only text (no SQL).
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sql: None,
        }
    }

    /// Creates a parsed response with SQL and surrounding text.
    pub fn with_sql(text: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sql: Some(sql.into()),
        }
    }
}

/// Parses an LLM response to extract SQL from markdown code blocks.
///
/// Prefers a ```sql block; falls back to a fence without a language
/// specifier. If multiple blocks are present the first one wins. Without any
/// code block the full text is returned with no SQL.
pub fn parse_llm_response(response: &str) -> ParsedResponse {
    for lang in ["sql", ""] {
        if let Some((block, content)) = find_code_block(response, lang) {
            let sql = response[content].trim().to_string();
            let before = response[..block.start].trim_end();
            let after = response[block.end..].trim_start();
            let text = if before.is_empty() || after.is_empty() {
                format!("{before}{after}")
            } else {
                format!("{before}\n{after}")
            };
            return ParsedResponse::with_sql(text.trim(), sql);
        }
    }
    ParsedResponse::text_only(response.trim())
}

/// Locates the first code block fenced with ```lang.
///
/// Returns the span of the whole block (fences included) and the span of its
/// content. An empty `lang` matches only fences with no language specifier.
fn find_code_block(text: &str, lang: &str) -> Option<(Range<usize>, Range<usize>)> {
    let fence = format!("```{lang}");
    let start = text.find(&fence)?;
    let header_end = start + fence.len();
    let newline = text[header_end..].find('\n')?;
    if lang.is_empty() && !text[header_end..header_end + newline].trim().is_empty() {
        return None;
    }
    let content_start = header_end + newline + 1;
    let close = text[content_start..].find("```")?;
    let content_end = content_start + close;
    Some((start..content_end + 3, content_start..content_end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sql_code_block() {
        let response = r#"Here is the query:

```sql
SELECT * FROM perf_data;
```

It returns every job."#;

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.sql, Some("SELECT * FROM perf_data;".to_string()));
        assert!(parsed.text.contains("Here is the query:"));
        assert!(parsed.text.contains("It returns every job."));
    }

    #[test]
    fn test_extract_generic_code_block() {
        let response = "```\nSELECT COUNT(*) FROM perf_data;\n```";

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.sql, Some("SELECT COUNT(*) FROM perf_data;".to_string()));
        assert_eq!(parsed.text, "");
    }

    #[test]
    fn test_no_code_block() {
        let response = "I don't know.";

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.sql, None);
        assert_eq!(parsed.text, response);
    }

    #[test]
    fn test_multiple_code_blocks_uses_first() {
        let response = r#"```sql
SELECT * FROM perf_data;
```

Or narrower:

```sql
SELECT jobid, result FROM perf_data;
```"#;

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.sql, Some("SELECT * FROM perf_data;".to_string()));
    }

    #[test]
    fn test_sql_block_preferred_over_generic() {
        let response = r#"```
not sql
```

```sql
SELECT result FROM perf_data;
```"#;

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.sql, Some("SELECT result FROM perf_data;".to_string()));
    }

    #[test]
    fn test_multiline_sql() {
        let response = r#"```sql
SELECT useremail, COUNT(*) AS jobs
FROM perf_data
GROUP BY useremail
ORDER BY jobs DESC;
```"#;

        let parsed = parse_llm_response(response);

        let sql = parsed.sql.unwrap();
        assert!(sql.contains("GROUP BY useremail"));
        assert!(sql.contains("ORDER BY jobs DESC;"));
    }

    #[test]
    fn test_other_language_not_extracted() {
        let response = "```python\nprint(\"hello\")\n```";

        let parsed = parse_llm_response(response);

        assert_eq!(parsed.sql, None);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert_eq!(parse_llm_response(""), ParsedResponse::text_only(""));

        let parsed = parse_llm_response("  \n```sql\n  SELECT 1;  \n```\n  ");
        assert_eq!(parsed.sql, Some("SELECT 1;".to_string()));
        assert_eq!(parsed.text, "");
    }
}
