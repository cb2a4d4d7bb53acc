//! Search context - transient snippet/source text used to ground one prompt

use tracing::debug;

use super::SearchResponse;

/// Longest snippet carried into a prompt, in characters
const MAX_SNIPPET_CHARS: usize = 500;

/// One snippet and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub content: String,
    pub source: String,
}

/// Snippets gathered for a single prompt, in provider rank order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchContext {
    entries: Vec<ContextEntry>,
}

impl SearchContext {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from one provider response, skipping blank snippets
    pub fn from_response(response: &SearchResponse) -> Self {
        debug!(result_count = response.results.len(), "SearchContext::from_response: called");
        let mut context = Self::default();
        context.extend(response);
        context
    }

    /// Append another response's snippets, skipping ones already present
    pub fn extend(&mut self, response: &SearchResponse) {
        for hit in &response.results {
            let content = hit.content.trim();
            if content.is_empty() {
                continue;
            }
            let entry = ContextEntry {
                content: truncate(content, MAX_SNIPPET_CHARS),
                source: hit.url.clone(),
            };
            if !self.entries.contains(&entry) {
                self.entries.push(entry);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    /// Render as a bullet list, one snippet per line with its source
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                if e.source.is_empty() {
                    format!("- {}", e.content)
                } else {
                    format!("- {} (Source: {})", e.content, e.source)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Truncate to at most `max_chars` characters
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchHit;

    fn response(hits: &[(&str, &str)]) -> SearchResponse {
        SearchResponse {
            results: hits
                .iter()
                .map(|(content, url)| SearchHit {
                    title: None,
                    url: url.to_string(),
                    content: content.to_string(),
                    score: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_with_sources() {
        let ctx = SearchContext::from_response(&response(&[
            ("Line 1 takes 12 minutes", "https://transit.example"),
            ("About 2.1 km on foot", ""),
        ]));
        assert_eq!(
            ctx.render(),
            "- Line 1 takes 12 minutes (Source: https://transit.example)\n- About 2.1 km on foot"
        );
    }

    #[test]
    fn test_blank_snippets_skipped_and_duplicates_merged() {
        let mut ctx = SearchContext::from_response(&response(&[("A", "u1"), ("  ", "u2")]));
        ctx.extend(&response(&[("A", "u1"), ("B", "u3")]));
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.entries()[1].content, "B");
    }

    #[test]
    fn test_empty() {
        let ctx = SearchContext::from_response(&SearchResponse::default());
        assert!(ctx.is_empty());
        assert_eq!(ctx.render(), "");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("駅から徒歩十分", 3), "駅から...");
    }
}
