//! Web search for travel information

use async_trait::async_trait;
use serde_json::Value;

use crate::card::{AgentCard, AgentSkill};
use crate::provider::{Provider, ProviderReply};

pub fn search_card() -> AgentCard {
    AgentCard::new("Web Search Agent", "http://localhost:4003/")
        .with_description("Searches the web for travel information through a search tool provider")
        .with_provider("Courier", "https://a2a-protocol.org")
        .add_skill(
            AgentSkill::new(
                "search_travel_info",
                "Search Travel Info",
                "Search the web for travel information, attractions, activities, hotels, restaurants",
            )
            .with_tags(&["search", "travel", "web"])
            .with_examples(&[
                "Search for best things to do in Tokyo",
                "Find top attractions in Paris",
                "What are popular activities in London",
                "Search for hotels in Barcelona",
            ]),
        )
}

/// Subject of a search query: whatever follows the last ` in `
pub fn search_subject(query: &str) -> &str {
    let query = query.trim().trim_end_matches(&['?', '.', '!'][..]);
    match query.rsplit_once(" in ") {
        Some((_, subject)) if !subject.trim().is_empty() => subject.trim(),
        _ => query,
    }
}

/// Canned attraction list for the query's subject
pub fn synthetic_results(subject: &str) -> String {
    format!(
        "Simulated web search results\n\nTop attractions in {subject}:\n\
         - Historic old town with beautiful architecture\n\
         - Famous local markets and street food\n\
         - Popular beaches and coastal areas\n\
         - Museums and cultural centers\n\
         - Parks and natural reserves"
    )
}

/// Offline stand-in for a search tool provider
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticSearch;

#[async_trait]
impl Provider for SyntheticSearch {
    fn name(&self) -> &str {
        "synthetic-search"
    }

    async fn provide(&self, query: &str, _context: Option<&Value>) -> ProviderReply {
        if query.trim().is_empty() {
            return ProviderReply::Error("empty search query".to_string());
        }
        ProviderReply::Text(synthetic_results(search_subject(query)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_after_last_in() {
        assert_eq!(
            search_subject("best things to do and top attractions in New York"),
            "New York"
        );
        assert_eq!(search_subject("Search for hotels in Barcelona?"), "Barcelona");
        assert_eq!(search_subject("museums"), "museums");
    }

    #[tokio::test]
    async fn test_synthetic_search() {
        let reply = SyntheticSearch.provide("top attractions in Kyoto", None).await;
        match reply {
            ProviderReply::Text(text) => assert!(text.contains("Top attractions in Kyoto:")),
            other => panic!("unexpected reply: {other:?}"),
        }
        assert!(matches!(SyntheticSearch.provide(" ", None).await, ProviderReply::Error(_)));
    }
}
