//! Keyword-based retrieval of legal documents for LLM context.
//!
//! Deliberately naive: whitespace tokens over three characters, ILIKE
//! candidate matching, and a fixed five-tier score. Vector search stays in
//! the ingestion pipeline.

use serde::Serialize;
use uuid::Uuid;

use lexia_core::error::AppError;

use crate::models::LegalDocument;
use crate::services::Database;

/// Keywords are whitespace tokens strictly longer than this many characters.
const MIN_KEYWORD_CHARS: usize = 3;

/// At most this many keywords participate in the store query.
const MAX_KEYWORDS: usize = 5;

/// A document with its heuristic relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub id: Uuid,
    pub title: String,
    pub content_preview: String,
    pub source_url: Option<String>,
    pub category: String,
    pub article_number: Option<String>,
    pub similarity: f64,
}

#[derive(Clone)]
pub struct RetrievalService {
    db: Database,
}

impl RetrievalService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Find the `limit` most relevant documents for a free-text question.
    ///
    /// Never fails: store errors are logged and degrade to an empty context.
    pub async fn search_relevant_documents(&self, query: &str, limit: usize) -> Vec<ScoredDocument> {
        match self.search(query, limit).await {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(error = %e, "Document search failed, returning empty context");
                Vec::new()
            }
        }
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<ScoredDocument>, AppError> {
        let normalized = normalize_query(query);
        let keywords = extract_keywords(&normalized);

        // Without keywords the OR-filter would degenerate to matching every
        // document; skip the store entirely instead.
        if keywords.is_empty() {
            tracing::debug!(query, "No usable keywords, skipping document search");
            return Ok(Vec::new());
        }

        tracing::debug!(query = %normalized, keywords = ?keywords, "Searching legal documents");

        let candidates = self.db.find_documents_matching(&keywords).await?;
        let results = rank(candidates, &normalized, &keywords, limit);

        tracing::debug!(found = results.len(), "Document search finished");
        Ok(results)
    }
}

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Tokens longer than three characters, capped at five. No stemming, no
/// stopword list beyond the length filter.
pub fn extract_keywords(normalized_query: &str) -> Vec<String> {
    normalized_query
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_KEYWORD_CHARS)
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Fixed scoring tiers: full-query substring in content beats full query in
/// title beats first-keyword matches. Everything else scores the floor.
/// Only the first keyword participates in the middle tiers; the rest merely
/// decide which candidates exist.
pub fn score_document(document: &LegalDocument, normalized_query: &str, first_keyword: &str) -> f64 {
    let content = document.content_preview.to_lowercase();
    let title = document.title.to_lowercase();

    if content.contains(normalized_query) {
        1.0
    } else if title.contains(normalized_query) {
        0.9
    } else if !first_keyword.is_empty() && content.contains(first_keyword) {
        0.7
    } else if !first_keyword.is_empty() && title.contains(first_keyword) {
        0.6
    } else {
        0.5
    }
}

/// Score candidates, order by descending score, and truncate to `limit`.
/// The sort is stable, so ties keep the store's newest-first order.
pub fn rank(
    candidates: Vec<LegalDocument>,
    normalized_query: &str,
    keywords: &[String],
    limit: usize,
) -> Vec<ScoredDocument> {
    let first_keyword = keywords.first().map(String::as_str).unwrap_or("");

    let mut scored: Vec<ScoredDocument> = candidates
        .into_iter()
        .map(|document| {
            let similarity = score_document(&document, normalized_query, first_keyword);
            ScoredDocument {
                id: document.id,
                title: document.title,
                content_preview: document.content_preview,
                source_url: document.source_url,
                category: document.category,
                article_number: document.article_number,
                similarity,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn document(title: &str, content: &str, category: &str) -> LegalDocument {
        LegalDocument {
            id: Uuid::new_v4(),
            title: title.to_string(),
            category: category.to_string(),
            content_preview: content.to_string(),
            source_url: None,
            article_number: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn keywords_keep_tokens_longer_than_three_chars() {
        let keywords = extract_keywords("créer une sarl en côte d'ivoire");
        assert_eq!(keywords, vec!["créer", "sarl", "côte", "d'ivoire"]);
    }

    #[test]
    fn keywords_are_capped_at_five() {
        let keywords =
            extract_keywords("premier second troisième quatrième cinquième sixième septième");
        assert_eq!(keywords.len(), 5);
        assert_eq!(keywords[0], "premier");
        assert_eq!(keywords[4], "cinquième");
    }

    #[test]
    fn short_query_yields_no_keywords() {
        assert!(extract_keywords("loi").is_empty());
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("a bc de").is_empty());
    }

    #[test]
    fn normalization_lowercases_and_trims() {
        assert_eq!(normalize_query("  SARL Abidjan  "), "sarl abidjan");
    }

    #[test]
    fn score_tiers_are_ordered() {
        let query = "capital minimum sarl";
        let first = "capital";

        let full_in_content = document("Titre", "le capital minimum sarl est fixé", "societes");
        let full_in_title = document("capital minimum sarl", "autre contenu", "societes");
        let keyword_in_content = document("Titre", "le capital social requis", "societes");
        let keyword_in_title = document("capital social", "autre contenu", "societes");
        let other_match = document("Titre", "contenu sans rapport", "societes");

        assert_eq!(score_document(&full_in_content, query, first), 1.0);
        assert_eq!(score_document(&full_in_title, query, first), 0.9);
        assert_eq!(score_document(&keyword_in_content, query, first), 0.7);
        assert_eq!(score_document(&keyword_in_title, query, first), 0.6);
        assert_eq!(score_document(&other_match, query, first), 0.5);
    }

    #[test]
    fn scoring_is_case_insensitive() {
        let doc = document("CAPITAL MINIMUM SARL", "Contenu", "societes");
        assert_eq!(score_document(&doc, "capital minimum sarl", "capital"), 0.9);
    }

    #[test]
    fn rank_orders_descending_and_truncates() {
        let query = "capital minimum sarl";
        let keywords = vec!["capital".to_string(), "minimum".to_string()];

        let candidates = vec![
            document("Divers", "contenu sans rapport", "societes"),
            document("capital social", "autre contenu", "societes"),
            document("Titre", "le capital minimum sarl est fixé", "societes"),
            document("Titre", "le capital social requis", "societes"),
        ];

        let ranked = rank(candidates, query, &keywords, 3);
        assert_eq!(ranked.len(), 3);
        let scores: Vec<f64> = ranked.iter().map(|d| d.similarity).collect();
        assert_eq!(scores, vec![1.0, 0.7, 0.6]);
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn rank_without_candidates_is_empty() {
        let ranked = rank(Vec::new(), "question", &["question".to_string()], 5);
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn short_query_skips_the_store() {
        // The lazy pool would fail on any query; the early return means the
        // store is never reached.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/lexia_test")
            .expect("lazy pool");
        let service = RetrievalService::new(Database::new(pool));

        let results = service.search_relevant_documents("loi", 5).await;
        assert!(results.is_empty());
    }
}
