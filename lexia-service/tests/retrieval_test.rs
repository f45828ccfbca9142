//! Integration tests for document retrieval.
//!
//! Tests touching PostgreSQL are `#[ignore]`d; run them with a local
//! database and `cargo test -- --ignored`.

mod common;

use common::*;
use lexia_service::services::RetrievalService;

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn search_orders_by_score_and_respects_limit() {
    let app = spawn_test_app().await;

    // Phrase match in content -> 1.0
    seed_document(
        &app.db,
        "Acte uniforme OHADA",
        "Pour la création entreprise il faut un dossier complet.",
        "societes",
    )
    .await;
    // Phrase match in title -> 0.9
    seed_document(&app.db, "Guide création entreprise", "Autre contenu.", "societes").await;
    // First keyword only, in content -> 0.7
    seed_document(
        &app.db,
        "Code de commerce",
        "La création d'une société commerciale.",
        "societes",
    )
    .await;
    // Second keyword only -> 0.5
    seed_document(&app.db, "Registre", "Immatriculer son entreprise au RCCM.", "societes").await;
    // No keyword at all: not a candidate.
    seed_document(&app.db, "Code du travail", "Durée légale du travail.", "travail").await;

    let retrieval = RetrievalService::new(app.db.clone());
    let results = retrieval
        .search_relevant_documents("création entreprise", 5)
        .await;

    assert_eq!(results.len(), 4);
    let scores: Vec<f64> = results.iter().map(|d| d.similarity).collect();
    assert_eq!(scores, vec![1.0, 0.9, 0.7, 0.5]);
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(results
        .iter()
        .all(|d| [0.5, 0.6, 0.7, 0.9, 1.0].contains(&d.similarity)));
    assert_eq!(results[0].title, "Acte uniforme OHADA");

    let limited = retrieval
        .search_relevant_documents("création entreprise", 2)
        .await;
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn category_matches_make_documents_candidates() {
    let app = spawn_test_app().await;

    seed_document(&app.db, "Texte divers", "Sans rapport apparent.", "fiscalité").await;

    let retrieval = RetrievalService::new(app.db.clone());
    let results = retrieval
        .search_relevant_documents("question sur la fiscalité locale", 5)
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].similarity, 0.5);
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn unmatched_query_returns_empty() {
    let app = spawn_test_app().await;
    seed_document(&app.db, "Acte uniforme OHADA", "Contenu sur les sociétés.", "societes").await;

    let retrieval = RetrievalService::new(app.db.clone());
    let results = retrieval
        .search_relevant_documents("xyz123nomatch", 5)
        .await;

    assert!(results.is_empty());
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL
async fn like_wildcards_in_queries_match_literally() {
    let app = spawn_test_app().await;
    seed_document(&app.db, "Taux de TVA", "Le taux normal est de 18%.", "fiscalité").await;

    let retrieval = RetrievalService::new(app.db.clone());
    // "100%" must not behave as "100" + match-anything.
    let results = retrieval.search_relevant_documents("remise 100% impôts", 5).await;
    assert!(results.is_empty());
}
