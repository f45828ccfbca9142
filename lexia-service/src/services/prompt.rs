//! System prompt and legal-context assembly for the completion provider.

use crate::dtos::chat::HistoryExchange;
use crate::services::providers::ChatMessage;
use crate::services::retrieval::ScoredDocument;

/// Identity and answering rules for the assistant.
pub const LEXIA_SYSTEM_PROMPT: &str = "Tu es LexIA, assistant juridique IA spécialisé en droit ivoirien.

## Ton identité
- Nom : LexIA (Legal Intelligence Assistant)
- Spécialité : Législation ivoirienne complète
- Mission : Aider entrepreneurs et citoyens ivoiriens

## Tes compétences
- Maîtrise du droit ivoirien
- Explications claires en français
- Conseils pratiques pour entrepreneurs

## Comportement
- Professionnel et courtois
- Cite tes sources quand possible
- Si info manquante, dis-le clairement
- Rappelle de consulter un avocat pour cas complexes

## Format de réponse
1. Réponse directe (2-3 phrases)
2. Explications détaillées
3. Conseil pratique si nécessaire

Réponds toujours en français de manière claire et professionnelle.";

/// Only the most recent exchanges are replayed to the model.
pub const MAX_HISTORY_EXCHANGES: usize = 3;

/// Render retrieved documents into the context block appended to the
/// system prompt.
pub fn build_legal_context(documents: &[ScoredDocument]) -> String {
    if documents.is_empty() {
        return "\n\n**Note:** Aucun document spécifique trouvé. Réponds avec tes connaissances \
                générales du droit ivoirien et recommande de consulter les sources officielles."
            .to_string();
    }

    let mut context = String::from("\n\n## DOCUMENTS JURIDIQUES PERTINENTS\n\n");
    for (idx, document) in documents.iter().enumerate() {
        context.push_str(&format!("### Document {}: {}\n", idx + 1, document.title));
        context.push_str(&format!("Catégorie: {}\n", document.category));
        context.push_str(&format!("Contenu: {}\n", document.content_preview));
        if let Some(url) = &document.source_url {
            context.push_str(&format!("Source: {}\n", url));
        }
        context.push_str("\n---\n\n");
    }
    context.push_str(
        "**Instructions:** Base ta réponse sur ces documents officiels. Cite les documents que tu utilises.",
    );
    context
}

/// Assemble the full message list: system prompt with context, the last few
/// history exchanges, then the current question.
pub fn build_messages(
    question: &str,
    history: &[HistoryExchange],
    documents: &[ScoredDocument],
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(format!(
        "{}{}",
        LEXIA_SYSTEM_PROMPT,
        build_legal_context(documents)
    ))];

    let start = history.len().saturating_sub(MAX_HISTORY_EXCHANGES);
    for exchange in &history[start..] {
        messages.push(ChatMessage::user(exchange.question.clone()));
        messages.push(ChatMessage::assistant(exchange.answer.clone()));
    }

    messages.push(ChatMessage::user(question.to_string()));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::Role;
    use uuid::Uuid;

    fn scored(title: &str, content: &str, url: Option<&str>) -> ScoredDocument {
        ScoredDocument {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content_preview: content.to_string(),
            source_url: url.map(str::to_string),
            category: "societes".to_string(),
            article_number: None,
            similarity: 0.9,
        }
    }

    fn exchange(question: &str, answer: &str) -> HistoryExchange {
        HistoryExchange {
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    #[test]
    fn context_lists_documents_with_sources() {
        let documents = vec![
            scored("Acte uniforme OHADA", "capital minimum", Some("https://ohada.org")),
            scored("Code du travail", "durée du travail", None),
        ];

        let context = build_legal_context(&documents);
        assert!(context.contains("### Document 1: Acte uniforme OHADA"));
        assert!(context.contains("### Document 2: Code du travail"));
        assert!(context.contains("Source: https://ohada.org"));
        assert!(context.contains("Base ta réponse sur ces documents officiels"));
    }

    #[test]
    fn empty_context_falls_back_to_general_knowledge_note() {
        let context = build_legal_context(&[]);
        assert!(context.contains("Aucun document spécifique trouvé"));
    }

    #[test]
    fn messages_start_with_system_and_end_with_question() {
        let messages = build_messages("Ma question ?", &[], &[]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.starts_with("Tu es LexIA"));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "Ma question ?");
    }

    #[test]
    fn history_is_capped_at_three_most_recent_exchanges() {
        let history = vec![
            exchange("q1", "r1"),
            exchange("q2", "r2"),
            exchange("q3", "r3"),
            exchange("q4", "r4"),
            exchange("q5", "r5"),
        ];

        let messages = build_messages("q6", &history, &[]);
        // system + 3 exchanges (2 messages each) + current question
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[1].content, "q3");
        assert_eq!(messages[2].content, "r3");
        assert_eq!(messages[6].content, "r5");
        assert_eq!(messages[7].content, "q6");
    }
}
