pub mod conversation;
pub mod legal_document;

pub use conversation::Conversation;
pub use legal_document::LegalDocument;
