//! Text processing, embedding and ranking

pub mod document;
pub mod text_processor;
pub mod embeddings;
pub mod embedding_manager;
pub mod ranker;
