//! Capability traits at the seams of the dispatch core

pub mod function;
pub mod llm;
pub mod storage;

pub use function::BusinessFunction;
pub use llm::LLMProvider;
pub use storage::ShopStorage;
