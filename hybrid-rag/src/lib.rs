pub mod protocol;
pub mod rag_engine;
pub mod rag_gateway;
