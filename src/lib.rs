pub mod core;
pub mod graph;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod tools;

#[cfg(test)]
mod testing;
