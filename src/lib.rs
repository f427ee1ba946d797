// textbook-backend - Q&A, translation and profile API for the Physical AI textbook
// Author: kelexine (https://github.com/kelexine)

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod rag;
pub mod server;
pub mod translation;
pub mod utils;
