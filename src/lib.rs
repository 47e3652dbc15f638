//! # remedyrag — home-remedy question answering
//!
//! Loads "symptom → home remedy" records from JSONL, indexes them in a local
//! vector store, and answers questions by retrieving the closest remedies and
//! handing them to a chat model with a fixed prompt.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, defaults, and validation
//! - **[`secrets`]** — API credential from a TOML secrets file
//! - **[`ingest`]** — JSONL record loading, document construction, batch ingestion
//! - **[`embedder`]** — Text embedding via ONNX Runtime (all-MiniLM-L6-v2)
//! - **[`db`]** — SQLite + sqlite-vec storage for the persisted index
//! - **[`index`]** — `VectorIndex` trait with persisted and in-memory backends
//! - **[`prompt`]** — Prompt template and context assembly
//! - **[`generator`]** — Chat-completion client behind the `Generator` trait
//! - **[`answer`]** — Retrieve → prompt → generate orchestration

pub mod answer;
pub mod config;
pub mod db;
pub mod embedder;
pub mod generator;
pub mod index;
pub mod ingest;
pub mod prompt;
pub mod secrets;
