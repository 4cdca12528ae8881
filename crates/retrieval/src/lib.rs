//! Retrieval integration for the Citegate gateway.
//!
//! This crate owns the shape of retrieval hits and everything that turns a
//! raw ranked hit list into the bounded, deduplicated evidence set that is
//! actually shown to the model:
//!
//! - [`types`]: typed `Hit` / `HitMeta` with citation-label derivation
//! - [`normalize`]: noise filter, text-first stable sort, label dedup,
//!   snippet/char budget trim, and citation collection
//! - [`client`]: the `Retriever` trait and its HTTP implementation
//!
//! # Example
//! ```no_run
//! use citegate_retrieval::{HttpRetriever, Retriever, normalize_hits, collect_citations};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retriever = HttpRetriever::new("http://localhost:8001")?;
//! let hits = retriever.search("how do I deploy?", 4).await?;
//! let evidence = normalize_hits(hits, 3, 2400);
//! let citations = collect_citations(&evidence);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod normalize;
pub mod types;

// Re-export main types
pub use client::{HttpRetriever, Retriever};
pub use normalize::{collect_citations, normalize_hits};
pub use types::{Hit, HitMeta, UsedSnippet, UNKNOWN_LABEL};
