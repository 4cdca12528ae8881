//! Prompt assembly for the Citegate gateway.
//!
//! A pure function from `(question, evidence)` to the ordered chat message
//! sequence sent to the generation backend. The gateway guarantees the
//! evidence passed in is already normalized; the output is forwarded
//! verbatim.

pub mod builder;

pub use builder::build_messages;
