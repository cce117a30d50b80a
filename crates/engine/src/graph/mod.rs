//! In-memory link graph
//!
//! One platform's articles and internal links loaded as adjacency lists for
//! the duration of an analysis cycle. Every algorithm in the engine reads
//! this snapshot; nothing mutates it mid-computation.

mod link_graph;

pub use link_graph::{LinkGraph, SnapshotStats};

#[cfg(test)]
pub(crate) use link_graph::tests;
