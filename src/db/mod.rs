//! Vector index storage.
//!
//! - [`vectorstore`]: the [`VectorIndex`] trait and provider selection
//! - [`ragdesk_vector`]: embedded backend built on the `ragdesk-vector` crate

pub mod ragdesk_vector;
pub mod vectorstore;

pub use ragdesk_vector::EmbeddedIndex;
pub use vectorstore::{VectorIndex, VectorIndexProvider};
