//! Core enrichment pipeline for leadscrub.
//!
//! This crate ties together column resolution, bundling, provider lookup,
//! and LLM classification into the per-row pipeline and the end-to-end
//! dataset run (`run_dataset_task`).

pub mod bundle;
pub mod processor;
pub mod row;
