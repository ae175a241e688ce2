#![doc = "deck-builder-core: core logic library for deck-builder."]

//! This crate contains the slide listing, the batch assembly driver and the
//! default collaborators (HTML slide converter, `.pptx` builder).
//!
//! # Usage
//! Build a [`listing::SourceSelection`], then call [`assemble::build_deck`] with a
//! fresh [`pptx::PptxDeckBuilder`] and an [`convert::HtmlSlideConverter`], or bring
//! your own implementations of the [`contract`] traits.

pub mod assemble;
pub mod contract;
pub mod convert;
pub mod listing;
pub mod pptx;
