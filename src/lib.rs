//! mailtriage - batch email triage
//!
//! Reads a directory of messages, classifies each into a request category and
//! sub-category, extracts amounts, dates and entities, flags duplicate submissions,
//! and routes every request to a team with a priority. Classification and entity
//! recognition are injected collaborators; see [`pipeline::Pipeline`].

pub mod classify;
pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod message;
pub mod patterns;
pub mod pipeline;
pub mod routing;
pub mod storage;
pub mod taxonomy;

pub use error::{Result, TriageError};
