//! Typed client for the VidFuse backend API.
//!
//! Wraps every endpoint the client consumes (presigned upload URLs, fusion
//! submission, YouTube metadata, health) around the retrying fetch from
//! `vidfuse-http`.

pub mod client;

pub use client::{BackendClient, BackendError};
