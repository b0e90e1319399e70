//! Pipeline stages for extracting one document.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and the HTTP transport can be swapped without
//! touching encoding or cleanup.
//!
//! ## Data Flow
//!
//! ```text
//! encode ──▶ extract ──▶ postprocess
//! (base64)   (vision API) (unfence + parse)
//! ```
//!
//! 1. [`encode`]      — base64 the file and build the `generateContent` body
//! 2. [`extract`]     — MIME gate, timeout, retry/backoff; the only stage
//!    with network I/O
//! 3. [`postprocess`] — dig the answer out of the response, strip code
//!    fences, parse the JSON object

pub mod encode;
pub mod extract;
pub mod postprocess;
