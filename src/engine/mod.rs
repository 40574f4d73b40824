// src/engine/mod.rs

//! The timed assessment engine.
//!
//! Everything except `runtime` is synchronous and free of I/O: a `Session`
//! owns its countdown and answers, `assembler` turns it into a
//! `Submission`, `scoring` and `grading` judge it, and `review` rebuilds
//! the verdicts later from the stored record.

pub mod assembler;
pub mod capture;
pub mod clock;
pub mod grading;
pub mod review;
pub mod runtime;
pub mod scoring;
pub mod session;
