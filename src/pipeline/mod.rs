//! The question-answering pipeline.
//!
//! [`Pipeline::run`] walks a fixed sequence of [`Stage`]s: refine the query, retrieve
//! and fuse candidates, rerank, generate, judge (regenerating low-confidence answers a
//! bounded number of times), post-process, and cite on request. Only a missing document
//! and a failed first generation surface as [`PipelineError`]s; every other collaborator
//! failure degrades to its fallback.

pub mod config;
pub mod controller;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod postprocess;
pub mod refine;
pub mod request;
pub mod result;


pub use config::PipelineConfig;
pub use controller::{Pipeline, PipelineBuilder, Stage, confidence_footer};
pub use error::{ErrorResponse, PipelineError};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockRefiner;
pub use postprocess::{EMPTY_ANSWER, PostProcessor};
pub use refine::{GenerativeRefiner, QueryRefiner};
pub use request::PipelineRequest;
pub use result::{AttemptRecord, Citation, DebugInfo, PipelineResult};
