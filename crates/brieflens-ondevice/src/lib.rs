//! BriefLens On-Device Invoker
//!
//! The local family runs on whatever summarizer and translator primitives
//! the host platform exposes. This crate defines those primitives as the
//! `OnDeviceRuntime` seam and wraps them in `OnDeviceInvoker`, which
//! implements the same `Provider` contract as the remote connectors.

pub mod invoker;
pub mod runtime;

pub use invoker::OnDeviceInvoker;
pub use runtime::{
    OnDeviceRuntime, RuntimeError, SummarizerOptions, SummarizerSession, SummaryFormat,
    SummaryLength, SummaryType, TranslationAvailability, TranslatorSession, UnsupportedRuntime,
};
