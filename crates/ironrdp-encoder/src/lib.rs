//! Asynchronous screen-encoding worker for an RDP session.
//!
//! An [`Encoder`] sits between a display-capture pipeline and the RDP transport. The session
//! thread enqueues [`Job`]s; a dedicated worker thread drains them, runs the codec strategy
//! chosen at construction time, and publishes [`JobResult`]s back.

#[macro_use]
extern crate tracing;

pub mod capability;
pub mod config;
pub mod encoder;
pub mod error;
pub mod fifo;
pub mod job;
pub mod quant;
pub mod result;
mod strategy;
mod worker;

pub use capability::{ClientCapabilities, ConnectionClass};
pub use config::EncoderConfig;
pub use encoder::Encoder;
pub use error::{EncoderCreateError, GfxParseError};
pub use job::{Job, JobFlags, Rect};
pub use quant::QuantVector;
pub use result::{JobResult, ResultFlags};
