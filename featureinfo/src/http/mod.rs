//! HTTP transport abstraction for testability
//!
//! The dispatcher never talks to reqwest directly. It sends [`HttpRequest`]s
//! through an [`AsyncHttpClient`], which lets tests substitute scripted
//! clients with controlled latency and failures.

mod client;
mod types;

pub use client::{AsyncHttpClient, AsyncReqwestClient};
pub use types::{HttpError, HttpMethod, HttpRequest, HttpResponse};
