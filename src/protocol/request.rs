//! Request parsing from raw message bytes.
//!
//! # Responsibilities
//! - Split one message into the target line and the body line
//! - Derive the routing target (everything before the first `?`)
//! - Carry the header map that pre-handlers populate
//! - Decode the body as JSON on demand
//!
//! # Design Decisions
//! - Lines end at `\n`; a `\r` directly before it is dropped
//! - The body line may end at end-of-message without a newline
//! - An empty body line is valid, a missing one is not
//! - Target bytes are decoded lossily; only line presence is validated

use std::collections::HashMap;

use serde::de::DeserializeOwned;

use crate::error::{BodyError, FrameError};

/// A parsed, routable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    target: String,
    raw_target: String,
    body: Vec<u8>,
    headers: HashMap<String, String>,
}

impl Request {
    /// Parse one raw message.
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        let (target_line, rest) = next_line(data).ok_or(FrameError::Malformed("target"))?;
        let (body_line, _) = next_line(rest).ok_or(FrameError::Malformed("body"))?;

        let raw_target = String::from_utf8_lossy(target_line).into_owned();
        let target = split_target(&raw_target).to_string();

        Ok(Self {
            target,
            raw_target,
            body: body_line.to_vec(),
            headers: HashMap::new(),
        })
    }

    /// Routing target: the first line up to (excluding) the first `?`.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The full first line, query suffix included.
    pub fn raw_target(&self) -> &str {
        &self.raw_target
    }

    /// Query suffix after the first `?`, if any.
    pub fn query(&self) -> Option<&str> {
        self.raw_target.split_once('?').map(|(_, q)| q)
    }

    /// The body line, verbatim.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Mutable header access for pre-handlers.
    pub fn headers_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Decode the body as JSON.
    pub fn decode_body<T: DeserializeOwned>(&self) -> Result<T, BodyError> {
        if self.body.is_empty() {
            return Err(BodyError::Empty);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Everything before the first `?`.
pub(crate) fn split_target(raw_target: &str) -> &str {
    raw_target
        .split_once('?')
        .map_or(raw_target, |(target, _)| target)
}

/// Read one line; `None` once the input is exhausted.
fn next_line(data: &[u8]) -> Option<(&[u8], &[u8])> {
    if data.is_empty() {
        return None;
    }
    match data.iter().position(|&b| b == b'\n') {
        Some(end) => {
            let line = &data[..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            Some((line, &data[end + 1..]))
        }
        None => Some((data, &[])),
    }
}
