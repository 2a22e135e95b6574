//! Test helper utilities for pwext unit tests
//!
//! This module provides reusable fixtures and helper functions
//! that are shared across multiple test modules.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]
// The mocked signature keeps the `'static` object bound of the trait
#![allow(unused_parens)]

use crate::assembler::{GatewayResponse, Reply};
use crate::core_types::ErrorAction;
use crate::error::{DomainError, Fault};
use crate::logging::ExceptionSink;
use http::StatusCode;
use serde_json::Value;
use std::error::Error as StdError;
use std::sync::Mutex;

mockall::mock! {
    /// Mock exception sink for verifying non-domain failure reporting
    pub Sink {}

    impl ExceptionSink for Sink {
        fn log_exception(&self, label: &str, error: &(dyn StdError + 'static));
    }
}

/// Sink that remembers every reported `(label, message)` pair
#[derive(Debug, Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().unwrap().clone()
    }
}

impl ExceptionSink for RecordingSink {
    fn log_exception(&self, label: &str, error: &(dyn StdError + 'static)) {
        self.reports
            .lock()
            .unwrap()
            .push((label.to_string(), error.to_string()));
    }
}

/// Domain error with the given code and action `Continue`
pub fn continue_error(code: u16, message: &str) -> DomainError {
    DomainError::http(StatusCode::from_u16(code).unwrap(), message)
        .with_action(ErrorAction::Continue)
}

/// Domain error with the given code and action `Raise`
pub fn raise_error(code: u16, message: &str) -> DomainError {
    DomainError::http(StatusCode::from_u16(code).unwrap(), message)
}

/// Non-domain failure
pub fn other_fault(message: &str) -> Fault {
    Fault::Other(anyhow::anyhow!(message.to_string()))
}

/// Unwrap a gateway reply, panicking on any other shape
pub fn gateway(reply: Reply) -> GatewayResponse {
    match reply {
        Reply::Gateway(response) => response,
        other => panic!("expected a gateway reply, got {other:?}"),
    }
}

/// Parse the gateway body as JSON
pub fn body_json(response: &GatewayResponse) -> Value {
    serde_json::from_str(&response.body).expect("gateway body should be JSON")
}
