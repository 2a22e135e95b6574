//! Test helper utilities for pwext integration tests
//!
//! This module provides reusable fixtures and helper functions
//! that are shared across multiple test modules.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use http::StatusCode;
use pwext::{
    CollectingInvoker, DomainError, ErrorAction, ExceptionSink, Fault, GatewayResponse, Reply,
};
use serde_json::Value;
use std::error::Error as StdError;
use std::sync::Mutex;

/// Known customers of the fake offer service
pub const KNOWN_CUSTOMER: &str = "nisse@example.com";

/// Send an offer, failing with a recoverable 404 for unknown customers
///
/// Mirrors a leaf operation wrapped by a non-root invoker.
pub fn send_offer(invoker: &CollectingInvoker, customer: &str) -> Result<Option<String>, Fault> {
    let collected = invoker.invoke(|| -> Result<String, Fault> {
        if customer != KNOWN_CUSTOMER {
            return Err(DomainError::http(
                StatusCode::NOT_FOUND,
                format!("Failed to find record for customer: {customer}"),
            )
            .with_action(ErrorAction::Continue)
            .with_detail("customer", customer)
            .into());
        }
        Ok(customer.to_string())
    })?;
    Ok(collected.value())
}

/// Unwrap a gateway reply
///
/// # Panics
///
/// Panics if the reply is not a gateway response (test failure is appropriate).
pub fn gateway(reply: Reply) -> GatewayResponse {
    reply.into_gateway().expect("expected a gateway response")
}

/// Parse a gateway body as JSON
pub fn body_json(response: &GatewayResponse) -> Value {
    serde_json::from_str(&response.body).expect("gateway body should be JSON")
}

/// Sink that counts reported failures
#[derive(Debug, Default)]
pub struct CountingSink {
    labels: Mutex<Vec<String>>,
}

impl CountingSink {
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

impl ExceptionSink for CountingSink {
    fn log_exception(&self, label: &str, _error: &(dyn StdError + 'static)) {
        self.labels.lock().unwrap().push(label.to_string());
    }
}
