// Integration Tests for Request Handling End to End
//
// SYSTEMS UNDER TEST: CollectingInvoker, ResponseAssembler, OutboundResponse
//
// BUSINESS RESPONSIBILITY:
//   - Lets a handler complete partially while recording what failed
//   - Produces one deterministic response per request from result and collected errors
//   - Hides unclassified failures behind a generic internal error
//
// TEST COVERAGE:
//   - Plain success without errors
//   - Raised error without any collector
//   - Several absorbed errors with status-only responses
//   - With-return error raised at the root with errors in the body
//   - Root invoker wrapped around the assembler and rooted assembler
//   - Uncaught non-domain failures

mod common;

use common::{body_json, gateway, send_offer, CountingSink, KNOWN_CUSTOMER};
use http::StatusCode;
use pwext::{
    keys, CollectingInvoker, DomainError, ErrorAction, Fault, InfoClassification,
    OutboundResponse, ResponseAssembler, ResponseFormat, ResponseOptions,
};
use serde_json::json;
use std::sync::Arc;

#[test]
fn test_success_without_errors_returns_body_unchanged() {
    // Arrange
    let assembler = ResponseAssembler::gateway(ResponseOptions::default()).rooted();

    // Act
    let reply = assembler
        .respond(|| {
            Ok::<_, Fault>(
                OutboundResponse::ok()
                    .with_field(keys::OPERATION, "create-offer")
                    .with_field(keys::MESSAGE, "Hello World!"),
            )
        })
        .unwrap();

    // Assert
    let response = gateway(reply);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, r#"{"operation":"create-offer","msg":"Hello World!"}"#);
    assert_eq!(response.headers.len(), 1);
    assert_eq!(response.headers["Content-Type"], "application/json");
}

#[test]
fn test_raised_error_without_collector() {
    // Arrange
    let assembler = ResponseAssembler::gateway(ResponseOptions::with_errors_in_body());

    // Act
    let reply = assembler
        .respond(|| -> Result<OutboundResponse, Fault> {
            Err(DomainError::http(StatusCode::NOT_FOUND, "Failed to find record").into())
        })
        .unwrap();

    // Assert
    let response = gateway(reply);
    assert_eq!(response.status_code, 404);
    assert_eq!(
        body_json(&response),
        json!({"error": {"code": 404, "msg": "Failed to find record", "classification": "NA"}})
    );
}

#[test]
fn test_absorbed_errors_set_status_only() {
    // Test verifies two absorbed errors yield the worst status and a clean body

    // Arrange
    let assembler = ResponseAssembler::gateway(ResponseOptions::default()).rooted();
    let leaf = CollectingInvoker::new();

    // Act
    let reply = assembler
        .respond(|| {
            for (code, message) in [(500, "storage unavailable"), (404, "customer missing")] {
                leaf.invoke(|| -> Result<(), Fault> {
                    Err(DomainError::new(message)
                        .with_code(StatusCode::from_u16(code).unwrap())
                        .with_action(ErrorAction::Continue)
                        .into())
                })?;
            }
            Ok(OutboundResponse::ok().with_field(keys::OPERATION, "sync"))
        })
        .unwrap();

    // Assert
    let response = gateway(reply);
    assert_eq!(response.status_code, 500);
    assert!(body_json(&response).get("error").is_none());
}

#[test]
fn test_with_return_error_at_root_seeds_body() {
    // Arrange
    let root = CollectingInvoker::root();
    let assembler = ResponseAssembler::gateway(ResponseOptions::with_errors_in_body());

    // Act
    let reply = root
        .invoke(|| {
            assembler.respond(|| -> Result<OutboundResponse, Fault> {
                Err(DomainError::with_return(
                    "Failed to find record for customer: XYZ",
                    json!({"route": "to_path_2"}),
                )
                .with_code(StatusCode::NOT_FOUND)
                .with_classification(InfoClassification::CorporateSensitiveInfo)
                .into())
            })
        })
        .unwrap()
        .value()
        .unwrap();

    // Assert
    let response = gateway(reply);
    assert_eq!(response.status_code, 404);
    assert_eq!(
        response.body,
        concat!(
            r#"{"route":"to_path_2","error":{"code":404,"#,
            r#""msg":"Failed to find record for customer: XYZ","#,
            r#""classification":"CORPORATE_SENSITIVE_INFO"}}"#
        )
    );
}

#[test]
fn test_collected_return_value_used_in_body() {
    // Test verifies an absorbed with-return error hands its value to the handler

    // Arrange
    let root = CollectingInvoker::root();
    let leaf = CollectingInvoker::new();
    let assembler = ResponseAssembler::gateway(ResponseOptions::with_errors_in_body());

    // Act
    let reply = root
        .invoke(|| {
            assembler.respond(|| {
                let message = leaf
                    .invoke(|| -> Result<String, Fault> {
                        Err(DomainError::with_return(
                            "Failed to find record for customer: mario@example.com",
                            "my bad",
                        )
                        .with_code(StatusCode::NOT_FOUND)
                        .into())
                    })?
                    .into_value();
                Ok(OutboundResponse::ok()
                    .with_field(keys::OPERATION, "create-offer")
                    .with_field(keys::MESSAGE, message))
            })
        })
        .unwrap()
        .value()
        .unwrap();

    // Assert
    let response = gateway(reply);
    assert_eq!(response.status_code, 404);
    assert_eq!(
        response.body,
        concat!(
            r#"{"operation":"create-offer","msg":"my bad","error":{"code":404,"#,
            r#""msg":"Failed to find record for customer: mario@example.com","classification":"NA"}}"#
        )
    );
}

#[test]
fn test_partial_update_lists_every_failure() {
    // Arrange
    let assembler = ResponseAssembler::gateway(ResponseOptions::with_errors_in_body()).rooted();
    let leaf = CollectingInvoker::new();
    let customers = ["mario@example.com", KNOWN_CUSTOMER, "ivar@example.com"];

    // Act
    let reply = assembler
        .respond(|| {
            let mut updated = Vec::new();
            for customer in customers {
                updated.extend(send_offer(&leaf, customer)?);
            }
            Ok(OutboundResponse::ok()
                .with_field("updated", updated)
                .with_field(keys::OPERATION, "create-offer"))
        })
        .unwrap();

    // Assert
    let response = gateway(reply);
    assert_eq!(response.status_code, 404);
    assert_eq!(
        body_json(&response),
        json!({
            "updated": [KNOWN_CUSTOMER],
            "operation": "create-offer",
            "error": [
                {
                    "code": 404,
                    "msg": "Failed to find record for customer: mario@example.com",
                    "classification": "NA",
                    "details": {"customer": "mario@example.com"}
                },
                {
                    "code": 404,
                    "msg": "Failed to find record for customer: ivar@example.com",
                    "classification": "NA",
                    "details": {"customer": "ivar@example.com"}
                }
            ]
        })
    );
}

#[test]
fn test_uncaught_failure_hidden_behind_generic_error() {
    // Arrange
    let sink = Arc::new(CountingSink::default());
    let assembler = ResponseAssembler::gateway(ResponseOptions::with_errors_in_body())
        .rooted()
        .with_label("lambda_handler")
        .with_sink(sink.clone());

    // Act
    let reply = assembler
        .respond(|| -> Result<OutboundResponse, Fault> {
            Err(anyhow::anyhow!("secret connection string leaked").into())
        })
        .unwrap();

    // Assert
    let response = gateway(reply);
    assert_eq!(response.status_code, 500);
    assert_eq!(response.body, r#"{"error":"Internal Server Error"}"#);
    assert_eq!(sink.labels(), vec!["lambda_handler".to_string()]);
}

#[test]
fn test_json_format_without_gateway() {
    // Arrange
    let assembler = ResponseAssembler::new(ResponseOptions::default(), ResponseFormat::Json);

    // Act
    let reply = assembler
        .respond(|| Ok::<_, Fault>(OutboundResponse::ok().with_field("id", 3)))
        .unwrap();

    // Assert
    assert_eq!(
        reply.as_serialized(),
        Some(r#"{"status_code":200,"content_type":"application/json","body":{"id":3}}"#)
    );
}
