// Integration Tests for Request Isolation
//
// SYSTEMS UNDER TEST: scope, CollectingInvoker, ResponseAssembler
//
// BUSINESS RESPONSIBILITY:
//   - Gives every concurrent request its own collector
//   - Keeps a request's collector across await points and worker threads
//   - Never lets one request's errors change another request's status code
//
// TEST COVERAGE:
//   - Parallel OS threads with synchronous roots
//   - Concurrent tokio tasks on a multi-threaded runtime
//   - Nested async operations sharing the task collector

mod common;

use common::{body_json, gateway, send_offer, KNOWN_CUSTOMER};
use futures_util::future::join_all;
use pwext::{
    scope, CollectingInvoker, Fault, OutboundResponse, ResponseAssembler, ResponseOptions,
};
use std::thread;

fn customers_for(request: usize) -> Vec<String> {
    (0..request)
        .map(|i| format!("unknown-{request}-{i}@example.com"))
        .chain(std::iter::once(KNOWN_CUSTOMER.to_string()))
        .collect()
}

#[test]
fn test_threads_collect_independently() {
    // Test verifies requests on parallel threads only see their own failures

    // Arrange
    let handles: Vec<_> = (0..8)
        .map(|request| {
            thread::spawn(move || {
                let assembler =
                    ResponseAssembler::gateway(ResponseOptions::with_errors_in_body()).rooted();
                let leaf = CollectingInvoker::new();
                let customers = customers_for(request);

                // Act
                let reply = assembler
                    .respond(|| {
                        let mut updated = Vec::new();
                        for customer in &customers {
                            updated.extend(send_offer(&leaf, customer)?);
                        }
                        Ok(OutboundResponse::ok().with_field("updated", updated))
                    })
                    .unwrap();
                (request, gateway(reply))
            })
        })
        .collect();

    // Assert
    for handle in handles {
        let (request, response) = handle.join().unwrap();
        let body = body_json(&response);
        let error_count = match &body["error"] {
            serde_json::Value::Null => 0,
            serde_json::Value::Array(errors) => errors.len(),
            _ => 1,
        };
        assert_eq!(error_count, request, "request {request} saw foreign errors");
        let expected_status = if request == 0 { 200 } else { 404 };
        assert_eq!(response.status_code, expected_status);
    }
    assert!(scope::current().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_tasks_collect_independently() {
    // Test verifies concurrent tasks keep separate collectors across worker threads

    // Arrange
    let tasks = (0..16).map(|request| {
        tokio::spawn(async move {
            let assembler =
                ResponseAssembler::gateway(ResponseOptions::with_errors_in_body()).rooted();
            let leaf = CollectingInvoker::new();
            let customers = customers_for(request % 4);

            // Act
            let reply = assembler
                .respond_async(async {
                    let mut updated = Vec::new();
                    for customer in &customers {
                        tokio::task::yield_now().await;
                        updated.extend(send_offer(&leaf, customer)?);
                    }
                    Ok::<_, Fault>(OutboundResponse::ok().with_field("updated", updated))
                })
                .await
                .unwrap();
            (request % 4, gateway(reply))
        })
    });

    // Assert
    for joined in join_all(tasks).await {
        let (failures, response) = joined.unwrap();
        let body = body_json(&response);
        let error_count = match &body["error"] {
            serde_json::Value::Null => 0,
            serde_json::Value::Array(errors) => errors.len(),
            _ => 1,
        };
        assert_eq!(error_count, failures);
        assert_eq!(body["updated"], serde_json::json!([KNOWN_CUSTOMER]));
    }
}

#[tokio::test]
async fn test_nested_async_invokers_share_task_collector() {
    // Arrange
    let root = CollectingInvoker::root();
    let middle = CollectingInvoker::new();

    // Act
    let outcome = root
        .invoke_async(async {
            middle
                .invoke_async(async {
                    tokio::task::yield_now().await;
                    send_offer(&CollectingInvoker::new(), "ghost@example.com")
                })
                .await?;
            Ok::<_, Fault>(scope::current().map(|c| c.len()))
        })
        .await;

    // Assert
    assert_eq!(outcome.unwrap().value(), Some(Some(1)));
    assert!(scope::current().is_none());
}
