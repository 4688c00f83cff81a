//! Table-driven checks of `build_*` / `parse_*` against `test-vectors/*.json`.
//!
//! A case gives the input, the request the client must build, a canned
//! server response, and either the typed result or the expected error.
//! Bodies are compared as JSON values so key order does not matter.

use serde_json::Value;
use todo_client::{
    ApiError, CreateTodo, HttpMethod, HttpRequest, HttpResponse, ListQuery, Todo, TodoClient,
};

const BASE_URL: &str = "http://localhost:5000";

fn client() -> TodoClient {
    TodoClient::new(BASE_URL)
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Check method, path, and (when the vector lists them) headers and body.
fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    match expected.get("headers") {
        Some(headers) => {
            let expected_headers: Vec<(String, String)> = headers
                .as_array()
                .unwrap()
                .iter()
                .map(|h| {
                    let arr = h.as_array().unwrap();
                    (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
                })
                .collect();
            assert_eq!(req.headers, expected_headers, "{name}: headers");
        }
        None => assert!(req.headers.is_empty(), "{name}: headers should be empty"),
    }

    match expected.get("body") {
        Some(body) => {
            let req_body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&req_body, body, "{name}: body");
        }
        None => assert!(req.body.is_none(), "{name}: body should be None"),
    }
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse {
        status: sim["status"].as_u64().unwrap() as u16,
        headers: Vec::new(),
        body: sim["body"].as_str().unwrap().to_string(),
    }
}

fn assert_expected_error(name: &str, case: &Value, err: ApiError) {
    match case["expected_error"].as_str().unwrap() {
        "NotFound" => assert_eq!(err, ApiError::NotFound, "{name}: expected NotFound"),
        "Validation" => match err {
            ApiError::Validation { details, .. } => {
                let details = serde_json::to_value(details).unwrap();
                assert_eq!(details, case["expected_details"], "{name}: details");
            }
            other => panic!("{name}: expected Validation, got {other:?}"),
        },
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/create.json")) {
        let name = case["name"].as_str().unwrap();
        let input: CreateTodo = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_create_todo(&input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_create_todo(simulated(&case));
        if case.get("expected_error").is_some() {
            assert_expected_error(name, &case, result.unwrap_err());
        } else {
            let expected: Todo = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/list.json")) {
        let name = case["name"].as_str().unwrap();
        let query: ListQuery = serde_json::from_value(case["query"].clone()).unwrap();

        let req = c.build_list_todos(&query).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let todos = c.parse_list_todos(simulated(&case)).unwrap();
        let expected: Vec<Todo> = serde_json::from_value(case["expected_result"].clone()).unwrap();
        assert_eq!(todos, expected, "{name}: parsed result");
    }
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[test]
fn get_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/get.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_i64().unwrap();

        let req = c.build_get_todo(id);
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_get_todo(simulated(&case));
        if case.get("expected_error").is_some() {
            assert_expected_error(name, &case, result.unwrap_err());
        } else {
            let expected: Todo = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Toggle
// ---------------------------------------------------------------------------

#[test]
fn toggle_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/toggle.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_i64().unwrap();

        let req = c.build_toggle_todo(id);
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_toggle_todo(simulated(&case));
        if case.get("expected_error").is_some() {
            assert_expected_error(name, &case, result.unwrap_err());
        } else {
            let expected: Todo = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Bulk delete
// ---------------------------------------------------------------------------

#[test]
fn bulk_delete_test_vectors() {
    let c = client();
    for case in load(include_str!("../../test-vectors/bulk_delete.json")) {
        let name = case["name"].as_str().unwrap();
        let ids: Vec<i64> = serde_json::from_value(case["input_ids"].clone()).unwrap();

        let req = c.build_bulk_delete(&ids).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let deleted = c.parse_bulk_delete(simulated(&case)).unwrap();
        assert_eq!(deleted, case["expected_result"].as_u64().unwrap(), "{name}: deleted count");
    }
}
