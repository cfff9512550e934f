//! Unit tests for API response types and serialization.
//!
//! Tests cover:
//! - ApiResponse envelope shape
//! - Error response serialization and HTTP mapping
//! - Model serialization contracts (password hash redaction, role forms)
//! - Pagination metadata

use campus_core::api::ApiResponse;
use campus_core::error::{CampusError, ErrorCode, ErrorResponse};
use campus_core::models::{Certificate, Course, CourseRole, GlobalRole, User};
use campus_core::pagination::{PageMetadata, Paginated, PaginationParams};
use serde_json::{json, Value};
use uuid::Uuid;

// ============================================================================
// ApiResponse Tests
// ============================================================================

#[test]
fn test_api_response_success() {
    let response = ApiResponse::success("test data");

    assert!(response.success);
    assert_eq!(response.data, Some("test data"));
    assert!(response.error.is_none());
}

#[test]
fn test_api_response_error() {
    let response = ApiResponse::<()>::error("something went wrong");

    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.error, Some("something went wrong".to_string()));
}

#[test]
fn test_api_response_serialization_success() {
    let response = ApiResponse::success(json!({"key": "value"}));
    let json_str = serde_json::to_string(&response).unwrap();
    let parsed: Value = serde_json::from_str(&json_str).unwrap();

    assert_eq!(parsed["success"], true);
    assert_eq!(parsed["data"]["key"], "value");
    assert!(parsed["error"].is_null());
}

#[test]
fn test_api_response_serialization_error() {
    let response = ApiResponse::<Value>::error_with_code("denied", "CROSS_TENANT");
    let json_str = serde_json::to_string(&response).unwrap();
    let parsed: Value = serde_json::from_str(&json_str).unwrap();

    assert_eq!(parsed["success"], false);
    assert_eq!(parsed["error"], "denied");
    assert_eq!(parsed["error_code"], "CROSS_TENANT");
}

// ============================================================================
// Error Response Tests
// ============================================================================

#[test]
fn test_error_response_shape() {
    let error = CampusError::new(ErrorCode::CrossTenant, "resource belongs to another organization");
    let response = ErrorResponse::from(&error);
    let parsed: Value = serde_json::to_value(&response).unwrap();

    assert_eq!(parsed["success"], false);
    assert_eq!(parsed["error"]["code"], "CROSS_TENANT");
    assert_eq!(parsed["error"]["numeric_code"], 4011);
    assert!(parsed["error"]["message"].is_string());
}

#[test]
fn test_error_http_mapping_for_boundary() {
    // Deny is 403, resolver failure is 400, missing actor is 401.
    assert_eq!(ErrorCode::InsufficientRole.http_status().as_u16(), 403);
    assert_eq!(ErrorCode::CrossTenant.http_status().as_u16(), 403);
    assert_eq!(ErrorCode::OrganizationNotFound.http_status().as_u16(), 400);
    assert_eq!(ErrorCode::Unauthenticated.http_status().as_u16(), 401);
}

// ============================================================================
// Model Serialization Tests
// ============================================================================

#[test]
fn test_user_serialization_redacts_password_hash() {
    let user = User::new("ada@example.com", "Ada", "argon2-hash-material");
    let value = serde_json::to_value(&user).unwrap();

    assert_eq!(value["email"], "ada@example.com");
    assert_eq!(value["role"], "student");
    assert!(value.get("password_hash").is_none());
}

#[test]
fn test_role_wire_forms() {
    assert_eq!(
        serde_json::to_value(GlobalRole::CoInstructor).unwrap(),
        json!("co_instructor")
    );
    assert_eq!(
        serde_json::to_value(GlobalRole::OrgAdmin).unwrap(),
        json!("org_admin")
    );
    assert_eq!(serde_json::to_value(CourseRole::Ta).unwrap(), json!("ta"));

    let parsed: GlobalRole = serde_json::from_value(json!("super_admin")).unwrap();
    assert_eq!(parsed, GlobalRole::SuperAdmin);
}

#[test]
fn test_course_serialization_round_trip() {
    let course = Course::new(Uuid::new_v4(), Uuid::new_v4(), "Rust 101", "Intro to Rust");
    let value = serde_json::to_value(&course).unwrap();
    let back: Course = serde_json::from_value(value).unwrap();

    assert_eq!(back.id, course.id);
    assert_eq!(back.title, "Rust 101");
    assert!(!back.published);
    assert!(!back.is_public);
}

#[test]
fn test_certificate_serial_in_payload() {
    let certificate = Certificate::issue(Uuid::new_v4(), Uuid::new_v4());
    let value = serde_json::to_value(&certificate).unwrap();

    let serial = value["serial"].as_str().unwrap();
    assert_eq!(serial.len(), 32);
    assert_eq!(serial, certificate.serial);
}

// ============================================================================
// Pagination Tests
// ============================================================================

#[test]
fn test_paginated_envelope() {
    let params = PaginationParams { page: 2, per_page: 10 };
    let page = Paginated::new(vec![1, 2, 3], params, 23);

    assert_eq!(page.meta, PageMetadata::new(params, 23));
    assert_eq!(page.meta.page, 2);
    assert_eq!(page.meta.total_pages, 3);

    let value = serde_json::to_value(&page).unwrap();
    assert_eq!(value["items"], json!([1, 2, 3]));
    assert_eq!(value["meta"]["total"], 23);
}

#[test]
fn test_pagination_params_from_query_defaults() {
    let params: PaginationParams = serde_json::from_value(json!({})).unwrap();
    assert_eq!(params.page, 1);
    assert_eq!(params.per_page, 20);
}
