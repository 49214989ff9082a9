//! Every routing and binding error kind, as seen through the JSON reporter.

use http::{Method, StatusCode};
use serde_json::json;
use turnstile::prelude::*;
use turnstile_test::TestClient;

async fn echo(ctx: RequestContext, _req: Request) -> Response {
    Response::text(StatusCode::OK, format!("{}", ctx.params().len()))
}

fn client() -> TestClient {
    let contract = Contract::new().operation(
        OperationSpec::new("Search", &Method::GET, "/search")
            .param(ParameterDescriptor::query("limit", ParamType::INTEGER))
            .param(ParameterDescriptor::header("X-Filter", ParamType::Json))
            .param(ParameterDescriptor::header("X-Tenant", ParamType::STRING).required(true))
            .param(ParameterDescriptor::cookie("session", ParamType::STRING)),
    );
    let dispatcher = Dispatcher::builder(contract)
        .handler("Search", echo)
        .reporter(JsonErrorReporter)
        .build()
        .unwrap();
    TestClient::new(dispatcher).with_default_header("X-Tenant", "acme")
}

#[tokio::test]
async fn all_parameters_bound() {
    client()
        .get("/search")
        .query("limit", "10")
        .header("X-Filter", r#"{"tag":"vip"}"#)
        .cookie("session", "a%20b")
        .send()
        .await
        .assert_status(StatusCode::OK)
        .assert_body_eq("4");
}

#[tokio::test]
async fn not_found() {
    let response = client().get("/missing").send().await;
    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_code("ROUTE_NOT_FOUND");
    assert!(response.json_value().unwrap()["error"]["parameter"].is_null());
}

#[tokio::test]
async fn required() {
    TestClient::new(
        Dispatcher::builder(
            Contract::new().operation(
                OperationSpec::new("Search", &Method::GET, "/search").param(
                    ParameterDescriptor::header("X-Tenant", ParamType::STRING).required(true),
                ),
            ),
        )
        .handler("Search", echo)
        .reporter(JsonErrorReporter)
        .build()
        .unwrap(),
    )
    .get("/search")
    .send()
    .await
    .assert_status(StatusCode::BAD_REQUEST)
    .assert_error_code("REQUIRED_PARAMETER")
    .assert_json_field("error.location", &json!("header"));
}

#[tokio::test]
async fn invalid_format() {
    client()
        .get("/search")
        .query("limit", "ten")
        .send()
        .await
        .assert_error_code("INVALID_FORMAT")
        .assert_json_field("error.parameter", &json!("limit"));
}

#[tokio::test]
async fn too_many_values() {
    client()
        .get("/search?limit=1&limit=2")
        .send()
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("TOO_MANY_VALUES");
}

#[tokio::test]
async fn unescape_failure() {
    client()
        .get("/search")
        .cookie("session", "%zz")
        .send()
        .await
        .assert_error_code("UNESCAPE_FAILURE")
        .assert_json_field("error.location", &json!("cookie"));
}

#[tokio::test]
async fn unmarshal_failure() {
    client()
        .get("/search")
        .header("X-Filter", "{not json")
        .send()
        .await
        .assert_error_code("UNMARSHAL_FAILURE")
        .assert_json_field("error.parameter", &json!("X-Filter"));
}

#[tokio::test]
async fn first_failure_wins() {
    client()
        .get("/search")
        .query("limit", "ten")
        .header("X-Filter", "{not json")
        .send()
        .await
        .assert_error_code("INVALID_FORMAT");
}
