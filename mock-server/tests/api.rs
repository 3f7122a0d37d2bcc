use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_store, Store};
use serde_json::Value;
use tower::ServiceExt;

const TOKEN: &str = "maciej:ABC123";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn authed(path: &str) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("/v1{path}{sep}auth_token=maciej%3AABC123&format=json")
}

// --- auth ---

#[tokio::test]
async fn wrong_token_is_rejected() {
    let resp = app(TOKEN)
        .oneshot(get("/v1/tags/get?auth_token=other%3AXYZ&format=json"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(!body_bytes(resp).await.is_empty());
}

// --- posts ---

#[tokio::test]
async fn add_without_url_is_not_done() {
    let resp = app(TOKEN)
        .oneshot(get(&authed("/posts/add?description=x")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["result_code"], "missing url");
}

#[tokio::test]
async fn posts_all_is_a_bare_array() {
    let resp = app(TOKEN)
        .oneshot(get(&authed("/posts/all?tag=anything")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body, Value::Array(Vec::new()));
}

#[tokio::test]
async fn empty_tag_cloud_is_an_empty_array() {
    let resp = app(TOKEN).oneshot(get(&authed("/tags/get"))).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, Value::Array(Vec::new()));
}

#[tokio::test]
async fn api_token_route_keeps_trailing_slash() {
    let resp = app(TOKEN)
        .oneshot(get(&authed("/user/api_token/")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["result"], "ABC123");
}

// --- notes ---

#[tokio::test]
async fn notes_list_and_get() {
    let store = Store::new(TOKEN).with_note("Groceries", "milk, eggs");
    let app = app_with_store(store);

    let resp = app.clone().oneshot(get(&authed("/notes/list"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let list = body_json(resp).await;
    assert_eq!(list["count"], 1);
    let note = &list["notes"][0];
    assert_eq!(note["title"], "Groceries");
    assert_eq!(note["length"], "10");
    assert!(note.get("text").is_none());
    let id = note["id"].as_str().unwrap().to_string();

    let resp = app.oneshot(get(&authed(&format!("/notes/{id}")))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["text"], "milk, eggs");
}

#[tokio::test]
async fn unknown_note_is_404() {
    let resp = app(TOKEN)
        .oneshot(get(&authed("/notes/doesnotexist")))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- full bookmark lifecycle ---

#[tokio::test]
async fn bookmark_lifecycle() {
    use tower::Service;

    let mut app = app(TOKEN).into_service();

    // add
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&authed(
            "/posts/add?url=http%3A%2F%2Fexample.com&description=Example&tags=rust%20http&dt=2017-08-16T08%3A21%3A11Z&toread=yes",
        )))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["result_code"], "done");

    // add again without replace: refused
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&authed("/posts/add?url=http%3A%2F%2Fexample.com&description=Again")))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["result_code"], "item already exists");

    // get by url
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&authed("/posts/get?url=http%3A%2F%2Fexample.com")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user"], "maciej");
    let post = &body["posts"][0];
    assert_eq!(post["time"], "2017-08-16T08:21:11Z");
    assert_eq!(post["tags"], "rust http");
    assert_eq!(post["shared"], "yes");
    assert_eq!(post["toread"], "yes");

    // dates
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&authed("/posts/dates?tag=rust")))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["tag"], "rust");
    assert_eq!(body["dates"]["2017-08-16"], "1");

    // suggest
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&authed("/posts/suggest?url=http%3A%2F%2Fexample.com")))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body[0]["popular"], serde_json::json!(["rust", "http"]));

    // delete
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&authed("/posts/delete?url=http%3A%2F%2Fexample.com")))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["result_code"], "done");

    // delete again: not found, still 200
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get(&authed("/posts/delete?url=http%3A%2F%2Fexample.com")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["result_code"], "item not found");
}
