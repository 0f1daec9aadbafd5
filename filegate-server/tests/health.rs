use axum::body::Body;
use axum::http::{Request, StatusCode};
use filegate_server::{build, ServerSettings};
use http_body_util::BodyExt;
use tower::ServiceExt;

#[tokio::test]
async fn health_and_files_are_routed() {
    let settings = ServerSettings::from_lookup(|_| None);
    let router = build(&settings).unwrap().router();

    let res = router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-request-id").is_some());
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"ok");

    let res = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/files/hello.txt")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(
        res.headers().get("location").unwrap(),
        "http://localhost:1337/parse/files/default/hello.txt"
    );
}
