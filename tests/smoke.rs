mod common;

use actix_web::HttpServer;
use reqwest::redirect::Policy;

use common::*;
use gazette::build_app;

#[actix_web::test]
async fn test_served_over_http() {
    let (state, _media) = test_state().await;
    let leo = create_user(&state, "leo").await;
    create_post(&state, &leo, None, "Hello over the wire").await;

    let app_state = state.clone();
    let server = HttpServer::new(move || build_app(app_state.clone()))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("Failed to bind");
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let base_url = format!("http://{}", addr);
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client");

    // 1. Front page
    let resp = client
        .get(format!("{}/", base_url))
        .send()
        .await
        .expect("Failed to fetch index");
    assert_eq!(resp.status(), 200);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Hello over the wire"));

    // 2. Stylesheet
    let resp = client
        .get(format!("{}/static/style.css", base_url))
        .send()
        .await
        .expect("Failed to fetch stylesheet");
    assert_eq!(resp.status(), 200);
    assert!(resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .starts_with("text/css"));

    // 3. Protected page redirects
    let resp = client
        .get(format!("{}/create/", base_url))
        .send()
        .await
        .expect("Failed to fetch create page");
    assert_eq!(resp.status(), 302);
    assert_eq!(
        resp.headers().get("location").and_then(|v| v.to_str().ok()),
        Some("/auth/login/?next=%2Fcreate%2F")
    );

    handle.stop(true).await;
}
