mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use futures_util::future::join_all;

use common::*;
use gazette::build_app;
use gazette::config::SESSION_COOKIE;
use gazette::models::{FollowRepo, SessionRepo, UserRepo};

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn session_token<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<String> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

#[actix_web::test]
async fn test_follow_and_unfollow() {
    let (state, _media) = test_state().await;
    let leo = create_user(&state, "leo").await;
    let anna = create_user(&state, "anna").await;
    let ivan = create_user(&state, "ivan").await;
    create_post(&state, &leo, None, "Only for followers").await;
    let anna_cookie = login_cookie(&state, &anna).await;
    let ivan_cookie = login_cookie(&state, &ivan).await;
    let app = test::init_service(build_app(state.clone())).await;

    // 1. Follow
    let req = test::TestRequest::get()
        .uri("/profile/leo/follow/")
        .cookie(anna_cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/leo/");
    assert_eq!(FollowRepo::count(&state.pool).await.unwrap(), 1);
    assert!(FollowRepo::exists(&state.pool, anna.id, leo.id).await.unwrap());

    // 2. Following twice changes nothing
    let req = test::TestRequest::get()
        .uri("/profile/leo/follow/")
        .cookie(anna_cookie.clone())
        .to_request();
    test::call_service(&app, req).await;
    assert_eq!(FollowRepo::count(&state.pool).await.unwrap(), 1);

    // 3. The follower's feed has the post, a stranger's does not
    let req = test::TestRequest::get()
        .uri("/follow/")
        .cookie(anna_cookie.clone())
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert_eq!(post_cards(&html), 1);
    assert!(html.contains("Only for followers"));

    let req = test::TestRequest::get()
        .uri("/follow/")
        .cookie(ivan_cookie)
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert_eq!(post_cards(&html), 0);

    // 4. Profile counters
    let req = test::TestRequest::get().uri("/profile/leo/").to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();
    assert!(html.contains("Followers: 1"));
    assert!(html.contains("Posts: 1"));

    // 5. Unfollow
    let req = test::TestRequest::get()
        .uri("/profile/leo/unfollow/")
        .cookie(anna_cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/leo/");
    assert_eq!(FollowRepo::count(&state.pool).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_simultaneous_follows_all_redirect() {
    let (state, _media) = test_state().await;
    let leo = create_user(&state, "leo").await;
    let anna = create_user(&state, "anna").await;
    let cookie = login_cookie(&state, &anna).await;
    let app = test::init_service(build_app(state.clone())).await;

    let requests = (0..8).map(|_| {
        let req = test::TestRequest::get()
            .uri("/profile/leo/follow/")
            .cookie(cookie.clone())
            .to_request();
        test::call_service(&app, req)
    });
    let responses = join_all(requests).await;

    for resp in &responses {
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(resp), "/profile/leo/");
    }
    assert_eq!(FollowRepo::count(&state.pool).await.unwrap(), 1);
    assert!(FollowRepo::exists(&state.pool, anna.id, leo.id).await.unwrap());
}

#[actix_web::test]
async fn test_unfollow_edge_cases() {
    let (state, _media) = test_state().await;
    create_user(&state, "leo").await;
    let anna = create_user(&state, "anna").await;
    let cookie = login_cookie(&state, &anna).await;
    let app = test::init_service(build_app(state.clone())).await;

    // 1. Nothing to remove: still a redirect
    let req = test::TestRequest::get()
        .uri("/profile/leo/unfollow/")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/leo/");
    assert_eq!(FollowRepo::count(&state.pool).await.unwrap(), 0);

    // 2. Unknown author
    let req = test::TestRequest::get()
        .uri("/profile/nobody/unfollow/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_cannot_follow_yourself() {
    let (state, _media) = test_state().await;
    let leo = create_user(&state, "leo").await;
    let cookie = login_cookie(&state, &leo).await;
    let app = test::init_service(build_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/profile/leo/follow/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(FollowRepo::count(&state.pool).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_follow_unknown_author_is_not_found() {
    let (state, _media) = test_state().await;
    let leo = create_user(&state, "leo").await;
    let cookie = login_cookie(&state, &leo).await;
    let app = test::init_service(build_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/profile/nobody/follow/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_signup_login_logout() {
    let (state, _media) = test_state().await;
    let app = test::init_service(build_app(state.clone())).await;

    // 1. Sign up starts a session right away
    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([
            ("first_name", "Anna"),
            ("last_name", "Karenina"),
            ("username", "anna"),
            ("email", "anna@example.com"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert!(session_token(&resp).is_some());
    let anna = UserRepo::find_by_username(&state.pool, "anna").await.unwrap().unwrap();
    assert_eq!(anna.first_name, "Anna");

    // 2. The same username is refused
    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([
            ("username", "anna"),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("already exists"));

    // 3. Wrong password
    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "anna"), ("password", "not-the-password"), ("next", "/")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(session_token(&resp).is_none());

    // 4. Right password lands on `next`
    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "anna"), ("password", PASSWORD), ("next", "/create/")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/create/");
    let token = session_token(&resp).expect("session cookie set");
    assert!(SessionRepo::find_user(&state.pool, &token, 1).await.unwrap().is_some());

    // 5. Offsite `next` is ignored
    let req = test::TestRequest::post()
        .uri("/auth/login/")
        .set_form([("username", "anna"), ("password", PASSWORD), ("next", "//evil.example/")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/");

    // 6. Logout ends the session
    let req = test::TestRequest::get()
        .uri("/auth/logout/")
        .cookie(gazette::auth::session_cookie(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(SessionRepo::find_user(&state.pool, &token, 1).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_login_page_keeps_next() {
    let (state, _media) = test_state().await;
    let app = test::init_service(build_app(state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/auth/login/?next=%2Fcreate%2F")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains(r#"name="next" value="/create/""#));
}
