use std::{net::SocketAddr, time::Duration};

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{auth, comments, ratings, recipes, saved, users};

pub fn build_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(recipes::router())
        .merge(ratings::router())
        .merge(comments::router())
        .merge(saved::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        testing::{memory_state, FakeIdentity},
        users::dto::FederatedIdentity,
    };

    async fn send(app: &Router, req: Request<Body>) -> Response {
        app.clone().oneshot(req).await.unwrap()
    }

    async fn body_json(res: Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut req = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut req = Request::get(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        req.body(Body::empty()).unwrap()
    }

    async fn register(app: &Router, name: &str) -> String {
        let res = send(
            app,
            post_json(
                "/register",
                None,
                json!({"name": name, "email": format!("{name}@example.com"), "password": "Str0ngPassword"}),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        body_json(res).await["token"].as_str().unwrap().to_string()
    }

    fn recipe_body(title: &str, tags: &[&str]) -> Value {
        json!({
            "title": title,
            "description": "good food",
            "visibility": "public",
            "totalTime": 25,
            "steps": [{"title": "Mix", "description": "Mix it", "time": 5}],
            "dificultyLevel": "easy",
            "tags": tags,
            "ingredients": [{"name": "flour", "quantity": 250}],
            "image": ""
        })
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (state, _) = memory_state(None);
        let app = build_app(state);
        let res = send(&app, get("/health", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn register_login_and_me() {
        let (state, _) = memory_state(None);
        let app = build_app(state);
        let token = register(&app, "ana").await;

        let res = send(&app, get("/user/me", Some(&token))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let me = body_json(res).await;
        assert_eq!(me["name"], "ana");
        assert_eq!(me["role"], "user");
        assert!(me.get("passwordHash").is_none());

        let res = send(
            &app,
            post_json("/login", None, json!({"email": "ana@example.com", "password": "nope"})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(res).await["error"], "invalid credentials");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let (state, _) = memory_state(None);
        let app = build_app(state);

        let res = send(&app, post_json("/recipes", None, recipe_body("Bread", &[]))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = send(&app, get("/user/me", Some("garbage"))).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn recipe_lifecycle_over_http() {
        let (state, _) = memory_state(None);
        let app = build_app(state);
        let ana = register(&app, "ana").await;
        let bob = register(&app, "bob").await;

        let res = send(&app, post_json("/recipes", Some(&ana), recipe_body("Bread", &["baking"]))).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let location = res.headers()[header::LOCATION].to_str().unwrap().to_string();
        let created = body_json(res).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(location, format!("/recipes/{id}"));
        assert_eq!(created["dificultyLevel"], "easy");
        assert_eq!(created["userName"], "ana");

        let res = send(&app, get("/recipes/search?tags=BAK", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);

        let res = send(
            &app,
            post_json(&format!("/recipes/{id}/rating"), Some(&bob), json!({"stars": 4})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = send(&app, get(&format!("/recipes/{id}/rating"), None)).await;
        let summary = body_json(res).await;
        assert_eq!(summary["count"], 1);
        assert_eq!(summary["average"], 4.0);

        let delete = Request::delete(format!("/recipes/{id}"))
            .header(header::AUTHORIZATION, format!("Bearer {bob}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, delete).await.status(), StatusCode::FORBIDDEN);

        let delete = Request::delete(format!("/recipes/{id}"))
            .header(header::AUTHORIZATION, format!("Bearer {ana}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, delete).await.status(), StatusCode::NO_CONTENT);

        let res = send(&app, get(&format!("/recipes/{id}"), None)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn search_body_must_be_valid_json_when_present() {
        let (state, _) = memory_state(None);
        let app = build_app(state);
        let ana = register(&app, "ana").await;
        send(&app, post_json("/recipes", Some(&ana), recipe_body("Bread", &[]))).await;

        let empty = Request::post("/recipes/search").body(Body::empty()).unwrap();
        let res = send(&app, empty).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);

        let broken = Request::post("/recipes/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"title\": "))
            .unwrap();
        let res = send(&app, broken).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let err = body_json(res).await;
        assert!(err["error"].as_str().unwrap().starts_with("invalid search body"));

        let res = send(&app, post_json("/recipes/search", None, json!({"title": "bre"}))).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_twice_is_conflict() {
        let (state, _) = memory_state(None);
        let app = build_app(state);
        let ana = register(&app, "ana").await;

        let res = send(&app, post_json("/recipes", Some(&ana), recipe_body("Bread", &[]))).await;
        let id = body_json(res).await["id"].as_str().unwrap().to_string();

        let save = || post_json("/saved-recipes", Some(&ana), json!({"recipeId": id}));
        assert_eq!(send(&app, save()).await.status(), StatusCode::CREATED);
        let res = send(&app, save()).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(res).await["error"], "already saved");

        let res = send(&app, get("/recipes/most-saved", None)).await;
        let top = body_json(res).await;
        assert_eq!(top[0]["recipeId"], id.as_str());
        assert_eq!(top[0]["count"], 1);
    }

    fn cook_identity() -> FakeIdentity {
        FakeIdentity {
            code: "good-code".into(),
            identity: FederatedIdentity {
                provider_id: "g-1".into(),
                email: "cook@example.com".into(),
                name: "Cook".into(),
            },
        }
    }

    async fn start_google_login(app: &Router) -> String {
        let res = send(app, get("/auth/google/login", None)).await;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/auth/google"));
        cookie
            .split(';')
            .next()
            .and_then(|kv| kv.strip_prefix("oauth_state="))
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn google_callback_accepts_quoted_state_cookie_and_clears_it() {
        let (state, store) = memory_state(Some(Arc::new(cook_identity())));
        let app = build_app(state);
        let oauth_state = start_google_login(&app).await;

        let req = Request::get(format!(
            "/auth/google/callback?code=good-code&state={oauth_state}"
        ))
        .header(header::COOKIE, format!("theme=dark; oauth_state=\"{oauth_state}\""))
        .body(Body::empty())
        .unwrap();
        let res = send(&app, req).await;
        let target = res.headers()[header::LOCATION].to_str().unwrap();
        assert!(target.starts_with("http://front.test?token="), "{target}");
        assert_eq!(store.user_count(), 1);

        let cleared = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cleared.starts_with("oauth_state=;"), "{cleared}");
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn google_callback_without_state_cookie_is_rejected() {
        let (state, store) = memory_state(Some(Arc::new(cook_identity())));
        let app = build_app(state);

        let res = send(&app, get("/auth/google/callback?code=good-code&state=abc", None)).await;
        let target = res.headers()[header::LOCATION].to_str().unwrap();
        assert_eq!(target, "http://front.test/login?error=invalid_state");
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn google_login_unavailable_without_configuration() {
        let (state, _) = memory_state(None);
        let app = build_app(state);
        let res = send(&app, get("/auth/google/login", None)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn google_callback_checks_state_and_issues_token() {
        let (state, store) = memory_state(Some(Arc::new(cook_identity())));
        let app = build_app(state);
        let oauth_state = start_google_login(&app).await;

        let forged = Request::get("/auth/google/callback?code=good-code&state=forged")
            .header(header::COOKIE, format!("oauth_state={oauth_state}"))
            .body(Body::empty())
            .unwrap();
        let res = send(&app, forged).await;
        let target = res.headers()[header::LOCATION].to_str().unwrap();
        assert_eq!(target, "http://front.test/login?error=invalid_state");
        assert_eq!(store.user_count(), 0);

        let genuine = Request::get(format!(
            "/auth/google/callback?code=good-code&state={oauth_state}"
        ))
        .header(header::COOKIE, format!("oauth_state={oauth_state}"))
        .body(Body::empty())
        .unwrap();
        let res = send(&app, genuine).await;
        assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
        let target = res.headers()[header::LOCATION].to_str().unwrap();
        let token = target.strip_prefix("http://front.test?token=").unwrap();
        assert_eq!(store.user_count(), 1);

        let res = send(&app, get("/user/me", Some(token))).await;
        assert_eq!(body_json(res).await["email"], "cook@example.com");
    }
}
