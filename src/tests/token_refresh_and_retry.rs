// Drives WrikeClient against a mock Wrike host that also serves the OAuth
// token endpoint:
//  - 401 on the first call -> refresh -> the call is retried once
//  - a token inside the safety buffer is refreshed before the call
//  - concurrent 401s share one refresh
//  - a second 401 after the refresh is returned, not retried again
//  - a 5xx from the token endpoint is retried with backoff

#[cfg(test)]
mod test {

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use httpmock::Method::{GET, POST};
    use serde_json::json;

    use crate::tests::common::{contact_json, spawn_axum, WrikeHarness};
    use crate::wrike::ApiError;

    const CONTACTS: &str = "/api/v4/contacts";
    const TOKEN: &str = "/oauth2/token";

    #[tokio::test]
    async fn unauthorized_call_refreshes_and_retries_once() {
        let h = WrikeHarness::start().await;
        h.save_token("old", "r-old", 3600);

        let rejected = h
            .server
            .mock_async(|when, then| {
                when.method(GET).path(CONTACTS).header("authorization", "Bearer old");
                then.status(401).body("expired");
            })
            .await;
        let refresh = h
            .server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TOKEN)
                    .query_param("grant_type", "refresh_token")
                    .query_param("refresh_token", "r-old")
                    .query_param("client_id", "client-id");
                then.status(200).json_body(json!({
                    "access_token": "new",
                    "refresh_token": "r-new",
                    "token_type": "bearer",
                    "expires_in": 3600
                }));
            })
            .await;
        let accepted = h
            .server
            .mock_async(|when, then| {
                when.method(GET).path(CONTACTS).header("authorization", "Bearer new");
                then.status(200).json_body(json!({
                    "kind": "contacts",
                    "data": [contact_json("U1", "Ann", "User")]
                }));
            })
            .await;

        let response = h.client.contacts(&[]).await.expect("contacts after refresh");
        assert_eq!(response.kind, "contacts");
        assert_eq!(response.data.len(), 1);

        rejected.assert_async().await;
        refresh.assert_async().await;
        accepted.assert_async().await;

        let current = h.tokens.get_current_token().expect("token after refresh");
        assert_eq!(current.access_token, "new");
        assert_eq!(current.refresh_token, "r-new");
        assert_eq!(current.host, h.host());
    }

    #[tokio::test]
    async fn token_inside_safety_buffer_is_refreshed_before_the_call() {
        let h = WrikeHarness::start().await;
        // 60s left is inside the 5 minute buffer
        h.save_token("stale", "r-stale", 60);

        let refresh = h
            .server
            .mock_async(|when, then| {
                when.method(POST)
                    .path(TOKEN)
                    .query_param("refresh_token", "r-stale");
                then.status(200).json_body(json!({
                    "access_token": "fresh",
                    "refresh_token": "r-fresh",
                    "expires_in": 3600
                }));
            })
            .await;
        let spaces = h
            .server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v4/spaces")
                    .header("authorization", "Bearer fresh");
                then.status(200).json_body(json!({ "kind": "spaces", "data": [] }));
            })
            .await;

        h.client.spaces(&[]).await.expect("spaces");
        refresh.assert_async().await;
        spaces.assert_async().await;
        assert!(h.tokens.is_token_valid(h.tokens.get_current_token().as_ref()));
    }

    #[tokio::test]
    async fn concurrent_unauthorized_calls_share_one_refresh() {
        let h = WrikeHarness::start().await;
        h.save_token("old", "r-old", 3600);

        h.server
            .mock_async(|when, then| {
                when.method(GET).path(CONTACTS).header("authorization", "Bearer old");
                then.status(401);
            })
            .await;
        let refresh = h
            .server
            .mock_async(|when, then| {
                when.method(POST).path(TOKEN).query_param("refresh_token", "r-old");
                then.status(200)
                    .delay(std::time::Duration::from_millis(50))
                    .json_body(json!({
                        "access_token": "new",
                        "refresh_token": "r-new",
                        "expires_in": 3600
                    }));
            })
            .await;
        h.server
            .mock_async(|when, then| {
                when.method(GET).path(CONTACTS).header("authorization", "Bearer new");
                then.status(200).json_body(json!({ "kind": "contacts", "data": [] }));
            })
            .await;

        let (a, b) = tokio::join!(h.client.contacts(&[]), h.client.contacts(&[]));
        assert!(a.is_ok(), "{:?}", a);
        assert!(b.is_ok(), "{:?}", b);
        refresh.assert_async().await;
    }

    #[tokio::test]
    async fn repeated_unauthorized_is_retried_only_once() {
        let h = WrikeHarness::start().await;
        h.save_token("old", "r-old", 3600);

        let contacts = h
            .server
            .mock_async(|when, then| {
                when.method(GET).path(CONTACTS);
                then.status(401).body("still expired");
            })
            .await;
        let refresh = h
            .server
            .mock_async(|when, then| {
                when.method(POST).path(TOKEN);
                then.status(200).json_body(json!({
                    "access_token": "new",
                    "refresh_token": "r-new",
                    "expires_in": 3600
                }));
            })
            .await;

        let err = h.client.contacts(&[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Remote { status: 401, .. }), "{:?}", err);
        assert_eq!(contacts.hits_async().await, 2);
        assert_eq!(refresh.hits_async().await, 1);
    }

    #[tokio::test]
    async fn unavailable_token_endpoint_is_retried() {
        // token endpoint: 503 on the first call, a token afterwards
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new().route(
            TOKEN,
            post(move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        StatusCode::SERVICE_UNAVAILABLE.into_response()
                    } else {
                        Json(json!({
                            "access_token": "new",
                            "refresh_token": "r-new",
                            "expires_in": 3600
                        }))
                        .into_response()
                    }
                }
            }),
        );
        let (token_server, addr) = spawn_axum(app).await;

        let h = WrikeHarness::start_with(|config| {
            config.wrike.token_url = format!("http://{}{}", addr, TOKEN);
        })
        .await;
        h.save_token("old", "r-old", 3600);

        h.server
            .mock_async(|when, then| {
                when.method(GET).path(CONTACTS).header("authorization", "Bearer old");
                then.status(401);
            })
            .await;
        let accepted = h
            .server
            .mock_async(|when, then| {
                when.method(GET).path(CONTACTS).header("authorization", "Bearer new");
                then.status(200).json_body(json!({ "kind": "contacts", "data": [] }));
            })
            .await;

        let response = h.client.contacts(&[]).await;
        assert!(response.is_ok(), "{:?}", response.err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        accepted.assert_async().await;
        assert_eq!(h.tokens.get_current_token().unwrap().access_token, "new");

        token_server.abort();
    }

    #[tokio::test]
    async fn no_token_is_not_authenticated() {
        let h = WrikeHarness::start().await;
        let err = h.client.contacts(&[]).await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthenticated));
    }

    #[tokio::test]
    async fn forbidden_is_permission_denied_without_refresh() {
        let h = WrikeHarness::start().await;
        h.save_token("ok", "r-ok", 3600);

        h.server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v4/customfields");
                then.status(403).body("scope missing");
            })
            .await;

        let err = h.client.custom_fields(&[]).await.unwrap_err();
        match err {
            ApiError::PermissionDenied(body) => assert_eq!(body, "scope missing"),
            other => panic!("expected PermissionDenied, got {:?}", other),
        }
        assert_eq!(h.tokens.get_current_token().unwrap().access_token, "ok");
    }

    #[tokio::test]
    async fn rejected_refresh_is_not_retried() {
        let h = WrikeHarness::start().await;
        h.save_token("old", "r-revoked", 3600);

        h.server
            .mock_async(|when, then| {
                when.method(GET).path(CONTACTS);
                then.status(401);
            })
            .await;
        let refresh = h
            .server
            .mock_async(|when, then| {
                when.method(POST).path(TOKEN);
                then.status(400).json_body(json!({ "error": "invalid_grant" }));
            })
            .await;

        let err = h.client.contacts(&[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Remote { status: 400, .. }), "{:?}", err);
        // 4xx from the token endpoint is final: exactly one attempt
        refresh.assert_async().await;
        // the failed refresh leaves the stored token alone
        assert_eq!(h.tokens.get_current_token().unwrap().access_token, "old");
    }

    #[tokio::test]
    async fn token_response_host_moves_the_token() {
        let h = WrikeHarness::start().await;
        h.save_token("old", "r-old", 3600);

        h.server
            .mock_async(|when, then| {
                when.method(POST).path(TOKEN);
                then.status(200).json_body(json!({
                    "access_token": "eu",
                    "refresh_token": "r-eu",
                    "expires_in": 3600,
                    "host": "app-eu.wrike.com"
                }));
            })
            .await;

        let token = h.client.refresh_token().await.expect("refresh");
        assert_eq!(token.host, "app-eu.wrike.com");
        assert_eq!(h.tokens.get_current_token().unwrap().host, "app-eu.wrike.com");
    }
}
