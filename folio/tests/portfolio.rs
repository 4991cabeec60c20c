use std::sync::Arc;

use folio::{
    model::{
        CertificationKind, ContactMessage, NewProject, NewSkill, Proficiency, ProfileUpdate,
    },
    ApiError, FolioConfig, Portfolio,
};
use folio_tokens::{
    session::{FileSession, InMemorySession, SessionStore},
    testing::{expired_access_token, fresh_access_token, pair_with},
    Password, Username,
};
use reqwest::Url;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, Request, ResponseTemplate,
};

fn config_for(server: &MockServer) -> FolioConfig {
    FolioConfig::new(
        Url::parse(&format!("{}/api", server.uri())).unwrap(),
        Url::parse(&format!("{}/api/v1/auth", server.uri())).unwrap(),
    )
    .unwrap()
}

fn portfolio_for(server: &MockServer, session: Arc<dyn SessionStore>) -> Portfolio {
    Portfolio::with_client(&config_for(server), reqwest::Client::new(), session)
}

fn authorization(request: &Request) -> Option<String> {
    request
        .headers
        .get("authorization")
        .map(|v| v.to_str().unwrap().to_owned())
}

mod signing_in {
    use super::*;

    #[tokio::test]
    async fn stores_issued_tokens_and_reports_the_user() {
        let server = MockServer::start().await;
        let access = fresh_access_token();

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login/"))
            .and(body_json(json!({ "username": "ada", "password": "hunter22" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": access.as_str(),
                "refresh": "issued-refresh",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me/"))
            .and(header("authorization", format!("Bearer {}", access.as_str()).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "username": "ada",
                "email": "ada@example.com",
                "first_name": "Ada",
                "last_name": "Lovelace",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session_file = dir.path().join("session.json");
        let portfolio = portfolio_for(&server, Arc::new(FileSession::new(&session_file)));

        let user = portfolio
            .sign_in(
                &Username::from_static("ada"),
                &Password::from_static("hunter22"),
            )
            .await
            .unwrap();
        assert_eq!(user.display_name(), "Ada Lovelace");

        // A second process reading the same file sees the session.
        let reopened = FileSession::new(&session_file);
        let tokens = reopened.current().await.unwrap().unwrap();
        assert_eq!(tokens.access_token(), &*access);
        assert_eq!(tokens.refresh_token().unwrap().as_str(), "issued-refresh");
    }

    #[tokio::test]
    async fn rejected_credentials_leave_the_session_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login/"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"detail":"No active account found"}"#),
            )
            .mount(&server)
            .await;

        let session = Arc::new(InMemorySession::new());
        let portfolio = portfolio_for(&server, session.clone());

        let err = portfolio
            .sign_in(
                &Username::from_static("ada"),
                &Password::from_static("wrong"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, folio::SignInError::Login(_)));
        assert!(session.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn signing_out_clears_the_session() {
        let server = MockServer::start().await;
        let session = Arc::new(InMemorySession::signed_in(pair_with(fresh_access_token())));
        let portfolio = portfolio_for(&server, session.clone());

        portfolio.sign_out().await.unwrap();
        assert!(portfolio.tokens().await.unwrap().is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

mod profile_resources {
    use super::*;

    #[tokio::test]
    async fn carry_the_access_token_on_the_auth_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/profile/skills/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "Rust", "level": 90, "category": 2 },
                { "id": 2, "name": "Django", "level": 75, "category": 3, "category_name": "Backend" },
            ])))
            .mount(&server)
            .await;

        let access = fresh_access_token();
        let portfolio = portfolio_for(
            &server,
            Arc::new(InMemorySession::signed_in(pair_with(access.clone()))),
        );

        let skills = portfolio.skills().await.unwrap();
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[1].category_name.as_deref(), Some("Backend"));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            authorization(&requests[0]),
            Some(format!("Bearer {}", access.as_str()))
        );
    }

    #[tokio::test]
    async fn expired_token_is_refreshed_and_persisted_first() {
        let server = MockServer::start().await;
        let new_access = fresh_access_token();

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access": new_access.as_str() })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/profile/languages/"))
            .and(header(
                "authorization",
                format!("Bearer {}", new_access.as_str()).as_str(),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "name": "English", "proficiency": "Fluent" },
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let session = Arc::new(FileSession::new(dir.path().join("session.json")));
        session
            .replace(Some(pair_with(expired_access_token())))
            .await
            .unwrap();
        let portfolio = portfolio_for(&server, session.clone());

        let languages = portfolio.languages().await.unwrap();
        assert_eq!(languages[0].proficiency, Proficiency::Fluent);

        let stored = session.current().await.unwrap().unwrap();
        assert_eq!(stored.access_token(), &*new_access);
        assert_eq!(stored.refresh_token().unwrap().as_str(), "test-refresh-token");
    }

    #[tokio::test]
    async fn signed_out_requests_ask_for_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/profile/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let portfolio = portfolio_for(&server, Arc::new(InMemorySession::new()));

        let err = portfolio.profile().await.unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationFailed { .. }));
        assert!(err.requires_sign_in());
    }

    #[tokio::test]
    async fn profile_update_posts_only_changed_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/profile/update/"))
            .and(body_json(json!({ "bio": "Writes Rust." })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "user": 7,
                "bio": "Writes Rust.",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let portfolio = portfolio_for(
            &server,
            Arc::new(InMemorySession::signed_in(pair_with(fresh_access_token()))),
        );

        let update = ProfileUpdate {
            bio: Some("Writes Rust.".to_owned()),
            ..ProfileUpdate::default()
        };
        let profile = portfolio.update_profile(&update).await.unwrap();
        assert_eq!(profile.bio, "Writes Rust.");
    }

    #[tokio::test]
    async fn image_upload_is_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/profile/upload-image/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "imageUrl": "/media/profiles/me.png" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let portfolio = portfolio_for(
            &server,
            Arc::new(InMemorySession::signed_in(pair_with(fresh_access_token()))),
        );

        let uploaded = portfolio
            .upload_profile_image("me.png", b"\x89PNG".to_vec())
            .await
            .unwrap();
        assert_eq!(uploaded.image_url, "/media/profiles/me.png");

        let requests = server.received_requests().await.unwrap();
        let content_type = requests[0]
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains(r#"name="profile_image"; filename="me.png""#));
    }

    #[tokio::test]
    async fn skills_can_be_added_and_removed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/profile/skills/"))
            .and(body_json(json!({ "name": "Tokio", "level": 80, "category": 2 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 9, "name": "Tokio", "level": 80, "category": 2,
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/auth/profile/skills/9/"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let portfolio = portfolio_for(
            &server,
            Arc::new(InMemorySession::signed_in(pair_with(fresh_access_token()))),
        );

        let skill = portfolio
            .add_skill(&NewSkill {
                name: "Tokio".to_owned(),
                level: 80,
                category: 2,
            })
            .await
            .unwrap();
        assert_eq!(skill.id, 9);

        portfolio.delete_skill(skill.id).await.unwrap();
    }

    #[tokio::test]
    async fn certifications_and_categories_decode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/profile/certifications/3/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 3,
                "title": "Software Engineering",
                "issuer": "ALX",
                "date": "2023-11-01",
                "in_progress": true,
                "badge": "",
                "type": "alx",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/profile/skill-categories/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 2,
                    "name": "Languages",
                    "skills": [{ "id": 1, "name": "Rust", "level": 90, "category": 2 }],
                },
            ])))
            .mount(&server)
            .await;

        let portfolio = portfolio_for(
            &server,
            Arc::new(InMemorySession::signed_in(pair_with(fresh_access_token()))),
        );

        let cert = portfolio.certification(3).await.unwrap();
        assert_eq!(cert.kind, CertificationKind::Alx);
        assert!(cert.in_progress);

        let categories = portfolio.skill_categories().await.unwrap();
        assert_eq!(categories[0].skills[0].name, "Rust");
    }
}

mod project_writes {
    use super::*;

    #[tokio::test]
    async fn carry_the_access_token_on_the_public_base() {
        let server = MockServer::start().await;
        let access = fresh_access_token();
        let bearer = format!("Bearer {}", access.as_str());

        Mock::given(method("POST"))
            .and(path("/api/projects/"))
            .and(header("authorization", bearer.as_str()))
            .and(body_json(json!({
                "title": "folio",
                "description": "Portfolio CLI",
                "link": "https://example.com/folio",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 5,
                "title": "folio",
                "description": "Portfolio CLI",
                "link": "https://example.com/folio",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/projects/5/"))
            .and(header("authorization", bearer.as_str()))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let portfolio = portfolio_for(
            &server,
            Arc::new(InMemorySession::signed_in(pair_with(access.clone()))),
        );

        let project = portfolio
            .add_project(&NewProject {
                title: "folio".to_owned(),
                description: "Portfolio CLI".to_owned(),
                link: Some("https://example.com/folio".to_owned()),
                image: None,
            })
            .await
            .unwrap();
        assert_eq!(project.id, 5);

        portfolio.delete_project(project.id).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_an_expired_token_first() {
        let server = MockServer::start().await;
        let new_access = fresh_access_token();

        Mock::given(method("POST"))
            .and(path("/api/v1/auth/token/refresh/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access": new_access.as_str() })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/projects/5/"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"detail":"You do not have permission to perform this action."}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let portfolio = portfolio_for(
            &server,
            Arc::new(InMemorySession::signed_in(pair_with(expired_access_token()))),
        );

        let err = portfolio.delete_project(5).await.unwrap_err();
        assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
        assert!(!err.requires_sign_in());

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            authorization(&requests[1]),
            Some(format!("Bearer {}", new_access.as_str()))
        );
    }
}

mod public_resources {
    use super::*;

    #[tokio::test]
    async fn never_carry_the_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/projects/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 1, "title": "folio", "description": "Portfolio CLI" },
            ])))
            .mount(&server)
            .await;

        let portfolio = portfolio_for(
            &server,
            Arc::new(InMemorySession::signed_in(pair_with(fresh_access_token()))),
        );

        let projects = portfolio.projects().await.unwrap();
        assert_eq!(projects[0].title, "folio");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(authorization(&requests[0]), None);
    }

    #[tokio::test]
    async fn public_calls_do_not_refresh_an_expired_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/about/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "name": "Ada Lovelace", "bio": "Analyst",
            })))
            .mount(&server)
            .await;

        let portfolio = portfolio_for(
            &server,
            Arc::new(InMemorySession::signed_in(pair_with(expired_access_token()))),
        );

        let about = portfolio.about().await.unwrap();
        assert_eq!(about.name, "Ada Lovelace");
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blog_post_is_found_by_slug() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/blog/"))
            .and(query_param("slug", "hello-rust"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 4, "title": "Hello, Rust", "slug": "hello-rust", "content": "..." },
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/blog/"))
            .and(query_param("slug", "missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let portfolio = portfolio_for(&server, Arc::new(InMemorySession::new()));

        let post = portfolio.blog_post("hello-rust").await.unwrap().unwrap();
        assert_eq!(post.id, 4);
        assert!(portfolio.blog_post("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn contact_messages_are_posted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/contact/"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "name": "Ada",
                "email": "ada@example.com",
                "message": "Hello!",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 12,
                "name": "Ada",
                "email": "ada@example.com",
                "message": "Hello!",
                "created_at": "2024-05-01T10:00:00Z",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let portfolio = portfolio_for(&server, Arc::new(InMemorySession::new()));

        let sent = portfolio
            .contact(&ContactMessage::new("Ada", "ada@example.com", "Hello!"))
            .await
            .unwrap();
        assert_eq!(sent.id, Some(12));
    }

    #[tokio::test]
    async fn server_errors_carry_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/blog/"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let portfolio = portfolio_for(&server, Arc::new(InMemorySession::new()));

        match portfolio.blog_posts().await.unwrap_err() {
            ApiError::Http { status, body } => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
