use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod signup {
    use super::*;

    #[tokio::test]
    async fn new_user_can_sign_up_with_valid_credentials() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "alice", "email": " Alice@X.io ", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["name"], "alice");
        assert_eq!(res.body["email"], "alice@x.io");
    }

    #[tokio::test]
    async fn cannot_sign_up_with_a_taken_name() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice", "alice@x.io").await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "alice", "email": "other@x.io", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.reason(), "CONFLICT");
    }

    #[tokio::test]
    async fn cannot_sign_up_with_an_email_already_in_use() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice", "alice@x.io").await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "bob", "email": "ALICE@x.io", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.reason(), "CONFLICT");
    }

    #[tokio::test]
    async fn cannot_sign_up_with_a_short_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "alice", "email": "alice@x.io", "password": "short"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["error"]["code"], 400);
        assert_eq!(res.reason(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn dotless_domain_is_accepted() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "u1", "email": "a@x", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "a@x");
    }

    #[tokio::test]
    async fn cannot_sign_up_with_a_malformed_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::SIGNUP,
                &json!({"name": "alice", "email": "not-an-email", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.reason(), "VALIDATION_ERROR");
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_token_and_permissions() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice", "alice@x.io").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"name": "alice", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["role"], "user");
        assert_eq!(res.body["permissions"], json!([]));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice", "alice@x.io").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"name": "alice", "password": "wrong-password"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.reason(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_user_is_rejected_like_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"name": "ghost", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.reason(), "INVALID_CREDENTIALS");
    }
}

mod current_user {
    use super::*;

    #[tokio::test]
    async fn me_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.reason(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.reason(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn admin_sees_role_permissions() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["role"], "admin");
        let perms = res.body["permissions"].as_array().unwrap();
        assert!(perms.contains(&json!("hackathon:create")));
        assert!(perms.contains(&json!("hackathon:manage")));
        assert!(perms.contains(&json!("template:manage")));
    }
}

mod emails {
    use super::*;

    #[tokio::test]
    async fn added_emails_are_listed_after_the_primary() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "alice@x.io").await;

        let res = app
            .post_with_token(routes::EMAILS, &json!({"email": "Alice@Work.io"}), &token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "alice@work.io");
        assert_eq!(res.body["primary_email"], false);

        let res = app.get_with_token(routes::EMAILS, &token).await;
        assert_eq!(res.status, 200);
        let emails = res.body.as_array().unwrap();
        assert_eq!(emails.len(), 2);
        assert_eq!(emails[0]["email"], "alice@x.io");
        assert_eq!(emails[0]["primary_email"], true);
        assert_eq!(emails[1]["email"], "alice@work.io");
    }

    #[tokio::test]
    async fn email_of_another_account_cannot_be_added() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("alice", "alice@x.io").await;
        let bob = app.create_authenticated_user("bob", "bob@x.io").await;

        let res = app
            .post_with_token(routes::EMAILS, &json!({"email": "alice@x.io"}), &bob)
            .await;

        assert_eq!(res.status, 409);
    }
}
