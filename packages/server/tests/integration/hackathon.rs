use serde_json::json;

use sea_orm::{ActiveModelTrait, Set};

use hackathon_server::entity::register;

use crate::common::{TestApp, routes};

mod lookup {
    use super::*;

    #[tokio::test]
    async fn admin_creates_and_fetches_by_id_and_name() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_hackathon(&admin, "spring-jam").await;

        let res = app.get_without_token(&routes::hackathon(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "spring-jam");
        assert_eq!(res.body["display_name"], "spring-jam display");

        let res = app
            .get_without_token(&routes::hackathon_by_name("spring-jam"))
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.id(), id);
    }

    #[tokio::test]
    async fn unknown_hackathon_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::hackathon(77)).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.reason(), "NOT_FOUND");

        let res = app
            .get_without_token(&routes::hackathon_by_name("nope"))
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn regular_users_cannot_create() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "alice@x.io").await;

        let res = app
            .post_with_token(
                routes::HACKATHON,
                &json!({"name": "jam", "display_name": "Jam"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.reason(), "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        app.create_hackathon(&admin, "jam").await;

        let res = app
            .post_with_token(
                routes::HACKATHON,
                &json!({"name": "jam", "display_name": "Again"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn list_is_public_and_searchable() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        app.create_hackathon(&admin, "spring-jam").await;
        app.create_hackathon(&admin, "autumn-jam").await;
        app.create_hackathon(&admin, "winter-cup").await;

        let res = app.get_without_token(routes::HACKATHONS).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 3);

        let res = app
            .get_without_token(&format!("{}?search=JAM", routes::HACKATHONS))
            .await;
        assert_eq!(res.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn page_beyond_range_returns_an_empty_page() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        app.create_hackathon(&admin, "jam").await;

        let res = app
            .get_without_token(&format!("{}?page=18446744073709551615", routes::HACKATHONS))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"], json!([]));
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["pagination"]["page"], 1_000_000);
    }
}

mod update_delete {
    use super::*;

    #[tokio::test]
    async fn creator_updates_supplied_fields_only() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_hackathon(&admin, "jam").await;

        let res = app
            .patch_with_token(
                &routes::hackathon(id),
                &json!({"display_name": "  Jam 2  "}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "jam");
        assert_eq!(res.body["display_name"], "Jam 2");
        assert_eq!(res.body["description"], "Build something");
    }

    #[tokio::test]
    async fn blank_display_name_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_hackathon(&admin, "jam").await;

        let res = app
            .patch_with_token(&routes::hackathon(id), &json!({"display_name": " "}), &admin)
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn other_users_cannot_update_or_delete() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_hackathon(&admin, "jam").await;
        let alice = app.create_authenticated_user("alice", "alice@x").await;

        let res = app
            .patch_with_token(&routes::hackathon(id), &json!({"description": "x"}), &alice)
            .await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::hackathon(id), &alice).await;
        assert_eq!(res.status, 403);

        let res = app.get_without_token(&routes::hackathon(id)).await;
        assert_eq!(res.status, 200);
    }

    #[tokio::test]
    async fn update_unknown_hackathon_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;

        let res = app
            .patch_with_token(&routes::hackathon(404), &json!({"description": "x"}), &admin)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_removes_the_hackathon_and_its_registrations() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_hackathon(&admin, "jam").await;
        app.register_email(id, "a@x", &admin).await;
        app.register_email(id, "b@x", &admin).await;

        let res = app.delete_with_token(&routes::hackathon(id), &admin).await;
        assert_eq!(res.status, 204);

        let res = app.get_without_token(&routes::hackathon(id)).await;
        assert_eq!(res.status, 404);

        let res = app.get_without_token(&routes::hackathon_stat(id)).await;
        assert_eq!(res.status, 404);

        // The name is free again.
        let again = app.create_hackathon(&admin, "jam").await;
        let res = app.get_without_token(&routes::hackathon_stat(again)).await;
        assert_eq!(res.body["total"], 0);
    }

    #[tokio::test]
    async fn deleting_an_unknown_hackathon_succeeds() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;

        let res = app.delete_with_token(&routes::hackathon(999), &admin).await;

        assert_eq!(res.status, 204);
    }
}

mod name_availability {
    use super::*;

    #[tokio::test]
    async fn reports_free_taken_and_invalid_names() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        app.create_hackathon(&admin, "jam").await;
        let alice = app.create_authenticated_user("alice", "alice@x").await;

        let res = app
            .post_with_token(routes::HACKATHON_NAME_CHECK, &json!({"name": "cup"}), &alice)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name_available"], true);
        assert!(res.body.get("reason").is_none());

        let res = app
            .post_with_token(routes::HACKATHON_NAME_CHECK, &json!({"name": "jam"}), &alice)
            .await;
        assert_eq!(res.body["name_available"], false);
        assert_eq!(res.body["reason"], "AlreadyExists");

        let res = app
            .post_with_token(
                routes::HACKATHON_NAME_CHECK,
                &json!({"name": "no spaces"}),
                &alice,
            )
            .await;
        assert_eq!(res.body["name_available"], false);
        assert_eq!(res.body["reason"], "Invalid");
    }

    #[tokio::test]
    async fn requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::HACKATHON_NAME_CHECK, &json!({"name": "cup"}))
            .await;

        assert_eq!(res.status, 401);
    }
}

mod registration {
    use super::*;

    #[tokio::test]
    async fn empty_body_registers_the_primary_email() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;
        let alice = app.create_authenticated_user("alice", "Alice@X.io").await;

        let res = app
            .post_with_token(&routes::registers(hid), &json!({}), &alice)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "alice@x.io");
        assert_eq!(res.body["enabled"], true);
        assert_eq!(res.body["hackathon_id"], hid);
    }

    #[tokio::test]
    async fn registering_twice_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;
        let alice = app.create_authenticated_user("alice", "alice@x.io").await;
        app.register_email(hid, "alice@x.io", &alice).await;

        let res = app
            .post_with_token(&routes::registers(hid), &json!({}), &alice)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.reason(), "CONFLICT");
    }

    #[tokio::test]
    async fn foreign_email_needs_manage_permission() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;
        let alice = app.create_authenticated_user("alice", "alice@x.io").await;

        let res = app
            .post_with_token(
                &routes::registers(hid),
                &json!({"email": "walkin@x.io"}),
                &alice,
            )
            .await;
        assert_eq!(res.status, 403);

        app.register_email(hid, "walkin@x.io", &admin).await;
    }

    #[tokio::test]
    async fn unknown_hackathon_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "alice@x.io").await;

        let res = app
            .post_with_token(&routes::registers(31), &json!({}), &alice)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn managers_list_and_toggle_registrations() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;
        let rid = app.register_email(hid, "walkin@x.io", &admin).await;

        let res = app.get_with_token(&routes::registers(hid), &admin).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 1);

        let res = app
            .patch_with_token(&routes::register(hid, rid), &json!({"enabled": false}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["enabled"], false);

        // A disabled row no longer blocks a fresh registration.
        let second = app.register_email(hid, "walkin@x.io", &admin).await;
        assert_ne!(second, rid);

        let res = app
            .patch_with_token(&routes::register(hid, rid), &json!({"enabled": true}), &admin)
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn store_rejects_a_second_enabled_row_for_the_same_email() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;
        app.register_email(hid, "a@x", &admin).await;

        let row = |enabled: bool| register::ActiveModel {
            hackathon_id: Set(hid),
            email: Set("a@x".to_string()),
            enabled: Set(enabled),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        };

        let err = row(true).insert(&app.db).await.unwrap_err();
        assert!(
            matches!(
                err.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ),
            "unexpected error: {err}"
        );

        row(false)
            .insert(&app.db)
            .await
            .expect("disabled duplicates are allowed");
    }

    #[tokio::test]
    async fn regular_users_cannot_manage_registrations() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;
        let alice = app.create_authenticated_user("alice", "alice@x.io").await;
        let rid = app.register_email(hid, "alice@x.io", &alice).await;

        let res = app.get_with_token(&routes::registers(hid), &alice).await;
        assert_eq!(res.status, 403);

        let res = app
            .patch_with_token(&routes::register(hid, rid), &json!({"enabled": false}), &alice)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn toggling_a_registration_of_another_hackathon_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let first = app.create_hackathon(&admin, "jam").await;
        let second = app.create_hackathon(&admin, "cup").await;
        let rid = app.register_email(first, "walkin@x.io", &admin).await;

        let res = app
            .patch_with_token(&routes::register(second, rid), &json!({"enabled": false}), &admin)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod stat {
    use super::*;

    #[tokio::test]
    async fn no_registrations_reports_zeros() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;

        let res = app.get_without_token(&routes::hackathon_stat(hid)).await;

        assert_eq!(res.status, 200);
        assert_eq!(
            res.body,
            json!({"total": 0, "hid": hid, "online": 0, "offline": 0})
        );
    }

    #[tokio::test]
    async fn splits_online_and_offline_registrations() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;

        // e1 belongs to a live account, e2 to a removed one, e3 to nobody.
        app.create_authenticated_user("u1", "e1@x.io").await;
        app.insert_orphan_email("e2@x.io").await;
        for email in ["e1@x.io", "e2@x.io", "e3@x.io"] {
            app.register_email(hid, email, &admin).await;
        }

        let res = app.get_without_token(&routes::hackathon_stat(hid)).await;

        assert_eq!(res.status, 200);
        assert_eq!(
            res.body,
            json!({"total": 3, "hid": hid, "online": 1, "offline": 2})
        );
    }

    #[tokio::test]
    async fn dotless_emails_and_a_removed_account() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;

        app.create_authenticated_user("u1", "a@x").await;
        app.create_authenticated_user("u2", "b@x").await;
        app.delete_user("u2").await;
        for email in ["a@x", "b@x", "c@x"] {
            app.register_email(hid, email, &admin).await;
        }

        let res = app.get_without_token(&routes::hackathon_stat(hid)).await;

        assert_eq!(res.status, 200);
        assert_eq!(
            res.body,
            json!({"total": 3, "hid": hid, "online": 1, "offline": 2})
        );
    }

    #[tokio::test]
    async fn disabled_registrations_are_not_counted() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;
        app.create_authenticated_user("u1", "e1@x.io").await;
        let rid = app.register_email(hid, "e1@x.io", &admin).await;
        app.register_email(hid, "e2@x.io", &admin).await;

        let res = app
            .patch_with_token(&routes::register(hid, rid), &json!({"enabled": false}), &admin)
            .await;
        assert_eq!(res.status, 200);

        let res = app.get_without_token(&routes::hackathon_stat(hid)).await;
        assert_eq!(res.body["total"], 1);
        assert_eq!(res.body["online"], 0);
        assert_eq!(res.body["offline"], 1);
    }

    #[tokio::test]
    async fn user_with_two_registered_emails_counts_once_online() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;
        let alice = app.create_authenticated_user("alice", "alice@x.io").await;
        let res = app
            .post_with_token(routes::EMAILS, &json!({"email": "alice@work.io"}), &alice)
            .await;
        assert_eq!(res.status, 201);

        app.register_email(hid, "alice@x.io", &alice).await;
        app.register_email(hid, "alice@work.io", &alice).await;

        let res = app.get_without_token(&routes::hackathon_stat(hid)).await;
        assert_eq!(res.body["total"], 2);
        assert_eq!(res.body["online"], 1);
        assert_eq!(res.body["offline"], 1);
    }

    #[tokio::test]
    async fn online_grows_when_a_registered_email_gets_an_account() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let hid = app.create_hackathon(&admin, "jam").await;
        app.register_email(hid, "late@x.io", &admin).await;

        let before = app.get_without_token(&routes::hackathon_stat(hid)).await;
        assert_eq!(before.body["online"], 0);

        app.create_authenticated_user("late", "late@x.io").await;

        let after = app.get_without_token(&routes::hackathon_stat(hid)).await;
        assert_eq!(after.body["total"], 1);
        assert_eq!(after.body["online"], 1);
        assert_eq!(after.body["offline"], 0);
    }

    #[tokio::test]
    async fn registrations_of_other_hackathons_are_ignored() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let first = app.create_hackathon(&admin, "jam").await;
        let second = app.create_hackathon(&admin, "cup").await;
        app.register_email(first, "a@x.io", &admin).await;

        let res = app.get_without_token(&routes::hackathon_stat(second)).await;
        assert_eq!(res.body["total"], 0);
    }

    #[tokio::test]
    async fn unknown_hackathon_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::hackathon_stat(9)).await;

        assert_eq!(res.status, 404);
    }
}
