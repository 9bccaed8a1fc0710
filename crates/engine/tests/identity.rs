use std::collections::HashSet;

use chrono::Duration;
use sea_orm::Database;

use engine::{Engine, EngineError, NameResolver, UserUpdate};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder()
        .database(db)
        .token_secret("test-secret")
        .token_ttl(Duration::minutes(5))
        .build()
        .await
        .unwrap()
}

fn invalid_credentials() -> EngineError {
    EngineError::Unauthorized("Invalid credentials".to_string())
}

#[tokio::test]
async fn signup_rejects_a_taken_email() {
    let engine = engine().await;
    engine
        .create_user("alice@example.com", "pw", "Alice", None)
        .await
        .unwrap();

    let err = engine
        .create_user("alice@example.com", "other", "Impostor", None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::ExistingKey("This email is already in use.".to_string())
    );
    assert_eq!(engine.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn signup_requires_the_basics() {
    let engine = engine().await;
    for (email, password, name) in [
        ("", "pw", "Alice"),
        ("alice@example.com", "", "Alice"),
        ("alice@example.com", "pw", "  "),
    ] {
        let err = engine
            .create_user(email, password, name, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)), "{err:?}");
    }
}

#[tokio::test]
async fn login_then_authenticate() {
    let engine = engine().await;
    let id = engine
        .create_user("alice@example.com", "s3cret", "Alice", None)
        .await
        .unwrap();

    let token = engine.login("alice@example.com", "s3cret").await.unwrap();
    let identity = engine.authenticate(&token).unwrap();
    assert_eq!(identity.user_id, id);
    assert_eq!(identity.email, "alice@example.com");
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let engine = engine().await;
    engine
        .create_user("alice@example.com", "s3cret", "Alice", None)
        .await
        .unwrap();

    assert_eq!(
        engine.login("alice@example.com", "wrong").await.unwrap_err(),
        invalid_credentials()
    );
    assert_eq!(
        engine.login("nobody@example.com", "s3cret").await.unwrap_err(),
        invalid_credentials()
    );
}

#[tokio::test]
async fn garbage_tokens_are_unauthorized() {
    let engine = engine().await;
    for token in ["", "abc", "abc.def"] {
        assert!(matches!(
            engine.authenticate(token),
            Err(EngineError::Unauthorized(_))
        ));
    }
}

#[tokio::test]
async fn profile_hides_nothing_but_the_password() {
    let engine = engine().await;
    let id = engine
        .create_user(
            "alice@example.com",
            "pw",
            "Alice",
            Some("https://img.example.com/alice.png"),
        )
        .await
        .unwrap();

    let profile = engine.user_profile(id).await.unwrap();
    assert_eq!(profile.id, id);
    assert_eq!(profile.name, "Alice");
    assert_eq!(profile.email, "alice@example.com");
    assert_eq!(
        profile.profile_pic.as_deref(),
        Some("https://img.example.com/alice.png")
    );
    assert_eq!(profile.about, None);

    assert_eq!(
        engine.user_profile(id + 1).await.unwrap_err(),
        EngineError::Unauthorized("User not found".to_string())
    );
}

#[tokio::test]
async fn partial_profile_updates() {
    let engine = engine().await;
    let id = engine
        .create_user("alice@example.com", "pw", "Alice", None)
        .await
        .unwrap();

    let updated = engine
        .update_user(
            id,
            UserUpdate {
                about: Some("Likes pizza".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Alice");
    assert_eq!(updated.about.as_deref(), Some("Likes pizza"));

    // A blank name is ignored, an empty about is kept.
    let updated = engine
        .update_user(
            id,
            UserUpdate {
                name: Some(" ".to_string()),
                about: Some(String::new()),
                profile_pic: Some("https://img.example.com/a.png".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Alice");
    assert_eq!(updated.about.as_deref(), Some(""));
    assert_eq!(
        updated.profile_pic.as_deref(),
        Some("https://img.example.com/a.png")
    );

    let renamed = engine
        .update_user(
            id,
            UserUpdate {
                name: Some("Alicia".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Alicia");
    assert_eq!(engine.user_profile(id).await.unwrap(), renamed);

    // Nothing to change is not an error.
    let same = engine.update_user(id, UserUpdate::default()).await.unwrap();
    assert_eq!(same, renamed);
}

#[tokio::test]
async fn blank_profile_pic_keeps_the_current_one() {
    let engine = engine().await;
    let id = engine
        .create_user(
            "alice@example.com",
            "pw",
            "Alice",
            Some("https://img.example.com/a.png"),
        )
        .await
        .unwrap();

    for blank in ["", "   "] {
        let updated = engine
            .update_user(
                id,
                UserUpdate {
                    profile_pic: Some(blank.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            updated.profile_pic.as_deref(),
            Some("https://img.example.com/a.png")
        );
    }
}

#[tokio::test]
async fn update_of_a_missing_user() {
    let engine = engine().await;
    assert_eq!(
        engine
            .update_user(42, UserUpdate::default())
            .await
            .unwrap_err(),
        EngineError::Unauthorized("User not found".to_string())
    );
}

#[tokio::test]
async fn names_resolve_best_effort() {
    let engine = engine().await;
    let alice = engine
        .create_user("alice@example.com", "pw", "Alice", None)
        .await
        .unwrap();
    let bob = engine
        .create_user("bob@example.com", "pw", "Bob", None)
        .await
        .unwrap();

    let ids: HashSet<String> = [alice.to_string(), bob.to_string(), "999".into(), "x".into()]
        .into_iter()
        .collect();
    let names = engine.resolve_names(&ids).await.unwrap();
    assert_eq!(names.len(), 2);
    assert_eq!(names[&alice.to_string()], "Alice");
    assert_eq!(names[&bob.to_string()], "Bob");

    assert_eq!(engine.resolve_names(&ids).await.unwrap(), names);
    assert!(engine.resolve_names(&HashSet::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn users_are_listed_by_id() {
    let engine = engine().await;
    for (email, name) in [("b@example.com", "B"), ("a@example.com", "A")] {
        engine.create_user(email, "pw", name, None).await.unwrap();
    }
    let names: Vec<_> = engine
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|user| user.name)
        .collect();
    assert_eq!(names, ["B", "A"]);
}
