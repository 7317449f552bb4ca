use std::sync::Arc;

use backend_lib::{
    auth::{AuthError, AuthService, DefaultAuth, RegistrationPolicy, TokenIssuer, DEFAULT_TOKEN_TTL},
    directory::{FlatFileDirectory, InMemoryDirectory, User, UserDirectory},
};
use tempfile::TempDir;

use crate::test_utils::{cheap_hasher, TEST_SECRET};

fn auth_over(directory: Arc<dyn UserDirectory>) -> DefaultAuth {
    let tokens = TokenIssuer::new(TEST_SECRET, DEFAULT_TOKEN_TTL).unwrap();
    DefaultAuth::new(directory, cheap_hasher(), tokens)
}

#[tokio::test]
async fn test_register_login_authenticate() {
    let directory = Arc::new(InMemoryDirectory::new());
    let auth = auth_over(directory.clone());

    let user_id = auth.register("a@x.com", "Secret123").await.unwrap();

    let token = auth.login("a@x.com", "Secret123").await.unwrap();
    assert_eq!(auth.authenticate(&format!("Bearer {token}")).unwrap(), user_id);
    assert_eq!(auth.authenticate(&token).unwrap(), user_id);

    let user = auth.current_user(&user_id).await.unwrap();
    assert_eq!(user.email, "a@x.com");
    assert_ne!(user.password_hash, "Secret123");

    assert_eq!(
        auth.login("a@x.com", "wrong").await,
        Err(AuthError::InvalidCredentials)
    );
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let auth = auth_over(Arc::new(InMemoryDirectory::new()));

    auth.register("a@x.com", "Secret123").await.unwrap();
    assert_eq!(
        auth.register("a@x.com", "Other4567").await,
        Err(AuthError::Conflict)
    );
    // Emails are compared after normalization.
    assert_eq!(
        auth.register("  A@X.COM ", "Other4567").await,
        Err(AuthError::Conflict)
    );

    // The first password still works.
    assert!(auth.login("a@x.com", "Secret123").await.is_ok());
    assert!(auth.login("A@x.com", "Secret123").await.is_ok());
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_look_the_same() {
    let auth = auth_over(Arc::new(InMemoryDirectory::new()));
    auth.register("a@x.com", "Secret123").await.unwrap();

    let unknown = auth.login("b@x.com", "Secret123").await.unwrap_err();
    let wrong = auth.login("a@x.com", "Secret124").await.unwrap_err();
    assert_eq!(unknown, wrong);
    assert_eq!(unknown, AuthError::InvalidCredentials);
}

#[tokio::test]
async fn test_explicit_policy_never_creates_users() {
    let directory = Arc::new(InMemoryDirectory::new());
    let auth = auth_over(directory.clone());

    assert_eq!(
        auth.login("new@x.com", "Secret123").await,
        Err(AuthError::InvalidCredentials)
    );
    assert!(directory.is_empty());
}

#[tokio::test]
async fn test_auto_register_on_first_login() {
    let directory = Arc::new(InMemoryDirectory::new());
    let auth = auth_over(directory.clone()).with_policy(RegistrationPolicy::AutoRegister);

    let token = auth.login("new@x.com", "Secret123").await.unwrap();
    let user_id = auth.authenticate(&token).unwrap();
    assert_eq!(directory.get_by_email("new@x.com").await.unwrap().id, user_id);

    // Later logins go through the normal password check.
    assert!(auth.login("new@x.com", "Secret123").await.is_ok());
    assert_eq!(
        auth.login("new@x.com", "Different1").await,
        Err(AuthError::InvalidCredentials)
    );
    assert_eq!(directory.len(), 1);

    // Auto-registration still enforces the password rules.
    assert!(matches!(
        auth.login("weak@x.com", "weak").await,
        Err(AuthError::WeakPassword(_))
    ));
    assert!(matches!(
        auth.login("not-an-email", "Secret123").await,
        Err(AuthError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_concurrent_auto_register_same_email() {
    let directory = Arc::new(InMemoryDirectory::new());
    let auth = Arc::new(auth_over(directory.clone()).with_policy(RegistrationPolicy::AutoRegister));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let auth = auth.clone();
        handles.push(tokio::spawn(async move {
            auth.login("race@x.com", "Secret123").await
        }));
    }

    let mut subjects = Vec::new();
    for handle in handles {
        let token = handle.await.unwrap().unwrap();
        subjects.push(auth.authenticate(&token).unwrap());
    }

    assert_eq!(directory.len(), 1);
    subjects.dedup();
    assert_eq!(subjects.len(), 1);
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let auth = auth_over(Arc::new(InMemoryDirectory::new()));
    let foreign = TokenIssuer::new("another-secret", DEFAULT_TOKEN_TTL)
        .unwrap()
        .issue("user-1")
        .unwrap();

    assert_eq!(auth.authenticate(&foreign), Err(AuthError::InvalidToken));
}

#[tokio::test]
async fn test_malformed_stored_hash_is_internal_error() {
    let directory = Arc::new(InMemoryDirectory::new());
    directory
        .create(User::new("a@x.com", "not-a-phc-string"))
        .await
        .unwrap();
    let auth = auth_over(directory);

    assert_eq!(
        auth.login("a@x.com", "Secret123").await,
        Err(AuthError::MalformedHash)
    );
}

#[tokio::test]
async fn test_accounts_persist_across_restart() {
    let temp = TempDir::new().unwrap();

    let user_id = {
        let auth = auth_over(Arc::new(FlatFileDirectory::open(temp.path()).unwrap()));
        auth.register("a@x.com", "Secret123").await.unwrap()
    };

    let auth = auth_over(Arc::new(FlatFileDirectory::open(temp.path()).unwrap()));
    let token = auth.login("a@x.com", "Secret123").await.unwrap();
    assert_eq!(auth.authenticate(&token).unwrap(), user_id);
    assert_eq!(
        auth.register("a@x.com", "Secret123").await,
        Err(AuthError::Conflict)
    );
}
