//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use donate_types::{
        CreatePostRequest, DonateRepository, NewCredential, NewUser, PostId, RepoError,
        UpdatePostRequest, UpdateUserRequest, UserId, UserRole,
    };

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    async fn create_user(repo: &SqliteRepo, email: &str) -> UserId {
        let user = NewUser::new(email, Some("hash".into())).unwrap();
        repo.create_user(user).await.unwrap().id
    }

    fn post(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.to_string(),
            content: "We need help".to_string(),
            goal: "1000 UAH".to_string(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = setup_repo().await;
        let user = NewUser::new("alice@example.com", Some("hash".into()))
            .unwrap()
            .with_names(Some("Alice".into()), None)
            .with_role(UserRole::Company);

        let created = repo.create_user(user).await.unwrap();
        let fetched = repo.get_user(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.email, "alice@example.com");
        assert_eq!(fetched.first_name.as_deref(), Some("Alice"));
        assert_eq!(fetched.role, UserRole::Company);
        assert_eq!(fetched.password_hash.as_deref(), Some("hash"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = setup_repo().await;
        create_user(&repo, "alice@example.com").await;

        let dup = NewUser::new("alice@example.com", None).unwrap();
        let result = repo.create_user(dup).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[test]
    fn test_non_unique_write_error_is_database() {
        let err = crate::types::map_write_error(sqlx::Error::RowNotFound, "duplicate");
        assert!(matches!(err, RepoError::Database(_)));
    }

    #[tokio::test]
    async fn test_find_user_by_email() {
        let repo = setup_repo().await;
        let id = create_user(&repo, "bob@example.com").await;

        let found = repo.find_user_by_email("bob@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(id));

        let missing = repo.find_user_by_email("nobody@example.com").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_users() {
        let repo = setup_repo().await;
        create_user(&repo, "a@example.com").await;
        create_user(&repo, "b@example.com").await;

        assert_eq!(repo.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_user_merges_fields() {
        let repo = setup_repo().await;
        let user = NewUser::new("carol@example.com", None)
            .unwrap()
            .with_names(Some("Carol".into()), Some("Smith".into()));
        let id = repo.create_user(user).await.unwrap().id;

        let birthday = NaiveDate::from_ymd_opt(1990, 4, 12).unwrap();
        let updated = repo
            .update_user(
                id,
                UpdateUserRequest {
                    city: Some("Lviv".into()),
                    birthday: Some(birthday),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let user = repo.get_user(id).await.unwrap().unwrap();
        assert_eq!(user.city.as_deref(), Some("Lviv"));
        assert_eq!(user.birthday, Some(birthday));
        assert_eq!(user.first_name.as_deref(), Some("Carol"));
        assert_eq!(user.last_name.as_deref(), Some("Smith"));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = setup_repo().await;
        let updated = repo
            .update_user(UserId::new(), UpdateUserRequest::default())
            .await
            .unwrap();
        assert!(!updated);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Posts
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_and_get_post() {
        let repo = setup_repo().await;
        let owner = create_user(&repo, "owner@example.com").await;

        let created = repo.create_post(owner, post("Drones")).await.unwrap();
        let fetched = repo.get_post(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.title, "Drones");
        assert_eq!(fetched.goal, "1000 UAH");
        assert_eq!(fetched.user_id, owner);
    }

    #[tokio::test]
    async fn test_get_missing_post() {
        let repo = setup_repo().await;
        assert!(repo.get_post(PostId::new(42)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_posts_for_user_newest_first() {
        let repo = setup_repo().await;
        let owner = create_user(&repo, "owner@example.com").await;
        let other = create_user(&repo, "other@example.com").await;

        repo.create_post(owner, post("First")).await.unwrap();
        repo.create_post(owner, post("Second")).await.unwrap();
        repo.create_post(other, post("Elsewhere")).await.unwrap();

        let posts = repo.list_posts_for_user(owner).await.unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[tokio::test]
    async fn test_update_post_merges_fields() {
        let repo = setup_repo().await;
        let owner = create_user(&repo, "owner@example.com").await;
        let created = repo.create_post(owner, post("Drones")).await.unwrap();

        let updated = repo
            .update_post(
                created.id,
                UpdatePostRequest {
                    goal: Some("2000 UAH".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated);

        let fetched = repo.get_post(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Drones");
        assert_eq!(fetched.goal, "2000 UAH");
    }

    #[tokio::test]
    async fn test_delete_post() {
        let repo = setup_repo().await;
        let owner = create_user(&repo, "owner@example.com").await;
        let created = repo.create_post(owner, post("Drones")).await.unwrap();

        assert!(repo.delete_post(created.id).await.unwrap());
        assert!(!repo.delete_post(created.id).await.unwrap());
        assert!(repo.get_post(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_post_requires_existing_owner() {
        let repo = setup_repo().await;
        let result = repo.create_post(UserId::new(), post("Orphan")).await;
        assert!(matches!(result, Err(RepoError::Database(_))));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Credentials
    // ─────────────────────────────────────────────────────────────────────────

    fn credential(user_id: UserId) -> NewCredential {
        NewCredential {
            user_id,
            merchant_account: "test_merch_n1".into(),
            encrypted_secret: "00:11".into(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_credential() {
        let repo = setup_repo().await;
        let owner = create_user(&repo, "owner@example.com").await;

        let created = repo.create_credential(credential(owner)).await.unwrap();
        let found = repo.find_credential_by_user(owner).await.unwrap().unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(found.merchant_account, "test_merch_n1");
        assert_eq!(found.encrypted_secret, "00:11");
        assert!(found.is_owned_by(owner));
    }

    #[tokio::test]
    async fn test_second_credential_is_conflict() {
        let repo = setup_repo().await;
        let owner = create_user(&repo, "owner@example.com").await;

        repo.create_credential(credential(owner)).await.unwrap();
        let result = repo.create_credential(credential(owner)).await;

        assert!(matches!(result, Err(RepoError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_credential() {
        let repo = setup_repo().await;
        let owner = create_user(&repo, "owner@example.com").await;
        repo.create_credential(credential(owner)).await.unwrap();

        assert!(repo.delete_credential_by_user(owner).await.unwrap());
        assert!(!repo.delete_credential_by_user(owner).await.unwrap());
        assert!(repo.find_credential_by_user(owner).await.unwrap().is_none());
    }
}
