//! User Service - borrower CRUD with change tracking

use crate::domain::{Collection, DomainError};
use crate::infrastructure::config::LibraryConfig;
use crate::infrastructure::{LibraryRepository, SaveBatch};
use crate::models::change::Snapshot;
use crate::models::{NewUser, User, UserPatch, UserSnapshot};
use crate::services::change_tracker::ChangeTracker;
use crate::utils::parse_leading_int;

/// Next free code for `prefix`, one past the highest existing suffix.
///
/// Codes with another prefix, a non-numeric suffix or a suffix beyond
/// `u32` are ignored.
pub fn next_user_code(prefix: &str, users: &[User]) -> String {
    let marker = format!("{}-", prefix);
    let highest = users
        .iter()
        .filter_map(|u| u.user_code.strip_prefix(&marker))
        .filter_map(parse_leading_int)
        .filter_map(|n| u32::try_from(n).ok())
        .max()
        .unwrap_or(0);

    format!("{}-{:04}", prefix, u64::from(highest) + 1)
}

pub async fn list_users(repo: &LibraryRepository) -> Result<Vec<User>, DomainError> {
    repo.get_users().await
}

pub async fn get_user(repo: &LibraryRepository, id: &str) -> Result<User, DomainError> {
    repo.get_users()
        .await?
        .into_iter()
        .find(|u| u.id == id)
        .ok_or_else(|| DomainError::user_not_found(id))
}

/// Create a user with the next code for the configured prefix.
/// Returns the full updated collection.
pub async fn add_user(
    repo: &LibraryRepository,
    config: &LibraryConfig,
    input: NewUser,
) -> Result<Vec<User>, DomainError> {
    let prefix = config.user_code_prefix.trim();
    if prefix.is_empty() {
        return Err(DomainError::Configuration(
            "User code prefix not configured.".to_string(),
        ));
    }

    let mut users = repo.get_users().await?;
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        user_code: next_user_code(prefix, &users),
        name: input.name,
        last_name: input.last_name,
        user_type: input.user_type,
        grade: input.grade.filter(|g| !g.is_empty()),
    };

    let log = ChangeTracker::<UserSnapshot>::new(repo)
        .stage_create(&user.id, UserSnapshot::from(&user))
        .await?;

    tracing::info!("Adding user {} ({})", user.user_code, user.id);
    users.push(user);

    repo.save_batch(
        SaveBatch::new()
            .with(Collection::Users, &users)?
            .with(UserSnapshot::LOG, &log)?,
    )
    .await?;

    Ok(users)
}

pub async fn update_user(
    repo: &LibraryRepository,
    id: &str,
    patch: UserPatch,
) -> Result<Vec<User>, DomainError> {
    let mut users = repo.get_users().await?;
    let user = users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| DomainError::user_not_found(id))?;

    let before = UserSnapshot::from(&*user);
    patch.apply_to(user);
    let after = UserSnapshot::from(&*user);

    let log = ChangeTracker::<UserSnapshot>::new(repo)
        .stage_update(id, before, after)
        .await?;

    tracing::info!("Updated user {}", id);
    repo.save_batch(
        SaveBatch::new()
            .with(Collection::Users, &users)?
            .with(UserSnapshot::LOG, &log)?,
    )
    .await?;

    Ok(users)
}

/// Remove a user. Loans that reference the user are left as they are.
pub async fn delete_user(repo: &LibraryRepository, id: &str) -> Result<Vec<User>, DomainError> {
    let mut users = repo.get_users().await?;
    let pos = users
        .iter()
        .position(|u| u.id == id)
        .ok_or_else(|| DomainError::user_not_found(id))?;
    let removed = users.remove(pos);

    let log = ChangeTracker::<UserSnapshot>::new(repo)
        .stage_delete(id, UserSnapshot::from(&removed))
        .await?;

    tracing::info!("Deleted user {} ({})", removed.user_code, id);
    repo.save_batch(
        SaveBatch::new()
            .with(Collection::Users, &users)?
            .with(UserSnapshot::LOG, &log)?,
    )
    .await?;

    Ok(users)
}
