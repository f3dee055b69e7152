//! Demo catalog for a fresh install

use crate::domain::DomainError;
use crate::infrastructure::LibraryRepository;
use crate::infrastructure::config::LibraryConfig;
use crate::models::{AssetForm, NewUser, UserType};
use crate::services::{asset_service, loan_service, user_service, LoanPolicy};

/// Seed a few assets, users and one loan through the regular services.
/// Does nothing when the catalog already holds assets.
pub async fn seed_demo_data(
    repo: &LibraryRepository,
    config: &LibraryConfig,
) -> Result<bool, DomainError> {
    if !repo.get_assets().await?.is_empty() {
        tracing::info!("Catalog not empty, skipping demo seed");
        return Ok(false);
    }

    let books = [
        ("Cien años de soledad", "Gabriel García Márquez", "2", &["Novela", "Realismo mágico"][..]),
        ("El principito", "Antoine de Saint-Exupéry", "3", &["Literatura infantil"][..]),
        ("Momo", "Michael Ende", "1", &["Literatura juvenil", "Fantasía"][..]),
    ];
    for (title, author, copies, subjects) in books {
        asset_service::add_asset(
            repo,
            AssetForm {
                title: Some(title.to_string()),
                asset_type: Some("Libro".to_string()),
                author: Some(author.to_string()),
                copies: Some(copies.to_string()),
                is_loanable: Some(true),
                subjects: Some(subjects.iter().map(|s| s.to_string()).collect()),
                ..Default::default()
            },
        )
        .await?;
    }
    asset_service::add_asset(
        repo,
        AssetForm {
            title: Some("Atlas geográfico escolar".to_string()),
            asset_type: Some("Mapa".to_string()),
            description: Some("Consulta en sala".to_string()),
            is_loanable: Some(false),
            ..Default::default()
        },
    )
    .await?;

    let people = [
        ("Ana", "Ruiz", UserType::Student, Some("4A")),
        ("Luis", "Gil", UserType::Teacher, None),
        ("Marta", "Sanz", UserType::Staff, None),
    ];
    for (name, last_name, user_type, grade) in people {
        user_service::add_user(
            repo,
            config,
            NewUser {
                name: name.to_string(),
                last_name: last_name.to_string(),
                user_type,
                grade: grade.map(str::to_string),
            },
        )
        .await?;
    }

    let assets = repo.get_assets().await?;
    let users = repo.get_users().await?;
    if let (Some(asset), Some(user)) = (assets.first(), users.first()) {
        loan_service::borrow(repo, LoanPolicy::default(), &asset.id, &user.id).await?;
    }

    tracing::info!(
        "Seeded {} assets and {} users",
        assets.len(),
        users.len()
    );
    Ok(true)
}
