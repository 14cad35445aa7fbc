//! Round trips against a live PostgreSQL database
//!
//! Uses the same DB_* variables as the application. These tests purge the
//! `protocolo` table, so point them at a scratch database.
//! Run with: cargo test -p protocolo-infra -- --ignored

use chrono::NaiveDate;
use sqlx::postgres::PgConnectOptions;

use protocolo_domain::model::NewProtocol;
use protocolo_domain::repository::ProtocolRepository;
use protocolo_domain::service::{PurgeAuthorizer, SharedSecretGate};
use protocolo_infra::persistence::PgProtocolRepository;

fn connect_options() -> PgConnectOptions {
    let var = |key: &str| std::env::var(key).unwrap_or_else(|_| panic!("{} must be set", key));
    PgConnectOptions::new()
        .host(&var("DB_HOST"))
        .port(var("DB_PORT").parse().expect("DB_PORT must be a port number"))
        .username(&var("DB_USER"))
        .password(&var("DB_PASSWORD"))
        .database(&var("DB_NAME"))
}

async fn fresh_repo() -> PgProtocolRepository {
    let repo = PgProtocolRepository::connect(connect_options(), 1).await.unwrap();
    repo.ensure_schema().await.unwrap();
    let grant = SharedSecretGate::new(Some("test".to_string()))
        .authorize("test")
        .unwrap();
    repo.delete_all(&grant).await.unwrap();
    repo
}

#[tokio::test]
#[ignore]
async fn test_insert_then_find() {
    let repo = fresh_repo().await;
    let protocol = NewProtocol::new("R-08", "Marcos", "TransSul")
        .with_order("1001/1002")
        .with_invoice("55-56")
        .with_reason("Endereço não localizado")
        .with_date(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());

    let first = repo.insert(&protocol).await.unwrap();
    let second = repo.insert(&protocol).await.unwrap();
    assert!(second > first);

    let found = repo.find_by_id(first).await.unwrap().unwrap();
    assert_eq!(found.id, first);
    assert_eq!(found.to_new(), protocol);
    assert!(repo.find_by_id(second + 1000).await.unwrap().is_none());

    repo.close().await;
}

#[tokio::test]
#[ignore]
async fn test_list_and_purge() {
    let repo = fresh_repo().await;
    for route in ["R-1", "R-2", "R-3"] {
        repo.insert(&NewProtocol::new(route, "Ana", "Rápido")).await.unwrap();
    }

    let all = repo.list_all().await.unwrap();
    let routes: Vec<_> = all.iter().map(|r| r.route.as_str()).collect();
    assert_eq!(routes, vec!["R-1", "R-2", "R-3"]);

    let wrong = SharedSecretGate::new(Some("certa".to_string())).authorize("errada");
    assert!(wrong.is_err());
    assert_eq!(repo.list_all().await.unwrap().len(), 3);

    let grant = SharedSecretGate::new(Some("certa".to_string()))
        .authorize("certa")
        .unwrap();
    assert_eq!(repo.delete_all(&grant).await.unwrap(), 3);
    assert!(repo.list_all().await.unwrap().is_empty());

    repo.close().await;
}
