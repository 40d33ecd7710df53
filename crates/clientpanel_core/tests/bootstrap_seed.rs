mod common;

use clientpanel_core::db::open_db_in_memory;
use clientpanel_core::{
    seed_admin, AdminSeed, ClientRepository, ClientService, ClientStatus, PasswordHasher, Role,
    SeedError, SqliteClientRepository,
};
use common::{client_a, ManualClock, TaggedHasher};

#[test]
fn seeds_admin_into_empty_store_once() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();
    let clock = ManualClock::at(42);
    let seed = AdminSeed::default();

    assert!(seed_admin(&repo, &TaggedHasher, &clock, &seed).unwrap());

    let admin = repo.find_by_id(&seed.client_id).unwrap().unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(admin.status, ClientStatus::Active);
    assert_eq!(admin.created_at, 42);
    assert_eq!(admin.updated_at, 42);
    assert!(TaggedHasher.verify(&seed.password, &admin.password_hash).unwrap());

    clock.advance(1_000);
    assert!(!seed_admin(&repo, &TaggedHasher, &clock, &seed).unwrap());
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn populated_store_is_left_untouched() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();
    let service = ClientService::with_parts(
        SqliteClientRepository::try_new(&conn).unwrap(),
        TaggedHasher,
        ManualClock::at(1),
    );
    service.create_user(client_a()).unwrap();

    let seeded = seed_admin(&repo, &TaggedHasher, &ManualClock::at(2), &AdminSeed::default());
    assert!(!seeded.unwrap());
    assert!(repo.find_by_id("test001").unwrap().is_none());
}

#[test]
fn invalid_seed_is_rejected_before_insert() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteClientRepository::try_new(&conn).unwrap();
    let seed = AdminSeed {
        mobile: "12-34".to_string(),
        ..AdminSeed::default()
    };

    let err = seed_admin(&repo, &TaggedHasher, &ManualClock::at(1), &seed).unwrap_err();
    assert!(matches!(err, SeedError::Invalid(_)));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn seed_debug_output_redacts_password() {
    let rendered = format!("{:?}", AdminSeed::default());
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("\"admin\""));
}
