use merchello_core::db::open_db_in_memory;
use merchello_core::{
    Entity, Province, Query, RepoError, Repository, ShipCountry, ShipZone, ShipZoneRepository,
    SqliteShipCountryRepository, SqliteShipZoneRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn insert_zone(repo: &SqliteShipZoneRepository<'_>, catalog_key: Uuid, name: &str) -> ShipZone {
    let mut zone = ShipZone::new(catalog_key, name);
    repo.add_or_update(&mut zone).unwrap();
    zone
}

#[test]
fn get_returns_none_for_unknown_key() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();

    assert!(repo.get(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn insert_assigns_identity_and_round_trips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let catalog_key = Uuid::new_v4();

    let mut zone = ShipZone::new(catalog_key, "Europe");
    assert!(zone.is_new());
    repo.add_or_update(&mut zone).unwrap();

    assert!(!zone.is_new());
    assert!(!zone.key().is_nil());
    assert!(!zone.is_dirty());
    assert!(zone.create_date() > 0);
    assert_eq!(zone.create_date(), zone.update_date());

    let loaded = repo.get(zone.key()).unwrap().unwrap();
    assert_eq!(loaded, zone);
    assert!(!loaded.is_dirty());
    assert!(loaded.has_identity());
}

#[test]
fn exists_matches_catalog_and_exact_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let catalog_key = Uuid::new_v4();
    insert_zone(&repo, catalog_key, "Europe");

    assert!(repo.exists(catalog_key, "Europe").unwrap());
    assert!(!repo.exists(catalog_key, "europe").unwrap());
    assert!(!repo.exists(Uuid::new_v4(), "Europe").unwrap());
}

#[test]
fn inserting_duplicate_name_in_same_catalog_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let catalog_key = Uuid::new_v4();
    insert_zone(&repo, catalog_key, "Europe");

    let mut duplicate = ShipZone::new(catalog_key, "Europe");
    let err = repo.add_or_update(&mut duplicate).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert!(duplicate.is_new());

    let mut other_catalog = ShipZone::new(Uuid::new_v4(), "Europe");
    repo.add_or_update(&mut other_catalog).unwrap();
}

#[test]
fn insert_rejects_invalid_entity() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();

    let mut zone = ShipZone::new(Uuid::nil(), "Nowhere");
    let err = repo.add_or_update(&mut zone).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.get_all(&[]).unwrap().is_empty());
}

#[test]
fn get_all_without_keys_returns_everything_and_skips_missing_keys() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let catalog_key = Uuid::new_v4();
    let first = insert_zone(&repo, catalog_key, "Europe");
    let second = insert_zone(&repo, catalog_key, "Asia");

    let mut all_keys = repo
        .get_all(&[])
        .unwrap()
        .iter()
        .map(|zone| zone.key())
        .collect::<Vec<_>>();
    all_keys.sort();
    let mut expected = vec![first.key(), second.key()];
    expected.sort();
    assert_eq!(all_keys, expected);

    let requested = repo.get_all(&[second.key(), Uuid::new_v4()]).unwrap();
    assert_eq!(requested, vec![second]);
}

#[test]
fn get_by_query_filters_by_catalog() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let catalog_key = Uuid::new_v4();
    let europe = insert_zone(&repo, catalog_key, "Europe");
    insert_zone(&repo, Uuid::new_v4(), "Asia");

    let found = repo
        .get_by_query(&Query::new().where_key_eq("catalog_key", catalog_key))
        .unwrap();
    assert_eq!(found, vec![europe]);

    let by_name = repo
        .get_by_query(
            &Query::new()
                .where_key_eq("catalog_key", catalog_key)
                .where_text_eq("name", "Asia"),
        )
        .unwrap();
    assert!(by_name.is_empty());
}

#[test]
fn get_by_query_rejects_unmapped_property() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();

    let err = repo
        .get_by_query(&Query::new().where_text_eq("color", "red"))
        .unwrap_err();
    match err {
        RepoError::UnknownProperty { table, property } => {
            assert_eq!(table, "ship_zones");
            assert_eq!(property, "color");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn update_persists_changes_and_keeps_create_date() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let mut zone = insert_zone(&repo, Uuid::new_v4(), "Europe");
    let created = zone.create_date();

    zone.set_name("Western Europe");
    assert!(zone.is_property_dirty("name"));
    repo.add_or_update(&mut zone).unwrap();
    assert!(!zone.is_dirty());

    let loaded = repo.get(zone.key()).unwrap().unwrap();
    assert_eq!(loaded.name(), "Western Europe");
    assert_eq!(loaded.create_date(), created);
    assert!(loaded.update_date() >= created);
}

#[test]
fn renaming_onto_taken_name_is_rejected_and_keeps_stored_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let catalog_key = Uuid::new_v4();
    insert_zone(&repo, catalog_key, "Europe");
    let mut asia = insert_zone(&repo, catalog_key, "Asia");

    asia.set_name("Europe");
    let err = repo.add_or_update(&mut asia).unwrap_err();
    assert!(matches!(err, RepoError::ConstraintViolation(_)));
    assert!(asia.is_property_dirty("name"));
    assert_eq!(repo.get(asia.key()).unwrap().unwrap().name(), "Asia");

    asia.set_name("Far East");
    repo.add_or_update(&mut asia).unwrap();
    assert_eq!(repo.get(asia.key()).unwrap().unwrap().name(), "Far East");
}

#[test]
fn update_keeping_own_name_is_not_a_duplicate() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let mut zone = insert_zone(&repo, Uuid::new_v4(), "Europe");

    zone.set_name("Old World");
    zone.set_name("Europe");
    zone.set_zone_code("EU");
    repo.add_or_update(&mut zone).unwrap();
    assert_eq!(repo.get(zone.key()).unwrap().unwrap().zone_code(), "EU");
}

#[test]
fn update_of_vanished_row_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let mut zone = insert_zone(&repo, Uuid::new_v4(), "Europe");
    conn.execute("DELETE FROM ship_zones;", []).unwrap();

    let stamped_at = zone.update_date();

    zone.set_name("Gone");
    let err = repo.add_or_update(&mut zone).unwrap_err();
    match err {
        RepoError::NotFound(key) => assert_eq!(key, zone.key()),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(zone.update_date(), stamped_at);
    assert_eq!(zone.dirty_properties(), vec!["name"]);
}

#[test]
fn failed_insert_with_taken_key_leaves_entity_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let catalog_key = Uuid::new_v4();
    let stored = insert_zone(&repo, catalog_key, "Europe");

    let mut clashing = ShipZone::with_key(stored.key(), catalog_key, "Asia");
    let err = repo.add_or_update(&mut clashing).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    assert_eq!(clashing.key(), stored.key());
    assert!(clashing.is_new());
    assert!(!clashing.is_dirty());
    assert_eq!(clashing.create_date(), 0);
    assert_eq!(clashing.update_date(), 0);
    assert_eq!(repo.get(stored.key()).unwrap().unwrap().name(), "Europe");
}

#[test]
fn failed_insert_of_country_with_unknown_zone_keeps_it_unkeyed() {
    let conn = open_db_in_memory().unwrap();
    let countries = SqliteShipCountryRepository::try_new(&conn).unwrap();

    let mut country = ShipCountry::in_zone(Uuid::new_v4(), Uuid::new_v4(), "NZ", Vec::new());
    let err = countries.add_or_update(&mut country).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    assert!(country.key().is_nil());
    assert!(country.is_new());
    assert_eq!(country.create_date(), 0);
    assert!(!country.is_property_dirty("key"));
    assert!(countries.get_all(&[]).unwrap().is_empty());
}

#[test]
fn delete_detaches_countries_of_the_zone() {
    let conn = open_db_in_memory().unwrap();
    let zones = SqliteShipZoneRepository::try_new(&conn).unwrap();
    let countries = SqliteShipCountryRepository::try_new(&conn).unwrap();
    let catalog_key = Uuid::new_v4();
    let zone = insert_zone(&zones, catalog_key, "North America");

    let mut country = ShipCountry::in_zone(
        catalog_key,
        zone.key(),
        "US",
        vec![Province::new("WA", "Washington")],
    );
    countries.add_or_update(&mut country).unwrap();

    assert!(zones.delete(&zone).unwrap());
    assert!(zones.get(zone.key()).unwrap().is_none());

    let kept = countries.get(country.key()).unwrap().unwrap();
    assert_eq!(kept.zone_key(), None);
    assert_eq!(kept.provinces(), country.provinces());
}

#[test]
fn delete_of_unsaved_zone_removes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteShipZoneRepository::try_new(&conn).unwrap();
    insert_zone(&repo, Uuid::new_v4(), "Europe");

    let unsaved = ShipZone::new(Uuid::new_v4(), "Draft");
    assert!(!repo.delete(&unsaved).unwrap());
    assert_eq!(repo.get_all(&[]).unwrap().len(), 1);
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteShipZoneRepository::try_new(&conn).err().unwrap();
    assert!(matches!(err, RepoError::UninitializedConnection { .. }));
}
