use quake_core::db::migrations::latest_version;
use quake_core::db::open_db_in_memory;
use quake_core::{
    Earthquake, EarthquakeRepository, ListQuery, Persistable, RepoError, SqliteEarthquakeRepository,
    SqliteStore,
};
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashSet;

#[test]
fn save_assigns_id_and_get_roundtrips() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEarthquakeRepository::try_new(&conn).unwrap();

    let mut quake = Earthquake::with_fields(9.5, "Chile", 1960);
    assert_eq!(quake.id(), None);

    let id = repo.save_earthquake(&mut quake).unwrap();
    assert_eq!(quake.id(), Some(id));
    assert!(quake.is_persisted());

    let loaded = repo.get_earthquake(id).unwrap().unwrap();
    assert_eq!(loaded, quake);
    assert_eq!(loaded.to_dict()["id"], id);
}

#[test]
fn saved_ids_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEarthquakeRepository::try_new(&conn).unwrap();

    let ids: HashSet<_> = (0..5)
        .map(|offset| {
            let mut quake = Earthquake::with_fields(5.0, "Somewhere", 2000 + offset);
            repo.save_earthquake(&mut quake).unwrap()
        })
        .collect();
    assert_eq!(ids.len(), 5);
}

#[test]
fn resave_updates_in_place_and_keeps_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEarthquakeRepository::try_new(&conn).unwrap();

    let mut quake = Earthquake::new().with_location("Sumatra");
    let id = repo.save_earthquake(&mut quake).unwrap();

    quake.magnitude = Some(9.1);
    quake.year = Some(2004);
    assert_eq!(repo.save_earthquake(&mut quake).unwrap(), id);

    let loaded = repo.get_earthquake(id).unwrap().unwrap();
    assert_eq!(loaded.magnitude, Some(9.1));
    assert_eq!(loaded.year, Some(2004));
    assert_eq!(repo.store().count::<Earthquake>().unwrap(), 1);
}

#[test]
fn unset_fields_persist_as_null() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEarthquakeRepository::try_new(&conn).unwrap();

    let mut quake = Earthquake::new();
    let id = repo.save_earthquake(&mut quake).unwrap();

    let loaded = repo.get_earthquake(id).unwrap().unwrap();
    assert_eq!(loaded.magnitude, None);
    assert_eq!(loaded.location, None);
    assert_eq!(loaded.year, None);
}

#[test]
fn resaving_deleted_record_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEarthquakeRepository::try_new(&conn).unwrap();

    let mut quake = Earthquake::with_fields(7.0, "Haiti", 2010);
    let id = repo.save_earthquake(&mut quake).unwrap();
    repo.delete_earthquake(id).unwrap();

    let err = repo.save_earthquake(&mut quake).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn delete_removes_row_and_reports_missing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEarthquakeRepository::try_new(&conn).unwrap();

    let mut quake = Earthquake::with_fields(6.3, "L'Aquila", 2009);
    let id = repo.save_earthquake(&mut quake).unwrap();

    repo.delete_earthquake(id).unwrap();
    assert!(repo.get_earthquake(id).unwrap().is_none());

    let err = repo.delete_earthquake(id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(missing) if missing == id));
}

#[test]
fn min_magnitude_filters_and_skips_unset() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEarthquakeRepository::try_new(&conn).unwrap();

    let mut strong = Earthquake::with_fields(9.5, "Chile", 1960);
    let mut medium = Earthquake::with_fields(7.0, "Haiti", 2010);
    let mut exact = Earthquake::with_fields(8.0, "Mexico City", 1985);
    let mut unknown = Earthquake::new().with_location("Unknown");
    for quake in [&mut strong, &mut medium, &mut exact, &mut unknown] {
        repo.save_earthquake(quake).unwrap();
    }

    let result = repo.earthquakes_with_min_magnitude(8.0).unwrap();
    let locations = result
        .iter()
        .map(|quake| quake.location.as_deref().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(locations, ["Chile", "Mexico City"]);

    assert!(repo.earthquakes_with_min_magnitude(10.0).unwrap().is_empty());
}

#[test]
fn list_pagination_with_limit_and_offset_is_ordered_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEarthquakeRepository::try_new(&conn).unwrap();

    let mut ids = Vec::new();
    for year in [1906, 1960, 1964] {
        let mut quake = Earthquake::new().with_year(year);
        ids.push(repo.save_earthquake(&mut quake).unwrap());
    }

    let page = repo
        .list_earthquakes(&ListQuery {
            limit: Some(1),
            offset: 1,
        })
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id(), Some(ids[1]));

    let tail = repo
        .list_earthquakes(&ListQuery {
            limit: None,
            offset: 1,
        })
        .unwrap();
    assert_eq!(
        tail.iter().map(Earthquake::id).collect::<Vec<_>>(),
        vec![Some(ids[1]), Some(ids[2])]
    );

    assert_eq!(repo.list_earthquakes(&ListQuery::default()).unwrap().len(), 3);
}

#[test]
fn save_all_assigns_ids_after_commit() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let mut quakes = vec![
        Earthquake::with_fields(9.5, "Chile", 1960),
        Earthquake::with_fields(9.2, "Alaska", 1964),
    ];
    let ids = store.save_all(&mut quakes).unwrap();

    assert_eq!(ids.len(), 2);
    assert_eq!(quakes[0].id(), Some(ids[0]));
    assert_eq!(quakes[1].id(), Some(ids[1]));
    assert_eq!(store.count::<Earthquake>().unwrap(), 2);
}

#[test]
fn failed_save_all_rolls_back_and_assigns_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let mut stale = Earthquake::with_fields(7.8, "Nepal", 2015);
    let stale_id = store.save(&mut stale).unwrap();
    store.delete::<Earthquake>(stale_id).unwrap();

    let mut batch = vec![Earthquake::with_fields(9.0, "Tohoku", 2011), stale];
    let err = store.save_all(&mut batch).unwrap_err();

    assert!(matches!(err, RepoError::NotFound(id) if id == stale_id));
    assert_eq!(batch[0].id(), None);
    assert_eq!(store.count::<Earthquake>().unwrap(), 0);
}

#[test]
fn corrupt_column_type_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    conn.execute(
        "INSERT INTO earthquakes (magnitude, location, year) VALUES ('strong', 'Lisbon', 1755);",
        [],
    )
    .unwrap();

    let err = store.list::<Earthquake>(&ListQuery::default()).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteStore::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        }) => {
            assert_eq!(expected_version, latest_version());
            assert_eq!(actual_version, 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
    assert!(SqliteEarthquakeRepository::try_new(&conn).is_err());
}

#[test]
fn generic_store_dispatches_on_persistable_types() {
    fn save_generic<T: Persistable>(store: &SqliteStore<'_>, record: &mut T) -> i64 {
        store.save(record).unwrap()
    }

    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let mut quake = Earthquake::with_fields(8.8, "Maule", 2010);
    let id = save_generic(&store, &mut quake);
    assert_eq!(store.get::<Earthquake>(id).unwrap(), Some(quake));
}

#[test]
fn decoded_record_with_foreign_id_is_saved_as_new_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEarthquakeRepository::try_new(&conn).unwrap();

    let mut original = Earthquake::with_fields(9.5, "Chile", 1960);
    let original_id = repo.save_earthquake(&mut original).unwrap();

    let mut decoded: Earthquake = serde_json::from_value(json!({
        "id": original_id,
        "magnitude": 1.0,
        "location": "Elsewhere",
        "year": 2000
    }))
    .unwrap();
    assert_eq!(decoded.id(), None);

    let decoded_id = repo.save_earthquake(&mut decoded).unwrap();
    assert_ne!(decoded_id, original_id);
    assert_eq!(repo.get_earthquake(original_id).unwrap(), Some(original));
    assert_eq!(repo.store().count::<Earthquake>().unwrap(), 2);
}

#[test]
fn save_all_updates_saved_records_and_inserts_new_ones() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteStore::try_new(&conn).unwrap();

    let mut existing = Earthquake::with_fields(9.0, "Tohoku", 2011);
    let existing_id = store.save(&mut existing).unwrap();
    existing.magnitude = Some(9.1);

    let mut batch = vec![existing, Earthquake::with_fields(7.8, "Nepal", 2015)];
    let ids = store.save_all(&mut batch).unwrap();

    assert_eq!(ids[0], existing_id);
    assert_eq!(batch[0].id(), Some(existing_id));
    assert_eq!(batch[1].id(), Some(ids[1]));
    assert_ne!(ids[1], existing_id);

    let reloaded = store.get::<Earthquake>(existing_id).unwrap().unwrap();
    assert_eq!(reloaded.magnitude, Some(9.1));
    assert_eq!(store.count::<Earthquake>().unwrap(), 2);
}
