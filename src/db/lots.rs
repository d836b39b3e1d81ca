use crate::domain::lot::{ConditionTriple, LotRecord};
use crate::errors::MirrorError;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use std::collections::{HashMap, HashSet};

const LOT_COLUMNS: &str = r#"
    id, image_ref, source_url, name, odometer,
    condition_title, condition_primary, condition_secondary,
    auction, scheduled_start, last_observed_at, current_bid, buy_now
"#;

fn map_lot(row: &Row<'_>) -> rusqlite::Result<LotRecord> {
    Ok(LotRecord {
        id: row.get(0)?,
        image_ref: row.get(1)?,
        source_url: row.get(2)?,
        name: row.get(3)?,
        odometer: row.get(4)?,
        condition: ConditionTriple {
            title: row.get(5)?,
            condition1: row.get(6)?,
            condition2: row.get(7)?,
        },
        auction: row.get(8)?,
        scheduled_start: row.get(9)?,
        last_observed_at: row.get(10)?,
        current_bid: row.get(11)?,
        buy_now: row.get(12)?,
    })
}

/// Every lot id currently stored.
pub fn list_lot_ids(conn: &Connection) -> Result<HashSet<i64>, MirrorError> {
    let mut stmt = conn
        .prepare("SELECT id FROM lots")
        .map_err(|e| MirrorError::Db(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| row.get::<_, i64>(0))
        .map_err(|e| MirrorError::Db(e.to_string()))?;

    let mut ids = HashSet::new();
    for r in rows {
        ids.insert(r.map_err(|e| MirrorError::Db(e.to_string()))?);
    }
    Ok(ids)
}

/// Point lookup. A missing lot is `Ok(None)`, not an error.
pub fn get_lot(conn: &Connection, id: i64) -> Result<Option<LotRecord>, MirrorError> {
    conn.query_row(
        &format!("SELECT {LOT_COLUMNS} FROM lots WHERE id = ?1"),
        params![id],
        map_lot,
    )
    .optional()
    .map_err(|e| MirrorError::Db(e.to_string()))
}

/// Inserts a lot. Fails with `DuplicateKey` if the id is already stored;
/// updates go through `replace_lot`.
pub fn insert_lot(conn: &Connection, lot: &LotRecord) -> Result<(), MirrorError> {
    let result = conn.execute(
        &format!(
            "INSERT INTO lots ({LOT_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        ),
        params![
            lot.id,
            lot.image_ref,
            lot.source_url,
            lot.name,
            lot.odometer,
            lot.condition.title,
            lot.condition.condition1,
            lot.condition.condition2,
            lot.auction,
            lot.scheduled_start,
            lot.last_observed_at,
            lot.current_bid,
            lot.buy_now,
        ],
    );

    result.map(|_| ()).map_err(|e| insert_error(e, lot.id))
}

/// Only a primary-key clash is a duplicate; other constraint failures are
/// plain database errors.
fn insert_error(e: rusqlite::Error, id: i64) -> MirrorError {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
        {
            MirrorError::DuplicateKey(id)
        }
        e => MirrorError::Db(format!("insert lot {id} failed: {e}")),
    }
}

/// Deletes a lot. Deleting an absent id is a no-op.
pub fn delete_lot(conn: &Connection, id: i64) -> Result<(), MirrorError> {
    conn.execute("DELETE FROM lots WHERE id = ?1", params![id])
        .map_err(|e| MirrorError::Db(format!("delete lot {id} failed: {e}")))?;
    Ok(())
}

/// Delete-then-insert inside one transaction, so the id is never observed
/// missing or doubled.
pub fn replace_lot(conn: &mut Connection, lot: &LotRecord) -> Result<(), MirrorError> {
    let tx = conn
        .transaction()
        .map_err(|e| MirrorError::Db(e.to_string()))?;

    delete_lot(&tx, lot.id)?;
    insert_lot(&tx, lot)?;

    tx.commit().map_err(|e| MirrorError::Db(e.to_string()))
}

/// Snapshot of every non-empty image reference, keyed by lot id.
pub fn load_image_refs(conn: &Connection) -> Result<HashMap<i64, String>, MirrorError> {
    let mut stmt = conn
        .prepare("SELECT id, image_ref FROM lots WHERE image_ref <> ''")
        .map_err(|e| MirrorError::Db(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
        .map_err(|e| MirrorError::Db(e.to_string()))?;

    let mut refs = HashMap::new();
    for r in rows {
        let (id, image_ref) = r.map_err(|e| MirrorError::Db(e.to_string()))?;
        refs.insert(id, image_ref);
    }
    Ok(refs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::{init_db, Database};
    use crate::domain::lot::tests::sample_lot;

    fn make_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        init_db(&db).unwrap();
        db
    }

    #[test]
    fn insert_then_get_round_trips_every_column() {
        let db = make_db();
        let lot = sample_lot(1001);

        db.with_conn(|conn| insert_lot(conn, &lot)).unwrap();
        let stored = db.with_conn(|conn| get_lot(conn, 1001)).unwrap();

        assert_eq!(stored, Some(lot));
    }

    #[test]
    fn get_missing_lot_is_none() {
        let db = make_db();
        assert_eq!(db.with_conn(|conn| get_lot(conn, 42)).unwrap(), None);
    }

    #[test]
    fn second_insert_is_a_duplicate_key() {
        let db = make_db();
        let lot = sample_lot(1001);

        db.with_conn(|conn| insert_lot(conn, &lot)).unwrap();
        let err = db.with_conn(|conn| insert_lot(conn, &lot)).unwrap_err();

        assert!(matches!(err, MirrorError::DuplicateKey(1001)));
    }

    #[test]
    fn other_constraint_failures_are_not_duplicates() {
        let db = make_db();

        let err = db
            .with_conn(|conn| {
                conn.execute("INSERT INTO lots (id) VALUES (5)", [])
                    .map_err(|e| insert_error(e, 5))
            })
            .unwrap_err();

        assert!(matches!(err, MirrorError::Db(_)));
        assert!(db.with_conn(|conn| list_lot_ids(conn)).unwrap().is_empty());
    }

    #[test]
    fn delete_is_idempotent() {
        let db = make_db();
        db.with_conn(|conn| insert_lot(conn, &sample_lot(7))).unwrap();

        db.with_conn(|conn| delete_lot(conn, 7)).unwrap();
        db.with_conn(|conn| delete_lot(conn, 7)).unwrap();

        assert!(db.with_conn(|conn| list_lot_ids(conn)).unwrap().is_empty());
    }

    #[test]
    fn list_ids_matches_gettable_rows() {
        let db = make_db();
        for id in [3, 1, 2] {
            db.with_conn(|conn| insert_lot(conn, &sample_lot(id))).unwrap();
        }
        db.with_conn(|conn| delete_lot(conn, 2)).unwrap();

        let ids = db.with_conn(|conn| list_lot_ids(conn)).unwrap();
        assert_eq!(ids, HashSet::from([1, 3]));
        for id in ids {
            assert!(db.with_conn(|conn| get_lot(conn, id)).unwrap().is_some());
        }
    }

    #[test]
    fn replace_keeps_a_single_row() {
        let db = make_db();
        let lot = sample_lot(1001);
        db.with_conn(|conn| insert_lot(conn, &lot)).unwrap();

        let updated = LotRecord {
            current_bid: "$600".to_string(),
            ..lot
        };
        db.with_conn(|conn| replace_lot(conn, &updated)).unwrap();

        let rows: i64 = db
            .with_conn(|conn| {
                conn.query_row("SELECT count(*) FROM lots WHERE id = 1001", [], |r| r.get(0))
                    .map_err(|e| MirrorError::Db(e.to_string()))
            })
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(
            db.with_conn(|conn| get_lot(conn, 1001)).unwrap().unwrap().current_bid,
            "$600"
        );
    }

    #[test]
    fn image_snapshot_skips_empty_refs() {
        let db = make_db();
        let with_image = sample_lot(1);
        let without_image = LotRecord {
            image_ref: String::new(),
            ..sample_lot(2)
        };
        db.with_conn(|conn| insert_lot(conn, &with_image)).unwrap();
        db.with_conn(|conn| insert_lot(conn, &without_image)).unwrap();

        let refs = db.with_conn(|conn| load_image_refs(conn)).unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs.get(&1).map(String::as_str), Some("1.png"));
    }
}
