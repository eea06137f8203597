use shapa_core::{ColumnType, DataValue, Database, DbError, ReferenceError, SharedDatabase, TimeStamp};
use std::thread;

fn ts(millis: i64) -> TimeStamp {
    TimeStamp::from_millis(millis).unwrap()
}

#[test]
fn writers_on_several_threads_all_commit() {
    let shared = SharedDatabase::new(Database::new());
    let column = shared
        .write(|db| db.create_column("gesture", ColumnType::Text))
        .unwrap();

    let handles = (0..4)
        .map(|worker| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared
                    .write(|db| {
                        let onset = ts(worker * 1000);
                        let cell_id = db.create_cell(column, onset, onset)?;
                        let mut cell = db.get_cell(cell_id)?;
                        cell.matrix_mut()
                            .replace_arg(0, DataValue::text(format!("worker {worker}")))?;
                        db.replace_cell(&cell)?;
                        Ok(cell_id)
                    })
                    .unwrap()
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let count = shared.read(|db| db.cell_count(column)).unwrap();
    assert_eq!(count, 4);
    let first = shared
        .read(|db| {
            let ids = db.cell_ids(column)?;
            db.get_cell(ids[0])
        })
        .unwrap();
    assert_eq!(first.matrix().arg(0), Some(&DataValue::text("worker 0")));
}

#[test]
fn errors_from_the_closure_are_passed_through() {
    let shared = SharedDatabase::from(Database::new());

    let err = shared
        .read(|db| db.column(shapa_core::Id::from_raw(3)).map(|column| column.len()))
        .unwrap_err();

    assert!(matches!(
        err,
        DbError::Reference(ReferenceError::ColumnNotFound(_))
    ));
}
