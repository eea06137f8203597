use shapa_core::{
    ArgConstraint, ArgType, ColumnType, DataValue, Database, DbError, FormalArgument, Id,
    Predicate, ReferenceError, TimeStamp, ValidationError, VocabKind, INVALID_ID,
};
use std::collections::BTreeSet;

fn ts(millis: i64) -> TimeStamp {
    TimeStamp::from_millis(millis).unwrap()
}

/// Predicate element with one nominal argument named `target`.
fn look_predicate(db: &mut Database, name: &str) -> Id {
    let pve_id = db
        .create_vocab_element(name, VocabKind::Predicate)
        .unwrap();
    db.add_formal_argument(
        pve_id,
        0,
        FormalArgument::new("target", ArgType::Nominal).unwrap(),
    )
    .unwrap();
    pve_id
}

/// Stores `look(<target>)` in a fresh cell of a predicate column.
fn gaze_cell(db: &mut Database, pve_id: Id, target: &str) -> (Id, Id) {
    let existing = db.column_by_name("gaze").map(|column| column.id());
    let column = match existing {
        Some(column) => column,
        None => db.create_column("gaze", ColumnType::Predicate).unwrap(),
    };
    let cell_id = db.create_cell(column, ts(0), ts(500)).unwrap();

    let mut predicate = db.new_predicate(pve_id).unwrap();
    predicate
        .replace_arg(0, DataValue::nominal(target))
        .unwrap();
    let mut cell = db.get_cell(cell_id).unwrap();
    cell.matrix_mut()
        .replace_arg(0, DataValue::Predicate(predicate))
        .unwrap();
    db.replace_cell(&cell).unwrap();
    (column, cell_id)
}

fn stored_predicate(db: &Database, cell_id: Id) -> Predicate {
    match db.get_cell(cell_id).unwrap().matrix().arg_copy(0).unwrap() {
        DataValue::Predicate(predicate) => predicate,
        other => panic!("expected predicate, got {other:?}"),
    }
}

#[test]
fn predicate_cell_renders_as_call() {
    let mut db = Database::new();
    let look = look_predicate(&mut db, "look");
    let (_, cell_id) = gaze_cell(&mut db, look, "toy");

    let record = db.cell_record(&db.get_cell(cell_id).unwrap()).unwrap();

    assert_eq!(record.column, "gaze");
    assert_eq!(record.onset, ts(0));
    assert_eq!(record.offset, ts(500));
    assert_eq!(record.values, "(look(toy))");
}

#[test]
fn unknown_predicate_id_leaves_the_predicate_unchanged() {
    let mut db = Database::new();
    let look = look_predicate(&mut db, "look");
    let mut predicate = db.new_predicate(look).unwrap();
    predicate
        .replace_arg(0, DataValue::nominal("toy"))
        .unwrap();
    let before = predicate.clone();

    let err = db
        .set_predicate_id(&mut predicate, Id::from_raw(9_999), false)
        .unwrap_err();

    assert_eq!(
        err,
        DbError::Reference(ReferenceError::UnknownPredicate(Id::from_raw(9_999)))
    );
    assert_eq!(predicate, before);
}

#[test]
fn column_id_is_not_a_predicate() {
    let mut db = Database::new();
    let column = db.create_column("gaze", ColumnType::Text).unwrap();
    let vocab_id = db.column(column).unwrap().vocab_id();
    let mut predicate = Predicate::unset();

    assert!(matches!(
        db.set_predicate_id(&mut predicate, vocab_id, true),
        Err(DbError::Reference(ReferenceError::UnknownPredicate(_)))
    ));
    assert!(matches!(
        db.get_pred_ve(vocab_id),
        Err(DbError::Validation(ValidationError::KindMismatch { .. }))
    ));
    assert!(!predicate.is_set());
}

#[test]
fn rebinding_without_clearing_carries_arguments_by_position() {
    let mut db = Database::new();
    let look = look_predicate(&mut db, "look");
    let point = look_predicate(&mut db, "point");
    let mut predicate = db.new_predicate(look).unwrap();
    predicate
        .replace_arg(0, DataValue::nominal("toy"))
        .unwrap();

    db.set_predicate_id(&mut predicate, point, false).unwrap();
    assert_eq!(predicate.pve_id(), point);
    assert_eq!(predicate.arg_copy(0).unwrap(), DataValue::nominal("toy"));

    db.set_predicate_id(&mut predicate, look, true).unwrap();
    assert_eq!(predicate.pve_id(), look);
    assert_eq!(predicate.arg_copy(0).unwrap(), DataValue::Undefined);

    db.set_predicate_id(&mut predicate, INVALID_ID, false).unwrap();
    assert!(!predicate.is_set());
    assert_eq!(predicate.arity(), 0);
}

#[test]
fn predicate_edits_cascade_into_stored_values() {
    let mut db = Database::new();
    let look = look_predicate(&mut db, "look");
    let (_, cell_id) = gaze_cell(&mut db, look, "toy");

    db.add_formal_argument(look, 1, FormalArgument::new("hand", ArgType::Nominal).unwrap())
        .unwrap();

    let predicate = stored_predicate(&db, cell_id);
    assert_eq!(predicate.arity(), 2);
    assert_eq!(predicate.arg_copy(0).unwrap(), DataValue::nominal("toy"));
    assert_eq!(predicate.arg_copy(1).unwrap(), DataValue::Undefined);

    let record = db.cell_record(&db.get_cell(cell_id).unwrap()).unwrap();
    assert_eq!(record.values, "(look(toy, <hand>))");
}

#[test]
fn renaming_a_predicate_changes_records_not_ids() {
    let mut db = Database::new();
    let look = look_predicate(&mut db, "look");
    let (_, cell_id) = gaze_cell(&mut db, look, "toy");

    db.rename_vocab_element(look, "gaze_at").unwrap();

    assert_eq!(stored_predicate(&db, cell_id).pve_id(), look);
    assert_eq!(db.find_pred_ve_by_name("gaze_at").unwrap().id(), look);
    assert!(db.find_pred_ve_by_name("look").is_none());
    let record = db.cell_record(&db.get_cell(cell_id).unwrap()).unwrap();
    assert_eq!(record.values, "(gaze_at(toy))");
}

#[test]
fn deleting_a_predicate_turns_its_values_undefined() {
    let mut db = Database::new();
    let look = look_predicate(&mut db, "look");
    let point = look_predicate(&mut db, "point");
    let (_, looked) = gaze_cell(&mut db, look, "toy");
    let (_, pointed) = gaze_cell(&mut db, point, "door");

    db.delete_vocab_element(look).unwrap();

    assert_eq!(
        db.get_cell(looked).unwrap().matrix().arg(0),
        Some(&DataValue::Undefined)
    );
    assert_eq!(stored_predicate(&db, pointed).pve_id(), point);
    assert_eq!(db.get_pred_ves().len(), 1);
    assert!(!db.index().contains(look));

    let record = db.cell_record(&db.get_cell(looked).unwrap()).unwrap();
    assert_eq!(record.values, "(<val>)");
}

#[test]
fn stale_copy_referencing_a_deleted_predicate_is_rejected() {
    let mut db = Database::new();
    let look = look_predicate(&mut db, "look");
    let column = db.create_column("gaze", ColumnType::Predicate).unwrap();
    let cell_id = db.create_cell(column, ts(0), ts(10)).unwrap();
    let mut cell = db.get_cell(cell_id).unwrap();
    let predicate = db.new_predicate(look).unwrap();
    cell.matrix_mut()
        .replace_arg(0, DataValue::Predicate(predicate))
        .unwrap();

    db.delete_vocab_element(look).unwrap();

    assert!(matches!(
        db.replace_cell(&cell),
        Err(DbError::Reference(ReferenceError::UnknownPredicate(_)))
    ));
    assert_eq!(
        db.get_cell(cell_id).unwrap().matrix().arg(0),
        Some(&DataValue::Undefined)
    );
}

#[test]
fn predicate_set_constraint_limits_values_and_forgets_deleted_elements() {
    let mut db = Database::new();
    let look = look_predicate(&mut db, "look");
    let point = look_predicate(&mut db, "point");
    let column = db.create_column("gaze", ColumnType::Predicate).unwrap();
    let vocab_id = db.column(column).unwrap().vocab_id();

    db.set_formal_argument_type(
        vocab_id,
        0,
        ArgType::Predicate,
        ArgConstraint::PredicateSet {
            ids: BTreeSet::from([look]),
        },
    )
    .unwrap();

    let cell_id = db.create_cell(column, ts(0), ts(10)).unwrap();
    let mut cell = db.get_cell(cell_id).unwrap();
    let err = cell
        .matrix_mut()
        .replace_arg(0, DataValue::Predicate(db.new_predicate(point).unwrap()))
        .unwrap_err();
    assert!(matches!(err, ValidationError::ValueOutOfRange { .. }));
    cell.matrix_mut()
        .replace_arg(0, DataValue::Predicate(db.new_predicate(look).unwrap()))
        .unwrap();
    db.replace_cell(&cell).unwrap();

    db.delete_vocab_element(look).unwrap();

    let element = db.get_matrix_ve(vocab_id).unwrap();
    assert_eq!(
        element.formal_args()[0].constraint(),
        &ArgConstraint::PredicateSet {
            ids: BTreeSet::new()
        }
    );
}

#[test]
fn nested_predicates_render_and_invalidate_at_depth() {
    let mut db = Database::new();
    let toy = look_predicate(&mut db, "toy");
    let hold = db
        .create_vocab_element("hold", VocabKind::Predicate)
        .unwrap();
    db.add_formal_argument(
        hold,
        0,
        FormalArgument::new("object", ArgType::Predicate).unwrap(),
    )
    .unwrap();
    let column = db.create_column("action", ColumnType::Predicate).unwrap();
    let cell_id = db.create_cell(column, ts(0), ts(10)).unwrap();

    let mut inner = db.new_predicate(toy).unwrap();
    inner.replace_arg(0, DataValue::nominal("ball")).unwrap();
    let mut outer = db.new_predicate(hold).unwrap();
    outer.replace_arg(0, DataValue::Predicate(inner)).unwrap();
    let mut cell = db.get_cell(cell_id).unwrap();
    cell.matrix_mut()
        .replace_arg(0, DataValue::Predicate(outer))
        .unwrap();
    db.replace_cell(&cell).unwrap();

    let record = db.cell_record(&db.get_cell(cell_id).unwrap()).unwrap();
    assert_eq!(record.values, "(hold(toy(ball)))");

    db.delete_vocab_element(toy).unwrap();

    let outer = stored_predicate(&db, cell_id);
    assert_eq!(outer.pve_id(), hold);
    assert_eq!(outer.arg_copy(0).unwrap(), DataValue::Undefined);
    let record = db.cell_record(&db.get_cell(cell_id).unwrap()).unwrap();
    assert_eq!(record.values, "(hold(<object>))");
}
