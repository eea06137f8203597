//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `shapa_core` linkage.
//! - Build a tiny in-memory project and print its records deterministically.
//!
//! Set `SHAPA_LOG_DIR` to an absolute path to capture core log events.

use log::info;
use shapa_core::{
    core_version, default_log_level, init_logging, ArgType, ColumnType, DataValue, Database,
    DbResult, FormalArgument, TimeStamp, VocabKind,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Ok(log_dir) = std::env::var("SHAPA_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("shapa_cli logging disabled: {err}");
        }
    }

    println!("shapa_core version={}", core_version());
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("shapa_cli error code={} error={err}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn run() -> DbResult<()> {
    let mut db = Database::new();

    let look = db.create_vocab_element("look", VocabKind::Predicate)?;
    db.add_formal_argument(look, 0, FormalArgument::new("target", ArgType::Nominal)?)?;

    let gesture = db.create_column("gesture", ColumnType::Text)?;
    let gaze = db.create_column("gaze", ColumnType::Predicate)?;

    let cell_id = db.create_cell(
        gesture,
        TimeStamp::from_millis(1_000)?,
        TimeStamp::from_millis(2_000)?,
    )?;
    let mut cell = db.get_cell(cell_id)?;
    cell.matrix_mut().replace_arg(0, DataValue::text("point"))?;
    db.replace_cell(&cell)?;

    let cell_id = db.create_cell(
        gaze,
        TimeStamp::from_millis(1_500)?,
        TimeStamp::from_millis(1_800)?,
    )?;
    let mut predicate = db.new_predicate(look)?;
    predicate.replace_arg(0, DataValue::nominal("toy"))?;
    let mut cell = db.get_cell(cell_id)?;
    cell.matrix_mut()
        .replace_arg(0, DataValue::Predicate(predicate))?;
    db.replace_cell(&cell)?;

    let mut records = Vec::new();
    db.for_each_column(|column, _| {
        for cell in column.cells() {
            records.push(db.cell_record(cell));
        }
    })?;
    for record in records {
        let record = record?;
        println!(
            "{} {} {} {}",
            record.column, record.onset, record.offset, record.values
        );
    }

    info!("event=cli_demo module=cli status=ok columns={}", db.columns().count());
    Ok(())
}
