use movietable_client::client::DEFAULT_SCAN_RANGE;
use movietable_client::{
    ClientError, Item, LoadSummary, MovieClient, MovieKey, MovieRecord, MovieUpdate, ScanPage,
    ScanPages, TableCreation, TableStore, YearRange,
};
use rust_decimal::Decimal;
use tokio::runtime::Runtime;

use crate::commands::Command;

/// Structured result from executing a command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Mutation succeeded (SEED).
    Ok(String),
    /// CREATE TABLE outcome.
    Table(TableCreation),
    /// LOAD finished.
    Loaded(LoadSummary),
    /// Attributes confirmed by an UPDATE.
    Updated { key: MovieKey, attributes: Item },
    /// Single movie (GET).
    Record(MovieRecord),
    /// One page of a SCAN, emitted as soon as it arrives.
    Page(ScanPage),
    /// SCAN finished.
    ScanDone { pages: usize, records: usize },
    /// Movies of one year (QUERY).
    Movies { year: i64, records: Vec<MovieRecord> },
}

/// Execute a command, passing each result to `emit` as it is produced.
pub fn execute<S: TableStore>(
    client: &MovieClient<S>,
    rt: &Runtime,
    cmd: Command,
    emit: &mut dyn FnMut(CommandResult),
) -> Result<(), ClientError> {
    match cmd {
        Command::CreateTable => emit(CommandResult::Table(rt.block_on(client.create_table())?)),
        Command::Seed => exec_seed(client, rt, emit)?,
        Command::Load { file } => emit(CommandResult::Loaded(rt.block_on(client.bulk_load(file))?)),
        Command::Update {
            year,
            title,
            rating,
            plot,
            actors,
        } => exec_update(
            client,
            rt,
            MovieKey::new(year, title),
            MovieUpdate::new(rating, plot, actors),
            emit,
        )?,
        Command::Scan { from, to } => exec_scan(client.read_range(YearRange::new(from, to)), rt, emit)?,
        Command::Query { year } => exec_query(client, rt, year, emit)?,
        Command::Get { year, title } => {
            let record = rt.block_on(client.get_record(&MovieKey::new(year, title)))?;
            emit(CommandResult::Record(record));
        }
        Command::Demo => exec_demo(client, rt, emit)?,
    }
    Ok(())
}

fn exec_seed<S: TableStore>(
    client: &MovieClient<S>,
    rt: &Runtime,
    emit: &mut dyn FnMut(CommandResult),
) -> Result<(), ClientError> {
    rt.block_on(client.seed())?;
    emit(CommandResult::Ok("Seeded sample movies.".to_string()));
    Ok(())
}

fn exec_update<S: TableStore>(
    client: &MovieClient<S>,
    rt: &Runtime,
    key: MovieKey,
    update: MovieUpdate,
    emit: &mut dyn FnMut(CommandResult),
) -> Result<(), ClientError> {
    let attributes = rt.block_on(client.update_record(&key, &update))?;
    emit(CommandResult::Updated { key, attributes });
    Ok(())
}

fn exec_scan<S: TableStore + ?Sized>(
    mut pages: ScanPages<'_, S>,
    rt: &Runtime,
    emit: &mut dyn FnMut(CommandResult),
) -> Result<(), ClientError> {
    let mut records = 0;
    while let Some(page) = rt.block_on(pages.next_page())? {
        records += page.records.len();
        emit(CommandResult::Page(page));
    }
    emit(CommandResult::ScanDone {
        pages: pages.pages_read(),
        records,
    });
    Ok(())
}

fn exec_query<S: TableStore>(
    client: &MovieClient<S>,
    rt: &Runtime,
    year: i64,
    emit: &mut dyn FnMut(CommandResult),
) -> Result<(), ClientError> {
    let records = rt.block_on(client.query_by_year(year))?;
    emit(CommandResult::Movies { year, records });
    Ok(())
}

/// Seed, update, scan and query in sequence, as a walkthrough of the table.
fn exec_demo<S: TableStore>(
    client: &MovieClient<S>,
    rt: &Runtime,
    emit: &mut dyn FnMut(CommandResult),
) -> Result<(), ClientError> {
    exec_seed(client, rt, emit)?;
    exec_update(
        client,
        rt,
        MovieKey::new(2000, "Example 5"),
        MovieUpdate::new(Decimal::from(5), "blah goes to away", "Dustin Hoffman"),
        emit,
    )?;
    exec_scan(client.read_range(DEFAULT_SCAN_RANGE), rt, emit)?;
    exec_query(client, rt, 1990, emit)
}
