use crate::commands::{perform, Studio};
use colored::Colorize;
use dialoguer::Confirm;
use sqlmate::studio::display::{DisplayTable, QueryResult, ResultView};
use sqlmate::studio::export::convert_to_csv;
use sqlmate::studio::update::{SetRow, UpdateForm, WhereRow};
use sqlmate::{deserialize_result, Action, Error, InternalError};
use std::fs;
use std::path::PathBuf;

pub fn list(studio: &Studio) -> Result<(), Error> {
    let mut client = studio.client()?;
    let mut console = studio.console()?;
    let result = perform(&mut console, Action::FetchTables, client.get_tables());
    let Some(tables) = studio.keep_session(client, result)? else {
        return Ok(());
    };

    if tables.is_empty() {
        println!("No saved tables yet, save one with {}.", "sqlmate save <name>".bold());
        return Ok(());
    }

    for table in tables {
        println!(
            "{} {}",
            table.table_name.bold(),
            table.created_at.unwrap_or_default().dimmed()
        );
    }

    Ok(())
}

pub fn show(studio: &Studio, name: &str) -> Result<(), Error> {
    let view = fetch(studio, name)?.map_or(ResultView::NoResults, |data| deserialize_result(&data));

    println!("{view}");

    Ok(())
}

/// Tables without rows still export their header.
pub fn export(studio: &Studio, name: Option<&str>, output: Option<PathBuf>) -> Result<(), Error> {
    let table = match name {
        Some(name) => {
            let data = fetch(studio, name)?
                .ok_or_else(|| InternalError(format!("{name} did not arrive in time")))?;

            match deserialize_result(&data) {
                ResultView::Error(error) => return Err(InternalError(error).into()),
                _ if data.columns.is_empty() => {
                    return Err(InternalError(format!("{name} has no columns to export")).into())
                }
                _ => DisplayTable::from(&data),
            }
        }
        None => {
            let console = studio.console()?;
            let view = console
                .output()
                .map(|output| &output.view)
                .ok_or_else(|| InternalError("Nothing ran yet, there is nothing to export".to_string()))?;

            match view {
                ResultView::Table(table) => table.clone(),
                ResultView::NoResults => {
                    return Err(InternalError("The last run returned no rows".to_string()).into())
                }
                ResultView::Error(error) => return Err(InternalError(error.clone()).into()),
            }
        }
    };

    let csv = convert_to_csv(&table);

    match output {
        Some(path) => {
            fs::write(&path, csv)?;
            println!("Exported {} rows to {}", table.rows.len(), path.display());
        }
        None => println!("{csv}"),
    }

    Ok(())
}

pub fn delete(studio: &Studio, names: &[String], skip_confirmation: bool) -> Result<(), Error> {
    let confirmed = skip_confirmation
        || Confirm::new()
            .with_prompt(format!("Delete {}?", names.join(", ")))
            .default(false)
            .interact()?;

    if !confirmed {
        println!("Nothing deleted.");
        return Ok(());
    }

    let mut client = studio.client()?;
    let mut console = studio.console()?;
    let result = perform(&mut console, Action::DeleteTables, client.delete_tables(names));
    let deleted = studio.keep_session(client, result)?.unwrap_or_default();

    for name in deleted {
        println!("Deleted {}", name.bold());
    }

    Ok(())
}

pub fn update(
    studio: &Studio,
    table: &str,
    set: Vec<SetRow>,
    conditions: Vec<WhereRow>,
) -> Result<(), Error> {
    let form = UpdateForm {
        table: table.to_string(),
        set,
        conditions,
    };
    let request = form.into_request()?;

    let mut client = studio.client()?;
    let mut console = studio.console()?;
    let result = perform(&mut console, Action::UpdateTable, client.update_table(&request));
    let Some(update) = studio.keep_session(client, result)? else {
        return Ok(());
    };

    if !update.success {
        let message = update.message.unwrap_or_else(|| "Update failed".to_string());
        return Err(InternalError(message).into());
    }

    let summary = format!(
        "Updated {} row{}.",
        update.rows_affected,
        if update.rows_affected == 1 { "" } else { "s" }
    );

    match update.message {
        Some(message) => println!("{message} {summary}"),
        None => println!("{summary}"),
    }

    Ok(())
}

/// `None` when the data came back after it was given up on.
fn fetch(studio: &Studio, name: &str) -> Result<Option<QueryResult>, Error> {
    let mut client = studio.client()?;
    let mut console = studio.console()?;
    let result = perform(&mut console, Action::FetchTableData, client.get_table_data(name));

    studio.keep_session(client, result)
}
