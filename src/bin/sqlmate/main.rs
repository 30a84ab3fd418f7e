mod args;
mod commands;

use crate::args::Command;
use crate::commands::Studio;
use args::Args;
use clap::Parser;
use colored::Colorize;
use sqlmate::studio::structure::SchemaCatalog;
use sqlmate::{Error, ErrorKind};
use std::process::exit;

fn main() {
    env_logger::init();

    let args = Args::parse();

    if let Err(error) = run(args.command) {
        report(&error);
        exit(1);
    }
}

fn run(command: Command) -> Result<(), Error> {
    let studio = Studio::open()?;

    match command {
        Command::Register { username, email } => commands::auth::register(&studio, &username, &email),
        Command::Login { username } => commands::auth::login(&studio, &username),
        Command::Logout => commands::auth::logout(&studio),
        Command::Whoami => commands::auth::whoami(&studio),
        Command::DeleteAccount { yes } => commands::auth::delete_account(&studio, yes),
        Command::Schema => list_schema(&studio.catalog()?),
        Command::Canvas(command) => commands::canvas::edit(&studio, command),
        Command::Limit { value } => commands::canvas::set_limit(&studio, value.as_deref().unwrap_or_default()),
        Command::Run => commands::query::run(&studio),
        Command::Console => commands::query::show_console(&studio),
        Command::Save { name } => commands::query::save(&studio, &name),
        Command::Tables => commands::tables::list(&studio),
        Command::Show { name } => commands::tables::show(&studio, &name),
        Command::Export { name, output } => commands::tables::export(&studio, name.as_deref(), output),
        Command::Delete { names, yes } => commands::tables::delete(&studio, &names, yes),
        Command::Update {
            table,
            set,
            conditions,
        } => commands::tables::update(&studio, &table, set, conditions),
    }
}

fn list_schema(catalog: &SchemaCatalog) -> Result<(), Error> {
    for table in catalog.tables() {
        println!("{}", table.name.to_string().bold());

        for column in &table.columns {
            println!("  {column}");
        }
    }

    Ok(())
}

fn report(error: &Error) {
    eprintln!("{intro}: {error}", intro = "error".bold().red());

    if matches!(error.kind(), ErrorKind::Unauthorized | ErrorKind::NotLoggedIn) {
        eprintln!("Log in with {}.", "sqlmate login <username>".bold());
    }
}
