use crate::commands::{block_on, Studio};
use colored::Colorize;
use sqlmate::studio::console::{ConsoleOutput, Resolution};
use sqlmate::Error;

pub fn run(studio: &Studio) -> Result<(), Error> {
    let canvas = studio.canvas()?;
    let mut console = studio.console()?;
    let mut client = studio.client()?;

    let result = block_on(console.run_query(&canvas, &mut client));
    let resolution = studio.keep_session(client, result)?;

    if resolution == Resolution::Stale {
        return Ok(());
    }

    studio.save_console(&console)?;
    if let Some(output) = console.output() {
        print_output(output);
    }

    Ok(())
}

pub fn show_console(studio: &Studio) -> Result<(), Error> {
    match studio.console()?.output() {
        Some(output) => print_output(output),
        None => println!("Nothing ran yet, try {}.", "sqlmate run".bold()),
    }

    Ok(())
}

pub fn save(studio: &Studio, name: &str) -> Result<(), Error> {
    let mut console = studio.console()?;
    let mut client = studio.client()?;

    let result = block_on(console.save_table(name, &mut client));
    let message = studio.keep_session(client, result)?;

    println!(
        "{}",
        message.unwrap_or_else(|| format!("Saved as {}", name.trim()))
    );

    Ok(())
}

fn print_output(output: &ConsoleOutput) {
    if output.view.is_error() {
        println!("{}", output.query_text.red());
    } else {
        println!("{}", output.query_text.dimmed());
    }

    println!("{}", output.view);
}
