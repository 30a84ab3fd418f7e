use crate::args::CanvasCommand;
use crate::commands::Studio;
use colored::Colorize;
use sqlmate::studio::canvas::{Canvas, TableId};
use sqlmate::studio::serializer::effective_limit;
use sqlmate::{Error, ValidationError};

pub fn edit(studio: &Studio, command: CanvasCommand) -> Result<(), Error> {
    let mut canvas = studio.canvas()?;

    match command {
        CanvasCommand::Show => {
            print_canvas(&canvas);
            return Ok(());
        }
        CanvasCommand::Add { table } => {
            let catalog = studio.catalog()?;
            let schema_table = catalog
                .table(&table)
                .ok_or_else(|| ValidationError::UnknownTable(table.clone()))?;

            canvas.drop_table(schema_table);
        }
        CanvasCommand::Remove { table } => {
            canvas.remove_table(&TableId::for_table(&table))?;
        }
        CanvasCommand::Clear => canvas = Canvas::default(),
        CanvasCommand::AddColumn { table, column } => {
            canvas.add_column(&TableId::for_table(&table), &column)?;
        }
        CanvasCommand::RemoveColumn { table, column } => {
            let table_id = TableId::for_table(&table);
            let column_id = canvas.column_id_by_name(&table_id, &column)?;

            canvas.remove_column(&table_id, &column_id)?;
        }
        CanvasCommand::Alias {
            table,
            column,
            alias,
        } => {
            let table_id = TableId::for_table(&table);
            let column_id = canvas.column_id_by_name(&table_id, &column)?;

            canvas.set_alias(&table_id, &column_id, alias.as_deref().unwrap_or_default().trim())?;
        }
        CanvasCommand::Filter {
            table,
            column,
            operator,
            value,
        } => {
            let table_id = TableId::for_table(&table);
            let column_id = canvas.column_id_by_name(&table_id, &column)?;

            canvas.set_constraint_operator(&table_id, &column_id, operator)?;
            canvas.set_constraint_value(&table_id, &column_id, value.as_deref().unwrap_or_default())?;
        }
        CanvasCommand::GroupBy { table, column, off } => {
            let table_id = TableId::for_table(&table);
            let column_id = canvas.column_id_by_name(&table_id, &column)?;

            canvas.set_group_by(&table_id, &column_id, !off)?;
        }
        CanvasCommand::Aggregate {
            table,
            column,
            function,
        } => {
            let table_id = TableId::for_table(&table);
            let column_id = canvas.column_id_by_name(&table_id, &column)?;

            canvas.set_aggregate(&table_id, &column_id, function)?;

            if function.is_some() && !canvas.has_group_by() {
                eprintln!(
                    "{}: nothing is grouped yet, the server may ignore the aggregation",
                    "warning".yellow()
                );
            }
        }
        CanvasCommand::Sort {
            table,
            column,
            order,
        } => {
            let table_id = TableId::for_table(&table);
            let column_id = canvas.column_id_by_name(&table_id, &column)?;

            match order {
                Some(order) => canvas.set_order_by(&table_id, &column_id, order)?,
                None => {
                    let order = canvas.cycle_order_by(&table_id, &column_id)?;
                    println!("{table}.{column} is now sorted {order}");
                }
            }
        }
        CanvasCommand::Up { position } => move_directive(&mut canvas, position, true),
        CanvasCommand::Down { position } => move_directive(&mut canvas, position, false),
    }

    studio.save_canvas(&canvas)?;
    print_canvas(&canvas);

    Ok(())
}

pub fn set_limit(studio: &Studio, input: &str) -> Result<(), Error> {
    let mut canvas = studio.canvas()?;

    canvas.set_limit_input(input);
    studio.save_canvas(&canvas)?;

    match canvas.limit() {
        Some(limit) => println!("Limit: {}", effective_limit(Some(limit.into()))),
        None => println!("No limit set, at most {} rows are returned", effective_limit(None)),
    }

    Ok(())
}

fn move_directive(canvas: &mut Canvas, position: usize, up: bool) {
    let Some(index) = position.checked_sub(1) else {
        return;
    };

    let moved = if up {
        canvas.move_directive_up(index)
    } else {
        canvas.move_directive_down(index)
    };

    if !moved {
        eprintln!("{}: nothing to move at position {position}", "warning".yellow());
    }
}

fn print_canvas(canvas: &Canvas) {
    if canvas.is_empty() {
        println!("The canvas is empty, add a table with {}.", "sqlmate canvas add <table>".bold());
        return;
    }

    for table in canvas.tables() {
        println!("{}", table.name.to_string().bold());

        for column in table.columns() {
            let mut details = Vec::new();
            if !column.alias().is_empty() {
                details.push(format!("as {}", column.alias()));
            }
            if let Some(operator) = column.constraint.operator {
                details.push(format!("where {operator} '{}'", column.constraint.value));
            }
            if column.group_by {
                details.push("group by".to_string());
            }
            if let Some(aggregate) = column.aggregate {
                details.push(aggregate.to_string());
            }
            if let Some(direction) = column.order_by().direction() {
                details.push(format!("sort {direction}"));
            }

            println!(
                "  {} {}{}",
                column.name,
                column.column_type.dimmed(),
                if details.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", details.join(", "))
                }
            );
        }

        let available: Vec<_> = table.available_columns().map(|c| c.name.to_string()).collect();
        if !available.is_empty() {
            println!("  {} {}", "not selected:".dimmed(), available.join(", "));
        }
    }

    if !canvas.order_priority().is_empty() {
        println!("{}", "Sort priority".bold());
        for (position, directive) in canvas.order_priority().iter().enumerate() {
            println!("  {}. {directive}", position + 1);
        }
    }

    if let Some(limit) = canvas.limit() {
        println!("{} {limit}", "Limit".bold());
    }
}
