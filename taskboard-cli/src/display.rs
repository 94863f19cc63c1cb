//! Board rendering for table, JSON and YAML output

use crate::cli::OutputFormat;
use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;
use taskboard_kanban::{BoardSnapshot, Lane, Task};

#[derive(Serialize)]
struct TaskRow<'a> {
    lane: Lane,
    position: usize,
    #[serde(flatten)]
    task: &'a Task,
}

fn rows(snapshot: &BoardSnapshot, only: Option<Lane>) -> Vec<TaskRow<'_>> {
    snapshot
        .iter()
        .filter(|(lane, _)| only.is_none_or(|only| only == *lane))
        .flat_map(|(lane, tasks)| {
            tasks.iter().enumerate().map(move |(position, task)| TaskRow {
                lane,
                position,
                task,
            })
        })
        .collect()
}

/// Print the board, or a single lane of it
pub fn print_board(snapshot: &BoardSnapshot, only: Option<Lane>, format: OutputFormat) -> Result<()> {
    let rows = rows(snapshot, only);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&rows)?),
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No tasks");
            } else {
                println!("{}", board_table(&rows));
            }
        }
    }
    Ok(())
}

fn board_table(rows: &[TaskRow<'_>]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Lane", "#", "ID", "Title", "Key", "Completed"]);
    for row in rows {
        let completed = row
            .task
            .done_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            row.lane.to_string(),
            row.position.to_string(),
            row.task.id.to_string(),
            row.task.title.clone(),
            row.task.key().to_string(),
            completed,
        ]);
    }
    table
}

/// Print a single task
pub fn print_task(task: &Task, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(task)?),
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(task)?),
        OutputFormat::Table => println!("{}", task.id),
    }
    Ok(())
}
