use std::fmt::Write;

use taskboard_client::{Board, Priority, Task};

const ID_WIDTH: usize = 8;

fn short_id(task: &Task) -> &str {
    if task.is_temp() {
        return "pending";
    }
    task.id.get(..ID_WIDTH).unwrap_or(&task.id)
}

fn priority_label(p: Priority) -> &'static str {
    match p {
        Priority::Low => "Low",
        Priority::Medium => "Medium",
        Priority::High => "High",
    }
}

pub fn task_line(position: usize, task: &Task, board: &Board) -> String {
    let mark = if task.is_completed() { "x" } else { " " };
    let mut line = format!(
        "{position:>3}. [{mark}] {:<40} {:<6} {}",
        task.title,
        priority_label(task.priority),
        short_id(task)
    );
    if board.is_deleting(&task.id) {
        line.push_str("  (deleting)");
    } else if board.is_updating(&task.id) {
        line.push_str("  (saving)");
    }
    line
}

pub fn summary_line(board: &Board) -> String {
    let s = board.summary();
    format!(
        "{}/{} completed ({}%), {} remaining",
        s.completed, s.total, s.percent, s.remaining
    )
}

pub fn board(board: &Board) -> String {
    let mut out = String::new();
    if board.tasks().is_empty() {
        out.push_str("No tasks yet. Add one with `taskboard add <title>`.\n");
        return out;
    }
    for (i, task) in board.tasks().iter().enumerate() {
        let _ = writeln!(out, "{}", task_line(i + 1, task, board));
        if !task.description.is_empty() {
            let _ = writeln!(out, "       {}", task.description);
        }
    }
    let _ = writeln!(out, "\n{}", summary_line(board));
    out
}
