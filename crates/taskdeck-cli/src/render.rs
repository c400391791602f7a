use taskdeck_core::environment::EnvironmentSummary;
use taskdeck_core::query::TaskView;

const TASK_HEADERS: [&str; 5] = ["ID", "Task", "Status", "Importance", "Environment"];

pub fn task_caption(count: usize) -> String {
    if count < 2 {
        "1 Task".to_string()
    } else {
        format!("Tasks: {}", count)
    }
}

pub fn render_task_table(tasks: &[TaskView]) -> String {
    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|task| {
            vec![
                task.id.to_string(),
                task.name.clone(),
                task.status.to_string(),
                task.importance.to_string(),
                task.environment.clone(),
            ]
        })
        .collect();
    format!("{}\n{}", task_caption(tasks.len()), render_table(&TASK_HEADERS, &rows))
}

pub fn render_environments(environments: &[EnvironmentSummary]) -> String {
    environments
        .iter()
        .map(|env| format!("Env: {}  | Tasks: {}.", env.name, env.task_count))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }
    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };
    let separator = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("-+-");

    let mut out = vec![line(headers.to_vec()), separator];
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}
