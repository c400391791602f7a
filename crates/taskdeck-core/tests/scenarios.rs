use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use taskdeck_core::config::create_config;
use taskdeck_core::environment::switch_environment;
use taskdeck_core::query::{filter_tasks, sort_tasks, Scope, SortKey, StatusFilter, TaskView};
use taskdeck_core::repository::{create_task, update_task_field, TaskField};
use taskdeck_core::task::TaskStatus;
use taskdeck_core::workspace::Workspace;

fn setup() -> (TempDir, Workspace) {
    let temp = TempDir::new().expect("tempdir");
    let storage = temp.path().join("data");
    fs::create_dir_all(&storage).expect("storage");
    let config = temp.path().join("taskdeck.ini");
    create_config(&config, &storage, Some("vim")).expect("config");
    let ws = Workspace::open(&config).expect("open");
    (temp, ws)
}

fn views(ws: &Workspace, scope: Scope, completed: bool, deleted: bool) -> Vec<TaskView> {
    let db = ws.store().expect("store").load().expect("load");
    filter_tasks(
        &db,
        ws.current_environment(),
        scope,
        StatusFilter {
            include_completed: completed,
            include_deleted: deleted,
        },
    )
}

#[test]
fn ids_increase_by_one_from_one() {
    let (_temp, mut ws) = setup();
    let mut ids = Vec::new();
    for (idx, env) in ["default", "work", "default", "home", "work"].iter().enumerate() {
        switch_environment(&mut ws, env).expect("switch");
        ids.push(create_task(&ws, &format!("task {}", idx), None, None).expect("create"));
    }
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn buy_milk_scenario() {
    let (_temp, ws) = setup();
    create_task(&ws, "Buy milk", Some(3), None).expect("create");

    let listed = views(&ws, Scope::All, false, false);
    assert_eq!(
        listed,
        vec![TaskView {
            id: 1,
            name: "Buy milk".to_string(),
            importance: 3,
            status: TaskStatus::Pending,
            environment: "default".to_string(),
        }]
    );

    let json = serde_json::to_value(&listed[0]).expect("json");
    assert_eq!(json["status"], "Pending");

    assert!(update_task_field(&ws, 1, TaskField::Status(TaskStatus::Complete)).expect("complete"));
    assert!(views(&ws, Scope::Current, false, false).is_empty());
    let with_completed = views(&ws, Scope::Current, true, false);
    assert_eq!(with_completed.len(), 1);
    assert_eq!(with_completed[0].status, TaskStatus::Complete);
}

#[test]
fn deleted_tasks_only_show_when_requested() {
    let (_temp, ws) = setup();
    create_task(&ws, "Keep", None, None).expect("create");
    create_task(&ws, "Drop", None, None).expect("create");
    update_task_field(&ws, 2, TaskField::Status(TaskStatus::Deleted)).expect("delete");

    let hidden = views(&ws, Scope::All, false, false);
    assert!(hidden.iter().all(|view| view.id != 2));

    let shown = views(&ws, Scope::All, false, true);
    assert!(shown.iter().any(|view| view.id == 2));

    // Deletion never removes the note or the row.
    let db_text = fs::read_to_string(ws.store().expect("store").db_path()).expect("db");
    assert!(db_text.contains("\"Drop\""));
    assert!(ws.store().expect("store").note_path(2).exists());
}

#[test]
fn unknown_id_update_leaves_database_untouched() {
    let (_temp, ws) = setup();
    create_task(&ws, "Only", None, None).expect("create");
    let db_path = ws.store().expect("store").db_path();
    let before = fs::read(&db_path).expect("read");

    let updated = update_task_field(&ws, 999, TaskField::Name("X".to_string())).expect("update");
    assert!(!updated);
    assert_eq!(fs::read(&db_path).expect("read"), before);
}

#[test]
fn fresh_environment_lists_empty() {
    let (_temp, mut ws) = setup();
    create_task(&ws, "Elsewhere", None, None).expect("create");
    switch_environment(&mut ws, "brand-new").expect("switch");
    assert!(views(&ws, Scope::Current, true, true).is_empty());
}

#[test]
fn sorting_orders_hold_over_mixed_data() {
    let (_temp, mut ws) = setup();
    for (name, importance) in [("a", 2), ("b", 9), ("c", 5), ("d", 9), ("e", 1)] {
        create_task(&ws, name, Some(importance), None).expect("create");
    }
    switch_environment(&mut ws, "other").expect("switch");
    create_task(&ws, "f", Some(7), None).expect("create");

    let all = views(&ws, Scope::All, true, true);

    let by_importance = sort_tasks(all.clone(), SortKey::Importance);
    assert!(by_importance
        .windows(2)
        .all(|pair| pair[0].importance >= pair[1].importance));

    let by_id = sort_tasks(by_importance, SortKey::Id);
    assert!(by_id.windows(2).all(|pair| pair[0].id <= pair[1].id));
}

#[test]
fn load_then_save_is_a_no_op() {
    let (_temp, mut ws) = setup();
    create_task(&ws, "One", Some(2), Some("note")).expect("create");
    switch_environment(&mut ws, "second").expect("switch");
    create_task(&ws, "Two", None, None).expect("create");

    let store = ws.store().expect("store");
    let before = fs::read(store.db_path()).expect("read");
    let db = store.load().expect("load");
    store.save(&db).expect("save");
    assert_eq!(fs::read(store.db_path()).expect("read"), before);
}
