use std::fs;

use chrono::Utc;
use tarefa_core::filter::FilterMode;
use tarefa_core::session::record_completed_focus;
use tarefa_core::store::TaskStore;
use tarefa_core::task::{FOCUS_TASK_CATEGORY, Task};
use tempfile::tempdir;

#[test]
fn store_roundtrip_and_filtering() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    assert!(store.load().is_empty());

    let now = Utc::now();
    let mut tasks = vec![
        Task::new("estudar rust".to_string(), now, store.next_id(&[])),
        Task::new("fazer compras".to_string(), now, 2),
    ];
    tasks[1].done = true;
    tasks[1].category = Some("casa".to_string());

    store.save_all(&tasks).expect("save tasks");

    let loaded = store.load();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].title, "estudar rust");
    assert_eq!(loaded[0].pomodoros, 1);

    let done: Vec<u64> = FilterMode::Done.apply(&loaded).iter().map(|t| t.id).collect();
    let todo: Vec<u64> = FilterMode::Todo.apply(&loaded).iter().map(|t| t.id).collect();
    assert_eq!(done, vec![2]);
    assert_eq!(todo, vec![1]);
    assert_eq!(FilterMode::All.apply(&loaded).len(), 2);
}

#[test]
fn toggle_twice_restores_the_original_state() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    let now = Utc::now();
    let task = Task::new("treinar".to_string(), now, 1);
    let original_done = task.done;
    store.save_all(&[task]).expect("save");

    for _ in 0..2 {
        let mut tasks = store.load();
        let task = tasks.iter_mut().find(|t| t.id == 1).expect("task 1");
        task.done = !task.done;
        store.save_all(&tasks).expect("save toggle");
    }

    assert_eq!(store.load()[0].done, original_done);
}

#[test]
fn deleting_a_missing_id_leaves_the_collection_unchanged() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    let now = Utc::now();
    store
        .save_all(&[Task::new("ler".to_string(), now, 1)])
        .expect("save");

    let mut tasks = store.load();
    tasks.retain(|t| t.id != 42);
    store.save_all(&tasks).expect("save");

    let loaded = store.load();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, 1);
}

#[test]
fn append_preserves_existing_records() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    let now = Utc::now();
    store
        .save_all(&[Task::new("primeira".to_string(), now, 1)])
        .expect("save");

    store
        .append_task(Task::new("segunda".to_string(), now, 2))
        .expect("append");

    let loaded = store.load();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].title, "primeira");
    assert_eq!(loaded[1].title, "segunda");
}

#[test]
fn corrupt_file_recovers_as_an_empty_collection() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    fs::write(&store.tasks_path, "isto não é json {{{").expect("write garbage");

    assert!(store.try_load().is_err());
    assert!(store.load().is_empty());

    // The next save rewrites the file wholesale.
    let now = Utc::now();
    store
        .save_all(&[Task::new("recomeçar".to_string(), now, 1)])
        .expect("save over garbage");
    assert_eq!(store.load().len(), 1);
}

#[test]
fn stored_pomodoro_counts_come_back_positive() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    // A collection written by an older build, pomodoros all over the place.
    fs::write(
        &store.tasks_path,
        r#"[
            {"uuid":"550e8400-e29b-41d4-a716-446655440000","id":1,"title":"a",
             "pomodoros":0,"entry":"2024-01-01T00:00:00Z","modified":"2024-01-01T00:00:00Z"},
            {"uuid":"550e8400-e29b-41d4-a716-446655440001","id":2,"title":"b",
             "pomodoros":-2,"entry":"2024-01-01T00:00:00Z","modified":"2024-01-01T00:00:00Z"},
            {"uuid":"550e8400-e29b-41d4-a716-446655440002","id":3,"title":"c",
             "entry":"2024-01-01T00:00:00Z","modified":"2024-01-01T00:00:00Z"}
        ]"#,
    )
    .expect("write legacy collection");

    let loaded = store.load();
    assert_eq!(loaded.len(), 3);
    assert!(loaded.iter().all(|t| t.pomodoros >= 1));
}

#[test]
fn a_finished_focus_session_lands_as_a_done_task() {
    let temp = tempdir().expect("tempdir");
    let store = TaskStore::open(temp.path()).expect("open store");

    let now = Utc::now();
    store
        .save_all(&[Task::new("projeto".to_string(), now, 1)])
        .expect("save");

    let id = record_completed_focus(&store, now).expect("record focus");
    assert_eq!(id, 2);

    let loaded = store.load();
    assert_eq!(loaded.len(), 2);
    let recorded = &loaded[1];
    assert_eq!(recorded.category.as_deref(), Some(FOCUS_TASK_CATEGORY));
    assert!(recorded.done);
    assert_eq!(recorded.title, "Pomodoro concluído");
}
