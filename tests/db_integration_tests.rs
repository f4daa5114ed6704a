//! Integration tests for the database layer.
//!
//! These tests verify the document store using in-memory and on-disk SQLite databases.

use love_quests::db::Database;
use love_quests::error::{ApiError, ErrorCode};
use love_quests::types::{NewReward, NewTask, RewardKind, Task, TaskKind, UserProgress};
use tempfile::TempDir;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn new_task(id: Option<&str>, title: &str) -> NewTask {
    NewTask {
        id: id.map(str::to_string),
        title: title.to_string(),
        description: "Do it with a smile".to_string(),
        kind: TaskKind::Daily,
        duration_days: 2,
        points: 20,
    }
}

fn stored_task(db: &Database, id: &str) -> Option<Task> {
    db.list_tasks().unwrap().into_iter().find(|t| t.id == id)
}

fn api_code(err: anyhow::Error) -> ErrorCode {
    ApiError::from(err).code
}

mod catalog_tests {
    use super::*;

    #[test]
    fn empty_store_has_empty_catalog() {
        let db = setup_db();
        assert!(db.list_tasks().unwrap().is_empty());
        assert!(db.list_rewards().unwrap().is_empty());
    }

    #[test]
    fn create_task_generates_id_when_absent() {
        let db = setup_db();
        let task = db.create_task(&new_task(None, "Morning text")).unwrap();
        assert!(task.id.starts_with('t'));
        assert_eq!(stored_task(&db, &task.id), Some(task));
    }

    #[test]
    fn generated_ids_do_not_collide() {
        let db = setup_db();
        let a = db.create_task(&new_task(None, "A")).unwrap();
        let b = db.create_task(&new_task(None, "B")).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(db.list_tasks().unwrap().len(), 2);
    }

    #[test]
    fn tasks_list_in_creation_order() {
        let db = setup_db();
        db.create_task(&new_task(Some("t2"), "Second id, first in")).unwrap();
        db.create_task(&new_task(Some("t1"), "First id, second in")).unwrap();
        let ids: Vec<_> = db.list_tasks().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["t2", "t1"]);
    }

    #[test]
    fn duplicate_task_id_is_rejected() {
        let db = setup_db();
        db.create_task(&new_task(Some("t7"), "Original")).unwrap();
        let err = db.create_task(&new_task(Some("t7"), "Copy")).unwrap_err();
        assert_eq!(api_code(err), ErrorCode::AlreadyExists);
        assert_eq!(stored_task(&db, "t7").unwrap().title, "Original");
        assert_eq!(db.list_tasks().unwrap().len(), 1);
    }

    #[test]
    fn invalid_task_creates_nothing() {
        let db = setup_db();
        let mut input = new_task(None, "Zero-day streak");
        input.duration_days = 0;
        let err = db.create_task(&input).unwrap_err();
        assert_eq!(api_code(err), ErrorCode::InvalidFieldValue);
        assert!(db.list_tasks().unwrap().is_empty());
    }

    #[test]
    fn rewards_round_trip_kind() {
        let db = setup_db();
        let reward = db
            .create_reward(&NewReward {
                id: Some("r9".into()),
                title: "Story night".into(),
                kind: RewardKind::GeneratedStory,
                content: "A tale about a lost umbrella".into(),
                cost: 150,
            })
            .unwrap();
        assert_eq!(reward.id, "r9");
        let stored = db.list_rewards().unwrap().remove(0);
        assert_eq!(stored.kind, RewardKind::GeneratedStory);
        assert_eq!(stored.cost, 150);
    }
}

mod user_tests {
    use super::*;

    #[test]
    fn unknown_user_is_none() {
        let db = setup_db();
        assert_eq!(db.get_user("nobody").unwrap(), None);
    }

    #[test]
    fn upsert_replaces_whole_document() {
        let db = setup_db();
        let mut full = UserProgress::new("aisha");
        full.points = 70;
        full.completed_tasks.insert("t2".into());
        full.unlocked_rewards.insert("r1".into());
        full.daily_progress.entry("t5".into()).or_default().current_progress = 1;
        db.upsert_user(&full).unwrap();

        let mut slim = UserProgress::new("aisha");
        slim.points = 3;
        db.upsert_user(&slim).unwrap();

        assert_eq!(db.get_user("aisha").unwrap(), Some(slim));
    }

    #[test]
    fn corrupt_progress_column_fails_the_read() {
        let db = setup_db();
        let mut p = UserProgress::new("aisha");
        p.points = 90;
        p.completed_tasks.insert("t2".into());
        db.upsert_user(&p).unwrap();

        for column in ["completed_tasks", "unlocked_rewards", "daily_progress"] {
            db.upsert_user(&p).unwrap();
            db.with_conn(|conn| {
                let sql = format!("UPDATE users SET {} = '{{oops' WHERE name = 'aisha'", column);
                conn.execute(&sql, [])?;
                Ok(())
            })
            .unwrap();
            assert!(db.get_user("aisha").is_err(), "{} should not read as empty", column);
        }
    }

    #[test]
    fn users_are_independent() {
        let db = setup_db();
        let mut a = UserProgress::new("a");
        a.points = 1;
        let mut b = UserProgress::new("b");
        b.points = 2;
        db.upsert_user(&a).unwrap();
        db.upsert_user(&b).unwrap();
        assert_eq!(db.get_user("a").unwrap().unwrap().points, 1);
        assert_eq!(db.get_user("b").unwrap().unwrap().points, 2);
    }

    #[test]
    fn data_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("quests.db");
        {
            let db = Database::open(&path).unwrap();
            let mut p = UserProgress::new("aisha");
            p.points = 42;
            db.upsert_user(&p).unwrap();
            db.create_task(&new_task(Some("t1"), "Persisted")).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.get_user("aisha").unwrap().unwrap().points, 42);
        assert_eq!(db.list_tasks().unwrap().len(), 1);
    }
}
