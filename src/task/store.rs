//! Task storage - JSON file persistence
//!
//! The whole table lives in one JSON document together with the id counter.
//! Every mutation runs load -> modify -> save while holding both an
//! in-process mutex and an exclusive lock on a sidecar `.lock` file, so
//! concurrent writers (threads or processes) are serialized and cannot lose
//! each other's updates. Saves replace the file atomically.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::error::{Result, StoreError};
use super::model::{NewTask, Task, TaskId, TaskStatus};
use crate::clock::{Clock, SystemClock};
use crate::reminder::scanner::{self, ScanReport};

/// On-disk document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    /// Next id to hand out. Only ever grows.
    #[serde(default = "first_id")]
    next_id: u64,
    tasks: Vec<Task>,
}

fn first_id() -> u64 {
    1
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            tasks: Vec::new(),
        }
    }
}

impl StoreDocument {
    /// Keep the counter ahead of every stored id, whatever the file said.
    fn normalize(mut self) -> Self {
        let floor = self
            .tasks
            .iter()
            .map(|t| t.id.get())
            .max()
            .map_or(1, |max| max.saturating_add(1));
        self.next_id = self.next_id.max(floor);
        self
    }
}

/// Decode the store file. Documents written by older versions were a bare
/// array of rows; the error kept is the one for the shape the file has, so
/// it still names the offending row and field.
fn decode_document(content: &str) -> serde_json::Result<(StoreDocument, bool)> {
    if content.trim_start().starts_with('[') {
        let tasks: Vec<Task> = serde_json::from_str(content)?;
        let doc = StoreDocument {
            next_id: first_id(),
            tasks,
        };
        return Ok((doc, true));
    }
    serde_json::from_str(content).map(|doc| (doc, false))
}

/// Why `load` fell back to an empty snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task store {} could not be read, showing no tasks: {}",
            self.path.display(),
            self.reason
        )
    }
}

/// Full in-memory copy of the table at one point in time
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub warning: Option<LoadWarning>,
}

impl Snapshot {
    pub fn listing(&self, filter: Option<TaskStatus>) -> TaskListing {
        if self.tasks.is_empty() {
            return TaskListing::Empty;
        }
        let matched: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| filter.is_none_or(|status| t.status == status))
            .cloned()
            .collect();
        if matched.is_empty() {
            TaskListing::NoMatches
        } else {
            TaskListing::Tasks(matched)
        }
    }
}

/// Result of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskListing {
    /// The store holds no tasks at all
    Empty,
    /// The store has tasks but none match the filter
    NoMatches,
    Tasks(Vec<Task>),
}

impl TaskListing {
    pub fn tasks(&self) -> &[Task] {
        match self {
            Self::Tasks(tasks) => tasks,
            Self::Empty | Self::NoMatches => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompleteOutcome {
    Updated,
    AlreadyCompleted,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Held for the duration of one read-modify-write cycle.
/// Dropping the file handle releases the advisory lock.
struct WriteLock {
    _file: File,
}

pub struct TaskStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    writer: Mutex<()>,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty store file if none exists. Never touches an existing one.
    pub fn ensure_initialized(&self) -> Result<()> {
        self.mutate(|doc, exists| {
            if exists {
                (false, ())
            } else {
                debug!("Initializing empty task store");
                *doc = StoreDocument::default();
                (true, ())
            }
        })
    }

    /// Current snapshot. Missing storage is an empty snapshot; unreadable or
    /// corrupted storage is an empty snapshot carrying a warning.
    pub fn load(&self) -> Snapshot {
        match self.read_document() {
            Ok((doc, _)) => Snapshot {
                tasks: doc.tasks,
                warning: None,
            },
            Err(e) => {
                warn!("Degrading to empty task list: {}", e);
                Snapshot {
                    tasks: Vec::new(),
                    warning: Some(LoadWarning {
                        path: self.path.clone(),
                        reason: e.to_string(),
                    }),
                }
            }
        }
    }

    /// Overwrite the whole table with `tasks`.
    ///
    /// The id counter is kept and only moves forward, so ids of rows dropped
    /// here are never handed out again.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        self.mutate(|doc, _| {
            doc.tasks = tasks.to_vec();
            *doc = std::mem::take(doc).normalize();
            (true, ())
        })
    }

    /// Append a new pending task and return its id.
    pub fn add(&self, new: NewTask) -> Result<TaskId> {
        self.insert(new).map(|task| task.id)
    }

    /// Like [`TaskStore::add`], returning the stored row.
    pub fn insert(&self, new: NewTask) -> Result<Task> {
        let now = self.clock.now();
        let task = self.try_mutate(|doc, _| {
            let id = TaskId(doc.next_id);
            doc.next_id = doc
                .next_id
                .checked_add(1)
                .ok_or(StoreError::IdsExhausted)?;
            let task = Task::new(id, new, now);
            if let Err(e) = task.due_at() {
                warn!(
                    "Task {} due '{} {}' is not a valid date/time, it will not be scanned: {}",
                    id, task.due_date, task.due_time, e
                );
            }
            doc.tasks.push(task.clone());
            Ok((true, task))
        })?;
        info!("Added task {}", task.id);
        Ok(task)
    }

    pub fn list(&self, filter: Option<TaskStatus>) -> TaskListing {
        self.load().listing(filter)
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.load().tasks.into_iter().find(|t| t.id == id)
    }

    pub fn complete(&self, id: TaskId) -> Result<CompleteOutcome> {
        let outcome = self.mutate(|doc, _| {
            let Some(task) = doc.tasks.iter_mut().find(|t| t.id == id) else {
                return (false, CompleteOutcome::NotFound);
            };
            if task.complete() {
                (true, CompleteOutcome::Updated)
            } else {
                (false, CompleteOutcome::AlreadyCompleted)
            }
        })?;
        debug!("Complete task {}: {:?}", id, outcome);
        Ok(outcome)
    }

    pub fn delete(&self, id: TaskId) -> Result<DeleteOutcome> {
        let outcome = self.mutate(|doc, _| {
            let before = doc.tasks.len();
            doc.tasks.retain(|t| t.id != id);
            if doc.tasks.len() < before {
                (true, DeleteOutcome::Deleted)
            } else {
                (false, DeleteOutcome::NotFound)
            }
        })?;
        debug!("Delete task {}: {:?}", id, outcome);
        Ok(outcome)
    }

    /// Pending tasks due within `horizon` of `now`, overdue ones included.
    /// A store that could not be read yields an empty report that carries
    /// the load warning.
    pub fn get_upcoming(&self, now: NaiveDateTime, horizon: Duration) -> ScanReport {
        let snapshot = self.load();
        let mut report = scanner::scan(&snapshot.tasks, now, horizon);
        report.warning = snapshot.warning;
        report
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StoreDocument, bool) -> (bool, T)) -> Result<T> {
        self.try_mutate(|doc, exists| Ok(f(doc, exists)))
    }

    /// Run one serialized read-modify-write cycle. `f` gets the current
    /// document and whether the file existed, and returns whether the
    /// document must be written back.
    fn try_mutate<T>(
        &self,
        f: impl FnOnce(&mut StoreDocument, bool) -> Result<(bool, T)>,
    ) -> Result<T> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = self.lock_file()?;

        let (mut doc, exists) = self.read_document()?;
        let (dirty, value) = f(&mut doc, exists)?;
        if dirty {
            self.write_document(&doc)?;
        }
        Ok(value)
    }

    fn lock_file(&self) -> Result<WriteLock> {
        let lock_path = sibling(&self.path, ".lock");
        let lock_err = |source| StoreError::Lock {
            path: lock_path.clone(),
            source,
        };

        if let Some(dir) = parent_dir(&self.path) {
            fs::create_dir_all(dir).map_err(lock_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(lock_err)?;
        fs2::FileExt::lock_exclusive(&file).map_err(lock_err)?;
        Ok(WriteLock { _file: file })
    }

    fn read_document(&self) -> Result<(StoreDocument, bool)> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok((StoreDocument::default(), false));
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if content.trim().is_empty() {
            return Ok((StoreDocument::default(), true));
        }

        let (doc, legacy) =
            decode_document(&content).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        if legacy {
            debug!("Reading legacy task array from {}", self.path.display());
        }
        Ok((doc.normalize(), true))
    }

    /// Write to a temp file next to the store, then rename over it.
    fn write_document(&self, doc: &StoreDocument) -> Result<()> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = parent_dir(&self.path).unwrap_or(Path::new("."));
        fs::create_dir_all(dir).map_err(write_err)?;

        if self.path.exists() {
            let backup_path = sibling(&self.path, ".bak");
            if let Err(e) = fs::copy(&self.path, &backup_path) {
                warn!("Failed to create backup: {}", e);
            }
        }

        let content = serde_json::to_string_pretty(doc)?;
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// `todos.json` -> `todos.json.lock`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::NaiveDate;
    use tempfile::{tempdir, TempDir};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn setup() -> (TempDir, TaskStore) {
        let temp = tempdir().unwrap();
        let store = TaskStore::with_clock(
            temp.path().join("todos.json"),
            Arc::new(ManualClock::new(now())),
        );
        (temp, store)
    }

    fn new_task(title: &str) -> NewTask {
        NewTask::new(title, "", "2026-05-05", "10:00")
    }

    #[test]
    fn test_ensure_initialized_is_idempotent() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        store.ensure_initialized()?;
        assert!(store.path().exists());

        store.add(new_task("keep me"))?;
        store.ensure_initialized()?;

        assert_eq!(store.load().tasks.len(), 1);
        Ok(())
    }

    #[test]
    fn test_load_missing_file_is_empty_without_warning() {
        let (_temp, store) = setup();
        let snapshot = store.load();
        assert!(snapshot.tasks.is_empty());
        assert!(snapshot.warning.is_none());
    }

    #[test]
    fn test_load_whitespace_only_file() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        fs::write(store.path(), "  \n\t ")?;
        let snapshot = store.load();
        assert!(snapshot.tasks.is_empty());
        assert!(snapshot.warning.is_none());
        Ok(())
    }

    #[test]
    fn test_load_corrupted_file_warns() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        fs::write(store.path(), "{ not json")?;

        let snapshot = store.load();
        assert!(snapshot.tasks.is_empty());
        let warning = snapshot.warning.expect("corruption must be surfaced");
        assert_eq!(warning.path, store.path());
        Ok(())
    }

    #[test]
    fn test_load_warning_names_bad_field() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        fs::write(
            store.path(),
            r#"{"next_id": 3, "tasks": [{"id": 1, "title": "ok", "due_date": "2026-05-05",
                "due_time": "10:00", "status": "pending", "created_at": "2026-01-01 00:00:00"},
                {"id": 2, "title": "bad", "due_date": "2026-05-05",
                "status": "pending", "created_at": "2026-01-01 00:00:00"}]}"#,
        )?;
        let warning = store.load().warning.expect("bad row must be surfaced");
        assert!(warning.reason.contains("due_time"), "{}", warning.reason);

        fs::write(
            store.path(),
            r#"[{"id": 1, "title": "old", "due_date": "2026-05-05", "due_time": "10:00",
                "status": "archived", "created_at": "2026-01-01 00:00:00"}]"#,
        )?;
        let warning = store.load().warning.expect("bad legacy row must be surfaced");
        assert!(warning.reason.contains("archived"), "{}", warning.reason);
        Ok(())
    }

    #[test]
    fn test_get_upcoming_on_corrupted_file_carries_warning() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        fs::write(store.path(), "{ not json")?;

        let report = store.get_upcoming(now(), Duration::hours(24));
        assert!(report.is_empty());
        let warning = report.warning.expect("corruption must reach the scan");
        assert_eq!(warning.path, store.path());
        Ok(())
    }

    #[test]
    fn test_mutation_refuses_to_overwrite_corrupted_file() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        fs::write(store.path(), "{ not json")?;

        let result = store.add(new_task("lost?"));
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
        assert_eq!(fs::read_to_string(store.path())?, "{ not json");
        Ok(())
    }

    #[test]
    fn test_add_assigns_sequential_ids() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        let ids: Vec<u64> = (0..3)
            .map(|i| store.add(new_task(&format!("task {i}"))).map(TaskId::get))
            .collect::<Result<_>>()?;
        assert_eq!(ids, vec![1, 2, 3]);
        Ok(())
    }

    #[test]
    fn test_add_sets_pending_and_created_at() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        let id = store.add(NewTask::new("Dentist", "checkup", "2026-05-06", "14:30"))?;

        let task = store.get(id).expect("task stored");
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, "2026-05-04 12:00:00");
        assert_eq!(task.description, "checkup");
        Ok(())
    }

    #[test]
    fn test_add_keeps_unparseable_due_values() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        let id = store.add(NewTask::new("Someday", "", "next week", "noon"))?;
        assert_eq!(store.get(id).map(|t| t.due_date), Some("next week".into()));
        Ok(())
    }

    #[test]
    fn test_ids_not_reused_after_delete() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        store.add(new_task("one"))?;
        let two = store.add(new_task("two"))?;
        store.add(new_task("three"))?;

        assert_eq!(store.delete(two)?, DeleteOutcome::Deleted);
        // A row-count scheme would hand out 3 again here.
        let four = store.add(new_task("four"))?;
        assert_eq!(four, TaskId(4));

        let ids: Vec<u64> = store.load().tasks.iter().map(|t| t.id.get()).collect();
        assert_eq!(ids, vec![1, 3, 4]);
        Ok(())
    }

    #[test]
    fn test_ids_not_reused_after_deleting_last() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        store.add(new_task("one"))?;
        let two = store.add(new_task("two"))?;
        store.delete(two)?;
        assert_eq!(store.add(new_task("three"))?, TaskId(3));
        Ok(())
    }

    #[test]
    fn test_complete_outcomes() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        let id = store.add(new_task("finish"))?;

        assert_eq!(store.complete(id)?, CompleteOutcome::Updated);
        assert_eq!(store.complete(id)?, CompleteOutcome::AlreadyCompleted);
        assert_eq!(store.complete(TaskId(99))?, CompleteOutcome::NotFound);
        assert_eq!(store.get(id).map(|t| t.status), Some(TaskStatus::Completed));
        Ok(())
    }

    #[test]
    fn test_delete_outcomes() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        let id = store.add(new_task("drop"))?;

        assert_eq!(store.delete(id)?, DeleteOutcome::Deleted);
        assert_eq!(store.delete(id)?, DeleteOutcome::NotFound);
        assert_eq!(store.complete(id)?, CompleteOutcome::NotFound);
        assert!(store.get(id).is_none());
        Ok(())
    }

    #[test]
    fn test_list_distinguishes_empty_and_no_matches() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        assert_eq!(store.list(None), TaskListing::Empty);
        assert_eq!(store.list(Some(TaskStatus::Completed)), TaskListing::Empty);

        store.add(new_task("open"))?;
        assert_eq!(store.list(Some(TaskStatus::Completed)), TaskListing::NoMatches);
        assert_eq!(store.list(Some(TaskStatus::Pending)).tasks().len(), 1);
        assert_eq!(store.list(None).tasks().len(), 1);
        Ok(())
    }

    #[test]
    fn test_save_overwrites_and_keeps_counter() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        store.add(new_task("one"))?;
        store.add(new_task("two"))?;

        let kept: Vec<Task> = store
            .load()
            .tasks
            .into_iter()
            .filter(|t| t.id == TaskId(1))
            .collect();
        store.save(&kept)?;

        assert_eq!(store.load().tasks.len(), 1);
        assert_eq!(store.add(new_task("three"))?, TaskId(3));
        Ok(())
    }

    #[test]
    fn test_save_creates_backup() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        store.add(new_task("first"))?;
        store.add(new_task("second"))?;

        let backup = fs::read_to_string(sibling(store.path(), ".bak"))?;
        assert!(backup.contains("first"));
        assert!(!backup.contains("second"));
        Ok(())
    }

    #[test]
    fn test_legacy_array_document() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        fs::write(
            store.path(),
            r#"[{"id": 5, "title": "old", "description": "", "due_date": "2026-05-05",
                "due_time": "10:00", "status": "pending", "created_at": "2026-01-01 00:00:00"}]"#,
        )?;

        assert_eq!(store.load().tasks.len(), 1);
        assert_eq!(store.add(new_task("new"))?, TaskId(6));
        Ok(())
    }

    #[test]
    fn test_counter_behind_rows_is_repaired() -> anyhow::Result<()> {
        let (_temp, store) = setup();
        fs::write(
            store.path(),
            r#"{"next_id": 1, "tasks": [{"id": 2, "title": "x", "due_date": "2026-05-05",
                "due_time": "10:00", "status": "completed", "created_at": "2026-01-01 00:00:00"}]}"#,
        )?;
        assert_eq!(store.add(new_task("y"))?, TaskId(3));
        Ok(())
    }

    #[test]
    fn test_sibling_paths() {
        assert_eq!(
            sibling(Path::new("/data/todos.json"), ".lock"),
            PathBuf::from("/data/todos.json.lock")
        );
    }
}
