use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Processing state of a queued task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Completed,
    Error(String),
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "Pending"),
            TaskStatus::Completed => write!(f, "Completed"),
            TaskStatus::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

/// A single user-submitted unit of work: one face video paired with an
/// audio source and processing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    /// Staged upload; a task without one fails at preparation time
    pub video: Option<PathBuf>,
    pub tts_text: String,
    pub use_video_audio: bool,
    pub audio: Option<PathBuf>,
    pub iterations: u32,
    pub archive_folder: String,
    pub downscale_percentage: u32,
    pub status: TaskStatus,
}

/// Task fields as submitted by the form, before defaulting
#[derive(Debug, Clone, Default)]
pub struct TaskSpec {
    pub name: String,
    pub video: Option<PathBuf>,
    pub tts_text: String,
    pub use_video_audio: bool,
    pub audio: Option<PathBuf>,
    pub iterations: u32,
    pub archive_folder: String,
    pub downscale_percentage: u32,
}

/// One row of the task table shown in the UI
#[derive(Debug, Clone, Serialize)]
pub struct TaskRow {
    pub name: String,
    pub status: String,
}

/// Status transition published while a batch runs.
/// Exactly one event is emitted per task transition.
#[derive(Debug, Clone, Serialize)]
pub struct TaskEvent {
    pub task: String,
    pub status: TaskStatus,
    pub output: Option<PathBuf>,
}

/// Ordered task list; insertion order is processing order
#[derive(Debug, Default)]
pub struct TaskQueue {
    tasks: Vec<Task>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Append a task, defaulting a blank name to `Task_{n}`.
    /// Iterations and downscale are clamped to their valid ranges.
    pub fn add(&mut self, spec: TaskSpec) -> &Task {
        let name = if spec.name.trim().is_empty() {
            format!("Task_{}", self.tasks.len() + 1)
        } else {
            spec.name
        };

        self.tasks.push(Task {
            name,
            video: spec.video,
            tts_text: spec.tts_text,
            use_video_audio: spec.use_video_audio,
            audio: spec.audio,
            iterations: spec.iterations.max(1),
            archive_folder: spec.archive_folder,
            downscale_percentage: spec.downscale_percentage.clamp(10, 100),
            status: TaskStatus::Pending,
        });
        self.tasks.last().unwrap()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Clone the current task list for a batch run. Tasks appended
    /// afterwards keep their indexes stable (append-only).
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    pub fn set_status(&mut self, index: usize, status: TaskStatus) {
        if let Some(task) = self.tasks.get_mut(index) {
            task.status = status;
        }
    }

    /// (name, status) projection for the display table
    pub fn rows(&self) -> Vec<TaskRow> {
        self.tasks
            .iter()
            .map(|task| TaskRow {
                name: task.name.clone(),
                status: task.status.to_string(),
            })
            .collect()
    }
}

/// Make a task name safe to embed in artifact filenames
pub fn sanitize_name(name: &str) -> String {
    let re = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
    re.replace_all(name, "_").into_owned()
}
