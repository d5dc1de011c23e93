//! The processing session: owns the task queue, runs batches one task at
//! a time, and publishes status transitions to subscribers.

use crate::application::pipeline::{prepare_media, TaskError};
use crate::config::OrchestratorConfig;
use crate::domain::tasks::{Task, TaskEvent, TaskQueue, TaskRow, TaskSpec, TaskStatus};
use crate::ports::media::AudioExtractor;
use crate::ports::processing::{ProcessRequest, ProcessingClient};
use crate::ports::tts::TtsSynthesizer;
use std::path::PathBuf;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

/// Owns the queue and the ports a batch run needs.
///
/// Shared behind an `Arc` between the HTTP handlers and the spawned
/// batch worker.
pub struct ProcessingSession<C, E, T> {
    config: OrchestratorConfig,
    client: C,
    extractor: E,
    tts: T,
    queue: Mutex<TaskQueue>,
    outputs: Mutex<Vec<PathBuf>>,
    events: broadcast::Sender<TaskEvent>,
}

impl<C, E, T> ProcessingSession<C, E, T>
where
    C: ProcessingClient,
    E: AudioExtractor,
    T: TtsSynthesizer,
{
    pub fn new(config: OrchestratorConfig, client: C, extractor: E, tts: T) -> Self {
        // Capacity of 100 events should be sufficient for now
        let (events, _) = broadcast::channel(100);
        Self {
            config,
            client,
            extractor,
            tts,
            queue: Mutex::new(TaskQueue::new()),
            outputs: Mutex::new(Vec::new()),
            events,
        }
    }

    /// Append a task and return the refreshed display rows.
    pub async fn add_task(&self, spec: TaskSpec) -> Vec<TaskRow> {
        let mut queue = self.queue.lock().await;
        let task = queue.add(spec);
        println!("Queued task '{}'", task.name);
        queue.rows()
    }

    pub async fn rows(&self) -> Vec<TaskRow> {
        self.queue.lock().await.rows()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Output files accumulated across all completed tasks
    pub async fn outputs(&self) -> Vec<PathBuf> {
        self.outputs.lock().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.events.subscribe()
    }

    /// Process every queued task strictly in order, one at a time.
    ///
    /// Emits one `TaskEvent` per task transition. Failures mark the task
    /// and move on; the batch never aborts early on error. Cancellation
    /// is honored between tasks only, an in-flight task always runs to
    /// completion. Re-running a finished queue re-runs every task.
    pub async fn run_batch(&self, cancel: CancellationToken) {
        let snapshot = self.queue.lock().await.snapshot();
        if snapshot.is_empty() {
            println!("No tasks to process.");
            return;
        }

        for (index, task) in snapshot.iter().enumerate() {
            if cancel.is_cancelled() {
                println!("Processing cancelled before task '{}'", task.name);
                break;
            }

            println!(
                "Task '{}': starting process for video and audio.",
                task.name
            );
            match self.process_task(task).await {
                Ok(output) => {
                    self.outputs.lock().await.push(output.clone());
                    println!("Task '{}': completed successfully.", task.name);
                    self.finish_task(index, &task.name, TaskStatus::Completed, Some(output))
                        .await;
                }
                Err(e) => {
                    let message = e.to_string();
                    eprintln!("Task '{}': failed. {}", task.name, message);
                    self.finish_task(index, &task.name, TaskStatus::Error(message), None)
                        .await;
                }
            }
        }
    }

    async fn process_task(&self, task: &Task) -> Result<PathBuf, TaskError> {
        let media = prepare_media(&self.config, &self.extractor, &self.tts, task).await?;

        let request = ProcessRequest {
            face: media.face,
            audio: media.audio,
            iterations: task.iterations,
            downscale_percentage: task.downscale_percentage,
            archive_folder: task.archive_folder.clone(),
        };
        println!(
            "Task '{}': sending request to processing service with payload: {:?}",
            task.name, request
        );

        let output = self.client.process(request).await?;
        println!(
            "Task '{}': processing completed. Output: {:?}",
            task.name, output
        );
        Ok(output)
    }

    async fn finish_task(
        &self,
        index: usize,
        name: &str,
        status: TaskStatus,
        output: Option<PathBuf>,
    ) {
        self.queue.lock().await.set_status(index, status.clone());
        // A send only fails when nobody is subscribed
        let _ = self.events.send(TaskEvent {
            task: name.to_string(),
            status,
            output,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::media::MockAudioExtractor;
    use crate::ports::processing::{DispatchError, MockProcessingClient};
    use crate::ports::tts::MockTtsSynthesizer;
    use std::io;
    use std::os::unix::process::ExitStatusExt;
    use std::path::Path;
    use std::process::{ExitStatus, Output};
    use tempfile::tempdir;

    fn mock_output(success: bool) -> io::Result<Output> {
        Ok(Output {
            status: if success {
                ExitStatus::from_raw(0)
            } else {
                ExitStatus::from_raw(1)
            },
            stdout: Vec::new(),
            stderr: Vec::new(),
        })
    }

    fn test_config(upload_dir: &Path) -> OrchestratorConfig {
        OrchestratorConfig {
            addr: "127.0.0.1".to_string(),
            port: "0".to_string(),
            upload_dir: upload_dir.to_str().unwrap().to_string(),
            waiting_dir: upload_dir.to_str().unwrap().to_string(),
            processing_url: "http://127.0.0.1:5000/process".to_string(),
            tts_language: "fr".to_string(),
        }
    }

    fn stage_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"media").unwrap();
        path
    }

    fn video_spec(name: &str, video: Option<PathBuf>) -> TaskSpec {
        TaskSpec {
            name: name.to_string(),
            video,
            use_video_audio: true,
            iterations: 1,
            downscale_percentage: 100,
            archive_folder: "/app/uploads".to_string(),
            ..TaskSpec::default()
        }
    }

    #[tokio::test]
    async fn test_task_without_video_errors_and_never_dispatches() {
        let uploads = tempdir().unwrap();
        let mut client = MockProcessingClient::new();
        client.expect_process().times(0);
        let extractor = MockAudioExtractor::new();
        let tts = MockTtsSynthesizer::new();

        let session = ProcessingSession::new(test_config(uploads.path()), client, extractor, tts);
        session.add_task(video_spec("t1", None)).await;
        session.run_batch(CancellationToken::new()).await;

        let rows = session.rows().await;
        assert_eq!(rows[0].status, "Error: No video file provided.");
        assert!(session.outputs().await.is_empty());
    }

    #[tokio::test]
    async fn test_extracted_audio_scenario_dispatches_expected_payload() {
        let staging = tempdir().unwrap();
        let uploads = tempdir().unwrap();
        let config = test_config(uploads.path());

        let expected_face = uploads.path().join("t1_video.mp4");
        let expected_audio = uploads.path().join("t1_extracted_audio.wav");
        let output = uploads.path().join("output_1.mp4");

        let mut client = MockProcessingClient::new();
        let face_check = expected_face.clone();
        let audio_check = expected_audio.clone();
        let output_clone = output.clone();
        client
            .expect_process()
            .withf(move |request| {
                request.face == face_check
                    && request.audio.as_deref() == Some(audio_check.as_path())
                    && request.iterations == 1
                    && request.downscale_percentage == 100
            })
            .times(1)
            .returning(move |_| {
                let output = output_clone.clone();
                Box::pin(async move { Ok(output) })
            });

        let mut extractor = MockAudioExtractor::new();
        extractor
            .expect_extract_audio()
            .times(1)
            .returning(|_, _| Box::pin(async { mock_output(true) }));
        let tts = MockTtsSynthesizer::new();

        let session = ProcessingSession::new(config, client, extractor, tts);
        let mut events = session.subscribe();

        session
            .add_task(video_spec(
                "t1",
                Some(stage_file(staging.path(), "face.mp4")),
            ))
            .await;
        session.run_batch(CancellationToken::new()).await;

        let rows = session.rows().await;
        assert_eq!(rows[0].status, "Completed");
        assert_eq!(session.outputs().await, vec![output.clone()]);

        let event = events.recv().await.unwrap();
        assert_eq!(event.task, "t1");
        assert_eq!(event.status, TaskStatus::Completed);
        assert_eq!(event.output, Some(output));
    }

    #[tokio::test]
    async fn test_rerun_dispatches_every_task_again() {
        let staging = tempdir().unwrap();
        let uploads = tempdir().unwrap();

        let mut client = MockProcessingClient::new();
        client.expect_process().times(4).returning(|_| {
            Box::pin(async { Ok(PathBuf::from("/app/uploads/output_1.mp4")) })
        });
        let mut extractor = MockAudioExtractor::new();
        extractor
            .expect_extract_audio()
            .times(4)
            .returning(|_, _| Box::pin(async { mock_output(true) }));
        let tts = MockTtsSynthesizer::new();

        let session = ProcessingSession::new(test_config(uploads.path()), client, extractor, tts);
        session
            .add_task(video_spec(
                "a",
                Some(stage_file(staging.path(), "a.mp4")),
            ))
            .await;
        session
            .add_task(video_spec(
                "b",
                Some(stage_file(staging.path(), "b.mp4")),
            ))
            .await;

        session.run_batch(CancellationToken::new()).await;
        session.run_batch(CancellationToken::new()).await;

        let rows = session.rows().await;
        assert!(rows.iter().all(|row| row.status == "Completed"));
    }

    #[tokio::test]
    async fn test_failed_task_does_not_stop_the_batch() {
        let staging = tempdir().unwrap();
        let uploads = tempdir().unwrap();

        let mut client = MockProcessingClient::new();
        let mut rejected = true;
        client.expect_process().times(2).returning(move |_| {
            if rejected {
                rejected = false;
                Box::pin(async {
                    Err(DispatchError::Rejected(
                        "Failed to extract audio from the video.".to_string(),
                    ))
                })
            } else {
                Box::pin(async { Ok(PathBuf::from("/app/uploads/output_2.mp4")) })
            }
        });
        let mut extractor = MockAudioExtractor::new();
        extractor
            .expect_extract_audio()
            .times(2)
            .returning(|_, _| Box::pin(async { mock_output(true) }));
        let tts = MockTtsSynthesizer::new();

        let session = ProcessingSession::new(test_config(uploads.path()), client, extractor, tts);
        session
            .add_task(video_spec(
                "bad",
                Some(stage_file(staging.path(), "bad.mp4")),
            ))
            .await;
        session
            .add_task(video_spec(
                "good",
                Some(stage_file(staging.path(), "good.mp4")),
            ))
            .await;
        session.run_batch(CancellationToken::new()).await;

        let rows = session.rows().await;
        assert_eq!(
            rows[0].status,
            "Error: Failed to extract audio from the video."
        );
        assert_eq!(rows[1].status, "Completed");
    }

    #[tokio::test]
    async fn test_cancelled_batch_processes_nothing() {
        let staging = tempdir().unwrap();
        let uploads = tempdir().unwrap();

        let mut client = MockProcessingClient::new();
        client.expect_process().times(0);
        let extractor = MockAudioExtractor::new();
        let tts = MockTtsSynthesizer::new();

        let session = ProcessingSession::new(test_config(uploads.path()), client, extractor, tts);
        session
            .add_task(video_spec(
                "t1",
                Some(stage_file(staging.path(), "face.mp4")),
            ))
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        session.run_batch(cancel).await;

        assert_eq!(session.rows().await[0].status, "Pending");
    }

    #[tokio::test]
    async fn test_empty_queue_emits_no_events() {
        let uploads = tempdir().unwrap();
        let mut client = MockProcessingClient::new();
        client.expect_process().times(0);
        let extractor = MockAudioExtractor::new();
        let tts = MockTtsSynthesizer::new();

        let session = ProcessingSession::new(test_config(uploads.path()), client, extractor, tts);
        let mut events = session.subscribe();
        session.run_batch(CancellationToken::new()).await;

        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
