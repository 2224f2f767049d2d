use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::app::model::{Prompt, PromptKind};
use crate::app::{App, Message, Model, ToastLevel};
use crate::editor::EditorBuffer;
use crate::remote::RemoteSync;
use crate::session::{RemoteJob, RemoteOp, RemoteOutcome, UploadOutcome};

/// Runs remote calls off the UI thread and hands the outcomes back.
///
/// Each call gets its own thread; the event loop polls [`RemoteWorker::try_take`].
pub(super) struct RemoteWorker {
    remote: Arc<dyn RemoteSync + Send + Sync>,
    tx: Sender<RemoteOutcome>,
    rx: Receiver<RemoteOutcome>,
}

impl RemoteWorker {
    pub(super) fn new(remote: Arc<dyn RemoteSync + Send + Sync>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { remote, tx, rx }
    }

    fn spawn(&self, job: RemoteJob) {
        let remote = Arc::clone(&self.remote);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let op = job.op();
            // The receiver is gone only when the app has quit
            if tx.send(job.run(&*remote)).is_err() {
                tracing::debug!(?op, "remote result dropped after shutdown");
            }
        });
    }

    /// A finished call, if any.
    pub(super) fn try_take(&self) -> Option<RemoteOutcome> {
        self.rx.try_recv().ok()
    }
}

impl App {
    pub(super) fn handle_message_side_effects(
        &self,
        model: &mut Model,
        worker: &RemoteWorker,
        msg: &Message,
    ) {
        match msg {
            Message::PromptSubmit => {
                if let Some(Prompt {
                    kind: PromptKind::Upload,
                    input,
                }) = &model.prompt
                {
                    let path = PathBuf::from(input.trim());
                    Self::upload(model, &path);
                }
            }
            Message::Download => self.download(model),
            Message::SaveRemote => Self::start_remote(model, worker, RemoteOp::Save),
            Message::LoadRemote => Self::start_remote(model, worker, RemoteOp::Load),
            _ => {}
        }
    }

    /// Apply a finished remote call to the model.
    pub(super) fn finish_remote(model: &mut Model, outcome: RemoteOutcome) {
        let saved = matches!(outcome, RemoteOutcome::Saved);
        let notice = model.session.finish_remote(outcome);
        if saved {
            model.session.edit(EditorBuffer::mark_clean);
        }
        model.ensure_cursor_visible();
        model.show_notice(notice);
    }

    fn upload(model: &mut Model, path: &std::path::Path) {
        match model.session.handle_file_upload(path) {
            Ok(UploadOutcome::Loaded) => {
                model.prompt = None;
                model.preview_scroll_offset = 0;
                model.ensure_cursor_visible();
                model.show_toast(ToastLevel::Info, format!("Loaded {}", path.display()));
            }
            Ok(UploadOutcome::Skipped) => {
                model.show_toast(ToastLevel::Warning, "Only .md files can be uploaded");
            }
            Err(err) => {
                tracing::warn!(%err, "upload failed");
                model.show_toast(ToastLevel::Error, format!("Upload failed: {err}"));
            }
        }
    }

    fn download(&self, model: &mut Model) {
        match model.session.handle_download(&self.export_dir) {
            Ok(download) => {
                tracing::info!(path = %download.path.display(), mime = download.mime, "exported");
                model.session.edit(EditorBuffer::mark_clean);
                model.show_toast(
                    ToastLevel::Info,
                    format!("Downloaded {}", download.path.display()),
                );
            }
            Err(err) => {
                tracing::warn!(%err, "export failed");
                model.show_toast(ToastLevel::Error, format!("Download failed: {err}"));
            }
        }
    }

    fn start_remote(model: &mut Model, worker: &RemoteWorker, op: RemoteOp) {
        match model.session.begin_remote(op) {
            Some(job) => worker.spawn(job),
            None => model.show_toast(ToastLevel::Warning, "Still waiting for the API"),
        }
    }
}
