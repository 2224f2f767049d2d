use std::io::stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::effects::RemoteWorker;
use crate::app::{App, Message, Model, update};
use crate::session::{NoteSession, SessionOptions};
use crate::storage::{FileStore, KeyValueStore};

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop
    /// encounters an I/O failure.
    pub fn run(&self) -> Result<()> {
        let store: Box<dyn KeyValueStore> = Box::new(FileStore::new(self.store_path.clone()));
        let session = NoteSession::open(
            store,
            SessionOptions {
                storage_key: self.storage_key.clone(),
                ..SessionOptions::default()
            },
        );

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal, marknote requires an interactive terminal")?;
        let size = terminal.size()?;

        let mut model =
            Model::new(session, (size.width, size.height)).with_code_lang(self.code_lang.clone());
        model
            .config_global_path
            .clone_from(&self.config_global_path);
        model.config_local_path.clone_from(&self.config_local_path);
        model.store_path = Some(self.store_path.clone());

        let worker = RemoteWorker::new(Arc::clone(&self.remote));
        let result = execute!(stdout(), EnableMouseCapture)
            .context("Failed to enable mouse capture")
            .and_then(|()| self.event_loop(&mut terminal, &mut model, &worker));

        // Restore terminal
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();

        result
    }

    /// Feed one message through `update` and its side effects.
    pub(super) fn dispatch(&self, model: &mut Model, worker: &RemoteWorker, msg: Message) {
        tracing::trace!(?msg, "message");
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model, worker, &side_msg);
    }

    fn event_loop(
        &self,
        terminal: &mut DefaultTerminal,
        model: &mut Model,
        worker: &RemoteWorker,
    ) -> Result<()> {
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            while let Some(outcome) = worker.try_take() {
                Self::finish_remote(model, outcome);
                needs_render = true;
            }

            // Poll faster while a remote call is out so its result shows promptly
            let poll_ms = if needs_render {
                0
            } else if model.session.is_loading() {
                50
            } else {
                250
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                if let Some(msg) = Self::handle_event(&event::read()?, model) {
                    self.dispatch(model, worker, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                while event::poll(Duration::from_millis(0))? {
                    if let Some(msg) = Self::handle_event(&event::read()?, model) {
                        self.dispatch(model, worker, msg);
                        needs_render = true;
                    }
                }
            }

            if needs_render {
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
