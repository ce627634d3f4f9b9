//! The public facade composing allocator, correlator, mirror and
//! supervisor into one cooperative, non-blocking API.

use crate::config::Settings;
use crate::correlator::Correlator;
use crate::error::{IpcError, IpcResult};
use crate::id::IdAllocator;
use crate::mirror::FileMirror;
use crate::protocol::{Command, Message, RequestContext, Response};
use crate::supervisor::WorkerSupervisor;

/// Client for a long-lived analysis worker process.
///
/// All state is exclusively owned by one instance; there is no internal
/// locking, so a multi-threaded host must serialize access externally.
/// None of the methods waits for a response: requests are fire-and-forget,
/// and [`get_response`](Self::get_response) is a non-blocking poll the
/// host calls on its own schedule.
///
/// Worker crashes are absorbed transparently: the next call respawns the
/// worker and replays the file mirror. Misuse (`InvalidCommand`,
/// `UnknownFile`) is fatal instead: the worker is torn down before the
/// error is returned and the instance refuses all further calls.
pub struct IpcClient {
    ids: IdAllocator,
    correlator: Correlator,
    mirror: FileMirror,
    supervisor: WorkerSupervisor,
}

impl IpcClient {
    /// Spawn the worker described by `settings` and wire up the client.
    pub async fn spawn(settings: Settings) -> IpcResult<Self> {
        let supervisor = WorkerSupervisor::spawn(settings.worker).await?;
        Ok(Self {
            ids: IdAllocator::new(settings.id_max),
            correlator: Correlator::new(),
            mirror: FileMirror::new(),
            supervisor,
        })
    }

    /// Nudge the worker, respawning it first if it died.
    pub async fn ping(&mut self) -> IpcResult<()> {
        self.ensure_alive().await?;
        let id = self.ids.allocate()?;
        self.supervisor.send(&Message::ping(id)).await
    }

    /// Issue an analysis request against a tracked file.
    ///
    /// At most one request per command is live; issuing another supersedes
    /// the previous one, whose eventual answer is dropped on arrival.
    pub async fn request(
        &mut self,
        command: &str,
        file: &str,
        ctx: RequestContext,
    ) -> IpcResult<()> {
        self.check_usable()?;
        let command = self.parse_command(command).await?;
        if !self.mirror.contains(file) {
            self.teardown().await;
            return Err(IpcError::UnknownFile(file.to_string()));
        }

        self.ensure_alive().await?;
        let id = self.ids.allocate()?;
        self.correlator.register(command, id);
        self.supervisor
            .send(&Message::request(id, command, file, ctx))
            .await
    }

    /// Drop the expectation for `command` locally.
    ///
    /// The worker is not notified and may still compute an answer; when it
    /// arrives its id is released but the answer is discarded.
    pub async fn cancel_request(&mut self, command: &str) -> IpcResult<()> {
        self.check_usable()?;
        let command = self.parse_command(command).await?;
        self.correlator.cancel(command);
        Ok(())
    }

    /// Drain everything the worker has sent, then hand out the buffered
    /// response for `command` if its live request was answered.
    ///
    /// Returns `None` when no matching answer has arrived; a returned
    /// response is consumed and will not be returned again.
    pub async fn get_response(&mut self, command: &str) -> IpcResult<Option<Response>> {
        self.check_usable()?;
        let command = self.parse_command(command).await?;
        self.ensure_alive().await?;

        for response in self.supervisor.drain() {
            // A response always consumes its id, even when it is about to
            // be discarded as stale.
            self.ids.release(response.id);
            self.correlator.observe(response);
        }
        Ok(self.correlator.take(command))
    }

    /// Record a file in the mirror and notify the worker.
    ///
    /// Unconditional: new files and updates take the same path.
    pub async fn update_file(&mut self, filename: &str, contents: &str) -> IpcResult<()> {
        self.check_usable()?;
        self.mirror.update(filename, contents);

        self.ensure_alive().await?;
        let id = self.ids.allocate()?;
        self.supervisor
            .send(&Message::upsert(id, filename, contents))
            .await
    }

    /// Forget a tracked file and tell the worker to drop it too.
    pub async fn remove_file(&mut self, filename: &str) -> IpcResult<()> {
        self.check_usable()?;
        if self.mirror.remove(filename).is_none() {
            self.teardown().await;
            return Err(IpcError::UnknownFile(filename.to_string()));
        }

        self.ensure_alive().await?;
        let id = self.ids.allocate()?;
        self.supervisor.send(&Message::removal(id, filename)).await
    }

    /// Kill the worker. The client is unusable afterward.
    pub async fn terminate(&mut self) {
        self.supervisor.terminate().await;
    }

    /// Number of messages still awaiting a response.
    pub fn outstanding(&self) -> usize {
        self.ids.outstanding_len()
    }

    fn check_usable(&self) -> IpcResult<()> {
        if self.supervisor.is_terminated() {
            return Err(IpcError::Terminated);
        }
        Ok(())
    }

    /// Validate a caller-supplied command name, tearing the worker down on
    /// failure: an unknown command is programmer misuse, not a retryable
    /// condition.
    async fn parse_command(&mut self, command: &str) -> IpcResult<Command> {
        match Command::parse(command) {
            Some(command) => Ok(command),
            None => {
                self.teardown().await;
                Err(IpcError::InvalidCommand(command.to_string()))
            }
        }
    }

    /// Respawn the worker if it died, then resynchronize it from the
    /// mirror.
    ///
    /// Correlator and allocator state bound to the dead worker is cleared
    /// first: those requests can never be answered, and leaving their ids
    /// live would pin the id space and shadow future matches.
    async fn ensure_alive(&mut self) -> IpcResult<()> {
        if self.supervisor.is_terminated() {
            return Err(IpcError::Terminated);
        }
        if self.supervisor.is_alive() {
            return Ok(());
        }

        tracing::info!("analysis worker died; respawning");
        self.supervisor.respawn()?;
        self.correlator.reset();
        self.ids.clear();

        for (filename, contents) in self.mirror.iter() {
            let id = self.ids.allocate()?;
            let message = Message::upsert(id, filename, contents);
            self.supervisor.send(&message).await?;
        }
        Ok(())
    }

    async fn teardown(&mut self) {
        self.supervisor.terminate().await;
    }
}
