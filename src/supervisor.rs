//! Worker process lifecycle and the two communication channels.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as ProcessCommand};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::config::WorkerSettings;
use crate::error::{IpcError, IpcResult};
use crate::protocol::{Message, Response};

/// Owns the worker child process, its stdin writer (the outbound channel)
/// and the inbound response queue fed by a reader task.
///
/// The reader task is pipe plumbing, not a poller: it blocks on the
/// worker's stdout, forwards each parsed response line into the unbounded
/// queue, and exits on EOF. The client drains the queue with non-blocking
/// `try_recv` on its own schedule, so responses written by the worker at
/// any time are held until the client next looks.
#[derive(Debug)]
pub struct WorkerSupervisor {
    settings: WorkerSettings,
    child: Child,
    stdin: BufWriter<ChildStdin>,
    inbound: UnboundedReceiver<Response>,
    reader_task: JoinHandle<()>,
    terminated: bool,
}

impl WorkerSupervisor {
    /// Spawn the worker and wire both channels.
    pub async fn spawn(settings: WorkerSettings) -> IpcResult<Self> {
        let (child, stdin, inbound, reader_task) = start_worker(&settings)?;
        Ok(Self {
            settings,
            child,
            stdin,
            inbound,
            reader_task,
            terminated: false,
        })
    }

    /// Whether the worker process is still running.
    pub fn is_alive(&mut self) -> bool {
        if self.terminated {
            return false;
        }
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Whether the supervisor was deliberately shut down. A terminated
    /// supervisor is never respawned.
    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Replace the dead worker with a fresh process and channel pair.
    ///
    /// The previous inbound queue is dropped along with any responses still
    /// in it: answers from a dead worker have nothing left to match. The
    /// caller is responsible for replaying the file mirror afterward.
    pub fn respawn(&mut self) -> IpcResult<()> {
        let (child, stdin, inbound, reader_task) = start_worker(&self.settings)?;
        self.reader_task.abort();
        self.child = child;
        self.stdin = stdin;
        self.inbound = inbound;
        self.reader_task = reader_task;
        Ok(())
    }

    /// Serialize and enqueue one message onto the worker's stdin.
    ///
    /// Flushes per message so small, infrequent messages are never stuck
    /// in the write buffer. Never waits for a reply.
    pub async fn send(&mut self, message: &Message) -> IpcResult<()> {
        let mut line = serde_json::to_string(message).map_err(IpcError::Serialize)?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(IpcError::Write)?;
        self.stdin.flush().await.map_err(IpcError::Write)
    }

    /// Pop every response currently queued; never blocks waiting for more.
    pub fn drain(&mut self) -> Vec<Response> {
        let mut drained = Vec::new();
        loop {
            match self.inbound.try_recv() {
                Ok(response) => drained.push(response),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        drained
    }

    /// Kill the worker for good. The supervisor is not reusable afterward.
    pub async fn terminate(&mut self) {
        self.terminated = true;
        self.reader_task.abort();
        let _ = self.child.kill().await;
    }
}

#[cfg(test)]
impl WorkerSupervisor {
    /// Kill the child without marking the supervisor terminated,
    /// simulating a worker crash.
    pub(crate) async fn crash(&mut self) {
        let _ = self.child.kill().await;
    }
}

/// Spawn the worker process and wire up its channels.
fn start_worker(
    settings: &WorkerSettings,
) -> IpcResult<(
    Child,
    BufWriter<ChildStdin>,
    UnboundedReceiver<Response>,
    JoinHandle<()>,
)> {
    let mut child = ProcessCommand::new(&settings.path)
        .args(&settings.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(IpcError::Spawn)?;

    let stdin = child.stdin.take().expect("stdin not captured");
    let stdout = child.stdout.take().expect("stdout not captured");

    let (tx, rx) = mpsc::unbounded_channel();
    let reader_task = spawn_reader_task(stdout, tx);

    Ok((child, BufWriter::new(stdin), rx, reader_task))
}

/// Pump worker stdout into the inbound queue until EOF.
fn spawn_reader_task(stdout: ChildStdout, inbound: UnboundedSender<Response>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();

        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break, // EOF - worker exited
                Ok(_) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Response>(&line) {
                        Ok(response) => {
                            if inbound.send(response).is_err() {
                                // Client side dropped the queue (respawn or
                                // terminate); nothing left to deliver to.
                                break;
                            }
                        }
                        Err(err) => {
                            tracing::warn!(error = %err, "discarding unparseable worker line");
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "worker stdout read failed");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Command, RequestContext};
    use std::time::Duration;

    /// A stand-in worker that answers every message by echoing the line
    /// back with the `"type"` tag stripped, which turns a request into a
    /// well-formed response carrying the same id and command.
    fn echo_worker() -> WorkerSettings {
        WorkerSettings {
            path: "sh".into(),
            args: vec![
                "-c".to_string(),
                r#"sed -u 's/"type":"[a-z]*",//'"#.to_string(),
            ],
        }
    }

    /// A stand-in worker that swallows everything and says nothing.
    fn silent_worker() -> WorkerSettings {
        WorkerSettings {
            path: "sh".into(),
            args: vec!["-c".to_string(), "cat > /dev/null".to_string()],
        }
    }

    #[tokio::test]
    async fn test_drain_is_non_blocking_when_empty() {
        let mut supervisor = WorkerSupervisor::spawn(silent_worker()).await.unwrap();
        assert!(supervisor.drain().is_empty());
        assert!(supervisor.is_alive());
        supervisor.terminate().await;
    }

    #[tokio::test]
    async fn test_echoed_request_comes_back_as_response() {
        let mut supervisor = WorkerSupervisor::spawn(echo_worker()).await.unwrap();
        let message = Message::request(
            21,
            Command::Autocomplete,
            "demo.py",
            RequestContext::default(),
        );
        supervisor.send(&message).await.unwrap();

        let mut responses = Vec::new();
        for _ in 0..50 {
            responses = supervisor.drain();
            if !responses.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, 21);
        assert_eq!(responses[0].command, Some(Command::Autocomplete));
        supervisor.terminate().await;
    }

    #[tokio::test]
    async fn test_crash_is_detected_and_respawn_recovers() {
        let mut supervisor = WorkerSupervisor::spawn(silent_worker()).await.unwrap();
        assert!(supervisor.is_alive());

        supervisor.crash().await;
        assert!(!supervisor.is_alive());
        assert!(!supervisor.is_terminated());

        supervisor.respawn().unwrap();
        assert!(supervisor.is_alive());
        supervisor
            .send(&Message::ping(1))
            .await
            .expect("send to respawned worker");
        supervisor.terminate().await;
    }

    #[tokio::test]
    async fn test_terminate_is_final() {
        let mut supervisor = WorkerSupervisor::spawn(silent_worker()).await.unwrap();
        supervisor.terminate().await;
        assert!(supervisor.is_terminated());
        assert!(!supervisor.is_alive());
    }
}
