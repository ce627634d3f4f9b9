//! Response correlation: live-id tracking and single-slot buffering.

use std::collections::HashMap;

use crate::protocol::{Command, RequestId, Response, NO_REQUEST};

/// Matches inbound responses to the single live request per command.
///
/// Matching is by identity, never by arrival order: a response whose id is
/// not the live id for its command was superseded or canceled and is
/// silently dropped. At most one response per command is ever buffered;
/// a newer accepted response replaces an unconsumed older one, and
/// retrieval clears the slot.
#[derive(Debug)]
pub struct Correlator {
    /// Live request id per command; `NO_REQUEST` when none.
    current: HashMap<Command, RequestId>,
    /// Latest accepted, unconsumed response per command.
    latest: HashMap<Command, Response>,
}

impl Correlator {
    /// Create a correlator with no live requests.
    pub fn new() -> Self {
        let mut current = HashMap::new();
        for command in Command::ALL {
            current.insert(command, NO_REQUEST);
        }
        Self {
            current,
            latest: HashMap::new(),
        }
    }

    /// Make `id` the live request for `command`, unconditionally
    /// superseding any prior one. Last writer wins.
    pub fn register(&mut self, command: Command, id: RequestId) {
        self.current.insert(command, id);
    }

    /// Drop the expectation for `command`.
    ///
    /// A response later arriving for the previously live id still releases
    /// its id (the caller handles that) but can never match and is never
    /// stored.
    pub fn cancel(&mut self, command: Command) {
        self.current.insert(command, NO_REQUEST);
    }

    /// Feed one drained response through the matching rules.
    ///
    /// The caller has already released the response's id from the
    /// allocator; this only decides whether the response is worth keeping.
    /// Responses without a command tag are acknowledgments and carry
    /// nothing to buffer.
    pub fn observe(&mut self, response: Response) {
        let Some(command) = response.command else {
            return;
        };
        // Ids are never issued as the sentinel, so a response bearing it
        // cannot match an idle command slot.
        if response.id == NO_REQUEST {
            return;
        }
        if self.current.get(&command).copied().unwrap_or(NO_REQUEST) != response.id {
            return; // stale or superseded
        }
        self.current.insert(command, NO_REQUEST);
        self.latest.insert(command, response);
    }

    /// Hand out and clear the buffered response for `command`.
    pub fn take(&mut self, command: Command) -> Option<Response> {
        self.latest.remove(&command)
    }

    /// The live id for `command`, if any.
    pub fn live_id(&self, command: Command) -> Option<RequestId> {
        match self.current.get(&command).copied().unwrap_or(NO_REQUEST) {
            NO_REQUEST => None,
            id => Some(id),
        }
    }

    /// Forget all live ids and buffered responses. Used on respawn, when
    /// everything in flight was bound to a worker that no longer exists.
    pub fn reset(&mut self) {
        for id in self.current.values_mut() {
            *id = NO_REQUEST;
        }
        self.latest.clear();
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}
