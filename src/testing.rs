//! Test doubles: a scripted transport and a scripted prompt.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::console::{InputEvent, LineInput};
use crate::guard::Prompt;
use crate::transport::{Transport, TransportError};

type Reply = Result<String, TransportError>;

/// One request seen by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport that records every call and replays queued responses per
/// method + path. An unscripted request fails as unreachable.
#[derive(Default)]
pub struct FakeTransport {
    calls: RefCell<Vec<Call>>,
    replies: RefCell<HashMap<(&'static str, String), VecDeque<Reply>>>,
    frames: RefCell<Option<Result<Vec<Reply>, TransportError>>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(&self, method: &'static str, path: &str, body: &str) {
        self.queue(method, path, Ok(body.to_string()));
    }

    pub fn fail(&self, method: &'static str, path: &str, err: TransportError) {
        self.queue(method, path, Err(err));
    }

    fn queue(&self, method: &'static str, path: &str, reply: Reply) {
        self.replies
            .borrow_mut()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Frames delivered by the next `connect`, then the stream ends.
    pub fn stream(&self, frames: Vec<Reply>) {
        *self.frames.borrow_mut() = Some(Ok(frames));
    }

    pub fn refuse_stream(&self, err: TransportError) {
        *self.frames.borrow_mut() = Some(Err(err));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .cloned()
            .collect()
    }

    fn record(
        &self,
        method: &'static str,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
    ) -> Reply {
        self.calls.borrow_mut().push(Call {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            body,
        });
        self.replies
            .borrow_mut()
            .get_mut(&(method, path.to_string()))
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(TransportError::unreachable("no scripted reply")))
    }
}

impl Transport for FakeTransport {
    type Frames = futures_util::stream::Iter<std::vec::IntoIter<Reply>>;

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Reply {
        self.record("GET", path, query, None)
    }

    async fn put(&self, path: &str, query: &[(&str, &str)], body: String) -> Reply {
        self.record("PUT", path, query, Some(body))
    }

    async fn post(&self, path: &str, query: &[(&str, &str)]) -> Reply {
        self.record("POST", path, query, None)
    }

    async fn connect(&self, path: &str) -> Result<Self::Frames, TransportError> {
        self.record("CONNECT", path, &[], None).ok();
        match self.frames.borrow_mut().take() {
            Some(Ok(frames)) => Ok(futures_util::stream::iter(frames)),
            Some(Err(e)) => Err(e),
            None => Err(TransportError::unreachable("no scripted stream")),
        }
    }
}

/// Prompt with a fixed answer that records every question.
pub struct ScriptedPrompt {
    answer: bool,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    /// Always give the same answer.
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, message: &str) -> bool {
        self.asked.borrow_mut().push(message.to_string());
        self.answer
    }
}

/// Shell input that replays a fixed list of events, then EOF.
pub struct ScriptedInput {
    events: VecDeque<InputEvent>,
}

impl ScriptedInput {
    pub fn lines(lines: &[&str]) -> Self {
        Self::events(lines.iter().map(|l| InputEvent::Line(format!("{l}\n"))).collect())
    }

    pub fn events(events: Vec<InputEvent>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl LineInput for ScriptedInput {
    async fn next_event(&mut self) -> std::io::Result<InputEvent> {
        Ok(self.events.pop_front().unwrap_or(InputEvent::Eof))
    }
}
