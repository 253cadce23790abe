//! Scripted in-memory connector for engine and runner tests

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::{
    Connector, DatabaseError, DatabaseResult, InsertStatement, PlaceholderStyle,
    StagingConnection,
};
use crate::staging::Row;

/// Observable call, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect,
    ConnectFailed,
    Probe(bool),
    /// A probe that never answers
    ProbeHung,
    Begin,
    Insert(usize),
    Commit,
    Rollback,
    Close,
}

/// Scripted reply to one `insert_rows` call
#[derive(Debug, Clone)]
pub enum InsertScript {
    Ok,
    /// Fail with this message; the connection stays usable
    Fail(String),
    /// Fail with this message and mark the connection dead
    Drop(String),
}

#[derive(Debug, Default)]
struct Script {
    events: Vec<Event>,
    /// Replies for upcoming connects: `None` succeeds, `Some` fails
    connects: VecDeque<Option<String>>,
    inserts: VecDeque<InsertScript>,
    /// Replies for upcoming commits: `None` succeeds, `Some` fails
    commits: VecDeque<Option<String>>,
    /// Upcoming probes that hang instead of answering
    hung_probes: usize,
    committed_rows: Vec<Row>,
    connections_opened: usize,
    statements: Vec<String>,
}

/// Connector whose behaviour is scripted up front
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    script: Rc<RefCell<Script>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue failures for the next `connect` calls
    pub fn fail_connects(&self, messages: &[&str]) {
        self.script_connects(&messages.iter().map(|m| Some(*m)).collect::<Vec<_>>());
    }

    /// Queue replies for the next `connect` calls; unscripted calls succeed
    pub fn script_connects(&self, replies: &[Option<&str>]) {
        let mut script = self.script.borrow_mut();
        script
            .connects
            .extend(replies.iter().map(|r| r.map(str::to_string)));
    }

    /// Queue replies for the next `insert_rows` calls; unscripted calls succeed
    pub fn script_inserts(&self, replies: impl IntoIterator<Item = InsertScript>) {
        self.script.borrow_mut().inserts.extend(replies);
    }

    /// Queue replies for the next `commit` calls; unscripted calls succeed
    pub fn script_commits(&self, replies: &[Option<&str>]) {
        let mut script = self.script.borrow_mut();
        script
            .commits
            .extend(replies.iter().map(|r| r.map(str::to_string)));
    }

    /// Make the next `count` liveness probes hang forever
    pub fn hang_probes(&self, count: usize) {
        self.script.borrow_mut().hung_probes += count;
    }

    pub fn events(&self) -> Vec<Event> {
        self.script.borrow().events.clone()
    }

    pub fn committed_rows(&self) -> Vec<Row> {
        self.script.borrow().committed_rows.clone()
    }

    pub fn connections_opened(&self) -> usize {
        self.script.borrow().connections_opened
    }

    pub fn statements(&self) -> Vec<String> {
        self.script.borrow().statements.clone()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.script
            .borrow()
            .events
            .iter()
            .filter(|e| *e == event)
            .count()
    }
}

#[async_trait(?Send)]
impl Connector for MockConnector {
    async fn connect(&self) -> DatabaseResult<Box<dyn StagingConnection>> {
        let mut script = self.script.borrow_mut();
        if let Some(Some(message)) = script.connects.pop_front() {
            script.events.push(Event::ConnectFailed);
            return Err(DatabaseError::ConnectionFailed(message));
        }
        script.events.push(Event::Connect);
        script.connections_opened += 1;
        drop(script);

        Ok(Box::new(MockConnection {
            script: Rc::clone(&self.script),
            alive: true,
            pending: Vec::new(),
        }))
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::QuestionMark
    }

    fn backend_type(&self) -> &'static str {
        "mock"
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

struct MockConnection {
    script: Rc<RefCell<Script>>,
    alive: bool,
    pending: Vec<Row>,
}

impl MockConnection {
    fn record(&self, event: Event) {
        self.script.borrow_mut().events.push(event);
    }

    fn check_alive(&self) -> DatabaseResult<()> {
        if self.alive {
            Ok(())
        } else {
            Err(DatabaseError::TransactionFailed(
                "Communication link failure".to_string(),
            ))
        }
    }
}

#[async_trait(?Send)]
impl StagingConnection for MockConnection {
    async fn is_alive(&mut self) -> bool {
        let hang = {
            let mut script = self.script.borrow_mut();
            let hang = script.hung_probes > 0;
            if hang {
                script.hung_probes -= 1;
                script.events.push(Event::ProbeHung);
            }
            hang
        };
        if hang {
            std::future::pending::<()>().await;
        }
        self.record(Event::Probe(self.alive));
        self.alive
    }

    async fn begin(&mut self) -> DatabaseResult<()> {
        self.record(Event::Begin);
        self.check_alive()?;
        self.pending.clear();
        Ok(())
    }

    async fn insert_rows(
        &mut self,
        statement: &InsertStatement,
        rows: &[Row],
    ) -> DatabaseResult<u64> {
        self.record(Event::Insert(rows.len()));
        self.check_alive()?;

        let reply = {
            let mut script = self.script.borrow_mut();
            script.statements.push(statement.sql().to_string());
            script.inserts.pop_front().unwrap_or(InsertScript::Ok)
        };
        match reply {
            InsertScript::Ok => {
                self.pending.extend(rows.iter().cloned());
                Ok(rows.len() as u64)
            }
            InsertScript::Fail(message) => Err(DatabaseError::QueryFailed(message)),
            InsertScript::Drop(message) => {
                self.alive = false;
                Err(DatabaseError::QueryFailed(message))
            }
        }
    }

    async fn commit(&mut self) -> DatabaseResult<()> {
        self.record(Event::Commit);
        self.check_alive()?;
        let reply = self.script.borrow_mut().commits.pop_front().flatten();
        if let Some(message) = reply {
            self.pending.clear();
            return Err(DatabaseError::TransactionFailed(message));
        }
        let pending = std::mem::take(&mut self.pending);
        self.script.borrow_mut().committed_rows.extend(pending);
        Ok(())
    }

    async fn rollback(&mut self) -> DatabaseResult<()> {
        self.record(Event::Rollback);
        self.pending.clear();
        self.check_alive()
    }

    fn close(self: Box<Self>) {
        self.record(Event::Close);
    }
}
