//! Test doubles for the core connection traits

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlauto_core::{
    Connection, ConnectionDescriptor, Connector, QueryResult, Result, SqlautoError, Value,
};
use sqlauto_procedures::RETURN_VALUE_COLUMN;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// What a mock connection does when the batch runs
#[derive(Debug, Clone)]
pub enum Behaviour {
    /// Return these result sets
    Results(Vec<QueryResult>),
    /// Fail with a driver error
    Fail(String),
    /// Never finish
    Hang,
}

/// Counters shared by a connector and every connection it opened
#[derive(Debug, Default)]
pub struct CallLog {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
    pub batches: Mutex<Vec<(String, Vec<Value>)>>,
}

impl CallLog {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<(String, Vec<Value>)> {
        self.batches.lock().clone()
    }
}

pub struct MockConnection {
    log: Arc<CallLog>,
    behaviour: Behaviour,
    closed: AtomicBool,
}

#[async_trait]
impl Connection for MockConnection {
    fn driver_name(&self) -> &str {
        "mock"
    }

    async fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<QueryResult>> {
        self.log
            .batches
            .lock()
            .push((sql.to_string(), params.to_vec()));
        match &self.behaviour {
            Behaviour::Results(sets) => Ok(sets.clone()),
            Behaviour::Fail(message) => Err(SqlautoError::Driver(message.clone())),
            Behaviour::Hang => std::future::pending().await,
        }
    }

    async fn commit(&self) -> Result<()> {
        self.log.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        self.log.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.log.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct MockConnector {
    pub log: Arc<CallLog>,
    behaviour: Behaviour,
    refuse: bool,
}

impl MockConnector {
    pub fn new(behaviour: Behaviour) -> Self {
        Self {
            log: Arc::new(CallLog::default()),
            behaviour,
            refuse: false,
        }
    }

    /// A connector whose procedure returns `code` after `rows`
    pub fn returning(code: i32, rows: Vec<QueryResult>) -> Self {
        let mut sets = rows;
        sets.push(status(code));
        Self::new(Behaviour::Results(sets))
    }

    /// A connector that cannot reach the server
    pub fn unreachable() -> Self {
        Self {
            refuse: true,
            ..Self::new(Behaviour::Hang)
        }
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, descriptor: &ConnectionDescriptor) -> Result<Box<dyn Connection>> {
        if self.refuse {
            return Err(SqlautoError::Connection(format!(
                "could not reach {}",
                descriptor.host_name().unwrap_or("server")
            )));
        }
        self.log.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            log: self.log.clone(),
            behaviour: self.behaviour.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

pub fn status(code: i32) -> QueryResult {
    QueryResult::from_rows(&[RETURN_VALUE_COLUMN], vec![vec![Value::Int32(code)]])
}

pub fn messages(lines: &[&str]) -> QueryResult {
    QueryResult::from_rows(
        &["message"],
        lines.iter().map(|line| vec![Value::from(*line)]).collect(),
    )
}
