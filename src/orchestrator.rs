//! Issues backend requests off the UI thread and maps their responses into
//! the path lists the tree views consume.

use crate::api::{ApiError, Backend, ScanPlan, ScanQuery, SearchHit, SearchQuery};
use crate::utils::{join_root, normalize_separators};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Scan,
    Search,
    Move,
    Open,
}

/// A scan plan together with the display paths of both trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub plan: ScanPlan,
    pub source_paths: Vec<String>,
    pub destination_paths: Vec<String>,
}

impl ScanOutcome {
    /// Normalize the plan's source separators and prefix every path with the root.
    pub fn from_plan(mut plan: ScanPlan) -> Self {
        for item in &mut plan.items {
            item.source_path = normalize_separators(&item.source_path);
        }
        let source_paths = plan
            .items
            .iter()
            .map(|item| format!("{}/{}", plan.root_path, item.source_path))
            .collect();
        let destination_paths = plan
            .items
            .iter()
            .map(|item| format!("{}/{}", plan.root_path, item.destination_path))
            .collect();
        ScanOutcome {
            plan,
            source_paths,
            destination_paths,
        }
    }
}

pub fn search_display_paths(root_path: &str, hits: &[SearchHit]) -> Vec<String> {
    hits.iter()
        .map(|hit| join_root(root_path, &hit.file))
        .collect()
}

#[derive(Debug)]
pub enum Completed {
    Scan(Result<ScanOutcome, ApiError>),
    Search(Result<Vec<String>, ApiError>),
    Move(Result<(), ApiError>),
    Open {
        path: String,
        result: Result<(), ApiError>,
    },
}

impl Completed {
    pub fn kind(&self) -> RequestKind {
        match self {
            Completed::Scan(_) => RequestKind::Scan,
            Completed::Search(_) => RequestKind::Search,
            Completed::Move(_) => RequestKind::Move,
            Completed::Open { .. } => RequestKind::Open,
        }
    }
}

struct Envelope {
    seq: u64,
    completed: Completed,
}

/// Runs each request on its own worker thread.
///
/// Every request gets a sequence number; for scans, searches and moves only
/// the response to the most recently issued request of that kind is handed
/// out, older ones are dropped. File-open responses are always delivered.
pub struct Orchestrator {
    backend: Arc<dyn Backend>,
    sender: Sender<Envelope>,
    receiver: Receiver<Envelope>,
    next_seq: u64,
    latest: HashMap<RequestKind, u64>,
    outstanding: usize,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Orchestrator {
            backend,
            sender,
            receiver,
            next_seq: 0,
            latest: HashMap::new(),
            outstanding: 0,
        }
    }

    fn dispatch<F>(&mut self, kind: RequestKind, work: F) -> u64
    where
        F: FnOnce(&dyn Backend) -> Completed + Send + 'static,
    {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.latest.insert(kind, seq);
        self.outstanding += 1;
        debug!(seq, ?kind, "dispatching request");

        let backend = Arc::clone(&self.backend);
        let sender = self.sender.clone();
        thread::spawn(move || {
            let completed = work(backend.as_ref());
            // Fails only when the orchestrator is gone.
            let _ = sender.send(Envelope { seq, completed });
        });
        seq
    }

    pub fn scan(&mut self, query: ScanQuery) -> u64 {
        info!(root = %query.root_path, recursive = query.recursive, "requesting scan");
        self.dispatch(RequestKind::Scan, move |backend| {
            Completed::Scan(backend.get_files(&query).map(ScanOutcome::from_plan))
        })
    }

    pub fn search(&mut self, query: SearchQuery) -> u64 {
        info!(root = %query.scan.root_path, query = %query.query, "requesting search");
        self.dispatch(RequestKind::Search, move |backend| {
            let root_path = query.scan.root_path.clone();
            Completed::Search(
                backend
                    .search_files(&query)
                    .map(|hits| search_display_paths(&root_path, &hits)),
            )
        })
    }

    pub fn confirm_move(&mut self, plan: ScanPlan) -> u64 {
        info!(root = %plan.root_path, moves = plan.items.len(), "requesting move");
        self.dispatch(RequestKind::Move, move |backend| {
            Completed::Move(backend.update_files(&plan).map(|_| ()))
        })
    }

    pub fn open_file(&mut self, path: String) -> u64 {
        debug!(%path, "requesting file open");
        self.dispatch(RequestKind::Open, move |backend| {
            let result = backend.open_file(&path).map(|_| ());
            Completed::Open { path, result }
        })
    }

    fn accept(&mut self, envelope: Envelope) -> Option<Completed> {
        self.outstanding = self.outstanding.saturating_sub(1);
        let kind = envelope.completed.kind();
        if kind != RequestKind::Open && self.latest.get(&kind) != Some(&envelope.seq) {
            debug!(seq = envelope.seq, ?kind, "dropping stale response");
            return None;
        }
        Some(envelope.completed)
    }

    /// Non-stale responses received since the last call. Never blocks.
    pub fn poll(&mut self) -> Vec<Completed> {
        let mut ready = Vec::new();
        while let Ok(envelope) = self.receiver.try_recv() {
            if let Some(completed) = self.accept(envelope) {
                ready.push(completed);
            }
        }
        ready
    }

    /// Block until the next current response. `None` once nothing is outstanding.
    pub fn wait(&mut self) -> Option<Completed> {
        while self.outstanding > 0 {
            let envelope = self.receiver.recv().ok()?;
            if let Some(completed) = self.accept(envelope) {
                return Some(completed);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FileMapping, MockBackend};

    fn mapping(src: &str, dst: &str) -> FileMapping {
        FileMapping {
            source_path: src.to_string(),
            destination_path: dst.to_string(),
        }
    }

    #[test]
    fn test_scan_outcome_normalizes_source_separators() {
        // Arrange
        let plan = ScanPlan {
            root_path: "/root".to_string(),
            items: vec![mapping("a\\b.txt", "b.txt")],
        };

        // Act
        let outcome = ScanOutcome::from_plan(plan);

        // Assert
        assert_eq!(outcome.source_paths, vec!["/root/a/b.txt"]);
        assert_eq!(outcome.destination_paths, vec!["/root/b.txt"]);
        assert_eq!(outcome.plan.items[0].source_path, "a/b.txt");
    }

    #[test]
    fn test_search_display_paths_join_with_one_separator() {
        // Arrange
        let hits = vec![
            SearchHit {
                file: "x/y.txt".to_string(),
            },
            SearchHit {
                file: "z.pdf".to_string(),
            },
        ];

        // Act
        let with_slash = search_display_paths("/r/", &hits);
        let without_slash = search_display_paths("/r", &hits);

        // Assert
        assert_eq!(with_slash, vec!["/r/x/y.txt", "/r/z.pdf"]);
        assert_eq!(with_slash, without_slash);
    }

    #[test]
    fn test_scan_round_trip_through_worker() {
        // Arrange
        let mut backend = MockBackend::new();
        backend.expect_get_files().times(1).returning(|query| {
            Ok(ScanPlan {
                root_path: query.root_path.clone(),
                items: vec![mapping("a.txt", "docs/a.txt")],
            })
        });
        let mut orchestrator = Orchestrator::new(Arc::new(backend));

        // Act
        orchestrator.scan(ScanQuery {
            root_path: "/r".to_string(),
            recursive: true,
            required_exts: ".txt".to_string(),
        });
        let completed = orchestrator.wait();

        // Assert
        match completed {
            Some(Completed::Scan(Ok(outcome))) => {
                assert_eq!(outcome.source_paths, vec!["/r/a.txt"]);
                assert_eq!(outcome.destination_paths, vec!["/r/docs/a.txt"]);
            }
            other => panic!("unexpected completion: {:?}", other),
        }
        assert!(orchestrator.wait().is_none());
    }

    #[test]
    fn test_only_latest_scan_response_is_delivered() {
        // Arrange
        let mut backend = MockBackend::new();
        backend.expect_get_files().times(2).returning(|query| {
            Ok(ScanPlan {
                root_path: query.root_path.clone(),
                items: Vec::new(),
            })
        });
        let mut orchestrator = Orchestrator::new(Arc::new(backend));

        // Act
        orchestrator.scan(ScanQuery {
            root_path: "/first".to_string(),
            ..ScanQuery::default()
        });
        orchestrator.scan(ScanQuery {
            root_path: "/second".to_string(),
            ..ScanQuery::default()
        });
        let mut delivered = Vec::new();
        while let Some(completed) = orchestrator.wait() {
            delivered.push(completed);
        }

        // Assert
        assert_eq!(delivered.len(), 1);
        match &delivered[0] {
            Completed::Scan(Ok(outcome)) => assert_eq!(outcome.plan.root_path, "/second"),
            other => panic!("unexpected completion: {:?}", other),
        }
    }

    #[test]
    fn test_move_failure_is_delivered_as_error() {
        // Arrange
        let mut backend = MockBackend::new();
        backend.expect_update_files().times(1).returning(|_| {
            Err(ApiError::Status {
                status: 500,
                body: "boom".to_string(),
            })
        });
        let mut orchestrator = Orchestrator::new(Arc::new(backend));

        // Act
        orchestrator.confirm_move(ScanPlan::default());
        let completed = orchestrator.wait();

        // Assert
        assert!(matches!(completed, Some(Completed::Move(Err(_)))));
    }

    #[test]
    fn test_every_open_response_is_delivered() {
        // Arrange
        let mut backend = MockBackend::new();
        backend
            .expect_open_file()
            .times(2)
            .returning(|_| Ok(serde_json::Value::Null));
        let mut orchestrator = Orchestrator::new(Arc::new(backend));

        // Act
        orchestrator.open_file("/r/a.txt".to_string());
        orchestrator.open_file("/r/b.txt".to_string());
        let mut delivered = 0;
        while orchestrator.wait().is_some() {
            delivered += 1;
        }

        // Assert
        assert_eq!(delivered, 2);
    }
}
