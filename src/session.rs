use crate::api::{ScanPlan, ScanQuery, SearchQuery};
use crate::correlator::{CorrelationError, CorrelationEvent, Jump, TreeIndex, TreePair};
use crate::extensions::ExtensionSet;
use crate::orchestrator::{Completed, Orchestrator, ScanOutcome};
use crate::tree_builder::PathStyle;
use crate::tree_view::TreeView;
use crate::utils::normalize_separators;
use tracing::{error, info, warn};

pub const MOVE_SUCCESS: &str = "Files re-structured successfully.";
pub const MOVE_FAILURE: &str = "An error occurred while moving data.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Everything the user sees and edits: the form, the retained plan, the three
/// trees and the notices. Responses from the [`Orchestrator`] are applied here.
pub struct Session {
    orchestrator: Orchestrator,
    style: PathStyle,
    root_path: String,
    pub recursive: bool,
    pub extensions: ExtensionSet,
    search_query: String,
    plan: Option<ScanPlan>,
    /// Bumped by every applied scan.
    plan_generation: u64,
    /// Generation of the plan carried by the move request in flight.
    pending_move: Option<u64>,
    trees: Option<TreePair>,
    search_tree: Option<TreeView>,
    scan_state: LoadState,
    search_state: LoadState,
    move_state: LoadState,
    success_message: Option<String>,
    error_message: Option<String>,
    status: Option<String>,
}

impl Session {
    pub fn new(orchestrator: Orchestrator, style: PathStyle) -> Self {
        Session {
            orchestrator,
            style,
            root_path: String::new(),
            recursive: false,
            extensions: ExtensionSet::default(),
            search_query: String::new(),
            plan: None,
            plan_generation: 0,
            pending_move: None,
            trees: None,
            search_tree: None,
            scan_state: LoadState::Idle,
            search_state: LoadState::Idle,
            move_state: LoadState::Idle,
            success_message: None,
            error_message: None,
            status: None,
        }
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    /// Backslashes are rewritten to `/` on every change.
    pub fn set_root_path(&mut self, value: &str) {
        self.root_path = normalize_separators(value);
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, value: &str) {
        self.search_query = value.to_string();
    }

    pub fn scan_query(&self) -> ScanQuery {
        ScanQuery {
            root_path: self.root_path.clone(),
            recursive: self.recursive,
            required_exts: self.extensions.joined(),
        }
    }

    /// Drop the current plan and trees and ask for a new scan.
    pub fn request_scan(&mut self) {
        self.plan = None;
        self.trees = None;
        self.success_message = None;
        self.error_message = None;
        self.scan_state = LoadState::Loading;
        let query = self.scan_query();
        self.orchestrator.scan(query);
    }

    /// Previous results stay on screen until the new ones arrive.
    pub fn request_search(&mut self) {
        self.search_state = LoadState::Loading;
        let query = SearchQuery {
            scan: self.scan_query(),
            query: self.search_query.clone(),
        };
        self.orchestrator.search(query);
    }

    /// Whether a retained plan can be applied.
    pub fn can_confirm_move(&self) -> bool {
        self.plan.is_some() && !self.move_state.is_loading()
    }

    /// Post the retained plan. Returns `false` when there is nothing to move.
    pub fn confirm_move(&mut self) -> bool {
        if !self.can_confirm_move() {
            return false;
        }
        let Some(plan) = self.plan.clone() else {
            return false;
        };
        self.success_message = None;
        self.error_message = None;
        self.move_state = LoadState::Loading;
        self.pending_move = Some(self.plan_generation);
        self.orchestrator.confirm_move(plan);
        true
    }

    pub fn open_file(&mut self, path: &str) {
        self.orchestrator.open_file(path.to_string());
    }

    /// Correlate a node of the source or destination tree with its counterpart.
    pub fn jump(&mut self, tree: TreeIndex, clicked_path: &str) -> Result<Jump, CorrelationError> {
        let event = CorrelationEvent {
            tree,
            clicked_path: clicked_path.to_string(),
        };
        let result = match (self.plan.as_ref(), self.trees.as_mut()) {
            _ if tree.sibling().is_none() => Err(CorrelationError::NotCorrelated(tree)),
            (Some(plan), Some(trees)) => trees.jump(&event, plan),
            _ => Err(CorrelationError::NoPlan),
        };
        match &result {
            Ok(jump) => {
                self.status = None;
                info!(from = %clicked_path, to = %jump.correlation.target_path, "correlated");
            }
            Err(err) => {
                warn!(%clicked_path, "correlation failed: {}", err);
                self.status = Some(err.to_string());
            }
        }
        result
    }

    /// Apply every response that has arrived. Returns whether anything changed.
    pub fn poll(&mut self) -> bool {
        let ready = self.orchestrator.poll();
        let changed = !ready.is_empty();
        for completed in ready {
            self.apply(completed);
        }
        changed
    }

    /// Block for the next response and apply it. `false` once nothing is pending.
    pub fn wait(&mut self) -> bool {
        match self.orchestrator.wait() {
            Some(completed) => {
                self.apply(completed);
                true
            }
            None => false,
        }
    }

    fn apply(&mut self, completed: Completed) {
        match completed {
            Completed::Scan(Ok(outcome)) => self.apply_scan(outcome),
            Completed::Scan(Err(err)) => {
                error!("scan failed: {}", err);
                self.scan_state = LoadState::Failed(format!("Scan failed: {}", err));
            }
            Completed::Search(Ok(paths)) => {
                info!(hits = paths.len(), "search finished");
                match self.search_tree.as_mut() {
                    Some(view) => view.rebuild(&paths, &self.root_path),
                    None => {
                        self.search_tree =
                            Some(TreeView::new(&paths, &self.root_path, self.style));
                    }
                }
                self.search_state = LoadState::Loaded;
            }
            Completed::Search(Err(err)) => {
                error!("search failed: {}", err);
                self.search_tree = None;
                self.search_state = LoadState::Failed(format!("Search failed: {}", err));
            }
            Completed::Move(Ok(())) => {
                info!("move applied");
                // A scan issued meanwhile owns the current plan.
                if self.pending_move.take() == Some(self.plan_generation) {
                    self.plan = None;
                }
                self.move_state = LoadState::Loaded;
                self.success_message = Some(MOVE_SUCCESS.to_string());
            }
            Completed::Move(Err(err)) => {
                error!("move failed: {}", err);
                self.pending_move = None;
                self.move_state = LoadState::Failed(err.to_string());
                self.error_message = Some(MOVE_FAILURE.to_string());
            }
            Completed::Open { path, result } => match result {
                Ok(()) => info!(%path, "file opened"),
                Err(err) => {
                    warn!(%path, "open failed: {}", err);
                    self.status = Some(format!("Could not open {}: {}", path, err));
                }
            },
        }
    }

    fn apply_scan(&mut self, outcome: ScanOutcome) {
        info!(moves = outcome.plan.items.len(), "scan finished");
        let source = TreeView::new(&outcome.source_paths, &self.root_path, self.style);
        let destination = TreeView::new(&outcome.destination_paths, &self.root_path, self.style);
        self.trees = Some(TreePair::new(source, destination));
        self.plan = Some(outcome.plan);
        self.plan_generation += 1;
        self.scan_state = LoadState::Loaded;
    }

    pub fn plan(&self) -> Option<&ScanPlan> {
        self.plan.as_ref()
    }

    pub fn view(&self, tree: TreeIndex) -> Option<&TreeView> {
        match tree {
            TreeIndex::Search => self.search_tree.as_ref(),
            _ => self.trees.as_ref().and_then(|pair| pair.get(tree)),
        }
    }

    pub fn view_mut(&mut self, tree: TreeIndex) -> Option<&mut TreeView> {
        match tree {
            TreeIndex::Search => self.search_tree.as_mut(),
            _ => self.trees.as_mut().and_then(|pair| pair.get_mut(tree)),
        }
    }

    /// Load state of the request that fills `tree`.
    pub fn tree_state(&self, tree: TreeIndex) -> &LoadState {
        match tree {
            TreeIndex::Search => &self.search_state,
            _ => &self.scan_state,
        }
    }

    pub fn move_state(&self) -> &LoadState {
        &self.move_state
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: Option<String>) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, FileMapping, MockBackend, SearchHit};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex, mpsc};

    fn scan_backend(backend: &mut MockBackend) {
        backend.expect_get_files().returning(|_| {
            Ok(ScanPlan {
                root_path: "/root".to_string(),
                items: vec![FileMapping {
                    source_path: "a\\b.txt".to_string(),
                    destination_path: "b.txt".to_string(),
                }],
            })
        });
    }

    fn session(backend: MockBackend) -> Session {
        let mut session = Session::new(Orchestrator::new(Arc::new(backend)), PathStyle::Posix);
        session.set_root_path("/root");
        session
    }

    fn drain(session: &mut Session) {
        while session.wait() {}
    }

    fn paths(view: Option<&TreeView>) -> Vec<String> {
        view.map(|v| v.flatten().into_iter().map(|row| row.path).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_set_root_path_normalizes_backslashes() {
        // Arrange
        let mut session = session(MockBackend::new());

        // Act
        session.set_root_path(r"C:\\Users\me");

        // Assert
        assert_eq!(session.root_path(), "C:/Users/me");
    }

    #[test]
    fn test_scan_builds_both_trees_and_retains_plan() {
        // Arrange
        let mut backend = MockBackend::new();
        scan_backend(&mut backend);
        let mut session = session(backend);

        // Act
        session.request_scan();
        let loading = session.tree_state(TreeIndex::Source).is_loading();
        drain(&mut session);

        // Assert
        assert!(loading);
        assert_eq!(session.tree_state(TreeIndex::Source), &LoadState::Loaded);
        assert_eq!(
            paths(session.view(TreeIndex::Source)),
            vec!["/root", "/root/a", "/root/a/b.txt"]
        );
        assert_eq!(
            paths(session.view(TreeIndex::Destination)),
            vec!["/root", "/root/b.txt"]
        );
        assert_eq!(
            session.plan().map(|plan| plan.items[0].source_path.as_str()),
            Some("a/b.txt")
        );
        assert!(session.can_confirm_move());
    }

    #[test]
    fn test_scan_failure_is_an_explicit_state() {
        // Arrange
        let mut backend = MockBackend::new();
        backend.expect_get_files().returning(|_| {
            Err(ApiError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            })
        });
        let mut session = session(backend);

        // Act
        session.request_scan();
        drain(&mut session);

        // Assert
        assert!(matches!(
            session.tree_state(TreeIndex::Source),
            LoadState::Failed(_)
        ));
        assert!(session.view(TreeIndex::Source).is_none());
        assert!(!session.can_confirm_move());
    }

    #[test]
    fn test_confirm_move_is_gated_on_a_plan() {
        // Arrange
        let mut session = session(MockBackend::new());

        // Act
        let sent = session.confirm_move();

        // Assert
        assert!(!sent);
        assert_eq!(session.move_state(), &LoadState::Idle);
    }

    #[test]
    fn test_successful_move_shows_notice_and_discards_plan() {
        // Arrange
        let mut backend = MockBackend::new();
        scan_backend(&mut backend);
        backend
            .expect_update_files()
            .withf(|plan| plan.items[0].source_path == "a/b.txt")
            .times(1)
            .returning(|_| Ok(serde_json::json!({"status": "ok"})));
        let mut session = session(backend);
        session.request_scan();
        drain(&mut session);

        // Act
        let sent = session.confirm_move();
        drain(&mut session);

        // Assert
        assert!(sent);
        assert_eq!(session.success_message(), Some(MOVE_SUCCESS));
        assert!(session.plan().is_none());
        assert!(!session.can_confirm_move());
    }

    #[test]
    fn test_move_finishing_after_rescan_keeps_new_plan() {
        // Arrange
        let scans = AtomicUsize::new(0);
        let (release, gate) = mpsc::channel::<()>();
        let gate = Mutex::new(gate);
        let mut backend = MockBackend::new();
        backend.expect_get_files().returning(move |_| {
            let n = scans.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ScanPlan {
                root_path: "/root".to_string(),
                items: vec![FileMapping {
                    source_path: format!("scan{}.txt", n),
                    destination_path: format!("docs/scan{}.txt", n),
                }],
            })
        });
        backend.expect_update_files().times(1).returning(move |_| {
            let _ = gate.lock().map(|rx| rx.recv());
            Ok(serde_json::json!({"status": "ok"}))
        });
        let mut session = session(backend);
        session.request_scan();
        drain(&mut session);
        session.confirm_move();
        session.request_scan();
        assert!(session.wait());

        // Act
        release.send(()).expect("test expectation should hold");
        drain(&mut session);

        // Assert
        let plan = session.plan().expect("test expectation should hold");
        assert_eq!(plan.items[0].source_path, "scan2.txt");
        assert_eq!(session.success_message(), Some(MOVE_SUCCESS));
        assert_eq!(session.move_state(), &LoadState::Loaded);
        assert!(session.can_confirm_move());
    }

    #[test]
    fn test_failed_move_shows_generic_error() {
        // Arrange
        let mut backend = MockBackend::new();
        scan_backend(&mut backend);
        backend.expect_update_files().returning(|_| {
            Err(ApiError::Status {
                status: 500,
                body: "disk full".to_string(),
            })
        });
        let mut session = session(backend);
        session.request_scan();
        drain(&mut session);

        // Act
        session.confirm_move();
        drain(&mut session);

        // Assert
        assert_eq!(session.error_message(), Some(MOVE_FAILURE));
        assert!(session.plan().is_some());
    }

    #[test]
    fn test_search_builds_read_only_tree() {
        // Arrange
        let mut backend = MockBackend::new();
        backend
            .expect_search_files()
            .withf(|query| query.query == "invoice" && query.scan.root_path == "/root")
            .returning(|_| {
                Ok(vec![SearchHit {
                    file: "bills/jan.pdf".to_string(),
                }])
            });
        let mut session = session(backend);
        session.set_search_query("invoice");

        // Act
        session.request_search();
        drain(&mut session);

        // Assert
        assert_eq!(
            paths(session.view(TreeIndex::Search)),
            vec!["/root", "/root/bills", "/root/bills/jan.pdf"]
        );
        assert_eq!(
            session.jump(TreeIndex::Search, "/root/bills/jan.pdf"),
            Err(CorrelationError::NotCorrelated(TreeIndex::Search))
        );
    }

    #[test]
    fn test_repeated_search_replaces_previous_results() {
        // Arrange
        let searches = AtomicUsize::new(0);
        let mut backend = MockBackend::new();
        backend.expect_search_files().returning(move |_| {
            let hit = match searches.fetch_add(1, Ordering::SeqCst) {
                0 => "bills/jan.pdf",
                _ => "notes/feb.txt",
            };
            Ok(vec![SearchHit {
                file: hit.to_string(),
            }])
        });
        let mut session = session(backend);
        session.request_search();
        drain(&mut session);

        // Act
        session.request_search();
        let kept_while_loading = paths(session.view(TreeIndex::Search));
        drain(&mut session);

        // Assert
        assert!(kept_while_loading.contains(&"/root/bills/jan.pdf".to_string()));
        let results = paths(session.view(TreeIndex::Search));
        assert!(results.contains(&"/root/notes/feb.txt".to_string()));
        assert!(!results.contains(&"/root/bills/jan.pdf".to_string()));
    }

    #[test]
    fn test_jump_before_scan_reports_missing_plan() {
        // Arrange
        let mut session = session(MockBackend::new());

        // Act
        let result = session.jump(TreeIndex::Source, "/root/a.txt");

        // Assert
        assert_eq!(result, Err(CorrelationError::NoPlan));
        assert_eq!(session.status(), Some("no scan plan is loaded"));
    }

    #[test]
    fn test_jump_between_scanned_trees() {
        // Arrange
        let mut backend = MockBackend::new();
        scan_backend(&mut backend);
        let mut session = session(backend);
        session.request_scan();
        drain(&mut session);

        // Act
        let jump = session
            .jump(TreeIndex::Source, "/root/a/b.txt")
            .expect("test expectation should hold");
        let missing = session.jump(TreeIndex::Destination, "/root/nope.txt");

        // Assert
        assert_eq!(jump.correlation.target_tree, TreeIndex::Destination);
        assert_eq!(jump.correlation.target_path, "/root/b.txt");
        assert!(matches!(missing, Err(CorrelationError::NotFound(_))));
        assert!(session.status().is_some());
    }
}
