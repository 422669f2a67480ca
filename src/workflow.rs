use crate::api::HttpBackend;
use crate::correlator::TreeIndex;
use crate::extensions::ExtensionSet;
use crate::orchestrator::Orchestrator;
use crate::session::{LoadState, Session};
use crate::tree_view::TreeView;
use crate::{cli, logging, tui};
use anyhow::{Context, Result, anyhow, bail};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// Builds the session from CLI arguments: backend client, form defaults, path style.
fn build_session(cli_args: &cli::Cli) -> Result<Session> {
    let timeout = cli_args.timeout_secs.map(Duration::from_secs);
    let backend = HttpBackend::new(&cli_args.server, timeout)
        .with_context(|| format!("cannot use server '{}'", cli_args.server))?;
    let mut session = Session::new(Orchestrator::new(Arc::new(backend)), cli_args.path_style);

    session.extensions = ExtensionSet::with_selection(&cli_args.extensions)
        .context("invalid --ext value")?;
    session.recursive = cli_args.recursive;
    if let Some(root) = &cli_args.root {
        session.set_root_path(root);
    }
    Ok(session)
}

// Renders every node of a tree, fully expanded, using its glyph labels.
fn render_tree(view: &TreeView) -> String {
    let mut lines: Vec<&str> = view
        .flatten()
        .iter()
        .map(|row| view.label(row.id))
        .collect();
    if lines.is_empty() {
        lines.push("(empty)");
    }
    lines.join("\n")
}

fn print_tree(session: &Session, tree: TreeIndex) {
    if let Some(view) = session.view(tree) {
        println!(
            "{} ({} files):\n{}\n",
            tree.title(),
            view.tree().file_count(),
            render_tree(view)
        );
    }
}

// Blocks until every outstanding request has been answered.
fn wait_for_all(session: &mut Session) {
    while session.wait() {}
}

fn run_headless_search(session: &mut Session, query: &str) -> Result<()> {
    session.set_search_query(query);
    session.request_search();
    wait_for_all(session);

    if let LoadState::Failed(message) = session.tree_state(TreeIndex::Search) {
        bail!("{}", message);
    }
    print_tree(session, TreeIndex::Search);
    Ok(())
}

fn run_headless_scan(session: &mut Session, apply: bool) -> Result<()> {
    // Step 1: Ask the server for a plan.
    session.request_scan();
    wait_for_all(session);
    if let LoadState::Failed(message) = session.tree_state(TreeIndex::Source) {
        bail!("{}", message);
    }

    let plan = session
        .plan()
        .cloned()
        .ok_or_else(|| anyhow!("server returned no plan"))?;
    if plan.items.is_empty() {
        println!("No files matched the specified root and extensions.");
        return Ok(());
    }

    // Step 2: Show both trees and the individual moves.
    print_tree(session, TreeIndex::Source);
    print_tree(session, TreeIndex::Destination);
    for item in &plan.items {
        println!("{} -> {}", item.source_path, item.destination_path);
    }

    // Step 3: Optionally apply.
    if !apply {
        println!(
            "\n(Dry run: {} files would be moved. Pass --apply to move them.)",
            plan.items.len()
        );
        return Ok(());
    }
    session.confirm_move();
    wait_for_all(session);
    if let Some(message) = session.error_message() {
        bail!("{}", message);
    }
    if let Some(message) = session.success_message() {
        println!("✅ {}", message);
    }
    Ok(())
}

// Main entry for the reshelf application logic.
pub fn run_reshelf(cli_args: cli::Cli) -> Result<()> {
    logging::init(logging::LogTarget::choose(
        cli_args.log_file.as_deref(),
        cli_args.headless,
    ))?;
    info!(server = %cli_args.server, headless = cli_args.headless, "starting");

    let mut session = build_session(&cli_args)?;

    if !cli_args.headless {
        return tui::run_tui(session);
    }
    match &cli_args.search {
        Some(query) => run_headless_search(&mut session, query),
        None => run_headless_scan(&mut session, cli_args.apply),
    }
}
