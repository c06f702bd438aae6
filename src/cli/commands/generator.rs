//! `generator:{start,run,resume,stop,switch,list,reset,status}` (spec.md
//! §4.9, §6.5, SPEC_FULL.md B). Each handler is a thin wrapper over
//! [`cobbler_generation::GenerationLifecycle`]; the interesting behavior
//! lives there.

use camino::Utf8Path;
use cobbler_issues::{LABEL_IN_PROGRESS, LABEL_READY, generation_label};
use cobbler_runner::NativeRunner;
use cobbler_vcs::{GitVcs, Vcs};

use crate::cli::run::Runtime;
use crate::error::CobblerError;

pub async fn start(rt: &Runtime, base_branch: &str) -> Result<(), CobblerError> {
    let gen = rt.lifecycle().start(base_branch).await?;
    println!("started generation {} on branch {}", gen.name, gen.branch);
    Ok(())
}

pub async fn run_cycle(rt: &Runtime) -> Result<(), CobblerError> {
    let gen = rt.lifecycle().current_handle().await?;
    let summary = rt.lifecycle().run(&gen).await?;
    println!(
        "cycles completed: {}, proposed: {}, executed: {}, reset: {}",
        summary.cycles_completed, summary.tasks_proposed, summary.tasks_executed, summary.tasks_reset
    );
    Ok(())
}

pub async fn resume(rt: &Runtime) -> Result<(), CobblerError> {
    let summary = rt.lifecycle().resume().await?;
    println!(
        "cycles completed: {}, proposed: {}, executed: {}, reset: {}",
        summary.cycles_completed, summary.tasks_proposed, summary.tasks_executed, summary.tasks_reset
    );
    Ok(())
}

pub async fn stop(rt: &Runtime) -> Result<(), CobblerError> {
    let gen = rt.lifecycle().current_handle().await?;
    rt.lifecycle().stop(&gen).await?;
    println!("stopped generation {} (merged and tagged)", gen.name);
    Ok(())
}

pub async fn reset(rt: &Runtime) -> Result<(), CobblerError> {
    let gen = rt.lifecycle().current_handle().await?;
    rt.lifecycle().reset(&gen).await?;
    println!("abandoned generation {}", gen.name);
    Ok(())
}

pub async fn propose(rt: &Runtime) -> Result<(), CobblerError> {
    let gen = rt.lifecycle().current_handle().await?;
    let proposed = rt.lifecycle().propose(&gen).await?;
    println!("proposed {proposed} task(s)");
    Ok(())
}

pub async fn execute(rt: &Runtime) -> Result<(), CobblerError> {
    let gen = rt.lifecycle().current_handle().await?;
    let (executed, reset) = rt.lifecycle().execute(&gen).await?;
    println!("executed {executed} task(s), reset {reset}");
    Ok(())
}

pub async fn status(rt: &Runtime) -> Result<(), CobblerError> {
    let gen = rt.lifecycle().current_handle().await?;
    let label = generation_label(&rt.params.prefix, &gen.name);
    let ready = rt.issues.list_open_issues_with_label(LABEL_READY).await?;
    let in_progress = rt.issues.list_open_issues_with_label(LABEL_IN_PROGRESS).await?;
    let gen_scoped_ready = ready.iter().filter(|i| i.labels.iter().any(|l| l == &label)).count();
    let gen_scoped_in_progress = in_progress.iter().filter(|i| i.labels.iter().any(|l| l == &label)).count();

    println!("generation: {}", gen.name);
    println!("branch: {}", gen.branch);
    println!("base branch: {}", gen.base_branch);
    println!("ready issues: {gen_scoped_ready}");
    println!("in-progress issues: {gen_scoped_in_progress}");
    Ok(())
}

/// Check out `name` without touching lifecycle state — a plain branch
/// switch, useful when an operator wants to inspect a past generation.
pub async fn switch(vcs: &GitVcs<NativeRunner>, repo_root: &Utf8Path, name: &str) -> Result<(), CobblerError> {
    vcs.checkout(repo_root, name).await?;
    println!("switched to {name}");
    Ok(())
}

/// List generation branches matching `prefix-*`, with lifecycle state
/// inferred from which tags are present (SPEC_FULL.md B).
pub async fn list(vcs: &GitVcs<NativeRunner>, repo_root: &Utf8Path, prefix: &str) -> Result<(), CobblerError> {
    let glob = format!("{prefix}-*");
    let branches = vcs.list_branches(repo_root, &glob).await?;
    if branches.is_empty() {
        println!("no generation branches matching {glob}");
        return Ok(());
    }
    for branch in branches {
        let state = infer_state(vcs, repo_root, &branch).await?;
        println!("{branch}: {state}");
    }
    Ok(())
}

async fn infer_state(vcs: &GitVcs<NativeRunner>, repo_root: &Utf8Path, branch: &str) -> Result<&'static str, CobblerError> {
    for (suffix, state) in [("-abandoned", "abandoned"), ("-merged", "merged"), ("-finished", "finished"), ("-start", "active")] {
        let tags = vcs.list_tags(repo_root, &format!("{branch}{suffix}")).await?;
        if !tags.is_empty() {
            return Ok(state);
        }
    }
    Ok("unknown")
}
