//! Release command implementation

use crate::core::context::ReleaseContext;
use crate::core::error::{Registry, ReleaseResult};
use crate::release::{
  Collaborators, CommandPublisher, GitCommitter, RegistryFetcher, ReleaseOrchestrator, ReleasePlan, ReleaseReport,
  ReleaseRequest, ReleaseStage, Trigger, VersionStore,
};

/// Run the release plan command
pub fn run_release_plan(ctx: &ReleaseContext, trigger: Trigger, json: bool) -> ReleaseResult<()> {
  let request = ReleaseRequest::validate(&trigger.target, &trigger.primary, &trigger.secondary)?;
  let current = VersionStore::new(ctx.root.join(&ctx.config.package.version_file)).read()?;
  let plan = ReleasePlan::build(&ctx.config, request, current);

  if json {
    println!("{}", serde_json::to_string_pretty(&plan)?);
  } else {
    println!("⚙️  Using {}", ctx.config_path.display());
    print_plan(&plan);
  }
  Ok(())
}

/// Run the release apply command
pub fn run_release_apply(ctx: &ReleaseContext, trigger: Trigger, json: bool, no_push: bool) -> ReleaseResult<()> {
  let config = &ctx.config;
  let primary = CommandPublisher::new(
    Registry::Primary,
    &config.package.name,
    config.primary.commands.clone(),
    &ctx.root,
  );
  let secondary = CommandPublisher::new(
    Registry::Secondary,
    &config.package.name,
    config.secondary.commands.clone(),
    &ctx.root,
  );
  let fetcher = RegistryFetcher::new(!json);
  let committer = GitCommitter::new(&ctx.root, &config.git.remote, ctx.identity(), !no_push);

  let mut orchestrator = ReleaseOrchestrator::new(
    config,
    &ctx.root,
    Collaborators {
      primary: &primary,
      secondary: &secondary,
      fetcher: &fetcher,
      committer: &committer,
    },
  )
  .echo(!json);

  let report = orchestrator.run(&trigger).inspect_err(|_| {
    tracing::debug!(stages = ?orchestrator.trace(), "release stopped");
  })?;

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print_report(&report, no_push);
  }
  Ok(())
}

fn print_plan(plan: &ReleasePlan) {
  println!("📋 Release Plan for '{}'", plan.package);
  println!();
  println!("  Current:  {}", plan.current_version);
  println!("  Proposed: {} ({})", plan.proposed_version, plan.request.target);
  println!();
  println!("  Steps:");
  for stage in &plan.stages {
    if let Some(label) = describe_stage(*stage) {
      println!("    • {}", label);
    }
  }
  if let Some(locator) = &plan.artifact_locator {
    println!();
    println!("  Artifact: {}", locator);
  }
  println!();
  println!("🔍 Plan only (no changes applied)");
}

fn print_report(report: &ReleaseReport, no_push: bool) {
  println!();
  println!("✅ {} {} released!", report.package, report.version);
  for outcome in &report.outcomes {
    let status = match (outcome.attempted, outcome.succeeded) {
      (false, _) => "skipped",
      (true, true) => "published",
      (true, false) => "failed",
    };
    println!("   {:<9} {}", outcome.registry, status);
  }
  if let (Some(commit), true) = (&report.commit, no_push) {
    println!();
    println!("Next steps:");
    println!("  git push  # '{}' was committed locally only", commit.message);
  }
}

fn describe_stage(stage: ReleaseStage) -> Option<&'static str> {
  match stage {
    ReleaseStage::VersionBumped => Some("Update version file"),
    ReleaseStage::PrimaryPublished => Some("Build and upload to primary registry"),
    ReleaseStage::IntegrityVerified => Some("Fetch archive, pin SHA-256 in recipe"),
    ReleaseStage::SecondaryPublished => Some("Build and upload to secondary registry"),
    ReleaseStage::Committed => Some("Commit and push release"),
    _ => None,
  }
}
