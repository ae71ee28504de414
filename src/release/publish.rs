//! Publishing to the primary and secondary registries
//!
//! Builds and uploads run as external commands from the config root. Output is
//! captured; on failure the command's stderr becomes the error. No retries.

use crate::core::config::PublishCommands;
use crate::core::error::{ConfigError, Registry, ReleaseError, ReleaseResult};
use crate::release::version::SemanticVersion;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::process::Command;

/// What happened to one registry during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
  pub registry: Registry,
  pub attempted: bool,
  pub succeeded: bool,
}

impl PublishOutcome {
  pub fn skipped(registry: Registry) -> Self {
    Self {
      registry,
      attempted: false,
      succeeded: false,
    }
  }

  pub fn failed(registry: Registry) -> Self {
    Self {
      registry,
      attempted: true,
      succeeded: false,
    }
  }

  pub fn published(registry: Registry) -> Self {
    Self {
      registry,
      attempted: true,
      succeeded: true,
    }
  }
}

/// Builds and uploads one registry's package
pub trait RegistryPublisher {
  fn registry(&self) -> Registry;

  /// Checks that must pass before the release touches anything
  fn preflight(&self) -> ReleaseResult<()> {
    Ok(())
  }

  fn publish(&self, version: SemanticVersion) -> ReleaseResult<()>;
}

/// Publisher driven by the `build` / `upload` commands in release.toml
pub struct CommandPublisher {
  registry: Registry,
  package: String,
  commands: PublishCommands,
  root: PathBuf,
}

impl CommandPublisher {
  pub fn new(registry: Registry, package: impl Into<String>, commands: PublishCommands, root: impl Into<PathBuf>) -> Self {
    Self {
      registry,
      package: package.into(),
      commands,
      root: root.into(),
    }
  }

  fn substitute(&self, arg: &str, version: SemanticVersion) -> String {
    arg
      .replace("{version}", &version.to_string())
      .replace("{package}", &self.package)
  }

  /// Substitute placeholders and expand globs in upload arguments
  fn upload_args(&self, version: SemanticVersion) -> ReleaseResult<Vec<String>> {
    let mut args = Vec::with_capacity(self.commands.upload.len());
    for (idx, raw) in self.commands.upload.iter().enumerate() {
      let arg = self.substitute(raw, version);
      if idx == 0 || !is_glob(&arg) {
        args.push(arg);
        continue;
      }

      let pattern = self.root.join(&arg);
      let mut matched: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(Result::ok)
        .collect();
      if matched.is_empty() {
        return Err(ReleaseError::Upload {
          registry: self.registry,
          reason: format!("no build output matched '{}'", arg),
        });
      }
      matched.sort();
      args.extend(matched.into_iter().map(|p| p.to_string_lossy().into_owned()));
    }
    Ok(args)
  }

  fn run(&self, argv: &[String]) -> Result<(), String> {
    let (program, rest) = argv.split_first().ok_or_else(|| "empty command".to_string())?;
    tracing::debug!(registry = %self.registry, command = %argv.join(" "), "running");

    let output = Command::new(program)
      .args(rest)
      .current_dir(&self.root)
      .output()
      .map_err(|e| format!("failed to run {}: {}", program, e))?;

    if !output.stdout.is_empty() {
      tracing::debug!(registry = %self.registry, stdout = %String::from_utf8_lossy(&output.stdout));
    }
    if !output.status.success() {
      return Err(format!(
        "{} exited with {}\n{}",
        program,
        output.status,
        String::from_utf8_lossy(&output.stderr).trim_end()
      ));
    }
    Ok(())
  }
}

impl RegistryPublisher for CommandPublisher {
  fn registry(&self) -> Registry {
    self.registry
  }

  fn preflight(&self) -> ReleaseResult<()> {
    for name in &self.commands.required_env {
      if env::var_os(name).is_none() {
        return Err(
          ConfigError::MissingEnv {
            registry: self.registry,
            name: name.clone(),
          }
          .into(),
        );
      }
    }
    Ok(())
  }

  fn publish(&self, version: SemanticVersion) -> ReleaseResult<()> {
    let build: Vec<String> = self.commands.build.iter().map(|a| self.substitute(a, version)).collect();
    self.run(&build).map_err(|reason| ReleaseError::Build {
      registry: self.registry,
      reason,
    })?;

    let upload = self.upload_args(version)?;
    self.run(&upload).map_err(|reason| ReleaseError::Upload {
      registry: self.registry,
      reason,
    })?;

    tracing::info!(registry = %self.registry, package = %self.package, %version, "published");
    Ok(())
  }
}

fn is_glob(arg: &str) -> bool {
  arg.contains(['*', '?', '['])
}
