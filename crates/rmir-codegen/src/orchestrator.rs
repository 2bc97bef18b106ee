//! # Orchestrator
//!
//! Drives the compiler over every discovered schema.
//!
//! Execution is anchored on [`CodegenConfig::repo_root`]: relative source
//! and destination directories are interpreted against it, and the
//! compiler is started with it as working directory. The caller's working
//! directory never matters and is never changed.
//!
//! Planning ([`Orchestrator::plan`]) reads every schema before the first
//! compiler run, so a malformed `package` statement or two schemas that
//! would overwrite each other's output abort the run with nothing written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rmir_core::{CodegenSection, CommandRunner, FailurePolicy, Invocation, SystemRunner};
use serde::Serialize;

use crate::artifact::Artifact;
use crate::compiler::CompilerCommand;
use crate::discover::discover_schemas;
use crate::error::CodegenError;
use crate::schema::SchemaFile;

/// Explicit inputs of a compile run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenConfig {
    pub repo_root: PathBuf,
    pub source_dir: PathBuf,
    pub destination_dir: PathBuf,
    pub compiler: CompilerCommand,
    pub failure_policy: FailurePolicy,
}

impl CodegenConfig {
    /// Config with the default compiler and fail-fast policy.
    pub fn new(
        repo_root: impl Into<PathBuf>,
        source_dir: impl Into<PathBuf>,
        destination_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repo_root: repo_root.into(),
            source_dir: source_dir.into(),
            destination_dir: destination_dir.into(),
            compiler: CompilerCommand::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Config from the `codegen:` section of `rmir.yaml`.
    pub fn from_section(repo_root: impl Into<PathBuf>, section: &CodegenSection) -> Self {
        Self {
            repo_root: repo_root.into(),
            source_dir: section.source_dir.clone(),
            destination_dir: section.destination_dir.clone(),
            compiler: CompilerCommand::from_command_line(&section.compiler),
            failure_policy: section.failure_policy,
        }
    }

    pub fn with_compiler(mut self, compiler: CompilerCommand) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// `path` as seen from this process. Absolute paths are kept as is.
    fn anchored(&self, path: &Path) -> PathBuf {
        self.repo_root.join(path)
    }
}

/// One planned compiler run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileJob {
    /// The schema, addressed relative to the repository root.
    pub schema: SchemaFile,
    /// The two files the run must produce, relative to the repository root.
    pub artifacts: [Artifact; 2],
}

/// A schema whose compiler run succeeded and produced both artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledSchema {
    pub schema: PathBuf,
    pub artifacts: [PathBuf; 2],
}

/// Outcome of a successful [`Orchestrator::compile_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompileReport {
    pub compiled: Vec<CompiledSchema>,
}

impl CompileReport {
    pub fn artifact_count(&self) -> usize {
        self.compiled.len() * 2
    }
}

/// Compiles schemas through a [`CommandRunner`].
pub struct Orchestrator<R> {
    config: CodegenConfig,
    runner: R,
}

impl<R: CommandRunner> Orchestrator<R> {
    pub fn new(config: CodegenConfig, runner: R) -> Self {
        Self { config, runner }
    }

    /// Discover and read every schema, producing one job per schema.
    pub fn plan(&self) -> Result<Vec<CompileJob>, CodegenError> {
        let source = self.config.anchored(&self.config.source_dir);
        let mut jobs = Vec::new();
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
        for path in discover_schemas(&source)? {
            let loaded = SchemaFile::read(&path)?;
            // Jobs name schemas relative to the repo root, like artifacts.
            let relative = self.config.source_dir.join(loaded.file_name());
            let schema = loaded.with_path(relative);
            let artifacts = Artifact::for_schema(&schema, &self.config.destination_dir);
            for artifact in &artifacts {
                if let Some(first) =
                    claimed.insert(artifact.path.clone(), schema.path().to_path_buf())
                {
                    return Err(CodegenError::DuplicateArtifact {
                        first,
                        second: schema.path().to_path_buf(),
                        artifact: artifact.path.clone(),
                    });
                }
            }
            jobs.push(CompileJob { schema, artifacts });
        }
        Ok(jobs)
    }

    /// Compiler invocation for `job`.
    pub fn invocation(&self, job: &CompileJob) -> Invocation {
        self.config.compiler.invocation(
            &job.schema,
            &self.config.source_dir,
            &self.config.destination_dir,
            &self.config.repo_root,
        )
    }

    /// Run the compiler once for `job` and verify both artifacts exist.
    pub fn compile_job(&self, job: &CompileJob) -> Result<CompiledSchema, CodegenError> {
        let schema = job.schema.path().to_path_buf();
        let invocation = self.invocation(job);
        tracing::debug!(command = %invocation.command_line(), "invoking compiler");
        let status =
            self.runner
                .run(&invocation)
                .map_err(|source| CodegenError::CompilerLaunch {
                    schema: schema.clone(),
                    source,
                })?;
        if !status.success() {
            return Err(CodegenError::CompilerFailed { schema, status });
        }
        for artifact in &job.artifacts {
            if !self.config.anchored(&artifact.path).is_file() {
                return Err(CodegenError::MissingArtifact {
                    schema,
                    artifact: artifact.path.clone(),
                });
            }
        }
        tracing::info!(
            schema = %schema.display(),
            namespace = %job.schema.namespace(),
            "compiled"
        );
        Ok(CompiledSchema {
            schema,
            artifacts: job.artifacts.clone().map(|a| a.path),
        })
    }

    /// Lazily compile `jobs` in order. Nothing runs until the iterator is
    /// advanced; each step blocks until the compiler exits.
    pub fn compile_iter<'a>(
        &'a self,
        jobs: &'a [CompileJob],
    ) -> impl Iterator<Item = Result<CompiledSchema, CodegenError>> + 'a {
        jobs.iter().map(move |job| self.compile_job(job))
    }

    /// Plan and compile every schema, aggregating per the failure policy.
    pub fn compile_all(&self) -> Result<CompileReport, CodegenError> {
        let jobs = self.plan()?;
        if jobs.is_empty() {
            tracing::info!(
                source = %self.config.source_dir.display(),
                "no schema files found; nothing to compile"
            );
            return Ok(CompileReport::default());
        }
        let destination = self.config.anchored(&self.config.destination_dir);
        std::fs::create_dir_all(&destination).map_err(|source| {
            CodegenError::CreateDestination {
                path: destination.clone(),
                source,
            }
        })?;

        let compiled = match self.config.failure_policy {
            FailurePolicy::FailFast => self
                .compile_iter(&jobs)
                .collect::<Result<Vec<_>, _>>()?,
            FailurePolicy::CollectAll => {
                let mut compiled = Vec::new();
                let mut failures = Vec::new();
                for result in self.compile_iter(&jobs) {
                    match result {
                        Ok(done) => compiled.push(done),
                        Err(e) => {
                            tracing::warn!("{e}");
                            failures.push(e);
                        }
                    }
                }
                if !failures.is_empty() {
                    return Err(CodegenError::Failures {
                        total: jobs.len(),
                        failures,
                    });
                }
                compiled
            }
        };
        tracing::info!(schemas = compiled.len(), "schema compilation finished");
        Ok(CompileReport { compiled })
    }

    /// Invocations `compile_all` would run, without running them.
    pub fn dry_run(&self) -> Result<Vec<Invocation>, CodegenError> {
        Ok(self.plan()?.iter().map(|job| self.invocation(job)).collect())
    }
}

/// Compile with the host's processes.
pub fn compile_all(config: CodegenConfig) -> Result<CompileReport, CodegenError> {
    Orchestrator::new(config, SystemRunner).compile_all()
}

#[cfg(test)]
mod tests {
    use rmir_core::process::testing::ScriptedRunner;
    use rmir_core::{CapturedOutput, CoreError, ProcessStatus};

    use super::*;

    /// Stand-in for protoc: writes both outputs where protoc would.
    fn fake_protoc(inv: &Invocation) -> Result<CapturedOutput, CoreError> {
        let root = inv.get_current_dir().expect("compiler runs in repo root");
        let args: Vec<String> = inv
            .get_args()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let input = args.last().expect("input file");
        let (dir, file) = input.rsplit_once('/').unwrap_or(("", input.as_str()));
        let module = format!("{}_pb2", file.trim_end_matches(".proto").replace('-', "_"));
        for (option, ext) in [("--python_out=", "py"), ("--pyi_out=", "pyi")] {
            let out = args
                .iter()
                .find_map(|a| a.strip_prefix(option))
                .expect("output option");
            let target = root.join(out).join(dir);
            std::fs::create_dir_all(&target).unwrap();
            std::fs::write(
                target.join(format!("{module}.{ext}")),
                format!("# generated from {input}\n"),
            )
            .unwrap();
        }
        Ok(CapturedOutput::success(""))
    }

    fn repo_with(schemas: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let protos = dir.path().join("protos");
        std::fs::create_dir_all(&protos).unwrap();
        for (name, text) in schemas {
            std::fs::write(protos.join(name), text).unwrap();
        }
        dir
    }

    fn config(repo: &tempfile::TempDir) -> CodegenConfig {
        CodegenConfig::new(repo.path(), "protos", "out")
    }

    fn files_under(dir: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    found.extend(files_under(&path));
                } else {
                    found.push(path);
                }
            }
        }
        found.sort();
        found
    }

    #[test]
    fn single_schema_produces_two_artifacts_under_namespace() {
        let repo = repo_with(&[("note.proto", "syntax = \"proto3\";\npackage music.note;\n")]);
        let runner = ScriptedRunner::new(fake_protoc);
        let report = Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap();

        assert_eq!(report.compiled.len(), 1);
        assert_eq!(report.artifact_count(), 2);
        let note_dir = repo.path().join("out").join("music").join("note");
        assert_eq!(
            files_under(&repo.path().join("out")),
            vec![note_dir.join("note_pb2.py"), note_dir.join("note_pb2.pyi")]
        );
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(runner.calls()[0].get_current_dir(), Some(repo.path()));
    }

    #[test]
    fn report_paths_are_relative_to_repo_root() {
        let repo = repo_with(&[("note.proto", "package music.note;")]);
        let runner = ScriptedRunner::new(fake_protoc);
        let report = Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap();
        let compiled = &report.compiled[0];
        assert_eq!(compiled.schema, Path::new("protos").join("note.proto"));
        assert_eq!(
            compiled.artifacts[0],
            Path::new("out").join("music").join("note").join("note_pb2.py")
        );
    }

    #[test]
    fn empty_source_directory_succeeds_with_nothing() {
        let repo = repo_with(&[]);
        let runner = ScriptedRunner::new(fake_protoc);
        let report = Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap();
        assert!(report.compiled.is_empty());
        assert!(runner.calls().is_empty());
        assert!(!repo.path().join("out").exists());
    }

    #[test]
    fn missing_source_directory_is_fatal() {
        let repo = tempfile::tempdir().unwrap();
        let runner = ScriptedRunner::new(fake_protoc);
        let err = Orchestrator::new(CodegenConfig::new(repo.path(), "protos", "out"), &runner)
            .compile_all()
            .unwrap_err();
        assert!(matches!(err, CodegenError::MissingSourceDirectory { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn schemas_compile_in_file_name_order() {
        let repo = repo_with(&[
            ("c.proto", "package x;"),
            ("a.proto", "package x;"),
            ("b.proto", "package y;"),
        ]);
        let runner = ScriptedRunner::new(fake_protoc);
        Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap();
        let inputs: Vec<String> = runner
            .calls()
            .iter()
            .map(|c| c.get_args().last().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(inputs, vec!["x/a.proto", "y/b.proto", "x/c.proto"]);
    }

    #[test]
    fn fail_fast_stops_at_first_failure_and_passes_status_through() {
        let repo = repo_with(&[("a.proto", "package x;"), ("b.proto", "package x;")]);
        let runner = ScriptedRunner::with_status(ProcessStatus::from_code(3));
        let err = Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap_err();
        match &err {
            CodegenError::CompilerFailed { schema, status } => {
                assert_eq!(schema, &Path::new("protos").join("a.proto"));
                assert_eq!(*status, ProcessStatus::from_code(3));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.exit_code(), 3);
        assert_eq!(runner.calls().len(), 1);
        assert!(files_under(&repo.path().join("out")).is_empty());
    }

    #[test]
    fn collect_all_runs_every_schema_and_reports_failures() {
        let repo = repo_with(&[
            ("a.proto", "package x;"),
            ("b.proto", "package x;"),
            ("c.proto", "package x;"),
        ]);
        let runner = ScriptedRunner::new(|inv| {
            let input = inv.get_args().last().unwrap().to_string_lossy().into_owned();
            if input.ends_with("b.proto") {
                Ok(CapturedOutput::with_status(ProcessStatus::from_code(5)))
            } else {
                fake_protoc(inv)
            }
        });
        let cfg = config(&repo).with_failure_policy(FailurePolicy::CollectAll);
        let err = Orchestrator::new(cfg, &runner).compile_all().unwrap_err();
        match &err {
            CodegenError::Failures { total, failures } => {
                assert_eq!(*total, 3);
                assert_eq!(failures.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.exit_code(), 5);
        assert_eq!(runner.calls().len(), 3);
        let out = repo.path().join("out").join("x");
        assert!(out.join("a_pb2.py").is_file());
        assert!(out.join("c_pb2.pyi").is_file());
        assert!(!out.join("b_pb2.py").exists());
    }

    #[test]
    fn compile_iter_is_lazy() {
        let repo = repo_with(&[("a.proto", "package x;"), ("b.proto", "package x;")]);
        let runner = ScriptedRunner::new(fake_protoc);
        let orchestrator = Orchestrator::new(config(&repo), &runner);
        let jobs = orchestrator.plan().unwrap();
        std::fs::create_dir_all(repo.path().join("out")).unwrap();

        let mut results = orchestrator.compile_iter(&jobs);
        assert!(runner.calls().is_empty());
        assert!(results.next().unwrap().is_ok());
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn zero_exit_without_artifacts_is_error() {
        let repo = repo_with(&[("note.proto", "package music.note;")]);
        let runner = ScriptedRunner::succeeding();
        let err = Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap_err();
        match err {
            CodegenError::MissingArtifact { artifact, .. } => assert_eq!(
                artifact,
                Path::new("out").join("music").join("note").join("note_pb2.py")
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_compiler_exits_127() {
        let repo = repo_with(&[("note.proto", "package music.note;")]);
        let runner = ScriptedRunner::not_found();
        let err = Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap_err();
        assert!(matches!(err, CodegenError::CompilerLaunch { .. }));
        assert_eq!(err.exit_code(), 127);
    }

    #[test]
    fn field_named_package_does_not_abort_the_run() {
        let repo = repo_with(&[
            ("dep.proto", "syntax = \"proto3\";\nmessage Dependency {\n  string package = 1;\n}\n"),
            ("note.proto", "package music.note;"),
        ]);
        let runner = ScriptedRunner::new(fake_protoc);
        let report = Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap();
        assert_eq!(report.compiled.len(), 2);
        assert!(repo.path().join("out").join("dep_pb2.py").is_file());
        assert!(repo.path().join("out").join("dep_pb2.pyi").is_file());
    }

    #[test]
    fn colliding_module_names_are_rejected_before_compiling() {
        let repo = repo_with(&[
            ("my-note.proto", "package music;"),
            ("my_note.proto", "package music;"),
        ]);
        let runner = ScriptedRunner::new(fake_protoc);
        let err = Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap_err();
        assert!(matches!(err, CodegenError::DuplicateArtifact { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn invalid_package_is_rejected_before_compiling() {
        let repo = repo_with(&[("a.proto", "package ok;"), ("b.proto", "package no..pe;")]);
        let runner = ScriptedRunner::new(fake_protoc);
        let err = Orchestrator::new(config(&repo), &runner)
            .compile_all()
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidNamespace { .. }));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn rerun_regenerates_identical_bytes() {
        let repo = repo_with(&[("note.proto", "package music.note;")]);
        let runner = ScriptedRunner::new(fake_protoc);
        let orchestrator = Orchestrator::new(config(&repo), &runner);
        let artifact = repo
            .path()
            .join("out")
            .join("music")
            .join("note")
            .join("note_pb2.py");

        orchestrator.compile_all().unwrap();
        let first = std::fs::read(&artifact).unwrap();
        orchestrator.compile_all().unwrap();
        let second = std::fs::read(&artifact).unwrap();

        assert_eq!(first, second);
        assert_eq!(runner.calls().len(), 2, "every run invokes the compiler");
    }

    #[test]
    fn dry_run_builds_invocations_without_running() {
        let repo = repo_with(&[("note.proto", "package music.note;")]);
        let runner = ScriptedRunner::new(fake_protoc);
        let invocations = Orchestrator::new(config(&repo), &runner).dry_run().unwrap();
        assert_eq!(invocations.len(), 1);
        assert_eq!(
            invocations[0].command_line(),
            "protoc --proto_path=music/note=protos --proto_path=protos \
             --python_out=out --pyi_out=out music/note/note.proto"
        );
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn config_from_section_copies_every_field() {
        let section = CodegenSection {
            source_dir: PathBuf::from("schemas"),
            destination_dir: PathBuf::from("gen"),
            compiler: "protoc-25".into(),
            failure_policy: FailurePolicy::CollectAll,
        };
        let cfg = CodegenConfig::from_section("/repo", &section);
        assert_eq!(cfg.repo_root, PathBuf::from("/repo"));
        assert_eq!(cfg.source_dir, PathBuf::from("schemas"));
        assert_eq!(cfg.destination_dir, PathBuf::from("gen"));
        assert_eq!(cfg.compiler.program(), "protoc-25");
        assert_eq!(cfg.failure_policy, FailurePolicy::CollectAll);
    }
}
