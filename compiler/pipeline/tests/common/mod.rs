#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use codegen::{CodegenError, DirContext, StageGenerator, StageGenerators, StageKind};
use config::{Config, RunContext, RunContextBuilder};
use exec::{CommandRunner, ExecError};
use ir::ServiceDescription;
use parser::{DefaultProtoParser, ParseError, ParseResult, ProtoParser};
use pipeline::{CompletionObserver, Generator};
use tempfile::TempDir;

pub const GREETER_PROTO: &str = r#"syntax = "proto3";

package greeter;
option go_package = "./greeter";

message HelloReq {
  string name = 1;
}

message HelloResp {
  string greeting = 1;
}

service Greeter {
  rpc SayHello(HelloReq) returns (HelloResp);
}
"#;

/// Ordered record of everything the collaborators were asked to do
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().expect("journal lock poisoned").push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> { self.0.lock().expect("journal lock poisoned").clone() }

    pub fn position(&self, entry: &str) -> Option<usize> { self.entries().iter().position(|e| e == entry) }

    pub fn stages(&self) -> Vec<String> {
        self.entries().into_iter().filter_map(|e| e.strip_prefix("stage:").map(str::to_string)).collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.entries().into_iter().filter_map(|e| e.strip_prefix("exec:").map(str::to_string)).collect()
    }
}

/// One recorded command together with what was on disk when it ran
#[derive(Debug, Clone)]
pub struct Call {
    pub command: String,
    pub dir: PathBuf,
    pub template_present: bool,
}

pub struct JournalRunner {
    journal: Journal,
    fail_prefix: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl JournalRunner {
    pub fn new(journal: Journal) -> Self { Self { journal, fail_prefix: None, calls: Mutex::new(Vec::new()) } }

    pub fn failing(journal: Journal, prefix: &str) -> Self {
        Self { fail_prefix: Some(prefix.to_string()), ..Self::new(journal) }
    }

    pub fn calls(&self) -> Vec<Call> { self.calls.lock().expect("calls lock poisoned").clone() }
}

impl CommandRunner for JournalRunner {
    fn run(&self, command: &str, dir: &Path) -> exec::Result<String> {
        self.journal.push(format!("exec:{}", command));
        self.calls.lock().expect("calls lock poisoned").push(Call {
            command: command.to_string(),
            dir: dir.to_path_buf(),
            template_present: pipeline::ent::pagination_template_path(&dir.join("ent")).is_file(),
        });
        match &self.fail_prefix {
            Some(prefix) if command.starts_with(prefix.as_str()) => Err(ExecError::Failed {
                command: command.to_string(),
                dir: dir.to_path_buf(),
                status: "exit status: 1".to_string(),
                output: "go: cannot determine module path".to_string(),
            }),
            _ => Ok(String::new()),
        }
    }
}

pub struct RecordingStage {
    kind: StageKind,
    journal: Journal,
    fail: bool,
}

impl StageGenerator for RecordingStage {
    fn kind(&self) -> StageKind { self.kind }

    fn generate(
        &self,
        _dir: &DirContext,
        _proto: &ServiceDescription,
        _cfg: &Config,
        _ctx: &RunContext,
    ) -> codegen::Result<()> {
        self.journal.push(format!("stage:{}", self.kind));
        if self.fail {
            return Err(CodegenError::Message(format!("{} failed", self.kind)));
        }
        Ok(())
    }
}

/// Recording fakes for every stage; stages in `failing` return an error
pub fn fake_stages(journal: &Journal, failing: &[StageKind]) -> StageGenerators {
    let mut stages = StageGenerators::empty();
    for kind in StageKind::ALL {
        stages.insert(Box::new(RecordingStage { kind, journal: journal.clone(), fail: failing.contains(&kind) }));
    }
    stages
}

/// Real parser that journals each call, or a parser that always fails
pub struct JournalParser {
    journal: Journal,
    fail: bool,
}

impl JournalParser {
    pub fn new(journal: Journal) -> Self { Self { journal, fail: false } }

    pub fn failing(journal: Journal) -> Self { Self { journal, fail: true } }
}

impl ProtoParser for JournalParser {
    fn parse(&self, path: &Path, multiple: bool) -> ParseResult<ServiceDescription> {
        self.journal.push("parse");
        if self.fail {
            return Err(ParseError::Syntax {
                path: path.to_path_buf(),
                line: 3,
                message: "expected ';'".to_string(),
            });
        }
        DefaultProtoParser::new().parse(path, multiple)
    }
}

#[derive(Default)]
pub struct CountingObserver {
    pub count: AtomicUsize,
    journal: Journal,
}

impl CountingObserver {
    pub fn new(journal: Journal) -> Self { Self { count: AtomicUsize::new(0), journal } }

    pub fn count(&self) -> usize { self.count.load(Ordering::SeqCst) }
}

impl CompletionObserver for CountingObserver {
    fn on_complete(&self, _output: &Path) {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.journal.push("done");
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.generation.check_toolchain = false;
    config
}

/// A scratch directory holding `greeter.proto`
pub fn workspace() -> TempDir {
    let temp = tempfile::tempdir().expect("Failed to create temporary directory");
    std::fs::write(temp.path().join("greeter.proto"), GREETER_PROTO).expect("Failed to write proto");
    temp
}

pub fn context(temp: &TempDir) -> RunContextBuilder {
    RunContext::builder().src(temp.path().join("greeter.proto")).output(temp.path().join("out"))
}

/// Everything a fake-backed run needs, plus handles to inspect afterwards
pub struct Harness {
    pub journal: Journal,
    pub runner: Arc<JournalRunner>,
    pub observer: Arc<CountingObserver>,
    pub generator: Generator,
}

pub fn harness(config: Config, runner: JournalRunner, parser: JournalParser, stages: StageGenerators) -> Harness {
    let journal = runner.journal.clone();
    let runner = Arc::new(runner);
    let observer = Arc::new(CountingObserver::new(journal.clone()));
    let generator = Generator::builder()
        .config(config)
        .runner(runner.clone())
        .parser(Arc::new(parser))
        .stages(stages)
        .observer(observer.clone())
        .build()
        .unwrap_or_else(|e| panic!("Failed to build generator: {}", e));
    Harness { journal, runner, observer, generator }
}

/// Fake stages, real parser, succeeding runner
pub fn default_harness(failing: &[StageKind]) -> Harness {
    let journal = Journal::default();
    harness(
        test_config(),
        JournalRunner::new(journal.clone()),
        JournalParser::new(journal.clone()),
        fake_stages(&journal, failing),
    )
}

pub const CORE_STAGES: [&str; 8] = ["etc", "pb", "config", "svc", "logic", "server", "main", "call"];
