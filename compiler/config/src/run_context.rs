//! Per-invocation options for one generation run.

use std::path::PathBuf;

use crate::ConfigError;

/// Options controlling a single generation run
///
/// Empty strings mean "not requested": an empty `module_name` skips module
/// initialization, and the migration step only runs when both
/// `go_zero_version` and `tool_version` are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Source protocol-definition file
    pub src: PathBuf,
    /// Full protoc command line for the pb stage; when empty one is built
    /// from `go_output`, and with neither set the stage is skipped
    pub protoc_cmd: String,
    /// Directory protoc writes the grpc bindings to
    pub proto_gen_grpc_dir: PathBuf,
    /// Directory protoc writes the message bindings to
    pub proto_gen_go_dir: PathBuf,
    /// Bindings come from the split protoc-gen-go and protoc-gen-go-grpc
    /// plugins rather than the legacy `plugins=grpc` mode of protoc-gen-go
    pub is_google_plugin: bool,
    /// `--go_out` value for a built protoc command
    pub go_output: PathBuf,
    /// `--go-grpc_out` value for a built protoc command (google plugins only)
    pub grpc_output: PathBuf,
    /// Root of the generated service project
    pub output: PathBuf,
    /// Follow imports and allow several services in one source
    pub multiple: bool,
    /// Ent schema directory
    pub schema: PathBuf,
    /// Run the ORM scaffolding integration after the stages
    pub ent: bool,
    /// Module path for `go mod init` (empty skips initialization)
    pub module_name: String,
    /// go-zero version for the migration step
    pub go_zero_version: String,
    /// Tool version for the migration step
    pub tool_version: String,
    /// Port the generated service listens on
    pub port: u16,
    /// Emit a Makefile
    pub make_file: bool,
    /// Emit a Dockerfile
    pub docker_file: bool,
}

impl RunContext {
    /// Create a new builder for RunContext
    pub fn builder() -> RunContextBuilder { RunContextBuilder::default() }

    /// Both migration versions, or `None` unless both are non-empty
    pub fn migration_versions(&self) -> Option<(&str, &str)> {
        if self.go_zero_version.is_empty() || self.tool_version.is_empty() {
            return None;
        }
        Some((self.go_zero_version.as_str(), self.tool_version.as_str()))
    }

    /// Module path to initialize, if one was requested
    pub fn module_to_init(&self) -> Option<&str> {
        (!self.module_name.is_empty()).then_some(self.module_name.as_str())
    }

    /// The protoc command the pb stage runs, if any
    ///
    /// An explicit `protoc_cmd` wins. Otherwise a command is built from
    /// `go_output`: the google plugins get separate `--go_out` and
    /// `--go-grpc_out` flags, the legacy plugin gets `--go_out=plugins=grpc:`.
    pub fn protoc_command(&self) -> Option<String> {
        let explicit = self.protoc_cmd.trim();
        if !explicit.is_empty() {
            return Some(explicit.to_string());
        }
        if self.go_output.as_os_str().is_empty() {
            return None;
        }

        let go_out = self.go_output.display();
        if self.is_google_plugin {
            let grpc_out =
                if self.grpc_output.as_os_str().is_empty() { &self.go_output } else { &self.grpc_output };
            Some(format!("protoc {} --go_out={} --go-grpc_out={}", self.src.display(), go_out, grpc_out.display()))
        } else {
            Some(format!("protoc {} --go_out=plugins=grpc:{}", self.src.display(), go_out))
        }
    }

    /// Reject contexts that cannot produce a project
    ///
    /// A single set migration version is accepted; that step is skipped, not rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.src.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("source protocol file is required".to_string()));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output directory is required".to_string()));
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be between 1 and 65535".to_string()));
        }
        if self.module_name.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "module name '{}' must not contain whitespace",
                self.module_name
            )));
        }
        if !self.is_google_plugin && !self.grpc_output.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "a grpc output directory needs the google protoc plugins".to_string(),
            ));
        }
        if self.is_google_plugin
            && !self.go_output.as_os_str().is_empty()
            && !self.grpc_output.as_os_str().is_empty()
            && self.go_output != self.grpc_output
        {
            return Err(ConfigError::Invalid(format!(
                "go output '{}' and grpc output '{}' must be the same directory",
                self.go_output.display(),
                self.grpc_output.display()
            )));
        }
        Ok(())
    }
}

/// Builder for RunContext
#[derive(Debug, Clone)]
pub struct RunContextBuilder {
    ctx: RunContext,
}

impl Default for RunContextBuilder {
    fn default() -> Self { Self { ctx: RunContext { port: 8080, ..RunContext::default() } } }
}

impl RunContextBuilder {
    /// Set the source protocol file
    pub fn src(mut self, src: impl Into<PathBuf>) -> Self {
        self.ctx.src = src.into();
        self
    }

    /// Set the protoc command
    pub fn protoc_cmd(mut self, cmd: impl Into<String>) -> Self {
        self.ctx.protoc_cmd = cmd.into();
        self
    }

    /// Set the directories protoc writes message and grpc bindings to
    pub fn proto_gen_dirs(mut self, go_dir: impl Into<PathBuf>, grpc_dir: impl Into<PathBuf>) -> Self {
        self.ctx.proto_gen_go_dir = go_dir.into();
        self.ctx.proto_gen_grpc_dir = grpc_dir.into();
        self
    }

    /// Set the protoc `--go_out` / `--go-grpc_out` values
    pub fn protoc_outputs(mut self, go_out: impl Into<PathBuf>, grpc_out: impl Into<PathBuf>) -> Self {
        self.ctx.go_output = go_out.into();
        self.ctx.grpc_output = grpc_out.into();
        self
    }

    /// Mark the bindings as produced by the upstream plugins
    pub fn google_plugin(mut self, enabled: bool) -> Self {
        self.ctx.is_google_plugin = enabled;
        self
    }

    /// Set the project output directory
    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.ctx.output = output.into();
        self
    }

    /// Enable multi-file mode
    pub fn multiple(mut self, multiple: bool) -> Self {
        self.ctx.multiple = multiple;
        self
    }

    /// Request ORM scaffolding with the given schema directory
    pub fn ent(mut self, enabled: bool, schema: impl Into<PathBuf>) -> Self {
        self.ctx.ent = enabled;
        self.ctx.schema = schema.into();
        self
    }

    /// Set the module path to initialize
    pub fn module_name(mut self, module: impl Into<String>) -> Self {
        self.ctx.module_name = module.into();
        self
    }

    /// Set the migration versions
    pub fn versions(mut self, go_zero: impl Into<String>, tool: impl Into<String>) -> Self {
        self.ctx.go_zero_version = go_zero.into();
        self.ctx.tool_version = tool.into();
        self
    }

    /// Set the listen port
    pub fn port(mut self, port: u16) -> Self {
        self.ctx.port = port;
        self
    }

    /// Toggle Makefile emission
    pub fn make_file(mut self, enabled: bool) -> Self {
        self.ctx.make_file = enabled;
        self
    }

    /// Toggle Dockerfile emission
    pub fn docker_file(mut self, enabled: bool) -> Self {
        self.ctx.docker_file = enabled;
        self
    }

    /// Build the RunContext, validating it
    pub fn build(self) -> Result<RunContext, ConfigError> {
        self.ctx.validate()?;
        Ok(self.ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let ctx = RunContext::builder()
            .src("greeter.proto")
            .output("out")
            .build()
            .expect("minimal context should build");
        assert_eq!(ctx.port, 8080);
        assert!(ctx.module_to_init().is_none());
        assert!(ctx.migration_versions().is_none());
        assert!(!ctx.ent && !ctx.make_file && !ctx.docker_file);
    }

    #[test]
    fn test_migration_versions_require_both() {
        let base = RunContext::builder().src("a.proto").output("out");
        let only_zero = base.clone().versions("v1.6.0", "").build().expect("should build");
        let only_tool = base.clone().versions("", "v1.6.0").build().expect("should build");
        let both = base.versions("v1.6.0", "v1.6.1").build().expect("should build");

        assert!(only_zero.migration_versions().is_none());
        assert!(only_tool.migration_versions().is_none());
        assert_eq!(both.migration_versions(), Some(("v1.6.0", "v1.6.1")));
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        let missing_src = RunContext::builder().output("out").build();
        assert!(matches!(missing_src, Err(ConfigError::Invalid(msg)) if msg.contains("source")));

        let missing_out = RunContext::builder().src("a.proto").build();
        assert!(matches!(missing_out, Err(ConfigError::Invalid(msg)) if msg.contains("output")));

        let zero_port = RunContext::builder().src("a.proto").output("out").port(0).build();
        assert!(matches!(zero_port, Err(ConfigError::Invalid(msg)) if msg.contains("port")));

        let bad_module =
            RunContext::builder().src("a.proto").output("out").module_name("a b").build();
        assert!(matches!(bad_module, Err(ConfigError::Invalid(msg)) if msg.contains("whitespace")));
    }

    #[test]
    fn test_protoc_command() {
        let base = RunContext::builder().src("greeter.proto").output("out");

        let none = base.clone().build().expect("should build");
        assert_eq!(none.protoc_command(), None);

        let explicit = base.clone().protoc_cmd(" protoc x.proto --go_out=. ").protoc_outputs("types", "").build();
        assert_eq!(explicit.expect("should build").protoc_command().as_deref(), Some("protoc x.proto --go_out=."));

        let legacy = base.clone().protoc_outputs("types", "").build().expect("should build");
        assert_eq!(legacy.protoc_command().as_deref(), Some("protoc greeter.proto --go_out=plugins=grpc:types"));

        let google = base.protoc_outputs("types", "").google_plugin(true).build().expect("should build");
        assert_eq!(
            google.protoc_command().as_deref(),
            Some("protoc greeter.proto --go_out=types --go-grpc_out=types")
        );
    }

    #[test]
    fn test_validate_plugin_outputs() {
        let base = RunContext::builder().src("a.proto").output("out");

        let legacy_grpc = base.clone().protoc_outputs("types", "types").build();
        assert!(matches!(legacy_grpc, Err(ConfigError::Invalid(msg)) if msg.contains("google protoc plugins")));

        let split = base.clone().protoc_outputs("types", "grpc").google_plugin(true).build();
        assert!(matches!(split, Err(ConfigError::Invalid(msg)) if msg.contains("must be the same")));

        let same = base.protoc_outputs("types", "types").google_plugin(true).build();
        assert!(same.is_ok());
    }
}
