//! `codegen-agent create` command.

use tracing::info;

use crate::agent::Agent;
use crate::cli::CreateArgs;
use crate::config::AgentConfig;
use crate::context::ServiceContext;

/// Execute the `create` command.
///
/// `--replay` serves completions from a cassette; `--record` talks to the
/// model and saves every completion to a cassette when the run ends.
///
/// # Errors
///
/// Returns an error string if configuration is invalid, the cassette cannot
/// be loaded, or the run fails.
pub fn run(args: &CreateArgs) -> Result<(), String> {
    let mut config = AgentConfig::resolve(&args.repo, args.config.as_deref())?;
    apply_flags(&mut config, args);

    let ctx = match (&args.record, &args.replay) {
        (_, Some(cassette)) => {
            info!(cassette = %cassette.display(), "replaying completions");
            ServiceContext::replaying(cassette)?
        }
        (Some(cassette), None) => ServiceContext::recording(&config, cassette),
        (None, None) => ServiceContext::live(&config),
    };

    let message = run_with_context(&ctx, &config, &args.desc, &args.module_path)?;
    println!("{message}");
    Ok(())
}

/// Runs the pipeline against explicit ports and returns the success message.
///
/// # Errors
///
/// Returns the failure message of an unsuccessful run.
pub fn run_with_context(
    ctx: &ServiceContext,
    config: &AgentConfig,
    desc: &str,
    module_path: &str,
) -> Result<String, String> {
    let agent = Agent::new(ctx, config).map_err(|e| e.to_string())?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Runtime error: {e}"))?;

    let result = rt.block_on(agent.create_program(desc, module_path));
    if result.success {
        Ok(result.message)
    } else {
        Err(result.message)
    }
}

/// Command-line flags win over every other configuration layer.
fn apply_flags(config: &mut AgentConfig, args: &CreateArgs) {
    if let Some(model) = &args.model {
        config.model.clone_from(model);
    }
    if let Some(host) = &args.host {
        config.host.clone_from(host);
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(variant) = &args.planning_variant {
        config.planning_variant.clone_from(variant);
    }
    if let Some(variant) = &args.code_gen_variant {
        config.code_gen_variant.clone_from(variant);
    }
    if let Some(dir) = &args.prompts_dir {
        config.prompts_dir = Some(dir.clone());
    }
    config.verbose = args.verbose;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::LiveFileSystem;
    use crate::cli::{Cli, Command};
    use crate::ports::llm::{CompletionFuture, CompletionRequest, CompletionResponse, LlmClient};
    use clap::Parser;

    struct Canned;

    impl LlmClient for Canned {
        fn complete(&self, request: &CompletionRequest) -> CompletionFuture<'_> {
            let text = if request.prompt.contains("Plan:") {
                r#"{"app.py": "from hello.greet import hi\nhi()\n", "greet.py": "def hi():\n    print('hi')\n"}"#
            } else {
                "1. greet module\n2. app entry"
            };
            Box::pin(async move { Ok(CompletionResponse::text(text)) })
        }
    }

    fn create_args(argv: &[&str]) -> CreateArgs {
        match Cli::parse_from(argv).command {
            Command::Create(args) => args,
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn flags_override_config() {
        let args = create_args(&[
            "codegen-agent",
            "create",
            "x",
            "a/app.py",
            "--host",
            "http://remote:11434",
            "--code-gen-variant",
            "strict_json",
            "--verbose",
        ]);
        let mut config = AgentConfig::new("/repo");

        apply_flags(&mut config, &args);

        assert_eq!(config.host, "http://remote:11434");
        assert_eq!(config.code_gen_variant, "strict_json");
        assert_eq!(config.model, "llama3.1");
        assert!(config.verbose);
    }

    #[test]
    fn run_with_context_writes_project() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ServiceContext::new(Box::new(LiveFileSystem), Box::new(Canned));
        let config = AgentConfig::new(dir.path());

        let message = run_with_context(&ctx, &config, "say hi", "hello/app.py").unwrap();

        assert_eq!(message, "Wrote 2 files (entrypoint: hello/app.py) and hello/requirements.txt");
        let app = std::fs::read_to_string(dir.path().join("hello/app.py")).unwrap();
        assert_eq!(app, "from greet import hi\nhi()\n");
    }

    #[test]
    fn unknown_variant_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ServiceContext::new(Box::new(LiveFileSystem), Box::new(Canned));
        let mut config = AgentConfig::new(dir.path());
        config.planning_variant = "nope".into();

        let err = run_with_context(&ctx, &config, "say hi", "hello/app.py").unwrap_err();

        assert!(err.contains("unknown variant \"nope\""));
    }
}
