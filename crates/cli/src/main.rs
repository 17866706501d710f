use anyhow::Context;
use boundary_config::{BufferSpec, DemoManifest, TestAssertion, TestScript};
use boundary_core::{CaptureReporter, SerialReporter, Supervisor, SupervisorState};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Boundary foreign routine demo harness",
    long_about = None,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,

    /// Enable debug-level tracing of supervisor transitions
    #[arg(short, long, global = true)]
    trace: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a YAML test script and report pass/fail
    Test(TestArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Path to the demo manifest (YAML)
    #[arg(short, long)]
    system: Option<PathBuf>,

    /// Integer handed to mul2 (overrides the manifest)
    #[arg(short, long, allow_hyphen_values = true)]
    number: Option<i32>,

    /// Text to reverse in place (overrides the manifest buffer)
    #[arg(short, long)]
    buffer: Option<String>,

    /// Leave the idle state after this many steps instead of parking forever
    #[arg(long)]
    idle_steps: Option<u64>,
}

#[derive(Args, Debug)]
struct TestArgs {
    /// Path to the test script (YAML)
    #[arg(long)]
    script: PathBuf,

    /// Directory for result.json
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not echo serial output to stdout
    #[arg(long)]
    no_serial_stdout: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Status {
    Pass,
    Fail,
}

#[derive(Debug, Serialize)]
struct AssertionResult {
    assertion: TestAssertion,
    passed: bool,
}

#[derive(Debug, Serialize)]
struct TestConfig {
    script: String,
    system: Option<String>,
    idle_steps: u64,
}

#[derive(Debug, Serialize)]
struct TestResult {
    status: Status,
    final_state: SupervisorState,
    result: Option<i32>,
    buffer: Option<String>,
    output: String,
    idle_steps: u64,
    manifest_hash: String,
    config: TestConfig,
    assertions: Vec<AssertionResult>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.trace {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // stdout is the serial channel; logs go to stderr
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Command::Test(args)) => {
            let passed = run_test(&args)?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        }
        None => run_demo(cli.run),
    }
}

fn run_demo(args: RunArgs) -> anyhow::Result<()> {
    info!("Starting Boundary demo");

    let mut manifest = match &args.system {
        Some(path) => {
            info!("Loading demo manifest: {:?}", path);
            DemoManifest::from_file(path)?
        }
        None => {
            info!("Using default demo configuration");
            DemoManifest::default()
        }
    };
    if let Some(number) = args.number {
        manifest.number = number;
    }
    if let Some(text) = args.buffer {
        manifest.buffer = Some(BufferSpec::new(text));
    }

    let mut supervisor = Supervisor::from_manifest(&manifest, SerialReporter::stdout())
        .context("Invalid demo configuration")?;

    match args.idle_steps {
        Some(steps) => {
            supervisor.idle_for(steps);
            info!(
                "Left idle after {} steps (final state {:?})",
                supervisor.idle_steps(),
                supervisor.state()
            );
            Ok(())
        }
        None => supervisor.park(),
    }
}

fn run_test(args: &TestArgs) -> anyhow::Result<bool> {
    info!("Loading test script: {:?}", args.script);
    let script = TestScript::from_file(&args.script)?;

    let system_path = script.inputs.system.as_ref().map(|system| {
        let path = Path::new(system);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            args.script
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(path)
        }
    });

    let manifest = match &system_path {
        Some(path) => {
            info!("Loading demo manifest: {:?}", path);
            DemoManifest::from_file(path)?
        }
        None => DemoManifest::default(),
    };
    let manifest_yaml =
        serde_yaml::to_string(&manifest).context("Failed to serialize demo manifest")?;
    let manifest_hash = format!("{:x}", Sha256::digest(manifest_yaml.as_bytes()));

    let reporter = CaptureReporter::with_echo(!args.no_serial_stdout);
    let mut supervisor = Supervisor::from_manifest(&manifest, reporter)
        .context("Invalid demo configuration")?;
    supervisor.idle_for(script.limits.idle_steps);

    let output = supervisor.reporter().output().to_string();
    let buffer = supervisor.buffer().map(|b| b.text().into_owned());

    let assertions: Vec<AssertionResult> = script
        .assertions
        .iter()
        .map(|assertion| {
            let passed = match assertion {
                TestAssertion::OutputContains(a) => output.contains(&a.output_contains),
                TestAssertion::BufferEquals(a) => {
                    buffer.as_deref() == Some(a.buffer_equals.as_str())
                }
                TestAssertion::ExpectedState(a) => supervisor.state() == a.expected_state,
            };
            if !passed {
                warn!("Assertion failed: {:?}", assertion);
            }
            AssertionResult {
                assertion: assertion.clone(),
                passed,
            }
        })
        .collect();

    let passed = assertions.iter().all(|a| a.passed);
    let result = TestResult {
        status: if passed { Status::Pass } else { Status::Fail },
        final_state: supervisor.state(),
        result: supervisor.result(),
        buffer,
        output,
        idle_steps: supervisor.idle_steps(),
        manifest_hash,
        config: TestConfig {
            script: args.script.display().to_string(),
            system: system_path.map(|p| p.display().to_string()),
            idle_steps: script.limits.idle_steps,
        },
        assertions,
    };

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;
        let path = dir.join("result.json");
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
        info!("Wrote {:?}", path);
    }

    info!("Test {}", if passed { "PASSED" } else { "FAILED" });
    Ok(passed)
}
