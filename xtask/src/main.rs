use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for ultragfx")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all CI checks (fmt, clippy, unit and doc tests)
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// Format code
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Run clippy with warnings denied
    Clippy,
    /// Run tests
    Test {
        /// Run only the doc tests
        #[arg(long)]
        doc: bool,
        /// Restrict to one or more library modules
        #[arg(short, long, value_enum)]
        module: Vec<Module>,
    },
    /// Run benchmarks
    Bench {
        /// Criterion filter, e.g. `texture_cache`
        filter: Option<String>,
    },
    /// Replay a JSON scene through the headless player
    Replay {
        /// Path to the scene file
        scene: String,
        /// Number of frames to render
        #[arg(short = 'n', long, default_value = "1")]
        frames: u32,
        /// Microcode to start each frame on
        #[arg(short, long)]
        ucode: Option<String>,
        /// Build in release mode
        #[arg(long)]
        release: bool,
    },
}

/// Library modules with their own unit test suites
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Module {
    Gbi,
    Rdp,
    Rsp,
    Batch,
    Cache,
    Framebuffer,
    Interpreter,
}

impl Module {
    fn path(self) -> &'static str {
        match self {
            Module::Gbi => "core::gbi",
            Module::Rdp => "core::rdp",
            Module::Rsp => "core::rsp",
            Module::Batch => "core::batch",
            Module::Cache => "core::cache",
            Module::Framebuffer => "core::framebuffer",
            Module::Interpreter => "core::interpreter",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => run_ci(verbose),
        Commands::Fmt { check } => run_fmt(check),
        Commands::Clippy => run_clippy(),
        Commands::Test { doc, module } => run_test(doc, &module),
        Commands::Bench { filter } => run_bench(filter.as_deref()),
        Commands::Replay {
            scene,
            frames,
            ucode,
            release,
        } => run_replay(&scene, frames, ucode.as_deref(), release),
    }
}

fn run_ci(verbose: bool) -> Result<()> {
    println!("{}", "=== Running CI Pipeline ===".bold().blue());

    let start = Instant::now();

    run_task("Format Check", || run_fmt(true), verbose)?;
    run_task("Clippy", run_clippy, verbose)?;
    run_task("Test", || run_test(false, &[]), verbose)?;
    run_task("Doc Test", || run_test(true, &[]), verbose)?;

    println!(
        "\n{} {}",
        "✓ CI passed in".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );

    Ok(())
}

fn run_fmt(check: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("fmt").arg("--all");

    if check {
        cmd.arg("--").arg("--check");
    }

    execute_command(&mut cmd)
}

fn run_clippy() -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.args(["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]);

    execute_command(&mut cmd)
}

fn run_test(doc: bool, modules: &[Module]) -> Result<()> {
    if doc {
        let mut cmd = Command::new("cargo");
        cmd.arg("test").arg("--doc");
        return execute_command(&mut cmd);
    }

    if modules.is_empty() {
        let mut cmd = Command::new("cargo");
        cmd.arg("test").arg("--workspace");
        return execute_command(&mut cmd);
    }

    let mut failed = Vec::new();
    for &module in modules {
        println!("{} Running {} tests...", "→".blue(), module.path().bold());

        let mut cmd = Command::new("cargo");
        cmd.arg("test").arg("--lib").arg(module.path());

        match execute_command(&mut cmd) {
            Ok(()) => println!("{} {} passed\n", "✓".green(), module.path()),
            Err(_) => {
                println!("{} {} failed\n", "✗".red(), module.path());
                failed.push(module.path());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Failing modules: {}", failed.join(", "))
    }
}

fn run_bench(filter: Option<&str>) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("bench").arg("--bench").arg("dispatch_bench");

    if let Some(filter) = filter {
        cmd.arg("--").arg(filter);
    }

    execute_command(&mut cmd)
}

fn run_replay(scene: &str, frames: u32, ucode: Option<&str>, release: bool) -> Result<()> {
    println!("{}", "=== Scene Replay ===".bold().blue());

    if !Path::new(scene).exists() {
        println!("{} Scene file not found: {}", "✗".red().bold(), scene.yellow());
        anyhow::bail!("Scene file not found");
    }

    println!("{} Scene: {}", "✓".green(), scene.cyan());
    println!("{} Frames: {}", "→".blue(), frames.to_string().bold());

    let start = Instant::now();

    let mut cmd = Command::new("cargo");
    cmd.arg("run").arg("--bin").arg("ultragfx");

    if release {
        cmd.arg("--release");
    }

    cmd.arg("--").arg(scene).arg("-n").arg(frames.to_string());

    if let Some(ucode) = ucode {
        cmd.arg("--ucode").arg(ucode);
    }

    if let Err(e) = execute_command(&mut cmd) {
        println!("\n{} Replay failed", "✗".red().bold());
        return Err(e);
    }

    println!(
        "\n{} Replay completed in {}",
        "✓".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );

    Ok(())
}

fn run_task<F>(name: &str, task: F, verbose: bool) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    print!("{} {} ... ", "→".blue(), name);

    let start = Instant::now();

    match task() {
        Ok(()) => {
            let elapsed = if verbose {
                format!("({:.2}s)", start.elapsed().as_secs_f64())
            } else {
                String::new()
            };
            println!("{} {}", "✓".green().bold(), elapsed);
            Ok(())
        }
        Err(e) => {
            println!("{}", "✗".red().bold());
            Err(e)
        }
    }
}

fn execute_command(cmd: &mut Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}
