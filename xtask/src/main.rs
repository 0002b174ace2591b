use anyhow::{
    Context,
    Result,
    ensure,
};
use clap::{
    Parser,
    Subcommand,
};
use std::{
    path::{
        Path,
        PathBuf,
    },
    process::Command,
};

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "CastInspo helper tasks (clippy, tests, sample cards)",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run clippy for the entire workspace with warnings-as-errors
    Clippy,
    /// Run unit tests and the integration harness
    Test {
        /// Only run the integration harness under tests/
        #[arg(long)]
        integration_only: bool,
    },
    /// Render sample cards for a few quote ids into a directory
    Cards {
        #[arg(long, default_value = "target/cards")]
        out: PathBuf,
        /// Quote ids to render
        #[arg(default_values_t = [0u32, 7, 42])]
        ids: Vec<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = repo_root()?;

    match cli.command {
        Commands::Clippy => run_clippy(&root)?,
        Commands::Test { integration_only } => run_tests(&root, integration_only)?,
        Commands::Cards { out, ids } => render_cards(&root, &out, &ids)?,
    }

    Ok(())
}

fn repo_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}

fn run_clippy(root: &Path) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("clippy")
        .arg("--workspace")
        .arg("--all-targets")
        .arg("--all-features")
        .arg("--")
        .arg("-D")
        .arg("warnings")
        .current_dir(root);
    run_command(cmd, "cargo clippy")?;
    Ok(())
}

fn run_tests(root: &Path, integration_only: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("test")
        .arg("-p")
        .arg("castinspo")
        .arg("--features")
        .arg("test-helpers")
        .current_dir(root);
    if integration_only {
        cmd.arg("--test").arg("integration_tests");
    }
    run_command(cmd, "cargo test -p castinspo")?;
    Ok(())
}

fn render_cards(root: &Path, out: &Path, ids: &[u32]) -> Result<()> {
    let out = root.join(out);
    std::fs::create_dir_all(&out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    for id in ids {
        let file = out.join(format!("quote-{id}.png"));
        let mut cmd = Command::new("cargo");
        cmd.arg("run")
            .arg("--quiet")
            .arg("-p")
            .arg("castinspo")
            .arg("--")
            .arg("render")
            .arg("--quote")
            .arg(id.to_string())
            .arg("--out")
            .arg(&file)
            .current_dir(root);
        run_command(cmd, &format!("render quote {id}"))?;
    }
    Ok(())
}

fn run_command(mut cmd: Command, label: &str) -> Result<()> {
    println!("Running: {}", label);
    let status = cmd
        .status()
        .with_context(|| format!("failed to run {label}"))?;
    ensure!(status.success(), "{label} failed with status {status}");
    Ok(())
}
