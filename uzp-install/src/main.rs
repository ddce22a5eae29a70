use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uzp_install::fetch::DownloadProgress;
use uzp_install::output::{Output, Spinner};
use uzp_install::reconcile::Action;
use uzp_install::version::{select_version, SelectedVersion};
use uzp_install::{
    InstallError, InstallEvent, Installer, InstallerConfig, LinkOutcome, LocalCache, Origin,
    Outcome, Platform, Remediation, TargetSpec,
};

#[derive(Parser, Debug)]
#[command(name = "uzp-install")]
#[command(about = "Download, cache, and link the prebuilt uzp binary", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    install: InstallArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install uzp (the default when no subcommand is given)
    Install(InstallArgs),
    /// Delete every cached binary and the recorded version
    CleanCache {
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default, Clone)]
struct InstallArgs {
    /// Package spec from the package manager, e.g. `uzp-cli@1.0.6`
    specs: Vec<String>,
    /// Install this version instead of consulting package-manager variables
    #[arg(long = "version", value_name = "VERSION")]
    requested: Option<String>,
    #[arg(long)]
    install_dir: Option<PathBuf>,
    #[arg(long)]
    cache_dir: Option<PathBuf>,
    /// Global bin directory for the symlink (defaults to npm's)
    #[arg(long)]
    link_dir: Option<PathBuf>,
    /// Do not create a symlink on the PATH
    #[arg(long)]
    no_link: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match InstallerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            Output::error(format!("Installation failed: {err}"));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli, config.clone()) {
        report_failure(&err, &config);
        std::process::exit(1);
    }
}

fn run(cli: Cli, config: InstallerConfig) -> Result<()> {
    match cli.command {
        Some(Commands::Install(args)) => cmd_install(args, config),
        Some(Commands::CleanCache { cache_dir }) => cmd_clean_cache(cache_dir, config),
        None => cmd_install(cli.install, config),
    }
}

fn cmd_install(args: InstallArgs, mut config: InstallerConfig) -> Result<()> {
    if let Some(dir) = args.install_dir {
        config.install_dir = dir;
    }
    if let Some(dir) = args.cache_dir {
        config.cache_dir = dir;
    }
    if let Some(dir) = args.link_dir {
        config.link_dir = Some(dir);
    }
    config.link = !args.no_link;

    println!("📦 Installing {}...", config.binary.to_uppercase());

    let platform = Platform::current()?;
    Output::info(format!(
        "Looking for binary: {}",
        platform.asset_name(&config.binary)
    ));

    let requested = requested_version(args.requested.as_deref(), &args.specs);
    if let Some(selected) = &requested {
        tracing::debug!(signal = selected.signal, version = %selected.version, "requested version");
    }
    let target = TargetSpec {
        platform,
        requested: requested.map(|selected| selected.version),
    };

    let installer = Installer::from_config(config.clone());
    let mut renderer = Renderer::default();
    let outcome = installer.run(&target, &mut |event| renderer.render(event));
    renderer.finish_spinner();

    match outcome? {
        Outcome::UpToDate {
            version,
            binary_path,
        } => {
            Output::success(format!(
                "{} {version} is already installed and up to date!",
                config.binary
            ));
            Output::kv("Binary", binary_path.display().to_string());
            Output::hint(format!(
                "To install a specific version: npm install -g uzp-cli@{}",
                version.trim_start_matches('v')
            ));
        }
        Outcome::Installed(report) => {
            match &report.link {
                LinkOutcome::Linked(link) => {
                    Output::step(format!(
                        "Created symlink: {} -> {}",
                        link.display(),
                        report.binary_path.display()
                    ));
                }
                LinkOutcome::Failed(reason) => {
                    Output::warning(format!("Could not create symlink ({reason})"));
                    Output::step("The binary is installed but may not be in PATH");
                    Output::kv("Binary", report.binary_path.display().to_string());
                }
                LinkOutcome::Disabled => {}
            }

            let from = match report.origin {
                Origin::Cache => " from cache",
                Origin::Download => "",
            };
            Output::success(format!(
                "{} {} installed successfully{from}!",
                config.binary, report.version
            ));
            Output::kv("SHA-256", &report.sha256);
            if report.origin == Origin::Download {
                Output::step("Binary cached for future installations");
            }
            Output::blank();
            println!("🚀 Get started:");
            println!("   {} init", config.binary);
            println!("   {} add", config.binary);
            println!("   {} --help", config.binary);
        }
    }

    Ok(())
}

fn cmd_clean_cache(cache_dir: Option<PathBuf>, config: InstallerConfig) -> Result<()> {
    let cache = LocalCache::new(cache_dir.unwrap_or(config.cache_dir));
    let removed = cache
        .clear()
        .with_context(|| format!("failed to clear {}", cache.root().display()))?;

    if removed {
        Output::success(format!("Removed cache at {}", cache.root().display()));
    } else {
        Output::info(format!("No cache at {}", cache.root().display()));
    }
    Ok(())
}

/// An explicit `--version` wins over package-manager signals.
fn requested_version(explicit: Option<&str>, specs: &[String]) -> Option<SelectedVersion> {
    match explicit {
        Some("latest") => None,
        Some(version) => Some(SelectedVersion {
            signal: "cli",
            version: version.to_string(),
        }),
        None => select_version(|name| std::env::var(name).ok(), specs),
    }
}

#[derive(Default)]
struct Renderer {
    spinner: Option<Spinner>,
}

impl Renderer {
    fn render(&mut self, event: InstallEvent) {
        match event {
            InstallEvent::LookingUp { requested } => {
                let msg = match requested {
                    Some(version) => format!("Fetching version {version}"),
                    None => "Fetching latest version".to_string(),
                };
                self.spinner = Some(Output::spinner(msg));
            }
            InstallEvent::ReleaseResolved { tag } => {
                if let Some(spinner) = self.spinner.take() {
                    spinner.finish_success(format!("Selected version: {tag}"));
                }
            }
            InstallEvent::Reconciled { action } => match action {
                Action::Install | Action::Skip => {}
                Action::Override { previous } => {
                    Output::info(format!("Override requested (current: {previous})"));
                }
                Action::Update { previous } => {
                    Output::info(format!("Updating from {previous}"));
                }
            },
            InstallEvent::ExistingRemoved { removed: true } => {
                Output::step("Existing binary removed");
            }
            InstallEvent::ExistingRemoved { removed: false } => {
                Output::warning("Could not remove existing binary, continuing...");
            }
            InstallEvent::CacheHit { tag } => {
                Output::info(format!("Using cached binary for version {tag}"));
            }
            InstallEvent::Downloading { asset, size_bytes } => {
                let mib = size_bytes as f64 / 1024.0 / 1024.0;
                Output::info(format!("Downloading {asset} ({mib:.1}MB) from GitHub..."));
            }
            InstallEvent::Progress(DownloadProgress::Percent(percent)) => {
                Output::step(format!("Downloading... {percent}%"));
            }
            InstallEvent::Progress(DownloadProgress::Complete) => {
                Output::step("Download complete!");
            }
        }
    }

    fn finish_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_error("Release lookup failed");
        }
    }
}

fn report_failure(err: &anyhow::Error, config: &InstallerConfig) {
    Output::error(format!("Installation failed: {err:#}"));

    if let Some(install_err) = err.downcast_ref::<InstallError>() {
        match install_err.remediation() {
            Remediation::PublishRelease => {
                Output::hint("This package requires a GitHub release with pre-built binaries.");
                Output::hint(format!(
                    "The maintainer needs to create a release at: {}",
                    config.releases_url()
                ));
            }
            Remediation::ClearCache => {
                Output::hint("Clear the cache and try again:");
                Output::hint("uzp-install clean-cache && uzp-install");
            }
            Remediation::ManualBuild => {}
        }
    }

    Output::hint("Manual installation:");
    let checkout = config.repo.rsplit('/').next().unwrap_or(&config.repo);
    Output::hint(format!("git clone {}.git", config.repo_url()));
    Output::hint(format!("cd {checkout}"));
    Output::hint(format!("go build -o {}", config.binary));
    Output::hint(format!(
        "sudo mv {} /usr/local/bin/  # optional: make globally available",
        config.binary
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_means_install() {
        let cli = Cli::parse_from(["uzp-install"]);
        assert!(cli.command.is_none());
        assert!(cli.install.specs.is_empty());
    }

    #[test]
    fn package_spec_is_accepted_positionally() {
        let cli = Cli::parse_from(["uzp-install", "uzp-cli@1.0.6", "--no-link"]);
        assert_eq!(cli.install.specs, vec!["uzp-cli@1.0.6"]);
        assert!(cli.install.no_link);
    }

    #[test]
    fn explicit_version_wins() {
        let selected = requested_version(Some("1.0.6"), &["uzp-cli@2.0.0".to_string()])
            .expect("selected");
        assert_eq!(selected.version, "1.0.6");
        assert_eq!(requested_version(Some("latest"), &[]), None);
    }

    #[test]
    fn clean_cache_subcommand_parses() {
        let cli = Cli::parse_from(["uzp-install", "clean-cache", "--cache-dir", "/tmp/c"]);
        assert!(matches!(
            cli.command,
            Some(Commands::CleanCache { cache_dir: Some(_) })
        ));
    }
}
