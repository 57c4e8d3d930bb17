//! CLI command definitions and handlers

mod doctor;
pub mod export;
mod hooks;
mod init;
mod report;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use export::ExportOptions;

/// sonarlgpd - SonarQube quality and LGPD compliance reports
#[derive(Parser, Debug)]
#[command(name = "sonarlgpd")]
#[command(
    version,
    about = "SonarQube + LGPD compliance toolkit: scaffold scanner config and export HTML health reports",
    long_about = "sonarlgpd sets a project up for SonarQube analysis and turns the analysis \
results into a single HTML report: health score, quality gate, issues, security hotspots, \
LGPD rule mapping, dependency vulnerabilities and repository activity.\n\n\
The token is read from SONAR_TOKEN, a .sonar-token file in the project, or the user config.",
    after_help = "\
Examples:
  sonarlgpd init                         Scaffold sonar-project.properties, CI workflow and LGPD rules
  sonarlgpd export                       Write reports/<key>-report-<date>.html
  sonarlgpd export --open --skip-deps    Skip npm audit and open the report
  sonarlgpd report --stdout              Print the LGPD checklist as Markdown
  sonarlgpd hooks install                Run sonar-scanner before every push
  sonarlgpd doctor                       Check token, server and tools"
)]
pub struct Cli {
    /// Path to the project (default: current directory)
    #[arg(global = true, default_value = ".")]
    pub path: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold sonar-project.properties, a CI workflow and the LGPD rule mapping
    Init {
        /// Overwrite files that already exist
        #[arg(long)]
        force: bool,
    },

    /// Fetch analysis results from SonarQube and write the HTML report
    #[command(after_help = "\
Examples:
  sonarlgpd export                                  Report for the current directory
  sonarlgpd export --server https://sonar.acme.io   Use a specific server
  sonarlgpd export -o out/report.html --open        Custom output path, open when done")]
    Export {
        /// SonarQube project key (default: sonar-project.properties, then directory name)
        #[arg(long)]
        project_key: Option<String>,

        /// SonarQube server URL (default: SONAR_HOST_URL, user config, http://localhost:9000)
        #[arg(long)]
        server: Option<String>,

        /// LGPD rule mapping JSON (default: .sonarlgpd/lgpd-rules.json, then built-in)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Output file (default: reports/<key>-report-<YYYY-MM-DD>.html)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Open the report in the default viewer
        #[arg(long)]
        open: bool,

        /// Skip the npm/pnpm/yarn dependency audit
        #[arg(long)]
        skip_deps: bool,

        /// Skip repository activity
        #[arg(long)]
        skip_git: bool,
    },

    /// Write the LGPD checklist as Markdown (reports/lgpd-checklist.md)
    Report {
        /// LGPD rule mapping JSON (default: .sonarlgpd/lgpd-rules.json, then built-in)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Print to stdout instead of writing the file
        #[arg(long)]
        stdout: bool,
    },

    /// Install or remove the pre-push analysis hook
    Hooks {
        #[command(subcommand)]
        action: HookAction,
    },

    /// Check token, server reachability, project files and tools
    Doctor,

    /// Show version info
    Version,
}

#[derive(Subcommand, Debug)]
pub enum HookAction {
    /// Install .git/hooks/pre-push
    Install {
        /// Replace an existing hook not written by sonarlgpd
        #[arg(long)]
        force: bool,
    },
    /// Remove the hook if sonarlgpd installed it
    Uninstall,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => init::run(&cli.path, force),

        Commands::Export {
            project_key,
            server,
            rules,
            output,
            open,
            skip_deps,
            skip_git,
        } => export::run(
            &cli.path,
            &ExportOptions {
                project_key,
                server,
                rules,
                output,
                open,
                skip_deps,
                skip_git,
            },
        ),

        Commands::Report { rules, stdout } => report::run(&cli.path, rules.as_deref(), stdout),

        Commands::Hooks { action } => match action {
            HookAction::Install { force } => hooks::install(&cli.path, force),
            HookAction::Uninstall => hooks::uninstall(&cli.path),
        },

        Commands::Doctor => doctor::run(&cli.path),

        Commands::Version => {
            println!("sonarlgpd {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
