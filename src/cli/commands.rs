//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap,
//! including all commands and their arguments.

use crate::config::{save_settings, Settings};
use crate::error::Result;
use crate::remote::{LocalServer, RemoteServer};
use crate::stack::aliases;
use crate::stack::{ApiRole, ConfigSession, Deployment, SecretScope};
use crate::utils::format::{DisplayUtils, OutputFormat, TableFormatter};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tabled::Tabled;
use tracing::debug;

#[derive(Parser)]
#[command(name = "hserv")]
#[command(about = "Manage the configuration of remotely deployed Supabase stacks")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(long, global = true, value_enum)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Project to operate on
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Directory that holds the project folders
    #[arg(long, global = true, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Remote docker directory of the stack
    #[arg(long, global = true, value_name = "DIR")]
    pub docker_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Stack(StackCommands),
    /// Manage hserv's own settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Commands that operate on a project's stack
#[derive(Subcommand)]
pub enum StackCommands {
    /// Print the value of a configuration option
    Get {
        /// Option alias (e.g. api_url) or raw .env key
        name: String,
        /// Value to print when the option is not set
        #[arg(short, long)]
        default: Option<String>,
    },
    /// Set configuration options and save them to the stack
    Set {
        /// Options in name=value format
        #[arg(required = true, value_parser = parse_key_val::<String, String>)]
        options: Vec<(String, String)>,
        /// Apply the changes in memory only
        #[arg(long)]
        dry_run: bool,
    },
    /// List every known option with its keys and current value (alias: ls)
    #[command(alias = "ls")]
    Show {
        /// Reveal passwords, secrets and keys
        #[arg(long)]
        reveal: bool,
    },
    /// Create the project's secrets if needed and print a summary
    Init,
    /// Apply the project's secrets to the stack
    Configure {
        /// Only apply the JWT secret and API keys
        #[arg(long)]
        jwt: bool,
        /// Only apply the Postgres password and port
        #[arg(long)]
        postgres: bool,
    },
    /// Print a signed API key (anon or service_role)
    Jwt {
        /// Role to sign the key for
        #[arg(default_value = "anon")]
        role: String,
    },
    /// Configure the stack with the project's secrets unless it already uses them
    Setup,
    /// Report whether the stack is downloaded and configured
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current settings
    Show,
    /// Set a setting and save it to the settings file
    Set {
        /// Setting name
        key: String,
        /// Setting value
        value: String,
    },
    /// Show settings file path
    Path,
}

/// One row of the `show` command
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct OptionRow {
    #[tabled(rename = "Option")]
    pub option: String,
    #[tabled(rename = "Keys")]
    pub keys: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

const MASK: &str = "********";

fn is_sensitive(alias: &str) -> bool {
    ["password", "secret", "jwt"]
        .iter()
        .any(|marker| alias.contains(marker))
}

/// Build the `show` rows for a session
pub fn option_rows(session: &ConfigSession, reveal: bool) -> Vec<OptionRow> {
    aliases::aliases()
        .map(|(alias, keys)| {
            let value = match session.get_or(alias, None) {
                Some(_) if is_sensitive(alias) && !reveal => MASK.to_string(),
                Some(value) => value,
                None => "-".to_string(),
            };

            OptionRow {
                option: alias.to_string(),
                keys: keys.join(", "),
                value,
            }
        })
        .collect()
}

/// Scope selected by the `configure` flags; no flag means everything
pub fn secret_scope(jwt: bool, postgres: bool) -> SecretScope {
    if !jwt && !postgres {
        SecretScope::all()
    } else {
        SecretScope { jwt, postgres }
    }
}

impl Cli {
    /// Overlay command-line flags on loaded settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if self.debug {
            settings.debug = true;
        }
        if self.no_color {
            settings.no_color = true;
        }
        if let Some(format) = self.format {
            settings.output_json = format == OutputFormat::Json;
        }
        if let Some(project) = &self.project {
            settings.project = project.clone();
        }
        if let Some(path) = &self.path {
            settings.base_path = path.clone();
        }
        if let Some(docker_dir) = &self.docker_dir {
            settings.docker_dir = Some(docker_dir.clone());
        }
    }

    pub fn execute(self, settings: Settings) -> Result<()> {
        let server: Arc<dyn RemoteServer> = Arc::new(LocalServer::new());
        self.execute_with(settings, server)
    }

    /// Run the command against an explicit remote server
    pub fn execute_with(self, settings: Settings, server: Arc<dyn RemoteServer>) -> Result<()> {
        match self.command {
            Commands::Stack(command) => execute_stack_command(command, &settings, server),
            // Settings commands work without a project
            Commands::Config { command } => execute_config_command(command, settings),
        }
    }
}

fn open_deployment(settings: &Settings, server: Arc<dyn RemoteServer>) -> Result<Deployment> {
    settings.validate()?;

    let mut deployment = Deployment::open(server, &settings.base_path, &settings.project)?;
    if let Some(docker_dir) = &settings.docker_dir {
        deployment = deployment.with_docker_dir(docker_dir.clone());
    }
    debug!("Using stack at {}", deployment.docker_dir());
    Ok(deployment)
}

fn execute_stack_command(
    command: StackCommands,
    settings: &Settings,
    server: Arc<dyn RemoteServer>,
) -> Result<()> {
    let deployment = open_deployment(settings, server)?;
    let display = DisplayUtils::new(settings.no_color);
    let format = if settings.output_json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    match command {
        StackCommands::Get { name, default } => {
            let session = deployment.session()?;
            let value = match default {
                Some(default) => session.get_or(&name, Some(default.as_str())).unwrap_or(default),
                None => session.get(&name)?,
            };
            println!("{}", value);
        }
        StackCommands::Set { options, dry_run } => {
            let mut session = deployment.session()?;
            for (name, value) in &options {
                session.set(name, value)?;
            }

            if dry_run {
                display.print_info("Dry run, nothing was saved");
            } else {
                session.save()?;
                display.print_success(&format!(
                    "Updated {} option(s) in {}",
                    options.len(),
                    session.env_path()
                ));
            }
        }
        StackCommands::Show { reveal } => {
            let session = deployment.session()?;
            let rows = option_rows(&session, reveal);
            let formatter = TableFormatter::new(format, settings.no_color);
            println!("{}", formatter.format_table(&rows)?);
        }
        StackCommands::Init => {
            let secrets = deployment.secrets();
            let project_dir = deployment.project_dir().display().to_string();
            let port = secrets.postgres_port.to_string();

            display.print_header(deployment.project());
            println!(
                "{}",
                display.format_key_value_pairs(&[
                    ("Project directory", project_dir.as_str()),
                    ("Stack directory", deployment.docker_dir()),
                    ("Postgres port", port.as_str()),
                ])
            );
        }
        StackCommands::Configure { jwt, postgres } => {
            let mut session = deployment.session()?;
            deployment.apply_secrets(&mut session, secret_scope(jwt, postgres))?;
            session.save()?;
            display.print_success(&format!(
                "Configured project '{}'",
                deployment.project()
            ));
        }
        StackCommands::Jwt { role } => {
            let role: ApiRole = role.parse()?;
            println!("{}", deployment.api_key(role)?);
        }
        StackCommands::Setup => {
            if deployment.ensure_configured()? {
                display.print_success(&format!(
                    "Configured project '{}'",
                    deployment.project()
                ));
            } else {
                display.print_info(&format!(
                    "Project '{}' is already configured",
                    deployment.project()
                ));
            }
        }
        StackCommands::Status => {
            display.print_header(deployment.project());
            if !deployment.is_downloaded()? {
                display.print_warning(&format!(
                    "No stack found at {}",
                    deployment.docker_dir()
                ));
                return Ok(());
            }

            let session = deployment.session()?;
            if deployment.is_configured(&session) {
                display.print_success("Stack uses the project's secrets");
            } else {
                display.print_warning("Stack is not configured, run 'hserv setup'");
            }
        }
    }

    Ok(())
}

fn execute_config_command(command: ConfigCommands, mut settings: Settings) -> Result<()> {
    let display = DisplayUtils::new(settings.no_color);

    match command {
        ConfigCommands::Show => {
            if settings.output_json {
                println!("{}", serde_json::to_string_pretty(&settings)?);
            } else {
                let base_path = settings.base_path.display().to_string();
                let docker_dir = settings.docker_dir.as_deref().unwrap_or("-");
                let output_json = settings.output_json.to_string();
                let no_color = settings.no_color.to_string();
                let debug = settings.debug.to_string();

                display.print_header("Settings");
                println!(
                    "{}",
                    display.format_key_value_pairs(&[
                        ("base_path", base_path.as_str()),
                        ("project", settings.project.as_str()),
                        ("docker_dir", docker_dir),
                        ("output_json", output_json.as_str()),
                        ("no_color", no_color.as_str()),
                        ("debug", debug.as_str()),
                    ])
                );
            }
        }
        ConfigCommands::Set { key, value } => {
            settings.set_value(&key, &value)?;
            save_settings(&settings)?;
            display.print_success(&format!("Setting updated: {key} = {value}"));
        }
        ConfigCommands::Path => {
            println!("{}", Settings::get_config_path()?.display());
        }
    }

    Ok(())
}

/// Parse a single key-value pair
fn parse_key_val<T, U>(
    s: &str,
) -> std::result::Result<(T, U), Box<dyn std::error::Error + Send + Sync + 'static>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    U: std::str::FromStr,
    U::Err: std::error::Error + Send + Sync + 'static,
{
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid name=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].parse()?, s[pos + 1..].parse()?))
}
