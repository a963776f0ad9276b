//! Deployment tests
//!
//! Covers applying project secrets to a stack and driving the CLI commands
//! against a stack served from memory.

use clap::Parser;
use hserv::cli::Cli;
use hserv::config::Settings;
use hserv::remote::{join_remote, MemoryServer, Operation, RemoteServer};
use hserv::stack::{generate_api_key, ApiRole, Deployment, ProjectSecrets, SecretScope};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const DOCKER: &str = "/stack";

const ENV: &str = "POSTGRES_PASSWORD=your-super-secret-and-long-postgres-password\n\
JWT_SECRET=your-super-secret-jwt-token-with-at-least-32-characters-long\n\
ANON_KEY=old-anon\n\
SERVICE_ROLE_KEY=old-service\n\
POSTGRES_PORT=5432\n\
SMTP_PORT=2500\n";

const KONG: &str = r#"consumers:
  - username: DASHBOARD
  - username: anon
    keyauth_credentials:
      - key: old-anon
  - username: service_role
    keyauth_credentials:
      - key: old-service
"#;

fn stack_server() -> Arc<MemoryServer> {
    Arc::new(
        MemoryServer::new()
            .with_file(join_remote(DOCKER, &[".env.example"]), ENV)
            .with_file(join_remote(DOCKER, &["volumes", "api", "kong.yml"]), KONG),
    )
}

fn open(server: Arc<MemoryServer>, base: &Path) -> Deployment {
    Deployment::open(server, base, "demo")
        .unwrap()
        .with_docker_dir(DOCKER)
}

#[test]
fn test_apply_all_secrets() {
    let temp_dir = TempDir::new().unwrap();
    let deployment = open(stack_server(), temp_dir.path());
    let secrets = deployment.secrets().clone();

    let mut session = deployment.session().unwrap();
    assert!(!deployment.is_configured(&session));

    deployment
        .apply_secrets(&mut session, SecretScope::all())
        .unwrap();
    assert!(deployment.is_configured(&session));

    let anon = generate_api_key(ApiRole::Anon, &secrets.jwt_secret).unwrap();
    let service = generate_api_key(ApiRole::ServiceRole, &secrets.jwt_secret).unwrap();

    assert_eq!(session.get("postgres_password").unwrap(), secrets.postgres_password);
    assert_eq!(
        session.get("postgres_port").unwrap(),
        secrets.postgres_port.to_string()
    );
    assert_eq!(session.get("jwt_secret").unwrap(), secrets.jwt_secret);
    assert_eq!(session.get("anon_jwt").unwrap(), anon);
    assert_eq!(session.get("service_jwt").unwrap(), service);
    assert_eq!(session.gateway().consumer_keys("anon").unwrap(), vec![anon]);
    assert_eq!(
        session.gateway().consumer_keys("service_role").unwrap(),
        vec![service]
    );
    // Other consumers are left alone
    assert!(session.gateway().consumer_keys("DASHBOARD").unwrap().is_empty());
}

#[test]
fn test_apply_postgres_only() {
    let temp_dir = TempDir::new().unwrap();
    let deployment = open(stack_server(), temp_dir.path());

    let mut session = deployment.session().unwrap();
    deployment
        .apply_secrets(
            &mut session,
            SecretScope {
                jwt: false,
                postgres: true,
            },
        )
        .unwrap();

    assert_eq!(
        session.get("postgres_password").unwrap(),
        deployment.secrets().postgres_password
    );
    assert_eq!(session.get("anon_jwt").unwrap(), "old-anon");
    assert!(!deployment.is_configured(&session));
}

#[test]
fn test_secrets_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let server = stack_server();

    let first = open(server.clone(), temp_dir.path());
    let second = open(server, temp_dir.path());
    assert_eq!(first.secrets(), second.secrets());
    assert_eq!(
        ProjectSecrets::load(first.project_dir()).unwrap(),
        *first.secrets()
    );
}

#[test]
fn test_ensure_configured_writes_once() {
    let temp_dir = TempDir::new().unwrap();
    let server = stack_server();
    let deployment = open(server.clone(), temp_dir.path());

    assert!(deployment.ensure_configured().unwrap());
    let session = deployment.session().unwrap();
    assert!(deployment.is_configured(&session));

    server.clear_operations();
    assert!(!deployment.ensure_configured().unwrap());
    assert!(!server
        .operations()
        .iter()
        .any(|operation| matches!(operation, Operation::Put(_))));
}

#[test]
fn test_ensure_configured_without_stack() {
    let temp_dir = TempDir::new().unwrap();
    let server = Arc::new(MemoryServer::new());
    let deployment = open(server.clone(), temp_dir.path());

    let err = deployment.ensure_configured().unwrap_err();
    assert!(err.to_string().contains("No stack found"));
    assert!(server
        .operations()
        .iter()
        .all(|operation| matches!(operation, Operation::Exists(_))));
}

fn settings(base: &Path) -> Settings {
    Settings {
        base_path: base.to_path_buf(),
        project: "demo".to_string(),
        docker_dir: Some(DOCKER.to_string()),
        output_json: false,
        no_color: true,
        debug: false,
    }
}

fn run(server: &Arc<MemoryServer>, base: &Path, args: &[&str]) -> hserv::Result<()> {
    let cli = Cli::parse_from(std::iter::once("hserv").chain(args.iter().copied()));
    let remote: Arc<dyn RemoteServer> = server.clone();
    cli.execute_with(settings(base), remote)
}

#[test]
fn test_cli_configure_then_status() {
    let temp_dir = TempDir::new().unwrap();
    let server = stack_server();

    run(&server, temp_dir.path(), &["configure"]).unwrap();
    run(&server, temp_dir.path(), &["status"]).unwrap();

    let secrets = ProjectSecrets::load(&temp_dir.path().join("demo")).unwrap();
    let env = server
        .read_string(&join_remote(DOCKER, &[".env"]))
        .unwrap();
    assert!(env.contains(&format!("POSTGRES_PASSWORD={}\n", secrets.postgres_password)));
    assert!(env.contains(&format!("JWT_SECRET={}\n", secrets.jwt_secret)));
    assert!(env.contains("SMTP_PORT=2500\n"));
}

#[test]
fn test_cli_set_saves_unless_dry_run() {
    let temp_dir = TempDir::new().unwrap();
    let server = stack_server();
    let env_path = join_remote(DOCKER, &[".env"]);

    run(&server, temp_dir.path(), &["set", "smtp_port=25", "--dry-run"]).unwrap();
    assert!(server.read_string(&env_path).unwrap().contains("SMTP_PORT=2500\n"));

    run(&server, temp_dir.path(), &["set", "smtp_port=25"]).unwrap();
    assert!(server.read_string(&env_path).unwrap().contains("SMTP_PORT=25\n"));
}

#[test]
fn test_cli_reports_unknown_option() {
    let temp_dir = TempDir::new().unwrap();
    let server = stack_server();

    let err = run(&server, temp_dir.path(), &["get", "smtp_host"]).unwrap_err();
    assert!(matches!(err, hserv::HservError::UnknownOption { .. }));

    run(&server, temp_dir.path(), &["get", "smtp_host", "--default", "none"]).unwrap();
    assert!(run(&server, temp_dir.path(), &["set", "smtp_host=mail"]).is_err());
}

#[test]
fn test_cli_requires_project() {
    let temp_dir = TempDir::new().unwrap();
    let server = stack_server();
    let cli = Cli::parse_from(["hserv", "show"]);

    let mut settings = settings(temp_dir.path());
    settings.project = String::new();
    assert!(cli.execute_with(settings, server).is_err());
}

#[test]
fn test_cli_setup() {
    let temp_dir = TempDir::new().unwrap();
    let server = stack_server();

    run(&server, temp_dir.path(), &["setup"]).unwrap();
    run(&server, temp_dir.path(), &["setup"]).unwrap();

    let secrets = ProjectSecrets::load(&temp_dir.path().join("demo")).unwrap();
    let env = server
        .read_string(&join_remote(DOCKER, &[".env"]))
        .unwrap();
    assert!(env.contains(&format!("JWT_SECRET={}\n", secrets.jwt_secret)));

    let empty = Arc::new(MemoryServer::new());
    assert!(run(&empty, temp_dir.path(), &["setup"]).is_err());
}

#[test]
fn test_cli_config_show_needs_no_project() {
    let temp_dir = TempDir::new().unwrap();
    let server = stack_server();
    let cli = Cli::parse_from(["hserv", "config", "show"]);

    let mut settings = settings(temp_dir.path());
    settings.project = String::new();
    cli.execute_with(settings, server.clone()).unwrap();
    assert!(server.operations().is_empty());
}
