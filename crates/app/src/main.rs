use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{
    AppServices, DemographicsService, EnrollmentService, InspectorResult, InspectorService,
    SupportConfig,
};
use support_core::model::{InspectorQuery, UserId};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use ui::{App, UiApp, build_app_context};

const DEFAULT_OFFLINE_USERNAME: &str = "learner";
const DEFAULT_OFFLINE_USER_ID: u64 = 1;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidUserId { raw: String },
    MissingLearner,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user-id value: {raw}"),
            ArgsError::MissingLearner => {
                write!(f, "inspect needs --edx-user, or --org-key with --external-key")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

struct DesktopApp {
    user_id: Option<UserId>,
    username: Option<String>,
    open_demographics_on_launch: bool,
    services: AppServices,
}

impl UiApp for DesktopApp {
    fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    fn username(&self) -> Option<String> {
        self.username.clone()
    }

    fn open_demographics_on_launch(&self) -> bool {
        self.open_demographics_on_launch
    }

    fn demographics(&self) -> Arc<DemographicsService> {
        self.services.demographics()
    }

    fn enrollments(&self) -> Arc<EnrollmentService> {
        self.services.enrollments()
    }

    fn inspector(&self) -> Arc<InspectorService> {
        self.services.inspector()
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- ui      [--base-url <url>] [--user-id <id>] [--username <name>] [--offline] [--open-demographics]"
    );
    eprintln!(
        "  cargo run -p app -- inspect [--base-url <url>] (--edx-user <user> | --org-key <org> --external-key <key>)"
    );
    eprintln!();
    eprintln!("Defaults for ui:");
    eprintln!("  --user-id and --username come from the JWT cookie when signed in");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARNER_SUPPORT_LMS_BASE_URL, LEARNER_SUPPORT_CSRF_TOKEN_API_PATH,");
    eprintln!("  LEARNER_SUPPORT_REFRESH_ENDPOINT, LEARNER_SUPPORT_JWT_COOKIE_NAME,");
    eprintln!("  LEARNER_SUPPORT_CSRF_COOKIE_NAME, LEARNER_SUPPORT_MAX_RETRIES,");
    eprintln!("  LEARNER_SUPPORT_MAX_BACKOFF_SECS, LEARNER_SUPPORT_LOG_JSON, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Inspect,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "inspect" => Some(Self::Inspect),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct UiArgs {
    base_url: Option<String>,
    user_id: Option<UserId>,
    username: Option<String>,
    offline: bool,
    open_demographics: bool,
}

impl UiArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => parsed.base_url = Some(require_value(args, "--base-url")?),
                "--user-id" => {
                    let value = require_value(args, "--user-id")?;
                    let user_id = value
                        .parse::<UserId>()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?;
                    parsed.user_id = Some(user_id);
                }
                "--username" => parsed.username = Some(require_value(args, "--username")?),
                "--offline" => parsed.offline = true,
                "--open-demographics" => parsed.open_demographics = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }
}

#[derive(Debug, Default)]
struct InspectArgs {
    base_url: Option<String>,
    query: InspectorQuery,
}

impl InspectArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => parsed.base_url = Some(require_value(args, "--base-url")?),
                "--edx-user" => parsed.query.edx_user = require_value(args, "--edx-user")?,
                "--org-key" => parsed.query.org_key = require_value(args, "--org-key")?,
                "--external-key" => {
                    parsed.query.external_user_key = require_value(args, "--external-key")?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        if parsed.query.edx_user.trim().is_empty()
            && parsed.query.external_user_key.trim().is_empty()
        {
            return Err(ArgsError::MissingLearner);
        }
        Ok(parsed)
    }
}

fn load_config(base_url: Option<&str>) -> Result<SupportConfig, Box<dyn std::error::Error>> {
    let config = SupportConfig::from_env()?;
    Ok(match base_url {
        Some(raw) => config.with_base_url(raw)?,
        None => config,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_json = std::env::var("LEARNER_SUPPORT_LOG_JSON")
        .is_ok_and(|value| matches!(value.trim(), "1" | "true"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run_ui(args: UiArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (services, claims) = if args.offline {
        (
            AppServices::offline(args.username.as_deref().unwrap_or(DEFAULT_OFFLINE_USERNAME)),
            None,
        )
    } else {
        let config = load_config(args.base_url.as_deref())?;
        info!(base_url = %config.base_url, "connecting to LMS");
        let services = AppServices::new_http(&config)?;
        let claims = match services.authenticated_user().await {
            Ok(claims) => claims,
            Err(err) => {
                warn!(error = %err, "could not read the signed-in user");
                None
            }
        };
        (services, claims)
    };

    let user_id = args
        .user_id
        .or_else(|| claims.as_ref().and_then(|c| c.user_id).map(UserId::new))
        .or_else(|| args.offline.then(|| UserId::new(DEFAULT_OFFLINE_USER_ID)));
    let username = args
        .username
        .or_else(|| claims.and_then(|c| c.preferred_username))
        .or_else(|| args.offline.then(|| DEFAULT_OFFLINE_USERNAME.to_string()));

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        user_id,
        username,
        open_demographics_on_launch: args.open_demographics,
        services,
    });
    let context = build_app_context(&app);

    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Learner Support")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

async fn run_inspect(args: InspectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.base_url.as_deref())?;
    let services = AppServices::new_http(&config)?;
    let result = services.inspector().search(&args.query).await?;
    print!("{}", render_inspector_result(&result));
    Ok(())
}

fn render_inspector_result(result: &InspectorResult) -> String {
    let mut out = String::new();
    if let Some(error) = &result.error {
        out.push_str(&format!("error: {error}\n"));
    }
    let info = &result.learner_info;
    if let Some(user) = &info.user {
        out.push_str("edX account\n");
        out.push_str(&format!(
            "  username: {}\n  email: {}\n",
            user.username.as_deref().unwrap_or("-"),
            user.email.as_deref().unwrap_or("-")
        ));
        if let Some(key) = &user.external_user_key {
            out.push_str(&format!("  external user key: {key}\n"));
        }
        match &user.sso_list {
            Some(records) => {
                for sso in records {
                    out.push_str(&format!("  sso: {}\n", sso.uid));
                }
            }
            None => out.push_str("  sso: none\n"),
        }
    }
    if let Some(verification) = &info.id_verification {
        out.push_str(&format!("id verification: {}\n", verification.status));
        if let Some(expiry) = &verification.verification_expiry {
            out.push_str(&format!("  expires: {expiry}\n"));
        }
    }
    for enrollment in info.enrollments.iter().flatten() {
        out.push_str(&format!(
            "program {} ({}): {}\n",
            enrollment.program_name.as_deref().unwrap_or("-"),
            enrollment.program_uuid,
            enrollment.status
        ));
        for course in &enrollment.program_course_enrollments {
            out.push_str(&format!("  {}: {}\n", course.course_key, course.status));
            if let Some(linked) = &course.course_enrollment {
                out.push_str(&format!(
                    "    linked {} mode={} active={}\n",
                    linked.course_id, linked.mode, linked.is_active
                ));
            }
        }
    }
    out
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let report = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };

    init_tracing();

    match cmd {
        Command::Ui => run_ui(UiArgs::parse(&mut iter).map_err(report)?).await,
        Command::Inspect => run_inspect(InspectArgs::parse(&mut iter).map_err(report)?).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
