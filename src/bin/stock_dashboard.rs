use stock_dashboard::abort::AbortController;
use stock_dashboard::chart::theme::{Stylesheet, DEFAULT_STYLESHEET};
use stock_dashboard::config::Config;
use stock_dashboard::models::timeframe::Timeframe;
use stock_dashboard::router::Route;
use stock_dashboard::services::interpretation_service::InterpretationOutcome;
use stock_dashboard::Dashboard;

use anyhow::{bail, Context};
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{error, info, warn};
use std::time::Duration;

fn credentials_args<'a>(cmd: App<'a>) -> App<'a> {
    cmd.arg(
        Arg::with_name("email")
            .short('u')
            .long("email")
            .value_name("EMAIL")
            .required(true)
            .takes_value(true),
    )
    .arg(
        Arg::with_name("password")
            .short('p')
            .long("password")
            .value_name("PASSWORD")
            .required(true)
            .takes_value(true),
    )
}

fn build_cli() -> App<'static> {
    App::new("stock_dashboard")
        .version("1.0.0")
        .about("Stock history and forecast dashboard client")
        .arg(
            Arg::with_name("api-url")
                .long("api-url")
                .value_name("URL")
                .help("API base url (overrides STOCK_DASHBOARD_API_URL)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory holding the session storage file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("Request timeout in seconds")
                .takes_value(true),
        )
        .subcommand(credentials_args(
            SubCommand::with_name("register").about("Create an account and log in"),
        ))
        .subcommand(credentials_args(
            SubCommand::with_name("login").about("Log in and store the session token"),
        ))
        .subcommand(SubCommand::with_name("logout").about("Forget the stored session token"))
        .subcommand(SubCommand::with_name("status").about("Show the session state"))
        .subcommand(
            SubCommand::with_name("companies")
                .about("List companies with their price change")
                .arg(
                    Arg::with_name("timeframe")
                        .short('t')
                        .long("timeframe")
                        .value_name("TIMEFRAME")
                        .help("1D, 5D, 1M, 6M, YTD, 1Y or MAX")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("chart")
                .about("Print chart options and series as JSON")
                .arg(
                    Arg::with_name("ticker")
                        .short('s')
                        .long("ticker")
                        .value_name("TICKER")
                        .help("Ticker to chart (defaults to the first company)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("timeframe")
                        .short('t')
                        .long("timeframe")
                        .value_name("TIMEFRAME")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("stylesheet")
                        .long("stylesheet")
                        .value_name("FILE")
                        .help("CSS file defining the --color-chart-* variables")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("light")
                        .long("light")
                        .help("Apply the .light-theme rules")
                        .takes_value(false),
                ),
        )
        .subcommand(
            SubCommand::with_name("interpret")
                .about("Fetch the model interpretation for a symbol (Ctrl-C aborts)")
                .arg(
                    Arg::with_name("symbol")
                        .short('s')
                        .long("symbol")
                        .value_name("SYMBOL")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("model")
                        .short('m')
                        .long("model")
                        .value_name("MODEL")
                        .help("Model name, repeatable (arima, garch, lstm)")
                        .takes_value(true)
                        .multiple_occurrences(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("route")
                .about("Resolve a path through the route guards")
                .arg(
                    Arg::with_name("path")
                        .value_name("PATH")
                        .default_value("/")
                        .takes_value(true),
                ),
        )
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(url) = matches.value_of("api-url") {
        config = config.with_api_url(url)?;
    }
    if let Some(dir) = matches.value_of("data-dir") {
        config = config.with_data_dir(dir);
    }
    if let Some(secs) = matches.value_of("timeout") {
        let secs: u64 = secs.parse().context("timeout must be a number of seconds")?;
        config = config.with_request_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn parse_timeframe(matches: &ArgMatches) -> anyhow::Result<Option<Timeframe>> {
    Ok(match matches.value_of("timeframe") {
        Some(tf) => Some(tf.parse()?),
        None => None,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = build_cli().get_matches();
    let config = load_config(&matches)?;
    let dashboard = Dashboard::from_config(&config)?;

    match matches.subcommand() {
        Some(("register", sub)) => {
            let email = sub.value_of("email").unwrap_or_default();
            let password = sub.value_of("password").unwrap_or_default();
            if let Err(e) = dashboard.auth.register(email, password).await {
                let message = dashboard.auth.error().unwrap_or_else(|| e.to_string());
                bail!(message);
            }
            info!("Registered and logged in as {}", email);
        }
        Some(("login", sub)) => {
            let email = sub.value_of("email").unwrap_or_default();
            let password = sub.value_of("password").unwrap_or_default();
            match dashboard.auth.login(email, password).await {
                Ok(next) => info!("Logged in, continue at {}", next),
                Err(e) => {
                    let message = dashboard.auth.error().unwrap_or_else(|| e.to_string());
                    bail!(message);
                }
            }
        }
        Some(("logout", _)) => {
            let next = dashboard.auth.logout()?;
            info!("Logged out, continue at {}", next);
        }
        Some(("status", _)) => {
            let authenticated = dashboard.auth.is_authenticated();
            println!("authenticated: {}", authenticated);
            println!("home resolves to: {}", dashboard.navigate(Route::Home.path()));
        }
        Some(("companies", sub)) => {
            match parse_timeframe(sub)? {
                Some(tf) => dashboard.companies.set_timeframe(tf).await,
                None => dashboard.companies.fetch_companies().await,
            }
            let state = dashboard.companies.snapshot();
            if let Some(err) = state.error {
                bail!(err);
            }

            println!("{:<8} {:<30} {:>12} {:>12} {:>10}", "Ticker", "Name", "Price", "Change", "Change%");
            println!("{:-<76}", "");
            for company in &state.companies {
                let fmt = |v: Option<f64>| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string());
                println!(
                    "{:<8} {:<30} {:>12} {:>12} {:>10}",
                    company.ticker,
                    company.name,
                    fmt(company.current_price),
                    fmt(company.price_change),
                    fmt(company.price_change_percent)
                );
            }
        }
        Some(("chart", sub)) => {
            if let Some(tf) = parse_timeframe(sub)? {
                dashboard.companies.set_timeframe(tf).await;
            } else {
                dashboard.companies.fetch_companies().await;
            }
            if let Some(ticker) = sub.value_of("ticker") {
                dashboard.companies.select_company(ticker).await;
            }

            let state = dashboard.companies.snapshot();
            if let Some(err) = state.chart_error.or(state.error) {
                bail!(err);
            }

            let css = match sub.value_of("stylesheet") {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read stylesheet {}", path))?,
                None => DEFAULT_STYLESHEET.to_string(),
            };
            let theme_class = if sub.is_present("light") { Some("light-theme") } else { None };
            let style = Stylesheet::parse(&css).computed(theme_class);

            let view = dashboard.chart_view(&style)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Some(("interpret", sub)) => {
            if !dashboard.auth.is_authenticated() {
                warn!("No session token stored, the request is sent unauthenticated");
            }
            let symbol = sub.value_of("symbol").unwrap_or_default();
            let models: Vec<String> = sub
                .values_of("model")
                .map(|values| values.map(str::to_string).collect())
                .unwrap_or_default();

            let controller = AbortController::new();
            let aborter = controller.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    aborter.abort();
                }
            });

            match dashboard.interpret(symbol, &models, &controller.signal()).await {
                Ok(InterpretationOutcome::Loaded(text)) => println!("{}", text),
                Ok(InterpretationOutcome::Aborted) => info!("Interpretation request cancelled"),
                Err(e) => {
                    error!("{}", e);
                    let message = dashboard
                        .interpretation
                        .snapshot()
                        .error
                        .unwrap_or_else(|| e.to_string());
                    bail!(message);
                }
            }
        }
        Some(("route", sub)) => {
            let path = sub.value_of("path").unwrap_or("/");
            println!("{} -> {}", path, dashboard.navigate(path));
        }
        _ => {
            info!("No command specified. Use --help for usage information.");
        }
    }

    Ok(())
}
