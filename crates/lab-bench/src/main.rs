use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lab_bench::walkthrough::{self, Domain, WalkthroughOptions};
use lab_bench::LabConfig;
use lab_explain::{ExplanationCache, HttpExplanationBackend};
use lab_speech::{
    ConsoleSpeechEngine, HttpTtsClient, OnDeviceSpeech, ProxySpeech, SpeechDelivery, SpeechRouter,
    SpoolAudioSink,
};
use lab_tasks::domain::{chemistry, optics};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn domain_arg() -> Arg {
    Arg::new("domain")
        .long("domain")
        .short('d')
        .default_value("chemistry")
        .value_parser(|s: &str| s.parse::<Domain>().map_err(|e| e.to_string()))
        .help("Simulation to use: chemistry or optics")
}

fn cli() -> Command {
    Command::new("lab-bench")
        .version(lab_bench::VERSION)
        .about("Guided science simulations from the command line")
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("tasks")
                .about("List the tasks of a simulation")
                .arg(domain_arg()),
        )
        .subcommand(
            Command::new("walkthrough")
                .about("Solve every task with scripted actions while the guide narrates")
                .arg(domain_arg())
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML configuration file"),
                )
                .arg(
                    Arg::new("explain")
                        .long("explain")
                        .action(ArgAction::SetTrue)
                        .help("Request an AI explanation for each task"),
                )
                .arg(
                    Arg::new("mute")
                        .long("mute")
                        .action(ArgAction::SetTrue)
                        .help("Start with the voice muted"),
                )
                .arg(
                    Arg::new("no-gesture")
                        .long("no-gesture")
                        .action(ArgAction::SetTrue)
                        .help("Never simulate a user gesture, so narration stays deferred"),
                )
                .arg(
                    Arg::new("spool-dir")
                        .long("spool-dir")
                        .value_parser(value_parser!(PathBuf))
                        .help("Route long narration through the speech proxy, writing audio here"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the report as JSON"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn list_tasks(domain: Domain) -> anyhow::Result<()> {
    let rows: Vec<(String, String, String)> = match domain {
        Domain::Chemistry => chemistry::tasks()
            .into_iter()
            .map(|t| (t.id.to_string(), t.title, t.description))
            .collect(),
        Domain::Optics => optics::tasks()
            .into_iter()
            .map(|t| (t.id.to_string(), t.title, t.description))
            .collect(),
    };
    println!("{domain} tasks:");
    for (id, title, description) in rows {
        println!("  {id:<8} {title}");
        println!("           {description}");
    }
    Ok(())
}

fn build_delivery(config: &LabConfig, spool_dir: Option<&PathBuf>) -> anyhow::Result<Arc<dyn SpeechDelivery>> {
    let on_device: Arc<dyn SpeechDelivery> = Arc::new(OnDeviceSpeech::new(
        Arc::new(ConsoleSpeechEngine::new()),
        &config.speech,
    ));
    let Some(dir) = spool_dir else {
        return Ok(on_device);
    };
    let sink = SpoolAudioSink::new(dir).with_context(|| format!("preparing {}", dir.display()))?;
    let proxy: Arc<dyn SpeechDelivery> = Arc::new(ProxySpeech::new(
        Arc::new(HttpTtsClient::from_config(&config.speech)),
        Arc::new(sink),
        &config.speech,
    ));
    Ok(Arc::new(SpeechRouter::new(
        on_device,
        proxy,
        config.speech.proxy_threshold_chars,
    )))
}

async fn walkthrough_cmd(args: &ArgMatches) -> anyhow::Result<bool> {
    let domain = args
        .get_one::<Domain>("domain")
        .copied()
        .unwrap_or(Domain::Chemistry);
    let mut config = LabConfig::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path))?;
    if config.explanation.subject.is_empty() {
        let (subject, topic) = domain.subject();
        config.explanation = config.explanation.with_subject(subject, topic);
    }

    let delivery = build_delivery(&config, args.get_one::<PathBuf>("spool-dir"))?;
    let explainer = args.get_flag("explain").then(|| {
        let backend = Arc::new(HttpExplanationBackend::from_config(&config.explanation));
        ExplanationCache::new(backend, config.explanation.clone())
    });
    let options = WalkthroughOptions {
        explain: args.get_flag("explain"),
        gesture: !args.get_flag("no-gesture"),
        muted: args.get_flag("mute"),
    };

    let report = walkthrough::run(domain, delivery, explainer, &config.guide, options).await?;
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.generate_text());
    }
    Ok(report.passed())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("tasks", args)) => {
            let domain = args
                .get_one::<Domain>("domain")
                .copied()
                .unwrap_or(Domain::Chemistry);
            list_tasks(domain)
        }
        Some(("walkthrough", args)) => {
            let passed = walkthrough_cmd(args).await?;
            std::process::exit(if passed { 0 } else { 1 });
        }
        _ => {
            for domain in Domain::ALL {
                list_tasks(domain)?;
            }
            println!();
            println!("Run `lab-bench walkthrough --domain <chemistry|optics>` for a guided run.");
            Ok(())
        }
    }
}
