use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use faq_engine::{
    evaluate_cases, load_eval_cases, read_csv_catalog, write_report_csv, Catalog, CatalogConfig, Config,
    EvaluationRun, Matcher, Role, Session, DEFAULT_REQUIRED_PASS_RATE,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

const HISTORY_PAGE: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "faq")]
#[command(about = "University FAQ assistant")]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the catalog resources. Overrides `catalog.dir`.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Answer a single question.
    Ask {
        #[arg(long)]
        question: String,
        /// Print which stage produced the answer.
        #[arg(long)]
        explain: bool,
        /// Also list the k most similar catalog questions.
        #[arg(long)]
        top: Option<usize>,
        /// Print the reply as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive chat session.
    Chat,
    /// List the distinct categories with their entry counts.
    Categories,
    /// Print one catalog entry.
    Show {
        #[arg(long)]
        index: usize,
    },
    /// List catalog questions, optionally for one category.
    List {
        #[arg(long)]
        category: Option<String>,
    },
    /// Convert a question,answer,intent,category CSV into catalog resources.
    BuildCatalog {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Replay evaluation cases against the catalog.
    Eval {
        #[arg(long)]
        cases: PathBuf,
        #[arg(long, default_value_t = DEFAULT_REQUIRED_PASS_RATE)]
        min_pass_rate: f32,
        /// Write per-case outcomes to this CSV file.
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.catalog.dir = dir.clone();
    }
    Ok(config)
}

fn make_matcher(config: &Config) -> Result<Matcher> {
    config.build_matcher().with_context(|| {
        format!(
            "error loading faq catalog from {}",
            config.catalog.dir.display()
        )
    })
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    Catalog::load(&config.catalog).with_context(|| {
        format!(
            "error loading faq catalog from {}",
            config.catalog.dir.display()
        )
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}...")
    }
}

fn run_chat(matcher: &Matcher) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut session = Session::new();

    loop {
        let line = match rl.readline("faq> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed.to_ascii_lowercase().as_str(), "exit" | "quit") {
            break;
        }
        rl.add_history_entry(trimmed).ok();

        match trimmed {
            ":history" => {
                for turn in session.history().recent(HISTORY_PAGE) {
                    let who = match turn.role {
                        Role::User => "you",
                        Role::Assistant => "assistant",
                    };
                    println!("{who}: {}", turn.text);
                }
            }
            ":clear" => {
                session.reset();
                println!("conversation cleared");
            }
            question => {
                if let Some(reply) = session.ask(matcher, question) {
                    println!("{reply}");
                }
            }
        }
    }

    Ok(())
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Ask {
            question,
            explain,
            top,
            json,
        } => {
            let matcher = make_matcher(&config)?;
            let reply = matcher.reply(question, &[]);

            if *json {
                println!("{}", serde_json::to_string(&reply)?);
                return Ok(());
            }
            if *explain {
                println!(
                    "source={} index={} score={} threshold={:.4}",
                    reply.source.kind(),
                    reply
                        .source
                        .index()
                        .map_or_else(|| "null".to_string(), |i| i.to_string()),
                    reply
                        .source
                        .score()
                        .map_or_else(|| "null".to_string(), |s| format!("{s:.4}")),
                    matcher.threshold(),
                );
            }
            println!("{}", reply.text);
            if let Some(k) = top {
                for (index, score) in matcher.top_k(question, *k) {
                    let entry = matcher.catalog().get(index);
                    println!(
                        "candidate index={} score={:.4} question={}",
                        index, score, entry.question
                    );
                }
            }
        }
        Commands::Chat => {
            let matcher = make_matcher(&config)?;
            run_chat(&matcher)?;
        }
        Commands::Categories => {
            let catalog = load_catalog(&config)?;
            for (category, count) in catalog.category_counts() {
                println!("{category}\t{count}");
            }
        }
        Commands::Show { index } => {
            let catalog = load_catalog(&config)?;
            let entry = catalog.try_get(*index).with_context(|| {
                format!("index {index} out of range (catalog has {} entries)", catalog.len())
            })?;
            println!("question={}", entry.question);
            println!("answer={}", entry.answer);
            println!("intent={}", entry.intent);
            println!("category={}", entry.category);
        }
        Commands::List { category } => {
            let catalog = load_catalog(&config)?;
            let indices: Vec<usize> = match category {
                Some(c) => catalog.indices_in_category(c),
                None => (0..catalog.len()).collect(),
            };
            if indices.is_empty() {
                tracing::warn!(category = ?category, "no questions available");
            }
            for i in indices {
                println!("{i}\t{}", truncate(catalog.get(i).question, 45));
            }
        }
        Commands::BuildCatalog { input, output } => {
            let catalog = read_csv_catalog(input)?;
            let target = CatalogConfig {
                dir: output.clone(),
                ..config.catalog.clone()
            };
            catalog.save(&target)?;
            println!(
                "entries={} categories={} output={}",
                catalog.len(),
                catalog.categories().len(),
                output.display()
            );
        }
        Commands::Eval {
            cases,
            min_pass_rate,
            report,
        } => {
            let run_id = format!("eval-{}", chrono::Utc::now().timestamp_millis());
            let mut run = EvaluationRun::start(
                run_id,
                cases.to_string_lossy().into_owned(),
                *min_pass_rate,
            );

            let matcher = match config.build_matcher() {
                Ok(matcher) => {
                    run.on_catalog_loaded(&matcher);
                    matcher
                }
                Err(err) => {
                    run.on_catalog_load_failed(err.to_string());
                    println!(
                        "run_id={} status={:?} required={:.4}",
                        run.run_id, run.status, run.required_pass_rate
                    );
                    return Err(err).context("error loading faq catalog");
                }
            };
            if let Some(snapshot) = &run.matcher {
                println!(
                    "catalog entries={} categories={} threshold={:.4}",
                    snapshot.entries, snapshot.categories, snapshot.threshold
                );
            }

            let cases = load_eval_cases(cases)?;
            let summary = evaluate_cases(&matcher, &cases);
            run.on_eval_completed(&summary);

            println!(
                "run_id={} status={:?} total={} passed={} failed={} pass_rate={:.4} required={:.4}",
                run.run_id,
                run.status,
                summary.total,
                summary.passed,
                summary.failed,
                summary.pass_rate,
                run.required_pass_rate,
            );
            if let Some(result) = &run.summary {
                for (kind, tally) in &result.by_stage {
                    println!(
                        "stage={} replies={} passed={} min_score={}",
                        kind,
                        tally.replies,
                        tally.passed,
                        tally
                            .min_score
                            .map_or_else(|| "null".to_string(), |s| format!("{s:.4}")),
                    );
                }
            }
            if let Some(margin) = run.catalog_margin() {
                println!("catalog_margin={margin:.4}");
            }

            for o in &summary.outcomes {
                println!(
                    "case={} passed={} source={} index={} score={} latency={:.3}ms",
                    o.case_id,
                    o.passed,
                    o.actual,
                    o.actual_index
                        .map_or_else(|| "null".to_string(), |i| i.to_string()),
                    o.score
                        .map_or_else(|| "null".to_string(), |s| format!("{s:.4}")),
                    o.latency_ms
                );
            }

            if let Some(path) = report {
                write_report_csv(path, &summary)?;
                tracing::info!(path = %path.display(), "wrote eval report");
            }

            if let Some(err) = &run.error {
                anyhow::bail!("{err}");
            }
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
