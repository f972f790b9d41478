//! Turn reviewer annotations into a colloquium letter or a peer review.
//!
//! Usage:
//!   pdf_remarks colloquium thesis.json --pdf thesis.pdf --out letters/
//!   pdf_remarks review paper.json --api groq --rate-limit
//!   pdf_remarks locate paper.json

use pdf_remarks::config::{ApiChoice, Credentials, DocumentKind, PipelineConfig, parse_temperature};
use pdf_remarks::pipeline::AnnotationPipeline;
use pdf_remarks::rewrite::select_provider;
use pdf_remarks::source::{ExtractedDocument, pdf};
use std::path::{Path, PathBuf};
use std::time::Instant;

const USAGE: &str = "Usage: pdf_remarks <review|colloquium|locate> <extraction.json> [--pdf FILE] \
[--out DIR] [--api auto|openai|groq|gemini|ollama] [--model NAME] [--temperature T] \
[--rate-limit] [--no-compile] [--verbose]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Review,
    Colloquium,
    Locate,
}

#[derive(Debug)]
struct CliArgs {
    mode: Mode,
    input: PathBuf,
    pdf: Option<PathBuf>,
    output_dir: PathBuf,
    api: Option<ApiChoice>,
    model: Option<String>,
    temperature: Option<f32>,
    rate_limit: bool,
    compile: bool,
    verbose: bool,
}

impl CliArgs {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mode = match args.first().map(String::as_str) {
            Some("review") => Mode::Review,
            Some("colloquium") => Mode::Colloquium,
            Some("locate") => Mode::Locate,
            Some(other) => return Err(format!("unknown command: {}", other)),
            None => return Err("missing command".to_string()),
        };
        let input = args.get(1).map(PathBuf::from).ok_or("missing extraction file")?;

        let mut cli = Self {
            mode,
            input,
            pdf: None,
            output_dir: PathBuf::from("."),
            api: None,
            model: None,
            temperature: None,
            rate_limit: false,
            compile: true,
            verbose: false,
        };

        let mut rest = args[2..].iter();
        while let Some(arg) = rest.next() {
            let mut value = |flag: &str| rest.next().cloned().ok_or(format!("{} needs a value", flag));
            match arg.as_str() {
                "--pdf" => cli.pdf = Some(PathBuf::from(value("--pdf")?)),
                "--out" => cli.output_dir = PathBuf::from(value("--out")?),
                "--api" => cli.api = Some(value("--api")?.parse().map_err(|e| format!("{}", e))?),
                "--model" => cli.model = Some(value("--model")?),
                "--temperature" => {
                    let t = value("--temperature")?;
                    cli.temperature = Some(parse_temperature(&t).map_err(|e| format!("{}", e))?);
                },
                "--rate-limit" => cli.rate_limit = true,
                "--no-compile" => cli.compile = false,
                "--verbose" | "-v" => cli.verbose = true,
                other => return Err(format!("unknown option: {}", other)),
            }
        }
        Ok(cli)
    }

    fn config(&self) -> pdf_remarks::Result<PipelineConfig> {
        let mut config = PipelineConfig::from_env()?;
        if let Some(api) = self.api {
            config = config.with_api_choice(api);
        }
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(t) = self.temperature {
            config = config.with_temperature(t);
        }
        if self.rate_limit {
            config = config.with_rate_limit(true);
        }
        Ok(match self.mode {
            Mode::Review => config
                .with_document_kind(DocumentKind::PeerReview)
                .with_ignore_source_comments(false),
            Mode::Colloquium | Mode::Locate => config,
        })
    }

    fn file_stem(&self) -> String {
        let path: &Path = self.pdf.as_deref().unwrap_or(&self.input);
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}

fn run(cli: &CliArgs) -> pdf_remarks::Result<()> {
    let config = cli.config()?;
    let mut doc = ExtractedDocument::load(&cli.input)?;
    if let Some(pdf_path) = &cli.pdf {
        doc.replace_annotations(pdf::read_annotations(pdf_path)?);
    }
    let pipeline = AnnotationPipeline::new(config);

    match cli.mode {
        Mode::Locate => {
            let prepared = pipeline.prepare(&doc);
            for failure in &prepared.failures {
                eprintln!("skipped: {}", failure);
            }
            println!("{}", serde_json::to_string_pretty(&prepared.requests)?);
        },
        Mode::Review => {
            let provider = select_provider(pipeline.config(), &Credentials::from_env())?;
            let path = pipeline.run_review(&doc, provider.as_ref(), &cli.output_dir, &cli.file_stem())?;
            println!("Review written to {}", path.display());
        },
        Mode::Colloquium => {
            let provider = select_provider(pipeline.config(), &Credentials::from_env())?;
            let output = pipeline.run_colloquium(&doc, provider.as_ref(), &cli.output_dir, cli.compile)?;
            println!("LaTeX file: {}", output.tex_path.display());
            if let Some(pdf_path) = &output.pdf_path {
                println!("PDF file:   {}", pdf_path.display());
            }
            println!("Questions:  {} ({})", output.comments.len(), output.language.as_str());
        },
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match CliArgs::parse(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        },
    };

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let start_time = Instant::now();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    log::info!("Finished in {:.2}s", start_time.elapsed().as_secs_f64());
}
