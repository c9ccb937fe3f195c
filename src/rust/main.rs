use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use gazette::web::{self, AppState};
use gazette::{Article, ClassifierError, InputMode, ModelManager, Settings};
use log::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the ONNX pipeline artifact (defaults to news.onnx beside the binary or in the working directory)
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// WordNet dict directory used for lemmatization
    #[arg(long, global = true)]
    wordnet: Option<PathBuf>,

    /// Feed the "normalized" or "raw" description to the pipeline
    #[arg(long, global = true)]
    input_mode: Option<InputMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the classifier form over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<std::net::SocketAddr>,
    },
    /// Classify a single article
    Classify {
        /// Article description
        #[arg(short, long)]
        description: String,
        /// Article title
        #[arg(short, long)]
        title: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the normalized form of a text
    Normalize { text: String },
    /// Download the pipeline artifact into the model cache
    Fetch {
        #[arg(long)]
        url: String,
        /// Expected SHA-256 of the artifact (hex)
        #[arg(long)]
        sha256: String,
        /// Force a fresh download of the model file
        #[arg(short, long)]
        fresh: bool,
    },
    /// Download the WordNet dict files used for lemmatization into the cache
    FetchWordnet {
        /// Directory URL holding index.verb, verb.exc, index.adv and adv.exc
        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = Settings::from_env().context("invalid configuration")?;
    if let Some(model) = args.model {
        settings.model_path = Some(model);
    }
    if let Some(dir) = args.wordnet {
        settings.wordnet_dir = Some(dir);
    }
    if let Some(mode) = args.input_mode {
        settings.input_mode = mode;
    }

    match args.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                settings.bind = bind;
            }
            let classifier = settings.build_classifier()?;
            let state = Arc::new(AppState {
                classifier: Arc::new(classifier),
                preview_chars: settings.preview_chars,
            });
            web::serve(state, settings.bind).await?;
        }
        Command::Classify {
            description,
            title,
            json,
        } => {
            let classifier = settings.build_classifier()?;
            let mut article = Article::new(description);
            if let Some(title) = title {
                article = article.with_title(title);
            }

            let start_time = Instant::now();
            let result = classifier.classify(&article);
            info!("Classification took {:.2?}", start_time.elapsed());

            match result {
                Ok(classification) if json => {
                    println!("{}", serde_json::to_string_pretty(&classification)?);
                }
                Ok(classification) => {
                    match classification.category {
                        Some(category) => {
                            println!("{}", category.headline());
                            println!("{}", category.summary());
                        }
                        None => println!(
                            "This article doesn't clearly fit into any of the predefined categories (label {}).",
                            classification.label
                        ),
                    }
                    let preview = article.preview(settings.preview_chars);
                    if let Some(title) = preview.title {
                        println!("\nTitle: {}", title);
                    }
                    println!("Description: {}", preview.description);
                }
                Err(ClassifierError::ValidationError(_)) => {
                    bail!("Please enter the article description to classify.")
                }
                Err(e) => bail!("An error occurred during classification: {}", e),
            }
        }
        Command::Normalize { text } => {
            let classifier = settings.build_classifier()?;
            println!("{}", classifier.normalize(&text));
        }
        Command::Fetch { url, sha256, fresh } => {
            let manager = ModelManager::new_default()?;
            if fresh {
                info!("Fresh download requested - removing any existing model file...");
                manager.remove_download()?;
            }
            let path = manager.download_model(&url, &sha256).await?;
            println!("{}", path.display());
        }
        Command::FetchWordnet { url } => {
            let manager = ModelManager::new_default()?;
            let dir = manager.download_wordnet(&url).await?;
            println!("{}", dir.display());
        }
    }

    Ok(())
}
