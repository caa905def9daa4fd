use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coloring_book_api::book::{generate_book, BookRequest, DEFAULT_PAGE_COUNT};
use coloring_book_api::chat::{send_message, SessionSlot};
use coloring_book_api::document::{assemble_pdf, document_file_name, save_document, PixelDecoder};
use coloring_book_api::error::{AppError, RenderError};
use coloring_book_api::generation::{styled_prompt, GeneratedImage};
use coloring_book_api::{Config, GeminiChatClient, ImagenClient};

#[derive(Parser, Debug)]
#[command(name = "bookctl", about = "CLI for the Coloring Book API", version)]
struct Cli {
    /// Override GEMINI_API_KEY
    #[arg(global = true, long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a coloring book and save it as a PDF
    Book {
        /// Theme, e.g. "Enchanted Forest"
        #[arg(long)]
        theme: String,
        /// Child's name used on the cover and in the file name
        #[arg(long)]
        name: String,
        /// Number of interior pages
        #[arg(long, default_value_t = DEFAULT_PAGE_COUNT)]
        pages: usize,
        /// Output directory (defaults to OUTPUT_DIR)
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Also write every generated image as a PNG next to the PDF
        #[arg(long)]
        save_images: bool,
    },
    /// Print the prompts a book would use, without calling any service
    Prompts {
        #[arg(long)]
        theme: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = DEFAULT_PAGE_COUNT)]
        pages: usize,
        /// Include the line-art style suffix sent to the image model
        #[arg(long)]
        styled: bool,
    },
    /// Build a PDF from images already on disk
    Assemble {
        /// Book title printed on the cover
        #[arg(long)]
        title: String,
        #[arg(long)]
        name: String,
        /// Cover image path
        #[arg(long, value_name = "PATH")]
        cover: PathBuf,
        /// Interior page image path (repeatable, kept in order)
        #[arg(long = "page", value_name = "PATH")]
        pages: Vec<PathBuf>,
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
    },
    /// Talk to the friendly chatbot
    Chat {
        /// Send one message and exit; otherwise read messages from stdin
        #[arg(long, short)]
        message: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load env and parse CLI
    Config::dotenv_load();
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let mut conf = Config::new();
    if let Some(key) = cli.api_key {
        conf.api_key = Some(key);
    }

    let result = match cli.command {
        Commands::Book { theme, name, pages, out, save_images } => {
            let request = BookRequest::new(theme, name).with_page_count(pages);
            let out_dir = out.unwrap_or_else(|| conf.output_dir.clone());
            run_book(&conf, &request, out_dir, save_images).await
        }
        Commands::Prompts { theme, name, pages, styled } => {
            let request = BookRequest::new(theme, name).with_page_count(pages);
            request.validate().map(|_| {
                for prompt in request.prompts().all_prompts(request.page_count) {
                    if styled {
                        println!("{}", styled_prompt(&prompt));
                    } else {
                        println!("{}", prompt);
                    }
                }
            })
        }
        Commands::Assemble { title, name, cover, pages, out } => {
            let out_dir = out.unwrap_or_else(|| conf.output_dir.clone());
            run_assemble(&title, &name, cover, pages, out_dir).await
        }
        Commands::Chat { message } => run_chat(&conf, message).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.user_message());
        tracing::debug!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_book(conf: &Config, request: &BookRequest, out_dir: PathBuf, save_images: bool) -> Result<(), AppError> {
    request.validate()?;
    let client = ImagenClient::from_config(conf)?;
    eprintln!("Creating magic... ({} images)", request.page_count + 1);
    let book = generate_book(&client, request).await?;

    let title = request.title();
    if save_images {
        let stem = document_file_name(&request.recipient_name, &title);
        let stem = stem.trim_end_matches(".pdf");
        for (i, image) in std::iter::once(&book.cover).chain(book.pages.iter()).enumerate() {
            let bytes = image.decode_bytes().map_err(RenderError::from)?;
            let label = if i == 0 { "cover".to_string() } else { format!("page_{:02}", i) };
            let path = save_document(&out_dir, &format!("{}_{}.png", stem, label), &bytes).await?;
            println!("{}", path.display());
        }
    }

    let pdf = assemble_pdf(&PixelDecoder, &book.cover, &book.pages, &title, &request.recipient_name).await?;
    let path = save_document(&out_dir, &document_file_name(&request.recipient_name, &title), &pdf).await?;
    println!("Saved {} ({} bytes)", path.display(), pdf.len());
    Ok(())
}

async fn run_assemble(
    title: &str,
    name: &str,
    cover: PathBuf,
    pages: Vec<PathBuf>,
    out_dir: PathBuf,
) -> Result<(), AppError> {
    let (title, name) = (title.trim(), name.trim());
    if title.is_empty() || name.is_empty() {
        return Err(AppError::Validation("A title and the child's name are required.".to_string()));
    }
    let cover = read_image(&cover).await?;
    let mut page_images = Vec::with_capacity(pages.len());
    for path in &pages {
        page_images.push(read_image(path).await?);
    }
    let pdf = assemble_pdf(&PixelDecoder, &cover, &page_images, title, name).await?;
    let path = save_document(&out_dir, &document_file_name(name, title), &pdf).await?;
    println!("Saved {} ({} bytes)", path.display(), pdf.len());
    Ok(())
}

async fn read_image(path: &Path) -> Result<GeneratedImage, AppError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        tracing::error!("Cannot read {}: {}", path.display(), e);
        AppError::Assembly(RenderError::Io(e))
    })?;
    let mime = match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        _ => "image/png",
    };
    Ok(GeneratedImage::from_bytes(&bytes, mime))
}

async fn run_chat(conf: &Config, message: Option<String>) -> Result<(), AppError> {
    let client = GeminiChatClient::from_config(conf)?;
    let slot = SessionSlot::new();
    let session = slot.get_or_create_session().await;

    if let Some(text) = message {
        let reply = send_message(&client, session, &text).await?;
        println!("{}", reply);
        return Ok(());
    }

    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        match send_message(&client, session, &line).await {
            Ok(reply) => println!("bot> {}", reply),
            Err(e) => eprintln!("bot> {}", e.user_message()),
        }
    }
    Ok(())
}
