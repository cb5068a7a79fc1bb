//! Terminal chat client for the RAG server
//!
//! Keeps an append-only transcript of the session and talks to a running
//! minirag server over HTTP. Documents can be uploaded from within the
//! session with `:upload <path>`.

use std::io::{self, BufRead, Write};
use std::path::Path;

use clap::Parser;
use console::style;
use minirag::types::{QueryRequest, QueryResponse, UploadResponse};

#[derive(Parser)]
#[command(name = "minirag-chat", about = "Chat with your documents")]
struct Args {
    /// Base URL of the RAG server
    #[arg(short, long, default_value = "http://localhost:8000")]
    server: String,
}

struct ChatSession {
    client: reqwest::Client,
    server: String,
    /// Append-only (role, content) transcript
    transcript: Vec<(String, String)>,
}

impl ChatSession {
    fn new(server: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            server,
            transcript: Vec::new(),
        }
    }

    async fn check_server(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.server))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    async fn ask(&mut self, prompt: &str) -> anyhow::Result<()> {
        self.transcript
            .push(("user".to_string(), prompt.to_string()));

        let resp = self
            .client
            .post(format!("{}/query", self.server))
            .json(&QueryRequest::new(prompt))
            .send()
            .await?;

        if !resp.status().is_success() {
            let detail = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
                .unwrap_or_else(|| "request failed".to_string());
            println!("{} {}", style("error:").red().bold(), detail);
            return Ok(());
        }

        let answer: QueryResponse = resp.json().await?;
        println!("\n{} {}\n", style("assistant:").green().bold(), answer.response);
        self.transcript
            .push(("assistant".to_string(), answer.response));

        Ok(())
    }

    async fn upload(&self, path: &str) -> anyhow::Result<()> {
        let path = Path::new(path);
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();

        let data = match tokio::fs::read(path).await {
            Ok(d) => d,
            Err(e) => {
                println!("{} cannot read {}: {}", style("error:").red().bold(), path.display(), e);
                return Ok(());
            }
        };

        println!("Uploading {} ({} bytes)...", filename, data.len());

        let part = reqwest::multipart::Part::bytes(data).file_name(filename.clone());
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(format!("{}/upload", self.server))
            .multipart(form)
            .send()
            .await?;

        if resp.status().is_success() {
            let upload: UploadResponse = resp.json().await?;
            println!(
                "{} {}: {}",
                style("ok:").green().bold(),
                upload.filename,
                upload.status
            );
        } else {
            let detail = resp
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
                .unwrap_or_else(|| "upload failed".to_string());
            println!("{} {}", style("error:").red().bold(), detail);
        }

        Ok(())
    }
}

fn print_help() {
    println!("Commands:");
    println!("  :upload <path>  - upload and index a document");
    println!("  :help           - show this help");
    println!("  :quit           - exit");
    println!("Anything else is sent as a question.\n");
}

/// Dispatch one line of input. Transport failures are printed, never
/// propagated, so a dead server does not end the session. Returns false when
/// the session should end.
async fn handle_line(session: &mut ChatSession, line: &str) -> bool {
    match line {
        ":quit" | ":q" | ":exit" => false,
        ":help" => {
            print_help();
            true
        }
        _ if line.starts_with(":upload ") => {
            let path = line.trim_start_matches(":upload ").trim();
            if let Err(e) = session.upload(path).await {
                println!("{} {}", style("error:").red().bold(), e);
            }
            true
        }
        _ => {
            if let Err(e) = session.ask(line).await {
                println!("{} {}", style("error:").red().bold(), e);
            }
            true
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut session = ChatSession::new(args.server.trim_end_matches('/').to_string());

    println!("{}", style("minirag chat").cyan().bold());
    println!("Server: {}\n", session.server);

    if !session.check_server().await {
        println!(
            "{} server not reachable at {} (is minirag-server running?)",
            style("warning:").yellow().bold(),
            session.server
        );
    }

    print_help();

    let stdin = io::stdin();
    loop {
        print!("{} ", style(">").cyan().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        }

        if !handle_line(&mut session, line).await {
            break;
        }
    }

    println!("bye");
    Ok(())
}
