use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "gql-cli")]
#[command(about = "Send GraphQL operations to a gql-transport server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080/graphql")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send an operation as a JSON POST (or GET with --get)
    Query {
        /// GraphQL document
        query: String,
        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,
        #[arg(long)]
        operation_name: Option<String>,
        /// Send as query parameters instead of a JSON body
        #[arg(long)]
        get: bool,
    },
    /// Send an operation with files as a multipart form
    Upload {
        /// GraphQL document
        query: String,
        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,
        /// Files to attach, as `<variable path>=<file>`, e.g. `variables.file=./a.txt`
        #[arg(short, long = "file", value_parser = parse_file_arg, required = true)]
        files: Vec<(String, PathBuf)>,
    },
}

fn parse_file_arg(raw: &str) -> Result<(String, PathBuf), String> {
    let (path, file) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <variable path>=<file>, got {raw}"))?;
    if path.is_empty() || file.is_empty() {
        return Err(format!("expected <variable path>=<file>, got {raw}"));
    }
    Ok((path.to_string(), PathBuf::from(file)))
}

fn parse_variables(raw: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    match raw {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Value::Object(Map::new())),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = match cli.command {
        Commands::Query {
            query,
            variables,
            operation_name,
            get,
        } => {
            let variables = parse_variables(variables.as_deref())?;
            if get {
                let mut params = vec![("query", query), ("variables", variables.to_string())];
                if let Some(name) = operation_name {
                    params.push(("operationName", name));
                }
                client.get(&cli.url).query(&params).send().await?
            } else {
                let body = json!({
                    "query": query,
                    "variables": variables,
                    "operationName": operation_name,
                });
                client.post(&cli.url).json(&body).send().await?
            }
        }
        Commands::Upload {
            query,
            variables,
            files,
        } => {
            let mut variables = parse_variables(variables.as_deref())?;
            let mut map = Map::new();
            let mut parts = Vec::with_capacity(files.len());

            for (index, (path, file)) in files.into_iter().enumerate() {
                let key = index.to_string();
                // Placeholder the server replaces with the upload.
                if let Some(name) = path.strip_prefix("variables.") {
                    if let Value::Object(vars) = &mut variables {
                        vars.entry(name.to_string()).or_insert(Value::Null);
                    }
                }
                map.insert(key.clone(), json!([path]));

                let bytes = tokio::fs::read(&file).await?;
                let filename = file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| key.clone());
                parts.push((key, Part::bytes(bytes).file_name(filename)));
            }

            let operations = json!({ "query": query, "variables": variables });
            let mut form = Form::new()
                .text("operations", operations.to_string())
                .text("map", Value::Object(map).to_string());
            for (key, part) in parts {
                form = form.part(key, part);
            }
            client.post(&cli.url).multipart(form).send().await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => {
            if !status.is_success() {
                eprintln!("Error: server returned status {}", status);
            }
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Err(_) => {
            eprintln!("Error: server returned status {}", status);
            eprintln!("Response: {}", text);
        }
    }
    Ok(())
}
