//! hyperroute CLI
//!
//! Inspect the route table derived from hyper-schema documents, and run
//! the coercion + validation pipeline against sample values.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use hyperroute::{
    assemble_route, dereference, discover_schemas, document_links, load_schema, CircularMode,
    Handler, HandlerBinding, LinkDescriptor, RegisterOptions, RequestContext, RouteConfig,
    TemplateMode, ValidationHook, ValidationKind,
};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "hyperroute")]
#[command(about = "Derive HTTP routes and request validation from hyper-schema documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table derived from matching schema documents
    Routes {
        /// Glob pattern (or explicit path) selecting schema documents
        pattern: String,

        /// Output the table as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Fail on template placeholders with no schema definition
        #[arg(long)]
        strict: bool,

        /// Tolerate circular $ref chains instead of failing
        #[arg(long)]
        ignore_circular: bool,
    },

    /// Coerce and validate a value against one link's derived schema
    Check {
        /// Schema document path
        schema: PathBuf,

        /// Link to check, selected by its rel
        #[arg(long)]
        rel: String,

        /// Which request part to validate: params, query, payload, or headers
        #[arg(long)]
        source: String,

        /// JSON file containing the raw value to validate
        #[arg(long)]
        value: PathBuf,

        /// Request content type (gates payload coercion)
        #[arg(long)]
        content_type: Option<String>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Tolerate circular $ref chains instead of failing
        #[arg(long)]
        ignore_circular: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Routes {
            pattern,
            json,
            strict,
            ignore_circular,
        } => run_routes(&pattern, json, strict, ignore_circular),

        Commands::Check {
            schema,
            rel,
            source,
            value,
            content_type,
            json,
            ignore_circular,
        } => run_check(CheckArgs {
            schema,
            rel,
            source,
            value,
            content_type,
            json_output: json,
            ignore_circular,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn circular_mode(ignore: bool) -> CircularMode {
    if ignore {
        CircularMode::Ignore
    } else {
        CircularMode::Error
    }
}

fn stub_handler(_: &Path, _: &Value, _: &LinkDescriptor) -> Handler {
    Arc::new(|_, _| Value::Null)
}

fn run_routes(
    pattern: &str,
    json_output: bool,
    strict: bool,
    ignore_circular: bool,
) -> Result<(), u8> {
    let template_mode = if strict {
        TemplateMode::Strict
    } else {
        TemplateMode::Permissive
    };
    let options = RegisterOptions::new(pattern, HandlerBinding::Factory(&stub_handler))
        .template_mode(template_mode)
        .circular_mode(circular_mode(ignore_circular));

    let files = discover_schemas(pattern).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mut table = Vec::new();
    for file in &files {
        let mut schema = load_schema(file).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
        let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
        dereference(&mut schema, base_dir, options.circular_mode).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

        let links = document_links(&schema, file).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;

        for link in &links {
            let route = assemble_route(file, &schema, link, &options).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            table.push((file.clone(), route));
        }
    }

    if json_output {
        let entries: Vec<Value> = table
            .iter()
            .map(|(file, route)| {
                serde_json::json!({
                    "file": file.display().to_string(),
                    "method": route.method.as_str(),
                    "path": route.path,
                    "validates": validated_sources(route),
                    "description": route.description,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries).unwrap());
    } else {
        for (file, route) in &table {
            let sources = validated_sources(route);
            let validates = if sources.is_empty() {
                String::new()
            } else {
                format!("  [validates: {}]", sources.join(", "))
            };
            println!(
                "{:7} {}{}  ({})",
                route.method.as_str(),
                route.path,
                validates,
                file.display()
            );
            if let Some(description) = &route.description {
                println!("        {}", description);
            }
        }
        println!("\n{} routes from {} files", table.len(), files.len());
    }

    Ok(())
}

fn validated_sources(route: &RouteConfig) -> Vec<&'static str> {
    let mut sources = Vec::new();
    if route.validate.params.is_some() {
        sources.push("params");
    }
    if route.validate.query.is_some() {
        sources.push("query");
    }
    if route.validate.payload.is_some() {
        sources.push("payload");
    }
    if route.validate.headers.is_some() {
        sources.push("headers");
    }
    sources
}

struct CheckArgs {
    schema: PathBuf,
    rel: String,
    source: String,
    value: PathBuf,
    content_type: Option<String>,
    json_output: bool,
    ignore_circular: bool,
}

fn run_check(args: CheckArgs) -> Result<(), u8> {
    let kind = match args.source.as_str() {
        "params" => ValidationKind::Params,
        "query" => ValidationKind::Query,
        "payload" => ValidationKind::Payload,
        "headers" => ValidationKind::Headers,
        other => {
            report_error(args.json_output, &format!("unknown source \"{}\"", other));
            return Err(2);
        }
    };

    let mut schema = load_schema(&args.schema).map_err(|e| {
        report_error(args.json_output, &e.to_string());
        e.exit_code() as u8
    })?;
    let base_dir = args.schema.parent().unwrap_or_else(|| Path::new("."));
    dereference(&mut schema, base_dir, circular_mode(args.ignore_circular)).map_err(|e| {
        report_error(args.json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let links = document_links(&schema, &args.schema).map_err(|e| {
        report_error(args.json_output, &e.to_string());
        e.exit_code() as u8
    })?;
    let Some(link) = links.iter().find(|l| l.rel == args.rel) else {
        report_error(
            args.json_output,
            &format!("no link with rel \"{}\"", args.rel),
        );
        return Err(2);
    };

    let options = RegisterOptions::new("", HandlerBinding::Factory(&stub_handler))
        .circular_mode(circular_mode(args.ignore_circular));
    let route = assemble_route(&args.schema, &schema, link, &options).map_err(|e| {
        report_error(args.json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let hook: Option<&ValidationHook> = match kind {
        ValidationKind::Params => route.validate.params.as_ref(),
        ValidationKind::Query => route.validate.query.as_ref(),
        ValidationKind::Payload => route.validate.payload.as_ref(),
        ValidationKind::Headers => route.validate.headers.as_ref(),
    };
    let Some(hook) = hook else {
        report_error(
            args.json_output,
            &format!("link \"{}\" declares no {} validation", args.rel, args.source),
        );
        return Err(2);
    };

    let mut value = load_schema(&args.value).map_err(|e| {
        report_error(args.json_output, &format!("loading value: {}", e));
        e.exit_code() as u8
    })?;

    let mut ctx = RequestContext::new();
    if let Some(content_type) = args.content_type {
        ctx = ctx.with_content_type(content_type);
    }

    let report = hook.apply(&mut value, &ctx);
    if args.json_output {
        println!("{}", serde_json::to_string(&report).unwrap());
    } else if report.valid {
        println!("Valid");
        println!("{}", serde_json::to_string_pretty(&value).unwrap());
    } else {
        eprintln!("Validation failed:");
        for error in report.errors.as_deref().unwrap_or_default() {
            eprintln!("  {}", error);
        }
    }

    if report.valid {
        Ok(())
    } else {
        Err(1)
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!(
            "{}",
            serde_json::json!({ "valid": false, "error": msg })
        );
    } else {
        eprintln!("Error: {}", msg);
    }
}
