pub mod config;
pub mod domain;
pub mod error;
pub mod services;

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches};
use serde_json::{json, Value};
use std::path::Path;

pub use config::{BuiltRequest, Catalog, RequestDefinition, RequestTemplate, ResponseTemplate};
pub use domain::expand::{ExpandHooks, JsonWriter, NoHooks, TemplateExpander};
pub use domain::html::{HtmlNode, HtmlParser, HtmlValue};
pub use domain::parameter::{
    KeyValueParameter, ObjectParameter, ObjectRoot, Parameter, ParameterCollection,
    ShareParameter,
};
pub use domain::path::{evaluate, read_value};
pub use domain::slot::{render, PipelineOperation, PipelineRegistry, SlotRenderer};
pub use domain::value::ParameterValue;
pub use error::{Error, PathError, Result, SlotError};
pub use services::{HttpRequestService, RequestHandler};

/// Command-line interface definition
pub fn cli() -> clap::Command {
    let params = Arg::new("params")
        .short('p')
        .long("params")
        .value_name("PARAMS")
        .global(true)
        .help("Path to a JSON object whose fields become named parameters");
    let input = Arg::new("input")
        .short('i')
        .long("input")
        .value_name("INPUT")
        .help("Path to a JSON document used as the path root (stdin when omitted for query)");
    let catalog = Arg::new("catalog")
        .short('c')
        .long("catalog")
        .value_name("CATALOG")
        .required(true)
        .help("Path to a JSON or YAML file of request definitions");

    clap::Command::new("slotquery")
        .about("Evaluate path queries and slot templates, and build requests from them")
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Enable debug logging"),
        )
        .arg(params)
        .subcommand(
            clap::Command::new("query")
                .about("Evaluate a path query against a JSON document")
                .arg(Arg::new("path").required(true).help("Query such as $.items[*].id"))
                .arg(input.clone()),
        )
        .subcommand(
            clap::Command::new("render")
                .about("Render slot text against the parameters")
                .arg(Arg::new("text").required(true).help("Text containing {slots}"))
                .arg(input),
        )
        .subcommand(
            clap::Command::new("build")
                .about("Build a named request without sending it")
                .arg(Arg::new("name").required(true).help("Definition name"))
                .arg(catalog.clone()),
        )
        .subcommand(
            clap::Command::new("send")
                .about("Send a named request and print the materialized response")
                .arg(Arg::new("name").required(true).help("Definition name"))
                .arg(catalog),
        )
}

/// Run the parsed command line, printing results to stdout
pub async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let params = matches.get_one::<String>("params").map(String::as_str);

    match matches.subcommand() {
        Some(("query", sub)) => {
            let path = required(sub, "path")?;
            let root = read_json(sub.get_one::<String>("input").map(String::as_str))?;
            match evaluate(&root, path).with_context(|| format!("Failed to evaluate '{path}'"))? {
                Some(value) => print_json(&value)?,
                None => bail!("Path '{path}' matched nothing"),
            }
        }
        Some(("render", sub)) => {
            let text = required(sub, "text")?;
            let mut ctx = load_params(params)?;
            if let Some(input) = sub.get_one::<String>("input") {
                ctx.push(ObjectParameter::with_json(read_json(Some(input))?));
            }
            let rendered = render(text, &ctx).context("Failed to render text")?;
            println!("{rendered}");
        }
        Some(("build", sub)) => {
            let definition = load_definition(sub)?;
            let ctx = load_params(params)?;
            let request = definition
                .request
                .build(&ctx)
                .with_context(|| format!("Failed to build request '{}'", definition.name))?;
            print_json(&json!({
                "method": request.method,
                "url": request.url.as_str(),
                "headers": request.headers,
                "body": request.body,
            }))?;
        }
        Some(("send", sub)) => {
            let definition = load_definition(sub)?;
            let ctx = load_params(params)?;
            tracing::debug!(scope = %ctx.write_json(), "parameters loaded");
            let service = HttpRequestService::new().context("Failed to create HTTP client")?;
            match service
                .run(&definition, &ctx)
                .await
                .with_context(|| format!("Request '{}' failed", definition.name))?
            {
                Some(value) => print_json(&value)?,
                None => bail!("Definition '{}' has no url", definition.name),
            }
        }
        _ => bail!("No subcommand given"),
    }

    Ok(())
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("Missing argument '{name}'"))
}

fn read_json(path: Option<&str>) -> anyhow::Result<Value> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Could not read file '{path}'"))?,
        None => std::io::read_to_string(std::io::stdin()).context("Could not read stdin")?,
    };
    serde_json::from_str(&text).context("Invalid JSON document")
}

fn load_params(path: Option<&str>) -> anyhow::Result<ParameterCollection> {
    let mut ctx = ParameterCollection::new();
    if let Some(path) = path {
        let mut parameter = KeyValueParameter::new();
        parameter
            .extend_from_json(&read_json(Some(path))?)
            .with_context(|| format!("Parameters in '{path}' must be a JSON object"))?;
        ctx.push(parameter);
    }
    Ok(ctx)
}

fn load_definition(matches: &ArgMatches) -> anyhow::Result<RequestDefinition> {
    let name = required(matches, "name")?;
    let path = required(matches, "catalog")?;
    let catalog = Catalog::load(Path::new(path))
        .with_context(|| format!("Could not load catalog '{path}'"))?;
    catalog
        .get(name)
        .cloned()
        .with_context(|| format!("No definition named '{name}' in '{path}'"))
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let matches = cli()
            .try_get_matches_from(["slotquery", "-v", "query", "$.a", "--input", "doc.json"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "query");
        assert_eq!(sub.get_one::<String>("path").unwrap(), "$.a");
        assert_eq!(sub.get_one::<String>("input").unwrap(), "doc.json");
    }

    #[test]
    fn test_cli_requires_catalog_for_build() {
        assert!(cli().try_get_matches_from(["slotquery", "build", "search"]).is_err());
        let matches = cli()
            .try_get_matches_from(["slotquery", "build", "search", "-c", "defs.yml", "-p", "p.json"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        assert_eq!(sub.get_one::<String>("catalog").unwrap(), "defs.yml");
        assert_eq!(matches.get_one::<String>("params").unwrap(), "p.json");
    }
}
