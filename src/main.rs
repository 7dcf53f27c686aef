//! Thin CLI layer: parse args, styled output, and call into modcdn-core.
//! Crash-proof: panic caught and reported; all errors return Result.

use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use modcdn_core::logging;
use modcdn_core::{Config, Environment};
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;

// ---- UI helpers (no-op when stdout isn't a TTY) ----

fn use_color() -> bool {
    std::io::stdout().is_terminal()
        && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

fn error(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

fn info(msg: &str) {
    if use_color() {
        println!("{}", msg.cyan());
    } else {
        println!("{}", msg);
    }
}

fn dim(msg: &str) {
    if use_color() {
        println!("{}", msg.dimmed());
    } else {
        println!("{}", msg);
    }
}

fn required<'a>(m: &'a ArgMatches, id: &str) -> Result<&'a str, String> {
    m.get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing argument <{}>", id))
}

fn cli() -> Command {
    Command::new("modcdn")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Bhuvan Prakash <bhuvanstark6@gmail.com>")
        .about("Resolve npm package versions to CDN URLs, global names and style sheets")
        .after_help(
            "Examples:\n  modcdn resolve react 16.14.0\n  modcdn resolve react 16.14.0 --env production --json\n  modcdn --cdn https://cdn.jsdelivr.net/npm resolve vue 2.6.14\n  modcdn list",
        )
        .arg(
            Arg::new("cdn")
                .long("cdn")
                .global(true)
                .help("CDN base URL or [name]/[version]/[path] template (or set MODCDN_URL_TEMPLATE)"),
        )
        .arg(
            Arg::new("registry")
                .long("registry")
                .global(true)
                .help("Registry JSON file replacing the built-in module table (or set MODCDN_REGISTRY)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Log resolution details to stderr (-vv for range evaluation)"),
        )
        .subcommand(
            Command::new("resolve")
                .about("Print the CDN URL for a module version")
                .arg(Arg::new("module").required(true).help("Module name or import path (e.g. react, react-dom/server)"))
                .arg(Arg::new("version").required(true).help("Exact semver version (e.g. 16.14.0)"))
                .arg(
                    Arg::new("env")
                        .long("env")
                        .value_parser(["development", "production", "dev", "prod"])
                        .help("Environment (default: development, or MODCDN_ENV / .modcdnrc)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the full descriptor as JSON"),
                ),
        )
        .subcommand(
            Command::new("url")
                .about("Build a CDN URL for a package path with the active template")
                .arg(Arg::new("name").required(true).help("Package name"))
                .arg(Arg::new("version").required(true).help("Package version"))
                .arg(Arg::new("path").required(true).help("Path inside the package (e.g. /dist/react.js)")),
        )
        .subcommand(
            Command::new("list")
                .about("List tracked modules with their global names and version ranges")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output machine-readable JSON"),
                ),
        )
}

fn run() -> Result<(), String> {
    let matches = cli().get_matches();

    let env_log = env::var(logging::ENV_LOG).ok();
    logging::init(logging::level_for(matches.get_count("verbose"), env_log.as_deref()));

    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut config: Config = modcdn_core::load_config(&cwd).with_env_overrides();
    if let Some(t) = matches.get_one::<String>("cdn") {
        config.url_template = Some(t.clone());
    }
    if let Some(r) = matches.get_one::<String>("registry") {
        config.registry = Some(PathBuf::from(r));
    }

    match matches.subcommand() {
        Some(("resolve", sub_m)) => {
            let module = required(sub_m, "module")?;
            let version = required(sub_m, "version")?;
            let mut options = config.resolve_options();
            if let Some(e) = sub_m.get_one::<String>("env") {
                options.environment = e.parse::<Environment>().map_err(|e| e.to_string())?;
            }
            let resolver = config.build_resolver().map_err(|e| e.to_string())?;
            log::debug!("Resolving {}@{} ({})", module, version, options.environment);
            let descriptor = resolver
                .resolve(module, version, &options)
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("No CDN entry for {}@{}", module, version))?;
            if sub_m.get_flag("json") {
                let json = serde_json::to_string_pretty(&descriptor).map_err(|e| e.to_string())?;
                println!("{}", json);
            } else {
                println!("{}", descriptor.url);
                if let Some(style_url) = &descriptor.style_url {
                    dim(&format!("style: {}", style_url));
                }
                if let Some(var) = &descriptor.variable_name {
                    dim(&format!("var: {}", var));
                }
            }
        }
        Some(("url", sub_m)) => {
            let name = required(sub_m, "name")?;
            let version = required(sub_m, "version")?;
            let path = required(sub_m, "path")?;
            let path = if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{}", path)
            };
            let urls = config.url_builder().map_err(|e| e.to_string())?;
            println!("{}", urls.build(name, version, &path));
        }
        Some(("list", sub_m)) => {
            let resolver = config.build_resolver().map_err(|e| e.to_string())?;
            let registry = resolver.registry();
            if sub_m.get_flag("json") {
                let modules: Vec<serde_json::Value> = registry
                    .modules()
                    .map(|m| {
                        let ranges: Vec<&str> = m.versions.iter().map(|e| e.range.as_str()).collect();
                        serde_json::json!({
                            "name": m.name,
                            "package": m.package_name(),
                            "var": m.global_variable,
                            "ranges": ranges,
                        })
                    })
                    .collect();
                let json = serde_json::to_string_pretty(&modules).map_err(|e| e.to_string())?;
                println!("{}", json);
            } else if registry.is_empty() {
                dim("No tracked modules.");
            } else {
                info(&format!("Tracked modules ({})", registry.len()));
                for m in registry.modules() {
                    let var = m.global_variable.as_deref().unwrap_or("-");
                    println!("  {} ({})", m.name, var);
                    for entry in &m.versions {
                        dim(&format!("    {}", entry.range));
                    }
                }
            }
        }
        _ => {
            if use_color() {
                println!("{}", "modcdn".bright_cyan().bold());
                dim("Resolve npm package versions to CDN URLs.");
            } else {
                println!("modcdn — Resolve npm package versions to CDN URLs");
            }
            dim("\nRun `modcdn --help` for details.");
        }
    }

    Ok(())
}

fn main() {
    if !use_color() {
        colored::control::set_override(false);
    }

    let code = match std::panic::catch_unwind(run) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            error(&e);
            1
        }
        Err(_) => {
            error("An unexpected error occurred. Please report this issue.");
            1
        }
    };
    std::process::exit(code);
}
