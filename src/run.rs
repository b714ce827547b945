//! Top-level orchestration: logging setup, discovery, model selection,
//! command assembly, execution.

use std::io::Write;
use std::path::{Path, PathBuf};

use env_logger::Builder;
use log::LevelFilter;

use crate::cli::{self, Args};
use crate::command_builder;
use crate::config;
use crate::context_finder::{self, DiscoveryBuilder};
use crate::error::{Error, Result};
use crate::executor;
use crate::template_loader;
use crate::tokenizer::TokenCounter;

fn init_logger(verbose: bool) {
    let mut log_builder = Builder::new();
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    log_builder
        .format(|buf, r| writeln!(buf, "*** {}", r.args()))
        .filter(None, level)
        .init();
}

/// Entry point for the binary. Returns the process exit code.
pub fn run(args: Args) -> i32 {
    init_logger(args.verbose);

    if args.list_templates {
        println!("Available templates:");
        for name in template_loader::list_templates() {
            println!("  - {}", name);
        }
        return 0;
    }

    match execute(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            eprintln!("Error: {}", err);
            1
        }
    }
}

fn execute(args: &Args) -> Result<i32> {
    cli::validate_args(args)?;

    let discovery = DiscoveryBuilder::default()
        .include_glance(args.include_glance)
        .include_leyline(args.include_leyline)
        .explicit_paths(args.context_paths.clone())
        .gitignore(!args.no_gitignore)
        .include_ext(args.include_ext.clone())
        .exclude_ext(args.exclude_ext.clone())
        .build()
        .map_err(Error::Config)?;
    let context_files = context_finder::find_context_files(&discovery)?;
    info!("Found {} context paths", context_files.len());

    let model_set_name = select_model_set(args, &context_files, &discovery.root);

    let template_content = match &args.template {
        Some(name) => {
            let content = template_loader::load_template(name)?;
            match &args.inject {
                Some(inject) => {
                    Some(template_loader::inject_context(content, Path::new(inject))?)
                }
                None => Some(String::from(content)),
            }
        }
        None => None,
    };

    let (cmd, temp_file) = command_builder::build_command(
        args,
        &model_set_name,
        &context_files,
        template_content.as_deref(),
    )?;

    let code = executor::run_command(&cmd, args.dry_run)?;

    // The temp instructions file must survive until the child has run.
    drop(temp_file);

    Ok(code)
}

/// The model set to use: the user's explicit choice if any, otherwise
/// picked by estimating the context's token count against the threshold.
fn select_model_set(args: &Args, context_files: &[PathBuf], root: &Path) -> String {
    if let Some(name) = &args.model_set {
        info!("Using explicitly set model set: {}", name);
        return name.clone();
    }

    if !*config::ENABLE_TOKEN_COUNTING || args.disable_token_counting {
        return String::from(config::DEFAULT_MODEL_SET);
    }

    let counter = TokenCounter::new(
        &config::TOKEN_COUNT_PROVIDER,
        root,
        !args.no_gitignore,
        &args.include_ext,
        &args.exclude_ext,
    );
    let (total, errors) = counter.estimate_model_tokens(context_files);
    eprintln!("TOKEN_COUNT: {}", total);
    for error in errors {
        warn!("Token counting error: {}", error);
    }

    let selected = if total <= args.token_threshold {
        "all"
    } else {
        "high_context"
    };
    info!(
        "Selected model set '{}' (tokens: {}, threshold: {})",
        selected, total, args.token_threshold
    );
    eprintln!(
        "Using model set: {} (threshold: {})",
        selected, args.token_threshold
    );

    String::from(selected)
}
