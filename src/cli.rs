//! Command-line arguments and validation.

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{App, Arg, ArgMatches};

use crate::config;
use crate::error::{Error, Result};
use crate::template_loader;

/// Parsed command-line arguments.
#[derive(Clone, Debug)]
pub struct Args {
    pub template: Option<String>,
    pub list_templates: bool,
    pub instructions: Option<String>,
    pub inject: Option<String>,
    pub model_set: Option<String>,
    pub include_glance: bool,
    pub include_leyline: bool,
    pub no_gitignore: bool,
    pub include_ext: Vec<String>,
    pub exclude_ext: Vec<String>,
    pub dry_run: bool,
    pub token_threshold: usize,
    pub disable_token_counting: bool,
    pub verbose: bool,
    pub context_paths: Vec<PathBuf>,
    pub passthrough: Vec<String>,
}

fn app() -> App<'static, 'static> {
    App::new("thinktank-wrapper")
        .version(crate_version!())
        .about("A wrapper for the thinktank tool that manages prompt templates")
        .after_help(
            "Arguments after -- are passed directly to the thinktank command. \
             Any paths provided are included with automatically found context files.",
        )
        .arg(
            Arg::with_name("template")
                .long("template")
                .takes_value(true)
                .value_name("template-name")
                .help("Name of the prompt template to use (without .md extension)"),
        )
        .arg(
            Arg::with_name("list-templates")
                .long("list-templates")
                .help("List available embedded templates and exit"),
        )
        .arg(
            Arg::with_name("instructions")
                .long("instructions")
                .takes_value(true)
                .value_name("file-path")
                .help("Explicitly provide an instructions file path (overrides --template)"),
        )
        .arg(
            Arg::with_name("inject")
                .long("inject")
                .takes_value(true)
                .value_name("file-path")
                .help("File whose content is injected into the template's CONTEXT section"),
        )
        .arg(
            Arg::with_name("model-set")
                .long("model-set")
                .takes_value(true)
                .value_name("set-name")
                .possible_values(config::MODEL_SET_NAMES)
                .help("Select model set explicitly instead of by token count"),
        )
        .arg(
            Arg::with_name("include-glance")
                .long("include-glance")
                .help("Include glance.md files automatically"),
        )
        .arg(
            Arg::with_name("include-leyline")
                .long("include-leyline")
                .help(
                    "Include leyline documents from docs/leyline/; falls back to \
                     DEVELOPMENT_PHILOSOPHY*.md files in docs/",
                ),
        )
        .arg(
            Arg::with_name("no-gitignore")
                .long("no-gitignore")
                .help("Disable gitignore filtering when finding context files"),
        )
        .arg(
            Arg::with_name("include-ext")
                .long("include-ext")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .value_name("ext")
                .conflicts_with("exclude-ext")
                .help("Only process files with these extensions (repeatable)"),
        )
        .arg(
            Arg::with_name("exclude-ext")
                .long("exclude-ext")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .value_name("ext")
                .help("Skip files with these extensions (repeatable)"),
        )
        .arg(
            Arg::with_name("dry-run")
                .long("dry-run")
                .help("Print the final thinktank command instead of executing it"),
        )
        .arg(
            Arg::with_name("token-threshold")
                .long("token-threshold")
                .takes_value(true)
                .value_name("tokens")
                .help("Token count above which the high_context model set is selected"),
        )
        .arg(
            Arg::with_name("disable-token-counting")
                .long("disable-token-counting")
                .help("Disable automatic token counting and model selection"),
        )
        .arg(
            Arg::with_name("verbose")
                .long("verbose")
                .short("v")
                .help("Enable verbose logging, including details about skipped files"),
        )
        .arg(
            Arg::with_name("context-paths")
                .multiple(true)
                .value_name("path")
                .help("Explicit file/directory paths to include as context"),
        )
        .arg(
            Arg::with_name("passthrough")
                .last(true)
                .multiple(true)
                .value_name("thinktank-args")
                .help("Arguments passed through to thinktank unchanged"),
        )
}

fn args_from(matches: &ArgMatches) -> Args {
    let strings = |name: &str| -> Vec<String> {
        matches
            .values_of(name)
            .map(|values| values.map(str::to_string).collect())
            .unwrap_or_default()
    };

    let token_threshold = if matches.is_present("token-threshold") {
        value_t!(matches.value_of("token-threshold"), usize).unwrap_or_else(|e| e.exit())
    } else {
        *config::LLM_CONTEXT_THRESHOLD
    };

    Args {
        template: matches.value_of("template").map(str::to_string),
        list_templates: matches.is_present("list-templates"),
        instructions: matches.value_of("instructions").map(str::to_string),
        inject: matches.value_of("inject").map(str::to_string),
        model_set: matches.value_of("model-set").map(str::to_string),
        include_glance: matches.is_present("include-glance"),
        include_leyline: matches.is_present("include-leyline"),
        no_gitignore: matches.is_present("no-gitignore"),
        include_ext: strings("include-ext"),
        exclude_ext: strings("exclude-ext"),
        dry_run: matches.is_present("dry-run"),
        token_threshold,
        disable_token_counting: matches.is_present("disable-token-counting"),
        verbose: matches.is_present("verbose"),
        context_paths: matches
            .values_of("context-paths")
            .map(|values| values.map(PathBuf::from).collect())
            .unwrap_or_default(),
        passthrough: strings("passthrough"),
    }
}

pub fn get_args() -> Args {
    args_from(&app().get_matches())
}

/// Cross-argument checks clap cannot express.
pub fn validate_args(args: &Args) -> Result<()> {
    if args.list_templates {
        return Ok(());
    }

    if args.template.is_none() && args.instructions.is_none() {
        return Err(Error::Config(String::from(
            "Either --template or --instructions must be provided. \
             Use --list-templates to see available templates.",
        )));
    }

    if let Some(template) = &args.template {
        template_loader::load_template(template)?;
    }

    if let Some(inject) = &args.inject {
        if args.template.is_none() {
            return Err(Error::Config(String::from(
                "--inject can only be used with --template, not with --instructions.",
            )));
        }

        let path = Path::new(inject);
        if !path.is_file() {
            return Err(Error::Config(format!("Inject file not found: {}", inject)));
        }
        File::open(path).map_err(|err| {
            Error::Config(format!("Cannot read inject file {}: {}", inject, err))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["thinktank-wrapper"];
        full.extend_from_slice(argv);
        args_from(&app().get_matches_from_safe(full).unwrap())
    }

    #[test]
    fn test_parse_defaults() {
        let args = parse(&["--template", "plan"]);
        assert_eq!(args.template.as_deref(), Some("plan"));
        assert!(args.model_set.is_none());
        assert!(!args.dry_run);
        assert!(!args.no_gitignore);
        assert!(args.context_paths.is_empty());
        assert!(args.passthrough.is_empty());
        assert_eq!(args.token_threshold, *config::LLM_CONTEXT_THRESHOLD);
    }

    #[test]
    fn test_parse_context_paths_and_passthrough() {
        let args = parse(&[
            "--template",
            "plan",
            "src",
            "README.md",
            "--",
            "--timeout",
            "60",
        ]);
        assert_eq!(
            args.context_paths,
            vec![PathBuf::from("src"), PathBuf::from("README.md")]
        );
        assert_eq!(args.passthrough, vec!["--timeout", "60"]);
    }

    #[test]
    fn test_parse_repeatable_extension_filters() {
        let args = parse(&[
            "--template",
            "plan",
            "--include-ext",
            ".py",
            "--include-ext",
            ".rs",
        ]);
        assert_eq!(args.include_ext, vec![".py", ".rs"]);
    }

    #[test]
    fn test_extension_filters_conflict() {
        let result = app().get_matches_from_safe(vec![
            "thinktank-wrapper",
            "--include-ext",
            ".py",
            "--exclude-ext",
            ".log",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_model_set_rejects_unknown_names() {
        let result = app().get_matches_from_safe(vec![
            "thinktank-wrapper",
            "--model-set",
            "bogus",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_requires_template_or_instructions() {
        let args = parse(&[]);
        let err = validate_args(&args).unwrap_err();
        assert!(err.to_string().contains("--template or --instructions"));
    }

    #[test]
    fn test_validate_accepts_instructions_alone() {
        let args = parse(&["--instructions", "notes.md"]);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_template() {
        let args = parse(&["--template", "nonsense"]);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_inject_needs_template_and_file() {
        let dir = TempDir::new().unwrap();
        let inject = dir.path().join("context.md");
        fs::write(&inject, "body").unwrap();
        let inject = inject.to_string_lossy().into_owned();

        let args = parse(&["--instructions", "notes.md", "--inject", &inject]);
        assert!(validate_args(&args).is_err());

        let args = parse(&["--template", "plan", "--inject", &inject]);
        assert!(validate_args(&args).is_ok());

        let args = parse(&["--template", "plan", "--inject", "/nonexistent.md"]);
        assert!(validate_args(&args).is_err());
    }
}
