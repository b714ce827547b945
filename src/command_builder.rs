//! Assembly of the final `thinktank` invocation.

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::cli::Args;
use crate::config;
use crate::error::{Error, Result};

/// Build the `thinktank` argument vector: pass-through arguments first,
/// then the instructions file, the model set, and finally the context
/// paths as trailing positionals.
///
/// When the instructions come from a template, its content is written to
/// a named temp file and the handle is returned alongside the command;
/// the caller must keep it alive until the child process has run, since
/// dropping it deletes the file.
pub fn build_command(
    args: &Args,
    model_set_name: &str,
    context_files: &[PathBuf],
    template_content: Option<&str>,
) -> Result<(Vec<String>, Option<NamedTempFile>)> {
    let mut cmd = vec![String::from("thinktank")];
    let mut temp_file = None;

    cmd.extend(args.passthrough.iter().cloned());

    if let Some(instructions) = &args.instructions {
        cmd.push(String::from("--instructions"));
        cmd.push(instructions.clone());
        info!("Using provided instructions file: {}", instructions);
    } else if let Some(content) = template_content {
        let mut file = tempfile::Builder::new()
            .prefix("thinktank-template-")
            .suffix(".md")
            .tempfile()
            .map_err(|err| {
                Error::CommandBuilder(format!("Failed to create temporary file: {}", err))
            })?;
        file.write_all(content.as_bytes()).map_err(|err| {
            Error::CommandBuilder(format!("Failed to write temporary file: {}", err))
        })?;

        let path = file.path().to_string_lossy().into_owned();
        info!("Created temporary instructions file: {}", path);
        cmd.push(String::from("--instructions"));
        cmd.push(path);
        temp_file = Some(file);
    } else {
        return Err(Error::CommandBuilder(String::from(
            "Neither instructions file nor template content provided. \
             This is likely a bug in the program.",
        )));
    }

    add_model_args(&mut cmd, model_set_name)?;

    for file in context_files {
        cmd.push(file.to_string_lossy().into_owned());
    }
    debug!("Added {} context paths", context_files.len());

    Ok((cmd, temp_file))
}

fn add_model_args(cmd: &mut Vec<String>, model_set_name: &str) -> Result<()> {
    let models = config::model_set(model_set_name).ok_or_else(|| {
        Error::CommandBuilder(format!(
            "Invalid model set: '{}'. Valid options are: {}",
            model_set_name,
            config::MODEL_SET_NAMES.join(", ")
        ))
    })?;

    for model in models {
        cmd.push(String::from("--model"));
        cmd.push(String::from(*model));
    }

    cmd.push(String::from("--synthesis-model"));
    cmd.push(String::from(config::SYNTHESIS_MODEL));

    debug!(
        "Added {} models from set '{}' and synthesis model '{}'",
        models.len(),
        model_set_name,
        config::SYNTHESIS_MODEL
    );

    Ok(())
}
