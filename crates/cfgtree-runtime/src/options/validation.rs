//! Options validation.

use super::error::{OptionsError, OptionsResult};
use super::schema::{EngineOptions, IncludeOptions, LogOutput, LoggingConfig};
use cfgtree_core::Tree;
use cfgtree_syntax::{ParseOptions, WriteOptions};

const MAX_INDENT_WIDTH: usize = 16;

/// Checks constraints serde cannot express.
pub fn validate_options(options: &EngineOptions) -> OptionsResult<()> {
    validate_parse(&options.parse)?;
    validate_write(&options.write)?;
    validate_include(&options.include, &options.parse)?;
    validate_logging(&options.logging)?;
    Ok(())
}

fn validate_parse(parse: &ParseOptions) -> OptionsResult<()> {
    if parse.max_depth == 0 {
        return Err(OptionsError::validation("parse.max_depth must be at least 1"));
    }
    if parse.max_depth > Tree::MAX_DEPTH {
        return Err(OptionsError::validation(format!(
            "parse.max_depth must be at most {}, got {}",
            Tree::MAX_DEPTH,
            parse.max_depth
        )));
    }
    Ok(())
}

fn validate_write(write: &WriteOptions) -> OptionsResult<()> {
    if write.indent_width > MAX_INDENT_WIDTH {
        return Err(OptionsError::validation(format!(
            "write.indent_width must be at most {MAX_INDENT_WIDTH}, got {}",
            write.indent_width
        )));
    }
    Ok(())
}

fn validate_include(include: &IncludeOptions, parse: &ParseOptions) -> OptionsResult<()> {
    if include.enabled && parse.max_include_depth == 0 {
        return Err(OptionsError::validation(
            "parse.max_include_depth must be at least 1 when includes are enabled",
        ));
    }
    if let Some(dir) = &include.dir {
        if dir.as_os_str().is_empty() {
            return Err(OptionsError::validation("include.dir cannot be empty"));
        }
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> OptionsResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(OptionsError::validation(
            "logging.file_path is required when logging.output is \"file\"",
        ));
    }
    if logging.filters.keys().any(|target| target.trim().is_empty()) {
        return Err(OptionsError::validation("logging.filters keys cannot be empty"));
    }
    Ok(())
}
