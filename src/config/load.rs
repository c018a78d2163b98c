use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::OnceLock;

use log::{debug, info, warn};
use regex::{Captures, Regex};

use crate::config::run_config::{OptionName, RunConfig};
use crate::error::SubmitError;
use crate::filesystem::FileSystem;

/// Read and parse a run configuration file, interpolating from the process environment
pub fn load_config(path: &Path, fs: &dyn FileSystem) -> Result<RunConfig, SubmitError> {
    if !fs.exists(path) {
        warn!("Can't find configuration file at path: {}", path.display());
        return Err(SubmitError::ConfigNotFound(path.to_path_buf()));
    }

    info!("Reading configuration file {}", path.display());
    let text = fs.read_to_string(path).map_err(|source| SubmitError::ConfigUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(&text, |name| env::var(name).ok())
}

/// Parse configuration text
///
/// Each non-blank line that doesn't start with `#` must be `NAME=value`, optionally preceded by
/// `export`. Double-quoted and bare values expand `$NAME` and `${NAME}`, looking at earlier
/// assignments first and then `lookup_env`. Single-quoted values are taken literally.
pub fn parse_config<F>(text: &str, lookup_env: F) -> Result<RunConfig, SubmitError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut variables: HashMap<String, String> = HashMap::new();
    let mut config = RunConfig::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let syntax_error = || SubmitError::ConfigSyntax { line: index + 1, text: raw.to_string() };
        let assignment = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
        let (name, raw_value) = assignment.split_once('=').ok_or_else(syntax_error)?;
        if !name_pattern().is_match(name) {
            return Err(syntax_error());
        }

        let value = match unquote(raw_value.trim()).ok_or_else(syntax_error)? {
            Value::Literal(value) => value.to_string(),
            Value::Interpolated(value) => interpolate(value, &variables, &lookup_env),
        };

        match name.parse::<OptionName>() {
            Ok(option) => config.set(option, value.clone()),
            Err(_) => debug!("Keeping helper variable {name} for interpolation"),
        }
        variables.insert(name.to_string(), value);
    }

    Ok(config)
}

enum Value<'a> {
    Literal(&'a str),
    Interpolated(&'a str),
}

/// Strip quoting and trailing comments, `None` if a quote is unterminated or followed by text
fn unquote(value: &str) -> Option<Value<'_>> {
    if let Some(quote) = value.chars().next().filter(|c| *c == '\'' || *c == '"') {
        let rest = &value[1..];
        let end = rest.find(quote)?;
        let tail = rest[end + 1..].trim_start();
        if !tail.is_empty() && !tail.starts_with('#') {
            return None;
        }
        let inner = &rest[..end];
        return Some(match quote {
            '\'' => Value::Literal(inner),
            _ => Value::Interpolated(inner),
        });
    }

    // bare values end at a `#` preceded by whitespace
    let bare = value
        .char_indices()
        .find(|&(i, c)| c == '#' && value[..i].ends_with(char::is_whitespace))
        .map(|(i, _)| value[..i].trim_end())
        .unwrap_or(value);
    Some(Value::Interpolated(bare))
}

fn interpolate<F>(value: &str, variables: &HashMap<String, String>, lookup_env: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    reference_pattern()
        .replace_all(value, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match variables.get(name).cloned().or_else(|| lookup_env(name)) {
                Some(found) => found,
                None => {
                    warn!("Variable {name} is not defined, substituting an empty string");
                    String::new()
                }
            }
        })
        .into_owned()
}

fn name_pattern() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid name regex"))
}

fn reference_pattern() -> &'static Regex {
    static REFERENCE: OnceLock<Regex> = OnceLock::new();
    REFERENCE.get_or_init(|| {
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("valid reference regex")
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::filesystem::LocalFs;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parses_assignments_comments_and_blank_lines() {
        let text = "\
# ED2 run on the normal queue

BINARY=./run
export NAMELIST=./in/ED2IN
NPROCESS=4   # one node
WALLTIME=\"01:00:00\"
";
        let config = parse_config(text, no_env).expect("parsed");
        assert_eq!(config.get(OptionName::Binary), Some("./run"));
        assert_eq!(config.get(OptionName::Namelist), Some("./in/ED2IN"));
        assert_eq!(config.get(OptionName::Nprocess), Some("4"));
        assert_eq!(config.get(OptionName::Walltime), Some("01:00:00"));
        assert_eq!(config.get(OptionName::Queue), None);
    }

    #[test]
    fn trailing_comments_after_quotes_and_tabs() {
        let text = "WALLTIME=\"01:00:00\"   # one hour\nEMAIL='a@b.com' # me\nNPROCESS=4\t# tab\nMEMORY=8GB#not-a-comment\n";
        let config = parse_config(text, no_env).expect("parsed");
        assert_eq!(config.get(OptionName::Walltime), Some("01:00:00"));
        assert_eq!(config.get(OptionName::Email), Some("a@b.com"));
        assert_eq!(config.get(OptionName::Nprocess), Some("4"));
        assert_eq!(config.get(OptionName::Memory), Some("8GB#not-a-comment"));
    }

    #[test]
    fn quoted_values_keep_inner_hashes_and_spaces() {
        let config = parse_config("JOB_NAME=\"ed2 # run\"\n", no_env).expect("parsed");
        assert_eq!(config.get(OptionName::JobName), Some("ed2 # run"));
    }

    #[test]
    fn rejects_broken_quoting() {
        for text in ["QUEUE=\"normal\n", "QUEUE='normal' express\n"] {
            let err = parse_config(text, no_env).unwrap_err();
            assert!(matches!(err, SubmitError::ConfigSyntax { line: 1, .. }), "{text:?} gave {err:?}");
        }
    }

    #[test]
    fn interpolates_earlier_definitions_then_environment() {
        let text = "\
RUN_DIR=/scratch/abc1/ed2
BINARY=$RUN_DIR/ed_2.2-opt
NAMELIST=\"${RUN_DIR}/ED2IN\"
EMAIL=$USER@example.org
JOB_NAME='$RUN_DIR'
";
        let env = |name: &str| (name == "USER").then(|| "jdoe".to_string());
        let config = parse_config(text, env).expect("parsed");

        assert_eq!(config.get(OptionName::Binary), Some("/scratch/abc1/ed2/ed_2.2-opt"));
        assert_eq!(config.get(OptionName::Namelist), Some("/scratch/abc1/ed2/ED2IN"));
        assert_eq!(config.get(OptionName::Email), Some("jdoe@example.org"));
        assert_eq!(config.get(OptionName::JobName), Some("$RUN_DIR"));
    }

    #[test]
    fn undefined_variables_expand_to_empty() {
        let config = parse_config("QUEUE=$NOPE\nMEMORY=8GB$", no_env).expect("parsed");
        assert_eq!(config.get(OptionName::Queue), Some(""));
        assert_eq!(config.get(OptionName::Memory), Some("8GB$"));
    }

    #[test]
    fn later_assignment_wins() {
        let config = parse_config("QUEUE=express\nQUEUE=normal\n", no_env).expect("parsed");
        assert_eq!(config.get(OptionName::Queue), Some("normal"));
    }

    #[test]
    fn rejects_lines_that_are_not_assignments() {
        let err = parse_config("QUEUE=normal\nmodule load openmpi\n", no_env).unwrap_err();
        assert!(matches!(err, SubmitError::ConfigSyntax { line: 2, .. }));

        let err = parse_config("1QUEUE=normal\n", no_env).unwrap_err();
        assert!(matches!(err, SubmitError::ConfigSyntax { line: 1, .. }));
    }

    #[test]
    fn missing_file_is_config_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let local = LocalFs::rooted(temp.path());
        let err = load_config(Path::new("run.cfg"), &local).unwrap_err();
        assert!(matches!(err, SubmitError::ConfigNotFound(_)));
    }

    #[test]
    fn loads_from_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("run.cfg"), "PROJECT=abc1\n").expect("write");
        let local = LocalFs::rooted(temp.path());
        let config = load_config(Path::new("run.cfg"), &local).expect("loaded");
        assert_eq!(config.get(OptionName::Project), Some("abc1"));
    }

    #[test]
    fn directory_is_config_unreadable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let local = LocalFs::rooted(temp.path());
        let err = load_config(temp.path(), &local).unwrap_err();
        assert!(matches!(err, SubmitError::ConfigUnreadable { .. }));
    }
}
