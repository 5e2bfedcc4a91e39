use clap::{Arg, ArgAction, ArgMatches, Command};
use filtrate::{
    error::{Error, Result},
    CmdExit, Dispatcher, Overrides, Registry,
};
use serde_json::Value;

fn filter_args(command: Command) -> Command {
    command
        .arg(Arg::new("filter").help("Filter name").required(true))
        .arg(
            Arg::new("value")
                .help("Value to filter, as JSON. Anything that is not JSON is a string")
                .required(true)
                .allow_hyphen_values(true),
        )
        .arg(
            Arg::new("option")
                .short('o')
                .long("option")
                .help("Override a filter option, as key=json")
                .value_name("KEY=VALUE")
                .action(ArgAction::Append),
        )
}

pub fn validate_command() -> Command {
    filter_args(Command::new("validate").about("Check a value against a filter"))
}

pub fn sanitize_command() -> Command {
    filter_args(Command::new("sanitize").about("Print the sanitized form of a value"))
}

/// JSON when it parses, the raw text otherwise.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_overrides<'a, I: IntoIterator<Item = &'a str>>(raw: I) -> Result<Overrides> {
    let mut overrides = Overrides::new();
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(Error::Other(format!(
                "option {pair:?} must have the form key=value"
            )));
        };
        overrides.insert(key.trim().to_string(), parse_value(value));
    }
    Ok(overrides)
}

struct Request {
    filter: String,
    value: Value,
    overrides: Overrides,
}

fn request(matches: &ArgMatches) -> Result<Request> {
    let filter = matches
        .get_one::<String>("filter")
        .cloned()
        .unwrap_or_default();
    let value = matches
        .get_one::<String>("value")
        .map_or(Value::Null, |raw| parse_value(raw));
    let overrides = parse_overrides(
        matches
            .get_many::<String>("option")
            .into_iter()
            .flatten()
            .map(String::as_str),
    )?;
    Ok(Request {
        filter,
        value,
        overrides,
    })
}

fn as_overrides(overrides: &Overrides) -> Option<&Overrides> {
    (!overrides.is_empty()).then_some(overrides)
}

pub fn run_validate(matches: &ArgMatches, registry: &Registry) -> Result<CmdExit> {
    let request = request(matches)?;
    validate(registry, &request.filter, &request.value, &request.overrides)
}

pub fn run_sanitize(matches: &ArgMatches, registry: &Registry) -> Result<CmdExit> {
    let request = request(matches)?;
    sanitize(registry, &request.filter, &request.value, &request.overrides)
}

/// A filter rejecting the value is an expected outcome and maps to a failing
/// exit code; anything else is an error.
pub fn validate(
    registry: &Registry,
    filter: &str,
    value: &Value,
    overrides: &Overrides,
) -> Result<CmdExit> {
    let dispatcher = Dispatcher::new(registry);
    match dispatcher.validate(value, filter, as_overrides(overrides)) {
        Ok(()) => Ok(CmdExit {
            code: exitcode::OK,
            message: None,
        }),
        Err(e) if e.is_validation_failure() => Ok(CmdExit {
            code: exitcode::DATAERR,
            message: Some(e.to_string()),
        }),
        Err(e) => Err(e.into()),
    }
}

pub fn sanitize(
    registry: &Registry,
    filter: &str,
    value: &Value,
    overrides: &Overrides,
) -> Result<CmdExit> {
    let dispatcher = Dispatcher::new(registry);
    match dispatcher.sanitize(value, filter, as_overrides(overrides)) {
        Ok(sanitized) => Ok(CmdExit {
            code: exitcode::OK,
            message: Some(serde_json::to_string(&sanitized)?),
        }),
        Err(e) if e.is_validation_failure() => Ok(CmdExit {
            code: exitcode::DATAERR,
            message: Some(e.to_string()),
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn registry() -> Registry {
        Registry::with_bundled().unwrap()
    }

    #[test]
    fn values_fall_back_to_strings() {
        assert_eq!(parse_value("12"), json!(12));
        assert_eq!(parse_value("\"quoted\""), json!("quoted"));
        assert_eq!(parse_value("plain text"), json!("plain text"));
        assert_eq!(parse_value("{\"a\":1}"), json!({"a": 1}));
    }

    #[test]
    fn can_parse_overrides() {
        let overrides = parse_overrides(["min=3", "pattern=^a+$"]).unwrap();
        assert_eq!(overrides.get("min"), Some(&json!(3)));
        assert_eq!(overrides.get("pattern"), Some(&json!("^a+$")));
        assert!(parse_overrides(["nokey"]).is_err());
    }

    #[test]
    fn validation_failure_sets_exit_code() {
        let overrides = parse_overrides(["min=3"]).unwrap();
        let out = validate(&registry(), "string", &json!("ab"), &overrides).unwrap();
        assert_eq!(out.code, exitcode::DATAERR);
        assert!(out.message.is_some());

        let out = validate(&registry(), "string", &json!("abc"), &overrides).unwrap();
        assert_eq!(
            out,
            CmdExit {
                code: exitcode::OK,
                message: None
            }
        );
    }

    #[test]
    fn unknown_option_is_an_error() {
        let overrides = parse_overrides(["size=3"]).unwrap();
        let err = validate(&registry(), "string", &json!("ab"), &overrides).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown option \"size\" for filter \"string\""
        );
    }

    #[test]
    fn unknown_filter_is_an_error() {
        let err = sanitize(&registry(), "nope", &json!("ab"), &Overrides::new()).unwrap_err();
        assert!(!err.is_validation_failure());
    }

    #[test]
    fn can_sanitize() {
        let overrides = parse_overrides(["max=2"]).unwrap();
        let out = sanitize(&registry(), "string", &json!("abc"), &overrides).unwrap();
        assert_eq!(
            out,
            CmdExit {
                code: exitcode::OK,
                message: Some("\"ab\"".to_string()),
            }
        );
    }

    #[test]
    fn hyphen_values_are_accepted() {
        let matches = validate_command()
            .try_get_matches_from(["validate", "-o", "min=2", "string", "-abc"])
            .unwrap();
        let request = request(&matches).unwrap();
        assert_eq!(request.filter, "string");
        assert_eq!(request.value, json!("-abc"));
        assert_eq!(request.overrides.get("min"), Some(&json!(2)));

        let matches = sanitize_command()
            .try_get_matches_from(["sanitize", "string", "-5"])
            .unwrap();
        assert_eq!(request_value(&matches), json!(-5));
    }

    fn request_value(matches: &ArgMatches) -> Value {
        request(matches).unwrap().value
    }
}
