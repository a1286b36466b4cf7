//! Command line composition for directly launched executables

use log::debug;
use std::path::Path;

/// Wrap `path` in double quotes unless it already is
pub fn quote_path(path: &str) -> String {
    if path.len() >= 2 && path.starts_with('"') && path.ends_with('"') {
        path.to_string()
    } else {
        format!("\"{path}\"")
    }
}

/// Quote one argument so the child's CRT parses it back unchanged.
///
/// Arguments without whitespace or quotes pass through untouched. Otherwise
/// backslashes preceding a quote (or the closing quote) are doubled and inner
/// quotes escaped.
pub fn quote_argument(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '\n', '\u{b}', '"']) {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                quoted.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                quoted.push('"');
                backslashes = 0;
            }
            other => {
                quoted.extend(std::iter::repeat_n('\\', backslashes));
                quoted.push(other);
                backslashes = 0;
            }
        }
    }
    quoted.extend(std::iter::repeat_n('\\', backslashes * 2));
    quoted.push('"');
    quoted
}

/// Command line for an executable target.
///
/// A non-empty profile `parameter` replaces the user's trailing arguments.
pub fn build_executable_command_line(
    application_name: &Path,
    parameter: &str,
    user_args: &[String],
) -> String {
    let mut command_line = quote_path(&application_name.to_string_lossy());

    if !parameter.is_empty() {
        debug!("🎯 Using profile parameter instead of {} user argument(s)", user_args.len());
        command_line.push(' ');
        command_line.push_str(parameter);
    } else if !user_args.is_empty() {
        let joined: Vec<String> = user_args.iter().map(|a| quote_argument(a)).collect();
        command_line.push(' ');
        command_line.push_str(&joined.join(" "));
    }

    command_line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_path() {
        assert_eq!(quote_path("C:\\Games\\game.exe"), "\"C:\\Games\\game.exe\"");
        assert_eq!(
            quote_path("\"C:\\Program Files\\game.exe\""),
            "\"C:\\Program Files\\game.exe\""
        );
    }

    #[test]
    fn test_application_name_with_space_is_quoted() {
        let line = build_executable_command_line(
            Path::new("C:\\Program Files\\Game\\game.exe"),
            "",
            &[],
        );
        assert_eq!(line, "\"C:\\Program Files\\Game\\game.exe\"");
        assert!(line.starts_with('"'));
    }

    #[test]
    fn test_parameter_overrides_user_arguments() {
        let line = build_executable_command_line(
            Path::new("C:\\game.exe"),
            "-lang ja",
            &["-lang".to_string(), "en".to_string()],
        );
        assert_eq!(line, "\"C:\\game.exe\" -lang ja");
    }

    #[test]
    fn test_user_arguments_appended() {
        let line = build_executable_command_line(
            Path::new("C:\\game.exe"),
            "",
            &["-w".to_string(), "save slot 1".to_string()],
        );
        assert_eq!(line, "\"C:\\game.exe\" -w \"save slot 1\"");
    }

    #[test]
    fn test_quote_argument_rules() {
        assert_eq!(quote_argument("plain"), "plain");
        assert_eq!(quote_argument(""), "\"\"");
        assert_eq!(quote_argument("a b"), "\"a b\"");
        assert_eq!(quote_argument("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote_argument("C:\\dir with space\\"), "\"C:\\dir with space\\\\\"");
        assert_eq!(quote_argument("C:\\no_space\\"), "C:\\no_space\\");
    }
}
