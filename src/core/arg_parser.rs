// src/core/arg_parser.rs

use crate::models::FlagMap;

/// The host's own flags. They are recognized anywhere on the command line and never
/// end up in the [`FlagMap`] forwarded to an alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    /// `-D/--debug`: echo the debug log to stderr.
    pub debug: bool,
    /// `-L/--local-env`: ignore the global configuration layer.
    pub local_env: bool,
    /// `-p/--parallel`: run a group from the `parallel` section.
    pub parallel: bool,
    /// `--without-output`: do not echo the output of parallel jobs.
    pub without_output: bool,
    /// `--output-color`: recolor every line of parallel output.
    pub output_color: Option<String>,
    /// `--print`: show each final command line before running it.
    pub print: bool,
    /// `-l/--list`: list the aliases instead of running one.
    pub list: bool,
    /// `--vars` in front of the alias name: list variables instead of aliases.
    pub list_vars: bool,
    /// `--envs` in front of the alias name: list environment variables instead of aliases.
    pub list_envs: bool,
}

/// Outcome of feeding one token to [`GlobalOptions::apply_flag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagMatch {
    /// Not a global flag.
    Foreign,
    /// A global flag, fully applied.
    Applied,
    /// A global flag that still expects its value in the next token.
    NeedsValue,
}

impl GlobalOptions {
    /// Applies `token` if it is one of the global flags.
    pub fn apply_flag(&mut self, token: &str) -> FlagMatch {
        let (key, value) = split_flag(token);
        match key {
            "-D" | "--debug" => self.debug = true,
            "-L" | "--local-env" => self.local_env = true,
            "-p" | "--parallel" => self.parallel = true,
            "--without-output" => self.without_output = true,
            "--print" => self.print = true,
            "-l" | "--list" => self.list = true,
            "--output-color" => match value {
                Some(color) => self.output_color = Some(color.to_string()),
                None => return FlagMatch::NeedsValue,
            },
            _ => return FlagMatch::Foreign,
        }
        FlagMatch::Applied
    }

    /// Merges flags given in front of the alias name (parsed by clap) into `self`.
    pub fn merge(&mut self, other: &Self) {
        self.debug |= other.debug;
        self.local_env |= other.local_env;
        self.parallel |= other.parallel;
        self.without_output |= other.without_output;
        self.print |= other.print;
        self.list |= other.list;
        self.list_vars |= other.list_vars;
        self.list_envs |= other.list_envs;
        if other.output_color.is_some() {
            self.output_color.clone_from(&other.output_color);
        }
    }
}

/// A user invocation split into the alias name, positional arguments and foreign flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    /// The first positional token.
    pub name: Option<String>,
    /// Every later positional token, in order.
    pub positional: Vec<String>,
    /// Every flag that is not a global flag.
    pub flags: FlagMap,
}

impl Invocation {
    /// Classifies the tokens that follow the program name.
    ///
    /// # Logic:
    /// - A token starting with `-` (other than `-` itself) is a flag. Global flags update
    ///   `options`; any other flag goes into the [`FlagMap`], split on its first `=`.
    ///   A flag never consumes the next token as its value.
    /// - A bare `--` makes every following token positional.
    /// - The first positional token is the alias name.
    pub fn parse(tokens: &[String], options: &mut GlobalOptions) -> Self {
        let mut invocation = Self::default();
        let mut tokens_iter = tokens.iter();
        let mut only_positional = false;

        while let Some(token) = tokens_iter.next() {
            if !only_positional && token == "--" {
                only_positional = true;
                continue;
            }

            if !only_positional && token.len() > 1 && token.starts_with('-') {
                match options.apply_flag(token) {
                    FlagMatch::Applied => {}
                    FlagMatch::NeedsValue => {
                        let value = tokens_iter.next().cloned();
                        if value.is_none() {
                            log::warn!("Flag '{}' expects a value; ignoring it.", token);
                        }
                        options.output_color = value;
                    }
                    FlagMatch::Foreign => {
                        let (key, value) = split_flag(token);
                        log::trace!("Collected flag '{}' = {:?}", key, value);
                        invocation.flags.insert(key, value.unwrap_or_default());
                    }
                }
                continue;
            }

            if invocation.name.is_none() {
                invocation.name = Some(token.clone());
            } else {
                invocation.positional.push(token.clone());
            }
        }

        invocation
    }
}

/// Splits `--key=value` on the first `=`.
fn split_flag(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((key, value)) => (key, Some(value)),
        None => (token, None),
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    // --- Helper to create a Vec<String> from &str slices ---
    fn to_cli_params(params: &[&str]) -> Vec<String> {
        params.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_name_positionals_and_flags() {
        let params = to_cli_params(&["deploy", "api", "--env=prod", "-f", "now"]);
        let mut options = GlobalOptions::default();
        let invocation = Invocation::parse(&params, &mut options);

        assert_eq!(invocation.name.as_deref(), Some("deploy"));
        assert_eq!(invocation.positional, vec!["api", "now"]);
        assert_eq!(invocation.flags.get("--env"), Some("prod"));
        assert_eq!(invocation.flags.get("-f"), Some(""));
        assert_eq!(options, GlobalOptions::default());
    }

    #[test]
    fn test_value_splits_on_first_equals_only() {
        let params = to_cli_params(&["run", "--filter=a=b"]);
        let invocation = Invocation::parse(&params, &mut GlobalOptions::default());
        assert_eq!(invocation.flags.get("--filter"), Some("a=b"));
    }

    #[test]
    fn test_global_flags_are_not_forwarded() {
        let params = to_cli_params(&[
            "build",
            "--print",
            "-D",
            "--output-color=red",
            "--without-output",
            "--user=me",
        ]);
        let mut options = GlobalOptions::default();
        let invocation = Invocation::parse(&params, &mut options);

        assert!(options.print);
        assert!(options.debug);
        assert!(options.without_output);
        assert_eq!(options.output_color.as_deref(), Some("red"));
        assert_eq!(invocation.flags.len(), 1);
        assert_eq!(invocation.flags.get("--user"), Some("me"));
    }

    #[test]
    fn test_output_color_takes_next_token() {
        let params = to_cli_params(&["-p", "web", "--output-color", "cyan"]);
        let mut options = GlobalOptions::default();
        let invocation = Invocation::parse(&params, &mut options);
        assert!(options.parallel);
        assert_eq!(options.output_color.as_deref(), Some("cyan"));
        assert_eq!(invocation.name.as_deref(), Some("web"));
        assert!(invocation.positional.is_empty());
    }

    #[test]
    fn test_double_dash_makes_everything_positional() {
        let params = to_cli_params(&["grep", "--", "-v", "--print"]);
        let mut options = GlobalOptions::default();
        let invocation = Invocation::parse(&params, &mut options);
        assert_eq!(invocation.positional, vec!["-v", "--print"]);
        assert!(invocation.flags.is_empty());
        assert!(!options.print);
    }

    #[test]
    fn test_flag_does_not_consume_following_token() {
        let params = to_cli_params(&["deploy", "--env", "prod"]);
        let invocation = Invocation::parse(&params, &mut GlobalOptions::default());
        assert_eq!(invocation.flags.get("--env"), Some(""));
        assert_eq!(invocation.positional, vec!["prod"]);
    }

    #[test]
    fn test_merge_keeps_flags_from_both_sides() {
        let mut trailing = GlobalOptions {
            print: true,
            ..Default::default()
        };
        let leading = GlobalOptions {
            local_env: true,
            output_color: Some("green".to_string()),
            ..Default::default()
        };
        trailing.merge(&leading);
        assert!(trailing.print);
        assert!(trailing.local_env);
        assert_eq!(trailing.output_color.as_deref(), Some("green"));
    }
}
