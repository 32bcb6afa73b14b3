//! Command line parser
//!
//! Grammar, with whitespace separating every token:
//!
//! ```text
//! line     := unit (';' unit)*
//! unit     := pipeline '&'*
//! pipeline := stage ('|' stage)*
//! stage    := word (word | '>' word | '>>' word | '<' word)*
//! ```
//!
//! There is no quoting or escaping. Input redirection is resolved once per
//! unit and always feeds the first stage, wherever the `<` was written.
//! `>` and `>>` are honored on the final stage only; on earlier stages they
//! are consumed and dropped, since those stages write into the pipe.

use log::debug;

use self::ast::{Command, CommandLine, CommandUnit, OutputMode, Stage, StageBuilder};
use crate::core::normalize::normalized_tokens;
use crate::errors::{Error, Result};

pub mod ast;

const UNIT_SEPARATOR: char = ';';
const PIPE: char = '|';
const BACKGROUND: char = '&';
const INPUT_REDIRECT: &str = "<";
const OUTPUT_REDIRECT: &str = ">";
const APPEND_REDIRECT: &str = ">>";

pub const CD_NAME: &str = "cd";
pub const QUIT_NAME: &str = "quit";
pub const PAUSE_NAME: &str = "pause";

impl CommandLine {
    /// Parses a raw line. Empty units are dropped; a syntax error anywhere
    /// rejects the whole line before anything runs.
    pub fn parse(line: &str) -> Result<CommandLine> {
        let mut units = Vec::new();
        for unit in parse_units(line) {
            if let Some(unit) = parse_unit(unit)? {
                units.push(unit);
            }
        }

        let command_line = CommandLine { units };
        debug!("parsed CommandLine: {:?}", command_line);
        Ok(command_line)
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Splits `line` on `;`, trimming each unit and dropping empty ones.
pub fn parse_units(line: &str) -> Vec<&str> {
    line.split(UNIT_SEPARATOR)
        .map(str::trim)
        .filter(|unit| !unit.is_empty())
        .collect()
}

/// Parses one unit: strips the trailing `&` run, splits the pipeline and
/// recognizes built-ins. Returns `None` if nothing is left to run.
pub fn parse_unit(unit: &str) -> Result<Option<CommandUnit>> {
    let unit = unit.trim();
    let background = unit.ends_with(BACKGROUND);
    let input = unit.trim_end_matches(BACKGROUND).trim();

    let stages = parse_pipeline(input)?;
    if stages.is_empty() {
        return Ok(None);
    }

    let pipeline = ast::Pipeline { stages };
    let builtin = if pipeline.is_single() {
        let stage = &pipeline.stages[0];
        match stage.program() {
            CD_NAME => Some(Command::Cd(stage.args().to_vec())),
            QUIT_NAME => Some(Command::Quit),
            PAUSE_NAME => Some(Command::Pause),
            _ => None,
        }
    } else {
        None
    };
    let command = builtin.unwrap_or_else(|| Command::External(pipeline));

    Ok(Some(CommandUnit {
        input: input.to_string(),
        command,
        background,
    }))
}

/// Splits a unit into pipeline stages and extracts their redirections.
///
/// # Examples
///
/// ```
/// use myshell::core::parser::{parse_pipeline, ast::OutputMode};
///
/// let stages = parse_pipeline("ls -l | wc -l >> count.txt").unwrap();
/// assert_eq!(stages.len(), 2);
/// assert_eq!(stages[0].argv, vec!["ls", "-l"]);
/// assert_eq!(stages[1].output.as_ref().unwrap().mode, OutputMode::Append);
/// ```
pub fn parse_pipeline(unit: &str) -> Result<Vec<Stage>> {
    if unit.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    for segment in unit.split(PIPE) {
        let tokens = normalized_tokens(segment);
        if tokens.is_empty() {
            return Err(Error::parse(format!("empty command near `{}`", PIPE)));
        }
        segments.push(tokens);
    }

    let input = take_input_redirect(&mut segments)?;

    let last = segments.len() - 1;
    let mut stages = Vec::with_capacity(segments.len());
    for (i, tokens) in segments.into_iter().enumerate() {
        let mut builder = parse_stage(tokens)?;
        if i != last && builder.has_output() {
            debug!("ignoring output redirection on pipeline stage {}", i);
            builder = builder.clear_output();
        }
        if builder.is_empty() {
            return Err(Error::parse("missing command before redirection"));
        }
        if i == 0 {
            if let Some(ref path) = input {
                builder = builder.input(path.as_str());
            }
        }
        stages.push(builder.build());
    }

    Ok(stages)
}

/// Removes every `< file` pair from the unit, returning the last file named.
fn take_input_redirect(segments: &mut [Vec<String>]) -> Result<Option<String>> {
    let mut input = None;
    for tokens in segments.iter_mut() {
        while let Some(pos) = tokens.iter().position(|t| t == INPUT_REDIRECT) {
            let filename = redirect_target(tokens, pos)?;
            tokens.drain(pos..pos + 2);
            input = Some(filename);
        }
    }

    Ok(input)
}

/// Scans one stage's tokens left to right for output redirections.
fn parse_stage(tokens: Vec<String>) -> Result<StageBuilder> {
    let mut builder = StageBuilder::new();
    let mut i = 0;
    while i < tokens.len() {
        let mode = match tokens[i].as_str() {
            OUTPUT_REDIRECT => Some(OutputMode::Truncate),
            APPEND_REDIRECT => Some(OutputMode::Append),
            _ => None,
        };

        if let Some(mode) = mode {
            let filename = redirect_target(&tokens, i)?;
            builder = builder.output(filename, mode);
            i += 2;
        } else {
            builder = builder.arg(tokens[i].as_str());
            i += 1;
        }
    }

    Ok(builder)
}

/// Returns the filename following the operator at `pos`.
fn redirect_target(tokens: &[String], pos: usize) -> Result<String> {
    match tokens.get(pos + 1) {
        Some(target) if !is_redirect_operator(target) => Ok(target.clone()),
        _ => Err(Error::parse(format!(
            "missing filename after `{}`",
            tokens[pos]
        ))),
    }
}

fn is_redirect_operator(token: &str) -> bool {
    token == INPUT_REDIRECT || token == OUTPUT_REDIRECT || token == APPEND_REDIRECT
}

#[cfg(test)]
mod tests {
    use super::ast::*;
    use super::*;
    use crate::errors::ErrorKind;

    fn stage(words: &[&str]) -> StageBuilder {
        words
            .iter()
            .fold(StageBuilder::new(), |builder, word| builder.arg(*word))
    }

    fn external(stages: Vec<Stage>) -> Command {
        Command::External(Pipeline { stages })
    }

    fn only_unit(line: &str) -> CommandUnit {
        let mut command_line = CommandLine::parse(line).expect("line should be valid");
        assert_eq!(command_line.units.len(), 1, "expected one unit in {:?}", line);
        command_line.units.remove(0)
    }

    fn is_parse_error(result: Result<CommandLine>) -> bool {
        match result {
            Err(e) => match *e.kind() {
                ErrorKind::Parse(_) => true,
                _ => false,
            },
            Ok(_) => false,
        }
    }

    #[test]
    fn test_empty() {
        assert!(CommandLine::parse("").unwrap().is_empty());
        assert!(CommandLine::parse("   ").unwrap().is_empty());
        assert!(CommandLine::parse(" ; ;; ").unwrap().is_empty());
        assert!(CommandLine::parse("&").unwrap().is_empty());
    }

    #[test]
    fn test_simple_command() {
        let unit = only_unit("  echo   hello world ");
        assert_eq!(unit.input, "echo   hello world");
        assert!(!unit.background);
        assert_eq!(
            unit.command,
            external(vec![stage(&["echo", "hello", "world"]).build()])
        );
    }

    #[test]
    fn test_aliases_rewrite_program() {
        let cases = [("help", "man"), ("environ", "printenv"), ("clr", "clear")];
        for &(alias, program) in &cases {
            match only_unit(alias).command {
                Command::External(pipeline) => assert_eq!(pipeline.stages[0].program(), program),
                other => panic!("unexpected command {:?}", other),
            }
        }
        assert_eq!(
            only_unit("help").command,
            external(vec![stage(&["man", "more"]).build()])
        );
    }

    #[test]
    fn test_sequencing() {
        let command_line = CommandLine::parse("echo a ; echo b").unwrap();
        assert_eq!(
            command_line.units,
            vec![
                CommandUnit {
                    input: "echo a".into(),
                    command: external(vec![stage(&["echo", "a"]).build()]),
                    background: false,
                },
                CommandUnit {
                    input: "echo b".into(),
                    command: external(vec![stage(&["echo", "b"]).build()]),
                    background: false,
                },
            ]
        );
    }

    #[test]
    fn test_background() {
        let unit = only_unit("sleep 1 &");
        assert!(unit.background);
        assert_eq!(unit.input, "sleep 1");
        assert_eq!(unit.command, external(vec![stage(&["sleep", "1"]).build()]));

        let unit = only_unit("sleep 1&&&");
        assert!(unit.background);
        assert_eq!(unit.command, external(vec![stage(&["sleep", "1"]).build()]));
    }

    #[test]
    fn test_background_is_per_unit() {
        let command_line = CommandLine::parse("sleep 1 & ; echo done").unwrap();
        assert!(command_line.units[0].background);
        assert!(!command_line.units[1].background);
    }

    #[test]
    fn test_pipeline() {
        assert_eq!(
            only_unit("printf abc | wc -c").command,
            external(vec![
                stage(&["printf", "abc"]).build(),
                stage(&["wc", "-c"]).build(),
            ])
        );
    }

    #[test]
    fn test_output_redirection() {
        assert_eq!(
            only_unit("echo hello > out.txt").command,
            external(vec![stage(&["echo", "hello"])
                .output("out.txt", OutputMode::Truncate)
                .build()])
        );
        assert_eq!(
            only_unit("echo world >> out.txt").command,
            external(vec![stage(&["echo", "world"])
                .output("out.txt", OutputMode::Append)
                .build()])
        );
    }

    #[test]
    fn test_last_output_redirection_wins() {
        assert_eq!(
            only_unit("echo x > a >> b").command,
            external(vec![stage(&["echo", "x"])
                .output("b", OutputMode::Append)
                .build()])
        );
    }

    #[test]
    fn test_output_redirection_only_on_final_stage() {
        assert_eq!(
            only_unit("ls > listing | wc -l > count").command,
            external(vec![
                stage(&["ls"]).build(),
                stage(&["wc", "-l"]).output("count", OutputMode::Truncate).build(),
            ])
        );
        assert_eq!(
            only_unit("echo a >> x | cat > y | wc -c").command,
            external(vec![
                stage(&["echo", "a"]).build(),
                stage(&["cat"]).build(),
                stage(&["wc", "-c"]).build(),
            ])
        );
    }

    #[test]
    fn test_input_redirection() {
        assert_eq!(
            only_unit("sort < in.txt").command,
            external(vec![stage(&["sort"]).input("in.txt").build()])
        );
        assert_eq!(
            only_unit("sort < in.txt > out.txt").command,
            external(vec![stage(&["sort"])
                .input("in.txt")
                .output("out.txt", OutputMode::Truncate)
                .build()])
        );
    }

    #[test]
    fn test_input_redirection_feeds_first_stage() {
        // `<` is resolved per unit, so a redirection written on a later
        // stage still applies to the first one.
        assert_eq!(
            only_unit("cat | sort < in.txt").command,
            external(vec![
                stage(&["cat"]).input("in.txt").build(),
                stage(&["sort"]).build(),
            ])
        );
    }

    #[test]
    fn test_builtins() {
        assert_eq!(only_unit("quit").command, Command::Quit);
        assert_eq!(only_unit("pause").command, Command::Pause);
        assert_eq!(only_unit("cd").command, Command::Cd(vec![]));
        assert_eq!(
            only_unit("cd /tmp").command,
            Command::Cd(vec!["/tmp".into()])
        );
        assert_eq!(
            only_unit("cd a b").command,
            Command::Cd(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_builtin_names_in_pipeline_are_external() {
        assert_eq!(
            only_unit("quit | cat").command,
            external(vec![stage(&["quit"]).build(), stage(&["cat"]).build()])
        );
    }

    #[test]
    fn test_missing_redirect_target() {
        assert!(is_parse_error(CommandLine::parse("echo >")));
        assert!(is_parse_error(CommandLine::parse("echo >>")));
        assert!(is_parse_error(CommandLine::parse("cat <")));
        assert!(is_parse_error(CommandLine::parse("echo > > out")));
        assert!(is_parse_error(CommandLine::parse("echo a ; cat < | wc")));
    }

    #[test]
    fn test_empty_stage() {
        assert!(is_parse_error(CommandLine::parse("ls |")));
        assert!(is_parse_error(CommandLine::parse("ls | | wc")));
        assert!(is_parse_error(CommandLine::parse("| wc")));
    }

    #[test]
    fn test_missing_command() {
        assert!(is_parse_error(CommandLine::parse("> out")));
        assert!(is_parse_error(CommandLine::parse("ls | < in")));
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("a;b ; c;"), vec!["a", "b", "c"]);
        assert!(parse_units(";;").is_empty());
    }
}
