//! The Parser (spec §4.2): consumes the Tokenizer's output and builds a
//! [`Pipeline`], or reports a parse error.

use crate::ast::{Command, Pipeline, RedirectTarget};
use crate::error::ShellError;
use crate::lexer::{self, Token};

/// Parse one raw input line into a [`Pipeline`].
///
/// Returns `Ok(None)` for a whitespace-only line (spec §4.2: "not an error;
/// the parser signals 'no command' and the executor performs no work").
pub fn parse_line(line: &str) -> Result<Option<Pipeline>, ShellError> {
    let tokens = lexer::tokenize(line).map_err(ShellError::Parse)?;
    parse_tokens(tokens)
}

fn parse_tokens(mut tokens: Vec<Token>) -> Result<Option<Pipeline>, ShellError> {
    if tokens.is_empty() {
        return Ok(None);
    }

    // A trailing `&` applies to the pipeline head and is only valid as the
    // very last token.
    let mut background = false;
    if tokens.last() == Some(&Token::Amp) {
        tokens.pop();
        background = true;
    }
    if tokens.iter().any(|t| *t == Token::Amp) {
        return Err(ShellError::Parse(
            "parse error near `&': only valid at end of line".to_string(),
        ));
    }

    let mut commands = Vec::new();
    let mut argv: Vec<String> = Vec::new();
    let mut redirections = crate::ast::Redirections::default();

    let mut iter = tokens.into_iter().peekable();
    while let Some(tok) = iter.next() {
        match tok {
            Token::Word(w) => argv.push(w),
            Token::Pipe => {
                if argv.is_empty() {
                    return Err(ShellError::Parse("parse error near `|'".to_string()));
                }
                commands.push(Command {
                    argv: std::mem::take(&mut argv),
                    redirections: std::mem::take(&mut redirections),
                });
            }
            Token::RedirIn => {
                let path = expect_word(&mut iter, "<")?;
                set_slot(&mut redirections.stdin, RedirectTarget::new(path, false))?;
            }
            Token::RedirOut => {
                let path = expect_word(&mut iter, ">")?;
                set_slot(&mut redirections.stdout, RedirectTarget::new(path, false))?;
            }
            Token::RedirOutAppend => {
                let path = expect_word(&mut iter, ">>")?;
                set_slot(&mut redirections.stdout, RedirectTarget::new(path, true))?;
            }
            Token::RedirErr => {
                let path = expect_word(&mut iter, "2>")?;
                set_slot(&mut redirections.stderr, RedirectTarget::new(path, false))?;
            }
            Token::RedirErrAppend => {
                let path = expect_word(&mut iter, "2>>")?;
                set_slot(&mut redirections.stderr, RedirectTarget::new(path, true))?;
            }
            Token::Amp => unreachable!("trailing `&' already stripped"),
        }
    }

    if argv.is_empty() {
        return Err(ShellError::Parse("empty command".to_string()));
    }
    commands.push(Command {
        argv,
        redirections,
    });

    Ok(Some(Pipeline {
        commands,
        background,
    }))
}

fn expect_word(
    iter: &mut std::iter::Peekable<std::vec::IntoIter<Token>>,
    operator: &str,
) -> Result<String, ShellError> {
    match iter.next() {
        Some(Token::Word(w)) => Ok(w),
        _ => Err(ShellError::Parse(format!(
            "parse error: expected filename after `{operator}'"
        ))),
    }
}

fn set_slot(slot: &mut Option<RedirectTarget>, target: RedirectTarget) -> Result<(), ShellError> {
    if slot.is_some() {
        return Err(ShellError::Parse(
            "parse error: redirection set more than once".to_string(),
        ));
    }
    *slot = Some(target);
    Ok(())
}
