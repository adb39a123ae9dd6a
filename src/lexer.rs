//! The Tokenizer (spec §4.1): turns one raw input line into a stream of
//! typed tokens. Mirrors the teacher's quote-aware word-assembly state
//! machine, extended with the redirection and background operators this
//! shell's grammar needs.

/// The buffer-size constant a C-style fixed `char word[4096]` implies:
/// the 4096th character pushed onto an in-progress word overflows it, so
/// the usable word length is one less (spec §8 boundary test: "A word of
/// exactly 4095 chars succeeds; 4096+ fails ERROR").
const MAX_WORD_LEN: usize = 4095;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    Pipe,
    RedirIn,
    RedirOut,
    RedirOutAppend,
    RedirErr,
    RedirErrAppend,
    Amp,
}

enum State {
    /// Between tokens, or at the very start of a new one.
    Normal,
    /// Building an unquoted word.
    InWord,
    DoubleQuote,
    SingleQuote,
}

/// Tokenize one input line. Returns `Err` for an unclosed quote, an
/// over-long word, or a `~`-word when `HOME` is unset.
pub fn tokenize(line: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_len: usize = 0;
    let mut state = State::Normal;
    let mut chars = line.chars().peekable();

    macro_rules! push_char {
        ($c:expr) => {{
            if current_len >= MAX_WORD_LEN {
                return Err("word too long".to_string());
            }
            current.push($c);
            current_len += 1;
        }};
    }

    macro_rules! finish_word {
        () => {
            if !current.is_empty() {
                current_len = 0;
                tokens.push(Token::Word(expand_tilde(&std::mem::take(&mut current))?));
                state = State::Normal;
            }
        };
    }

    while let Some(&ch) = chars.peek() {
        match state {
            State::Normal | State::InWord => match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    chars.next();
                    finish_word!();
                }
                '\'' => {
                    chars.next();
                    state = State::SingleQuote;
                }
                '"' => {
                    chars.next();
                    state = State::DoubleQuote;
                }
                '|' => {
                    chars.next();
                    finish_word!();
                    tokens.push(Token::Pipe);
                }
                '&' => {
                    chars.next();
                    finish_word!();
                    tokens.push(Token::Amp);
                }
                '<' => {
                    chars.next();
                    finish_word!();
                    tokens.push(Token::RedirIn);
                }
                '>' => {
                    chars.next();
                    finish_word!();
                    if chars.peek() == Some(&'>') {
                        chars.next();
                        tokens.push(Token::RedirOutAppend);
                    } else {
                        tokens.push(Token::RedirOut);
                    }
                }
                '2' if current.is_empty() && matches!(state, State::Normal) => {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    if lookahead.peek() == Some(&'>') {
                        chars.next();
                        chars.next();
                        if chars.peek() == Some(&'>') {
                            chars.next();
                            tokens.push(Token::RedirErrAppend);
                        } else {
                            tokens.push(Token::RedirErr);
                        }
                    } else {
                        chars.next();
                        push_char!('2');
                        state = State::InWord;
                    }
                }
                _ => {
                    chars.next();
                    push_char!(ch);
                    state = State::InWord;
                }
            },
            State::DoubleQuote => {
                chars.next();
                match ch {
                    '"' => state = State::InWord,
                    '\\' => match chars.peek() {
                        Some(&'"') => {
                            chars.next();
                            push_char!('"');
                        }
                        Some(&'\\') => {
                            chars.next();
                            push_char!('\\');
                        }
                        _ => push_char!('\\'),
                    },
                    c => push_char!(c),
                }
            }
            State::SingleQuote => {
                chars.next();
                match ch {
                    '\'' => state = State::InWord,
                    c => push_char!(c),
                }
            }
        }
    }

    match state {
        State::DoubleQuote | State::SingleQuote => {
            return Err("unclosed quote".to_string());
        }
        _ => {}
    }
    finish_word!();

    Ok(tokens)
}

/// Apply the tokenizer's tilde expansion rule to one completed WORD (spec
/// §4.1). Applies regardless of whether the leading `~` came from a quoted
/// or unquoted region, matching the original source's simplified behavior
/// (see DESIGN.md).
fn expand_tilde(word: &str) -> Result<String, String> {
    if !word.starts_with('~') {
        return Ok(word.to_string());
    }
    if word.len() > 1 && !word.starts_with("~/") {
        return Ok(word.to_string());
    }

    let home = std::env::var("HOME").map_err(|_| "HOME not set".to_string())?;
    Ok(format!("{home}{}", &word[1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        tokenize(line)
            .unwrap()
            .into_iter()
            .filter_map(|t| match t {
                Token::Word(w) => Some(w),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn simple_words() {
        assert_eq!(tokenize("echo hello world").unwrap().len(), 3);
        assert_eq!(words("echo hello world"), vec!["echo", "hello", "world"]);
    }

    #[test]
    fn pipe_and_redirections() {
        let toks = tokenize("ls | grep foo > out.txt").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Word("ls".into()),
                Token::Pipe,
                Token::Word("grep".into()),
                Token::Word("foo".into()),
                Token::RedirOut,
                Token::Word("out.txt".into()),
            ]
        );
    }

    #[test]
    fn append_and_stderr_operators() {
        let toks = tokenize("a >> b 2> c 2>> d < e").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Word("a".into()),
                Token::RedirOutAppend,
                Token::Word("b".into()),
                Token::RedirErr,
                Token::Word("c".into()),
                Token::RedirErrAppend,
                Token::Word("d".into()),
                Token::RedirIn,
                Token::Word("e".into()),
            ]
        );
    }

    #[test]
    fn trailing_background() {
        let toks = tokenize("sleep 100 &").unwrap();
        assert_eq!(toks.last(), Some(&Token::Amp));
    }

    #[test]
    fn digit_two_is_literal_unless_standalone_prefix() {
        // '2' that isn't the start of a fresh token is just a word char.
        let toks = tokenize("rm2>file").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Word("rm2".into()),
                Token::RedirOut,
                Token::Word("file".into()),
            ]
        );
    }

    #[test]
    fn single_quotes_preserve_everything() {
        assert_eq!(words("echo 'a b $c 2> d'"), vec!["echo", "a b $c 2> d"]);
    }

    #[test]
    fn double_quotes_interpret_escapes_only() {
        assert_eq!(words(r#"echo "a\"b\\c""#), vec!["echo", "a\"b\\c"]);
    }

    #[test]
    fn mixed_quoting_in_one_word() {
        assert_eq!(words(r#"he"llo wor"ld"#), vec!["hello world"]);
    }

    #[test]
    fn unclosed_quote_is_error() {
        assert!(tokenize("echo 'unterminated").is_err());
        assert!(tokenize("echo \"unterminated").is_err());
    }

    #[test]
    fn max_word_length_boundary() {
        let ok = "a".repeat(4095);
        assert!(tokenize(&ok).is_ok());
        let too_long = "a".repeat(4096);
        assert!(tokenize(&too_long).is_err());
    }

    #[test]
    fn whitespace_only_line_has_no_tokens() {
        assert!(tokenize("   \t  ").unwrap().is_empty());
    }

    #[test]
    fn tilde_expands_to_home() {
        unsafe { std::env::set_var("HOME", "/home/tester") };
        assert_eq!(words("cd ~"), vec!["cd", "/home/tester"]);
        assert_eq!(words("cd ~/proj"), vec!["cd", "/home/tester/proj"]);
    }

    #[test]
    fn tilde_user_form_passes_through() {
        unsafe { std::env::set_var("HOME", "/home/tester") };
        assert_eq!(words("cd ~bob"), vec!["cd", "~bob"]);
    }

    #[test]
    fn tilde_without_home_is_error() {
        unsafe { std::env::remove_var("HOME") };
        assert!(tokenize("cd ~").is_err());
        unsafe { std::env::set_var("HOME", "/home/tester") };
    }
}
