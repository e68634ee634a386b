//! Tokenizer for Small BASIC source code
//!
//! Scans the program buffer on demand, one token per call, starting at the
//! current cursor. There is no token list: the cursor is the only execution
//! position, and one token of pushback is supported by remembering where the
//! last token started.

use crate::error::{Result, SmallBasicError};
use crate::program::{Program, EOF_SENTINEL};
use std::borrow::Cow;

/// Statement keywords, matched case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Print,
    Input,
    If,
    Then,
    For,
    Next,
    To,
    Goto,
    Gosub,
    Return,
    End,
    Repeat,
    Until,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("PRINT", Keyword::Print),
    ("INPUT", Keyword::Input),
    ("IF", Keyword::If),
    ("THEN", Keyword::Then),
    ("GOTO", Keyword::Goto),
    ("FOR", Keyword::For),
    ("NEXT", Keyword::Next),
    ("TO", Keyword::To),
    ("GOSUB", Keyword::Gosub),
    ("RETURN", Keyword::Return),
    ("END", Keyword::End),
    ("REPEAT", Keyword::Repeat),
    ("UNTIL", Keyword::Until),
];

impl Keyword {
    /// Look up a word in the keyword table, ignoring case
    pub fn lookup(word: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(word))
            .map(|&(_, keyword)| keyword)
    }

    /// Canonical (upper case) spelling
    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|&&(_, keyword)| keyword == self)
            .map(|&(name, _)| name)
            .unwrap_or_default()
    }
}

/// Operators and separators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    Comma,
    Semicolon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Equal,
    LeftParen,
    RightParen,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    NotEqual,
}

impl Delimiter {
    /// Single-character delimiters (the relational pair `<`/`>` is scanned separately)
    fn from_char(ch: char) -> Option<Delimiter> {
        match ch {
            ',' => Some(Delimiter::Comma),
            ';' => Some(Delimiter::Semicolon),
            '+' => Some(Delimiter::Plus),
            '-' => Some(Delimiter::Minus),
            '*' => Some(Delimiter::Star),
            '/' => Some(Delimiter::Slash),
            '%' => Some(Delimiter::Percent),
            '^' => Some(Delimiter::Caret),
            '=' => Some(Delimiter::Equal),
            '(' => Some(Delimiter::LeftParen),
            ')' => Some(Delimiter::RightParen),
            _ => None,
        }
    }

    /// Source spelling
    pub fn as_str(self) -> &'static str {
        match self {
            Delimiter::Comma => ",",
            Delimiter::Semicolon => ";",
            Delimiter::Plus => "+",
            Delimiter::Minus => "-",
            Delimiter::Star => "*",
            Delimiter::Slash => "/",
            Delimiter::Percent => "%",
            Delimiter::Caret => "^",
            Delimiter::Equal => "=",
            Delimiter::LeftParen => "(",
            Delimiter::RightParen => ")",
            Delimiter::Less => "<",
            Delimiter::Greater => ">",
            Delimiter::LessEqual => "<=",
            Delimiter::GreaterEqual => ">=",
            Delimiter::NotEqual => "<>",
        }
    }

    /// Check if this is one of the six relational operators
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            Delimiter::Less
                | Delimiter::Greater
                | Delimiter::LessEqual
                | Delimiter::GreaterEqual
                | Delimiter::Equal
                | Delimiter::NotEqual
        )
    }
}

/// A single token scanned from the program buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Operator or separator
    Delimiter(Delimiter),
    /// Variable name (only the first letter selects the slot)
    Variable(String),
    /// Numeric literal, kept as text until an expression needs its value
    Number(String),
    /// Statement keyword
    Keyword(Keyword),
    /// String literal without its quotes
    QuotedString(String),
    /// Line terminator (`\r\n`, `\n` or a lone `\r`)
    EndOfLine,
    /// End of the program buffer
    EndOfProgram,
}

impl Token {
    /// Source text of the token (quotes excluded for strings)
    pub fn lexeme(&self) -> Cow<'_, str> {
        match self {
            Token::Delimiter(delimiter) => Cow::Borrowed(delimiter.as_str()),
            Token::Variable(text) | Token::Number(text) | Token::QuotedString(text) => {
                Cow::Borrowed(text.as_str())
            }
            Token::Keyword(keyword) => Cow::Borrowed(keyword.as_str()),
            Token::EndOfLine => Cow::Borrowed("\n"),
            Token::EndOfProgram => Cow::Borrowed(""),
        }
    }

    /// Check for a specific delimiter
    pub fn is_delimiter(&self, delimiter: Delimiter) -> bool {
        matches!(self, Token::Delimiter(d) if *d == delimiter)
    }

    /// Check for a specific keyword
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == keyword)
    }

    /// End of line or end of program
    pub fn ends_line(&self) -> bool {
        matches!(self, Token::EndOfLine | Token::EndOfProgram)
    }
}

fn is_space_or_tab(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Characters that end a word or number run
fn ends_run(ch: char) -> bool {
    ch == EOF_SENTINEL || " \t\r\n,;<>+-/*%^=()".contains(ch)
}

/// On-demand scanner over a program buffer
#[derive(Debug, Clone)]
pub struct Tokenizer {
    program: Program,
    cursor: usize,
    // Start of the most recent token; taken by `push_back`, so at most one
    // token can ever be re-read.
    last_start: Option<usize>,
}

impl Tokenizer {
    /// Create a tokenizer positioned at the start of the program
    pub fn new(program: Program) -> Self {
        Self {
            program,
            cursor: 0,
            last_start: None,
        }
    }

    /// The program being scanned
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Current scan offset
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor to an absolute offset. Pushback history is discarded.
    pub fn jump(&mut self, offset: usize) {
        self.cursor = offset.min(self.program.len());
        self.last_start = None;
    }

    /// Rewind to the start of the last token so it is read again.
    ///
    /// Only the most recent token can be pushed back; a second call before the
    /// next `next_token` does nothing.
    pub fn push_back(&mut self) {
        if let Some(start) = self.last_start.take() {
            self.cursor = start;
        }
    }

    /// Advance the cursor past the next line terminator (or to the end of the program)
    pub fn skip_line(&mut self) {
        while let Some(ch) = self.program.char_at(self.cursor) {
            self.cursor += 1;
            if self.program.ends_line_at(self.cursor - 1) {
                break;
            }
        }
        self.last_start = None;
    }

    /// Scan and return the next token
    pub fn next_token(&mut self) -> Result<Token> {
        while self.program.char_at(self.cursor).map_or(false, is_space_or_tab) {
            self.cursor += 1;
        }

        let start = self.cursor;
        self.last_start = Some(start);

        let ch = match self.program.char_at(start) {
            Some(ch) => ch,
            None => return Ok(Token::EndOfProgram),
        };

        match ch {
            '\r' => {
                self.cursor += 1;
                if self.program.char_at(self.cursor) == Some('\n') {
                    self.cursor += 1;
                }
                Ok(Token::EndOfLine)
            }
            '\n' => {
                self.cursor += 1;
                Ok(Token::EndOfLine)
            }
            '<' | '>' => Ok(Token::Delimiter(self.relational(ch))),
            '"' => self.quoted_string(),
            _ => {
                if let Some(delimiter) = Delimiter::from_char(ch) {
                    self.cursor += 1;
                    Ok(Token::Delimiter(delimiter))
                } else if ch.is_alphabetic() {
                    let word = self.run();
                    Ok(match Keyword::lookup(&word) {
                        Some(keyword) => Token::Keyword(keyword),
                        None => Token::Variable(word),
                    })
                } else if ch.is_ascii_digit() {
                    Ok(Token::Number(self.run()))
                } else {
                    // Anything unrecognised ends the program
                    Ok(Token::EndOfProgram)
                }
            }
        }
    }

    fn relational(&mut self, ch: char) -> Delimiter {
        let next = self.program.char_at(self.cursor + 1);
        let (delimiter, width) = match (ch, next) {
            ('<', Some('>')) => (Delimiter::NotEqual, 2),
            ('<', Some('=')) => (Delimiter::LessEqual, 2),
            ('<', _) => (Delimiter::Less, 1),
            ('>', Some('=')) => (Delimiter::GreaterEqual, 2),
            _ => (Delimiter::Greater, 1),
        };
        self.cursor += width;
        delimiter
    }

    fn run(&mut self) -> String {
        let mut text = String::new();
        while let Some(ch) = self.program.char_at(self.cursor) {
            if ends_run(ch) {
                break;
            }
            text.push(ch);
            self.cursor += 1;
        }
        text
    }

    fn quoted_string(&mut self) -> Result<Token> {
        self.cursor += 1;
        let mut text = String::new();
        loop {
            match self.program.char_at(self.cursor) {
                Some('"') => {
                    self.cursor += 1;
                    return Ok(Token::QuotedString(text));
                }
                None | Some('\r') | Some('\n') => return Err(SmallBasicError::MissingQuote),
                Some(ch) => {
                    text.push(ch);
                    self.cursor += 1;
                }
            }
        }
    }
}

/// Tokenize a whole source text, stopping before the end-of-program token
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokenizer = Tokenizer::new(Program::new(source));
    let mut tokens = Vec::new();
    loop {
        match tokenizer.next_token()? {
            Token::EndOfProgram => return Ok(tokens),
            token => tokens.push(token),
        }
    }
}

/// Convert tokens back to source text
///
/// Tokens on a line are separated by one space, so the result tokenizes back
/// to the same token stream.
pub fn detokenize(tokens: &[Token]) -> String {
    let mut source = String::new();
    let mut line_start = true;
    for token in tokens {
        match token {
            Token::EndOfLine => {
                source.push('\n');
                line_start = true;
                continue;
            }
            Token::EndOfProgram => break,
            _ => {}
        }
        if !line_start {
            source.push(' ');
        }
        line_start = false;
        if let Token::QuotedString(text) = token {
            source.push('"');
            source.push_str(text);
            source.push('"');
        } else {
            source.push_str(&token.lexeme());
        }
    }
    source
}
