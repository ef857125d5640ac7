//! Lexer for `OpenQASM` 3.
//!
//! Single-pass, table-driven via `logos`. The lexer only classifies spans:
//! ambiguous prefixes (`=` vs `==`, `<<` vs `<<=`) resolve by maximal munch,
//! numeric callbacks decode values but never reinterpret them, and a
//! `#pragma` line is captured whole so the parser can re-lex its body up to
//! the terminating newline. Unrecognized bytes surface as an error carrying
//! the byte offset.

use logos::Logos;

fn parse_radix(slice: &str, radix: u32) -> Option<u64> {
    let digits: String = slice[2..].chars().filter(|c| *c != '_').collect();
    u64::from_str_radix(&digits, radix).ok()
}

/// Tokens for `OpenQASM` 3.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qubit")]
    Qubit,

    #[token("bit")]
    Bit,

    #[token("int")]
    Int,

    #[token("uint")]
    Uint,

    #[token("float")]
    Float,

    #[token("angle")]
    Angle,

    #[token("complex")]
    Complex,

    #[token("bool")]
    Bool,

    #[token("array")]
    Array,

    #[token("const")]
    Const,

    #[token("input")]
    Input,

    #[token("output")]
    Output,

    #[token("mutable")]
    Mutable,

    #[token("readonly")]
    Readonly,

    #[token("gate")]
    Gate,

    #[token("def")]
    Def,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("for")]
    For,

    #[token("while")]
    While,

    #[token("in")]
    In,

    #[token("switch")]
    Switch,

    #[token("case")]
    Case,

    #[token("default")]
    Default,

    #[token("break")]
    Break,

    #[token("continue")]
    Continue,

    #[token("return")]
    Return,

    #[token("box")]
    Box,

    #[token("end")]
    End,

    #[token("measure")]
    Measure,

    #[token("gphase")]
    GPhase,

    // Gate modifiers
    #[token("ctrl")]
    Ctrl,

    #[token("negctrl")]
    NegCtrl,

    #[token("inv")]
    Inv,

    #[token("pow")]
    Pow,

    // Recognized but rejected by the parser
    #[token("reset")]
    Reset,

    #[token("delay")]
    Delay,

    #[token("barrier")]
    Barrier,

    #[token("cal")]
    Cal,

    #[token("defcal")]
    DefCal,

    #[token("duration")]
    Duration,

    #[token("durationof")]
    DurationOf,

    #[token("stretch")]
    Stretch,

    #[token("extern")]
    Extern,

    // Irrational constants (single lexemes)
    #[token("pi")]
    #[token("π")]
    Pi,

    #[token("tau")]
    #[token("τ")]
    Tau,

    #[token("euler")]
    #[token("ℯ")]
    #[token("ℇ")]
    Euler,

    #[token("true")]
    True,

    #[token("false")]
    False,

    // Directives
    #[regex(r"#pragma[^\n]*", |lex| lex.slice().to_string())]
    Pragma(String),

    #[token("#dim")]
    Dim,

    // Literals. The imaginary form wins over a plain number by maximal
    // munch; multi-base forms win over a leading decimal zero.
    #[regex(r"([0-9]+\.[0-9]*|\.[0-9]+|[0-9]+)([eE][+-]?[0-9]+)?im", |lex| {
        let s = lex.slice();
        s[..s.len() - 2].parse::<f64>().ok()
    })]
    ImagLiteral(f64),

    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*", |lex| parse_radix(lex.slice(), 16))]
    HexLiteral(u64),

    #[regex(r"0o[0-7][0-7_]*", |lex| parse_radix(lex.slice(), 8))]
    OctalLiteral(u64),

    #[regex(r"0[bB][01][01_]*", |lex| parse_radix(lex.slice(), 2))]
    BinaryLiteral(u64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLiteral(i64),

    #[regex(r#""[01]+""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len() - 1].to_string())
    }, priority = 4)]
    BitString(String),

    #[regex(r#""[^"\n]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len() - 1].to_string())
    }, priority = 3)]
    StringLiteral(String),

    #[regex(r"\$[0-9]+", |lex| lex.slice()[1..].parse::<u32>().ok())]
    HardwareQubit(u32),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("**")]
    DoubleStar,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("!")]
    Not,

    #[token("~")]
    Tilde,

    #[token("&")]
    Amp,

    #[token("|")]
    Pipe,

    #[token("^")]
    Caret,

    #[token("<<")]
    Shl,

    #[token(">>")]
    Shr,

    #[token("=")]
    Eq,

    #[token("+=")]
    PlusEq,

    #[token("-=")]
    MinusEq,

    #[token("*=")]
    StarEq,

    #[token("/=")]
    SlashEq,

    #[token("&=")]
    AmpEq,

    #[token("|=")]
    PipeEq,

    #[token("^=")]
    CaretEq,

    #[token("<<=")]
    ShlEq,

    #[token(">>=")]
    ShrEq,

    #[token("->")]
    Arrow,

    #[token("@")]
    At,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,
}

impl Token {
    /// True for the reserved keywords the parser rejects outright.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            Token::Reset
                | Token::Delay
                | Token::Barrier
                | Token::Cal
                | Token::DefCal
                | Token::Duration
                | Token::DurationOf
                | Token::Stretch
                | Token::Extern
        )
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Token::OpenQasm => "OPENQASM",
            Token::Include => "include",
            Token::Qubit => "qubit",
            Token::Bit => "bit",
            Token::Int => "int",
            Token::Uint => "uint",
            Token::Float => "float",
            Token::Angle => "angle",
            Token::Complex => "complex",
            Token::Bool => "bool",
            Token::Array => "array",
            Token::Const => "const",
            Token::Input => "input",
            Token::Output => "output",
            Token::Mutable => "mutable",
            Token::Readonly => "readonly",
            Token::Gate => "gate",
            Token::Def => "def",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::While => "while",
            Token::In => "in",
            Token::Switch => "switch",
            Token::Case => "case",
            Token::Default => "default",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Return => "return",
            Token::Box => "box",
            Token::End => "end",
            Token::Measure => "measure",
            Token::GPhase => "gphase",
            Token::Ctrl => "ctrl",
            Token::NegCtrl => "negctrl",
            Token::Inv => "inv",
            Token::Pow => "pow",
            Token::Reset => "reset",
            Token::Delay => "delay",
            Token::Barrier => "barrier",
            Token::Cal => "cal",
            Token::DefCal => "defcal",
            Token::Duration => "duration",
            Token::DurationOf => "durationof",
            Token::Stretch => "stretch",
            Token::Extern => "extern",
            Token::Pi => "pi",
            Token::Tau => "tau",
            Token::Euler => "euler",
            Token::True => "true",
            Token::False => "false",
            Token::Dim => "#dim",
            Token::Pragma(text) => return write!(f, "{text}"),
            Token::ImagLiteral(v) => return write!(f, "{v}im"),
            Token::FloatLiteral(v) => return write!(f, "{v}"),
            Token::HexLiteral(v) => return write!(f, "{v:#x}"),
            Token::OctalLiteral(v) => return write!(f, "0o{v:o}"),
            Token::BinaryLiteral(v) => return write!(f, "{v:#b}"),
            Token::IntLiteral(v) => return write!(f, "{v}"),
            Token::BitString(s) => return write!(f, "\"{s}\""),
            Token::StringLiteral(s) => return write!(f, "\"{s}\""),
            Token::HardwareQubit(n) => return write!(f, "${n}"),
            Token::Identifier(s) => return write!(f, "{s}"),
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::DoubleStar => "**",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::Not => "!",
            Token::Tilde => "~",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::Eq => "=",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::AmpEq => "&=",
            Token::PipeEq => "|=",
            Token::CaretEq => "^=",
            Token::ShlEq => "<<=",
            Token::ShrEq => ">>=",
            Token::Arrow => "->",
            Token::At => "@",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::Semicolon => ";",
            Token::Colon => ":",
            Token::Comma => ",",
        };
        f.write_str(symbol)
    }
}

/// A token with its byte span in the source.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: std::ops::Range<usize>,
}

/// Tokenize a QASM3 source string.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, (std::ops::Range<usize>, String)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        if let Ok(token) = result {
            tokens.push(Ok(SpannedToken { token, span }));
        } else {
            let slice = &source[span.clone()];
            tokens.push(Err((span, format!("Invalid token: '{slice}'"))));
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .into_iter()
            .map(|r| r.expect("valid token").token)
            .collect()
    }

    #[test]
    fn test_version_header() {
        let tokens = ok_tokens("OPENQASM 3.0;");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::OpenQasm);
        assert!(matches!(tokens[1], Token::FloatLiteral(v) if (v - 3.0).abs() < 1e-12));
        assert_eq!(tokens[2], Token::Semicolon);
    }

    #[test]
    fn test_multi_base_literals() {
        let tokens = ok_tokens("0x1F 0o17 0b1010 42 .5 1e3");
        assert_eq!(tokens[0], Token::HexLiteral(31));
        assert_eq!(tokens[1], Token::OctalLiteral(15));
        assert_eq!(tokens[2], Token::BinaryLiteral(10));
        assert_eq!(tokens[3], Token::IntLiteral(42));
        assert!(matches!(tokens[4], Token::FloatLiteral(v) if (v - 0.5).abs() < 1e-12));
        assert!(matches!(tokens[5], Token::FloatLiteral(v) if (v - 1000.0).abs() < 1e-9));
    }

    #[test]
    fn test_imaginary_literal() {
        let tokens = ok_tokens("0.70710678im 2im");
        assert!(matches!(tokens[0], Token::ImagLiteral(v) if (v - 0.70710678).abs() < 1e-12));
        assert!(matches!(tokens[1], Token::ImagLiteral(v) if (v - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_irrationals() {
        let tokens = ok_tokens("pi π tau τ euler ℯ");
        assert_eq!(
            tokens,
            vec![
                Token::Pi,
                Token::Pi,
                Token::Tau,
                Token::Tau,
                Token::Euler,
                Token::Euler
            ]
        );
    }

    #[test]
    fn test_bitstring_vs_string() {
        let tokens = ok_tokens(r#""0101" "hello""#);
        assert_eq!(tokens[0], Token::BitString("0101".into()));
        assert_eq!(tokens[1], Token::StringLiteral("hello".into()));
    }

    #[test]
    fn test_pragma_captures_line() {
        let source = "#pragma braket result state_vector\nqubit q;";
        let tokens = ok_tokens(source);
        assert!(
            matches!(&tokens[0], Token::Pragma(text) if text == "#pragma braket result state_vector")
        );
        assert_eq!(tokens[1], Token::Qubit);
    }

    #[test]
    fn test_compound_assignment_maximal_munch() {
        let tokens = ok_tokens("a <<= 1; b << 2; c < 3;");
        assert_eq!(tokens[1], Token::ShlEq);
        assert_eq!(tokens[5], Token::Shl);
        assert_eq!(tokens[9], Token::Lt);
    }

    #[test]
    fn test_hardware_qubit() {
        let tokens = ok_tokens("cnot $0, $3;");
        assert_eq!(tokens[1], Token::HardwareQubit(0));
        assert_eq!(tokens[3], Token::HardwareQubit(3));
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = ok_tokens("qubit q; // trailing\n/* block\n comment */ bit c;");
        assert_eq!(tokens.len(), 6);
    }

    #[test]
    fn test_unknown_byte_errors() {
        let results = tokenize("qubit ?;");
        let err = results
            .into_iter()
            .find_map(Result::err)
            .expect("lexer error");
        assert_eq!(err.0.start, 6);
    }
}
