//! Lexer for generated HDL stubs, C headers and catalog commands using logos
//!
//! Only the handful of tokens the grammars care about are recognized. Anything
//! else in the input (operators, string literals, sized Verilog literals) lexes
//! as an error and is dropped by [`lex`].

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // Port direction keywords
    #[token("input")]
    Input,
    #[token("output")]
    Output,
    #[token("inout")]
    Inout,

    // Preprocessor directive, tolerating `#  define`
    #[regex(r"#[ \t]*define")]
    Define,

    // Delimiters
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_$]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    /// Integer literal kept as text; the base is decided by the grammar
    #[regex(r"0[xX][0-9a-fA-F_]+|0[oObB][0-9_]+|[0-9][0-9_]*", |lex| lex.slice().to_string())]
    Integer(String),

    // Comments (skip)
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    BlockComment,
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        lex(input).map(|(t, _)| t).collect()
    }

    #[test]
    fn test_port_declaration() {
        assert_eq!(
            tokens("input [11:0] control_S_AXI_AWADDR,"),
            vec![
                Token::Input,
                Token::BracketOpen,
                Token::Integer("11".to_string()),
                Token::Colon,
                Token::Integer("0".to_string()),
                Token::BracketClose,
                Token::Ident("control_S_AXI_AWADDR".to_string()),
                Token::Comma,
            ]
        );
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        assert_eq!(
            tokens("input_width inputs"),
            vec![
                Token::Ident("input_width".to_string()),
                Token::Ident("inputs".to_string())
            ]
        );
    }

    #[test]
    fn test_define_directive() {
        assert_eq!(
            tokens("#define  SW__eng__START_ADDRESS 0x00000100"),
            vec![
                Token::Define,
                Token::Ident("SW__eng__START_ADDRESS".to_string()),
                Token::Integer("0x00000100".to_string()),
            ]
        );
        assert_eq!(tokens("#  define X 1")[0], Token::Define);
    }

    #[test]
    fn test_comments_skipped() {
        assert_eq!(
            tokens("input // input [3:0] x\n/* input y; **/ output"),
            vec![Token::Input, Token::Output]
        );
    }

    #[test]
    fn test_unknown_characters_dropped() {
        // Sized literal: the tick is not a token
        assert_eq!(
            tokens("8'hFF"),
            vec![
                Token::Integer("8".to_string()),
                Token::Ident("hFF".to_string())
            ]
        );
    }
}
