//! Parser implementation using chumsky
//!
//! Stubs and headers are scanned rather than parsed in full: every position
//! either starts one of the recognized declarations or the token is skipped.
//! Catalog commands are parsed strictly.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Net and variable qualifiers allowed between a port direction and its range
const PORT_QUALIFIERS: &[&str] = &["wire", "reg", "logic", "signed", "unsigned", "var", "tri"];

/// Collect every port declaration in HDL source
pub fn parse_ports(input: &str) -> Result<Vec<PortDecl>, Vec<crate::ParseError>> {
    let len = input.len();

    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    port_scan_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Collect every `#define NAME <integer>` directive in C header source
pub fn parse_defines(input: &str) -> Result<Vec<Define>, Vec<crate::ParseError>> {
    let len = input.len();

    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    define_scan_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Parse a single catalog substitution command such as `input_width(index)`
pub fn parse_command(input: &str) -> Result<Command, Vec<crate::ParseError>> {
    let len = input.len();

    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter)
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    command_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Find the input declaration of `bus` in stub source
///
/// The first input declaring the name decides the result.
pub fn find_addr_bus(input: &str, bus: &str) -> Result<AddrBus, Vec<crate::ParseError>> {
    let ports = parse_ports(input)?;
    let found = ports
        .iter()
        .find(|p| p.direction == PortDirection::Input && p.declares(bus));

    Ok(match found {
        Some(PortDecl {
            range: Some(PortRange::Bits(range)),
            ..
        }) => AddrBus::Ranged(*range),
        Some(PortDecl {
            range: Some(PortRange::Symbolic(span)),
            ..
        }) => AddrBus::Symbolic(span.clone()),
        Some(_) => AddrBus::SingleBit,
        None => AddrBus::Absent,
    })
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn integer_parser<'a, I>() -> impl Parser<'a, I, u64, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    select! {
        Token::Integer(s) => s,
    }
    .try_map(|s, span| parse_int_literal(&s).map_err(|e| Rich::custom(span, e.to_string())))
    .labelled("integer")
}

fn port_scan_parser<'a, I>() -> impl Parser<'a, I, Vec<PortDecl>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let direction = select! {
        Token::Input => PortDirection::Input,
        Token::Output => PortDirection::Output,
        Token::Inout => PortDirection::Inout,
    };

    let qualifier = select! {
        Token::Ident(s) if PORT_QUALIFIERS.contains(&s.as_str()) => (),
    };

    let identifier = select! {
        Token::Ident(s) => s,
    };

    let literal_range = integer_parser()
        .then_ignore(just(Token::Colon))
        .then(integer_parser())
        .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
        .map(|(msb, lsb)| PortRange::Bits(BitRange { msb, lsb }));

    // Parameter expressions are kept by span only
    let symbolic_range = any()
        .filter(|tok: &Token| !matches!(tok, Token::BracketOpen | Token::BracketClose))
        .repeated()
        .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
        .map_with(|_, e| PortRange::Symbolic(span_range(&e.span())));

    let range = literal_range.or(symbolic_range);

    let declaration = direction
        .then_ignore(qualifier.repeated())
        .then(range.or_not())
        .then(
            identifier
                .separated_by(just(Token::Comma))
                .allow_trailing()
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .map_with(|((direction, range), names), e| PortDecl {
            direction,
            range,
            names,
            span: span_range(&e.span()),
        });

    choice((declaration.map(Some), any().to(None)))
        .repeated()
        .collect::<Vec<_>>()
        .map(|decls| decls.into_iter().flatten().collect())
}

fn define_scan_parser<'a, I>() -> impl Parser<'a, I, Vec<Define>, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let identifier = select! {
        Token::Ident(s) => s,
    };

    let define = just(Token::Define)
        .ignore_then(identifier)
        .then(integer_parser())
        .map_with(|(name, value), e| Define {
            name,
            value,
            span: span_range(&e.span()),
        });

    choice((define.map(Some), any().to(None)))
        .repeated()
        .collect::<Vec<_>>()
        .map(|defines| defines.into_iter().flatten().collect())
}

fn command_parser<'a, I>() -> impl Parser<'a, I, Command, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    // Field names may collide with port keywords
    let field = select! {
        Token::Ident(s) => s,
        Token::Input => "input".to_string(),
        Token::Output => "output".to_string(),
        Token::Inout => "inout".to_string(),
    }
    .labelled("field name");

    let field_width = select! {
        Token::Ident(s) if s == "input_width" => FieldDirection::Input,
        Token::Ident(s) if s == "output_width" => FieldDirection::Output,
    }
    .then(field.delimited_by(just(Token::ParenOpen), just(Token::ParenClose)))
    .map(|(direction, field)| Command::FieldWidth { direction, field });

    let literal = select! {
        Token::Ident(s) => s,
    }
    .try_map(|keyword, span| {
        LiteralKind::from_keyword(&keyword)
            .map(Command::Literal)
            .ok_or_else(|| {
                Rich::custom(
                    span,
                    format!("unknown substitution command '{}'", keyword),
                )
            })
    });

    choice((field_width, literal))
}
