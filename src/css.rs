//! nom parsers for the CSS fragments the engine inspects: lengths, embedded
//! `$theme.` references and `var()` calls.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_till, take_while1},
    character::complete::{anychar, char, digit1, multispace0, one_of},
    combinator::{all_consuming, consumed, map, map_opt, opt, recognize, value},
    error::{ErrorKind, ParseError as NomParseError},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    Finish, IResult,
};

use crate::theme::path::TOKEN_PREFIX;
use crate::theme::{Length, LengthUnit};

type Error<'a> = nom::error::Error<&'a str>;

/// Characters allowed in token names and path segments.
pub fn is_segment_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

/// Signed decimal without exponent (`12`, `-0.5`, `.75`).
fn number<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f64, E> {
    map_opt(
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit1)))),
                recognize(pair(char('.'), digit1)),
            )),
        ))),
        |text: &str| text.parse::<f64>().ok().filter(|value| value.is_finite()),
    )(input)
}

fn length_unit<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, LengthUnit, E> {
    alt((
        value(LengthUnit::Px, tag_no_case("px")),
        value(LengthUnit::Rem, tag_no_case("rem")),
        value(LengthUnit::Em, tag_no_case("em")),
        value(LengthUnit::Pt, tag_no_case("pt")),
    ))(input)
}

/// A length with a unit, or a unitless zero.
pub fn length<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Length, E> {
    let (rest, magnitude) = number(input)?;
    let (rest, unit) = opt(length_unit)(rest)?;
    match unit {
        Some(unit) => Ok((
            rest,
            Length {
                value: magnitude,
                unit,
            },
        )),
        None if magnitude == 0.0 => Ok((rest, Length::px(0.0))),
        None => Err(nom::Err::Error(E::from_error_kind(rest, ErrorKind::Verify))),
    }
}

/// Parses a whole string as one length, ignoring surrounding whitespace.
pub fn parse_length(raw: &str) -> Option<Length> {
    all_consuming(delimited(multispace0, length::<Error<'_>>, multispace0))(raw)
        .finish()
        .ok()
        .map(|(_, length)| length)
}

/// `$theme.a.b.c`, returned whole. A trailing `.` is not part of the reference.
pub fn token_reference<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(preceded(
        tag(TOKEN_PREFIX),
        separated_list1(char('.'), take_while1(is_segment_char)),
    ))(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePiece<'a> {
    Text(&'a str),
    Reference(&'a str),
}

/// Splits free CSS text such as `color: $theme.colors.primary` into plain
/// text and token references. Concatenating the pieces yields the input.
pub fn reference_pieces(text: &str) -> Vec<ReferencePiece<'_>> {
    let piece = alt((
        map(token_reference::<Error<'_>>, ReferencePiece::Reference),
        map(recognize(pair(anychar, take_till(|ch: char| ch == '$'))), ReferencePiece::Text),
    ));
    all_consuming(many0(piece))(text)
        .finish()
        .map(|(_, pieces)| pieces)
        .unwrap_or_else(|_| vec![ReferencePiece::Text(text)])
}

fn custom_property<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(tag("--"), take_while1(is_segment_char)))(input)
}

/// Text up to the next unbalanced `)`.
fn balanced<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(many0(alt((
        take_while1(|ch: char| ch != '(' && ch != ')'),
        recognize(delimited(char('('), balanced::<E>, char(')'))),
    ))))(input)
}

/// `var(--name)` or `var(--name, fallback)`.
pub fn var_function<'a, E: NomParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (&'a str, Option<&'a str>), E> {
    delimited(
        pair(tag("var("), multispace0),
        pair(
            terminated(custom_property, multispace0),
            opt(preceded(char(','), map(balanced, str::trim))),
        ),
        char(')'),
    )(input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePiece<'a> {
    Text(&'a str),
    Var {
        name: &'a str,
        fallback: Option<&'a str>,
        /// The call as written.
        raw: &'a str,
    },
}

/// Splits a CSS value into plain text and `var()` calls. Malformed calls stay text.
pub fn value_pieces(text: &str) -> Vec<ValuePiece<'_>> {
    let piece = alt((
        map(consumed(var_function::<Error<'_>>), |(raw, (name, fallback))| ValuePiece::Var {
            name,
            fallback,
            raw,
        }),
        map(recognize(pair(anychar, take_till(|ch: char| ch == 'v'))), ValuePiece::Text),
    ));
    all_consuming(many0(piece))(text)
        .finish()
        .map(|(_, pieces)| pieces)
        .unwrap_or_else(|_| vec![ValuePiece::Text(text)])
}
