//! nom grammar for a single protocol-definition file.
//!
//! Only the constructs the scaffolding stages consume are modelled. Options,
//! reserved ranges, extensions and option aggregates are consumed and dropped.
//! Comments are treated as whitespace.

use std::path::Path;

use ir::{Enum, Field, FieldLabel, Import, Message, Rpc, Service, ServiceDescription};
use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, is_not, tag, take_until};
use nom::character::complete::{alpha1, alphanumeric1, char, digit1, hex_digit1, multispace1, none_of};
use nom::combinator::{cut, map, map_res, opt, recognize, value};
use nom::error::{context, VerboseError, VerboseErrorKind};
use nom::multi::{many0_count, many1_count};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;

/// Grammar failure with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// 1-based source line of the offending input
    pub line: usize,
    /// What went wrong
    pub message: String,
}

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// One top-level statement
enum Item {
    Syntax(String),
    Package(String),
    Import(Import),
    FileOption(String, Option<String>),
    Message(Vec<Message>, Vec<Enum>),
    Enum(Enum),
    Service(Service),
    Skipped,
}

impl Item {
    fn apply(self, description: &mut ServiceDescription) {
        match self {
            Item::Syntax(syntax) => description.syntax = syntax,
            Item::Package(package) => description.package = package,
            Item::Import(import) => description.imports.push(import),
            Item::FileOption(name, value) => {
                if name == "go_package" {
                    description.go_package = value.unwrap_or_default();
                }
            }
            Item::Message(messages, enums) => {
                description.messages.extend(messages);
                description.enums.extend(enums);
            }
            Item::Enum(declared) => description.enums.push(declared),
            Item::Service(service) => description.services.push(service),
            Item::Skipped => {}
        }
    }
}

/// Parse one file into a description (imports are recorded, not followed).
pub fn parse_file(path: &Path, source: &str) -> Result<ServiceDescription, SyntaxIssue> {
    let mut description = ServiceDescription::new(path);
    let mut input = source;
    loop {
        let (rest, _) = blank(input).map_err(|e| issue(source, e))?;
        if rest.is_empty() {
            return Ok(description);
        }
        let (rest, item) = top_level(rest).map_err(|e| issue(source, e))?;
        item.apply(&mut description);
        input = rest;
    }
}

fn issue(source: &str, err: nom::Err<VerboseError<&str>>) -> SyntaxIssue {
    let errors = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e.errors,
        nom::Err::Incomplete(_) => Vec::new(),
    };
    let (at, kind) = match errors.first() {
        Some((at, kind)) => (*at, kind),
        None => return SyntaxIssue { line: 1, message: "unexpected end of input".to_string() },
    };

    // Leaf parsers carry a context; a bare char failure comes from `expect`
    let message = errors
        .iter()
        .find_map(|(_, kind)| match kind {
            VerboseErrorKind::Context(what) => Some(what.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| match kind {
            VerboseErrorKind::Char(c) => format!("expected '{}'", c),
            _ => "unexpected input".to_string(),
        });

    let offset = source.len().saturating_sub(at.len());
    let line = source[..offset].matches('\n').count() + 1;
    SyntaxIssue { line, message: format!("{}, found {}", message, describe_next(at.trim_start())) }
}

fn describe_next(rest: &str) -> String {
    let word: String =
        rest.chars().take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '.').collect();
    match rest.chars().next() {
        None => "end of input".to_string(),
        Some(c) if word.is_empty() => format!("'{}'", c),
        Some(_) => format!("'{}'", word),
    }
}

fn fail<'a, T>(input: &'a str, what: &'static str) -> Res<'a, T> {
    Err(nom::Err::Failure(VerboseError { errors: vec![(input, VerboseErrorKind::Context(what))] }))
}

// ============================================================================
// Lexical helpers
// ============================================================================

/// Whitespace and comments
fn blank(input: &str) -> Res<'_, ()> {
    value((), many0_count(alt((multispace1, line_comment, block_comment))))(input)
}

fn line_comment(input: &str) -> Res<'_, &str> { recognize(pair(tag("//"), opt(is_not("\n"))))(input) }

fn block_comment(input: &str) -> Res<'_, &str> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// Identifier, possibly dotted (`google.protobuf.Empty`, `.pkg.Msg`)
fn ident(input: &str) -> Res<'_, &str> {
    context(
        "expected identifier",
        preceded(
            blank,
            recognize(pair(
                alt((alpha1, tag("_"), tag("."))),
                many0_count(alt((alphanumeric1, tag("_"), tag(".")))),
            )),
        ),
    )(input)
}

fn sym<'a>(c: char) -> impl FnMut(&'a str) -> Res<'a, char> { preceded(blank, char(c)) }

/// A punctuation character that must be present
fn expect<'a>(c: char) -> impl FnMut(&'a str) -> Res<'a, char> { cut(sym(c)) }

fn string(input: &str) -> Res<'_, String> {
    context("expected string literal", preceded(blank, alt((quoted('"'), quoted('\'')))))(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> Res<'a, String> {
    let plain = if quote == '"' { "\"\\\n" } else { "'\\\n" };
    map(
        delimited(
            char(quote),
            opt(escaped_transform(
                none_of(plain),
                '\\',
                alt((
                    value('\n', char('n')),
                    value('\r', char('r')),
                    value('\t', char('t')),
                    value('\\', char('\\')),
                    value('"', char('"')),
                    value('\'', char('\'')),
                )),
            )),
            char(quote),
        ),
        |text: Option<String>| text.unwrap_or_default(),
    )
}

fn field_number(input: &str) -> Res<'_, u32> {
    context(
        "expected field number",
        preceded(
            blank,
            alt((
                map_res(preceded(alt((tag("0x"), tag("0X"))), hex_digit1), |hex: &str| {
                    u32::from_str_radix(hex, 16)
                }),
                map_res(digit1, |digits: &str| digits.parse::<u32>()),
            )),
        ),
    )(input)
}

/// Byte index that ends the construct starting at `input`.
///
/// With `block` set that is the bracket closing an already consumed opener;
/// otherwise it is the next `;` outside any brackets. Strings and comments are
/// stepped over.
fn construct_end(input: &str, block: bool) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut depth = usize::from(block);
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            b'{' | b'[' | b'(' => depth += 1,
            b'}' | b']' | b')' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
                if block && depth == 0 {
                    return Some(i);
                }
            }
            b';' if !block && depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// The rest of a bracketed region through its closing bracket
fn block_rest(input: &str) -> Res<'_, &str> {
    match construct_end(input, true) {
        Some(end) => Ok((&input[end + 1..], &input[..end])),
        None => fail(input, "unterminated block"),
    }
}

fn block(input: &str) -> Res<'_, &str> { preceded(expect('{'), block_rest)(input) }

/// Everything through the next top-level `;`
fn skip_statement(input: &str) -> Res<'_, &str> {
    match construct_end(input, false) {
        Some(end) => Ok((&input[end + 1..], &input[..end])),
        None => fail(input, "expected ';'"),
    }
}

// ============================================================================
// Statements
// ============================================================================

fn top_level(input: &str) -> Res<'_, Item> {
    if let Ok((rest, _)) = sym(';')(input) {
        return Ok((rest, Item::Skipped));
    }
    let (rest, keyword) = ident(input)?;
    match keyword {
        "syntax" | "edition" => {
            map(terminated(preceded(expect('='), cut(string)), expect(';')), Item::Syntax)(rest)
        }
        "package" => map(terminated(cut(ident), expect(';')), |p: &str| Item::Package(p.to_string()))(rest),
        "import" => import(rest),
        "option" => map(option_assignment, |(name, value)| Item::FileOption(name, value))(rest),
        "message" => {
            let (rest, name) = cut(ident)(rest)?;
            let (rest, (messages, enums)) = message_body(rest, name)?;
            Ok((rest, Item::Message(messages, enums)))
        }
        "enum" => map(pair(cut(ident), enum_body), |(name, values)| {
            Item::Enum(Enum { name: name.to_string(), values })
        })(rest),
        "service" => map(service, Item::Service)(rest),
        "extend" => map(pair(cut(ident), block), |_| Item::Skipped)(rest),
        _ => fail(input, "unexpected top-level keyword"),
    }
}

fn import(input: &str) -> Res<'_, Item> {
    let (rest, modifier) = opt(ident)(input)?;
    let public = match modifier {
        None | Some("weak") => false,
        Some("public") => true,
        Some(_) => return fail(blank(input)?.0, "expected import path"),
    };
    let (rest, path) = cut(string)(rest)?;
    let (rest, _) = expect(';')(rest)?;
    Ok((rest, Item::Import(Import { path, public })))
}

/// `name = value;` after the `option` keyword. Aggregate values yield `None`.
fn option_assignment(input: &str) -> Res<'_, (String, Option<String>)> {
    let (input, name) = cut(context(
        "malformed option name",
        preceded(blank, recognize(many1_count(alt((alphanumeric1, tag("_"), tag("."), tag("("), tag(")")))))),
    ))(input)?;
    let (input, _) = expect('=')(input)?;
    let (input, value) = opt(alt((
        string,
        map(ident, str::to_string),
        map(preceded(blank, recognize(pair(opt(char('-')), digit1))), str::to_string),
    )))(input)?;
    let (input, _) = skip_statement(input)?;
    Ok((input, (name.to_string(), value)))
}

/// Body of `message <name>`; nested declarations follow their parent with dotted names
fn message_body<'a>(input: &'a str, name: &str) -> Res<'a, (Vec<Message>, Vec<Enum>)> {
    let (mut input, _) = expect('{')(input)?;
    let mut fields = Vec::new();
    let mut nested = Vec::new();
    let mut enums = Vec::new();

    loop {
        if let Ok((rest, _)) = sym('}')(input) {
            input = rest;
            break;
        }
        if let Ok((rest, _)) = sym(';')(input) {
            input = rest;
            continue;
        }
        let (rest, word) = cut(ident)(input)?;
        input = match word {
            "message" => {
                let (rest, inner) = cut(ident)(rest)?;
                let (rest, (messages, inner_enums)) = message_body(rest, &format!("{}.{}", name, inner))?;
                nested.extend(messages);
                enums.extend(inner_enums);
                rest
            }
            "enum" => {
                let (rest, (inner, values)) = pair(cut(ident), enum_body)(rest)?;
                enums.push(Enum { name: format!("{}.{}", name, inner), values });
                rest
            }
            "option" | "reserved" | "extensions" => skip_statement(rest)?.0,
            "extend" => pair(cut(ident), block)(rest)?.0,
            "oneof" => {
                let (rest, members) = oneof(rest)?;
                fields.extend(members);
                rest
            }
            "map" => {
                let (rest, ty) = map_type(rest)?;
                let (rest, field) = field_rest(rest, ty, FieldLabel::Singular)?;
                fields.push(field);
                rest
            }
            "repeated" | "optional" | "required" => {
                let label = match word {
                    "repeated" => FieldLabel::Repeated,
                    "optional" => FieldLabel::Optional,
                    _ => FieldLabel::Singular,
                };
                let (rest, ty) = cut(ident)(rest)?;
                let (rest, field) = field_rest(rest, ty.to_string(), label)?;
                fields.push(field);
                rest
            }
            ty => {
                let (rest, field) = field_rest(rest, ty.to_string(), FieldLabel::Singular)?;
                fields.push(field);
                rest
            }
        };
    }

    let mut messages = vec![Message { name: name.to_string(), fields, imported_from: None }];
    messages.extend(nested);
    Ok((input, (messages, enums)))
}

/// `name = number [options];` once the label and type are consumed
fn field_rest(input: &str, ty: String, label: FieldLabel) -> Res<'_, Field> {
    let (input, name) = cut(ident)(input)?;
    let (input, _) = expect('=')(input)?;
    let (input, number) = cut(field_number)(input)?;
    let (input, _) = opt(preceded(sym('['), block_rest))(input)?;
    let (input, _) = expect(';')(input)?;
    Ok((input, Field { name: name.to_string(), ty, number, label }))
}

/// `<key, value>` after the `map` keyword
fn map_type(input: &str) -> Res<'_, String> {
    let (input, (_, key, _, value, _)) =
        tuple((expect('<'), cut(ident), expect(','), cut(ident), expect('>')))(input)?;
    Ok((input, format!("map<{}, {}>", key, value)))
}

fn oneof(input: &str) -> Res<'_, Vec<Field>> {
    let (mut input, _) = pair(cut(ident), expect('{'))(input)?;
    let mut fields = Vec::new();
    loop {
        if let Ok((rest, _)) = sym('}')(input) {
            return Ok((rest, fields));
        }
        if let Ok((rest, _)) = sym(';')(input) {
            input = rest;
            continue;
        }
        let (rest, word) = cut(ident)(input)?;
        input = if word == "option" {
            skip_statement(rest)?.0
        } else {
            let (rest, field) = field_rest(rest, word.to_string(), FieldLabel::Optional)?;
            fields.push(field);
            rest
        };
    }
}

fn enum_body(input: &str) -> Res<'_, Vec<String>> {
    let (mut input, _) = expect('{')(input)?;
    let mut values = Vec::new();
    loop {
        if let Ok((rest, _)) = sym('}')(input) {
            return Ok((rest, values));
        }
        if let Ok((rest, _)) = sym(';')(input) {
            input = rest;
            continue;
        }
        let (rest, word) = cut(ident)(input)?;
        let (rest, _) = skip_statement(rest)?;
        if !matches!(word, "option" | "reserved") {
            values.push(word.to_string());
        }
        input = rest;
    }
}

fn service(input: &str) -> Res<'_, Service> {
    let (input, name) = cut(ident)(input)?;
    let (mut input, _) = expect('{')(input)?;
    let mut rpcs = Vec::new();
    loop {
        if let Ok((rest, _)) = sym('}')(input) {
            return Ok((rest, Service { name: name.to_string(), rpcs }));
        }
        if let Ok((rest, _)) = sym(';')(input) {
            input = rest;
            continue;
        }
        let (rest, word) = cut(ident)(input)?;
        input = match word {
            "rpc" => {
                let (rest, rpc) = rpc(rest)?;
                rpcs.push(rpc);
                rest
            }
            "option" => skip_statement(rest)?.0,
            _ => return fail(blank(input)?.0, "unexpected statement in service"),
        };
    }
}

fn rpc(input: &str) -> Res<'_, Rpc> {
    let (input, name) = cut(ident)(input)?;
    let (input, (client_streaming, request)) = rpc_type(input)?;
    let (rest, returns) = cut(ident)(input)?;
    if returns != "returns" {
        return fail(blank(input)?.0, "expected 'returns'");
    }
    let (input, (server_streaming, response)) = rpc_type(rest)?;
    let input = match sym('{')(input) {
        Ok((rest, _)) => {
            let (rest, _) = block_rest(rest)?;
            opt(sym(';'))(rest)?.0
        }
        Err(_) => expect(';')(input)?.0,
    };
    Ok((input, Rpc { name: name.to_string(), request, response, client_streaming, server_streaming }))
}

/// `(stream? Type)`
fn rpc_type(input: &str) -> Res<'_, (bool, String)> {
    let (input, _) = expect('(')(input)?;
    let (input, first) = cut(ident)(input)?;
    let (input, streamed) = if first == "stream" { opt(ident)(input)? } else { (input, None) };
    let (input, _) = expect(')')(input)?;
    Ok((input, match streamed {
        Some(ty) => (true, ty.to_string()),
        None => (false, first.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<ServiceDescription, SyntaxIssue> {
        parse_file(Path::new("test.proto"), source)
    }

    #[test]
    fn test_comments_are_whitespace() {
        let description = parse("// header\nsyntax /* inline */ = \"proto3\";\n/* a\n}\n*/ package a.b;")
            .expect("commented source should parse");
        assert_eq!(description.syntax, "proto3");
        assert_eq!(description.package, "a.b");
    }

    #[test]
    fn test_lines_are_tracked_across_block_comments() {
        let issue = parse("/* a\nb\n*/\nmessage {").expect_err("missing name should fail");
        assert_eq!(issue.line, 4);
        assert!(issue.message.starts_with("expected identifier"), "got: {}", issue.message);
    }

    #[test]
    fn test_dotted_types_and_hex_numbers() {
        let description =
            parse("message A { google.protobuf.Timestamp at = 0x1; .pkg.B b = 2 [(x) = \"]\"]; }")
                .expect("source should parse");
        let fields = &description.messages[0].fields;
        assert_eq!(fields[0].ty, "google.protobuf.Timestamp");
        assert_eq!(fields[0].number, 1);
        assert_eq!(fields[1].ty, ".pkg.B");
    }

    #[test]
    fn test_unterminated_string() {
        let issue = parse("import \"a.proto;\n").expect_err("should fail");
        assert_eq!(issue.line, 1);
        assert!(issue.message.contains("expected string literal"), "got: {}", issue.message);
    }

    #[test]
    fn test_unexpected_character() {
        let issue = parse("message A {}\n@").expect_err("should fail");
        assert_eq!(issue.line, 2);
        assert!(issue.message.ends_with("found '@'"), "got: {}", issue.message);
    }

    #[test]
    fn test_rpc_option_block_and_aggregate_option() {
        let description = parse(
            "service S {\n  option (svc.opt) = { deadline: 3 };\n  rpc A(stream Req) returns (Resp) {\n    option (http) = { get: \"/a/{id}\" };\n  };\n}",
        )
        .expect("service should parse");
        let rpc = &description.services[0].rpcs[0];
        assert!(rpc.client_streaming && !rpc.server_streaming);
        assert_eq!(rpc.response, "Resp");
    }

    #[test]
    fn test_missing_returns() {
        let issue = parse("service S {\n  rpc A(Req) yields (Resp);\n}").expect_err("should fail");
        assert_eq!(issue.line, 2);
        assert!(issue.message.contains("expected 'returns'"), "got: {}", issue.message);
    }
}
