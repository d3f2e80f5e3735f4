use std::borrow::Cow;

use quick_xml::escape::resolve_html5_entity;
use winnow::prelude::*;
use winnow::ascii::{alphanumeric1, digit1, hex_digit1};
use winnow::combinator::{alt, delimited, opt, preceded};
use winnow::token::{one_of, take, take_till, take_until, take_while};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Fragment<'s> {
    Text(&'s str),
    Tag { name: &'s str, closing: bool },
    Comment,
}

/// Split a draw.io rich-text label into plain-text lines.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    for fragment in fragments(text) {
        match fragment {
            Fragment::Tag {
                name,
                closing: false,
            } if is_line_break(name) => segments.push(std::mem::take(&mut current)),
            Fragment::Tag {
                name,
                closing: true,
            } if is_block(name) => current.push(' '),
            Fragment::Text(t) => current.push_str(t),
            Fragment::Tag { .. } | Fragment::Comment => {}
        }
    }
    segments.push(current);

    segments
        .iter()
        .map(|segment| collapse_whitespace(segment))
        .filter(|line| !line.is_empty())
        .map(|line| unescape_entities(&line))
        .collect()
}

/// Decode named (HTML5) and numeric character references.
///
/// Unknown or unterminated references are kept verbatim.
pub fn unescape_entities(text: &str) -> String {
    let mut input = text;
    let mut out = String::with_capacity(text.len());
    while !input.is_empty() {
        match entity_or_text.parse_next(&mut input) {
            Ok(piece) => out.push_str(&piece),
            Err(_) => {
                out.push_str(input);
                break;
            }
        }
    }
    out
}

fn is_line_break(tag_name: &str) -> bool {
    tag_name.eq_ignore_ascii_case("br") || tag_name.eq_ignore_ascii_case("div")
}

fn is_block(tag_name: &str) -> bool {
    tag_name.eq_ignore_ascii_case("div")
}

fn collapse_whitespace(s: &str) -> String {
    s.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

fn fragments(text: &str) -> Vec<Fragment<'_>> {
    let mut input = text;
    let mut out = Vec::new();
    while !input.is_empty() {
        match fragment.parse_next(&mut input) {
            Ok(f) => out.push(f),
            Err(_) => {
                out.push(Fragment::Text(input));
                break;
            }
        }
    }
    out
}

fn fragment<'s>(input: &mut &'s str) -> winnow::Result<Fragment<'s>> {
    alt((
        comment,
        tag,
        take_till(1.., '<').map(Fragment::Text),
        take(1usize).map(Fragment::Text),
    ))
    .parse_next(input)
}

fn comment<'s>(input: &mut &'s str) -> winnow::Result<Fragment<'s>> {
    delimited("<!--", take_until(0.., "-->"), "-->")
        .value(Fragment::Comment)
        .parse_next(input)
}

fn tag<'s>(input: &mut &'s str) -> winnow::Result<Fragment<'s>> {
    '<'.parse_next(input)?;
    let closing = opt('/').parse_next(input)?.is_some();
    let name = tag_name.parse_next(input)?;
    take_till(0.., '>').parse_next(input)?;
    '>'.parse_next(input)?;
    Ok(Fragment::Tag { name, closing })
}

fn tag_name<'s>(input: &mut &'s str) -> winnow::Result<&'s str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic()),
        take_while(0.., |c: char| c.is_ascii_alphanumeric()),
    )
        .take()
        .parse_next(input)
}

fn entity_or_text<'s>(input: &mut &'s str) -> winnow::Result<Cow<'s, str>> {
    alt((
        entity.map(Cow::Owned),
        take_till(1.., '&').map(Cow::Borrowed),
        take(1usize).map(Cow::Borrowed),
    ))
    .parse_next(input)
}

fn entity(input: &mut &str) -> winnow::Result<String> {
    delimited('&', alt((numeric_reference, named_reference)), ';').parse_next(input)
}

fn numeric_reference(input: &mut &str) -> winnow::Result<String> {
    preceded(
        '#',
        alt((
            preceded(one_of(['x', 'X']), hex_digit1)
                .map(|digits: &str| u32::from_str_radix(digits, 16).ok()),
            digit1.map(|digits: &str| digits.parse::<u32>().ok()),
        )),
    )
    .map(|code| {
        code.and_then(char::from_u32)
            .filter(|c| *c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER)
            .to_string()
    })
    .parse_next(input)
}

fn named_reference(input: &mut &str) -> winnow::Result<String> {
    alphanumeric1
        .verify_map(|name: &str| resolve_html5_entity(name).map(str::to_owned))
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_plain_text() {
        assert_eq!(split_lines("A"), vec!["A"]);
    }

    #[test]
    fn split_empty_text() {
        assert!(split_lines("").is_empty());
        assert!(split_lines("   ").is_empty());
        assert!(split_lines("<br><div></div><br/>").is_empty());
    }

    #[test]
    fn split_on_br() {
        assert_eq!(split_lines("A<br>- a: 1"), vec!["A", "- a: 1"]);
        assert_eq!(split_lines("A<br/>B<br />C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn split_on_div() {
        assert_eq!(
            split_lines("<b>T</b><div>- a: 2</div><div>- b: \"test\"</div>"),
            vec!["T", "- a: 2", "- b: \"test\""]
        );
    }

    #[test]
    fn split_tags_are_case_insensitive() {
        assert_eq!(split_lines("A<BR>B<Div>C</DIV>"), vec!["A", "B", "C"]);
    }

    #[test]
    fn split_strips_formatting_tags() {
        assert_eq!(
            split_lines("<b><font style=\"font-size: 14px;\">A</font></b>"),
            vec!["A"]
        );
        assert_eq!(
            split_lines(
                "<span style=\"font-size: 14px;\"><b>B, C</b></span><br><div>- a: 2</div><div>- b: \"test\"</div>"
            ),
            vec!["B, C", "- a: 2", "- b: \"test\""]
        );
    }

    #[test]
    fn split_keeps_text_split_by_inline_tags_together() {
        assert_eq!(split_lines("Pe<i>rs</i>on"), vec!["Person"]);
    }

    #[test]
    fn split_collapses_whitespace() {
        assert_eq!(split_lines("  A \n   B  <br>\tC"), vec!["A B", "C"]);
    }

    #[test]
    fn split_keeps_words_apart_after_closing_div() {
        assert_eq!(split_lines("<div>A</div>B"), vec!["A B"]);
        assert_eq!(split_lines("A<div>B</div>C<br>D"), vec!["A", "B C", "D"]);
    }

    #[test]
    fn split_drops_comments() {
        assert_eq!(split_lines("A<!-- <br> -->B"), vec!["AB"]);
    }

    #[test]
    fn split_keeps_stray_angle_brackets() {
        assert_eq!(split_lines("- a: 1 < 2"), vec!["- a: 1 < 2"]);
        assert_eq!(split_lines("x <"), vec!["x <"]);
    }

    #[test]
    fn split_decodes_entities_after_stripping() {
        assert_eq!(split_lines("&lt;b&gt;A&lt;/b&gt;"), vec!["<b>A</b>"]);
        assert_eq!(split_lines("A&lt;br&gt;B"), vec!["A<br>B"]);
    }

    #[test]
    fn unescape_named_entities() {
        assert_eq!(unescape_entities("a &amp; b &quot;c&quot;"), "a & b \"c\"");
        assert_eq!(unescape_entities("x&nbsp;y"), "x\u{a0}y");
    }

    #[test]
    fn unescape_numeric_entities() {
        assert_eq!(unescape_entities("&#65;&#x42;&#X43;"), "ABC");
        assert_eq!(unescape_entities("&#0;&#x110000;"), "\u{fffd}\u{fffd}");
    }

    #[test]
    fn unescape_keeps_unknown_references() {
        assert_eq!(unescape_entities("&bogus; &amp &#; &"), "&bogus; &amp &#; &");
    }
}
