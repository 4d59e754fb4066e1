//! URL detection for message bodies
//!
//! Wraps bare URLs in `<a href="URL">URL</a>` and escapes stray ampersands so
//! the result can be handed to a markup renderer. Anchors of exactly that
//! generated shape are passed through untouched, which makes the transform
//! idempotent. Any other markup, including anchors typed by the sender, is
//! treated as plain text.
//!
//! Matching uses the `regex` crate, so runtime is linear in the input even
//! for pathological runs of parentheses.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// One level of matched parentheses inside a URL, e.g. `(disambiguation)`
const BALANCED: &str = r#"\((?:[^\s()<>"]+|\([^\s()<>"]+\))*\)"#;

/// Characters that may precede a URL without becoming part of it
const LEADING: &str = r#"[\s`(\[{'"<\x{00AB}\x{201C}\x{2018}]"#;

/// Characters a URL may end with
const NOT_TRAILING: &str = r#"[^\s`!()\[\]{};:'".,<>?\x{00AB}\x{00BB}\x{200E}\x{200F}\x{201C}\x{201D}\x{2018}\x{2019}\x{202A}\x{202C}]"#;

/// Start of anything the URL pattern recognizes
const URL_PREFIX: &str = r"(?:(?:http|https|ftp)://|www\d{0,3}[.]|[a-z0-9.\-]+[.][a-z]{2,4}/)";

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        let pattern = format!(
            r#"(?i)(^|{leading})({prefix}(?:[^\s()<>"]+|{balanced})+(?:{balanced}|{not_trailing}))"#,
            leading = LEADING,
            prefix = URL_PREFIX,
            balanced = BALANCED,
            not_trailing = NOT_TRAILING,
        );
        Regex::new(&pattern).expect("URL pattern is valid")
    })
}

fn anchor_regex() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| {
        Regex::new(r#"<a href="([^"<>]*)">([^"<>]*)</a>"#).expect("anchor pattern is valid")
    })
}

fn url_prefix_regex() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| {
        Regex::new(&format!("(?i)^{}", URL_PREFIX)).expect("prefix pattern is valid")
    })
}

/// Whether an anchor could have been produced by [`linkify`]
fn is_generated_anchor(href: &str, label: &str) -> bool {
    href == label
        && url_prefix_regex().is_match(href)
        && href.match_indices('&').all(|(pos, _)| href[pos..].starts_with("&amp;"))
}

/// Wrap every URL in `text` in an anchor and escape bare `&`
///
/// # Examples
///
/// ```
/// use cosmic_connect_sms::linkify;
///
/// assert_eq!(
///     linkify("see https://example.com."),
///     r#"see <a href="https://example.com">https://example.com</a>."#
/// );
/// assert_eq!(linkify("salt & pepper"), "salt &amp; pepper");
/// ```
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for caps in anchor_regex().captures_iter(text) {
        let (Some(anchor), Some(href), Some(label)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };
        if !is_generated_anchor(href.as_str(), label.as_str()) {
            continue;
        }
        link_segment(&text[cursor..anchor.start()], &mut out);
        out.push_str(anchor.as_str());
        cursor = anchor.end();
    }
    link_segment(&text[cursor..], &mut out);

    out
}

/// Linkify and escape one stretch of text that contains no anchors
fn link_segment(segment: &str, out: &mut String) {
    if segment.is_empty() {
        return;
    }
    let linked: Cow<'_, str> = url_regex().replace_all(segment, r#"${1}<a href="${2}">${2}</a>"#);
    escape_ampersands(&linked, out);
}

/// Replace each `&` that does not already start `&amp;`
fn escape_ampersands(text: &str, out: &mut String) {
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("&amp;") {
            out.push_str("&amp;");
            rest = &tail[5..];
        } else {
            out.push_str("&amp;");
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(url: &str) -> String {
        format!(r#"<a href="{0}">{0}</a>"#, url)
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(linkify("no links here"), "no links here");
        assert_eq!(linkify(""), "");
    }

    #[test]
    fn test_scheme_urls() {
        assert_eq!(
            linkify("go to http://example.com/path now"),
            format!("go to {} now", anchor("http://example.com/path"))
        );
        assert_eq!(
            linkify("ftp://files.example.org/a.zip"),
            anchor("ftp://files.example.org/a.zip")
        );
        assert_eq!(linkify("HTTPS://EXAMPLE.COM"), anchor("HTTPS://EXAMPLE.COM"));
    }

    #[test]
    fn test_www_and_bare_domains() {
        assert_eq!(
            linkify("try www.example.com today"),
            format!("try {} today", anchor("www.example.com"))
        );
        assert_eq!(
            linkify("see example.org/docs"),
            format!("see {}", anchor("example.org/docs"))
        );
        // A bare domain needs a path to count as a link
        assert_eq!(linkify("example.org"), "example.org");
    }

    #[test]
    fn test_trailing_punctuation_trimmed() {
        assert_eq!(
            linkify("Visit http://example.com."),
            format!("Visit {}.", anchor("http://example.com"))
        );
        assert_eq!(
            linkify("Really? http://example.com/a?!"),
            format!("Really? {}?!", anchor("http://example.com/a"))
        );
    }

    #[test]
    fn test_leading_bracket_kept_outside() {
        assert_eq!(
            linkify("(www.example.com)"),
            format!("({})", anchor("www.example.com"))
        );
        assert_eq!(
            linkify("\"http://example.com\""),
            format!("\"{}\"", anchor("http://example.com"))
        );
    }

    #[test]
    fn test_balanced_parentheses_included() {
        let url = "http://en.wikipedia.org/wiki/Thread_(computing)";
        assert_eq!(
            linkify(&format!("read {}", url)),
            format!("read {}", anchor(url))
        );
    }

    #[test]
    fn test_unbalanced_parenthesis_stops_link() {
        assert_eq!(
            linkify("http://x.com/(abc"),
            format!("{}(abc", anchor("http://x.com/"))
        );
    }

    #[test]
    fn test_ampersands_escaped() {
        assert_eq!(linkify("a & b"), "a &amp; b");
        assert_eq!(linkify("already &amp; done"), "already &amp; done");
        assert_eq!(
            linkify("http://example.com/?a=1&b=2"),
            r#"<a href="http://example.com/?a=1&amp;b=2">http://example.com/?a=1&amp;b=2</a>"#
        );
    }

    #[test]
    fn test_multiple_urls() {
        assert_eq!(
            linkify("www.a.com and www.b.com"),
            format!("{} and {}", anchor("www.a.com"), anchor("www.b.com"))
        );
    }

    #[test]
    fn test_generated_anchor_passed_through() {
        let text = format!(
            "{} & www.example.org",
            anchor("http://example.com/?a=1&amp;b=2")
        );
        assert_eq!(
            linkify(&text),
            format!(
                "{} &amp; {}",
                anchor("http://example.com/?a=1&amp;b=2"),
                anchor("www.example.org")
            )
        );
    }

    #[test]
    fn test_user_anchor_treated_as_text() {
        let out = linkify(r#"<a href="javascript:evil()">tap & win</a> & more"#);
        assert_eq!(out, r#"<a href="javascript:evil()">tap &amp; win</a> &amp; more"#);

        // Same shape but not a recognized URL
        let out = linkify(r#"<a href="javascript:x">javascript:x</a>"#);
        assert_eq!(out, r#"<a href="javascript:x">javascript:x</a>"#);
        let out = linkify(r#"<a href="www.a.com/?x&y">www.a.com/?x&y</a>"#);
        assert!(!out.contains("x&y"), "unescaped ampersand in {}", out);

        let out = linkify(r#"<a href="http://example.com">a & b</a>"#);
        assert!(out.ends_with(r#">a &amp; b</a>"#), "got {}", out);
    }

    #[test]
    fn test_quote_ends_url() {
        assert_eq!(
            linkify(r#"see http://x.com/"onmouseover="alert(1) now"#),
            format!(r#"see {}"onmouseover="alert(1) now"#, anchor("http://x.com/"))
        );
        assert_eq!(
            linkify(r#"http://a.com/(x"y)"#),
            format!(r#"{}(x"y)"#, anchor("http://a.com/"))
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Visit http://example.com/a?x=1&y=2.",
            "(www.example.com) & more",
            "http://en.wikipedia.org/wiki/Foo_(bar) and ftp://f.org/x",
            "nothing to see",
            r#"see http://x.com/"q" & <a href="www.b.com">www.b.com</a>"#,
        ];
        for input in inputs {
            let once = linkify(input);
            assert_eq!(linkify(&once), once, "input: {}", input);
        }
    }

    #[test]
    fn test_long_paren_run_is_fast() {
        let text = format!("http://x.com/{}", "(".repeat(20_000));
        let out = linkify(&text);
        assert!(out.starts_with(&anchor("http://x.com/")));
    }
}
