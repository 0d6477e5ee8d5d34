//! Built-in template functions
//!
//! Arguments follow the pipeline convention: the subject comes last, so
//! `{{.X | truncate 40}}` and `{{truncate 40 .X}}` are the same call.

use super::value::Value;
use crate::formatter::limits::{clip, DISPLAY_ELLIPSIS};
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::sync::Arc;

/// Names accepted by the parser.
pub const BUILTINS: &[&str] = &[
    "upper",
    "lower",
    "title",
    "trim",
    "trimPrefix",
    "trimSuffix",
    "replace",
    "contains",
    "hasPrefix",
    "hasSuffix",
    "eq",
    "ne",
    "lt",
    "le",
    "gt",
    "ge",
    "and",
    "or",
    "not",
    "len",
    "default",
    "join",
    "truncate",
    "timeAgo",
    "formatTime",
    "formatDate",
    "labelList",
    "hasLabel",
    "summarizeComments",
    "summarizeFiles",
    "mdLink",
    "issueRef",
    "codeBlock",
    "quote",
    "pluralize",
    "add",
    "sub",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Source of "now" for relative time formatting.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, for deterministic output.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Max characters of a comment's first line in `summarizeComments`.
const SUMMARY_LINE_CHARS: usize = 80;

type FnResult = Result<Value, String>;

/// Function table bound to a clock.
#[derive(Clone)]
pub struct FunctionLibrary {
    clock: Arc<dyn Clock>,
}

impl Default for FunctionLibrary {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
        }
    }
}

impl std::fmt::Debug for FunctionLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionLibrary").finish_non_exhaustive()
    }
}

impl FunctionLibrary {
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            clock: Arc::new(clock),
        }
    }

    /// Invoke `name` with evaluated arguments.
    pub fn call(&self, name: &str, args: &[Value]) -> FnResult {
        match name {
            "upper" => unary_str(name, args, |s| s.to_uppercase()),
            "lower" => unary_str(name, args, |s| s.to_lowercase()),
            "title" => unary_str(name, args, title_case),
            "trim" => unary_str(name, args, |s| s.trim().to_string()),
            "trimPrefix" => {
                let [prefix, s] = strings::<2>(name, args)?;
                Ok(Value::Str(
                    s.strip_prefix(prefix.as_str()).unwrap_or(&s).to_string(),
                ))
            }
            "trimSuffix" => {
                let [suffix, s] = strings::<2>(name, args)?;
                Ok(Value::Str(
                    s.strip_suffix(suffix.as_str()).unwrap_or(&s).to_string(),
                ))
            }
            "replace" => {
                let [old, new, s] = strings::<3>(name, args)?;
                Ok(Value::Str(s.replace(old.as_str(), &new)))
            }
            "contains" => {
                let [needle, s] = strings::<2>(name, args)?;
                Ok(Value::Bool(s.contains(needle.as_str())))
            }
            "hasPrefix" => {
                let [prefix, s] = strings::<2>(name, args)?;
                Ok(Value::Bool(s.starts_with(prefix.as_str())))
            }
            "hasSuffix" => {
                let [suffix, s] = strings::<2>(name, args)?;
                Ok(Value::Bool(s.ends_with(suffix.as_str())))
            }
            "eq" => {
                if args.len() < 2 {
                    return Err(arity(name, "at least 2", args.len()));
                }
                Ok(Value::Bool(args[1..].iter().any(|b| values_equal(&args[0], b))))
            }
            "ne" => {
                let [a, b] = exact::<2>(name, args)?;
                Ok(Value::Bool(!values_equal(a, b)))
            }
            "lt" => compare(name, args, |o| o.is_lt()),
            "le" => compare(name, args, |o| o.is_le()),
            "gt" => compare(name, args, |o| o.is_gt()),
            "ge" => compare(name, args, |o| o.is_ge()),
            "and" => {
                if args.is_empty() {
                    return Err(arity(name, "at least 1", 0));
                }
                Ok(args
                    .iter()
                    .find(|v| !v.is_truthy())
                    .unwrap_or(&args[args.len() - 1])
                    .clone())
            }
            "or" => {
                if args.is_empty() {
                    return Err(arity(name, "at least 1", 0));
                }
                Ok(args
                    .iter()
                    .find(|v| v.is_truthy())
                    .unwrap_or(&args[args.len() - 1])
                    .clone())
            }
            "not" => {
                let [v] = exact::<1>(name, args)?;
                Ok(Value::Bool(!v.is_truthy()))
            }
            "len" => {
                let [v] = exact::<1>(name, args)?;
                match v {
                    Value::Str(s) => Ok(Value::from(s.chars().count())),
                    Value::List(items) => Ok(Value::from(items.len())),
                    Value::Map(map) => Ok(Value::from(map.len())),
                    other => Err(format!("len of type {}", other.type_name())),
                }
            }
            "default" => {
                let [fallback, v] = exact::<2>(name, args)?;
                let chosen = if v.is_truthy() { v } else { fallback };
                Ok(chosen.clone())
            }
            "join" => {
                let [sep, list] = exact::<2>(name, args)?;
                let sep = sep.render();
                match list {
                    Value::List(items) => Ok(Value::Str(
                        items.iter().map(Value::render).collect::<Vec<_>>().join(&sep),
                    )),
                    Value::Nil => Ok(Value::Str(String::new())),
                    other => Err(format!("join: expected list, got {}", other.type_name())),
                }
            }
            "truncate" => {
                let [n, s] = exact::<2>(name, args)?;
                let n = int_arg(name, n)?;
                let max =
                    usize::try_from(n).map_err(|_| format!("truncate: negative length {n}"))?;
                Ok(Value::Str(clip(&s.render(), max, DISPLAY_ELLIPSIS)))
            }
            "timeAgo" => {
                let [t] = exact::<1>(name, args)?;
                match parse_time(name, t)? {
                    Some(t) => Ok(Value::Str(time_ago(t, self.clock.now()))),
                    None => Ok(Value::Str(String::new())),
                }
            }
            "formatTime" => {
                let [layout, t] = exact::<2>(name, args)?;
                let layout = layout.render();
                let Some(t) = parse_time(name, t)? else {
                    return Ok(Value::Str(String::new()));
                };
                // chrono reports bad specifiers through fmt::Error
                let mut out = String::new();
                write!(out, "{}", t.format(&layout))
                    .map_err(|_| format!("formatTime: invalid layout {layout:?}"))?;
                Ok(Value::Str(out))
            }
            "formatDate" => {
                let [t] = exact::<1>(name, args)?;
                match parse_time(name, t)? {
                    Some(t) => Ok(Value::Str(t.format("%b %-d, %Y").to_string())),
                    None => Ok(Value::Str(String::new())),
                }
            }
            "labelList" => {
                let [labels] = exact::<1>(name, args)?;
                let names = list_arg(name, labels)?;
                if names.is_empty() {
                    return Ok(Value::Str("none".to_string()));
                }
                Ok(Value::Str(
                    names
                        .iter()
                        .map(|l| format!("`{}`", label_name(l)))
                        .collect::<Vec<_>>()
                        .join(", "),
                ))
            }
            "hasLabel" => {
                let [wanted, labels] = exact::<2>(name, args)?;
                let wanted = wanted.render();
                let names = list_arg(name, labels)?;
                Ok(Value::Bool(
                    names.iter().any(|l| label_name(l).eq_ignore_ascii_case(&wanted)),
                ))
            }
            "summarizeComments" => {
                let [comments] = exact::<1>(name, args)?;
                let comments = list_arg(name, comments)?;
                Ok(Value::Str(summarize_comments(comments)))
            }
            "summarizeFiles" => {
                let [files] = exact::<1>(name, args)?;
                let files = list_arg(name, files)?;
                Ok(Value::Str(summarize_files(files)))
            }
            "mdLink" => {
                let [text, url] = strings::<2>(name, args)?;
                if url.is_empty() {
                    return Ok(Value::Str(text));
                }
                Ok(Value::Str(format!("[{text}]({url})")))
            }
            "issueRef" => match args {
                [number] => Ok(Value::Str(format!("#{}", number.render()))),
                [repo, number] => Ok(Value::Str(format!(
                    "{}#{}",
                    repo.render(),
                    number.render()
                ))),
                _ => Err(arity(name, "1 or 2", args.len())),
            },
            "codeBlock" => {
                let (lang, code) = match args {
                    [code] => (String::new(), code.render()),
                    [lang, code] => (lang.render(), code.render()),
                    _ => return Err(arity(name, "1 or 2", args.len())),
                };
                let newline = if code.ends_with('\n') { "" } else { "\n" };
                Ok(Value::Str(format!("```{lang}\n{code}{newline}```")))
            }
            "quote" => {
                let [s] = exact::<1>(name, args)?;
                Ok(Value::Str(
                    s.render()
                        .lines()
                        .map(|line| {
                            if line.is_empty() {
                                ">".to_string()
                            } else {
                                format!("> {line}")
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n"),
                ))
            }
            "pluralize" => {
                let (singular, plural, count) = match args {
                    [singular, count] => {
                        let singular = singular.render();
                        let plural = format!("{singular}s");
                        (singular, plural, count)
                    }
                    [singular, plural, count] => (singular.render(), plural.render(), count),
                    _ => return Err(arity(name, "2 or 3", args.len())),
                };
                let n = int_arg(name, count)?;
                let word = if n == 1 { singular } else { plural };
                Ok(Value::Str(format!("{n} {word}")))
            }
            "add" => {
                if args.len() < 2 {
                    return Err(arity(name, "at least 2", args.len()));
                }
                let mut sum = 0i64;
                for arg in args {
                    sum = sum.saturating_add(int_arg(name, arg)?);
                }
                Ok(Value::Int(sum))
            }
            "sub" => {
                let [a, b] = exact::<2>(name, args)?;
                Ok(Value::Int(int_arg(name, a)?.saturating_sub(int_arg(name, b)?)))
            }
            other => Err(format!("function {other:?} not defined")),
        }
    }
}

fn arity(name: &str, want: &str, got: usize) -> String {
    format!("wrong number of args for {name}: want {want} got {got}")
}

fn exact<'a, const N: usize>(name: &str, args: &'a [Value]) -> Result<&'a [Value; N], String> {
    args.try_into()
        .map_err(|_| arity(name, &N.to_string(), args.len()))
}

/// Exact arity, every argument rendered to text.
fn strings<const N: usize>(name: &str, args: &[Value]) -> Result<[String; N], String> {
    let args = exact::<N>(name, args)?;
    Ok(std::array::from_fn(|i| args[i].render()))
}

fn unary_str(name: &str, args: &[Value], f: impl Fn(&str) -> String) -> FnResult {
    let [s] = strings::<1>(name, args)?;
    Ok(Value::Str(f(&s)))
}

fn int_arg(name: &str, v: &Value) -> Result<i64, String> {
    v.as_int()
        .ok_or_else(|| format!("{name}: expected integer, got {}", v.type_name()))
}

fn list_arg<'a>(name: &str, v: &'a Value) -> Result<&'a [Value], String> {
    match v {
        Value::Nil => Ok(&[]),
        Value::List(items) => Ok(items),
        other => Err(format!("{name}: expected list, got {}", other.type_name())),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace() || c == '-' || c == '_';
    }
    out
}

/// Equality with integer coercion for numeric strings.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_), Value::Str(_)) | (Value::Str(_), Value::Int(_)) => {
            matches!((a.as_int(), b.as_int()), (Some(x), Some(y)) if x == y)
        }
        _ => a == b,
    }
}

fn compare(name: &str, args: &[Value], pred: impl Fn(std::cmp::Ordering) -> bool) -> FnResult {
    let [a, b] = exact::<2>(name, args)?;
    let ordering = match (a, b) {
        (Value::Str(x), Value::Str(y)) => match (a.as_int(), b.as_int()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x.cmp(y),
        },
        _ => match (a.as_int(), b.as_int()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                return Err(format!(
                    "incompatible types for comparison: {} and {}",
                    a.type_name(),
                    b.type_name()
                ))
            }
        },
    };
    Ok(Value::Bool(pred(ordering)))
}

fn parse_time(name: &str, v: &Value) -> Result<Option<DateTime<Utc>>, String> {
    let text = v.render();
    if text.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(&text)
        .map(|t| Some(t.with_timezone(&Utc)))
        .map_err(|e| format!("{name}: cannot parse time {text:?}: {e}"))
}

fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let (n, unit) = if secs < 3600 {
        (secs / 60, "minute")
    } else if secs < 86_400 {
        (secs / 3600, "hour")
    } else if secs < 30 * 86_400 {
        (secs / 86_400, "day")
    } else if secs < 365 * 86_400 {
        (secs / (30 * 86_400), "month")
    } else {
        (secs / (365 * 86_400), "year")
    };
    let plural = if n == 1 { "" } else { "s" };
    format!("{n} {unit}{plural} ago")
}

fn label_name(v: &Value) -> String {
    match v.field("Name") {
        Some(name) => name.render(),
        None => v.render(),
    }
}

fn summarize_comments(comments: &[Value]) -> String {
    if comments.is_empty() {
        return "No comments".to_string();
    }
    comments
        .iter()
        .map(|c| {
            let author = c.field("Author").map(Value::render).unwrap_or_default();
            let body = c.field("Body").map(Value::render).unwrap_or_default();
            let first = body.lines().next().unwrap_or_default();
            format!("- {author}: {}", clip(first, SUMMARY_LINE_CHARS, DISPLAY_ELLIPSIS))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn summarize_files(files: &[Value]) -> String {
    if files.is_empty() {
        return "No files changed".to_string();
    }
    let field_int = |f: &Value, key: &str| f.field(key).and_then(Value::as_int).unwrap_or(0);
    let additions: i64 = files.iter().map(|f| field_int(f, "Additions")).sum();
    let deletions: i64 = files.iter().map(|f| field_int(f, "Deletions")).sum();
    let noun = if files.len() == 1 { "file" } else { "files" };
    format!(
        "{} {noun} changed (+{additions}/-{deletions})",
        files.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn lib() -> FunctionLibrary {
        FunctionLibrary::with_clock(FixedClock(
            Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
        ))
    }

    fn call(name: &str, args: Vec<Value>) -> Value {
        lib().call(name, &args).unwrap()
    }

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    fn record(pairs: &[(&str, Value)]) -> Value {
        let map: BTreeMap<String, Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Value::Map(map)
    }

    #[test]
    fn test_every_builtin_dispatches() {
        for name in BUILTINS {
            let err = lib().call(name, &[]).err().unwrap_or_default();
            assert!(!err.contains("not defined"), "{name} missing from dispatch");
        }
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(call("upper", vec![s("abc")]), s("ABC"));
        assert_eq!(call("title", vec![s("fix the bug-report")]), s("Fix The Bug-Report"));
        assert_eq!(call("trimPrefix", vec![s("refs/heads/"), s("refs/heads/main")]), s("main"));
        assert_eq!(call("replace", vec![s("-"), s("_"), s("a-b-c")]), s("a_b_c"));
        assert_eq!(call("contains", vec![s("bug"), s("a bug here")]), Value::Bool(true));
        assert_eq!(call("truncate", vec![Value::Int(3), s("abcdef")]), s("abc..."));
        assert_eq!(call("truncate", vec![Value::Int(10), s("abc")]), s("abc"));
    }

    #[test]
    fn test_comparisons_coerce_numeric_strings() {
        assert_eq!(call("eq", vec![s("123"), Value::Int(123)]), Value::Bool(true));
        assert_eq!(call("eq", vec![s("a"), s("b"), s("a")]), Value::Bool(true));
        assert_eq!(call("gt", vec![s("10"), s("9")]), Value::Bool(true));
        assert_eq!(call("lt", vec![s("apple"), s("banana")]), Value::Bool(true));
        assert!(lib().call("lt", &[Value::Bool(true), Value::Int(1)]).is_err());
    }

    #[test]
    fn test_logic_returns_operands() {
        assert_eq!(call("and", vec![s("x"), s("")]), s(""));
        assert_eq!(call("or", vec![s(""), s("y")]), s("y"));
        assert_eq!(call("not", vec![Value::Nil]), Value::Bool(true));
        assert_eq!(call("default", vec![s("n/a"), s("")]), s("n/a"));
        assert_eq!(call("default", vec![s("n/a"), s("set")]), s("set"));
    }

    #[test]
    fn test_time_functions_use_clock() {
        assert_eq!(call("timeAgo", vec![s("2024-03-10T09:00:00Z")]), s("3 hours ago"));
        assert_eq!(call("timeAgo", vec![s("2024-03-09T12:00:00Z")]), s("1 day ago"));
        assert_eq!(call("timeAgo", vec![s("2024-03-10T11:59:30Z")]), s("just now"));
        assert_eq!(call("timeAgo", vec![s("")]), s(""));
        assert_eq!(call("formatDate", vec![s("2024-03-09T12:00:00Z")]), s("Mar 9, 2024"));
        assert_eq!(
            call("formatTime", vec![s("%H:%M"), s("2024-03-09T08:05:00Z")]),
            s("08:05")
        );
        assert!(lib().call("timeAgo", &[s("yesterday")]).is_err());
        assert!(lib()
            .call("formatTime", &[s("%Q"), s("2024-03-09T08:05:00Z")])
            .is_err());
    }

    #[test]
    fn test_label_helpers() {
        let labels = Value::from(vec!["bug", "P1"]);
        assert_eq!(call("labelList", vec![labels.clone()]), s("`bug`, `P1`"));
        assert_eq!(call("labelList", vec![Value::List(vec![])]), s("none"));
        assert_eq!(call("hasLabel", vec![s("p1"), labels]), Value::Bool(true));
    }

    #[test]
    fn test_summaries() {
        let comments = Value::List(vec![
            record(&[("Author", s("alice")), ("Body", s("LGTM\nmore"))]),
            record(&[("Author", s("bob")), ("Body", s("needs work"))]),
        ]);
        assert_eq!(
            call("summarizeComments", vec![comments]),
            s("- alice: LGTM\n- bob: needs work")
        );
        let files = Value::List(vec![
            record(&[("Additions", Value::Int(3)), ("Deletions", Value::Int(1))]),
            record(&[("Additions", Value::Int(2)), ("Deletions", Value::Int(0))]),
        ]);
        assert_eq!(call("summarizeFiles", vec![files]), s("2 files changed (+5/-1)"));
        assert_eq!(call("summarizeFiles", vec![Value::Nil]), s("No files changed"));
    }

    #[test]
    fn test_markdown_helpers() {
        assert_eq!(call("mdLink", vec![s("PR"), s("https://x/1")]), s("[PR](https://x/1)"));
        assert_eq!(call("issueRef", vec![s("42")]), s("#42"));
        assert_eq!(call("issueRef", vec![s("acme/w"), Value::Int(42)]), s("acme/w#42"));
        assert_eq!(
            call("codeBlock", vec![s("rust"), s("fn main() {}")]),
            s("```rust\nfn main() {}\n```")
        );
        assert_eq!(call("quote", vec![s("a\n\nb")]), s("> a\n>\n> b"));
    }

    #[test]
    fn test_arithmetic_and_pluralize() {
        assert_eq!(call("add", vec![Value::Int(1), s("2"), Value::Int(3)]), Value::Int(6));
        assert_eq!(call("sub", vec![Value::Int(10), Value::Int(4)]), Value::Int(6));
        assert_eq!(call("pluralize", vec![s("file"), Value::Int(1)]), s("1 file"));
        assert_eq!(call("pluralize", vec![s("file"), s("3")]), s("3 files"));
        assert_eq!(
            call("pluralize", vec![s("reply"), s("replies"), Value::Int(0)]),
            s("0 replies")
        );
    }

    #[test]
    fn test_arity_errors() {
        let err = lib().call("upper", &[]).unwrap_err();
        assert!(err.contains("wrong number of args for upper"));
        assert!(lib().call("len", &[Value::Int(3)]).is_err());
    }
}
