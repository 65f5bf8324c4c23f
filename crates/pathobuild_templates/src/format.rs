//! Placeholder parsing and string formatting.
//!
//! Template strings use `{name}` placeholders. `{{` and `}}` stand for literal
//! braces. A placeholder may carry a conversion (`!s`, `!r`) and a small
//! format spec of the form `[[fill]align][width]`, e.g. `{lineage:>8}`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{TemplateError, TemplateResult};
use crate::template::FieldValue;

static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name pattern"));

/// Returns the variable names referenced by `template`, in order of
/// appearance. Repeated placeholders are returned once per occurrence.
pub fn parse_variables_from_template(template: &str) -> TemplateResult<Vec<String>> {
    let parsed = TemplateString::parse(template)?;
    Ok(parsed.variables().map(str::to_string).collect())
}

/// Parses `template` and substitutes every placeholder from `values`.
pub fn format_template(
    template: &str,
    values: &BTreeMap<String, FieldValue>,
) -> TemplateResult<String> {
    TemplateString::parse(template)?.format(values)
}

/// Conversion applied to a value before padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conversion {
    #[default]
    Display,
    /// Strings are wrapped in single quotes.
    Quoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
}

/// Parsed `[[fill]align][0][width]` spec.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<Align>,
    /// Leading `0` on the width: pad with zeros, after the sign for numbers.
    pub zero_pad: bool,
    pub width: Option<usize>,
}

impl FormatSpec {
    fn parse(template: &str, spec: &str) -> TemplateResult<Self> {
        let chars: Vec<char> = spec.chars().collect();
        let mut result = FormatSpec::default();
        let mut rest = 0;

        if chars.len() >= 2 {
            if let Some(align) = align_of(chars[1]) {
                result.fill = Some(chars[0]);
                result.align = Some(align);
                rest = 2;
            }
        }
        if result.align.is_none() {
            if let Some(align) = chars.first().copied().and_then(align_of) {
                result.align = Some(align);
                rest = 1;
            }
        }

        if chars.get(rest) == Some(&'0') {
            result.zero_pad = true;
            rest += 1;
        }

        let width: String = chars[rest..].iter().collect();
        if !width.is_empty() {
            let parsed = width
                .parse::<usize>()
                .map_err(|_| malformed(template, format!("unsupported format spec '{}'", spec)))?;
            result.width = Some(parsed);
        }

        Ok(result)
    }

    fn apply(&self, text: String, numeric: bool) -> String {
        let Some(width) = self.width else {
            return text;
        };
        let len = text.chars().count();
        if len >= width {
            return text;
        }

        let pad = width - len;
        let fill = self
            .fill
            .unwrap_or(if self.zero_pad { '0' } else { ' ' });
        let repeat = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();

        if self.zero_pad && numeric && self.align.is_none() {
            return match text.strip_prefix('-') {
                Some(digits) => format!("-{}{}", repeat(pad), digits),
                None => repeat(pad) + &text,
            };
        }

        let align = self
            .align
            .unwrap_or(if numeric { Align::Right } else { Align::Left });

        match align {
            Align::Left => text + &repeat(pad),
            Align::Right => repeat(pad) + &text,
            Align::Center => {
                let left = pad / 2;
                repeat(left) + &text + &repeat(pad - left)
            }
        }
    }
}

fn align_of(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        _ => None,
    }
}

/// A `{name...}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub conversion: Conversion,
    pub spec: FormatSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A parsed template string that can be formatted repeatedly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateString {
    source: String,
    segments: Vec<Segment>,
}

impl TemplateString {
    /// Parse a template string into literal and placeholder segments.
    pub fn parse(source: &str) -> TemplateResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(malformed(source, "single '}' encountered")),
                '{' => {
                    let mut body = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(malformed(source, "nested placeholders are not supported")),
                            other => body.push(other),
                        }
                    }
                    if !closed {
                        return Err(malformed(source, "expected '}' before end of string"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(parse_placeholder(source, &body)?));
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Variable names in order of appearance, duplicates included.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(p) => Some(p.name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn has_placeholders(&self) -> bool {
        self.variables().next().is_some()
    }

    /// Substitute placeholders with values from `values`.
    pub fn format(&self, values: &BTreeMap<String, FieldValue>) -> TemplateResult<String> {
        let mut out = String::with_capacity(self.source.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(placeholder) => {
                    let value = values.get(&placeholder.name).ok_or_else(|| {
                        TemplateError::Formatting {
                            template: self.source.clone(),
                            message: format!("no value for '{}'", placeholder.name),
                        }
                    })?;
                    let rendered = value.render().ok_or_else(|| TemplateError::Formatting {
                        template: self.source.clone(),
                        message: format!(
                            "value for '{}' is a {}, not a scalar",
                            placeholder.name,
                            value.kind()
                        ),
                    })?;
                    let converted = match (placeholder.conversion, value) {
                        (Conversion::Quoted, FieldValue::String(_)) => format!("'{}'", rendered),
                        _ => rendered,
                    };
                    let numeric = matches!(value, FieldValue::Integer(_) | FieldValue::Float(_));
                    out.push_str(&placeholder.spec.apply(converted, numeric));
                }
            }
        }

        Ok(out)
    }
}

fn parse_placeholder(template: &str, body: &str) -> TemplateResult<Placeholder> {
    let (head, spec) = match body.split_once(':') {
        Some((head, spec)) => (head, Some(spec)),
        None => (body, None),
    };
    let (name, conversion) = match head.split_once('!') {
        Some((name, conv)) => (name, Some(conv)),
        None => (head, None),
    };

    if name.is_empty() {
        return Err(malformed(template, "positional placeholders are not supported"));
    }
    if !FIELD_NAME.is_match(name) {
        return Err(malformed(template, format!("invalid field name '{}'", name)));
    }

    let conversion = match conversion {
        None | Some("s") => Conversion::Display,
        Some("r") => Conversion::Quoted,
        Some(other) => {
            return Err(malformed(template, format!("unknown conversion '!{}'", other)));
        }
    };

    let spec = match spec {
        Some(spec) => FormatSpec::parse(template, spec)?,
        None => FormatSpec::default(),
    };

    Ok(Placeholder {
        name: name.to_string(),
        conversion,
        spec,
    })
}

fn malformed(template: &str, message: impl Into<String>) -> TemplateError {
    TemplateError::MalformedPlaceholder {
        template: template.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, FieldValue)]) -> BTreeMap<String, FieldValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_parse_variables() {
        assert!(parse_variables_from_template("flu_h3n2").unwrap().is_empty());
        assert_eq!(parse_variables_from_template("{virus}").unwrap(), vec!["virus"]);
        assert_eq!(
            parse_variables_from_template("{virus}_{lineage}").unwrap(),
            vec!["virus", "lineage"]
        );
    }

    #[test]
    fn test_parse_keeps_duplicates_in_order() {
        assert_eq!(
            parse_variables_from_template("{a}_{b}_{a}").unwrap(),
            vec!["a", "b", "a"]
        );
    }

    #[test]
    fn test_escaped_braces_are_literal() {
        assert!(parse_variables_from_template("{{virus}}").unwrap().is_empty());
        let formatted = format_template("{{{virus}}}", &values(&[("virus", "zika".into())])).unwrap();
        assert_eq!(formatted, "{zika}");
    }

    #[test]
    fn test_malformed_placeholders() {
        for bad in ["{virus", "virus}", "{}", "{0}", "{a.b}", "{a!x}", "{a:.2f}", "{a{b}}"] {
            let err = parse_variables_from_template(bad).unwrap_err();
            assert!(
                matches!(err, TemplateError::MalformedPlaceholder { .. }),
                "expected malformed placeholder for {:?}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_format_without_placeholders_is_identity() {
        assert_eq!(format_template("zika", &BTreeMap::new()).unwrap(), "zika");
    }

    #[test]
    fn test_format_missing_value_fails() {
        let err = format_template("{virus}", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, TemplateError::Formatting { .. }));
    }

    #[test]
    fn test_format_non_scalar_fails() {
        let vals = values(&[("virus", FieldValue::from(vec!["zika"]))]);
        let err = format_template("{virus}", &vals).unwrap_err();
        assert!(err.to_string().contains("not a scalar"));
    }

    #[test]
    fn test_format_conversion_and_spec() {
        let vals = values(&[("v", "ab".into()), ("n", FieldValue::Integer(7))]);
        assert_eq!(format_template("{v!r}", &vals).unwrap(), "'ab'");
        assert_eq!(format_template("{v:4}|", &vals).unwrap(), "ab  |");
        assert_eq!(format_template("{v:>4}", &vals).unwrap(), "  ab");
        assert_eq!(format_template("{v:*^6}", &vals).unwrap(), "**ab**");
        assert_eq!(format_template("{n:3}", &vals).unwrap(), "  7");
        assert_eq!(format_template("{n:0>3}", &vals).unwrap(), "007");
        assert_eq!(format_template("{n:03}", &vals).unwrap(), "007");
        assert_eq!(format_template("{v:04}", &vals).unwrap(), "ab00");
        assert_eq!(format_template("{v:>04}", &vals).unwrap(), "00ab");

        let negative = values(&[("n", FieldValue::Integer(-7))]);
        assert_eq!(format_template("{n:04}", &negative).unwrap(), "-007");
    }

    #[test]
    fn test_template_string_reuse() {
        let parsed = TemplateString::parse("data/{virus}_{lineage}.fasta").unwrap();
        assert!(parsed.has_placeholders());

        let first = parsed
            .format(&values(&[("virus", "flu".into()), ("lineage", "h3n2".into())]))
            .unwrap();
        let second = parsed
            .format(&values(&[("virus", "flu".into()), ("lineage", "vic".into())]))
            .unwrap();
        assert_eq!(first, "data/flu_h3n2.fasta");
        assert_eq!(second, "data/flu_vic.fasta");
    }
}
