//! Alias definitions and operand canonicalisation.
//!
//! An `#alias` directive gives a register expression a readable name and,
//! optionally, names for bit positions:
//!
//! ```text
//! #alias(status=s1[carry=0,zero=1])
//! #alias(acc[hi=15,lo=0]=r3)
//! #alias(foo=r3(hi=7,lo=0))
//! ```
//!
//! Operands written against an alias (`foo[hi:lo]`) are rewritten to the
//! aliased expression with the label values substituted (`r3[7:0]`).
//! Substitution is a single level: an alias expression is never itself
//! looked up again.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DirectiveError;

static ALIAS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<name>\w+)\s*(?:\[(?P<pre>[^\]]*)\])?\s*=\s*(?P<expr>[^\[\]()=]*?)\s*(?:\[(?P<post>[^\]]*)\]|\((?P<paren>[^)]*)\))?$",
    )
    .expect("alias regex")
});

static OPERAND_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<base>[^\[]*?)\s*(?:\[(?P<start>[^\]:]*)(?::(?P<end>[^\]]*))?\])?$")
        .expect("operand regex")
});

/// A named operand expression with optional named bit positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    /// The alias name.
    pub name: String,
    /// The operand expression substituted for the name.
    pub expression: String,
    /// Range labels and the bit positions they stand for.
    pub ranges: BTreeMap<String, String>,
}

/// An operand split into its base and optional bit range, after alias
/// substitution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Operand {
    /// Register, constant or `pc` token.
    pub base: String,
    /// First (most significant) bit of the range.
    pub start: Option<String>,
    /// Last (least significant) bit of the range.
    pub end: Option<String>,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => write!(f, "[{start}:{end}]"),
            (Some(start), None) => write!(f, "[{start}]"),
            (None, Some(end)) => write!(f, "[:{end}]"),
            (None, None) => Ok(()),
        }
    }
}

/// The aliases defined by one test bench.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, Alias>,
}

impl AliasTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and registers the content of an `#alias` directive.
    ///
    /// Labels may appear after the name or after the expression, in square
    /// brackets or (after the expression) in parentheses, but not both.
    pub fn define(&mut self, text: &str) -> Result<&Alias, DirectiveError> {
        let text = text.trim();
        let malformed = || DirectiveError::MalformedAlias {
            text: text.to_string(),
        };

        let caps = ALIAS_RE.captures(text).ok_or_else(malformed)?;
        let name = caps["name"].to_string();
        let expression = caps["expr"].trim().to_string();
        if expression.is_empty() {
            return Err(malformed());
        }

        let labels = match (caps.name("pre"), caps.name("post").or(caps.name("paren"))) {
            (Some(_), Some(_)) => return Err(malformed()),
            (Some(m), None) | (None, Some(m)) => parse_labels(m.as_str())?,
            (None, None) => BTreeMap::new(),
        };

        if self.aliases.contains_key(&name) {
            return Err(DirectiveError::DuplicateAlias { name });
        }

        log::debug!("alias '{name}' = '{expression}'");
        for (label, value) in &labels {
            log::debug!("    range alias '{label}' = '{value}'");
        }

        let alias = self.aliases.entry(name.clone()).or_insert(Alias {
            name,
            expression,
            ranges: labels,
        });
        Ok(alias)
    }

    /// Looks up an alias by exact name.
    pub fn get(&self, name: &str) -> Option<&Alias> {
        self.aliases.get(name)
    }

    /// Number of defined aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns `true` if no alias is defined.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Splits `raw` into base and range and substitutes a matching alias.
    ///
    /// Range endpoints are replaced independently by the alias's label
    /// values; endpoints without a label pass through unchanged. Names that
    /// are not aliases are returned as written.
    pub fn resolve(&self, raw: &str) -> Operand {
        let raw = raw.trim();
        let Some(caps) = OPERAND_RE.captures(raw) else {
            return Operand {
                base: raw.to_string(),
                ..Operand::default()
            };
        };

        let endpoint = |group: &str| {
            caps.name(group)
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let mut operand = Operand {
            base: caps["base"].trim().to_string(),
            start: endpoint("start"),
            end: endpoint("end"),
        };

        if let Some(alias) = self.aliases.get(&operand.base) {
            operand.base = alias.expression.clone();
            for bound in [&mut operand.start, &mut operand.end].into_iter().flatten() {
                if let Some(value) = alias.ranges.get(bound.as_str()) {
                    *bound = value.clone();
                }
            }
        }
        operand
    }
}

fn parse_labels(text: &str) -> Result<BTreeMap<String, String>, DirectiveError> {
    let mut labels = BTreeMap::new();
    for pair in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (label, value) = pair
            .split_once('=')
            .map(|(l, v)| (l.trim(), v.trim()))
            .filter(|(l, v)| !l.is_empty() && !v.is_empty())
            .ok_or_else(|| DirectiveError::MalformedLabel {
                text: pair.to_string(),
            })?;
        labels.insert(label.to_string(), value.to_string());
    }
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(base: &str, start: Option<&str>, end: Option<&str>) -> Operand {
        Operand {
            base: base.into(),
            start: start.map(Into::into),
            end: end.map(Into::into),
        }
    }

    #[test]
    fn labels_in_parentheses() {
        let mut table = AliasTable::new();
        table.define("foo=r3(hi=7,lo=0)").unwrap();
        assert_eq!(table.resolve("foo[hi:lo]"), op("r3", Some("7"), Some("0")));
        assert_eq!(table.resolve("foo[hi:lo]"), table.resolve("r3[7:0]"));
    }

    #[test]
    fn labels_after_name() {
        let mut table = AliasTable::new();
        let alias = table.define("acc[hi=15, lo=8]=r2").unwrap();
        assert_eq!(alias.expression, "r2");
        assert_eq!(alias.ranges.get("hi").map(String::as_str), Some("15"));
        assert_eq!(table.resolve("acc[hi:lo]"), op("r2", Some("15"), Some("8")));
    }

    #[test]
    fn labels_after_expression() {
        let mut table = AliasTable::new();
        table.define("status = s1[carry=0,zero=1]").unwrap();
        assert_eq!(table.resolve("status[zero]"), op("s1", Some("1"), None));
    }

    #[test]
    fn end_label_substituted_independently() {
        let mut table = AliasTable::new();
        table.define("foo=r3(hi=7,lo=0)").unwrap();
        assert_eq!(table.resolve("foo[6:lo]"), op("r3", Some("6"), Some("0")));
        assert_eq!(table.resolve("foo[hi:2]"), op("r3", Some("7"), Some("2")));
    }

    #[test]
    fn alias_without_labels() {
        let mut table = AliasTable::new();
        table.define("counter=r5").unwrap();
        assert_eq!(table.resolve("counter"), op("r5", None, None));
        assert_eq!(table.resolve("counter[3]"), op("r5", Some("3"), None));
    }

    #[test]
    fn unknown_names_pass_through() {
        let table = AliasTable::new();
        assert_eq!(table.resolve(" r1 "), op("r1", None, None));
        assert_eq!(table.resolve("r1[4:2]"), op("r1", Some("4"), Some("2")));
        assert_eq!(table.resolve("0x10"), op("0x10", None, None));
    }

    #[test]
    fn resolve_is_idempotent_without_nested_aliases() {
        let mut table = AliasTable::new();
        table.define("foo=r3(hi=7,lo=0)").unwrap();
        for raw in ["foo[hi:lo]", "foo", "r1[3]", "pc", "0x10"] {
            let once = table.resolve(raw);
            let twice = table.resolve(&once.to_string());
            assert_eq!(once, twice, "{raw}");
        }
    }

    #[test]
    fn substitution_is_single_level() {
        let mut table = AliasTable::new();
        table.define("a=b").unwrap();
        table.define("b=r1").unwrap();
        assert_eq!(table.resolve("a").base, "b");
    }

    #[test]
    fn operand_display() {
        assert_eq!(op("r3", Some("7"), Some("0")).to_string(), "r3[7:0]");
        assert_eq!(op("r3", Some("7"), None).to_string(), "r3[7]");
        assert_eq!(op("pc", None, None).to_string(), "pc");
    }

    #[test]
    fn malformed_alias_is_an_error() {
        let mut table = AliasTable::new();
        for text in ["", "foo", "=r1", "foo=", "foo[a=1]=r1[b=2]", "foo bar=r1"] {
            assert!(
                matches!(
                    table.define(text),
                    Err(DirectiveError::MalformedAlias { .. })
                ),
                "{text:?}"
            );
        }
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_label_is_an_error() {
        let mut table = AliasTable::new();
        let err = table.define("foo=r1(hi,lo=0)").unwrap_err();
        assert_eq!(
            err,
            DirectiveError::MalformedLabel {
                text: "hi".into()
            }
        );
    }

    #[test]
    fn duplicate_alias_is_an_error() {
        let mut table = AliasTable::new();
        table.define("foo=r1").unwrap();
        assert_eq!(
            table.define("foo=r2").unwrap_err(),
            DirectiveError::DuplicateAlias { name: "foo".into() }
        );
        assert_eq!(table.get("foo").map(|a| a.expression.as_str()), Some("r1"));
        assert_eq!(table.len(), 1);
    }
}
