use crate::error::Result;
use regex::Regex;

/// Which keyword a directive line used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    /// Keep the label line and nest the content one indent level deeper
    Include,
    /// Substitute the content in place of the directive line
    Replace,
}

/// A directive found on a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    /// Leading whitespace of the directive line
    pub indent: &'a str,
    /// Token before the tag, e.g. `key:` or `-`
    pub label: Option<&'a str>,
    pub kind: DirectiveKind,
    /// Everything after the tag, trimmed
    pub specifier: &'a str,
}

impl Directive<'_> {
    /// Whether the label line should be written before the content
    pub fn emits_label(&self) -> bool {
        self.kind == DirectiveKind::Include && self.label.is_some()
    }
}

/// Line matcher built from the configured include and replace tags
#[derive(Debug, Clone)]
pub struct DirectiveMatcher {
    pattern: Regex,
    include_tag: String,
}

impl DirectiveMatcher {
    /// Builds the matcher; tags are matched literally
    ///
    /// # Errors
    ///
    /// Returns `YamlincError::Regex` if the pattern fails to compile.
    pub fn new(include_tag: &str, replace_tag: &str) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"^(?P<indent>\s*)(?:(?P<label>\S+)\s+)?(?P<tag>{}|{})\s+(?P<spec>\S.*?)\s*$",
            regex::escape(include_tag),
            regex::escape(replace_tag),
        ))?;
        Ok(Self {
            pattern,
            include_tag: include_tag.to_string(),
        })
    }

    /// Returns the directive on this line, if any
    pub fn find<'a>(&self, line: &'a str) -> Option<Directive<'a>> {
        let captures = self.pattern.captures(line)?;
        let indent = captures.name("indent").map_or("", |m| m.as_str());
        let label = captures.name("label").map(|m| m.as_str());
        let tag = captures.name("tag")?.as_str();
        let specifier = captures.name("spec")?.as_str();

        let kind = if tag == self.include_tag {
            DirectiveKind::Include
        } else {
            DirectiveKind::Replace
        };

        Some(Directive {
            indent,
            label,
            kind,
            specifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> DirectiveMatcher {
        DirectiveMatcher::new("!include", "!replace").unwrap()
    }

    #[test]
    fn test_plain_lines_do_not_match() {
        let m = matcher();
        assert!(m.find("key: value").is_none());
        assert!(m.find("").is_none());
        assert!(m.find("  - item").is_none());
        assert!(m.find("!include").is_none());
        assert!(m.find("note: !includes a.yaml").is_none());
        assert!(m.find("a b !include c.yaml").is_none());
    }

    #[test]
    fn test_bare_include() {
        let d = matcher().find("  !include child.yaml").unwrap();
        assert_eq!(d.indent, "  ");
        assert_eq!(d.label, None);
        assert_eq!(d.kind, DirectiveKind::Include);
        assert_eq!(d.specifier, "child.yaml");
        assert!(!d.emits_label());
    }

    #[test]
    fn test_labelled_include() {
        let d = matcher().find("    services: !include svc/*.yaml  ").unwrap();
        assert_eq!(d.indent, "    ");
        assert_eq!(d.label, Some("services:"));
        assert_eq!(d.specifier, "svc/*.yaml");
        assert!(d.emits_label());

        let d = matcher().find("- !include item.yaml").unwrap();
        assert_eq!(d.indent, "");
        assert_eq!(d.label, Some("-"));
    }

    #[test]
    fn test_replace_never_emits_label() {
        let d = matcher().find("key: !replace other.yaml").unwrap();
        assert_eq!(d.kind, DirectiveKind::Replace);
        assert_eq!(d.label, Some("key:"));
        assert!(!d.emits_label());
    }

    #[test]
    fn test_specifier_keeps_inner_spaces() {
        let d = matcher()
            .find("out: !include $(shell echo a b)")
            .unwrap();
        assert_eq!(d.specifier, "$(shell echo a b)");
    }

    #[test]
    fn test_custom_tags_are_escaped() {
        let m = DirectiveMatcher::new("+inc(lude)", "*rep").unwrap();
        let d = m.find("a: +inc(lude) x.yaml").unwrap();
        assert_eq!(d.kind, DirectiveKind::Include);
        let d = m.find("*rep y.yaml").unwrap();
        assert_eq!(d.kind, DirectiveKind::Replace);
        assert!(m.find("a: +incllude x.yaml").is_none());
        assert!(m.find("a: !include x.yaml").is_none());
    }
}
