//! Entity-expanding XML parser collaborator.
//!
//! # Responsibilities
//! - Parse the internal DTD subset of a document for entity declarations
//! - Expand `&name;` references, including SYSTEM entities read from disk
//!
//! # Design Decisions
//! - SYSTEM entities with a `file://` URI are read verbatim: the external
//!   entity expansion IS the demonstrated behavior
//! - Nested entity references expand over a bounded number of passes

use thiserror::Error;

const MAX_EXPANSION_PASSES: usize = 8;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("failed to resolve entity {name}: {source}")]
    Entity {
        name: String,
        source: std::io::Error,
    },
}

/// Parser that honors internal DTD entity declarations.
#[derive(Debug, Clone, Default)]
pub struct XmlParser;

impl XmlParser {
    pub fn new() -> Self {
        Self
    }

    /// Expand entity references in `document` and return the result.
    pub async fn parse(&self, document: &str) -> Result<String, XmlError> {
        let (entities, body) = split_doctype(document)?;

        let mut resolved: Vec<(String, String)> = Vec::with_capacity(entities.len());
        for decl in entities {
            let value = match decl.value {
                EntityValue::Literal(v) => v,
                EntityValue::System(uri) => {
                    let path = uri.strip_prefix("file://").unwrap_or(&uri);
                    tokio::fs::read_to_string(path).await.map_err(|source| {
                        XmlError::Entity {
                            name: decl.name.clone(),
                            source,
                        }
                    })?
                }
            };
            resolved.push((decl.name, value));
        }

        let mut output = body.to_string();
        for _ in 0..MAX_EXPANSION_PASSES {
            let mut changed = false;
            for (name, value) in &resolved {
                let reference = format!("&{name};");
                if output.contains(&reference) {
                    output = output.replace(&reference, value);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Ok(output)
    }
}

enum EntityValue {
    Literal(String),
    System(String),
}

struct EntityDecl {
    name: String,
    value: EntityValue,
}

/// Pull `<!ENTITY …>` declarations out of a DOCTYPE internal subset and
/// return them with the rest of the document.
fn split_doctype(document: &str) -> Result<(Vec<EntityDecl>, &str), XmlError> {
    let Some(doctype_start) = document.find("<!DOCTYPE") else {
        return Ok((Vec::new(), document));
    };

    let after = &document[doctype_start..];
    let subset_open = after.find('[');
    let doctype_end = match subset_open {
        Some(open) => {
            let close = after[open..]
                .find("]>")
                .ok_or_else(|| XmlError::Malformed("unterminated DOCTYPE subset".into()))?;
            open + close + 2
        }
        None => {
            after
                .find('>')
                .ok_or_else(|| XmlError::Malformed("unterminated DOCTYPE".into()))?
                + 1
        }
    };

    let mut entities = Vec::new();
    if let Some(open) = subset_open {
        if open < doctype_end {
            let subset = &after[open..doctype_end];
            let mut rest = subset;
            while let Some(start) = rest.find("<!ENTITY") {
                let decl_rest = &rest[start + "<!ENTITY".len()..];
                let end = decl_rest
                    .find('>')
                    .ok_or_else(|| XmlError::Malformed("unterminated entity".into()))?;
                if let Some(decl) = parse_entity(decl_rest[..end].trim()) {
                    entities.push(decl);
                }
                rest = &decl_rest[end + 1..];
            }
        }
    }

    Ok((entities, &document[doctype_start + doctype_end..]))
}

fn parse_entity(decl: &str) -> Option<EntityDecl> {
    let mut parts = decl.splitn(2, char::is_whitespace);
    let name = parts.next()?.to_string();
    let remainder = parts.next()?.trim();

    if let Some(system) = remainder.strip_prefix("SYSTEM") {
        let uri = unquote(system.trim())?;
        Some(EntityDecl {
            name,
            value: EntityValue::System(uri),
        })
    } else {
        let value = unquote(remainder)?;
        Some(EntityDecl {
            name,
            value: EntityValue::Literal(value),
        })
    }
}

fn unquote(s: &str) -> Option<String> {
    let s = s.trim();
    if s.len() >= 2 && (s.starts_with('"') && s.ends_with('"') || s.starts_with('\'') && s.ends_with('\'')) {
        Some(s[1..s.len() - 1].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn expands_internal_entities() {
        let doc = r#"<?xml version="1.0"?><!DOCTYPE r [<!ENTITY greet "hello">]><r>&greet; world</r>"#;
        let out = XmlParser::new().parse(doc).await.unwrap();
        assert_eq!(out, "<r>hello world</r>");
    }

    #[tokio::test]
    async fn expands_nested_entities() {
        let doc = r#"<!DOCTYPE r [<!ENTITY a "x">
<!ENTITY b "&a;&a;">]><r>&b;</r>"#;
        let out = XmlParser::new().parse(doc).await.unwrap();
        assert_eq!(out, "<r>xx</r>");
    }

    #[tokio::test]
    async fn system_entity_reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "secret-contents").unwrap();
        let doc = format!(
            r#"<!DOCTYPE r [<!ENTITY xxe SYSTEM "file://{}">]><r>&xxe;</r>"#,
            file.path().display()
        );
        let out = XmlParser::new().parse(&doc).await.unwrap();
        assert_eq!(out, "<r>secret-contents</r>");
    }

    #[tokio::test]
    async fn document_without_doctype_passes_through() {
        let out = XmlParser::new().parse("<r>plain</r>").await.unwrap();
        assert_eq!(out, "<r>plain</r>");
    }
}
