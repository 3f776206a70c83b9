//! XML plumbing shared by the chain, envelope and complement modules.
pub(crate) mod constants;

use libxml::{
    parser::{Parser, ParserOptions},
    tree::{Document, Node, c14n},
};
use thiserror::Error;

use constants::XML_NS;

// `xml:*` attributes inclusive C14N carries over from ancestors onto the apex
// of a document subset.
const INHERITED_XML_ATTRIBUTES: [&str; 4] = ["base", "id", "lang", "space"];

/// Errors emitted by the low-level XML helpers.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error: {0}")]
    Parse(String),
    #[error("Failed to canonicalize xml: {0}")]
    Canonicalization(String),
    #[error("Failed to import fragment: {0}")]
    Import(String),
}

/// Parse a complete document. Recovery and network access are disabled, so
/// malformed input is rejected instead of silently patched.
pub(crate) fn parse_document(input: impl AsRef<[u8]>) -> Result<Document, XmlError> {
    let options = ParserOptions {
        recover: false,
        no_net: true,
        ..Default::default()
    };
    let doc = Parser::default()
        .parse_string_with_options(input, options)
        .map_err(|e| XmlError::Parse(format!("{e:?}")))?;
    if doc.get_root_element().is_none() {
        return Err(XmlError::Parse("document has no root element".into()));
    }
    Ok(doc)
}

/// Inclusive C14N 1.0 without comments over a copy of the whole document.
pub(crate) fn canonicalize(doc: &Document) -> Result<String, XmlError> {
    let copy = doc
        .dup()
        .map_err(|e| XmlError::Canonicalization(format!("failed to duplicate xml: {e:?}")))?;
    canonicalize_owned(&copy)
}

pub(crate) fn canonicalize_owned(doc: &Document) -> Result<String, XmlError> {
    let canon_opts = c14n::CanonicalizationOptions {
        mode: c14n::CanonicalizationMode::Canonical1_0,
        inclusive_ns_prefixes: vec![],
        with_comments: false,
    };
    doc.canonicalize(canon_opts, None)
        .map_err(|e| XmlError::Canonicalization(format!("{e:?}")))
}

/// Canonical form of `node` as it appears in context: the subtree is
/// re-parsed on its own carrying every namespace declaration in scope.
pub(crate) fn canonicalize_in_context(doc: &Document, node: &Node) -> Result<String, XmlError> {
    let fragment = parse_document(standalone_fragment(doc, node))?;
    canonicalize_owned(&fragment)
}

pub(crate) fn import_fragment(doc: &mut Document, xml: &str) -> Result<Node, XmlError> {
    let fragment = parse_document(xml)?;
    let mut node = fragment
        .get_root_element()
        .ok_or_else(|| XmlError::Import("missing fragment root".into()))?;
    node.unlink();
    doc.import_node(&mut node)
        .map_err(|e| XmlError::Import(format!("{e:?}")))
}

pub(crate) fn node_namespace(node: &Node) -> Option<String> {
    node.get_namespace().map(|ns| ns.get_href())
}

pub(crate) fn child_elements_named(node: &Node, local_name: &str) -> Vec<Node> {
    node.get_child_elements()
        .into_iter()
        .filter(|child| child.get_name() == local_name)
        .collect()
}

pub(crate) fn first_child_named(node: &Node, local_name: &str) -> Option<Node> {
    child_elements_named(node, local_name).into_iter().next()
}

/// Serialize `node` with the namespace declarations it inherits from its
/// ancestors written onto its own start tag.
pub(crate) fn standalone_fragment(doc: &Document, node: &Node) -> String {
    let serialized = doc.node_to_string(node);
    let own: Vec<String> = node
        .get_namespace_declarations()
        .iter()
        .map(|ns| ns.get_prefix())
        .collect();

    let mut inherited: Vec<(String, String)> = Vec::new();
    let mut xml_attributes: Vec<(&str, String)> = Vec::new();
    let mut current = node.get_parent();
    while let Some(parent) = current {
        if !parent.is_element_node() {
            break;
        }
        for ns in parent.get_namespace_declarations() {
            let prefix = ns.get_prefix();
            if own.contains(&prefix) || inherited.iter().any(|(p, _)| *p == prefix) {
                continue;
            }
            inherited.push((prefix, ns.get_href()));
        }
        for name in INHERITED_XML_ATTRIBUTES {
            if xml_attributes.iter().any(|(n, _)| *n == name)
                || node.get_attribute_ns(name, XML_NS).is_some()
            {
                continue;
            }
            if let Some(value) = parent.get_attribute_ns(name, XML_NS) {
                xml_attributes.push((name, value));
            }
        }
        current = parent.get_parent();
    }

    let qualified_name = match node.get_namespace().map(|ns| ns.get_prefix()) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{}", node.get_name()),
        _ => node.get_name(),
    };
    let open_tag = format!("<{qualified_name}");
    let mut declarations = String::new();
    for (prefix, href) in inherited {
        // an empty default namespace undeclaration is implicit at the top level
        if prefix.is_empty() && href.is_empty() {
            continue;
        }
        if prefix.is_empty() {
            declarations.push_str(&format!(" xmlns=\"{}\"", escape_attribute(&href)));
        } else {
            declarations.push_str(&format!(" xmlns:{prefix}=\"{}\"", escape_attribute(&href)));
        }
    }
    for (name, value) in xml_attributes {
        declarations.push_str(&format!(" xml:{name}=\"{}\"", escape_attribute(&value)));
    }
    match serialized.strip_prefix(&open_tag) {
        Some(rest) => format!("{open_tag}{declarations}{rest}"),
        None => serialized,
    }
}

pub(crate) fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
