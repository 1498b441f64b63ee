//! AST handed over by the markup parser.
//!
//! The parser itself lives outside this crate. It produces a [`Document`],
//! either directly or serialized as JSON with an internal `kind` tag:
//!
//! ```json
//! { "body": [
//!   { "kind": "import", "module": "models", "names": [{ "name": "User" }] },
//!   { "kind": "element", "name": "Window", "identifier": "main", "body": [
//!     { "kind": "bind", "attribute": "title", "code": "'Hello, %s' % user.name" }
//!   ]}
//! ]}
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub body: Vec<Node>,
}

impl Document {
    pub fn new(body: Vec<Node>) -> Self {
        Self { body }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Import(Import),
    Element(Element),
    Meta(Element),
    Default(AttributeBinding),
    Bind(AttributeBinding),
    Delegate(AttributeBinding),
    Notify(AttributeBinding),
    /// Grouping without meaning of its own; its body is visited in place.
    Block {
        #[serde(default)]
        body: Vec<Node>,
    },
    Comment {
        #[serde(default)]
        text: String,
    },
}

/// `from <module> import <names>` or `import <module> [as <alias>]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub module: String,
    #[serde(default)]
    pub alias: Option<String>,
    /// Empty for a plain module import.
    #[serde(default)]
    pub names: Vec<ImportName>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportName {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl ImportName {
    /// Name the symbol is bound under.
    pub fn bound_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// An element or meta declaration: `Label: greeting:` followed by a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeBinding {
    pub attribute: String,
    pub code: String,
}

impl Node {
    /// Nested nodes, in document order.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) | Node::Meta(element) => &element.body,
            Node::Block { body } => body,
            _ => &[],
        }
    }

    pub fn import(module: &str, names: &[&str]) -> Self {
        Node::Import(Import {
            module: module.to_string(),
            alias: None,
            names: names
                .iter()
                .map(|name| ImportName {
                    name: name.to_string(),
                    alias: None,
                })
                .collect(),
        })
    }

    pub fn element(name: &str, identifier: Option<&str>, body: Vec<Node>) -> Self {
        Node::Element(Element {
            name: name.to_string(),
            identifier: identifier.map(str::to_string),
            body,
        })
    }

    pub fn meta(name: &str, body: Vec<Node>) -> Self {
        Node::Meta(Element {
            name: name.to_string(),
            identifier: None,
            body,
        })
    }

    pub fn default(attribute: &str, code: &str) -> Self {
        Node::Default(AttributeBinding::new(attribute, code))
    }

    pub fn bind(attribute: &str, code: &str) -> Self {
        Node::Bind(AttributeBinding::new(attribute, code))
    }

    pub fn delegate(attribute: &str, code: &str) -> Self {
        Node::Delegate(AttributeBinding::new(attribute, code))
    }

    pub fn notify(attribute: &str, code: &str) -> Self {
        Node::Notify(AttributeBinding::new(attribute, code))
    }
}

impl AttributeBinding {
    pub fn new(attribute: &str, code: &str) -> Self {
        Self {
            attribute: attribute.to_string(),
            code: code.to_string(),
        }
    }
}
