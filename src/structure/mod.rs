//! Syntax structure model
//!
//! A `SourceFile` owns the text of one file together with the declaration
//! tree a structure producer derived from it. The tree is a plain ordered
//! forest: nodes own their children and never point back at their parent.
//! Parents are recovered during traversal (see [`traverse`]).

pub mod scanner;
pub mod sourcekitten;
pub mod traverse;

use crate::text::{ByteRange, StringView};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use traverse::traverse_with_parent_depth_first;

/// Failure to derive a structure tree from source text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unbalanced '{delimiter}' at byte {offset}")]
    Unbalanced { delimiter: char, offset: usize },

    #[error("unterminated {what} starting at byte {offset}")]
    Unterminated { what: &'static str, offset: usize },

    #[error("invalid structure: {0}")]
    InvalidStructure(String),
}

/// Something that turns source text into a structure tree
pub trait StructureParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<StructureNode, ParseError>;
}

/// Declaration kinds, named after their `source.lang.swift.decl.*` identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Struct,
    Class,
    Enum,
    Protocol,
    Actor,
    Extension,
    ExtensionStruct,
    ExtensionClass,
    ExtensionEnum,
    ExtensionProtocol,
    EnumCase,
    EnumElement,
    Typealias,
    AssociatedType,
    VarInstance,
    VarStatic,
    VarClass,
    VarLocal,
    VarGlobal,
    VarParameter,
    FunctionMethodInstance,
    FunctionMethodStatic,
    FunctionMethodClass,
    FunctionConstructor,
    FunctionDestructor,
    FunctionSubscript,
    FunctionFree,
    FunctionAccessorGetter,
    FunctionAccessorSetter,
    FunctionAccessorDidSet,
    FunctionAccessorWillSet,
}

const KIND_IDENTIFIERS: &[(DeclarationKind, &str)] = &[
    (DeclarationKind::Struct, "source.lang.swift.decl.struct"),
    (DeclarationKind::Class, "source.lang.swift.decl.class"),
    (DeclarationKind::Enum, "source.lang.swift.decl.enum"),
    (DeclarationKind::Protocol, "source.lang.swift.decl.protocol"),
    (DeclarationKind::Actor, "source.lang.swift.decl.actor"),
    (DeclarationKind::Extension, "source.lang.swift.decl.extension"),
    (DeclarationKind::ExtensionStruct, "source.lang.swift.decl.extension.struct"),
    (DeclarationKind::ExtensionClass, "source.lang.swift.decl.extension.class"),
    (DeclarationKind::ExtensionEnum, "source.lang.swift.decl.extension.enum"),
    (DeclarationKind::ExtensionProtocol, "source.lang.swift.decl.extension.protocol"),
    (DeclarationKind::EnumCase, "source.lang.swift.decl.enumcase"),
    (DeclarationKind::EnumElement, "source.lang.swift.decl.enumelement"),
    (DeclarationKind::Typealias, "source.lang.swift.decl.typealias"),
    (DeclarationKind::AssociatedType, "source.lang.swift.decl.associatedtype"),
    (DeclarationKind::VarInstance, "source.lang.swift.decl.var.instance"),
    (DeclarationKind::VarStatic, "source.lang.swift.decl.var.static"),
    (DeclarationKind::VarClass, "source.lang.swift.decl.var.class"),
    (DeclarationKind::VarLocal, "source.lang.swift.decl.var.local"),
    (DeclarationKind::VarGlobal, "source.lang.swift.decl.var.global"),
    (DeclarationKind::VarParameter, "source.lang.swift.decl.var.parameter"),
    (DeclarationKind::FunctionMethodInstance, "source.lang.swift.decl.function.method.instance"),
    (DeclarationKind::FunctionMethodStatic, "source.lang.swift.decl.function.method.static"),
    (DeclarationKind::FunctionMethodClass, "source.lang.swift.decl.function.method.class"),
    (DeclarationKind::FunctionConstructor, "source.lang.swift.decl.function.constructor"),
    (DeclarationKind::FunctionDestructor, "source.lang.swift.decl.function.destructor"),
    (DeclarationKind::FunctionSubscript, "source.lang.swift.decl.function.subscript"),
    (DeclarationKind::FunctionFree, "source.lang.swift.decl.function.free"),
    (DeclarationKind::FunctionAccessorGetter, "source.lang.swift.decl.function.accessor.getter"),
    (DeclarationKind::FunctionAccessorSetter, "source.lang.swift.decl.function.accessor.setter"),
    (DeclarationKind::FunctionAccessorDidSet, "source.lang.swift.decl.function.accessor.didset"),
    (DeclarationKind::FunctionAccessorWillSet, "source.lang.swift.decl.function.accessor.willset"),
];

impl DeclarationKind {
    /// Parse a SourceKit kind identifier; unknown identifiers yield `None`
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        KIND_IDENTIFIERS
            .iter()
            .find(|(_, id)| *id == identifier)
            .map(|(kind, _)| *kind)
    }

    pub fn identifier(self) -> &'static str {
        KIND_IDENTIFIERS
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, id)| *id)
            .unwrap_or("source.lang.swift.decl")
    }

    /// Containers whose instances are copied by value
    pub fn is_value_type(self) -> bool {
        matches!(self, DeclarationKind::Struct | DeclarationKind::Enum)
    }
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.identifier())
    }
}

/// One syntactic construct in the structure tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureNode {
    kind: Option<DeclarationKind>,
    byte_range: Option<ByteRange>,
    body_length: Option<usize>,
    setter_accessibility: Option<String>,
    children: Vec<StructureNode>,
}

impl StructureNode {
    /// A kindless node, such as the file-level root
    pub fn root(children: Vec<StructureNode>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn new(kind: Option<DeclarationKind>, byte_range: Option<ByteRange>) -> Self {
        Self {
            kind,
            byte_range,
            ..Self::default()
        }
    }

    pub fn with_body_length(mut self, body_length: usize) -> Self {
        self.body_length = Some(body_length);
        self
    }

    pub fn with_setter_accessibility(mut self, accessibility: impl Into<String>) -> Self {
        self.setter_accessibility = Some(accessibility.into());
        self
    }

    pub fn with_children(mut self, children: Vec<StructureNode>) -> Self {
        self.children = children;
        self
    }

    pub fn kind(&self) -> Option<DeclarationKind> {
        self.kind
    }

    pub fn byte_range(&self) -> Option<ByteRange> {
        self.byte_range
    }

    pub fn offset(&self) -> Option<usize> {
        self.byte_range.map(|range| range.location)
    }

    pub fn body_length(&self) -> Option<usize> {
        self.body_length
    }

    pub fn setter_accessibility(&self) -> Option<&str> {
        self.setter_accessibility.as_deref()
    }

    pub fn children(&self) -> &[StructureNode] {
        &self.children
    }
}

/// The text of one file plus its structure tree
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: Option<PathBuf>,
    view: StringView,
    structure: Result<StructureNode, ParseError>,
}

impl SourceFile {
    /// Parse `contents` with `parser` and keep the outcome
    pub fn parse(
        path: Option<PathBuf>,
        contents: impl Into<String>,
        parser: &dyn StructureParser,
    ) -> Self {
        let view = StringView::new(contents);
        let structure = parser.parse(view.contents());
        let file = Self {
            path,
            view,
            structure,
        };
        if let Some(e) = file.parse_error() {
            log::debug!("no structure for {}: {}", file.display_path(), e);
        }
        file
    }

    /// Pair text with an already computed structure
    pub fn with_structure(
        path: Option<PathBuf>,
        contents: impl Into<String>,
        structure: StructureNode,
    ) -> Self {
        Self {
            path,
            view: StringView::new(contents),
            structure: Ok(structure),
        }
    }

    /// Build the file that results from rewriting this one.
    ///
    /// Every offset computed against `self` is stale for the returned file,
    /// so the structure is derived again from the new text.
    pub fn rewritten(&self, contents: impl Into<String>, parser: &dyn StructureParser) -> Self {
        Self::parse(self.path.clone(), contents, parser)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn display_path(&self) -> String {
        self.path
            .as_deref()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }

    pub fn view(&self) -> &StringView {
        &self.view
    }

    pub fn contents(&self) -> &str {
        self.view.contents()
    }

    /// The structure root, or `None` when the file could not be parsed
    pub fn structure(&self) -> Option<&StructureNode> {
        self.structure.as_ref().ok()
    }

    pub fn parse_error(&self) -> Option<&ParseError> {
        self.structure.as_ref().err()
    }
}
