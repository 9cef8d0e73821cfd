//! Program model exchanged with the extraction and writing collaborators.
//!
//! The input and the filtered output share this shape. Payloads are opaque:
//! the shrinker never looks inside them and copies retained ones unchanged.

use serde::{Deserialize, Serialize};

/// Name of the static initializer method
pub const STATIC_INITIALIZER: &str = "<clinit>";

/// Name of instance constructors
pub const CONSTRUCTOR: &str = "<init>";

/// A whole program: every class the collaborator extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "P: Serialize",
    deserialize = "P: Deserialize<'de>"
))]
pub struct Program<P = serde_json::Value> {
    #[serde(default)]
    pub classes: Vec<ClassDef<P>>,
}

impl<P> Program<P> {
    pub fn new(classes: Vec<ClassDef<P>>) -> Self {
        Self { classes }
    }

    /// Count of (classes, methods, fields)
    pub fn counts(&self) -> (usize, usize, usize) {
        let methods = self
            .classes
            .iter()
            .flat_map(|c| &c.members)
            .filter(|m| m.kind == MemberKind::Method)
            .count();
        let fields = self
            .classes
            .iter()
            .flat_map(|c| &c.members)
            .filter(|m| m.kind == MemberKind::Field)
            .count();
        (self.classes.len(), methods, fields)
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassDef<P>> {
        self.classes.iter().find(|c| c.name == name)
    }
}

impl<P> Default for Program<P> {
    fn default() -> Self {
        Self { classes: Vec::new() }
    }
}

/// A class or interface definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "P: Serialize",
    deserialize = "P: Deserialize<'de>"
))]
pub struct ClassDef<P = serde_json::Value> {
    /// Fully qualified name (e.g., "com.example.app.MainActivity")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,

    /// Opaque annotation tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,

    #[serde(default)]
    pub members: Vec<MemberDef<P>>,

    /// Absent in the input means absent in the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
}

impl<P> ClassDef<P> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            members: Vec::new(),
            payload: None,
        }
    }

    pub fn with_superclass(mut self, name: impl Into<String>) -> Self {
        self.superclass = Some(name.into());
        self
    }

    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    pub fn with_annotation(mut self, tag: impl Into<String>) -> Self {
        self.annotations.push(tag.into());
        self
    }

    pub fn with_member(mut self, member: MemberDef<P>) -> Self {
        self.members.push(member);
        self
    }

    pub fn find_member(&self, name: &str, descriptor: &str) -> Option<&MemberDef<P>> {
        self.members
            .iter()
            .find(|m| m.name == name && m.descriptor == descriptor)
    }

    pub fn has_member_named(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }
}

/// Kind of class member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Method,
    Field,
}

/// Declared visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    #[serde(alias = "package-private")]
    Package,
    Private,
}

/// A method or field declared on a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "P: Serialize",
    deserialize = "P: Deserialize<'de>"
))]
pub struct MemberDef<P = serde_json::Value> {
    pub kind: MemberKind,

    pub name: String,

    /// JVM descriptor, e.g. "()V" or "I"
    pub descriptor: String,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default, rename = "static")]
    pub is_static: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,

    /// Symbols referenced from this member's code
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SymbolRef>,

    /// Absent in the input means absent in the output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
}

impl<P> MemberDef<P> {
    pub fn method(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self::new(MemberKind::Method, name.into(), descriptor.into())
    }

    pub fn field(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self::new(MemberKind::Field, name.into(), descriptor.into())
    }

    fn new(kind: MemberKind, name: String, descriptor: String) -> Self {
        Self {
            kind,
            name,
            descriptor,
            visibility: Visibility::default(),
            is_static: false,
            annotations: Vec::new(),
            references: Vec::new(),
            payload: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_annotation(mut self, tag: impl Into<String>) -> Self {
        self.annotations.push(tag.into());
        self
    }

    pub fn with_reference(mut self, reference: SymbolRef) -> Self {
        self.references.push(reference);
        self
    }

    pub fn with_payload(mut self, payload: P) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Whether calls to this method dispatch virtually
    pub fn is_virtual(&self) -> bool {
        self.kind == MemberKind::Method
            && !self.is_static
            && self.visibility != Visibility::Private
            && self.name != CONSTRUCTOR
            && self.name != STATIC_INITIALIZER
    }

    /// Qualified name in `Owner.name:descriptor` form
    pub fn qualified_name(&self, owner: &str) -> String {
        member_key(owner, &self.name, &self.descriptor)
    }
}

/// A reference extracted from code: a class, or a member of a class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef {
    pub owner: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
}

impl SymbolRef {
    pub fn class(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: None,
            descriptor: None,
        }
    }

    pub fn member(
        owner: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: Some(name.into()),
            descriptor: Some(descriptor.into()),
        }
    }

    /// Qualified name of the referenced symbol
    pub fn qualified_name(&self) -> String {
        match &self.name {
            Some(name) => member_key(&self.owner, name, self.descriptor.as_deref().unwrap_or("")),
            None => self.owner.clone(),
        }
    }
}

/// Build the `Owner.name:descriptor` key keep rules match against
pub fn member_key(owner: &str, name: &str, descriptor: &str) -> String {
    format!("{}.{}:{}", owner, name, descriptor)
}
