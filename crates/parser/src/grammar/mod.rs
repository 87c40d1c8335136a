//! One grammar per catalog class, over the shared statement tree. The
//! helpers here are the common half of every grammar: splitting a block
//! into its keyword payload and named sub-blocks, enforcing
//! multiplicities, and preserving whatever no grammar claims.

mod data_set;
mod instrument;
mod instrument_host;
mod map_projection;
mod mission;
mod personnel;
mod reference;
mod volume;

use models::CatalogKind;

use crate::ast::{Label, Statement};
use crate::error::ParseError;
use crate::objects::{CatalogObject, OpaqueBlock, Properties, ReferenceEntry};

pub use data_set::DataSetGrammar;
pub use instrument::InstrumentGrammar;
pub use instrument_host::InstrumentHostGrammar;
pub use map_projection::MapProjectionGrammar;
pub use mission::MissionGrammar;
pub use personnel::PersonnelGrammar;
pub use reference::ReferenceGrammar;
pub use volume::VolumeGrammar;

/// A grammar recognizes one catalog class and builds its typed variant.
pub trait Grammar: Sync {
    fn kind(&self) -> CatalogKind;

    /// Names the root `OBJECT = …` block(s) this grammar accepts.
    fn root_names(&self) -> &'static [&'static str];

    fn parse(&self, label: &Label, file: &str) -> Result<CatalogObject, ParseError>;
}

/// The fixed order the registry tries grammars in when the filename is
/// ambiguous. More constrained classes come first so that a permissive
/// grammar never shadows a specific one.
pub(crate) static GRAMMARS: &[&dyn Grammar] = &[
    &MissionGrammar,
    &InstrumentHostGrammar,
    &InstrumentGrammar,
    &DataSetGrammar,
    &MapProjectionGrammar,
    &VolumeGrammar,
    &PersonnelGrammar,
    &ReferenceGrammar,
];

pub(crate) fn grammar_for(kind: CatalogKind) -> &'static dyn Grammar {
    match kind {
        CatalogKind::Mission => &MissionGrammar,
        CatalogKind::InstrumentHost => &InstrumentHostGrammar,
        CatalogKind::Instrument => &InstrumentGrammar,
        CatalogKind::DataSet => &DataSetGrammar,
        CatalogKind::DataSetMapProjection => &MapProjectionGrammar,
        CatalogKind::Personnel => &PersonnelGrammar,
        CatalogKind::Reference => &ReferenceGrammar,
        CatalogKind::VolumeDescriptor => &VolumeGrammar,
    }
}

/// A named sub-block, still in statement form.
#[derive(Debug, Clone)]
pub(crate) struct ChildBlock {
    pub name: String,
    pub statements: Vec<Statement>,
    pub line: u32,
}

/// Splits a statement list into its keyword payload and its sub-blocks.
pub(crate) fn split(statements: &[Statement]) -> (Properties, Vec<ChildBlock>) {
    let mut properties = Properties::default();
    let mut children = Vec::new();
    for statement in statements {
        match statement {
            Statement::Assignment { key, value, .. } => {
                properties.insert(key.clone(), value.clone());
            }
            Statement::Object { name, statements, line } => children.push(ChildBlock {
                name: name.clone(),
                statements: statements.clone(),
                line: *line,
            }),
        }
    }
    (properties, children)
}

/// A leaf sub-object: its keywords, with any unexpected nesting preserved
/// opaquely.
pub(crate) fn leaf(block: ChildBlock, opaque: &mut Vec<OpaqueBlock>) -> Properties {
    let (properties, children) = split(&block.statements);
    for child in children {
        tracing::warn!(block = %block.name, nested = %child.name, "unexpected nested sub-object");
        opaque.push(opaque_block(child));
    }
    properties
}

pub(crate) fn opaque_block(block: ChildBlock) -> OpaqueBlock {
    let (properties, children) = split(&block.statements);
    OpaqueBlock {
        name: block.name,
        properties,
        blocks: children.into_iter().map(opaque_block).collect(),
    }
}

/// Sub-object collector with multiplicity enforcement. Blocks left over
/// after a grammar has taken what it knows are preserved opaquely and
/// reported once.
pub(crate) struct SubObjects<'a> {
    file: &'a str,
    kind: CatalogKind,
    children: Vec<Option<ChildBlock>>,
}

impl<'a> SubObjects<'a> {
    pub fn new(file: &'a str, kind: CatalogKind, children: Vec<ChildBlock>) -> Self {
        Self {
            file,
            kind,
            children: children.into_iter().map(Some).collect(),
        }
    }

    fn take(&mut self, names: &[&str]) -> Vec<ChildBlock> {
        let mut taken = Vec::new();
        for slot in self.children.iter_mut() {
            let matches = slot
                .as_ref()
                .map(|c| names.iter().any(|n| c.name.eq_ignore_ascii_case(n)))
                .unwrap_or(false);
            if matches {
                taken.extend(slot.take());
            }
        }
        taken
    }

    /// Exactly one of `names`.
    pub fn take_one(&mut self, names: &[&str], canonical: &'static str) -> Result<ChildBlock, ParseError> {
        let mut taken = self.take(names);
        match taken.len() {
            0 => Err(ParseError::MissingSubObject {
                file: self.file.to_string(),
                kind: self.kind,
                name: canonical,
            }),
            1 => Ok(taken.remove(0)),
            _ => Err(ParseError::DuplicateSubObject {
                file: self.file.to_string(),
                line: taken[1].line,
                kind: self.kind,
                name: canonical.to_string(),
            }),
        }
    }

    /// Zero or one of `names`.
    pub fn take_at_most_one(
        &mut self,
        names: &[&str],
        canonical: &'static str,
    ) -> Result<Option<ChildBlock>, ParseError> {
        let mut taken = self.take(names);
        match taken.len() {
            0 => Ok(None),
            1 => Ok(Some(taken.remove(0))),
            _ => Err(ParseError::DuplicateSubObject {
                file: self.file.to_string(),
                line: taken[1].line,
                kind: self.kind,
                name: canonical.to_string(),
            }),
        }
    }

    /// Zero or more of `names`, in file order.
    pub fn take_many(&mut self, names: &[&str]) -> Vec<ChildBlock> {
        self.take(names)
    }

    /// One or more of `names`.
    pub fn take_one_or_more(
        &mut self,
        names: &[&str],
        canonical: &'static str,
    ) -> Result<Vec<ChildBlock>, ParseError> {
        let taken = self.take(names);
        if taken.is_empty() {
            return Err(ParseError::MissingSubObject {
                file: self.file.to_string(),
                kind: self.kind,
                name: canonical,
            });
        }
        Ok(taken)
    }

    /// Whatever no rule claimed, preserved opaquely.
    pub fn into_opaque(self) -> Vec<OpaqueBlock> {
        let mut opaque = Vec::new();
        for child in self.children.into_iter().flatten() {
            tracing::warn!(
                file = self.file,
                kind = %self.kind,
                block = %child.name,
                "unknown sub-object retained opaquely"
            );
            opaque.push(opaque_block(child));
        }
        opaque
    }
}

/// Splits a file into its header keywords and root object blocks, and
/// selects the roots this grammar accepts. Files with no acceptable root
/// are rejected, which is what lets the registry probe grammars in order.
pub(crate) fn take_roots(
    label: &Label,
    file: &str,
    grammar: &dyn Grammar,
) -> Result<(Properties, Vec<ChildBlock>), ParseError> {
    let (header, children) = split(&label.statements);
    let (roots, strays): (Vec<_>, Vec<_>) = children.into_iter().partition(|c| {
        grammar
            .root_names()
            .iter()
            .any(|n| c.name.eq_ignore_ascii_case(n))
    });
    if roots.is_empty() {
        return Err(ParseError::MissingRootObject {
            file: file.to_string(),
            expected: grammar.root_names()[0],
        });
    }
    for stray in &strays {
        tracing::warn!(file, block = %stray.name, "ignoring stray root object");
    }
    Ok((header, roots))
}

/// Reference sub-objects are shaped identically across classes.
pub(crate) fn reference_entries(
    blocks: Vec<ChildBlock>,
    opaque: &mut Vec<OpaqueBlock>,
) -> Vec<ReferenceEntry> {
    blocks
        .into_iter()
        .map(|b| ReferenceEntry { properties: leaf(b, opaque) })
        .collect()
}
