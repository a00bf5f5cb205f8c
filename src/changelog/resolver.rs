//! Document loading and child node dispatch

use super::{ChangelogDocument, ChangelogHeader, IncludeAllDirective, IncludeDirective};
use super::ResolutionContext;
use crate::changeset::ChangeSet;
use crate::error::{Error, Result};
use crate::filter::dbms_set;
use crate::node::ParsedNode;
use crate::parameters::{ChangelogParameters, ParameterScope};
use crate::parser::ParserRegistry;
use crate::precondition::PreconditionContainer;
use crate::resource::{ResourceAccessor, ResourcePlugins};
use ini::Ini;
use log::{debug, info};
use std::sync::Arc;

/// Resolves changelog documents for one target.
///
/// A resolver owns the parameter store of its resolution and borrows the
/// shared, immutable collaborators. Independent resolutions use independent
/// resolvers and can run on separate threads.
pub struct Resolver<'a> {
    pub(super) parsers: &'a ParserRegistry,
    pub(super) accessor: &'a dyn ResourceAccessor,
    pub(super) plugins: &'a ResourcePlugins,
    pub(super) parameters: ChangelogParameters,
}

impl<'a> Resolver<'a> {
    pub fn new(
        parsers: &'a ParserRegistry,
        accessor: &'a dyn ResourceAccessor,
        plugins: &'a ResourcePlugins,
        parameters: ChangelogParameters,
    ) -> Self {
        Self {
            parsers,
            accessor,
            plugins,
            parameters,
        }
    }

    pub fn parameters(&self) -> &ChangelogParameters {
        &self.parameters
    }

    pub fn into_parameters(self) -> ChangelogParameters {
        self.parameters
    }

    /// Resolve a top-level changelog and everything it includes.
    pub fn resolve(&mut self, path: &str) -> Result<ChangelogDocument> {
        self.parse(path, &ResolutionContext::top_level())
    }

    /// Select a parser for `path`, parse it and load the result under `ctx`.
    pub fn parse(&mut self, path: &str, ctx: &ResolutionContext) -> Result<ChangelogDocument> {
        let parser = self.parsers.parser_for(path, self.accessor)?;
        debug!("Parsing {} with the {} parser", path, parser.name());
        let node = parser.parse_node(path, self.accessor)?;
        self.load(path, &node, ctx)
    }

    /// Build a document from an already parsed tree.
    pub fn load(
        &mut self,
        physical_path: &str,
        node: &ParsedNode,
        ctx: &ResolutionContext,
    ) -> Result<ChangelogDocument> {
        let header = ChangelogHeader::from_node(physical_path, node, ctx)?;
        let mut document = ChangelogDocument::new(header);
        let file_path = document.file_path();

        for child in node.children() {
            let mut child = child.clone();
            self.parameters.expand_node(&mut child, Some(&file_path));
            self.handle_child_node(&mut document, &child, ctx)?;
        }
        Ok(document)
    }

    fn handle_child_node(
        &mut self,
        document: &mut ChangelogDocument,
        node: &ParsedNode,
        ctx: &ResolutionContext,
    ) -> Result<()> {
        match node.name() {
            "changeSet" => {
                if document.is_dbms_match(&self.parameters, &dbms_set(node.child_str("dbms"))) {
                    let change_set = ChangeSet::load(node, Arc::clone(document.header()))?;
                    document.add_change_set(change_set)?;
                }
            }
            "include" => {
                let directive = IncludeDirective::from_node(node)?;
                self.include(document, &directive, ctx)
                    .map_err(|source| Error::Include {
                        path: directive.file.clone(),
                        source: Box::new(source),
                    })?;
            }
            "includeAll" => {
                let directive = IncludeAllDirective::from_node(node, self.plugins)?;
                self.include_all(document, &directive, ctx)?;
            }
            "preConditions" => {
                let container = PreconditionContainer::load(node)?;
                let merged = document.take_preconditions().merged(container);
                document.set_preconditions(merged);
            }
            "property" => self.handle_property(document, node)?,
            name if node.has_children() => {
                return Err(Error::UnexpectedNode {
                    node: name.to_string(),
                    path: document.file_path(),
                });
            }
            // Childless unknown nodes are attributes of the document itself.
            _ => {}
        }
        Ok(())
    }

    fn handle_property(&mut self, document: &ChangelogDocument, node: &ParsedNode) -> Result<()> {
        let scope = ParameterScope::from_attributes(
            node.child_str("context"),
            node.child_str("labels"),
            node.child_str("dbms"),
            node.child_bool("global")?,
        );
        let changelog = document.file_path();

        let Some(file) = node.child_str("file") else {
            let name = node.child_str("name").ok_or_else(|| Error::Setup {
                message: format!("No 'name' attribute on 'property' in {}", changelog),
            })?;
            let value = node.child_str("value").unwrap_or("");
            self.parameters.set(name, value, scope, Some(&changelog));
            return Ok(());
        };

        let Some(bytes) = self.accessor.open(None, file)? else {
            info!("Could not open properties file {}", file);
            return Ok(());
        };
        let text = String::from_utf8(bytes).map_err(|e| Error::Properties {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        let properties = Ini::load_from_str(&text).map_err(|e| Error::Properties {
            file: file.to_string(),
            message: e.to_string(),
        })?;
        for (name, value) in properties.general_section().iter() {
            self.parameters.set(name, value, scope.clone(), Some(&changelog));
        }
        Ok(())
    }
}
