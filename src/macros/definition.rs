//! Turning a parsed `macro` form into a reusable template.

use log::debug;

use crate::{
    ast::{Ast, Kind, Span},
    diagnostics::DlError,
    macros::application::{MacroApplication, Param},
    traverse::walk,
};

/// One `(pattern...) body` rule of a macro definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub pattern: Vec<String>,
    pub body: Ast,
}

/// A registered macro.
///
/// Built from a tree of the shape
/// `macro(id name, id_list formals, id terminator, transform(pattern, body)*)`.
/// The template is the body of the first transform rule; it is cloned for
/// every use site and never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    name: String,
    parameters: Vec<String>,
    terminator: String,
    template: Ast,
    rules: Vec<Transform>,
    span: Span,
}

fn id_text(node: Option<&Ast>, what: &str, fallback: Span) -> Result<String, DlError> {
    match node {
        Some(node) if node.kind() == Kind::Id => Ok(node.text().unwrap_or_default().to_string()),
        Some(node) => Err(DlError::malformed_macro(
            format!("expected an identifier for the {what}, found <{}>", node.kind()),
            node.span(),
        )),
        None => Err(DlError::malformed_macro(format!("missing {what}"), fallback)),
    }
}

impl Macro {
    pub fn from_definition(definition: &Ast) -> Result<Self, DlError> {
        let span = definition.span();
        if definition.kind() != Kind::Macro {
            return Err(DlError::malformed_macro(
                format!("expected a macro definition, found <{}>", definition.kind()),
                span,
            ));
        }
        let children = definition.children();
        let name = id_text(children.first(), "macro name", span)?;

        let formals = match children.get(1) {
            Some(list) if list.kind() == Kind::IdList => list,
            _ => {
                return Err(DlError::malformed_macro(
                    format!("macro '{name}' is missing its parameter list"),
                    span,
                ))
            }
        };
        let mut parameters: Vec<String> = Vec::with_capacity(formals.children().len());
        for formal in formals.children() {
            let formal_name = id_text(Some(formal), "parameter", span)?;
            if parameters.contains(&formal_name) {
                return Err(DlError::malformed_macro(
                    format!("duplicate parameter '{formal_name}' in macro '{name}'"),
                    formal.span(),
                ));
            }
            parameters.push(formal_name);
        }

        let terminator = id_text(children.get(2), "terminator", span)?;

        let mut rules = Vec::new();
        for rule in children.iter().skip(3) {
            match rule.children() {
                [pattern, body] if rule.kind() == Kind::Transform => rules.push(Transform {
                    pattern: pattern
                        .children()
                        .iter()
                        .filter_map(|id| id.text().map(str::to_string))
                        .collect(),
                    body: body.clone(),
                }),
                _ => {
                    return Err(DlError::malformed_macro(
                        format!("macro '{name}' has a malformed transform rule"),
                        rule.span(),
                    ))
                }
            }
        }

        let Some(first) = rules.first() else {
            return Err(DlError::malformed_macro(
                format!("macro '{name}' has no transform rule"),
                span,
            )
            .with_help("add a rule such as `(x) x` before `end`"));
        };
        let template = first.body.clone();
        if rules.len() > 1 {
            debug!(
                "macro '{}' declares {} transform rules; only the first is expanded",
                name,
                rules.len()
            );
        }

        Ok(Self {
            name,
            parameters,
            terminator,
            template,
            rules,
            span,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Carried from the definition; use sites are not checked against it.
    pub fn terminator(&self) -> &str {
        &self.terminator
    }

    pub fn template(&self) -> &Ast {
        &self.template
    }

    pub fn rules(&self) -> &[Transform] {
        &self.rules
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Pairs formals with actuals by position.
    pub fn bind(&self, actuals: Vec<Ast>, site: Span) -> Result<Vec<Param>, DlError> {
        if actuals.len() != self.parameters.len() {
            return Err(DlError::arity(
                self.name.clone(),
                self.parameters.len(),
                actuals.len(),
                site,
            )
            .with_help(format!(
                "'{}' is defined with parameters ({})",
                self.name,
                self.parameters.join(" ")
            )));
        }
        Ok(self
            .parameters
            .iter()
            .cloned()
            .zip(actuals)
            .map(|(formal, bound)| Param::new(formal, bound))
            .collect())
    }

    /// Instantiates the template with `actuals` substituted for the formals.
    ///
    /// Arity is checked before anything is cloned; on error nothing about the
    /// macro changes.
    pub fn apply(&self, actuals: Vec<Ast>, site: Span) -> Result<Ast, DlError> {
        let params = self.bind(actuals, site)?;
        let mut expansion = self.template.clone();
        let mut application = MacroApplication::new(&params);
        if let Err(never) = walk(&mut expansion, &mut application) {
            match never {}
        }
        debug!(
            "applied macro '{}' ({} substitution(s))",
            self.name,
            application.substitutions()
        );
        Ok(expansion)
    }
}
