//! WHERE/HAVING predicate trees.
//!
//! A [`PredicateTree`] is an ordered list of [`Predicate`] nodes. Each node is either a raw
//! clause with its bound arguments or a nested group rendered in parentheses. Rendering walks
//! the tree once and emits clause text and arguments together, so the argument vector always
//! lines up with the `?` placeholders in the text.
//!
//! ```ignore
//! let mut tree = PredicateTree::new();
//! tree.and("status = ?", args!["active"]);
//! tree.and_group(|g| {
//!     g.and("age > ?", args![18]);
//!     g.or("vip = ?", args![true]);
//! });
//! let (sql, args) = tree.render();
//! assert_eq!(sql, "status = ? AND (age > ? OR vip = ?)");
//! ```

use crate::value::Value;

/// Logical connector placed before a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    pub fn as_sql(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// One node of a predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    connector: Connector,
    clause: String,
    nested: Vec<Predicate>,
    args: Vec<Value>,
}

impl Predicate {
    fn clause(connector: Connector, clause: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            connector,
            clause: clause.into(),
            nested: Vec::new(),
            args,
        }
    }

    fn group(connector: Connector, nested: Vec<Predicate>) -> Self {
        Self {
            connector,
            clause: String::new(),
            nested,
            args: Vec::new(),
        }
    }

    pub fn connector(&self) -> Connector {
        self.connector
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn nested(&self) -> &[Predicate] {
        &self.nested
    }
}

/// Ordered, possibly nested list of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateTree {
    nodes: Vec<Predicate>,
}

impl PredicateTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when rendering would produce no clause text.
    pub fn is_empty(&self) -> bool {
        !self.nodes.iter().any(Self::node_emits)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Predicate] {
        &self.nodes
    }

    /// Append `clause` joined with AND.
    pub fn and(&mut self, clause: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.nodes
            .push(Predicate::clause(Connector::And, clause, args));
        self
    }

    /// Append `clause` joined with OR.
    pub fn or(&mut self, clause: impl Into<String>, args: Vec<Value>) -> &mut Self {
        self.nodes
            .push(Predicate::clause(Connector::Or, clause, args));
        self
    }

    /// Append a parenthesized sub-tree joined with AND.
    pub fn and_group<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut PredicateTree),
    {
        self.push_group(Connector::And, f)
    }

    /// Append a parenthesized sub-tree joined with OR.
    pub fn or_group<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut PredicateTree),
    {
        self.push_group(Connector::Or, f)
    }

    /// Attach an already built sub-tree.
    pub fn push_tree(&mut self, connector: Connector, tree: PredicateTree) -> &mut Self {
        if !tree.nodes.is_empty() {
            self.nodes.push(Predicate::group(connector, tree.nodes));
        }
        self
    }

    /// Append arguments without clause text.
    ///
    /// The node renders as nothing but its arguments take their place in the output order.
    pub fn push_args(&mut self, args: Vec<Value>) -> &mut Self {
        if !args.is_empty() {
            self.nodes
                .push(Predicate::clause(Connector::And, String::new(), args));
        }
        self
    }

    fn push_group<F>(&mut self, connector: Connector, f: F) -> &mut Self
    where
        F: FnOnce(&mut PredicateTree),
    {
        let mut sub = PredicateTree::new();
        f(&mut sub);
        self.push_tree(connector, sub)
    }

    /// Render to clause text and the matching argument list.
    pub fn render(&self) -> (String, Vec<Value>) {
        let mut args = Vec::new();
        let sql = render_level(&self.nodes, &mut args);
        (sql, args)
    }

    /// Render and append the arguments to an existing list.
    pub fn render_into(&self, args: &mut Vec<Value>) -> String {
        render_level(&self.nodes, args)
    }

    fn node_emits(node: &Predicate) -> bool {
        if node.nested.is_empty() {
            !node.clause.is_empty()
        } else {
            node.nested.iter().any(Self::node_emits)
        }
    }
}

fn render_level(nodes: &[Predicate], args: &mut Vec<Value>) -> String {
    let mut sql = String::new();
    for node in nodes {
        let fragment = if node.nested.is_empty() {
            node.clause.clone()
        } else {
            let inner = render_level(&node.nested, args);
            if inner.is_empty() {
                inner
            } else {
                format!("({inner})")
            }
        };
        args.extend(node.args.iter().cloned());

        if fragment.is_empty() {
            continue;
        }
        if !sql.is_empty() {
            sql.push(' ');
            sql.push_str(node.connector.as_sql());
            sql.push(' ');
        }
        sql.push_str(&fragment);
    }
    sql
}

/// Count `?` placeholders outside single-quoted literals.
#[cfg(test)]
pub(crate) fn count_placeholders(sql: &str) -> usize {
    let mut in_quote = false;
    sql.chars()
        .filter(|&c| {
            if c == '\'' {
                in_quote = !in_quote;
            }
            c == '?' && !in_quote
        })
        .count()
}
