//! Condition expression tree.

use std::fmt;

/// Comparison operators understood by the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of a guard expression.
///
/// Nodes are immutable text-producing trees. Binary logical operators always
/// parenthesize both operands, so rendering never needs a precedence table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionNode {
    /// Raw expression text. The description is only emitted as a comment by
    /// [`ConditionNode::render_multiline`].
    Literal {
        text: String,
        description: Option<String>,
    },
    And(Box<ConditionNode>, Box<ConditionNode>),
    Or(Box<ConditionNode>, Box<ConditionNode>),
    Not(Box<ConditionNode>),
    Comparison {
        left: Box<ConditionNode>,
        op: ComparisonOp,
        right: Box<ConditionNode>,
    },
    FunctionCall {
        name: String,
        args: Vec<ConditionNode>,
    },
    /// Sugar for `contains(array, value)`.
    Contains {
        array: Box<ConditionNode>,
        value: Box<ConditionNode>,
    },
    Ternary {
        condition: Box<ConditionNode>,
        if_true: Box<ConditionNode>,
        if_false: Box<ConditionNode>,
    },
    /// Dotted path, including `*` projection segments such as `a.b.*.name`.
    PropertyAccess(String),
    StringLiteral(String),
    NumberLiteral(String),
    BooleanLiteral(bool),
    /// N-ary OR.
    Disjunction {
        terms: Vec<ConditionNode>,
        multiline: bool,
    },
}

impl ConditionNode {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal {
            text: text.into(),
            description: None,
        }
    }

    pub fn described(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self::Literal {
            text: text.into(),
            description: Some(description.into()),
        }
    }

    pub fn and(self, right: ConditionNode) -> Self {
        Self::And(Box::new(self), Box::new(right))
    }

    pub fn or(self, right: ConditionNode) -> Self {
        Self::Or(Box::new(self), Box::new(right))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn comparison(left: ConditionNode, op: ComparisonOp, right: ConditionNode) -> Self {
        Self::Comparison {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<ConditionNode>) -> Self {
        Self::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn contains(array: ConditionNode, value: ConditionNode) -> Self {
        Self::Contains {
            array: Box::new(array),
            value: Box::new(value),
        }
    }

    pub fn ternary(
        condition: ConditionNode,
        if_true: ConditionNode,
        if_false: ConditionNode,
    ) -> Self {
        Self::Ternary {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    pub fn property(path: impl Into<String>) -> Self {
        Self::PropertyAccess(path.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::StringLiteral(value.into())
    }

    pub fn number(text: impl Into<String>) -> Self {
        Self::NumberLiteral(text.into())
    }

    pub fn boolean(value: bool) -> Self {
        Self::BooleanLiteral(value)
    }

    pub fn disjunction(terms: Vec<ConditionNode>) -> Self {
        Self::Disjunction {
            terms,
            multiline: false,
        }
    }

    pub fn multiline_disjunction(terms: Vec<ConditionNode>) -> Self {
        Self::Disjunction {
            terms,
            multiline: true,
        }
    }

    /// Description attached to this node, if any.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Literal {
                description: Some(description),
                ..
            } if !description.is_empty() => Some(description.as_str()),
            _ => None,
        }
    }

    /// Render the node as expression text.
    ///
    /// A disjunction built in multiline mode renders through
    /// [`ConditionNode::render_multiline`].
    pub fn render(&self) -> String {
        match self {
            Self::Literal { text, .. } => text.clone(),
            Self::And(left, right) => format!("({}) && ({})", left.render(), right.render()),
            Self::Or(left, right) => format!("({}) || ({})", left.render(), right.render()),
            Self::Not(child) => format!("!({})", child.render()),
            Self::Comparison { left, op, right } => {
                format!("{} {} {}", left.render(), op, right.render())
            }
            Self::FunctionCall { name, args } => render_call(name, args.iter()),
            Self::Contains { array, value } => {
                render_call("contains", [array.as_ref(), value.as_ref()].into_iter())
            }
            Self::Ternary {
                condition,
                if_true,
                if_false,
            } => format!(
                "{} ? {} : {}",
                condition.render(),
                if_true.render(),
                if_false.render()
            ),
            Self::PropertyAccess(path) => path.clone(),
            Self::StringLiteral(value) => format!("'{}'", value.replace('\'', "''")),
            Self::NumberLiteral(text) => text.clone(),
            Self::BooleanLiteral(value) => value.to_string(),
            Self::Disjunction { terms, multiline } => {
                if *multiline {
                    render_terms_multiline(terms)
                } else {
                    terms
                        .iter()
                        .map(ConditionNode::render)
                        .collect::<Vec<_>>()
                        .join(" || ")
                }
            }
        }
    }

    /// Render with one disjunction term per line, each preceded by a
    /// `# description` comment when the term carries one.
    pub fn render_multiline(&self) -> String {
        match self {
            Self::Disjunction { terms, .. } => render_terms_multiline(terms),
            other => other.render(),
        }
    }
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn render_call<'a>(name: &str, args: impl Iterator<Item = &'a ConditionNode>) -> String {
    let args: Vec<String> = args.map(ConditionNode::render).collect();
    format!("{}({})", name, args.join(", "))
}

fn render_terms_multiline(terms: &[ConditionNode]) -> String {
    let mut lines = Vec::new();
    for (i, term) in terms.iter().enumerate() {
        if let Some(description) = term.description() {
            lines.push(format!("# {description}"));
        }
        let mut line = term.render();
        if i + 1 < terms.len() {
            line.push_str(" ||");
        }
        lines.push(line);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lit(text: &str) -> ConditionNode {
        ConditionNode::literal(text)
    }

    #[test]
    fn test_and_or_parenthesize_both_operands() {
        let node = lit("a").and(lit("b").or(lit("c")));
        assert_eq!(node.render(), "(a) && ((b) || (c))");
    }

    #[test]
    fn test_not() {
        assert_eq!(lit("cancelled()").not().render(), "!(cancelled())");
    }

    #[test]
    fn test_comparison_has_no_parentheses() {
        let node = ConditionNode::comparison(
            ConditionNode::property("github.event.issue.number"),
            ComparisonOp::Gt,
            ConditionNode::number("10"),
        );
        assert_eq!(node.render(), "github.event.issue.number > 10");
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(ConditionNode::call("always", vec![]).render(), "always()");
        assert_eq!(
            ConditionNode::call(
                "startsWith",
                vec![
                    ConditionNode::property("github.ref"),
                    ConditionNode::string("refs/tags/")
                ]
            )
            .render(),
            "startsWith(github.ref, 'refs/tags/')"
        );
    }

    #[test]
    fn test_contains_is_function_sugar() {
        let node = ConditionNode::contains(
            ConditionNode::property("github.event.pull_request.labels.*.name"),
            ConditionNode::string("bug"),
        );
        assert_eq!(
            node.render(),
            "contains(github.event.pull_request.labels.*.name, 'bug')"
        );
    }

    #[test]
    fn test_ternary() {
        let node = ConditionNode::ternary(
            ConditionNode::boolean(true),
            ConditionNode::string("yes"),
            ConditionNode::string("no"),
        );
        assert_eq!(node.render(), "true ? 'yes' : 'no'");
    }

    #[test]
    fn test_string_literal_escapes_quotes() {
        assert_eq!(ConditionNode::string("main").render(), "'main'");
        assert_eq!(ConditionNode::string("it's").render(), "'it''s'");
    }

    #[test]
    fn test_literal_description_not_rendered_inline() {
        let node = ConditionNode::described("a == b", "compare");
        assert_eq!(node.render(), "a == b");
    }

    #[test]
    fn test_disjunction_single_line() {
        assert_eq!(ConditionNode::disjunction(vec![]).render(), "");
        assert_eq!(ConditionNode::disjunction(vec![lit("a")]).render(), "a");
        assert_eq!(
            ConditionNode::disjunction(vec![lit("a"), lit("b"), lit("c")]).render(),
            "a || b || c"
        );
    }

    #[test]
    fn test_disjunction_multiline() {
        let node = ConditionNode::multiline_disjunction(vec![
            ConditionNode::described("a", "first"),
            lit("b"),
            ConditionNode::described("c", "third"),
        ]);
        let expected = "# first\na ||\nb ||\n# third\nc";
        assert_eq!(node.render_multiline(), expected);
        assert_eq!(node.render(), expected);
    }

    #[test]
    fn test_empty_description_is_omitted() {
        let node = ConditionNode::multiline_disjunction(vec![
            ConditionNode::described("a", ""),
            lit("b"),
        ]);
        assert_eq!(node.render_multiline(), "a ||\nb");
    }

    #[test]
    fn test_render_is_deterministic() {
        let node = lit("a").and(lit("b")).or(lit("c").not());
        assert_eq!(node.render(), node.clone().render());
        assert_eq!(node.to_string(), "((a) && (b)) || (!(c))");
    }
}
