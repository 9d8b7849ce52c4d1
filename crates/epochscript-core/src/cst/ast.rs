//! Typed AST layer over CST
//!
//! Ergonomic, type-safe wrappers over the raw CST nodes. Every wrapper is a
//! view: it holds the red node and reads its children on demand, so the
//! lossless tree stays the single source of truth.
//!
//! Atoms (names and literals) are single tokens in the tree, which is why
//! [`Expr`] is cast from a [`EpochSyntaxElement`] rather than from a node.
//!
//! # Example
//!
//! ```
//! use epochscript_core::cst::ast::{AstNode, Expr, Program, Statement};
//! use epochscript_core::parse;
//!
//! let tree = parse("fast, slow = bands(period=20)(src.c)\n");
//! let program = Program::cast(tree.syntax()).unwrap();
//! let Some(Statement::Assignment(assignment)) = program.statements().next() else {
//!     panic!("expected an assignment");
//! };
//! let names: Vec<_> = assignment.target_names().collect();
//! assert_eq!(names, ["fast", "slow"]);
//! assert!(matches!(assignment.value(), Some(Expr::Call(call)) if call.is_two_stage()));
//! ```

use super::literal::{LiteralValue, literal_value};
use super::{EpochSyntaxElement, EpochSyntaxKind, EpochSyntaxNode, EpochSyntaxToken};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: EpochSyntaxKind) -> bool;
    fn cast(node: EpochSyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &EpochSyntaxNode;

    /// Whether this node or anything below it is an error
    fn has_error(&self) -> bool {
        super::tree::has_error(self.syntax())
    }
}

/// Helper function to find first child of a specific kind
fn child_of_kind(parent: &EpochSyntaxNode, kind: EpochSyntaxKind) -> Option<EpochSyntaxNode> {
    parent.children().find(|n| n.kind() == kind)
}

/// Helper function to find first token of a specific kind
fn token_of_kind(parent: &EpochSyntaxNode, kind: EpochSyntaxKind) -> Option<EpochSyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == kind)
}

/// Direct children that are expressions, in source order
fn expr_children(parent: &EpochSyntaxNode) -> impl Iterator<Item = Expr> + use<> {
    parent.children_with_tokens().filter_map(Expr::cast_element)
}

/// First operator or keyword token among the direct children
fn operator_token(parent: &EpochSyntaxNode) -> Option<EpochSyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind().is_operator() || t.kind().is_keyword())
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: EpochSyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: EpochSyntaxKind) -> bool {
                kind == EpochSyntaxKind::$kind
            }

            fn cast(node: EpochSyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &EpochSyntaxNode {
                &self.syntax
            }
        }
    };
}

// ============================================================================
// Statements
// ============================================================================

ast_node!(
    /// Root of every tree
    Program,
    Program
);
ast_node!(
    /// `targets = value`
    Assignment,
    Assignment
);
ast_node!(AssignmentTargets, AssignmentTargets);
ast_node!(
    /// A bare expression on its own line
    ExpressionStatement,
    ExpressionStatement
);

/// Top-level statement
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    Assignment(Assignment),
    Expression(ExpressionStatement),
}

impl Statement {
    pub fn cast(node: EpochSyntaxNode) -> Option<Self> {
        match node.kind() {
            EpochSyntaxKind::Assignment => Assignment::cast(node).map(Self::Assignment),
            EpochSyntaxKind::ExpressionStatement => {
                ExpressionStatement::cast(node).map(Self::Expression)
            }
            _ => None,
        }
    }

    pub fn syntax(&self) -> &EpochSyntaxNode {
        match self {
            Self::Assignment(it) => it.syntax(),
            Self::Expression(it) => it.syntax(),
        }
    }

    /// Leading comments owned by the statement, without the `#`
    pub fn doc_comments(&self) -> Vec<String> {
        self.syntax()
            .children_with_tokens()
            .map_while(|e| e.into_token().filter(|t| t.kind().is_trivia()))
            .filter(|t| t.kind() == EpochSyntaxKind::Comment)
            .map(|t| t.text().trim_start_matches('#').trim().to_string())
            .collect()
    }
}

impl Program {
    pub fn statements(&self) -> impl Iterator<Item = Statement> + use<> {
        self.syntax.children().filter_map(Statement::cast)
    }
}

impl Assignment {
    pub fn targets(&self) -> Option<AssignmentTargets> {
        child_of_kind(&self.syntax, EpochSyntaxKind::AssignmentTargets)
            .and_then(AssignmentTargets::cast)
    }

    /// Names bound by a plain or unpacking assignment
    pub fn target_names(&self) -> impl Iterator<Item = String> + use<> {
        self.targets()
            .into_iter()
            .flat_map(|targets| targets.exprs())
            .filter_map(|expr| expr.name())
    }

    pub fn eq_token(&self) -> Option<EpochSyntaxToken> {
        token_of_kind(&self.syntax, EpochSyntaxKind::Eq)
    }

    /// Right-hand side
    pub fn value(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }
}

impl AssignmentTargets {
    pub fn exprs(&self) -> impl Iterator<Item = Expr> + use<> {
        expr_children(&self.syntax)
    }

    pub fn is_unpacking(&self) -> bool {
        self.exprs().count() > 1
    }
}

impl ExpressionStatement {
    pub fn expr(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }
}

// ============================================================================
// Expressions
// ============================================================================

ast_node!(
    /// `body if condition else alternative`
    ConditionalExpr,
    ConditionalExpression
);
ast_node!(
    /// Arithmetic, logical and lag/lead operators
    BinaryExpr,
    BinaryExpression
);
ast_node!(UnaryExpr, UnaryExpression);
ast_node!(
    /// Flat chain `a < b <= c`
    ComparisonExpr,
    ComparisonExpression
);
ast_node!(PipelineExpr, PipelineExpression);
ast_node!(CallExpr, CallExpression);
ast_node!(ArgumentList, ArgumentList);
ast_node!(KeywordArgument, KeywordArgument);
ast_node!(AttributeExpr, AttributeExpression);
ast_node!(ParenExpr, ParenthesizedExpression);
ast_node!(TupleExpr, TupleLiteral);
ast_node!(ListExpr, ListLiteral);
ast_node!(DictExpr, DictLiteral);
ast_node!(DictPair, DictPair);
ast_node!(
    /// Node inserted by error recovery; may be empty
    ErrorNode,
    Error
);

/// Any expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Name(EpochSyntaxToken),
    Literal(EpochSyntaxToken),
    Conditional(ConditionalExpr),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    Comparison(ComparisonExpr),
    Pipeline(PipelineExpr),
    Call(CallExpr),
    Attribute(AttributeExpr),
    Paren(ParenExpr),
    Tuple(TupleExpr),
    List(ListExpr),
    Dict(DictExpr),
    Error(ErrorNode),
}

impl Expr {
    pub fn cast_element(element: EpochSyntaxElement) -> Option<Self> {
        match element {
            rowan::NodeOrToken::Token(token) => match token.kind() {
                EpochSyntaxKind::Identifier => Some(Self::Name(token)),
                kind if kind.is_literal() => Some(Self::Literal(token)),
                _ => None,
            },
            rowan::NodeOrToken::Node(node) => Self::cast(node),
        }
    }

    pub fn cast(node: EpochSyntaxNode) -> Option<Self> {
        let expr = match node.kind() {
            EpochSyntaxKind::ConditionalExpression => {
                Self::Conditional(ConditionalExpr { syntax: node })
            }
            EpochSyntaxKind::BinaryExpression => Self::Binary(BinaryExpr { syntax: node }),
            EpochSyntaxKind::UnaryExpression => Self::Unary(UnaryExpr { syntax: node }),
            EpochSyntaxKind::ComparisonExpression => {
                Self::Comparison(ComparisonExpr { syntax: node })
            }
            EpochSyntaxKind::PipelineExpression => Self::Pipeline(PipelineExpr { syntax: node }),
            EpochSyntaxKind::CallExpression => Self::Call(CallExpr { syntax: node }),
            EpochSyntaxKind::AttributeExpression => Self::Attribute(AttributeExpr { syntax: node }),
            EpochSyntaxKind::ParenthesizedExpression => Self::Paren(ParenExpr { syntax: node }),
            EpochSyntaxKind::TupleLiteral => Self::Tuple(TupleExpr { syntax: node }),
            EpochSyntaxKind::ListLiteral => Self::List(ListExpr { syntax: node }),
            EpochSyntaxKind::DictLiteral => Self::Dict(DictExpr { syntax: node }),
            EpochSyntaxKind::Error => Self::Error(ErrorNode { syntax: node }),
            _ => return None,
        };
        Some(expr)
    }

    pub fn syntax(&self) -> EpochSyntaxElement {
        match self {
            Self::Name(token) | Self::Literal(token) => token.clone().into(),
            Self::Conditional(it) => it.syntax().clone().into(),
            Self::Binary(it) => it.syntax().clone().into(),
            Self::Unary(it) => it.syntax().clone().into(),
            Self::Comparison(it) => it.syntax().clone().into(),
            Self::Pipeline(it) => it.syntax().clone().into(),
            Self::Call(it) => it.syntax().clone().into(),
            Self::Attribute(it) => it.syntax().clone().into(),
            Self::Paren(it) => it.syntax().clone().into(),
            Self::Tuple(it) => it.syntax().clone().into(),
            Self::List(it) => it.syntax().clone().into(),
            Self::Dict(it) => it.syntax().clone().into(),
            Self::Error(it) => it.syntax().clone().into(),
        }
    }

    /// Identifier text when the expression is a bare name
    pub fn name(&self) -> Option<String> {
        match self {
            Self::Name(token) => Some(token.text().to_string()),
            _ => None,
        }
    }

    /// Decoded value when the expression is a literal token
    pub fn literal(&self) -> Option<LiteralValue> {
        match self {
            Self::Literal(token) => literal_value(token),
            _ => None,
        }
    }
}

impl ConditionalExpr {
    pub fn body(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }

    pub fn condition(&self) -> Option<Expr> {
        expr_children(&self.syntax).nth(1)
    }

    pub fn alternative(&self) -> Option<Expr> {
        expr_children(&self.syntax).nth(2)
    }
}

impl BinaryExpr {
    pub fn lhs(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }

    pub fn op(&self) -> Option<EpochSyntaxToken> {
        operator_token(&self.syntax)
    }

    pub fn op_kind(&self) -> Option<EpochSyntaxKind> {
        self.op().map(|t| t.kind())
    }

    pub fn rhs(&self) -> Option<Expr> {
        expr_children(&self.syntax).nth(1)
    }
}

impl UnaryExpr {
    pub fn op_kind(&self) -> Option<EpochSyntaxKind> {
        operator_token(&self.syntax).map(|t| t.kind())
    }

    pub fn operand(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }
}

impl ComparisonExpr {
    pub fn operands(&self) -> impl Iterator<Item = Expr> + use<> {
        expr_children(&self.syntax)
    }

    /// Operator kinds between consecutive operands
    pub fn operators(&self) -> impl Iterator<Item = EpochSyntaxKind> + use<> {
        self.syntax
            .children()
            .filter(|n| n.kind() == EpochSyntaxKind::ComparisonOp)
            .filter_map(|n| operator_token(&n))
            .map(|t| t.kind())
    }
}

impl PipelineExpr {
    pub fn source(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }

    pub fn stage(&self) -> Option<Expr> {
        expr_children(&self.syntax).nth(1)
    }
}

impl CallExpr {
    /// Called expression; for `f(a)(b)` the inner call
    pub fn callee(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }

    pub fn arguments(&self) -> Option<ArgumentList> {
        child_of_kind(&self.syntax, EpochSyntaxKind::ArgumentList).and_then(ArgumentList::cast)
    }

    /// Whether the callee is itself a call, as in `sma(period=20)(src.c)`
    pub fn is_two_stage(&self) -> bool {
        matches!(self.callee(), Some(Expr::Call(_)))
    }
}

impl ArgumentList {
    /// Positional arguments, including misplaced ones wrapped in errors
    pub fn positional(&self) -> impl Iterator<Item = Expr> + use<> {
        expr_children(&self.syntax)
    }

    pub fn keyword(&self) -> impl Iterator<Item = KeywordArgument> + use<> {
        self.syntax.children().filter_map(KeywordArgument::cast)
    }

    pub fn is_empty(&self) -> bool {
        self.positional().next().is_none() && self.keyword().next().is_none()
    }
}

impl KeywordArgument {
    pub fn name(&self) -> Option<String> {
        token_of_kind(&self.syntax, EpochSyntaxKind::Identifier).map(|t| t.text().to_string())
    }

    pub fn value(&self) -> Option<Expr> {
        // The name token is also an expression-shaped child; skip it
        expr_children(&self.syntax).nth(1)
    }
}

impl AttributeExpr {
    pub fn object(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }

    /// Member name after the `.`
    pub fn member(&self) -> Option<EpochSyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|e| e.into_token())
            .skip_while(|t| t.kind() != EpochSyntaxKind::Dot)
            .find(|t| t.kind() == EpochSyntaxKind::Identifier)
    }
}

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }
}

impl TupleExpr {
    pub fn elements(&self) -> impl Iterator<Item = Expr> + use<> {
        expr_children(&self.syntax)
    }
}

impl ListExpr {
    pub fn elements(&self) -> impl Iterator<Item = Expr> + use<> {
        expr_children(&self.syntax)
    }
}

impl DictExpr {
    pub fn pairs(&self) -> impl Iterator<Item = DictPair> + use<> {
        self.syntax.children().filter_map(DictPair::cast)
    }
}

impl DictPair {
    pub fn key(&self) -> Option<Expr> {
        expr_children(&self.syntax).next()
    }

    pub fn value(&self) -> Option<Expr> {
        expr_children(&self.syntax).nth(1)
    }
}

impl ErrorNode {
    /// Zero-width marker for a missing element
    pub fn is_missing(&self) -> bool {
        self.syntax.text_range().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn first_expr(source: &str) -> Expr {
        let tree = parse(source);
        let program = Program::cast(tree.syntax()).unwrap();
        match program.statements().next().unwrap() {
            Statement::Assignment(assignment) => assignment.value().unwrap(),
            Statement::Expression(statement) => statement.expr().unwrap(),
        }
    }

    #[test]
    fn test_unpacking_targets() {
        let tree = parse("a, b, = f()");
        let program = Program::cast(tree.syntax()).unwrap();
        let Statement::Assignment(assignment) = program.statements().next().unwrap() else {
            panic!("expected assignment");
        };
        assert!(assignment.targets().unwrap().is_unpacking());
        assert_eq!(assignment.target_names().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_two_stage_call() {
        let Expr::Call(call) = first_expr("sma(period=20)(src.c)") else {
            panic!("expected call");
        };
        assert!(call.is_two_stage());
        let Some(Expr::Call(inner)) = call.callee() else {
            panic!("expected inner call");
        };
        let keyword: Vec<_> = inner.arguments().unwrap().keyword().collect();
        assert_eq!(keyword.len(), 1);
        assert_eq!(keyword[0].name().as_deref(), Some("period"));
        assert_eq!(
            keyword[0].value().and_then(|v| v.literal()),
            Some(LiteralValue::Integer(20))
        );

        let args: Vec<_> = call.arguments().unwrap().positional().collect();
        let Expr::Attribute(attribute) = &args[0] else {
            panic!("expected attribute");
        };
        assert_eq!(attribute.object().and_then(|o| o.name()).as_deref(), Some("src"));
        assert_eq!(attribute.member().unwrap().text(), "c");
    }

    #[test]
    fn test_binary_and_comparison() {
        let Expr::Binary(binary) = first_expr("close >> 1") else {
            panic!("expected binary");
        };
        assert_eq!(binary.op_kind(), Some(EpochSyntaxKind::ShiftRight));
        assert_eq!(binary.lhs().and_then(|e| e.name()).as_deref(), Some("close"));

        let Expr::Comparison(comparison) = first_expr("0 < x <= 10") else {
            panic!("expected comparison");
        };
        assert_eq!(comparison.operands().count(), 3);
        assert_eq!(
            comparison.operators().collect::<Vec<_>>(),
            [EpochSyntaxKind::Lt, EpochSyntaxKind::LtEq]
        );
    }

    #[test]
    fn test_conditional_parts() {
        let Expr::Conditional(conditional) = first_expr("a if c else b") else {
            panic!("expected conditional");
        };
        assert_eq!(conditional.body().and_then(|e| e.name()).as_deref(), Some("a"));
        assert_eq!(conditional.condition().and_then(|e| e.name()).as_deref(), Some("c"));
        assert_eq!(conditional.alternative().and_then(|e| e.name()).as_deref(), Some("b"));
    }

    #[test]
    fn test_dict_pairs() {
        let Expr::Dict(dict) = first_expr("{'a': 1, b: 2,}") else {
            panic!("expected dict");
        };
        let pairs: Vec<_> = dict.pairs().collect();
        assert_eq!(pairs.len(), 2);
        assert_eq!(
            pairs[0].key().and_then(|k| k.literal()),
            Some(LiteralValue::String("a".to_string()))
        );
        assert_eq!(pairs[1].key().and_then(|k| k.name()).as_deref(), Some("b"));
    }

    #[test]
    fn test_missing_value_is_error() {
        let Expr::Error(error) = first_expr("x = ") else {
            panic!("expected error");
        };
        assert!(error.is_missing());
    }

    #[test]
    fn test_doc_comments() {
        let tree = parse("# fast line\n# second\nfast = ema(12)\nema(26)  # trailing\n");
        let program = Program::cast(tree.syntax()).unwrap();
        let statement = program.statements().next().unwrap();
        assert_eq!(statement.doc_comments(), ["fast line", "second"]);
        let statement = program.statements().nth(1).unwrap();
        assert!(statement.doc_comments().is_empty());
    }
}
