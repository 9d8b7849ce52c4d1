//! Parse coverage for the language surface
//!
//! Every case here must parse without any embedded error and round-trip
//! losslessly.

use epochscript_core::cst::ast::{AstNode, Expr, Program, Statement};
use epochscript_core::cst::printer::debug_tree;
use epochscript_core::{EpochSyntaxKind, parse};

const VALID_CASES: &[&str] = &[
    // Assignments
    "x = 42",
    "result = a + b",
    "a, b = values",
    // Two-stage calls
    "x = sma(period=20)(src.c)",
    "src = market_data_source(timeframe=\"1D\")()",
    "result = agg_max()(a, b, c)",
    // Pipeline operator
    "result = src.c | sma(20)",
    "smoothed = price | sma(10) | ema(5)",
    "x = data | filter(cond=True) | transform()",
    // Lag operator
    "prev = src.c >> 1",
    "prev5 = close >> 5",
    "lagged = (high + low) >> 2",
    // Lead operator
    "next = src.c << 1",
    "future = close << 3",
    // Timeframe literals
    "tf = 1D",
    "tf = 4H",
    "tf = 15Min",
    "tf = 1W",
    "tf = 1ME",
    "tf = 1QS",
    "tf = 1W-MON",
    "tf = 1W-FRI-Last",
    "src = market_data_source(timeframe=1D)()",
    // Built-in types
    "t = Time(hour=9, minute=30)",
    "d = Duration(hours=1)",
    "s = Session(start=t1, end=t2)",
    "anchor = SessionAnchor(session=s)",
    "schema = EventMarkerSchema(name=\"test\")",
    // Operators
    "x = 1 + 2 * 3 ** 4",
    "cond = a > 0 and b < 10",
    "output = 1 if cond else 0",
    "neg = not flag",
    "combo = a or b and c",
    // Comparisons
    "cmp = a < b",
    "cmp = a <= b",
    "cmp = a > b",
    "cmp = a >= b",
    "cmp = a == b",
    "cmp = a != b",
    // Literals
    "x = [1, 2, 3]",
    "x = (a, b)",
    "x = {\"key\": \"value\"}",
    "x = {Success: 1, Error: -1}",
    "x = True",
    "x = False",
    "x = None",
    "x = 3.14",
    "x = 1e-5",
    "x = ()",
    "x = (a,)",
    // Strings
    "x = \"hello\"",
    "x = 'world'",
    "x = \"\"\"multi\nline\"\"\"",
    // Comments
    "# comment\nx = 1",
    "x = 1  # inline",
    // Complex expressions
    "signal = 1.0 if close > sma(20)(close) else -1.0",
    "spread = (high - low) / close * 100",
    "result = func(a, b, opt=True)(x, y)",
];

#[test]
fn all_valid_cases_parse_cleanly() {
    for source in VALID_CASES {
        let tree = parse(source);
        assert!(
            !tree.has_errors(),
            "{source:?} has errors:\n{}",
            debug_tree(&tree.syntax())
        );
        assert_eq!(tree.syntax().text().to_string(), *source);
    }
}

#[test]
fn all_valid_cases_parse_as_one_script() {
    let script = VALID_CASES.join("\n");
    let tree = parse(&script);
    assert!(!tree.has_errors());
    let program = Program::cast(tree.syntax()).expect("program");
    assert_eq!(program.statements().count(), VALID_CASES.len());
}

#[test]
fn every_case_is_an_assignment() {
    for source in VALID_CASES {
        let tree = parse(source);
        let program = Program::cast(tree.syntax()).expect("program");
        let statements: Vec<_> = program.statements().collect();
        assert_eq!(statements.len(), 1, "{source:?}");
        assert!(
            matches!(statements[0], Statement::Assignment(_)),
            "{source:?}"
        );
    }
}

fn value_of(source: &str) -> Expr {
    let tree = parse(source);
    let program = Program::cast(tree.syntax()).expect("program");
    match program.statements().next() {
        Some(Statement::Assignment(assignment)) => assignment.value().expect("value"),
        other => panic!("expected assignment, got {other:?}"),
    }
}

#[test]
fn pipeline_is_left_associative() {
    let Expr::Pipeline(outer) = value_of("smoothed = price | sma(10) | ema(5)") else {
        panic!("expected pipeline");
    };
    assert!(matches!(outer.source(), Some(Expr::Pipeline(_))));
    assert!(matches!(outer.stage(), Some(Expr::Call(_))));
}

#[test]
fn lag_binds_looser_than_additive() {
    let Expr::Binary(lag) = value_of("x = a + b >> 1") else {
        panic!("expected binary");
    };
    assert_eq!(lag.op_kind(), Some(EpochSyntaxKind::ShiftRight));
    assert!(matches!(lag.lhs(), Some(Expr::Binary(_))));
}

#[test]
fn pipeline_binds_looser_than_lag() {
    let Expr::Pipeline(pipeline) = value_of("x = a >> 1 | f()") else {
        panic!("expected pipeline");
    };
    assert!(matches!(pipeline.source(), Some(Expr::Binary(_))));
}

#[test]
fn not_binds_looser_than_comparison() {
    let Expr::Unary(not) = value_of("x = not a < b") else {
        panic!("expected unary");
    };
    assert_eq!(not.op_kind(), Some(EpochSyntaxKind::NotKw));
    assert!(matches!(not.operand(), Some(Expr::Comparison(_))));
}

#[test]
fn and_binds_tighter_than_or() {
    let Expr::Binary(or) = value_of("combo = a or b and c") else {
        panic!("expected binary");
    };
    assert_eq!(or.op_kind(), Some(EpochSyntaxKind::OrKw));
    let Some(Expr::Binary(and)) = or.rhs() else {
        panic!("expected and on the right");
    };
    assert_eq!(and.op_kind(), Some(EpochSyntaxKind::AndKw));
}

#[test]
fn arithmetic_precedence_nests_tighter_operators_deeper() {
    let Expr::Binary(sum) = value_of("x = 1 + 2 * 3 ** 4") else {
        panic!("expected binary");
    };
    assert_eq!(sum.op_kind(), Some(EpochSyntaxKind::Plus));
    assert!(matches!(sum.lhs(), Some(Expr::Literal(_))));
    let Some(Expr::Binary(product)) = sum.rhs() else {
        panic!("expected product on the right");
    };
    assert_eq!(product.op_kind(), Some(EpochSyntaxKind::Star));
    assert!(matches!(product.lhs(), Some(Expr::Literal(_))));
    let Some(Expr::Binary(power)) = product.rhs() else {
        panic!("expected power on the right");
    };
    assert_eq!(power.op_kind(), Some(EpochSyntaxKind::StarStar));

    let tree = parse("1 + 2 * 3 ** 4");
    insta::assert_snapshot!(debug_tree(&tree.syntax()), @r#"
    Program@0..14
      ExpressionStatement@0..14
        BinaryExpression@0..14
          Number@0..1 "1"
          Whitespace@1..2 " "
          Plus@2..3 "+"
          Whitespace@3..4 " "
          BinaryExpression@4..14
            Number@4..5 "2"
            Whitespace@5..6 " "
            Star@6..7 "*"
            Whitespace@7..8 " "
            BinaryExpression@8..14
              Number@8..9 "3"
              Whitespace@9..10 " "
              StarStar@10..12 "**"
              Whitespace@12..13 " "
              Number@13..14 "4"
    "#);
}

#[test]
fn conditional_requires_parentheses_to_nest() {
    let tree = parse("x = a if b else c if d else e");
    assert!(tree.has_errors());

    let tree = parse("x = a if b else (c if d else e)");
    assert!(!tree.has_errors());
}

#[test]
fn grouping_and_tuples() {
    assert!(matches!(value_of("x = (a)"), Expr::Paren(_)));
    let Expr::Tuple(empty) = value_of("x = ()") else {
        panic!("expected tuple");
    };
    assert_eq!(empty.elements().count(), 0);
    let Expr::Tuple(single) = value_of("x = (a,)") else {
        panic!("expected tuple");
    };
    assert_eq!(single.elements().count(), 1);
}

#[test]
fn keyword_arguments_follow_positional() {
    let Expr::Call(call) = value_of("result = func(a, b, opt=True)(x, y)") else {
        panic!("expected call");
    };
    let Some(Expr::Call(inner)) = call.callee() else {
        panic!("expected two-stage call");
    };
    let arguments = inner.arguments().expect("arguments");
    assert_eq!(arguments.positional().count(), 2);
    assert_eq!(
        arguments.keyword().filter_map(|k| k.name()).collect::<Vec<_>>(),
        ["opt"]
    );
}

#[test]
fn timeframe_tokens() {
    for (source, timeframe) in [
        ("tf = 1W-FRI-Last", "1W-FRI-Last"),
        ("tf = 15Min", "15Min"),
        ("tf = 1W-MON", "1W-MON"),
    ] {
        let tree = parse(source);
        let token = tree
            .syntax()
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.kind() == EpochSyntaxKind::Timeframe)
            .expect("timeframe token");
        assert_eq!(token.text(), timeframe);
    }
}

#[test]
fn snapshot_of_pipeline_statement() {
    let tree = parse("result = src.c | sma(20)\n");
    insta::assert_snapshot!(debug_tree(&tree.syntax()), @r#"
    Program@0..25
      Assignment@0..25
        AssignmentTargets@0..6
          Identifier@0..6 "result"
        Whitespace@6..7 " "
        Eq@7..8 "="
        Whitespace@8..9 " "
        PipelineExpression@9..24
          AttributeExpression@9..14
            Identifier@9..12 "src"
            Dot@12..13 "."
            Identifier@13..14 "c"
          Whitespace@14..15 " "
          Pipe@15..16 "|"
          Whitespace@16..17 " "
          CallExpression@17..24
            Identifier@17..20 "sma"
            ArgumentList@20..24
              LParen@20..21 "("
              Number@21..23 "20"
              RParen@23..24 ")"
        Newline@24..25 "\n"
    "#);
}
