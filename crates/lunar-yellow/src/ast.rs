use crate::SyntaxKind::{self, *};
use crate::{NodeOrToken, SyntaxNode, SyntaxToken, TokenValue};

pub trait AstNode {
    fn can_cast(kind: SyntaxKind) -> bool
    where
        Self: Sized;

    fn cast(syntax: SyntaxNode) -> Option<Self>
    where
        Self: Sized;

    fn syntax(&self) -> &SyntaxNode;
}

macro_rules! ast_node {
    ($(#[$attr:meta])* $name:ident: $test:expr) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                let test: fn(SyntaxKind) -> bool = $test;
                test(kind)
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                Self::can_cast(syntax.kind()).then_some(Self(syntax))
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
    ($(#[$attr:meta])* $name:ident = $kind:ident) => {
        ast_node!($(#[$attr])* $name: |kind| kind == $kind);
    };
}

macro_rules! ast_enum {
    ($(#[$attr:meta])* $name:ident { $($variant:ident($ty:ident)),* $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant($ty)),*
        }

        impl AstNode for $name {
            fn can_cast(kind: SyntaxKind) -> bool {
                $($ty::can_cast(kind))||*
            }

            fn cast(syntax: SyntaxNode) -> Option<Self> {
                let kind = syntax.kind();
                $(if $ty::can_cast(kind) {
                    return Some(Self::$variant($ty(syntax)));
                })*
                None
            }

            fn syntax(&self) -> &SyntaxNode {
                match self {
                    $(Self::$variant(node) => node.syntax()),*
                }
            }
        }
    };
}

fn child<N: AstNode>(parent: &SyntaxNode, slot: usize) -> Option<N> {
    parent.slot(slot).and_then(NodeOrToken::into_node).and_then(N::cast)
}

fn token(parent: &SyntaxNode, slot: usize) -> Option<SyntaxToken> {
    parent.slot(slot).and_then(NodeOrToken::into_token)
}

/// Nodes of a list slot, separators skipped.
fn list<N: AstNode>(parent: &SyntaxNode, slot: usize) -> impl Iterator<Item = N> + use<N> {
    parent.slot(slot).and_then(NodeOrToken::into_node).into_iter().flat_map(|list| list.children()).filter_map(N::cast)
}

ast_node!(CompilationUnit = COMPILATION_UNIT);

impl CompilationUnit {
    pub fn statements(&self) -> Option<StatementList> {
        child(&self.0, 0)
    }

    pub fn eof_token(&self) -> Option<SyntaxToken> {
        token(&self.0, 1)
    }
}

ast_node!(
    /// A block.
    StatementList = STATEMENT_LIST
);

impl StatementList {
    pub fn statements(&self) -> impl Iterator<Item = Stmt> + use<> {
        list(&self.0, 0)
    }
}

ast_node!(IdentifierName = IDENTIFIER_NAME);

impl IdentifierName {
    pub fn identifier(&self) -> Option<SyntaxToken> {
        token(&self.0, 0)
    }

    /// Identifier text, empty when the identifier is missing.
    pub fn text(&self) -> String {
        self.identifier().map(|token| token.text().to_owned()).unwrap_or_default()
    }
}

ast_enum! {
    Expr {
        Literal(LiteralExpr),
        Vararg(VarargExpr),
        Parenthesized(ParenthesizedExpr),
        TableConstructor(TableConstructorExpr),
        AnonymousFunction(AnonymousFunctionExpr),
        MemberAccess(MemberAccessExpr),
        ElementAccess(ElementAccessExpr),
        FunctionCall(FunctionCallExpr),
        MethodCall(MethodCallExpr),
        Unary(UnaryExpr),
        Binary(BinaryExpr),
        Name(IdentifierName),
    }
}

ast_node!(
    /// `nil`, `true`, `false`, a number or a string.
    LiteralExpr: SyntaxKind::is_literal_expression
);

impl LiteralExpr {
    pub fn token(&self) -> Option<SyntaxToken> {
        token(&self.0, 0)
    }

    pub fn value(&self) -> TokenValue {
        self.token().map(|token| token.value()).unwrap_or_default()
    }
}

ast_node!(VarargExpr = VARARG_EXPR);

ast_node!(ParenthesizedExpr = PARENTHESIZED_EXPR);

impl ParenthesizedExpr {
    pub fn expr(&self) -> Option<Expr> {
        child(&self.0, 1)
    }
}

ast_node!(TableConstructorExpr = TABLE_CONSTRUCTOR_EXPR);

impl TableConstructorExpr {
    pub fn fields(&self) -> impl Iterator<Item = TableField> + use<> {
        list(&self.0, 1)
    }
}

ast_node!(AnonymousFunctionExpr = ANONYMOUS_FUNCTION_EXPR);

impl AnonymousFunctionExpr {
    pub fn parameters(&self) -> Option<ParameterList> {
        child(&self.0, 1)
    }

    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 2)
    }
}

ast_node!(MemberAccessExpr = MEMBER_ACCESS_EXPR);

impl MemberAccessExpr {
    pub fn object(&self) -> Option<Expr> {
        child(&self.0, 0)
    }

    pub fn member(&self) -> Option<IdentifierName> {
        child(&self.0, 2)
    }
}

ast_node!(ElementAccessExpr = ELEMENT_ACCESS_EXPR);

impl ElementAccessExpr {
    pub fn object(&self) -> Option<Expr> {
        child(&self.0, 0)
    }

    pub fn key(&self) -> Option<Expr> {
        child(&self.0, 2)
    }
}

ast_node!(FunctionCallExpr = FUNCTION_CALL_EXPR);

impl FunctionCallExpr {
    pub fn callee(&self) -> Option<Expr> {
        child(&self.0, 0)
    }

    pub fn argument(&self) -> Option<FunctionArgument> {
        child(&self.0, 1)
    }
}

ast_node!(MethodCallExpr = METHOD_CALL_EXPR);

impl MethodCallExpr {
    pub fn receiver(&self) -> Option<Expr> {
        child(&self.0, 0)
    }

    pub fn method(&self) -> Option<IdentifierName> {
        child(&self.0, 2)
    }

    pub fn argument(&self) -> Option<FunctionArgument> {
        child(&self.0, 3)
    }
}

ast_node!(UnaryExpr: SyntaxKind::is_unary_expression);

impl UnaryExpr {
    pub fn operator(&self) -> Option<SyntaxToken> {
        token(&self.0, 0)
    }

    pub fn operand(&self) -> Option<Expr> {
        child(&self.0, 1)
    }
}

ast_node!(BinaryExpr: SyntaxKind::is_binary_expression);

impl BinaryExpr {
    pub fn left(&self) -> Option<Expr> {
        child(&self.0, 0)
    }

    pub fn operator(&self) -> Option<SyntaxToken> {
        token(&self.0, 1)
    }

    pub fn right(&self) -> Option<Expr> {
        child(&self.0, 2)
    }
}

ast_enum! {
    /// Argument of a call: `(a, b)`, `"text"` or `{ ... }`.
    FunctionArgument {
        ExpressionList(ExpressionListFunctionArgument),
        String(StringFunctionArgument),
        TableConstructor(TableConstructorFunctionArgument),
    }
}

ast_node!(ExpressionListFunctionArgument = EXPRESSION_LIST_FUNCTION_ARGUMENT);

impl ExpressionListFunctionArgument {
    pub fn expressions(&self) -> impl Iterator<Item = Expr> + use<> {
        list(&self.0, 1)
    }
}

ast_node!(StringFunctionArgument = STRING_FUNCTION_ARGUMENT);

impl StringFunctionArgument {
    pub fn string(&self) -> Option<LiteralExpr> {
        child(&self.0, 0)
    }
}

ast_node!(TableConstructorFunctionArgument = TABLE_CONSTRUCTOR_FUNCTION_ARGUMENT);

impl TableConstructorFunctionArgument {
    pub fn table(&self) -> Option<TableConstructorExpr> {
        child(&self.0, 0)
    }
}

ast_enum! {
    TableField {
        IdentifierKeyed(IdentifierKeyedTableField),
        ExpressionKeyed(ExpressionKeyedTableField),
        Unkeyed(UnkeyedTableField),
    }
}

ast_node!(IdentifierKeyedTableField = IDENTIFIER_KEYED_TABLE_FIELD);

impl IdentifierKeyedTableField {
    pub fn key(&self) -> Option<IdentifierName> {
        child(&self.0, 0)
    }

    pub fn value(&self) -> Option<Expr> {
        child(&self.0, 2)
    }
}

ast_node!(ExpressionKeyedTableField = EXPRESSION_KEYED_TABLE_FIELD);

impl ExpressionKeyedTableField {
    pub fn key(&self) -> Option<Expr> {
        child(&self.0, 1)
    }

    pub fn value(&self) -> Option<Expr> {
        child(&self.0, 4)
    }
}

ast_node!(UnkeyedTableField = UNKEYED_TABLE_FIELD);

impl UnkeyedTableField {
    pub fn value(&self) -> Option<Expr> {
        child(&self.0, 0)
    }
}

ast_node!(ParameterList = PARAMETER_LIST);

impl ParameterList {
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + use<> {
        list(&self.0, 1)
    }
}

ast_enum! {
    Parameter {
        Named(NamedParameter),
        Vararg(VarargParameter),
    }
}

ast_node!(NamedParameter = NAMED_PARAMETER);

impl NamedParameter {
    pub fn name(&self) -> Option<IdentifierName> {
        child(&self.0, 0)
    }
}

ast_node!(VarargParameter = VARARG_PARAMETER);

ast_enum! {
    /// `a`, `a.b` or `a.b:c` after `function`.
    FunctionName {
        Simple(SimpleFunctionName),
        Member(MemberFunctionName),
        Method(MethodFunctionName),
    }
}

impl FunctionName {
    /// The last identifier of the name.
    pub fn name(&self) -> Option<IdentifierName> {
        match self {
            Self::Simple(name) => name.name(),
            Self::Member(name) => name.name(),
            Self::Method(name) => name.name(),
        }
    }
}

ast_node!(SimpleFunctionName = SIMPLE_FUNCTION_NAME);

impl SimpleFunctionName {
    pub fn name(&self) -> Option<IdentifierName> {
        child(&self.0, 0)
    }
}

ast_node!(MemberFunctionName = MEMBER_FUNCTION_NAME);

impl MemberFunctionName {
    pub fn base(&self) -> Option<FunctionName> {
        child(&self.0, 0)
    }

    pub fn name(&self) -> Option<IdentifierName> {
        child(&self.0, 2)
    }
}

ast_node!(MethodFunctionName = METHOD_FUNCTION_NAME);

impl MethodFunctionName {
    pub fn base(&self) -> Option<FunctionName> {
        child(&self.0, 0)
    }

    pub fn name(&self) -> Option<IdentifierName> {
        child(&self.0, 2)
    }
}

ast_enum! {
    Stmt {
        Empty(EmptyStmt),
        LocalVariableDeclaration(LocalVariableDeclarationStmt),
        LocalFunctionDeclaration(LocalFunctionDeclarationStmt),
        FunctionDeclaration(FunctionDeclarationStmt),
        Assignment(AssignmentStmt),
        Expression(ExpressionStmt),
        Do(DoStmt),
        While(WhileStmt),
        RepeatUntil(RepeatUntilStmt),
        If(IfStmt),
        NumericFor(NumericForStmt),
        GenericFor(GenericForStmt),
        Return(ReturnStmt),
        Break(BreakStmt),
        Continue(ContinueStmt),
        Goto(GotoStmt),
        GotoLabel(GotoLabelStmt),
    }
}

ast_node!(EmptyStmt = EMPTY_STMT);

ast_node!(
    /// `local a <const>, b = 1, 2`
    LocalVariableDeclarationStmt = LOCAL_VARIABLE_DECLARATION_STMT
);

impl LocalVariableDeclarationStmt {
    pub fn names(&self) -> impl Iterator<Item = LocalVariableName> + use<> {
        list(&self.0, 1)
    }

    pub fn values(&self) -> Option<EqualsValuesClause> {
        child(&self.0, 2)
    }
}

ast_node!(LocalVariableName = LOCAL_VARIABLE_NAME);

impl LocalVariableName {
    pub fn name(&self) -> Option<IdentifierName> {
        child(&self.0, 0)
    }

    pub fn attribute(&self) -> Option<VariableAttribute> {
        child(&self.0, 1)
    }
}

ast_node!(VariableAttribute = VARIABLE_ATTRIBUTE);

impl VariableAttribute {
    pub fn name(&self) -> Option<SyntaxToken> {
        token(&self.0, 1)
    }

    /// `CONST_KW` or `CLOSE_KW` for a known attribute.
    pub fn attribute_kind(&self) -> Option<SyntaxKind> {
        self.name().map(|name| name.contextual_kind()).filter(|kind| kind.is_contextual_keyword())
    }
}

ast_node!(EqualsValuesClause = EQUALS_VALUES_CLAUSE);

impl EqualsValuesClause {
    pub fn values(&self) -> impl Iterator<Item = Expr> + use<> {
        list(&self.0, 1)
    }
}

ast_node!(LocalFunctionDeclarationStmt = LOCAL_FUNCTION_DECLARATION_STMT);

impl LocalFunctionDeclarationStmt {
    pub fn name(&self) -> Option<IdentifierName> {
        child(&self.0, 2)
    }

    pub fn parameters(&self) -> Option<ParameterList> {
        child(&self.0, 3)
    }

    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 4)
    }
}

ast_node!(FunctionDeclarationStmt = FUNCTION_DECLARATION_STMT);

impl FunctionDeclarationStmt {
    pub fn name(&self) -> Option<FunctionName> {
        child(&self.0, 1)
    }

    pub fn parameters(&self) -> Option<ParameterList> {
        child(&self.0, 2)
    }

    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 3)
    }
}

ast_node!(AssignmentStmt = ASSIGNMENT_STMT);

impl AssignmentStmt {
    pub fn targets(&self) -> impl Iterator<Item = Expr> + use<> {
        list(&self.0, 0)
    }

    pub fn values(&self) -> Option<EqualsValuesClause> {
        child(&self.0, 1)
    }
}

ast_node!(ExpressionStmt = EXPRESSION_STMT);

impl ExpressionStmt {
    pub fn expr(&self) -> Option<Expr> {
        child(&self.0, 0)
    }
}

ast_node!(DoStmt = DO_STMT);

impl DoStmt {
    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 1)
    }
}

ast_node!(WhileStmt = WHILE_STMT);

impl WhileStmt {
    pub fn condition(&self) -> Option<Expr> {
        child(&self.0, 1)
    }

    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 3)
    }
}

ast_node!(RepeatUntilStmt = REPEAT_UNTIL_STMT);

impl RepeatUntilStmt {
    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 1)
    }

    pub fn condition(&self) -> Option<Expr> {
        child(&self.0, 3)
    }
}

ast_node!(IfStmt = IF_STMT);

impl IfStmt {
    pub fn condition(&self) -> Option<Expr> {
        child(&self.0, 1)
    }

    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 3)
    }

    pub fn elseif_clauses(&self) -> impl Iterator<Item = ElseIfClause> + use<> {
        list(&self.0, 4)
    }

    pub fn else_clause(&self) -> Option<ElseClause> {
        child(&self.0, 5)
    }
}

ast_node!(ElseIfClause = ELSEIF_CLAUSE);

impl ElseIfClause {
    pub fn condition(&self) -> Option<Expr> {
        child(&self.0, 1)
    }

    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 3)
    }
}

ast_node!(ElseClause = ELSE_CLAUSE);

impl ElseClause {
    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 1)
    }
}

ast_node!(
    /// `for i = start, limit[, step] do ... end`
    NumericForStmt = NUMERIC_FOR_STMT
);

impl NumericForStmt {
    pub fn variable(&self) -> Option<IdentifierName> {
        child(&self.0, 1)
    }

    pub fn start(&self) -> Option<Expr> {
        child(&self.0, 3)
    }

    pub fn limit(&self) -> Option<Expr> {
        child(&self.0, 5)
    }

    pub fn step(&self) -> Option<Expr> {
        child(&self.0, 7)
    }

    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 9)
    }
}

ast_node!(GenericForStmt = GENERIC_FOR_STMT);

impl GenericForStmt {
    pub fn variables(&self) -> impl Iterator<Item = IdentifierName> + use<> {
        list(&self.0, 1)
    }

    pub fn expressions(&self) -> impl Iterator<Item = Expr> + use<> {
        list(&self.0, 3)
    }

    pub fn body(&self) -> Option<StatementList> {
        child(&self.0, 5)
    }
}

ast_node!(ReturnStmt = RETURN_STMT);

impl ReturnStmt {
    pub fn values(&self) -> impl Iterator<Item = Expr> + use<> {
        list(&self.0, 1)
    }
}

ast_node!(BreakStmt = BREAK_STMT);

ast_node!(ContinueStmt = CONTINUE_STMT);

ast_node!(GotoStmt = GOTO_STMT);

impl GotoStmt {
    pub fn label(&self) -> Option<IdentifierName> {
        child(&self.0, 1)
    }
}

ast_node!(GotoLabelStmt = GOTO_LABEL_STMT);

impl GotoLabelStmt {
    pub fn name(&self) -> Option<IdentifierName> {
        child(&self.0, 1)
    }
}
