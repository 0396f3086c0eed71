use std::ops::Range;

macro_rules! syntax_kinds {
    ($($kind:ident $(= $raw:literal)?),* $(,)?) => {
        /// Every token, trivia and node kind.
        ///
        /// The space is split into contiguous ranges; the first kind of each
        /// range carries an explicit discriminant so that adding a kind inside
        /// a range never shifts the others.
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum SyntaxKind {
            $($kind $(= $raw)?),*
        }

        impl SyntaxKind {
            /// All kinds in ascending discriminant order.
            pub const ALL: &'static [Self] = &[$(Self::$kind),*];
        }
    };
}

syntax_kinds! {
    NONE = 0,
    LIST,

    PLUS = 10,
    MINUS,
    STAR,
    SLASH,
    SLASH_SLASH,
    PERCENT,
    CARET,
    HASH,
    AMP,
    TILDE,
    PIPE,
    LT_LT,
    GT_GT,
    EQ_EQ,
    TILDE_EQ,
    BANG_EQ,
    LT_EQ,
    GT_EQ,
    LT,
    GT,
    EQ,
    L_PAREN,
    R_PAREN,
    L_BRACE,
    R_BRACE,
    L_BRACKET,
    R_BRACKET,
    SEMICOLON,
    COLON,
    COLON_COLON,
    COMMA,
    DOT,
    DOT_DOT,
    DOT_DOT_DOT,
    AMP_AMP,
    PIPE_PIPE,
    BANG,
    DOLLAR,

    AND_KW = 100,
    BREAK_KW,
    CONTINUE_KW,
    DO_KW,
    ELSE_KW,
    ELSEIF_KW,
    END_KW,
    FALSE_KW,
    FOR_KW,
    FUNCTION_KW,
    GOTO_KW,
    IF_KW,
    IN_KW,
    LOCAL_KW,
    NIL_KW,
    NOT_KW,
    OR_KW,
    REPEAT_KW,
    RETURN_KW,
    THEN_KW,
    TRUE_KW,
    UNTIL_KW,
    WHILE_KW,

    CONST_KW = 150,
    CLOSE_KW,
    DEFINE_KW,
    UNDEF_KW,

    EOF = 200,
    END_OF_DIRECTIVE,

    IDENTIFIER = 250,
    NUMERIC_LITERAL,
    STRING_LITERAL,
    BAD_TOKEN,

    WHITESPACE = 300,
    END_OF_LINE,
    SINGLE_LINE_COMMENT,
    MULTI_LINE_COMMENT,
    SHEBANG,
    DISABLED_TEXT,

    SKIPPED_TOKENS_TRIVIA = 320,
    IF_DIRECTIVE_TRIVIA = 330,
    ELSEIF_DIRECTIVE_TRIVIA,
    ELSE_DIRECTIVE_TRIVIA,
    END_DIRECTIVE_TRIVIA,
    DEFINE_DIRECTIVE_TRIVIA,
    UNDEF_DIRECTIVE_TRIVIA,
    BAD_DIRECTIVE_TRIVIA,

    IDENTIFIER_NAME = 400,

    NIL_LITERAL_EXPR = 500,
    TRUE_LITERAL_EXPR,
    FALSE_LITERAL_EXPR,
    NUMERIC_LITERAL_EXPR,
    STRING_LITERAL_EXPR,
    VARARG_EXPR,
    PARENTHESIZED_EXPR,
    TABLE_CONSTRUCTOR_EXPR,
    ANONYMOUS_FUNCTION_EXPR,
    MEMBER_ACCESS_EXPR,
    ELEMENT_ACCESS_EXPR,
    FUNCTION_CALL_EXPR,
    METHOD_CALL_EXPR,
    UNARY_MINUS_EXPR,
    LOGICAL_NOT_EXPR,
    LENGTH_EXPR,
    BITWISE_NOT_EXPR,
    ADD_EXPR,
    SUBTRACT_EXPR,
    MULTIPLY_EXPR,
    DIVIDE_EXPR,
    FLOOR_DIVIDE_EXPR,
    MODULO_EXPR,
    EXPONENTIATE_EXPR,
    CONCAT_EXPR,
    EQUALS_EXPR,
    NOT_EQUALS_EXPR,
    LESS_THAN_EXPR,
    LESS_THAN_OR_EQUAL_EXPR,
    GREATER_THAN_EXPR,
    GREATER_THAN_OR_EQUAL_EXPR,
    LOGICAL_AND_EXPR,
    LOGICAL_OR_EXPR,
    BITWISE_AND_EXPR,
    BITWISE_OR_EXPR,
    EXCLUSIVE_OR_EXPR,
    LEFT_SHIFT_EXPR,
    RIGHT_SHIFT_EXPR,

    EMPTY_STMT = 600,
    LOCAL_VARIABLE_DECLARATION_STMT,
    LOCAL_FUNCTION_DECLARATION_STMT,
    FUNCTION_DECLARATION_STMT,
    ASSIGNMENT_STMT,
    EXPRESSION_STMT,
    DO_STMT,
    WHILE_STMT,
    REPEAT_UNTIL_STMT,
    IF_STMT,
    NUMERIC_FOR_STMT,
    GENERIC_FOR_STMT,
    RETURN_STMT,
    BREAK_STMT,
    CONTINUE_STMT,
    GOTO_STMT,
    GOTO_LABEL_STMT,

    COMPILATION_UNIT = 700,
    STATEMENT_LIST,
    ELSEIF_CLAUSE,
    ELSE_CLAUSE,
    EQUALS_VALUES_CLAUSE,
    LOCAL_VARIABLE_NAME,
    VARIABLE_ATTRIBUTE,
    SIMPLE_FUNCTION_NAME,
    MEMBER_FUNCTION_NAME,
    METHOD_FUNCTION_NAME,
    PARAMETER_LIST,
    NAMED_PARAMETER,
    VARARG_PARAMETER,
    EXPRESSION_LIST_FUNCTION_ARGUMENT,
    STRING_FUNCTION_ARGUMENT,
    TABLE_CONSTRUCTOR_FUNCTION_ARGUMENT,
    IDENTIFIER_KEYED_TABLE_FIELD,
    EXPRESSION_KEYED_TABLE_FIELD,
    UNKEYED_TABLE_FIELD,
}

const PUNCTUATION: Range<u16> = 10..100;
const KEYWORDS: Range<u16> = 100..150;
const CONTEXTUAL_KEYWORDS: Range<u16> = 150..200;
const STRUCTURELESS_TOKENS: Range<u16> = 200..250;
const TEXTUAL_TOKENS: Range<u16> = 250..300;
const TRIVIA: Range<u16> = 300..400;
const STRUCTURED_TRIVIA: Range<u16> = 320..400;
const DIRECTIVE_TRIVIA: Range<u16> = 330..400;
const NAMES: Range<u16> = 400..500;
const EXPRESSIONS: Range<u16> = 500..600;
const STATEMENTS: Range<u16> = 600..700;
const DECLARATIONS: Range<u16> = 700..800;

const LITERAL_EXPRESSIONS: Range<u16> = 500..505;
const UNARY_EXPRESSIONS: Range<u16> = 513..517;
const BINARY_EXPRESSIONS: Range<u16> = 517..600;

impl SyntaxKind {
    #[inline]
    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Looks a kind up by its raw discriminant.
    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.binary_search_by_key(&raw, |kind| kind.raw()).ok().map(|index| Self::ALL[index])
    }

    #[inline]
    const fn within(self, range: Range<u16>) -> bool {
        range.start <= self as u16 && (self as u16) < range.end
    }

    #[inline]
    pub const fn is_punctuation(self) -> bool {
        self.within(PUNCTUATION)
    }

    /// Reserved words. Availability per dialect lives in the fact tables.
    #[inline]
    pub const fn is_keyword(self) -> bool {
        self.within(KEYWORDS)
    }

    #[inline]
    pub const fn is_contextual_keyword(self) -> bool {
        self.within(CONTEXTUAL_KEYWORDS)
    }

    /// Tokens that never carry text, such as the end of file.
    #[inline]
    pub const fn is_structureless_token(self) -> bool {
        self.within(STRUCTURELESS_TOKENS)
    }

    /// Tokens whose text is not fixed by their kind.
    #[inline]
    pub const fn is_textual_token(self) -> bool {
        self.within(TEXTUAL_TOKENS)
    }

    /// Kinds whose text is fully determined by the kind.
    #[inline]
    pub const fn is_well_known(self) -> bool {
        self.is_punctuation() || self.is_keyword() || self.is_structureless_token()
    }

    #[inline]
    pub const fn is_token(self) -> bool {
        self.within(PUNCTUATION.start..TEXTUAL_TOKENS.end)
    }

    #[inline]
    pub const fn is_literal_token(self) -> bool {
        matches!(self, Self::NUMERIC_LITERAL | Self::STRING_LITERAL)
    }

    #[inline]
    pub const fn is_trivia(self) -> bool {
        self.within(TRIVIA)
    }

    #[inline]
    pub const fn is_comment(self) -> bool {
        matches!(self, Self::SINGLE_LINE_COMMENT | Self::MULTI_LINE_COMMENT)
    }

    /// Trivia kinds that own a syntax node.
    #[inline]
    pub const fn is_structured_trivia(self) -> bool {
        self.within(STRUCTURED_TRIVIA)
    }

    #[inline]
    pub const fn is_directive_trivia(self) -> bool {
        self.within(DIRECTIVE_TRIVIA)
    }

    #[inline]
    pub const fn is_name(self) -> bool {
        self.within(NAMES)
    }

    #[inline]
    pub const fn is_expression(self) -> bool {
        self.within(EXPRESSIONS) || self.is_name()
    }

    #[inline]
    pub const fn is_literal_expression(self) -> bool {
        self.within(LITERAL_EXPRESSIONS)
    }

    #[inline]
    pub const fn is_unary_expression(self) -> bool {
        self.within(UNARY_EXPRESSIONS)
    }

    #[inline]
    pub const fn is_binary_expression(self) -> bool {
        self.within(BINARY_EXPRESSIONS)
    }

    #[inline]
    pub const fn is_statement(self) -> bool {
        self.within(STATEMENTS)
    }

    /// Declarations, clauses and the compilation unit.
    #[inline]
    pub const fn is_declaration(self) -> bool {
        self.within(DECLARATIONS)
    }

    /// Kinds a green node may carry.
    #[inline]
    pub const fn is_node(self) -> bool {
        matches!(self, Self::NONE | Self::LIST)
            || self.is_structured_trivia()
            || self.within(NAMES.start..DECLARATIONS.end)
    }
}
