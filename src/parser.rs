//! Recursive-descent parser with precedence climbing over the expression
//! grammar, grounded statement-for-statement on the original implementation's
//! `parse_*` functions.

use crate::ast::*;
use crate::error::CompileError;
use crate::lexer::{Token, TokenKind, tokenize};

const TYPE_KEYWORDS: &[&str] = &["int", "char", "void"];

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, CompileError> {
        Ok(Parser {
            tokens: tokenize(source)?,
            pos: 0,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_ahead(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn is(&self, kind: TokenKind, text: &str) -> bool {
        let t = self.peek();
        t.kind == kind && t.text == text
    }

    fn is_value(&self, text: &str) -> bool {
        self.peek().text == text
    }

    fn expect(&mut self, kind: TokenKind, context: &str) -> Result<Token, CompileError> {
        let t = self.peek().clone();
        if t.kind != kind {
            return Err(CompileError::parse(
                t.pos(),
                format!("expected {context}, got '{}'", t.text),
            ));
        }
        Ok(self.advance())
    }

    fn expect_value(&mut self, text: &str, context: &str) -> Result<Token, CompileError> {
        let t = self.peek().clone();
        if t.text != text {
            return Err(CompileError::parse(
                t.pos(),
                format!("expected '{text}' ({context}), got '{}'", t.text),
            ));
        }
        Ok(self.advance())
    }

    fn is_type_keyword(&self) -> bool {
        let t = self.peek();
        t.kind == TokenKind::Keyword && TYPE_KEYWORDS.contains(&t.text.as_str())
    }

    fn is_type_start(&self) -> bool {
        self.is_type_keyword() || self.is(TokenKind::Keyword, "struct") || self.is(TokenKind::Keyword, "enum")
    }

    // --- Type parsing ---------------------------------------------------

    fn parse_type(&mut self) -> Result<TypeSpec, CompileError> {
        let t = self.advance();
        let base = if t.text == "struct" || t.text == "enum" {
            let name = self.expect(TokenKind::Identifier, "type name after struct/enum")?;
            format!("{} {}", t.text, name.text)
        } else {
            t.text.clone()
        };

        let mut ptr_level = 0;
        while self.is(TokenKind::Operator, "*") {
            self.advance();
            ptr_level += 1;
        }

        Ok(TypeSpec::new(base, ptr_level))
    }

    // --- Expression parsing: precedence climbing ------------------------

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let t = self.peek().clone();

        match t.kind {
            TokenKind::Number => {
                self.advance();
                let value: i64 = t.text.parse().map_err(|_| {
                    CompileError::parse(t.pos(), format!("invalid number literal '{}'", t.text))
                })?;
                Ok(Expr::Number(value))
            }
            TokenKind::String => {
                self.advance();
                Ok(Expr::Str(t.text))
            }
            TokenKind::CharLit => {
                self.advance();
                let byte = t.text.bytes().next().unwrap_or(0);
                Ok(Expr::CharLit(byte))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Identifier(t.text))
            }
            TokenKind::Separator if t.text == "(" => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_value(")", "closing parenthesis")?;
                Ok(expr)
            }
            TokenKind::Eof => Err(CompileError::parse(
                t.pos(),
                "unexpected end of input in expression",
            )),
            _ => Err(CompileError::parse(
                t.pos(),
                format!("unexpected token '{}' in expression", t.text),
            )),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, CompileError> {
        let mut node = self.parse_primary()?;

        loop {
            if self.is(TokenKind::Separator, "(") {
                let name = match node {
                    Expr::Identifier(name) => name,
                    _ => {
                        return Err(CompileError::parse(
                            self.peek().pos(),
                            "call expression requires identifier",
                        ));
                    }
                };
                self.advance();

                let mut args = Vec::new();
                if !self.is(TokenKind::Separator, ")") {
                    args.push(self.parse_expression()?);
                    while self.is_value(",") {
                        self.advance();
                        args.push(self.parse_expression()?);
                    }
                }
                self.expect_value(")", "closing parenthesis of call")?;
                node = Expr::Call { name, args };
                continue;
            }

            if self.is(TokenKind::Separator, "[") {
                self.advance();
                let index = self.parse_expression()?;
                self.expect_value("]", "closing bracket of index")?;
                node = Expr::Index {
                    array: Box::new(node),
                    index: Box::new(index),
                };
                continue;
            }

            if self.is(TokenKind::Separator, ".") {
                self.advance();
                let member = self.expect(TokenKind::Identifier, "member name after '.'")?;
                node = Expr::Member {
                    object: Box::new(node),
                    member: member.text,
                };
                continue;
            }

            break;
        }

        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        let t = self.peek();
        if t.kind == TokenKind::Operator {
            let op = match t.text.as_str() {
                "*" => Some(UnaryOp::Deref),
                "&" => Some(UnaryOp::AddrOf),
                "-" => Some(UnaryOp::Neg),
                "!" => Some(UnaryOp::Not),
                _ => None,
            };
            if let Some(op) = op {
                self.advance();
                let operand = self.parse_unary()?;
                return Ok(Expr::Unary {
                    op,
                    operand: Box::new(operand),
                });
            }
        }
        self.parse_postfix()
    }

    fn parse_binary_level(
        &mut self,
        ops: &[&str],
        next: fn(&mut Self) -> Result<Expr, CompileError>,
    ) -> Result<Expr, CompileError> {
        let mut left = next(self)?;
        while self.peek().kind == TokenKind::Operator && ops.contains(&self.peek().text.as_str()) {
            let op = self.advance().text;
            let right = next(self)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        self.parse_binary_level(&["*", "/", "%"], Self::parse_unary)
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        self.parse_binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        self.parse_binary_level(&["<", ">", "<=", ">="], Self::parse_additive)
    }

    fn parse_equality(&mut self) -> Result<Expr, CompileError> {
        self.parse_binary_level(&["==", "!="], Self::parse_comparison)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, CompileError> {
        self.parse_binary_level(&["&&"], Self::parse_equality)
    }

    fn parse_logical_or(&mut self) -> Result<Expr, CompileError> {
        self.parse_binary_level(&["||"], Self::parse_logical_and)
    }

    fn parse_expression(&mut self) -> Result<Expr, CompileError> {
        self.parse_logical_or()
    }

    // --- Variable declarations -------------------------------------------

    fn parse_var_decl(&mut self, expect_semi: bool) -> Result<VarDecl, CompileError> {
        let ty = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "variable name")?.text;

        let mut array_size = None;
        if self.is_value("[") {
            self.advance();
            let size_tok = self.expect(TokenKind::Number, "array size")?;
            let size: i64 = size_tok.text.parse().map_err(|_| {
                CompileError::parse(size_tok.pos(), "invalid array size")
            })?;
            array_size = Some(size);
            self.expect_value("]", "closing bracket of array size")?;
        }

        let mut init = None;
        if self.is(TokenKind::Operator, "=") {
            self.advance();
            init = Some(self.parse_expression()?);
        }

        if expect_semi {
            self.expect_value(";", "semicolon after variable declaration")?;
        }

        Ok(VarDecl {
            name,
            ty,
            array_size,
            init,
        })
    }

    // --- Statements -------------------------------------------------------

    fn parse_block(&mut self) -> Result<Block, CompileError> {
        self.expect_value("{", "opening brace of block")?;
        let mut block = Block::default();
        while !self.is(TokenKind::Separator, "}") && self.peek().kind != TokenKind::Eof {
            block.statements.push(self.parse_statement()?);
        }
        self.expect_value("}", "closing brace of block")?;
        Ok(block)
    }

    fn parse_body(&mut self) -> Result<Block, CompileError> {
        if self.is(TokenKind::Separator, "{") {
            return self.parse_block();
        }
        let mut block = Block::default();
        block.statements.push(self.parse_statement()?);
        Ok(block)
    }

    fn parse_return(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // "return"
        let value = if self.is_value(";") {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_value(";", "semicolon after return")?;
        Ok(Stmt::Return(value))
    }

    fn parse_if(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // "if"
        self.expect_value("(", "opening parenthesis of if condition")?;
        let condition = self.parse_expression()?;
        self.expect_value(")", "closing parenthesis of if condition")?;
        let then_branch = self.parse_body()?;

        let else_branch = if self.is(TokenKind::Keyword, "else") {
            self.advance();
            if self.is(TokenKind::Keyword, "if") {
                Some(Box::new(self.parse_if()?))
            } else {
                Some(Box::new(Stmt::Block(self.parse_body()?)))
            }
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // "while"
        self.expect_value("(", "opening parenthesis of while condition")?;
        let condition = self.parse_expression()?;
        self.expect_value(")", "closing parenthesis of while condition")?;
        let body = self.parse_body()?;
        Ok(Stmt::While { condition, body })
    }

    fn parse_for(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // "for"
        self.expect_value("(", "opening parenthesis of for")?;

        let init = if self.is_type_start() {
            Some(Box::new(Stmt::VarDecl(self.parse_var_decl(false)?)))
        } else if !self.is_value(";") {
            let expr = self.parse_expression()?;
            let stmt = if self.is(TokenKind::Operator, "=") {
                self.advance();
                let value = self.parse_expression()?;
                Stmt::Assign {
                    target: expr,
                    value,
                }
            } else {
                Stmt::Expr(expr)
            };
            Some(Box::new(stmt))
        } else {
            None
        };
        self.expect_value(";", "first semicolon in for")?;

        let condition = if !self.is_value(";") {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_value(";", "second semicolon in for")?;

        let update = if !self.is_value(")") {
            let expr = self.parse_expression()?;
            let stmt = if self.is(TokenKind::Operator, "=") {
                self.advance();
                let value = self.parse_expression()?;
                Stmt::Assign {
                    target: expr,
                    value,
                }
            } else {
                Stmt::Expr(expr)
            };
            Some(Box::new(stmt))
        } else {
            None
        };
        self.expect_value(")", "closing parenthesis of for")?;

        let body = self.parse_body()?;
        Ok(Stmt::For {
            init,
            condition,
            update,
            body,
        })
    }

    fn parse_break_stmt(&mut self) -> Result<Stmt, CompileError> {
        self.advance(); // "break"
        self.expect_value(";", "semicolon after break")?;
        Ok(Stmt::Break)
    }

    /// Bounded lookahead distinguishing `int x = 5;` from `x = 5;`: a type
    /// specifier (possibly `struct`/`enum Name`, possibly starred) followed
    /// by an identifier.
    fn looking_at_var_decl(&self) -> bool {
        if !self.is_type_start() {
            return false;
        }

        let mut offset = 1;
        let t = self.peek();
        if (t.text == "struct" || t.text == "enum")
            && let Some(next) = self.peek_ahead(offset)
            && next.kind == TokenKind::Identifier
        {
            offset += 1;
        }

        while let Some(star) = self.peek_ahead(offset) {
            if star.kind == TokenKind::Operator && star.text == "*" {
                offset += 1;
            } else {
                break;
            }
        }

        matches!(self.peek_ahead(offset), Some(t) if t.kind == TokenKind::Identifier)
    }

    fn parse_statement(&mut self) -> Result<Stmt, CompileError> {
        let t = self.peek().clone();

        if t.kind == TokenKind::Keyword {
            match t.text.as_str() {
                "return" => return self.parse_return(),
                "if" => return self.parse_if(),
                "while" => return self.parse_while(),
                "for" => return self.parse_for(),
                "break" => return self.parse_break_stmt(),
                _ => {}
            }
            if self.looking_at_var_decl() {
                let decl = self.parse_var_decl(true)?;
                return Ok(Stmt::VarDecl(decl));
            }
        }

        let expr = self.parse_expression()?;
        let stmt = if self.is(TokenKind::Operator, "=") {
            self.advance();
            let value = self.parse_expression()?;
            Stmt::Assign {
                target: expr,
                value,
            }
        } else {
            Stmt::Expr(expr)
        };
        self.expect_value(";", "semicolon after expression statement")?;
        Ok(stmt)
    }

    // --- Top level --------------------------------------------------------

    fn parse_struct_def(&mut self) -> Result<StructDef, CompileError> {
        self.advance(); // "struct"
        let name = self.expect(TokenKind::Identifier, "struct name")?.text;
        self.expect_value("{", "opening brace of struct")?;

        let mut fields = Vec::new();
        while !self.is(TokenKind::Separator, "}") {
            let ty = self.parse_type()?;
            let fname = self.expect(TokenKind::Identifier, "field name")?.text;
            fields.push((fname, ty));
            self.expect_value(";", "semicolon after struct field")?;
        }

        self.expect_value("}", "closing brace of struct")?;
        self.expect_value(";", "semicolon after struct definition")?;

        Ok(StructDef { name, fields })
    }

    fn parse_enum_def(&mut self) -> Result<EnumDef, CompileError> {
        self.advance(); // "enum"
        let name = self.expect(TokenKind::Identifier, "enum name")?.text;
        self.expect_value("{", "opening brace of enum")?;

        let mut values = Vec::new();
        while !self.is(TokenKind::Separator, "}") {
            let value = self.expect(TokenKind::Identifier, "enum value")?.text;
            values.push(value);
            if self.is_value(",") {
                self.advance();
            }
        }

        self.expect_value("}", "closing brace of enum")?;
        self.expect_value(";", "semicolon after enum definition")?;

        Ok(EnumDef { name, values })
    }

    fn parse_function_def(&mut self) -> Result<Function, CompileError> {
        let return_type = self.parse_type()?;
        let name = self.expect(TokenKind::Identifier, "function name")?.text;
        self.expect_value("(", "opening parenthesis of function parameters")?;

        let mut params = Vec::new();
        if !self.is(TokenKind::Separator, ")") {
            loop {
                let ty = self.parse_type()?;
                let pname = self.expect(TokenKind::Identifier, "parameter name")?.text;
                params.push(VarDecl {
                    name: pname,
                    ty,
                    array_size: None,
                    init: None,
                });
                if self.is_value(",") {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect_value(")", "closing parenthesis of function parameters")?;

        let body = self.parse_block()?;

        Ok(Function {
            name,
            return_type,
            params,
            body,
        })
    }

    fn looking_at_tagged_def(&self, keyword: &str) -> bool {
        let t0 = self.peek();
        if t0.kind != TokenKind::Keyword || t0.text != keyword {
            return false;
        }
        let t1 = match self.peek_ahead(1) {
            Some(t) => t,
            None => return false,
        };
        if t1.kind != TokenKind::Identifier {
            return false;
        }
        matches!(self.peek_ahead(2), Some(t) if t.kind == TokenKind::Separator && t.text == "{")
    }

    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut program = Program::default();

        while self.peek().kind != TokenKind::Eof {
            let item = if self.looking_at_tagged_def("struct") {
                Item::Struct(self.parse_struct_def()?)
            } else if self.looking_at_tagged_def("enum") {
                Item::Enum(self.parse_enum_def()?)
            } else {
                Item::Function(self.parse_function_def()?)
            };
            program.items.push(item);
        }

        Ok(program)
    }
}

/// Parse a complete translation unit from source text.
pub fn parse_program(source: &str) -> Result<Program, CompileError> {
    Parser::new(source)?.parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hello_world_style_function() {
        let program = parse_program("int main() { return 0; }").unwrap();
        assert_eq!(program.items.len(), 1);
        match &program.items[0] {
            Item::Function(f) => {
                assert_eq!(f.name, "main");
                assert_eq!(f.body.statements.len(), 1);
            }
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn precedence_climbing_nests_correctly() {
        let program = parse_program("int f() { return 1 + 2 * 3; }").unwrap();
        let Item::Function(f) = &program.items[0] else {
            panic!()
        };
        match &f.body.statements[0] {
            Stmt::Return(Some(Expr::Binary { op, left, right })) => {
                assert_eq!(op, "+");
                assert!(matches!(**left, Expr::Number(1)));
                assert!(matches!(**right, Expr::Binary { .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn distinguishes_var_decl_from_expr_statement() {
        let program = parse_program("int main() { int x = 1; x = 2; return x; }").unwrap();
        let Item::Function(f) = &program.items[0] else {
            panic!()
        };
        assert!(matches!(f.body.statements[0], Stmt::VarDecl(_)));
        assert!(matches!(f.body.statements[1], Stmt::Assign { .. }));
    }

    #[test]
    fn struct_def_vs_struct_returning_function() {
        let program = parse_program(
            "struct Point { int x; int y; };\nstruct Point make() { struct Point p; return p; }",
        )
        .unwrap();
        assert!(matches!(program.items[0], Item::Struct(_)));
        assert!(matches!(program.items[1], Item::Function(_)));
    }

    #[test]
    fn enum_def_parses_values() {
        let program = parse_program("enum Color { RED, GREEN, BLUE };\nint main() { return 0; }")
            .unwrap();
        match &program.items[0] {
            Item::Enum(e) => assert_eq!(e.values, vec!["RED", "GREEN", "BLUE"]),
            _ => panic!("expected enum"),
        }
    }

    #[test]
    fn break_outside_statement_position_is_parsed_as_statement() {
        let program =
            parse_program("int main() { while (1) { break; } return 0; }").unwrap();
        let Item::Function(f) = &program.items[0] else {
            panic!()
        };
        let Stmt::While { body, .. } = &f.body.statements[0] else {
            panic!()
        };
        assert!(matches!(body.statements[0], Stmt::Break));
    }

    #[test]
    fn call_requires_identifier_target() {
        let err = parse_program("int main() { return (1)(2); }").unwrap_err();
        assert!(matches!(err, CompileError::Parse { .. }));
    }

    #[test]
    fn pointer_and_address_of_roundtrip() {
        let program = parse_program("int main() { int x; int *p; p = &x; return *p; }").unwrap();
        let Item::Function(f) = &program.items[0] else {
            panic!()
        };
        assert!(matches!(
            f.body.statements[2],
            Stmt::Assign {
                value: Expr::Unary {
                    op: UnaryOp::AddrOf,
                    ..
                },
                ..
            }
        ));
    }
}
