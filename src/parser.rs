//! Parser for ES5 source code
//!
//! Uses recursive descent for statements and Pratt parsing for binary
//! expressions. Produces the ESTree-shaped nodes of [`crate::ast`].

use std::rc::Rc;

use crate::ast::*;
use crate::error::JsError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::prelude::ensure_sufficient_stack;
use crate::string_dict::StringDict;
use crate::value::JsString;

/// Deepest nesting of statements and expressions the parser accepts
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parse a complete script with a fresh string dictionary
pub fn parse_program(source: &str) -> Result<Program, JsError> {
    let mut dict = StringDict::new();
    Parser::new(source, &mut dict).parse_program()
}

/// Parse code passed to `eval`, where a top-level `return`, `break` or
/// `continue` with nothing to jump to is a syntax error
pub fn parse_eval_program(source: &str) -> Result<Program, JsError> {
    let mut dict = StringDict::new();
    Parser::new(source, &mut dict).reject_stray_jumps().parse_program()
}

/// What `return`, `break` and `continue` can target at the current point
#[derive(Debug, Default)]
struct JumpTargets {
    /// Report jumps with no target as syntax errors
    checked: bool,
    in_function: bool,
    loops: usize,
    switches: usize,
    /// Labels in scope, flagged when the label may belong to a loop
    labels: Vec<(JsString, bool)>,
}

/// Parser for ES5 source code
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
    /// Set while parsing the head of a `for` statement, where `in` ends the
    /// expression instead of being an operator
    no_in: bool,
    /// Statements and expressions currently being parsed, nested
    depth: usize,
    jumps: JumpTargets,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, string_dict: &'a mut StringDict) -> Self {
        let mut lexer = Lexer::new(source, string_dict);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::eof(0, 1, 1),
            no_in: false,
            depth: 0,
            jumps: JumpTargets::default(),
        }
    }

    /// Also reject stray `return`, `break` and `continue` at the top level
    pub fn reject_stray_jumps(mut self) -> Self {
        self.jumps.checked = true;
        self
    }

    #[inline]
    fn intern(&mut self, s: &str) -> JsString {
        self.lexer.string_dict().get_or_insert(s)
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program, JsError> {
        let mut body = Vec::new();

        while !self.is_at_end() {
            body.push(Rc::new(self.parse_statement()?));
        }

        Ok(Program { body })
    }

    // ============ STATEMENTS ============

    fn parse_statement(&mut self) -> Result<Node, JsError> {
        self.nested(Self::parse_statement_kind)
    }

    fn parse_statement_kind(&mut self) -> Result<Node, JsError> {
        match &self.current.kind {
            TokenKind::LBrace => self.parse_block_statement(),
            TokenKind::Semicolon => {
                self.advance();
                Ok(Node::EmptyStatement)
            }
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let declaration = self.parse_variable_declaration()?;
                self.expect_semicolon()?;
                Ok(Node::VariableDeclaration(declaration))
            }
            TokenKind::Function => {
                let function = self.parse_function(true)?;
                Ok(Node::FunctionDeclaration(Rc::new(function)))
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => {
                let (line, column) = (self.current.span.line, self.current.span.column);
                self.advance();
                let label = self.parse_jump_label()?;
                self.check_jump(label.as_ref(), false, line, column)?;
                Ok(Node::BreakStatement(JumpStatement { label }))
            }
            TokenKind::Continue => {
                let (line, column) = (self.current.span.line, self.current.span.column);
                self.advance();
                let label = self.parse_jump_label()?;
                self.check_jump(label.as_ref(), true, line, column)?;
                Ok(Node::ContinueStatement(JumpStatement { label }))
            }
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::With => self.parse_with_statement(),
            TokenKind::Debugger => {
                self.advance();
                self.expect_semicolon()?;
                Ok(Node::DebuggerStatement)
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// An expression statement, or a labeled statement when the expression
    /// is a lone identifier followed by `:`
    fn parse_expression_statement(&mut self) -> Result<Node, JsError> {
        let starts_with_identifier = self.check_identifier();
        let expression = self.parse_expression()?;

        if starts_with_identifier && self.check(&TokenKind::Colon) {
            if let Node::Identifier(label) = expression {
                self.advance();
                // A label followed by another label may still name a loop
                let labels_loop = matches!(
                    self.current.kind,
                    TokenKind::For | TokenKind::While | TokenKind::Do | TokenKind::Identifier(_)
                );
                self.jumps.labels.push((label.name.clone(), labels_loop));
                let body = self.parse_statement();
                self.jumps.labels.pop();
                let body = Rc::new(body?);
                return Ok(Node::LabeledStatement(LabeledStatement { label, body }));
            }
        }

        self.expect_semicolon()?;
        Ok(Node::ExpressionStatement(ExpressionStatement {
            expression: Rc::new(expression),
        }))
    }

    fn parse_block_statement(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::LBrace)?;

        let mut body = vec![];
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            body.push(Rc::new(self.parse_statement()?));
        }

        self.require_token(&TokenKind::RBrace)?;
        Ok(Node::BlockStatement(BlockStatement { body }))
    }

    /// `var a = 1, b` without the trailing semicolon
    fn parse_variable_declaration(&mut self) -> Result<VariableDeclaration, JsError> {
        let kind = match &self.current.kind {
            TokenKind::Var => VariableKind::Var,
            TokenKind::Let => VariableKind::Let,
            TokenKind::Const => VariableKind::Const,
            _ => return Err(self.unexpected_token("var, let or const")),
        };
        self.advance();

        let mut declarations = vec![self.parse_variable_declarator()?];
        while self.match_token(&TokenKind::Comma) {
            declarations.push(self.parse_variable_declarator()?);
        }

        Ok(VariableDeclaration { declarations, kind })
    }

    fn parse_variable_declarator(&mut self) -> Result<VariableDeclarator, JsError> {
        let id = self.parse_identifier()?;
        let init = if self.match_token(&TokenKind::Eq) {
            Some(Rc::new(self.parse_assignment_expression()?))
        } else {
            None
        };
        Ok(VariableDeclarator { id, init })
    }

    fn parse_if_statement(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::If)?;
        let test = Rc::new(self.parse_paren_expression()?);
        let consequent = Rc::new(self.parse_statement()?);

        let alternate = if self.match_token(&TokenKind::Else) {
            Some(Rc::new(self.parse_statement()?))
        } else {
            None
        };

        Ok(Node::IfStatement(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_for_statement(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::For)?;
        self.require_token(&TokenKind::LParen)?;

        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if matches!(
            self.current.kind,
            TokenKind::Var | TokenKind::Let | TokenKind::Const
        ) {
            let declaration = self.without_in(|p| p.parse_variable_declaration())?;
            let is_single_binding = matches!(
                declaration.declarations.as_slice(),
                [VariableDeclarator { init: None, .. }]
            );
            if is_single_binding && self.match_token(&TokenKind::In) {
                let left = Rc::new(Node::VariableDeclaration(declaration));
                return self.parse_for_in_rest(left);
            }
            Some(Rc::new(Node::VariableDeclaration(declaration)))
        } else {
            let expr = self.without_in(|p| p.parse_expression())?;
            if self.check(&TokenKind::In) {
                self.check_assignment_target(&expr, "Invalid left-hand side in for-in")?;
                self.advance();
                return self.parse_for_in_rest(Rc::new(expr));
            }
            Some(Rc::new(expr))
        };

        self.require_token(&TokenKind::Semicolon)?;

        let test = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(Rc::new(self.parse_expression()?))
        };

        self.require_token(&TokenKind::Semicolon)?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(Rc::new(self.parse_expression()?))
        };

        self.require_token(&TokenKind::RParen)?;
        let body = Rc::new(self.parse_loop_body()?);

        Ok(Node::ForStatement(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    /// The part of `for (left in right) body` after `in`
    fn parse_for_in_rest(&mut self, left: Rc<Node>) -> Result<Node, JsError> {
        let right = Rc::new(self.parse_expression()?);
        self.require_token(&TokenKind::RParen)?;
        let body = Rc::new(self.parse_loop_body()?);
        Ok(Node::ForInStatement(ForInStatement { left, right, body }))
    }

    fn parse_while_statement(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::While)?;
        let test = Rc::new(self.parse_paren_expression()?);
        let body = Rc::new(self.parse_loop_body()?);
        Ok(Node::WhileStatement(WhileStatement { test, body }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::Do)?;
        let body = Rc::new(self.parse_loop_body()?);
        self.require_token(&TokenKind::While)?;
        let test = Rc::new(self.parse_paren_expression()?);
        // The semicolon after `do ... while (x)` is always optional
        self.match_token(&TokenKind::Semicolon);
        Ok(Node::DoWhileStatement(WhileStatement { test, body }))
    }

    fn parse_loop_body(&mut self) -> Result<Node, JsError> {
        self.jumps.loops += 1;
        let body = self.parse_statement();
        self.jumps.loops -= 1;
        body
    }

    fn parse_switch_statement(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::Switch)?;
        let discriminant = Rc::new(self.parse_paren_expression()?);
        self.require_token(&TokenKind::LBrace)?;

        self.jumps.switches += 1;
        let cases = self.parse_switch_cases();
        self.jumps.switches -= 1;
        let cases = cases?;

        self.require_token(&TokenKind::RBrace)?;

        Ok(Node::SwitchStatement(SwitchStatement {
            discriminant,
            cases,
        }))
    }

    fn parse_switch_cases(&mut self) -> Result<Vec<SwitchCase>, JsError> {
        let mut cases = vec![];
        let mut seen_default = false;

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            let test = if self.match_token(&TokenKind::Case) {
                Some(Rc::new(self.parse_expression()?))
            } else {
                if seen_default {
                    return Err(self.error("More than one default clause in switch statement"));
                }
                self.require_token(&TokenKind::Default)?;
                seen_default = true;
                None
            };

            self.require_token(&TokenKind::Colon)?;

            let mut consequent = vec![];
            while !self.check(&TokenKind::Case)
                && !self.check(&TokenKind::Default)
                && !self.check(&TokenKind::RBrace)
                && !self.is_at_end()
            {
                consequent.push(Rc::new(self.parse_statement()?));
            }

            cases.push(SwitchCase { test, consequent });
        }

        Ok(cases)
    }

    fn parse_try_statement(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::Try)?;
        let block = Rc::new(self.parse_block_statement()?);

        let handler = if self.match_token(&TokenKind::Catch) {
            self.require_token(&TokenKind::LParen)?;
            let param = self.parse_identifier()?;
            self.require_token(&TokenKind::RParen)?;
            let body = Rc::new(self.parse_block_statement()?);
            Some(CatchClause { param, body })
        } else {
            None
        };

        let finalizer = if self.match_token(&TokenKind::Finally) {
            Some(Rc::new(self.parse_block_statement()?))
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }

        Ok(Node::TryStatement(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Node, JsError> {
        if self.jumps.checked && !self.jumps.in_function {
            return Err(self.error("Illegal return statement"));
        }
        self.require_token(&TokenKind::Return)?;

        let argument = if self.at_statement_end() {
            None
        } else {
            Some(Rc::new(self.parse_expression()?))
        };

        self.expect_semicolon()?;
        Ok(Node::ReturnStatement(ReturnStatement { argument }))
    }

    /// Optional label of `break`/`continue`; a newline ends the statement
    fn parse_jump_label(&mut self) -> Result<Option<Identifier>, JsError> {
        let label = if self.check_identifier() && !self.lexer.had_newline_before() {
            Some(self.parse_identifier()?)
        } else {
            None
        };
        self.expect_semicolon()?;
        Ok(label)
    }

    fn parse_throw_statement(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::Throw)?;

        if self.lexer.had_newline_before() {
            return Err(self.error("Illegal newline after throw"));
        }

        let argument = Rc::new(self.parse_expression()?);
        self.expect_semicolon()?;
        Ok(Node::ThrowStatement(ThrowStatement { argument }))
    }

    fn parse_with_statement(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::With)?;
        let object = Rc::new(self.parse_paren_expression()?);
        let body = Rc::new(self.parse_statement()?);
        Ok(Node::WithStatement(WithStatement { object, body }))
    }

    // ============ FUNCTIONS ============

    /// `function name(a, b) { ... }`; the name is required for declarations
    fn parse_function(&mut self, is_declaration: bool) -> Result<Function, JsError> {
        let start = self.current.span.start;
        self.require_token(&TokenKind::Function)?;

        let id = if self.check_identifier() {
            Some(self.parse_identifier()?)
        } else if is_declaration {
            return Err(self.error("Function statements require a function name"));
        } else {
            None
        };

        self.parse_function_rest(id, start)
    }

    /// Parameter list and body after the name
    fn parse_function_rest(&mut self, id: Option<Identifier>, start: usize) -> Result<Function, JsError> {
        // Jumps never cross a function boundary
        let outer = std::mem::replace(
            &mut self.jumps,
            JumpTargets {
                checked: true,
                in_function: true,
                ..JumpTargets::default()
            },
        );
        let parsed =
            self.allow_in(|p| Ok((p.parse_function_params()?, p.parse_block_statement()?)));
        self.jumps = outer;
        let (params, body) = parsed?;

        let source = self.lexer.source_slice(start, self.previous.span.end);
        Ok(Function {
            id,
            params,
            body: Rc::new(body),
            source: Some(Rc::from(source)),
        })
    }

    fn parse_function_params(&mut self) -> Result<Vec<Identifier>, JsError> {
        self.require_token(&TokenKind::LParen)?;
        let mut params = vec![];
        if !self.check(&TokenKind::RParen) {
            params.push(self.parse_identifier()?);
            while self.match_token(&TokenKind::Comma) {
                params.push(self.parse_identifier()?);
            }
        }
        self.require_token(&TokenKind::RParen)?;
        Ok(params)
    }

    // ============ EXPRESSIONS ============

    fn parse_expression(&mut self) -> Result<Node, JsError> {
        let first = self.parse_assignment_expression()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }

        let mut expressions = vec![Rc::new(first)];
        while self.match_token(&TokenKind::Comma) {
            expressions.push(Rc::new(self.parse_assignment_expression()?));
        }
        Ok(Node::SequenceExpression(SequenceExpression { expressions }))
    }

    /// `( expression )` as used by `if`, `while`, `switch` and `with`
    fn parse_paren_expression(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::LParen)?;
        let expr = self.parse_expression()?;
        self.require_token(&TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_assignment_expression(&mut self) -> Result<Node, JsError> {
        self.nested(|p| {
            let expr = p.parse_conditional_expression()?;

            if let Some(operator) = p.current_assignment_op() {
                p.check_assignment_target(&expr, "Invalid left-hand side in assignment")?;
                p.advance();
                let right = Rc::new(p.parse_assignment_expression()?);
                return Ok(Node::AssignmentExpression(AssignmentExpression {
                    operator,
                    left: Rc::new(expr),
                    right,
                }));
            }

            Ok(expr)
        })
    }

    fn parse_conditional_expression(&mut self) -> Result<Node, JsError> {
        let test = self.parse_binary_expression(0)?;

        if self.match_token(&TokenKind::Question) {
            let consequent = Rc::new(self.allow_in(|p| p.parse_assignment_expression())?);
            self.require_token(&TokenKind::Colon)?;
            let alternate = Rc::new(self.parse_assignment_expression()?);
            return Ok(Node::ConditionalExpression(ConditionalExpression {
                test: Rc::new(test),
                consequent,
                alternate,
            }));
        }

        Ok(test)
    }

    /// Pratt parser for binary and logical expressions
    fn parse_binary_expression(&mut self, min_prec: u8) -> Result<Node, JsError> {
        let mut left = self.parse_unary_expression()?;

        while let Some((op, prec)) = self.current_binary_op() {
            if prec < min_prec {
                break;
            }
            self.advance();

            // All binary operators are left associative
            let right = Rc::new(self.parse_binary_expression(prec + 1)?);
            let left_node = Rc::new(left);
            left = match op {
                Operator::Logical(operator) => Node::LogicalExpression(LogicalExpression {
                    operator,
                    left: left_node,
                    right,
                }),
                Operator::Binary(operator) => Node::BinaryExpression(BinaryExpression {
                    operator,
                    left: left_node,
                    right,
                }),
            };
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> Result<Node, JsError> {
        if let Some(operator) = self.current_unary_op() {
            self.advance();
            let argument = Rc::new(self.nested(Self::parse_unary_expression)?);
            return Ok(Node::UnaryExpression(UnaryExpression { operator, argument }));
        }

        if let Some(operator) = self.current_update_op() {
            self.advance();
            let argument = self.nested(Self::parse_unary_expression)?;
            self.check_assignment_target(
                &argument,
                "Invalid left-hand side expression in prefix operation",
            )?;
            return Ok(Node::UpdateExpression(UpdateExpression {
                operator,
                prefix: true,
                argument: Rc::new(argument),
            }));
        }

        self.parse_postfix_expression()
    }

    fn parse_postfix_expression(&mut self) -> Result<Node, JsError> {
        let expr = self.parse_left_hand_side_expression()?;

        // Restricted production: no line break before postfix `++`/`--`
        if self.lexer.had_newline_before() {
            return Ok(expr);
        }
        let Some(operator) = self.current_update_op() else {
            return Ok(expr);
        };
        self.check_assignment_target(
            &expr,
            "Invalid left-hand side expression in postfix operation",
        )?;
        self.advance();
        Ok(Node::UpdateExpression(UpdateExpression {
            operator,
            prefix: false,
            argument: Rc::new(expr),
        }))
    }

    /// Member accesses and calls, including `new` with arguments
    fn parse_left_hand_side_expression(&mut self) -> Result<Node, JsError> {
        let mut expr = self.parse_member_expression()?;

        loop {
            if self.check(&TokenKind::LParen) {
                let arguments = self.parse_arguments()?;
                expr = Node::CallExpression(CallExpression {
                    callee: Rc::new(expr),
                    arguments,
                });
            } else if let Some(member) = self.parse_member_suffix(&expr)? {
                expr = member;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// A primary expression or `new` expression followed by `.name` and
    /// `[expr]` accesses, but no calls
    fn parse_member_expression(&mut self) -> Result<Node, JsError> {
        let mut expr = if self.match_token(&TokenKind::New) {
            let callee = Rc::new(self.nested(Self::parse_member_expression)?);
            let arguments = if self.check(&TokenKind::LParen) {
                self.parse_arguments()?
            } else {
                vec![]
            };
            Node::NewExpression(CallExpression { callee, arguments })
        } else {
            self.parse_primary_expression()?
        };

        while let Some(member) = self.parse_member_suffix(&expr)? {
            expr = member;
        }

        Ok(expr)
    }

    /// `.name` or `[expr]` applied to `object`, when the current token
    /// starts one
    fn parse_member_suffix(&mut self, object: &Node) -> Result<Option<Node>, JsError> {
        let (property, computed) = if self.match_token(&TokenKind::Dot) {
            (Node::Identifier(self.parse_identifier_name()?), false)
        } else if self.match_token(&TokenKind::LBracket) {
            let property = self.allow_in(|p| p.parse_expression())?;
            self.require_token(&TokenKind::RBracket)?;
            (property, true)
        } else {
            return Ok(None);
        };

        Ok(Some(Node::MemberExpression(MemberExpression {
            object: Rc::new(object.clone()),
            property: Rc::new(property),
            computed,
        })))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Rc<Node>>, JsError> {
        self.require_token(&TokenKind::LParen)?;
        let arguments = self.allow_in(|p| {
            let mut arguments = vec![];
            if !p.check(&TokenKind::RParen) {
                arguments.push(Rc::new(p.parse_assignment_expression()?));
                while p.match_token(&TokenKind::Comma) {
                    arguments.push(Rc::new(p.parse_assignment_expression()?));
                }
            }
            Ok(arguments)
        })?;
        self.require_token(&TokenKind::RParen)?;
        Ok(arguments)
    }

    fn parse_primary_expression(&mut self) -> Result<Node, JsError> {
        let literal = match &self.current.kind {
            TokenKind::This => {
                self.advance();
                return Ok(Node::ThisExpression);
            }
            TokenKind::Identifier(_) => return Ok(Node::Identifier(self.parse_identifier()?)),
            TokenKind::Number(n) => LiteralValue::Number(*n),
            TokenKind::String(s) => LiteralValue::String(s.clone()),
            TokenKind::True => LiteralValue::Boolean(true),
            TokenKind::False => LiteralValue::Boolean(false),
            TokenKind::Null => LiteralValue::Null,
            TokenKind::Slash | TokenKind::SlashEq => {
                // In operand position a slash starts a regexp literal
                self.current = self.lexer.rescan_as_regexp(self.current.span);
                match &self.current.kind {
                    TokenKind::RegExp(pattern, flags) => LiteralValue::RegExp {
                        pattern: pattern.clone(),
                        flags: flags.clone(),
                    },
                    _ => return Err(self.error("Invalid regular expression: missing /")),
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.allow_in(|p| p.parse_expression())?;
                self.require_token(&TokenKind::RParen)?;
                return Ok(expr);
            }
            TokenKind::LBracket => return self.parse_array_literal(),
            TokenKind::LBrace => return self.parse_object_literal(),
            TokenKind::Function => {
                let function = self.parse_function(false)?;
                return Ok(Node::FunctionExpression(Rc::new(function)));
            }
            _ => return Err(self.unexpected_token("expression")),
        };
        self.advance();
        Ok(Node::Literal(Literal { value: literal }))
    }

    fn parse_array_literal(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::LBracket)?;

        let elements = self.allow_in(|p| {
            let mut elements = vec![];
            while !p.check(&TokenKind::RBracket) && !p.is_at_end() {
                // A comma with no element before it is a hole
                if p.match_token(&TokenKind::Comma) {
                    elements.push(None);
                    continue;
                }
                elements.push(Some(Rc::new(p.parse_assignment_expression()?)));
                if !p.check(&TokenKind::RBracket) {
                    p.require_token(&TokenKind::Comma)?;
                }
            }
            Ok(elements)
        })?;

        self.require_token(&TokenKind::RBracket)?;
        Ok(Node::ArrayExpression(ArrayExpression { elements }))
    }

    fn parse_object_literal(&mut self) -> Result<Node, JsError> {
        self.require_token(&TokenKind::LBrace)?;

        let properties = self.allow_in(|p| {
            let mut properties = vec![];
            while !p.check(&TokenKind::RBrace) && !p.is_at_end() {
                properties.push(p.parse_property()?);
                if !p.check(&TokenKind::RBrace) {
                    p.require_token(&TokenKind::Comma)?;
                }
            }
            Ok(properties)
        })?;

        self.require_token(&TokenKind::RBrace)?;
        Ok(Node::ObjectExpression(ObjectExpression { properties }))
    }

    /// `key: value`. Accessors (`get key() {}`, `set key(v) {}`) are
    /// rejected at the `get`/`set` token.
    fn parse_property(&mut self) -> Result<Property, JsError> {
        let is_accessor = matches!(
            &self.current.kind,
            TokenKind::Identifier(name) if name == "get" || name == "set"
        );
        if is_accessor && self.peek_is_property_name() {
            return Err(self.error("Object getters and setters are not supported"));
        }

        let key = Rc::new(self.parse_property_key()?);
        self.require_token(&TokenKind::Colon)?;
        let value = Rc::new(self.parse_assignment_expression()?);
        Ok(Property {
            key,
            value,
            kind: PropertyKind::Init,
        })
    }

    /// Identifier names (keywords included), strings and numbers
    fn parse_property_key(&mut self) -> Result<Node, JsError> {
        let value = match &self.current.kind {
            TokenKind::String(s) => LiteralValue::String(s.clone()),
            TokenKind::Number(n) => LiteralValue::Number(*n),
            _ => return Ok(Node::Identifier(self.parse_identifier_name()?)),
        };
        self.advance();
        Ok(Node::Literal(Literal { value }))
    }

    // ============ IDENTIFIERS ============

    fn parse_identifier(&mut self) -> Result<Identifier, JsError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(Identifier { name })
            }
            _ => Err(self.unexpected_token("identifier")),
        }
    }

    /// An identifier or a reserved word, as allowed after `.` and as an
    /// object literal key
    fn parse_identifier_name(&mut self) -> Result<Identifier, JsError> {
        if let Some(text) = self.current.kind.keyword_text() {
            let name = self.intern(text);
            self.advance();
            return Ok(Identifier { name });
        }
        self.parse_identifier()
    }

    // ============ TOKEN HELPERS ============

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn require_token(&mut self, kind: &TokenKind) -> Result<(), JsError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected_token(&describe_token(kind)))
        }
    }

    /// True where a statement may end without an explicit semicolon
    fn at_statement_end(&self) -> bool {
        self.check(&TokenKind::Semicolon)
            || self.check(&TokenKind::RBrace)
            || self.is_at_end()
            || self.lexer.had_newline_before()
    }

    fn expect_semicolon(&mut self) -> Result<(), JsError> {
        if self.match_token(&TokenKind::Semicolon) {
            return Ok(());
        }

        // ASI: accept if at end, before }, or after newline
        if self.at_statement_end() {
            return Ok(());
        }

        Err(self.unexpected_token("';'"))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn check_identifier(&self) -> bool {
        matches!(self.current.kind, TokenKind::Identifier(_))
    }

    /// Whether the token after the current one can name a property
    fn peek_is_property_name(&mut self) -> bool {
        let checkpoint = self.lexer.checkpoint();
        let next = self.lexer.next_token();
        self.lexer.restore(checkpoint);
        matches!(
            next.kind,
            TokenKind::Identifier(_) | TokenKind::String(_) | TokenKind::Number(_)
        ) || next.kind.keyword_text().is_some()
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// Run `f` with `in` treated as an operator again (inside brackets,
    /// parentheses and function bodies)
    fn allow_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, JsError>) -> Result<T, JsError> {
        let saved = std::mem::replace(&mut self.no_in, false);
        let result = f(self);
        self.no_in = saved;
        result
    }

    fn without_in<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, JsError>) -> Result<T, JsError> {
        let saved = std::mem::replace(&mut self.no_in, true);
        let result = f(self);
        self.no_in = saved;
        result
    }

    /// Run `f` one nesting level deeper, failing once the input nests past
    /// [`MAX_NESTING_DEPTH`]
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, JsError>) -> Result<T, JsError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("Maximum nesting depth exceeded"));
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        result
    }

    /// A `break` or `continue` must have an enclosing statement to leave
    fn check_jump(
        &self,
        label: Option<&Identifier>,
        is_continue: bool,
        line: u32,
        column: u32,
    ) -> Result<(), JsError> {
        if !self.jumps.checked {
            return Ok(());
        }
        let has_target = match label {
            Some(label) => {
                let Some((_, labels_loop)) =
                    self.jumps.labels.iter().rev().find(|(name, _)| *name == label.name)
                else {
                    return Err(JsError::syntax_error(
                        format!("Undefined label '{}'", label.name),
                        line,
                        column,
                    ));
                };
                !is_continue || (*labels_loop && self.jumps.loops > 0)
            }
            None if is_continue => self.jumps.loops > 0,
            None => self.jumps.loops > 0 || self.jumps.switches > 0,
        };
        if has_target {
            return Ok(());
        }
        let keyword = if is_continue { "continue" } else { "break" };
        Err(JsError::syntax_error(
            format!("Illegal {} statement", keyword),
            line,
            column,
        ))
    }

    fn error(&self, message: &str) -> JsError {
        JsError::syntax_error(message, self.current.span.line, self.current.span.column)
    }

    fn unexpected_token(&self, expected: &str) -> JsError {
        let found = match &self.current.kind {
            TokenKind::Invalid(_) => "Invalid or unexpected token".to_string(),
            TokenKind::Eof => "Unexpected end of input".to_string(),
            other => format!("Unexpected {}", describe_token(other)),
        };
        JsError::syntax_error(
            format!("{}, expected {}", found, expected),
            self.current.span.line,
            self.current.span.column,
        )
    }

    /// Only identifiers and member expressions can be assigned to
    fn check_assignment_target(&self, expr: &Node, message: &str) -> Result<(), JsError> {
        match expr {
            Node::Identifier(_) | Node::MemberExpression(_) => Ok(()),
            _ => Err(self.error(message)),
        }
    }

    fn current_binary_op(&self) -> Option<(Operator, u8)> {
        let op = match &self.current.kind {
            TokenKind::PipePipe => return Some((Operator::Logical(LogicalOp::Or), 4)),
            TokenKind::AmpAmp => return Some((Operator::Logical(LogicalOp::And), 5)),
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::BangEq => BinaryOp::NotEq,
            TokenKind::EqEqEq => BinaryOp::StrictEq,
            TokenKind::BangEqEq => BinaryOp::StrictNotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::In if !self.no_in => BinaryOp::In,
            TokenKind::Instanceof => BinaryOp::Instanceof,
            TokenKind::LtLt => BinaryOp::LShift,
            TokenKind::GtGt => BinaryOp::RShift,
            TokenKind::GtGtGt => BinaryOp::URShift,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            _ => return None,
        };
        Some((Operator::Binary(op), binary_precedence(op)))
    }

    fn current_unary_op(&self) -> Option<UnaryOp> {
        match &self.current.kind {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        }
    }

    fn current_update_op(&self) -> Option<UpdateOp> {
        match &self.current.kind {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        }
    }

    fn current_assignment_op(&self) -> Option<AssignmentOp> {
        match &self.current.kind {
            TokenKind::Eq => Some(AssignmentOp::Assign),
            TokenKind::PlusEq => Some(AssignmentOp::AddAssign),
            TokenKind::MinusEq => Some(AssignmentOp::SubAssign),
            TokenKind::StarEq => Some(AssignmentOp::MulAssign),
            TokenKind::SlashEq => Some(AssignmentOp::DivAssign),
            TokenKind::PercentEq => Some(AssignmentOp::ModAssign),
            TokenKind::AmpEq => Some(AssignmentOp::BitAndAssign),
            TokenKind::PipeEq => Some(AssignmentOp::BitOrAssign),
            TokenKind::CaretEq => Some(AssignmentOp::BitXorAssign),
            TokenKind::LtLtEq => Some(AssignmentOp::LShiftAssign),
            TokenKind::GtGtEq => Some(AssignmentOp::RShiftAssign),
            TokenKind::GtGtGtEq => Some(AssignmentOp::URShiftAssign),
            _ => None,
        }
    }
}

/// Operators handled by the Pratt loop
#[derive(Debug, Clone, Copy)]
enum Operator {
    Binary(BinaryOp),
    Logical(LogicalOp),
}

/// Binding power of binary operators; `||` is 4 and `&&` is 5
fn binary_precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::BitOr => 6,
        BinaryOp::BitXor => 7,
        BinaryOp::BitAnd => 8,
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::StrictEq | BinaryOp::StrictNotEq => 9,
        BinaryOp::Lt
        | BinaryOp::LtEq
        | BinaryOp::Gt
        | BinaryOp::GtEq
        | BinaryOp::In
        | BinaryOp::Instanceof => 10,
        BinaryOp::LShift | BinaryOp::RShift | BinaryOp::URShift => 11,
        BinaryOp::Add | BinaryOp::Sub => 12,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 13,
    }
}

/// Human-readable token name for error messages
fn describe_token(kind: &TokenKind) -> String {
    if let Some(text) = kind.keyword_text() {
        return format!("'{}'", text);
    }
    let punctuator = match kind {
        TokenKind::Number(n) => return format!("number {}", n),
        TokenKind::String(_) => return "string".to_string(),
        TokenKind::RegExp(..) => return "regular expression".to_string(),
        TokenKind::Identifier(name) => return format!("identifier '{}'", name),
        TokenKind::Invalid(c) => return format!("character '{}'", c),
        TokenKind::Eof => return "end of input".to_string(),
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::LBrace => "{",
        TokenKind::RBrace => "}",
        TokenKind::LBracket => "[",
        TokenKind::RBracket => "]",
        TokenKind::Semicolon => ";",
        TokenKind::Comma => ",",
        TokenKind::Colon => ":",
        TokenKind::Dot => ".",
        TokenKind::Question => "?",
        TokenKind::Eq => "=",
        _ => return format!("token {:?}", kind),
    };
    format!("'{}'", punctuator)
}
