//! Template parser.
//!
//! Converts a slice of lexer [`Token`]s into a [`Template`]: a sequence of
//! [`Item`]s, where injections may nest further item sequences. The grammar:
//!
//! ```text
//! items     := item+
//! item      := TEXT | ESCAPED_CHAR | injection | SHORTCUT_VARIABLE
//! injection := ${ VARIABLE }
//!            | ${ if VARIABLE } items ${ endif }
//!            | ${ if not VARIABLE } items ${ endif }
//!            | ${ if VARIABLE } items ${ else } items ${ endif }
//!            | ${ for INDEX_VAR in VARIABLE } items ${ endfor }
//! ```
//!
//! Every items sequence, including every block body, needs at least one item.

use hookhub_core::error::TemplateError;

use crate::lexer::Token;

/// A node of the parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A run of literal text.
    Text(String),
    /// The character produced by an escape sequence.
    EscapedChar(char),
    /// An embedded expression.
    Injection(Injection),
}

/// An expression to be replaced by its evaluated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    /// `${data.a.b}` or `$data.a.b`.
    Variable(String),
    /// `${if P}...${endif}`
    If {
        /// The condition path.
        condition: String,
        /// Rendered when the condition is truthy.
        body: Vec<Item>,
    },
    /// `${if not P}...${endif}`
    IfNot {
        /// The condition path.
        condition: String,
        /// Rendered when the condition is falsy.
        body: Vec<Item>,
    },
    /// `${if P}...${else}...${endif}`
    IfElse {
        /// The condition path.
        condition: String,
        /// Rendered when the condition is truthy.
        then_body: Vec<Item>,
        /// Rendered when the condition is falsy.
        else_body: Vec<Item>,
    },
    /// `${for X in P}...${endfor}`
    For {
        /// The single-character index name, referenced as `key.X`.
        index: char,
        /// Path of the sequence or map to iterate.
        source: String,
        /// The loop body.
        body: Vec<Item>,
    },
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// The root items sequence.
    pub items: Vec<Item>,
}

/// Parses a list of tokens into a `Template`.
///
/// # Errors
///
/// Returns `ParseError` for unmatched delimiters, unclosed blocks, keywords
/// out of position, empty item sequences, duplicate loop index names, and
/// malformed escape tokens.
pub fn parse(tokens: &[Token]) -> Result<Template, TemplateError> {
    let mut parser = ParserState::new(tokens);
    let items = parser.parse_items(&[])?;
    tracing::debug!(items = items.len(), "parsed template");
    Ok(Template { items })
}

struct ParserState<'a> {
    tokens: &'a [Token],
    pos: usize,
    active_indexes: Vec<char>,
}

impl<'a> ParserState<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            active_indexes: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_second(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos + 1)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), TemplateError> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(syntax_error(format!("expected {expected}, found {token}"))),
            None => Err(syntax_error(format!("expected {expected}, found end of input"))),
        }
    }

    fn expect_variable(&mut self) -> Result<String, TemplateError> {
        match self.advance() {
            Some(Token::Variable(path)) => Ok(path.clone()),
            Some(token) => Err(syntax_error(format!("expected a variable, found {token}"))),
            None => Err(syntax_error("expected a variable, found end of input")),
        }
    }

    /// Parses items until `${` followed by one of `closers`, or end of input.
    fn parse_items(&mut self, closers: &[Token]) -> Result<Vec<Item>, TemplateError> {
        let mut items = Vec::new();

        while let Some(token) = self.peek() {
            match token {
                Token::Text(c) => {
                    if let Some(Item::Text(run)) = items.last_mut() {
                        run.push(*c);
                    } else {
                        items.push(Item::Text(c.to_string()));
                    }
                    self.pos += 1;
                }
                Token::EscapedChar(raw) => {
                    items.push(Item::EscapedChar(escaped_char(raw)?));
                    self.pos += 1;
                }
                Token::ShortcutVariable(path) => {
                    items.push(Item::Injection(Injection::Variable(path.clone())));
                    self.pos += 1;
                }
                Token::ExprStart => match self.peek_second() {
                    Some(next) if closers.contains(next) => break,
                    Some(next @ (Token::Else | Token::EndIf | Token::EndFor)) => {
                        return Err(syntax_error(format!("unexpected {next}")));
                    }
                    _ => items.push(Item::Injection(self.parse_injection()?)),
                },
                other => {
                    return Err(syntax_error(format!("unexpected {other} outside an expression")));
                }
            }
        }

        if self.peek().is_none() && !closers.is_empty() {
            let expected: Vec<String> = closers.iter().map(ToString::to_string).collect();
            return Err(syntax_error(format!(
                "unclosed block: expected {}",
                expected.join(" or ")
            )));
        }

        if items.is_empty() {
            return Err(syntax_error("expected at least one item"));
        }

        Ok(items)
    }

    fn parse_injection(&mut self) -> Result<Injection, TemplateError> {
        self.expect(&Token::ExprStart)?;

        match self.advance() {
            Some(Token::Variable(path)) => {
                self.expect(&Token::ExprEnd)?;
                Ok(Injection::Variable(path.clone()))
            }
            Some(Token::If) => self.parse_if(),
            Some(Token::For) => self.parse_for(),
            Some(Token::ExprEnd) => Err(syntax_error("empty expression")),
            Some(token) => Err(syntax_error(format!("unexpected {token} in expression"))),
            None => Err(syntax_error("unterminated expression")),
        }
    }

    fn parse_if(&mut self) -> Result<Injection, TemplateError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            let condition = self.expect_variable()?;
            self.expect(&Token::ExprEnd)?;
            let body = self.parse_items(&[Token::EndIf])?;
            self.close_block(&Token::EndIf)?;
            return Ok(Injection::IfNot { condition, body });
        }

        let condition = self.expect_variable()?;
        self.expect(&Token::ExprEnd)?;
        let then_body = self.parse_items(&[Token::Else, Token::EndIf])?;

        if self.peek_second() == Some(&Token::Else) {
            self.close_block(&Token::Else)?;
            let else_body = self.parse_items(&[Token::EndIf])?;
            self.close_block(&Token::EndIf)?;
            return Ok(Injection::IfElse {
                condition,
                then_body,
                else_body,
            });
        }

        self.close_block(&Token::EndIf)?;
        Ok(Injection::If {
            condition,
            body: then_body,
        })
    }

    fn parse_for(&mut self) -> Result<Injection, TemplateError> {
        let index = match self.advance() {
            Some(Token::IndexVar(c)) => *c,
            Some(token) => {
                return Err(syntax_error(format!("expected a loop index, found {token}")));
            }
            None => return Err(syntax_error("expected a loop index, found end of input")),
        };
        if self.active_indexes.contains(&index) {
            return Err(syntax_error(format!(
                "loop index '{index}' is already used by an enclosing loop"
            )));
        }
        self.expect(&Token::In)?;
        let source = self.expect_variable()?;
        self.expect(&Token::ExprEnd)?;

        self.active_indexes.push(index);
        let body = self.parse_items(&[Token::EndFor]);
        self.active_indexes.pop();
        let body = body?;

        self.close_block(&Token::EndFor)?;
        Ok(Injection::For {
            index,
            source,
            body,
        })
    }

    /// Consumes `${ keyword }`.
    fn close_block(&mut self, keyword: &Token) -> Result<(), TemplateError> {
        self.expect(&Token::ExprStart)?;
        self.expect(keyword)?;
        self.expect(&Token::ExprEnd)
    }
}

fn escaped_char(raw: &str) -> Result<char, TemplateError> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(_), Some(c), None) => Ok(c),
        _ => Err(syntax_error(format!("escaped character \"{raw}\" is invalid"))),
    }
}

fn syntax_error(message: impl Into<String>) -> TemplateError {
    TemplateError::ParseError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_str(source: &str) -> Result<Template, TemplateError> {
        parse(&tokenize(source)?)
    }

    fn var(path: &str) -> Item {
        Item::Injection(Injection::Variable(path.to_string()))
    }

    #[test]
    fn test_text_is_merged() {
        let template = parse_str("Hello world").unwrap();
        assert_eq!(template.items, vec![Item::Text("Hello world".to_string())]);
    }

    #[test]
    fn test_escaped_char() {
        let template = parse_str("a\\$b").unwrap();
        assert_eq!(
            template.items,
            vec![
                Item::Text("a".to_string()),
                Item::EscapedChar('$'),
                Item::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_escape_token() {
        let tokens = vec![Token::EscapedChar("\\".to_string())];
        assert!(matches!(parse(&tokens), Err(TemplateError::ParseError(_))));
    }

    #[test]
    fn test_shortcut_and_braced_variable_are_equivalent() {
        let a = parse_str("$data.a.b").unwrap();
        let b = parse_str("${data.a.b}").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.items, vec![var("data.a.b")]);
    }

    #[test]
    fn test_if_block() {
        let template = parse_str("${if data.ok}yes${endif}").unwrap();
        assert_eq!(
            template.items,
            vec![Item::Injection(Injection::If {
                condition: "data.ok".to_string(),
                body: vec![Item::Text("yes".to_string())],
            })]
        );
    }

    #[test]
    fn test_if_not_block() {
        let template = parse_str("${if not data.ok}no${endif}").unwrap();
        assert!(matches!(
            &template.items[0],
            Item::Injection(Injection::IfNot { condition, .. }) if condition == "data.ok"
        ));
    }

    #[test]
    fn test_if_else_block() {
        let template = parse_str("${if data.ok}yes${else}no${endif}").unwrap();
        let Item::Injection(Injection::IfElse {
            then_body,
            else_body,
            ..
        }) = &template.items[0]
        else {
            panic!("expected IfElse");
        };
        assert_eq!(then_body, &vec![Item::Text("yes".to_string())]);
        assert_eq!(else_body, &vec![Item::Text("no".to_string())]);
    }

    #[test]
    fn test_if_not_rejects_else() {
        assert!(parse_str("${if not data.ok}a${else}b${endif}").is_err());
    }

    #[test]
    fn test_for_block() {
        let template = parse_str("${for i in data.items}$key.i,${endfor}").unwrap();
        assert_eq!(
            template.items,
            vec![Item::Injection(Injection::For {
                index: 'i',
                source: "data.items".to_string(),
                body: vec![var("key.i"), Item::Text(",".to_string())],
            })]
        );
    }

    #[test]
    fn test_nested_blocks() {
        let template =
            parse_str("${for i in data.a}${if key.i}${for j in data.b}x${endfor}${endif}${endfor}")
                .unwrap();
        assert_eq!(template.items.len(), 1);
    }

    #[test]
    fn test_sibling_loops_may_reuse_index() {
        assert!(parse_str("${for i in data.a}x${endfor}${for i in data.b}y${endfor}").is_ok());
    }

    #[test]
    fn test_nested_duplicate_index_is_rejected() {
        let err = parse_str("${for i in data.a}${for i in data.b}x${endfor}${endfor}").unwrap_err();
        assert!(matches!(err, TemplateError::ParseError(ref m) if m.contains("already used")));
    }

    #[test]
    fn test_empty_body_is_rejected() {
        assert!(parse_str("${if data.x}${endif}").is_err());
        assert!(parse_str("${for i in data.x}${endfor}").is_err());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse_str("${if data.x}yes").unwrap_err();
        assert!(matches!(err, TemplateError::ParseError(ref m) if m.contains("unclosed")));
    }

    #[test]
    fn test_unterminated_expression() {
        assert!(parse_str("${data.x").is_err());
    }

    #[test]
    fn test_stray_closing_keyword() {
        assert!(parse_str("a${endif}").is_err());
        assert!(parse_str("a${endfor}").is_err());
        assert!(parse_str("a${else}").is_err());
    }

    #[test]
    fn test_mismatched_closer() {
        assert!(parse_str("${for i in data.x}a${endif}").is_err());
    }

    #[test]
    fn test_empty_expression() {
        assert!(parse_str("${}").is_err());
    }

    #[test]
    fn test_keyword_out_of_position() {
        assert!(parse_str("${in data.x}").is_err());
        assert!(parse_str("${for i data.x}a${endfor}").is_err());
        assert!(parse_str("${if}a${endif}").is_err());
    }
}
