//! Parser: lexed items to an action tree

use super::functions::is_builtin;
use super::lexer::{Item, Token};
use super::value::Value;
use super::SyntaxError;

/// One operand of a command.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(Vec<String>),
    Root(Vec<String>),
    Literal(Value),
    Func(String),
    Sub(Pipeline),
}

/// A command: the first operand is the callee when it is a function.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub operands: Vec<Operand>,
}

/// Commands joined by `|`; each result is passed as the last argument of the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Output(Pipeline),
    If {
        branches: Vec<(Pipeline, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
    Range {
        pipeline: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
    With {
        pipeline: Pipeline,
        body: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

enum Terminator {
    Eof,
    End,
    Else(Vec<Token>),
}

/// Parse lexed items into a node list.
pub fn parse(items: Vec<Item>) -> Result<Vec<Node>, SyntaxError> {
    let mut parser = Parser {
        items: items.into_iter(),
        last_offset: 0,
    };
    let (nodes, term) = parser.parse_list()?;
    match term {
        Terminator::Eof => Ok(nodes),
        Terminator::End => Err(SyntaxError::new("unexpected {{end}}", parser.last_offset)),
        Terminator::Else(_) => Err(SyntaxError::new("unexpected {{else}}", parser.last_offset)),
    }
}

struct Parser {
    items: std::vec::IntoIter<Item>,
    last_offset: usize,
}

impl Parser {
    fn parse_list(&mut self) -> Result<(Vec<Node>, Terminator), SyntaxError> {
        let mut nodes = Vec::new();
        while let Some(item) = self.items.next() {
            let (mut tokens, offset) = match item {
                Item::Text(text) => {
                    nodes.push(Node::Text(text));
                    continue;
                }
                Item::Action { tokens, offset } => (tokens, offset),
            };
            self.last_offset = offset;
            let keyword = match tokens.first() {
                Some(Token::Ident(word)) => word.clone(),
                _ => String::new(),
            };
            match keyword.as_str() {
                "end" => {
                    if tokens.len() > 1 {
                        return Err(SyntaxError::new("unexpected tokens after end", offset));
                    }
                    return Ok((nodes, Terminator::End));
                }
                "else" => {
                    tokens.remove(0);
                    return Ok((nodes, Terminator::Else(tokens)));
                }
                "if" => {
                    tokens.remove(0);
                    nodes.push(self.parse_if(tokens, offset)?);
                }
                "range" | "with" => {
                    tokens.remove(0);
                    let pipeline = parse_pipeline(&tokens, offset)?;
                    let (body, otherwise) = self.parse_body_else(&keyword, offset)?;
                    nodes.push(if keyword == "range" {
                        Node::Range {
                            pipeline,
                            body,
                            otherwise,
                        }
                    } else {
                        Node::With {
                            pipeline,
                            body,
                            otherwise,
                        }
                    });
                }
                _ => nodes.push(Node::Output(parse_pipeline(&tokens, offset)?)),
            }
        }
        Ok((nodes, Terminator::Eof))
    }

    fn parse_if(&mut self, cond: Vec<Token>, offset: usize) -> Result<Node, SyntaxError> {
        let mut branches = vec![(parse_pipeline(&cond, offset)?, Vec::new())];
        loop {
            let (body, term) = self.parse_list()?;
            if let Some(last) = branches.last_mut() {
                last.1 = body;
            }
            match term {
                Terminator::End => {
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                    })
                }
                Terminator::Eof => return Err(SyntaxError::new("unexpected EOF in if", offset)),
                Terminator::Else(rest) if rest.is_empty() => {
                    let (otherwise, term) = self.parse_list()?;
                    if !matches!(term, Terminator::End) {
                        return Err(SyntaxError::new("expected {{end}} after else", offset));
                    }
                    return Ok(Node::If {
                        branches,
                        otherwise,
                    });
                }
                Terminator::Else(rest) => match rest.first() {
                    Some(Token::Ident(word)) if word == "if" => {
                        branches.push((parse_pipeline(&rest[1..], self.last_offset)?, Vec::new()));
                    }
                    _ => {
                        return Err(SyntaxError::new(
                            "expected if after else",
                            self.last_offset,
                        ))
                    }
                },
            }
        }
    }

    fn parse_body_else(
        &mut self,
        keyword: &str,
        offset: usize,
    ) -> Result<(Vec<Node>, Vec<Node>), SyntaxError> {
        let (body, term) = self.parse_list()?;
        match term {
            Terminator::End => Ok((body, Vec::new())),
            Terminator::Eof => Err(SyntaxError::new(
                format!("unexpected EOF in {keyword}"),
                offset,
            )),
            Terminator::Else(rest) if rest.is_empty() => {
                let (otherwise, term) = self.parse_list()?;
                if matches!(term, Terminator::End) {
                    Ok((body, otherwise))
                } else {
                    Err(SyntaxError::new(
                        format!("expected {{{{end}}}} after else in {keyword}"),
                        offset,
                    ))
                }
            }
            Terminator::Else(_) => Err(SyntaxError::new(
                format!("unexpected tokens after else in {keyword}"),
                self.last_offset,
            )),
        }
    }
}

/// Parse a token slice into a pipeline.
fn parse_pipeline(tokens: &[Token], offset: usize) -> Result<Pipeline, SyntaxError> {
    let mut pos = 0;
    let pipeline = parse_pipeline_at(tokens, &mut pos, offset, false)?;
    if pos != tokens.len() {
        return Err(SyntaxError::new("unexpected right paren", offset));
    }
    Ok(pipeline)
}

fn parse_pipeline_at(
    tokens: &[Token],
    pos: &mut usize,
    offset: usize,
    nested: bool,
) -> Result<Pipeline, SyntaxError> {
    let mut commands = Vec::new();
    let mut operands = Vec::new();

    while *pos < tokens.len() {
        let token = &tokens[*pos];
        *pos += 1;
        match token {
            Token::Pipe => {
                if operands.is_empty() {
                    return Err(SyntaxError::new("missing command before |", offset));
                }
                commands.push(Command {
                    operands: std::mem::take(&mut operands),
                });
            }
            Token::RParen => {
                if !nested {
                    return Err(SyntaxError::new("unexpected right paren", offset));
                }
                *pos -= 1;
                break;
            }
            Token::LParen => {
                let sub = parse_pipeline_at(tokens, pos, offset, true)?;
                if tokens.get(*pos) != Some(&Token::RParen) {
                    return Err(SyntaxError::new("unclosed left paren", offset));
                }
                *pos += 1;
                operands.push(Operand::Sub(sub));
            }
            Token::Field(chain) => operands.push(Operand::Field(chain.clone())),
            Token::Root(chain) => operands.push(Operand::Root(chain.clone())),
            Token::Str(s) => operands.push(Operand::Literal(Value::Str(s.clone()))),
            Token::Int(n) => operands.push(Operand::Literal(Value::Int(*n))),
            Token::Bool(b) => operands.push(Operand::Literal(Value::Bool(*b))),
            Token::Nil => operands.push(Operand::Literal(Value::Nil)),
            Token::Ident(name) => {
                if !is_builtin(name) {
                    return Err(SyntaxError::new(
                        format!("function {name:?} not defined"),
                        offset,
                    )
                    .with_name(name));
                }
                operands.push(Operand::Func(name.clone()));
            }
        }
    }

    if operands.is_empty() {
        return Err(SyntaxError::new("missing value for command", offset));
    }
    commands.push(Command { operands });
    Ok(Pipeline { commands, offset })
}
