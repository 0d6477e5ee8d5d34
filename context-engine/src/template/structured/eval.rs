//! Tree-walking evaluator

use super::functions::FunctionLibrary;
use super::parser::{Command, Node, Operand, Pipeline};
use super::value::Value;
use super::ExecError;

pub struct Evaluator<'a> {
    root: &'a Value,
    functions: &'a FunctionLibrary,
}

impl<'a> Evaluator<'a> {
    pub fn new(root: &'a Value, functions: &'a FunctionLibrary) -> Self {
        Self { root, functions }
    }

    /// Render `nodes` with `.` bound to the root value.
    pub fn render(&self, nodes: &[Node]) -> Result<String, ExecError> {
        let mut out = String::new();
        self.walk(nodes, self.root, &mut out)?;
        Ok(out)
    }

    fn walk(&self, nodes: &[Node], dot: &Value, out: &mut String) -> Result<(), ExecError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output(pipeline) => {
                    let value = self.eval_pipeline(pipeline, dot)?;
                    out.push_str(&value.render());
                }
                Node::If {
                    branches,
                    otherwise,
                } => {
                    let mut taken = false;
                    for (cond, body) in branches {
                        if self.eval_pipeline(cond, dot)?.is_truthy() {
                            self.walk(body, dot, out)?;
                            taken = true;
                            break;
                        }
                    }
                    if !taken {
                        self.walk(otherwise, dot, out)?;
                    }
                }
                Node::Range {
                    pipeline,
                    body,
                    otherwise,
                } => {
                    let items: Vec<Value> = match self.eval_pipeline(pipeline, dot)? {
                        Value::Nil => Vec::new(),
                        Value::List(items) => items,
                        Value::Map(map) => map.into_values().collect(),
                        other => {
                            return Err(ExecError::new(
                                format!("range can't iterate over {}", other.type_name()),
                                pipeline.offset,
                            ))
                        }
                    };
                    if items.is_empty() {
                        self.walk(otherwise, dot, out)?;
                    }
                    for item in &items {
                        self.walk(body, item, out)?;
                    }
                }
                Node::With {
                    pipeline,
                    body,
                    otherwise,
                } => {
                    let value = self.eval_pipeline(pipeline, dot)?;
                    if value.is_truthy() {
                        self.walk(body, &value, out)?;
                    } else {
                        self.walk(otherwise, dot, out)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn eval_pipeline(&self, pipeline: &Pipeline, dot: &Value) -> Result<Value, ExecError> {
        let mut piped = None;
        for command in &pipeline.commands {
            piped = Some(self.eval_command(command, dot, piped.take(), pipeline.offset)?);
        }
        Ok(piped.unwrap_or(Value::Nil))
    }

    fn eval_command(
        &self,
        command: &Command,
        dot: &Value,
        piped: Option<Value>,
        offset: usize,
    ) -> Result<Value, ExecError> {
        let Some((first, rest)) = command.operands.split_first() else {
            return Err(ExecError::new("empty command", offset));
        };
        match first {
            Operand::Func(name) => {
                let mut args = Vec::with_capacity(rest.len() + 1);
                for operand in rest {
                    args.push(self.eval_operand(operand, dot, offset)?);
                }
                args.extend(piped);
                self.call(name, &args, offset)
            }
            other => {
                if !rest.is_empty() || piped.is_some() {
                    return Err(ExecError::new(
                        "can't give argument to non-function",
                        offset,
                    ));
                }
                self.eval_operand(other, dot, offset)
            }
        }
    }

    fn eval_operand(
        &self,
        operand: &Operand,
        dot: &Value,
        offset: usize,
    ) -> Result<Value, ExecError> {
        match operand {
            Operand::Field(chain) => resolve(dot, chain, offset),
            Operand::Root(chain) => resolve(self.root, chain, offset),
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Func(name) => self.call(name, &[], offset),
            Operand::Sub(pipeline) => self.eval_pipeline(pipeline, dot),
        }
    }

    fn call(&self, name: &str, args: &[Value], offset: usize) -> Result<Value, ExecError> {
        self.functions.call(name, args).map_err(|message| {
            ExecError::new(format!("error calling {name}: {message}"), offset).with_name(name)
        })
    }
}

fn resolve(base: &Value, chain: &[String], offset: usize) -> Result<Value, ExecError> {
    let mut current = base;
    for name in chain {
        current = match current {
            Value::Map(map) => map.get(name).ok_or_else(|| {
                ExecError::new(format!("can't evaluate field {name}"), offset).with_name(name)
            })?,
            other => {
                return Err(ExecError::new(
                    format!("can't evaluate field {name} in type {}", other.type_name()),
                    offset,
                )
                .with_name(name))
            }
        };
    }
    Ok(current.clone())
}
