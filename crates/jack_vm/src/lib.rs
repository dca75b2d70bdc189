//! This crate holds the types and exact textual forms of the stack-machine
//! instruction set targeted by the Jack compiler.  One instruction per line,
//! rendered through [`Display`].

use std::fmt::{self, Display, Formatter};

/// One of the fixed storage classes addressed by the instruction set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Display for Segment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Constant => write!(f, "constant"),
            Segment::Argument => write!(f, "argument"),
            Segment::Local => write!(f, "local"),
            Segment::Static => write!(f, "static"),
            Segment::This => write!(f, "this"),
            Segment::That => write!(f, "that"),
            Segment::Pointer => write!(f, "pointer"),
            Segment::Temp => write!(f, "temp"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    Push(Segment, u16),
    Pop(Segment, u16),
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
    Label(String),
    Goto(String),
    IfGoto(String),
    Call(String, u16),
    Function(String, u16),
    Return,
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(segment, index) => write!(f, "push {} {}", segment, index),
            Instruction::Pop(segment, index) => write!(f, "pop {} {}", segment, index),
            Instruction::Add => write!(f, "add"),
            Instruction::Sub => write!(f, "sub"),
            Instruction::Neg => write!(f, "neg"),
            Instruction::Eq => write!(f, "eq"),
            Instruction::Gt => write!(f, "gt"),
            Instruction::Lt => write!(f, "lt"),
            Instruction::And => write!(f, "and"),
            Instruction::Or => write!(f, "or"),
            Instruction::Not => write!(f, "not"),
            Instruction::Label(name) => write!(f, "label {}", name),
            Instruction::Goto(name) => write!(f, "goto {}", name),
            Instruction::IfGoto(name) => write!(f, "if-goto {}", name),
            Instruction::Call(name, args) => write!(f, "call {} {}", name, args),
            Instruction::Function(name, locals) => write!(f, "function {} {}", name, locals),
            Instruction::Return => write!(f, "return"),
        }
    }
}

/// Accepts the instruction stream produced by the compiler.  The compiler
/// writes into a sink it does not own.
pub trait InstructionSink {
    fn emit(&mut self, instruction: Instruction);
}

impl InstructionSink for Vec<Instruction> {
    fn emit(&mut self, instruction: Instruction) {
        self.push(instruction);
    }
}

/// Render an instruction stream to its textual form, one instruction per
/// line, each line terminated with a newline.
pub fn to_text(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    out
}
