//! Textual assembly: rendering instructions and parsing them back.
//!
//! Each instruction renders on its own line as an 8-space indent, the opcode
//! padded to 13 columns, and the operand. String operands are double-quoted
//! with `\n \t \" \\ \0` escapes.

use core::fmt;
use core::ops::Range;

use ecow::EcoString;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use thiserror::Error;

use crate::asm::Instruction;

#[derive(Parser)]
#[grammar = "asm/asm.pest"]
struct AsmParser;

/// A syntax error in assembly text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// Byte range of the offending text.
    pub span: Range<usize>,
}

impl ParseError {
    fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        ParseError {
            message: message.into(),
            span,
        }
    }
}

fn convert_pest_error(error: pest::error::Error<Rule>) -> ParseError {
    let span = match error.location {
        pest::error::InputLocation::Pos(pos) => pos..pos,
        pest::error::InputLocation::Span((start, end)) => start..end,
    };
    ParseError::new(error.variant.message().into_owned(), span)
}

/// Parses assembly text into instructions.
pub fn parse(text: &str) -> Result<Vec<Instruction>, ParseError> {
    let program = AsmParser::parse(Rule::program, text)
        .map_err(convert_pest_error)?
        .next()
        .ok_or_else(|| ParseError::new("empty parse", 0..0))?;

    program
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::instruction)
        .map(parse_instruction)
        .collect()
}

fn parse_instruction(pair: Pair<Rule>) -> Result<Instruction, ParseError> {
    let span = pair.as_span().start()..pair.as_span().end();
    let mut inner = pair.into_inner();
    let opcode = inner
        .next()
        .ok_or_else(|| ParseError::new("missing opcode", span.clone()))?;
    let operand = inner.next().map(Operand::from_pair);
    let operand = Operands {
        opcode: opcode.as_str(),
        operand,
        span: span.clone(),
    };

    use Instruction::*;
    let instruction = match opcode.as_str() {
        "PushI" => PushI(operand.integer()?),
        "PushF" => PushF(operand.floating()?),
        "PushD" => PushD(operand.label()?),
        "Pop" => operand.none(Pop)?,
        "Duplicate" => operand.none(Duplicate)?,
        "Exchange" => operand.none(Exchange)?,
        "Add" => operand.none(Add)?,
        "Subtract" => operand.none(Subtract)?,
        "Multiply" => operand.none(Multiply)?,
        "Divide" => operand.none(Divide)?,
        "Remainder" => operand.none(Remainder)?,
        "Negate" => operand.none(Negate)?,
        "FAdd" => operand.none(FAdd)?,
        "FSubtract" => operand.none(FSubtract)?,
        "FMultiply" => operand.none(FMultiply)?,
        "FDivide" => operand.none(FDivide)?,
        "FNegate" => operand.none(FNegate)?,
        "ConvertF" => operand.none(ConvertF)?,
        "ConvertI" => operand.none(ConvertI)?,
        "And" => operand.none(And)?,
        "Or" => operand.none(Or)?,
        "BNegate" => operand.none(BNegate)?,
        "BTAnd" => operand.none(BTAnd)?,
        "BTOr" => operand.none(BTOr)?,
        "BTXor" => operand.none(BTXor)?,
        "BTNot" => operand.none(BTNot)?,
        "Jump" => Jump(operand.label()?),
        "JumpTrue" => JumpTrue(operand.label()?),
        "JumpFalse" => JumpFalse(operand.label()?),
        "JumpPos" => JumpPos(operand.label()?),
        "JumpNeg" => JumpNeg(operand.label()?),
        "JumpFPos" => JumpFPos(operand.label()?),
        "JumpFNeg" => JumpFNeg(operand.label()?),
        "JumpFZero" => JumpFZero(operand.label()?),
        "Call" => Call(operand.label()?),
        "CallV" => operand.none(CallV)?,
        "Return" => operand.none(Return)?,
        "PopPC" => operand.none(PopPC)?,
        "PushPC" => operand.none(PushPC)?,
        "Memtop" => operand.none(Memtop)?,
        "LoadC" => operand.none(LoadC)?,
        "LoadI" => operand.none(LoadI)?,
        "LoadF" => operand.none(LoadF)?,
        "StoreC" => operand.none(StoreC)?,
        "StoreI" => operand.none(StoreI)?,
        "StoreF" => operand.none(StoreF)?,
        "Printf" => operand.none(Printf)?,
        "PStack" => operand.none(PStack)?,
        "Halt" => operand.none(Halt)?,
        "Nop" => operand.none(Nop)?,
        "Label" => Label(operand.label()?),
        "DLabel" => DLabel(operand.label()?),
        "DataC" => DataC(operand.byte()?),
        "DataI" => DataI(operand.integer()?),
        "DataF" => DataF(operand.floating()?),
        "DataS" => DataS(operand.string()?),
        "DataZ" => DataZ(operand.integer()?),
        "DataD" => DataD(operand.label()?),
        other => {
            return Err(ParseError::new(
                format!("unknown opcode `{}`", other),
                span,
            ));
        }
    };
    Ok(instruction)
}

enum Operand {
    Quoted(String),
    Word(String),
}

impl Operand {
    fn from_pair(pair: Pair<Rule>) -> Operand {
        match pair.as_rule() {
            Rule::string => {
                let characters = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                Operand::Quoted(unescape(characters))
            }
            _ => Operand::Word(pair.as_str().to_string()),
        }
    }
}

struct Operands<'a> {
    opcode: &'a str,
    operand: Option<Operand>,
    span: Range<usize>,
}

impl Operands<'_> {
    fn error(&self, expected: &str) -> ParseError {
        ParseError::new(
            format!("`{}` expects {}", self.opcode, expected),
            self.span.clone(),
        )
    }

    fn word(&self, expected: &str) -> Result<&str, ParseError> {
        match &self.operand {
            Some(Operand::Word(word)) => Ok(word),
            _ => Err(self.error(expected)),
        }
    }

    fn none(&self, instruction: Instruction) -> Result<Instruction, ParseError> {
        match self.operand {
            None => Ok(instruction),
            Some(_) => Err(self.error("no operand")),
        }
    }

    fn integer(&self) -> Result<i32, ParseError> {
        self.word("an integer operand")?
            .parse()
            .map_err(|_| self.error("an integer operand"))
    }

    fn byte(&self) -> Result<u8, ParseError> {
        self.word("a byte operand")?
            .parse()
            .map_err(|_| self.error("a byte operand"))
    }

    fn floating(&self) -> Result<f64, ParseError> {
        self.word("a floating operand")?
            .parse()
            .map_err(|_| self.error("a floating operand"))
    }

    fn label(&self) -> Result<EcoString, ParseError> {
        self.word("a label operand").map(EcoString::from)
    }

    fn string(&self) -> Result<EcoString, ParseError> {
        match &self.operand {
            Some(Operand::Quoted(text)) => Ok(EcoString::from(text.as_str())),
            _ => Err(self.error("a quoted string operand")),
        }
    }
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

fn escape(text: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for c in text.chars() {
        match c {
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\0' => write!(f, "\\0")?,
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            c => write!(f, "{}", c)?,
        }
    }
    Ok(())
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        let opcode = self.opcode();
        match self {
            PushI(value) | DataI(value) | DataZ(value) => {
                write!(f, "        {:<13}{}", opcode, value)
            }
            DataC(value) => write!(f, "        {:<13}{}", opcode, value),
            PushF(value) | DataF(value) => write!(f, "        {:<13}{:?}", opcode, value),
            DataS(text) => {
                write!(f, "        {:<13}\"", opcode)?;
                escape(text, f)?;
                write!(f, "\"")
            }
            _ => match self.label() {
                Some(label) => write!(f, "        {:<13}{}", opcode, label),
                None => write!(f, "        {}", opcode),
            },
        }
    }
}

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;
