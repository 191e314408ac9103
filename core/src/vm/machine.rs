//! The stack machine.
//!
//! One operand stack of typed words, a flat little-endian byte memory with
//! the data segment loaded at address 0, and a program counter indexing the
//! code segment. Running off the end of the code halts.

use core::fmt;
use std::io::Write;

use tracing::{info, trace};

use crate::api::MachineOptions;
use crate::asm::Instruction;
use crate::vm::printf::{self, Argument, Specifier};
use crate::vm::{Image, MachineError};

/// One operand-stack entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Word {
    Int(i32),
    Float(f64),
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Int(value) => write!(f, "{}", value),
            Word::Float(value) => write!(f, "{}", printf::format_g(*value)),
        }
    }
}

pub struct Machine<'a, W> {
    image: &'a Image,
    memory: Vec<u8>,
    stack: Vec<Word>,
    pc: usize,
    steps: u64,
    max_steps: Option<u64>,
    out: W,
}

impl<'a, W: Write> Machine<'a, W> {
    pub fn new(image: &'a Image, options: &MachineOptions, out: W) -> Result<Self, MachineError> {
        let data = image.data();
        if data.len() > options.memory_size {
            return Err(MachineError::ImageTooLarge {
                data: data.len(),
                memory: options.memory_size,
            });
        }
        let mut memory = vec![0; options.memory_size];
        memory[..data.len()].copy_from_slice(data);
        Ok(Machine {
            image,
            memory,
            stack: Vec::new(),
            pc: 0,
            steps: 0,
            max_steps: options.max_steps,
            out,
        })
    }

    /// Runs until `Halt` or the end of the code, returning the number of
    /// instructions executed.
    pub fn run(&mut self) -> Result<u64, MachineError> {
        while self.pc < self.image.code().len() {
            if let Some(limit) = self.max_steps {
                if self.steps >= limit {
                    return Err(MachineError::StepLimitExceeded { limit });
                }
            }
            self.steps += 1;
            if !self.step()? {
                break;
            }
        }
        self.out.flush()?;
        info!(steps = self.steps, "Machine halted");
        Ok(self.steps)
    }

    pub fn stack(&self) -> &[Word] {
        &self.stack
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Executes one instruction. Returns `false` on `Halt`.
    fn step(&mut self) -> Result<bool, MachineError> {
        use Instruction::*;

        let pc = self.pc;
        let image = self.image;
        let instruction = &image.code()[pc];
        trace!(pc, %instruction, depth = self.stack.len(), "Step");
        self.pc += 1;

        match instruction {
            PushI(value) => self.push(Word::Int(*value)),
            PushF(value) => self.push(Word::Float(*value)),
            PushD(_) => self.push(Word::Int(self.image.target(pc))),
            Pop => {
                self.pop()?;
            }
            Duplicate => {
                let top = self.pop()?;
                self.push(top);
                self.push(top);
            }
            Exchange => {
                let top = self.pop()?;
                let below = self.pop()?;
                self.push(top);
                self.push(below);
            }

            Add => self.int_binary(|a, b| Ok(a.wrapping_add(b)))?,
            Subtract => self.int_binary(|a, b| Ok(a.wrapping_sub(b)))?,
            Multiply => self.int_binary(|a, b| Ok(a.wrapping_mul(b)))?,
            Divide => self.int_binary(|a, b| {
                if b == 0 {
                    Err(MachineError::DivisionByZero { pc })
                } else {
                    Ok(a.wrapping_div(b))
                }
            })?,
            Remainder => self.int_binary(|a, b| {
                if b == 0 {
                    Err(MachineError::DivisionByZero { pc })
                } else {
                    Ok(a.wrapping_rem(b))
                }
            })?,
            Negate => {
                let value = self.pop_int()?;
                self.push(Word::Int(value.wrapping_neg()));
            }

            FAdd => self.float_binary(|a, b| a + b)?,
            FSubtract => self.float_binary(|a, b| a - b)?,
            FMultiply => self.float_binary(|a, b| a * b)?,
            FDivide => self.float_binary(|a, b| a / b)?,
            FNegate => {
                let value = self.pop_float()?;
                self.push(Word::Float(-value));
            }

            ConvertF => {
                let value = self.pop_int()?;
                self.push(Word::Float(f64::from(value)));
            }
            ConvertI => {
                let value = self.pop_float()?;
                self.push(Word::Int(value as i32));
            }

            And => self.int_binary(|a, b| Ok(i32::from(a != 0 && b != 0)))?,
            Or => self.int_binary(|a, b| Ok(i32::from(a != 0 || b != 0)))?,
            BNegate => {
                let value = self.pop_int()?;
                self.push(Word::Int(i32::from(value == 0)));
            }
            BTAnd => self.int_binary(|a, b| Ok(a & b))?,
            BTOr => self.int_binary(|a, b| Ok(a | b))?,
            BTXor => self.int_binary(|a, b| Ok(a ^ b))?,
            BTNot => {
                let value = self.pop_int()?;
                self.push(Word::Int(!value));
            }

            Jump(_) => self.jump(self.image.target(pc))?,
            JumpTrue(_) => {
                let condition = self.pop_int()?;
                self.jump_if(condition != 0, pc)?;
            }
            JumpFalse(_) => {
                let condition = self.pop_int()?;
                self.jump_if(condition == 0, pc)?;
            }
            JumpPos(_) => {
                let value = self.pop_int()?;
                self.jump_if(value > 0, pc)?;
            }
            JumpNeg(_) => {
                let value = self.pop_int()?;
                self.jump_if(value < 0, pc)?;
            }
            JumpFPos(_) => {
                let value = self.pop_float()?;
                self.jump_if(value > 0.0, pc)?;
            }
            JumpFNeg(_) => {
                let value = self.pop_float()?;
                self.jump_if(value < 0.0, pc)?;
            }
            JumpFZero(_) => {
                let value = self.pop_float()?;
                self.jump_if(value == 0.0, pc)?;
            }
            Call(_) => {
                self.push(Word::Int(self.pc as i32));
                self.jump(self.image.target(pc))?;
            }
            CallV => {
                let target = self.pop_int()?;
                self.push(Word::Int(self.pc as i32));
                self.jump(target)?;
            }
            Return | PopPC => {
                let target = self.pop_int()?;
                self.jump(target)?;
            }
            PushPC => self.push(Word::Int(self.pc as i32)),

            Memtop => self.push(Word::Int(self.memory.len() as i32)),
            LoadC => {
                let address = self.pop_int()?;
                let byte = self.read::<1>(address)?[0];
                self.push(Word::Int(i32::from(byte)));
            }
            LoadI => {
                let address = self.pop_int()?;
                let bytes = self.read::<4>(address)?;
                self.push(Word::Int(i32::from_le_bytes(bytes)));
            }
            LoadF => {
                let address = self.pop_int()?;
                let bytes = self.read::<8>(address)?;
                self.push(Word::Float(f64::from_le_bytes(bytes)));
            }
            StoreC => {
                let value = self.pop_int()?;
                let address = self.pop_int()?;
                self.write(address, &[value as u8])?;
            }
            StoreI => {
                let value = self.pop_int()?;
                let address = self.pop_int()?;
                self.write(address, &value.to_le_bytes())?;
            }
            StoreF => {
                let value = self.pop_float()?;
                let address = self.pop_int()?;
                self.write(address, &value.to_le_bytes())?;
            }

            Printf => self.printf()?,
            PStack => {
                let words: Vec<String> = self.stack.iter().map(Word::to_string).collect();
                writeln!(self.out, "Stack: [{}]", words.join(", "))?;
            }
            Halt => return Ok(false),
            Nop => {}

            Label(_) | DLabel(_) | DataC(_) | DataI(_) | DataF(_) | DataS(_) | DataZ(_)
            | DataD(_) => unreachable!("directives are not assembled into code"),
        }
        Ok(true)
    }

    // === Stack ===

    fn push(&mut self, word: Word) {
        self.stack.push(word);
    }

    fn pop(&mut self) -> Result<Word, MachineError> {
        self.stack
            .pop()
            .ok_or(MachineError::StackUnderflow { pc: self.pc - 1 })
    }

    fn pop_int(&mut self) -> Result<i32, MachineError> {
        match self.pop()? {
            Word::Int(value) => Ok(value),
            Word::Float(_) => Err(self.mismatch("an integer")),
        }
    }

    fn pop_float(&mut self) -> Result<f64, MachineError> {
        match self.pop()? {
            Word::Float(value) => Ok(value),
            Word::Int(_) => Err(self.mismatch("a float")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> MachineError {
        MachineError::TypeMismatch {
            pc: self.pc - 1,
            expected,
        }
    }

    fn int_binary(
        &mut self,
        op: impl FnOnce(i32, i32) -> Result<i32, MachineError>,
    ) -> Result<(), MachineError> {
        let b = self.pop_int()?;
        let a = self.pop_int()?;
        self.push(Word::Int(op(a, b)?));
        Ok(())
    }

    fn float_binary(&mut self, op: impl FnOnce(f64, f64) -> f64) -> Result<(), MachineError> {
        let b = self.pop_float()?;
        let a = self.pop_float()?;
        self.push(Word::Float(op(a, b)));
        Ok(())
    }

    // === Control ===

    fn jump(&mut self, target: i32) -> Result<(), MachineError> {
        match usize::try_from(target) {
            Ok(index) if index <= self.image.code().len() => {
                self.pc = index;
                Ok(())
            }
            _ => Err(MachineError::BadJumpTarget {
                pc: self.pc - 1,
                target,
            }),
        }
    }

    fn jump_if(&mut self, condition: bool, pc: usize) -> Result<(), MachineError> {
        if condition {
            self.jump(self.image.target(pc))?;
        }
        Ok(())
    }

    // === Memory ===

    fn range(&self, address: i32, width: usize) -> Result<core::ops::Range<usize>, MachineError> {
        usize::try_from(address)
            .ok()
            .filter(|start| start + width <= self.memory.len())
            .map(|start| start..start + width)
            .ok_or(MachineError::MemoryOutOfBounds {
                pc: self.pc - 1,
                address: i64::from(address),
                width,
            })
    }

    fn read<const N: usize>(&self, address: i32) -> Result<[u8; N], MachineError> {
        let range = self.range(address, N)?;
        let mut bytes = [0; N];
        bytes.copy_from_slice(&self.memory[range]);
        Ok(bytes)
    }

    fn write(&mut self, address: i32, bytes: &[u8]) -> Result<(), MachineError> {
        let range = self.range(address, bytes.len())?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    /// The zero-terminated string at `address`, without its terminator.
    fn c_string(&self, address: i32) -> Result<Vec<u8>, MachineError> {
        let start = self.range(address, 1)?.start;
        match self.memory[start..].iter().position(|&byte| byte == 0) {
            Some(length) => Ok(self.memory[start..start + length].to_vec()),
            None => Err(MachineError::MemoryOutOfBounds {
                pc: self.pc - 1,
                address: i64::from(address),
                width: self.memory.len() - start + 1,
            }),
        }
    }

    /// `[args.. format] -> []`. The first specifier takes the deepest argument.
    fn printf(&mut self) -> Result<(), MachineError> {
        let format_address = self.pop_int()?;
        let format = self.c_string(format_address)?;
        let specifiers = printf::specifiers(&format);

        let mut arguments = Vec::with_capacity(specifiers.len());
        for specifier in specifiers.iter().rev() {
            let argument = match specifier {
                Specifier::Integer | Specifier::Character => Argument::Integer(self.pop_int()?),
                Specifier::Floating => Argument::Floating(self.pop_float()?),
                Specifier::String => {
                    let address = self.pop_int()?;
                    Argument::String(self.c_string(address)?)
                }
            };
            arguments.push(argument);
        }
        arguments.reverse();

        self.out.write_all(&printf::render(&format, &arguments))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "machine_test.rs"]
mod machine_test;
