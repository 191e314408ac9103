//! The assembler: label resolution and data layout.

use ecow::EcoString;
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use tracing::debug;

use crate::asm::Instruction;
use crate::vm::AssembleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Symbol {
    /// Index into the code segment.
    Code(usize),
    /// Byte address in the data segment.
    Data(usize),
}

/// An assembled program, ready to load into a [`Machine`].
///
/// Code and data are separate segments. Data directives are laid out in
/// order from address 0; every other instruction is appended to the code.
///
/// [`Machine`]: crate::vm::Machine
#[derive(Debug, Clone)]
pub struct Image {
    code: Vec<Instruction>,
    /// Resolved label operand of each code instruction (0 when it has none).
    targets: Vec<i32>,
    data: Vec<u8>,
}

impl Image {
    pub fn assemble(instructions: &[Instruction]) -> Result<Image, AssembleError> {
        let mut symbols: HashMap<EcoString, Symbol> = HashMap::new();
        let mut code = Vec::new();
        let mut data = Vec::new();
        let mut data_references: Vec<(usize, &EcoString)> = Vec::new();

        for instruction in instructions {
            use Instruction::*;
            match instruction {
                Label(name) => define(&mut symbols, name, Symbol::Code(code.len()))?,
                DLabel(name) => define(&mut symbols, name, Symbol::Data(data.len()))?,
                DataC(byte) => data.push(*byte),
                DataI(value) => data.extend_from_slice(&value.to_le_bytes()),
                DataF(value) => data.extend_from_slice(&value.to_le_bytes()),
                DataS(text) => {
                    data.extend_from_slice(text.as_bytes());
                    data.push(0);
                }
                DataZ(size) => {
                    let size = usize::try_from(*size)
                        .map_err(|_| AssembleError::NegativeDataSize(*size))?;
                    data.resize(data.len() + size, 0);
                }
                DataD(label) => {
                    data_references.push((data.len(), label));
                    data.extend_from_slice(&[0; 4]);
                }
                other => code.push(other.clone()),
            }
        }

        let resolve = |label: &EcoString| -> Result<Symbol, AssembleError> {
            symbols
                .get(label)
                .copied()
                .ok_or_else(|| AssembleError::UndefinedLabel(label.clone()))
        };

        for (at, label) in data_references {
            let address = address_of(resolve(label)?);
            data[at..at + 4].copy_from_slice(&address.to_le_bytes());
        }

        let mut targets = Vec::with_capacity(code.len());
        for instruction in &code {
            let target = match instruction.label() {
                None => 0,
                Some(label) => match (instruction, resolve(label)?) {
                    (Instruction::PushD(_), symbol) => address_of(symbol),
                    (_, Symbol::Code(index)) => index as i32,
                    (_, Symbol::Data(_)) => {
                        return Err(AssembleError::NotCodeLabel {
                            opcode: instruction.opcode(),
                            label: label.clone(),
                        });
                    }
                },
            };
            targets.push(target);
        }

        debug!(
            code = code.len(),
            data = data.len(),
            labels = symbols.len(),
            "Assembled image"
        );
        Ok(Image {
            code,
            targets,
            data,
        })
    }

    pub fn code(&self) -> &[Instruction] {
        &self.code
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The resolved label operand of the instruction at `index`.
    pub(crate) fn target(&self, index: usize) -> i32 {
        self.targets[index]
    }
}

fn define(
    symbols: &mut HashMap<EcoString, Symbol>,
    name: &EcoString,
    symbol: Symbol,
) -> Result<(), AssembleError> {
    match symbols.entry(name.clone()) {
        Entry::Occupied(_) => Err(AssembleError::DuplicateLabel(name.clone())),
        Entry::Vacant(entry) => {
            entry.insert(symbol);
            Ok(())
        }
    }
}

/// The value `PushD` leaves for a label: a data address, or a code index for
/// function entry points.
fn address_of(symbol: Symbol) -> i32 {
    match symbol {
        Symbol::Code(index) => index as i32,
        Symbol::Data(address) => address as i32,
    }
}
