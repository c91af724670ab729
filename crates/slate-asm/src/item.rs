use core::fmt;

use crate::Opcode;

/// Address width assumed for a label reference before label addresses are
/// resolved. Size estimates use this; actual encoding may differ once the
/// assembler knows the final code size.
pub const LABEL_ADDRESS_BYTES: u8 = 2;

/// Identifier of a jump target: an opaque 256-bit value, big-endian.
///
/// Labels are only ever compared and ordered (they key block maps); no
/// arithmetic is performed on them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label([u8; 32]);

impl Label {
    pub const ZERO: Label = Label([0; 32]);

    pub fn from_u64(value: u64) -> Label {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Label(bytes)
    }

    /// The label value, if it fits in 64 bits.
    pub fn as_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(tail))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_u64() {
            Some(small) => write!(f, "{small}"),
            None => {
                write!(f, "0x")?;
                for byte in self.0.iter().skip_while(|b| **b == 0) {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({self})")
    }
}

/// Classification of a jump operation relative to the function-call idiom.
///
/// Starts out `Ordinary`; the code generator tags call and return jumps, and
/// the optimiser may re-tag a return jump `Ordinary` once inlining has made it
/// part of straight-line code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JumpKind {
    #[default]
    Ordinary,
    IntoCall,
    OutOfCall,
}

/// One element of a Slate assembly item stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsmItem {
    /// A machine operation. `jump` is only meaningful when `op` is a jump.
    Op { op: Opcode, jump: JumpKind },
    /// Pushes a literal value onto the evaluation stack.
    PushData(u64),
    /// Pushes a label's resolved address onto the evaluation stack.
    PushLabel(Label),
    /// Names a jump destination. Executes as a no-op.
    LabelDef(Label),
}

impl AsmItem {
    pub fn op(op: Opcode) -> AsmItem {
        AsmItem::Op {
            op,
            jump: JumpKind::Ordinary,
        }
    }

    pub fn jump(kind: JumpKind) -> AsmItem {
        AsmItem::Op {
            op: Opcode::Jump,
            jump: kind,
        }
    }

    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            AsmItem::Op { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn is_unconditional_jump(&self) -> bool {
        matches!(
            self,
            AsmItem::Op {
                op: Opcode::Jump,
                ..
            }
        )
    }

    /// The jump classification, for jump operations only.
    pub fn jump_kind(&self) -> Option<JumpKind> {
        match self {
            AsmItem::Op { op, jump } if op.is_jump() => Some(*jump),
            _ => None,
        }
    }

    /// Copy of this item with the jump classification replaced. Items without
    /// a jump slot are returned unchanged.
    pub fn with_jump_kind(&self, kind: JumpKind) -> AsmItem {
        match self {
            AsmItem::Op { op, .. } if op.is_jump() => AsmItem::Op { op: *op, jump: kind },
            other => *other,
        }
    }

    /// The label this item pushes, if it is a label push.
    pub fn pushed_label(&self) -> Option<Label> {
        match self {
            AsmItem::PushLabel(label) => Some(*label),
            _ => None,
        }
    }

    /// The label this item defines, if it is a label definition.
    pub fn defined_label(&self) -> Option<Label> {
        match self {
            AsmItem::LabelDef(label) => Some(*label),
            _ => None,
        }
    }

    /// Encoded size of this item in bytes.
    ///
    /// Operations and label definitions occupy one byte. A label push encodes
    /// the opcode plus `label_bytes` of address; a data push uses the minimal
    /// big-endian encoding of its value.
    pub fn encoded_size(&self, label_bytes: u8) -> u64 {
        match self {
            AsmItem::Op { .. } | AsmItem::LabelDef(_) => 1,
            AsmItem::PushLabel(_) => 1 + u64::from(label_bytes),
            AsmItem::PushData(value) => 1 + data_bytes(*value),
        }
    }
}

fn data_bytes(value: u64) -> u64 {
    let bits = u64::from(64 - value.leading_zeros());
    bits.div_ceil(8).max(1)
}
