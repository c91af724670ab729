//! Local-analysis classification of assembly items.

use crate::{AsmItem, Opcode};

/// Whether `item` terminates a straight-line block for local analysis.
///
/// Conservative: anything that transfers control, halts, or whose effects
/// cannot be reasoned about locally (a sub-call) closes the block. Label
/// definitions close blocks too, since control may enter there from
/// elsewhere.
/// Pushes and pure stack/ALU/memory traffic never do.
///
/// `_in_loop_context` is accepted for interface stability; no Slate operation
/// classifies differently inside a loop today.
pub fn breaks_straight_line_block(item: &AsmItem, _in_loop_context: bool) -> bool {
    match item {
        AsmItem::LabelDef(_) => true,
        AsmItem::PushData(_) | AsmItem::PushLabel(_) => false,
        AsmItem::Op { op, .. } => {
            op.is_jump() || op.halts_execution() || matches!(op, Opcode::Call)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JumpKind, Label};

    #[test]
    fn control_flow_breaks_blocks() {
        for item in [
            AsmItem::jump(JumpKind::Ordinary),
            AsmItem::op(Opcode::JumpIf),
            AsmItem::op(Opcode::Stop),
            AsmItem::op(Opcode::Return),
            AsmItem::op(Opcode::Revert),
            AsmItem::op(Opcode::Call),
            AsmItem::LabelDef(Label::from_u64(1)),
        ] {
            assert!(breaks_straight_line_block(&item, false), "{item:?}");
        }
    }

    #[test]
    fn straight_line_traffic_does_not() {
        for item in [
            AsmItem::op(Opcode::Add),
            AsmItem::op(Opcode::Swap1),
            AsmItem::op(Opcode::Load),
            AsmItem::op(Opcode::Store),
            AsmItem::PushData(3),
            AsmItem::PushLabel(Label::from_u64(1)),
        ] {
            assert!(!breaks_straight_line_block(&item, false), "{item:?}");
        }
    }
}
