//! Worst-case gas accounting for Slate assembly.
//!
//! Two prices matter to the toolchain: what an item costs every time it
//! executes ([`GasMeter::estimate_max`]) and what its encoded bytes cost once,
//! when the program is deposited ([`deposit_gas`]). Execution estimates are
//! upper bounds; a cost that depends on runtime state the meter cannot see is
//! reported as unbounded rather than guessed.

use slate_asm::{AsmItem, Opcode, VmVersion};

/// An accumulated execution-gas estimate.
///
/// `value` saturates instead of wrapping, and `unbounded` is sticky: once any
/// term is unbounded the whole sum is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GasConsumption {
    pub value: u64,
    pub unbounded: bool,
}

impl GasConsumption {
    pub const fn new(value: u64) -> GasConsumption {
        GasConsumption {
            value,
            unbounded: false,
        }
    }

    pub const fn unbounded() -> GasConsumption {
        GasConsumption {
            value: u64::MAX,
            unbounded: true,
        }
    }

    pub fn add(self, other: GasConsumption) -> GasConsumption {
        GasConsumption {
            value: self.value.saturating_add(other.value),
            unbounded: self.unbounded || other.unbounded,
        }
    }
}

/// Per-revision price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSchedule {
    pub base: u64,
    pub very_low: u64,
    pub low: u64,
    pub mid: u64,
    pub high: u64,
    pub label_def: u64,
    pub memory: u64,
    /// Flat worst-case bound for a sub-call, when one can be assumed at all.
    pub call: u64,
    /// Per-byte price of code deposited as a runtime object.
    pub deposit_byte_gas: u64,
    /// Per-byte price of bytes shipped as transaction data (constructor code).
    pub tx_data_byte_gas: u64,
}

impl GasSchedule {
    pub const fn for_version(version: VmVersion) -> GasSchedule {
        GasSchedule {
            base: 2,
            very_low: 3,
            low: 5,
            mid: 8,
            high: 10,
            label_def: 1,
            memory: 3,
            call: 700,
            deposit_byte_gas: 200,
            // V2 repriced transaction data.
            tx_data_byte_gas: match version {
                VmVersion::V1 => 68,
                VmVersion::V2 => 16,
            },
        }
    }
}

/// Per-item worst-case execution cost estimator.
#[derive(Debug, Clone, Copy)]
pub struct GasMeter {
    schedule: GasSchedule,
}

impl GasMeter {
    pub fn new(version: VmVersion) -> GasMeter {
        GasMeter {
            schedule: GasSchedule::for_version(version),
        }
    }

    pub fn schedule(&self) -> &GasSchedule {
        &self.schedule
    }

    /// Upper bound on the execution gas of one item.
    ///
    /// `assume_stack_known` lets a caller that has proven the operand ranges
    /// accept a flat worst case for state-dependent operations; without it
    /// those operations are unbounded.
    pub fn estimate_max(&self, item: &AsmItem, assume_stack_known: bool) -> GasConsumption {
        let s = &self.schedule;
        match item {
            AsmItem::LabelDef(_) => GasConsumption::new(s.label_def),
            AsmItem::PushData(_) | AsmItem::PushLabel(_) => GasConsumption::new(s.very_low),
            AsmItem::Op { op, .. } => match op {
                Opcode::Stop | Opcode::Return | Opcode::Revert => GasConsumption::new(0),
                Opcode::Pop => GasConsumption::new(s.base),
                Opcode::Add
                | Opcode::Sub
                | Opcode::Not
                | Opcode::Lt
                | Opcode::Gt
                | Opcode::Eq
                | Opcode::IsZero
                | Opcode::And
                | Opcode::Or
                | Opcode::Xor
                | Opcode::Shl
                | Opcode::Shr
                | Opcode::Dup1
                | Opcode::Dup2
                | Opcode::Swap1
                | Opcode::Swap2 => GasConsumption::new(s.very_low),
                Opcode::Mul | Opcode::Div | Opcode::Mod => GasConsumption::new(s.low),
                Opcode::Load | Opcode::Store => GasConsumption::new(s.memory),
                Opcode::Jump => GasConsumption::new(s.mid),
                Opcode::JumpIf => GasConsumption::new(s.high),
                // The gas forwarded to a sub-call depends on runtime state.
                Opcode::Call => {
                    if assume_stack_known {
                        GasConsumption::new(s.call)
                    } else {
                        GasConsumption::unbounded()
                    }
                }
            },
        }
    }
}

/// One-time cost of depositing `bytes` bytes of code.
///
/// Constructor code travels as transaction data; anything else is stored as a
/// runtime object. Monotonic in `bytes` for every configuration.
pub fn deposit_gas(bytes: u64, is_constructor_context: bool, version: VmVersion) -> u64 {
    let schedule = GasSchedule::for_version(version);
    let per_byte = if is_constructor_context {
        schedule.tx_data_byte_gas
    } else {
        schedule.deposit_byte_gas
    };
    bytes.saturating_mul(per_byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_asm::{JumpKind, Label};

    #[test]
    fn v2_repriced_tx_data() {
        assert_eq!(GasSchedule::for_version(VmVersion::V1).tx_data_byte_gas, 68);
        assert_eq!(GasSchedule::for_version(VmVersion::V2).tx_data_byte_gas, 16);
        assert_eq!(
            GasSchedule::for_version(VmVersion::V1).deposit_byte_gas,
            GasSchedule::for_version(VmVersion::V2).deposit_byte_gas
        );
    }

    #[test]
    fn estimates_follow_the_schedule() {
        let meter = GasMeter::new(VmVersion::V2);
        let s = *meter.schedule();
        assert_eq!(
            meter.estimate_max(&AsmItem::op(Opcode::Add), false),
            GasConsumption::new(s.very_low)
        );
        assert_eq!(
            meter.estimate_max(&AsmItem::jump(JumpKind::IntoCall), false),
            GasConsumption::new(s.mid)
        );
        assert_eq!(
            meter.estimate_max(&AsmItem::LabelDef(Label::ZERO), false),
            GasConsumption::new(s.label_def)
        );
        assert_eq!(
            meter.estimate_max(&AsmItem::PushLabel(Label::ZERO), false),
            GasConsumption::new(s.very_low)
        );
        assert_eq!(
            meter.estimate_max(&AsmItem::op(Opcode::Stop), false),
            GasConsumption::new(0)
        );
    }

    #[test]
    fn calls_are_unbounded_without_stack_knowledge() {
        let meter = GasMeter::new(VmVersion::V2);
        assert!(meter.estimate_max(&AsmItem::op(Opcode::Call), false).unbounded);
        assert_eq!(
            meter.estimate_max(&AsmItem::op(Opcode::Call), true),
            GasConsumption::new(meter.schedule().call)
        );
    }

    #[test]
    fn consumption_saturates_and_stays_unbounded() {
        let near_max = GasConsumption::new(u64::MAX - 1);
        let summed = near_max.add(GasConsumption::new(100));
        assert_eq!(summed.value, u64::MAX);
        assert!(!summed.unbounded);

        let poisoned = summed.add(GasConsumption::unbounded());
        assert!(poisoned.unbounded);
        assert!(poisoned.add(GasConsumption::new(1)).unbounded);
    }

    #[test]
    fn deposit_is_monotonic_in_bytes() {
        for version in [VmVersion::V1, VmVersion::V2] {
            for constructor in [false, true] {
                let small = deposit_gas(10, constructor, version);
                let large = deposit_gas(11, constructor, version);
                assert!(small < large, "{version:?} constructor={constructor}");
            }
        }
        // Runtime deposits outprice V2 transaction data.
        assert!(deposit_gas(100, false, VmVersion::V2) > deposit_gas(100, true, VmVersion::V2));
    }
}
