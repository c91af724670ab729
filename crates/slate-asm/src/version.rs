/// Slate VM revision a program targets.
///
/// Revisions only differ in pricing today (V2 repriced transaction-data
/// bytes); the instruction set is identical across both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VmVersion {
    V1,
    #[default]
    V2,
}

impl VmVersion {
    pub const fn latest() -> VmVersion {
        VmVersion::V2
    }
}
