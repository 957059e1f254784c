use std::collections::BTreeMap;

use crate::attribute_info::{
    StackMapFrame, StackMapFrameInner, StackMapTableAttribute, VerificationTypeInfo,
};
use crate::code_attribute::Instruction;

/// Verification type of one local or stack entry.
#[derive(Clone, Debug, PartialEq)]
pub enum VType {
    Top,
    Integer,
    Float,
    Long,
    Double,
    UninitializedThis,
    Object(u16), // constant pool index for the class
}

impl VType {
    fn to_verification_type_info(&self) -> VerificationTypeInfo {
        match self {
            VType::Top => VerificationTypeInfo::Top,
            VType::Integer => VerificationTypeInfo::Integer,
            VType::Float => VerificationTypeInfo::Float,
            VType::Long => VerificationTypeInfo::Long,
            VType::Double => VerificationTypeInfo::Double,
            VType::UninitializedThis => VerificationTypeInfo::UninitializedThis,
            VType::Object(idx) => VerificationTypeInfo::Object { class: *idx },
        }
    }

    fn is_wide(&self) -> bool {
        matches!(self, VType::Long | VType::Double)
    }
}

/// Slot-indexed local types known to the frame computation.
#[derive(Clone, Debug, Default)]
pub struct FrameLayout {
    /// Locals on method entry. A wide entry is followed by `Top`.
    pub entry: Vec<VType>,
    /// Declared type of the local starting at each slot, used for `astore`.
    pub slot_types: Vec<VType>,
    /// Type `this` takes once the superclass constructor has run.
    pub initialized_this: Option<VType>,
}

/// Slot-indexed locals on entry to each instruction, `None` where the
/// instruction is unreachable from the method entry.
///
/// `targets[i]` is the instruction index a branch at `i` jumps to.
/// `this_init` is the constructor call that initializes `this`.
pub fn analyze(
    code: &[Instruction],
    targets: &[Option<usize>],
    layout: &FrameLayout,
    this_init: Option<usize>,
) -> Vec<Option<Vec<VType>>> {
    let mut states: Vec<Option<Vec<VType>>> = vec![None; code.len()];
    if code.is_empty() {
        return states;
    }
    let width = layout.slot_types.len().max(layout.entry.len());
    let mut entry = layout.entry.clone();
    entry.resize(width, VType::Top);
    states[0] = Some(entry);

    let mut worklist = vec![0usize];
    while let Some(i) = worklist.pop() {
        let Some(mut state) = states[i].clone() else {
            continue;
        };
        apply_store(&code[i], &mut state, layout);
        if this_init == Some(i) {
            if let (Some(first), Some(ty)) = (state.first_mut(), &layout.initialized_this) {
                *first = ty.clone();
            }
        }
        for succ in successors(code, targets, i) {
            if succ >= code.len() {
                continue;
            }
            let changed = if let Some(existing) = states[succ].as_mut() {
                merge_into(existing, &state)
            } else {
                states[succ] = Some(state.clone());
                true
            };
            if changed {
                worklist.push(succ);
            }
        }
    }
    states
}

fn successors(code: &[Instruction], targets: &[Option<usize>], i: usize) -> Vec<usize> {
    match (&code[i], targets.get(i).copied().flatten()) {
        (Instruction::Goto(_), Some(target)) => vec![target],
        (_, Some(target)) => vec![target, i + 1],
        (
            Instruction::Return
            | Instruction::Ireturn
            | Instruction::Lreturn
            | Instruction::Freturn
            | Instruction::Dreturn
            | Instruction::Areturn
            | Instruction::Athrow,
            None,
        ) => Vec::new(),
        _ => vec![i + 1],
    }
}

/// Locals not assigned on every incoming path become `Top`.
fn merge_into(existing: &mut [VType], incoming: &[VType]) -> bool {
    let mut changed = false;
    for (have, new) in existing.iter_mut().zip(incoming) {
        if *have != *new && *have != VType::Top {
            *have = VType::Top;
            changed = true;
        }
    }
    changed
}

fn apply_store(instr: &Instruction, state: &mut [VType], layout: &FrameLayout) {
    let (slot, ty) = match instr {
        Instruction::Istore0 => (0, VType::Integer),
        Instruction::Istore1 => (1, VType::Integer),
        Instruction::Istore2 => (2, VType::Integer),
        Instruction::Istore3 => (3, VType::Integer),
        Instruction::Istore(s) => (*s as usize, VType::Integer),
        Instruction::IstoreWide(s) => (*s as usize, VType::Integer),
        Instruction::Fstore0 => (0, VType::Float),
        Instruction::Fstore1 => (1, VType::Float),
        Instruction::Fstore2 => (2, VType::Float),
        Instruction::Fstore3 => (3, VType::Float),
        Instruction::Fstore(s) => (*s as usize, VType::Float),
        Instruction::FstoreWide(s) => (*s as usize, VType::Float),
        Instruction::Lstore0 => (0, VType::Long),
        Instruction::Lstore1 => (1, VType::Long),
        Instruction::Lstore2 => (2, VType::Long),
        Instruction::Lstore3 => (3, VType::Long),
        Instruction::Lstore(s) => (*s as usize, VType::Long),
        Instruction::LstoreWide(s) => (*s as usize, VType::Long),
        Instruction::Dstore0 => (0, VType::Double),
        Instruction::Dstore1 => (1, VType::Double),
        Instruction::Dstore2 => (2, VType::Double),
        Instruction::Dstore3 => (3, VType::Double),
        Instruction::Dstore(s) => (*s as usize, VType::Double),
        Instruction::DstoreWide(s) => (*s as usize, VType::Double),
        Instruction::Astore0 => (0, reference_at(layout, 0)),
        Instruction::Astore1 => (1, reference_at(layout, 1)),
        Instruction::Astore2 => (2, reference_at(layout, 2)),
        Instruction::Astore3 => (3, reference_at(layout, 3)),
        Instruction::Astore(s) => (*s as usize, reference_at(layout, *s as usize)),
        Instruction::AstoreWide(s) => (*s as usize, reference_at(layout, *s as usize)),
        _ => return,
    };
    let wide = ty.is_wide();
    if let Some(entry) = state.get_mut(slot) {
        *entry = ty;
    }
    if wide {
        if let Some(entry) = state.get_mut(slot + 1) {
            *entry = VType::Top;
        }
    }
}

fn reference_at(layout: &FrameLayout, slot: usize) -> VType {
    layout.slot_types.get(slot).cloned().unwrap_or(VType::Top)
}

/// Frame form of slot-indexed locals: one entry per wide value, trailing
/// `Top`s dropped.
pub fn frame_locals(state: &[VType]) -> Vec<VType> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < state.len() {
        let ty = state[i].clone();
        i += if ty.is_wide() { 2 } else { 1 };
        out.push(ty);
    }
    while out.last() == Some(&VType::Top) {
        out.pop();
    }
    out
}

/// Collects frames by bytecode offset and encodes them compactly.
pub struct FrameTracker {
    initial_locals: Vec<VType>,
    snapshots: BTreeMap<u32, (Vec<VType>, Vec<VType>)>,
}

impl FrameTracker {
    pub fn new(initial_locals: Vec<VType>) -> Self {
        FrameTracker {
            initial_locals,
            snapshots: BTreeMap::new(),
        }
    }

    /// Record the frame at `offset`; a later record at the same offset wins.
    pub fn record_frame(&mut self, offset: u32, locals: Vec<VType>, stack: Vec<VType>) {
        self.snapshots.insert(offset, (locals, stack));
    }

    pub fn build(self) -> Option<StackMapTableAttribute> {
        if self.snapshots.is_empty() {
            return None;
        }

        let mut entries = Vec::with_capacity(self.snapshots.len());
        let mut prev_offset: i64 = -1;
        let mut prev_locals = self.initial_locals;

        for (offset, (locals, stack)) in self.snapshots {
            let offset_delta = (offset as i64 - prev_offset - 1) as u16;
            prev_offset = offset as i64;
            entries.push(encode_frame(&prev_locals, &locals, &stack, offset_delta));
            prev_locals = locals;
        }

        Some(StackMapTableAttribute {
            number_of_entries: entries.len() as u16,
            entries,
        })
    }
}

/// Choose the most compact frame encoding.
/// `prev_locals` is the locals from the previous frame (or initial implicit frame).
fn encode_frame(
    prev_locals: &[VType],
    locals: &[VType],
    stack: &[VType],
    offset_delta: u16,
) -> StackMapFrame {
    let same_locals = prev_locals == locals;

    if stack.is_empty() && same_locals {
        return if offset_delta <= 63 {
            StackMapFrame {
                frame_type: offset_delta as u8,
                inner: StackMapFrameInner::SameFrame {},
            }
        } else {
            StackMapFrame {
                frame_type: 251,
                inner: StackMapFrameInner::SameFrameExtended { offset_delta },
            }
        };
    }

    if stack.len() == 1 && same_locals {
        let stack_item = stack[0].to_verification_type_info();
        return if offset_delta <= 63 {
            StackMapFrame {
                frame_type: 64 + offset_delta as u8,
                inner: StackMapFrameInner::SameLocals1StackItemFrame { stack: stack_item },
            }
        } else {
            StackMapFrame {
                frame_type: 247,
                inner: StackMapFrameInner::SameLocals1StackItemFrameExtended {
                    offset_delta,
                    stack: stack_item,
                },
            }
        };
    }

    if stack.is_empty() && locals.len() > prev_locals.len() {
        let extra = locals.len() - prev_locals.len();
        if extra <= 3 && locals.starts_with(prev_locals) {
            return StackMapFrame {
                frame_type: 251 + extra as u8,
                inner: StackMapFrameInner::AppendFrame {
                    offset_delta,
                    locals: locals[prev_locals.len()..]
                        .iter()
                        .map(VType::to_verification_type_info)
                        .collect(),
                },
            };
        }
    }

    if stack.is_empty() && locals.len() < prev_locals.len() {
        let chopped = prev_locals.len() - locals.len();
        if chopped <= 3 && prev_locals.starts_with(locals) {
            return StackMapFrame {
                frame_type: (251 - chopped) as u8,
                inner: StackMapFrameInner::ChopFrame { offset_delta },
            };
        }
    }

    let local_vtypes: Vec<VerificationTypeInfo> =
        locals.iter().map(VType::to_verification_type_info).collect();
    let stack_vtypes: Vec<VerificationTypeInfo> =
        stack.iter().map(VType::to_verification_type_info).collect();

    StackMapFrame {
        frame_type: 255,
        inner: StackMapFrameInner::FullFrame {
            offset_delta,
            number_of_locals: local_vtypes.len() as u16,
            locals: local_vtypes,
            number_of_stack_items: stack_vtypes.len() as u16,
            stack: stack_vtypes,
        },
    }
}
