use tracing::debug;

use crate::attribute_info::StackMapTableAttribute;
use crate::code_attribute::{encode_instructions, instruction_byte_size, Instruction};
use crate::constant_info::ConstantPool;

use super::kinds::BranchFn;
use super::stack_calc::compute_max_stack;
use super::stackmap::{analyze, frame_locals, FrameLayout, FrameTracker, VType};
use super::CompileError;

/// Opaque handle to a label owned by a [`MethodWriter`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LabelHandle(usize);

#[derive(Debug)]
struct LabelSlot {
    /// Caller-side id, reported when the label is never placed.
    tag: u32,
    position: Option<usize>,
}

/// Accumulates symbolic instructions for one method body and turns them
/// into a finished code array.
#[derive(Debug, Default)]
pub struct MethodWriter {
    instructions: Vec<Instruction>,
    offset: u32,
    labels: Vec<LabelSlot>,
    patches: Vec<(usize, LabelHandle)>,
    this_init: Option<usize>,
}

/// Output of [`MethodWriter::finish`].
#[derive(Debug)]
pub struct FinishedCode {
    pub instructions: Vec<Instruction>,
    pub code: Vec<u8>,
    pub max_stack: u16,
    pub stack_map_table: Option<StackMapTableAttribute>,
}

impl MethodWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_label(&mut self, tag: u32) -> LabelHandle {
        let id = self.labels.len();
        self.labels.push(LabelSlot {
            tag,
            position: None,
        });
        LabelHandle(id)
    }

    /// Bind `label` to the next emitted instruction.
    pub fn place_label(&mut self, label: LabelHandle) {
        self.labels[label.0].position = Some(self.instructions.len());
    }

    pub fn emit(&mut self, instr: Instruction) -> usize {
        let idx = self.instructions.len();
        self.offset += instruction_byte_size(&instr);
        self.instructions.push(instr);
        idx
    }

    pub fn emit_branch(&mut self, instr_fn: BranchFn, target: LabelHandle) {
        let idx = self.emit(instr_fn(0)); // placeholder
        self.patches.push((idx, target));
    }

    /// The last emitted instruction initializes `this` in a constructor.
    pub fn mark_this_initialized(&mut self) {
        self.this_init = self.instructions.len().checked_sub(1);
    }

    /// Byte offset of the next instruction.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[cfg(test)]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Resolve branches, neutralize unreachable code and compute
    /// max_stack and, when `layout` is given, the StackMapTable.
    ///
    /// A label bound after the last instruction counts as unbound.
    pub fn finish(
        self,
        pool: &mut ConstantPool,
        layout: Option<&FrameLayout>,
    ) -> Result<FinishedCode, CompileError> {
        let MethodWriter {
            mut instructions,
            offset: end,
            labels,
            patches,
            this_init,
        } = self;

        if end > u16::MAX as u32 {
            return Err(CompileError::LimitExceeded { what: "code size" });
        }
        let addresses = compute_byte_addresses(&instructions, end);

        let mut targets: Vec<Option<usize>> = vec![None; instructions.len()];
        for &(instr_idx, label) in &patches {
            let slot = &labels[label.0];
            let target = slot
                .position
                .filter(|&p| p < instructions.len())
                .ok_or(CompileError::UnboundLabel { label: slot.tag })?;
            let delta = addresses[target] as i32 - addresses[instr_idx] as i32;
            let offset = i16::try_from(delta)
                .map_err(|_| CompileError::BranchOutOfRange { offset: delta })?;
            instructions[instr_idx] = patch_branch_offset(&instructions[instr_idx], offset)?;
            targets[instr_idx] = Some(target);
        }

        let default_layout = FrameLayout::default();
        let states = analyze(
            &instructions,
            &targets,
            layout.unwrap_or(&default_layout),
            this_init,
        );
        let dead = dead_ranges(&states);

        let stack_map_table = match layout {
            Some(layout) => {
                let mut tracker = FrameTracker::new(frame_locals(&layout.entry));
                for (i, target) in targets.iter().enumerate() {
                    if let (Some(target), Some(_)) = (target, &states[i]) {
                        if let Some(state) = &states[*target] {
                            let locals = frame_locals(state);
                            tracker.record_frame(addresses[*target], locals, Vec::new());
                        }
                    }
                }
                if !dead.is_empty() {
                    let throwable = pool.class("java/lang/Throwable")?;
                    for &(start, _) in &dead {
                        tracker.record_frame(
                            addresses[start],
                            Vec::new(),
                            vec![VType::Object(throwable)],
                        );
                    }
                }
                tracker.build()
            }
            None => None,
        };

        if !dead.is_empty() {
            debug!(ranges = dead.len(), "neutralizing unreachable code");
            instructions = neutralize(instructions, &addresses, &dead);
        }

        let max_stack = compute_max_stack(&instructions, pool);
        let code = encode_instructions(&instructions)?;
        Ok(FinishedCode {
            instructions,
            code,
            max_stack,
            stack_map_table,
        })
    }
}

/// Maximal runs `[start, end)` of unreachable instructions.
fn dead_ranges(states: &[Option<Vec<VType>>]) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = None;
    for (i, state) in states.iter().enumerate() {
        match (state, start) {
            (None, None) => start = Some(i),
            (Some(_), Some(s)) => {
                ranges.push((s, i));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        ranges.push((s, states.len()));
    }
    ranges
}

/// Replace each dead range with `nop`s ending in `athrow`, keeping every
/// byte offset intact.
fn neutralize(
    instructions: Vec<Instruction>,
    addresses: &[u32],
    dead: &[(usize, usize)],
) -> Vec<Instruction> {
    let mut out = Vec::with_capacity(instructions.len());
    let mut ranges = dead.iter().peekable();
    let mut i = 0;
    let mut iter = instructions.into_iter();
    while i < addresses.len() - 1 {
        match ranges.peek() {
            Some(&&(start, end)) if start == i => {
                let size = addresses[end] - addresses[start];
                out.extend(std::iter::repeat(Instruction::Nop).take(size as usize - 1));
                out.push(Instruction::Athrow);
                for _ in start..end {
                    iter.next();
                }
                i = end;
                ranges.next();
            }
            _ => {
                if let Some(instr) = iter.next() {
                    out.push(instr);
                }
                i += 1;
            }
        }
    }
    out
}

/// Byte address of every instruction, followed by the end address.
fn compute_byte_addresses(instructions: &[Instruction], end: u32) -> Vec<u32> {
    let mut addresses = Vec::with_capacity(instructions.len() + 1);
    let mut addr = 0u32;
    for instr in instructions {
        addresses.push(addr);
        addr += instruction_byte_size(instr);
    }
    debug_assert_eq!(addr, end);
    addresses.push(addr);
    addresses
}

fn patch_branch_offset(instr: &Instruction, offset: i16) -> Result<Instruction, CompileError> {
    Ok(match instr {
        Instruction::Goto(_) => Instruction::Goto(offset),
        Instruction::Ifeq(_) => Instruction::Ifeq(offset),
        Instruction::Ifne(_) => Instruction::Ifne(offset),
        Instruction::Iflt(_) => Instruction::Iflt(offset),
        Instruction::Ifge(_) => Instruction::Ifge(offset),
        Instruction::Ifgt(_) => Instruction::Ifgt(offset),
        Instruction::Ifle(_) => Instruction::Ifle(offset),
        Instruction::IfIcmpeq(_) => Instruction::IfIcmpeq(offset),
        Instruction::IfIcmpne(_) => Instruction::IfIcmpne(offset),
        Instruction::IfIcmplt(_) => Instruction::IfIcmplt(offset),
        Instruction::IfIcmpge(_) => Instruction::IfIcmpge(offset),
        Instruction::IfIcmpgt(_) => Instruction::IfIcmpgt(offset),
        Instruction::IfIcmple(_) => Instruction::IfIcmple(offset),
        Instruction::IfAcmpeq(_) => Instruction::IfAcmpeq(offset),
        Instruction::IfAcmpne(_) => Instruction::IfAcmpne(offset),
        Instruction::Ifnull(_) => Instruction::Ifnull(offset),
        Instruction::Ifnonnull(_) => Instruction::Ifnonnull(offset),
        other => {
            return Err(CompileError::UnsupportedOperation {
                op: format!("branch patch on {:?}", other),
                ty: String::new(),
            })
        }
    })
}
